//! Worker-owned state of the SQL workloader

use crate::deck::Deck;
use crate::txn::Statements;
use tpcc_core::{Error, RandomGenerator, Result};
use tpcc_sql::{Connection, Connector, Dialect};
use tracing::warn;

/// Everything one worker thread owns: its RNG, its connection, the
/// statements prepared on that connection and its transaction deck
pub struct ThreadState {
    pub(crate) thread_id: usize,
    pub(crate) rng: RandomGenerator,
    pub(crate) conn: Box<dyn Connection>,
    pub(crate) stmts: Option<Statements>,
    pub(crate) deck: Deck,
}

impl ThreadState {
    pub(crate) fn new(
        thread_id: usize,
        rng: RandomGenerator,
        conn: Box<dyn Connection>,
        deck: Deck,
    ) -> Self {
        Self {
            thread_id,
            rng,
            conn,
            stmts: None,
            deck,
        }
    }

    /// Worker index
    pub fn thread_id(&self) -> usize {
        self.thread_id
    }

    /// The worker's connection, for ad-hoc queries
    pub fn connection(&mut self) -> &mut dyn Connection {
        self.conn.as_mut()
    }

    /// The worker's random source
    pub fn rng(&mut self) -> &mut RandomGenerator {
        &mut self.rng
    }

    /// Whether statements are prepared on the current connection
    pub fn has_statements(&self) -> bool {
        self.stmts
            .as_ref()
            .map_or(false, |s| s.generation() == self.conn.generation())
    }

    /// Ping the connection and reconnect if it is gone; prepared statements
    /// of the old connection are discarded
    pub(crate) fn ensure_live(&mut self, connector: &dyn Connector) -> Result<()> {
        if let Err(e) = self.conn.ping() {
            warn!(
                target: "tpcc::sql",
                thread = self.thread_id,
                error = %e,
                "Connection lost, reconnecting"
            );
            self.stmts = None;
            self.conn = connector
                .connect()
                .map_err(|e| Error::ConnectionLost(e.to_string()))?;
        }
        Ok(())
    }

    /// Prepare the statement set unless it is current
    pub(crate) fn ensure_statements(&mut self, dialect: Dialect) -> Result<()> {
        if !self.has_statements() {
            self.stmts = Some(Statements::prepare(self.conn.as_mut(), dialect)?);
        }
        Ok(())
    }

    /// Connection and statements, borrowed together
    pub(crate) fn split(&mut self) -> Result<(&mut dyn Connection, &Statements)> {
        let stmts = self
            .stmts
            .as_ref()
            .ok_or_else(|| Error::not_found("prepared statements"))?;
        Ok((self.conn.as_mut(), stmts))
    }

    /// Drop prepared statements and release the connection's statement cache
    pub(crate) fn close(&mut self) {
        self.stmts = None;
        self.conn.close_statements();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;
    use tpcc_core::{NuRandConstants, DEFAULT_WEIGHTS};
    use tpcc_sql::{next_generation, Row, SqlValue, Statement, TxOptions};

    /// Connection that accepts every statement and fails pings on demand
    struct ScriptedConnection {
        generation: u64,
        next_id: u32,
        broken: Arc<AtomicBool>,
    }

    impl Connection for ScriptedConnection {
        fn generation(&self) -> u64 {
            self.generation
        }
        fn ping(&mut self) -> tpcc_sql::Result<()> {
            if self.broken.load(Ordering::SeqCst) {
                Err(tpcc_sql::Error::driver("server has gone away"))
            } else {
                Ok(())
            }
        }
        fn begin(&mut self, _opts: TxOptions) -> tpcc_sql::Result<()> {
            Ok(())
        }
        fn commit(&mut self) -> tpcc_sql::Result<()> {
            Ok(())
        }
        fn rollback(&mut self) -> tpcc_sql::Result<()> {
            Ok(())
        }
        fn prepare(&mut self, _sql: &str) -> tpcc_sql::Result<Statement> {
            self.next_id += 1;
            Ok(Statement::new(self.next_id, self.generation))
        }
        fn execute(&mut self, _stmt: &Statement, _params: &[SqlValue]) -> tpcc_sql::Result<u64> {
            Ok(0)
        }
        fn query(&mut self, _stmt: &Statement, _params: &[SqlValue]) -> tpcc_sql::Result<Vec<Row>> {
            Ok(Vec::new())
        }
        fn execute_sql(&mut self, _sql: &str, _params: &[SqlValue]) -> tpcc_sql::Result<u64> {
            Ok(0)
        }
        fn query_sql(&mut self, _sql: &str, _params: &[SqlValue]) -> tpcc_sql::Result<Vec<Row>> {
            Ok(Vec::new())
        }
        fn close_statements(&mut self) {}
    }

    struct ScriptedConnector {
        connects: AtomicUsize,
        refuse: AtomicBool,
    }

    impl Connector for ScriptedConnector {
        fn dialect(&self) -> Dialect {
            Dialect::Sqlite
        }
        fn connect(&self) -> tpcc_sql::Result<Box<dyn Connection>> {
            if self.refuse.load(Ordering::SeqCst) {
                return Err(tpcc_sql::Error::driver("connection refused"));
            }
            self.connects.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(ScriptedConnection {
                generation: next_generation(),
                next_id: 0,
                broken: Arc::new(AtomicBool::new(false)),
            }))
        }
    }

    fn state(broken: Arc<AtomicBool>) -> ThreadState {
        let conn = ScriptedConnection {
            generation: next_generation(),
            next_id: 0,
            broken,
        };
        ThreadState::new(
            0,
            RandomGenerator::new(NuRandConstants::from_seed(Some(1)), Some(1)),
            Box::new(conn),
            Deck::new(DEFAULT_WEIGHTS).unwrap(),
        )
    }

    fn connector() -> ScriptedConnector {
        ScriptedConnector {
            connects: AtomicUsize::new(0),
            refuse: AtomicBool::new(false),
        }
    }

    #[test]
    fn test_live_connection_keeps_statements() {
        let connector = connector();
        let mut state = state(Arc::new(AtomicBool::new(false)));
        state.ensure_statements(Dialect::Sqlite).unwrap();
        let generation = state.conn.generation();

        state.ensure_live(&connector).unwrap();
        assert_eq!(connector.connects.load(Ordering::SeqCst), 0);
        assert!(state.has_statements());
        assert_eq!(state.conn.generation(), generation);
    }

    #[test]
    fn test_reconnect_discards_statements() {
        let connector = connector();
        let broken = Arc::new(AtomicBool::new(false));
        let mut state = state(broken.clone());
        state.ensure_statements(Dialect::Sqlite).unwrap();
        let old_generation = state.conn.generation();

        broken.store(true, Ordering::SeqCst);
        state.ensure_live(&connector).unwrap();
        assert_eq!(connector.connects.load(Ordering::SeqCst), 1);
        assert!(!state.has_statements());
        assert_ne!(state.conn.generation(), old_generation);

        state.ensure_statements(Dialect::Sqlite).unwrap();
        assert!(state.has_statements());
        assert_eq!(
            state.stmts.as_ref().map(|s| s.generation()),
            Some(state.conn.generation())
        );
    }

    #[test]
    fn test_failed_reconnect_is_connection_lost() {
        let connector = connector();
        connector.refuse.store(true, Ordering::SeqCst);
        let mut state = state(Arc::new(AtomicBool::new(true)));
        let err = state.ensure_live(&connector).unwrap_err();
        assert!(matches!(err, Error::ConnectionLost(_)));
    }
}
