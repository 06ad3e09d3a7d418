//! Weighted transaction selection
//!
//! A deck holds each transaction kind as many times as its weight. Draws
//! advance through the deck; when it is exhausted it is reshuffled and
//! restarted. Each draw additionally picks a uniformly random card so the mix
//! has no fixed period (TPC-C 5.2.4.2).

use crate::txn::TxnKind;
use tpcc_core::{Error, RandomGenerator, Result};

/// Per-thread weighted deck of transaction kinds
#[derive(Debug, Clone)]
pub struct Deck {
    cards: Vec<TxnKind>,
    index: usize,
}

impl Deck {
    /// Build a deck from weights in `TxnKind::ALL` order
    pub fn new(weights: [u32; 5]) -> Result<Self> {
        let cards: Vec<TxnKind> = TxnKind::ALL
            .iter()
            .zip(weights)
            .flat_map(|(kind, weight)| std::iter::repeat(*kind).take(weight as usize))
            .collect();
        if cards.is_empty() {
            return Err(Error::InvalidConfig("transaction weights are all zero".into()));
        }
        let index = cards.len();
        Ok(Self { cards, index })
    }

    /// Number of cards
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// Always false for a constructed deck
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Cards of one kind
    pub fn count(&self, kind: TxnKind) -> usize {
        self.cards.iter().filter(|card| **card == kind).count()
    }

    /// Draw the next transaction kind
    pub fn draw(&mut self, rng: &mut RandomGenerator) -> TxnKind {
        if self.index >= self.cards.len() {
            self.index = 0;
            rng.shuffle(&mut self.cards);
        }
        self.index += 1;
        self.cards[rng.intn(self.cards.len())]
    }
}
