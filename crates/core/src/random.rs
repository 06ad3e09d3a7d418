//! TPC-C random data generation
//!
//! Each worker owns a `RandomGenerator`; nothing here is shared between
//! threads. The NURand run constants are chosen once per process and handed
//! to every generator so all workers skew towards the same hot rows.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

const ALPHANUMERIC: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const LETTERS: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
const NUMBERS: &[u8] = b"0123456789";

const C_LAST_SYLLABLES: [&str; 10] = [
    "BAR", "OUGHT", "ABLE", "PRI", "PRES", "ESE", "ANTI", "CALLY", "ATION", "EING",
];

const ORIGINAL: &str = "ORIGINAL";

/// `NURand(A, x, y)` with run constant `c`
pub fn nurand<R: Rng + ?Sized>(rng: &mut R, a: i64, x: i64, y: i64, c: i64) -> i64 {
    (((rng.gen_range(0..=a) | rng.gen_range(x..=y)) + c) % (y - x + 1)) + x
}

/// Customer last name for a number in `0..=999`, built from three syllables
pub fn rand_c_last_syllables(n: i64) -> String {
    let n = n.rem_euclid(1000) as usize;
    let mut out = String::with_capacity(15);
    out.push_str(C_LAST_SYLLABLES[n / 100]);
    out.push_str(C_LAST_SYLLABLES[(n / 10) % 10]);
    out.push_str(C_LAST_SYLLABLES[n % 10]);
    out
}

// ============================================================================
// NURand constants
// ============================================================================

/// Run-scoped `C` constants for the three NURand distributions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NuRandConstants {
    /// `C` for customer last names during loading
    pub c_load: i64,
    /// `C` for customer last names during the run
    pub c_run: i64,
    /// `C` for customer ids
    pub c_customer_id: i64,
    /// `C` for item ids
    pub c_item_id: i64,
}

impl NuRandConstants {
    /// `A` for customer last names
    pub const C_LAST_A: i64 = 255;
    /// `A` for customer ids
    pub const CUSTOMER_ID_A: i64 = 1023;
    /// `A` for item ids
    pub const ITEM_ID_A: i64 = 8191;

    /// Draw a fresh set of constants
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let c_load = rng.gen_range(0..=Self::C_LAST_A);
        let c_run = loop {
            let candidate = rng.gen_range(0..=Self::C_LAST_A);
            if Self::valid_delta(c_load, candidate) {
                break candidate;
            }
        };
        Self {
            c_load,
            c_run,
            c_customer_id: rng.gen_range(0..=Self::CUSTOMER_ID_A),
            c_item_id: rng.gen_range(0..=Self::ITEM_ID_A),
        }
    }

    /// Constants from an optional seed; `None` draws from entropy
    pub fn from_seed(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::generate(&mut StdRng::seed_from_u64(seed)),
            None => Self::generate(&mut StdRng::from_entropy()),
        }
    }

    /// `|c_run - c_load|` must lie in 65..=119 and avoid 96 and 112
    pub fn valid_delta(c_load: i64, c_run: i64) -> bool {
        let delta = (c_run - c_load).abs();
        (65..=119).contains(&delta) && delta != 96 && delta != 112
    }
}

// ============================================================================
// Generator
// ============================================================================

/// Per-worker random source
#[derive(Debug)]
pub struct RandomGenerator {
    rng: StdRng,
    constants: NuRandConstants,
}

impl RandomGenerator {
    /// Generator using the shared constants; seeded when `seed` is given
    pub fn new(constants: NuRandConstants, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng, constants }
    }

    /// The NURand constants in use
    pub fn constants(&self) -> &NuRandConstants {
        &self.constants
    }

    /// Underlying RNG
    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// Uniform integer in `min..=max`
    pub fn rand_int(&mut self, min: i64, max: i64) -> i64 {
        self.rng.gen_range(min..=max)
    }

    /// Uniform index in `0..n`
    pub fn intn(&mut self, n: usize) -> usize {
        self.rng.gen_range(0..n)
    }

    /// Uniform float in `0.0..1.0`
    pub fn float(&mut self) -> f64 {
        self.rng.gen()
    }

    fn rand_from(&mut self, alphabet: &[u8], min: usize, max: usize) -> String {
        let len = self.rng.gen_range(min..=max);
        (0..len)
            .map(|_| alphabet[self.rng.gen_range(0..alphabet.len())] as char)
            .collect()
    }

    /// Alphanumeric string with length in `min..=max`
    pub fn rand_chars(&mut self, min: usize, max: usize) -> String {
        self.rand_from(ALPHANUMERIC, min, max)
    }

    /// Letters-only string with length in `min..=max`
    pub fn rand_letters(&mut self, min: usize, max: usize) -> String {
        self.rand_from(LETTERS, min, max)
    }

    /// Digits-only string with length in `min..=max`
    pub fn rand_numbers(&mut self, min: usize, max: usize) -> String {
        self.rand_from(NUMBERS, min, max)
    }

    /// 26..=50 alphanumerics; one in ten embeds "ORIGINAL" at a random offset
    pub fn rand_original_string(&mut self) -> String {
        let mut s = self.rand_chars(26, 50);
        if self.rng.gen_range(0..10) == 0 {
            let start = self.rng.gen_range(0..=s.len() - ORIGINAL.len());
            s.replace_range(start..start + ORIGINAL.len(), ORIGINAL);
        }
        s
    }

    /// Two uppercase letters
    pub fn rand_state(&mut self) -> String {
        (0..2)
            .map(|_| self.rng.gen_range(b'A'..=b'Z') as char)
            .collect()
    }

    /// Four random digits followed by "11111"
    pub fn rand_zip(&mut self) -> String {
        let mut zip = self.rand_numbers(4, 4);
        zip.push_str("11111");
        zip
    }

    /// Tax rate in `0.0000..=0.2000`
    pub fn rand_tax(&mut self) -> f64 {
        self.rand_int(0, 2000) as f64 / 10_000.0
    }

    /// Customer last name as drawn during the run
    pub fn rand_c_last(&mut self) -> String {
        let c = self.constants.c_run;
        rand_c_last_syllables(nurand(&mut self.rng, NuRandConstants::C_LAST_A, 0, 999, c))
    }

    /// Customer last name as drawn during loading
    pub fn rand_c_last_load(&mut self) -> String {
        let c = self.constants.c_load;
        rand_c_last_syllables(nurand(&mut self.rng, NuRandConstants::C_LAST_A, 0, 999, c))
    }

    /// Skewed customer id in `1..=3000`
    pub fn rand_customer_id(&mut self) -> i64 {
        let c = self.constants.c_customer_id;
        nurand(&mut self.rng, NuRandConstants::CUSTOMER_ID_A, 1, 3000, c)
    }

    /// Skewed item id in `1..=100000`
    pub fn rand_item_id(&mut self) -> i64 {
        let c = self.constants.c_item_id;
        nurand(&mut self.rng, NuRandConstants::ITEM_ID_A, 1, 100_000, c)
    }

    /// Random permutation of `0..n`
    pub fn perm(&mut self, n: usize) -> Vec<usize> {
        let mut out: Vec<usize> = (0..n).collect();
        out.shuffle(&mut self.rng);
        out
    }

    /// Fisher-Yates shuffle in place
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut self.rng);
    }
}
