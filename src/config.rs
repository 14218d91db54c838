//! Structural constants for the perceptron predictor.
//!
//! These are fixed at compile time. Changing any of them changes the modelled
//! storage budget and the predictor's accuracy.
//!
//! Storage budget:
//!
//! - 2 perceptron tables
//! - 2^9 = 512 rows per table
//! - 32 weights per row (31 history weights plus one bias weight)
//! - 8 bits per weight
//! - 2 * 512 * 32 * 8 bits = 256 Kbits (32 KiB) of weights
//! - 32 bits of global history
//!

/// Number of global history bits used as perceptron inputs.
pub const HIST_LEN: usize = 31;

/// Number of perceptron tables.
pub const NUM_TABLES: usize = 2;

/// Number of index bits for each perceptron table.
pub const INDEX_BITS: usize = 9;

/// Width of a single weight (in bits).
pub const WEIGHT_BITS: usize = 8;

/// Width of the global history register (in bits).
pub const GHR_BITS: usize = u32::BITS as usize;

/// Number of rows in each perceptron table.
pub const NUM_ENTRIES: usize = 1 << INDEX_BITS;

/// Number of weights in a row (the bias weight is at index 0).
pub const ROW_LEN: usize = HIST_LEN + 1;

/// Largest value a weight can hold.
pub const WEIGHT_MAX: i8 = ((1i16 << (WEIGHT_BITS - 1)) - 1) as i8;

/// Smallest value a weight can hold.
pub const WEIGHT_MIN: i8 = (-(1i16 << (WEIGHT_BITS - 1))) as i8;

/// Initial training threshold, `round(1.93 * HIST_LEN + 14)`.
pub const INITIAL_THRESHOLD: i32 = ((193 * HIST_LEN + 1400 + 50) / 100) as i32;

/// The threshold counter moves the threshold up when it reaches this value.
pub const TC_MAX: i32 = 127;

/// The threshold counter moves the threshold down when it reaches this value.
pub const TC_MIN: i32 = -128;

// Weights are stored in an i8 and history is read from a 32-bit register.
const _: () = assert!(WEIGHT_BITS >= 2 && WEIGHT_BITS <= 8);
const _: () = assert!(HIST_LEN < GHR_BITS);
const _: () = assert!(INDEX_BITS < u32::BITS as usize);

/// A description of the predictor's structure.
///
/// There is only one valid configuration, [PerceptronConfig::DEFAULT], which
/// mirrors the constants in this module. The fields are private so that a
/// config cannot describe a different predictor than the one it builds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PerceptronConfig {
    /// Number of global history bits used as inputs
    hist_len: usize,
    /// Number of perceptron tables
    num_tables: usize,
    /// Number of index bits per table
    index_bits: usize,
    /// Width of a weight in bits
    weight_bits: usize,
}
impl PerceptronConfig {
    pub const DEFAULT: Self = Self {
        hist_len: HIST_LEN,
        num_tables: NUM_TABLES,
        index_bits: INDEX_BITS,
        weight_bits: WEIGHT_BITS,
    };

    pub fn hist_len(&self) -> usize { self.hist_len }
    pub fn num_tables(&self) -> usize { self.num_tables }
    pub fn index_bits(&self) -> usize { self.index_bits }
    pub fn weight_bits(&self) -> usize { self.weight_bits }

    /// Number of rows in each table.
    pub fn num_entries(&self) -> usize { 1 << self.index_bits }

    /// Number of weights in each row.
    pub fn row_len(&self) -> usize { self.hist_len + 1 }

    /// Number of bits used to store all of the weights.
    pub fn weight_storage_bits(&self) -> usize {
        self.num_tables * self.num_entries() * self.row_len() * self.weight_bits
    }

    /// Total number of bits of modelled state (weights and history).
    pub fn storage_bits(&self) -> usize {
        self.weight_storage_bits() + GHR_BITS
    }

    /// Total number of bytes of modelled state, rounded up.
    pub fn storage_bytes(&self) -> usize {
        self.storage_bits().div_ceil(8)
    }

    /// Build a freshly-initialized predictor.
    pub fn build(self) -> crate::predictor::PerceptronPredictor {
        crate::predictor::PerceptronPredictor::new()
    }
}
impl Default for PerceptronConfig {
    fn default() -> Self { Self::DEFAULT }
}
