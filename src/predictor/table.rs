//! Storage and indexing for a table of perceptrons.

use crate::config::*;
use crate::history::*;

/// Inputs used to form an index into a [PerceptronTable].
#[derive(Clone, Copy, Debug)]
pub struct PerceptronInputs<'a> {
    /// Program counter associated with a predicted branch
    pub pc: u32,

    /// The current state of global history
    pub ghr: &'a GlobalHistoryRegister,
}

/// A function used to create an index from a program counter value.
pub type PcIndexFn = fn(pc: u32) -> usize;

/// A function used to create an index from a program counter value and
/// the current global history.
pub type GhrIndexFn = fn(pc: u32, ghr: &GlobalHistoryRegister) -> usize;

/// A strategy for indexing into a [PerceptronTable].
#[derive(Clone, Copy, Debug)]
pub enum IndexStrategy {
    FromPc(PcIndexFn),
    FromGhr(GhrIndexFn),
}

/// Fold the program counter into [INDEX_BITS] bits.
///
/// The low, middle, and high windows of the PC (each shifted by another
/// [INDEX_BITS]) are reduced to a row number and XOR'ed together.
pub fn folded_pc_index(pc: u32) -> usize {
    let n = NUM_ENTRIES as u32;
    let mid = pc >> INDEX_BITS;
    let high = mid >> INDEX_BITS;
    ((pc % n) ^ (mid % n) ^ (high % n)) as usize
}

/// Hash the program counter with global history (gshare-style).
pub fn pc_xor_ghr_index(pc: u32, ghr: &GlobalHistoryRegister) -> usize {
    ((pc ^ ghr.value()) % NUM_ENTRIES as u32) as usize
}

/// Interface to a table of predictors.
pub trait PredictorTable {
    /// The type of input to the table used to form an index.
    type Input<'a>;

    /// The type of entry in the table.
    type Entry: ?Sized;

    /// Returns the number of entries in the table.
    fn size(&self) -> usize;

    /// Given some input, return the corresponding index into the table.
    fn get_index(&self, input: Self::Input<'_>) -> usize;

    /// Returns a reference to an entry in the table.
    fn get_entry(&self, idx: usize) -> &Self::Entry;

    /// Returns a mutable reference to an entry in the table.
    fn get_entry_mut(&mut self, idx: usize) -> &mut Self::Entry;

    /// Returns a bitmask corresponding to the number of entries in the table.
    fn index_mask(&self) -> usize {
        assert!(self.size().is_power_of_two());
        self.size() - 1
    }
}

/// A table of [NUM_ENTRIES] perceptrons, each with [ROW_LEN] weights.
///
/// All of the weights are kept in one flat buffer: the weight at position
/// 'pos' in row 'idx' lives at `idx * ROW_LEN + pos`.
#[derive(Clone)]
pub struct PerceptronTable {
    data: Vec<i8>,
    index_strat: IndexStrategy,
}
impl PerceptronTable {
    /// Create a table with all weights set to zero.
    pub fn new(index_strat: IndexStrategy) -> Self {
        Self {
            data: vec![0; NUM_ENTRIES * ROW_LEN],
            index_strat,
        }
    }

    /// Set all weights to zero.
    pub fn reset(&mut self) {
        self.data.fill(0);
    }

    /// Return all weights in the table.
    pub fn weights(&self) -> &[i8] { &self.data }
}

impl std::fmt::Debug for PerceptronTable {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("PerceptronTable")
            .field("entries", &NUM_ENTRIES)
            .field("row_len", &ROW_LEN)
            .field("index_strat", &self.index_strat)
            .finish()
    }
}

impl PredictorTable for PerceptronTable {
    type Input<'a> = PerceptronInputs<'a>;
    type Entry = [i8];

    fn size(&self) -> usize { NUM_ENTRIES }

    fn get_index(&self, input: PerceptronInputs<'_>) -> usize {
        let res = match self.index_strat {
            IndexStrategy::FromPc(func) => (func)(input.pc),
            IndexStrategy::FromGhr(func) => (func)(input.pc, input.ghr),
        };
        res & self.index_mask()
    }

    fn get_entry(&self, idx: usize) -> &[i8] {
        let base = (idx & self.index_mask()) * ROW_LEN;
        &self.data[base..base + ROW_LEN]
    }

    fn get_entry_mut(&mut self, idx: usize) -> &mut [i8] {
        let base = (idx & self.index_mask()) * ROW_LEN;
        &mut self.data[base..base + ROW_LEN]
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn folded_index() {
        assert_eq!(folded_pc_index(0), 0);
        assert_eq!(folded_pc_index(0x1ff), 0x1ff);
        // 0x1000 = 8 << 9
        assert_eq!(folded_pc_index(0x1000), 8);
        // The middle and high windows cancel out
        let pc = (5 << 18) | (5 << 9);
        assert_eq!(folded_pc_index(pc), 0);
        assert_eq!(folded_pc_index(3 << 18), 3);
        // Bits above the third window are ignored
        assert_eq!(folded_pc_index(1 << 27), 0);
    }

    #[test]
    fn gshare_index() {
        let ghr = GlobalHistoryRegister::new();
        assert_eq!(pc_xor_ghr_index(0x1000, &ghr), 0x1ff);
        let ghr = GlobalHistoryRegister::from_raw(0);
        assert_eq!(pc_xor_ghr_index(0x1234, &ghr), 0x1234 & 0x1ff);
    }

    #[test]
    fn rows_are_disjoint() {
        let mut t = PerceptronTable::new(IndexStrategy::FromPc(folded_pc_index));
        t.get_entry_mut(3).fill(7);
        assert!(t.get_entry(2).iter().all(|w| *w == 0));
        assert!(t.get_entry(4).iter().all(|w| *w == 0));
        assert!(t.get_entry(3).iter().all(|w| *w == 7));
        assert_eq!(t.weights().iter().filter(|w| **w == 7).count(), ROW_LEN);
        t.reset();
        assert!(t.weights().iter().all(|w| *w == 0));
    }
}
