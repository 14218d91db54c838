//! Helpers for collecting statistics.

use std::collections::*;
use bitvec::prelude::*;
use itertools::*;

use crate::branch::*;

/// Container for recording simple statistics while evaluating a predictor.
#[derive(Clone, Debug, Default)]
pub struct PredictorStats {
    /// Per-branch statistics (indexed by program counter value).
    pub data: BTreeMap<u32, BranchData>,

    /// Number of correct predictions
    pub global_hits: usize,

    /// Number of times any conditional branch was executed
    pub global_brns: usize,

    /// Number of instructions observed (including branches)
    pub global_insts: usize,

    /// Number of unconditional control-flow instructions observed
    pub global_other_ctrl: usize,
}
impl PredictorStats {
    pub fn new() -> Self { Self::default() }

    /// Return the global hit rate.
    pub fn hit_rate(&self) -> f64 {
        if self.global_brns == 0 { return 0.0; }
        self.global_hits as f64 / self.global_brns as f64
    }

    /// Return the global hit count.
    pub fn global_hits(&self) -> usize { self.global_hits }

    /// Return the global miss count.
    pub fn global_miss(&self) -> usize { self.global_brns - self.global_hits }

    /// Return the total branch count.
    pub fn global_brns(&self) -> usize { self.global_brns }

    /// Return mispredictions per thousand instructions.
    pub fn mpki(&self) -> f64 {
        if self.global_insts == 0 { return 0.0; }
        (self.global_miss() as f64 * 1000.0) / self.global_insts as f64
    }

    /// Record an instruction that was not a conditional branch.
    pub fn record_other(&mut self, kind: OpKind) {
        self.global_insts += 1;
        if kind.is_control_flow() { self.global_other_ctrl += 1; }
    }

    /// Record a predicted conditional branch.
    pub fn record(&mut self, pc: u32, predicted: Outcome, resolved: Outcome) {
        let hit = predicted == resolved;
        self.global_insts += 1;
        self.global_brns += 1;
        if hit { self.global_hits += 1; }

        let data = self.get_mut(pc);
        data.occ += 1;
        data.pat.push(resolved.into());
        if hit { data.hits += 1; }
    }

    /// Returns a reference to data collected for a particular branch.
    pub fn get(&self, pc: u32) -> Option<&BranchData> {
        self.data.get(&pc)
    }

    /// Returns a mutable reference to data collected for a particular branch.
    /// Creates a new entry if one doesn't already exist.
    pub fn get_mut(&mut self, pc: u32) -> &mut BranchData {
        self.data.entry(pc).or_default()
    }

    /// Returns the number of unique observed branch instructions.
    pub fn num_unique_branches(&self) -> usize {
        self.data.len()
    }

    /// Returns the number of branches that are always taken.
    pub fn num_always_taken(&self) -> usize {
        self.data.values().filter(|d| d.is_always_taken()).count()
    }

    /// Returns the number of branches that are never taken.
    pub fn num_never_taken(&self) -> usize {
        self.data.values().filter(|d| d.is_never_taken()).count()
    }

    /// Returns up to 'n' of the most frequent branches whose hit rate is at
    /// most 'max_rate'.
    pub fn get_low_rate_branches(&self, n: usize, max_rate: f64)
        -> Vec<(u32, &BranchData)>
    {
        self.data.iter()
            .filter(|(_, s)| s.hit_rate() <= max_rate)
            .sorted_by_key(|(_, s)| s.occ)
            .rev()
            .take(n)
            .map(|(pc, s)| (*pc, s))
            .collect()
    }
}

/// Container for per-branch statistics.
#[derive(Clone, Debug, Default)]
pub struct BranchData {
    /// Number of times this branch was encountered.
    pub occ: usize,

    /// Number of correct predictions for this branch.
    pub hits: usize,

    /// Record of all observed outcomes for this branch.
    pub pat: BitVec,
}
impl BranchData {
    /// Return the hit rate for this branch.
    pub fn hit_rate(&self) -> f64 {
        if self.occ == 0 { return 0.0; }
        self.hits as f64 / self.occ as f64
    }

    pub fn times_taken(&self) -> usize {
        self.pat.count_ones()
    }

    pub fn is_always_taken(&self) -> bool {
        self.pat.count_ones() == self.pat.len()
    }

    pub fn is_never_taken(&self) -> bool {
        self.pat.count_zeros() == self.pat.len()
    }
}
