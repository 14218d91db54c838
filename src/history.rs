
use bitvec::prelude::*;
use crate::Outcome;

/// A 32-bit global history register.
///
/// The most recent outcome is held in bit 0. Every resolved branch shifts
/// the register left by one bit, and the oldest bit is discarded.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct GlobalHistoryRegister {
    data: u32,
}

// NOTE: This presents the bits in a format where the leftmost bit is the
// most-significant (oldest) and the rightmost bit is the least-significant
// (most recent).
impl std::fmt::Display for GlobalHistoryRegister {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let x: String = self.bits().iter().by_vals()
            .map(|b| if b { '1' } else { '0' })
            .rev()
            .collect();
        write!(f, "{}", x)
    }
}

impl std::fmt::Debug for GlobalHistoryRegister {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "GlobalHistoryRegister({:#010x})", self.data)
    }
}

impl GlobalHistoryRegister {
    /// Any non-zero seed works here; all-ones is what the predictor uses.
    pub const INIT: u32 = 0xffff_ffff;

    /// Create a register seeded with [GlobalHistoryRegister::INIT].
    pub fn new() -> Self {
        Self::from_raw(Self::INIT)
    }

    /// Create a register holding some raw value.
    pub fn from_raw(data: u32) -> Self {
        Self { data }
    }

    /// Return the raw value of the register.
    pub fn value(&self) -> u32 { self.data }

    /// Return the register as a [BitSlice], where index 'i' is the outcome
    /// of the 'i'-th most recent branch.
    pub fn bits(&self) -> &BitSlice<u32, Lsb0> {
        self.data.view_bits::<Lsb0>()
    }

    /// Return the outcome recorded at some position (0 is the most recent).
    pub fn outcome(&self, pos: usize) -> Outcome {
        Outcome::from(self.bits()[pos])
    }

    /// Shift in the outcome of a resolved branch.
    pub fn push(&mut self, outcome: Outcome) {
        self.data = (self.data << 1) | (outcome as u32);
    }

    /// Reset the register to its initial value.
    pub fn reset(&mut self) {
        self.data = Self::INIT;
    }
}

impl Default for GlobalHistoryRegister {
    fn default() -> Self { Self::new() }
}
