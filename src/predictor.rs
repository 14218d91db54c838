//! Implementations of branch predictors.

pub mod table;
pub mod counter;
pub mod perceptron;

pub use table::*;
pub use counter::*;
pub use perceptron::*;

use crate::branch::OpKind;

/// Interface to a conditional branch predictor driven by a trace-based
/// simulator.
///
/// For every conditional branch the caller calls [predict], and then calls
/// [update] once the branch is resolved (before predicting the next branch).
/// Every other instruction is reported through [track_other_inst].
///
/// [predict]: ConditionalBranchPredictor::predict
/// [update]: ConditionalBranchPredictor::update
/// [track_other_inst]: ConditionalBranchPredictor::track_other_inst
pub trait ConditionalBranchPredictor {
    fn name(&self) -> &'static str;

    /// Return the predicted direction ('true' if taken) of the conditional
    /// branch at 'pc'.
    fn predict(&mut self, pc: u32) -> bool;

    /// Update the internal state of the predictor with the resolved
    /// direction of the branch at 'pc'.
    fn update(&mut self, pc: u32, resolved: bool, predicted: bool,
        target: u32);

    /// Observe an instruction which is not a conditional branch.
    fn track_other_inst(&mut self, _pc: u32, _op: OpKind, _target: u32) {}

    /// Reset the internal state of the predictor.
    fn reset(&mut self);
}
