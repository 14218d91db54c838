//! Errors reported when a caller breaks the predict/update protocol.

use thiserror::Error;

/// A violation of the predict-then-update protocol.
///
/// Each conditional branch must see exactly one predict followed by exactly
/// one update (for the same program counter) before the next branch is
/// predicted.
#[derive(Error, Clone, Copy, Debug, PartialEq, Eq)]
pub enum PredictorError {
    #[error("update for branch {pc:#010x} without a matching prediction")]
    UpdateWithoutPredict { pc: u32 },

    #[error("prediction for branch {pc:#010x} while branch {pending_pc:#010x} \
             is still waiting for an update")]
    PredictWhilePending { pending_pc: u32, pc: u32 },

    #[error("update for branch {pc:#010x} does not match the pending \
             prediction for branch {predicted_pc:#010x}")]
    MismatchedUpdate { predicted_pc: u32, pc: u32 },
}
