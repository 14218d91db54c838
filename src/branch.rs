//! Types for representing branches and branch outcomes.

/// A branch outcome.
#[repr(u32)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Outcome {
    /// Not taken
    N = 0,
    /// Taken
    T = 1
}

impl Outcome {
    pub fn from_bool(b: bool) -> Self {
        match b {
            true => Self::T,
            false => Self::N,
        }
    }

    /// Returns 'true' if this outcome is "taken".
    pub fn is_taken(&self) -> bool {
        matches!(self, Self::T)
    }

    /// The signed value used as a perceptron input/target: +1 when taken,
    /// and -1 when not-taken.
    pub fn to_signed(self) -> i32 {
        match self {
            Self::T => 1,
            Self::N => -1,
        }
    }
}

impl std::fmt::Debug for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let s = match self {
            Self::T => "t",
            Self::N => "n",
        };
        write!(f, "{}", s)
    }
}

impl std::ops::Not for Outcome {
    type Output = Self;
    fn not(self) -> Self {
        match self {
            Self::N => Self::T,
            Self::T => Self::N,
        }
    }
}

impl From<bool> for Outcome {
    fn from(x: bool) -> Self {
        Self::from_bool(x)
    }
}
impl From<Outcome> for bool {
    fn from(x: Outcome) -> Self {
        x.is_taken()
    }
}

/// Different kinds of instructions reported to a predictor by the harness.
///
/// Conditional branches are delivered through predict/update; every other
/// kind arrives through the "other instruction" hook.
#[repr(u32)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OpKind {
    /// An ALU (or otherwise uninteresting) instruction.
    Op,
    /// A memory load.
    Load,
    /// A memory store.
    Store,
    /// A conditional branch instruction.
    ConditionalBranch,
    /// A direct unconditional jump instruction.
    DirectJump,
    /// An indirect unconditional jump instruction.
    IndirectJump,
    /// A direct procedure call instruction.
    DirectCall,
    /// An indirect procedure call instruction.
    IndirectCall,
    /// A return instruction.
    Return,
    /// Anything the harness cannot classify.
    Other,
}
impl OpKind {
    /// Returns 'true' if this instruction redirects control flow.
    pub fn is_control_flow(&self) -> bool {
        !matches!(self, Self::Op | Self::Load | Self::Store | Self::Other)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn outcome_conversions() {
        assert_eq!(Outcome::from(true), Outcome::T);
        assert_eq!(Outcome::from(false), Outcome::N);
        assert!(bool::from(Outcome::T));
        assert_eq!(!Outcome::T, Outcome::N);
        assert_eq!(Outcome::T.to_signed(), 1);
        assert_eq!(Outcome::N.to_signed(), -1);
    }

    #[test]
    fn op_kinds() {
        assert!(OpKind::Return.is_control_flow());
        assert!(OpKind::DirectJump.is_control_flow());
        assert!(!OpKind::Load.is_control_flow());
        assert!(!OpKind::Other.is_control_flow());
    }
}
