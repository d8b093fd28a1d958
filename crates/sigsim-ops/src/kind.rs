//! Operator kind tags.

use std::fmt;

/// Tag identifying which primitive an [`Operator`](crate::Operator) is.
///
/// Used as a dense index for per-kind bookkeeping (timing, counts) and
/// in diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OpKind {
    /// Set a view to a constant.
    Reset,
    /// Set a view from another view.
    Copy,
    /// Increment a view by a matrix/vector product.
    DotInc,
    /// Set a view by applying a stateful nonlinearity.
    NonLin,
}

impl OpKind {
    /// Number of operator kinds.
    pub const COUNT: usize = 4;

    /// All kinds, in tag order.
    pub const ALL: [OpKind; Self::COUNT] = [Self::Reset, Self::Copy, Self::DotInc, Self::NonLin];

    /// Dense index in `0..COUNT`.
    pub fn index(self) -> usize {
        match self {
            Self::Reset => 0,
            Self::Copy => 1,
            Self::DotInc => 2,
            Self::NonLin => 3,
        }
    }

    /// Short display name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Reset => "Reset",
            Self::Copy => "Copy",
            Self::DotInc => "DotInc",
            Self::NonLin => "NonLin",
        }
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
