//! Strongly-typed identifiers.

use std::fmt;

/// Identifies a base signal within a [`SignalTable`](crate::SignalTable).
///
/// Bases are registered in order and assigned sequential IDs.
/// `BaseId(n)` corresponds to the n-th registered base.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BaseId(pub u32);

impl fmt::Display for BaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for BaseId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Identifies an operator by its insertion position in a model.
///
/// Insertion order is also the scheduler's tie-break order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OpId(pub u32);

impl fmt::Display for OpId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for OpId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Identifies a probe registered with a model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProbeId(pub u32);

impl fmt::Display for ProbeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for ProbeId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}
