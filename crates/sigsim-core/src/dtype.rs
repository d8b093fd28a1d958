//! Element types for base signals.

use std::fmt;

/// Element type of a base signal.
///
/// All buffers are held as `f64` in the arena. A `Float32` base rounds
/// every stored value through `f32`, so results match single-precision
/// storage while arithmetic stays in double precision.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DType {
    /// 32-bit IEEE float.
    Float32,
    /// 64-bit IEEE float.
    #[default]
    Float64,
}

impl DType {
    /// Size of one element in bytes.
    pub fn itemsize(self) -> usize {
        match self {
            Self::Float32 => 4,
            Self::Float64 => 8,
        }
    }

    /// Round a value to this element type's precision.
    #[inline]
    pub fn cast(self, value: f64) -> f64 {
        match self {
            Self::Float32 => value as f32 as f64,
            Self::Float64 => value,
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Float32 => write!(f, "float32"),
            Self::Float64 => write!(f, "float64"),
        }
    }
}
