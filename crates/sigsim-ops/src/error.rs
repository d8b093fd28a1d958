//! Operator construction and execution errors.

use sigsim_core::Shape;
use thiserror::Error;

/// Inconsistent operator wiring, detected when the operator is built.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ShapeMismatchError {
    /// `dot(A, X)` is undefined for these operand shapes.
    #[error("cannot dot A{a:?} with X{x:?} (transpose_x = {transpose_x})")]
    Dot {
        /// Shape of `A`.
        a: Shape,
        /// Shape of `X` as declared.
        x: Shape,
        /// Whether `X` is transposed before the product.
        transpose_x: bool,
    },
    /// `dot(A, X)` does not fit the increment target.
    #[error("dot result {result:?} does not match target Y{y:?}")]
    DotTarget {
        /// Shape of `dot(A, X)`.
        result: Shape,
        /// Shape of `Y`.
        y: Shape,
    },
    /// Copy source and destination disagree.
    #[error("cannot copy {src:?} into {dst:?}")]
    Copy {
        /// Shape of the destination.
        dst: Shape,
        /// Shape of the source.
        src: Shape,
    },
    /// A nonlinearity rejected its input/output sizes.
    #[error("nonlinearity '{name}' rejects input of {input} and output of {output} elements: {reason}")]
    NonLin {
        /// Name of the nonlinearity.
        name: String,
        /// Input element count.
        input: usize,
        /// Output element count.
        output: usize,
        /// Explanation from the nonlinearity.
        reason: String,
    },
    /// A nonlinearity timestep that is NaN, infinite, zero, or negative.
    #[error("nonlinearity dt must be finite and positive, got {value}")]
    InvalidDt {
        /// The rejected timestep.
        value: f64,
    },
}

/// Errors from a nonlinearity's per-tick update.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum NonlinearityError {
    /// The update failed.
    #[error("execution failed: {reason}")]
    ExecutionFailed {
        /// Human-readable description of the failure.
        reason: String,
    },
    /// The nonlinearity produced a NaN or infinite value.
    #[error("non-finite output at element {index}")]
    NonFinite {
        /// Index of the first bad element in the output.
        index: usize,
    },
}
