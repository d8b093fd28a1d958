//! Error types for the signal and view model.

use thiserror::Error;

use crate::id::BaseId;

/// Errors from registering base signals or constructing views.
///
/// All of these are model-construction errors: they are raised before any
/// buffer is allocated and name the offending signal.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ShapeError {
    /// The view references a base that is not registered.
    #[error("unknown base signal {base}")]
    UnknownBase {
        /// The unregistered base.
        base: BaseId,
    },
    /// The view's shape and strides have different ranks.
    #[error("view of '{base}' has shape rank {shape_rank} but strides rank {strides_rank}")]
    RankMismatch {
        /// Name of the base signal.
        base: String,
        /// Number of shape dimensions.
        shape_rank: usize,
        /// Number of stride entries.
        strides_rank: usize,
    },
    /// The view addresses elements outside its base's allocation.
    #[error("view of '{base}' addresses elements [{first}, {last}] outside base of length {len}")]
    OutOfBounds {
        /// Name of the base signal.
        base: String,
        /// Lowest element index the view touches.
        first: i64,
        /// Highest element index the view touches.
        last: i64,
        /// Length of the base in elements.
        len: usize,
    },
    /// The view's element count or extent does not fit in machine integers.
    #[error("view of '{base}' is too large to address")]
    Overflow {
        /// Name of the base signal.
        base: String,
    },
    /// An explicit initial value does not match the base's length.
    #[error("initial value for '{base}' has {actual} elements, expected {expected}")]
    InitialLength {
        /// Name of the base signal.
        base: String,
        /// Length of the base.
        expected: usize,
        /// Length of the supplied initial value.
        actual: usize,
    },
    /// Another base is already registered under this name.
    #[error("base signal name '{name}' is already registered")]
    DuplicateName {
        /// The contested name.
        name: String,
    },
    /// The table cannot hold more than `u32::MAX` bases.
    #[error("base signal count exceeds u32::MAX")]
    TooManyBases,
}
