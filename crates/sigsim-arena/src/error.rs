//! Arena-specific error types.

use sigsim_core::BaseId;
use thiserror::Error;

/// Errors that can occur during arena operations.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ArenaError {
    /// A view or window references a base with no slot in the arena.
    #[error("unknown base signal {base}")]
    UnknownBase {
        /// The unrecognised base.
        base: BaseId,
    },
    /// A view addresses elements outside its base's slot.
    #[error("window on base {base} addresses [{first}, {last}] outside slot of length {len}")]
    OutOfBounds {
        /// The base being resolved.
        base: BaseId,
        /// Lowest element index addressed.
        first: i64,
        /// Highest element index addressed.
        last: i64,
        /// Slot length in elements.
        len: usize,
    },
    /// A store or accumulate supplied the wrong number of values.
    #[error("window on base {base} holds {expected} elements, got {actual} values")]
    LengthMismatch {
        /// The base being written.
        base: BaseId,
        /// Window length.
        expected: usize,
        /// Number of values supplied.
        actual: usize,
    },
}
