//! Core types for the sigsim simulation framework.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! signal model shared by every other crate: typed identifiers, element
//! types, base signals, views into them, and the [`SignalTable`] registry
//! that validates view geometry at construction time.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod dtype;
pub mod error;
pub mod id;
pub mod signal;
pub mod view;

pub use dtype::DType;
pub use error::ShapeError;
pub use id::{BaseId, OpId, ProbeId};
pub use signal::{BaseSignal, InitialValue, SignalKind, SignalTable};
pub use view::{Shape, Strides, View};
