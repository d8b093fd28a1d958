//! Buffer arena for sigsim simulations.
//!
//! Every base signal of a model lives in one contiguous `Vec<f64>`, laid
//! out in registration order with an offset table for O(1) lookup.
//!
//! ```text
//! SignalArena
//! ├── data:    [ base0 | base1 | ... | baseN ]   (mutated each tick)
//! ├── initial: [ base0 | base1 | ... | baseN ]   (restored on reset)
//! └── slots:   BaseId → (offset, len, dtype)
//! ```
//!
//! Views are resolved once, at build time, into [`Window`]s holding
//! absolute positions in `data`. Operators then move values through
//! gather/store/accumulate calls, which keeps aliased windows on the same
//! base sound without any `unsafe` borrowing tricks.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod arena;
pub mod error;
pub mod window;

pub use arena::{BaseSlot, SignalArena};
pub use error::ArenaError;
pub use window::{Layout, Window};
