//! Primitive operators for sigsim simulations.
//!
//! Every model is lowered to four operator kinds, each declaring the views
//! it reads, fully overwrites ("sets"), or accumulates into ("incs"):
//!
//! | Kind | Reads | Sets | Incs |
//! |------|-------|------|------|
//! | [`ResetOp`] | | `dst` | |
//! | [`CopyOp`] | `src` | `dst` | |
//! | [`DotIncOp`] | `A`, `X` | | `Y` |
//! | [`NonLinOp`] | `input` | `output` | |
//!
//! Constructors check shapes immediately and return
//! [`ShapeMismatchError`] on bad wiring, so a model never reaches the
//! scheduler with an operator that would fail on its first tick.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod kind;
pub mod linalg;
pub mod nonlinearity;
pub mod operator;

pub use error::{NonlinearityError, ShapeMismatchError};
pub use kind::OpKind;
pub use nonlinearity::{Direct, Nonlinearity};
pub use operator::{CopyOp, DotIncOp, NamedOp, NonLinOp, Operator, ResetOp, Roles};
