//! Model building and the stepping runtime for sigsim.
//!
//! A [`ModelBuilder`] (or the free [`build`] function) validates a set of
//! base signals, operators, and probes, derives the schedule once, and
//! produces a [`Simulator`]. The simulator owns every buffer and executes
//! the scheduled operators synchronously, one tick per
//! [`step`](Simulator::step).

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod build;
pub mod cancel;
pub mod config;
pub mod error;
mod exec;
pub mod metrics;
pub mod probe;
pub mod simulator;

pub use build::{build, build_with_config, ModelBuilder};
pub use cancel::{CancelToken, RunOutcome};
pub use config::{ConfigError, SimConfig};
pub use error::{BuildError, StepError, StepErrorKind};
pub use metrics::StepMetrics;
pub use probe::{Probe, ProbeData};
pub use simulator::{SimState, Simulator};
