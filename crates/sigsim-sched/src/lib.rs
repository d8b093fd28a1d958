//! Aliasing analysis and operator scheduling for sigsim.
//!
//! [`build_schedule`] runs once when a simulator is built. It indexes the
//! operators by the role each plays on each view, rejects models where a
//! view has more than one setter, derives ordering edges between operators
//! whose views alias, and sorts the resulting [`DependencyGraph`] into the
//! linear order the runtime executes every tick.
//!
//! Ordering rules, for every pair of aliased views `(v, w)`:
//!
//! - a setter of `v` runs before any incrementer of `w`;
//! - a setter or incrementer of `v` runs before any reader of `w`.
//!
//! Ties are broken by insertion order, so the same operator list always
//! yields the same schedule.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod alias;
pub mod error;
pub mod graph;
pub mod schedule;

pub use alias::{overlap, overlaps, AliasPolicy, Overlap};
pub use error::ScheduleError;
pub use graph::DependencyGraph;
pub use schedule::{build_schedule, Schedule};
