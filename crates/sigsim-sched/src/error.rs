//! Scheduling errors.

use thiserror::Error;

/// Model-construction errors raised while deriving the schedule.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ScheduleError {
    /// More than one operator sets the same view, or views that alias.
    #[error("view {view} is set by more than one operator: {}", writers.join(", "))]
    MultipleWriters {
        /// Description of the contested view.
        view: String,
        /// Names of the setting operators, in insertion order.
        writers: Vec<String>,
    },
    /// Two views on the same base could not be proven disjoint, and the
    /// active policy does not allow assuming they overlap.
    #[error(
        "cannot decide whether {first} and {second} alias (operators: {})",
        operators.join(", ")
    )]
    UnsupportedAliasing {
        /// Description of the first view.
        first: String,
        /// Description of the second view.
        second: String,
        /// Operators whose ordering depends on the pair.
        operators: Vec<String>,
    },
    /// The ordering constraints form a cycle.
    #[error("dependency cycle among operators: {}", operators.join(", "))]
    CyclicDependency {
        /// Operators that could not be ordered, in insertion order.
        operators: Vec<String>,
    },
}
