//! Build-time and runtime errors.

use sigsim_arena::ArenaError;
use sigsim_core::{ProbeId, ShapeError};
use sigsim_ops::{NonlinearityError, ShapeMismatchError};
use sigsim_sched::ScheduleError;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors that prevent a simulator from being built.
///
/// All of these are raised before the first tick and name the offending
/// operator, probe, or signal.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum BuildError {
    /// The configuration is invalid.
    #[error("config: {0}")]
    Config(#[from] ConfigError),
    /// A signal or view is malformed.
    #[error("signal: {0}")]
    Shape(#[from] ShapeError),
    /// An operator's views have inconsistent shapes.
    #[error("operator '{op}': {source}")]
    ShapeMismatch {
        /// Name of the operator.
        op: String,
        /// The shape check that failed.
        #[source]
        source: ShapeMismatchError,
    },
    /// An operator's view does not fit its base signal.
    #[error("operator '{op}': {source}")]
    OperatorView {
        /// Name of the operator.
        op: String,
        /// The view check that failed.
        #[source]
        source: ShapeError,
    },
    /// The operators cannot be scheduled.
    #[error("schedule: {0}")]
    Schedule(#[from] ScheduleError),
    /// An operator sets or increments a signal owned by the runtime.
    #[error("operator '{op}' writes runtime-owned signal '{signal}'")]
    ReservedSignal {
        /// Name of the operator.
        op: String,
        /// Name of the reserved signal.
        signal: String,
    },
    /// A nonlinearity was built for a different timestep than the model's.
    #[error("operator '{op}' steps with dt {op_dt} but the model runs at dt {dt}")]
    DtMismatch {
        /// Name of the operator.
        op: String,
        /// The operator's timestep.
        op_dt: f64,
        /// The configured timestep.
        dt: f64,
    },
    /// A probe's sampling period is not a positive multiple of `dt`.
    #[error("probe {probe} samples every {sample_every}s, which is not a positive multiple of dt {dt}")]
    InvalidProbePeriod {
        /// The offending probe.
        probe: ProbeId,
        /// Requested period in seconds.
        sample_every: f64,
        /// The configured timestep.
        dt: f64,
    },
    /// A probe's view does not fit its base signal.
    #[error("probe {probe}: {source}")]
    ProbeView {
        /// The offending probe.
        probe: ProbeId,
        /// The view check that failed.
        #[source]
        source: ShapeError,
    },
    /// Buffer allocation or view resolution failed.
    #[error("arena: {0}")]
    Arena(#[from] ArenaError),
}

/// Error returned from [`Simulator::step`](crate::Simulator::step) and the
/// run methods built on it.
#[derive(Clone, Debug, PartialEq, Error)]
#[error("step {step}: {kind}")]
pub struct StepError {
    /// The 1-based tick that failed.
    pub step: u64,
    /// What went wrong.
    #[source]
    pub kind: StepErrorKind,
}

/// Cause of a [`StepError`].
#[derive(Clone, Debug, PartialEq, Error)]
pub enum StepErrorKind {
    /// A nonlinearity's update failed.
    #[error("operator '{op}': {source}")]
    Nonlinearity {
        /// Name of the operator.
        op: String,
        /// The nonlinearity's error.
        #[source]
        source: NonlinearityError,
    },
    /// Moving values in or out of the arena failed.
    #[error("operator '{op}': {source}")]
    Arena {
        /// Name of the operator, or `<clock>` for runtime-owned writes.
        op: String,
        /// The arena's error.
        #[source]
        source: ArenaError,
    },
    /// A kernel's operands no longer match their validated shapes.
    #[error("operator '{op}': {source}")]
    Kernel {
        /// Name of the operator.
        op: String,
        /// The shape check that failed.
        #[source]
        source: ShapeMismatchError,
    },
    /// A written view holds NaN or infinity (only with
    /// [`SimConfig::check_finite`](crate::SimConfig::check_finite)).
    #[error("operator '{op}' wrote a non-finite value to '{signal}' at element {index}")]
    NonFinite {
        /// Name of the operator.
        op: String,
        /// Name of the written signal.
        signal: String,
        /// Index within the written view.
        index: usize,
    },
    /// A probe reached
    /// [`SimConfig::max_probe_samples`](crate::SimConfig::max_probe_samples).
    #[error("probe {probe} exceeded its capacity of {capacity} samples")]
    ProbeCapacityExceeded {
        /// The full probe.
        probe: ProbeId,
        /// The configured capacity.
        capacity: usize,
    },
    /// An earlier tick failed; the simulator must be rebuilt.
    #[error("simulator is poisoned by an earlier failure")]
    Poisoned,
    /// `run_for` was given a NaN, infinite, or negative duration.
    #[error("duration must be finite and non-negative, got {value}")]
    InvalidDuration {
        /// The rejected duration.
        value: f64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn step_error_chains_sources() {
        let err = StepError {
            step: 3,
            kind: StepErrorKind::Nonlinearity {
                op: "lif".into(),
                source: NonlinearityError::ExecutionFailed {
                    reason: "boom".into(),
                },
            },
        };
        assert_eq!(
            err.to_string(),
            "step 3: operator 'lif': execution failed: boom"
        );
        let kind = err.source().unwrap();
        assert!(kind.source().unwrap().to_string().contains("boom"));
    }

    #[test]
    fn build_error_from_schedule() {
        let err: BuildError = ScheduleError::CyclicDependency {
            operators: vec!["a".into(), "b".into()],
        }
        .into();
        assert_eq!(
            err.to_string(),
            "schedule: dependency cycle among operators: a, b"
        );
    }
}
