//! Simulation configuration and its validation.

use sigsim_sched::AliasPolicy;
use thiserror::Error;

/// Timestep used when none is configured, in seconds.
pub const DEFAULT_DT: f64 = 0.001;

/// Relative tolerance for treating a duration or sampling period as an
/// exact multiple of `dt`.
const RATIO_EPSILON: f64 = 1e-9;

/// Errors detected by [`SimConfig::validate`].
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// `dt` is NaN, infinite, zero, or negative.
    #[error("dt must be finite and positive, got {value}")]
    InvalidDt {
        /// The rejected timestep.
        value: f64,
    },
    /// `max_probe_samples` is `Some(0)`, which would fail the first sample.
    #[error("max_probe_samples must be at least 1")]
    ZeroProbeCapacity,
}

/// Runtime-wide settings, fixed when the simulator is built.
#[derive(Clone, Debug, PartialEq)]
pub struct SimConfig {
    /// Length of one tick in seconds. Default: 0.001.
    pub dt: f64,
    /// Handling of view pairs whose aliasing cannot be decided.
    /// Default: [`AliasPolicy::Conservative`].
    pub alias_policy: AliasPolicy,
    /// Scan every written view for NaN or infinity after each operator.
    /// Default: off.
    pub check_finite: bool,
    /// Upper bound on samples per probe. `None` (default) is unbounded.
    pub max_probe_samples: Option<usize>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            dt: DEFAULT_DT,
            alias_policy: AliasPolicy::default(),
            check_finite: false,
            max_probe_samples: None,
        }
    }
}

impl SimConfig {
    /// Default configuration with the given timestep.
    pub fn with_dt(dt: f64) -> Self {
        Self {
            dt,
            ..Self::default()
        }
    }

    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.dt.is_finite() || self.dt <= 0.0 {
            return Err(ConfigError::InvalidDt { value: self.dt });
        }
        if self.max_probe_samples == Some(0) {
            return Err(ConfigError::ZeroProbeCapacity);
        }
        Ok(())
    }

    /// Number of ticks covering `duration` seconds: `ceil(duration / dt)`.
    ///
    /// Ratios within a relative 1e-9 of an integer snap to it, so
    /// `10 * dt` is ten steps even when the division lands a hair above.
    /// The caller checks that `duration` is finite and non-negative.
    pub fn steps_for(&self, duration: f64) -> u64 {
        let ratio = duration / self.dt;
        match snap(ratio) {
            Some(n) => n,
            None => ratio.ceil() as u64,
        }
    }
}

/// The integer nearest to `ratio`, if `ratio` is within tolerance of it.
pub(crate) fn snap(ratio: f64) -> Option<u64> {
    let nearest = ratio.round();
    if (ratio - nearest).abs() <= RATIO_EPSILON * nearest.max(1.0) {
        Some(nearest as u64)
    } else {
        None
    }
}
