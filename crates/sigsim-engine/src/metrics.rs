//! Per-tick performance metrics.

use sigsim_ops::OpKind;

/// Timing data for the most recent tick.
///
/// All durations are in microseconds.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StepMetrics {
    /// Wall-clock time for the whole tick.
    pub total_us: u64,
    /// Time spent executing operators, indexed by [`OpKind::index`].
    pub operator_us: [u64; OpKind::COUNT],
    /// Time spent copying probed views into their records.
    pub probe_us: u64,
    /// Number of operators executed.
    pub operators_executed: usize,
    /// Number of probe samples taken.
    pub samples_taken: usize,
}

impl StepMetrics {
    /// Operator time for one kind.
    pub fn operator_time(&self, kind: OpKind) -> u64 {
        self.operator_us[kind.index()]
    }
}
