//! Cooperative cancellation of multi-step runs.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared flag checked between ticks.
///
/// Clones share the flag, so one clone can be handed to another thread
/// (or a signal handler) while the simulator runs with the other. A tick
/// in progress always completes.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// A token that has not been cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// How a cancellable run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every requested tick ran.
    Completed {
        /// Ticks executed by this call.
        steps: u64,
    },
    /// The token was cancelled before all requested ticks ran.
    Cancelled {
        /// Ticks executed by this call before cancellation.
        steps: u64,
    },
}

impl RunOutcome {
    /// Ticks executed by the call.
    pub fn steps(self) -> u64 {
        match self {
            Self::Completed { steps } | Self::Cancelled { steps } => steps,
        }
    }
}
