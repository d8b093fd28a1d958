//! sigsim: signal-flow simulation with automatic operator scheduling.
//!
//! A model is a set of named base signals (flat numeric buffers), views
//! into them, and operators that read, set, or increment those views. The
//! runtime derives an execution order from the operators' roles once, then
//! steps the model tick by tick with fixed `dt`. This facade re-exports the
//! sub-crates; most users only need the [`prelude`].
//!
//! # Quick start
//!
//! ```rust
//! use sigsim::prelude::*;
//!
//! let mut model = ModelBuilder::new();
//! let x = model.signal_with_values("x", vec![1.0, -2.0]).unwrap();
//! let y = model.signal("y", 2).unwrap();
//! model
//!     .nonlin("relu", y.clone(), x, Direct::elementwise("relu", |v| v.max(0.0)))
//!     .unwrap();
//! let probe = model.add_probe(Probe::new(y)).unwrap();
//!
//! let mut sim = model.build().unwrap();
//! sim.run_for(0.005).unwrap();
//! assert_eq!(sim.step_count(), 5);
//! assert_eq!(sim.probe_data(probe).unwrap().last(), Some(&[1.0, 0.0][..]));
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `sigsim-core` | Base signals, views, IDs, dtypes |
//! | [`arena`] | `sigsim-arena` | Buffer storage and strided windows |
//! | [`ops`] | `sigsim-ops` | Operators and the nonlinearity trait |
//! | [`sched`] | `sigsim-sched` | Alias analysis and schedule derivation |
//! | [`engine`] | `sigsim-engine` | Model builder and stepping runtime |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Signals, views, and IDs (`sigsim-core`).
pub use sigsim_core as types;

/// Buffer storage (`sigsim-arena`).
///
/// The simulator owns its arena; this module is mostly useful for
/// [`arena::ArenaError`] returned from
/// [`Simulator::read_view`](engine::Simulator::read_view).
pub use sigsim_arena as arena;

/// Operators and nonlinearities (`sigsim-ops`).
///
/// [`ops::Nonlinearity`] is the extension point for user-defined
/// element-wise or stateful updates.
pub use sigsim_ops as ops;

/// Alias analysis and scheduling (`sigsim-sched`).
///
/// [`sched::build_schedule`] can be called directly to inspect an order
/// without allocating buffers.
pub use sigsim_sched as sched;

/// Model building and the runtime (`sigsim-engine`).
pub use sigsim_engine as engine;

/// Common imports for typical sigsim usage.
pub mod prelude {
    // Signals and views
    pub use sigsim_core::{BaseId, BaseSignal, DType, InitialValue, ProbeId, SignalTable, View};

    // Operators
    pub use sigsim_ops::{Direct, NamedOp, Nonlinearity, NonlinearityError, Operator};

    // Scheduling
    pub use sigsim_sched::{AliasPolicy, Schedule, ScheduleError};

    // Engine
    pub use sigsim_engine::{
        build, build_with_config, BuildError, CancelToken, ModelBuilder, Probe, ProbeData,
        RunOutcome, SimConfig, SimState, Simulator, StepError, StepErrorKind, StepMetrics,
    };
}
