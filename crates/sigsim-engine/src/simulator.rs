//! The stepping runtime.
//!
//! A [`Simulator`] is the single owner of a model's buffers. Each tick it
//! writes the clock signals, executes the scheduled operators in order,
//! and samples the probes that are due. The schedule is derived once when
//! the simulator is built and is never recomputed, not even by
//! [`reset`](Simulator::reset).

use std::time::Instant;

use sigsim_arena::{SignalArena, Window};
use sigsim_core::{BaseId, ProbeId, SignalKind, SignalTable, View};
use sigsim_ops::NamedOp;
use sigsim_sched::{build_schedule, Schedule};
use tracing::{debug, error, info, instrument, trace};

use crate::build::check_probe;
use crate::cancel::{CancelToken, RunOutcome};
use crate::config::SimConfig;
use crate::error::{BuildError, StepError, StepErrorKind};
use crate::exec::{BoundOp, Scratch};
use crate::metrics::StepMetrics;
use crate::probe::{Probe, ProbeData};

/// Lifecycle state of a [`Simulator`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimState {
    /// Freshly built or reset; no tick has run since.
    Built,
    /// At least one tick has run.
    Running,
    /// A tick failed. Further steps are refused until the model is rebuilt.
    Poisoned,
}

struct ProbeSlot {
    window: Window,
    period: u64,
    data: ProbeData,
}

#[derive(Clone, Copy, Debug, Default)]
struct Clock {
    time: Option<BaseId>,
    step: Option<BaseId>,
}

/// A built model, ready to step.
pub struct Simulator {
    config: SimConfig,
    table: SignalTable,
    arena: SignalArena,
    /// Operators in execution order.
    ops: Vec<BoundOp>,
    schedule: Schedule,
    probes: Vec<ProbeSlot>,
    clock: Clock,
    step_count: u64,
    state: SimState,
    last_metrics: StepMetrics,
    scratch: Scratch,
}

impl Simulator {
    /// Schedule the operators, allocate buffers, and resolve every view.
    ///
    /// Callers go through [`build`](crate::build()) or
    /// [`ModelBuilder::build`](crate::ModelBuilder::build), which check
    /// the operators first.
    pub(crate) fn new(
        table: SignalTable,
        operators: Vec<NamedOp>,
        probes: Vec<Probe>,
        config: SimConfig,
    ) -> Result<Self, BuildError> {
        let schedule = build_schedule(&operators, &table, config.alias_policy)?;
        let arena = SignalArena::new(&table);

        // Bind in execution order.
        let mut rank = vec![0usize; operators.len()];
        for (position, &op) in schedule.order().iter().enumerate() {
            rank[op] = position;
        }
        let mut ranked: Vec<(usize, NamedOp)> = operators
            .into_iter()
            .enumerate()
            .map(|(i, op)| (rank[i], op))
            .collect();
        ranked.sort_by_key(|(position, _)| *position);
        let ops = ranked
            .into_iter()
            .map(|(_, named)| {
                let description = named.op.describe(&table);
                BoundOp::bind(named, description, &arena)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut slots = Vec::with_capacity(probes.len());
        for (i, probe) in probes.iter().enumerate() {
            let id = ProbeId(i as u32);
            let period = check_probe(&table, id, probe, config.dt)?;
            slots.push(ProbeSlot {
                window: arena.resolve(&probe.view)?,
                period,
                data: ProbeData::new(probe.view.shape.clone()),
            });
        }

        let mut clock = Clock::default();
        for (id, signal) in table.iter() {
            match signal.kind {
                SignalKind::Time => clock.time = Some(id),
                SignalKind::Step => clock.step = Some(id),
                SignalKind::State => {}
            }
        }

        for op in &ops {
            debug!(op = %op.name, kind = %op.kind, "scheduled {}", op.description);
        }
        info!(
            bases = table.len(),
            elements = arena.len(),
            operators = ops.len(),
            edges = schedule.graph().edge_count(),
            probes = slots.len(),
            dt = config.dt,
            "simulator built"
        );

        Ok(Self {
            config,
            table,
            arena,
            ops,
            schedule,
            probes: slots,
            clock,
            step_count: 0,
            state: SimState::Built,
            last_metrics: StepMetrics::default(),
            scratch: Scratch::default(),
        })
    }

    /// Execute one tick.
    ///
    /// On error the simulator is poisoned: buffers may hold a partially
    /// executed tick, and every later call fails with
    /// [`StepErrorKind::Poisoned`].
    #[instrument(level = "trace", skip_all, fields(step = self.step_count + 1))]
    pub fn step(&mut self) -> Result<(), StepError> {
        let tick = self.step_count + 1;
        if self.state == SimState::Poisoned {
            error!(step = tick, "step refused: simulator is poisoned");
            return Err(StepError {
                step: tick,
                kind: StepErrorKind::Poisoned,
            });
        }
        match self.execute_tick(tick) {
            Ok(()) => {
                self.state = SimState::Running;
                trace!(step = self.step_count, "tick complete");
                Ok(())
            }
            Err(kind) => {
                self.state = SimState::Poisoned;
                error!(step = tick, error = %kind, "tick failed; simulator poisoned");
                Err(StepError { step: tick, kind })
            }
        }
    }

    fn execute_tick(&mut self, tick: u64) -> Result<(), StepErrorKind> {
        let tick_start = Instant::now();
        let mut metrics = StepMetrics::default();

        self.write_clock(tick)?;

        for op in &mut self.ops {
            let op_start = Instant::now();
            op.execute(&mut self.arena, &mut self.scratch)?;
            if self.config.check_finite {
                for window in op.written() {
                    if let Some(index) = self.arena.first_non_finite(window) {
                        return Err(StepErrorKind::NonFinite {
                            op: op.name.clone(),
                            signal: self.table.name_of(window.base()).to_string(),
                            index,
                        });
                    }
                }
            }
            metrics.operator_us[op.kind.index()] += op_start.elapsed().as_micros() as u64;
            metrics.operators_executed += 1;
        }
        self.step_count = tick;

        let probe_start = Instant::now();
        for (i, slot) in self.probes.iter_mut().enumerate() {
            if tick % slot.period != 0 {
                continue;
            }
            if let Some(capacity) = self.config.max_probe_samples {
                if slot.data.len() >= capacity {
                    return Err(StepErrorKind::ProbeCapacityExceeded {
                        probe: ProbeId(i as u32),
                        capacity,
                    });
                }
            }
            self.arena.gather(&slot.window, &mut self.scratch.sample);
            slot.data.push(&self.scratch.sample);
            metrics.samples_taken += 1;
        }
        metrics.probe_us = probe_start.elapsed().as_micros() as u64;
        metrics.total_us = tick_start.elapsed().as_micros() as u64;
        self.last_metrics = metrics;
        Ok(())
    }

    fn write_clock(&mut self, tick: u64) -> Result<(), StepErrorKind> {
        let clock_err = |source| StepErrorKind::Arena {
            op: "<clock>".to_string(),
            source,
        };
        if let Some(time) = self.clock.time {
            self.arena
                .write_base(time, &[tick as f64 * self.config.dt])
                .map_err(clock_err)?;
        }
        if let Some(step) = self.clock.step {
            self.arena
                .write_base(step, &[tick as f64])
                .map_err(clock_err)?;
        }
        Ok(())
    }

    /// Execute `n` ticks, stopping at the first error.
    #[instrument(skip(self))]
    pub fn run_steps(&mut self, n: u64) -> Result<(), StepError> {
        for _ in 0..n {
            self.step()?;
        }
        Ok(())
    }

    /// Advance by `duration` seconds: `ceil(duration / dt)` ticks.
    ///
    /// Repeated calls accumulate; `run_for(T)` twice is `run_for(2T)` up
    /// to rounding of each call.
    #[instrument(skip(self))]
    pub fn run_for(&mut self, duration: f64) -> Result<(), StepError> {
        let steps = self.steps_for(duration)?;
        self.run_steps(steps)
    }

    /// Like [`run_steps`](Self::run_steps), checking `token` between ticks.
    #[instrument(skip(self, token))]
    pub fn run_steps_cancellable(
        &mut self,
        n: u64,
        token: &CancelToken,
    ) -> Result<RunOutcome, StepError> {
        for done in 0..n {
            if token.is_cancelled() {
                info!(steps = done, requested = n, "run cancelled");
                return Ok(RunOutcome::Cancelled { steps: done });
            }
            self.step()?;
        }
        Ok(RunOutcome::Completed { steps: n })
    }

    /// Like [`run_for`](Self::run_for), checking `token` between ticks.
    pub fn run_for_cancellable(
        &mut self,
        duration: f64,
        token: &CancelToken,
    ) -> Result<RunOutcome, StepError> {
        let steps = self.steps_for(duration)?;
        self.run_steps_cancellable(steps, token)
    }

    fn steps_for(&self, duration: f64) -> Result<u64, StepError> {
        if !duration.is_finite() || duration < 0.0 {
            error!(duration, "invalid run duration");
            return Err(StepError {
                step: self.step_count,
                kind: StepErrorKind::InvalidDuration { value: duration },
            });
        }
        Ok(self.config.steps_for(duration))
    }

    /// Restore every buffer to its initial value, reset nonlinearity state,
    /// clear probe records, and rewind the step count to zero.
    ///
    /// The schedule is kept. A poisoned simulator stays poisoned.
    pub fn reset(&mut self) {
        self.arena.restore_initial();
        for op in &mut self.ops {
            op.reset();
        }
        for slot in &mut self.probes {
            slot.data.clear();
        }
        self.step_count = 0;
        self.last_metrics = StepMetrics::default();
        if self.state != SimState::Poisoned {
            self.state = SimState::Built;
        }
        info!(state = ?self.state, "simulator reset");
    }

    /// Samples recorded by a probe.
    pub fn probe_data(&self, probe: ProbeId) -> Option<&ProbeData> {
        self.probes.get(probe.0 as usize).map(|slot| &slot.data)
    }

    /// Number of probes.
    pub fn probe_count(&self) -> usize {
        self.probes.len()
    }

    /// Ticks completed since build or the last reset.
    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    /// Simulated seconds since build or the last reset: `step_count * dt`.
    pub fn elapsed_time(&self) -> f64 {
        self.step_count as f64 * self.config.dt
    }

    /// The configured timestep.
    pub fn dt(&self) -> f64 {
        self.config.dt
    }

    /// The configuration the simulator was built with.
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Lifecycle state.
    pub fn state(&self) -> SimState {
        self.state
    }

    /// Whether an earlier tick failed.
    pub fn is_poisoned(&self) -> bool {
        self.state == SimState::Poisoned
    }

    /// The derived execution order and dependency graph. Indices refer to
    /// the operators' insertion order.
    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    /// Operator names in execution order.
    pub fn operator_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.ops.iter().map(|op| op.name.as_str())
    }

    /// Operator descriptions in execution order.
    pub fn operator_descriptions(&self) -> impl Iterator<Item = &str> + '_ {
        self.ops.iter().map(|op| op.description.as_str())
    }

    /// The registered signals.
    pub fn signals(&self) -> &SignalTable {
        &self.table
    }

    /// Current contents of a whole base signal, looked up by name.
    pub fn signal(&self, name: &str) -> Option<&[f64]> {
        self.arena.base(self.table.find(name)?)
    }

    /// Current contents of a view, row-major.
    pub fn read_view(&self, view: &View) -> Result<Vec<f64>, sigsim_arena::ArenaError> {
        let window = self.arena.resolve(view)?;
        let mut out = Vec::with_capacity(window.len());
        self.arena.gather(&window, &mut out);
        Ok(out)
    }

    /// Metrics from the most recent successful tick.
    pub fn last_metrics(&self) -> &StepMetrics {
        &self.last_metrics
    }

    /// Bytes held by signal storage.
    pub fn memory_bytes(&self) -> usize {
        self.arena.memory_bytes()
    }
}

impl std::fmt::Debug for Simulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulator")
            .field("state", &self.state)
            .field("step_count", &self.step_count)
            .field("dt", &self.config.dt)
            .field("operators", &self.ops.len())
            .field("probes", &self.probes.len())
            .finish_non_exhaustive()
    }
}
