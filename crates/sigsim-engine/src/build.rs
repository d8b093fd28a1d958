//! Model construction: the [`ModelBuilder`] and the free [`build`] entry
//! points.

use sigsim_core::{
    BaseId, BaseSignal, DType, InitialValue, OpId, ProbeId, SignalKind, SignalTable, View,
};
use sigsim_ops::{NamedOp, Nonlinearity, Operator, ShapeMismatchError};

use crate::config::SimConfig;
use crate::error::BuildError;
use crate::probe::Probe;
use crate::simulator::Simulator;

/// Incrementally assembles a model, validating each piece as it is added.
///
/// Operators are checked against the registered signals when they are
/// added, so a bad view or a write to a runtime-owned signal is reported
/// at the call that introduced it rather than at [`build`](Self::build).
///
/// # Examples
///
/// ```
/// use sigsim_engine::{ModelBuilder, Probe};
///
/// let mut model = ModelBuilder::new();
/// let s = model.signal("s", 1).unwrap();
/// let w = model.signal_with_values("w", vec![2.0]).unwrap();
/// let one = model.signal_with_values("one", vec![1.0]).unwrap();
/// model.reset("clear", s.clone(), 0.0).unwrap();
/// model.dot_inc("drive", w, one, s.clone(), false).unwrap();
/// let probe = model.add_probe(Probe::new(s)).unwrap();
///
/// let mut sim = model.build().unwrap();
/// sim.run_steps(3).unwrap();
/// assert_eq!(sim.probe_data(probe).unwrap().last(), Some(&[2.0][..]));
/// ```
#[derive(Debug, Default)]
pub struct ModelBuilder {
    config: SimConfig,
    table: SignalTable,
    ops: Vec<NamedOp>,
    probes: Vec<Probe>,
    time: Option<View>,
    step: Option<View>,
}

impl ModelBuilder {
    /// A builder using [`SimConfig::default`].
    pub fn new() -> Self {
        Self::default()
    }

    /// A builder for a model that will run with `config`.
    pub fn with_config(config: SimConfig) -> Result<Self, BuildError> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::default()
        })
    }

    /// The configuration the model will be built with.
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Signals registered so far.
    pub fn signals(&self) -> &SignalTable {
        &self.table
    }

    /// Operators added so far, in insertion order.
    pub fn operators(&self) -> &[NamedOp] {
        &self.ops
    }

    /// Register a base signal.
    pub fn add_signal(&mut self, signal: BaseSignal) -> Result<BaseId, BuildError> {
        Ok(self.table.add(signal)?)
    }

    /// Register a zero-initialized `Float64` signal and return its whole view.
    pub fn signal(&mut self, name: impl Into<String>, len: usize) -> Result<View, BuildError> {
        let id = self.add_signal(BaseSignal::zeros(name, len))?;
        Ok(self.table.whole(id)?)
    }

    /// Register a `Float64` signal with initial values and return its whole
    /// view.
    pub fn signal_with_values(
        &mut self,
        name: impl Into<String>,
        values: Vec<f64>,
    ) -> Result<View, BuildError> {
        let id = self.add_signal(BaseSignal::from_values(name, values))?;
        Ok(self.table.whole(id)?)
    }

    /// A checked view into a registered base.
    pub fn view(
        &self,
        base: BaseId,
        shape: &[usize],
        offset: usize,
        strides: &[isize],
    ) -> Result<View, BuildError> {
        Ok(self.table.make_view(base, shape, offset, strides)?)
    }

    /// A checked row-major view into a registered base.
    pub fn contiguous_view(
        &self,
        base: BaseId,
        shape: &[usize],
        offset: usize,
    ) -> Result<View, BuildError> {
        Ok(self.table.make_contiguous_view(base, shape, offset)?)
    }

    /// The simulation time signal, in seconds, created on first use.
    ///
    /// At the start of tick `n` (1-based) the runtime writes `n * dt`, the
    /// time the tick advances to. Operators may read it but not write it.
    pub fn time(&mut self) -> Result<View, BuildError> {
        if let Some(view) = &self.time {
            return Ok(view.clone());
        }
        let view = self.clock_signal("time", SignalKind::Time)?;
        self.time = Some(view.clone());
        Ok(view)
    }

    /// The step counter signal, created on first use.
    ///
    /// The runtime writes the 1-based number of the tick being executed.
    pub fn step_signal(&mut self) -> Result<View, BuildError> {
        if let Some(view) = &self.step {
            return Ok(view.clone());
        }
        let view = self.clock_signal("step", SignalKind::Step)?;
        self.step = Some(view.clone());
        Ok(view)
    }

    fn clock_signal(&mut self, name: &str, kind: SignalKind) -> Result<View, BuildError> {
        let id = self.add_signal(BaseSignal {
            name: name.to_string(),
            len: 1,
            dtype: DType::Float64,
            initial: InitialValue::Zeros,
            kind,
        })?;
        Ok(self.table.whole(id)?)
    }

    /// Add a constructed operator.
    pub fn add_op(&mut self, name: impl Into<String>, op: Operator) -> Result<OpId, BuildError> {
        let named = NamedOp::new(name, op);
        check_operator(&self.table, &named, self.config.dt)?;
        let id = OpId(self.ops.len() as u32);
        self.ops.push(named);
        Ok(id)
    }

    /// Add `dst ← value`.
    pub fn reset(&mut self, name: &str, dst: View, value: f64) -> Result<OpId, BuildError> {
        self.add_op(name, Operator::reset(dst, value))
    }

    /// Add `dst ← src`.
    pub fn copy(&mut self, name: &str, dst: View, src: View) -> Result<OpId, BuildError> {
        let op = Operator::copy(dst, src).map_err(|e| mismatch(name, e))?;
        self.add_op(name, op)
    }

    /// Add `y ← y + dot(a, x)` (or `dot(a, xᵀ)`).
    pub fn dot_inc(
        &mut self,
        name: &str,
        a: View,
        x: View,
        y: View,
        transpose_x: bool,
    ) -> Result<OpId, BuildError> {
        let op = Operator::dot_inc(a, x, y, transpose_x).map_err(|e| mismatch(name, e))?;
        self.add_op(name, op)
    }

    /// Add `output ← f(input)`, stepped at the model's `dt`.
    pub fn nonlin(
        &mut self,
        name: &str,
        output: View,
        input: View,
        nonlinearity: impl Nonlinearity,
    ) -> Result<OpId, BuildError> {
        let op = Operator::nonlin(output, input, nonlinearity, self.config.dt)
            .map_err(|e| mismatch(name, e))?;
        self.add_op(name, op)
    }

    /// Register a probe.
    pub fn add_probe(&mut self, probe: Probe) -> Result<ProbeId, BuildError> {
        let id = ProbeId(self.probes.len() as u32);
        check_probe(&self.table, id, &probe, self.config.dt)?;
        self.probes.push(probe);
        Ok(id)
    }

    /// Derive the schedule and allocate the simulator.
    pub fn build(self) -> Result<Simulator, BuildError> {
        build_with_config(self.table, self.ops, self.probes, self.config)
    }
}

fn mismatch(name: &str, source: ShapeMismatchError) -> BuildError {
    BuildError::ShapeMismatch {
        op: name.to_string(),
        source,
    }
}

/// Check an operator's views against the table and the model's `dt`.
pub(crate) fn check_operator(
    table: &SignalTable,
    named: &NamedOp,
    dt: f64,
) -> Result<(), BuildError> {
    for view in named.op.views() {
        table
            .check_view(view)
            .map_err(|source| BuildError::OperatorView {
                op: named.name.clone(),
                source,
            })?;
    }
    for view in named.op.writes() {
        if let Some(signal) = table.get(view.base) {
            if signal.kind.is_reserved() {
                return Err(BuildError::ReservedSignal {
                    op: named.name.clone(),
                    signal: signal.name.clone(),
                });
            }
        }
    }
    if let Operator::NonLin(op) = &named.op {
        if op.dt() != dt {
            return Err(BuildError::DtMismatch {
                op: named.name.clone(),
                op_dt: op.dt(),
                dt,
            });
        }
    }
    Ok(())
}

/// Check a probe's view and sampling period.
pub(crate) fn check_probe(
    table: &SignalTable,
    id: ProbeId,
    probe: &Probe,
    dt: f64,
) -> Result<u64, BuildError> {
    table
        .check_view(&probe.view)
        .map_err(|source| BuildError::ProbeView { probe: id, source })?;
    probe.period_steps(id, dt)
}

/// Build a simulator running at `dt` with otherwise default settings.
///
/// Fails with [`BuildError::Schedule`] for multiple writers, cycles, or
/// undecidable aliasing, and with a shape or view error naming the
/// offending operator or probe.
pub fn build(
    signals: SignalTable,
    operators: Vec<NamedOp>,
    probes: Vec<Probe>,
    dt: f64,
) -> Result<Simulator, BuildError> {
    build_with_config(signals, operators, probes, SimConfig::with_dt(dt))
}

/// Build a simulator with explicit settings.
pub fn build_with_config(
    signals: SignalTable,
    operators: Vec<NamedOp>,
    probes: Vec<Probe>,
    config: SimConfig,
) -> Result<Simulator, BuildError> {
    config.validate()?;
    for named in &operators {
        check_operator(&signals, named, config.dt)?;
    }
    Simulator::new(signals, operators, probes, config)
}
