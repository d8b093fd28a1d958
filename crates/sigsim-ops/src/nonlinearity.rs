//! The [`Nonlinearity`] trait and the [`Direct`] reference implementation.
//!
//! A nonlinearity is the state-transition function behind a
//! [`NonLinOp`](crate::NonLinOp): each tick it maps the input view to the
//! output view, possibly updating private state (membrane voltages,
//! refractory timers, filters). Neuron-model mathematics lives outside
//! this crate; anything that implements the trait can be scheduled.

use std::fmt;

use crate::error::NonlinearityError;

/// A stateful per-tick transfer function.
///
/// # Contract
///
/// - `step()` MUST write every element of `output`.
/// - `step()` MUST be deterministic given its state and input; the
///   runtime relies on this for bit-identical replays after `reset()`.
/// - `reset()` MUST return the private state to its construction-time
///   value.
///
/// # Examples
///
/// A rectifier with no state:
///
/// ```
/// use sigsim_ops::{Nonlinearity, NonlinearityError};
///
/// struct Relu;
///
/// impl Nonlinearity for Relu {
///     fn name(&self) -> &str { "relu" }
///
///     fn step(
///         &mut self,
///         _dt: f64,
///         input: &[f64],
///         output: &mut [f64],
///     ) -> Result<(), NonlinearityError> {
///         for (o, &i) in output.iter_mut().zip(input) {
///             *o = i.max(0.0);
///         }
///         Ok(())
///     }
/// }
///
/// let mut relu = Relu;
/// let mut out = [0.0; 2];
/// relu.step(0.001, &[-1.0, 2.0], &mut out).unwrap();
/// assert_eq!(out, [0.0, 2.0]);
/// ```
pub trait Nonlinearity: Send + 'static {
    /// Human-readable name for error reporting and telemetry.
    fn name(&self) -> &str;

    /// Advance one tick of length `dt`, writing the full `output`.
    fn step(&mut self, dt: f64, input: &[f64], output: &mut [f64])
        -> Result<(), NonlinearityError>;

    /// Restore construction-time state. Default: stateless, nothing to do.
    fn reset(&mut self) {}

    /// Check operand sizes when the operator is built.
    ///
    /// Default: input and output must have the same number of elements.
    fn check_sizes(&self, input: usize, output: usize) -> Result<(), String> {
        if input == output {
            Ok(())
        } else {
            Err("input and output sizes differ".to_string())
        }
    }
}

type DirectFn = Box<dyn FnMut(&[f64], &mut [f64]) + Send>;

/// A stateless nonlinearity backed by a closure.
///
/// The closure receives the gathered input and the output buffer and must
/// fill the output.
pub struct Direct {
    name: String,
    func: DirectFn,
}

impl Direct {
    /// Wrap a closure that fills `output` from `input`.
    pub fn new(
        name: impl Into<String>,
        func: impl FnMut(&[f64], &mut [f64]) + Send + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            func: Box::new(func),
        }
    }

    /// Apply a scalar function element by element.
    pub fn elementwise(name: impl Into<String>, func: fn(f64) -> f64) -> Self {
        Self::new(name, move |input, output| {
            for (o, &i) in output.iter_mut().zip(input) {
                *o = func(i);
            }
        })
    }
}

impl Nonlinearity for Direct {
    fn name(&self) -> &str {
        &self.name
    }

    fn step(
        &mut self,
        _dt: f64,
        input: &[f64],
        output: &mut [f64],
    ) -> Result<(), NonlinearityError> {
        (self.func)(input, output);
        Ok(())
    }
}

impl fmt::Debug for Direct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Direct").field("name", &self.name).finish()
    }
}
