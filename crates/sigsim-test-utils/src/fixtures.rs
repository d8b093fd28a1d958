//! Reusable nonlinearity fixtures.
//!
//! - [`Doubler`]: stateless, `output = 2 * input`.
//! - [`Accumulator`]: stateful running sum of its input, scaled by `dt`.
//! - [`FailingNonlinearity`]: succeeds N times, then fails every call.
//! - [`NanNonlinearity`]: writes NaN into its output without reporting it.

use sigsim_ops::{Nonlinearity, NonlinearityError};

/// Doubles its input.
pub struct Doubler;

impl Nonlinearity for Doubler {
    fn name(&self) -> &str {
        "doubler"
    }

    fn step(
        &mut self,
        _dt: f64,
        input: &[f64],
        output: &mut [f64],
    ) -> Result<(), NonlinearityError> {
        for (o, &i) in output.iter_mut().zip(input) {
            *o = 2.0 * i;
        }
        Ok(())
    }
}

/// Integrates its input: `state += dt * input; output = state`.
///
/// The state is private to the nonlinearity, so a correct runtime reset
/// must call [`Nonlinearity::reset`] for repeated runs to match.
pub struct Accumulator {
    state: Vec<f64>,
    pub resets: usize,
}

impl Accumulator {
    pub fn new(len: usize) -> Self {
        Self {
            state: vec![0.0; len],
            resets: 0,
        }
    }
}

impl Nonlinearity for Accumulator {
    fn name(&self) -> &str {
        "accumulator"
    }

    fn step(
        &mut self,
        dt: f64,
        input: &[f64],
        output: &mut [f64],
    ) -> Result<(), NonlinearityError> {
        for ((s, o), &i) in self.state.iter_mut().zip(output.iter_mut()).zip(input) {
            *s += dt * i;
            *o = *s;
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.state.fill(0.0);
        self.resets += 1;
    }

    fn check_sizes(&self, input: usize, output: usize) -> Result<(), String> {
        if input == self.state.len() && output == self.state.len() {
            Ok(())
        } else {
            Err(format!("accumulator holds {} elements", self.state.len()))
        }
    }
}

/// Copies its input for `succeed_count` calls, then fails.
pub struct FailingNonlinearity {
    calls: usize,
    pub succeed_count: usize,
}

impl FailingNonlinearity {
    pub fn new(succeed_count: usize) -> Self {
        Self {
            calls: 0,
            succeed_count,
        }
    }
}

impl Nonlinearity for FailingNonlinearity {
    fn name(&self) -> &str {
        "failing"
    }

    fn step(
        &mut self,
        _dt: f64,
        input: &[f64],
        output: &mut [f64],
    ) -> Result<(), NonlinearityError> {
        self.calls += 1;
        if self.calls > self.succeed_count {
            return Err(NonlinearityError::ExecutionFailed {
                reason: format!("failed on call {}", self.calls),
            });
        }
        output.copy_from_slice(input);
        Ok(())
    }

    fn reset(&mut self) {
        self.calls = 0;
    }
}

/// Fills its output with NaN and reports success.
pub struct NanNonlinearity;

impl Nonlinearity for NanNonlinearity {
    fn name(&self) -> &str {
        "nan"
    }

    fn step(
        &mut self,
        _dt: f64,
        _input: &[f64],
        output: &mut [f64],
    ) -> Result<(), NonlinearityError> {
        output.fill(f64::NAN);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doubler_doubles() {
        let mut out = [0.0; 2];
        Doubler.step(0.001, &[1.0, -3.0], &mut out).unwrap();
        assert_eq!(out, [2.0, -6.0]);
    }

    #[test]
    fn accumulator_integrates_and_resets() {
        let mut acc = Accumulator::new(1);
        let mut out = [0.0];
        acc.step(0.5, &[2.0], &mut out).unwrap();
        acc.step(0.5, &[2.0], &mut out).unwrap();
        assert_eq!(out, [2.0]);
        acc.reset();
        acc.step(0.5, &[2.0], &mut out).unwrap();
        assert_eq!(out, [1.0]);
        assert_eq!(acc.resets, 1);
        assert!(acc.check_sizes(2, 1).is_err());
    }

    #[test]
    fn failing_fails_after_budget() {
        let mut f = FailingNonlinearity::new(1);
        let mut out = [0.0];
        assert!(f.step(0.001, &[1.0], &mut out).is_ok());
        assert!(f.step(0.001, &[1.0], &mut out).is_err());
        f.reset();
        assert!(f.step(0.001, &[1.0], &mut out).is_ok());
    }

    #[test]
    fn nan_writes_nan() {
        let mut out = [0.0; 3];
        NanNonlinearity.step(0.001, &[0.0; 3], &mut out).unwrap();
        assert!(out.iter().all(|v| v.is_nan()));
    }
}
