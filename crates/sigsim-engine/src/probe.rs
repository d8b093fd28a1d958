//! Probes and their recorded samples.

use sigsim_core::{ProbeId, Shape, View};

use crate::config::snap;
use crate::error::BuildError;

/// Request to record a view's values during a run.
#[derive(Clone, Debug, PartialEq)]
pub struct Probe {
    /// The recorded view.
    pub view: View,
    /// Sampling period in seconds; `None` samples every tick.
    pub sample_every: Option<f64>,
}

impl Probe {
    /// Record `view` after every tick.
    pub fn new(view: View) -> Self {
        Self {
            view,
            sample_every: None,
        }
    }

    /// Record `view` every `sample_every` seconds.
    pub fn sampled(view: View, sample_every: f64) -> Self {
        Self {
            view,
            sample_every: Some(sample_every),
        }
    }

    /// Sampling period in ticks for a model running at `dt`.
    ///
    /// The period must be a positive whole multiple of `dt`, up to
    /// floating-point tolerance.
    pub fn period_steps(&self, id: ProbeId, dt: f64) -> Result<u64, BuildError> {
        let Some(sample_every) = self.sample_every else {
            return Ok(1);
        };
        let invalid = || BuildError::InvalidProbePeriod {
            probe: id,
            sample_every,
            dt,
        };
        if !sample_every.is_finite() || sample_every <= 0.0 {
            return Err(invalid());
        }
        match snap(sample_every / dt) {
            Some(n) if n >= 1 => Ok(n),
            _ => Err(invalid()),
        }
    }
}

/// Samples recorded by one probe, oldest first.
///
/// Each sample is a row-major copy of the probed view. The record only
/// grows until the simulator is reset.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProbeData {
    shape: Shape,
    width: usize,
    samples: usize,
    values: Vec<f64>,
}

impl ProbeData {
    pub(crate) fn new(shape: Shape) -> Self {
        let width = shape.iter().product();
        Self {
            shape,
            width,
            samples: 0,
            values: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, sample: &[f64]) {
        debug_assert_eq!(sample.len(), self.width);
        self.values.extend_from_slice(sample);
        self.samples += 1;
    }

    pub(crate) fn clear(&mut self) {
        self.values.clear();
        self.samples = 0;
    }

    /// Number of samples recorded.
    pub fn len(&self) -> usize {
        self.samples
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.samples == 0
    }

    /// Shape of each sample (the probed view's shape).
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// One sample, flattened in row-major order.
    pub fn get(&self, index: usize) -> Option<&[f64]> {
        (index < self.samples).then(|| &self.values[index * self.width..(index + 1) * self.width])
    }

    /// The most recent sample.
    pub fn last(&self) -> Option<&[f64]> {
        self.samples.checked_sub(1).and_then(|i| self.get(i))
    }

    /// Iterate over samples, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &[f64]> + '_ {
        (0..self.samples).map(move |i| &self.values[i * self.width..(i + 1) * self.width])
    }

    /// All samples back to back.
    pub fn as_flat(&self) -> &[f64] {
        &self.values
    }
}
