//! Benchmark models for the sigsim runtime.
//!
//! - [`reference_model`]: one dense layer of leaky integrators
//! - [`chain_model`]: a deep feedforward chain for scheduler benchmarks
//! - [`random_weights`]: seeded weight matrices

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use rand_chacha::rand_core::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sigsim_core::BaseSignal;
use sigsim_engine::{BuildError, ModelBuilder, Probe, SimConfig};
use sigsim_ops::{Direct, Nonlinearity, NonlinearityError};

/// Row-major `rows x cols` weights uniform in `[-scale, scale)`.
///
/// The same seed always yields the same matrix.
pub fn random_weights(rows: usize, cols: usize, scale: f64, seed: u64) -> Vec<f64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..rows * cols)
        .map(|_| {
            // 53 random mantissa bits in [0, 1).
            let unit = (rng.next_u64() >> 11) as f64 / (1u64 << 53) as f64;
            (2.0 * unit - 1.0) * scale
        })
        .collect()
}

/// First-order low-pass filter followed by `tanh`.
///
/// `state += dt / tau * (input - state)`, `output = tanh(state)`.
#[derive(Debug)]
pub struct LeakyTanh {
    tau: f64,
    state: Vec<f64>,
}

impl LeakyTanh {
    /// A filter over `len` units with time constant `tau` seconds.
    pub fn new(len: usize, tau: f64) -> Self {
        Self {
            tau,
            state: vec![0.0; len],
        }
    }
}

impl Nonlinearity for LeakyTanh {
    fn name(&self) -> &str {
        "leaky-tanh"
    }

    fn step(
        &mut self,
        dt: f64,
        input: &[f64],
        output: &mut [f64],
    ) -> Result<(), NonlinearityError> {
        let alpha = dt / self.tau;
        for ((s, &i), o) in self.state.iter_mut().zip(input).zip(output) {
            *s += alpha * (i - *s);
            *o = s.tanh();
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.state.fill(0.0);
    }
}

/// A dense layer of `n` filtered units driven by two weighted inputs.
///
/// Per tick: `current ← 0`, `current += W_in · input`,
/// `current += W_bias · bias`, `rate ← leaky_tanh(current)`, and
/// `out ← rate`. `rate` is probed every tick.
pub fn reference_model(n: usize, seed: u64) -> Result<ModelBuilder, BuildError> {
    let mut model = ModelBuilder::with_config(SimConfig::default())?;
    let input = model.signal_with_values("input", vec![1.0; n])?;
    let bias = model.signal_with_values("bias", vec![0.5; n])?;
    let scale = 1.0 / n as f64;
    let w_in_id = model.add_signal(BaseSignal::from_values(
        "w_in",
        random_weights(n, n, scale, seed),
    ))?;
    let w_bias_id = model.add_signal(BaseSignal::from_values(
        "w_bias",
        random_weights(n, n, scale, seed.wrapping_add(1)),
    ))?;
    let w_in = model.contiguous_view(w_in_id, &[n, n], 0)?;
    let w_bias = model.contiguous_view(w_bias_id, &[n, n], 0)?;
    let current = model.signal("current", n)?;
    let rate = model.signal("rate", n)?;
    let out = model.signal("out", n)?;

    model.reset("clear-current", current.clone(), 0.0)?;
    model.dot_inc("encode", w_in, input, current.clone(), false)?;
    model.dot_inc("bias", w_bias, bias, current.clone(), false)?;
    model.nonlin("filter", rate.clone(), current, LeakyTanh::new(n, 0.02))?;
    model.copy("readout", out, rate.clone())?;
    model.add_probe(Probe::new(rate))?;
    Ok(model)
}

/// `depth` layers of width `width`, each a reset, a dot product, and a
/// ReLU feeding the next layer. Operators are added in reverse so the
/// scheduler has to reorder all of them.
pub fn chain_model(depth: usize, width: usize, seed: u64) -> Result<ModelBuilder, BuildError> {
    let mut model = ModelBuilder::new();
    let mut layers = Vec::with_capacity(depth + 1);
    layers.push(model.signal_with_values("in", vec![1.0; width])?);
    for i in 0..depth {
        layers.push(model.signal(format!("act{i}"), width)?);
    }
    let mut weights = Vec::with_capacity(depth);
    for i in 0..depth {
        let id = model.add_signal(BaseSignal::from_values(
            format!("w{i}"),
            random_weights(width, width, 1.0, seed.wrapping_add(i as u64)),
        ))?;
        weights.push(model.contiguous_view(id, &[width, width], 0)?);
    }
    let mut pre = Vec::with_capacity(depth);
    for i in 0..depth {
        pre.push(model.signal(format!("pre{i}"), width)?);
    }
    for i in (0..depth).rev() {
        model.nonlin(
            &format!("relu{i}"),
            layers[i + 1].clone(),
            pre[i].clone(),
            Direct::elementwise("relu", |v| v.max(0.0)),
        )?;
        model.dot_inc(
            &format!("dot{i}"),
            weights[i].clone(),
            layers[i].clone(),
            pre[i].clone(),
            false,
        )?;
        model.reset(&format!("clear{i}"), pre[i].clone(), 0.0)?;
    }
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_are_seeded() {
        let a = random_weights(4, 4, 1.0, 7);
        assert_eq!(a, random_weights(4, 4, 1.0, 7));
        assert_ne!(a, random_weights(4, 4, 1.0, 8));
        assert!(a.iter().all(|w| (-1.0..1.0).contains(w)));
    }

    #[test]
    fn reference_model_runs() {
        let mut sim = reference_model(16, 1).unwrap().build().unwrap();
        sim.run_steps(10).unwrap();
        let names: Vec<_> = sim.operator_names().collect();
        assert_eq!(names[0], "clear-current");
        assert_eq!(names.last(), Some(&"readout"));
        assert_eq!(sim.step_count(), 10);
        let rate = sim.signal("rate").unwrap().to_vec();
        sim.reset();
        sim.run_steps(10).unwrap();
        assert_eq!(sim.signal("rate").unwrap(), &rate[..]);
    }

    #[test]
    fn chain_model_reorders() {
        let sim = chain_model(3, 4, 1).unwrap().build().unwrap();
        let names: Vec<_> = sim.operator_names().collect();
        // Ready operators run in insertion order, so the resets go first.
        assert_eq!(
            names,
            [
                "clear2", "clear1", "clear0", "dot0", "relu0", "dot1", "relu1", "dot2", "relu2"
            ]
        );
    }
}
