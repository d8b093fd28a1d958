//! Drive a two-unit integrator with a sine wave and print what it records.
//!
//! Run with `RUST_LOG=sigsim_engine=debug` to see the derived schedule.

use sigsim::prelude::*;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// `state += dt * input`, `output = state`.
struct Integrator {
    state: Vec<f64>,
}

impl Nonlinearity for Integrator {
    fn name(&self) -> &str {
        "integrator"
    }

    fn step(
        &mut self,
        dt: f64,
        input: &[f64],
        output: &mut [f64],
    ) -> Result<(), NonlinearityError> {
        for ((s, &i), o) in self.state.iter_mut().zip(input).zip(output) {
            *s += dt * i;
            *o = *s;
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.state.fill(0.0);
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sigsim_engine=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut model = ModelBuilder::with_config(SimConfig::with_dt(0.01))?;
    let time = model.time()?;
    let drive = model.signal("drive", 1)?;
    let gains_id = model.add_signal(BaseSignal::from_values("gains", vec![1.0, -0.5]))?;
    let gains = model.contiguous_view(gains_id, &[2, 1], 0)?;
    let input = model.signal("input", 2)?;
    let state = model.signal("state", 2)?;

    // Added out of order on purpose: the schedule sorts it out.
    model.nonlin(
        "integrate",
        state.clone(),
        input.clone(),
        Integrator {
            state: vec![0.0; 2],
        },
    )?;
    model.dot_inc("fan-out", gains, drive.clone(), input.clone(), false)?;
    model.reset("clear-input", input, 0.0)?;
    model.nonlin("sine", drive, time, Direct::elementwise("sin", f64::sin))?;
    let probe = model.add_probe(Probe::sampled(state, 0.5))?;

    let mut sim = model.build()?;
    println!("schedule:");
    for description in sim.operator_descriptions() {
        println!("  {description}");
    }
    println!("\n{}", sim.schedule().graph().to_dot());

    sim.run_for(std::f64::consts::TAU)?;
    let data = sim.probe_data(probe).ok_or("probe missing")?;
    println!(
        "{} samples after {} steps ({:.3}s):",
        data.len(),
        sim.step_count(),
        sim.elapsed_time()
    );
    for (i, sample) in data.iter().enumerate() {
        println!("  t={:.1}s state={sample:?}", (i + 1) as f64 * 0.5);
    }
    let metrics = sim.last_metrics();
    println!(
        "last tick: {}us total, {} operators",
        metrics.total_us, metrics.operators_executed
    );

    sim.reset();
    println!("after reset: step {} state {:?}", sim.step_count(), sim.signal("state"));
    Ok(())
}
