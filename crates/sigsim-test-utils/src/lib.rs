//! Test utilities for sigsim development.
//!
//! [`fixtures`] holds nonlinearities with predictable behavior for
//! runtime tests; the helpers below build small signal tables.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use sigsim_core::{BaseSignal, SignalTable, View};

pub use fixtures::{Accumulator, Doubler, FailingNonlinearity, NanNonlinearity};

/// Register a zero-initialized signal and return its whole view.
pub fn zeros(table: &mut SignalTable, name: &str, len: usize) -> View {
    let id = table
        .add(BaseSignal::zeros(name, len))
        .unwrap_or_else(|e| panic!("adding '{name}': {e}"));
    View::whole(id, len)
}

/// Register a signal with explicit initial values and return its whole view.
pub fn constant(table: &mut SignalTable, name: &str, values: &[f64]) -> View {
    let id = table
        .add(BaseSignal::from_values(name, values.to_vec()))
        .unwrap_or_else(|e| panic!("adding '{name}': {e}"));
    View::whole(id, values.len())
}

/// Register a `rows x cols` matrix signal in row-major order.
pub fn matrix(table: &mut SignalTable, name: &str, rows: usize, values: &[f64]) -> View {
    assert!(rows > 0 && values.len() % rows == 0, "ragged matrix '{name}'");
    let id = table
        .add(BaseSignal::from_values(name, values.to_vec()))
        .unwrap_or_else(|e| panic!("adding '{name}': {e}"));
    View::contiguous(id, &[rows, values.len() / rows], 0)
}
