//! Operators bound to resolved arena windows, and their kernels.
//!
//! Every kernel gathers its inputs into scratch buffers before writing, so
//! an operator whose output aliases one of its inputs reads the values
//! from the start of its own execution.

use sigsim_arena::{ArenaError, SignalArena, Window};
use sigsim_core::Shape;
use sigsim_ops::linalg::dot_into;
use sigsim_ops::{NamedOp, Nonlinearity, OpKind, Operator};
use smallvec::{smallvec, SmallVec};

use crate::error::StepErrorKind;

/// Reusable buffers shared by all kernels of one simulator.
#[derive(Debug, Default)]
pub(crate) struct Scratch {
    lhs: Vec<f64>,
    rhs: Vec<f64>,
    out: Vec<f64>,
    /// Staging buffer for probe samples.
    pub(crate) sample: Vec<f64>,
}

pub(crate) enum Kernel {
    Reset {
        dst: Window,
        value: f64,
    },
    Copy {
        dst: Window,
        src: Window,
    },
    DotInc {
        a: Window,
        a_shape: Shape,
        x: Window,
        x_shape: Shape,
        y: Window,
        transpose_x: bool,
    },
    NonLin {
        output: Window,
        input: Window,
        nonlinearity: Box<dyn Nonlinearity>,
        dt: f64,
    },
}

/// An operator ready to run against one arena.
pub(crate) struct BoundOp {
    pub(crate) name: String,
    pub(crate) kind: OpKind,
    pub(crate) description: String,
    kernel: Kernel,
}

impl BoundOp {
    /// Resolve every view of `named` against `arena`.
    pub(crate) fn bind(
        named: NamedOp,
        description: String,
        arena: &SignalArena,
    ) -> Result<Self, ArenaError> {
        let kind = named.op.kind();
        let kernel = match named.op {
            Operator::Reset(op) => Kernel::Reset {
                dst: arena.resolve(op.dst())?,
                value: op.value(),
            },
            Operator::Copy(op) => Kernel::Copy {
                dst: arena.resolve(op.dst())?,
                src: arena.resolve(op.src())?,
            },
            Operator::DotInc(op) => Kernel::DotInc {
                a: arena.resolve(op.a())?,
                a_shape: op.a().shape.clone(),
                x: arena.resolve(op.x())?,
                x_shape: op.x().shape.clone(),
                y: arena.resolve(op.y())?,
                transpose_x: op.transpose_x(),
            },
            Operator::NonLin(op) => {
                let output = arena.resolve(op.output())?;
                let input = arena.resolve(op.input())?;
                let dt = op.dt();
                Kernel::NonLin {
                    output,
                    input,
                    nonlinearity: op.into_nonlinearity(),
                    dt,
                }
            }
        };
        Ok(Self {
            name: named.name,
            kind,
            description,
            kernel,
        })
    }

    /// Windows this operator sets or increments.
    pub(crate) fn written(&self) -> SmallVec<[&Window; 1]> {
        match &self.kernel {
            Kernel::Reset { dst, .. } | Kernel::Copy { dst, .. } => smallvec![dst],
            Kernel::DotInc { y, .. } => smallvec![y],
            Kernel::NonLin { output, .. } => smallvec![output],
        }
    }

    /// Return any private nonlinearity state to its initial value.
    pub(crate) fn reset(&mut self) {
        if let Kernel::NonLin { nonlinearity, .. } = &mut self.kernel {
            nonlinearity.reset();
        }
    }

    /// Run the kernel once.
    pub(crate) fn execute(
        &mut self,
        arena: &mut SignalArena,
        scratch: &mut Scratch,
    ) -> Result<(), StepErrorKind> {
        let name = &self.name;
        let arena_err = |source| StepErrorKind::Arena {
            op: name.clone(),
            source,
        };
        match &mut self.kernel {
            Kernel::Reset { dst, value } => {
                arena.fill(dst, *value);
            }
            Kernel::Copy { dst, src } => {
                arena.gather(src, &mut scratch.lhs);
                arena.store(dst, &scratch.lhs).map_err(arena_err)?;
            }
            Kernel::DotInc {
                a,
                a_shape,
                x,
                x_shape,
                y,
                transpose_x,
            } => {
                arena.gather(a, &mut scratch.lhs);
                arena.gather(x, &mut scratch.rhs);
                dot_into(
                    &scratch.lhs,
                    a_shape,
                    &scratch.rhs,
                    x_shape,
                    *transpose_x,
                    &mut scratch.out,
                )
                .map_err(|source| StepErrorKind::Kernel {
                    op: name.clone(),
                    source,
                })?;
                arena.accumulate(y, &scratch.out).map_err(arena_err)?;
            }
            Kernel::NonLin {
                output,
                input,
                nonlinearity,
                dt,
            } => {
                arena.gather(input, &mut scratch.lhs);
                scratch.out.clear();
                scratch.out.resize(output.len(), 0.0);
                nonlinearity
                    .step(*dt, &scratch.lhs, &mut scratch.out)
                    .map_err(|source| StepErrorKind::Nonlinearity {
                        op: name.clone(),
                        source,
                    })?;
                arena.store(output, &scratch.out).map_err(arena_err)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sigsim_core::{BaseSignal, SignalTable, View};
    use sigsim_ops::Direct;

    fn setup(values: Vec<f64>) -> (SignalTable, View) {
        let mut table = SignalTable::new();
        let id = table.add(BaseSignal::from_values("s", values)).unwrap();
        let view = table.whole(id).unwrap();
        (table, view)
    }

    fn bound(op: Operator, arena: &SignalArena) -> BoundOp {
        BoundOp::bind(NamedOp::new("op", op), String::new(), arena).unwrap()
    }

    #[test]
    fn copy_into_shifted_alias_reads_before_writing() {
        let (table, _) = setup(vec![1.0, 2.0, 3.0, 4.0]);
        let base = table.find("s").unwrap();
        let src = table.make_contiguous_view(base, &[3], 0).unwrap();
        let dst = table.make_contiguous_view(base, &[3], 1).unwrap();
        let mut arena = SignalArena::new(&table);
        let mut op = bound(Operator::copy(dst, src).unwrap(), &arena);
        op.execute(&mut arena, &mut Scratch::default()).unwrap();
        assert_eq!(arena.base(base).unwrap(), &[1.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn dot_inc_accumulates() {
        let mut table = SignalTable::new();
        let a = table
            .add(BaseSignal::from_values("a", vec![1.0, 2.0, 3.0, 4.0]))
            .unwrap();
        let x = table.add(BaseSignal::from_values("x", vec![1.0, 1.0])).unwrap();
        let y = table.add(BaseSignal::from_values("y", vec![10.0, 20.0])).unwrap();
        let mut arena = SignalArena::new(&table);
        let op = Operator::dot_inc(
            table.make_contiguous_view(a, &[2, 2], 0).unwrap(),
            table.whole(x).unwrap(),
            table.whole(y).unwrap(),
            false,
        )
        .unwrap();
        let mut op = bound(op, &arena);
        assert_eq!(op.written().len(), 1);
        op.execute(&mut arena, &mut Scratch::default()).unwrap();
        assert_eq!(arena.base(y).unwrap(), &[13.0, 27.0]);
    }

    #[test]
    fn nonlin_in_place() {
        let (table, view) = setup(vec![-1.0, 2.0]);
        let mut arena = SignalArena::new(&table);
        let relu = Direct::elementwise("relu", |v| v.max(0.0));
        let mut op = bound(
            Operator::nonlin(view.clone(), view.clone(), relu, 0.001).unwrap(),
            &arena,
        );
        op.execute(&mut arena, &mut Scratch::default()).unwrap();
        assert_eq!(arena.base(view.base).unwrap(), &[0.0, 2.0]);
    }
}
