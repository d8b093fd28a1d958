//! The closed set of primitive operators.

use std::fmt;

use sigsim_core::{SignalTable, View};
use smallvec::{smallvec, SmallVec};

use crate::error::ShapeMismatchError;
use crate::kind::OpKind;
use crate::linalg::{dot_shape, fits};
use crate::nonlinearity::Nonlinearity;

/// Sets `dst` to a constant.
#[derive(Clone, Debug, PartialEq)]
pub struct ResetOp {
    dst: View,
    value: f64,
}

impl ResetOp {
    /// Destination view.
    pub fn dst(&self) -> &View {
        &self.dst
    }

    /// The constant written each tick.
    pub fn value(&self) -> f64 {
        self.value
    }
}

/// Sets `dst` from `src`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CopyOp {
    dst: View,
    src: View,
}

impl CopyOp {
    /// Destination view.
    pub fn dst(&self) -> &View {
        &self.dst
    }

    /// Source view.
    pub fn src(&self) -> &View {
        &self.src
    }
}

/// Increments `Y` by `dot(A, X)` or `dot(A, Xᵀ)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DotIncOp {
    a: View,
    x: View,
    y: View,
    transpose_x: bool,
}

impl DotIncOp {
    /// Left operand.
    pub fn a(&self) -> &View {
        &self.a
    }

    /// Right operand.
    pub fn x(&self) -> &View {
        &self.x
    }

    /// Increment target.
    pub fn y(&self) -> &View {
        &self.y
    }

    /// Whether `X` is transposed before the product.
    pub fn transpose_x(&self) -> bool {
        self.transpose_x
    }
}

/// Sets `output` by stepping a [`Nonlinearity`] on `input`.
pub struct NonLinOp {
    output: View,
    input: View,
    nonlinearity: Box<dyn Nonlinearity>,
    dt: f64,
}

impl NonLinOp {
    /// Output view.
    pub fn output(&self) -> &View {
        &self.output
    }

    /// Input view.
    pub fn input(&self) -> &View {
        &self.input
    }

    /// Timestep the nonlinearity is advanced by.
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// The wrapped nonlinearity.
    pub fn nonlinearity(&self) -> &dyn Nonlinearity {
        self.nonlinearity.as_ref()
    }

    /// Mutable access for stepping and resetting the nonlinearity's state.
    pub fn nonlinearity_mut(&mut self) -> &mut dyn Nonlinearity {
        self.nonlinearity.as_mut()
    }

    /// Consume the operator, keeping only its nonlinearity.
    pub fn into_nonlinearity(self) -> Box<dyn Nonlinearity> {
        self.nonlinearity
    }
}

impl fmt::Debug for NonLinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NonLinOp")
            .field("output", &self.output)
            .field("input", &self.input)
            .field("nonlinearity", &self.nonlinearity.name())
            .field("dt", &self.dt)
            .finish()
    }
}

/// The views an operator touches, grouped by role.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Roles<'a> {
    /// Views only inspected.
    pub reads: SmallVec<[&'a View; 2]>,
    /// Views fully overwritten, exactly once per tick.
    pub sets: SmallVec<[&'a View; 1]>,
    /// Views accumulated into.
    pub incs: SmallVec<[&'a View; 1]>,
}

/// A primitive operator.
///
/// Operators are built through the checked constructors below and are
/// immutable afterwards, apart from the private state of a
/// [`NonLinOp`]'s nonlinearity.
#[derive(Debug)]
pub enum Operator {
    /// See [`ResetOp`].
    Reset(ResetOp),
    /// See [`CopyOp`].
    Copy(CopyOp),
    /// See [`DotIncOp`].
    DotInc(DotIncOp),
    /// See [`NonLinOp`].
    NonLin(NonLinOp),
}

impl Operator {
    /// `dst ← value`. Any shape is valid.
    pub fn reset(dst: View, value: f64) -> Self {
        Self::Reset(ResetOp { dst, value })
    }

    /// `dst ← src`.
    pub fn copy(dst: View, src: View) -> Result<Self, ShapeMismatchError> {
        if !fits(&src.shape, &dst.shape) {
            return Err(ShapeMismatchError::Copy {
                dst: dst.shape.clone(),
                src: src.shape.clone(),
            });
        }
        Ok(Self::Copy(CopyOp { dst, src }))
    }

    /// `Y ← Y + dot(A, X)` (or `dot(A, Xᵀ)` when `transpose_x`).
    pub fn dot_inc(
        a: View,
        x: View,
        y: View,
        transpose_x: bool,
    ) -> Result<Self, ShapeMismatchError> {
        let result = dot_shape(&a.shape, &x.shape, transpose_x).ok_or_else(|| {
            ShapeMismatchError::Dot {
                a: a.shape.clone(),
                x: x.shape.clone(),
                transpose_x,
            }
        })?;
        if !fits(&result, &y.shape) {
            return Err(ShapeMismatchError::DotTarget {
                result,
                y: y.shape.clone(),
            });
        }
        Ok(Self::DotInc(DotIncOp {
            a,
            x,
            y,
            transpose_x,
        }))
    }

    /// `output ← f(input)`, advancing `f` by `dt`.
    pub fn nonlin(
        output: View,
        input: View,
        nonlinearity: impl Nonlinearity,
        dt: f64,
    ) -> Result<Self, ShapeMismatchError> {
        Self::nonlin_boxed(output, input, Box::new(nonlinearity), dt)
    }

    /// Like [`nonlin`](Self::nonlin) for an already-boxed nonlinearity.
    pub fn nonlin_boxed(
        output: View,
        input: View,
        nonlinearity: Box<dyn Nonlinearity>,
        dt: f64,
    ) -> Result<Self, ShapeMismatchError> {
        if !dt.is_finite() || dt <= 0.0 {
            return Err(ShapeMismatchError::InvalidDt { value: dt });
        }
        nonlinearity
            .check_sizes(input.size(), output.size())
            .map_err(|reason| ShapeMismatchError::NonLin {
                name: nonlinearity.name().to_string(),
                input: input.size(),
                output: output.size(),
                reason,
            })?;
        Ok(Self::NonLin(NonLinOp {
            output,
            input,
            nonlinearity,
            dt,
        }))
    }

    /// The operator's kind tag.
    pub fn kind(&self) -> OpKind {
        match self {
            Self::Reset(_) => OpKind::Reset,
            Self::Copy(_) => OpKind::Copy,
            Self::DotInc(_) => OpKind::DotInc,
            Self::NonLin(_) => OpKind::NonLin,
        }
    }

    /// Declared views, grouped by role.
    pub fn roles(&self) -> Roles<'_> {
        match self {
            Self::Reset(op) => Roles {
                reads: SmallVec::new(),
                sets: smallvec![&op.dst],
                incs: SmallVec::new(),
            },
            Self::Copy(op) => Roles {
                reads: smallvec![&op.src],
                sets: smallvec![&op.dst],
                incs: SmallVec::new(),
            },
            Self::DotInc(op) => Roles {
                reads: smallvec![&op.a, &op.x],
                sets: SmallVec::new(),
                incs: smallvec![&op.y],
            },
            Self::NonLin(op) => Roles {
                reads: smallvec![&op.input],
                sets: smallvec![&op.output],
                incs: SmallVec::new(),
            },
        }
    }

    /// Every declared view, in role order (reads, sets, incs).
    pub fn views(&self) -> SmallVec<[&View; 3]> {
        let roles = self.roles();
        roles
            .reads
            .into_iter()
            .chain(roles.sets)
            .chain(roles.incs)
            .collect()
    }

    /// Views the operator writes (sets and incs).
    pub fn writes(&self) -> SmallVec<[&View; 1]> {
        let roles = self.roles();
        roles.sets.into_iter().chain(roles.incs).collect()
    }

    /// One-line description naming each view by its base signal.
    pub fn describe(&self, table: &SignalTable) -> String {
        match self {
            Self::Reset(op) => format!("Reset({} <- {})", table.describe(&op.dst), op.value),
            Self::Copy(op) => format!(
                "Copy({} <- {})",
                table.describe(&op.dst),
                table.describe(&op.src)
            ),
            Self::DotInc(op) => format!(
                "DotInc({} += {} . {}{})",
                table.describe(&op.y),
                table.describe(&op.a),
                table.describe(&op.x),
                if op.transpose_x { "^T" } else { "" }
            ),
            Self::NonLin(op) => format!(
                "NonLin({} <- {}({}))",
                table.describe(&op.output),
                op.nonlinearity.name(),
                table.describe(&op.input)
            ),
        }
    }
}

/// An operator paired with the name used in diagnostics.
#[derive(Debug)]
pub struct NamedOp {
    /// Diagnostic name, unique within a model by convention.
    pub name: String,
    /// The operator.
    pub op: Operator,
}

impl NamedOp {
    /// Pair an operator with a name.
    pub fn new(name: impl Into<String>, op: Operator) -> Self {
        Self {
            name: name.into(),
            op,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nonlinearity::Direct;
    use sigsim_core::{BaseId, BaseSignal};

    fn vec_view(base: u32, len: usize) -> View {
        View::whole(BaseId(base), len)
    }

    fn mat_view(base: u32, rows: usize, cols: usize) -> View {
        View::contiguous(BaseId(base), &[rows, cols], 0)
    }

    #[test]
    fn reset_sets_destination() {
        let op = Operator::reset(vec_view(0, 3), 0.0);
        let roles = op.roles();
        assert!(roles.reads.is_empty());
        assert_eq!(roles.sets.as_slice(), &[&vec_view(0, 3)]);
        assert!(roles.incs.is_empty());
        assert_eq!(op.kind(), OpKind::Reset);
    }

    #[test]
    fn copy_requires_matching_shapes() {
        assert!(Operator::copy(vec_view(0, 3), vec_view(1, 3)).is_ok());
        let err = Operator::copy(vec_view(0, 3), vec_view(1, 2)).unwrap_err();
        assert!(matches!(err, ShapeMismatchError::Copy { .. }));
        // Single element into single element is allowed across ranks.
        let scalar = View::contiguous(BaseId(1), &[], 0);
        assert!(Operator::copy(vec_view(0, 1), scalar).is_ok());
    }

    #[test]
    fn dot_inc_roles() {
        let op = Operator::dot_inc(mat_view(0, 2, 3), vec_view(1, 3), vec_view(2, 2), false)
            .unwrap();
        let roles = op.roles();
        assert_eq!(roles.reads.len(), 2);
        assert!(roles.sets.is_empty());
        assert_eq!(roles.incs.as_slice(), &[&vec_view(2, 2)]);
        assert_eq!(op.views().len(), 3);
        assert_eq!(op.writes().as_slice(), &[&vec_view(2, 2)]);
    }

    #[test]
    fn dot_inc_rejects_bad_inner_dimension() {
        let err = Operator::dot_inc(mat_view(0, 2, 3), vec_view(1, 2), vec_view(2, 2), false)
            .unwrap_err();
        assert!(matches!(err, ShapeMismatchError::Dot { .. }));
    }

    #[test]
    fn dot_inc_rejects_wrong_target() {
        let err = Operator::dot_inc(mat_view(0, 2, 3), vec_view(1, 3), vec_view(2, 3), false)
            .unwrap_err();
        assert!(matches!(err, ShapeMismatchError::DotTarget { .. }));
    }

    #[test]
    fn dot_inc_allows_single_element_target() {
        // [[2]] . [1] has shape (1,), Y is a scalar view.
        let y = View::contiguous(BaseId(2), &[], 0);
        assert!(Operator::dot_inc(mat_view(0, 1, 1), vec_view(1, 1), y, false).is_ok());
    }

    #[test]
    fn nonlin_checks_sizes_and_dt() {
        let relu = || Direct::elementwise("relu", |v| v.max(0.0));
        assert!(Operator::nonlin(vec_view(0, 3), vec_view(1, 3), relu(), 0.001).is_ok());
        let err = Operator::nonlin(vec_view(0, 3), vec_view(1, 4), relu(), 0.001).unwrap_err();
        assert!(matches!(
            err,
            ShapeMismatchError::NonLin {
                input: 4,
                output: 3,
                ..
            }
        ));
        let err = Operator::nonlin(vec_view(0, 3), vec_view(1, 3), relu(), 0.0).unwrap_err();
        assert_eq!(err, ShapeMismatchError::InvalidDt { value: 0.0 });
    }

    #[test]
    fn describe_names_signals() {
        let mut table = SignalTable::new();
        let s = table.add(BaseSignal::zeros("s", 1)).unwrap();
        let w = table.add(BaseSignal::from_values("w", vec![2.0])).unwrap();
        let one = table.add(BaseSignal::from_values("one", vec![1.0])).unwrap();
        let op = Operator::dot_inc(
            table.make_contiguous_view(w, &[1, 1], 0).unwrap(),
            table.whole(one).unwrap(),
            table.whole(s).unwrap(),
            false,
        )
        .unwrap();
        assert_eq!(
            op.describe(&table),
            "DotInc('s'[1 @0] += 'w'[1x1 @0] . 'one'[1 @0])"
        );
    }
}
