//! Base signals and the [`SignalTable`] registry.
//!
//! A base signal is an independently allocated buffer. The table assigns
//! each base a sequential [`BaseId`] and checks every view against its
//! base's extent before the view is handed out, so downstream crates can
//! treat any [`View`] obtained from a table as in-bounds.

use indexmap::IndexMap;
use smallvec::SmallVec;

use crate::dtype::DType;
use crate::error::ShapeError;
use crate::id::BaseId;
use crate::view::{checked_shape_size, Strides, View};

/// Initial contents of a base signal.
///
/// The runtime restores these values on construction and on every reset.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum InitialValue {
    /// All elements zero.
    #[default]
    Zeros,
    /// All elements set to one constant.
    Fill(f64),
    /// Explicit per-element values; length must equal the base length.
    Values(Vec<f64>),
}

/// Role of a base signal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SignalKind {
    /// Model state, written only by operators.
    #[default]
    State,
    /// Simulation time in seconds, written by the runtime each tick.
    Time,
    /// Step counter, written by the runtime each tick.
    Step,
}

impl SignalKind {
    /// Whether the runtime, not operators, owns writes to this signal.
    pub fn is_reserved(self) -> bool {
        !matches!(self, Self::State)
    }
}

/// Definition of a base signal.
#[derive(Clone, Debug, PartialEq)]
pub struct BaseSignal {
    /// Human-readable name used in error messages.
    pub name: String,
    /// Number of elements.
    pub len: usize,
    /// Element type.
    pub dtype: DType,
    /// Contents at construction and after reset.
    pub initial: InitialValue,
    /// Whether operators or the runtime own this signal.
    pub kind: SignalKind,
}

impl BaseSignal {
    /// A zero-initialized `Float64` state signal.
    pub fn zeros(name: impl Into<String>, len: usize) -> Self {
        Self {
            name: name.into(),
            len,
            dtype: DType::Float64,
            initial: InitialValue::Zeros,
            kind: SignalKind::State,
        }
    }

    /// A `Float64` state signal with explicit initial values.
    pub fn from_values(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            len: values.len(),
            dtype: DType::Float64,
            initial: InitialValue::Values(values),
            kind: SignalKind::State,
        }
    }

    /// Materialize the initial contents, cast to the element type.
    pub fn initial_values(&self) -> Vec<f64> {
        match &self.initial {
            InitialValue::Zeros => vec![0.0; self.len],
            InitialValue::Fill(v) => vec![self.dtype.cast(*v); self.len],
            InitialValue::Values(values) => {
                values.iter().map(|&v| self.dtype.cast(v)).collect()
            }
        }
    }

    /// Check that the initial value matches the declared length.
    pub fn validate(&self) -> Result<(), ShapeError> {
        if let InitialValue::Values(values) = &self.initial {
            if values.len() != self.len {
                return Err(ShapeError::InitialLength {
                    base: self.name.clone(),
                    expected: self.len,
                    actual: values.len(),
                });
            }
        }
        Ok(())
    }
}

/// Registry of base signals, indexed by [`BaseId`].
#[derive(Clone, Debug, Default)]
pub struct SignalTable {
    bases: Vec<BaseSignal>,
    by_name: IndexMap<String, BaseId>,
}

impl SignalTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a base signal and return its handle.
    pub fn add(&mut self, signal: BaseSignal) -> Result<BaseId, ShapeError> {
        signal.validate()?;
        if self.by_name.contains_key(&signal.name) {
            return Err(ShapeError::DuplicateName { name: signal.name });
        }
        let id = BaseId(u32::try_from(self.bases.len()).map_err(|_| ShapeError::TooManyBases)?);
        self.by_name.insert(signal.name.clone(), id);
        self.bases.push(signal);
        Ok(id)
    }

    /// Register a `len`-element base with the given type and initial value.
    pub fn make_base(
        &mut self,
        name: impl Into<String>,
        len: usize,
        dtype: DType,
        initial: InitialValue,
    ) -> Result<BaseId, ShapeError> {
        self.add(BaseSignal {
            name: name.into(),
            len,
            dtype,
            initial,
            kind: SignalKind::State,
        })
    }

    /// Construct a view into `base`, checking it against the base's extent.
    pub fn make_view(
        &self,
        base: BaseId,
        shape: &[usize],
        offset: usize,
        strides: &[isize],
    ) -> Result<View, ShapeError> {
        let view = View {
            base,
            shape: SmallVec::from_slice(shape),
            offset,
            strides: Strides::from_slice(strides),
        };
        self.check_view(&view)?;
        Ok(view)
    }

    /// Construct a row-major view into `base`.
    pub fn make_contiguous_view(
        &self,
        base: BaseId,
        shape: &[usize],
        offset: usize,
    ) -> Result<View, ShapeError> {
        let view = View::contiguous(base, shape, offset);
        self.check_view(&view)?;
        Ok(view)
    }

    /// The trivial 1-D view covering all of `base`.
    pub fn whole(&self, base: BaseId) -> Result<View, ShapeError> {
        let signal = self.get(base).ok_or(ShapeError::UnknownBase { base })?;
        Ok(View::whole(base, signal.len))
    }

    /// Validate a view against the table.
    pub fn check_view(&self, view: &View) -> Result<(), ShapeError> {
        let signal = self
            .get(view.base)
            .ok_or(ShapeError::UnknownBase { base: view.base })?;
        if view.shape.len() != view.strides.len() {
            return Err(ShapeError::RankMismatch {
                base: signal.name.clone(),
                shape_rank: view.shape.len(),
                strides_rank: view.strides.len(),
            });
        }
        let overflow = || ShapeError::Overflow {
            base: signal.name.clone(),
        };
        if checked_shape_size(&view.shape).ok_or_else(overflow)? == 0 {
            return Ok(());
        }
        let (first, last) = view.extent().ok_or_else(overflow)?;
        if first < 0 || last >= signal.len as i64 {
            return Err(ShapeError::OutOfBounds {
                base: signal.name.clone(),
                first,
                last,
                len: signal.len,
            });
        }
        Ok(())
    }

    /// Look up a base signal.
    pub fn get(&self, base: BaseId) -> Option<&BaseSignal> {
        self.bases.get(base.0 as usize)
    }

    /// Look up a base signal's handle by name.
    pub fn find(&self, name: &str) -> Option<BaseId> {
        self.by_name.get(name).copied()
    }

    /// Name of a base, or a placeholder for unknown handles.
    pub fn name_of(&self, base: BaseId) -> &str {
        self.get(base).map_or("<unknown>", |s| s.name.as_str())
    }

    /// Human-readable description of a view, using the base's name.
    pub fn describe(&self, view: &View) -> String {
        let mut text = view.to_string();
        let prefix = format!("base{}", view.base);
        text.replace_range(..prefix.len(), &format!("'{}'", self.name_of(view.base)));
        text
    }

    /// Iterate over `(id, signal)` pairs in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (BaseId, &BaseSignal)> {
        self.bases
            .iter()
            .enumerate()
            .map(|(i, s)| (BaseId(i as u32), s))
    }

    /// Number of registered bases.
    pub fn len(&self) -> usize {
        self.bases.len()
    }

    /// Whether the table has no bases.
    pub fn is_empty(&self) -> bool {
        self.bases.is_empty()
    }

    /// Total element count across all bases.
    pub fn total_len(&self) -> usize {
        self.bases.iter().map(|s| s.len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_with(len: usize) -> (SignalTable, BaseId) {
        let mut table = SignalTable::new();
        let id = table.add(BaseSignal::zeros("x", len)).unwrap();
        (table, id)
    }

    #[test]
    fn bases_get_sequential_ids() {
        let mut table = SignalTable::new();
        let a = table.add(BaseSignal::zeros("a", 3)).unwrap();
        let b = table
            .make_base("b", 2, DType::Float32, InitialValue::Fill(1.5))
            .unwrap();
        assert_eq!(a, BaseId(0));
        assert_eq!(b, BaseId(1));
        assert_eq!(table.len(), 2);
        assert_eq!(table.total_len(), 5);
        assert_eq!(table.find("b"), Some(b));
    }

    #[test]
    fn duplicate_name_rejected() {
        let (mut table, _) = table_with(3);
        let err = table.add(BaseSignal::zeros("x", 1)).unwrap_err();
        assert_eq!(err, ShapeError::DuplicateName { name: "x".into() });
    }

    #[test]
    fn initial_length_checked() {
        let mut table = SignalTable::new();
        let err = table
            .make_base("bad", 3, DType::Float64, InitialValue::Values(vec![1.0]))
            .unwrap_err();
        assert!(matches!(
            err,
            ShapeError::InitialLength {
                expected: 3,
                actual: 1,
                ..
            }
        ));
    }

    #[test]
    fn initial_values_cast_to_dtype() {
        let sig = BaseSignal {
            name: "f".into(),
            len: 2,
            dtype: DType::Float32,
            initial: InitialValue::Fill(0.1),
            kind: SignalKind::State,
        };
        assert_eq!(sig.initial_values(), vec![0.1_f32 as f64; 2]);
    }

    #[test]
    fn view_past_end_is_shape_error() {
        let (table, x) = table_with(4);
        assert!(table.make_contiguous_view(x, &[2], 2).is_ok());
        let err = table.make_contiguous_view(x, &[2], 3).unwrap_err();
        assert_eq!(
            err,
            ShapeError::OutOfBounds {
                base: "x".into(),
                first: 3,
                last: 4,
                len: 4,
            }
        );
    }

    #[test]
    fn negative_stride_below_zero_rejected() {
        let (table, x) = table_with(4);
        let err = table.make_view(x, &[3], 1, &[-1]).unwrap_err();
        assert!(matches!(err, ShapeError::OutOfBounds { first: -1, .. }));
    }

    #[test]
    fn oversized_views_are_errors_not_panics() {
        let (table, x) = table_with(4);
        let overflow = ShapeError::Overflow { base: "x".into() };

        // Extent arithmetic overflows i64.
        assert_eq!(table.make_view(x, &[3], 0, &[isize::MAX]), Err(overflow.clone()));
        // Element count overflows usize.
        let huge = 1usize << 32;
        assert_eq!(table.make_view(x, &[huge, huge], 0, &[1, 1]), Err(overflow.clone()));
        assert_eq!(table.make_contiguous_view(x, &[huge, huge], 0), Err(overflow));
        // Large but representable: an ordinary bounds error.
        assert!(matches!(
            table.make_view(x, &[2], 0, &[isize::MAX / 2]),
            Err(ShapeError::OutOfBounds { first: 0, .. })
        ));
        // An empty view is in bounds whatever its other dimensions.
        assert!(table.make_view(x, &[huge, huge, 0], 0, &[1, 1, 1]).is_ok());
        // Broadcast over one element still validates.
        assert!(table.make_view(x, &[huge], 3, &[0]).is_ok());
    }

    #[test]
    fn rank_mismatch_rejected() {
        let (table, x) = table_with(4);
        let err = table.make_view(x, &[2, 2], 0, &[2]).unwrap_err();
        assert!(matches!(
            err,
            ShapeError::RankMismatch {
                shape_rank: 2,
                strides_rank: 1,
                ..
            }
        ));
    }

    #[test]
    fn unknown_base_rejected() {
        let (table, _) = table_with(4);
        let err = table.whole(BaseId(9)).unwrap_err();
        assert_eq!(err, ShapeError::UnknownBase { base: BaseId(9) });
    }

    #[test]
    fn describe_uses_signal_name() {
        let (table, x) = table_with(6);
        let v = table.make_contiguous_view(x, &[2, 3], 0).unwrap();
        assert_eq!(table.describe(&v), "'x'[2x3 @0]");
    }

    #[test]
    fn reserved_kinds() {
        assert!(!SignalKind::State.is_reserved());
        assert!(SignalKind::Time.is_reserved());
        assert!(SignalKind::Step.is_reserved());
    }
}
