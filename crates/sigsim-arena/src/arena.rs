//! The [`SignalArena`]: contiguous storage for every base signal.

use indexmap::IndexMap;
use sigsim_core::{BaseId, DType, SignalTable, View};

use crate::error::ArenaError;
use crate::window::{Layout, Window};

/// Location of one base signal inside the arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BaseSlot {
    /// Absolute position of the base's first element.
    pub offset: usize,
    /// Length in elements.
    pub len: usize,
    /// Element type.
    pub dtype: DType,
}

/// Owned numeric storage for all base signals of a model.
///
/// The arena is the only owner of simulation state. Operators never hold
/// references into it across calls; they move values in and out through
/// resolved [`Window`]s.
pub struct SignalArena {
    /// Live contents, mutated in place every tick.
    data: Vec<f64>,
    /// Construction-time contents, copied back on reset.
    initial: Vec<f64>,
    /// Maps each base to its slot within `data`.
    slots: IndexMap<BaseId, BaseSlot>,
}

impl SignalArena {
    /// Allocate storage for every base in `table`, filled with initial values.
    pub fn new(table: &SignalTable) -> Self {
        let mut initial = Vec::with_capacity(table.total_len());
        let mut slots = IndexMap::with_capacity(table.len());
        for (id, signal) in table.iter() {
            slots.insert(
                id,
                BaseSlot {
                    offset: initial.len(),
                    len: signal.len,
                    dtype: signal.dtype,
                },
            );
            initial.extend(signal.initial_values());
        }
        Self {
            data: initial.clone(),
            initial,
            slots,
        }
    }

    /// Resolve a view into an absolute-position window.
    pub fn resolve(&self, view: &View) -> Result<Window, ArenaError> {
        let slot = self.slot(view.base)?;
        let layout = match view.extent() {
            None => Layout::Contiguous {
                start: slot.offset,
                len: 0,
            },
            Some((first, last)) => {
                if first < 0 || last >= slot.len as i64 {
                    return Err(ArenaError::OutOfBounds {
                        base: view.base,
                        first,
                        last,
                        len: slot.len,
                    });
                }
                if view.is_contiguous() {
                    Layout::Contiguous {
                        start: slot.offset + view.offset,
                        len: view.size(),
                    }
                } else {
                    let positions: Vec<usize> = view
                        .element_indices()
                        .into_iter()
                        .map(|i| slot.offset + i)
                        .collect();
                    Layout::Strided(positions.into_boxed_slice())
                }
            }
        };
        Ok(Window {
            base: view.base,
            dtype: slot.dtype,
            layout,
        })
    }

    /// Copy a window's current values into `out`, replacing its contents.
    pub fn gather(&self, window: &Window, out: &mut Vec<f64>) {
        out.clear();
        match &window.layout {
            Layout::Contiguous { start, len } => {
                out.extend_from_slice(&self.data[*start..*start + *len]);
            }
            Layout::Strided(positions) => {
                out.extend(positions.iter().map(|&p| self.data[p]));
            }
        }
    }

    /// Overwrite a window with `values`.
    pub fn store(&mut self, window: &Window, values: &[f64]) -> Result<(), ArenaError> {
        check_len(window, values)?;
        let dtype = window.dtype;
        match &window.layout {
            Layout::Contiguous { start, len } => {
                for (dst, &v) in self.data[*start..*start + *len].iter_mut().zip(values) {
                    *dst = dtype.cast(v);
                }
            }
            Layout::Strided(positions) => {
                for (&p, &v) in positions.iter().zip(values) {
                    self.data[p] = dtype.cast(v);
                }
            }
        }
        Ok(())
    }

    /// Add `values` element-wise into a window.
    pub fn accumulate(&mut self, window: &Window, values: &[f64]) -> Result<(), ArenaError> {
        check_len(window, values)?;
        let dtype = window.dtype;
        match &window.layout {
            Layout::Contiguous { start, len } => {
                for (dst, &v) in self.data[*start..*start + *len].iter_mut().zip(values) {
                    *dst = dtype.cast(*dst + v);
                }
            }
            Layout::Strided(positions) => {
                for (&p, &v) in positions.iter().zip(values) {
                    self.data[p] = dtype.cast(self.data[p] + v);
                }
            }
        }
        Ok(())
    }

    /// Set every element of a window to `value`.
    pub fn fill(&mut self, window: &Window, value: f64) {
        let value = window.dtype.cast(value);
        match &window.layout {
            Layout::Contiguous { start, len } => {
                self.data[*start..*start + *len].fill(value);
            }
            Layout::Strided(positions) => {
                for &p in positions.iter() {
                    self.data[p] = value;
                }
            }
        }
    }

    /// Index (within the window) of the first NaN or infinite element.
    pub fn first_non_finite(&self, window: &Window) -> Option<usize> {
        match &window.layout {
            Layout::Contiguous { start, len } => self.data[*start..*start + *len]
                .iter()
                .position(|v| !v.is_finite()),
            Layout::Strided(positions) => {
                positions.iter().position(|&p| !self.data[p].is_finite())
            }
        }
    }

    /// Read a whole base signal.
    pub fn base(&self, base: BaseId) -> Option<&[f64]> {
        let slot = self.slots.get(&base)?;
        Some(&self.data[slot.offset..slot.offset + slot.len])
    }

    /// Overwrite a whole base signal, casting to its element type.
    ///
    /// Used by the runtime for signals it owns (clock signals); operators
    /// always go through windows.
    pub fn write_base(&mut self, base: BaseId, values: &[f64]) -> Result<(), ArenaError> {
        let slot = self.slot(base)?;
        if values.len() != slot.len {
            return Err(ArenaError::LengthMismatch {
                base,
                expected: slot.len,
                actual: values.len(),
            });
        }
        for (dst, &v) in self.data[slot.offset..slot.offset + slot.len]
            .iter_mut()
            .zip(values)
        {
            *dst = slot.dtype.cast(v);
        }
        Ok(())
    }

    /// Copy every base back to its construction-time contents.
    pub fn restore_initial(&mut self) {
        self.data.copy_from_slice(&self.initial);
    }

    /// Slot descriptor for a base.
    pub fn slot(&self, base: BaseId) -> Result<BaseSlot, ArenaError> {
        self.slots
            .get(&base)
            .copied()
            .ok_or(ArenaError::UnknownBase { base })
    }

    /// Number of base signals.
    pub fn base_count(&self) -> usize {
        self.slots.len()
    }

    /// Total number of elements across all bases.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the arena holds no elements.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Memory held by live and initial storage, in bytes.
    pub fn memory_bytes(&self) -> usize {
        (self.data.len() + self.initial.len()) * std::mem::size_of::<f64>()
    }
}

fn check_len(window: &Window, values: &[f64]) -> Result<(), ArenaError> {
    let expected = window.len();
    if values.len() != expected {
        return Err(ArenaError::LengthMismatch {
            base: window.base,
            expected,
            actual: values.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sigsim_core::{BaseSignal, InitialValue};

    fn two_base_table() -> (SignalTable, BaseId, BaseId) {
        let mut table = SignalTable::new();
        let a = table
            .add(BaseSignal::from_values("a", vec![1.0, 2.0, 3.0]))
            .unwrap();
        let m = table
            .add(BaseSignal::from_values(
                "m",
                vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0],
            ))
            .unwrap();
        (table, a, m)
    }

    #[test]
    fn new_packs_bases_in_order() {
        let (table, a, m) = two_base_table();
        let arena = SignalArena::new(&table);
        assert_eq!(arena.len(), 12);
        assert_eq!(arena.base_count(), 2);
        assert_eq!(arena.slot(a).unwrap().offset, 0);
        assert_eq!(arena.slot(m).unwrap().offset, 3);
        assert_eq!(arena.base(a).unwrap(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn contiguous_view_resolves_to_range() {
        let (table, _, m) = two_base_table();
        let arena = SignalArena::new(&table);
        let row = table.make_contiguous_view(m, &[3], 3).unwrap();
        let w = arena.resolve(&row).unwrap();
        assert_eq!(w.layout(), &Layout::Contiguous { start: 6, len: 3 });
        let mut out = Vec::new();
        arena.gather(&w, &mut out);
        assert_eq!(out, vec![3.0, 4.0, 5.0]);
    }

    #[test]
    fn strided_view_gathers_column() {
        let (table, _, m) = two_base_table();
        let arena = SignalArena::new(&table);
        let column = table.make_view(m, &[3], 2, &[3]).unwrap();
        let w = arena.resolve(&column).unwrap();
        assert!(!w.is_contiguous());
        let mut out = Vec::new();
        arena.gather(&w, &mut out);
        assert_eq!(out, vec![2.0, 5.0, 8.0]);
    }

    #[test]
    fn store_and_accumulate_through_aliased_windows() {
        let (table, _, m) = two_base_table();
        let mut arena = SignalArena::new(&table);
        let whole = arena.resolve(&table.whole(m).unwrap()).unwrap();
        let middle = arena
            .resolve(&table.make_contiguous_view(m, &[3], 3).unwrap())
            .unwrap();
        arena.fill(&whole, 0.0);
        arena.accumulate(&middle, &[1.0, 1.0, 1.0]).unwrap();
        arena.accumulate(&middle, &[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(
            arena.base(m).unwrap(),
            &[0.0, 0.0, 0.0, 2.0, 3.0, 4.0, 0.0, 0.0, 0.0]
        );
        arena.store(&middle, &[9.0, 9.0, 9.0]).unwrap();
        assert_eq!(arena.base(m).unwrap()[3..6], [9.0, 9.0, 9.0]);
    }

    #[test]
    fn store_length_mismatch() {
        let (table, a, _) = two_base_table();
        let mut arena = SignalArena::new(&table);
        let w = arena.resolve(&table.whole(a).unwrap()).unwrap();
        let err = arena.store(&w, &[1.0]).unwrap_err();
        assert_eq!(
            err,
            ArenaError::LengthMismatch {
                base: a,
                expected: 3,
                actual: 1,
            }
        );
    }

    #[test]
    fn restore_initial_undoes_writes() {
        let (table, a, _) = two_base_table();
        let mut arena = SignalArena::new(&table);
        let w = arena.resolve(&table.whole(a).unwrap()).unwrap();
        arena.fill(&w, 7.0);
        assert_eq!(arena.base(a).unwrap(), &[7.0, 7.0, 7.0]);
        arena.restore_initial();
        assert_eq!(arena.base(a).unwrap(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn float32_base_rounds_on_write() {
        let mut table = SignalTable::new();
        let f = table
            .make_base("f", 1, DType::Float32, InitialValue::Zeros)
            .unwrap();
        let mut arena = SignalArena::new(&table);
        let w = arena.resolve(&table.whole(f).unwrap()).unwrap();
        arena.store(&w, &[0.1]).unwrap();
        assert_eq!(arena.base(f).unwrap(), &[0.1_f32 as f64]);
    }

    #[test]
    fn non_finite_detection() {
        let (table, a, _) = two_base_table();
        let mut arena = SignalArena::new(&table);
        let w = arena.resolve(&table.whole(a).unwrap()).unwrap();
        assert_eq!(arena.first_non_finite(&w), None);
        arena.store(&w, &[1.0, f64::NAN, 2.0]).unwrap();
        assert_eq!(arena.first_non_finite(&w), Some(1));
    }

    #[test]
    fn out_of_bounds_view_rejected_at_resolve() {
        let (table, a, _) = two_base_table();
        let arena = SignalArena::new(&table);
        // Bypass table validation to exercise the arena's own check.
        let bad = View::contiguous(a, &[4], 0);
        assert!(matches!(
            arena.resolve(&bad),
            Err(ArenaError::OutOfBounds { len: 3, .. })
        ));
        let unknown = View::whole(BaseId(42), 1);
        assert_eq!(
            arena.resolve(&unknown),
            Err(ArenaError::UnknownBase { base: BaseId(42) })
        );
    }

    #[test]
    fn write_base_overwrites_slot() {
        let (table, a, _) = two_base_table();
        let mut arena = SignalArena::new(&table);
        arena.write_base(a, &[4.0, 5.0, 6.0]).unwrap();
        assert_eq!(arena.base(a).unwrap(), &[4.0, 5.0, 6.0]);
        assert!(arena.write_base(a, &[1.0]).is_err());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn gather_after_store_matches_input(
                len in 1usize..32,
                offset in 0usize..8,
                stride in 1isize..4,
            ) {
                let base_len = offset + (len - 1) * stride as usize + 1;
                let mut table = SignalTable::new();
                let b = table.add(BaseSignal::zeros("b", base_len)).unwrap();
                let view = table.make_view(b, &[len], offset, &[stride]).unwrap();
                let mut arena = SignalArena::new(&table);
                let w = arena.resolve(&view).unwrap();
                let values: Vec<f64> = (0..len).map(|i| i as f64 * 0.5).collect();
                arena.store(&w, &values).unwrap();
                let mut out = Vec::new();
                arena.gather(&w, &mut out);
                prop_assert_eq!(out, values);
            }
        }
    }
}
