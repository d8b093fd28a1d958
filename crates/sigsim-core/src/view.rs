//! Views: windowed, possibly strided references into a base signal.
//!
//! A [`View`] is a plain value type. Two views built from the same
//! `(base, shape, offset, strides)` compare and hash equal, which is what
//! the scheduler keys its role indices on.
//!
//! Offsets and strides are expressed in elements. The byte-level
//! description used for aliasing is derived by multiplying with the base's
//! [`DType::itemsize`](crate::DType::itemsize); since every view of a base
//! shares one element type, element ranges and byte ranges intersect
//! identically.

use std::fmt;

use smallvec::SmallVec;

use crate::id::BaseId;

/// Dimensions of a view. Rank 0 is a scalar.
pub type Shape = SmallVec<[usize; 2]>;

/// Per-dimension element strides of a view.
pub type Strides = SmallVec<[isize; 2]>;

/// Number of elements addressed by a shape, saturating at `usize::MAX`.
pub fn shape_size(shape: &[usize]) -> usize {
    shape.iter().fold(1usize, |acc, &dim| acc.saturating_mul(dim))
}

/// Number of elements addressed by a shape, or `None` on overflow.
pub fn checked_shape_size(shape: &[usize]) -> Option<usize> {
    shape.iter().try_fold(1usize, |acc, &dim| acc.checked_mul(dim))
}

/// Row-major ("C order") strides for a shape.
///
/// Strides saturate at `isize::MAX`; a view that large never passes
/// [`SignalTable::check_view`](crate::SignalTable::check_view).
pub fn natural_strides(shape: &[usize]) -> Strides {
    let mut strides: Strides = SmallVec::from_elem(0, shape.len());
    let mut acc: isize = 1;
    for (i, &dim) in shape.iter().enumerate().rev() {
        strides[i] = acc;
        acc = acc.saturating_mul(isize::try_from(dim).unwrap_or(isize::MAX));
    }
    strides
}

/// A window into a base signal's memory.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct View {
    /// The base signal this view reads from and writes to.
    pub base: BaseId,
    /// Dimensions of the view.
    pub shape: Shape,
    /// Element offset of the view's first element within the base.
    pub offset: usize,
    /// Element strides, one per dimension.
    pub strides: Strides,
}

impl View {
    /// A view with natural (row-major) strides.
    pub fn contiguous(base: BaseId, shape: &[usize], offset: usize) -> Self {
        Self {
            base,
            shape: SmallVec::from_slice(shape),
            offset,
            strides: natural_strides(shape),
        }
    }

    /// The trivial 1-D view covering a whole base of `len` elements.
    pub fn whole(base: BaseId, len: usize) -> Self {
        Self::contiguous(base, &[len], 0)
    }

    /// Number of dimensions.
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Number of addressed elements, saturating at `usize::MAX`.
    pub fn size(&self) -> usize {
        shape_size(&self.shape)
    }

    /// Whether the view addresses no elements.
    pub fn is_empty(&self) -> bool {
        self.shape.contains(&0)
    }

    /// Whether the view addresses a gap-free, row-major run of elements.
    ///
    /// Dimensions of extent 1 never contribute a step, so their stride is
    /// ignored.
    pub fn is_contiguous(&self) -> bool {
        let natural = natural_strides(&self.shape);
        self.shape
            .iter()
            .zip(self.strides.iter().zip(natural.iter()))
            .all(|(&dim, (&s, &n))| dim <= 1 || s == n)
    }

    /// Lowest and highest element index touched, relative to the base.
    ///
    /// Returns `None` for empty views and for views whose endpoints do not
    /// fit in an `i64`. Both endpoints are addressed by the view (they are
    /// attained, not just bounds).
    pub fn extent(&self) -> Option<(i64, i64)> {
        if self.is_empty() {
            return None;
        }
        let mut lo = i64::try_from(self.offset).ok()?;
        let mut hi = lo;
        for (&dim, &stride) in self.shape.iter().zip(self.strides.iter()) {
            let steps = i64::try_from(dim - 1).ok()?;
            let span = i64::try_from(stride).ok()?.checked_mul(steps)?;
            if span < 0 {
                lo = lo.checked_add(span)?;
            } else {
                hi = hi.checked_add(span)?;
            }
        }
        Some((lo, hi))
    }

    /// Byte offset of the first element for a given element size.
    pub fn byte_offset(&self, itemsize: usize) -> usize {
        self.offset.saturating_mul(itemsize)
    }

    /// Byte strides for a given element size.
    pub fn byte_strides(&self, itemsize: usize) -> Strides {
        self.strides
            .iter()
            .map(|&s| s.saturating_mul(itemsize as isize))
            .collect()
    }

    /// Half-open byte range `[start, end)` touched by the view.
    pub fn byte_range(&self, itemsize: usize) -> Option<(i64, i64)> {
        let (lo, hi) = self.extent()?;
        let size = i64::try_from(itemsize).ok()?;
        Some((lo.checked_mul(size)?, hi.checked_add(1)?.checked_mul(size)?))
    }

    /// Element indices addressed by the view, in row-major order.
    ///
    /// Indices are relative to the base. Callers must have validated the
    /// view against its base first (see
    /// [`SignalTable::check_view`](crate::SignalTable::check_view)), which
    /// guarantees every index is non-negative.
    pub fn element_indices(&self) -> Vec<usize> {
        let size = self.size();
        let mut out = Vec::with_capacity(size);
        if size == 0 {
            return out;
        }
        let ndim = self.ndim();
        let mut counter: SmallVec<[usize; 4]> = SmallVec::from_elem(0, ndim);
        let mut index = self.offset as i64;
        loop {
            out.push(index as usize);
            // Odometer increment over the shape, innermost dimension first.
            let mut dim = ndim;
            loop {
                if dim == 0 {
                    return out;
                }
                dim -= 1;
                counter[dim] += 1;
                index += self.strides[dim] as i64;
                if counter[dim] < self.shape[dim] {
                    break;
                }
                index -= self.strides[dim] as i64 * self.shape[dim] as i64;
                counter[dim] = 0;
            }
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "base{}[", self.base)?;
        for (i, dim) in self.shape.iter().enumerate() {
            if i > 0 {
                write!(f, "x")?;
            }
            write!(f, "{dim}")?;
        }
        write!(f, " @{}", self.offset)?;
        if !self.is_contiguous() {
            write!(f, " strides {:?}", self.strides.as_slice())?;
        }
        write!(f, "]")
    }
}
