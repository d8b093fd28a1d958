//! Resolved windows into the arena's backing storage.

use sigsim_core::{BaseId, DType};

/// Physical layout of a resolved window.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Layout {
    /// A gap-free run of `len` elements starting at `start`.
    Contiguous {
        /// Absolute position of the first element.
        start: usize,
        /// Number of elements.
        len: usize,
    },
    /// Absolute element positions in the view's row-major order.
    Strided(Box<[usize]>),
}

/// A view resolved against a [`SignalArena`](crate::SignalArena).
///
/// Windows are produced by [`SignalArena::resolve`](crate::SignalArena::resolve)
/// and are only meaningful for the arena that produced them.
#[derive(Clone, Debug, PartialEq, Eq)]
#[must_use]
pub struct Window {
    pub(crate) base: BaseId,
    pub(crate) dtype: DType,
    pub(crate) layout: Layout,
}

impl Window {
    /// The base this window points into.
    pub fn base(&self) -> BaseId {
        self.base
    }

    /// Element type of the underlying base.
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// Physical layout.
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Number of elements in the window.
    pub fn len(&self) -> usize {
        match &self.layout {
            Layout::Contiguous { len, .. } => *len,
            Layout::Strided(positions) => positions.len(),
        }
    }

    /// Whether the window addresses no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the window is a single gap-free run.
    pub fn is_contiguous(&self) -> bool {
        matches!(self.layout, Layout::Contiguous { .. })
    }
}
