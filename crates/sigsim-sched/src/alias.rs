//! Pairwise aliasing analysis over views.
//!
//! Views on different bases never share memory. Within one base, the
//! analyzer first compares extents, then tries to describe each view as an
//! arithmetic progression of element indices. Contiguous views and views
//! with a single non-trivial dimension have such a description, and any
//! two progressions with equal steps (or one of step 1) are decided
//! exactly. Everything else whose extents intersect is [`Overlap::Unknown`];
//! the scheduler never treats an unknown pair as disjoint.

use sigsim_core::View;

/// Result of comparing two views.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Overlap {
    /// The views share no element.
    Disjoint,
    /// The views share at least one element.
    Overlapping,
    /// The views' extents intersect but their element sets were not
    /// compared.
    Unknown,
}

/// How the scheduler handles [`Overlap::Unknown`] pairs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AliasPolicy {
    /// Treat unknown pairs as overlapping. Two setters on an unknown pair
    /// are still rejected, since their write order cannot be fixed.
    #[default]
    Conservative,
    /// Reject any unknown pair that would decide an ordering edge.
    Strict,
}

/// Element indices `lo, lo + step, ..., lo + (count - 1) * step`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Progression {
    lo: i64,
    step: i64,
    count: i64,
}

impl Progression {
    fn of(view: &View) -> Option<Self> {
        let (lo, _) = view.extent()?;
        let count = view.size() as i64;
        if view.is_contiguous() {
            return Some(Self { lo, step: 1, count });
        }
        let mut moving = view
            .shape
            .iter()
            .zip(view.strides.iter())
            .filter(|&(&dim, _)| dim > 1);
        let (_, &stride) = moving.next()?;
        if moving.next().is_some() {
            return None;
        }
        if stride == 0 {
            // Every element is the same index.
            return Some(Self {
                lo,
                step: 1,
                count: 1,
            });
        }
        Some(Self {
            lo,
            step: stride.unsigned_abs() as i64,
            count,
        })
    }

    fn hi(self) -> i64 {
        self.lo + (self.count - 1) * self.step
    }

    /// Whether some element falls within `[lo, hi]`.
    fn hits(self, lo: i64, hi: i64) -> bool {
        let k = if lo <= self.lo {
            0
        } else {
            (lo - self.lo + self.step - 1) / self.step
        };
        k < self.count && self.lo + k * self.step <= hi
    }
}

/// Compare two views for shared elements.
pub fn overlap(a: &View, b: &View) -> Overlap {
    if a.base != b.base {
        return Overlap::Disjoint;
    }
    let (Some((a_lo, a_hi)), Some((b_lo, b_hi))) = (a.extent(), b.extent()) else {
        return Overlap::Disjoint;
    };
    if a_hi < b_lo || b_hi < a_lo {
        return Overlap::Disjoint;
    }
    if a == b {
        return Overlap::Overlapping;
    }
    let (Some(p), Some(q)) = (Progression::of(a), Progression::of(b)) else {
        return Overlap::Unknown;
    };
    let shared = if p.step == 1 {
        q.hits(p.lo, p.hi())
    } else if q.step == 1 {
        p.hits(q.lo, q.hi())
    } else if p.step == q.step {
        // Extents intersect, so equal residues guarantee a common element.
        (p.lo - q.lo).rem_euclid(p.step) == 0
    } else {
        return Overlap::Unknown;
    };
    if shared {
        Overlap::Overlapping
    } else {
        Overlap::Disjoint
    }
}

/// Conservative boolean form of [`overlap`]: only provably disjoint views
/// are reported as not overlapping.
pub fn overlaps(a: &View, b: &View) -> bool {
    overlap(a, b) != Overlap::Disjoint
}

#[cfg(test)]
mod tests {
    use super::*;
    use sigsim_core::BaseId;
    use smallvec::SmallVec;

    fn contiguous(base: u32, len: usize, offset: usize) -> View {
        View::contiguous(BaseId(base), &[len], offset)
    }

    fn strided(base: u32, shape: &[usize], offset: usize, strides: &[isize]) -> View {
        View {
            base: BaseId(base),
            shape: SmallVec::from_slice(shape),
            offset,
            strides: SmallVec::from_slice(strides),
        }
    }

    #[test]
    fn different_bases_never_overlap() {
        assert_eq!(overlap(&contiguous(0, 4, 0), &contiguous(1, 4, 0)), Overlap::Disjoint);
    }

    #[test]
    fn contiguous_ranges() {
        let a = contiguous(0, 4, 0);
        assert_eq!(overlap(&a, &contiguous(0, 4, 4)), Overlap::Disjoint);
        assert_eq!(overlap(&a, &contiguous(0, 4, 3)), Overlap::Overlapping);
        assert_eq!(overlap(&a, &a.clone()), Overlap::Overlapping);
        // A 2x2 block and the flat view over the same elements.
        let block = View::contiguous(BaseId(0), &[2, 2], 0);
        assert_eq!(overlap(&a, &block), Overlap::Overlapping);
    }

    #[test]
    fn empty_views_are_disjoint() {
        assert_eq!(overlap(&contiguous(0, 0, 2), &contiguous(0, 4, 0)), Overlap::Disjoint);
    }

    #[test]
    fn strided_against_contiguous_is_exact() {
        // Even elements 0, 2, 4, 6.
        let evens = strided(0, &[4], 0, &[2]);
        assert_eq!(overlap(&evens, &contiguous(0, 1, 3)), Overlap::Disjoint);
        assert_eq!(overlap(&evens, &contiguous(0, 1, 4)), Overlap::Overlapping);
        assert_eq!(overlap(&contiguous(0, 2, 3), &evens), Overlap::Overlapping);
    }

    #[test]
    fn equal_steps_compare_residues() {
        let evens = strided(0, &[4], 0, &[2]);
        let odds = strided(0, &[4], 1, &[2]);
        assert_eq!(overlap(&evens, &odds), Overlap::Disjoint);
        assert_eq!(overlap(&evens, &strided(0, &[2], 2, &[2])), Overlap::Overlapping);
    }

    #[test]
    fn negative_strides_use_attained_extent() {
        // Elements 6, 4, 2, 0.
        let reversed = strided(0, &[4], 6, &[-2]);
        assert_eq!(overlap(&reversed, &contiguous(0, 1, 5)), Overlap::Disjoint);
        assert_eq!(overlap(&reversed, &contiguous(0, 1, 6)), Overlap::Overlapping);
    }

    #[test]
    fn unequal_steps_are_unknown() {
        let by2 = strided(0, &[4], 0, &[2]);
        let by3 = strided(0, &[3], 1, &[3]);
        assert_eq!(overlap(&by2, &by3), Overlap::Unknown);
        assert!(overlaps(&by2, &by3));
    }

    #[test]
    fn column_of_matrix_is_a_progression() {
        // Column 1 of a 3x3 row-major matrix: elements 1, 4, 7.
        let column = strided(0, &[3, 1], 1, &[3, 1]);
        assert_eq!(overlap(&column, &contiguous(0, 2, 2)), Overlap::Disjoint);
        assert_eq!(overlap(&column, &contiguous(0, 2, 3)), Overlap::Overlapping);
        assert_eq!(overlap(&column, &contiguous(0, 1, 5)), Overlap::Disjoint);
    }

    #[test]
    fn transposed_block_is_unknown_against_strided() {
        // Transpose of a 2x2 block: two moving dimensions, not a progression.
        let transposed = strided(0, &[2, 2], 0, &[1, 3]);
        let by2 = strided(0, &[3], 0, &[2]);
        assert_eq!(overlap(&transposed, &by2), Overlap::Unknown);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn indices(view: &View) -> Vec<usize> {
            view.element_indices()
        }

        fn strided_view() -> impl Strategy<Value = View> {
            (1usize..6, 0usize..8, 1isize..4).prop_map(|(len, offset, stride)| {
                strided(0, &[len], offset, &[stride])
            })
        }

        proptest! {
            #[test]
            fn decided_pairs_match_element_sets(a in strided_view(), b in strided_view()) {
                let shared = indices(&a).iter().any(|i| indices(&b).contains(i));
                match overlap(&a, &b) {
                    Overlap::Disjoint => prop_assert!(!shared),
                    Overlap::Overlapping => prop_assert!(shared),
                    Overlap::Unknown => {}
                }
            }

            #[test]
            fn overlap_is_symmetric(a in strided_view(), b in strided_view()) {
                prop_assert_eq!(overlap(&a, &b), overlap(&b, &a));
            }
        }
    }
}
