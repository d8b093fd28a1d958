//! Shape rules and the dense kernel behind [`DotIncOp`](crate::DotIncOp).
//!
//! `dot` follows the usual rank rules for rank ≤ 2 operands: a rank-0
//! operand scales the other, vector·vector is a scalar, matrix·vector is a
//! vector, vector·matrix is a vector, and matrix·matrix is a matrix.
//! Transposing a vector is a no-op.

use sigsim_core::view::shape_size;
use sigsim_core::Shape;
use smallvec::smallvec;

use crate::error::ShapeMismatchError;

/// Shape of `X` after the optional transpose.
pub fn effective_shape(x: &[usize], transpose_x: bool) -> Shape {
    if transpose_x && x.len() == 2 {
        smallvec![x[1], x[0]]
    } else {
        Shape::from_slice(x)
    }
}

/// Shape of `dot(A, X)`, or `None` when the product is undefined.
pub fn dot_shape(a: &[usize], x: &[usize], transpose_x: bool) -> Option<Shape> {
    let x = effective_shape(x, transpose_x);
    match (a, x.as_slice()) {
        ([], _) => Some(x.clone()),
        (_, []) => Some(Shape::from_slice(a)),
        ([k1], [k2]) if k1 == k2 => Some(Shape::new()),
        ([m, k1], [k2]) if k1 == k2 => Some(smallvec![*m]),
        ([k1], [k2, n]) if k1 == k2 => Some(smallvec![*n]),
        ([m, k1], [k2, n]) if k1 == k2 => Some(smallvec![*m, *n]),
        _ => None,
    }
}

/// Whether a value of shape `result` may be written into a view of shape
/// `target`: equal shapes, or a single element into a single element.
pub fn fits(result: &[usize], target: &[usize]) -> bool {
    result == target || (shape_size(result) == 1 && shape_size(target) == 1)
}

/// Compute `dot(A, X)` into `out`, replacing its contents.
///
/// `a` and `x` hold the operands in row-major order of their declared
/// shapes; `x` is transposed on the fly when requested.
pub fn dot_into(
    a: &[f64],
    a_shape: &[usize],
    x: &[f64],
    x_shape: &[usize],
    transpose_x: bool,
    out: &mut Vec<f64>,
) -> Result<(), ShapeMismatchError> {
    let mismatch = || ShapeMismatchError::Dot {
        a: Shape::from_slice(a_shape),
        x: Shape::from_slice(x_shape),
        transpose_x,
    };
    if a.len() != shape_size(a_shape) || x.len() != shape_size(x_shape) {
        return Err(mismatch());
    }
    let eff = effective_shape(x_shape, transpose_x);
    let transposed = transpose_x && x_shape.len() == 2;
    // Element (i, j) of the effective 2-D X.
    let x_at = |i: usize, j: usize| -> f64 {
        if transposed {
            x[j * x_shape[1] + i]
        } else {
            x[i * eff[1] + j]
        }
    };

    out.clear();
    match (a_shape, eff.as_slice()) {
        ([], [r, c]) => {
            for i in 0..*r {
                for j in 0..*c {
                    out.push(a[0] * x_at(i, j));
                }
            }
        }
        ([], _) => out.extend(x.iter().map(|&v| a[0] * v)),
        (_, []) => out.extend(a.iter().map(|&v| v * x[0])),
        ([k1], [k2]) if k1 == k2 => {
            out.push(a.iter().zip(x).map(|(&p, &q)| p * q).sum());
        }
        ([m, 0], [0]) => out.resize(*m, 0.0),
        ([m, k1], [k2]) if k1 == k2 => {
            for row in a.chunks_exact(*k1).take(*m) {
                out.push(row.iter().zip(x).map(|(&p, &q)| p * q).sum());
            }
        }
        ([k1], [k2, n]) if k1 == k2 => {
            for j in 0..*n {
                out.push((0..*k1).map(|l| a[l] * x_at(l, j)).sum());
            }
        }
        ([m, k1], [k2, n]) if k1 == k2 => {
            for i in 0..*m {
                for j in 0..*n {
                    out.push((0..*k1).map(|l| a[i * k1 + l] * x_at(l, j)).sum());
                }
            }
        }
        _ => return Err(mismatch()),
    }
    Ok(())
}
