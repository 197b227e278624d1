//! Dense matrix × `Vec3`-array products.
//!
//! The coupling operators map node-space arrays (N rows of `Vec3`) to
//! hole-space arrays (H rows) and back. Storing 3-vectors as `glam`
//! rows keeps the per-step vector math in one place while the operator
//! itself stays an ordinary dense matrix.

use glam::Vec3;
use nalgebra::DMatrix;
use tendril_types::{Scalar, TendrilError, TendrilResult};

/// Computes `y = M · x` where `x` is an array of row 3-vectors.
///
/// `M` is R×C; `x` must have C rows; the result has R rows.
pub fn apply(matrix: &DMatrix<Scalar>, x: &[Vec3]) -> TendrilResult<Vec<Vec3>> {
    if x.len() != matrix.ncols() {
        return Err(TendrilError::ShapeMismatch {
            context: "matrix apply".into(),
            expected: matrix.ncols(),
            actual: x.len(),
        });
    }

    let mut out = vec![Vec3::ZERO; matrix.nrows()];
    for (i, row) in out.iter_mut().enumerate() {
        let mut acc = Vec3::ZERO;
        for (j, xj) in x.iter().enumerate() {
            let w = matrix[(i, j)];
            if w != 0.0 {
                acc += *xj * w;
            }
        }
        *row = acc;
    }
    Ok(out)
}

/// Computes `y = Mᵀ · x` without materializing the transpose.
///
/// `M` is R×C; `x` must have R rows; the result has C rows.
pub fn apply_transpose(matrix: &DMatrix<Scalar>, x: &[Vec3]) -> TendrilResult<Vec<Vec3>> {
    if x.len() != matrix.nrows() {
        return Err(TendrilError::ShapeMismatch {
            context: "matrix transpose apply".into(),
            expected: matrix.nrows(),
            actual: x.len(),
        });
    }

    let mut out = vec![Vec3::ZERO; matrix.ncols()];
    for (i, xi) in x.iter().enumerate() {
        for (j, oj) in out.iter_mut().enumerate() {
            let w = matrix[(i, j)];
            if w != 0.0 {
                *oj += *xi * w;
            }
        }
    }
    Ok(out)
}
