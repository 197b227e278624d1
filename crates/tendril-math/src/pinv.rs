//! Dense Moore-Penrose pseudo-inversion.
//!
//! Computes in f64 internally for numerical robustness but accepts and
//! returns f32 at the interface boundary. The coupling operators are
//! small (holes × nodes), built once per scene, so the SVD cost is
//! irrelevant next to the rollout itself.

use nalgebra::DMatrix;
use tendril_types::constants::PINV_TOLERANCE;
use tendril_types::{Scalar, TendrilError, TendrilResult};

/// Moore-Penrose pseudo-inverse of a dense matrix via SVD.
///
/// Singular values below [`PINV_TOLERANCE`] (relative to the largest)
/// are treated as zero.
pub fn pseudo_inverse(matrix: &DMatrix<Scalar>) -> TendrilResult<DMatrix<Scalar>> {
    if matrix.nrows() == 0 || matrix.ncols() == 0 {
        return Err(TendrilError::Numerical(
            "Cannot pseudo-invert an empty matrix".into(),
        ));
    }

    let promoted = DMatrix::<f64>::from_fn(matrix.nrows(), matrix.ncols(), |i, j| {
        matrix[(i, j)] as f64
    });

    let pinv = promoted
        .svd(true, true)
        .pseudo_inverse(PINV_TOLERANCE)
        .map_err(|e| TendrilError::Numerical(format!("Pseudo-inversion failed: {e}")))?;

    Ok(DMatrix::<Scalar>::from_fn(pinv.nrows(), pinv.ncols(), |i, j| {
        pinv[(i, j)] as Scalar
    }))
}
