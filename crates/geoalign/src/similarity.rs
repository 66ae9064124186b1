//! Closed-form least-squares similarity alignment (Umeyama).
//!
//! Given correspondences `(s_i, t_i)` the solver minimizes
//!
//! ```text
//! Σ |t_i - (c * R * s_i + t)|²
//! ```
//!
//! over the scale `c > 0`, the proper rotation `R` and the translation `t`.
//!
//! Reference: S. Umeyama, "Least-squares estimation of transformation
//! parameters between two point patterns", IEEE PAMI 13(4), 1991.

use glam::{DMat3, DVec3};
use serde::{Deserialize, Serialize};

use crate::correspondence::{CorrespondenceSet, Point3};
use crate::error::{AlignError, AlignResult};
use crate::linalg::svd3;
use crate::transform::SimilarityTransform;

/// Minimum number of correspondences for a closed-form fit.
pub const MIN_CORRESPONDENCES: usize = 3;

/// Relative threshold below which a singular value is treated as zero.
const RANK_TOLERANCE: f64 = 1e-9;

/// Alignment models available to the estimators.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlignMethod {
    /// Uniform scale, rotation and translation (7 DOF).
    #[default]
    Similarity,
    /// Rotation and translation only, scale pinned to 1 (6 DOF).
    Rigid,
}

impl AlignMethod {
    /// Fit the model to all correspondences of `set`.
    pub fn fit(&self, set: &CorrespondenceSet) -> AlignResult<SimilarityTransform> {
        match self {
            AlignMethod::Similarity => estimate(set),
            AlignMethod::Rigid => estimate_rigid(set),
        }
    }
}

/// Estimate the least-squares optimal similarity transform mapping source onto target.
///
/// # Errors
///
/// * [`AlignError::DegenerateInput`] with fewer than 3 correspondences or collinear points.
/// * [`AlignError::NumericalInstability`] if the source points coincide or the
///   cross-covariance vanishes.
///
/// Example:
///
/// ```
/// use geoalign::{estimate, CorrespondenceSet};
///
/// let source = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 1.0, 0.0]];
/// let target = [[1.0, 2.0, 3.0], [3.0, 2.0, 3.0], [1.0, 4.0, 3.0], [3.0, 4.0, 3.0]];
/// let set = CorrespondenceSet::from_arrays(&source, &target)?;
///
/// let transform = estimate(&set)?;
/// assert!((transform.scale() - 2.0).abs() < 1e-9);
/// # Ok::<(), geoalign::AlignError>(())
/// ```
pub fn estimate(set: &CorrespondenceSet) -> AlignResult<SimilarityTransform> {
    umeyama(set.source(), set.target(), true)
}

/// Estimate the least-squares optimal rigid transform (scale fixed to 1).
pub fn estimate_rigid(set: &CorrespondenceSet) -> AlignResult<SimilarityTransform> {
    umeyama(set.source(), set.target(), false)
}

fn umeyama(src: &[Point3], dst: &[Point3], with_scale: bool) -> AlignResult<SimilarityTransform> {
    let n = src.len();
    if n < MIN_CORRESPONDENCES {
        return Err(AlignError::DegenerateInput(
            "at least 3 correspondences are required",
        ));
    }
    let inv_n = 1.0 / n as f64;

    // 1. centroids
    let mu_s = src.iter().sum::<DVec3>() * inv_n;
    let mu_d = dst.iter().sum::<DVec3>() * inv_n;

    // 2-3. H = 1/n Σ (d_i - mu_d)(s_i - mu_s)^T and the variances of both sets
    let mut h = DMat3::ZERO;
    let mut var_s = 0.0;
    let mut var_d = 0.0;
    for (s, d) in src.iter().zip(dst.iter()) {
        let sc = *s - mu_s;
        let dc = *d - mu_d;
        h += DMat3::from_cols(dc * sc.x, dc * sc.y, dc * sc.z);
        var_s += sc.length_squared();
        var_d += dc.length_squared();
    }
    h = h * inv_n;
    var_s *= inv_n;
    var_d *= inv_n;

    // centering leaves an absolute error proportional to the centroid magnitude
    let variance_floor = (1e3 * f64::EPSILON * mu_s.length().max(1.0)).powi(2);
    if var_s <= variance_floor {
        return Err(AlignError::NumericalInstability(
            "source points coincide, scale is undefined",
        ));
    }

    // 4. SVD
    let svd = svd3(&h)?;
    let sigma = svd.singular_values;
    log::trace!("umeyama: n={n} singular values={sigma:?} var_s={var_s:e}");

    if sigma.x <= RANK_TOLERANCE * (var_s * var_d).sqrt() {
        return Err(AlignError::NumericalInstability(
            "cross-covariance matrix vanishes",
        ));
    }
    if sigma.y <= RANK_TOLERANCE * sigma.x {
        return Err(AlignError::DegenerateInput("correspondences are collinear"));
    }

    // 5. R = U * S * V^T, flipping the weakest direction if U * V^T is a reflection
    let mut s_diag = DVec3::ONE;
    if (svd.u * svd.v.transpose()).determinant() < 0.0 {
        log::trace!("umeyama: correcting reflection");
        s_diag.z = -1.0;
    }
    let rotation = svd.u * DMat3::from_diagonal(s_diag) * svd.v.transpose();

    // 6. c = trace(Σ S) / var_s
    let scale = if with_scale {
        sigma.dot(s_diag) / var_s
    } else {
        1.0
    };
    if !(scale.is_finite() && scale > 0.0) {
        return Err(AlignError::NumericalInstability(
            "estimated scale is not positive",
        ));
    }

    // 7. t = mu_d - c * R * mu_s
    let translation = mu_d - scale * (rotation * mu_s);

    Ok(SimilarityTransform::from_parts_unchecked(
        scale,
        rotation,
        translation,
    ))
}
