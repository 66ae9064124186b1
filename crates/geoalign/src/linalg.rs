use glam::{DMat3, DVec3};
use nalgebra::{Matrix3, SVD};

use crate::error::{AlignError, AlignResult};

/// Maximum number of QR sweeps allowed in the 3x3 SVD.
const SVD_MAX_ITERATIONS: usize = 200;

/// Tolerance used when checking orthonormality of a rotation matrix.
pub const ROTATION_TOLERANCE: f64 = 1e-6;

/// Singular value decomposition `A = U * diag(s) * V^T` of a 3x3 matrix.
///
/// Singular values are sorted in descending order and the columns of `u` and
/// `v` are permuted accordingly.
#[derive(Debug, Clone, Copy)]
pub struct Svd3 {
    /// Left singular vectors (columns).
    pub u: DMat3,
    /// Singular values, `x >= y >= z >= 0`.
    pub singular_values: DVec3,
    /// Right singular vectors (columns).
    pub v: DMat3,
}

/// Convert a glam matrix into a nalgebra matrix.
///
/// Both libraries store matrices in column-major order.
pub fn dmat3_to_na(m: &DMat3) -> Matrix3<f64> {
    Matrix3::from_column_slice(&m.to_cols_array())
}

/// Convert a nalgebra matrix into a glam matrix.
pub fn na_to_dmat3(m: &Matrix3<f64>) -> DMat3 {
    DMat3::from_cols_slice(m.as_slice())
}

/// Compute the SVD of a 3x3 matrix.
///
/// # Errors
///
/// Returns [`AlignError::NumericalInstability`] if the decomposition does not converge.
pub fn svd3(m: &DMat3) -> AlignResult<Svd3> {
    let svd = SVD::try_new(dmat3_to_na(m), true, true, f64::EPSILON, SVD_MAX_ITERATIONS)
        .ok_or(AlignError::NumericalInstability("SVD did not converge"))?;
    let (Some(u), Some(v_t)) = (svd.u, svd.v_t) else {
        return Err(AlignError::NumericalInstability(
            "SVD did not return singular vectors",
        ));
    };

    let u = na_to_dmat3(&u);
    let v = na_to_dmat3(&v_t).transpose();
    let s = [
        svd.singular_values[0],
        svd.singular_values[1],
        svd.singular_values[2],
    ];

    let mut order = [0usize, 1, 2];
    order.sort_by(|&a, &b| s[b].total_cmp(&s[a]));

    Ok(Svd3 {
        u: DMat3::from_cols(u.col(order[0]), u.col(order[1]), u.col(order[2])),
        singular_values: DVec3::new(s[order[0]], s[order[1]], s[order[2]]),
        v: DMat3::from_cols(v.col(order[0]), v.col(order[1]), v.col(order[2])),
    })
}

/// Check that `r` is orthonormal with determinant +1.
pub fn is_proper_rotation(r: &DMat3, tolerance: f64) -> bool {
    let rtr = r.transpose() * *r;
    r.is_finite()
        && rtr.abs_diff_eq(DMat3::IDENTITY, tolerance)
        && (r.determinant() - 1.0).abs() <= tolerance
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn verify_svd(a: &DMat3, svd: &Svd3) {
        let reconstruction = svd.u * DMat3::from_diagonal(svd.singular_values) * svd.v.transpose();
        assert!(
            a.abs_diff_eq(reconstruction, 1e-9),
            "A != U*S*V^T\nA:\n{a}\nReconstruction:\n{reconstruction}"
        );
        assert!((svd.u.transpose() * svd.u).abs_diff_eq(DMat3::IDENTITY, 1e-9));
        assert!((svd.v.transpose() * svd.v).abs_diff_eq(DMat3::IDENTITY, 1e-9));
        let s = svd.singular_values;
        assert!(s.x >= s.y && s.y >= s.z && s.z >= 0.0, "unsorted: {s:?}");
    }

    #[test]
    fn test_conversion_is_column_major() {
        let m = DMat3::from_cols(
            DVec3::new(1.0, 2.0, 3.0),
            DVec3::new(4.0, 5.0, 6.0),
            DVec3::new(7.0, 8.0, 9.0),
        );
        let na = dmat3_to_na(&m);
        assert_eq!(na[(0, 1)], 4.0);
        assert_eq!(na[(2, 0)], 3.0);
        assert_eq!(na_to_dmat3(&na), m);
    }

    #[test]
    fn test_svd3_diagonal_unsorted() -> AlignResult<()> {
        let a = DMat3::from_diagonal(DVec3::new(2.0, 3.0, 1.0));
        let svd = svd3(&a)?;
        verify_svd(&a, &svd);
        assert_relative_eq!(svd.singular_values.x, 3.0, epsilon = 1e-12);
        assert_relative_eq!(svd.singular_values.y, 2.0, epsilon = 1e-12);
        assert_relative_eq!(svd.singular_values.z, 1.0, epsilon = 1e-12);
        Ok(())
    }

    #[test]
    fn test_svd3_rank2() -> AlignResult<()> {
        let a = DMat3::from_cols(
            DVec3::new(1.0, 2.0, 3.0),
            DVec3::new(4.0, 5.0, 6.0),
            DVec3::new(5.0, 7.0, 9.0),
        );
        let svd = svd3(&a)?;
        verify_svd(&a, &svd);
        assert!(svd.singular_values.z.abs() < 1e-9);
        Ok(())
    }

    #[test]
    fn test_proper_rotation() {
        assert!(is_proper_rotation(
            &DMat3::from_rotation_y(0.3),
            ROTATION_TOLERANCE
        ));
        let reflection = DMat3::from_diagonal(DVec3::new(1.0, 1.0, -1.0));
        assert!(!is_proper_rotation(&reflection, ROTATION_TOLERANCE));
        let scaled = DMat3::from_diagonal(DVec3::splat(2.0));
        assert!(!is_proper_rotation(&scaled, ROTATION_TOLERANCE));
    }
}
