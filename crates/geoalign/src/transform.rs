use glam::{DMat3, DMat4, DVec3, DVec4};
use serde::{Deserialize, Serialize};

use crate::correspondence::Point3;
use crate::error::{AlignError, AlignResult};
use crate::linalg::{is_proper_rotation, ROTATION_TOLERANCE};

/// Similarity transformation in 3D: uniform scale, rotation and translation.
///
/// Maps a point `p` to `scale * rotation * p + translation`.
///
/// The rotation is always a proper rotation (orthonormal, determinant +1) and
/// the scale is always strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSimilarity", into = "RawSimilarity")]
pub struct SimilarityTransform {
    scale: f64,
    rotation: DMat3,
    translation: DVec3,
}

impl SimilarityTransform {
    /// Identity transformation
    pub const IDENTITY: Self = Self {
        scale: 1.0,
        rotation: DMat3::IDENTITY,
        translation: DVec3::ZERO,
    };

    /// Create a similarity transform from its components.
    ///
    /// # Errors
    ///
    /// Fails if the scale is not a positive finite number or the rotation is not proper.
    pub fn new(scale: f64, rotation: DMat3, translation: DVec3) -> AlignResult<Self> {
        if !(scale.is_finite() && scale > 0.0) {
            return Err(AlignError::InvalidTransform(
                "scale must be positive and finite",
            ));
        }
        if !is_proper_rotation(&rotation, ROTATION_TOLERANCE) {
            return Err(AlignError::InvalidTransform(
                "rotation must be orthonormal with determinant +1",
            ));
        }
        if !translation.is_finite() {
            return Err(AlignError::InvalidTransform("translation must be finite"));
        }
        Ok(Self {
            scale,
            rotation,
            translation,
        })
    }

    /// Build from parts already known to satisfy the invariants.
    pub(crate) fn from_parts_unchecked(scale: f64, rotation: DMat3, translation: DVec3) -> Self {
        debug_assert!(scale > 0.0);
        debug_assert!(is_proper_rotation(&rotation, 1e-3));
        Self {
            scale,
            rotation,
            translation,
        }
    }

    /// Get the scale factor
    #[inline]
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Get the rotation matrix
    #[inline]
    pub fn rotation(&self) -> DMat3 {
        self.rotation
    }

    /// Get the translation vector
    #[inline]
    pub fn translation(&self) -> DVec3 {
        self.translation
    }

    /// Apply the transformation to a point.
    #[inline]
    pub fn transform_point(&self, point: Point3) -> Point3 {
        self.scale * (self.rotation * point) + self.translation
    }

    /// Inverse transformation
    ///
    /// `p = (1/s) * R^T * (q - t)`
    pub fn inverse(&self) -> Self {
        let scale = self.scale.recip();
        let rotation = self.rotation.transpose();
        Self {
            scale,
            rotation,
            translation: -scale * (rotation * self.translation),
        }
    }

    /// Composition `self ∘ other`: applies `other` first, then `self`.
    pub fn compose(&self, other: &Self) -> Self {
        Self {
            scale: self.scale * other.scale,
            rotation: self.rotation * other.rotation,
            translation: self.transform_point(other.translation),
        }
    }

    /// Convert to 4x4 homogeneous transformation matrix
    ///
    /// ```text
    /// | s*R t |
    /// |  0  1 |
    /// ```
    pub fn matrix(&self) -> DMat4 {
        let sr = self.rotation * self.scale;
        DMat4::from_cols(
            sr.x_axis.extend(0.0),
            sr.y_axis.extend(0.0),
            sr.z_axis.extend(0.0),
            DVec4::from((self.translation, 1.0)),
        )
    }

    /// Check whether two transforms agree within `epsilon` on every component.
    pub fn abs_diff_eq(&self, other: &Self, epsilon: f64) -> bool {
        (self.scale - other.scale).abs() <= epsilon
            && self.rotation.abs_diff_eq(other.rotation, epsilon)
            && self.translation.abs_diff_eq(other.translation, epsilon)
    }
}

impl Default for SimilarityTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Serialized form: rotation is written row by row.
#[derive(Serialize, Deserialize)]
struct RawSimilarity {
    scale: f64,
    rotation: [[f64; 3]; 3],
    translation: [f64; 3],
}

impl From<SimilarityTransform> for RawSimilarity {
    fn from(t: SimilarityTransform) -> Self {
        let r = t.rotation.transpose();
        Self {
            scale: t.scale,
            rotation: [
                r.x_axis.to_array(),
                r.y_axis.to_array(),
                r.z_axis.to_array(),
            ],
            translation: t.translation.to_array(),
        }
    }
}

impl TryFrom<RawSimilarity> for SimilarityTransform {
    type Error = AlignError;

    fn try_from(raw: RawSimilarity) -> Result<Self, Self::Error> {
        let rows = DMat3::from_cols_array_2d(&raw.rotation);
        SimilarityTransform::new(
            raw.scale,
            rows.transpose(),
            DVec3::from_array(raw.translation),
        )
    }
}

/// Apply a similarity transform to a single point: `c * R * p + t`.
#[inline]
pub fn apply(transform: &SimilarityTransform, point: Point3) -> Point3 {
    transform.transform_point(point)
}

/// Apply a similarity transform to a sequence of points.
///
/// The output preserves the order and length of the input.
///
/// Example:
///
/// ```
/// use geoalign::{apply_batch, SimilarityTransform};
/// use glam::{DMat3, DVec3};
///
/// let transform = SimilarityTransform::new(2.0, DMat3::IDENTITY, DVec3::new(1.0, 0.0, 0.0))?;
/// let points = vec![DVec3::ZERO, DVec3::ONE];
/// let moved = apply_batch(&transform, &points);
/// assert_eq!(moved, vec![DVec3::new(1.0, 0.0, 0.0), DVec3::new(3.0, 2.0, 2.0)]);
/// # Ok::<(), geoalign::AlignError>(())
/// ```
pub fn apply_batch(transform: &SimilarityTransform, points: &[Point3]) -> Vec<Point3> {
    points.iter().map(|&p| transform.transform_point(p)).collect()
}

/// Apply a similarity transform to a sequence of points, overwriting them.
pub fn apply_in_place(transform: &SimilarityTransform, points: &mut [Point3]) {
    for p in points.iter_mut() {
        *p = transform.transform_point(*p);
    }
}
