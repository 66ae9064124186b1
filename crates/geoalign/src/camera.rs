use std::collections::BTreeMap;

use glam::{DMat3, DQuat, DVec3};
use serde::{Deserialize, Serialize};

use crate::correspondence::Point3;
use crate::error::{AlignError, AlignResult};

/// World-to-camera pose in the COLMAP convention.
///
/// A world point `X` maps to camera coordinates `R * X + t`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraPose {
    /// Rotation quaternion
    pub qvec: [f64; 4], // qw, qx, qy, qz
    /// Translation
    pub tvec: [f64; 3], // x, y, z
}

impl CameraPose {
    /// Rotation matrix of the normalized quaternion.
    pub fn rotation(&self) -> AlignResult<DMat3> {
        let [w, x, y, z] = self.qvec;
        let q = DQuat::from_xyzw(x, y, z, w);
        let norm = q.length();
        if !norm.is_finite() || norm < f64::EPSILON {
            return Err(AlignError::InvalidPose("quaternion has zero length"));
        }
        Ok(DMat3::from_quat(q / norm))
    }

    /// Camera center in world coordinates, `C = -R^T * t`.
    pub fn center(&self) -> AlignResult<Point3> {
        let r = self.rotation()?;
        Ok(-(r.transpose() * DVec3::from_array(self.tvec)))
    }
}

/// Camera center of a world-to-camera pose.
pub fn camera_center(pose: &CameraPose) -> AlignResult<Point3> {
    pose.center()
}

/// Camera centers of a table of poses, keyed like the input.
pub fn camera_centers<K: Ord + Clone>(
    poses: &BTreeMap<K, CameraPose>,
) -> AlignResult<BTreeMap<K, Point3>> {
    poses
        .iter()
        .map(|(k, pose)| Ok((k.clone(), pose.center()?)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_identity_rotation_center() -> AlignResult<()> {
        let pose = CameraPose {
            qvec: [1.0, 0.0, 0.0, 0.0],
            tvec: [1.0, -2.0, 3.0],
        };
        assert!(camera_center(&pose)?.abs_diff_eq(DVec3::new(-1.0, 2.0, -3.0), 1e-12));
        Ok(())
    }

    #[test]
    fn test_center_maps_to_camera_origin() -> AlignResult<()> {
        // unnormalized quaternion for 90 degrees about z
        let half = FRAC_PI_2 / 2.0;
        let pose = CameraPose {
            qvec: [2.0 * half.cos(), 0.0, 0.0, 2.0 * half.sin()],
            tvec: [0.5, 4.0, -1.0],
        };
        let r = pose.rotation()?;
        assert!(r.abs_diff_eq(DMat3::from_rotation_z(FRAC_PI_2), 1e-12));

        let c = pose.center()?;
        let in_camera = r * c + DVec3::from_array(pose.tvec);
        assert!(in_camera.abs_diff_eq(DVec3::ZERO, 1e-12));
        Ok(())
    }

    #[test]
    fn test_zero_quaternion() {
        let pose = CameraPose {
            qvec: [0.0; 4],
            tvec: [0.0; 3],
        };
        assert!(matches!(pose.center(), Err(AlignError::InvalidPose(_))));
    }

    #[test]
    fn test_camera_centers_keyed() -> AlignResult<()> {
        let poses = BTreeMap::from([
            (
                2u32,
                CameraPose {
                    qvec: [1.0, 0.0, 0.0, 0.0],
                    tvec: [0.0, 0.0, 5.0],
                },
            ),
            (
                1u32,
                CameraPose {
                    qvec: [1.0, 0.0, 0.0, 0.0],
                    tvec: [1.0, 0.0, 0.0],
                },
            ),
        ]);
        let centers = camera_centers(&poses)?;
        assert_eq!(centers.keys().copied().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(centers[&2], DVec3::new(0.0, 0.0, -5.0));
        Ok(())
    }
}
