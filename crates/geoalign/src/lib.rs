#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]
//!
//! # geoalign
//!
//! Estimation of the 3D similarity transform (uniform scale, rotation and
//! translation) between two corresponding point sets, as used to express a
//! structure-from-motion reconstruction in a georeferenced frame.
//!
//! ## Key Features
//!
//! - **Closed-form solver**: least-squares optimal similarity (Umeyama), always a proper rotation
//! - **RANSAC Support**: robust estimation with outlier rejection and inlier refit
//! - **Reproducible**: every random draw derives from an explicit seed, also in parallel mode
//! - **Pipeline helpers**: camera centers from poses, keyed pairing, local frames, residual reports
//!
//! ## Example: Robust alignment
//!
//! ```rust
//! use geoalign::{apply_batch, estimate_robust, CorrespondenceSet, RansacParams};
//! use glam::DVec3;
//!
//! let source = vec![
//!     DVec3::new(0.0, 0.0, 0.0),
//!     DVec3::new(1.0, 0.0, 0.0),
//!     DVec3::new(0.0, 1.0, 0.0),
//!     DVec3::new(0.0, 0.0, 1.0),
//!     DVec3::new(1.0, 1.0, 1.0),
//!     DVec3::new(2.0, 1.0, 0.0),
//! ];
//! let mut target: Vec<DVec3> = source.iter().map(|p| 2.0 * *p + DVec3::X).collect();
//! target[5] = DVec3::new(100.0, 100.0, 100.0); // a wrong correspondence
//!
//! let set = CorrespondenceSet::new(source, target)?;
//! let params = RansacParams {
//!     inlier_threshold: 0.01,
//!     random_seed: Some(42),
//!     ..Default::default()
//! };
//! let result = estimate_robust(&set, &params)?;
//!
//! assert_eq!(result.inlier_count, 5);
//! assert!(!result.inliers[5]);
//! assert!((result.transform.scale() - 2.0).abs() < 1e-9);
//!
//! let moved = apply_batch(&result.transform, &[DVec3::ONE]);
//! assert!(moved[0].abs_diff_eq(DVec3::new(3.0, 2.0, 2.0), 1e-9));
//! # Ok::<(), geoalign::AlignError>(())
//! ```

/// Camera centers from world-to-camera poses.
pub mod camera;

/// Point correspondences between two coordinate frames.
pub mod correspondence;

/// Error types.
pub mod error;

/// Local frames anchored at an area of interest.
pub mod frame;

/// glam / nalgebra interop and small linear algebra helpers.
pub mod linalg;

/// RANSAC-based robust similarity estimation.
pub mod ransac;

/// Residual statistics of an alignment.
pub mod report;

/// Closed-form similarity estimation.
pub mod similarity;

/// Similarity transforms and their application to points.
pub mod transform;

pub use camera::{camera_center, camera_centers, CameraPose};
pub use correspondence::{
    pair_by_key, CorrespondencePair, CorrespondenceSet, KeyedCorrespondences, Point3,
};
pub use error::{AlignError, AlignResult};
pub use frame::{AreaOfInterest, LocalFrame};
pub use ransac::{estimate_robust, estimate_robust_with, RansacParams, RansacResult};
pub use report::{residuals, AlignmentReport};
pub use similarity::{estimate, estimate_rigid, AlignMethod};
pub use transform::{apply, apply_batch, apply_in_place, SimilarityTransform};
