//! Error types shared by the alignment estimators.

use thiserror::Error;

/// Error types for similarity alignment.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AlignError {
    /// Too few correspondences, or a configuration with no well defined rotation.
    #[error("Degenerate input: {0}")]
    DegenerateInput(&'static str),

    /// The closed-form solution is numerically undefined for this input.
    #[error("Numerical instability: {0}")]
    NumericalInstability(&'static str),

    /// The robust estimator was given fewer points than one minimal sample.
    #[error("RANSAC requires at least {required} correspondences, got {actual}")]
    InsufficientCorrespondences {
        /// Minimal sample size of the estimator.
        required: usize,
        /// Number of correspondences provided.
        actual: usize,
    },

    /// The consensus search did not find a model with enough support.
    #[error("Best model has {actual} inliers, at least {required} are required")]
    InsufficientInliers {
        /// Minimum number of inliers required for acceptance.
        required: usize,
        /// Number of inliers of the best model.
        actual: usize,
    },

    /// Source and target lists must have the same length.
    #[error("Mismatched lengths: source points ({source_len}) != target points ({target_len})")]
    MismatchedLengths {
        /// Number of source points.
        source_len: usize,
        /// Number of target points.
        target_len: usize,
    },

    /// A correspondence contains NaN or infinite coordinates.
    #[error("Correspondence {index} has a non-finite coordinate")]
    NonFinitePoint {
        /// Index of the offending correspondence.
        index: usize,
    },

    /// The RANSAC configuration is out of range.
    #[error("Invalid RANSAC parameters: {0}")]
    InvalidParams(String),

    /// The components do not form a valid similarity transform.
    #[error("Invalid similarity transform: {0}")]
    InvalidTransform(&'static str),

    /// The camera pose cannot be converted into a camera center.
    #[error("Invalid camera pose: {0}")]
    InvalidPose(&'static str),
}

impl AlignError {
    /// Whether the error only concerns one particular fit attempt.
    ///
    /// RANSAC skips minimal samples that fail with such an error.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AlignError::DegenerateInput(_) | AlignError::NumericalInstability(_)
        )
    }
}

/// Result type alias for alignment operations.
pub type AlignResult<T> = Result<T, AlignError>;
