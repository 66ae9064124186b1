use serde::{Deserialize, Serialize};

use crate::correspondence::CorrespondenceSet;
use crate::error::{AlignError, AlignResult};
use crate::transform::SimilarityTransform;

/// Residual statistics of an alignment.
///
/// A residual is the distance between a transformed source point and its target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlignmentReport {
    /// Number of residuals.
    pub count: usize,
    /// Root-mean-square residual.
    pub rms: f64,
    /// Mean residual.
    pub mean: f64,
    /// Median residual.
    pub median: f64,
    /// Largest residual.
    pub max: f64,
}

impl AlignmentReport {
    /// Statistics over every correspondence of `set`.
    pub fn compute(transform: &SimilarityTransform, set: &CorrespondenceSet) -> AlignResult<Self> {
        Self::from_residuals(residuals(transform, set))
    }

    /// Statistics over the correspondences selected by `mask`.
    pub fn compute_masked(
        transform: &SimilarityTransform,
        set: &CorrespondenceSet,
        mask: &[bool],
    ) -> AlignResult<Self> {
        Self::from_residuals(
            residuals(transform, set)
                .into_iter()
                .zip(mask.iter())
                .filter_map(|(r, &keep)| keep.then_some(r))
                .collect(),
        )
    }

    /// Statistics of a list of residual distances.
    pub fn from_residuals(mut residuals: Vec<f64>) -> AlignResult<Self> {
        if residuals.is_empty() {
            return Err(AlignError::DegenerateInput("no residuals to summarize"));
        }
        residuals.sort_by(f64::total_cmp);

        let count = residuals.len();
        let n = count as f64;
        let mean = residuals.iter().sum::<f64>() / n;
        let rms = (residuals.iter().map(|r| r * r).sum::<f64>() / n).sqrt();
        let median = if count % 2 == 1 {
            residuals[count / 2]
        } else {
            0.5 * (residuals[count / 2 - 1] + residuals[count / 2])
        };
        let max = residuals[count - 1];

        Ok(Self {
            count,
            rms,
            mean,
            median,
            max,
        })
    }
}

/// Distance between each transformed source point and its target, in order.
pub fn residuals(transform: &SimilarityTransform, set: &CorrespondenceSet) -> Vec<f64> {
    set.iter()
        .map(|p| transform.transform_point(p.source).distance(p.target))
        .collect()
}
