//! RANSAC-based robust wrapper for the closed-form alignment solvers.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::correspondence::CorrespondenceSet;
use crate::error::{AlignError, AlignResult};
use crate::similarity::{AlignMethod, MIN_CORRESPONDENCES};
use crate::transform::SimilarityTransform;

/// Number of hypotheses scored per rayon batch, per worker thread.
const PARALLEL_BATCH_PER_THREAD: usize = 16;

/// Parameters for RANSAC over the similarity solver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RansacParams {
    /// Maximum number of RANSAC iterations.
    pub max_iterations: usize,
    /// Euclidean distance, in target units, below which a correspondence is an inlier.
    pub inlier_threshold: f64,
    /// Number of correspondences drawn per hypothesis.
    pub min_sample_size: usize,
    /// Minimum inlier count for acceptance; `None` means `min_sample_size + 1`.
    pub min_inliers_required: Option<usize>,
    /// Desired probability that at least one sample set is outlier-free.
    pub confidence: f64,
    /// Optional fixed seed for reproducible sampling.
    pub random_seed: Option<u64>,
    /// Score hypotheses on the rayon thread pool.
    pub parallel: bool,
}

impl Default for RansacParams {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            inlier_threshold: 1.0,
            min_sample_size: MIN_CORRESPONDENCES,
            min_inliers_required: None,
            confidence: 0.99,
            random_seed: None,
            parallel: false,
        }
    }
}

impl RansacParams {
    /// Minimum inlier count a model needs to be accepted.
    pub fn min_inliers(&self) -> usize {
        self.min_inliers_required.unwrap_or(self.min_sample_size + 1)
    }

    /// Check that every parameter is in range.
    pub fn validate(&self) -> AlignResult<()> {
        if self.max_iterations == 0 {
            return Err(AlignError::InvalidParams(
                "max_iterations must be positive".to_string(),
            ));
        }
        if !(self.inlier_threshold.is_finite() && self.inlier_threshold > 0.0) {
            return Err(AlignError::InvalidParams(format!(
                "inlier_threshold must be positive, got {}",
                self.inlier_threshold
            )));
        }
        if self.min_sample_size < MIN_CORRESPONDENCES {
            return Err(AlignError::InvalidParams(format!(
                "min_sample_size must be at least {MIN_CORRESPONDENCES}, got {}",
                self.min_sample_size
            )));
        }
        if self.min_inliers() < self.min_sample_size {
            return Err(AlignError::InvalidParams(format!(
                "min_inliers_required ({}) must not be smaller than min_sample_size ({})",
                self.min_inliers(),
                self.min_sample_size
            )));
        }
        if !(self.confidence > 0.0 && self.confidence < 1.0) {
            return Err(AlignError::InvalidParams(format!(
                "confidence must lie in (0, 1), got {}",
                self.confidence
            )));
        }
        Ok(())
    }
}

/// RANSAC result for similarity alignment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RansacResult {
    /// Transform refitted on the inliers of the best hypothesis.
    pub transform: SimilarityTransform,
    /// Per-correspondence inlier mask under `transform`.
    pub inliers: Vec<bool>,
    /// Number of `true` entries in `inliers`.
    pub inlier_count: usize,
    /// Root-mean-square residual over the inliers.
    pub residual_rms: f64,
    /// Number of hypotheses drawn.
    pub iterations: usize,
}

/// A scored candidate model.
struct Hypothesis {
    iteration: usize,
    inliers: Vec<bool>,
    count: usize,
    score: f64,
}

impl Hypothesis {
    /// More inliers wins, then the lower sum of squared inlier residuals.
    fn beats(&self, other: &Hypothesis) -> bool {
        self.count > other.count || (self.count == other.count && self.score < other.score)
    }
}

/// Best model so far and the adaptive iteration bound.
struct ConsensusSearch {
    best: Option<Hypothesis>,
    required_iters: usize,
    n: usize,
    sample_size: usize,
    confidence: f64,
    max_iterations: usize,
}

impl ConsensusSearch {
    /// Keep `hypothesis` if it beats the current best and shrink the iteration bound.
    fn consider(&mut self, hypothesis: Hypothesis) {
        let improves = match &self.best {
            Some(best) => hypothesis.beats(best),
            None => true,
        };
        if !improves {
            return;
        }
        log::debug!(
            "ransac: iteration {} improves to {}/{} inliers (score {:.6e})",
            hypothesis.iteration,
            hypothesis.count,
            self.n,
            hypothesis.score
        );
        let ratio = hypothesis.count as f64 / self.n as f64;
        let est = required_iterations(
            ratio,
            self.sample_size,
            self.confidence,
            self.max_iterations,
        );
        self.required_iters = self.required_iters.min(est);
        self.best = Some(hypothesis);
    }
}

/// Robustly estimate a similarity transform with RANSAC.
///
/// - Minimal sample size is `params.min_sample_size` (3 by default).
/// - Scoring uses the Euclidean distance between the transformed source and its target.
/// - Iterations adapt from the current inlier ratio and desired confidence.
/// - The returned transform is refitted on all inliers of the best hypothesis.
///
/// # Errors
///
/// * [`AlignError::InvalidParams`] if `params` is out of range.
/// * [`AlignError::InsufficientCorrespondences`] if the set is smaller than one sample.
/// * [`AlignError::InsufficientInliers`] if no model reaches `params.min_inliers()`.
pub fn estimate_robust(
    set: &CorrespondenceSet,
    params: &RansacParams,
) -> AlignResult<RansacResult> {
    estimate_robust_with(set, AlignMethod::Similarity, params)
}

/// Same as [`estimate_robust`], with an explicit base solver.
pub fn estimate_robust_with(
    set: &CorrespondenceSet,
    method: AlignMethod,
    params: &RansacParams,
) -> AlignResult<RansacResult> {
    params.validate()?;

    let n = set.len();
    let sample_size = params.min_sample_size;
    if n < sample_size {
        return Err(AlignError::InsufficientCorrespondences {
            required: sample_size,
            actual: n,
        });
    }
    let min_inliers = params.min_inliers();

    // every iteration derives its own stream from this seed
    let base_seed = match params.random_seed {
        Some(seed) => seed,
        None => rand::rng().random(),
    };

    let mut search = ConsensusSearch {
        best: None,
        required_iters: params.max_iterations,
        n,
        sample_size,
        confidence: params.confidence,
        max_iterations: params.max_iterations,
    };
    let mut iter = 0usize;

    if params.parallel {
        let batch = rayon::current_num_threads().max(1) * PARALLEL_BATCH_PER_THREAD;
        'search: while iter < search.required_iters {
            let end = (iter + batch).min(search.required_iters);
            let results: Vec<AlignResult<Option<Hypothesis>>> = (iter..end)
                .into_par_iter()
                .map(|k| run_iteration(set, method, params, base_seed, k))
                .collect();
            // fold in iteration order so the outcome matches the sequential loop
            for result in results {
                iter += 1;
                if let Some(hypothesis) = result? {
                    search.consider(hypothesis);
                }
                if iter >= search.required_iters {
                    break 'search;
                }
            }
        }
    } else {
        while iter < search.required_iters {
            let k = iter;
            iter += 1;
            if let Some(hypothesis) = run_iteration(set, method, params, base_seed, k)? {
                search.consider(hypothesis);
            }
        }
    }

    let Some(best) = search.best else {
        log::warn!("ransac: no hypothesis could be fitted in {iter} iterations");
        return Err(AlignError::InsufficientInliers {
            required: min_inliers,
            actual: 0,
        });
    };

    log::debug!(
        "ransac: stopped after {iter} iterations, best model has {}/{n} inliers",
        best.count
    );

    if best.count < min_inliers {
        return Err(AlignError::InsufficientInliers {
            required: min_inliers,
            actual: best.count,
        });
    }

    refine(set, method, params, &best.inliers, iter)
}

/// Refit on the correspondences selected by `mask` and re-classify every pair.
///
/// Errors of the refit are returned as they are; a refined model supported by
/// fewer than `params.min_inliers()` pairs is rejected.
fn refine(
    set: &CorrespondenceSet,
    method: AlignMethod,
    params: &RansacParams,
    mask: &[bool],
    iterations: usize,
) -> AlignResult<RansacResult> {
    let min_inliers = params.min_inliers();
    let transform = method.fit(&set.select_mask(mask))?;

    let (inliers, inlier_count, sum_sq) =
        classify_inliers(set, &transform, params.inlier_threshold);
    if inlier_count < min_inliers {
        log::debug!("ransac: refit keeps only {inlier_count} inliers");
        return Err(AlignError::InsufficientInliers {
            required: min_inliers,
            actual: inlier_count,
        });
    }
    let residual_rms = (sum_sq / inlier_count as f64).sqrt();

    Ok(RansacResult {
        transform,
        inliers,
        inlier_count,
        residual_rms,
        iterations,
    })
}

/// Draw, fit and score the hypothesis of iteration `k`.
///
/// Returns `Ok(None)` when the minimal sample is degenerate.
fn run_iteration(
    set: &CorrespondenceSet,
    method: AlignMethod,
    params: &RansacParams,
    base_seed: u64,
    k: usize,
) -> AlignResult<Option<Hypothesis>> {
    let mut rng = iteration_rng(base_seed, k);
    let sample = rand::seq::index::sample(&mut rng, set.len(), params.min_sample_size).into_vec();

    let transform = match method.fit(&set.select(&sample)) {
        Ok(t) => t,
        Err(e) if e.is_recoverable() => {
            log::trace!("ransac: iteration {k} skipped: {e}");
            return Ok(None);
        }
        Err(e) => return Err(e),
    };

    let (inliers, count, score) = classify_inliers(set, &transform, params.inlier_threshold);
    Ok(Some(Hypothesis {
        iteration: k,
        inliers,
        count,
        score,
    }))
}

/// Random stream of iteration `k`, independent of scheduling.
fn iteration_rng(base_seed: u64, k: usize) -> StdRng {
    StdRng::seed_from_u64(base_seed ^ (k as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15))
}

/// Classify inliers and compute the sum of squared inlier residuals.
fn classify_inliers(
    set: &CorrespondenceSet,
    transform: &SimilarityTransform,
    threshold: f64,
) -> (Vec<bool>, usize, f64) {
    let mut inliers = Vec::with_capacity(set.len());
    let mut count = 0usize;
    let mut sum_sq = 0.0f64;

    for pair in set.iter() {
        let err2 = transform
            .transform_point(pair.source)
            .distance_squared(pair.target);
        let is_inlier = err2.sqrt() <= threshold;
        if is_inlier {
            count += 1;
            sum_sq += err2;
        }
        inliers.push(is_inlier);
    }

    (inliers, count, sum_sq)
}

/// Number of iterations needed to draw one outlier-free sample with `confidence`.
///
/// `log(1 - confidence) / log(1 - ratio^sample_size)`, capped at `max_iterations`.
/// The search stops as soon as the iteration counter reaches this value.
fn required_iterations(
    inlier_ratio: f64,
    sample_size: usize,
    confidence: f64,
    max_iterations: usize,
) -> usize {
    if inlier_ratio >= 1.0 {
        return 0;
    }
    let ws = inlier_ratio.powi(sample_size as i32);
    if ws <= f64::MIN_POSITIVE {
        return max_iterations;
    }
    // log(1 - ws) without cancellation for small ws
    let log_denom = (-ws).ln_1p();
    if !log_denom.is_finite() || log_denom >= 0.0 {
        return max_iterations;
    }
    let est = ((1.0 - confidence).ln() / log_denom).ceil();
    if est.is_finite() && est >= 0.0 {
        (est as usize).min(max_iterations)
    } else {
        max_iterations
    }
}
