use argh::FromArgs;
use std::path::PathBuf;

use geoalign::{
    estimate, estimate_robust, AlignmentReport, AreaOfInterest, CorrespondenceSet, LocalFrame,
    RansacParams, SimilarityTransform,
};
use serde::Serialize;

mod points;

#[derive(FromArgs)]
/// Estimate the similarity transform that maps source points onto target points
struct Args {
    /// path to the source points, one `x y z` row per point
    #[argh(option)]
    source: PathBuf,

    /// path to the target points, row-aligned with the source
    #[argh(option)]
    target: PathBuf,

    /// optional area of interest json; targets are moved into its local frame
    #[argh(option)]
    aoi: Option<PathBuf>,

    /// inlier distance threshold in target units
    #[argh(option, default = "1.0")]
    threshold: f64,

    /// maximum number of RANSAC iterations
    #[argh(option, default = "1000")]
    max_iterations: usize,

    /// random seed for reproducible runs
    #[argh(option)]
    seed: Option<u64>,

    /// fit all correspondences without RANSAC
    #[argh(switch)]
    plain: bool,
}

#[derive(Serialize)]
struct Output {
    transform: SimilarityTransform,
    report: AlignmentReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    inlier_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    iterations: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inliers: Option<Vec<bool>>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    let source = points::read_points(&args.source)?;
    let mut target = points::read_points(&args.target)?;
    log::info!(
        "loaded {} source and {} target points",
        source.len(),
        target.len()
    );

    if let Some(path) = &args.aoi {
        let aoi: AreaOfInterest = serde_json::from_reader(std::fs::File::open(path)?)?;
        let frame = LocalFrame::from_aoi(&aoi);
        log::info!("moving targets into local frame at {:?}", frame.origin());
        target = frame.to_local_batch(&target);
    }

    let set = CorrespondenceSet::new(source, target)?;

    let output = if args.plain {
        let transform = estimate(&set)?;
        Output {
            transform,
            report: AlignmentReport::compute(&transform, &set)?,
            inlier_count: None,
            iterations: None,
            inliers: None,
        }
    } else {
        let params = RansacParams {
            max_iterations: args.max_iterations,
            inlier_threshold: args.threshold,
            random_seed: args.seed,
            ..Default::default()
        };
        let result = estimate_robust(&set, &params)?;
        log::info!(
            "{} / {} inliers after {} iterations",
            result.inlier_count,
            set.len(),
            result.iterations
        );
        Output {
            transform: result.transform,
            report: AlignmentReport::compute_masked(&result.transform, &set, &result.inliers)?,
            inlier_count: Some(result.inlier_count),
            iterations: Some(result.iterations),
            inliers: Some(result.inliers),
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
