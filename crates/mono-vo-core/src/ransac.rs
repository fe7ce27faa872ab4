//! Model-agnostic RANSAC engine.
//!
//! Implement [`Estimator`] for a geometric model and call [`ransac_fit`] with
//! the input data and some [`RansacOptions`]. The engine is deterministic for
//! a fixed seed and never panics: when no consensus is found it returns a
//! [`RansacResult`] with `success == false` and `model == None`.

use rand::prelude::IndexedRandom;
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Configuration parameters for the RANSAC engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RansacOptions {
    /// Maximum number of iterations.
    pub max_iters: usize,
    /// Inlier residual threshold, in the units of [`Estimator::residual`].
    pub thresh: f64,
    /// Minimum number of inliers required to accept a model.
    pub min_inliers: usize,
    /// Desired confidence in `[0, 1]` for the adaptive iteration bound.
    pub confidence: f64,
    /// Seed for the sampling RNG.
    pub seed: u64,
    /// If `true`, refit the model on the full inlier set before scoring.
    pub refit_on_inliers: bool,
}

impl Default for RansacOptions {
    fn default() -> Self {
        Self {
            max_iters: 1000,
            thresh: 1.0,
            min_inliers: 8,
            confidence: 0.999,
            seed: 1_234_567,
            refit_on_inliers: true,
        }
    }
}

/// Output of a RANSAC run.
///
/// Check `success` before using the model; when it is `false`, `model` is
/// `None` and the remaining fields are unspecified.
#[derive(Debug, Clone)]
pub struct RansacResult<M> {
    /// Whether a consensus set satisfying the options was found.
    pub success: bool,
    /// Best model found, if any.
    pub model: Option<M>,
    /// Indices of inlier data points.
    pub inliers: Vec<usize>,
    /// Root-mean-square residual over the inliers.
    pub inlier_rms: f64,
    /// Number of iterations actually performed.
    pub iters: usize,
}

impl<M> Default for RansacResult<M> {
    fn default() -> Self {
        Self {
            success: false,
            model: None,
            inliers: Vec::new(),
            inlier_rms: f64::INFINITY,
            iters: 0,
        }
    }
}

/// A minimal-sample model estimator usable inside the RANSAC loop.
pub trait Estimator {
    type Datum;
    type Model;

    /// Minimal number of samples needed to fit a model.
    const MIN_SAMPLES: usize;

    /// Fit a model from a subset of data indices.
    ///
    /// Return `None` when the subset is degenerate or fitting fails.
    fn fit(data: &[Self::Datum], sample_indices: &[usize]) -> Option<Self::Model>;

    /// Non-negative residual for one datum, in the same units as
    /// [`RansacOptions::thresh`].
    fn residual(model: &Self::Model, datum: &Self::Datum) -> f64;

    /// Optional degeneracy check on the sample subset.
    fn is_degenerate(_data: &[Self::Datum], _sample_indices: &[usize]) -> bool {
        false
    }

    /// Optional refit on the full inlier set.
    ///
    /// The default performs no refit and keeps the minimal-sample model.
    fn refit(_data: &[Self::Datum], _inliers: &[usize]) -> Option<Self::Model> {
        None
    }
}

fn rms(vals: &[f64]) -> f64 {
    if vals.is_empty() {
        return f64::INFINITY;
    }
    let ss: f64 = vals.iter().map(|&v| v * v).sum();
    (ss / (vals.len() as f64)).sqrt()
}

/// Standard adaptive iteration bound from the current inlier ratio.
fn required_iterations(
    confidence: f64,
    inlier_ratio: f64,
    min_samples: usize,
    iters_so_far: usize,
    max_iters: usize,
) -> usize {
    if confidence <= 0.0 || inlier_ratio <= 0.0 {
        return max_iters;
    }

    let w = inlier_ratio;
    let m = min_samples as f64;

    let denom = (1.0 - w.powf(m)).max(1e-12).ln();
    if denom >= 0.0 {
        return max_iters;
    }

    let n_iter = ((1.0 - confidence).ln() / denom).ceil() as usize;
    n_iter.clamp(iters_so_far, max_iters)
}

fn is_better_model(
    has_current_best: bool,
    new_inlier_count: usize,
    new_inlier_rms: f64,
    best_inlier_count: usize,
    best_inlier_rms: f64,
) -> bool {
    !has_current_best
        || (new_inlier_count > best_inlier_count)
        || (new_inlier_count == best_inlier_count && new_inlier_rms < best_inlier_rms)
}

/// Run the RANSAC loop for a given [`Estimator`] implementation.
pub fn ransac_fit<E: Estimator>(data: &[E::Datum], opts: &RansacOptions) -> RansacResult<E::Model> {
    let mut best: RansacResult<E::Model> = RansacResult::default();

    if data.len() < E::MIN_SAMPLES {
        return best;
    }

    let all_indices: Vec<usize> = (0..data.len()).collect();
    let mut sample_idxs = vec![0usize; E::MIN_SAMPLES];

    let mut rng = StdRng::seed_from_u64(opts.seed);

    let mut dynamic_max_iters = opts.max_iters;

    let mut inliers = Vec::<usize>::new();
    let mut inlier_residuals = Vec::<f64>::new();

    let mut refined_inliers = Vec::<usize>::new();
    let mut refined_residuals = Vec::<f64>::new();

    let mut num_iters = 0;
    while num_iters < dynamic_max_iters {
        num_iters += 1;

        all_indices
            .as_slice()
            .choose_multiple(&mut rng, E::MIN_SAMPLES)
            .enumerate()
            .for_each(|(k, &idx)| sample_idxs[k] = idx);

        if E::is_degenerate(data, &sample_idxs) {
            continue;
        }

        let Some(model) = E::fit(data, &sample_idxs) else {
            continue;
        };

        inliers.clear();
        inlier_residuals.clear();
        for (i, datum) in data.iter().enumerate() {
            let r = E::residual(&model, datum);
            if r <= opts.thresh {
                inliers.push(i);
                inlier_residuals.push(r);
            }
        }

        if inliers.len() < opts.min_inliers {
            continue;
        }

        let mut model_refit = model;
        let (final_inliers, final_residuals) = if opts.refit_on_inliers {
            refined_inliers.clear();
            refined_inliers.extend_from_slice(&inliers);
            refined_residuals.clear();
            refined_residuals.extend_from_slice(&inlier_residuals);

            if let Some(m2) = E::refit(data, &refined_inliers) {
                model_refit = m2;

                // Re-score inliers against the refined model.
                refined_inliers.clear();
                refined_residuals.clear();
                for (i, datum) in data.iter().enumerate() {
                    let r = E::residual(&model_refit, datum);
                    if r <= opts.thresh {
                        refined_inliers.push(i);
                        refined_residuals.push(r);
                    }
                }
            }

            (&refined_inliers, &refined_residuals)
        } else {
            (&inliers, &inlier_residuals)
        };

        let final_rms = rms(final_residuals);

        if is_better_model(
            best.success,
            final_inliers.len(),
            final_rms,
            best.inliers.len(),
            best.inlier_rms,
        ) {
            best.success = true;
            best.model = Some(model_refit);
            best.inliers = final_inliers.clone();
            best.inlier_rms = final_rms;
            best.iters = num_iters;
        }

        let inlier_ratio = final_inliers.len() as f64 / data.len() as f64;
        dynamic_max_iters = required_iterations(
            opts.confidence,
            inlier_ratio,
            E::MIN_SAMPLES,
            num_iters,
            opts.max_iters,
        );
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Rigid 2D translation between matched points. Small on purpose: it
    /// exercises the engine without dragging in epipolar machinery.
    #[derive(Debug, Clone)]
    struct Shift {
        dx: f64,
        dy: f64,
    }

    struct ShiftEstimator;

    impl Estimator for ShiftEstimator {
        // ((x_a, y_a), (x_b, y_b))
        type Datum = ((f64, f64), (f64, f64));
        type Model = Shift;

        const MIN_SAMPLES: usize = 1;

        fn fit(data: &[Self::Datum], sample_indices: &[usize]) -> Option<Self::Model> {
            let (a, b) = data[sample_indices[0]];
            Some(Shift {
                dx: b.0 - a.0,
                dy: b.1 - a.1,
            })
        }

        fn residual(model: &Self::Model, datum: &Self::Datum) -> f64 {
            let (a, b) = *datum;
            let ex = b.0 - a.0 - model.dx;
            let ey = b.1 - a.1 - model.dy;
            (ex * ex + ey * ey).sqrt()
        }

        fn refit(data: &[Self::Datum], inliers: &[usize]) -> Option<Self::Model> {
            if inliers.is_empty() {
                return None;
            }
            let n = inliers.len() as f64;
            let (sx, sy) = inliers.iter().fold((0.0, 0.0), |(sx, sy), &i| {
                let (a, b) = data[i];
                (sx + b.0 - a.0, sy + b.1 - a.1)
            });
            Some(Shift {
                dx: sx / n,
                dy: sy / n,
            })
        }
    }

    fn default_opts() -> RansacOptions {
        RansacOptions {
            max_iters: 200,
            thresh: 0.1,
            min_inliers: 5,
            confidence: 0.999,
            seed: 42,
            refit_on_inliers: true,
        }
    }

    #[test]
    fn handles_insufficient_data() {
        let data: Vec<((f64, f64), (f64, f64))> = Vec::new();
        let res = ransac_fit::<ShiftEstimator>(&data, &default_opts());
        assert!(!res.success);
        assert!(res.model.is_none());
        assert!(res.inliers.is_empty());
    }

    #[test]
    fn recovers_shift_with_outliers() {
        let mut data = Vec::new();
        for i in 0..12 {
            let x = i as f64;
            let jitter = if i % 2 == 0 { 0.01 } else { -0.01 };
            data.push(((x, 2.0 * x), (x + 3.0 + jitter, 2.0 * x - 1.5)));
        }
        // Gross mismatches
        data.push(((0.0, 0.0), (50.0, 50.0)));
        data.push(((1.0, 1.0), (-20.0, 7.0)));

        let res = ransac_fit::<ShiftEstimator>(&data, &default_opts());
        assert!(res.success);
        let model = res.model.expect("model should be present");
        assert!((model.dx - 3.0).abs() < 0.05);
        assert!((model.dy + 1.5).abs() < 0.05);
        assert_eq!(res.inliers.len(), 12);
    }

    #[test]
    fn same_seed_gives_same_result() {
        let data: Vec<((f64, f64), (f64, f64))> = (0..20)
            .map(|i| {
                let x = i as f64 * 0.7;
                ((x, x * x * 0.01), (x + 1.0, x * x * 0.01 + 2.0))
            })
            .collect();
        let opts = default_opts();
        let r1 = ransac_fit::<ShiftEstimator>(&data, &opts);
        let r2 = ransac_fit::<ShiftEstimator>(&data, &opts);
        assert_eq!(r1.inliers, r2.inliers);
        assert_eq!(r1.iters, r2.iters);
    }
}
