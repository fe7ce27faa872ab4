//! Robust relative-pose estimation between two frames.
//!
//! Pixels are mapped to normalized coordinates, an essential matrix is found
//! by the 5-point solver inside RANSAC, and the four decomposition candidates
//! are disambiguated by triangulating inliers and counting positive depths.
//! The recovered translation is a unit direction; monocular geometry leaves
//! its scale unobservable.

use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use mono_vo_core::{
    ransac_fit, CameraIntrinsics, Correspondences, Estimator, Mat3, Pt2, RansacOptions, Vec3,
};

use crate::epipolar::{decompose_essential, essential_5point, essential_linear, EpipolarError};
use crate::triangulation::{camera_matrix, triangulate_point};

/// Minimum correspondences for the minimal solver.
pub const MIN_CORRESPONDENCES: usize = 5;

/// Relative motion between two camera frames: `x_b = R · x_a + t`.
///
/// `translation` is unit-length; only its direction is meaningful.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelativePose {
    pub rotation: Mat3,
    pub translation: Vec3,
}

/// Failures of relative-pose estimation. All of these are per-pair
/// conditions a caller can recover from by skipping the frame pair.
#[derive(Debug, Error)]
pub enum MotionError {
    #[error("need at least {need} correspondences, got {got}")]
    NotEnoughCorrespondences { got: usize, need: usize },
    #[error("no consensus essential matrix found")]
    NoConsensus,
    #[error("cheirality test could not disambiguate the candidate poses")]
    CheiralityAmbiguous,
    #[error("recovered rotation is not orthonormal with determinant +1")]
    InvalidRotation,
    #[error(transparent)]
    Epipolar(#[from] EpipolarError),
}

/// Parameters for [`estimate_relative_pose`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MotionOptions {
    /// RANSAC parameters; `thresh` is the symmetric epipolar distance in
    /// **pixels** and is rescaled internally by the focal length.
    pub ransac: RansacOptions,
    /// Upper bound on the number of inliers triangulated per candidate pose
    /// during the cheirality test.
    pub cheirality_samples: usize,
}

impl Default for MotionOptions {
    fn default() -> Self {
        Self {
            ransac: RansacOptions {
                max_iters: 1000,
                thresh: 1.0,
                min_inliers: 8,
                confidence: 0.999,
                ..Default::default()
            },
            cheirality_samples: 40,
        }
    }
}

#[derive(Clone)]
struct PointPair {
    a: Pt2,
    b: Pt2,
}

/// Symmetric epipolar distance of a normalized-coordinate pair.
fn symmetric_epipolar_distance(e: &Mat3, a: &Pt2, b: &Pt2) -> f64 {
    let x = nalgebra::Vector3::new(a.x, a.y, 1.0);
    let xp = nalgebra::Vector3::new(b.x, b.y, 1.0);

    let ex = e * x;
    let etxp = e.transpose() * xp;
    let denom = (ex.x * ex.x + ex.y * ex.y + etxp.x * etxp.x + etxp.y * etxp.y).max(1e-12);
    let val = (xp.transpose() * e * x)[0];
    ((val * val) / denom).sqrt()
}

struct EssentialEstimator;

impl Estimator for EssentialEstimator {
    type Datum = PointPair;
    type Model = Mat3;

    const MIN_SAMPLES: usize = MIN_CORRESPONDENCES;

    fn fit(data: &[Self::Datum], sample_indices: &[usize]) -> Option<Self::Model> {
        let mut pts_a = Vec::with_capacity(sample_indices.len());
        let mut pts_b = Vec::with_capacity(sample_indices.len());
        for &idx in sample_indices {
            pts_a.push(data[idx].a);
            pts_b.push(data[idx].b);
        }

        let candidates = essential_5point(&pts_a, &pts_b).ok()?;

        // Every algebraic candidate satisfies the five sample constraints
        // exactly, so residuals on the sample cannot tell them apart. Rank
        // by the best cheirality vote among each candidate's four
        // decompositions, then by the epipolar residual over all data.
        candidates
            .into_iter()
            .filter_map(|e| {
                let votes = decompose_essential(&e)
                    .ok()?
                    .iter()
                    .map(|(r, t)| positive_depth_count(r, t, data, sample_indices))
                    .max()
                    .unwrap_or(0);
                let residual: f64 = data
                    .iter()
                    .map(|d| symmetric_epipolar_distance(&e, &d.a, &d.b))
                    .sum();
                Some((e, votes, residual))
            })
            .max_by(|(_, v1, r1), (_, v2, r2)| {
                v1.cmp(v2)
                    .then_with(|| r2.partial_cmp(r1).unwrap_or(std::cmp::Ordering::Equal))
            })
            .map(|(e, _, _)| e)
    }

    fn residual(model: &Self::Model, datum: &Self::Datum) -> f64 {
        symmetric_epipolar_distance(model, &datum.a, &datum.b)
    }

    fn refit(data: &[Self::Datum], inliers: &[usize]) -> Option<Self::Model> {
        if inliers.len() < 8 {
            return None;
        }
        let pts_a: Vec<Pt2> = inliers.iter().map(|&i| data[i].a).collect();
        let pts_b: Vec<Pt2> = inliers.iter().map(|&i| data[i].b).collect();
        essential_linear(&pts_a, &pts_b).ok()
    }
}

/// Estimate the relative pose from pixel correspondences.
///
/// `correspondences` holds matched pixels, earlier frame first. The result
/// satisfies `x_b ≈ R · x_a + t` in normalized coordinates with `‖t‖ = 1`.
///
/// # Errors
///
/// Every error is recoverable at the sequence level: too few matches, no
/// RANSAC consensus (including near-zero parallax where the essential matrix
/// is unconstrained), or an ambiguous cheirality vote.
pub fn estimate_relative_pose(
    correspondences: &Correspondences,
    intrinsics: &CameraIntrinsics,
    opts: &MotionOptions,
) -> Result<RelativePose, MotionError> {
    let n = correspondences.len();
    if n < MIN_CORRESPONDENCES {
        return Err(MotionError::NotEnoughCorrespondences {
            got: n,
            need: MIN_CORRESPONDENCES,
        });
    }

    let data: Vec<PointPair> = correspondences
        .iter()
        .map(|(a, b)| PointPair {
            a: intrinsics.normalize(a),
            b: intrinsics.normalize(b),
        })
        .collect();

    // The pixel threshold moves to the normalized image plane.
    let mut ransac_opts = opts.ransac.clone();
    ransac_opts.thresh /= intrinsics.focal;
    ransac_opts.min_inliers = ransac_opts.min_inliers.max(MIN_CORRESPONDENCES);

    let result = ransac_fit::<EssentialEstimator>(&data, &ransac_opts);
    if !result.success {
        return Err(MotionError::NoConsensus);
    }
    let essential = result.model.ok_or(MotionError::NoConsensus)?;
    debug!(
        "essential consensus: {}/{} inliers in {} iterations, rms {:.3e}",
        result.inliers.len(),
        n,
        result.iters,
        result.inlier_rms
    );

    let candidates = decompose_essential(&essential)?;
    select_pose_by_cheirality(&candidates, &data, &result.inliers, opts.cheirality_samples)
}

/// Triangulated points of `indices` landing in front of both cameras for
/// the pose hypothesis `(r, t)`.
fn positive_depth_count(r: &Mat3, t: &Vec3, data: &[PointPair], indices: &[usize]) -> usize {
    let cam_a = camera_matrix(&Mat3::identity(), &Vec3::zeros());
    let cam_b = camera_matrix(r, t);
    indices
        .iter()
        .filter(|&&i| {
            match triangulate_point(&cam_a, &cam_b, &data[i].a, &data[i].b) {
                Ok(point) => point.z > 0.0 && (r * point.coords + t).z > 0.0,
                Err(_) => false,
            }
        })
        .count()
}

/// Pick the candidate pose that places the most triangulated inliers in
/// front of both cameras. The winner must account for at least half of the
/// tested points and strictly beat the runner-up.
fn select_pose_by_cheirality(
    candidates: &[(Mat3, Vec3)],
    data: &[PointPair],
    inliers: &[usize],
    max_samples: usize,
) -> Result<RelativePose, MotionError> {
    let subset: Vec<usize> = inliers.iter().copied().take(max_samples).collect();
    if subset.is_empty() {
        return Err(MotionError::CheiralityAmbiguous);
    }

    let counts: Vec<usize> = candidates
        .iter()
        .map(|(r, t)| positive_depth_count(r, t, data, &subset))
        .collect();

    let (best_idx, &best_count) = counts
        .iter()
        .enumerate()
        .max_by_key(|&(_, &c)| c)
        .ok_or(MotionError::CheiralityAmbiguous)?;
    let second_count = counts
        .iter()
        .enumerate()
        .filter(|&(i, _)| i != best_idx)
        .map(|(_, &c)| c)
        .max()
        .unwrap_or(0);

    debug!("cheirality votes: {counts:?} over {} points", subset.len());

    if 2 * best_count < subset.len() || best_count <= second_count {
        return Err(MotionError::CheiralityAmbiguous);
    }

    let (rotation, translation) = candidates[best_idx];

    // Guards against numerical degeneracy in the decomposition.
    let ortho = (rotation.transpose() * rotation - Mat3::identity()).norm();
    if ortho > 1e-6 || (rotation.determinant() - 1.0).abs() > 1e-6 {
        return Err(MotionError::InvalidRotation);
    }

    Ok(RelativePose {
        rotation,
        translation: translation.normalize(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mono_vo_core::synthetic::{point_cloud, rotation_about_y, two_view_correspondences};
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn intrinsics() -> CameraIntrinsics {
        CameraIntrinsics::new(476.703, 400.5, 400.5).unwrap()
    }

    fn rotation_angle(a: &Mat3, b: &Mat3) -> f64 {
        let d = a.transpose() * b;
        ((d.trace() - 1.0) * 0.5).clamp(-1.0, 1.0).acos()
    }

    fn minimal_opts() -> MotionOptions {
        MotionOptions {
            ransac: RansacOptions {
                min_inliers: 5,
                thresh: 1.0,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn rejects_insufficient_correspondences() {
        let c = Correspondences::new(
            vec![Pt2::new(0.0, 0.0); 4],
            vec![Pt2::new(1.0, 1.0); 4],
        )
        .unwrap();
        assert!(matches!(
            estimate_relative_pose(&c, &intrinsics(), &MotionOptions::default()),
            Err(MotionError::NotEnoughCorrespondences { got: 4, need: 5 })
        ));
    }

    #[test]
    fn recovers_pose_from_exact_correspondences() {
        let k = intrinsics();
        let r = rotation_about_y(0.03);
        let t = Vec3::new(0.3, 0.0, -1.0);

        let points = point_cloud(40, 11);
        let c = two_view_correspondences(&points, &r, &t, &k);
        assert!(c.len() >= 30);

        let pose = estimate_relative_pose(&c, &k, &MotionOptions::default()).unwrap();

        assert!(rotation_angle(&pose.rotation, &r) < 1e-4);
        let cos_t = pose.translation.dot(&t.normalize());
        assert!(cos_t > 0.9999, "translation direction off: cos {cos_t}");
    }

    #[test]
    fn forward_motion_gives_forward_translation() {
        let k = intrinsics();
        let r = Mat3::identity();
        // Camera advances along +z, so points move by -z in the new frame.
        let t = Vec3::new(0.0, 0.0, -1.0);

        let points = point_cloud(50, 3);
        let c = two_view_correspondences(&points, &r, &t, &k);

        let pose = estimate_relative_pose(&c, &k, &MotionOptions::default()).unwrap();
        assert!(rotation_angle(&pose.rotation, &r) < 1e-4);
        assert!(pose.translation.z < -0.999);
    }

    #[test]
    fn translation_is_always_unit_length() {
        let k = intrinsics();
        let r = rotation_about_y(-0.02);
        let t = Vec3::new(2.5, 0.4, -0.7);

        let points = point_cloud(40, 5);
        let c = two_view_correspondences(&points, &r, &t, &k);
        let pose = estimate_relative_pose(&c, &k, &MotionOptions::default()).unwrap();

        assert!((pose.translation.norm() - 1.0).abs() < 1e-12);
        let cos_t = pose.translation.dot(&t.normalize());
        assert!(cos_t > 0.999);
    }

    #[test]
    fn survives_gross_outliers() {
        let k = intrinsics();
        let r = rotation_about_y(0.02);
        let t = Vec3::new(0.5, 0.1, -1.0);

        let points = point_cloud(60, 9);
        let mut c = two_view_correspondences(&points, &r, &t, &k);
        let clean = c.len();

        // Corrupt a fifth of the matches with large random displacements.
        let mut rng = StdRng::seed_from_u64(17);
        for i in 0..clean / 5 {
            c.points_b[i].x += rng.random_range(60.0..200.0);
            c.points_b[i].y -= rng.random_range(60.0..200.0);
        }

        let pose = estimate_relative_pose(&c, &k, &MotionOptions::default()).unwrap();
        assert!(rotation_angle(&pose.rotation, &r) < 1e-3);
        assert!(pose.translation.dot(&t.normalize()) > 0.999);
    }

    #[test]
    fn minimal_set_of_five_is_enough() {
        let k = intrinsics();
        let r = rotation_about_y(0.04);
        let t = Vec3::new(0.2, -0.1, -0.5);

        let points = point_cloud(5, 21);
        let c = two_view_correspondences(&points, &r, &t, &k);
        assert_eq!(c.len(), 5);

        let pose = estimate_relative_pose(&c, &k, &minimal_opts()).unwrap();
        assert!(rotation_angle(&pose.rotation, &r) < 1e-4);
        assert!(pose.translation.dot(&t.normalize()) > 0.9999);
    }

    #[test]
    fn pure_rotation_does_not_yield_a_bogus_pose() {
        let k = intrinsics();
        let r = rotation_about_y(0.05);
        let t = Vec3::zeros();

        let points = point_cloud(40, 13);
        let c = two_view_correspondences(&points, &r, &t, &k);

        // Zero parallax leaves the translation unobservable. Either the
        // estimator refuses, or it must at least get the rotation right.
        match estimate_relative_pose(&c, &k, &MotionOptions::default()) {
            Err(MotionError::NoConsensus)
            | Err(MotionError::CheiralityAmbiguous)
            | Err(MotionError::Epipolar(_)) => {}
            Ok(pose) => {
                assert!(rotation_angle(&pose.rotation, &r) < 1e-2);
            }
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
}
