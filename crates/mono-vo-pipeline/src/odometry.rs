//! The frame-sequence odometry driver.
//!
//! For every consecutive frame pair: detect corners in the earlier frame,
//! track them into the later one, estimate the relative pose robustly, and
//! fold it into the trajectory. Any per-pair failure is reported to the sink
//! and the loop moves on; a pair that cannot be solved costs one motion step,
//! never the run.

use log::debug;
use serde::{Deserialize, Serialize};

use mono_vo_core::{CameraIntrinsics, GrayImage, Pt2};
use mono_vo_geometry::{estimate_relative_pose, MotionOptions, RelativePose};
use mono_vo_vision::{detect_corners, Corner, FastOptions, LkTracker, TrackerOptions};

use crate::error::PairFailure;
use crate::report::{PoseSink, PoseUpdate};
use crate::sequence::FrameSequence;
use crate::trajectory::Trajectory;

/// Full pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OdometryConfig {
    pub intrinsics: CameraIntrinsics,
    pub detector: FastOptions,
    pub tracker: TrackerOptions,
    pub motion: MotionOptions,
    /// Re-orthonormalize the accumulated rotation after this many integrated
    /// pairs. Zero disables renormalization.
    pub renormalize_every: usize,
}

impl OdometryConfig {
    /// Configuration with default stage parameters for the given camera.
    pub fn new(intrinsics: CameraIntrinsics) -> Self {
        Self {
            intrinsics,
            detector: FastOptions::default(),
            tracker: TrackerOptions::default(),
            motion: MotionOptions::default(),
            renormalize_every: 50,
        }
    }
}

/// Summary of one pipeline run.
#[derive(Debug, Clone)]
pub struct OdometryReport {
    /// Final accumulated pose.
    pub trajectory: Trajectory,
    /// Number of consecutive frame pairs in the sequence.
    pub pairs_total: usize,
    /// Pairs whose motion was integrated.
    pub pairs_integrated: usize,
    /// Pairs skipped due to a recoverable failure.
    pub pairs_skipped: usize,
}

/// Monocular visual-odometry pipeline.
#[derive(Debug, Clone)]
pub struct VisualOdometry {
    config: OdometryConfig,
    tracker: LkTracker,
}

impl VisualOdometry {
    pub fn new(config: OdometryConfig) -> Self {
        let tracker = LkTracker::new(config.tracker.clone());
        Self { config, tracker }
    }

    /// Process a validated frame sequence.
    ///
    /// The sink receives exactly one callback per frame pair. Input
    /// validation lives in [`FrameSequence::new`], so the run itself cannot
    /// fail; per-pair problems are skipped and counted.
    pub fn run(&self, sequence: &FrameSequence, sink: &mut dyn PoseSink) -> OdometryReport {
        let mut trajectory = Trajectory::default();
        let mut integrated = 0usize;
        let mut skipped = 0usize;

        for (index, prev, next) in sequence.pairs() {
            match self.process_pair(prev, next) {
                Ok(pose) => {
                    trajectory.integrate(&pose);
                    integrated += 1;
                    if self.config.renormalize_every > 0
                        && integrated % self.config.renormalize_every == 0
                    {
                        trajectory.reorthonormalize();
                    }
                    sink.pose_updated(&PoseUpdate {
                        pair_index: index,
                        relative: pose,
                        rotation: *trajectory.rotation(),
                        position: *trajectory.position(),
                    });
                }
                Err(failure) => {
                    skipped += 1;
                    sink.pair_skipped(index, &failure);
                }
            }
        }

        OdometryReport {
            trajectory,
            pairs_total: sequence.len() - 1,
            pairs_integrated: integrated,
            pairs_skipped: skipped,
        }
    }

    /// Detect, track, and estimate motion for one frame pair.
    fn process_pair(
        &self,
        prev: &GrayImage,
        next: &GrayImage,
    ) -> Result<RelativePose, PairFailure> {
        let corners = detect_corners(prev, &self.config.detector);
        if corners.is_empty() {
            return Err(PairFailure::NoFeaturesDetected);
        }
        debug!("detected {} corners", corners.len());

        let points: Vec<Pt2> = corners.iter().map(Corner::position).collect();
        let matches = self
            .tracker
            .track(prev, next, &points)
            .map_err(|_| PairFailure::TrackingFailed)?;
        if matches.is_empty() {
            return Err(PairFailure::TrackingFailed);
        }

        let pose = estimate_relative_pose(&matches, &self.config.intrinsics, &self.config.motion)?;
        Ok(pose)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PairFailure;

    fn config() -> OdometryConfig {
        OdometryConfig::new(CameraIntrinsics::new(476.703, 400.5, 400.5).unwrap())
    }

    #[test]
    fn blank_frame_yields_no_features() {
        let vo = VisualOdometry::new(config());
        let blank = GrayImage::filled(64, 64, 0).unwrap();
        let res = vo.process_pair(&blank, &blank);
        assert!(matches!(res, Err(PairFailure::NoFeaturesDetected)));
    }

    #[test]
    fn config_survives_a_serde_round_trip() {
        let cfg = OdometryConfig {
            renormalize_every: 7,
            ..config()
        };
        let json = serde_json::to_string(&cfg).unwrap();
        let restored: OdometryConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.renormalize_every, 7);
        assert_eq!(restored.intrinsics.focal, cfg.intrinsics.focal);
        assert_eq!(restored.detector.threshold, cfg.detector.threshold);
        assert_eq!(restored.tracker.window_half, cfg.tracker.window_half);
        assert_eq!(restored.motion.ransac.max_iters, cfg.motion.ransac.max_iters);
    }

    #[test]
    fn textured_to_blank_fails_in_tracking() {
        let vo = VisualOdometry::new(config());

        let mut data = vec![20u8; 64 * 64];
        for (sx, sy) in [(10, 10), (40, 12), (22, 44), (48, 48)] {
            for y in sy..sy + 8 {
                for x in sx..sx + 8 {
                    data[y * 64 + x] = 230;
                }
            }
        }
        let textured = GrayImage::from_vec(64, 64, data).unwrap();
        let blank = GrayImage::filled(64, 64, 20).unwrap();

        let res = vo.process_pair(&textured, &blank);
        assert!(matches!(res, Err(PairFailure::TrackingFailed)));
    }
}
