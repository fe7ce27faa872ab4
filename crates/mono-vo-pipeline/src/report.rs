//! Pose reporting.
//!
//! The pipeline pushes every outcome through a [`PoseSink`]: one call per
//! frame pair, whether it was integrated or skipped. [`LogSink`] is the
//! default sink and simply forwards to the `log` facade.

use log::{info, warn};
use serde::Serialize;

use mono_vo_core::{Mat3, Vec3};
use mono_vo_geometry::RelativePose;

use crate::error::PairFailure;

/// Emitted after a frame pair has been integrated into the trajectory.
#[derive(Debug, Clone, Serialize)]
pub struct PoseUpdate {
    /// Index of the earlier frame of the pair.
    pub pair_index: usize,
    /// Relative motion of this pair (unit-length translation).
    pub relative: RelativePose,
    /// Accumulated global rotation after this pair.
    pub rotation: Mat3,
    /// Accumulated global position after this pair.
    pub position: Vec3,
}

/// Observer of per-pair pipeline outcomes.
pub trait PoseSink {
    fn pose_updated(&mut self, update: &PoseUpdate);
    fn pair_skipped(&mut self, pair_index: usize, failure: &PairFailure);
}

/// Sink that reports through the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl PoseSink for LogSink {
    fn pose_updated(&mut self, update: &PoseUpdate) {
        let p = &update.position;
        info!(
            "pair {}: position [{:.3}, {:.3}, {:.3}]",
            update.pair_index, p.x, p.y, p.z
        );
    }

    fn pair_skipped(&mut self, pair_index: usize, failure: &PairFailure) {
        warn!("pair {pair_index} skipped: {failure}");
    }
}
