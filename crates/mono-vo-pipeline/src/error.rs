//! Pipeline error taxonomy.
//!
//! Two tiers: [`PairFailure`] covers conditions local to one frame pair,
//! which the sequence loop records and skips past; [`SequenceError`] covers
//! malformed input that no amount of skipping can fix.

use thiserror::Error;

use mono_vo_geometry::MotionError;

/// A recoverable failure while processing a single frame pair.
#[derive(Debug, Error)]
pub enum PairFailure {
    /// The detector found no corners in the earlier frame.
    #[error("no features detected")]
    NoFeaturesDetected,
    /// Tracking lost every feature between the two frames.
    #[error("tracking lost all features")]
    TrackingFailed,
    /// Too few matches survived for the minimal solver.
    #[error("insufficient correspondences: got {got}, need {need}")]
    InsufficientCorrespondences { got: usize, need: usize },
    /// RANSAC found no consensus or the pose candidates could not be
    /// disambiguated.
    #[error("degenerate motion estimate: {0}")]
    DegenerateMotion(#[source] MotionError),
}

impl From<MotionError> for PairFailure {
    fn from(err: MotionError) -> Self {
        match err {
            MotionError::NotEnoughCorrespondences { got, need } => {
                PairFailure::InsufficientCorrespondences { got, need }
            }
            other => PairFailure::DegenerateMotion(other),
        }
    }
}

/// Malformed input that aborts the whole run.
#[derive(Debug, Error)]
pub enum SequenceError {
    #[error("need at least 2 frames, got {0}")]
    TooFewFrames(usize),
    #[error("frame {index} is {got_w}x{got_h}, expected {want_w}x{want_h}")]
    MismatchedDimensions {
        index: usize,
        got_w: usize,
        got_h: usize,
        want_w: usize,
        want_h: usize,
    },
}
