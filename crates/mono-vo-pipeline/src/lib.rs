//! Monocular visual-odometry pipeline.
//!
//! Chains the workspace stages over a grayscale frame sequence:
//!
//! 1. detect FAST corners in each earlier frame (`mono-vo-vision`),
//! 2. track them into the next frame with pyramidal Lucas-Kanade,
//! 3. estimate the scale-free relative pose robustly (`mono-vo-geometry`),
//! 4. accumulate the global trajectory, re-orthonormalizing periodically.
//!
//! Per-pair failures (blank frames, lost tracking, degenerate motion) are
//! reported to a [`PoseSink`] and skipped; only malformed input aborts, and
//! that is rejected up front by [`FrameSequence::new`].

mod error;
mod odometry;
mod report;
mod sequence;
mod trajectory;

pub use error::{PairFailure, SequenceError};
pub use odometry::{OdometryConfig, OdometryReport, VisualOdometry};
pub use report::{LogSink, PoseSink, PoseUpdate};
pub use sequence::FrameSequence;
pub use trajectory::Trajectory;
