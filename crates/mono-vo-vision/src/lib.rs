//! Feature detection and sparse tracking.
//!
//! The frame-to-frame front end of the odometry pipeline:
//!
//! - [`fast`]: FAST segment-test corner detection with non-maximum
//!   suppression.
//! - [`klt`]: pyramidal Lucas-Kanade optical flow for tracking detected
//!   corners into the next frame.
//!
//! Both stages are total over valid images: an image with no corners or no
//! surviving tracks is a valid (empty) result, not an error. The pipeline
//! layer decides what an empty result means for a frame pair.

/// FAST corner detection.
pub mod fast;
/// Pyramidal Lucas-Kanade tracking.
pub mod klt;

pub use fast::{detect_corners, Corner, FastOptions};
pub use klt::{LkTracker, TrackError, TrackStatus, TrackerOptions};
