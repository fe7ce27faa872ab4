//! Epipolar geometry and relative-pose estimation.
//!
//! The geometric middle layer of the odometry pipeline. Given matched points
//! in two frames and the camera intrinsics, it estimates the relative camera
//! motion up to an unknown translation scale:
//!
//! - [`epipolar`]: the 5-point minimal solver and a linear solver for the
//!   essential matrix, plus its SVD decomposition into pose candidates.
//! - [`triangulation`]: two-view DLT triangulation used for cheirality tests.
//! - [`motion`]: RANSAC-robust relative-pose estimation gluing the above
//!   together.
//!
//! Essential-matrix solvers expect **normalized coordinates** (pixels mapped
//! through `K⁻¹`); [`motion::estimate_relative_pose`] accepts pixels and
//! normalizes internally.

pub mod epipolar;
/// Shared numerical helpers (Hartley conditioning, SVD extraction).
pub mod math;
pub mod motion;
pub mod triangulation;

pub use epipolar::{decompose_essential, essential_5point, essential_linear, EpipolarError};
pub use motion::{
    estimate_relative_pose, MotionError, MotionOptions, RelativePose, MIN_CORRESPONDENCES,
};
pub use triangulation::{camera_matrix, triangulate_point};
