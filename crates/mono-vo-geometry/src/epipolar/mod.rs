//! Essential-matrix solvers and pose decomposition.
//!
//! All solvers here work in **normalized coordinates**: pixel points must be
//! mapped through `K⁻¹` first. The minimal [`essential_5point`] solver returns
//! up to ten algebraic candidates; [`essential_linear`] fits a single matrix
//! from eight or more correspondences; [`decompose_essential`] turns a matrix
//! into the four candidate `(R, t)` pairs that a cheirality test must
//! disambiguate.

use thiserror::Error;

mod decomposition;
mod essential;
mod polynomial;

pub use decomposition::decompose_essential;
pub use essential::{essential_5point, essential_linear};

/// Failures during essential-matrix estimation.
#[derive(Debug, Error)]
pub enum EpipolarError {
    /// Incorrect number of correspondences for a solver.
    #[error("invalid number of correspondences: expected {expected}, got {got}")]
    InvalidPointCount { expected: usize, got: usize },
    /// Input points could not be conditioned (empty or coincident).
    #[error("point normalization failed: points are coincident or missing")]
    NormalizationFailed,
    /// A linear solve (SVD or LU) failed.
    #[error("linear solve failed in epipolar estimation")]
    SolveFailed,
    /// The polynomial system produced no real roots.
    #[error("the epipolar polynomial system has no real solutions")]
    NoRealSolutions,
}
