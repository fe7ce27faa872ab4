//! Core primitives for `mono-vo-rs`.
//!
//! This crate provides the foundational building blocks used by all other
//! crates in the workspace:
//!
//! - linear algebra type aliases (`Real`, `Vec3`, `Pt2`, and friends),
//! - grayscale image containers with an image pyramid for coarse-to-fine
//!   processing,
//! - the pinhole intrinsics model used to map pixels to normalized camera
//!   rays,
//! - an equal-length point-correspondence container,
//! - a deterministic, model-agnostic RANSAC engine.
//!
//! # Modules
//!
//! - [`math`]: basic type aliases and homogeneous helpers.
//! - [`image`]: grayscale image storage and bilinear sampling.
//! - [`pyramid`]: Gaussian image pyramid.
//! - [`intrinsics`]: pinhole camera intrinsics.
//! - [`correspondences`]: matched point sets with a length invariant.
//! - [`ransac`]: generic robust estimation helpers.
//! - [`synthetic`]: deterministic synthetic scenes (tests/examples).

/// Matched point sets with an enforced equal-length invariant.
mod correspondences;
/// Grayscale image storage and sampling.
pub mod image;
/// Pinhole camera intrinsics.
mod intrinsics;
/// Linear algebra type aliases and helpers.
mod math;
/// Grayscale image pyramid.
pub mod pyramid;
/// Generic RANSAC engine and traits.
mod ransac;
/// Deterministic synthetic scene helpers.
///
/// This module is public so workspace tests and examples can build exact
/// projected correspondences; it is not intended for production use.
pub mod synthetic;

pub use correspondences::Correspondences;
pub use image::{GrayImage, ImageF32};
pub use intrinsics::CameraIntrinsics;
pub use math::*;
pub use pyramid::Pyramid;
pub use ransac::{ransac_fit, Estimator, RansacOptions, RansacResult};
