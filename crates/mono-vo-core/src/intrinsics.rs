//! Pinhole camera intrinsics.
//!
//! Epipolar geometry operates on normalized image coordinates, so the
//! intrinsics model only needs a single focal length and a principal point.
//! Lens distortion is assumed to be removed upstream.

use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

use crate::math::{Mat3, Pt2, Real};

/// Pinhole intrinsics with a single focal length.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CameraIntrinsics {
    /// Focal length in pixels (shared by both axes).
    pub focal: Real,
    /// Principal point x coordinate in pixels.
    pub cx: Real,
    /// Principal point y coordinate in pixels.
    pub cy: Real,
}

impl CameraIntrinsics {
    /// Construct intrinsics, validating the focal length.
    ///
    /// # Errors
    ///
    /// Returns an error if `focal` is not strictly positive and finite.
    pub fn new(focal: Real, cx: Real, cy: Real) -> Result<Self> {
        ensure!(
            focal.is_finite() && focal > 0.0,
            "focal length must be positive and finite, got {focal}"
        );
        ensure!(
            cx.is_finite() && cy.is_finite(),
            "principal point must be finite"
        );
        Ok(Self { focal, cx, cy })
    }

    /// Calibration matrix `K`.
    pub fn k_matrix(&self) -> Mat3 {
        Mat3::new(
            self.focal, 0.0, self.cx, 0.0, self.focal, self.cy, 0.0, 0.0, 1.0,
        )
    }

    /// Map a pixel coordinate to the normalized image plane (`K⁻¹`).
    #[inline]
    pub fn normalize(&self, p: &Pt2) -> Pt2 {
        Pt2::new((p.x - self.cx) / self.focal, (p.y - self.cy) / self.focal)
    }

    /// Map a normalized image-plane coordinate back to pixels.
    #[inline]
    pub fn denormalize(&self, p: &Pt2) -> Pt2 {
        Pt2::new(p.x * self.focal + self.cx, p.y * self.focal + self.cy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_positive_focal() {
        assert!(CameraIntrinsics::new(0.0, 400.5, 400.5).is_err());
        assert!(CameraIntrinsics::new(-100.0, 400.5, 400.5).is_err());
        assert!(CameraIntrinsics::new(f64::NAN, 400.5, 400.5).is_err());
    }

    #[test]
    fn normalize_round_trip() {
        let k = CameraIntrinsics::new(476.7, 400.5, 400.5).unwrap();
        let p = Pt2::new(123.0, 654.0);
        let back = k.denormalize(&k.normalize(&p));
        assert!((back - p).norm() < 1e-9);
    }

    #[test]
    fn principal_point_maps_to_origin() {
        let k = CameraIntrinsics::new(500.0, 320.0, 240.0).unwrap();
        let n = k.normalize(&Pt2::new(320.0, 240.0));
        assert!(n.x.abs() < 1e-12 && n.y.abs() < 1e-12);
    }

    #[test]
    fn serde_round_trip() {
        let k = CameraIntrinsics::new(476.7, 400.5, 400.5).unwrap();
        let json = serde_json::to_string(&k).unwrap();
        let restored: CameraIntrinsics = serde_json::from_str(&json).unwrap();
        assert!((restored.focal - k.focal).abs() < 1e-12);
    }
}
