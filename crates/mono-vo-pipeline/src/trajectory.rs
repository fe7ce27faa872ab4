//! Global trajectory accumulation.
//!
//! Relative poses are chained into a global rotation and position. Because
//! monocular translations are unit directions, accumulated positions are in
//! an arbitrary but consistent scale. Repeated matrix products drift off the
//! rotation manifold; [`Trajectory::reorthonormalize`] projects back via SVD.

use serde::{Deserialize, Serialize};

use mono_vo_core::{Mat3, Real, Vec3};
use mono_vo_geometry::RelativePose;

/// Accumulated global pose of the camera.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trajectory {
    rotation: Mat3,
    position: Vec3,
}

impl Default for Trajectory {
    fn default() -> Self {
        Self {
            rotation: Mat3::identity(),
            position: Vec3::zeros(),
        }
    }
}

impl Trajectory {
    /// Fold one relative pose into the global state:
    /// `p ← p + R_g · t_rel`, then `R_g ← R_g · R_rel`.
    pub fn integrate(&mut self, pose: &RelativePose) {
        self.position += self.rotation * pose.translation;
        self.rotation *= pose.rotation;
    }

    /// Project the accumulated rotation back onto SO(3).
    ///
    /// Replaces `R` with the nearest rotation `U Vᵀ` from its SVD, flipping
    /// a singular direction when needed to keep `det R = +1`. A no-op when
    /// the SVD cannot produce the factors.
    pub fn reorthonormalize(&mut self) {
        let svd = self.rotation.svd(true, true);
        let (Some(u), Some(v_t)) = (svd.u, svd.v_t) else {
            return;
        };
        let mut r = u * v_t;
        if r.determinant() < 0.0 {
            let mut u = u;
            u.column_mut(2).neg_mut();
            r = u * v_t;
        }
        self.rotation = r;
    }

    /// Frobenius distance of `RᵀR` from the identity.
    pub fn orthonormality_error(&self) -> Real {
        (self.rotation.transpose() * self.rotation - Mat3::identity()).norm()
    }

    #[inline]
    pub fn rotation(&self) -> &Mat3 {
        &self.rotation
    }

    #[inline]
    pub fn position(&self) -> &Vec3 {
        &self.position
    }
}
