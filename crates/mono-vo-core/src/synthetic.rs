//! Deterministic synthetic scenes for tests and examples.
//!
//! Generates point clouds in front of the camera and projects them through a
//! known relative pose, yielding exact pixel correspondences. Seeded RNG keeps
//! every run reproducible.

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::correspondences::Correspondences;
use crate::intrinsics::CameraIntrinsics;
use crate::math::{Mat3, Pt2, Pt3, Real, Vec3};

/// Sample `n` scene points uniformly in a box in front of the first camera.
///
/// Points lie in `x, y ∈ [-2, 2]`, `z ∈ [4, 10]` so they stay in view and at
/// positive depth for the modest camera motions used in tests.
pub fn point_cloud(n: usize, seed: u64) -> Vec<Pt3> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            Pt3::new(
                rng.random_range(-2.0..2.0),
                rng.random_range(-2.0..2.0),
                rng.random_range(4.0..10.0),
            )
        })
        .collect()
}

/// Rotation about the y axis by `angle` radians.
pub fn rotation_about_y(angle: Real) -> Mat3 {
    let (s, c) = angle.sin_cos();
    Mat3::new(c, 0.0, s, 0.0, 1.0, 0.0, -s, 0.0, c)
}

/// Project a camera-frame point to pixels. Returns `None` at non-positive
/// depth.
pub fn project(point: &Pt3, intrinsics: &CameraIntrinsics) -> Option<Pt2> {
    if point.z <= 0.0 {
        return None;
    }
    let normalized = Pt2::new(point.x / point.z, point.y / point.z);
    Some(intrinsics.denormalize(&normalized))
}

/// Project a point cloud through two views related by `x_b = R x_a + t`.
///
/// The first view is the identity pose. Points that fall behind either camera
/// are dropped, so the output may hold fewer pairs than `points`.
pub fn two_view_correspondences(
    points: &[Pt3],
    rotation: &Mat3,
    translation: &Vec3,
    intrinsics: &CameraIntrinsics,
) -> Correspondences {
    let mut points_a = Vec::with_capacity(points.len());
    let mut points_b = Vec::with_capacity(points.len());

    for p in points {
        let pb = Pt3::from(rotation * p.coords + translation);
        let (Some(a), Some(b)) = (project(p, intrinsics), project(&pb, intrinsics)) else {
            continue;
        };
        points_a.push(a);
        points_b.push(b);
    }

    Correspondences {
        points_a,
        points_b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn intrinsics() -> CameraIntrinsics {
        CameraIntrinsics::new(476.7, 400.5, 400.5).unwrap()
    }

    #[test]
    fn point_cloud_is_deterministic() {
        let a = point_cloud(10, 7);
        let b = point_cloud(10, 7);
        assert_eq!(a, b);
        assert!(a.iter().all(|p| p.z >= 4.0 && p.z <= 10.0));
    }

    #[test]
    fn identity_motion_projects_to_same_pixels() {
        let pts = point_cloud(20, 1);
        let c = two_view_correspondences(&pts, &Mat3::identity(), &Vec3::zeros(), &intrinsics());
        assert_eq!(c.len(), 20);
        for (a, b) in c.iter() {
            assert!((a - b).norm() < 1e-9);
        }
    }

    #[test]
    fn forward_motion_spreads_points_outward() {
        let pts = point_cloud(30, 2);
        let t = Vec3::new(0.0, 0.0, -1.0); // camera moves forward along +z
        let c = two_view_correspondences(&pts, &Mat3::identity(), &t, &intrinsics());
        assert!(!c.is_empty());
        let pp = Pt2::new(400.5, 400.5);
        for (a, b) in c.iter() {
            assert!((b - pp).norm() >= (a - pp).norm() - 1e-9);
        }
    }
}
