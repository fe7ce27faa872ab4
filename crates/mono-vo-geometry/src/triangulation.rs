//! Two-view linear triangulation.
//!
//! DLT formulation on a pair of projection matrices, used by the motion
//! estimator to test candidate poses for positive depth.

use anyhow::Result;
use nalgebra::DMatrix;

use mono_vo_core::{Mat3, Mat34, Pt2, Pt3, Real, Vec3};

/// Assemble the projection matrix `[R | t]` for a camera in normalized
/// coordinates.
pub fn camera_matrix(rotation: &Mat3, translation: &Vec3) -> Mat34 {
    let mut p = Mat34::zeros();
    p.view_mut((0, 0), (3, 3)).copy_from(rotation);
    p.column_mut(3).copy_from(translation);
    p
}

/// Triangulate one point seen in two views.
///
/// `p_a` and `p_b` are observations in the same (normalized) coordinates the
/// projection matrices map into. The returned point lives in the frame of
/// `cam_a`.
pub fn triangulate_point(cam_a: &Mat34, cam_b: &Mat34, p_a: &Pt2, p_b: &Pt2) -> Result<Pt3> {
    let mut a = DMatrix::<Real>::zeros(4, 4);
    for (i, (p, cam)) in [(p_a, cam_a), (p_b, cam_b)].iter().enumerate() {
        let row0 = cam.row(0);
        let row1 = cam.row(1);
        let row2 = cam.row(2);

        a.row_mut(2 * i).copy_from(&(p.x * row2 - row0));
        a.row_mut(2 * i + 1).copy_from(&(p.y * row2 - row1));
    }

    let svd = a.svd(true, true);
    let v_t = svd
        .v_t
        .ok_or_else(|| anyhow::anyhow!("svd failed during triangulation"))?;
    let x_h = v_t.row(v_t.nrows() - 1);

    let w = x_h[3];
    if w.abs() <= Real::EPSILON {
        anyhow::bail!("triangulated point is at infinity");
    }

    Ok(Pt3::new(x_h[0] / w, x_h[1] / w, x_h[2] / w))
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector4;

    fn project(cam: &Mat34, p: &Pt3) -> Pt2 {
        let x = cam * Vector4::new(p.x, p.y, p.z, 1.0);
        Pt2::new(x.x / x.z, x.y / x.z)
    }

    #[test]
    fn recovers_point_from_two_views() {
        let cam_a = camera_matrix(&Mat3::identity(), &Vec3::zeros());
        let cam_b = camera_matrix(&Mat3::identity(), &Vec3::new(-0.2, 0.0, 0.0));

        let pw = Pt3::new(0.1, -0.05, 2.0);
        let pa = project(&cam_a, &pw);
        let pb = project(&cam_b, &pw);

        let est = triangulate_point(&cam_a, &cam_b, &pa, &pb).unwrap();
        assert!((est - pw).norm() < 1e-6);
    }

    #[test]
    fn camera_matrix_lays_out_rotation_and_translation() {
        let r = Mat3::new(0.0, -1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0);
        let t = Vec3::new(1.0, 2.0, 3.0);
        let p = camera_matrix(&r, &t);
        assert_eq!(p[(0, 1)], -1.0);
        assert_eq!(p[(1, 0)], 1.0);
        assert_eq!(p[(2, 3)], 3.0);
    }

    #[test]
    fn parallel_rays_do_not_panic() {
        // Identical cameras: the DLT system is rank deficient but the solver
        // must fail or return something finite rather than panic.
        let cam = camera_matrix(&Mat3::identity(), &Vec3::zeros());
        let p = Pt2::new(0.1, 0.1);
        let _ = triangulate_point(&cam, &cam, &p, &p);
    }
}
