//! Essential-matrix decomposition into candidate poses.

use nalgebra::SMatrix;

use mono_vo_core::{Mat3, Real, Vec3};

use super::EpipolarError;

/// Project a 3×3 matrix onto the essential manifold by forcing its singular
/// values to `(σ, σ, 0)`, with `σ` the mean of the two largest.
pub(super) fn enforce_essential_constraints(e: &Mat3) -> Result<Mat3, EpipolarError> {
    let svd = e.svd(true, true);
    let u = svd.u.ok_or(EpipolarError::SolveFailed)?;
    let v_t = svd.v_t.ok_or(EpipolarError::SolveFailed)?;

    let s = 0.5 * (svd.singular_values[0] + svd.singular_values[1]);
    let s_mat = SMatrix::<Real, 3, 3>::from_diagonal(&nalgebra::Vector3::new(s, s, 0.0));
    Ok(u * s_mat * v_t)
}

/// Decompose an essential matrix into the four candidate `(R, t)` pairs.
///
/// Each rotation is proper (`det R = +1`) and each translation has unit
/// length; the physically valid pair is the one that places triangulated
/// points in front of both cameras.
pub fn decompose_essential(e: &Mat3) -> Result<Vec<(Mat3, Vec3)>, EpipolarError> {
    let e = enforce_essential_constraints(e)?;
    let svd = e.svd(true, true);
    let mut u = svd.u.ok_or(EpipolarError::SolveFailed)?;
    let mut v_t = svd.v_t.ok_or(EpipolarError::SolveFailed)?;

    if u.determinant() < 0.0 {
        u.column_mut(2).neg_mut();
    }
    if v_t.determinant() < 0.0 {
        v_t.row_mut(2).neg_mut();
    }

    let w = Mat3::new(0.0, -1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0);

    let r1 = u * w * v_t;
    let r2 = u * w.transpose() * v_t;
    let t = u.column(2).normalize();

    let mut solutions = vec![
        (r1, t),
        (r1, -t),
        (r2, t),
        (r2, -t),
    ];

    for (r, t) in solutions.iter_mut() {
        if r.determinant() < 0.0 {
            *r = -*r;
            *t = -*t;
        }
    }

    Ok(solutions)
}
