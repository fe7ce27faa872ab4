//! Essential-matrix estimation in normalized coordinates.
//!
//! [`essential_5point`] is Nistér's minimal solver: five correspondences,
//! up to ten algebraic candidates. [`essential_linear`] is a DLT fit from
//! eight or more correspondences, projected back onto the essential manifold;
//! it is used to refit a model on a RANSAC consensus set.

use nalgebra::{linalg::Schur, DMatrix};

use mono_vo_core::{Mat3, Pt2, Real};

use super::decomposition::enforce_essential_constraints;
use super::polynomial::build_polynomial_system;
use super::EpipolarError;
use crate::math::{mat3_from_svd_row, normalize_points_2d};

/// Build the `n × 9` design matrix for `x_bᵀ E x_a = 0`, padded with zero
/// rows to `9 × 9` so the SVD exposes the full right-singular basis.
fn design_matrix(pts_a: &[Pt2], pts_b: &[Pt2]) -> DMatrix<Real> {
    let n = pts_a.len();
    let rows = n.max(9);
    let mut a = DMatrix::<Real>::zeros(rows, 9);
    for (i, (pa, pb)) in pts_a.iter().zip(pts_b.iter()).enumerate() {
        let (x, y) = (pa.x, pa.y);
        let (xp, yp) = (pb.x, pb.y);

        a[(i, 0)] = xp * x;
        a[(i, 1)] = xp * y;
        a[(i, 2)] = xp;
        a[(i, 3)] = yp * x;
        a[(i, 4)] = yp * y;
        a[(i, 5)] = yp;
        a[(i, 6)] = x;
        a[(i, 7)] = y;
        a[(i, 8)] = 1.0;
    }
    a
}

/// 5-point minimal solver for the essential matrix.
///
/// Inputs are calibrated points (`K⁻¹` applied); `pts_a` is the earlier
/// frame, `pts_b` the later one, and every returned candidate satisfies
/// `x_bᵀ E x_a ≈ 0`. Pick the physically valid candidate by cheirality or by
/// scoring against further correspondences.
pub fn essential_5point(pts_a: &[Pt2], pts_b: &[Pt2]) -> Result<Vec<Mat3>, EpipolarError> {
    if pts_a.len() != 5 || pts_b.len() != 5 {
        return Err(EpipolarError::InvalidPointCount {
            expected: 5,
            got: pts_a.len().min(pts_b.len()),
        });
    }

    let (pts_a_n, t_a) =
        normalize_points_2d(pts_a).ok_or(EpipolarError::NormalizationFailed)?;
    let (pts_b_n, t_b) =
        normalize_points_2d(pts_b).ok_or(EpipolarError::NormalizationFailed)?;

    let a = design_matrix(&pts_a_n, &pts_b_n);
    let svd = a.svd(true, true);
    let v_t = svd.v_t.ok_or(EpipolarError::SolveFailed)?;
    if v_t.nrows() < 4 {
        return Err(EpipolarError::SolveFailed);
    }

    // Four-dimensional nullspace basis of the 5 constraints.
    let e1 = mat3_from_svd_row(&v_t, v_t.nrows() - 4);
    let e2 = mat3_from_svd_row(&v_t, v_t.nrows() - 3);
    let e3 = mat3_from_svd_row(&v_t, v_t.nrows() - 2);
    let e4 = mat3_from_svd_row(&v_t, v_t.nrows() - 1);

    let eqs = build_polynomial_system(&e1, &e2, &e3, &e4);

    let mut m = DMatrix::<Real>::zeros(10, 20);
    for (r, row) in eqs.iter().enumerate() {
        for (c, &val) in row.iter().enumerate() {
            m[(r, c)] = val;
        }
    }

    // Eliminate the degree-3 monomial block: C = M1⁻¹ · (−M2).
    let m1 = m.view((0, 0), (10, 10)).into_owned();
    let m2 = m.view((0, 10), (10, 10)).into_owned();
    let c = m1.lu().solve(&(-m2)).ok_or(EpipolarError::SolveFailed)?;

    // Action matrix for multiplication by z on the remaining monomial basis.
    let mut action = DMatrix::<Real>::zeros(10, 10);
    let deg3_rows = [2, 4, 5, 7, 8, 9];
    for (col, &row) in deg3_rows.iter().enumerate() {
        for r in 0..10 {
            action[(r, col)] = c[(row, r)];
        }
    }
    action[(2, 6)] = 1.0;
    action[(4, 7)] = 1.0;
    action[(5, 8)] = 1.0;
    action[(8, 9)] = 1.0;

    let schur = Schur::new(action.clone());
    let eigvals = schur.complex_eigenvalues();

    let mut solutions = Vec::new();
    for val in eigvals.iter() {
        if val.im.abs() > 1e-8 {
            continue;
        }

        // Null vector of (A − zI) carries the monomial values of the root.
        let mut a_eval = action.clone();
        for i in 0..10 {
            a_eval[(i, i)] -= val.re;
        }
        let svd = a_eval.svd(true, true);
        let v_t = svd.v_t.ok_or(EpipolarError::SolveFailed)?;
        let vec = v_t.row(v_t.nrows() - 1);

        let v9 = vec[9];
        if v9.abs() < 1e-12 {
            continue;
        }

        let x = vec[6] / v9;
        let y = vec[7] / v9;
        let z = vec[8] / v9;

        let e = e1 * x + e2 * y + e3 * z + e4;
        solutions.push((z, t_b.transpose() * e * t_a));
    }

    if solutions.is_empty() {
        return Err(EpipolarError::NoRealSolutions);
    }

    solutions.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
    Ok(solutions.into_iter().map(|(_, e)| e).collect())
}

/// Linear essential-matrix fit from eight or more correspondences.
///
/// Hartley-conditioned DLT followed by projection onto the essential
/// manifold (singular values forced to `(σ, σ, 0)`). Less accurate than the
/// minimal solver on noise-free data but stable on larger consensus sets.
pub fn essential_linear(pts_a: &[Pt2], pts_b: &[Pt2]) -> Result<Mat3, EpipolarError> {
    let n = pts_a.len();
    if n < 8 || pts_b.len() != n {
        return Err(EpipolarError::InvalidPointCount {
            expected: 8,
            got: n.min(pts_b.len()),
        });
    }

    let (pts_a_n, t_a) =
        normalize_points_2d(pts_a).ok_or(EpipolarError::NormalizationFailed)?;
    let (pts_b_n, t_b) =
        normalize_points_2d(pts_b).ok_or(EpipolarError::NormalizationFailed)?;

    let a = design_matrix(&pts_a_n, &pts_b_n);
    let svd = a.svd(true, true);
    let v_t = svd.v_t.ok_or(EpipolarError::SolveFailed)?;

    // Denormalize before the manifold projection; the conditioning
    // transforms are not rotations and would skew the singular values.
    let e = mat3_from_svd_row(&v_t, v_t.nrows() - 1);
    enforce_essential_constraints(&(t_b.transpose() * e * t_a))
}
