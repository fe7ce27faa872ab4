//! Numerical helpers shared by the epipolar solvers.
//!
//! Hartley conditioning keeps the design matrices of DLT-style solvers well
//! behaved; the SVD row extraction recovers a 3×3 matrix from the nullspace
//! of a vectorized constraint system.

use mono_vo_core::{Mat3, Pt2, Real};
use nalgebra::DMatrix;

/// Hartley normalization for 2D points.
///
/// Centers the points at the origin and scales them so the mean distance
/// from the origin is `√2`. Returns the normalized points and the matrix `T`
/// with `p_norm = T · p_homogeneous`, or `None` when the input is empty or
/// all points coincide.
pub fn normalize_points_2d(points: &[Pt2]) -> Option<(Vec<Pt2>, Mat3)> {
    if points.is_empty() {
        return None;
    }

    let n = points.len() as Real;
    let cx = points.iter().map(|p| p.x).sum::<Real>() / n;
    let cy = points.iter().map(|p| p.y).sum::<Real>() / n;

    let mean_dist = points
        .iter()
        .map(|p| {
            let dx = p.x - cx;
            let dy = p.y - cy;
            (dx * dx + dy * dy).sqrt()
        })
        .sum::<Real>()
        / n;

    if mean_dist <= Real::EPSILON {
        return None;
    }

    let scale = (2.0_f64).sqrt() / mean_dist;
    let t = Mat3::new(
        scale,
        0.0,
        -scale * cx,
        0.0,
        scale,
        -scale * cy,
        0.0,
        0.0,
        1.0,
    );

    let norm = points
        .iter()
        .map(|p| Pt2::new((p.x - cx) * scale, (p.y - cy) * scale))
        .collect();

    Some((norm, t))
}

/// Reshape a 9-element row of an SVD `Vᵀ` matrix into a 3×3 matrix, filled
/// row by row. Used for nullspace extraction from vectorized epipolar
/// constraints.
///
/// # Panics
///
/// Panics if `v_t` does not have exactly 9 columns or the row is out of
/// bounds.
pub fn mat3_from_svd_row(v_t: &DMatrix<Real>, row_idx: usize) -> Mat3 {
    assert_eq!(v_t.ncols(), 9, "expected 9 columns for 3x3 extraction");
    let mut m = Mat3::zeros();
    for r in 0..3 {
        for c in 0..3 {
            m[(r, c)] = v_t[(row_idx, 3 * r + c)];
        }
    }
    m
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_centers_and_scales() {
        let points = vec![
            Pt2::new(100.0, 200.0),
            Pt2::new(200.0, 300.0),
            Pt2::new(150.0, 250.0),
        ];

        let (norm, _t) = normalize_points_2d(&points).unwrap();

        let n = norm.len() as f64;
        let cx: f64 = norm.iter().map(|p| p.x).sum::<f64>() / n;
        let cy: f64 = norm.iter().map(|p| p.y).sum::<f64>() / n;
        assert!(cx.abs() < 1e-10);
        assert!(cy.abs() < 1e-10);

        let mean_dist: f64 = norm
            .iter()
            .map(|p| (p.x * p.x + p.y * p.y).sqrt())
            .sum::<f64>()
            / n;
        assert!((mean_dist - 2.0_f64.sqrt()).abs() < 1e-10);
    }

    #[test]
    fn normalization_transform_matches_points() {
        let points = vec![Pt2::new(10.0, -4.0), Pt2::new(-6.0, 8.0), Pt2::new(2.0, 2.0)];
        let (norm, t) = normalize_points_2d(&points).unwrap();
        for (p, q) in points.iter().zip(norm.iter()) {
            let h = t * nalgebra::Vector3::new(p.x, p.y, 1.0);
            assert!((h.x / h.z - q.x).abs() < 1e-12);
            assert!((h.y / h.z - q.y).abs() < 1e-12);
        }
    }

    #[test]
    fn coincident_points_are_rejected() {
        let points = vec![Pt2::new(1.0, 1.0); 5];
        assert!(normalize_points_2d(&points).is_none());
        assert!(normalize_points_2d(&[]).is_none());
    }

    #[test]
    fn svd_row_extraction_is_row_major() {
        let mut v_t = DMatrix::zeros(9, 9);
        for i in 0..9 {
            v_t[(8, i)] = (i + 1) as f64;
        }
        let m = mat3_from_svd_row(&v_t, 8);
        assert_eq!(m[(0, 0)], 1.0);
        assert_eq!(m[(0, 2)], 3.0);
        assert_eq!(m[(1, 0)], 4.0);
        assert_eq!(m[(2, 2)], 9.0);
    }
}
