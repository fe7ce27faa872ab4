//! Trivariate polynomial arithmetic for the 5-point solver.
//!
//! The essential-matrix constraints `det(E) = 0` and
//! `2 E Eᵀ E − trace(E Eᵀ) E = 0` are polynomial in the three nullspace
//! mixing coefficients `(x, y, z)`. This module carries out that symbolic
//! expansion with dense degree-≤3 polynomials.

use std::ops::{Add, Mul, Sub};

use mono_vo_core::{Mat3, Real};

/// Monomial ordering: `(x_degree, y_degree, z_degree)`, degree-3 block first,
/// then degree 2, 1, and the constant. The solver's elimination step relies
/// on this exact order.
pub(super) const MONOMIALS: [(u8, u8, u8); 20] = [
    (3, 0, 0),
    (2, 1, 0),
    (2, 0, 1),
    (1, 2, 0),
    (1, 1, 1),
    (1, 0, 2),
    (0, 3, 0),
    (0, 2, 1),
    (0, 1, 2),
    (0, 0, 3),
    (2, 0, 0),
    (1, 1, 0),
    (1, 0, 1),
    (0, 2, 0),
    (0, 1, 1),
    (0, 0, 2),
    (1, 0, 0),
    (0, 1, 0),
    (0, 0, 1),
    (0, 0, 0),
];

fn monomial_index(x: u8, y: u8, z: u8) -> Option<usize> {
    MONOMIALS
        .iter()
        .position(|&(mx, my, mz)| mx == x && my == y && mz == z)
}

/// Dense polynomial in `(x, y, z)` with total degree at most 3.
#[derive(Clone, Copy)]
pub(super) struct Poly3 {
    pub coeffs: [Real; 20],
}

impl Poly3 {
    pub const ZERO: Self = Self { coeffs: [0.0; 20] };

    /// `c0 + cx·x + cy·y + cz·z`.
    pub fn linear(c0: Real, cx: Real, cy: Real, cz: Real) -> Self {
        let mut p = Self::ZERO;
        p.coeffs[19] = c0;
        p.coeffs[16] = cx;
        p.coeffs[17] = cy;
        p.coeffs[18] = cz;
        p
    }

    pub fn scale(self, s: Real) -> Self {
        let mut out = self;
        for c in out.coeffs.iter_mut() {
            *c *= s;
        }
        out
    }
}

impl Add for Poly3 {
    type Output = Poly3;

    fn add(self, rhs: Poly3) -> Poly3 {
        let mut out = self;
        for (a, b) in out.coeffs.iter_mut().zip(rhs.coeffs.iter()) {
            *a += b;
        }
        out
    }
}

impl Sub for Poly3 {
    type Output = Poly3;

    fn sub(self, rhs: Poly3) -> Poly3 {
        let mut out = self;
        for (a, b) in out.coeffs.iter_mut().zip(rhs.coeffs.iter()) {
            *a -= b;
        }
        out
    }
}

impl Mul for Poly3 {
    type Output = Poly3;

    /// Product truncated to total degree 3. The constraint system never
    /// produces higher-degree terms from the linear matrix entries, so the
    /// truncation drops nothing.
    fn mul(self, rhs: Poly3) -> Poly3 {
        let mut out = Poly3::ZERO;
        for (i, &ai) in self.coeffs.iter().enumerate() {
            if ai == 0.0 {
                continue;
            }
            let (ix, iy, iz) = MONOMIALS[i];
            for (j, &bj) in rhs.coeffs.iter().enumerate() {
                if bj == 0.0 {
                    continue;
                }
                let (jx, jy, jz) = MONOMIALS[j];
                let (dx, dy, dz) = (ix + jx, iy + jy, iz + jz);
                if dx + dy + dz > 3 {
                    continue;
                }
                if let Some(idx) = monomial_index(dx, dy, dz) {
                    out.coeffs[idx] += ai * bj;
                }
            }
        }
        out
    }
}

type PolyMat3 = [[Poly3; 3]; 3];

fn mat_mul(a: &PolyMat3, b: &PolyMat3) -> PolyMat3 {
    let mut out = [[Poly3::ZERO; 3]; 3];
    for r in 0..3 {
        for c in 0..3 {
            let mut sum = Poly3::ZERO;
            for k in 0..3 {
                sum = sum + a[r][k] * b[k][c];
            }
            out[r][c] = sum;
        }
    }
    out
}

fn transpose(a: &PolyMat3) -> PolyMat3 {
    let mut out = [[Poly3::ZERO; 3]; 3];
    for r in 0..3 {
        for c in 0..3 {
            out[r][c] = a[c][r];
        }
    }
    out
}

fn det3(a: &PolyMat3) -> Poly3 {
    let t1 = a[0][0] * (a[1][1] * a[2][2] - a[1][2] * a[2][1]);
    let t2 = a[0][1] * (a[1][0] * a[2][2] - a[1][2] * a[2][0]);
    let t3 = a[0][2] * (a[1][0] * a[2][1] - a[1][1] * a[2][0]);
    t1 - t2 + t3
}

/// Expand the ten polynomial constraints over the four-dimensional nullspace
/// `E = x·e1 + y·e2 + z·e3 + e4`.
///
/// Row 0 is `det(E) = 0`; rows 1-9 are the entries of the trace constraint
/// `2 E Eᵀ E − trace(E Eᵀ) E = 0`. Coefficients follow [`MONOMIALS`].
pub(super) fn build_polynomial_system(
    e1: &Mat3,
    e2: &Mat3,
    e3: &Mat3,
    e4: &Mat3,
) -> [[Real; 20]; 10] {
    let mut e = [[Poly3::ZERO; 3]; 3];
    for r in 0..3 {
        for c in 0..3 {
            e[r][c] = Poly3::linear(e4[(r, c)], e1[(r, c)], e2[(r, c)], e3[(r, c)]);
        }
    }

    let det = det3(&e);

    let eet = mat_mul(&e, &transpose(&e));
    let eet_e = mat_mul(&eet, &e);
    let trace = eet[0][0] + eet[1][1] + eet[2][2];

    let mut eqs = [[0.0; 20]; 10];
    eqs[0] = det.coeffs;

    let mut row = 1;
    for r in 0..3 {
        for c in 0..3 {
            eqs[row] = (eet_e[r][c].scale(2.0) - trace * e[r][c]).coeffs;
            row += 1;
        }
    }

    eqs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(p: &Poly3, x: Real, y: Real, z: Real) -> Real {
        p.coeffs
            .iter()
            .zip(MONOMIALS.iter())
            .map(|(&c, &(dx, dy, dz))| {
                c * x.powi(dx as i32) * y.powi(dy as i32) * z.powi(dz as i32)
            })
            .sum()
    }

    #[test]
    fn product_matches_pointwise_evaluation() {
        let p = Poly3::linear(1.0, 2.0, -1.0, 0.5);
        let q = Poly3::linear(-0.5, 1.0, 3.0, -2.0);
        let pq = p * q;
        for &(x, y, z) in &[(0.3, -0.7, 1.1), (1.0, 1.0, 1.0), (-2.0, 0.5, 0.25)] {
            let lhs = eval(&pq, x, y, z);
            let rhs = eval(&p, x, y, z) * eval(&q, x, y, z);
            assert!((lhs - rhs).abs() < 1e-10);
        }
    }

    #[test]
    fn determinant_of_linear_matrix_evaluates_correctly() {
        let e1 = Mat3::new(1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0);
        let e2 = Mat3::new(0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0);
        let e3 = Mat3::new(0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0);
        let e4 = Mat3::zeros();

        let mut e = [[Poly3::ZERO; 3]; 3];
        for r in 0..3 {
            for c in 0..3 {
                e[r][c] = Poly3::linear(e4[(r, c)], e1[(r, c)], e2[(r, c)], e3[(r, c)]);
            }
        }
        // diag(x, y, z): determinant is the monomial xyz.
        let det = det3(&e);
        assert!((eval(&det, 2.0, 3.0, 5.0) - 30.0).abs() < 1e-12);
    }
}
