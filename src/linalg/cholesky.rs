//! Rank-revealing in-place Cholesky factorization.

use nalgebra::DMatrix;

use crate::error::{GaussError, GaussResult};

const ZERO_PIVOT_TOL: f64 = 1e-9;
const NEGATIVE_PIVOT_TOL: f64 = -1e-5;

/// Factor a symmetric positive semidefinite matrix in place, writing the
/// upper-triangular factor `R` (with `R' * R = A`) into the upper triangle.
///
/// Zero pivots are tolerated: the corresponding row is zeroed and skipped, so
/// the factorization survives rank-deficient input. Returns the index one
/// past the last nonzero row of the factor. Only the upper triangle of the
/// input is read; the lower triangle is left untouched.
///
/// Fails with `InvalidArgument` if a pivot is distinctly negative, meaning
/// the matrix was not positive semidefinite.
pub fn cholesky_careful(a: &mut DMatrix<f64>) -> GaussResult<usize> {
    let n = a.nrows();
    debug_assert_eq!(n, a.ncols(), "cholesky_careful requires a square matrix");

    let mut maxrank = 0;
    for k in 0..n {
        let pivot = a[(k, k)];
        if pivot > ZERO_PIVOT_TOL {
            let beta = pivot.sqrt();
            let inv = 1.0 / beta;
            a[(k, k)] = beta;
            for j in (k + 1)..n {
                a[(k, j)] *= inv;
            }
            for i in (k + 1)..n {
                let rki = a[(k, i)];
                if rki != 0.0 {
                    for j in i..n {
                        a[(i, j)] -= rki * a[(k, j)];
                    }
                }
            }
            maxrank = k + 1;
        } else if pivot > NEGATIVE_PIVOT_TOL {
            // Structurally dependent row; drop it from the factor.
            for j in k..n {
                a[(k, j)] = 0.0;
            }
        } else {
            return Err(GaussError::InvalidArgument(format!(
                "cholesky_careful: negative pivot {pivot} at index {k}, matrix is not positive semidefinite"
            )));
        }
    }
    Ok(maxrank)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::dmatrix;

    fn assert_approx_eq(a: f64, b: f64, eps: f64) {
        assert!((a - b).abs() < eps, "{a} vs {b}");
    }

    #[test]
    fn test_full_rank() {
        // A = R' * R with R = [[2, 1], [0, 3]]
        let mut a = dmatrix![4.0, 2.0; 2.0, 10.0];
        let rank = cholesky_careful(&mut a).unwrap();
        assert_eq!(rank, 2);
        assert_approx_eq(a[(0, 0)], 2.0, 1e-12);
        assert_approx_eq(a[(0, 1)], 1.0, 1e-12);
        assert_approx_eq(a[(1, 1)], 3.0, 1e-12);
    }

    #[test]
    fn test_rank_deficient() {
        // Outer product of [1, 1], rank one.
        let mut a = dmatrix![1.0, 1.0; 1.0, 1.0];
        let rank = cholesky_careful(&mut a).unwrap();
        assert_eq!(rank, 1);
        assert_approx_eq(a[(0, 0)], 1.0, 1e-12);
        assert_approx_eq(a[(0, 1)], 1.0, 1e-12);
        assert_approx_eq(a[(1, 1)], 0.0, 1e-12);
    }

    #[test]
    fn test_negative_rejected() {
        let mut a = dmatrix![-1.0, 0.0; 0.0, 1.0];
        assert!(cholesky_careful(&mut a).is_err());
    }
}
