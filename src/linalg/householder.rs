//! Column-wise Householder QR restricted by a row staircase.

use nalgebra::DMatrix;

/// Columns whose working sub-column norm falls below this are treated as
/// structurally dependent and contribute no pivot.
const DEAD_PIVOT_TOL: f64 = 1e-9;

/// In-place column-wise Householder triangularization of `ab`.
///
/// `first_zero_rows[col]` is the row index below which column `col` is
/// structurally zero; the reflector for a column touches only the rows above
/// it. Columns are pivoted left to right over `num_pivot_cols` (the trailing
/// right-hand-side columns are updated but never pivoted). Reflectors are
/// chosen so the produced diagonal entries are nonnegative.
///
/// Returns the number of pivots produced. A column with no usable entries at
/// or below the current pivot row is skipped, so the returned rank can fall
/// short of `min(rows, num_pivot_cols)`; callers decide whether that is an
/// error.
pub fn householder_staircase(
    ab: &mut DMatrix<f64>,
    first_zero_rows: &[usize],
    num_pivot_cols: usize,
) -> usize {
    let m = ab.nrows();
    let total_cols = ab.ncols();
    debug_assert!(first_zero_rows.len() >= num_pivot_cols);

    let mut v = vec![0.0; m];
    let mut pivot_row = 0usize;
    for j in 0..num_pivot_cols {
        if pivot_row >= m {
            break;
        }
        let stair = first_zero_rows[j].min(m);
        if stair <= pivot_row {
            continue;
        }
        let len = stair - pivot_row;

        let x0 = ab[(pivot_row, j)];
        let mut tail = 0.0;
        for i in 1..len {
            let t = ab[(pivot_row + i, j)];
            tail += t * t;
        }
        let norm = (x0 * x0 + tail).sqrt();
        if norm < DEAD_PIVOT_TOL {
            continue;
        }

        if tail == 0.0 {
            // Already triangular in this column; just fix the pivot sign.
            if x0 < 0.0 {
                for c in j..total_cols {
                    ab[(pivot_row, c)] = -ab[(pivot_row, c)];
                }
            }
            pivot_row += 1;
            continue;
        }

        // Golub & Van Loan alg. 5.1.1: v normalized to v[0] = 1 and
        // (I - beta*v*v')*x = norm*e1 with a nonnegative leading entry.
        let v0 = if x0 <= 0.0 {
            x0 - norm
        } else {
            -tail / (x0 + norm)
        };
        let beta = 2.0 * v0 * v0 / (tail + v0 * v0);
        v[0] = 1.0;
        for i in 1..len {
            v[i] = ab[(pivot_row + i, j)] / v0;
        }

        for c in (j + 1)..total_cols {
            let mut w = 0.0;
            for i in 0..len {
                w += v[i] * ab[(pivot_row + i, c)];
            }
            w *= beta;
            if w != 0.0 {
                for i in 0..len {
                    ab[(pivot_row + i, c)] -= w * v[i];
                }
            }
        }

        ab[(pivot_row, j)] = norm;
        for i in 1..len {
            ab[(pivot_row + i, j)] = 0.0;
        }
        pivot_row += 1;
    }
    pivot_row
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::dmatrix;

    fn assert_approx_eq(a: f64, b: f64, eps: f64) {
        assert!((a - b).abs() < eps, "{a} vs {b}");
    }

    #[test]
    fn test_full_rank_triangularization() {
        // [A | b] with A = [[1, 1], [1, -1]], b = [2, 0]
        let mut ab = dmatrix![1.0, 1.0, 2.0; 1.0, -1.0, 0.0];
        let rank = householder_staircase(&mut ab, &[2, 2, 2], 2);
        assert_eq!(rank, 2);

        let s = 2.0_f64.sqrt();
        assert_approx_eq(ab[(0, 0)], s, 1e-12);
        assert_approx_eq(ab[(0, 1)], 0.0, 1e-12);
        assert_approx_eq(ab[(0, 2)], s, 1e-12);
        assert_approx_eq(ab[(1, 0)], 0.0, 1e-12);
        assert_approx_eq(ab[(1, 1)], s, 1e-12);
        assert_approx_eq(ab[(1, 2)], s, 1e-12);
    }

    #[test]
    fn test_positive_diagonal() {
        let mut ab = dmatrix![-3.0, 1.0; 4.0, 2.0];
        let rank = householder_staircase(&mut ab, &[2, 2], 1);
        assert_eq!(rank, 1);
        assert_approx_eq(ab[(0, 0)], 5.0, 1e-12);
    }

    #[test]
    fn test_staircase_limits_reflector() {
        // Column 1 is structurally zero below row 2; the trailing rows of the
        // rhs column must not be touched by its reflector.
        let mut ab = dmatrix![
            2.0, 1.0, 1.0;
            0.0, 3.0, 2.0;
            0.0, 0.0, 5.0
        ];
        let rank = householder_staircase(&mut ab, &[1, 2, 3], 2);
        assert_eq!(rank, 2);
        assert_approx_eq(ab[(2, 2)], 5.0, 1e-12);
        assert_approx_eq(ab[(0, 0)], 2.0, 1e-12);
        assert_approx_eq(ab[(1, 1)], 3.0, 1e-12);
    }

    #[test]
    fn test_dead_column_is_skipped() {
        // Second column is a multiple of nothing: all zeros, so it produces
        // no pivot and the rank stays 1.
        let mut ab = dmatrix![1.0, 0.0, 1.0; 1.0, 0.0, 1.0];
        let rank = householder_staircase(&mut ab, &[2, 2, 2], 2);
        assert_eq!(rank, 1);
        assert_approx_eq(ab[(0, 0)], 2.0_f64.sqrt(), 1e-12);
    }

    #[test]
    fn test_orthogonal_invariance_of_column_norms() {
        let mut ab = dmatrix![
            1.0, 2.0, 1.0;
            0.5, -1.0, 2.0;
            2.0, 0.0, -1.0
        ];
        let before: Vec<f64> = (0..3).map(|c| ab.column(c).norm()).collect();
        householder_staircase(&mut ab, &[3, 3, 3], 2);
        // Pivoted columns keep their norms under an orthogonal transform.
        for (c, b) in before.iter().enumerate().take(2) {
            assert_approx_eq(ab.column(c).norm(), *b, 1e-10);
        }
    }
}
