//! Pointwise operations over a list of Jacobian factors, plus assembly of
//! the whitened joint system as a sparse matrix.

use std::collections::BTreeMap;

use faer::sparse::{SparseColMat, Triplet};
use faer::Mat;
use nalgebra::DVector;
use tracing::debug;

use crate::error::{GaussError, GaussResult};
use crate::linear::jacobian_factor::JacobianFactor;
use crate::linear::vector_values::VectorValues;
use crate::linear::Key;

/// Per-factor residual vectors, one entry per factor.
pub type Errors = Vec<DVector<f64>>;

/// Whitened `A_i * x` per factor.
pub fn multiply_factors(factors: &[JacobianFactor], x: &VectorValues) -> GaussResult<Errors> {
    factors.iter().map(|f| f.multiply(x)).collect()
}

/// In-place version of [`multiply_factors`] that overwrites `e`.
pub fn multiply_in_place(
    factors: &[JacobianFactor],
    x: &VectorValues,
    e: &mut Errors,
) -> GaussResult<()> {
    if e.len() != factors.len() {
        return Err(GaussError::DimensionMismatch(format!(
            "{} error vectors for {} factors",
            e.len(),
            factors.len()
        )));
    }
    for (ei, factor) in e.iter_mut().zip(factors) {
        *ei = factor.multiply(x)?;
    }
    Ok(())
}

/// `x += alpha * A' * whiten(e)`, accumulated factor by factor.
pub fn transpose_multiply_add(
    factors: &[JacobianFactor],
    alpha: f64,
    e: &Errors,
    x: &mut VectorValues,
) -> GaussResult<()> {
    if e.len() != factors.len() {
        return Err(GaussError::DimensionMismatch(format!(
            "{} error vectors for {} factors",
            e.len(),
            factors.len()
        )));
    }
    for (factor, ei) in factors.iter().zip(e) {
        factor.transpose_multiply_add(alpha, ei, x)?;
    }
    Ok(())
}

/// Gradient of `0.5 * |A * x - b|^2_Sigma` at `x`, as values over the same
/// variables.
pub fn gradient(factors: &[JacobianFactor], x: &VectorValues) -> GaussResult<VectorValues> {
    let mut g = x.zero_like();
    let mut e = Vec::with_capacity(factors.len());
    for factor in factors {
        e.push(factor.error_vector(x)?);
    }
    transpose_multiply_add(factors, 1.0, &e, &mut g)?;
    Ok(g)
}

/// Unwhitened per-factor residual `b_i - A_i * x`.
pub fn residual(factors: &[JacobianFactor], x: &VectorValues) -> GaussResult<Errors> {
    let ax = multiply(factors, x)?;
    Ok(factors
        .iter()
        .zip(ax)
        .map(|(factor, axi)| factor.b() - axi)
        .collect())
}

/// Unwhitened per-factor `A_i * x`.
pub fn multiply(factors: &[JacobianFactor], x: &VectorValues) -> GaussResult<Errors> {
    factors
        .iter()
        .map(|factor| {
            let mut axi = DVector::zeros(factor.rows());
            for (pos, &key) in factor.keys().iter().enumerate() {
                axi += factor.a_block(pos) * x.get(key)?;
            }
            Ok(axi)
        })
        .collect()
}

/// Unwhitened `x = A' * r`, overwriting `x`.
pub fn transpose_multiply(
    factors: &[JacobianFactor],
    r: &Errors,
    x: &mut VectorValues,
) -> GaussResult<()> {
    if r.len() != factors.len() {
        return Err(GaussError::DimensionMismatch(format!(
            "{} residual vectors for {} factors",
            r.len(),
            factors.len()
        )));
    }
    x.make_zero();
    for (factor, ri) in factors.iter().zip(r) {
        for (pos, &key) in factor.keys().iter().enumerate() {
            *x.get_mut(key)? += factor.a_block(pos).tr_mul(ri);
        }
    }
    Ok(())
}

/// Column layout of the joint system: first column index of every variable,
/// plus the total column count. Fails when factors disagree on a variable's
/// dimension.
pub fn column_layout(factors: &[JacobianFactor]) -> GaussResult<(BTreeMap<Key, usize>, usize)> {
    let mut dims: BTreeMap<Key, usize> = BTreeMap::new();
    for factor in factors {
        for (pos, &key) in factor.keys().iter().enumerate() {
            let dim = factor.get_dim(pos);
            match dims.get(&key) {
                Some(&previous) if previous != dim => {
                    return Err(GaussError::DimensionMismatch(format!(
                        "factors disagree on the dimension of variable {key}: {previous} vs {dim}"
                    )));
                }
                _ => {
                    dims.insert(key, dim);
                }
            }
        }
    }
    let mut offsets = BTreeMap::new();
    let mut n = 0;
    for (&key, &dim) in &dims {
        offsets.insert(key, n);
        n += dim;
    }
    Ok((offsets, n))
}

/// Assemble the whitened joint system `(A, b)` as a sparse column-major
/// matrix with a dense right-hand side, ready for a sparse least-squares
/// backend. Factors are stacked in order; columns follow ascending variable
/// index.
pub fn sparse_jacobian(
    factors: &[JacobianFactor],
) -> GaussResult<(SparseColMat<usize, f64>, Mat<f64>)> {
    let (offsets, n) = column_layout(factors)?;
    let m: usize = factors.iter().map(|f| f.rows()).sum();
    debug!(rows = m, cols = n, factors = factors.len(), "assembling sparse jacobian");

    let mut triplets: Vec<Triplet<usize, usize, f64>> = Vec::new();
    let mut rhs = Mat::<f64>::zeros(m, 1);
    let mut row_offset = 0;
    for factor in factors {
        for (pos, &key) in factor.keys().iter().enumerate() {
            let a = factor.a_block(pos);
            let column_offset = offsets[&key];
            for i in 0..a.nrows() {
                let inv = factor.model().invsigma(i);
                for j in 0..a.ncols() {
                    let value = a[(i, j)];
                    if value != 0.0 {
                        triplets.push(Triplet::new(row_offset + i, column_offset + j, value * inv));
                    }
                }
            }
        }
        let b = factor.b();
        for i in 0..factor.rows() {
            rhs[(row_offset + i, 0)] = b[i] * factor.model().invsigma(i);
        }
        row_offset += factor.rows();
    }

    let jacobian = SparseColMat::try_new_from_triplets(m, n, &triplets)
        .map_err(|e| GaussError::InvalidArgument(format!("sparse assembly failed: {e:?}")))?;
    Ok((jacobian, rhs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linear::noise_model::DiagonalNoise;
    use nalgebra::{dmatrix, dvector};

    fn assert_approx_eq(a: f64, b: f64, eps: f64) {
        assert!((a - b).abs() < eps, "{a} vs {b}");
    }

    /// A two-variable chain: prior on x0 and an odometry-style constraint
    /// x1 - x0 = 1.
    fn chain() -> Vec<JacobianFactor> {
        vec![
            JacobianFactor::unary(0, dmatrix![1.0], dvector![0.0], DiagonalNoise::unit(1))
                .unwrap(),
            JacobianFactor::binary(
                0,
                dmatrix![-1.0],
                1,
                dmatrix![1.0],
                dvector![1.0],
                DiagonalNoise::unit(1),
            )
            .unwrap(),
        ]
    }

    #[test]
    fn test_multiply_factors() {
        let factors = chain();
        let x = VectorValues::from_vecs(vec![dvector![2.0], dvector![5.0]]);
        let e = multiply_factors(&factors, &x).unwrap();
        assert_eq!(e, vec![dvector![2.0], dvector![3.0]]);

        let mut in_place = vec![DVector::zeros(1), DVector::zeros(1)];
        multiply_in_place(&factors, &x, &mut in_place).unwrap();
        assert_eq!(in_place, e);
    }

    #[test]
    fn test_gradient_vanishes_at_solution() {
        let factors = chain();
        let solution = VectorValues::from_vecs(vec![dvector![0.0], dvector![1.0]]);
        let g = gradient(&factors, &solution).unwrap();
        assert_approx_eq(g[0][0], 0.0, 1e-12);
        assert_approx_eq(g[1][0], 0.0, 1e-12);
    }

    #[test]
    fn test_gradient_away_from_solution() {
        let factors = chain();
        let x = VectorValues::from_vecs(vec![dvector![1.0], dvector![1.0]]);
        // residuals: x0 = 1 and (x1 - x0 - 1) = -1
        let g = gradient(&factors, &x).unwrap();
        assert_approx_eq(g[0][0], 2.0, 1e-12);
        assert_approx_eq(g[1][0], -1.0, 1e-12);
    }

    #[test]
    fn test_residual_and_transpose_multiply() {
        let factors = chain();
        let x = VectorValues::from_vecs(vec![dvector![2.0], dvector![5.0]]);
        let r = residual(&factors, &x).unwrap();
        assert_eq!(r, vec![dvector![-2.0], dvector![-2.0]]);

        let mut back = x.zero_like();
        transpose_multiply(&factors, &r, &mut back).unwrap();
        // A' * r with A0 column [1, -1], A1 column [0, 1]
        assert_approx_eq(back[0][0], 0.0, 1e-12);
        assert_approx_eq(back[1][0], -2.0, 1e-12);
    }

    #[test]
    fn test_column_layout() {
        let factors = vec![
            JacobianFactor::unary(
                3,
                dmatrix![1.0, 0.0; 0.0, 1.0],
                dvector![0.0, 0.0],
                DiagonalNoise::unit(2),
            )
            .unwrap(),
            JacobianFactor::unary(1, dmatrix![1.0], dvector![0.0], DiagonalNoise::unit(1))
                .unwrap(),
        ];
        let (offsets, n) = column_layout(&factors).unwrap();
        assert_eq!(n, 3);
        assert_eq!(offsets[&1], 0);
        assert_eq!(offsets[&3], 1);
    }

    #[test]
    fn test_sparse_jacobian_matches_dense() {
        let factors = vec![
            JacobianFactor::unary(
                0,
                dmatrix![2.0],
                dvector![4.0],
                DiagonalNoise::from_sigmas(dvector![2.0]).unwrap(),
            )
            .unwrap(),
            JacobianFactor::binary(
                0,
                dmatrix![-1.0],
                1,
                dmatrix![1.0],
                dvector![1.0],
                DiagonalNoise::unit(1),
            )
            .unwrap(),
        ];
        let (jacobian, rhs) = sparse_jacobian(&factors).unwrap();
        assert_eq!(jacobian.nrows(), 2);
        assert_eq!(jacobian.ncols(), 2);

        // Row 0 is the whitened prior: A = [1], b = 2.
        assert_eq!(jacobian.as_ref().get(0, 0), Some(&1.0));
        assert_eq!(jacobian.as_ref().get(0, 1), None);
        assert_eq!(jacobian.as_ref().get(1, 0), Some(&-1.0));
        assert_eq!(jacobian.as_ref().get(1, 1), Some(&1.0));
        assert_approx_eq(rhs[(0, 0)], 2.0, 1e-12);
        assert_approx_eq(rhs[(1, 0)], 1.0, 1e-12);
    }
}
