//! Gaussian factors in information (Hessian) form, and the tagged union of
//! the two Gaussian factor representations.

use nalgebra::{DMatrix, DVector};

use crate::error::{GaussError, GaussResult};
use crate::linalg::VerticalBlockMatrix;
use crate::linear::jacobian_factor::JacobianFactor;
use crate::linear::vector_values::VectorValues;
use crate::linear::Key;

/// A Gaussian factor stored as the symmetric augmented information matrix
/// `[Lambda eta; eta' c]`, blocked per variable with a trailing width-1
/// block. Convertible to Jacobian form by careful Cholesky.
#[derive(Debug, Clone, PartialEq)]
pub struct HessianFactor {
    keys: Vec<Key>,
    info: VerticalBlockMatrix,
}

impl HessianFactor {
    /// Wrap an augmented information matrix whose column blocks follow
    /// `dims` (per-variable dimensions, without the trailing 1).
    pub fn new(keys: Vec<Key>, dims: &[usize], info: DMatrix<f64>) -> GaussResult<Self> {
        if keys.len() != dims.len() {
            return Err(GaussError::DimensionMismatch(format!(
                "{} keys with {} dimensions",
                keys.len(),
                dims.len()
            )));
        }
        let total: usize = dims.iter().sum::<usize>() + 1;
        if info.nrows() != total || info.ncols() != total {
            return Err(GaussError::DimensionMismatch(format!(
                "augmented information matrix must be {total} x {total}, got {} x {}",
                info.nrows(),
                info.ncols()
            )));
        }
        if info.iter().any(|v| v.is_nan()) {
            return Err(GaussError::InvalidArgument(
                "HessianFactor contains NaN matrix entries".to_string(),
            ));
        }
        let mut block_dims = dims.to_vec();
        block_dims.push(1);
        Ok(HessianFactor {
            keys,
            info: VerticalBlockMatrix::from_matrix(&block_dims, info),
        })
    }

    /// Form `[A b]' * [A b]` from a whitened Jacobian factor.
    pub fn from_jacobian(factor: &JacobianFactor) -> GaussResult<Self> {
        let whitened = factor.matrix_augmented(true);
        let info = whitened.tr_mul(&whitened);
        let dims: Vec<usize> = (0..factor.keys().len()).map(|j| factor.get_dim(j)).collect();
        Self::new(factor.keys().to_vec(), &dims, info)
    }

    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    pub(crate) fn info(&self) -> &VerticalBlockMatrix {
        &self.info
    }

    /// Total variable dimension, excluding the augmented column.
    pub fn dim(&self) -> usize {
        self.info.cols() - 1
    }

    /// `0.5 * [x; -1]' * info * [x; -1]`, which matches the Jacobian error
    /// `0.5 * |whiten(A * x - b)|^2` when the factor came from one.
    pub fn error(&self, x: &VectorValues) -> GaussResult<f64> {
        let n = self.info.cols();
        let mut augmented = DVector::zeros(n);
        let mut offset = 0;
        for (pos, &key) in self.keys.iter().enumerate() {
            let d = self.info.block_cols(pos);
            let value = x.get(key)?;
            if value.len() != d {
                return Err(GaussError::DimensionMismatch(format!(
                    "value for variable {key} has dimension {}, expected {d}",
                    value.len()
                )));
            }
            augmented.rows_mut(offset, d).copy_from(value);
            offset += d;
        }
        augmented[n - 1] = -1.0;
        Ok(0.5 * augmented.dot(&(self.info.matrix() * &augmented)))
    }

    /// Elementwise comparison of the augmented information matrices.
    pub fn equals(&self, other: &HessianFactor, tol: f64) -> bool {
        self.keys == other.keys
            && self.info.cols() == other.info.cols()
            && self
                .info
                .matrix()
                .iter()
                .zip(other.info.matrix().iter())
                .all(|(a, b)| (a - b).abs() <= tol)
    }
}

/// The two interchangeable representations of a Gaussian factor.
#[derive(Debug, Clone)]
pub enum GaussianFactor {
    Jacobian(JacobianFactor),
    Hessian(HessianFactor),
}

impl GaussianFactor {
    pub fn keys(&self) -> &[Key] {
        match self {
            GaussianFactor::Jacobian(f) => f.keys(),
            GaussianFactor::Hessian(f) => f.keys(),
        }
    }

    pub fn error(&self, x: &VectorValues) -> GaussResult<f64> {
        match self {
            GaussianFactor::Jacobian(f) => f.error(x),
            GaussianFactor::Hessian(f) => f.error(x),
        }
    }

    /// Convert to Jacobian form, running careful Cholesky on a Hessian.
    pub fn into_jacobian(self) -> GaussResult<JacobianFactor> {
        match self {
            GaussianFactor::Jacobian(f) => Ok(f),
            GaussianFactor::Hessian(f) => JacobianFactor::from_hessian(&f),
        }
    }

    /// Comparison is representation-aware: factors of different tags are
    /// never equal, mirroring a failed downcast.
    pub fn equals(&self, other: &GaussianFactor, tol: f64) -> bool {
        match (self, other) {
            (GaussianFactor::Jacobian(a), GaussianFactor::Jacobian(b)) => a.equals(b, tol),
            (GaussianFactor::Hessian(a), GaussianFactor::Hessian(b)) => a.equals(b, tol),
            _ => false,
        }
    }
}

impl From<JacobianFactor> for GaussianFactor {
    fn from(factor: JacobianFactor) -> Self {
        GaussianFactor::Jacobian(factor)
    }
}

impl From<HessianFactor> for GaussianFactor {
    fn from(factor: HessianFactor) -> Self {
        GaussianFactor::Hessian(factor)
    }
}
