//! Values for vector-valued variables, indexed by variable key.

use nalgebra::DVector;

use crate::error::{GaussError, GaussResult};
use crate::linear::Key;

/// A dense mapping from variable index to a real vector of that variable's
/// dimension. Used as the input and output of all factor arithmetic.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VectorValues {
    values: Vec<DVector<f64>>,
}

impl VectorValues {
    /// Zero vectors with the given per-variable dimensions.
    pub fn zeros(dims: &[usize]) -> Self {
        VectorValues {
            values: dims.iter().map(|&d| DVector::zeros(d)).collect(),
        }
    }

    pub fn from_vecs(values: Vec<DVector<f64>>) -> Self {
        VectorValues { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Total dimension over all variables.
    pub fn dim(&self) -> usize {
        self.values.iter().map(|v| v.len()).sum()
    }

    pub fn get(&self, key: Key) -> GaussResult<&DVector<f64>> {
        self.values.get(key).ok_or(GaussError::InvalidKey(key))
    }

    pub fn get_mut(&mut self, key: Key) -> GaussResult<&mut DVector<f64>> {
        self.values.get_mut(key).ok_or(GaussError::InvalidKey(key))
    }

    pub fn push(&mut self, v: DVector<f64>) {
        self.values.push(v);
    }

    /// A zeroed copy with the same structure.
    pub fn zero_like(&self) -> Self {
        VectorValues {
            values: self.values.iter().map(|v| DVector::zeros(v.len())).collect(),
        }
    }

    pub fn make_zero(&mut self) {
        for v in &mut self.values {
            v.fill(0.0);
        }
    }

    pub fn same_structure(&self, other: &Self) -> bool {
        self.values.len() == other.values.len()
            && self
                .values
                .iter()
                .zip(&other.values)
                .all(|(a, b)| a.len() == b.len())
    }

    /// `self += alpha * x`.
    pub fn axpy(&mut self, alpha: f64, x: &Self) -> GaussResult<()> {
        if !self.same_structure(x) {
            return Err(GaussError::DimensionMismatch(
                "axpy requires identically structured values".to_string(),
            ));
        }
        for (a, b) in self.values.iter_mut().zip(&x.values) {
            a.axpy(alpha, b, 1.0);
        }
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &DVector<f64>> {
        self.values.iter()
    }
}

impl std::ops::Index<Key> for VectorValues {
    type Output = DVector<f64>;

    fn index(&self, key: Key) -> &Self::Output {
        &self.values[key]
    }
}

impl std::ops::IndexMut<Key> for VectorValues {
    fn index_mut(&mut self, key: Key) -> &mut Self::Output {
        &mut self.values[key]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::dvector;

    #[test]
    fn test_zeros_and_dim() {
        let x = VectorValues::zeros(&[2, 3]);
        assert_eq!(x.len(), 2);
        assert_eq!(x.dim(), 5);
        assert_eq!(x[1], DVector::zeros(3));
    }

    #[test]
    fn test_get_rejects_unknown_key() {
        let x = VectorValues::zeros(&[2]);
        assert_eq!(x.get(1), Err(GaussError::InvalidKey(1)));
    }

    #[test]
    fn test_axpy() {
        let mut x = VectorValues::from_vecs(vec![dvector![1.0, 2.0]]);
        let y = VectorValues::from_vecs(vec![dvector![10.0, 20.0]]);
        x.axpy(0.5, &y).unwrap();
        assert_eq!(x[0], dvector![6.0, 12.0]);

        let bad = VectorValues::zeros(&[3]);
        assert!(x.axpy(1.0, &bad).is_err());
    }

    #[test]
    fn test_zero_like_and_make_zero() {
        let mut x = VectorValues::from_vecs(vec![dvector![1.0], dvector![2.0, 3.0]]);
        let z = x.zero_like();
        assert!(z.same_structure(&x));
        assert_eq!(z.dim(), 3);
        x.make_zero();
        assert_eq!(x, z);
    }
}
