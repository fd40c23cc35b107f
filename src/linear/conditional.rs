//! Gaussian conditionals emitted by elimination, and the Bayes net that
//! collects them.
//!
//! A conditional is a factor in upper-triangular form
//! `R * x_F = d - S * x_S`, usable as a forward solver for its frontal
//! variables once the separator is known. Conditionals own a copy of the
//! `[R S d]` slice they were cut from, so they stay valid after the parent
//! factor is mutated or dropped.

use nalgebra::{DMatrixView, DVector};

use crate::error::{GaussError, GaussResult};
use crate::linalg::VerticalBlockMatrix;
use crate::linear::vector_values::VectorValues;
use crate::linear::Key;

#[derive(Debug, Clone, PartialEq)]
pub struct GaussianConditional {
    /// Frontal variables first, then the separator, ascending within each.
    keys: Vec<Key>,
    nr_frontals: usize,
    /// `[R S d]` with a trailing width-1 block for `d`.
    rsd: VerticalBlockMatrix,
    sigmas: DVector<f64>,
}

impl GaussianConditional {
    pub fn new(
        keys: Vec<Key>,
        nr_frontals: usize,
        rsd: VerticalBlockMatrix,
        sigmas: DVector<f64>,
    ) -> GaussResult<Self> {
        if keys.is_empty() || nr_frontals == 0 || nr_frontals > keys.len() {
            return Err(GaussError::InvalidArgument(
                "conditional requires at least one frontal variable".to_string(),
            ));
        }
        if rsd.num_blocks() != keys.len() + 1 {
            return Err(GaussError::DimensionMismatch(format!(
                "conditional over {} variables needs {} blocks, got {}",
                keys.len(),
                keys.len() + 1,
                rsd.num_blocks()
            )));
        }
        let frontal_dim: usize = (0..nr_frontals).map(|j| rsd.block_cols(j)).sum();
        if rsd.rows() != frontal_dim || sigmas.len() != rsd.rows() {
            return Err(GaussError::DimensionMismatch(format!(
                "conditional with frontal dimension {} has {} rows and {} sigmas",
                frontal_dim,
                rsd.rows(),
                sigmas.len()
            )));
        }
        Ok(GaussianConditional {
            keys,
            nr_frontals,
            rsd,
            sigmas,
        })
    }

    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    /// The first frontal variable.
    pub fn first_key(&self) -> Key {
        self.keys[0]
    }

    pub fn nr_frontals(&self) -> usize {
        self.nr_frontals
    }

    /// Row count, equal to the total frontal dimension.
    pub fn dim(&self) -> usize {
        self.rsd.rows()
    }

    pub fn sigmas(&self) -> &DVector<f64> {
        &self.sigmas
    }

    pub(crate) fn rsd(&self) -> &VerticalBlockMatrix {
        &self.rsd
    }

    /// The square upper-triangular `R` over the frontal variables.
    pub fn r_block(&self) -> DMatrixView<'_, f64> {
        self.rsd.range(0, self.nr_frontals)
    }

    /// The separator block `S` (zero width when there is no separator).
    pub fn s_block(&self) -> DMatrixView<'_, f64> {
        self.rsd.range(self.nr_frontals, self.keys.len())
    }

    pub fn d(&self) -> DVector<f64> {
        self.rsd.column(self.keys.len(), 0)
    }

    /// Forward-solve `x_F = R^-1 * (d - S * x_S)`, writing the frontal
    /// variables into `x`. The separator entries of `x` must already hold
    /// their solutions.
    pub fn solve_in_place(&self, x: &mut VectorValues) -> GaussResult<()> {
        let mut rhs = self.d();
        for pos in self.nr_frontals..self.keys.len() {
            rhs -= self.rsd.block(pos) * x.get(self.keys[pos])?;
        }
        let solution = self
            .r_block()
            .solve_upper_triangular(&rhs)
            .ok_or(GaussError::Singular { key: self.keys[0] })?;
        let mut offset = 0;
        for pos in 0..self.nr_frontals {
            let d = self.rsd.block_cols(pos);
            x.get_mut(self.keys[pos])?
                .copy_from(&solution.rows(offset, d));
            offset += d;
        }
        Ok(())
    }
}

/// Conditionals collected from elimination, in elimination order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GaussianBayesNet {
    conditionals: Vec<GaussianConditional>,
}

impl GaussianBayesNet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_back(&mut self, conditional: GaussianConditional) {
        self.conditionals.push(conditional);
    }

    pub fn len(&self) -> usize {
        self.conditionals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conditionals.is_empty()
    }

    pub fn get(&self, i: usize) -> Option<&GaussianConditional> {
        self.conditionals.get(i)
    }

    pub fn iter(&self) -> impl Iterator<Item = &GaussianConditional> {
        self.conditionals.iter()
    }

    /// Back-substitute through the net in reverse elimination order. The
    /// separator of the last conditional (if any) must already be solved in
    /// `x`.
    pub fn solve_in_place(&self, x: &mut VectorValues) -> GaussResult<()> {
        for conditional in self.conditionals.iter().rev() {
            conditional.solve_in_place(x)?;
        }
        Ok(())
    }
}

impl IntoIterator for GaussianBayesNet {
    type Item = GaussianConditional;
    type IntoIter = std::vec::IntoIter<GaussianConditional>;

    fn into_iter(self) -> Self::IntoIter {
        self.conditionals.into_iter()
    }
}
