//! The linearized Gaussian factor `A * x - b ~ 0`.
//!
//! A [`JacobianFactor`] owns its key list, an augmented block matrix
//! `[A | b]` (one column block per variable plus the width-1 right-hand
//! side), a per-row first-nonzero-block index, and a diagonal noise model.
//! The per-row indices together with ascending key order define a staircase
//! sparsity pattern that the QR factorization inside [`eliminate`] exploits.
//!
//! The two structural operations are [`combine`], which merges a set of
//! factors over the union of their variables into one joint factor, and
//! [`eliminate`], which triangularizes the joint factor in place, emits one
//! Gaussian conditional per eliminated frontal variable, and rewrites the
//! factor as the trailing factor over the remaining variables.
//!
//! [`combine`]: JacobianFactor::combine
//! [`eliminate`]: JacobianFactor::eliminate

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use nalgebra::{DMatrix, DMatrixView, DVector};
use tracing::debug;

use crate::error::{GaussError, GaussResult};
use crate::linalg::{cholesky_careful, VerticalBlockMatrix};
use crate::linear::conditional::{GaussianBayesNet, GaussianConditional};
use crate::linear::hessian_factor::HessianFactor;
use crate::linear::noise_model::DiagonalNoise;
use crate::linear::permutation::Permutation;
use crate::linear::variable_slots::VariableSlots;
use crate::linear::vector_values::VectorValues;
use crate::linear::Key;

#[derive(Debug, Clone)]
pub struct JacobianFactor {
    /// Involved variables, one per column block of `ab`.
    keys: Vec<Key>,
    /// The augmented matrix `[A | b]`.
    ab: VerticalBlockMatrix,
    /// For each row, the smallest key-block index that may hold a nonzero.
    first_nonzero_blocks: Vec<usize>,
    model: DiagonalNoise,
}

/// Row provenance used while sorting the rows of a joint factor.
struct RowSource {
    first_nonzero_var: Key,
    factor: usize,
    row: usize,
}

impl JacobianFactor {
    /// A factor with no keys and no rows.
    pub fn empty() -> Self {
        JacobianFactor {
            keys: Vec::new(),
            ab: VerticalBlockMatrix::empty(),
            first_nonzero_blocks: Vec::new(),
            model: DiagonalNoise::unit(0),
        }
    }

    /// A keyless factor holding only a right-hand side. Carries a unit model
    /// of matching dimension.
    pub fn from_b(b: DVector<f64>) -> GaussResult<Self> {
        let m = b.len();
        let mut ab = VerticalBlockMatrix::from_dims(&[1], m);
        ab.block_mut(0).copy_from(&b);
        let factor = JacobianFactor {
            keys: Vec::new(),
            ab,
            first_nonzero_blocks: vec![0; m],
            model: DiagonalNoise::unit(m),
        };
        factor.assert_invariants()?;
        Ok(factor)
    }

    /// An n-ary factor from `(key, A_j)` terms. Keys are stored in the given
    /// order; no sparsity is assumed, so every row starts at block 0.
    pub fn new(
        terms: &[(Key, DMatrix<f64>)],
        b: &DVector<f64>,
        model: DiagonalNoise,
    ) -> GaussResult<Self> {
        let m = b.len();
        if model.dim() != m {
            return Err(GaussError::DimensionMismatch(format!(
                "noise model of dimension {} for a factor with {} rows",
                model.dim(),
                m
            )));
        }
        let mut dims = Vec::with_capacity(terms.len() + 1);
        for (key, a) in terms {
            if a.nrows() != m {
                return Err(GaussError::DimensionMismatch(format!(
                    "matrix for variable {} has {} rows, expected {}",
                    key,
                    a.nrows(),
                    m
                )));
            }
            dims.push(a.ncols());
        }
        dims.push(1);

        let mut ab = VerticalBlockMatrix::from_dims(&dims, m);
        for (j, (_, a)) in terms.iter().enumerate() {
            ab.block_mut(j).copy_from(a);
        }
        ab.block_mut(terms.len()).copy_from(b);

        let factor = JacobianFactor {
            keys: terms.iter().map(|(key, _)| *key).collect(),
            ab,
            first_nonzero_blocks: vec![0; m],
            model,
        };
        factor.assert_invariants()?;
        Ok(factor)
    }

    pub fn unary(
        i1: Key,
        a1: DMatrix<f64>,
        b: DVector<f64>,
        model: DiagonalNoise,
    ) -> GaussResult<Self> {
        Self::new(&[(i1, a1)], &b, model)
    }

    pub fn binary(
        i1: Key,
        a1: DMatrix<f64>,
        i2: Key,
        a2: DMatrix<f64>,
        b: DVector<f64>,
        model: DiagonalNoise,
    ) -> GaussResult<Self> {
        Self::new(&[(i1, a1), (i2, a2)], &b, model)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn ternary(
        i1: Key,
        a1: DMatrix<f64>,
        i2: Key,
        a2: DMatrix<f64>,
        i3: Key,
        a3: DMatrix<f64>,
        b: DVector<f64>,
        model: DiagonalNoise,
    ) -> GaussResult<Self> {
        Self::new(&[(i1, a1), (i2, a2), (i3, a3)], &b, model)
    }

    /// Reinterpret a conditional's `[R S d]` rows as a factor `[A | b]`.
    pub fn from_conditional(conditional: &GaussianConditional) -> GaussResult<Self> {
        let ab = conditional.rsd().clone();
        let m = ab.rows();
        let factor = JacobianFactor {
            keys: conditional.keys().to_vec(),
            ab,
            first_nonzero_blocks: vec![0; m],
            model: DiagonalNoise::mixed_sigmas(conditional.sigmas().clone())?,
        };
        factor.assert_invariants()?;
        Ok(factor)
    }

    /// Convert a Hessian-form factor by careful Cholesky of its information
    /// matrix. The resulting keys are sorted ascending with the blocks
    /// physically reordered to match.
    pub fn from_hessian(hessian: &HessianFactor) -> GaussResult<Self> {
        let mut ab = hessian.info().clone();
        let maxrank = cholesky_careful(ab.matrix_mut())?;
        {
            // Keep only the upper triangle of the square-root factor.
            let matrix = ab.matrix_mut();
            for j in 0..matrix.ncols() {
                for i in (j + 1)..matrix.nrows() {
                    matrix[(i, j)] = 0.0;
                }
            }
        }
        ab.set_row_end(maxrank);

        let mut factor = JacobianFactor {
            keys: hessian.keys().to_vec(),
            ab,
            first_nonzero_blocks: vec![0; maxrank],
            model: DiagonalNoise::unit(maxrank),
        };

        // Sort keys ascending: rename each key to its sorted position, let
        // the permutation move the blocks, then restore the original
        // identifiers in their new ascending order.
        let vars: BTreeSet<Key> = factor.keys.iter().copied().collect();
        if let Some(&max_var) = vars.iter().next_back() {
            let mut permutation = Permutation::identity(max_var + 1);
            for (j_new, &var) in vars.iter().enumerate() {
                permutation.set(var, j_new);
            }
            factor.permute_with_inverse(&permutation)?;
            for (j_new, &var) in vars.iter().enumerate() {
                factor.keys[j_new] = var;
            }
        }

        factor.assert_invariants()?;
        Ok(factor)
    }

    fn assert_invariants(&self) -> GaussResult<()> {
        debug_assert!(
            (self.keys.is_empty() && self.ab.rows() == 0 && self.ab.num_blocks() == 0)
                || self.keys.len() + 1 == self.ab.num_blocks()
        );
        debug_assert_eq!(self.first_nonzero_blocks.len(), self.ab.rows());
        debug_assert!(self
            .first_nonzero_blocks
            .iter()
            .all(|&block| block < self.ab.num_blocks()));
        debug_assert!(self
            .first_nonzero_blocks
            .windows(2)
            .all(|w| w[0] <= w[1]));
        debug_assert_eq!(self.model.dim(), self.ab.rows());

        if self.ab.num_blocks() > 0
            && self
                .ab
                .range(0, self.ab.num_blocks())
                .iter()
                .any(|v| v.is_nan())
        {
            return Err(GaussError::InvalidArgument(
                "JacobianFactor contains NaN matrix entries".to_string(),
            ));
        }
        Ok(())
    }

    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    /// Number of rows in the corresponding linear system.
    pub fn rows(&self) -> usize {
        self.ab.rows()
    }

    /// Number of columns, including the right-hand side.
    pub fn cols(&self) -> usize {
        self.ab.cols()
    }

    /// True when the factor contains no information (zero rows). A factor
    /// can be non-empty while involving no variables.
    pub fn is_empty(&self) -> bool {
        self.ab.rows() == 0
    }

    /// Dimension of the variable in slot `pos`.
    pub fn get_dim(&self, pos: usize) -> usize {
        self.ab.block_cols(pos)
    }

    pub fn model(&self) -> &DiagonalNoise {
        &self.model
    }

    pub fn first_nonzero_blocks(&self) -> &[usize] {
        &self.first_nonzero_blocks
    }

    /// The `A` block for the variable in slot `pos`.
    pub fn a_block(&self, pos: usize) -> DMatrixView<'_, f64> {
        self.ab.block(pos)
    }

    /// Owned copy of the right-hand side.
    pub fn b(&self) -> DVector<f64> {
        if self.ab.num_blocks() == 0 {
            return DVector::zeros(0);
        }
        self.ab.column(self.keys.len(), 0)
    }

    /// `A * x - b`, accumulated blockwise.
    pub fn unweighted_error(&self, x: &VectorValues) -> GaussResult<DVector<f64>> {
        let mut e = -self.b();
        if self.is_empty() {
            return Ok(e);
        }
        for (pos, &key) in self.keys.iter().enumerate() {
            e += self.ab.block(pos) * x.get(key)?;
        }
        Ok(e)
    }

    /// `(A * x - b) / sigma`.
    pub fn error_vector(&self, x: &VectorValues) -> GaussResult<DVector<f64>> {
        Ok(self.model.whiten(&self.unweighted_error(x)?))
    }

    /// `0.5 * |(A * x - b) / sigma|^2`, zero for an empty factor.
    pub fn error(&self, x: &VectorValues) -> GaussResult<f64> {
        if self.is_empty() {
            return Ok(0.0);
        }
        Ok(0.5 * self.error_vector(x)?.norm_squared())
    }

    /// Whitened `A * x`. Note this does not subtract `b`.
    pub fn multiply(&self, x: &VectorValues) -> GaussResult<DVector<f64>> {
        let mut ax = DVector::zeros(self.rows());
        if self.is_empty() {
            return Ok(ax);
        }
        for (pos, &key) in self.keys.iter().enumerate() {
            ax += self.ab.block(pos) * x.get(key)?;
        }
        Ok(self.model.whiten(&ax))
    }

    /// `x[key_j] += A_j' * alpha * whiten(e)` for every slot `j`.
    pub fn transpose_multiply_add(
        &self,
        alpha: f64,
        e: &DVector<f64>,
        x: &mut VectorValues,
    ) -> GaussResult<()> {
        let we = self.model.whiten(e) * alpha;
        for (pos, &key) in self.keys.iter().enumerate() {
            let contribution = self.ab.block(pos).tr_mul(&we);
            *x.get_mut(key)? += contribution;
        }
        Ok(())
    }

    /// Dense `(A, b)`, whitened when `weight` is set.
    pub fn matrix(&self, weight: bool) -> (DMatrix<f64>, DVector<f64>) {
        let mut a = self.ab.range(0, self.keys.len()).clone_owned();
        let mut b = self.b();
        if weight {
            self.model.whiten_system(&mut a, &mut b);
        }
        (a, b)
    }

    /// Dense augmented `[A | b]`, whitened when `weight` is set.
    pub fn matrix_augmented(&self, weight: bool) -> DMatrix<f64> {
        if self.ab.num_blocks() == 0 {
            return DMatrix::zeros(0, 0);
        }
        let mut ab = self.ab.range(0, self.ab.num_blocks()).clone_owned();
        if weight {
            self.model.whiten_in_place(&mut ab);
        }
        ab
    }

    /// Triplets `(row, col, value)` of the whitened `A`, with 1-based rows
    /// and columns laid out by `column_indices`. Zero entries are omitted;
    /// constraint rows pass through unscaled.
    pub fn sparse(
        &self,
        column_indices: &BTreeMap<Key, usize>,
    ) -> GaussResult<(Vec<usize>, Vec<usize>, Vec<f64>)> {
        let mut rows = Vec::new();
        let mut cols = Vec::new();
        let mut values = Vec::new();
        for (pos, &key) in self.keys.iter().enumerate() {
            let a = self.ab.block(pos);
            let column_start = *column_indices
                .get(&key)
                .ok_or(GaussError::InvalidKey(key))?;
            for i in 0..a.nrows() {
                let inv = self.model.invsigma(i);
                for j in 0..a.ncols() {
                    let value = a[(i, j)];
                    if value != 0.0 {
                        rows.push(i + 1);
                        cols.push(j + column_start);
                        values.push(value * inv);
                    }
                }
            }
        }
        Ok((rows, cols, values))
    }

    /// A copy with sigma folded into `[A | b]` and a unit model.
    pub fn whiten(&self) -> GaussResult<Self> {
        let mut result = self.clone();
        let num_blocks = result.ab.num_blocks();
        if num_blocks > 0 {
            let mut view = result.ab.range_mut(0, num_blocks);
            for i in 0..view.nrows() {
                let inv = result.model.invsigma(i);
                if inv != 1.0 {
                    let mut row = view.row_mut(i);
                    row *= inv;
                }
            }
        }
        result.model = DiagonalNoise::unit(result.rows());
        result.assert_invariants()?;
        Ok(result)
    }

    /// Structural comparison over keys and `[A | b]`, treating a row and its
    /// negation as equal. The noise model is deliberately ignored, so two
    /// factors with different sigmas can compare equal.
    pub fn equals(&self, other: &JacobianFactor, tol: f64) -> bool {
        if self.is_empty() {
            return other.is_empty();
        }
        if self.keys != other.keys
            || self.ab.rows() != other.ab.rows()
            || self.ab.cols() != other.ab.cols()
        {
            return false;
        }
        let ab1 = self.ab.range(0, self.ab.num_blocks());
        let ab2 = other.ab.range(0, other.ab.num_blocks());
        for row in 0..ab1.nrows() {
            let r1 = ab1.row(row);
            let r2 = ab2.row(row);
            let same = r1.iter().zip(r2.iter()).all(|(a, b)| (a - b).abs() <= tol);
            let flipped = r1.iter().zip(r2.iter()).all(|(a, b)| (a + b).abs() <= tol);
            if !same && !flipped {
                return false;
            }
        }
        true
    }

    /// Rename every key `k` to `inverse_permutation[k]`, physically
    /// reordering the slots so keys end up ascending. The staircase is
    /// invalidated, so `first_nonzero_blocks` resets to 0.
    pub fn permute_with_inverse(
        &mut self,
        inverse_permutation: &Permutation,
    ) -> GaussResult<()> {
        if self.ab.num_blocks() == 0 {
            return Ok(());
        }

        // New key -> old slot; the map orders the new keys ascending.
        let mut source_slots: BTreeMap<Key, usize> = BTreeMap::new();
        for (j, &key) in self.keys.iter().enumerate() {
            source_slots.insert(inverse_permutation[key], j);
        }
        debug_assert_eq!(source_slots.len(), self.keys.len());

        let num_keys = self.keys.len();
        let mut dims: Vec<usize> = source_slots
            .values()
            .map(|&old_slot| self.ab.block_cols(old_slot))
            .collect();
        dims.push(1);

        let mut new_ab = VerticalBlockMatrix::from_dims(&dims, self.ab.rows());
        let mut new_keys = Vec::with_capacity(num_keys);
        for (j, (&new_key, &old_slot)) in source_slots.iter().enumerate() {
            new_keys.push(new_key);
            new_ab.block_mut(j).copy_from(&self.ab.block(old_slot));
        }
        new_ab
            .block_mut(num_keys)
            .copy_from(&self.ab.block(num_keys));

        self.keys = new_keys;
        self.ab = new_ab;
        for block in &mut self.first_nonzero_blocks {
            *block = 0;
        }
        self.assert_invariants()
    }

    /// Merge several factors over the union of their variables into one
    /// joint factor. Rows are sorted by their first nonzero variable, which
    /// fixes the staircase the subsequent QR exploits; blocks a source row
    /// does not reach are zero-filled.
    pub fn combine(
        factors: &[JacobianFactor],
        variable_slots: &VariableSlots,
    ) -> GaussResult<JacobianFactor> {
        // Dimension inventory. Every factor supplying a variable must agree
        // on its dimension, also in release builds.
        let num_vars = variable_slots.len();
        let mut var_dims = vec![usize::MAX; num_vars];
        let mut n = 0;
        for (joint_pos, (&var, slots)) in variable_slots.iter().enumerate() {
            debug_assert_eq!(slots.len(), factors.len());
            for (i, &slot) in slots.iter().enumerate() {
                if slot == VariableSlots::ABSENT {
                    continue;
                }
                let dim = factors[i].get_dim(slot);
                if var_dims[joint_pos] == usize::MAX {
                    var_dims[joint_pos] = dim;
                    n += dim;
                } else if var_dims[joint_pos] != dim {
                    return Err(GaussError::DimensionMismatch(format!(
                        "factors disagree on the dimension of variable {var}: {} vs {dim}",
                        var_dims[joint_pos]
                    )));
                }
            }
        }
        let m: usize = factors.iter().map(|f| f.rows()).sum();
        debug!(rows = m, cols = n, factors = factors.len(), "combining factors");

        // Row source table, sorted by first nonzero variable.
        let mut row_sources = Vec::with_capacity(m);
        let mut any_constrained = false;
        for (i, factor) in factors.iter().enumerate() {
            factor.assert_invariants()?;
            for row in 0..factor.rows() {
                let first_block = factor.first_nonzero_blocks[row];
                let first_nonzero_var = if first_block < factor.keys.len() {
                    factor.keys[first_block]
                } else {
                    // The row reaches no key block; sort it past every
                    // variable so it lands with the pure-rhs rows.
                    factor.keys.last().map_or(usize::MAX, |&last| last + 1)
                };
                row_sources.push(RowSource {
                    first_nonzero_var,
                    factor: i,
                    row,
                });
            }
            if factor.model.is_constrained() {
                any_constrained = true;
            }
        }
        debug_assert_eq!(row_sources.len(), m);
        row_sources.sort_by_key(|rs| rs.first_nonzero_var);

        // Allocate the joint factor; untouched blocks stay zero.
        let joint_keys: Vec<Key> = variable_slots.keys().copied().collect();
        let mut dims = var_dims;
        dims.push(1);
        let mut ab = VerticalBlockMatrix::from_dims(&dims, m);

        // Copy the blocks each output row reaches.
        for (joint_slot, (_, slots)) in variable_slots.iter().enumerate() {
            let mut dst = ab.block_mut(joint_slot);
            for (row, rs) in row_sources.iter().enumerate() {
                let source_slot = slots[rs.factor];
                if source_slot == VariableSlots::ABSENT {
                    continue;
                }
                let source = &factors[rs.factor];
                if source.first_nonzero_blocks[rs.row] <= source_slot {
                    let src = source.ab.block(source_slot);
                    dst.row_mut(row).copy_from(&src.row(rs.row));
                }
            }
        }

        // Right-hand side, sigmas, and the joint staircase.
        let source_bs: Vec<DVector<f64>> = factors.iter().map(|f| f.b()).collect();
        let mut b = DVector::zeros(m);
        let mut sigmas = DVector::zeros(m);
        let mut first_nonzero_blocks = vec![0usize; m];
        let mut first_nonzero_slot = 0usize;
        for (row, rs) in row_sources.iter().enumerate() {
            b[row] = source_bs[rs.factor][rs.row];
            sigmas[row] = factors[rs.factor].model.sigma(rs.row);
            while first_nonzero_slot < num_vars
                && rs.first_nonzero_var > joint_keys[first_nonzero_slot]
            {
                first_nonzero_slot += 1;
            }
            first_nonzero_blocks[row] = first_nonzero_slot;
        }
        ab.block_mut(num_vars).copy_from(&b);

        let model = if any_constrained {
            DiagonalNoise::mixed_sigmas(sigmas)?
        } else {
            DiagonalNoise::from_sigmas(sigmas)?
        };

        let combined = JacobianFactor {
            keys: joint_keys,
            ab,
            first_nonzero_blocks,
            model,
        };
        combined.assert_invariants()?;
        Ok(combined)
    }

    /// Eliminate the first `nr_frontals` variables by in-place staircase QR.
    ///
    /// Emits one conditional per frontal variable and rewrites this factor
    /// as the trailing factor over the remaining variables. Fails with
    /// [`GaussError::Singular`] when the post-QR rank falls short of the
    /// frontal dimension; the factor should then be discarded.
    pub fn eliminate(&mut self, nr_frontals: usize) -> GaussResult<GaussianBayesNet> {
        if !self.ab.is_full_window() {
            return Err(GaussError::InvalidArgument(
                "eliminate requires a factor with a full row window".to_string(),
            ));
        }
        if nr_frontals > self.keys.len() {
            return Err(GaussError::InvalidArgument(format!(
                "cannot eliminate {} frontal variables from a factor over {}",
                nr_frontals,
                self.keys.len()
            )));
        }
        self.assert_invariants()?;
        if self.ab.num_blocks() == 0 {
            return Ok(GaussianBayesNet::new());
        }
        debug!(nr_frontals, rows = self.rows(), "eliminating frontal variables");

        let m = self.rows();
        let total_cols = self.ab.cols();

        // Translate the per-row first nonzero blocks into a per-column first
        // structurally zero row. The rhs column is always full height.
        let mut first_zero_rows = vec![0usize; total_cols];
        {
            let mut last_nonzero_row = 0usize;
            let mut col = 0usize;
            for var in 0..self.keys.len() {
                while last_nonzero_row < m && self.first_nonzero_blocks[last_nonzero_row] <= var {
                    last_nonzero_row += 1;
                }
                for _ in 0..self.ab.block_cols(var) {
                    first_zero_rows[col] = last_nonzero_row;
                    col += 1;
                }
            }
            debug_assert_eq!(col + 1, total_cols);
            first_zero_rows[col] = m;
        }
        #[cfg(debug_assertions)]
        for col in 0..total_cols {
            if col > 0 {
                debug_assert!(first_zero_rows[col] >= first_zero_rows[col - 1]);
            }
            debug_assert!(first_zero_rows[col] <= m);
        }

        let frontal_dim = self.ab.offset(nr_frontals);

        let new_model = self
            .model
            .qr_column_wise(self.ab.matrix_mut(), &first_zero_rows)?;
        let rank = new_model.dim();

        // Zero the lower-left triangle left behind by the reflectors.
        {
            let matrix = self.ab.matrix_mut();
            for j in 0..matrix.ncols() {
                for i in (j + 1)..rank {
                    matrix[(i, j)] = 0.0;
                }
            }
        }

        if rank < frontal_dim {
            return Err(GaussError::Singular { key: self.keys[0] });
        }

        // Peel one conditional per frontal variable off the top of the
        // matrix by shrinking the window.
        let mut conditionals = GaussianBayesNet::new();
        for j in 0..nr_frontals {
            let var_dim = self.ab.block_cols(0);
            let row_start = self.ab.row_start();
            self.ab.set_row_end(row_start + var_dim);
            let sigmas = new_model.sigmas().rows(row_start, var_dim).clone_owned();
            let conditional = GaussianConditional::new(
                self.keys[j..].to_vec(),
                1,
                self.ab.window_copy(),
                sigmas,
            )?;
            conditionals.push_back(conditional);
            self.ab.set_row_start(row_start + var_dim);
            self.ab.set_first_block(self.ab.first_block() + 1);
        }

        // The lower-right block is the trailing factor.
        self.ab.set_row_end(rank);
        self.keys.drain(..nr_frontals);
        let trailing_sigmas = new_model
            .sigmas()
            .rows(frontal_dim, rank - frontal_dim)
            .clone_owned();
        self.model = if new_model.is_constrained() {
            DiagonalNoise::mixed_sigmas(trailing_sigmas)?
        } else {
            DiagonalNoise::from_sigmas(trailing_sigmas)?
        };
        debug_assert!(self.ab.rows() <= self.ab.cols().saturating_sub(1));

        // The trailing factor is in echelon form, so each row's first
        // nonzero block follows directly from the column offsets.
        self.first_nonzero_blocks.resize(self.rows(), 0);
        let mut varpos = 0usize;
        for row in 0..self.rows() {
            while varpos < self.keys.len() && self.ab.offset(varpos + 1) <= row {
                varpos += 1;
            }
            self.first_nonzero_blocks[row] = varpos;
        }

        self.assert_invariants()?;
        Ok(conditionals)
    }

    /// Eliminate just the first variable, returning its conditional.
    pub fn eliminate_first(&mut self) -> GaussResult<GaussianConditional> {
        let conditionals = self.eliminate(1)?;
        Ok(conditionals
            .into_iter()
            .next()
            .expect("eliminate(1) emits exactly one conditional"))
    }

    /// Combine several factors and eliminate the first `nr_frontals`
    /// variables of the joint factor.
    pub fn combine_and_eliminate(
        factors: &[JacobianFactor],
        nr_frontals: usize,
    ) -> GaussResult<(GaussianBayesNet, JacobianFactor)> {
        let variable_slots = VariableSlots::new(factors);
        let mut joint = Self::combine(factors, &variable_slots)?;
        let conditionals = joint.eliminate(nr_frontals)?;
        Ok((conditionals, joint))
    }
}
