//! Diagonal Gaussian noise models.
//!
//! A [`DiagonalNoise`] carries one standard deviation per residual row.
//! Rows with `sigma == 0` are hard equality constraints and are preserved
//! exactly through whitening and QR. The model also owns the in-place QR
//! factorization used by elimination, because the noise model decides how
//! sigma is absorbed: unconstrained systems are pre-whitened and
//! triangularized with Householder reflections, constrained systems go
//! through a weighted pseudo-inverse elimination that keeps constraint rows
//! exact.

use nalgebra::{DMatrix, DVector};
use tracing::debug;

use crate::error::{GaussError, GaussResult};
use crate::linalg::householder_staircase;

const ZERO_TOL: f64 = 1e-9;
const PRECISION_TOL: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoiseKind {
    /// All sigmas are exactly one.
    Unit,
    /// All sigmas are strictly positive.
    Diagonal,
    /// At least one sigma is zero (a hard constraint row).
    Constrained,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiagonalNoise {
    sigmas: DVector<f64>,
    /// Per-row whitening factors; constraint rows pass through unscaled.
    invsigmas: DVector<f64>,
    kind: NoiseKind,
}

impl DiagonalNoise {
    /// Unit model of the given dimension.
    pub fn unit(dim: usize) -> Self {
        DiagonalNoise {
            sigmas: DVector::from_element(dim, 1.0),
            invsigmas: DVector::from_element(dim, 1.0),
            kind: NoiseKind::Unit,
        }
    }

    /// Model from strictly positive standard deviations.
    ///
    /// Collapses to [`NoiseKind::Unit`] when every sigma is one. Rejects
    /// sigma <= 0; use [`DiagonalNoise::mixed_sigmas`] for constrained rows.
    pub fn from_sigmas(sigmas: DVector<f64>) -> GaussResult<Self> {
        if sigmas.iter().any(|&s| s <= 0.0 || !s.is_finite()) {
            return Err(GaussError::InvalidArgument(
                "diagonal noise model requires sigma > 0".to_string(),
            ));
        }
        let kind = if sigmas.iter().all(|&s| s == 1.0) {
            NoiseKind::Unit
        } else {
            NoiseKind::Diagonal
        };
        let invsigmas = sigmas.map(|s| 1.0 / s);
        Ok(DiagonalNoise {
            sigmas,
            invsigmas,
            kind,
        })
    }

    /// Model from nonnegative standard deviations, where zero marks a hard
    /// constraint row. Collapses to a plain diagonal model when no row is
    /// constrained.
    pub fn mixed_sigmas(sigmas: DVector<f64>) -> GaussResult<Self> {
        if sigmas.iter().any(|&s| s < 0.0 || !s.is_finite()) {
            return Err(GaussError::InvalidArgument(
                "constrained noise model requires sigma >= 0".to_string(),
            ));
        }
        if sigmas.iter().all(|&s| s > 0.0) {
            return Self::from_sigmas(sigmas);
        }
        let invsigmas = sigmas.map(|s| if s == 0.0 { 1.0 } else { 1.0 / s });
        Ok(DiagonalNoise {
            sigmas,
            invsigmas,
            kind: NoiseKind::Constrained,
        })
    }

    pub fn dim(&self) -> usize {
        self.sigmas.len()
    }

    pub fn sigma(&self, i: usize) -> f64 {
        self.sigmas[i]
    }

    pub fn sigmas(&self) -> &DVector<f64> {
        &self.sigmas
    }

    /// Whitening factor for row `i`; 1 for constraint rows.
    pub fn invsigma(&self, i: usize) -> f64 {
        self.invsigmas[i]
    }

    pub fn kind(&self) -> NoiseKind {
        self.kind
    }

    pub fn is_constrained(&self) -> bool {
        self.kind == NoiseKind::Constrained
    }

    pub fn is_unit(&self) -> bool {
        self.kind == NoiseKind::Unit
    }

    /// Elementwise `v / sigma`; constraint rows pass through unscaled.
    pub fn whiten(&self, v: &DVector<f64>) -> DVector<f64> {
        debug_assert_eq!(v.len(), self.dim());
        if self.is_unit() {
            return v.clone();
        }
        v.component_mul(&self.invsigmas)
    }

    /// Scale each row of `m` by `1 / sigma[i]`.
    pub fn whiten_matrix(&self, m: &DMatrix<f64>) -> DMatrix<f64> {
        let mut out = m.clone();
        self.whiten_in_place(&mut out);
        out
    }

    pub fn whiten_in_place(&self, m: &mut DMatrix<f64>) {
        debug_assert_eq!(m.nrows(), self.dim());
        if self.is_unit() {
            return;
        }
        for i in 0..m.nrows() {
            let inv = self.invsigmas[i];
            if inv != 1.0 {
                let mut row = m.row_mut(i);
                row *= inv;
            }
        }
    }

    /// Whiten a whole `A x = b` system at once.
    pub fn whiten_system(&self, a: &mut DMatrix<f64>, b: &mut DVector<f64>) {
        debug_assert_eq!(b.len(), self.dim());
        self.whiten_in_place(a);
        if !self.is_unit() {
            *b = b.component_mul(&self.invsigmas);
        }
    }

    /// In-place QR of the augmented matrix `[A | b]`, restricted by the
    /// column staircase `first_zero_rows`, absorbing this noise model.
    ///
    /// Returns the noise model of the triangularized result, whose dimension
    /// is the effective rank: unit for ordinary QR, mixed sigmas when
    /// constraint rows survive. Rows at and beyond the rank are dead and may
    /// be dropped by the caller.
    pub fn qr_column_wise(
        &self,
        ab: &mut DMatrix<f64>,
        first_zero_rows: &[usize],
    ) -> GaussResult<DiagonalNoise> {
        let m = ab.nrows();
        if m == 0 {
            return Ok(Self::unit(0));
        }
        if self.dim() != m {
            return Err(GaussError::DimensionMismatch(format!(
                "noise model of dimension {} applied to a system with {} rows",
                self.dim(),
                m
            )));
        }
        debug_assert_eq!(first_zero_rows.len(), ab.ncols());
        let n = ab.ncols() - 1;

        if self.is_constrained() {
            return self.constrained_qr(ab, n);
        }

        self.whiten_in_place(ab);
        let rank = householder_staircase(ab, first_zero_rows, n);
        debug!(rows = m, cols = n, rank, "staircase QR");
        Ok(Self::unit(rank))
    }

    /// Column-by-column elimination with a weighted pseudo-inverse, used when
    /// some rows are exact constraints. A constraint row with support in the
    /// pivot column is taken as the pivot verbatim (output sigma 0);
    /// otherwise the pivot row is the weighted least-squares combination of
    /// the active rows (output sigma `1 / sqrt(precision)`).
    fn constrained_qr(&self, ab: &mut DMatrix<f64>, n: usize) -> GaussResult<DiagonalNoise> {
        let m = ab.nrows();
        let max_rank = m.min(n);
        let weights: Vec<f64> = self
            .sigmas
            .iter()
            .map(|&s| if s == 0.0 { f64::INFINITY } else { 1.0 / (s * s) })
            .collect();

        // Solved rows (pivot column, full row of [R | d], precision).
        let mut pivots: Vec<(usize, DVector<f64>, f64)> = Vec::with_capacity(max_rank);
        for j in 0..n {
            let a = ab.column(j).clone_owned();
            let (precision, pseudo) = weighted_pseudoinverse(&a, &weights);
            // No information on this column.
            if precision < PRECISION_TOL {
                continue;
            }

            let mut rd = DVector::zeros(n + 1);
            rd[j] = 1.0;
            for j2 in (j + 1)..=n {
                rd[j2] = pseudo.dot(&ab.column(j2));
            }
            pivots.push((j, rd, precision));
            if pivots.len() >= max_rank {
                break;
            }

            // Substitute the solved variable back out of the system.
            let rd = &pivots.last().unwrap().1;
            for j2 in j..=n {
                let r = rd[j2];
                if r != 0.0 {
                    for i in 0..m {
                        ab[(i, j2)] -= a[i] * r;
                    }
                }
            }
        }

        let rank = pivots.len();
        debug!(rows = m, cols = n, rank, "constrained QR");
        ab.fill(0.0);
        let mut sigmas = DVector::zeros(rank);
        let mut mixed = false;
        for (i, (j, rd, precision)) in pivots.iter().enumerate() {
            for j2 in *j..=n {
                ab[(i, j2)] = rd[j2];
            }
            if precision.is_infinite() {
                sigmas[i] = 0.0;
                mixed = true;
            } else {
                sigmas[i] = 1.0 / precision.sqrt();
            }
        }
        if mixed {
            Self::mixed_sigmas(sigmas)
        } else {
            Self::from_sigmas(sigmas)
        }
    }
}

/// Weighted pseudo-inverse of a column, `inv(a' W a) a' W` for diagonal `W`,
/// with infinite weights short-circuiting to an exact constraint pivot.
/// Returns the precision `a' W a` alongside the pseudo-inverse.
fn weighted_pseudoinverse(a: &DVector<f64>, weights: &[f64]) -> (f64, DVector<f64>) {
    let m = a.len();
    let mut pseudo = DVector::zeros(m);

    // A constraint row with support in this column becomes the pivot: the
    // row a(i)*x + S = b turns into x + S/a(i) = b/a(i), kept exact.
    for i in 0..m {
        if weights[i].is_infinite() && a[i].abs() > ZERO_TOL {
            pseudo[i] = 1.0 / a[i];
            return (f64::INFINITY, pseudo);
        }
    }

    let mut precision = 0.0;
    for i in 0..m {
        if a[i].abs() > ZERO_TOL && weights[i].is_finite() {
            precision += weights[i] * a[i] * a[i];
        }
    }
    if precision > PRECISION_TOL {
        for i in 0..m {
            if a[i].abs() > ZERO_TOL && weights[i].is_finite() {
                pseudo[i] = weights[i] * a[i] / precision;
            }
        }
    }
    (precision, pseudo)
}
