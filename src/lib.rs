//! # gauss-elim
//!
//! A Rust library for sparse Gaussian factor-graph elimination, the kernel
//! of sparse least-squares solvers and Bayesian inference on Gaussian
//! graphical models.
//!
//! ## Features
//!
//! - **Block Jacobian factors**: noisy linear constraints `A * x - b ~ 0`
//!   over vector-valued variables, stored as one augmented block matrix
//!   `[A | b]` with a diagonal noise model
//! - **Combine**: merge factors over the union of their variables into one
//!   joint factor with a staircase sparsity pattern
//! - **Eliminate**: in-place staircase QR that emits Gaussian conditionals
//!   and rewrites the joint factor as the trailing factor
//! - **Constrained rows**: sigma = 0 rows are hard equalities, preserved
//!   exactly through whitening and QR
//! - **Sparse export**: assemble the whitened joint system for the faer
//!   sparse least-squares backends
//!
//! ## Example
//!
//! ```
//! use gauss_elim::{DiagonalNoise, JacobianFactor, VectorValues};
//! use nalgebra::{dmatrix, dvector};
//!
//! // Two measurements of the same scalar variable.
//! let f1 = JacobianFactor::unary(0, dmatrix![1.0], dvector![1.0], DiagonalNoise::unit(1))?;
//! let f2 = JacobianFactor::unary(0, dmatrix![1.0], dvector![3.0], DiagonalNoise::unit(1))?;
//!
//! // Combine them and eliminate the variable.
//! let (conditionals, trailing) = JacobianFactor::combine_and_eliminate(&[f1, f2], 1)?;
//!
//! // Back-substitution gives the least-squares estimate.
//! let mut x = VectorValues::zeros(&[1]);
//! conditionals.solve_in_place(&mut x)?;
//! assert!((x[0][0] - 2.0).abs() < 1e-12);
//! assert!(trailing.is_empty());
//! # Ok::<(), gauss_elim::GaussError>(())
//! ```

pub mod error;
pub mod linalg;
pub mod linear;
pub mod logger;

pub use error::{GaussError, GaussResult};
pub use linalg::{cholesky_careful, VerticalBlockMatrix};
pub use linear::{
    DiagonalNoise, GaussianBayesNet, GaussianConditional, GaussianFactor, HessianFactor,
    JacobianFactor, Key, NoiseKind, Permutation, VariableSlots, VectorValues,
};
pub use logger::{init_logger, init_logger_with_level};
