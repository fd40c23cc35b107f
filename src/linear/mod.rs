//! The Gaussian linear layer: factors, noise models, conditionals, and the
//! operations that connect them.

pub mod conditional;
pub mod graph;
pub mod hessian_factor;
pub mod jacobian_factor;
pub mod noise_model;
pub mod permutation;
pub mod variable_slots;
pub mod vector_values;

/// Variable index, drawn from a dense range `[0, V)`.
pub type Key = usize;

pub use conditional::{GaussianBayesNet, GaussianConditional};
pub use hessian_factor::{GaussianFactor, HessianFactor};
pub use jacobian_factor::JacobianFactor;
pub use noise_model::{DiagonalNoise, NoiseKind};
pub use permutation::Permutation;
pub use variable_slots::VariableSlots;
pub use vector_values::VectorValues;
