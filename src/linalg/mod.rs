//! Dense kernels shared by the Gaussian linear layer: the block matrix
//! storage, the staircase Householder QR, and rank-revealing Cholesky.

pub mod block_matrix;
pub mod cholesky;
pub mod householder;

pub use block_matrix::VerticalBlockMatrix;
pub use cholesky::cholesky_careful;
pub use householder::householder_staircase;
