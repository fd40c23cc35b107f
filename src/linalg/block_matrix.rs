//! Column-blocked dense matrix with a movable row window.
//!
//! A [`VerticalBlockMatrix`] owns one column-major matrix logically split
//! into contiguous column blocks (one block per variable plus a trailing
//! width-1 block for the right-hand side). On top of the fixed block
//! structure it carries a row window `[row_start, row_end)` and a
//! `first_block` index. All accessors are relative to the window, which lets
//! elimination peel conditionals off the top of the matrix without copying
//! or physically shrinking storage.

use nalgebra::{DMatrix, DMatrixView, DMatrixViewMut, DVector};

#[derive(Debug, Clone, PartialEq)]
pub struct VerticalBlockMatrix {
    matrix: DMatrix<f64>,
    /// Cumulative column offsets, `offsets[0] == 0`, one entry past the last
    /// block. Fixed once the structure is set.
    offsets: Vec<usize>,
    row_start: usize,
    row_end: usize,
    first_block: usize,
}

impl Default for VerticalBlockMatrix {
    fn default() -> Self {
        Self::empty()
    }
}

impl VerticalBlockMatrix {
    /// A structureless matrix: zero rows, zero blocks.
    pub fn empty() -> Self {
        VerticalBlockMatrix {
            matrix: DMatrix::zeros(0, 0),
            offsets: vec![0],
            row_start: 0,
            row_end: 0,
            first_block: 0,
        }
    }

    /// Allocate a zeroed `rows x sum(dims)` matrix with the given block
    /// widths and a full row window.
    pub fn from_dims(dims: &[usize], rows: usize) -> Self {
        let mut offsets = Vec::with_capacity(dims.len() + 1);
        offsets.push(0);
        let mut total = 0;
        for &d in dims {
            total += d;
            offsets.push(total);
        }
        VerticalBlockMatrix {
            matrix: DMatrix::zeros(rows, total),
            offsets,
            row_start: 0,
            row_end: rows,
            first_block: 0,
        }
    }

    /// Wrap an existing matrix whose columns already follow `dims`.
    ///
    /// Panics if the widths do not sum to the matrix column count.
    pub fn from_matrix(dims: &[usize], matrix: DMatrix<f64>) -> Self {
        let mut offsets = Vec::with_capacity(dims.len() + 1);
        offsets.push(0);
        let mut total = 0;
        for &d in dims {
            total += d;
            offsets.push(total);
        }
        assert_eq!(total, matrix.ncols(), "block widths must cover the matrix");
        let rows = matrix.nrows();
        VerticalBlockMatrix {
            matrix,
            offsets,
            row_start: 0,
            row_end: rows,
            first_block: 0,
        }
    }

    /// Number of blocks visible past `first_block`.
    pub fn num_blocks(&self) -> usize {
        self.offsets.len() - 1 - self.first_block
    }

    /// Rows in the current window.
    pub fn rows(&self) -> usize {
        self.row_end - self.row_start
    }

    /// Columns visible past `first_block`.
    pub fn cols(&self) -> usize {
        self.offsets[self.offsets.len() - 1] - self.offsets[self.first_block]
    }

    /// Rows of the backing matrix, ignoring the window.
    pub fn total_rows(&self) -> usize {
        self.matrix.nrows()
    }

    /// Column offset of block `j`, relative to the first visible column.
    pub fn offset(&self, j: usize) -> usize {
        self.offsets[self.first_block + j] - self.offsets[self.first_block]
    }

    /// Width of block `j`.
    pub fn block_cols(&self, j: usize) -> usize {
        self.offsets[self.first_block + j + 1] - self.offsets[self.first_block + j]
    }

    pub fn block(&self, j: usize) -> DMatrixView<'_, f64> {
        let c0 = self.offsets[self.first_block + j];
        let c1 = self.offsets[self.first_block + j + 1];
        self.matrix
            .view((self.row_start, c0), (self.rows(), c1 - c0))
    }

    pub fn block_mut(&mut self, j: usize) -> DMatrixViewMut<'_, f64> {
        let c0 = self.offsets[self.first_block + j];
        let c1 = self.offsets[self.first_block + j + 1];
        let rows = self.rows();
        self.matrix.view_mut((self.row_start, c0), (rows, c1 - c0))
    }

    /// View spanning blocks `[j0, j1)`.
    pub fn range(&self, j0: usize, j1: usize) -> DMatrixView<'_, f64> {
        let c0 = self.offsets[self.first_block + j0];
        let c1 = self.offsets[self.first_block + j1];
        self.matrix
            .view((self.row_start, c0), (self.rows(), c1 - c0))
    }

    pub fn range_mut(&mut self, j0: usize, j1: usize) -> DMatrixViewMut<'_, f64> {
        let c0 = self.offsets[self.first_block + j0];
        let c1 = self.offsets[self.first_block + j1];
        let rows = self.rows();
        self.matrix.view_mut((self.row_start, c0), (rows, c1 - c0))
    }

    /// Owned copy of one column of block `j`, windowed.
    pub fn column(&self, j: usize, col: usize) -> DVector<f64> {
        let c = self.offsets[self.first_block + j] + col;
        let stride = self.matrix.nrows();
        let data = &self.matrix.as_slice()[c * stride + self.row_start..c * stride + self.row_end];
        DVector::from_column_slice(data)
    }

    pub fn row_start(&self) -> usize {
        self.row_start
    }

    pub fn row_end(&self) -> usize {
        self.row_end
    }

    pub fn first_block(&self) -> usize {
        self.first_block
    }

    pub fn set_row_start(&mut self, row_start: usize) {
        debug_assert!(row_start <= self.row_end);
        self.row_start = row_start;
    }

    pub fn set_row_end(&mut self, row_end: usize) {
        debug_assert!(row_end <= self.matrix.nrows());
        self.row_end = row_end;
    }

    pub fn set_first_block(&mut self, first_block: usize) {
        debug_assert!(first_block < self.offsets.len());
        self.first_block = first_block;
    }

    /// True when the window exposes the whole backing matrix.
    pub fn is_full_window(&self) -> bool {
        self.row_start == 0 && self.row_end == self.matrix.nrows() && self.first_block == 0
    }

    /// O(1) exchange of contents and structure.
    pub fn swap(&mut self, other: &mut Self) {
        std::mem::swap(self, other);
    }

    /// Materialize the current window as a fresh full-window matrix.
    pub fn window_copy(&self) -> VerticalBlockMatrix {
        let base = self.offsets[self.first_block];
        let offsets: Vec<usize> = self.offsets[self.first_block..]
            .iter()
            .map(|&o| o - base)
            .collect();
        let rows = self.rows();
        VerticalBlockMatrix {
            matrix: self.range(0, self.num_blocks()).clone_owned(),
            offsets,
            row_start: 0,
            row_end: rows,
            first_block: 0,
        }
    }

    /// Raw backing matrix. Only meaningful with a full window.
    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.matrix
    }

    pub fn matrix_mut(&mut self) -> &mut DMatrix<f64> {
        &mut self.matrix
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::dmatrix;

    fn numbered(rows: usize, cols: usize) -> DMatrix<f64> {
        DMatrix::from_fn(rows, cols, |i, j| (i * cols + j) as f64)
    }

    #[test]
    fn test_structure_and_offsets() {
        let ab = VerticalBlockMatrix::from_dims(&[2, 3, 1], 4);
        assert_eq!(ab.num_blocks(), 3);
        assert_eq!(ab.rows(), 4);
        assert_eq!(ab.cols(), 6);
        assert_eq!(ab.offset(0), 0);
        assert_eq!(ab.offset(1), 2);
        assert_eq!(ab.offset(2), 5);
        assert_eq!(ab.block_cols(1), 3);
        assert!(ab.is_full_window());
    }

    #[test]
    fn test_block_views_follow_window() {
        let mut ab = VerticalBlockMatrix::from_matrix(&[1, 1, 1], numbered(3, 3));
        assert_eq!(ab.block(0)[(2, 0)], 6.0);

        ab.set_row_start(1);
        ab.set_first_block(1);
        assert_eq!(ab.num_blocks(), 2);
        assert_eq!(ab.rows(), 2);
        // block 0 is now the middle column, rows 1..3
        assert_eq!(ab.block(0)[(0, 0)], 4.0);
        assert_eq!(ab.block(0)[(1, 0)], 7.0);
        assert_eq!(ab.column(1, 0), DVector::from_vec(vec![5.0, 8.0]));
    }

    #[test]
    fn test_range_and_window_copy() {
        let mut ab = VerticalBlockMatrix::from_matrix(&[2, 1], numbered(2, 3));
        ab.set_row_start(1);
        let copied = ab.window_copy();
        assert!(copied.is_full_window());
        assert_eq!(copied.num_blocks(), 2);
        assert_eq!(copied.rows(), 1);
        assert_eq!(
            copied.range(0, 2).clone_owned(),
            dmatrix![3.0, 4.0, 5.0]
        );
    }

    #[test]
    fn test_swap() {
        let mut a = VerticalBlockMatrix::from_dims(&[1, 1], 2);
        let mut b = VerticalBlockMatrix::from_dims(&[3, 1], 5);
        a.swap(&mut b);
        assert_eq!(a.rows(), 5);
        assert_eq!(a.cols(), 4);
        assert_eq!(b.rows(), 2);
        assert_eq!(b.cols(), 2);
    }

    #[test]
    fn test_empty() {
        let ab = VerticalBlockMatrix::empty();
        assert_eq!(ab.num_blocks(), 0);
        assert_eq!(ab.rows(), 0);
        assert_eq!(ab.cols(), 0);
    }
}
