//! Derived index caches: diagonal positions and transposed positions
//!
//! Both caches are opt-in. Callers build them around a span of read-heavy
//! operations and free them afterwards; any structural mutation performed by
//! this crate drops them. There is no dirty tracking beyond that.

use crate::error::{Result, SparseMatrixError};
use crate::matrix::SparseMatrix;

impl SparseMatrix {
    /// Builds the diagonal position cache; no-op if already built
    pub fn build_diagonal_indices(&mut self) {
        if self.has_diagonal_indices() {
            return;
        }
        let indices = (0..self.num_rows())
            .map(|i| self.find_column_position(i, i))
            .collect();
        self.diagonal_indices = Some(indices);
    }

    /// Drops the diagonal position cache
    pub fn free_diagonal_indices(&mut self) {
        self.diagonal_indices = None;
    }

    pub fn has_diagonal_indices(&self) -> bool {
        self.diagonal_indices.is_some()
    }

    /// Position of the diagonal entry in row `row`
    ///
    /// O(1) with the cache, a search of the row otherwise.
    pub fn diagonal_position(&self, row: usize) -> Option<usize> {
        match &self.diagonal_indices {
            Some(indices) => indices[row],
            None => self.find_column_position(row, row),
        }
    }

    /// Diagonal of the matrix; rows without a diagonal entry give 0
    pub fn diagonal(&self) -> Vec<f64> {
        (0..self.num_rows())
            .map(|i| self.diagonal_position(i).map_or(0.0, |j| self.values[i][j]))
            .collect()
    }

    /// Adds `diagonal[i]` to the diagonal entry of every row that has one
    pub fn add_diagonal(&mut self, diagonal: &[f64]) {
        for (i, &d) in diagonal.iter().enumerate().take(self.num_rows()) {
            if let Some(j) = self.diagonal_position(i) {
                self.values[i][j] += d;
            }
        }
    }

    /// Adds `value` to the diagonal entry of every row that has one
    pub fn add_diagonal_constant(&mut self, value: f64) {
        for i in 0..self.num_rows() {
            if let Some(j) = self.diagonal_position(i) {
                self.values[i][j] += value;
            }
        }
    }

    /// Builds the transposed position cache; no-op if already built
    ///
    /// Assumes a structurally symmetric pattern: entry (a, b) exists iff
    /// (b, a) exists. The result is meaningless otherwise.
    pub fn build_transposition_indices(&mut self) {
        if self.has_transposition_indices() {
            return;
        }

        // Running count of entries seen so far in each column. Scanning rows
        // in order, the k-th entry of column c sits at row r, and with a
        // symmetric pattern (c, r) is the k-th entry of row c.
        let mut seen = vec![0usize; self.num_columns().max(self.num_rows())];
        let indices = self
            .column_indices
            .iter()
            .map(|row| {
                row.iter()
                    .map(|&column| {
                        let position = seen[column];
                        seen[column] += 1;
                        position
                    })
                    .collect()
            })
            .collect();

        self.transposed_indices = Some(indices);
    }

    /// Drops the transposed position cache
    pub fn free_transposition_indices(&mut self) {
        self.transposed_indices = None;
    }

    pub fn has_transposition_indices(&self) -> bool {
        self.transposed_indices.is_some()
    }

    /// Position, within row `column_index(row, j)`, of the entry whose
    /// column is `row`
    ///
    /// Fails if the transposition cache has not been built.
    pub fn transposed_index(&self, row: usize, j: usize) -> Result<usize> {
        let indices = self.transposed_indices.as_ref().ok_or_else(|| {
            SparseMatrixError::contract("transposed_index requires transposition indices")
        })?;
        Ok(indices[row][j])
    }

    /// Largest |M[i][j] + M[j][i]| over stored entries
    ///
    /// Zero means the matrix is skew-symmetric. The transposition cache is
    /// built for the check and freed afterwards.
    pub fn skew_symmetric_check(&mut self) -> f64 {
        self.build_transposition_indices();

        let mut max_entry: f64 = 0.0;
        if let Some(transposed) = &self.transposed_indices {
            for i in 0..self.num_rows() {
                for (j, (&column, &value)) in self.column_indices[i]
                    .iter()
                    .zip(&self.values[i])
                    .enumerate()
                {
                    let mirrored = self.values[column][transposed[i][j]];
                    max_entry = max_entry.max((value + mirrored).abs());
                }
            }
        }

        self.free_transposition_indices();
        max_entry
    }

    /// Copies every upper-triangle value onto its mirrored lower entry
    ///
    /// Requires the transposition cache. The upper triangle is left as is.
    pub fn symmetrize(&mut self) -> Result<()> {
        let transposed = self.transposed_indices.as_ref().ok_or_else(|| {
            SparseMatrixError::contract("symmetrize requires transposition indices")
        })?;

        for i in 0..self.num_rows() {
            for j in 0..self.column_indices[i].len() {
                let column = self.column_indices[i][j];
                if column >= i {
                    break;
                }
                self.values[i][j] = self.values[column][transposed[i][j]];
            }
        }

        Ok(())
    }

    /// One forward Gauss-Seidel sweep for M x = b, updating `x` in place
    ///
    /// A missing or zero diagonal entry yields an infinite or NaN component.
    pub fn gauss_seidel_iteration(&self, x: &mut [f64], b: &[f64]) {
        for i in 0..self.num_rows() {
            let mut buffer = b[i];
            for (column, value) in self.row(i) {
                if column != i {
                    buffer -= value * x[column];
                }
            }
            let diagonal = self.diagonal_position(i).map_or(0.0, |j| self.values[i][j]);
            x[i] = buffer / diagonal;
        }
    }
}
