//! Row-sparse matrix storage
//!
//! Each row owns two parallel arrays: ascending column indices and the
//! corresponding values. The row count is authoritative; the column count is
//! implicit and computed on demand as one past the largest stored column.
//!
//! Rows are stored independently so that inserting an entry shifts only the
//! affected row, and removing rows compacts the row array by swapping row
//! buffers instead of copying entries.

use std::fmt;

use tracing::warn;

use crate::error::{Result, SparseMatrixError};
use crate::matrix::outline::{OutlineSource, SparseMatrixOutline};

/// A sparse matrix stored as one sorted `(column, value)` list per row
#[derive(Clone)]
pub struct SparseMatrix {
    /// Column indices per row, strictly increasing within a row
    pub(crate) column_indices: Vec<Vec<usize>>,

    /// Values per row, parallel to `column_indices`
    pub(crate) values: Vec<Vec<f64>>,

    /// Position of the diagonal entry in each row (cache)
    pub(crate) diagonal_indices: Option<Vec<Option<usize>>>,

    /// Position of the mirrored entry for each stored entry (cache)
    pub(crate) transposed_indices: Option<Vec<Vec<usize>>>,
}

impl SparseMatrix {
    /// Creates a matrix with `num_rows` empty rows
    pub fn new(num_rows: usize) -> Self {
        Self {
            column_indices: vec![Vec::new(); num_rows],
            values: vec![Vec::new(); num_rows],
            diagonal_indices: None,
            transposed_indices: None,
        }
    }

    /// Builds a matrix from an outline
    ///
    /// Rows whose columns are not strictly increasing are kept as given and
    /// reported with a warning.
    pub fn from_outline<O>(outline: &O) -> Self
    where
        O: OutlineSource + ?Sized,
    {
        let num_rows = outline.num_rows();
        let mut matrix = Self::new(num_rows);

        for i in 0..num_rows {
            let (columns, values): (Vec<usize>, Vec<f64>) = outline.row_entries(i).unzip();
            if !is_strictly_increasing(&columns) {
                warn!(row = i, "entries not sorted in a row of a sparse matrix");
            }
            matrix.column_indices[i] = columns;
            matrix.values[i] = values;
        }

        matrix
    }

    /// Builds a matrix from explicit `(column, value)` rows
    ///
    /// Like [`SparseMatrix::from_outline`], unsorted rows are accepted with a
    /// warning and are not repaired.
    pub fn from_rows(rows: Vec<Vec<(usize, f64)>>) -> Self {
        let mut matrix = Self::new(rows.len());

        for (i, row) in rows.into_iter().enumerate() {
            let (columns, values): (Vec<usize>, Vec<f64>) = row.into_iter().unzip();
            if !is_strictly_increasing(&columns) {
                warn!(row = i, "entries not sorted in a row of a sparse matrix");
            }
            matrix.column_indices[i] = columns;
            matrix.values[i] = values;
        }

        matrix
    }

    /// Builds a matrix from `(row, column, value)` triplets, summing duplicates
    pub fn from_triplets(num_rows: usize, triplets: &[(usize, usize, f64)]) -> Self {
        let mut outline = SparseMatrixOutline::new(num_rows);
        for &(row, column, value) in triplets {
            outline.add_entry(row, column, value);
        }
        Self::from_outline(&outline)
    }

    /// Creates an identity matrix of the given size
    pub fn identity(n: usize) -> Self {
        Self {
            column_indices: (0..n).map(|i| vec![i]).collect(),
            values: vec![vec![1.0]; n],
            diagonal_indices: None,
            transposed_indices: None,
        }
    }

    /// Number of rows
    pub fn num_rows(&self) -> usize {
        self.column_indices.len()
    }

    /// Number of columns, inferred as one past the largest stored column
    ///
    /// Trailing all-zero columns are invisible to this count.
    pub fn num_columns(&self) -> usize {
        self.column_indices
            .iter()
            .filter_map(|row| row.iter().max())
            .max()
            .map_or(0, |&max| max + 1)
    }

    /// Number of stored entries in row `row`
    pub fn row_length(&self, row: usize) -> usize {
        self.column_indices[row].len()
    }

    /// Length of every row
    pub fn row_lengths(&self) -> Vec<usize> {
        self.column_indices.iter().map(Vec::len).collect()
    }

    /// Total number of stored entries
    pub fn num_entries(&self) -> usize {
        self.column_indices.iter().map(Vec::len).sum()
    }

    /// Column of the `j`-th stored entry of row `row`
    pub fn column_index(&self, row: usize, j: usize) -> usize {
        self.column_indices[row][j]
    }

    /// Value of the `j`-th stored entry of row `row`
    pub fn entry(&self, row: usize, j: usize) -> f64 {
        self.values[row][j]
    }

    /// Overwrites the value of the `j`-th stored entry of row `row`
    pub fn set_entry(&mut self, row: usize, j: usize, value: f64) {
        self.values[row][j] = value;
    }

    /// Adds `value` to the `j`-th stored entry of row `row`
    pub fn add_entry(&mut self, row: usize, j: usize, value: f64) {
        self.values[row][j] += value;
    }

    /// Column indices of row `row`
    pub fn row_columns(&self, row: usize) -> &[usize] {
        &self.column_indices[row]
    }

    /// Values of row `row`
    pub fn row_values(&self, row: usize) -> &[f64] {
        &self.values[row]
    }

    /// Mutable values of row `row`; the pattern stays fixed
    pub fn row_values_mut(&mut self, row: usize) -> &mut [f64] {
        &mut self.values[row]
    }

    /// Iterator over `(column, value)` pairs of row `row`
    pub fn row(&self, row: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.column_indices[row]
            .iter()
            .copied()
            .zip(self.values[row].iter().copied())
    }

    /// Position of `column` within row `row`, if stored
    pub fn find_column_position(&self, row: usize, column: usize) -> Option<usize> {
        self.column_indices[row].binary_search(&column).ok()
    }

    /// Value at dense position `(row, column)`, zero if not stored
    pub fn get(&self, row: usize, column: usize) -> f64 {
        self.find_column_position(row, column)
            .map_or(0.0, |j| self.values[row][j])
    }

    /// Inserts a zero-valued entry at `(row, column)` and returns its position
    ///
    /// Row order is preserved. Both derived index caches are freed. Callers
    /// that keep linked sub-matrices must go through
    /// [`MatrixRegistry::insert_entry`] so the remappers are notified.
    ///
    /// [`MatrixRegistry::insert_entry`]: crate::linkage::MatrixRegistry::insert_entry
    pub fn insert_entry(&mut self, row: usize, column: usize) -> Result<usize> {
        if row >= self.num_rows() {
            return Err(SparseMatrixError::contract(format!(
                "row {} is out of bounds (num_rows = {})",
                row,
                self.num_rows()
            )));
        }

        let position = match self.column_indices[row].binary_search(&column) {
            Ok(_) => {
                return Err(SparseMatrixError::contract(format!(
                    "entry ({}, {}) already exists",
                    row, column
                )))
            }
            Err(position) => position,
        };

        self.column_indices[row].insert(position, column);
        self.values[row].insert(position, 0.0);
        self.invalidate_caches();

        Ok(position)
    }

    /// Appends `num_added_rows` empty rows
    pub fn increase_num_rows(&mut self, num_added_rows: usize) {
        let n = self.num_rows() + num_added_rows;
        self.column_indices.resize(n, Vec::new());
        self.values.resize(n, Vec::new());
        self.invalidate_caches();
    }

    /// Replaces rows starting at `start_row` with the rows of `source`,
    /// shifting their columns by `start_column`
    ///
    /// Source rows that would land past the last row are ignored.
    pub fn set_rows(&mut self, source: &SparseMatrix, start_row: usize, start_column: usize) {
        for i in 0..source.num_rows() {
            let row = start_row + i;
            if row >= self.num_rows() {
                break;
            }
            self.column_indices[row] = source.column_indices[i]
                .iter()
                .map(|&column| column + start_column)
                .collect();
            self.values[row] = source.values[i].clone();
        }
        self.invalidate_caches();
    }

    /// Appends `source` as a block at the bottom-right of this matrix
    ///
    /// The block starts at row and column `num_rows()` of the matrix before
    /// the call. A matrix with linked sub-matrices must go through
    /// [`MatrixRegistry::append`] so their remappers see the new entries.
    ///
    /// [`MatrixRegistry::append`]: crate::linkage::MatrixRegistry::append
    pub fn append(&mut self, source: &SparseMatrix) -> Result<()> {
        let offset = self.num_rows();
        self.increase_num_rows(source.num_rows());

        for source_row in 0..source.num_rows() {
            let target_row = offset + source_row;
            for (column, value) in source.row(source_row) {
                let j = self.insert_entry(target_row, offset + column)?;
                self.values[target_row][j] = value;
            }
        }

        Ok(())
    }

    /// Inserts every entry of `outline` (shifted by `offset` in both
    /// directions) that is not yet stored, growing the row count if needed
    ///
    /// Returns the `(row, column)` positions that were created.
    pub fn create_entries_if_necessary(
        &mut self,
        outline: &SparseMatrixOutline,
        offset: usize,
    ) -> Result<Vec<(usize, usize)>> {
        let needed_rows = offset + outline.num_rows();
        if needed_rows > self.num_rows() {
            self.increase_num_rows(needed_rows - self.num_rows());
        }

        let mut created = Vec::new();
        for (row, column) in outline.entries() {
            let (row, column) = (row + offset, column + offset);
            if self.find_column_position(row, column).is_none() {
                self.insert_entry(row, column)?;
                created.push((row, column));
            }
        }

        Ok(created)
    }

    /// Nonzero pattern of this matrix as an outline with zero values
    pub fn topology(&self) -> SparseMatrixOutline {
        let mut outline = SparseMatrixOutline::new(self.num_rows());
        for (row, columns) in self.column_indices.iter().enumerate() {
            for &column in columns {
                outline.add_pattern_entry(row, column);
            }
        }
        outline
    }

    /// Transposed matrix
    ///
    /// `num_columns` is the row count of the result; `None` uses
    /// [`SparseMatrix::num_columns`].
    pub fn transpose(&self, num_columns: Option<usize>) -> SparseMatrix {
        let n = num_columns.unwrap_or_else(|| self.num_columns());
        let mut outline = SparseMatrixOutline::new(n);
        for i in 0..self.num_rows() {
            for (column, value) in self.row(i) {
                outline.add_entry(column, i, value);
            }
        }
        SparseMatrix::from_outline(&outline)
    }

    /// Number of entries with column <= row
    pub fn count_lower_triangle_entries(&self) -> usize {
        self.column_indices
            .iter()
            .enumerate()
            .map(|(i, row)| row.iter().filter(|&&column| column <= i).count())
            .sum()
    }

    /// Number of entries with column >= row
    pub fn count_upper_triangle_entries(&self) -> usize {
        self.column_indices
            .iter()
            .enumerate()
            .map(|(i, row)| row.iter().filter(|&&column| column >= i).count())
            .sum()
    }

    /// Drops both derived index caches after a structural change
    pub(crate) fn invalidate_caches(&mut self) {
        self.diagonal_indices = None;
        self.transposed_indices = None;
    }
}

fn is_strictly_increasing(columns: &[usize]) -> bool {
    columns.windows(2).all(|pair| pair[0] < pair[1])
}

impl PartialEq for SparseMatrix {
    /// Two matrices are equal when they store the same pattern and values;
    /// caches are ignored.
    fn eq(&self, other: &Self) -> bool {
        self.column_indices == other.column_indices && self.values == other.values
    }
}

impl fmt::Debug for SparseMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "SparseMatrix {{")?;
        writeln!(f, "  dimensions: {} × {}", self.num_rows(), self.num_columns())?;
        writeln!(f, "  entries: {}", self.num_entries())?;

        let max_rows_to_print = 5.min(self.num_rows());

        if max_rows_to_print > 0 {
            writeln!(f, "  content sample:")?;

            for i in 0..max_rows_to_print {
                write!(f, "    row {}: ", i)?;
                let length = self.row_length(i);

                if length == 0 {
                    writeln!(f, "(empty)")?;
                } else {
                    let max_elements = 5.min(length);

                    for (column, value) in self.row(i).take(max_elements) {
                        write!(f, "({}, {:?}) ", column, value)?;
                    }

                    if length > max_elements {
                        write!(f, "... ({} more)", length - max_elements)?;
                    }

                    writeln!(f)?;
                }
            }

            if self.num_rows() > max_rows_to_print {
                writeln!(f, "    ... ({} more rows)", self.num_rows() - max_rows_to_print)?;
            }
        }

        write!(f, "}}")
    }
}
