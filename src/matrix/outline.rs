//! Order-independent accumulation of matrix entries
//!
//! An outline collects `(row, column, value)` contributions in any order,
//! summing duplicates, and is used once to seed a [`SparseMatrix`].
//!
//! [`SparseMatrix`]: crate::matrix::SparseMatrix

use std::collections::BTreeMap;

/// Source of rows used to construct a sparse matrix
///
/// Implementors yield, per row, `(column, value)` pairs with duplicates
/// already summed. Columns are expected in ascending order; a matrix built
/// from an unsorted source logs a warning and keeps the order as given.
pub trait OutlineSource {
    /// Number of rows described by this source
    fn num_rows(&self) -> usize;

    /// Entries of row `row` in iteration order
    fn row_entries(&self, row: usize) -> Box<dyn Iterator<Item = (usize, f64)> + '_>;
}

/// Outline backed by one ordered map per row
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseMatrixOutline {
    rows: Vec<BTreeMap<usize, f64>>,
}

impl SparseMatrixOutline {
    /// Creates an outline with `num_rows` empty rows
    pub fn new(num_rows: usize) -> Self {
        Self {
            rows: vec![BTreeMap::new(); num_rows],
        }
    }

    /// Number of rows
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Adds `value` to entry `(row, column)`, creating it if necessary
    ///
    /// # Panics
    ///
    /// Panics if `row` is out of range.
    pub fn add_entry(&mut self, row: usize, column: usize, value: f64) {
        assert!(row < self.rows.len(), "Row index {} out of bounds", row);
        *self.rows[row].entry(column).or_insert(0.0) += value;
    }

    /// Records entry `(row, column)` in the pattern without changing its value
    pub fn add_pattern_entry(&mut self, row: usize, column: usize) {
        self.add_entry(row, column, 0.0);
    }

    /// Adds a dense row-major block with its top-left corner at `(row, column)`
    pub fn add_block(&mut self, row: usize, column: usize, block_rows: usize, values: &[f64]) {
        if block_rows == 0 {
            return;
        }
        let block_columns = values.len() / block_rows;
        for i in 0..block_rows {
            for j in 0..block_columns {
                self.add_entry(row + i, column + j, values[i * block_columns + j]);
            }
        }
    }

    /// Appends `num_added_rows` empty rows
    pub fn increase_num_rows(&mut self, num_added_rows: usize) {
        self.rows
            .resize(self.rows.len() + num_added_rows, BTreeMap::new());
    }

    /// Number of distinct entries
    pub fn num_entries(&self) -> usize {
        self.rows.iter().map(BTreeMap::len).sum()
    }

    /// Iterator over `(row, column)` positions in row-major order
    pub fn entries(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.rows
            .iter()
            .enumerate()
            .flat_map(|(row, columns)| columns.keys().map(move |&column| (row, column)))
    }

    /// Accumulated value at `(row, column)`, if present
    pub fn get(&self, row: usize, column: usize) -> Option<f64> {
        self.rows.get(row).and_then(|r| r.get(&column).copied())
    }
}

impl OutlineSource for SparseMatrixOutline {
    fn num_rows(&self) -> usize {
        self.rows.len()
    }

    fn row_entries(&self, row: usize) -> Box<dyn Iterator<Item = (usize, f64)> + '_> {
        Box::new(self.rows[row].iter().map(|(&column, &value)| (column, value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicates_are_summed() {
        let mut outline = SparseMatrixOutline::new(2);
        outline.add_entry(0, 1, 2.0);
        outline.add_entry(0, 1, 3.0);
        outline.add_entry(1, 0, -1.0);

        assert_eq!(outline.num_entries(), 2);
        assert_eq!(outline.get(0, 1), Some(5.0));
        assert_eq!(outline.get(1, 1), None);
    }

    #[test]
    fn test_entries_are_sorted() {
        let mut outline = SparseMatrixOutline::new(2);
        outline.add_entry(1, 3, 1.0);
        outline.add_entry(0, 2, 1.0);
        outline.add_entry(1, 0, 1.0);

        let entries: Vec<_> = outline.entries().collect();
        assert_eq!(entries, vec![(0, 2), (1, 0), (1, 3)]);
    }

    #[test]
    fn test_add_block() {
        let mut outline = SparseMatrixOutline::new(3);
        outline.add_block(1, 1, 2, &[1.0, 2.0, 3.0, 4.0]);

        assert_eq!(outline.get(1, 1), Some(1.0));
        assert_eq!(outline.get(1, 2), Some(2.0));
        assert_eq!(outline.get(2, 1), Some(3.0));
        assert_eq!(outline.get(2, 2), Some(4.0));
    }

    #[test]
    fn test_increase_num_rows() {
        let mut outline = SparseMatrixOutline::new(1);
        outline.increase_num_rows(2);
        assert_eq!(outline.num_rows(), 3);
        outline.add_pattern_entry(2, 2);
        assert_eq!(outline.get(2, 2), Some(0.0));
    }
}
