//! Row and column elimination with renumbering of the survivors
//!
//! Two families are provided:
//!
//! - **Batch** (`remove_rows`, `remove_columns`, `remove_rows_columns`):
//!   builds an old-to-new index table in one linear pass, refilters every row
//!   in place, and compacts surviving rows by swapping row buffers. Total cost
//!   is linear in the number of stored entries.
//! - **Reference** (`remove_row`, `remove_column`, `remove_row_column` and the
//!   `_slow` list forms): removes one index at a time, rescanning every row.
//!   Kept as the correctness baseline for the batch family.
//!
//! Removal lists must be sorted ascending; an unsorted list is not detected
//! and gives a wrong result. Every operation returns the removed indices,
//! 0-based and in descending order, which is the order in which a linked
//! remapper must be told about them.

use tracing::trace;

use crate::error::{Result, SparseMatrixError};
use crate::matrix::{IndexBase, SparseMatrix};

impl SparseMatrix {
    /// Removes the listed rows and the columns with the same indices
    pub fn remove_rows_columns(&mut self, removed: &[usize], base: IndexBase) -> Result<Vec<usize>> {
        let removed = to_zero_based(removed, base)?;
        check_rows_in_range(&removed, self.num_rows())?;

        let old_to_new = build_old_to_new(&removed, self.num_rows().max(self.num_columns()));
        self.renumber_columns(&old_to_new);
        self.compact_rows(&old_to_new);
        self.invalidate_caches();

        trace!(count = removed.len(), "removed rows and columns");
        Ok(descending(removed))
    }

    /// Removes the listed rows; columns are untouched
    pub fn remove_rows(&mut self, removed: &[usize], base: IndexBase) -> Result<Vec<usize>> {
        let removed = to_zero_based(removed, base)?;
        check_rows_in_range(&removed, self.num_rows())?;

        let old_to_new = build_old_to_new(&removed, self.num_rows());
        self.compact_rows(&old_to_new);
        self.invalidate_caches();

        trace!(count = removed.len(), "removed rows");
        Ok(descending(removed))
    }

    /// Removes the listed columns and renumbers the remaining ones
    ///
    /// Columns past the last stored column are valid targets: the renumbering
    /// table is sized to cover them.
    pub fn remove_columns(&mut self, removed: &[usize], base: IndexBase) -> Result<Vec<usize>> {
        let removed = to_zero_based(removed, base)?;

        let needed = removed.last().map_or(0, |&last| last + 1);
        let old_to_new = build_old_to_new(&removed, self.num_columns().max(needed));
        self.renumber_columns(&old_to_new);
        self.invalidate_caches();

        trace!(count = removed.len(), "removed columns");
        Ok(descending(removed))
    }

    /// Removes row `index` and column `index`, one rescan of every row
    pub fn remove_row_column(&mut self, index: usize) -> Result<()> {
        self.remove_row(index)?;
        self.remove_column(index);
        Ok(())
    }

    /// Removes row `index`
    pub fn remove_row(&mut self, index: usize) -> Result<()> {
        check_rows_in_range(&[index], self.num_rows())?;
        self.column_indices.remove(index);
        self.values.remove(index);
        self.invalidate_caches();
        Ok(())
    }

    /// Removes column `index` and shifts the columns above it down by one
    pub fn remove_column(&mut self, index: usize) {
        for (columns, values) in self.column_indices.iter_mut().zip(self.values.iter_mut()) {
            // entries above `index` start at `first_above`
            let first_above = match columns.binary_search(&index) {
                Ok(position) => {
                    columns.remove(position);
                    values.remove(position);
                    position
                }
                Err(position) => position,
            };
            for column in &mut columns[first_above..] {
                *column -= 1;
            }
        }
        self.invalidate_caches();
    }

    /// Reference form of [`SparseMatrix::remove_rows_columns`]
    pub fn remove_rows_columns_slow(
        &mut self,
        removed: &[usize],
        base: IndexBase,
    ) -> Result<Vec<usize>> {
        let removed = to_zero_based(removed, base)?;
        check_rows_in_range(&removed, self.num_rows())?;
        for (count, &index) in removed.iter().enumerate() {
            self.remove_row_column(index - count)?;
        }
        Ok(descending(removed))
    }

    /// Reference form of [`SparseMatrix::remove_rows`]
    pub fn remove_rows_slow(&mut self, removed: &[usize], base: IndexBase) -> Result<Vec<usize>> {
        let removed = to_zero_based(removed, base)?;
        check_rows_in_range(&removed, self.num_rows())?;
        for (count, &index) in removed.iter().enumerate() {
            self.remove_row(index - count)?;
        }
        Ok(descending(removed))
    }

    /// Reference form of [`SparseMatrix::remove_columns`]
    pub fn remove_columns_slow(
        &mut self,
        removed: &[usize],
        base: IndexBase,
    ) -> Result<Vec<usize>> {
        let removed = to_zero_based(removed, base)?;
        for (count, &index) in removed.iter().enumerate() {
            self.remove_column(index - count);
        }
        Ok(descending(removed))
    }

    /// Drops entries whose column maps to `None` and renumbers the rest
    fn renumber_columns(&mut self, old_to_new: &[Option<usize>]) {
        for (columns, values) in self.column_indices.iter_mut().zip(self.values.iter_mut()) {
            let mut target = 0;
            for source in 0..columns.len() {
                let Some(new_column) = old_to_new[columns[source]] else {
                    continue;
                };
                columns[target] = new_column;
                values[target] = values[source];
                target += 1;
            }
            columns.truncate(target);
            values.truncate(target);
        }
    }

    /// Moves surviving rows to the front by swapping row buffers, then
    /// truncates
    fn compact_rows(&mut self, old_to_new: &[Option<usize>]) {
        let mut target = 0;
        for source in 0..self.num_rows() {
            if old_to_new[source].is_none() {
                continue;
            }
            self.column_indices.swap(target, source);
            self.values.swap(target, source);
            target += 1;
        }
        self.column_indices.truncate(target);
        self.values.truncate(target);
    }
}

/// Dense renumbering of `0..len`: removed indices map to `None`, survivors to
/// consecutive new indices in their original order
fn build_old_to_new(removed: &[usize], len: usize) -> Vec<Option<usize>> {
    let mut old_to_new = Vec::with_capacity(len);
    let mut removed_iter = removed.iter().peekable();
    let mut next_new = 0;

    for old in 0..len {
        if removed_iter.peek() == Some(&&old) {
            removed_iter.next();
            old_to_new.push(None);
        } else {
            old_to_new.push(Some(next_new));
            next_new += 1;
        }
    }

    old_to_new
}

fn to_zero_based(removed: &[usize], base: IndexBase) -> Result<Vec<usize>> {
    removed
        .iter()
        .map(|&index| {
            base.to_zero_based(index).ok_or_else(|| {
                SparseMatrixError::contract(format!(
                    "index {} is invalid for a 1-based removal list",
                    index
                ))
            })
        })
        .collect()
}

fn check_rows_in_range(removed: &[usize], num_rows: usize) -> Result<()> {
    match removed.iter().max() {
        Some(&max) if max >= num_rows => Err(SparseMatrixError::contract(format!(
            "row {} is out of bounds (num_rows = {})",
            max, num_rows
        ))),
        _ => Ok(()),
    }
}

fn descending(mut removed: Vec<usize>) -> Vec<usize> {
    removed.reverse();
    removed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn example() -> SparseMatrix {
        SparseMatrix::from_triplets(
            3,
            &[(0, 0, 2.0), (0, 1, 1.0), (1, 0, 1.0), (1, 1, 3.0), (2, 2, 5.0)],
        )
    }

    fn grid(n: usize) -> SparseMatrix {
        let mut triplets = Vec::new();
        for i in 0..n {
            for j in 0..n {
                if (i + j) % 3 != 1 {
                    triplets.push((i, j, (10 * i + j) as f64));
                }
            }
        }
        SparseMatrix::from_triplets(n, &triplets)
    }

    #[test]
    fn test_build_old_to_new() {
        let table = build_old_to_new(&[1, 3], 5);
        assert_eq!(table, vec![Some(0), None, Some(1), None, Some(2)]);
    }

    #[test]
    fn test_remove_middle_row_column() {
        let mut matrix = example();
        let removed = matrix.remove_rows_columns(&[1], IndexBase::Zero).unwrap();

        assert_eq!(removed, vec![1]);
        assert_eq!(matrix.num_rows(), 2);
        let expected = SparseMatrix::from_triplets(2, &[(0, 0, 2.0), (1, 1, 5.0)]);
        assert_eq!(matrix, expected);
    }

    #[test]
    fn test_one_based_list() {
        let mut matrix = example();
        matrix.remove_rows_columns(&[2], IndexBase::One).unwrap();
        let expected = SparseMatrix::from_triplets(2, &[(0, 0, 2.0), (1, 1, 5.0)]);
        assert_eq!(matrix, expected);

        assert!(matrix.remove_rows(&[0], IndexBase::One).is_err());
    }

    #[test]
    fn test_batch_matches_slow() {
        let removed = [0, 2, 3, 6];

        let mut batch = grid(7);
        let mut slow = grid(7);
        assert_eq!(
            batch.remove_rows_columns(&removed, IndexBase::Zero).unwrap(),
            slow.remove_rows_columns_slow(&removed, IndexBase::Zero).unwrap()
        );
        assert_eq!(batch, slow);

        let mut batch = grid(7);
        let mut slow = grid(7);
        batch.remove_rows(&removed, IndexBase::Zero).unwrap();
        slow.remove_rows_slow(&removed, IndexBase::Zero).unwrap();
        assert_eq!(batch, slow);

        let mut batch = grid(7);
        let mut slow = grid(7);
        batch.remove_columns(&removed, IndexBase::Zero).unwrap();
        slow.remove_columns_slow(&removed, IndexBase::Zero).unwrap();
        assert_eq!(batch, slow);
    }

    #[test]
    fn test_remove_columns_past_last_stored_column() {
        let mut matrix = SparseMatrix::from_triplets(2, &[(0, 0, 1.0), (1, 1, 2.0)]);
        let removed = matrix.remove_columns(&[1, 4], IndexBase::Zero).unwrap();

        assert_eq!(removed, vec![4, 1]);
        assert_eq!(matrix.row_columns(0), &[0]);
        assert_eq!(matrix.row_length(1), 0);
    }

    #[test]
    fn test_remove_rows_keeps_columns() {
        let mut matrix = example();
        matrix.remove_rows(&[0], IndexBase::Zero).unwrap();

        assert_eq!(matrix.num_rows(), 2);
        assert_eq!(matrix.row_columns(0), &[0, 1]);
        assert_eq!(matrix.row_columns(1), &[2]);
    }

    #[test]
    fn test_row_out_of_range() {
        let mut matrix = example();
        assert!(matrix.remove_rows(&[3], IndexBase::Zero).is_err());
        assert!(matrix.remove_row(3).is_err());
        assert_eq!(matrix, example());
    }

    #[test]
    fn test_slow_rejects_list_before_removing_anything() {
        let mut matrix = SparseMatrix::identity(3);
        assert!(matrix.remove_rows_columns_slow(&[0, 5], IndexBase::Zero).is_err());
        assert!(matrix.remove_rows_slow(&[1, 3], IndexBase::Zero).is_err());
        assert_eq!(matrix, SparseMatrix::identity(3));

        let mut batch = SparseMatrix::identity(3);
        assert!(batch.remove_rows_columns(&[0, 5], IndexBase::Zero).is_err());
        assert_eq!(batch, matrix);
    }

    #[test]
    fn test_insert_then_remove_is_identity() {
        let mut matrix = grid(5);
        let original = matrix.clone();
        let position = matrix.insert_entry(1, 3).unwrap();
        matrix.set_entry(1, position, 9.0);
        matrix.remove_rows_columns(&[3], IndexBase::Zero).unwrap();

        let mut expected = original;
        expected.remove_rows_columns(&[3], IndexBase::Zero).unwrap();
        assert_eq!(matrix, expected);
    }

    #[test]
    fn test_elimination_frees_caches() {
        let mut matrix = example();
        matrix.build_diagonal_indices();
        matrix.remove_columns(&[0], IndexBase::Zero).unwrap();
        assert!(!matrix.has_diagonal_indices());
    }
}
