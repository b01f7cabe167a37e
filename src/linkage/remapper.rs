//! Index remapping between a super-matrix and one of its sub-matrices
//!
//! A remapper answers "which super row/column does this sub row/column
//! correspond to" and is told about every structural change so that the
//! correspondence stays valid. The registry never inspects its internals.

use std::fmt;

use tracing::trace;

/// Bookkeeping of the row/column correspondence behind one linkage
pub trait IndexRemapper: fmt::Debug + Send {
    /// Super row mirrored by `sub_row`
    fn super_row(&self, sub_row: usize) -> Option<usize>;

    /// Super column mirrored by `sub_column`
    fn super_column(&self, sub_column: usize) -> Option<usize>;

    /// Sub row mirroring `super_row`, if any
    fn sub_row(&self, super_row: usize) -> Option<usize>;

    /// Sub column mirroring `super_column`, if any
    fn sub_column(&self, super_column: usize) -> Option<usize>;

    /// The sub-matrix dropped its row `sub_row` (current numbering)
    fn remove_super_row_from_sub_matrix(&mut self, sub_row: usize);

    /// The sub-matrix dropped its column `sub_column` (current numbering)
    fn remove_super_column_from_sub_matrix(&mut self, sub_column: usize);

    /// A new entry was inserted into the super-matrix
    fn on_entry_inserted_into_super(&mut self, super_row: usize, super_column: usize);
}

/// Ordered sub-to-super index table
///
/// Sub indices below `mapped.len()` are tabulated; sub index
/// `mapped.len() + k` maps to `next + k`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct IndexTable {
    mapped: Vec<usize>,
    next: usize,
}

impl IndexTable {
    fn new(offset: usize, len: usize) -> Self {
        Self {
            mapped: (offset..offset + len).collect(),
            next: offset + len,
        }
    }

    fn forward(&self, sub: usize) -> usize {
        match self.mapped.get(sub) {
            Some(&index) => index,
            None => self.next + (sub - self.mapped.len()),
        }
    }

    fn inverse(&self, sup: usize) -> Option<usize> {
        match self.mapped.binary_search(&sup) {
            Ok(sub) => Some(sub),
            Err(_) if sup >= self.next => Some(self.mapped.len() + (sup - self.next)),
            Err(_) => None,
        }
    }

    fn remove(&mut self, sub: usize) {
        while self.mapped.len() <= sub {
            self.mapped.push(self.next);
            self.next += 1;
        }
        self.mapped.remove(sub);
    }
}

/// Remapper for a sub-matrix embedded at a diagonal offset
///
/// At creation sub index `k` mirrors super index `k + offset` in both
/// directions. Removing a sub row or column drops it from the table; the
/// remaining sub indices keep pointing at their original super indices.
/// Insertions into the super-matrix never change the correspondence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffsetIndexRemapper {
    offset: usize,
    rows: IndexTable,
    columns: IndexTable,
}

impl OffsetIndexRemapper {
    /// Creates the identity-plus-offset correspondence
    ///
    /// `num_sub_rows` and `num_sub_columns` only size the initial tables;
    /// indices beyond them continue the same offset.
    pub fn new(offset: usize, num_sub_rows: usize, num_sub_columns: usize) -> Self {
        Self {
            offset,
            rows: IndexTable::new(offset, num_sub_rows),
            columns: IndexTable::new(offset, num_sub_columns),
        }
    }

    /// Offset the sub-matrix was attached at
    pub fn offset(&self) -> usize {
        self.offset
    }
}

impl IndexRemapper for OffsetIndexRemapper {
    fn super_row(&self, sub_row: usize) -> Option<usize> {
        Some(self.rows.forward(sub_row))
    }

    fn super_column(&self, sub_column: usize) -> Option<usize> {
        Some(self.columns.forward(sub_column))
    }

    fn sub_row(&self, super_row: usize) -> Option<usize> {
        self.rows.inverse(super_row)
    }

    fn sub_column(&self, super_column: usize) -> Option<usize> {
        self.columns.inverse(super_column)
    }

    fn remove_super_row_from_sub_matrix(&mut self, sub_row: usize) {
        self.rows.remove(sub_row);
    }

    fn remove_super_column_from_sub_matrix(&mut self, sub_column: usize) {
        self.columns.remove(sub_column);
    }

    fn on_entry_inserted_into_super(&mut self, super_row: usize, super_column: usize) {
        trace!(super_row, super_column, "entry inserted into super-matrix");
    }
}
