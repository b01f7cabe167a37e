//! A directed super→sub edge and the value transfers along it

use tracing::trace;

use crate::linkage::remapper::IndexRemapper;
use crate::linkage::MatrixHandle;
use crate::matrix::SparseMatrix;

/// Linkage between a super-matrix and one sub-matrix
///
/// Besides the remapper, the linkage caches for every sub entry the position
/// of the matching entry in the super-matrix, so repeated transfers avoid
/// searching the super rows. The cache is dropped on every structural change
/// reported through the registry.
#[derive(Debug)]
pub struct SubMatrixLinkage {
    super_matrix: MatrixHandle,
    sub_matrix: MatrixHandle,
    offset: usize,
    remapper: Box<dyn IndexRemapper>,
    entry_map: Option<Vec<Vec<Option<usize>>>>,
}

impl SubMatrixLinkage {
    pub(crate) fn new(
        super_matrix: MatrixHandle,
        sub_matrix: MatrixHandle,
        offset: usize,
        remapper: Box<dyn IndexRemapper>,
    ) -> Self {
        Self {
            super_matrix,
            sub_matrix,
            offset,
            remapper,
            entry_map: None,
        }
    }

    pub fn super_matrix(&self) -> MatrixHandle {
        self.super_matrix
    }

    pub fn sub_matrix(&self) -> MatrixHandle {
        self.sub_matrix
    }

    /// Row/column offset the sub-matrix was attached at
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn remapper(&self) -> &dyn IndexRemapper {
        self.remapper.as_ref()
    }

    /// Mutable access to the remapper; drops the entry position cache
    pub fn remapper_mut(&mut self) -> &mut dyn IndexRemapper {
        self.entry_map = None;
        self.remapper.as_mut()
    }

    /// Whether the sub-to-super entry positions are currently cached
    pub fn has_entry_map(&self) -> bool {
        self.entry_map.is_some()
    }

    pub(crate) fn invalidate(&mut self) {
        self.entry_map = None;
    }

    /// super += factor * sub at every mapped entry
    pub(crate) fn add_sub_to_super(
        &mut self,
        factor: f64,
        super_matrix: &mut SparseMatrix,
        sub_matrix: &SparseMatrix,
    ) {
        self.ensure_entry_map(super_matrix, sub_matrix);
        let Some(entry_map) = &self.entry_map else {
            return;
        };

        for (sub_row, positions) in entry_map.iter().enumerate() {
            let Some(super_row) = self.remapper.super_row(sub_row) else {
                continue;
            };
            for (j, position) in positions.iter().enumerate() {
                if let Some(position) = *position {
                    super_matrix.add_entry(super_row, position, factor * sub_matrix.entry(sub_row, j));
                }
            }
        }
    }

    /// sub = super at every mapped entry; unmapped sub entries become zero
    pub(crate) fn assign_sub_from_super(
        &mut self,
        super_matrix: &SparseMatrix,
        sub_matrix: &mut SparseMatrix,
    ) {
        self.ensure_entry_map(super_matrix, sub_matrix);
        let Some(entry_map) = &self.entry_map else {
            return;
        };

        for (sub_row, positions) in entry_map.iter().enumerate() {
            let super_row = self.remapper.super_row(sub_row);
            for (j, position) in positions.iter().enumerate() {
                let value = match (super_row, *position) {
                    (Some(super_row), Some(position)) => super_matrix.entry(super_row, position),
                    _ => 0.0,
                };
                sub_matrix.set_entry(sub_row, j, value);
            }
        }
    }

    /// Reports removed sub rows, given in descending order
    pub(crate) fn notify_removed_rows(&mut self, removed: &[usize]) {
        for &row in removed {
            self.remapper.remove_super_row_from_sub_matrix(row);
        }
        self.entry_map = None;
    }

    /// Reports removed sub columns, given in descending order
    pub(crate) fn notify_removed_columns(&mut self, removed: &[usize]) {
        for &column in removed {
            self.remapper.remove_super_column_from_sub_matrix(column);
        }
        self.entry_map = None;
    }

    pub(crate) fn notify_inserted_into_super(&mut self, row: usize, column: usize) {
        self.remapper.on_entry_inserted_into_super(row, column);
        self.entry_map = None;
    }

    fn ensure_entry_map(&mut self, super_matrix: &SparseMatrix, sub_matrix: &SparseMatrix) {
        if self.entry_map.is_none() {
            self.entry_map = Some(self.build_entry_map(super_matrix, sub_matrix));
        }
    }

    fn build_entry_map(
        &self,
        super_matrix: &SparseMatrix,
        sub_matrix: &SparseMatrix,
    ) -> Vec<Vec<Option<usize>>> {
        trace!(
            super_matrix = ?self.super_matrix,
            sub_matrix = ?self.sub_matrix,
            "building linkage entry map"
        );

        (0..sub_matrix.num_rows())
            .map(|sub_row| {
                let super_row = self
                    .remapper
                    .super_row(sub_row)
                    .filter(|&row| row < super_matrix.num_rows());
                sub_matrix
                    .row_columns(sub_row)
                    .iter()
                    .map(|&sub_column| {
                        let super_row = super_row?;
                        let super_column = self.remapper.super_column(sub_column)?;
                        super_matrix.find_column_position(super_row, super_column)
                    })
                    .collect()
            })
            .collect()
    }
}
