//! Arena of matrices and the linkages between them
//!
//! The registry owns every matrix and every linkage. Structural changes to a
//! linked matrix go through the registry so that the remappers on both ends
//! of each affected linkage hear about them.

use tracing::{debug, trace};

use crate::error::{Result, SparseMatrixError};
use crate::linkage::remapper::{IndexRemapper, OffsetIndexRemapper};
use crate::linkage::sub_matrix::SubMatrixLinkage;
use crate::linkage::{LinkageId, MatrixHandle};
use crate::matrix::{IndexBase, SparseMatrix, SparseMatrixOutline};

#[derive(Debug)]
struct MatrixSlot {
    matrix: SparseMatrix,
    /// Linkages in which this matrix is the super-matrix
    children: Vec<LinkageId>,
    /// Linkage registered through `attach_as_sub_matrix_of`
    parent: Option<LinkageId>,
}

/// Owner of matrices and of the super→sub linkages between them
#[derive(Debug, Default)]
pub struct MatrixRegistry {
    slots: Vec<Option<MatrixSlot>>,
    linkages: Vec<Option<SubMatrixLinkage>>,
}

impl MatrixRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes ownership of `matrix` and returns its handle
    pub fn insert(&mut self, matrix: SparseMatrix) -> MatrixHandle {
        let handle = MatrixHandle(self.slots.len());
        self.slots.push(Some(MatrixSlot {
            matrix,
            children: Vec::new(),
            parent: None,
        }));
        handle
    }

    /// Number of matrices currently held
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, handle: MatrixHandle) -> bool {
        self.slot(handle).is_ok()
    }

    pub fn get(&self, handle: MatrixHandle) -> Result<&SparseMatrix> {
        Ok(&self.slot(handle)?.matrix)
    }

    /// Mutable access to a matrix
    ///
    /// The entry position caches of every linkage touching `handle` are
    /// dropped, since the caller may change the pattern. Structural changes
    /// made this way are not reported to remappers; use the registry's own
    /// structural operations for linked matrices.
    pub fn get_mut(&mut self, handle: MatrixHandle) -> Result<&mut SparseMatrix> {
        self.slot(handle)?;
        self.invalidate_linkages_of(handle);
        Ok(&mut self.slot_mut(handle)?.matrix)
    }

    /// Removes an unlinked matrix and hands it back
    pub fn remove(&mut self, handle: MatrixHandle) -> Result<SparseMatrix> {
        let slot = self.slot(handle)?;
        if !slot.children.is_empty() || self.is_linked_as_sub(handle) {
            return Err(SparseMatrixError::contract(format!(
                "matrix {:?} still takes part in a linkage",
                handle
            )));
        }

        let slot = self.slots[handle.0]
            .take()
            .ok_or(SparseMatrixError::UnknownMatrix(handle))?;
        Ok(slot.matrix)
    }

    pub fn linkage(&self, id: LinkageId) -> Result<&SubMatrixLinkage> {
        self.linkages
            .get(id.0)
            .and_then(Option::as_ref)
            .ok_or(SparseMatrixError::UnknownLinkage(id))
    }

    /// Mutable access to a linkage, e.g. to reach its remapper
    pub fn linkage_mut(&mut self, id: LinkageId) -> Result<&mut SubMatrixLinkage> {
        self.linkages
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or(SparseMatrixError::UnknownLinkage(id))
    }

    /// Linkage from `super_matrix` to `sub_matrix`, if one exists
    pub fn find_linkage(&self, super_matrix: MatrixHandle, sub_matrix: MatrixHandle) -> Option<LinkageId> {
        let slot = self.slot(super_matrix).ok()?;
        slot.children.iter().copied().find(|id| {
            self.linkage(*id)
                .map(|linkage| linkage.sub_matrix() == sub_matrix)
                .unwrap_or(false)
        })
    }

    /// Linkages in which `handle` is the super-matrix, in attachment order
    pub fn sub_matrix_linkages(&self, handle: MatrixHandle) -> Result<&[LinkageId]> {
        Ok(&self.slot(handle)?.children)
    }

    /// Linkage registered through [`MatrixRegistry::attach_as_sub_matrix_of`]
    pub fn super_matrix_linkage(&self, handle: MatrixHandle) -> Result<Option<LinkageId>> {
        Ok(self.slot(handle)?.parent)
    }

    /// Links `sub_matrix` into `super_matrix` at a diagonal offset
    ///
    /// The linkage gets an [`OffsetIndexRemapper`] sized from the
    /// sub-matrix.
    pub fn attach_sub_matrix(
        &mut self,
        super_matrix: MatrixHandle,
        sub_matrix: MatrixHandle,
        offset: usize,
    ) -> Result<LinkageId> {
        let sub = self.get(sub_matrix)?;
        let remapper = OffsetIndexRemapper::new(offset, sub.num_rows(), sub.num_columns());
        self.attach_sub_matrix_with(super_matrix, sub_matrix, offset, Box::new(remapper))
    }

    /// Links `sub_matrix` into `super_matrix` with a caller-supplied remapper
    ///
    /// Fails if the pair is already linked, if a matrix would be linked to
    /// itself, if the sub-matrix has sub-matrices of its own, or if the
    /// super-matrix is itself a sub-matrix. Linkages form a two-level forest.
    pub fn attach_sub_matrix_with(
        &mut self,
        super_matrix: MatrixHandle,
        sub_matrix: MatrixHandle,
        offset: usize,
        remapper: Box<dyn IndexRemapper>,
    ) -> Result<LinkageId> {
        self.slot(super_matrix)?;
        let sub_slot = self.slot(sub_matrix)?;

        if super_matrix == sub_matrix {
            return Err(SparseMatrixError::contract(format!(
                "matrix {:?} cannot be its own sub-matrix",
                super_matrix
            )));
        }
        if self.find_linkage(super_matrix, sub_matrix).is_some() {
            return Err(SparseMatrixError::contract(format!(
                "{:?} is already a sub-matrix of {:?}",
                sub_matrix, super_matrix
            )));
        }
        if !sub_slot.children.is_empty() {
            return Err(SparseMatrixError::contract(format!(
                "{:?} has sub-matrices and cannot become a sub-matrix",
                sub_matrix
            )));
        }
        if self.is_linked_as_sub(super_matrix) {
            return Err(SparseMatrixError::contract(format!(
                "{:?} is a sub-matrix and cannot take sub-matrices",
                super_matrix
            )));
        }

        let id = LinkageId(self.linkages.len());
        self.linkages
            .push(Some(SubMatrixLinkage::new(super_matrix, sub_matrix, offset, remapper)));
        self.slot_mut(super_matrix)?.children.push(id);

        debug!(?super_matrix, ?sub_matrix, offset, ?id, "attached sub-matrix");
        Ok(id)
    }

    /// Records `super_matrix` as the parent of `sub_matrix`
    ///
    /// Creates the linkage at offset zero. Only a matrix with a parent may
    /// have rows or columns removed through the registry.
    pub fn attach_as_sub_matrix_of(
        &mut self,
        sub_matrix: MatrixHandle,
        super_matrix: MatrixHandle,
    ) -> Result<LinkageId> {
        if self.slot(sub_matrix)?.parent.is_some() {
            return Err(SparseMatrixError::contract(format!(
                "{:?} already has a super-matrix linkage",
                sub_matrix
            )));
        }

        let id = self.attach_sub_matrix(super_matrix, sub_matrix, 0)?;
        self.slot_mut(sub_matrix)?.parent = Some(id);
        Ok(id)
    }

    /// Removes the linkage from `super_matrix` to `sub_matrix`
    pub fn detach_sub_matrix(&mut self, super_matrix: MatrixHandle, sub_matrix: MatrixHandle) -> Result<()> {
        let id = self.find_linkage(super_matrix, sub_matrix).ok_or_else(|| {
            SparseMatrixError::contract(format!(
                "{:?} is not a sub-matrix of {:?}",
                sub_matrix, super_matrix
            ))
        })?;

        self.slot_mut(super_matrix)?.children.retain(|&child| child != id);
        let sub_slot = self.slot_mut(sub_matrix)?;
        if sub_slot.parent == Some(id) {
            sub_slot.parent = None;
        }
        self.linkages[id.0] = None;

        debug!(?super_matrix, ?sub_matrix, ?id, "detached sub-matrix");
        Ok(())
    }

    /// super += factor * sub, through the linkage between the two
    pub fn add_from_sub_matrix(
        &mut self,
        super_matrix: MatrixHandle,
        factor: f64,
        sub_matrix: MatrixHandle,
    ) -> Result<()> {
        let id = self.find_linkage(super_matrix, sub_matrix).ok_or_else(|| {
            SparseMatrixError::contract(format!(
                "{:?} is not a sub-matrix of {:?}",
                sub_matrix, super_matrix
            ))
        })?;
        self.add_from_linkage(super_matrix, factor, id)
    }

    /// super += factor * sub for the sub-matrix at the end of `id`
    ///
    /// Sub entries without a counterpart in the super-matrix are skipped.
    pub fn add_from_linkage(&mut self, super_matrix: MatrixHandle, factor: f64, id: LinkageId) -> Result<()> {
        let linkage = self
            .linkages
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or(SparseMatrixError::UnknownLinkage(id))?;
        if linkage.super_matrix() != super_matrix {
            return Err(SparseMatrixError::contract(format!(
                "linkage {:?} does not start at {:?}",
                id, super_matrix
            )));
        }

        let (super_m, sub) =
            matrix_pair_mut(&mut self.slots, linkage.super_matrix(), linkage.sub_matrix())?;
        linkage.add_sub_to_super(factor, super_m, sub);
        Ok(())
    }

    /// Overwrites every entry of `sub_matrix` with the corresponding
    /// super-matrix entry
    ///
    /// `super_matrix` must be the parent registered for `sub_matrix`. Sub
    /// entries without a counterpart in the super-matrix are set to zero.
    pub fn assign_from_super_matrix(&mut self, sub_matrix: MatrixHandle, super_matrix: MatrixHandle) -> Result<()> {
        let id = self.parent_linkage(sub_matrix)?;
        let linkage = self
            .linkages
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or(SparseMatrixError::UnknownLinkage(id))?;
        if linkage.super_matrix() != super_matrix {
            return Err(SparseMatrixError::contract(format!(
                "{:?} is not the super-matrix of {:?}",
                super_matrix, sub_matrix
            )));
        }

        let (super_m, sub) = matrix_pair_mut(&mut self.slots, super_matrix, sub_matrix)?;
        linkage.assign_sub_from_super(super_m, sub);
        Ok(())
    }

    /// Inserts a zero entry into a matrix that has no parent
    ///
    /// Every linkage hanging below the matrix is told about the insertion.
    pub fn insert_entry(&mut self, handle: MatrixHandle, row: usize, column: usize) -> Result<usize> {
        if self.slot(handle)?.parent.is_some() {
            return Err(SparseMatrixError::contract(format!(
                "cannot insert into {:?}: it is a linked sub-matrix",
                handle
            )));
        }

        let position = self.slot_mut(handle)?.matrix.insert_entry(row, column)?;

        let children = self.slot(handle)?.children.clone();
        for id in children {
            if let Some(linkage) = self.linkages.get_mut(id.0).and_then(Option::as_mut) {
                linkage.notify_inserted_into_super(row, column);
            }
        }
        self.invalidate_linkages_of(handle);

        trace!(?handle, row, column, position, "inserted entry");
        Ok(position)
    }

    /// Inserts every entry of `outline` missing from the matrix, shifted by
    /// `offset`, reporting each insertion like [`MatrixRegistry::insert_entry`]
    pub fn create_entries_if_necessary(
        &mut self,
        handle: MatrixHandle,
        outline: &SparseMatrixOutline,
        offset: usize,
    ) -> Result<Vec<(usize, usize)>> {
        if self.slot(handle)?.parent.is_some() {
            return Err(SparseMatrixError::contract(format!(
                "cannot insert into {:?}: it is a linked sub-matrix",
                handle
            )));
        }

        let matrix = &mut self.slot_mut(handle)?.matrix;
        let needed_rows = offset + outline.num_rows();
        if needed_rows > matrix.num_rows() {
            let added = needed_rows - matrix.num_rows();
            matrix.increase_num_rows(added);
        }

        let mut created = Vec::new();
        for (row, column) in outline.entries() {
            let (row, column) = (row + offset, column + offset);
            if self.get(handle)?.find_column_position(row, column).is_none() {
                self.insert_entry(handle, row, column)?;
                created.push((row, column));
            }
        }
        self.invalidate_linkages_of(handle);

        Ok(created)
    }

    /// Appends `source` as a block at the bottom-right of a matrix that has
    /// no parent
    ///
    /// Each new entry is reported to the child linkages like
    /// [`MatrixRegistry::insert_entry`].
    pub fn append(&mut self, handle: MatrixHandle, source: &SparseMatrix) -> Result<()> {
        if self.slot(handle)?.parent.is_some() {
            return Err(SparseMatrixError::contract(format!(
                "cannot append to {:?}: it is a linked sub-matrix",
                handle
            )));
        }

        let offset = self.get(handle)?.num_rows();
        self.slot_mut(handle)?.matrix.increase_num_rows(source.num_rows());

        for source_row in 0..source.num_rows() {
            let row = offset + source_row;
            for (column, value) in source.row(source_row) {
                let position = self.insert_entry(handle, row, offset + column)?;
                self.slot_mut(handle)?.matrix.set_entry(row, position, value);
            }
        }
        self.invalidate_linkages_of(handle);

        debug!(?handle, added_rows = source.num_rows(), "appended block");
        Ok(())
    }

    /// Removes rows and the same columns from a sub-matrix
    ///
    /// See [`SparseMatrix::remove_rows_columns`]. The parent remapper hears
    /// about every removed row and column in descending order.
    pub fn remove_rows_columns(&mut self, handle: MatrixHandle, removed: &[usize], base: IndexBase) -> Result<()> {
        let id = self.parent_linkage(handle)?;
        let removed = self.slot_mut(handle)?.matrix.remove_rows_columns(removed, base)?;
        self.notify_removal(handle, id, &removed, true, true)
    }

    /// Removes rows from a sub-matrix; see [`SparseMatrix::remove_rows`]
    pub fn remove_rows(&mut self, handle: MatrixHandle, removed: &[usize], base: IndexBase) -> Result<()> {
        let id = self.parent_linkage(handle)?;
        let removed = self.slot_mut(handle)?.matrix.remove_rows(removed, base)?;
        self.notify_removal(handle, id, &removed, true, false)
    }

    /// Removes columns from a sub-matrix; see [`SparseMatrix::remove_columns`]
    pub fn remove_columns(&mut self, handle: MatrixHandle, removed: &[usize], base: IndexBase) -> Result<()> {
        let id = self.parent_linkage(handle)?;
        let removed = self.slot_mut(handle)?.matrix.remove_columns(removed, base)?;
        self.notify_removal(handle, id, &removed, false, true)
    }

    /// Reference form of [`MatrixRegistry::remove_rows_columns`]
    pub fn remove_rows_columns_slow(
        &mut self,
        handle: MatrixHandle,
        removed: &[usize],
        base: IndexBase,
    ) -> Result<()> {
        let id = self.parent_linkage(handle)?;
        let removed = self.slot_mut(handle)?.matrix.remove_rows_columns_slow(removed, base)?;
        self.notify_removal(handle, id, &removed, true, true)
    }

    /// Reference form of [`MatrixRegistry::remove_rows`]
    pub fn remove_rows_slow(&mut self, handle: MatrixHandle, removed: &[usize], base: IndexBase) -> Result<()> {
        let id = self.parent_linkage(handle)?;
        let removed = self.slot_mut(handle)?.matrix.remove_rows_slow(removed, base)?;
        self.notify_removal(handle, id, &removed, true, false)
    }

    /// Reference form of [`MatrixRegistry::remove_columns`]
    pub fn remove_columns_slow(&mut self, handle: MatrixHandle, removed: &[usize], base: IndexBase) -> Result<()> {
        let id = self.parent_linkage(handle)?;
        let removed = self.slot_mut(handle)?.matrix.remove_columns_slow(removed, base)?;
        self.notify_removal(handle, id, &removed, false, true)
    }

    fn notify_removal(
        &mut self,
        handle: MatrixHandle,
        id: LinkageId,
        removed: &[usize],
        rows: bool,
        columns: bool,
    ) -> Result<()> {
        let linkage = self.linkage_mut(id)?;
        if rows {
            linkage.notify_removed_rows(removed);
        }
        if columns {
            linkage.notify_removed_columns(removed);
        }
        self.invalidate_linkages_of(handle);

        debug!(?handle, count = removed.len(), rows, columns, "eliminated from sub-matrix");
        Ok(())
    }

    fn parent_linkage(&self, handle: MatrixHandle) -> Result<LinkageId> {
        self.slot(handle)?.parent.ok_or_else(|| {
            SparseMatrixError::contract(format!("{:?} has no super-matrix linkage", handle))
        })
    }

    fn is_linked_as_sub(&self, handle: MatrixHandle) -> bool {
        self.linkages
            .iter()
            .flatten()
            .any(|linkage| linkage.sub_matrix() == handle)
    }

    fn invalidate_linkages_of(&mut self, handle: MatrixHandle) {
        for linkage in self.linkages.iter_mut().flatten() {
            if linkage.super_matrix() == handle || linkage.sub_matrix() == handle {
                linkage.invalidate();
            }
        }
    }

    fn slot(&self, handle: MatrixHandle) -> Result<&MatrixSlot> {
        self.slots
            .get(handle.0)
            .and_then(Option::as_ref)
            .ok_or(SparseMatrixError::UnknownMatrix(handle))
    }

    fn slot_mut(&mut self, handle: MatrixHandle) -> Result<&mut MatrixSlot> {
        self.slots
            .get_mut(handle.0)
            .and_then(Option::as_mut)
            .ok_or(SparseMatrixError::UnknownMatrix(handle))
    }
}

/// Disjoint mutable borrows of two different matrices
fn matrix_pair_mut(
    slots: &mut [Option<MatrixSlot>],
    first: MatrixHandle,
    second: MatrixHandle,
) -> Result<(&mut SparseMatrix, &mut SparseMatrix)> {
    if first == second {
        return Err(SparseMatrixError::contract(format!(
            "matrix {:?} cannot be linked to itself",
            first
        )));
    }

    let (low, high) = if first.0 < second.0 { (first, second) } else { (second, first) };
    if high.0 >= slots.len() {
        return Err(SparseMatrixError::UnknownMatrix(high));
    }

    let (left, right) = slots.split_at_mut(high.0);
    let low_matrix = &mut left[low.0]
        .as_mut()
        .ok_or(SparseMatrixError::UnknownMatrix(low))?
        .matrix;
    let high_matrix = &mut right[0]
        .as_mut()
        .ok_or(SparseMatrixError::UnknownMatrix(high))?
        .matrix;

    if first.0 < second.0 {
        Ok((low_matrix, high_matrix))
    } else {
        Ok((high_matrix, low_matrix))
    }
}
