//! Reusable contribution index for repeated projections

use tracing::debug;

use crate::error::{Result, SparseMatrixError};
use crate::matrix::{ConjugationConfig, SparseMatrix};
use crate::projection::conjugation_pattern;

/// One product term `M[i][e] · U[i][k] · U[c][l]` with `c = column_index(i, e)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConjugationTerm {
    /// Row `i` of M
    pub source_row: usize,
    /// Position `e` within row `i` of M
    pub source_entry: usize,
    /// Position `k` within row `i` of U
    pub basis_entry_row: usize,
    /// Position `l` within row `c` of U
    pub basis_entry_column: usize,
}

/// For every entry of a reduced matrix, the terms that sum to it
///
/// `terms[K][p]` lists the contributions to the entry stored at position `p`
/// of row `K` of the reduced matrix. The index stays valid as long as the
/// patterns of M, U and the reduced matrix are unchanged.
#[derive(Debug, Clone, Default)]
pub struct ConjugationIndices {
    terms: Vec<Vec<Vec<ConjugationTerm>>>,
}

impl ConjugationIndices {
    /// Records the terms of UᵗMU against the pattern of `reduced`
    ///
    /// Fails if some term lands on a position `reduced` does not store.
    pub fn build(matrix: &SparseMatrix, basis: &SparseMatrix, reduced: &SparseMatrix) -> Result<Self> {
        let mut terms: Vec<Vec<Vec<ConjugationTerm>>> = (0..reduced.num_rows())
            .map(|row| vec![Vec::new(); reduced.row_length(row)])
            .collect();

        for i in 0..matrix.num_rows() {
            for (e, &c) in matrix.row_columns(i).iter().enumerate() {
                for (k, &reduced_row) in basis.row_columns(i).iter().enumerate() {
                    for (l, &reduced_column) in basis.row_columns(c).iter().enumerate() {
                        let position = if reduced_row < reduced.num_rows() {
                            reduced.find_column_position(reduced_row, reduced_column)
                        } else {
                            None
                        };
                        let position = position.ok_or_else(|| {
                            SparseMatrixError::contract(format!(
                                "projection term lands on ({}, {}), which the reduced matrix does not store",
                                reduced_row, reduced_column
                            ))
                        })?;

                        terms[reduced_row][position].push(ConjugationTerm {
                            source_row: i,
                            source_entry: e,
                            basis_entry_row: k,
                            basis_entry_column: l,
                        });
                    }
                }
            }
        }

        let indices = Self { terms };
        debug!(
            reduced_rows = indices.terms.len(),
            num_terms = indices.num_terms(),
            "built conjugation indices"
        );
        Ok(indices)
    }

    /// Builds the reduced pattern, the index against it and the first
    /// reduced matrix in one go
    ///
    /// Unlike [`crate::projection::conjugate`], the pattern keeps positions
    /// whose terms cancel, so `config.drop_exact_zeros` is ignored.
    pub fn with_pattern(
        matrix: &SparseMatrix,
        basis: &SparseMatrix,
        config: &ConjugationConfig,
    ) -> Result<(Self, SparseMatrix)> {
        if config.drop_exact_zeros {
            debug!("drop_exact_zeros has no effect on a precomputed pattern");
        }

        let mut reduced = conjugation_pattern(matrix, basis);
        let indices = Self::build(matrix, basis, &reduced)?;
        indices.conjugate(matrix, basis, &mut reduced)?;
        Ok((indices, reduced))
    }

    /// Overwrites `reduced` with UᵗMU using the current values of M and U
    pub fn conjugate(&self, matrix: &SparseMatrix, basis: &SparseMatrix, reduced: &mut SparseMatrix) -> Result<()> {
        if reduced.num_rows() != self.terms.len()
            || self
                .terms
                .iter()
                .enumerate()
                .any(|(row, entries)| reduced.row_length(row) != entries.len())
        {
            return Err(SparseMatrixError::contract(
                "reduced matrix pattern differs from the one the conjugation indices were built for",
            ));
        }

        reduced.reset_to_zero();
        for (row, entries) in self.terms.iter().enumerate() {
            for (position, terms) in entries.iter().enumerate() {
                let value: f64 = terms
                    .iter()
                    .map(|term| {
                        let i = term.source_row;
                        let c = matrix.column_index(i, term.source_entry);
                        matrix.entry(i, term.source_entry)
                            * basis.entry(i, term.basis_entry_row)
                            * basis.entry(c, term.basis_entry_column)
                    })
                    .sum();
                reduced.set_entry(row, position, value);
            }
        }

        Ok(())
    }

    /// Total number of recorded terms
    pub fn num_terms(&self) -> usize {
        self.terms.iter().flatten().map(Vec::len).sum()
    }

    /// Terms contributing to the entry at `position` of reduced row `row`
    pub fn terms(&self, row: usize, position: usize) -> &[ConjugationTerm] {
        &self.terms[row][position]
    }
}
