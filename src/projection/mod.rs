//! Galerkin projection of a sparse operator onto a reduced basis
//!
//! Given an N×N matrix M and a basis U with N rows and r columns, the reduced
//! matrix is M̃ = UᵗMU (r×r). Three variants are provided:
//!
//! - [`conjugate`]: accumulates contributions into an outline and discovers
//!   the reduced pattern on the way. Suited to one-off projections.
//! - [`ConjugationIndices`]: records, once, which source entries contribute
//!   to each reduced entry, then replays those terms whenever the values of M
//!   or U change but their patterns do not.
//! - [`conjugate_dense`]: U given as a dense array, for small r.
//!
//! None of the variants check that U has as many rows as M.

mod dense;
mod precomputed;

pub use dense::conjugate_dense;
pub use precomputed::{ConjugationIndices, ConjugationTerm};

use tracing::debug;

use crate::matrix::{ConjugationConfig, OutlineSource, SparseMatrix, SparseMatrixOutline};

/// UᵗMU via an accumulating outline
///
/// The result has `basis.num_columns()` rows. Entries that cancel to exactly
/// zero are kept unless `config.drop_exact_zeros` is set.
pub fn conjugate(matrix: &SparseMatrix, basis: &SparseMatrix, config: &ConjugationConfig) -> SparseMatrix {
    let num_rows = matrix.num_rows();
    let mut outline = SparseMatrixOutline::new(basis.num_columns());

    for i in 0..num_rows {
        if config.progress_interval > 0 && i % config.progress_interval == 0 {
            debug!(row = i, num_rows, "conjugation progress");
        }

        for (column, value) in matrix.row(i) {
            for (k, u_ik) in basis.row(i) {
                let factor = value * u_ik;
                for (l, u_cl) in basis.row(column) {
                    outline.add_entry(k, l, factor * u_cl);
                }
            }
        }
    }

    if config.drop_exact_zeros {
        let rows: Vec<Vec<(usize, f64)>> = (0..outline.num_rows())
            .map(|k| outline.row_entries(k).filter(|&(_, value)| value != 0.0).collect())
            .collect();
        SparseMatrix::from_rows(rows)
    } else {
        SparseMatrix::from_outline(&outline)
    }
}

/// Pattern of UᵗMU with all values zero
///
/// Every position any product term can reach is present, including those
/// whose contributions would cancel.
pub fn conjugation_pattern(matrix: &SparseMatrix, basis: &SparseMatrix) -> SparseMatrix {
    let mut outline = SparseMatrixOutline::new(basis.num_columns());

    for i in 0..matrix.num_rows() {
        for &column in matrix.row_columns(i) {
            for &k in basis.row_columns(i) {
                for &l in basis.row_columns(column) {
                    outline.add_pattern_entry(k, l);
                }
            }
        }
    }

    SparseMatrix::from_outline(&outline)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_basis_reproduces_matrix() {
        let matrix = SparseMatrix::from_triplets(
            3,
            &[(0, 0, 2.0), (0, 1, 1.0), (1, 0, 1.0), (1, 1, 3.0), (2, 2, 5.0)],
        );
        let reduced = conjugate(&matrix, &SparseMatrix::identity(3), &ConjugationConfig::quiet());
        assert_eq!(reduced, matrix);
    }

    #[test]
    fn test_lumping_basis() {
        // U lumps rows 0 and 1 into reduced dof 0; row 2 maps to dof 1
        let matrix = SparseMatrix::from_triplets(
            3,
            &[(0, 0, 2.0), (0, 1, -1.0), (1, 0, -1.0), (1, 1, 2.0), (2, 2, 4.0)],
        );
        let basis = SparseMatrix::from_triplets(3, &[(0, 0, 1.0), (1, 0, 1.0), (2, 1, 1.0)]);

        let reduced = conjugate(&matrix, &basis, &ConjugationConfig::default());

        assert_eq!(reduced.num_rows(), 2);
        assert_eq!(reduced.get(0, 0), 2.0);
        assert_eq!(reduced.get(1, 1), 4.0);
        assert_eq!(reduced.find_column_position(0, 1), None);
    }

    #[test]
    fn test_drop_exact_zeros() {
        let matrix = SparseMatrix::from_triplets(2, &[(0, 1, 1.0), (1, 0, -1.0)]);
        let basis = SparseMatrix::from_triplets(2, &[(0, 0, 1.0), (1, 0, 1.0)]);

        let kept = conjugate(&matrix, &basis, &ConjugationConfig::quiet());
        assert_eq!(kept.num_entries(), 1);
        assert_eq!(kept.get(0, 0), 0.0);

        let config = ConjugationConfig {
            drop_exact_zeros: true,
            ..ConjugationConfig::quiet()
        };
        let dropped = conjugate(&matrix, &basis, &config);
        assert_eq!(dropped.num_rows(), 1);
        assert_eq!(dropped.num_entries(), 0);
    }

    #[test]
    fn test_pattern_covers_cancelling_terms() {
        let matrix = SparseMatrix::from_triplets(2, &[(0, 1, 1.0), (1, 0, -1.0)]);
        let basis = SparseMatrix::from_triplets(2, &[(0, 0, 1.0), (1, 0, 1.0)]);

        let pattern = conjugation_pattern(&matrix, &basis);
        assert_eq!(pattern.row_columns(0), &[0]);
        assert_eq!(pattern.sum_entries(), 0.0);
    }
}
