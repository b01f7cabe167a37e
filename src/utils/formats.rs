//! Conversion between [`SparseMatrix`] and `sprs` compressed matrices

use sprs::CsMat;

use crate::matrix::SparseMatrix;
use crate::utils::exclusive_scan;

/// Converts a row-sparse matrix to an `sprs` CSR matrix
///
/// `num_columns` defaults to [`SparseMatrix::num_columns`]; pass it when
/// trailing columns are all zero. Rows must be sorted, as `sprs` checks.
pub fn to_sprs_csr(matrix: &SparseMatrix, num_columns: Option<usize>) -> CsMat<f64> {
    let num_columns = num_columns.unwrap_or_else(|| matrix.num_columns());
    let indptr = exclusive_scan(&matrix.row_lengths());

    CsMat::new(
        (matrix.num_rows(), num_columns),
        indptr,
        matrix.linear_column_indices(),
        matrix.linear_data(),
    )
}

/// Converts an `sprs` matrix (CSR or CSC) to a row-sparse matrix
pub fn from_sprs_csr(matrix: &CsMat<f64>) -> SparseMatrix {
    let csr;
    let matrix = if matrix.is_csr() {
        matrix
    } else {
        csr = matrix.to_csr();
        &csr
    };

    let rows: Vec<Vec<(usize, f64)>> = matrix
        .outer_iterator()
        .map(|row| row.iter().map(|(column, &value)| (column, value)).collect())
        .collect();

    SparseMatrix::from_rows(rows)
}
