use ndarray::{Array2, ArrayView2};

use crate::matrix::SparseMatrix;

/// UᵗMU for a dense basis U with one column per reduced dof
///
/// One sparse-times-dense product followed by a dense Uᵗ(MU).
pub fn conjugate_dense(matrix: &SparseMatrix, basis: &ArrayView2<f64>) -> Array2<f64> {
    let mu = matrix.multiply_matrix(basis);
    basis.t().dot(&mu)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::ConjugationConfig;
    use crate::projection::conjugate;
    use ndarray::array;

    #[test]
    fn test_dense_matches_sparse_basis() {
        let matrix = SparseMatrix::from_triplets(
            3,
            &[(0, 0, 2.0), (0, 1, 1.0), (1, 0, 1.0), (1, 1, 3.0), (1, 2, -1.0), (2, 2, 5.0)],
        );
        let basis = array![[1.0, 0.0], [0.5, 0.5], [0.0, 1.0]];

        let dense = conjugate_dense(&matrix, &basis.view());

        let mut sparse_basis = SparseMatrix::new(3);
        for i in 0..3 {
            for j in 0..2 {
                if basis[(i, j)] != 0.0 {
                    sparse_basis.insert_entry(i, j).unwrap();
                }
            }
        }
        for i in 0..3 {
            for j in 0..sparse_basis.row_length(i) {
                let column = sparse_basis.column_index(i, j);
                sparse_basis.set_entry(i, j, basis[(i, column)]);
            }
        }
        let sparse = conjugate(&matrix, &sparse_basis, &ConjugationConfig::quiet()).to_dense();

        assert_eq!(dense.dim(), (2, 2));
        for ((k, l), value) in dense.indexed_iter() {
            assert!((value - sparse[(k, l)]).abs() < 1e-12);
        }
    }

    #[test]
    fn test_single_column_basis_is_quadratic_form() {
        let matrix = SparseMatrix::from_triplets(2, &[(0, 0, 2.0), (0, 1, 1.0), (1, 0, 1.0), (1, 1, 3.0)]);
        let basis = array![[1.0], [2.0]];

        let dense = conjugate_dense(&matrix, &basis.view());
        assert_eq!(dense[(0, 0)], matrix.quadratic_form(&[1.0, 2.0]));
    }
}
