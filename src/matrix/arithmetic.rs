//! Arithmetic on row-sparse matrices
//!
//! Dimensions are a caller obligation: vectors shorter than the matrix
//! requires panic through slice indexing, and elementwise operations between
//! matrices assume an identical sparsity pattern (no pattern union is
//! performed, a mismatched pattern silently gives wrong values).

use std::ops::{Add, AddAssign, Mul, MulAssign, Sub, SubAssign};

use ndarray::{Array2, ArrayView2};
use tracing::debug;

use crate::matrix::SparseMatrix;

impl SparseMatrix {
    /// result = M * x
    pub fn multiply_vector(&self, x: &[f64], result: &mut [f64]) {
        self.multiply_vector_rows(0, self.num_rows(), x, result);
    }

    /// result = M(start_row..end_row, :) * x
    ///
    /// `result[i - start_row]` receives row `i`.
    pub fn multiply_vector_rows(
        &self,
        start_row: usize,
        end_row: usize,
        x: &[f64],
        result: &mut [f64],
    ) {
        for i in start_row..end_row {
            result[i - start_row] = self.row_dot(i, x);
        }
    }

    /// result += M * x
    pub fn multiply_vector_add(&self, x: &[f64], result: &mut [f64]) {
        for (i, out) in result.iter_mut().enumerate().take(self.num_rows()) {
            *out += self.row_dot(i, x);
        }
    }

    /// result -= M * x
    pub fn multiply_vector_subtract(&self, x: &[f64], result: &mut [f64]) {
        for (i, out) in result.iter_mut().enumerate().take(self.num_rows()) {
            *out -= self.row_dot(i, x);
        }
    }

    /// result = Mᵗ * x
    ///
    /// `result` is zeroed first; its length is the number of columns of the
    /// product and must cover every stored column.
    pub fn transpose_multiply_vector(&self, x: &[f64], result: &mut [f64]) {
        result.iter_mut().for_each(|r| *r = 0.0);
        self.transpose_multiply_vector_add(x, result);
    }

    /// result += Mᵗ * x
    pub fn transpose_multiply_vector_add(&self, x: &[f64], result: &mut [f64]) {
        for i in 0..self.num_rows() {
            let xi = x[i];
            for (column, value) in self.row(i) {
                result[column] += xi * value;
            }
        }
    }

    /// M * D for a dense matrix D with one column per right-hand side
    pub fn multiply_matrix(&self, dense: &ArrayView2<f64>) -> Array2<f64> {
        let mut result = Array2::zeros((self.num_rows(), dense.ncols()));
        self.multiply_matrix_add(dense, &mut result);
        result
    }

    /// result += M * D
    pub fn multiply_matrix_add(&self, dense: &ArrayView2<f64>, result: &mut Array2<f64>) {
        for c in 0..dense.ncols() {
            for i in 0..self.num_rows() {
                let mut sum = 0.0;
                for (column, value) in self.row(i) {
                    sum += dense[(column, c)] * value;
                }
                result[(i, c)] += sum;
            }
        }
    }

    /// M * Dᵗ, where D has one row per output column
    pub fn multiply_matrix_transpose(&self, dense: &ArrayView2<f64>) -> Array2<f64> {
        let mut result = Array2::zeros((self.num_rows(), dense.nrows()));
        for c in 0..dense.nrows() {
            for i in 0..self.num_rows() {
                let mut sum = 0.0;
                for (column, value) in self.row(i) {
                    sum += dense[(c, column)] * value;
                }
                result[(i, c)] = sum;
            }
        }
        result
    }

    /// xᵗ M x, reading only the upper triangle
    ///
    /// Each stored entry with column >= row contributes once on the diagonal
    /// and twice off the diagonal; entries below the diagonal are skipped.
    /// For a symmetric matrix this is the full quadratic form whether or not
    /// the lower triangle is stored. Storing both triangles with different
    /// values is not meaningful here.
    pub fn quadratic_form(&self, x: &[f64]) -> f64 {
        let mut result = 0.0;
        for i in 0..self.num_rows() {
            for (column, value) in self.row(i) {
                if column < i {
                    continue;
                }
                if column == i {
                    result += value * x[i] * x[column];
                } else {
                    result += 2.0 * value * x[i] * x[column];
                }
            }
        }
        result
    }

    /// Scales `x` to unit length in the norm induced by this matrix
    pub fn normalize_vector(&self, x: &mut [f64]) {
        let norm = self.quadratic_form(x).sqrt();
        for xi in x.iter_mut().take(self.num_rows()) {
            *xi /= norm;
        }
    }

    /// Multiplies every stored value by `alpha`
    pub fn scale(&mut self, alpha: f64) {
        for row in &mut self.values {
            row.iter_mut().for_each(|v| *v *= alpha);
        }
    }

    /// dest = alpha * M (dest must share the pattern)
    pub fn scalar_multiply_into(&self, alpha: f64, dest: &mut SparseMatrix) {
        for (src, dst) in self.values.iter().zip(dest.values.iter_mut()) {
            for (s, d) in src.iter().zip(dst.iter_mut()) {
                *d = s * alpha;
            }
        }
    }

    /// dest += alpha * M (dest must share the pattern)
    pub fn scalar_multiply_add_into(&self, alpha: f64, dest: &mut SparseMatrix) {
        for (src, dst) in self.values.iter().zip(dest.values.iter_mut()) {
            for (s, d) in src.iter().zip(dst.iter_mut()) {
                *d += s * alpha;
            }
        }
    }

    /// Multiplies all entries of row `row` by `scalar`
    pub fn multiply_row(&mut self, row: usize, scalar: f64) {
        self.values[row].iter_mut().for_each(|v| *v *= scalar);
    }

    /// Copies the values of `source` (same pattern) into this matrix
    pub fn assign_values_from(&mut self, source: &SparseMatrix) {
        for (dst, src) in self.values.iter_mut().zip(&source.values) {
            let len = dst.len();
            dst.copy_from_slice(&src[..len]);
        }
    }

    /// Zeroes every stored value of row `row`; the pattern is kept
    pub fn reset_row_to_zero(&mut self, row: usize) {
        self.values[row].iter_mut().for_each(|v| *v = 0.0);
    }

    /// Zeroes every stored value; the pattern is kept
    pub fn reset_to_zero(&mut self) {
        for row in 0..self.num_rows() {
            self.reset_row_to_zero(row);
        }
    }

    /// Largest absolute stored value
    pub fn max_abs_entry(&self) -> f64 {
        self.values
            .iter()
            .flatten()
            .fold(0.0, |max: f64, v| max.max(v.abs()))
    }

    /// Sum of squares of the entries of row `row`
    pub fn row_norm2(&self, row: usize) -> f64 {
        self.values[row].iter().map(|v| v * v).sum()
    }

    /// Maximum absolute row sum
    pub fn infinity_norm(&self) -> f64 {
        self.values
            .iter()
            .map(|row| row.iter().map(|v| v.abs()).sum::<f64>())
            .fold(0.0, f64::max)
    }

    /// Sum of all stored values
    pub fn sum_entries(&self) -> f64 {
        self.values.iter().flatten().sum()
    }

    /// Sum of the stored values of each row
    pub fn sum_row_entries(&self) -> Vec<f64> {
        self.values.iter().map(|row| row.iter().sum()).collect()
    }

    /// Solves M x = rhs in place, assuming M is diagonal
    ///
    /// The first stored entry of each row is taken as the diagonal.
    pub fn diagonal_solve(&self, rhs: &mut [f64]) {
        for (i, r) in rhs.iter_mut().enumerate().take(self.num_rows()) {
            *r /= self.values[i][0];
        }
    }

    /// residual = M x - b
    pub fn compute_residual(&self, x: &[f64], b: &[f64], residual: &mut [f64]) {
        self.multiply_vector(x, residual);
        for (r, bi) in residual.iter_mut().zip(b) {
            *r -= bi;
        }
    }

    /// Relative infinity-norm residual ||Mx - b|| / ||b||
    pub fn check_linear_system_solution(&self, x: &[f64], b: &[f64]) -> f64 {
        let mut buffer = vec![0.0; self.num_rows()];
        self.multiply_vector(x, &mut buffer);

        let mut residual_norm: f64 = 0.0;
        let mut rhs_norm: f64 = 0.0;
        for (mx, bi) in buffer.iter().zip(b) {
            residual_norm = residual_norm.max((mx - bi).abs());
            rhs_norm = rhs_norm.max(bi.abs());
        }

        debug!(
            residual_norm,
            rhs_norm,
            relative = residual_norm / rhs_norm,
            "linear system residual"
        );

        residual_norm / rhs_norm
    }

    fn row_dot(&self, row: usize, x: &[f64]) -> f64 {
        self.row(row).map(|(column, value)| x[column] * value).sum()
    }
}

impl Add<&SparseMatrix> for &SparseMatrix {
    type Output = SparseMatrix;

    fn add(self, other: &SparseMatrix) -> SparseMatrix {
        let mut result = self.clone();
        result += other;
        result
    }
}

impl Sub<&SparseMatrix> for &SparseMatrix {
    type Output = SparseMatrix;

    fn sub(self, other: &SparseMatrix) -> SparseMatrix {
        let mut result = self.clone();
        result -= other;
        result
    }
}

impl AddAssign<&SparseMatrix> for SparseMatrix {
    fn add_assign(&mut self, other: &SparseMatrix) {
        for (dst, src) in self.values.iter_mut().zip(&other.values) {
            for (d, s) in dst.iter_mut().zip(src) {
                *d += s;
            }
        }
    }
}

impl SubAssign<&SparseMatrix> for SparseMatrix {
    fn sub_assign(&mut self, other: &SparseMatrix) {
        for (dst, src) in self.values.iter_mut().zip(&other.values) {
            for (d, s) in dst.iter_mut().zip(src) {
                *d -= s;
            }
        }
    }
}

impl MulAssign<f64> for SparseMatrix {
    fn mul_assign(&mut self, alpha: f64) {
        self.scale(alpha);
    }
}

impl Mul<&SparseMatrix> for f64 {
    type Output = SparseMatrix;

    fn mul(self, matrix: &SparseMatrix) -> SparseMatrix {
        let mut result = matrix.clone();
        result.scale(self);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn example() -> SparseMatrix {
        SparseMatrix::from_triplets(
            3,
            &[(0, 0, 2.0), (0, 1, 1.0), (1, 0, 1.0), (1, 1, 3.0), (2, 2, 5.0)],
        )
    }

    #[test]
    fn test_multiply_vector() {
        let matrix = example();
        let mut result = vec![0.0; 3];
        matrix.multiply_vector(&[1.0, 1.0, 1.0], &mut result);
        assert_eq!(result, vec![3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_multiply_vector_rows() {
        let matrix = example();
        let mut result = vec![0.0; 2];
        matrix.multiply_vector_rows(1, 3, &[1.0, 2.0, 3.0], &mut result);
        assert_eq!(result, vec![7.0, 15.0]);
    }

    #[test]
    fn test_multiply_add_subtract() {
        let matrix = example();
        let mut result = vec![1.0; 3];
        matrix.multiply_vector_add(&[1.0, 1.0, 1.0], &mut result);
        assert_eq!(result, vec![4.0, 5.0, 6.0]);
        matrix.multiply_vector_subtract(&[1.0, 1.0, 1.0], &mut result);
        assert_eq!(result, vec![1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_transpose_multiply() {
        let matrix = SparseMatrix::from_triplets(2, &[(0, 1, 2.0), (1, 0, 3.0), (1, 2, 1.0)]);
        let mut result = vec![9.0; 3];
        matrix.transpose_multiply_vector(&[1.0, 2.0], &mut result);
        assert_eq!(result, vec![6.0, 2.0, 2.0]);
    }

    #[test]
    fn test_multiply_matrix() {
        let matrix = example();
        let dense = array![[1.0, 0.0], [0.0, 1.0], [1.0, 2.0]];
        let result = matrix.multiply_matrix(&dense.view());

        assert_eq!(result, array![[2.0, 1.0], [1.0, 3.0], [5.0, 10.0]]);
    }

    #[test]
    fn test_multiply_matrix_transpose() {
        let matrix = example();
        let dense = array![[1.0, 0.0, 1.0], [0.0, 1.0, 2.0]];
        let result = matrix.multiply_matrix_transpose(&dense.view());

        assert_eq!(result, array![[2.0, 1.0], [1.0, 3.0], [5.0, 10.0]]);
    }

    #[test]
    fn test_quadratic_form_single_triangle() {
        // upper triangle of [[2, 1], [1, 3]]
        let upper = SparseMatrix::from_triplets(2, &[(0, 0, 2.0), (0, 1, 1.0), (1, 1, 3.0)]);
        let full = SparseMatrix::from_triplets(
            2,
            &[(0, 0, 2.0), (0, 1, 1.0), (1, 0, 1.0), (1, 1, 3.0)],
        );
        let x = [1.0, 2.0];

        // 2 + 2*1*2 + 3*4 = 18
        assert_eq!(upper.quadratic_form(&x), 18.0);
        assert_eq!(full.quadratic_form(&x), 18.0);
    }

    #[test]
    fn test_normalize_vector() {
        let matrix = SparseMatrix::identity(2);
        let mut x = vec![3.0, 4.0];
        matrix.normalize_vector(&mut x);
        assert!((x[0] - 0.6).abs() < 1e-12);
        assert!((x[1] - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_operators() {
        let a = example();
        let doubled = 2.0 * &a;
        let sum = &a + &a;
        assert_eq!(doubled, sum);

        let zero = &a - &a;
        assert_eq!(zero.max_abs_entry(), 0.0);
        assert_eq!(zero.row_lengths(), a.row_lengths());

        let mut scaled = a.clone();
        scaled *= 0.5;
        scaled += &a;
        assert_eq!(scaled.get(2, 2), 7.5);
        scaled -= &a;
        assert_eq!(scaled.get(2, 2), 2.5);
    }

    #[test]
    fn test_scalar_multiply_into() {
        let a = example();
        let mut dest = a.clone();
        a.scalar_multiply_into(3.0, &mut dest);
        assert_eq!(dest.get(1, 1), 9.0);
        a.scalar_multiply_add_into(1.0, &mut dest);
        assert_eq!(dest.get(1, 1), 12.0);
    }

    #[test]
    fn test_norms() {
        let matrix = SparseMatrix::from_triplets(2, &[(0, 0, -4.0), (0, 1, 3.0), (1, 1, 1.0)]);
        assert_eq!(matrix.max_abs_entry(), 4.0);
        assert_eq!(matrix.row_norm2(0), 25.0);
        assert_eq!(matrix.infinity_norm(), 7.0);
        assert_eq!(matrix.sum_entries(), 0.0);
        assert_eq!(matrix.sum_row_entries(), vec![-1.0, 1.0]);
    }

    #[test]
    fn test_reset_keeps_structure() {
        let mut matrix = example();
        matrix.reset_row_to_zero(0);
        assert_eq!(matrix.row_values(0), &[0.0, 0.0]);
        assert_eq!(matrix.get(1, 1), 3.0);

        matrix.reset_to_zero();
        assert_eq!(matrix.num_entries(), 5);
        assert_eq!(matrix.max_abs_entry(), 0.0);
    }

    #[test]
    fn test_diagonal_solve_and_residual() {
        let matrix = SparseMatrix::from_triplets(2, &[(0, 0, 2.0), (1, 1, 4.0)]);
        let b = vec![2.0, 8.0];
        let mut x = b.clone();
        matrix.diagonal_solve(&mut x);
        assert_eq!(x, vec![1.0, 2.0]);

        let mut residual = vec![0.0; 2];
        matrix.compute_residual(&x, &b, &mut residual);
        assert_eq!(residual, vec![0.0, 0.0]);
        assert_eq!(matrix.check_linear_system_solution(&x, &b), 0.0);
    }

    #[test]
    fn test_multiply_row_and_assign() {
        let mut matrix = example();
        matrix.multiply_row(2, 2.0);
        assert_eq!(matrix.get(2, 2), 10.0);

        matrix.assign_values_from(&example());
        assert_eq!(matrix, example());
    }
}
