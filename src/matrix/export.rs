//! Numeric export formats
//!
//! Linear arrays, compressed-row layouts for external sparse solvers, a
//! 1-based lower-triangle layout for legacy direct solvers, dense arrays and
//! a plain-text dump. All traversals are row-major in storage order.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use ndarray::Array2;
use tracing::debug;

use crate::error::Result;
use crate::matrix::{ExportOptions, IndexBase, SparseMatrix};

/// Three-array compressed-row layout (values, row pointers, column indices)
#[derive(Debug, Clone, PartialEq)]
pub struct CompressedRowFormat {
    pub values: Vec<f64>,
    /// Row start offsets, length `num_rows + 1`
    pub row_pointers: Vec<usize>,
    pub column_indices: Vec<usize>,
}

/// Four-array compressed-row layout with separate row begin and end pointers
#[derive(Debug, Clone, PartialEq)]
pub struct FourArrayFormat {
    pub values: Vec<f64>,
    pub columns: Vec<usize>,
    pub pointer_b: Vec<usize>,
    pub pointer_e: Vec<usize>,
}

/// Lower triangle in 1-based coordinate form plus 0-based row starts
#[derive(Debug, Clone, PartialEq)]
pub struct NagFormat {
    pub values: Vec<f64>,
    pub rows: Vec<usize>,
    pub columns: Vec<usize>,
    /// Offset of the first entry of each row, length `num_rows + 1`
    pub row_starts: Vec<usize>,
}

impl SparseMatrix {
    /// Stored values in row-major order
    pub fn linear_data(&self) -> Vec<f64> {
        self.values.iter().flatten().copied().collect()
    }

    /// Row index of every stored entry
    pub fn linear_row_indices(&self) -> Vec<usize> {
        self.column_indices
            .iter()
            .enumerate()
            .flat_map(|(i, row)| std::iter::repeat(i).take(row.len()))
            .collect()
    }

    /// Column index of every stored entry
    pub fn linear_column_indices(&self) -> Vec<usize> {
        self.column_indices.iter().flatten().copied().collect()
    }

    /// Row indices as doubles, for numeric tooling that only takes doubles
    pub fn linear_row_indices_f64(&self) -> Vec<f64> {
        self.linear_row_indices().into_iter().map(|i| i as f64).collect()
    }

    /// Column indices as doubles
    pub fn linear_column_indices_f64(&self) -> Vec<f64> {
        self.linear_column_indices()
            .into_iter()
            .map(|i| i as f64)
            .collect()
    }

    /// Three-array compressed-row export
    pub fn to_compressed_row(&self, options: ExportOptions) -> CompressedRowFormat {
        let base = options.index_base.offset();
        let mut values = Vec::new();
        let mut row_pointers = Vec::with_capacity(self.num_rows() + 1);
        let mut column_indices = Vec::new();

        for row in 0..self.num_rows() {
            row_pointers.push(values.len() + base);
            for (column, value) in self.exported_row(row, options) {
                values.push(value);
                column_indices.push(column + base);
            }
        }
        row_pointers.push(values.len() + base);

        CompressedRowFormat {
            values,
            row_pointers,
            column_indices,
        }
    }

    /// Four-array compressed-row export (`pointer_b` / `pointer_e`)
    pub fn to_compressed_row_four_array(&self, options: ExportOptions) -> FourArrayFormat {
        let base = options.index_base.offset();
        let mut values = Vec::new();
        let mut columns = Vec::new();
        let mut pointer_b = Vec::with_capacity(self.num_rows());
        let mut pointer_e = Vec::with_capacity(self.num_rows());

        for row in 0..self.num_rows() {
            pointer_b.push(values.len() + base);
            for (column, value) in self.exported_row(row, options) {
                values.push(value);
                columns.push(column + base);
            }
            pointer_e.push(values.len() + base);
        }

        FourArrayFormat {
            values,
            columns,
            pointer_b,
            pointer_e,
        }
    }

    /// Lower-triangle export with 1-based coordinates
    pub fn to_nag_format(&self) -> NagFormat {
        let mut format = NagFormat {
            values: Vec::new(),
            rows: Vec::new(),
            columns: Vec::new(),
            row_starts: Vec::with_capacity(self.num_rows() + 1),
        };

        for row in 0..self.num_rows() {
            format.row_starts.push(format.values.len());
            for (column, value) in self.row(row).filter(|&(column, _)| column <= row) {
                format.values.push(value);
                format.rows.push(row + 1);
                format.columns.push(column + 1);
            }
        }
        format.row_starts.push(format.values.len());

        format
    }

    /// Dense copy of shape `(num_rows, num_columns)`
    pub fn to_dense(&self) -> Array2<f64> {
        self.to_dense_with_columns(self.num_columns())
    }

    /// Dense copy with an explicit column count
    ///
    /// Needed when trailing columns are all zero and therefore invisible to
    /// [`SparseMatrix::num_columns`].
    pub fn to_dense_with_columns(&self, num_columns: usize) -> Array2<f64> {
        let mut dense = Array2::zeros((self.num_rows(), num_columns));
        for i in 0..self.num_rows() {
            for (column, value) in self.row(i) {
                dense[(i, column)] = value;
            }
        }
        dense
    }

    /// Writes the text dump: row count, column count, then one
    /// `row column value` line per entry
    pub fn write_text<W: Write>(&self, writer: &mut W, base: IndexBase) -> Result<()> {
        writeln!(writer, "{}", self.num_rows())?;
        writeln!(writer, "{}", self.num_columns())?;
        self.write_entries(writer, base)
    }

    /// Saves the text dump to `path`
    pub fn save<P: AsRef<Path>>(&self, path: P, base: IndexBase) -> Result<()> {
        let path = path.as_ref();
        let mut writer = BufWriter::new(File::create(path)?);
        self.write_text(&mut writer, base)?;
        writer.flush()?;
        debug!(path = %path.display(), entries = self.num_entries(), "saved sparse matrix");
        Ok(())
    }

    /// Saves 1-based `row column value` lines without the header, as read by
    /// `spconvert`-style loaders
    pub fn save_matlab<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path.as_ref())?);
        self.write_entries(&mut writer, IndexBase::One)?;
        writer.flush()?;
        Ok(())
    }

    fn write_entries<W: Write>(&self, writer: &mut W, base: IndexBase) -> Result<()> {
        let offset = base.offset();
        for i in 0..self.num_rows() {
            for (column, value) in self.row(i) {
                writeln!(
                    writer,
                    "{} {} {}",
                    i + offset,
                    column + offset,
                    format_general(value, 15)
                )?;
            }
        }
        Ok(())
    }

    fn exported_row(
        &self,
        row: usize,
        options: ExportOptions,
    ) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.row(row)
            .filter(move |&(column, _)| !options.upper_triangle_only || column >= row)
    }
}

/// Formats `value` like C's `%.<precision>G`
///
/// Uses fixed notation when the decimal exponent lies in
/// `-4..precision`, exponent notation (`E+XX`) otherwise, and strips
/// trailing zeros in both cases.
pub(crate) fn format_general(value: f64, precision: usize) -> String {
    if value.is_nan() {
        return if value.is_sign_negative() { "-NAN" } else { "NAN" }.to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "INF" } else { "-INF" }.to_string();
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    let precision = precision.max(1);
    // rounding to `precision` significant digits fixes the exponent
    let scientific = format!("{:.*e}", precision - 1, value);
    let (mantissa, exponent) = match scientific.split_once('e') {
        Some(parts) => parts,
        None => return scientific,
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if exponent < -4 || exponent >= precision as i32 {
        let mantissa = strip_trailing_zeros(mantissa);
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}E{}{:02}", mantissa, sign, exponent.abs())
    } else {
        let decimals = (precision as i32 - 1 - exponent).max(0) as usize;
        strip_trailing_zeros(&format!("{:.*}", decimals, value)).to_string()
    }
}

fn strip_trailing_zeros(number: &str) -> &str {
    if number.contains('.') {
        number.trim_end_matches('0').trim_end_matches('.')
    } else {
        number
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn example() -> SparseMatrix {
        //    [2 1 0]
        //    [1 3 0]
        //    [0 0 5]
        SparseMatrix::from_triplets(
            3,
            &[(0, 0, 2.0), (0, 1, 1.0), (1, 0, 1.0), (1, 1, 3.0), (2, 2, 5.0)],
        )
    }

    #[test]
    fn test_linear_arrays() {
        let matrix = example();
        assert_eq!(matrix.linear_data(), vec![2.0, 1.0, 1.0, 3.0, 5.0]);
        assert_eq!(matrix.linear_row_indices(), vec![0, 0, 1, 1, 2]);
        assert_eq!(matrix.linear_column_indices(), vec![0, 1, 0, 1, 2]);
        assert_eq!(matrix.linear_row_indices_f64(), vec![0.0, 0.0, 1.0, 1.0, 2.0]);
        assert_eq!(matrix.linear_column_indices_f64()[1], 1.0);
    }

    #[test]
    fn test_compressed_row_full() {
        let csr = example().to_compressed_row(ExportOptions::default());
        assert_eq!(csr.values, vec![2.0, 1.0, 1.0, 3.0, 5.0]);
        assert_eq!(csr.row_pointers, vec![0, 2, 4, 5]);
        assert_eq!(csr.column_indices, vec![0, 1, 0, 1, 2]);
    }

    #[test]
    fn test_compressed_row_upper_one_based() {
        let csr = example().to_compressed_row(ExportOptions::solver_upper_one_based());
        assert_eq!(csr.values, vec![2.0, 1.0, 3.0, 5.0]);
        assert_eq!(csr.row_pointers, vec![1, 3, 4, 5]);
        assert_eq!(csr.column_indices, vec![1, 2, 2, 3]);
    }

    #[test]
    fn test_four_array() {
        let format = example().to_compressed_row_four_array(ExportOptions::solver_upper_one_based());
        assert_eq!(format.pointer_b, vec![1, 3, 4]);
        assert_eq!(format.pointer_e, vec![3, 4, 5]);
        assert_eq!(format.columns, vec![1, 2, 2, 3]);
    }

    #[test]
    fn test_nag_format() {
        let nag = example().to_nag_format();
        assert_eq!(nag.values, vec![2.0, 1.0, 3.0, 5.0]);
        assert_eq!(nag.rows, vec![1, 2, 2, 3]);
        assert_eq!(nag.columns, vec![1, 1, 2, 3]);
        assert_eq!(nag.row_starts, vec![0, 1, 3, 4]);
    }

    #[test]
    fn test_dense() {
        let dense = example().to_dense();
        assert_eq!(dense.shape(), &[3, 3]);
        assert_eq!(dense[(1, 0)], 1.0);
        assert_eq!(dense[(2, 1)], 0.0);

        let padded = example().to_dense_with_columns(5);
        assert_eq!(padded.shape(), &[3, 5]);
    }

    #[test]
    fn test_write_text() {
        let matrix = SparseMatrix::from_triplets(2, &[(0, 0, 0.1), (1, 2, -2.5e-7)]);
        let mut buffer = Vec::new();
        matrix.write_text(&mut buffer, IndexBase::One).unwrap();

        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(text, "2\n3\n1 1 0.1\n2 3 -2.5E-07\n");
    }

    #[test]
    fn test_format_general() {
        assert_eq!(format_general(1.0, 15), "1");
        assert_eq!(format_general(0.1, 15), "0.1");
        assert_eq!(format_general(1.0 / 3.0, 15), "0.333333333333333");
        assert_eq!(format_general(123456.0, 15), "123456");
        assert_eq!(format_general(1e15, 15), "1E+15");
        assert_eq!(format_general(1e-5, 15), "1E-05");
        assert_eq!(format_general(0.0001, 15), "0.0001");
        assert_eq!(format_general(-0.0, 15), "-0");
        assert_eq!(format_general(f64::INFINITY, 15), "INF");
    }

    #[test]
    fn test_save_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("matrix.txt");
        example().save(&path, IndexBase::Zero).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "3");
        assert_eq!(lines[1], "3");
        assert_eq!(lines[2], "0 0 2");
        assert_eq!(lines.len(), 7);

        let matlab = dir.path().join("matrix.m");
        example().save_matlab(&matlab).unwrap();
        let text = std::fs::read_to_string(&matlab).unwrap();
        assert_eq!(text.lines().next(), Some("1 1 2"));
    }

    #[test]
    fn test_save_reports_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("matrix.txt");
        assert!(example().save(&path, IndexBase::Zero).is_err());
    }
}
