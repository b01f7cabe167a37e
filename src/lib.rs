//! # rowsparse: row-sparse matrices with sub-matrix linkages
//!
//! A sparse matrix engine for simulation codes that assemble an operator
//! once, then keep changing its values (and occasionally its pattern) every
//! time step.
//!
//! ## Overview
//!
//! - **Row-sparse store** ([`SparseMatrix`]): one sorted `(column, value)`
//!   list per row, so inserting an entry only shifts the affected row.
//! - **Linkages** ([`MatrixRegistry`]): a sub-matrix mirrors a block of a
//!   super-matrix. Values flow in both directions, and row/column
//!   eliminations on the sub-matrix are reported to an [`IndexRemapper`].
//! - **Elimination**: batch removal of rows and columns in time linear in the
//!   number of stored entries, with one-at-a-time reference forms.
//! - **Projection**: the Galerkin reduction UᵗMU, including a precomputed
//!   contribution index for repeated re-projection.
//!
//! ## Usage
//!
//! ```
//! use rowsparse::{ConjugationConfig, SparseMatrix, SparseMatrixOutline, conjugate};
//!
//! let mut outline = SparseMatrixOutline::new(2);
//! outline.add_entry(0, 0, 2.0);
//! outline.add_entry(0, 1, -1.0);
//! outline.add_entry(1, 0, -1.0);
//! outline.add_entry(1, 1, 2.0);
//! let matrix = SparseMatrix::from_outline(&outline);
//!
//! let mut y = vec![0.0; 2];
//! matrix.multiply_vector(&[1.0, 1.0], &mut y);
//! assert_eq!(y, vec![1.0, 1.0]);
//!
//! // lump both dofs into one
//! let basis = SparseMatrix::from_triplets(2, &[(0, 0, 1.0), (1, 0, 1.0)]);
//! let reduced = conjugate(&matrix, &basis, &ConjugationConfig::quiet());
//! assert_eq!(reduced.get(0, 0), 2.0);
//! ```
//!
//! Linked matrices live in a registry:
//!
//! ```
//! use rowsparse::{IndexBase, MatrixRegistry, SparseMatrix};
//!
//! let mut registry = MatrixRegistry::new();
//! let whole = registry.insert(SparseMatrix::identity(3));
//! let block = registry.insert(SparseMatrix::identity(3));
//! registry.attach_as_sub_matrix_of(block, whole).unwrap();
//!
//! registry.remove_rows_columns(block, &[1], IndexBase::Zero).unwrap();
//! registry.add_from_sub_matrix(whole, 1.0, block).unwrap();
//!
//! let whole = registry.get(whole).unwrap();
//! assert_eq!(whole.diagonal(), vec![2.0, 1.0, 2.0]);
//! ```

pub mod error;
pub mod linkage;
pub mod matrix;
pub mod projection;
pub mod utils;

// Re-export primary components
pub use error::{Result, SparseMatrixError};
pub use linkage::{
    IndexRemapper, LinkageId, MatrixHandle, MatrixRegistry, OffsetIndexRemapper, SubMatrixLinkage,
};
pub use matrix::{
    CompressedRowFormat, ConjugationConfig, ExportOptions, FourArrayFormat, IndexBase, NagFormat,
    OutlineSource, SparseMatrix, SparseMatrixOutline,
};
pub use projection::{
    conjugate, conjugate_dense, conjugation_pattern, ConjugationIndices, ConjugationTerm,
};
pub use utils::formats::{from_sprs_csr, to_sprs_csr};

/// Version information for the rowsparse library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
