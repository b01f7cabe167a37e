//! Error types for matrix operations
//!
//! Precondition violations that are cheap to detect (duplicate entries, missing
//! linkages, stale handles) surface as [`SparseMatrixError::ContractViolation`]
//! instead of aborting. Numeric hazards such as a zero diagonal are not checked
//! and propagate as IEEE infinities or NaNs.

use thiserror::Error;

use crate::linkage::{LinkageId, MatrixHandle};

/// Errors from sparse matrix, linkage and projection operations
#[derive(Debug, Error)]
pub enum SparseMatrixError {
    #[error("Contract violation: {0}")]
    ContractViolation(String),

    #[error("Unknown matrix handle: {0:?}")]
    UnknownMatrix(MatrixHandle),

    #[error("Unknown linkage: {0:?}")]
    UnknownLinkage(LinkageId),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SparseMatrixError {
    pub(crate) fn contract(message: impl Into<String>) -> Self {
        SparseMatrixError::ContractViolation(message.into())
    }
}

/// Convenience type alias for results of this crate
pub type Result<T> = std::result::Result<T, SparseMatrixError>;
