//! Super/sub-matrix linkages
//!
//! Matrices live in a [`MatrixRegistry`] and are addressed by
//! [`MatrixHandle`]. A linkage is a directed edge from a super-matrix to a
//! sub-matrix, owned by the registry and addressed by [`LinkageId`].

pub mod registry;
pub mod remapper;
pub mod sub_matrix;

pub use registry::MatrixRegistry;
pub use remapper::{IndexRemapper, OffsetIndexRemapper};
pub use sub_matrix::SubMatrixLinkage;

/// Stable handle of a matrix stored in a [`MatrixRegistry`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MatrixHandle(pub(crate) usize);

impl MatrixHandle {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Stable identifier of a linkage stored in a [`MatrixRegistry`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LinkageId(pub(crate) usize);

impl LinkageId {
    pub fn index(&self) -> usize {
        self.0
    }
}
