// Row-sparse matrix storage and operations

pub mod arithmetic;
pub mod caches;
pub mod config;
pub mod elimination;
pub mod export;
pub mod outline;
pub mod sparse;

pub use config::{ConjugationConfig, ExportOptions, IndexBase};
pub use export::{CompressedRowFormat, FourArrayFormat, NagFormat};
pub use outline::{OutlineSource, SparseMatrixOutline};
pub use sparse::SparseMatrix;
