//! Configuration for exports, eliminations and projections

/// Index base used by removal lists and exported index arrays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexBase {
    /// C-style indexing, first row is 0
    #[default]
    Zero,
    /// Fortran-style indexing, first row is 1
    One,
}

impl IndexBase {
    /// Offset added to a 0-based index when exporting
    pub fn offset(&self) -> usize {
        match self {
            IndexBase::Zero => 0,
            IndexBase::One => 1,
        }
    }

    /// Converts an index expressed in this base to a 0-based index
    ///
    /// Returns `None` for index 0 in a 1-based list.
    pub fn to_zero_based(&self, index: usize) -> Option<usize> {
        index.checked_sub(self.offset())
    }
}

/// Options for the compressed-row exports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExportOptions {
    /// Keep only entries with column >= row
    pub upper_triangle_only: bool,

    /// Base of the exported row pointers and column indices
    pub index_base: IndexBase,
}

impl ExportOptions {
    /// Options matching the usual 1-based, upper-triangle solver ABI
    pub fn solver_upper_one_based() -> Self {
        Self {
            upper_triangle_only: true,
            index_base: IndexBase::One,
        }
    }
}

/// Configuration for the outline-based projection
#[derive(Debug, Clone)]
pub struct ConjugationConfig {
    /// Emit a progress event every `progress_interval` source rows.
    /// Zero disables progress events.
    pub progress_interval: usize,

    /// Drop accumulated entries that are exactly zero when materializing
    pub drop_exact_zeros: bool,
}

impl Default for ConjugationConfig {
    fn default() -> Self {
        Self {
            progress_interval: 100,
            drop_exact_zeros: false,
        }
    }
}

impl ConjugationConfig {
    /// Configuration that never emits progress events
    pub fn quiet() -> Self {
        Self {
            progress_interval: 0,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_base_conversion() {
        assert_eq!(IndexBase::Zero.to_zero_based(0), Some(0));
        assert_eq!(IndexBase::One.to_zero_based(1), Some(0));
        assert_eq!(IndexBase::One.to_zero_based(0), None);
        assert_eq!(IndexBase::One.offset(), 1);
    }

    #[test]
    fn test_defaults() {
        let options = ExportOptions::default();
        assert!(!options.upper_triangle_only);
        assert_eq!(options.index_base, IndexBase::Zero);

        let config = ConjugationConfig::default();
        assert_eq!(config.progress_interval, 100);
        assert_eq!(ConjugationConfig::quiet().progress_interval, 0);
    }
}
