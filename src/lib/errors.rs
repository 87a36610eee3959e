//! Custom error types for fgvar operations.

use thiserror::Error;

/// Result type alias for fgvar operations
pub type Result<T> = std::result::Result<T, FgvarError>;

/// Error type for fgvar operations
#[derive(Error, Debug)]
pub enum FgvarError {
    /// Invalid parameter value provided
    #[error("Invalid parameter '{parameter}': {reason}")]
    InvalidParameter {
        /// The parameter name
        parameter: String,
        /// Explanation of why it's invalid
        reason: String,
    },

    /// File format error
    #[error("Invalid {file_type} file '{path}': {reason}")]
    InvalidFileFormat {
        /// Type of file (e.g., "Reference FASTA", "Candidate TSV")
        file_type: String,
        /// Path to the file
        path: String,
        /// Explanation of the problem
        reason: String,
    },

    /// Required reference sequence not found
    #[error("Reference sequence '{ref_name}' not found")]
    ReferenceNotFound {
        /// The reference sequence name
        ref_name: String,
    },

    /// A region task failed while computing its candidate variants.
    ///
    /// Surfaced by the merger at the point the region would have been merged.
    #[error("Failed to compute candidates for region {region}: {reason}")]
    RegionComputation {
        /// The region, formatted as `chrom:start-end`
        region: String,
        /// The underlying failure, including its cause chain
        reason: String,
    },

    /// Two nearby calls could not be combined into one.
    #[error("Failed to merge {variants}: {reason}")]
    MergeFailed {
        /// The calls being merged, e.g. `chr1:1498 A>T + chr1:1501 G>C`
        variants: String,
        /// The underlying failure
        reason: String,
    },

    /// Variants or regions arrived out of coordinate order.
    ///
    /// This is an internal-consistency fault and is always fatal.
    #[error("Ordering violation in {context}: {reason}")]
    OrderingViolation {
        /// Where the violation was detected (a region or a pipeline stage)
        context: String,
        /// What went out of order
        reason: String,
    },
}

impl FgvarError {
    /// Returns true for errors that must abort the run regardless of the caller's policy.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, FgvarError::OrderingViolation { .. })
    }
}
