// error.rs - Error taxonomy shared by every stage of the pipeline

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PhyloError {
    /// Fewer sequences (or matrix rows) than an operation requires
    #[error("{operation} requires at least {required} sequences, got {found}")]
    InsufficientInput {
        operation: &'static str,
        required: usize,
        found: usize,
    },

    /// Negative, asymmetric or non-finite distance matrix
    #[error("Invalid distance matrix: {0}")]
    InvalidDistance(String),

    /// Malformed alignment input, e.g. unsupported residue symbols
    #[error("Alignment error: {0}")]
    AlignmentComputation(String),

    #[error("External aligner '{tool}' unavailable: {reason}")]
    ExternalToolUnavailable { tool: String, reason: String },

    #[error("External aligner '{tool}' timed out after {timeout:?}")]
    ExternalToolTimeout { tool: String, timeout: std::time::Duration },

    #[error("Invalid scoring scheme: {0}")]
    InvalidScoring(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("FASTA error: {0}")]
    Fasta(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PhyloError {
    /// Only external-tool failures may be downgraded into a degraded result.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            PhyloError::ExternalToolUnavailable { .. } | PhyloError::ExternalToolTimeout { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, PhyloError>;
