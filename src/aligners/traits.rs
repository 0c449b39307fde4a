// traits.rs - Contract for external multiple-sequence aligners

use std::fmt::Debug;
use std::path::Path;
use std::time::Duration;

use crate::error::Result;

/// Black-box multiple aligner: FASTA file in, aligned FASTA text out.
///
/// Implementations classify failures as `ExternalToolUnavailable` (missing
/// binary, non-zero exit, empty output) or `ExternalToolTimeout`, and must
/// return within `timeout`.
pub trait ExternalAligner: Send + Sync + Debug {
    /// Run the tool on a FASTA input file
    fn run(&self, input: &Path, timeout: Duration) -> Result<String>;

    /// Get a human-readable name for this aligner
    fn name(&self) -> &str;

    /// Get a description of this aligner
    fn description(&self) -> &str {
        "external multiple-sequence aligner"
    }
}
