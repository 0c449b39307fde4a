// lib.rs - seqphylo library root

//! # seqphylo - Affine-gap sequence alignment and UPGMA phylogenies
//!
//! Pairwise alignment under an affine-gap scoring model (global or local),
//! normalized distance matrices computed in parallel, UPGMA tree building,
//! and multiple alignment through an external tool with an explicitly
//! approximate fallback.
//!
//! ## Features
//!
//! - **Exact DP**: three-state Gotoh recurrences, score-only in linear memory or with traceback
//! - **Co-optimal counting**: number of distinct optimal alignments on demand
//! - **Parallel distances**: every unordered pair aligned once with rayon
//! - **Deterministic UPGMA**: ties broken by leaf names, independent of input order
//! - **Multiple formats**: TSV, CSV, PHYLIP, NEXUS matrices; Newick and JSON trees
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! use seqphylo::prelude::*;
//!
//! let sequences = SequenceSet::from_pairs([
//!     ("S1", "ACGTACGT"),
//!     ("S2", "ACGTACGA"),
//!     ("S3", "TTTTTTTT"),
//! ])?;
//!
//! let scheme = ScoringScheme::from_preset("default")?;
//! let matrix = calculate_distance_matrix(&sequences, &scheme)?;
//! let tree = upgma(&matrix)?;
//! println!("{}", tree.to_newick());
//! # Ok::<(), seqphylo::PhyloError>(())
//! ```

pub mod aligners;
pub mod cli;
pub mod core;
pub mod data;
pub mod error;
pub mod output;

// Convenience prelude for common imports
pub mod prelude {
    pub use crate::aligners::{AlignerRegistry, CommandAligner, ExternalAligner};
    pub use crate::cli::{validate_args, Args, ValidationResult};
    pub use crate::core::{calculate_distance_matrix, upgma};
    pub use crate::core::{AlignmentMode, AlignmentResult, DistanceMatrix, PairwiseAligner, ScoringScheme, Tree};
    pub use crate::core::{MsaOrchestrator, MsaResult};
    pub use crate::data::{Sequence, SequenceSet};
    pub use crate::error::{PhyloError, Result};
    pub use crate::output::{truncate_for_display, write_matrix};
}

// Re-export main types at the root level for convenience
pub use crate::core::{AlignmentMode, DistanceMatrix, PairwiseAligner, ScoringScheme, Tree};
pub use crate::data::{Sequence, SequenceSet};
pub use crate::error::{PhyloError, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get library information
pub fn get_info() -> String {
    format!(
        "seqphylo v{} - Affine-gap alignment, distance matrices and UPGMA trees",
        VERSION
    )
}
