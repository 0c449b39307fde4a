// mod.rs - Core logic module

pub mod alignment;
pub mod distance;
pub mod msa;
pub mod scoring;
pub mod upgma;

// Re-export main types for convenience
pub use alignment::{compute_alignment_stats, render_alignment, AlignedPair, AlignmentResult, AlignmentStats, PairwiseAligner};
pub use distance::{calculate_distance_matrix, normalize_score, DistanceMatrix, DistanceMatrixBuilder};
pub use msa::{MsaMethod, MsaOrchestrator, MsaResult, PairwiseComparison};
pub use scoring::{AlignmentMode, ScoringScheme};
pub use upgma::{upgma, Cluster, ClusterId, MergeEvent, Tree};
