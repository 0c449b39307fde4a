// mod.rs - Data structures module

pub mod sequence;

// Re-export main types for convenience
pub use sequence::{parse_aligned_fasta, validate_residues, AlignedRecord, Alphabet, Sequence, SequenceSet};
