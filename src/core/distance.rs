// distance.rs - Normalized pairwise distance matrix

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::alignment::score_residues;
use crate::core::scoring::ScoringScheme;
use crate::data::SequenceSet;
use crate::error::{PhyloError, Result};

/// Absolute tolerance when checking externally supplied matrices for symmetry
pub const SYMMETRY_TOLERANCE: f64 = 1e-9;

/// Square distance table with row/column names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceMatrix {
    names: Vec<String>,
    matrix: Vec<Vec<f64>>,
}

impl DistanceMatrix {
    /// Wrap an existing table; only the shape is checked here
    pub fn new(names: Vec<String>, matrix: Vec<Vec<f64>>) -> Result<Self> {
        if matrix.len() != names.len() {
            return Err(PhyloError::InvalidDistance(format!(
                "{} names but {} rows",
                names.len(),
                matrix.len()
            )));
        }
        if let Some((i, row)) = matrix.iter().enumerate().find(|(_, r)| r.len() != names.len()) {
            return Err(PhyloError::InvalidDistance(format!(
                "row {} has {} columns, expected {}",
                i,
                row.len(),
                names.len()
            )));
        }
        Ok(Self { names, matrix })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.matrix
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.matrix[i][j]
    }

    /// Distance by sequence names
    pub fn distance(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.names.iter().position(|n| n == a)?;
        let j = self.names.iter().position(|n| n == b)?;
        Some(self.matrix[i][j])
    }

    /// Check the clustering preconditions: finite, non-negative, symmetric, zero diagonal
    pub fn validate(&self) -> Result<()> {
        let n = self.len();
        for i in 0..n {
            if self.matrix[i][i].abs() > SYMMETRY_TOLERANCE {
                return Err(PhyloError::InvalidDistance(format!(
                    "diagonal entry for '{}' is {}, expected 0",
                    self.names[i], self.matrix[i][i]
                )));
            }
            for j in 0..n {
                let d = self.matrix[i][j];
                if !d.is_finite() {
                    return Err(PhyloError::InvalidDistance(format!(
                        "non-finite distance {} between '{}' and '{}'",
                        d, self.names[i], self.names[j]
                    )));
                }
                if d < 0.0 {
                    return Err(PhyloError::InvalidDistance(format!(
                        "negative distance {} between '{}' and '{}'",
                        d, self.names[i], self.names[j]
                    )));
                }
                if j > i && (d - self.matrix[j][i]).abs() > SYMMETRY_TOLERANCE {
                    return Err(PhyloError::InvalidDistance(format!(
                        "asymmetric entries for '{}'/'{}': {} vs {}",
                        self.names[i], self.names[j], d, self.matrix[j][i]
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Normalize a global alignment score into a distance in [0, 1].
///
/// `1 - score / (max_len * match_score)`, clamped. Two empty sequences are identical.
pub fn normalize_score(score: f64, len_a: usize, len_b: usize, match_score: f64) -> f64 {
    let max_len = len_a.max(len_b);
    if max_len == 0 {
        return 0.0;
    }
    let distance = 1.0 - score / (max_len as f64 * match_score);
    if distance.is_nan() {
        1.0
    } else {
        distance.clamp(0.0, 1.0)
    }
}

/// Builds all-pairs distance matrices with the score-only aligner
#[derive(Debug, Clone)]
pub struct DistanceMatrixBuilder {
    scheme: ScoringScheme,
    show_progress: bool,
}

impl DistanceMatrixBuilder {
    /// Distances always use global alignment, whatever mode `scheme` carries
    pub fn new(scheme: &ScoringScheme) -> Self {
        Self {
            scheme: scheme.as_global(),
            show_progress: false,
        }
    }

    /// Show an indicatif progress bar while computing pairs
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn scheme(&self) -> &ScoringScheme {
        &self.scheme
    }

    /// Compute every unordered pair once, in parallel, and mirror it
    pub fn build(&self, sequences: &SequenceSet) -> Result<DistanceMatrix> {
        let n = sequences.len();
        if n < 2 {
            return Err(PhyloError::InsufficientInput {
                operation: "distance matrix",
                required: 2,
                found: n,
            });
        }
        self.scheme.validate()?;

        let seqs = sequences.as_slice();
        let mut matrix = vec![vec![0.0f64; n]; n];
        let total_pairs = n * (n - 1) / 2;

        let start = Instant::now();
        info!(sequences = n, pairs = total_pairs, "computing distance matrix");

        let pb = if self.show_progress {
            let pb = ProgressBar::new(total_pairs as u64);
            if let Ok(style) = ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {per_sec} ETA: {eta}")
            {
                pb.set_style(style.progress_chars("#>-"));
            }
            pb
        } else {
            ProgressBar::hidden()
        };

        // Update every 1% to keep contention low
        let update_interval = std::cmp::max(1, total_pairs / 100);
        let progress_counter = AtomicUsize::new(0);
        let match_score = self.scheme.match_score;

        let upper_triangle: Vec<(usize, usize, f64)> = (0..n)
            .into_par_iter()
            .flat_map(|i| {
                let progress = &progress_counter;
                let pb = &pb;
                (i + 1..n).into_par_iter().map(move |j| {
                    let (a, b) = (&seqs[i], &seqs[j]);
                    let score = score_residues(&self.scheme, a.residues(), b.residues());
                    let distance = normalize_score(score, a.len(), b.len(), match_score);
                    debug!(a = a.id(), b = b.id(), score, distance, "pair distance");

                    let count = progress.fetch_add(1, Ordering::Relaxed) + 1;
                    if count % update_interval == 0 {
                        pb.set_position(count as u64);
                    }
                    (i, j, distance)
                })
            })
            .collect();

        pb.finish_and_clear();

        for (i, j, distance) in upper_triangle {
            matrix[i][j] = distance;
            matrix[j][i] = distance;
        }

        info!(
            elapsed_secs = start.elapsed().as_secs_f64(),
            pairs = total_pairs,
            "distance matrix computed"
        );
        DistanceMatrix::new(sequences.ids(), matrix)
    }
}

/// Build a distance matrix with default builder options
pub fn calculate_distance_matrix(sequences: &SequenceSet, scheme: &ScoringScheme) -> Result<DistanceMatrix> {
    DistanceMatrixBuilder::new(scheme).build(sequences)
}
