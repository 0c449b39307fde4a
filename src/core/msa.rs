// msa.rs - Multiple alignment via an external tool, with a progressive fallback

use std::fmt;
use std::io::Write;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::aligners::ExternalAligner;
use crate::core::alignment::PairwiseAligner;
use crate::core::scoring::ScoringScheme;
use crate::data::{parse_aligned_fasta, AlignedRecord, SequenceSet};
use crate::error::{PhyloError, Result};
use crate::output::display::truncate_for_display;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_DISPLAY_LIMIT: usize = 2000;

/// Attempts per external run; only timeouts are retried
const MAX_ATTEMPTS: usize = 2;

/// How the multiple alignment was produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MsaMethod {
    External { tool: String },
    ProgressiveHeuristic,
}

impl fmt::Display for MsaMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MsaMethod::External { tool } => write!(f, "external ({})", tool),
            MsaMethod::ProgressiveHeuristic => write!(f, "progressive heuristic (approximate)"),
        }
    }
}

/// One reference-vs-query alignment of the fallback path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairwiseComparison {
    pub reference_id: String,
    pub query_id: String,
    pub score: f64,
    pub alignment_text: String,
    pub truncated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MsaResult {
    pub method: MsaMethod,
    /// Set whenever the result is not a true simultaneous alignment
    pub approximate: bool,
    pub fallback_reason: Option<String>,
    /// Gapped rows from the external tool; empty for the heuristic
    pub aligned: Vec<AlignedRecord>,
    pub comparisons: Vec<PairwiseComparison>,
    pub display_text: String,
    pub truncated: bool,
    /// External invocations made, including retries
    pub attempts: usize,
}

impl MsaResult {
    pub fn is_heuristic(&self) -> bool {
        self.method == MsaMethod::ProgressiveHeuristic
    }
}

/// Runs the external aligner when configured, falling back on recoverable failures
#[derive(Debug)]
pub struct MsaOrchestrator {
    aligner: PairwiseAligner,
    external: Option<Box<dyn ExternalAligner>>,
    timeout: Duration,
    display_limit: usize,
}

impl MsaOrchestrator {
    /// Fallback alignments are always global
    pub fn new(scheme: &ScoringScheme) -> Self {
        Self {
            aligner: PairwiseAligner::new(scheme.as_global()),
            external: None,
            timeout: DEFAULT_TIMEOUT,
            display_limit: DEFAULT_DISPLAY_LIMIT,
        }
    }

    pub fn with_external(mut self, external: Box<dyn ExternalAligner>) -> Self {
        self.external = Some(external);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_display_limit(mut self, limit: usize) -> Self {
        self.display_limit = limit;
        self
    }

    pub fn align(&self, sequences: &SequenceSet) -> Result<MsaResult> {
        if sequences.len() < 2 {
            return Err(PhyloError::InsufficientInput {
                operation: "multiple alignment",
                required: 2,
                found: sequences.len(),
            });
        }
        self.aligner.scheme().validate()?;

        let Some(external) = self.external.as_deref() else {
            info!("no external aligner configured, using progressive heuristic");
            return Ok(self.fallback(sequences, "no external aligner configured".to_string(), 0));
        };

        let mut attempts = 0;
        match self.run_external(external, sequences, &mut attempts) {
            Ok(aligned) => {
                let text = aligned
                    .iter()
                    .map(|r| format!(">{}\n{}\n", r.id, r.aligned))
                    .collect::<String>();
                let (display_text, truncated) = truncate_for_display(&text, self.display_limit);
                info!(tool = external.name(), attempts, "external multiple alignment succeeded");
                Ok(MsaResult {
                    method: MsaMethod::External {
                        tool: external.name().to_string(),
                    },
                    approximate: false,
                    fallback_reason: None,
                    aligned,
                    comparisons: Vec::new(),
                    display_text,
                    truncated,
                    attempts,
                })
            }
            Err(e) if e.is_recoverable() => {
                warn!(tool = external.name(), error = %e, "falling back to progressive heuristic");
                Ok(self.fallback(sequences, e.to_string(), attempts))
            }
            Err(e) => Err(e),
        }
    }

    fn run_external(
        &self,
        external: &dyn ExternalAligner,
        sequences: &SequenceSet,
        attempts: &mut usize,
    ) -> Result<Vec<AlignedRecord>> {
        let unavailable = |reason: String| PhyloError::ExternalToolUnavailable {
            tool: external.name().to_string(),
            reason,
        };

        let mut staged = tempfile::Builder::new()
            .suffix(".fasta")
            .tempfile()
            .map_err(|e| unavailable(format!("cannot stage input: {}", e)))?;
        stage_input(&mut staged, sequences).map_err(|e| unavailable(format!("cannot stage input: {}", e)))?;

        let output = loop {
            *attempts += 1;
            debug!(tool = external.name(), attempt = *attempts, "running external aligner");
            match external.run(staged.path(), self.timeout) {
                Err(PhyloError::ExternalToolTimeout { .. }) if *attempts < MAX_ATTEMPTS => {
                    warn!(tool = external.name(), attempt = *attempts, "external aligner timed out, retrying");
                }
                other => break other?,
            }
        };

        let records = parse_aligned_fasta(&output).map_err(|e| unavailable(format!("unreadable output: {}", e)))?;
        check_alignment(&records, sequences).map_err(unavailable)?;
        Ok(records)
    }

    /// Align every sequence against the first one
    fn fallback(&self, sequences: &SequenceSet, reason: String, attempts: usize) -> MsaResult {
        let seqs = sequences.as_slice();
        let reference = &seqs[0];
        let mut comparisons = Vec::with_capacity(seqs.len() - 1);
        let mut report = format!(
            "Approximate alignment: progressive pairwise heuristic against reference '{}'\n",
            reference.id()
        );

        for query in &seqs[1..] {
            let result = self.aligner.align(reference, query, false);
            let text = result.alignment_text.unwrap_or_default();
            let (alignment_text, truncated) = truncate_for_display(&text, self.display_limit);
            report.push_str(&format!(
                "\n# {} vs {} (score {:.3})\n{}\n",
                reference.id(),
                query.id(),
                result.score,
                alignment_text
            ));
            comparisons.push(PairwiseComparison {
                reference_id: reference.id().to_string(),
                query_id: query.id().to_string(),
                score: result.score,
                alignment_text,
                truncated,
            });
        }

        let (display_text, truncated) = truncate_for_display(&report, self.display_limit);
        MsaResult {
            method: MsaMethod::ProgressiveHeuristic,
            approximate: true,
            fallback_reason: Some(reason),
            aligned: Vec::new(),
            comparisons,
            display_text,
            truncated,
            attempts,
        }
    }
}

fn stage_input(file: &mut NamedTempFile, sequences: &SequenceSet) -> Result<()> {
    sequences.write_fasta(file.as_file_mut())?;
    file.as_file_mut().flush()?;
    Ok(())
}

/// Every input id present once, all rows the same length
fn check_alignment(records: &[AlignedRecord], sequences: &SequenceSet) -> std::result::Result<(), String> {
    if records.len() != sequences.len() {
        return Err(format!("expected {} aligned records, got {}", sequences.len(), records.len()));
    }
    if let Some(missing) = sequences.iter().find(|s| !records.iter().any(|r| r.id == s.id())) {
        return Err(format!("sequence '{}' missing from output", missing.id()));
    }
    let width = records[0].aligned.len();
    if let Some(r) = records.iter().find(|r| r.aligned.len() != width) {
        return Err(format!("row '{}' has length {}, expected {}", r.id, r.aligned.len(), width));
    }
    Ok(())
}
