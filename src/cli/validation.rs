// validation.rs - Input validation utilities

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::time::Duration;

use regex::Regex;
use tracing::{info, warn};

use crate::aligners::AlignerRegistry;
use crate::cli::args::Args;
use crate::core::{AlignmentMode, ScoringScheme};
use crate::data::{Sequence, SequenceSet};
use crate::error::{PhyloError, Result};
use crate::output::MATRIX_FORMATS;

pub struct ValidationResult {
    pub scoring: ScoringScheme,
    pub include_regex: Option<Regex>,
    pub exclude_regex: Option<Regex>,
    pub include_set: Option<HashSet<String>>,
    pub exclude_set: Option<HashSet<String>>,
    /// Registry name of the external aligner, if any
    pub msa_tool: Option<String>,
    pub msa_binary: Option<PathBuf>,
    pub msa_timeout: Duration,
}

impl ValidationResult {
    /// Apply every id filter to a loaded sequence set
    pub fn filter(&self, sequences: SequenceSet) -> SequenceSet {
        let include = &self.include_set;
        let exclude = &self.exclude_set;
        sequences
            .filter_ids(self.include_regex.as_ref(), self.exclude_regex.as_ref())
            .retain(|s: &Sequence| {
                include.as_ref().map_or(true, |set| set.contains(s.id()))
                    && exclude.as_ref().map_or(true, |set| !set.contains(s.id()))
            })
    }
}

/// Build the scoring scheme from a preset plus any custom overrides
pub fn build_scoring(args: &Args) -> Result<ScoringScheme> {
    let mut scheme = ScoringScheme::from_preset(&args.scoring_preset)?;
    let custom = args.match_score.is_some()
        || args.mismatch_score.is_some()
        || args.gap_open.is_some()
        || args.gap_extend.is_some();
    if custom {
        scheme = ScoringScheme::custom(
            args.match_score.unwrap_or(scheme.match_score),
            args.mismatch_score.unwrap_or(scheme.mismatch_score),
            args.gap_open.unwrap_or(scheme.gap_open_score),
            args.gap_extend.unwrap_or(scheme.gap_extend_score),
        );
    }
    if args.local {
        scheme = scheme.with_mode(AlignmentMode::Local);
    }
    scheme.validate()?;
    Ok(scheme)
}

fn compile(pattern: &Option<String>, flag: &str) -> Result<Option<Regex>> {
    pattern
        .as_deref()
        .map(|p| Regex::new(p).map_err(|e| PhyloError::Config(format!("Invalid {} regex: {}", flag, e))))
        .transpose()
}

/// Validate all command line arguments
pub fn validate_args(args: &Args) -> Result<ValidationResult> {
    if args.input.is_none() {
        return Err(PhyloError::Config(
            "--input is required (or set `input` in the config file)".to_string(),
        ));
    }

    if !MATRIX_FORMATS.contains(&args.format.to_lowercase().as_str()) {
        return Err(PhyloError::Config(format!(
            "Unsupported output format: {}. Use: {}",
            args.format,
            MATRIX_FORMATS.join(", ")
        )));
    }

    let exclusive = [args.pairwise, args.msa].iter().filter(|&&f| f).count();
    if exclusive > 1 {
        return Err(PhyloError::Config("--pairwise and --msa cannot be combined".to_string()));
    }
    if args.count_optimal && !args.pairwise {
        return Err(PhyloError::Config("--count-optimal requires --pairwise".to_string()));
    }
    if args.local && !args.pairwise {
        warn!("--local only applies to --pairwise; distances and MSA fallback use global alignment");
    }

    let scoring = build_scoring(args)?;

    // External aligner: a registry name, or any executable given by path
    let registry = AlignerRegistry::new();
    if let Some(tool) = &args.msa_tool {
        if !registry.has(tool) && args.msa_binary.is_none() {
            return Err(PhyloError::Config(format!(
                "Unknown MSA tool '{}'. Available: {} (or pass --msa-binary)",
                tool,
                registry.names().join(", ")
            )));
        }
    }
    if (args.msa_tool.is_some() || args.msa_binary.is_some()) && !args.msa {
        return Err(PhyloError::Config("--msa-tool/--msa-binary require --msa".to_string()));
    }
    if args.msa_timeout == 0 {
        return Err(PhyloError::Config("--msa-timeout must be at least 1 second".to_string()));
    }

    let include_regex = compile(&args.include_ids, "include_ids")?;
    let exclude_regex = compile(&args.exclude_ids, "exclude_ids")?;

    let include_set = args.include_ids_list.as_deref().map(load_set_from_file).transpose()?;
    let exclude_set = args.exclude_ids_list.as_deref().map(load_set_from_file).transpose()?;

    Ok(ValidationResult {
        scoring,
        include_regex,
        exclude_regex,
        include_set,
        exclude_set,
        msa_tool: args.msa_tool.clone(),
        msa_binary: args.msa_binary.as_deref().map(PathBuf::from),
        msa_timeout: Duration::from_secs(args.msa_timeout),
    })
}

/// Load a set of strings from a file (one per line)
fn load_set_from_file(file_path: &str) -> Result<HashSet<String>> {
    let file = File::open(file_path)
        .map_err(|e| PhyloError::Config(format!("Failed to open filter file '{}': {}", file_path, e)))?;

    let reader = BufReader::new(file);
    let mut set = HashSet::new();

    for (line_num, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| {
            PhyloError::Config(format!("Failed to read line {} from '{}': {}", line_num + 1, file_path, e))
        })?;
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            set.insert(trimmed.to_string());
        }
    }

    info!(items = set.len(), path = file_path, "loaded id filter file");
    Ok(set)
}
