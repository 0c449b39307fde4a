// config.rs - Configuration file support

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

use crate::error::{PhyloError, Result};

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    // Input/Output
    pub input: Option<String>,
    pub output: Option<String>,
    pub format: Option<String>,
    pub tree: Option<String>,
    pub json: Option<String>,

    // Runtime
    pub threads: Option<usize>,
    pub log_level: Option<String>,

    // Scoring
    pub scoring_preset: Option<String>,
    pub match_score: Option<f64>,
    pub mismatch_score: Option<f64>,
    pub gap_open: Option<f64>,
    pub gap_extend: Option<f64>,
    pub local: Option<bool>,

    // Sequence filtering
    pub include_ids: Option<String>,
    pub exclude_ids: Option<String>,
    pub include_ids_list: Option<String>,
    pub exclude_ids_list: Option<String>,

    // Multiple alignment
    pub msa_tool: Option<String>,
    pub msa_binary: Option<String>,
    pub msa_timeout: Option<u64>,
    pub display_limit: Option<usize>,

    // Flags
    pub dry_run: Option<bool>,
}

impl Config {
    /// Create a new empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| PhyloError::Config(format!("Failed to read config file '{}': {}", path.display(), e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| PhyloError::Config(format!("Failed to parse config file '{}': {}", path.display(), e)))?;

        info!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)
            .map_err(|e| PhyloError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, content)
            .map_err(|e| PhyloError::Config(format!("Failed to write config file '{}': {}", path.display(), e)))?;

        info!(path = %path.display(), "saved configuration");
        Ok(())
    }

    /// Generate a sample configuration file with comments
    pub fn generate_sample() -> String {
        r#"# seqphylo.toml - Configuration file for seqphylo
# Command line arguments will override these settings

# =============================================================================
# INPUT/OUTPUT
# =============================================================================

# Input FASTA file
input = "sequences.fasta"

# Output distance matrix file
output = "distances.tsv"

# Output format: tsv, csv, phylip, nexus
format = "tsv"

# UPGMA tree in Newick format
tree = "tree.nwk"

# Machine-readable result
# json = "result.json"

# =============================================================================
# RUNTIME
# =============================================================================

# Number of threads (omit for auto-detection)
# threads = 8

# Log level: error, warn, info, debug, trace (RUST_LOG takes precedence)
log_level = "warn"

# =============================================================================
# SCORING
# =============================================================================

# Preset: default, dna, dna-strict, dna-permissive
scoring_preset = "dna"

# Custom scores (override the preset values); gap scores are usually negative
# match_score = 2.0
# mismatch_score = -1.0
# gap_open = -5.0
# gap_extend = -2.0

# Local (Smith-Waterman) alignment for pairwise mode
local = false

# =============================================================================
# SEQUENCE FILTERING
# =============================================================================

# Include only sequence ids matching regex pattern
# include_ids = "^human_.*"

# Exclude sequence ids matching regex pattern
# exclude_ids = "control.*"

# Include only ids listed in a file (one id per line)
# include_ids_list = "keep.txt"

# Exclude ids listed in a file (one id per line)
# exclude_ids_list = "drop.txt"

# =============================================================================
# MULTIPLE ALIGNMENT
# =============================================================================

# External aligner: mafft, clustalo, muscle
# msa_tool = "mafft"

# Explicit path to the aligner executable
# msa_binary = "/usr/local/bin/mafft"

# Timeout in seconds for the external aligner
msa_timeout = 60

# Maximum characters of alignment text to display
display_limit = 2000

# =============================================================================
# FLAGS
# =============================================================================

# Validate inputs without computation (dry run)
dry_run = false
"#
        .to_string()
    }
}
