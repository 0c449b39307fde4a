// merge.rs - Merge configuration file with CLI arguments

use crate::cli::{Args, Config};
use crate::error::Result;

impl Args {
    /// Merge with configuration from file
    /// CLI arguments take precedence over config file values
    pub fn merge_with_config(mut self, config: Config) -> Self {
        // Input/Output
        if self.input.is_none() {
            self.input = config.input;
        }
        if self.output.is_none() {
            self.output = config.output;
        }
        if self.tree.is_none() {
            self.tree = config.tree;
        }
        if self.json.is_none() {
            self.json = config.json;
        }

        // Defaults are only replaced, never explicit CLI values
        if self.format == "tsv" {
            if let Some(format) = config.format {
                self.format = format;
            }
        }
        if self.scoring_preset == "default" {
            if let Some(preset) = config.scoring_preset {
                self.scoring_preset = preset;
            }
        }
        if self.msa_timeout == 60 {
            if let Some(timeout) = config.msa_timeout {
                self.msa_timeout = timeout;
            }
        }
        if self.display_limit == 2000 {
            if let Some(limit) = config.display_limit {
                self.display_limit = limit;
            }
        }

        // Runtime
        if self.threads.is_none() {
            self.threads = config.threads;
        }
        if self.log_level.is_none() {
            self.log_level = config.log_level;
        }

        // Scoring
        if self.match_score.is_none() {
            self.match_score = config.match_score;
        }
        if self.mismatch_score.is_none() {
            self.mismatch_score = config.mismatch_score;
        }
        if self.gap_open.is_none() {
            self.gap_open = config.gap_open;
        }
        if self.gap_extend.is_none() {
            self.gap_extend = config.gap_extend;
        }

        // Filtering
        if self.include_ids.is_none() {
            self.include_ids = config.include_ids;
        }
        if self.exclude_ids.is_none() {
            self.exclude_ids = config.exclude_ids;
        }
        if self.include_ids_list.is_none() {
            self.include_ids_list = config.include_ids_list;
        }
        if self.exclude_ids_list.is_none() {
            self.exclude_ids_list = config.exclude_ids_list;
        }

        // Multiple alignment
        if self.msa_tool.is_none() {
            self.msa_tool = config.msa_tool;
        }
        if self.msa_binary.is_none() {
            self.msa_binary = config.msa_binary;
        }

        // Flags (a switch given on the CLI always wins)
        if !self.local && config.local.unwrap_or(false) {
            self.local = true;
        }
        if !self.dry_run && config.dry_run.unwrap_or(false) {
            self.dry_run = true;
        }

        self
    }

    /// Load configuration and merge with CLI args
    pub fn with_config_file(self, config_path: &str) -> Result<Self> {
        let config = Config::from_file(config_path)?;
        Ok(self.merge_with_config(config))
    }
}
