// scoring.rs - Scoring scheme configuration and presets

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

use crate::error::{PhyloError, Result};

/// Alignment mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlignmentMode {
    #[default]
    Global,
    Local,
}

impl FromStr for AlignmentMode {
    type Err = PhyloError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "global" | "nw" | "needleman-wunsch" => Ok(AlignmentMode::Global),
            "local" | "sw" | "smith-waterman" => Ok(AlignmentMode::Local),
            _ => Err(PhyloError::Config(format!(
                "Invalid alignment mode: {}. Use: global, local",
                s
            ))),
        }
    }
}

impl fmt::Display for AlignmentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlignmentMode::Global => write!(f, "global"),
            AlignmentMode::Local => write!(f, "local"),
        }
    }
}

/// Match/mismatch/affine-gap scores plus alignment mode.
///
/// Gap scores are added to the alignment score, so penalties are negative:
/// a gap of length `k` contributes `gap_open + (k - 1) * gap_extend`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringScheme {
    pub match_score: f64,
    pub mismatch_score: f64,
    pub gap_open_score: f64,
    pub gap_extend_score: f64,
    #[serde(default)]
    pub mode: AlignmentMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Default for ScoringScheme {
    fn default() -> Self {
        Self {
            match_score: 1.0,
            mismatch_score: -1.0,
            gap_open_score: -0.5,
            gap_extend_score: -0.1,
            mode: AlignmentMode::Global,
            description: Some("Default scoring (match 1, mismatch -1, gap -0.5/-0.1)".to_string()),
        }
    }
}

impl ScoringScheme {
    /// Names accepted by [`ScoringScheme::from_preset`]
    pub const PRESETS: [&'static str; 4] = ["default", "dna", "dna-strict", "dna-permissive"];

    /// Create scoring scheme from preset name
    pub fn from_preset(name: &str) -> Result<Self> {
        let (m, x, o, e, description) = match name {
            "default" => return Ok(Self::default()),
            "dna" => (2.0, -1.0, -5.0, -2.0, "Standard DNA alignment"),
            "dna-strict" => (3.0, -2.0, -8.0, -3.0, "Strict DNA alignment (higher penalties)"),
            "dna-permissive" => (1.0, 0.0, -3.0, -1.0, "Permissive DNA alignment (lower penalties)"),
            _ => {
                return Err(PhyloError::Config(format!(
                    "Unknown scoring preset: {}. Use: {}",
                    name,
                    Self::PRESETS.join(", ")
                )))
            }
        };
        Ok(Self {
            match_score: m,
            mismatch_score: x,
            gap_open_score: o,
            gap_extend_score: e,
            mode: AlignmentMode::Global,
            description: Some(description.to_string()),
        })
    }

    /// Create custom scoring scheme
    pub fn custom(match_score: f64, mismatch_score: f64, gap_open_score: f64, gap_extend_score: f64) -> Self {
        Self {
            match_score,
            mismatch_score,
            gap_open_score,
            gap_extend_score,
            mode: AlignmentMode::Global,
            description: Some("Custom scoring parameters".to_string()),
        }
    }

    pub fn with_mode(mut self, mode: AlignmentMode) -> Self {
        self.mode = mode;
        self
    }

    /// Same scores in global mode, as used for distances and progressive fallback.
    pub fn as_global(&self) -> Self {
        self.clone().with_mode(AlignmentMode::Global)
    }

    /// Substitution score for a residue pair
    #[inline]
    pub fn substitution(&self, a: u8, b: u8) -> f64 {
        if a == b {
            self.match_score
        } else {
            self.mismatch_score
        }
    }

    /// Score of a gap spanning `len` residues (zero for `len == 0`)
    pub fn gap_cost(&self, len: usize) -> f64 {
        if len == 0 {
            0.0
        } else {
            self.gap_open_score + (len - 1) as f64 * self.gap_extend_score
        }
    }

    /// Reject schemes the distance normalization cannot handle; warn on odd ones.
    pub fn validate(&self) -> Result<()> {
        let scores = [
            ("match_score", self.match_score),
            ("mismatch_score", self.mismatch_score),
            ("gap_open_score", self.gap_open_score),
            ("gap_extend_score", self.gap_extend_score),
        ];
        for (name, value) in scores {
            if !value.is_finite() {
                return Err(PhyloError::InvalidScoring(format!("{} must be finite, got {}", name, value)));
            }
        }
        if self.match_score <= 0.0 {
            return Err(PhyloError::InvalidScoring(format!(
                "match_score must be positive, got {}",
                self.match_score
            )));
        }
        if self.mismatch_score > self.match_score {
            warn!(
                match_score = self.match_score,
                mismatch_score = self.mismatch_score,
                "mismatch scores higher than match; distances will be clamped"
            );
        }
        if self.gap_open_score > 0.0 || self.gap_extend_score > 0.0 {
            warn!(
                gap_open = self.gap_open_score,
                gap_extend = self.gap_extend_score,
                "positive gap scores reward gaps; distances will be clamped"
            );
        }
        Ok(())
    }
}

impl fmt::Display for ScoringScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (match {}, mismatch {}, gap open {}, gap extend {})",
            self.mode, self.match_score, self.mismatch_score, self.gap_open_score, self.gap_extend_score
        )
    }
}
