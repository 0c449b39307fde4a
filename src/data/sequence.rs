// sequence.rs - Named sequences, alphabet checks and FASTA I/O

use std::collections::HashSet;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;

use bio::io::fasta;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{PhyloError, Result};

/// IUPAC nucleotide codes, including ambiguity symbols
const NUCLEOTIDE_SYMBOLS: &[u8] = b"ACGTUNRYKMSWBDHV";

/// Residue alphabet of a sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Alphabet {
    Nucleotide,
    Protein,
}

impl Alphabet {
    /// Nucleotide when every residue is an IUPAC nucleotide code
    pub fn detect(residues: &[u8]) -> Self {
        if residues.iter().all(|r| NUCLEOTIDE_SYMBOLS.contains(r)) {
            Alphabet::Nucleotide
        } else {
            Alphabet::Protein
        }
    }
}

impl fmt::Display for Alphabet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Alphabet::Nucleotide => write!(f, "nucleotide"),
            Alphabet::Protein => write!(f, "protein"),
        }
    }
}

/// Check residues against the supported symbol set (IUPAC letters and `*`).
pub fn validate_residues(id: &str, residues: &[u8]) -> Result<()> {
    if let Some(pos) = residues
        .iter()
        .position(|&r| !(r.is_ascii_uppercase() || r == b'*'))
    {
        return Err(PhyloError::AlignmentComputation(format!(
            "sequence '{}' contains unsupported symbol '{}' at position {}",
            id,
            residues[pos].escape_ascii(),
            pos + 1
        )));
    }
    Ok(())
}

/// An identified, immutable residue sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sequence {
    id: String,
    residues: Vec<u8>,
}

impl Sequence {
    /// Normalize (uppercase, no whitespace) and validate residues
    pub fn new(id: impl Into<String>, residues: impl AsRef<[u8]>) -> Result<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(PhyloError::Config("sequence identifier must not be empty".to_string()));
        }
        let residues: Vec<u8> = residues
            .as_ref()
            .iter()
            .filter(|b| !b.is_ascii_whitespace())
            .map(|b| b.to_ascii_uppercase())
            .collect();
        validate_residues(&id, &residues)?;
        Ok(Self { id, residues })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn residues(&self) -> &[u8] {
        &self.residues
    }

    pub fn len(&self) -> usize {
        self.residues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.residues.is_empty()
    }

    pub fn alphabet(&self) -> Alphabet {
        Alphabet::detect(&self.residues)
    }

    /// Residues as text (always valid ASCII after validation)
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.residues).unwrap_or_default()
    }
}

/// Ordered mapping of sequence id to sequence; ids are unique
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SequenceSet {
    sequences: Vec<Sequence>,
}

impl SequenceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(id, residues)` pairs, preserving order
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<[u8]>,
    {
        let mut set = Self::new();
        for (id, residues) in pairs {
            set.push(Sequence::new(id, residues)?)?;
        }
        Ok(set)
    }

    /// Add a sequence; duplicate ids are rejected
    pub fn push(&mut self, sequence: Sequence) -> Result<()> {
        if self.get(sequence.id()).is_some() {
            return Err(PhyloError::Config(format!("duplicate sequence id '{}'", sequence.id())));
        }
        self.sequences.push(sequence);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Sequence> {
        self.sequences.iter().find(|s| s.id() == id)
    }

    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Sequence> {
        self.sequences.iter()
    }

    pub fn as_slice(&self) -> &[Sequence] {
        &self.sequences
    }

    pub fn ids(&self) -> Vec<String> {
        self.sequences.iter().map(|s| s.id().to_string()).collect()
    }

    /// Keep sequences whose id matches `include` (if any) and not `exclude` (if any)
    pub fn filter_ids(self, include: Option<&Regex>, exclude: Option<&Regex>) -> Self {
        let before = self.sequences.len();
        let sequences: Vec<Sequence> = self
            .sequences
            .into_iter()
            .filter(|s| include.map_or(true, |re| re.is_match(s.id())))
            .filter(|s| exclude.map_or(true, |re| !re.is_match(s.id())))
            .collect();
        debug!(before, after = sequences.len(), "filtered sequence ids");
        Self { sequences }
    }

    /// Keep only sequences satisfying `keep`, preserving order
    pub fn retain<F: FnMut(&Sequence) -> bool>(mut self, keep: F) -> Self {
        self.sequences.retain(keep);
        self
    }

    /// Load a FASTA file
    pub fn from_fasta_path(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| {
            PhyloError::Fasta(format!("Failed to open FASTA file {}: {}", path.display(), e))
        })?;
        let set = Self::from_fasta_reader(BufReader::new(file))?;
        info!(path = %path.display(), sequences = set.len(), "loaded FASTA input");
        Ok(set)
    }

    /// Parse FASTA records from any reader
    pub fn from_fasta_reader<R: Read>(reader: R) -> Result<Self> {
        let reader = fasta::Reader::new(reader);
        let mut set = Self::new();
        for record in reader.records() {
            let record = record.map_err(|e| PhyloError::Fasta(format!("Invalid FASTA record: {}", e)))?;
            set.push(Sequence::new(record.id(), record.seq())?)?;
        }
        Ok(set)
    }

    /// Write all sequences as FASTA
    pub fn write_fasta<W: Write>(&self, writer: W) -> Result<()> {
        let mut writer = fasta::Writer::new(writer);
        for sequence in &self.sequences {
            writer.write(sequence.id(), None, sequence.residues())?;
        }
        writer.flush()?;
        Ok(())
    }
}

impl<'a> IntoIterator for &'a SequenceSet {
    type Item = &'a Sequence;
    type IntoIter = std::slice::Iter<'a, Sequence>;

    fn into_iter(self) -> Self::IntoIter {
        self.sequences.iter()
    }
}

/// One gapped row of a multiple alignment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlignedRecord {
    pub id: String,
    pub aligned: String,
}

/// Parse gapped FASTA, as produced by external multiple aligners
pub fn parse_aligned_fasta(text: &str) -> Result<Vec<AlignedRecord>> {
    let reader = fasta::Reader::new(text.as_bytes());
    let mut records = Vec::new();
    let mut seen = HashSet::new();
    for record in reader.records() {
        let record = record.map_err(|e| PhyloError::Fasta(format!("Invalid aligned FASTA: {}", e)))?;
        if !seen.insert(record.id().to_string()) {
            return Err(PhyloError::Fasta(format!("duplicate aligned record '{}'", record.id())));
        }
        let aligned = String::from_utf8_lossy(record.seq()).to_ascii_uppercase();
        records.push(AlignedRecord {
            id: record.id().to_string(),
            aligned,
        });
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_normalization() {
        let seq = Sequence::new("s1", "acg t\nna").unwrap();
        assert_eq!(seq.residues(), b"ACGTNA");
        assert_eq!(seq.alphabet(), Alphabet::Nucleotide);
        assert_eq!(seq.as_str(), "ACGTNA");
    }

    #[test]
    fn test_unsupported_symbols_rejected() {
        let err = Sequence::new("bad", "ACG-T").unwrap_err();
        assert!(matches!(err, PhyloError::AlignmentComputation(_)));
        assert!(Sequence::new("bad", "AC1T").is_err());
        assert!(Sequence::new("prot", "MKV*").is_ok());
    }

    #[test]
    fn test_protein_detection() {
        let seq = Sequence::new("p", "MEEPQSDPSV").unwrap();
        assert_eq!(seq.alphabet(), Alphabet::Protein);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let result = SequenceSet::from_pairs([("a", "ACGT"), ("a", "ACGA")]);
        assert!(matches!(result, Err(PhyloError::Config(_))));
    }

    #[test]
    fn test_fasta_round_trip_preserves_order() {
        let set = SequenceSet::from_pairs([("z", "ACGT"), ("a", "GGCC"), ("m", "")]).unwrap();
        let mut buffer = Vec::new();
        set.write_fasta(&mut buffer).unwrap();

        let parsed = SequenceSet::from_fasta_reader(buffer.as_slice()).unwrap();
        assert_eq!(parsed.ids(), vec!["z", "a", "m"]);
        assert_eq!(parsed.get("a").unwrap().residues(), b"GGCC");
        assert!(parsed.get("m").unwrap().is_empty());
    }

    #[test]
    fn test_filter_ids() {
        let set = SequenceSet::from_pairs([("human_1", "A"), ("mouse_1", "C"), ("human_2", "G")]).unwrap();
        let include = Regex::new("^human").unwrap();
        let exclude = Regex::new("_2$").unwrap();
        let filtered = set.filter_ids(Some(&include), Some(&exclude));
        assert_eq!(filtered.ids(), vec!["human_1"]);
    }

    #[test]
    fn test_parse_aligned_fasta() {
        let text = ">s1\nACGT-A\n>s2\nAC-TTA\n";
        let records = parse_aligned_fasta(text).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].aligned, "AC-TTA");
    }
}
