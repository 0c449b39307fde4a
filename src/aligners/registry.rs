// registry.rs - Registry of known external multiple-sequence aligners

use std::collections::HashMap;
use std::path::PathBuf;

use super::command::CommandAligner;
use super::traits::ExternalAligner;

/// Named external aligners, pre-populated with common tools
#[derive(Debug)]
pub struct AlignerRegistry {
    aligners: HashMap<String, Box<dyn ExternalAligner>>,
}

impl AlignerRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            aligners: HashMap::new(),
        };

        registry.register(
            "mafft",
            Box::new(CommandAligner::new("mafft", "mafft", &["--auto", "{input}"], "MAFFT, automatic strategy")),
        );
        registry.register(
            "clustalo",
            Box::new(CommandAligner::new(
                "clustalo",
                "clustalo",
                &["-i", "{input}", "--outfmt=fasta"],
                "Clustal Omega",
            )),
        );
        registry.register(
            "muscle",
            Box::new(CommandAligner::new("muscle", "muscle", &["-in", "{input}", "-quiet"], "MUSCLE v3 interface")),
        );

        registry
    }

    /// Register or replace an aligner
    pub fn register(&mut self, name: &str, aligner: Box<dyn ExternalAligner>) {
        self.aligners.insert(name.to_string(), aligner);
    }

    pub fn get(&self, name: &str) -> Option<&dyn ExternalAligner> {
        self.aligners.get(name).map(|a| a.as_ref())
    }

    pub fn has(&self, name: &str) -> bool {
        self.aligners.contains_key(name)
    }

    /// Remove an aligner, handing ownership to the caller
    pub fn take(&mut self, name: &str) -> Option<Box<dyn ExternalAligner>> {
        self.aligners.remove(name)
    }

    /// `(name, description)` pairs, sorted by name
    pub fn list(&self) -> Vec<(&str, &str)> {
        let mut entries: Vec<(&str, &str)> = self
            .aligners
            .iter()
            .map(|(name, a)| (name.as_str(), a.description()))
            .collect();
        entries.sort();
        entries
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.aligners.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Resolve a tool for the CLI: a known name, optionally with its binary overridden,
    /// or an arbitrary executable path
    pub fn resolve(&mut self, tool: &str, binary: Option<PathBuf>) -> Option<Box<dyn ExternalAligner>> {
        match (tool, binary) {
            ("mafft", Some(path)) => Some(Box::new(CommandAligner::new("mafft", path, &["--auto", "{input}"], ""))),
            ("clustalo", Some(path)) => Some(Box::new(CommandAligner::new(
                "clustalo",
                path,
                &["-i", "{input}", "--outfmt=fasta"],
                "",
            ))),
            ("muscle", Some(path)) => Some(Box::new(CommandAligner::new("muscle", path, &["-in", "{input}", "-quiet"], ""))),
            (_, Some(path)) => Some(Box::new(CommandAligner::custom(path))),
            (name, None) => self.take(name),
        }
    }
}

impl Default for AlignerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
