// args.rs - Command line arguments definition

use argh::FromArgs;

#[derive(FromArgs)]
/// seqphylo - Affine-gap alignment, distance matrices and UPGMA trees
pub struct Args {
    /// input FASTA file
    #[argh(option)]
    pub input: Option<String>,

    /// output distance matrix file
    #[argh(option)]
    pub output: Option<String>,

    /// output format: tsv, csv, phylip, nexus (default: tsv)
    #[argh(option, default = "String::from(\"tsv\")")]
    pub format: String,

    /// write the UPGMA tree in Newick format to this file
    #[argh(option)]
    pub tree: Option<String>,

    /// write the machine-readable result (JSON) to this file
    #[argh(option)]
    pub json: Option<String>,

    /// number of threads (default: auto-detect)
    #[argh(option)]
    pub threads: Option<usize>,

    /// log level: error, warn, info, debug, trace (default: warn; RUST_LOG wins when set)
    #[argh(option)]
    pub log_level: Option<String>,

    /// scoring preset: default, dna, dna-strict, dna-permissive (default: default)
    #[argh(option, default = "String::from(\"default\")")]
    pub scoring_preset: String,

    /// custom match score (overrides the preset value)
    #[argh(option)]
    pub match_score: Option<f64>,

    /// custom mismatch score (overrides the preset value)
    #[argh(option)]
    pub mismatch_score: Option<f64>,

    /// custom gap open score, usually negative (overrides the preset value)
    #[argh(option)]
    pub gap_open: Option<f64>,

    /// custom gap extend score, usually negative (overrides the preset value)
    #[argh(option)]
    pub gap_extend: Option<f64>,

    /// use local (Smith-Waterman) alignment for --pairwise
    #[argh(switch)]
    pub local: bool,

    /// include only sequences whose id matches this regex
    #[argh(option)]
    pub include_ids: Option<String>,

    /// exclude sequences whose id matches this regex
    #[argh(option)]
    pub exclude_ids: Option<String>,

    /// include only sequence ids listed in a file (one id per line)
    #[argh(option)]
    pub include_ids_list: Option<String>,

    /// exclude sequence ids listed in a file (one id per line)
    #[argh(option)]
    pub exclude_ids_list: Option<String>,

    /// align the first two sequences with full traceback and exit
    #[argh(switch)]
    pub pairwise: bool,

    /// with --pairwise, also count co-optimal alignments
    #[argh(switch)]
    pub count_optimal: bool,

    /// run a multiple alignment (external tool with heuristic fallback)
    #[argh(switch)]
    pub msa: bool,

    /// external aligner for --msa: mafft, clustalo, muscle
    #[argh(option)]
    pub msa_tool: Option<String>,

    /// path to the external aligner executable (custom tools take the FASTA path as argument)
    #[argh(option)]
    pub msa_binary: Option<String>,

    /// external aligner timeout in seconds (default: 60)
    #[argh(option, default = "60")]
    pub msa_timeout: u64,

    /// maximum characters of alignment text to display (default: 2000)
    #[argh(option, default = "2000")]
    pub display_limit: usize,

    /// validate inputs without computation (dry run)
    #[argh(switch)]
    pub dry_run: bool,

    /// path to TOML configuration file
    #[argh(option)]
    pub config: Option<String>,

    /// generate sample configuration file and exit
    #[argh(switch)]
    pub generate_config: bool,
}

impl Args {
    /// Command line as typed, for output provenance headers
    pub fn command_line() -> String {
        std::env::args().collect::<Vec<_>>().join(" ")
    }
}
