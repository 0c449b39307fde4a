// main.rs - CLI entry point

use std::path::Path;
use std::time::Instant;

use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use seqphylo::aligners::AlignerRegistry;
use seqphylo::cli::Config;
use seqphylo::core::{DistanceMatrixBuilder, MsaOrchestrator};
use seqphylo::output::{write_json, write_matrix, write_newick};
use seqphylo::prelude::*;

/// Machine-readable result of the default matrix + tree action
#[derive(Serialize)]
struct PhylogenyReport<'a> {
    scoring: &'a ScoringScheme,
    matrix: &'a DistanceMatrix,
    newick: String,
    tree: &'a Tree,
}

fn main() {
    if let Err(e) = run_main() {
        eprintln!("❌ ERROR: {}", e);
        std::process::exit(1);
    }
}

fn init_logging(level: Option<&str>) {
    let level = level.unwrap_or("warn");
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .init();
}

fn run_main() -> Result<()> {
    let mut args: Args = argh::from_env();
    let command_line = Args::command_line();

    // Handle generate config first
    if args.generate_config {
        println!("{}", Config::generate_sample());
        println!("\n💡 Save this content to a .toml file and use --config /path/to/config.toml");
        return Ok(());
    }

    // Load configuration file if specified
    if let Some(config_path) = args.config.clone() {
        args = args.with_config_file(&config_path)?;
    }

    init_logging(args.log_level.as_deref());

    let validation = validate_args(&args)?;
    let input = args
        .input
        .as_deref()
        .ok_or_else(|| PhyloError::Config("--input is required".to_string()))?;

    println!("🚀 seqphylo v{}", env!("CARGO_PKG_VERSION"));

    // Configure thread pool
    if let Some(n) = args.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build_global()
            .map_err(|e| PhyloError::Config(format!("Failed to configure thread pool: {}", e)))?;
        println!("🧵 Threads: {}", n);
    } else {
        println!("🧵 Threads: {} (auto-detected)", rayon::current_num_threads());
    }
    println!("🎯 Scoring: {}", validation.scoring);

    let total_start = Instant::now();
    let loaded = SequenceSet::from_fasta_path(Path::new(input))?;
    let loaded_count = loaded.len();
    let sequences = validation.filter(loaded);
    println!(
        "📂 Loaded {} sequences from {} ({} after filtering)",
        loaded_count,
        input,
        sequences.len()
    );

    if args.dry_run {
        for sequence in sequences.iter() {
            println!("   {} ({} residues, {})", sequence.id(), sequence.len(), sequence.alphabet());
        }
        println!("✅ Dry run complete: inputs are valid");
        return Ok(());
    }

    if args.pairwise {
        run_pairwise(&args, &validation, &sequences)?;
    } else if args.msa {
        run_msa(&args, &validation, &sequences)?;
    } else {
        run_phylogeny(&args, &validation, &sequences, &command_line)?;
    }

    println!("⏱️  Total time: {:.2}s", total_start.elapsed().as_secs_f64());
    Ok(())
}

fn run_pairwise(args: &Args, validation: &ValidationResult, sequences: &SequenceSet) -> Result<()> {
    let [a, b, ..] = sequences.as_slice() else {
        return Err(PhyloError::InsufficientInput {
            operation: "pairwise alignment",
            required: 2,
            found: sequences.len(),
        });
    };

    let aligner = PairwiseAligner::new(validation.scoring.clone());
    let result = aligner.align(a, b, args.count_optimal);

    println!("🧬 {} vs {} ({} alignment)", a.id(), b.id(), validation.scoring.mode);
    println!("📈 Score: {:.3}", result.score);
    if let Some(count) = result.optimal_count {
        println!("🔢 Optimal alignments: {}", count);
    }
    if let Some(pair) = &result.aligned {
        println!(
            "📊 Identity: {:.1}% ({} matches, {} mismatches, {} gap events over {} columns)",
            pair.stats.identity_percent,
            pair.stats.matches,
            pair.stats.mismatches,
            pair.stats.gap_events,
            pair.stats.length
        );
    }
    if let Some(text) = &result.alignment_text {
        let (shown, _) = truncate_for_display(text, args.display_limit);
        println!("\n{}", shown);
    }

    if let Some(json) = &args.json {
        write_json(Path::new(json), &result)?;
        println!("✅ Alignment written to: {}", json);
    }
    Ok(())
}

fn run_msa(args: &Args, validation: &ValidationResult, sequences: &SequenceSet) -> Result<()> {
    let mut orchestrator = MsaOrchestrator::new(&validation.scoring)
        .with_timeout(validation.msa_timeout)
        .with_display_limit(args.display_limit);

    let tool = validation.msa_tool.as_deref().unwrap_or("custom");
    if validation.msa_tool.is_some() || validation.msa_binary.is_some() {
        let mut registry = AlignerRegistry::new();
        if let Some(external) = registry.resolve(tool, validation.msa_binary.clone()) {
            println!("🔧 External aligner: {} ({})", external.name(), external.description());
            orchestrator = orchestrator.with_external(external);
        }
    }

    let result = orchestrator.align(sequences)?;
    println!("🧩 Method: {}", result.method);
    if let Some(reason) = &result.fallback_reason {
        println!("⚠️  Approximate result, not a true multiple alignment: {}", reason);
    }
    println!("\n{}", result.display_text);

    if let Some(json) = &args.json {
        write_json(Path::new(json), &result)?;
        println!("✅ Alignment result written to: {}", json);
    }
    Ok(())
}

fn run_phylogeny(
    args: &Args,
    validation: &ValidationResult,
    sequences: &SequenceSet,
    command_line: &str,
) -> Result<()> {
    let start = Instant::now();
    let matrix = DistanceMatrixBuilder::new(&validation.scoring)
        .with_progress(true)
        .build(sequences)?;
    println!(
        "📏 Distance matrix: {}x{} in {:.2}s",
        matrix.len(),
        matrix.len(),
        start.elapsed().as_secs_f64()
    );

    let tree = upgma(&matrix)?;
    let newick = tree.to_newick();
    info!(merges = tree.merges().len(), "UPGMA tree built");
    println!("🌳 UPGMA tree with {} leaves", tree.leaf_count());

    if let Some(output) = &args.output {
        write_matrix(Path::new(output), &args.format, &matrix, command_line)?;
        println!("✅ Distance matrix written to: {} ({} format)", output, args.format.to_lowercase());
    }
    match &args.tree {
        Some(path) => {
            write_newick(Path::new(path), &tree)?;
            println!("✅ Tree written to: {}", path);
        }
        None => println!("\n{}", newick),
    }
    if let Some(json) = &args.json {
        let report = PhylogenyReport {
            scoring: &validation.scoring,
            matrix: &matrix,
            newick,
            tree: &tree,
        };
        write_json(Path::new(json), &report)?;
        println!("✅ JSON report written to: {}", json);
    }
    Ok(())
}
