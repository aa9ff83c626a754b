use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use crate::cli::OutputFormat;
use crate::core::types::ChromosomeKind;
use crate::map::store::load_map;
use crate::map::summary::{write_bed, MapSummary};

#[derive(Args)]
pub struct StatsArgs {
    /// Fragment map file
    #[arg(required = true)]
    pub map: PathBuf,

    /// Also write fragment placements as BED6 in chromosome coordinates
    #[arg(long)]
    pub bed: Option<PathBuf>,
}

/// Execute stats subcommand
///
/// # Errors
///
/// Returns an error if the map cannot be loaded or the BED file cannot be written.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: StatsArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let map = load_map(&args.map)
        .with_context(|| format!("Failed to load fragment map {}", args.map.display()))?;
    let summary = MapSummary::from_map(&map);

    if let Some(path) = &args.bed {
        let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
        write_bed(&map, BufWriter::new(file))
            .with_context(|| format!("Failed to write {}", path.display()))?;
        if verbose {
            eprintln!("Wrote {} placements to {}", summary.total_fragments, path.display());
        }
    }

    match format {
        OutputFormat::Text => print_text_summary(&summary),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
        OutputFormat::Tsv => print_tsv_summary(&summary),
    }

    Ok(())
}

fn print_text_summary(summary: &MapSummary) {
    println!("Fragment Map Summary");
    println!("{}", "=".repeat(60));
    println!("  Gap size: {}", summary.gap_size);
    println!("  Chromosomes: {}", summary.chromosomes.len());
    println!("  Fragments: {}", summary.total_fragments);
    println!("    placed: {}", summary.placed_fragments);
    println!("    unlocalized: {}", summary.unlocalized_fragments);
    println!("    unplaced: {}", summary.unplaced_fragments);
    println!("  Assembled length: {} bp", summary.total_length);

    if summary.chromosomes.is_empty() {
        return;
    }

    println!(
        "\n{:<24} {:<14} {:>9} {:>14} {:>14} {:>12}",
        "Chromosome", "Kind", "Fragments", "Length", "Fragment bp", "Gap bp"
    );
    println!("{}", "-".repeat(92));
    for c in &summary.chromosomes {
        let kind = match &c.kind {
            ChromosomeKind::Unlocalized { .. } => "unlocalized".to_string(),
            other => other.to_string(),
        };
        println!(
            "{:<24} {:<14} {:>9} {:>14} {:>14} {:>12}",
            c.name, kind, c.fragments, c.length, c.fragment_bases, c.gap_bases
        );
    }
}

fn print_tsv_summary(summary: &MapSummary) {
    println!("chromosome\tkind\tfragments\tlength\tfragment_bases\tgap_bases");
    for c in &summary.chromosomes {
        let kind = match &c.kind {
            ChromosomeKind::Reference => "reference",
            ChromosomeKind::Unlocalized { .. } => "unlocalized",
            ChromosomeKind::Unplaced => "unplaced",
        };
        println!(
            "{}\t{kind}\t{}\t{}\t{}\t{}",
            c.name, c.fragments, c.length, c.fragment_bases, c.gap_bases
        );
    }
}
