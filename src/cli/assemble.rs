use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;

use crate::assembly::assembler::{AssembledChromosome, Assembler, AssemblyConfig};
use crate::cli::OutputFormat;
use crate::map::store::load_map;
use crate::parsing::fasta::{parse_sequences_file, write_fasta, DEFAULT_LINE_WIDTH};

#[derive(Args)]
pub struct AssembleArgs {
    /// Fragment map file
    #[arg(required = true)]
    pub map: PathBuf,

    /// FASTA of fragment sequences (optionally gzipped)
    #[arg(required = true)]
    pub fragment_fasta: PathBuf,

    /// Output FASTA of assembled chromosomes
    #[arg(required = true)]
    pub output_fasta: PathBuf,

    /// Symbol written into gaps between fragments
    #[arg(long, default_value_t = 'N')]
    pub filler: char,

    /// Bases per line in the output FASTA
    #[arg(long, default_value_t = DEFAULT_LINE_WIDTH)]
    pub line_width: usize,
}

/// Execute assemble subcommand
///
/// # Errors
///
/// Returns an error if the map or FASTA cannot be read, a fragment sequence
/// is missing or disagrees with the map, or the output cannot be written.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: AssembleArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    if !args.filler.is_ascii() {
        anyhow::bail!("Filler must be a single ASCII character, got '{}'", args.filler);
    }
    if args.line_width == 0 {
        anyhow::bail!("Line width must be at least 1");
    }

    let map = load_map(&args.map)
        .with_context(|| format!("Failed to load fragment map {}", args.map.display()))?;
    let sequences = parse_sequences_file(&args.fragment_fasta).with_context(|| {
        format!("Failed to read fragment sequences from {}", args.fragment_fasta.display())
    })?;

    if verbose {
        eprintln!(
            "Loaded {} chromosomes from map and {} fragment sequences",
            map.chromosomes().len(),
            sequences.len()
        );
    }

    #[allow(clippy::cast_possible_truncation)] // checked ASCII above
    let config = AssemblyConfig {
        filler: args.filler as u8,
    };
    let assembled = Assembler::new(config).assemble(&map, &sequences)?;

    let stats: Vec<(String, usize)> = assembled.iter().map(|c| (c.name.clone(), c.len())).collect();
    write_output(&args.output_fasta, assembled, args.line_width)?;

    match format {
        OutputFormat::Text => {
            println!("Assembled {} chromosomes into {}", stats.len(), args.output_fasta.display());
            for (name, length) in &stats {
                println!("  {name}: {length} bp");
            }
        }
        OutputFormat::Json => {
            let chromosomes: Vec<serde_json::Value> = stats
                .iter()
                .map(|(name, length)| serde_json::json!({ "name": name, "length": length }))
                .collect();
            let json = serde_json::json!({
                "output": args.output_fasta.display().to_string(),
                "chromosomes": chromosomes,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Tsv => {
            println!("chromosome\tlength");
            for (name, length) in &stats {
                println!("{name}\t{length}");
            }
        }
    }

    Ok(())
}

fn write_output(
    path: &Path,
    assembled: Vec<AssembledChromosome>,
    line_width: usize,
) -> anyhow::Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    write_fasta(BufWriter::new(file), assembled, line_width)
        .with_context(|| format!("Failed to write {}", path.display()))
}
