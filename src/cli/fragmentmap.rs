use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;

use crate::cli::OutputFormat;
use crate::core::alignment::AlignmentRecord;
use crate::core::map::FragmentMap;
use crate::map::builder::{BuildConfig, BuildReport, MapBuilder, DEFAULT_GAP_SIZE, DEFAULT_UNPLACED_NAME};
use crate::map::store::save_map;
use crate::parsing::input::{file_extension, parse_lengths_file, FragmentLengths};
use crate::parsing::{blast, paf, tsv};

#[derive(Args)]
pub struct FragmentMapArgs {
    /// Alignments of fragments to reference chromosomes (BLAST tabular or PAF, optionally gzipped)
    #[arg(required = true)]
    pub alignments: PathBuf,

    /// Fragment lengths (FASTA, .fai, or two-column TSV)
    #[arg(required = true)]
    pub fragment_lengths: PathBuf,

    /// Output fragment map file
    #[arg(required = true)]
    pub output: PathBuf,

    /// Alignment format (auto-detected from the extension by default)
    #[arg(long, value_enum)]
    pub alignment_format: Option<AlignmentFormat>,

    /// Number of filler bases between consecutive fragments
    #[arg(short, long, default_value_t = DEFAULT_GAP_SIZE)]
    pub gap_size: u64,

    /// Least ratio of the two best alignment scores required to place a fragment
    #[arg(short, long)]
    pub ratio_threshold: Option<f64>,

    /// Leave fragments shorter than this unplaced
    #[arg(long)]
    pub min_fragment_length: Option<u64>,

    /// Name of the pseudo-chromosome for unplaced fragments
    #[arg(long, default_value = DEFAULT_UNPLACED_NAME)]
    pub unplaced_name: String,

    /// Do not emit the unplaced pseudo-chromosome
    #[arg(long)]
    pub no_unplaced: bool,

    /// Two-column TSV of reference chromosome and 0-based centromere
    /// position; alignments are split between the `_1` and `_2` arms
    #[arg(long)]
    pub centromeres: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum AlignmentFormat {
    /// BLAST tabular (outfmt 6 or 7)
    Blast,
    /// minimap2 PAF
    Paf,
}

impl AlignmentFormat {
    /// PAF for `.paf` files, BLAST tabular otherwise
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match file_extension(path).as_deref() {
            Some("paf") => Self::Paf,
            _ => Self::Blast,
        }
    }
}

/// Execute fragmentmap subcommand
///
/// # Errors
///
/// Returns an error if an input cannot be parsed, the map cannot be built, or
/// the output cannot be written.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: FragmentMapArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let lengths = parse_lengths_file(&args.fragment_lengths).with_context(|| {
        format!("Failed to read fragment lengths from {}", args.fragment_lengths.display())
    })?;

    let alignment_format = args
        .alignment_format
        .unwrap_or_else(|| AlignmentFormat::from_path(&args.alignments));
    let alignments = read_alignments(&args.alignments, alignment_format, &lengths)?;

    if verbose {
        eprintln!(
            "Read {} fragment lengths and {} alignments ({alignment_format:?})",
            lengths.len(),
            alignments.len()
        );
    }

    let mut config = BuildConfig::new(args.gap_size)
        .unplaced_name(args.unplaced_name.as_str())
        .emit_unplaced(!args.no_unplaced);
    if let Some(threshold) = args.ratio_threshold {
        config = config.ratio_threshold(threshold);
    }
    if let Some(length) = args.min_fragment_length {
        config = config.min_fragment_length(length);
    }
    if let Some(path) = &args.centromeres {
        let centromeres = tsv::parse_tsv_file(path)
            .with_context(|| format!("Failed to read centromeres from {}", path.display()))?;
        config = config.centromeres(centromeres);
    }

    let (map, report) = MapBuilder::new(config).build_with_report(alignments, &lengths)?;

    save_map(&map, &args.output)
        .with_context(|| format!("Failed to write fragment map to {}", args.output.display()))?;

    match format {
        OutputFormat::Text => print_text_report(&args.output, &map, &report),
        OutputFormat::Json => print_json_report(&args.output, &map, &report)?,
        OutputFormat::Tsv => print_tsv_report(&report),
    }

    Ok(())
}

fn read_alignments(
    path: &Path,
    format: AlignmentFormat,
    lengths: &FragmentLengths,
) -> anyhow::Result<Vec<AlignmentRecord>> {
    let records = match format {
        AlignmentFormat::Blast => blast::parse_blast_file(path, lengths),
        AlignmentFormat::Paf => paf::parse_paf_file(path),
    };
    records.with_context(|| format!("Failed to read alignments from {}", path.display()))
}

fn print_text_report(output: &Path, map: &FragmentMap, report: &BuildReport) {
    println!("Fragment map written to {}", output.display());
    println!("{}", "=".repeat(60));
    println!("  Chromosomes: {}", map.chromosomes().len());
    println!("  Placed fragments: {}", report.placed);
    println!("  Unlocalized fragments: {}", report.unlocalized.len());
    println!("  Unplaced fragments: {}", report.unplaced.len());
    println!("  Overlap conflicts: {}", report.conflicts.len());

    if !report.conflicts.is_empty() {
        println!("\nOverlap conflicts:");
        for c in &report.conflicts {
            println!(
                "  {}: kept {} ({}-{}), dropped {} ({}-{})",
                c.chromosome, c.kept, c.kept_start, c.kept_end, c.dropped, c.dropped_start, c.dropped_end
            );
        }
    }

    if !report.unplaced.is_empty() {
        println!("\nUnplaced fragments:");
        for u in &report.unplaced {
            println!("  {}: {}", u.fragment, u.reason);
        }
    }
}

fn print_json_report(output: &Path, map: &FragmentMap, report: &BuildReport) -> anyhow::Result<()> {
    let json = serde_json::json!({
        "output": output.display().to_string(),
        "gap_size": map.gap_size(),
        "chromosomes": map.chromosomes().len(),
        "report": report,
    });
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

fn print_tsv_report(report: &BuildReport) {
    println!("fragment\tstatus\tdetail");
    for c in &report.conflicts {
        println!("{}\toverlap\t{}:{}-{} kept {}", c.dropped, c.chromosome, c.dropped_start, c.dropped_end, c.kept);
    }
    for u in &report.unlocalized {
        println!("{}\tunlocalized\t{}", u.fragment, u.chromosome);
    }
    for u in &report.unplaced {
        println!("{}\tunplaced\t{}", u.fragment, u.reason);
    }
}
