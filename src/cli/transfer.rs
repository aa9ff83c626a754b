use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;

use crate::cli::OutputFormat;
use crate::core::map::FragmentMap;
use crate::parsing::input::{file_extension, write_in_order, AnnotationFile};
use crate::parsing::{bed, gff, vcf};
use crate::transfer::mapper::{
    CoordinateMapper, Payload, SkippedAnnotation, TransferError, TransferOptions,
    TransferredAnnotation,
};

#[derive(Args)]
pub struct TransferArgs {
    /// Fragment map file
    #[arg(required = true)]
    pub map: PathBuf,

    /// Annotations in fragment coordinates (BED, GFF3 or VCF, optionally gzipped)
    #[arg(required = true)]
    pub input: PathBuf,

    /// Output annotations in chromosome coordinates
    #[arg(required = true)]
    pub output: PathBuf,

    /// Annotation format (auto-detected from the extension by default)
    #[arg(long, value_enum)]
    pub annotation_format: Option<AnnotationFormat>,

    /// Skip annotations on unplaced and unlocalized pseudo-chromosomes
    #[arg(long)]
    pub exclude_pseudo: bool,

    /// Exit with an error if any annotation has invalid coordinates
    #[arg(long)]
    pub strict: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum AnnotationFormat {
    Bed,
    Gff,
    Vcf,
}

impl AnnotationFormat {
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        match file_extension(path)?.as_str() {
            "bed" => Some(Self::Bed),
            "gff" | "gff3" => Some(Self::Gff),
            "vcf" => Some(Self::Vcf),
            _ => None,
        }
    }
}

/// Counts and per-annotation problems of one transfer run
struct TransferSummary {
    total: usize,
    transferred: usize,
    skipped: Vec<SkippedAnnotation>,
    errors: Vec<TransferError>,
}

/// Execute transfer subcommand
///
/// # Errors
///
/// Returns an error if the map or annotations cannot be read, the output
/// cannot be written, or `--strict` is set and an annotation failed.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: TransferArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let annotation_format = match args.annotation_format {
        Some(f) => f,
        None => AnnotationFormat::from_path(&args.input).ok_or_else(|| {
            anyhow::anyhow!(
                "Cannot detect annotation format of {}; use --annotation-format",
                args.input.display()
            )
        })?,
    };

    let map = load_map(&args.map)?;
    let options = TransferOptions {
        include_pseudo: !args.exclude_pseudo,
    };
    let mapper = CoordinateMapper::new(&map).with_options(options);

    let summary = match annotation_format {
        AnnotationFormat::Bed => {
            let file = bed::parse_bed_file(&args.input)
                .with_context(|| format!("Failed to read BED file {}", args.input.display()))?;
            transfer_file(&mapper, file, &args.output, bed::write_bed_record)?
        }
        AnnotationFormat::Gff => {
            let file = gff::parse_gff_file(&args.input)
                .with_context(|| format!("Failed to read GFF3 file {}", args.input.display()))?;
            transfer_file(&mapper, file, &args.output, gff::write_gff_record)?
        }
        AnnotationFormat::Vcf => {
            let file = vcf::parse_vcf_file(&args.input)
                .with_context(|| format!("Failed to read VCF file {}", args.input.display()))?;
            transfer_vcf(&mapper, &map, file, &args.output)?
        }
    };

    if verbose {
        eprintln!(
            "Transferred {} of {} annotations ({annotation_format:?})",
            summary.transferred, summary.total
        );
    }

    match format {
        OutputFormat::Text => print_text_summary(&args.output, &summary),
        OutputFormat::Json => print_json_summary(&args.output, &summary)?,
        OutputFormat::Tsv => print_tsv_summary(&summary),
    }

    if args.strict && !summary.errors.is_empty() {
        anyhow::bail!("{} annotations could not be transferred", summary.errors.len());
    }

    Ok(())
}

fn load_map(path: &Path) -> anyhow::Result<FragmentMap> {
    crate::map::store::load_map(path)
        .with_context(|| format!("Failed to load fragment map {}", path.display()))
}

fn transfer_file<P, F>(
    mapper: &CoordinateMapper<'_>,
    file: AnnotationFile<P>,
    output: &Path,
    write_record: F,
) -> anyhow::Result<TransferSummary>
where
    P: Payload,
    F: FnMut(&mut BufWriter<File>, &TransferredAnnotation<P>) -> std::io::Result<()>,
{
    let AnnotationFile { lines, annotations } = file;
    let total = annotations.len();
    let outcome = mapper.transfer(annotations);

    let out = File::create(output).with_context(|| format!("Failed to create {}", output.display()))?;
    let mut writer = BufWriter::new(out);
    write_in_order(&mut writer, &lines, &outcome.transferred, write_record)
        .and_then(|()| writer.flush())
        .with_context(|| format!("Failed to write {}", output.display()))?;

    Ok(TransferSummary {
        total,
        transferred: outcome.transferred.len(),
        skipped: outcome.skipped,
        errors: outcome.errors,
    })
}

fn transfer_vcf(
    mapper: &CoordinateMapper<'_>,
    map: &FragmentMap,
    mut file: vcf::VcfFile,
    output: &Path,
) -> anyhow::Result<TransferSummary> {
    let annotations = std::mem::take(&mut file.annotations);
    let total = annotations.len();
    let outcome = mapper.transfer(annotations);

    let out = File::create(output).with_context(|| format!("Failed to create {}", output.display()))?;
    let mut writer = BufWriter::new(out);
    vcf::write_vcf(&mut writer, &file, map, &outcome.transferred)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    Ok(TransferSummary {
        total,
        transferred: outcome.transferred.len(),
        skipped: outcome.skipped,
        errors: outcome.errors,
    })
}

fn print_text_summary(output: &Path, summary: &TransferSummary) {
    println!("Annotations written to {}", output.display());
    println!("  Total: {}", summary.total);
    println!("  Transferred: {}", summary.transferred);
    println!("  Skipped: {}", summary.skipped.len());
    println!("  Errors: {}", summary.errors.len());

    for s in &summary.skipped {
        println!("  skipped #{} ({}): {}", s.index + 1, s.fragment, s.reason);
    }
    for e in &summary.errors {
        println!("  error: {e}");
    }
}

fn print_json_summary(output: &Path, summary: &TransferSummary) -> anyhow::Result<()> {
    let errors: Vec<String> = summary.errors.iter().map(ToString::to_string).collect();
    let json = serde_json::json!({
        "output": output.display().to_string(),
        "total": summary.total,
        "transferred": summary.transferred,
        "skipped": summary.skipped,
        "errors": errors,
    });
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

fn print_tsv_summary(summary: &TransferSummary) {
    println!("total\ttransferred\tskipped\terrors");
    println!(
        "{}\t{}\t{}\t{}",
        summary.total,
        summary.transferred,
        summary.skipped.len(),
        summary.errors.len()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_annotation_format_from_path() {
        assert_eq!(AnnotationFormat::from_path(Path::new("genes.bed")), Some(AnnotationFormat::Bed));
        assert_eq!(AnnotationFormat::from_path(Path::new("genes.gff3.gz")), Some(AnnotationFormat::Gff));
        assert_eq!(AnnotationFormat::from_path(Path::new("genes.gff")), Some(AnnotationFormat::Gff));
        assert_eq!(AnnotationFormat::from_path(Path::new("calls.vcf.gz")), Some(AnnotationFormat::Vcf));
        assert_eq!(AnnotationFormat::from_path(Path::new("genes.gtf")), None);
    }
}
