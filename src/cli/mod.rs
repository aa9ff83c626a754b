//! Command-line interface for chromosomer.
//!
//! This module implements the CLI using clap. Available commands:
//!
//! - **fragmentmap**: Build a fragment map from alignments of fragments to reference chromosomes
//! - **assemble**: Write the FASTA of assembled chromosomes described by a fragment map
//! - **transfer**: Move BED, GFF3 or VCF records from fragment to chromosome coordinates
//! - **stats**: Summarize a fragment map, optionally exporting placements as BED
//!
//! ## Usage
//!
//! ```text
//! # Build a map from BLAST tabular alignments
//! chromosomer fragmentmap hits.blast fragments.fa.fai fragments.map --gap-size 100
//!
//! # Assemble chromosomes
//! chromosomer assemble fragments.map fragments.fa chromosomes.fa
//!
//! # Transfer gene models
//! chromosomer transfer fragments.map genes.gff3 genes.chromosomes.gff3
//!
//! # JSON summary for scripting
//! chromosomer stats fragments.map --format json
//! ```

use clap::{Parser, Subcommand};

pub mod assemble;
pub mod fragmentmap;
pub mod stats;
pub mod transfer;

#[derive(Parser)]
#[command(name = "chromosomer")]
#[command(version)]
#[command(about = "Reference-assisted chromosome assembly from fragment alignments")]
#[command(
    long_about = "chromosomer orders and orients assembly fragments (contigs or scaffolds) along reference chromosomes using their alignments, writes the assembled chromosome sequences, and transfers fragment annotations onto the assembled coordinates."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build a fragment map from fragment alignments to reference chromosomes
    Fragmentmap(fragmentmap::FragmentMapArgs),

    /// Assemble chromosome sequences from a fragment map
    Assemble(assemble::AssembleArgs),

    /// Transfer annotations from fragments to assembled chromosomes
    Transfer(transfer::TransferArgs),

    /// Summarize a fragment map
    Stats(stats::StatsArgs),
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Tsv,
}
