//! Readers and writers for the files chromosomer consumes and produces.
//!
//! - **Alignments**: BLAST tabular ([`blast`]) and PAF ([`paf`])
//! - **Fragment lengths**: FASTA ([`fasta`]), FASTA index ([`fai`]) and
//!   two-column TSV ([`tsv`]), dispatched by [`input::parse_lengths_file`]
//! - **Fragment sequences**: FASTA ([`fasta`])
//! - **Annotations**: BED ([`bed`]) and GFF3 ([`gff`]), read into an
//!   [`AnnotationFile`](input::AnnotationFile) that keeps header lines so the
//!   transferred file can be written back in input order
//! - **Variants**: VCF ([`vcf`]) through the noodles reader and writer
//!
//! All text inputs may be gzip or bgzip compressed. Line numbers in
//! [`ParseError`](input::ParseError) are 1-based.
//!
//! ## Example
//!
//! ```rust,no_run
//! use chromosomer::parsing::{blast, input};
//! use std::path::Path;
//!
//! let lengths = input::parse_lengths_file(Path::new("fragments.fa.fai")).unwrap();
//! let alignments = blast::parse_blast_file(Path::new("hits.blast"), &lengths).unwrap();
//! ```

pub mod bed;
pub mod blast;
pub mod fai;
pub mod fasta;
pub mod gff;
pub mod input;
pub mod paf;
pub mod tsv;
pub mod vcf;
