//! # chromosomer
//!
//! A library for reference-assisted chromosome assembly.
//!
//! Draft assemblies often consist of thousands of fragments (contigs or
//! scaffolds) with no chromosome-level order. When a related reference genome
//! is available, alignments of the fragments to its chromosomes tell where
//! each fragment belongs and in which orientation.
//!
//! `chromosomer` turns those alignments into a **fragment map**: for every
//! output chromosome, the ordered list of fragments with their strand and
//! offset, separated by fixed-size gaps. The map then drives:
//!
//! - **Assembly**: concatenating fragment sequences into chromosome sequences
//! - **Coordinate transfer**: moving annotations (BED, GFF3) from fragment
//!   coordinates to assembled chromosome coordinates
//! - **Summaries**: per-chromosome statistics and BED export of placements
//!
//! ## Example
//!
//! ```rust
//! use std::collections::HashMap;
//! use chromosomer::{
//!     transfer, Annotation, Assembler, AssemblyConfig, AlignmentRecord, BuildConfig,
//!     MapBuilder, Strand,
//! };
//!
//! let alignments = vec![
//!     AlignmentRecord::new("F1", 100, 0..100, "chr1", 0..100, Strand::Forward, 100.0).unwrap(),
//!     AlignmentRecord::new("F2", 50, 0..50, "chr1", 150..200, Strand::Reverse, 50.0).unwrap(),
//! ];
//! let lengths = HashMap::from([("F1".to_string(), 100), ("F2".to_string(), 50)]);
//! let map = MapBuilder::new(BuildConfig::new(10)).build(alignments, &lengths).unwrap();
//!
//! let sequences = HashMap::from([
//!     ("F1".to_string(), vec![b'A'; 100]),
//!     ("F2".to_string(), vec![b'C'; 50]),
//! ]);
//! let assembled = Assembler::new(AssemblyConfig::default())
//!     .assemble(&map, &sequences)
//!     .unwrap();
//! assert_eq!(assembled[0].len(), 160);
//!
//! let outcome = transfer(
//!     &map,
//!     vec![Annotation {
//!         fragment: "F2".to_string(),
//!         start: 0,
//!         end: 10,
//!         strand: Some(Strand::Forward),
//!         payload: "gene1".to_string(),
//!     }],
//! );
//! let gene = &outcome.transferred[0];
//! assert_eq!((gene.start, gene.end, gene.strand), (150, 160, Some(Strand::Reverse)));
//! ```
//!
//! ## Modules
//!
//! - [`core`]: Alignment records, placements and the fragment map
//! - [`map`]: Map building, persistence and summaries
//! - [`assembly`]: Chromosome sequence assembly
//! - [`transfer`]: Annotation coordinate transfer
//! - [`parsing`]: Readers and writers for alignments, lengths, FASTA, BED and GFF3
//! - [`cli`]: Command-line interface implementation

pub mod assembly;
pub mod cli;
pub mod core;
pub mod map;
pub mod parsing;
pub mod transfer;

// Re-export commonly used types for convenience
pub use assembly::assembler::{AssembledChromosome, Assembler, AssemblyConfig, FragmentSequences};
pub use core::alignment::AlignmentRecord;
pub use core::map::{Chromosome, FragmentMap};
pub use core::placement::{Gap, MapEntry, Placement};
pub use core::types::*;
pub use map::builder::{BuildConfig, BuildReport, MapBuilder};
pub use transfer::mapper::{transfer, Annotation, CoordinateMapper, TransferOutcome};
