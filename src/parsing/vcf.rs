//! VCF variants in fragment coordinates, read and written with noodles.
//!
//! A record covers its reference allele: `[POS - 1, POS - 1 + len(REF))`.
//! On a reversed fragment the reference and sequence alternate alleles are
//! reverse complemented. Symbolic alleles, breakends and INFO fields such as
//! `END` are carried unchanged. The `##contig` lines of the output describe
//! the assembled chromosomes.

use std::io::{self, BufRead, Write};
use std::ops::Range;
use std::path::Path;

use noodles::core::Position;
use noodles::vcf;
use noodles::vcf::header::record::value::map::Contig;
use noodles::vcf::header::record::value::Map;
use noodles::vcf::variant::io::Write as _;
use noodles::vcf::variant::record_buf::AlternateBases;
use noodles::vcf::variant::RecordBuf;

use crate::assembly::sequence::reverse_complement;
use crate::core::map::FragmentMap;
use crate::core::types::Strand;
use crate::parsing::input::{open_input, ParseError};
use crate::transfer::mapper::{Annotation, Payload, Projection, TransferredAnnotation};

/// The variant record travelling with an annotation
#[derive(Debug, Clone)]
pub struct VcfPayload {
    pub record: RecordBuf,
}

/// Bases-only alleles are complemented; `*`, `.`, `<DEL>` and breakends are not
fn is_sequence_allele(allele: &str) -> bool {
    !allele.is_empty() && allele.bytes().all(|b| b.is_ascii_alphabetic())
}

fn reverse_complement_allele(allele: &str) -> String {
    if is_sequence_allele(allele) {
        String::from_utf8_lossy(&reverse_complement(allele.as_bytes())).into_owned()
    } else {
        allele.to_string()
    }
}

impl Payload for VcfPayload {
    fn project(&mut self, projection: &Projection) -> Result<(), Range<u64>> {
        if projection.orientation == Strand::Reverse {
            let reference = reverse_complement_allele(self.record.reference_bases());
            *self.record.reference_bases_mut() = reference;

            let alternates: Vec<String> = self
                .record
                .alternate_bases()
                .as_ref()
                .iter()
                .map(|allele| reverse_complement_allele(allele))
                .collect();
            *self.record.alternate_bases_mut() = AlternateBases::from(alternates);
        }
        Ok(())
    }
}

/// A VCF header and its records as annotations
#[derive(Debug, Clone)]
pub struct VcfFile {
    pub header: vcf::Header,
    pub annotations: Vec<Annotation<VcfPayload>>,
}

/// Parse a VCF file (plain or gzipped)
///
/// # Errors
///
/// See [`read_vcf`].
pub fn parse_vcf_file(path: &Path) -> Result<VcfFile, ParseError> {
    read_vcf(open_input(path)?)
}

/// Parse a VCF header and its records
///
/// # Errors
///
/// Returns `ParseError::Noodles` if the header or a record is malformed, and
/// `ParseError::InvalidFormat` for a record without a position.
pub fn read_vcf<R: BufRead>(reader: R) -> Result<VcfFile, ParseError> {
    let mut reader = vcf::io::Reader::new(reader);
    let header = reader
        .read_header()
        .map_err(|e| ParseError::Noodles(format!("Failed to parse VCF header: {e}")))?;

    let mut annotations = Vec::new();
    for (i, result) in reader.record_bufs(&header).enumerate() {
        let record = result
            .map_err(|e| ParseError::Noodles(format!("Failed to parse VCF record {}: {e}", i + 1)))?;

        let position = record.variant_start().ok_or_else(|| {
            ParseError::InvalidFormat(format!("VCF record {} has no position", i + 1))
        })?;
        let start = usize::from(position) as u64 - 1;
        let span = record.reference_bases().len().max(1) as u64;

        annotations.push(Annotation {
            fragment: record.reference_sequence_name().to_string(),
            start,
            end: start.saturating_add(span),
            strand: None,
            payload: VcfPayload { record },
        });
    }

    Ok(VcfFile {
        header,
        annotations,
    })
}

fn invalid_data(message: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message)
}

/// Header for the transferred file: the input header with one `##contig`
/// line per assembled chromosome in place of the fragment contigs
fn chromosome_header(header: &vcf::Header, map: &FragmentMap) -> io::Result<vcf::Header> {
    let mut header = header.clone();
    let contigs = header.contigs_mut();
    contigs.clear();

    for chromosome in map.chromosomes() {
        let length = usize::try_from(chromosome.length())
            .map_err(|_| invalid_data(format!("chromosome '{}' is too long", chromosome.name())))?;
        let mut contig = Map::<Contig>::new();
        *contig.length_mut() = Some(length);
        contigs.insert(chromosome.name().to_string(), contig);
    }

    Ok(header)
}

/// Write a transferred VCF file.
///
/// Records keep their input order; skipped and failed records are left out.
///
/// # Errors
///
/// Returns an error if writing fails or a position does not fit the platform.
pub fn write_vcf<W: Write>(
    writer: &mut W,
    file: &VcfFile,
    map: &FragmentMap,
    transferred: &[TransferredAnnotation<VcfPayload>],
) -> io::Result<()> {
    let header = chromosome_header(&file.header, map)?;

    let mut vcf_writer = vcf::io::Writer::new(&mut *writer);
    vcf_writer.write_header(&header)?;

    for variant in transferred {
        let mut record = variant.payload.record.clone();
        *record.reference_sequence_name_mut() = variant.chromosome.clone();

        let position = usize::try_from(variant.start + 1)
            .ok()
            .and_then(Position::new)
            .ok_or_else(|| invalid_data(format!("position {} out of range", variant.start + 1)))?;
        *record.variant_start_mut() = Some(position);

        vcf_writer.write_variant_record(&header, &record)?;
    }

    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::map::Chromosome;
    use crate::core::types::ChromosomeKind;
    use crate::transfer::mapper::{transfer, SkipReason};

    const VCF: &str = "\
##fileformat=VCFv4.3
##INFO=<ID=DP,Number=1,Type=Integer,Description=\"Depth\">
##contig=<ID=F1,length=100>
##contig=<ID=F2,length=50>
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO
F1\t5\trs1\tAC\tA\t.\t.\tDP=10
F2\t3\trs2\tA\tC,<DEL>\t.\t.\tDP=7
F9\t1\trs3\tG\tT\t.\t.\t.
";

    fn example_map() -> FragmentMap {
        let chr1 = Chromosome::lay_out(
            "chr1",
            ChromosomeKind::Reference,
            vec![
                ("F1".to_string(), Strand::Forward, 100),
                ("F2".to_string(), Strand::Reverse, 50),
            ],
            10,
        )
        .unwrap();
        FragmentMap::new(10, vec![chr1]).unwrap()
    }

    #[test]
    fn test_read_vcf_spans_reference_allele() {
        let file = read_vcf(VCF.as_bytes()).unwrap();
        assert_eq!(file.annotations.len(), 3);

        let deletion = &file.annotations[0];
        assert_eq!(deletion.fragment, "F1");
        assert_eq!((deletion.start, deletion.end), (4, 6));
        assert_eq!(deletion.strand, None);
    }

    #[test]
    fn test_transfer_vcf() {
        let map = example_map();
        let file = read_vcf(VCF.as_bytes()).unwrap();
        let outcome = transfer(&map, file.annotations.clone());

        assert_eq!(outcome.transferred.len(), 2);
        assert_eq!(outcome.skipped[0].reason, SkipReason::NotInMap);

        let mut out = Vec::new();
        write_vcf(&mut out, &file, &map, &outcome.transferred).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("##contig=<ID=chr1,length=160>"));
        assert!(!text.contains("ID=F2"));

        let records: Vec<Vec<&str>> = text
            .lines()
            .filter(|line| !line.starts_with('#'))
            .map(|line| line.split('\t').collect())
            .collect();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0][..5], ["chr1", "5", "rs1", "AC", "A"]);
        // F2 is reversed: [2,3) maps to [157,158) and the alleles are complemented
        assert_eq!(records[1][..5], ["chr1", "158", "rs2", "T", "G,<DEL>"]);
        assert_eq!(records[1][7], "DP=7");
    }

    #[test]
    fn test_allele_complement_rules() {
        assert_eq!(reverse_complement_allele("ACG"), "CGT");
        assert_eq!(reverse_complement_allele("<DUP>"), "<DUP>");
        assert_eq!(reverse_complement_allele("*"), "*");
        assert_eq!(reverse_complement_allele("G]chr2:100]"), "G]chr2:100]");
    }

    #[test]
    fn test_malformed_vcf() {
        let bad = "\
##fileformat=VCFv4.3
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO
F1\tx\t.\tA\tC\t.\t.\t.
";
        assert!(matches!(
            read_vcf(bad.as_bytes()),
            Err(ParseError::Noodles(_))
        ));
    }
}
