//! GFF3 annotations in fragment coordinates.
//!
//! Columns 4 and 5 are 1-based inclusive; they are held as 0-based half-open
//! intervals while transferring and converted back on output. Comment and
//! directive lines pass through, except `##sequence-region` lines, which
//! describe fragment extents and no longer apply. Reading stops at `##FASTA`.

use std::io::{BufRead, Write};
use std::path::Path;

use crate::core::types::Strand;
use crate::parsing::input::{open_input, write_in_order, AnnotationFile, ParseError};
use crate::transfer::mapper::{Annotation, Payload, TransferredAnnotation};

const SEQUENCE_REGION: &str = "##sequence-region";
const FASTA_DIRECTIVE: &str = "##FASTA";

/// GFF3 columns that travel unchanged with the feature
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GffPayload {
    pub source: String,
    pub feature_type: String,
    pub score: String,
    pub phase: String,
    pub attributes: String,
    /// Strand symbol written when the feature has no strand (`.` or `?`)
    pub unstranded: char,
}

impl Payload for GffPayload {}

/// Parse a GFF3 file (plain or gzipped)
///
/// # Errors
///
/// See [`read_gff`].
pub fn parse_gff_file(path: &Path) -> Result<AnnotationFile<GffPayload>, ParseError> {
    read_gff(open_input(path)?)
}

/// Parse GFF3 features from a stream
///
/// # Errors
///
/// Returns `ParseError::InvalidLine` with the 1-based line number if a
/// feature line does not have 9 columns, has a malformed or zero coordinate,
/// or an unknown strand symbol. Inverted features are read as they are and
/// fail individually when transferred.
pub fn read_gff<R: BufRead>(reader: R) -> Result<AnnotationFile<GffPayload>, ParseError> {
    let mut file = AnnotationFile::default();

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        if line.starts_with(FASTA_DIRECTIVE) {
            break;
        }
        if line.starts_with(SEQUENCE_REGION) {
            continue;
        }
        if line.starts_with('#') {
            file.push_text(line);
            continue;
        }
        file.push_record(parse_gff_line(line, i + 1)?);
    }

    Ok(file)
}

fn parse_gff_line(line: &str, line_num: usize) -> Result<Annotation<GffPayload>, ParseError> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() != 9 {
        return Err(ParseError::line(
            line_num,
            format!("expected 9 columns, found {}", fields.len()),
        ));
    }

    let coordinate = |index: usize, name: &str| -> Result<u64, ParseError> {
        match fields[index].trim().parse::<u64>() {
            Ok(value) if value > 0 => Ok(value),
            _ => Err(ParseError::line(
                line_num,
                format!("invalid {name} '{}'", fields[index]),
            )),
        }
    };

    let start = coordinate(3, "start")?;
    let end = coordinate(4, "end")?;

    let (strand, unstranded) = match fields[6] {
        "." => (None, '.'),
        "?" => (None, '?'),
        symbol => (
            Some(
                symbol
                    .parse::<Strand>()
                    .map_err(|e| ParseError::line(line_num, e.to_string()))?,
            ),
            '.',
        ),
    };

    Ok(Annotation {
        fragment: fields[0].to_string(),
        start: start - 1,
        end,
        strand,
        payload: GffPayload {
            source: fields[1].to_string(),
            feature_type: fields[2].to_string(),
            score: fields[5].to_string(),
            phase: fields[7].to_string(),
            attributes: fields[8].to_string(),
            unstranded,
        },
    })
}

/// Write one transferred feature as a GFF3 line
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_gff_record<W: Write>(
    writer: &mut W,
    record: &TransferredAnnotation<GffPayload>,
) -> std::io::Result<()> {
    let payload = &record.payload;
    let strand = record.strand.map_or(payload.unstranded, Strand::as_char);
    writeln!(
        writer,
        "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
        record.chromosome,
        payload.source,
        payload.feature_type,
        record.start + 1,
        record.end,
        payload.score,
        strand,
        payload.phase,
        payload.attributes
    )
}

/// Write a transferred GFF3 file, keeping comments and directives in place
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_gff<W: Write>(
    writer: &mut W,
    file: &AnnotationFile<GffPayload>,
    transferred: &[TransferredAnnotation<GffPayload>],
) -> std::io::Result<()> {
    write_in_order(writer, &file.lines, transferred, |w, record| {
        write_gff_record(w, record)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::map::{Chromosome, FragmentMap};
    use crate::core::types::ChromosomeKind;
    use crate::transfer::mapper::{transfer, TransferError};

    const GFF: &str = "\
##gff-version 3
##sequence-region F2 1 50
F2\tmaker\tgene\t1\t10\t.\t+\t.\tID=gene1
F1\tmaker\tCDS\t6\t25\t0.9\t-\t2\tID=cds1;Parent=mrna1
F2\tmaker\tregion\t1\t50\t.\t?\t.\tID=r1
##FASTA
>F1
ACGT
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
    fn test_read_gff() {
        let file = read_gff(GFF.as_bytes()).unwrap();

        assert_eq!(file.annotations.len(), 3);
        // sequence-region dropped, FASTA section ignored
        assert_eq!(file.lines.len(), 4);

        let gene = &file.annotations[0];
        assert_eq!((gene.start, gene.end), (0, 10));
        assert_eq!(gene.strand, Some(Strand::Forward));
        assert_eq!(gene.payload.feature_type, "gene");
        assert_eq!(file.annotations[2].payload.unstranded, '?');
    }

    #[test]
    fn test_transfer_gff() {
        let file = read_gff(GFF.as_bytes()).unwrap();
        let outcome = transfer(&example_map(), file.annotations.clone());
        assert!(outcome.is_complete());

        let mut out = Vec::new();
        write_gff(&mut out, &file, &outcome.transferred).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(
            text,
            "\
##gff-version 3
chr1\tmaker\tgene\t151\t160\t.\t-\t.\tID=gene1
chr1\tmaker\tCDS\t6\t25\t0.9\t-\t2\tID=cds1;Parent=mrna1
chr1\tmaker\tregion\t111\t160\t.\t?\t.\tID=r1
"
        );
    }

    #[test]
    fn test_inverted_features_fail_one_by_one() {
        let gff = "\
F1\tm\tgene\t20\t10\t.\t+\t.\tID=a
F1\tm\tgene\t30\t10\t.\t+\t.\tID=b
F1\tm\tgene\t1\t10\t.\t+\t.\tID=c
";
        let file = read_gff(gff.as_bytes()).unwrap();
        assert_eq!(file.annotations.len(), 3);

        let outcome = transfer(&example_map(), file.annotations.clone());
        assert_eq!(outcome.errors.len(), 2);
        assert!(matches!(
            outcome.errors[1],
            TransferError::Range { index: 1, start: 29, end: 10, .. }
        ));

        let mut out = Vec::new();
        write_gff(&mut out, &file, &outcome.transferred).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "chr1\tm\tgene\t1\t10\t.\t+\t.\tID=c\n"
        );
    }

    #[test]
    fn test_gff_errors_report_line() {
        assert!(matches!(
            read_gff("##gff-version 3\nF1\tm\tgene\t1\t10\t.\t+\t.\n".as_bytes()),
            Err(ParseError::InvalidLine { line: 2, .. })
        ));
        assert!(matches!(
            read_gff("F1\tm\tgene\t0\t10\t.\t+\t.\tID=a\n".as_bytes()),
            Err(ParseError::InvalidLine { line: 1, .. })
        ));
        assert!(matches!(
            read_gff("F1\tm\tgene\t1\t10\t.\tx\t.\tID=a\n".as_bytes()),
            Err(ParseError::InvalidLine { line: 1, .. })
        ));
    }
}
