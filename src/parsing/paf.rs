//! Parser for PAF (Pairwise mApping Format) alignments, as written by
//! minimap2 and similar aligners.
//!
//! Fragments are the PAF queries and reference chromosomes the targets.
//! Coordinates are already 0-based half-open. The alignment score is taken
//! from the `AS:i` tag when present, otherwise from the number of residue
//! matches (column 10).

use std::io::BufRead;
use std::path::Path;

use crate::core::alignment::AlignmentRecord;
use crate::core::types::{InvalidStrand, Strand};
use crate::parsing::input::{open_input, ParseError};

/// Parse one PAF line into an alignment record
///
/// # Errors
///
/// Returns `ParseError::InvalidLine` if a column is missing or malformed and
/// `ParseError::InvalidAlignment` if the record fails validation.
pub fn parse_paf_line(line: &str, line_num: usize) -> Result<AlignmentRecord, ParseError> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < 12 {
        return Err(ParseError::line(
            line_num,
            format!("expected at least 12 columns, found {}", fields.len()),
        ));
    }

    let number = |index: usize, name: &str| -> Result<u64, ParseError> {
        fields[index]
            .parse()
            .map_err(|_| ParseError::line(line_num, format!("invalid {name} '{}'", fields[index])))
    };

    let query_length = number(1, "query length")?;
    let query_start = number(2, "query start")?;
    let query_end = number(3, "query end")?;
    let strand: Strand = fields[4]
        .parse()
        .map_err(|e: InvalidStrand| ParseError::line(line_num, e.to_string()))?;
    let target_start = number(7, "target start")?;
    let target_end = number(8, "target end")?;
    let matches = number(9, "residue matches")?;

    let score = match alignment_score_tag(&fields[12..]) {
        Some(tag) => tag.map_err(|value| {
            ParseError::line(line_num, format!("invalid AS:i tag value '{value}'"))
        })?,
        None => matches as f64,
    };

    AlignmentRecord::new(
        fields[0],
        query_length,
        query_start..query_end,
        fields[5],
        target_start..target_end,
        strand,
        score,
    )
    .map_err(|source| ParseError::InvalidAlignment {
        line: line_num,
        source,
    })
}

/// Value of the `AS:i` tag, if any. The error carries the raw value.
fn alignment_score_tag<'a>(tags: &[&'a str]) -> Option<Result<f64, &'a str>> {
    tags.iter().find_map(|tag| {
        tag.strip_prefix("AS:i:")
            .map(|value| value.parse::<i64>().map(|v| v as f64).map_err(|_| value))
    })
}

/// Parse PAF alignments from a stream, skipping blank and `#` lines
///
/// # Errors
///
/// See [`parse_paf_line`].
pub fn read_paf<R: BufRead>(reader: R) -> Result<Vec<AlignmentRecord>, ParseError> {
    let mut records = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        records.push(parse_paf_line(line, i + 1)?);
    }
    Ok(records)
}

/// Parse a PAF file (plain or gzipped)
///
/// # Errors
///
/// See [`parse_paf_line`].
pub fn parse_paf_file(path: &Path) -> Result<Vec<AlignmentRecord>, ParseError> {
    read_paf(open_input(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::alignment::AlignmentError;

    #[test]
    fn test_parse_paf_with_score_tag() {
        let paf = "ctg1\t1000\t10\t990\t-\tchr3\t50000\t2000\t2980\t950\t980\t60\ttp:A:P\tAS:i:1800\n";
        let records = read_paf(paf.as_bytes()).unwrap();

        let record = &records[0];
        assert_eq!(record.fragment(), "ctg1");
        assert_eq!(record.fragment_length(), 1000);
        assert_eq!(record.fragment_interval(), 10..990);
        assert_eq!(record.reference(), "chr3");
        assert_eq!(record.reference_interval(), 2000..2980);
        assert_eq!(record.strand(), Strand::Reverse);
        assert!((record.score() - 1800.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_score_defaults_to_matches() {
        let paf = "ctg2\t500\t0\t500\t+\tchr1\t9000\t100\t600\t480\t500\t60\n";
        let records = read_paf(paf.as_bytes()).unwrap();
        assert!((records[0].score() - 480.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_invalid_strand() {
        let paf = "ctg2\t500\t0\t500\t*\tchr1\t9000\t100\t600\t480\t500\t60\n";
        assert!(matches!(
            read_paf(paf.as_bytes()),
            Err(ParseError::InvalidLine { line: 1, .. })
        ));
    }

    #[test]
    fn test_invalid_score_tag() {
        let paf = "ctg2\t500\t0\t500\t+\tchr1\t9000\t100\t600\t480\t500\t60\tAS:i:high\n";
        assert!(matches!(
            read_paf(paf.as_bytes()),
            Err(ParseError::InvalidLine { .. })
        ));
    }

    #[test]
    fn test_query_end_past_length() {
        let paf = "# header\nctg2\t500\t0\t501\t+\tchr1\t9000\t100\t601\t480\t500\t60\n";
        assert!(matches!(
            read_paf(paf.as_bytes()),
            Err(ParseError::InvalidAlignment {
                line: 2,
                source: AlignmentError::FragmentIntervalOutOfBounds { .. }
            })
        ));
    }

    #[test]
    fn test_too_few_columns() {
        assert!(matches!(
            read_paf("ctg\t5\t0\n".as_bytes()),
            Err(ParseError::InvalidLine { line: 1, .. })
        ));
    }
}
