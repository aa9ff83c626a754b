//! Parser for BLAST tabular alignments (outfmt 6 and 7).
//!
//! Fragments are the BLAST queries and reference chromosomes the subjects.
//! Only the standard 12 columns are read:
//!
//! | # | Column | Use |
//! |---|--------|-----|
//! | 1 | qseqid | fragment |
//! | 2 | sseqid | reference chromosome |
//! | 7-8 | qstart, qend | fragment interval |
//! | 9-10 | sstart, send | reference interval; `sstart > send` means `-` |
//! | 12 | bitscore | score |
//!
//! Coordinates are 1-based inclusive and converted to 0-based half-open.
//! BLAST does not report query lengths, so converting hits into
//! [`AlignmentRecord`]s needs the fragment lengths.

use std::io::BufRead;
use std::path::Path;

use crate::core::alignment::{AlignmentError, AlignmentRecord};
use crate::core::types::Strand;
use crate::parsing::input::{open_input, FragmentLengths, ParseError};

/// One line of BLAST tabular output
#[derive(Debug, Clone, PartialEq)]
pub struct BlastHit {
    pub qseqid: String,
    pub sseqid: String,
    pub pident: f64,
    pub length: u64,
    pub mismatch: u64,
    pub gapopen: u64,
    pub qstart: u64,
    pub qend: u64,
    pub sstart: u64,
    pub send: u64,
    pub evalue: f64,
    pub bitscore: f64,
}

impl BlastHit {
    /// Parse a single tab-separated line
    ///
    /// # Errors
    ///
    /// Returns `ParseError::InvalidLine` if a column is missing or malformed.
    pub fn from_line(line: &str, line_num: usize) -> Result<Self, ParseError> {
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 12 {
            return Err(ParseError::line(
                line_num,
                format!("expected 12 columns, found {}", fields.len()),
            ));
        }

        fn field<T: std::str::FromStr>(
            fields: &[&str],
            index: usize,
            name: &str,
            line_num: usize,
        ) -> Result<T, ParseError> {
            fields[index].trim().parse().map_err(|_| {
                ParseError::line(line_num, format!("invalid {name} '{}'", fields[index]))
            })
        }

        Ok(Self {
            qseqid: fields[0].to_string(),
            sseqid: fields[1].to_string(),
            pident: field(&fields, 2, "pident", line_num)?,
            length: field(&fields, 3, "length", line_num)?,
            mismatch: field(&fields, 4, "mismatch", line_num)?,
            gapopen: field(&fields, 5, "gapopen", line_num)?,
            qstart: field(&fields, 6, "qstart", line_num)?,
            qend: field(&fields, 7, "qend", line_num)?,
            sstart: field(&fields, 8, "sstart", line_num)?,
            send: field(&fields, 9, "send", line_num)?,
            evalue: field(&fields, 10, "evalue", line_num)?,
            bitscore: field(&fields, 11, "bitscore", line_num)?,
        })
    }

    #[must_use]
    pub fn strand(&self) -> Strand {
        if self.sstart > self.send {
            Strand::Reverse
        } else {
            Strand::Forward
        }
    }

    /// Convert to a validated alignment record
    ///
    /// # Errors
    ///
    /// Returns an `AlignmentError` if the converted intervals are invalid.
    pub fn to_alignment(&self, fragment_length: u64) -> Result<AlignmentRecord, AlignmentError> {
        AlignmentRecord::new(
            self.qseqid.as_str(),
            fragment_length,
            one_based_to_half_open(self.qstart, self.qend),
            self.sseqid.as_str(),
            one_based_to_half_open(self.sstart, self.send),
            self.strand(),
            self.bitscore,
        )
    }
}

/// Convert a 1-based inclusive pair in either order to a 0-based half-open range.
/// A zero coordinate yields an empty range, which record validation rejects.
fn one_based_to_half_open(a: u64, b: u64) -> std::ops::Range<u64> {
    let (low, high) = if a <= b { (a, b) } else { (b, a) };
    if low == 0 {
        return 0..0;
    }
    low - 1..high
}

/// Parse BLAST hits from a stream, skipping blank and `#` comment lines
///
/// # Errors
///
/// Returns `ParseError::InvalidLine` on malformed lines.
pub fn read_blast_hits<R: BufRead>(reader: R) -> Result<Vec<(usize, BlastHit)>, ParseError> {
    let mut hits = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        let line_num = i + 1;
        hits.push((line_num, BlastHit::from_line(line, line_num)?));
    }
    Ok(hits)
}

/// Parse BLAST tabular alignments into alignment records
///
/// # Errors
///
/// Returns `ParseError::InvalidLine` on malformed lines or hits on fragments
/// with no known length, and `ParseError::InvalidAlignment` if a hit fails
/// record validation.
pub fn read_blast<R: BufRead>(
    reader: R,
    lengths: &FragmentLengths,
) -> Result<Vec<AlignmentRecord>, ParseError> {
    read_blast_hits(reader)?
        .into_iter()
        .map(|(line, hit)| {
            let length = *lengths.get(&hit.qseqid).ok_or_else(|| {
                ParseError::line(line, format!("fragment '{}' has no known length", hit.qseqid))
            })?;
            hit.to_alignment(length)
                .map_err(|source| ParseError::InvalidAlignment { line, source })
        })
        .collect()
}

/// Parse a BLAST tabular file (plain or gzipped)
///
/// # Errors
///
/// See [`read_blast`].
pub fn parse_blast_file(
    path: &Path,
    lengths: &FragmentLengths,
) -> Result<Vec<AlignmentRecord>, ParseError> {
    read_blast(open_input(path)?, lengths)
}
