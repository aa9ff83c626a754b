//! FASTA reading and writing using noodles.
//!
//! Fragment FASTA files provide either just the lengths (for map building)
//! or the full sequences (for assembly). Both uncompressed and gzip/bgzip
//! compressed files are read.
//!
//! Supported extensions:
//! - `.fa`, `.fasta`, `.fna` (uncompressed)
//! - `.fa.gz`, `.fasta.gz`, `.fna.gz` (gzip compressed)
//! - `.fa.bgz`, `.fasta.bgz`, `.fna.bgz` (bgzip compressed)

use std::collections::HashMap;
use std::ffi::OsStr;
use std::io::{BufRead, Write};
use std::path::Path;

use noodles::fasta;

use crate::assembly::assembler::AssembledChromosome;
use crate::parsing::input::{insert_length, open_input, FragmentLengths, ParseError};

/// Default number of bases per line in written FASTA
pub const DEFAULT_LINE_WIDTH: usize = 72;

/// Check if the path has a FASTA extension
#[must_use]
pub fn is_fasta_file(path: &Path) -> bool {
    let path_str = path.to_string_lossy().to_lowercase();

    // Check for gzipped FASTA
    if [".fa", ".fasta", ".fna"].iter().any(|ext| {
        path_str.ends_with(&format!("{ext}.gz")) || path_str.ends_with(&format!("{ext}.bgz"))
    }) {
        return true;
    }

    matches!(
        path.extension()
            .and_then(OsStr::to_str)
            .map(str::to_lowercase)
            .as_deref(),
        Some("fa" | "fasta" | "fna")
    )
}

/// Read the name and length of every record in a FASTA file
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read, `ParseError::Noodles` if
/// parsing fails, `ParseError::DuplicateName` for repeated names or
/// `ParseError::InvalidFormat` if no sequences are found.
pub fn parse_lengths_file(path: &Path) -> Result<FragmentLengths, ParseError> {
    read_lengths(open_input(path)?)
}

/// Read every record of a FASTA file into memory
///
/// # Errors
///
/// Same as [`parse_lengths_file`].
pub fn parse_sequences_file(path: &Path) -> Result<HashMap<String, Vec<u8>>, ParseError> {
    read_sequences(open_input(path)?)
}

/// Read record lengths from a FASTA stream
///
/// # Errors
///
/// See [`parse_lengths_file`].
pub fn read_lengths<R: BufRead>(reader: R) -> Result<FragmentLengths, ParseError> {
    let mut lengths = FragmentLengths::new();
    for_each_record(reader, |name, sequence| {
        insert_length(&mut lengths, name, sequence.len() as u64)
    })?;
    Ok(lengths)
}

/// Read record sequences from a FASTA stream
///
/// # Errors
///
/// See [`parse_lengths_file`].
pub fn read_sequences<R: BufRead>(reader: R) -> Result<HashMap<String, Vec<u8>>, ParseError> {
    let mut sequences = HashMap::new();
    for_each_record(reader, |name, sequence| {
        if sequences.contains_key(&name) {
            return Err(ParseError::DuplicateName(name));
        }
        sequences.insert(name, sequence.to_vec());
        Ok(())
    })?;
    Ok(sequences)
}

fn for_each_record<R, F>(reader: R, mut visit: F) -> Result<(), ParseError>
where
    R: BufRead,
    F: FnMut(String, &[u8]) -> Result<(), ParseError>,
{
    let mut fasta_reader = fasta::io::Reader::new(reader);
    let mut count = 0usize;

    for result in fasta_reader.records() {
        let record = result
            .map_err(|e| ParseError::Noodles(format!("Failed to parse FASTA record: {e}")))?;

        let name = String::from_utf8_lossy(record.name()).to_string();
        visit(name, record.sequence().as_ref())?;
        count += 1;
    }

    if count == 0 {
        return Err(ParseError::InvalidFormat(
            "No sequences found in FASTA file".to_string(),
        ));
    }

    Ok(())
}

/// Write assembled chromosomes as FASTA with `line_width` bases per line
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_fasta<W, I>(mut writer: W, chromosomes: I, line_width: usize) -> std::io::Result<()>
where
    W: Write,
    I: IntoIterator<Item = AssembledChromosome>,
{
    let mut fasta_writer = fasta::io::writer::Builder::default()
        .set_line_base_count(line_width)
        .build_from_writer(&mut writer);

    for chromosome in chromosomes {
        let definition = fasta::record::Definition::new(chromosome.name, None);
        let record = fasta::Record::new(definition, chromosome.sequence.into());
        fasta_writer.write_record(&record)?;
    }

    drop(fasta_writer);
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::fs::File;
    use tempfile::TempDir;

    #[test]
    fn test_is_fasta_file() {
        assert!(is_fasta_file(Path::new("test.fa")));
        assert!(is_fasta_file(Path::new("test.fasta")));
        assert!(is_fasta_file(Path::new("test.fna")));
        assert!(is_fasta_file(Path::new("test.fa.gz")));
        assert!(is_fasta_file(Path::new("test.fasta.gz")));
        assert!(is_fasta_file(Path::new("test.fna.bgz")));
        assert!(is_fasta_file(Path::new("/path/to/Contigs.FA")));

        assert!(!is_fasta_file(Path::new("test.bam")));
        assert!(!is_fasta_file(Path::new("test.fai")));
        assert!(!is_fasta_file(Path::new("test.gz")));
    }

    #[test]
    fn test_read_lengths() {
        let text = b">frag1 description\nACGT\nAC\n>frag2\nNNNNNNNNNN\n";
        let lengths = read_lengths(&text[..]).unwrap();
        assert_eq!(lengths.len(), 2);
        assert_eq!(lengths["frag1"], 6);
        assert_eq!(lengths["frag2"], 10);
    }

    #[test]
    fn test_read_sequences_joins_lines() {
        let text = b">f1\nACGT\nacgt\n>f2\nGG\n";
        let sequences = read_sequences(&text[..]).unwrap();
        assert_eq!(sequences["f1"], b"ACGTacgt".to_vec());
        assert_eq!(sequences["f2"], b"GG".to_vec());
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let text = b">f1\nACGT\n>f1\nGG\n";
        assert!(matches!(
            read_sequences(&text[..]),
            Err(ParseError::DuplicateName(_))
        ));
        assert!(matches!(
            read_lengths(&text[..]),
            Err(ParseError::DuplicateName(_))
        ));
    }

    #[test]
    fn test_empty_fasta() {
        assert!(matches!(
            read_lengths(&b""[..]),
            Err(ParseError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_parse_gzipped_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("frags.fa.gz");
        let mut encoder = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        encoder.write_all(b">f1\nACGTACGT\n>f2\nAC\n").unwrap();
        encoder.finish().unwrap();

        let lengths = parse_lengths_file(&path).unwrap();
        assert_eq!(lengths["f1"], 8);

        let sequences = parse_sequences_file(&path).unwrap();
        assert_eq!(sequences["f2"], b"AC".to_vec());
    }

    #[test]
    fn test_parse_plain_file() {
        let mut file = tempfile::Builder::new().suffix(".fa").tempfile().unwrap();
        writeln!(file, ">contig_1\nACGTN").unwrap();
        file.flush().unwrap();

        let lengths = parse_lengths_file(file.path()).unwrap();
        assert_eq!(lengths["contig_1"], 5);
    }

    #[test]
    fn test_write_fasta_wraps_lines() {
        let chromosomes = vec![
            AssembledChromosome {
                name: "chr1".to_string(),
                sequence: b"ACGTACGTAC".to_vec(),
            },
            AssembledChromosome {
                name: "chrUn".to_string(),
                sequence: b"NN".to_vec(),
            },
        ];

        let mut out = Vec::new();
        write_fasta(&mut out, chromosomes, 4).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            ">chr1\nACGT\nACGT\nAC\n>chrUn\nNN\n"
        );
    }
}
