//! Parser for FASTA index (.fai) files using noodles.
//!
//! Only the name and length columns are used.
//! Format: `name\tlength\toffset\tline_bases\tline_width`

use std::io::BufRead;
use std::path::Path;

use noodles::fasta;

use crate::parsing::input::{insert_length, open_input, FragmentLengths, ParseError};

/// Parse fragment lengths from a FASTA index (.fai) file
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read, `ParseError::Noodles` if
/// parsing fails, `ParseError::DuplicateName` for repeated names or
/// `ParseError::InvalidFormat` if no records are found.
pub fn parse_fai_file(path: &Path) -> Result<FragmentLengths, ParseError> {
    read_fai(open_input(path)?)
}

/// Parse fragment lengths from a FASTA index stream
///
/// # Errors
///
/// See [`parse_fai_file`].
pub fn read_fai<R: BufRead>(reader: R) -> Result<FragmentLengths, ParseError> {
    let index = fasta::fai::io::Reader::new(reader)
        .read_index()
        .map_err(|e| ParseError::Noodles(format!("Failed to parse FAI file: {e}")))?;

    let mut lengths = FragmentLengths::new();
    for record in index.as_ref() {
        let name = String::from_utf8_lossy(record.name()).to_string();
        insert_length(&mut lengths, name, record.length())?;
    }

    if lengths.is_empty() {
        return Err(ParseError::InvalidFormat(
            "No records found in FAI file".to_string(),
        ));
    }

    Ok(lengths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_fai() {
        let fai = "scaffold_1\t1500\t12\t60\t61\nscaffold_2\t42\t1550\t60\t61\n";
        let lengths = read_fai(fai.as_bytes()).unwrap();
        assert_eq!(lengths.len(), 2);
        assert_eq!(lengths["scaffold_1"], 1500);
        assert_eq!(lengths["scaffold_2"], 42);
    }

    #[test]
    fn test_read_fai_invalid_length() {
        let fai = "scaffold_1\tlong\t12\t60\t61\n";
        assert!(matches!(
            read_fai(fai.as_bytes()),
            Err(ParseError::Noodles(_))
        ));
    }

    #[test]
    fn test_read_fai_empty() {
        assert!(matches!(
            read_fai(&b""[..]),
            Err(ParseError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_parse_fai_file() {
        let mut file = tempfile::Builder::new().suffix(".fai").tempfile().unwrap();
        writeln!(file, "ctg7\t700\t6\t70\t71").unwrap();
        file.flush().unwrap();

        let lengths = parse_fai_file(file.path()).unwrap();
        assert_eq!(lengths["ctg7"], 700);
    }
}
