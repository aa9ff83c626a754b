use std::io::BufRead;
use std::path::Path;

use crate::parsing::input::{insert_length, open_input, FragmentLengths, ParseError};

/// Parse a TSV file with columns: name, length
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read, or other parse errors
/// if the content is invalid.
pub fn parse_tsv_file(path: &Path) -> Result<FragmentLengths, ParseError> {
    read_tsv(open_input(path)?)
}

/// Parse TSV text with columns: name, length
///
/// # Errors
///
/// See [`read_tsv`].
pub fn parse_tsv_text(text: &str) -> Result<FragmentLengths, ParseError> {
    read_tsv(text.as_bytes())
}

/// Parse name/length pairs, one per line.
///
/// Blank lines and `#` comments are skipped, as is a first data line whose
/// first column reads `name`, `fragment`, `contig` or `chromosome`.
///
/// # Errors
///
/// Returns `ParseError::InvalidLine` if a line has fewer than 2 fields or an
/// invalid length, `ParseError::DuplicateName` for repeated names, or
/// `ParseError::InvalidFormat` if no fragments are found.
pub fn read_tsv<R: BufRead>(reader: R) -> Result<FragmentLengths, ParseError> {
    let mut lengths = FragmentLengths::new();
    let mut first_data_line = true;

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.split('\t').collect();

        // Check if first non-empty/non-comment line is a header
        if first_data_line {
            first_data_line = false;
            let first = fields.first().map(|s| s.to_lowercase()).unwrap_or_default();
            if matches!(first.as_str(), "name" | "fragment" | "contig" | "chromosome") {
                continue;
            }
        }

        // Line numbers in errors are 1-based for user friendliness
        let line_num = i + 1;

        if fields.len() < 2 {
            return Err(ParseError::line(line_num, "fewer than 2 fields"));
        }

        let name = fields[0].trim().to_string();
        let length: u64 = fields[1].trim().parse().map_err(|_| {
            ParseError::line(line_num, format!("invalid length '{}'", fields[1]))
        })?;

        insert_length(&mut lengths, name, length)?;
    }

    if lengths.is_empty() {
        return Err(ParseError::InvalidFormat(
            "No fragments found in lengths file".to_string(),
        ));
    }

    Ok(lengths)
}
