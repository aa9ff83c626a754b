//! Error type, file opening, format detection and annotation file layout
//! shared by the readers.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use flate2::read::MultiGzDecoder;
use thiserror::Error;

use crate::core::alignment::AlignmentError;
use crate::transfer::mapper::{Annotation, TransferredAnnotation};

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Line {line}: {message}")]
    InvalidLine { line: usize, message: String },

    #[error("Line {line}: {source}")]
    InvalidAlignment {
        line: usize,
        #[source]
        source: AlignmentError,
    },

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("noodles error: {0}")]
    Noodles(String),

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Sequence '{0}' appears more than once")]
    DuplicateName(String),
}

impl ParseError {
    pub(crate) fn line(line: usize, message: impl Into<String>) -> Self {
        Self::InvalidLine {
            line,
            message: message.into(),
        }
    }
}

/// Fragment name to length
pub type FragmentLengths = HashMap<String, u64>;

/// One line of an annotation file, in input order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileLine {
    /// Header, comment or directive line kept verbatim
    Text(String),
    /// Position of an entry in `AnnotationFile::annotations`
    Record(usize),
}

/// Annotations read from a file, with the non-record lines around them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationFile<P> {
    pub lines: Vec<FileLine>,
    pub annotations: Vec<Annotation<P>>,
}

impl<P> Default for AnnotationFile<P> {
    fn default() -> Self {
        Self {
            lines: Vec::new(),
            annotations: Vec::new(),
        }
    }
}

impl<P> AnnotationFile<P> {
    pub(crate) fn push_text(&mut self, line: impl Into<String>) {
        self.lines.push(FileLine::Text(line.into()));
    }

    pub(crate) fn push_record(&mut self, annotation: Annotation<P>) {
        self.lines.push(FileLine::Record(self.annotations.len()));
        self.annotations.push(annotation);
    }
}

/// Write text lines and transferred records in input order.
///
/// Records that were skipped or failed leave no line behind.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_in_order<W, P, F>(
    writer: &mut W,
    lines: &[FileLine],
    transferred: &[TransferredAnnotation<P>],
    mut write_record: F,
) -> std::io::Result<()>
where
    W: Write,
    F: FnMut(&mut W, &TransferredAnnotation<P>) -> std::io::Result<()>,
{
    let by_index: HashMap<usize, &TransferredAnnotation<P>> =
        transferred.iter().map(|t| (t.index, t)).collect();

    for line in lines {
        match line {
            FileLine::Text(text) => writeln!(writer, "{text}")?,
            FileLine::Record(index) => {
                if let Some(record) = by_index.get(index) {
                    write_record(&mut *writer, record)?;
                }
            }
        }
    }
    writer.flush()
}

/// Check if the path is a gzipped file
#[allow(clippy::case_sensitive_file_extension_comparisons)] // Already lowercased
#[must_use]
pub fn is_gzipped(path: &Path) -> bool {
    let path_str = path.to_string_lossy().to_lowercase();
    path_str.ends_with(".gz") || path_str.ends_with(".bgz")
}

/// Lowercased file extension, looking through a trailing `.gz`/`.bgz`
pub fn file_extension(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?.to_lowercase();
    let name = name
        .strip_suffix(".gz")
        .or_else(|| name.strip_suffix(".bgz"))
        .unwrap_or(&name);
    let (_, ext) = name.rsplit_once('.')?;
    Some(ext.to_string())
}

/// Open a text input, decompressing gzip/bgzip files by extension
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be opened.
pub fn open_input(path: &Path) -> Result<Box<dyn BufRead>, ParseError> {
    let file = File::open(path)?;
    if is_gzipped(path) {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Source formats accepted for fragment lengths
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthsFormat {
    Fasta,
    Fai,
    Tsv,
}

impl LengthsFormat {
    /// Detect format from file extension
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        if crate::parsing::fasta::is_fasta_file(path) {
            return Some(Self::Fasta);
        }

        match file_extension(path)?.as_str() {
            "fai" => Some(Self::Fai),
            "tsv" | "txt" | "lengths" => Some(Self::Tsv),
            _ => None,
        }
    }
}

/// Read fragment lengths from a FASTA, `.fai` or two-column TSV file
///
/// # Errors
///
/// Returns `ParseError::UnsupportedFormat` if the format cannot be detected,
/// or the error of the underlying reader.
pub fn parse_lengths_file(path: &Path) -> Result<FragmentLengths, ParseError> {
    match LengthsFormat::from_path(path) {
        Some(LengthsFormat::Fasta) => crate::parsing::fasta::parse_lengths_file(path),
        Some(LengthsFormat::Fai) => crate::parsing::fai::parse_fai_file(path),
        Some(LengthsFormat::Tsv) => crate::parsing::tsv::parse_tsv_file(path),
        None => Err(ParseError::UnsupportedFormat(path.display().to_string())),
    }
}

/// Insert a name/length pair, rejecting duplicates
pub(crate) fn insert_length(
    lengths: &mut FragmentLengths,
    name: String,
    length: u64,
) -> Result<(), ParseError> {
    if lengths.contains_key(&name) {
        return Err(ParseError::DuplicateName(name));
    }
    lengths.insert(name, length);
    Ok(())
}
