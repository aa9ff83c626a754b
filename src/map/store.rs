use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

use crate::core::map::{Chromosome, FragmentMap, MapError};
use crate::core::placement::{MapEntry, Placement};
use crate::core::types::{ChromosomeKind, InvalidStrand, Strand};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to read or write fragment map: {0}")]
    Io(#[from] std::io::Error),

    #[error("Line {line}: invalid directive: {message}")]
    InvalidDirective { line: usize, message: String },

    #[error("Line {line}: invalid row: {message}")]
    InvalidRow { line: usize, message: String },

    #[error("Line {line}: invalid gap: {message}")]
    InvalidGap { line: usize, message: String },

    #[error("Missing ##gap_size directive before the first row")]
    MissingGapSize,

    #[error("Directive names chromosome '{0}' which has no rows")]
    UnknownChromosome(String),

    #[error("Invalid fragment map: {0}")]
    Map(#[from] MapError),
}

/// Format version written in the `##version` directive
pub const MAP_FORMAT_VERSION: &str = "1";

/// Fragment name used on gap rows
pub const GAP_FRAGMENT: &str = "GAP";

const COLUMN_HEADER: &str = "#chromosome\trank\tfragment\tstrand\toffset\tlength";

/// Write a map as a tab-separated table, one row per placement and per gap
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_map<W: Write>(map: &FragmentMap, mut writer: W) -> Result<(), StoreError> {
    writeln!(writer, "##version={MAP_FORMAT_VERSION}")?;
    writeln!(writer, "##gap_size={}", map.gap_size())?;
    for chromosome in map.chromosomes() {
        match chromosome.kind() {
            ChromosomeKind::Reference => {}
            ChromosomeKind::Unlocalized { parent } => {
                writeln!(writer, "##unlocalized={}\t{parent}", chromosome.name())?;
            }
            ChromosomeKind::Unplaced => writeln!(writer, "##unplaced={}", chromosome.name())?,
        }
    }
    writeln!(writer, "{COLUMN_HEADER}")?;

    for chromosome in map.chromosomes() {
        for entry in map.entries(chromosome) {
            match entry {
                MapEntry::Fragment(placement) => writeln!(
                    writer,
                    "{}\t{}\t{}\t{}\t{}\t{}",
                    chromosome.name(),
                    placement.rank,
                    placement.fragment,
                    placement.strand,
                    placement.offset,
                    placement.length
                )?,
                MapEntry::Gap(gap) => writeln!(
                    writer,
                    "{}\t{}\t{GAP_FRAGMENT}\t.\t{}\t{}",
                    chromosome.name(),
                    gap.after_rank,
                    gap.offset,
                    gap.length
                )?,
            }
        }
    }

    writer.flush()?;
    Ok(())
}

/// Render a map in the stored table format
///
/// # Errors
///
/// Returns an error if the table cannot be rendered.
pub fn map_to_string(map: &FragmentMap) -> Result<String, StoreError> {
    let mut buffer = Vec::new();
    write_map(map, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| {
        StoreError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    })
}

/// Save a map to a file
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn save_map(map: &FragmentMap, path: &Path) -> Result<(), StoreError> {
    let file = File::create(path)?;
    write_map(map, BufWriter::new(file))
}

/// Load a map from a file
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a valid map.
pub fn load_map(path: &Path) -> Result<FragmentMap, StoreError> {
    let file = File::open(path)?;
    read_map(BufReader::new(file))
}

/// Parse a map from its stored table representation
///
/// # Errors
///
/// Returns an error if the text is not a valid map.
pub fn parse_map(text: &str) -> Result<FragmentMap, StoreError> {
    read_map(text.as_bytes())
}

/// Rows of one chromosome collected while reading
struct PendingChromosome {
    name: String,
    placements: Vec<Placement>,
    /// Whether the last row read for this chromosome was a gap
    open_gap: bool,
    last_line: usize,
}

/// Read a stored map.
///
/// Gap rows are optional, but when present they must sit between two
/// placements and agree with the preceding placement and the gap size. The
/// resulting placements go through [`FragmentMap::new`], so every map
/// invariant is checked again.
///
/// # Errors
///
/// Returns an error on I/O failure, malformed lines or an invalid map.
pub fn read_map<R: BufRead>(reader: R) -> Result<FragmentMap, StoreError> {
    let mut gap_size: Option<u64> = None;
    let mut kinds: HashMap<String, ChromosomeKind> = HashMap::new();
    let mut finished: Vec<PendingChromosome> = Vec::new();
    let mut current: Option<PendingChromosome> = None;

    for (line_num, line) in reader.lines().enumerate() {
        let line = line?;
        let line_num = line_num + 1;
        let line = line.trim_end_matches('\r');

        if line.trim().is_empty() {
            continue;
        }

        if let Some(directive) = line.strip_prefix("##") {
            parse_directive(directive, line_num, &mut gap_size, &mut kinds)?;
            continue;
        }

        if line.starts_with('#') {
            continue;
        }

        let gap_size = gap_size.ok_or(StoreError::MissingGapSize)?;
        let row = parse_row(line, line_num)?;

        if current.as_ref().is_some_and(|c| c.name != row.chromosome) {
            if let Some(done) = current.take() {
                close(&done)?;
                finished.push(done);
            }
        }
        let pending = current.get_or_insert_with(|| PendingChromosome {
            name: row.chromosome.to_string(),
            placements: Vec::new(),
            open_gap: false,
            last_line: line_num,
        });
        pending.last_line = line_num;

        if row.fragment == GAP_FRAGMENT && row.strand == "." {
            check_gap(pending, &row, gap_size, line_num)?;
            pending.open_gap = true;
            continue;
        }

        let strand: Strand = row.strand.parse().map_err(|e: InvalidStrand| {
            StoreError::InvalidRow {
                line: line_num,
                message: e.to_string(),
            }
        })?;

        pending.placements.push(Placement {
            fragment: row.fragment.to_string(),
            strand,
            rank: row.rank,
            offset: row.offset,
            length: row.length,
        });
        pending.open_gap = false;
    }

    if let Some(done) = current.take() {
        close(&done)?;
        finished.push(done);
    }

    let gap_size = gap_size.ok_or(StoreError::MissingGapSize)?;

    let chromosomes: Vec<Chromosome> = finished
        .into_iter()
        .map(|pending| {
            let kind = kinds
                .remove(&pending.name)
                .unwrap_or(ChromosomeKind::Reference);
            Chromosome::new(pending.name, kind, pending.placements)
        })
        .collect();

    if let Some(name) = kinds.into_keys().min() {
        return Err(StoreError::UnknownChromosome(name));
    }

    let map = FragmentMap::new(gap_size, chromosomes)?;
    debug!(
        chromosomes = map.chromosomes().len(),
        fragments = map.fragment_count(),
        "Loaded fragment map"
    );
    Ok(map)
}

fn parse_directive(
    directive: &str,
    line: usize,
    gap_size: &mut Option<u64>,
    kinds: &mut HashMap<String, ChromosomeKind>,
) -> Result<(), StoreError> {
    let invalid = |message: String| StoreError::InvalidDirective { line, message };

    let Some((key, value)) = directive.split_once('=') else {
        // Unknown free-form directive
        return Ok(());
    };

    match key {
        "version" => {
            if value != MAP_FORMAT_VERSION {
                warn!(
                    "Fragment map version mismatch (expected {}, found {})",
                    MAP_FORMAT_VERSION, value
                );
            }
        }
        "gap_size" => {
            let size: u64 = value
                .trim()
                .parse()
                .map_err(|_| invalid(format!("gap size '{value}' is not a number")))?;
            if gap_size.replace(size).is_some() {
                return Err(invalid("gap size given twice".to_string()));
            }
        }
        "unplaced" => {
            if value.is_empty() {
                return Err(invalid("empty unplaced chromosome name".to_string()));
            }
            if kinds
                .insert(value.to_string(), ChromosomeKind::Unplaced)
                .is_some()
            {
                return Err(invalid(format!("chromosome '{value}' declared twice")));
            }
        }
        "unlocalized" => {
            let (name, parent) = value
                .split_once('\t')
                .filter(|(name, parent)| !name.is_empty() && !parent.is_empty())
                .ok_or_else(|| invalid("expected NAME<TAB>PARENT".to_string()))?;
            let kind = ChromosomeKind::Unlocalized {
                parent: parent.to_string(),
            };
            if kinds.insert(name.to_string(), kind).is_some() {
                return Err(invalid(format!("chromosome '{name}' declared twice")));
            }
        }
        _ => {}
    }

    Ok(())
}

struct Row<'a> {
    chromosome: &'a str,
    rank: usize,
    fragment: &'a str,
    strand: &'a str,
    offset: u64,
    length: u64,
}

fn parse_row(line: &str, line_num: usize) -> Result<Row<'_>, StoreError> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() != 6 {
        return Err(StoreError::InvalidRow {
            line: line_num,
            message: format!("expected 6 columns, found {}", fields.len()),
        });
    }

    let number = |index: usize, column: &str| {
        fields[index]
            .parse::<u64>()
            .map_err(|_| StoreError::InvalidRow {
                line: line_num,
                message: format!("{column} '{}' is not a non-negative integer", fields[index]),
            })
    };

    let rank = fields[1]
        .parse::<usize>()
        .map_err(|_| StoreError::InvalidRow {
            line: line_num,
            message: format!("rank '{}' is not a non-negative integer", fields[1]),
        })?;

    Ok(Row {
        chromosome: fields[0],
        rank,
        fragment: fields[2],
        strand: fields[3],
        offset: number(4, "offset")?,
        length: number(5, "length")?,
    })
}

fn check_gap(
    pending: &PendingChromosome,
    row: &Row<'_>,
    gap_size: u64,
    line: usize,
) -> Result<(), StoreError> {
    let invalid = |message: String| StoreError::InvalidGap { line, message };

    let previous = match pending.placements.last() {
        Some(previous) if !pending.open_gap => previous,
        _ => return Err(invalid("gap must follow a placement".to_string())),
    };
    if row.length != gap_size {
        return Err(invalid(format!(
            "length {} differs from gap size {gap_size}",
            row.length
        )));
    }
    if row.rank != previous.rank {
        return Err(invalid(format!(
            "rank {} does not match preceding placement rank {}",
            row.rank, previous.rank
        )));
    }
    if Some(row.offset) != previous.offset.checked_add(previous.length) {
        return Err(invalid(format!(
            "offset {} does not follow fragment '{}'",
            row.offset, previous.fragment
        )));
    }
    Ok(())
}

fn close(pending: &PendingChromosome) -> Result<(), StoreError> {
    if pending.open_gap {
        return Err(StoreError::InvalidGap {
            line: pending.last_line,
            message: format!("chromosome '{}' ends with a gap", pending.name),
        });
    }
    Ok(())
}
