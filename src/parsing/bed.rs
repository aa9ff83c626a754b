//! BED annotations (3 to 12 columns) in fragment coordinates.
//!
//! `track`, `browser` and `#` lines are kept and written back in place. The
//! strand column of BED6+ is honored. Thick and block coordinates are carried
//! in the payload as absolute fragment intervals so they can be projected
//! together with the feature.

use std::io::{BufRead, Write};
use std::ops::Range;
use std::path::Path;

use crate::core::types::Strand;
use crate::parsing::input::{open_input, write_in_order, AnnotationFile, ParseError};
use crate::transfer::mapper::{Annotation, Payload, Projection, TransferredAnnotation};

/// BED columns beyond chrom, start, end and strand
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BedPayload {
    /// Number of columns in the input line
    pub columns: usize,
    pub name: Option<String>,
    pub score: Option<String>,
    pub thick: Option<Range<u64>>,
    pub item_rgb: Option<String>,
    /// Blocks as absolute intervals, in output order
    pub blocks: Option<Vec<Range<u64>>>,
}

fn project_interval(
    projection: &Projection,
    interval: &Range<u64>,
) -> Result<Range<u64>, Range<u64>> {
    projection
        .interval(interval.start, interval.end)
        .ok_or_else(|| interval.clone())
}

impl Payload for BedPayload {
    fn project(&mut self, projection: &Projection) -> Result<(), Range<u64>> {
        let thick = self
            .thick
            .as_ref()
            .map(|thick| project_interval(projection, thick))
            .transpose()?;

        let blocks = match &self.blocks {
            Some(blocks) => {
                let mut mapped = blocks
                    .iter()
                    .map(|block| project_interval(projection, block))
                    .collect::<Result<Vec<_>, _>>()?;
                if projection.orientation == Strand::Reverse {
                    mapped.reverse();
                }
                Some(mapped)
            }
            None => None,
        };

        self.thick = thick;
        self.blocks = blocks;
        Ok(())
    }
}

/// Parse a BED file (plain or gzipped)
///
/// # Errors
///
/// See [`read_bed`].
pub fn parse_bed_file(path: &Path) -> Result<AnnotationFile<BedPayload>, ParseError> {
    read_bed(open_input(path)?)
}

/// Parse BED records from a stream
///
/// # Errors
///
/// Returns `ParseError::InvalidLine` with the 1-based line number if a line
/// has fewer than 3 columns, malformed numbers, an invalid strand, or block
/// lists that disagree with blockCount or leave the feature interval.
pub fn read_bed<R: BufRead>(reader: R) -> Result<AnnotationFile<BedPayload>, ParseError> {
    let mut file = AnnotationFile::default();

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        if line.starts_with('#') || line.starts_with("track") || line.starts_with("browser") {
            file.push_text(line);
            continue;
        }
        file.push_record(parse_bed_line(line, i + 1)?);
    }

    Ok(file)
}

fn parse_bed_line(line: &str, line_num: usize) -> Result<Annotation<BedPayload>, ParseError> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < 3 {
        return Err(ParseError::line(
            line_num,
            format!("expected at least 3 columns, found {}", fields.len()),
        ));
    }

    let number = |index: usize, name: &str| -> Result<u64, ParseError> {
        fields[index]
            .trim()
            .parse()
            .map_err(|_| ParseError::line(line_num, format!("invalid {name} '{}'", fields[index])))
    };

    let start = number(1, "start")?;
    let end = number(2, "end")?;
    let field = |index: usize| fields.get(index).map(|s| (*s).to_string());

    let strand = match fields.get(5).copied() {
        None | Some(".") => None,
        Some(symbol) => Some(
            symbol
                .parse::<Strand>()
                .map_err(|e| ParseError::line(line_num, e.to_string()))?,
        ),
    };

    let thick = if fields.len() >= 8 {
        Some(number(6, "thickStart")?..number(7, "thickEnd")?)
    } else {
        None
    };

    let blocks = if fields.len() >= 12 {
        Some(parse_blocks(&fields, start..end, line_num)?)
    } else {
        None
    };

    Ok(Annotation {
        fragment: fields[0].to_string(),
        start,
        end,
        strand,
        payload: BedPayload {
            columns: fields.len(),
            name: field(3),
            score: field(4),
            thick,
            item_rgb: field(8),
            blocks,
        },
    })
}

fn parse_blocks(
    fields: &[&str],
    feature: Range<u64>,
    line_num: usize,
) -> Result<Vec<Range<u64>>, ParseError> {
    let count: usize = fields[9]
        .trim()
        .parse()
        .map_err(|_| ParseError::line(line_num, format!("invalid blockCount '{}'", fields[9])))?;

    let list = |index: usize, name: &str| -> Result<Vec<u64>, ParseError> {
        fields[index]
            .trim()
            .trim_end_matches(',')
            .split(',')
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.trim()
                    .parse()
                    .map_err(|_| ParseError::line(line_num, format!("invalid {name} '{s}'")))
            })
            .collect()
    };

    let sizes = list(10, "blockSizes")?;
    let starts = list(11, "blockStarts")?;
    if sizes.len() != count || starts.len() != count {
        return Err(ParseError::line(
            line_num,
            format!(
                "blockCount {count} does not match {} sizes and {} starts",
                sizes.len(),
                starts.len()
            ),
        ));
    }

    starts
        .iter()
        .zip(&sizes)
        .map(|(&offset, &size)| {
            feature
                .start
                .checked_add(offset)
                .and_then(|start| Some(start..start.checked_add(size)?))
                .filter(|block| block.end <= feature.end)
                .ok_or_else(|| {
                    ParseError::line(
                        line_num,
                        format!(
                            "block at {offset} of size {size} lies outside {}-{}",
                            feature.start, feature.end
                        ),
                    )
                })
        })
        .collect()
}

/// Write one transferred BED record with the same number of columns as its input line
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_bed_record<W: Write>(
    writer: &mut W,
    record: &TransferredAnnotation<BedPayload>,
) -> std::io::Result<()> {
    let payload = &record.payload;
    let mut columns = vec![
        record.chromosome.clone(),
        record.start.to_string(),
        record.end.to_string(),
    ];

    if payload.columns > 3 {
        columns.push(payload.name.clone().unwrap_or_default());
    }
    if payload.columns > 4 {
        columns.push(payload.score.clone().unwrap_or_default());
    }
    if payload.columns > 5 {
        columns.push(record.strand.map_or_else(|| ".".to_string(), |s| s.to_string()));
    }
    if let Some(thick) = &payload.thick {
        columns.push(thick.start.to_string());
        columns.push(thick.end.to_string());
    }
    if payload.columns > 8 {
        columns.push(payload.item_rgb.clone().unwrap_or_default());
    }
    if let Some(blocks) = &payload.blocks {
        let sizes: Vec<String> = blocks.iter().map(|b| (b.end - b.start).to_string()).collect();
        let starts: Vec<String> = blocks
            .iter()
            .map(|b| b.start.saturating_sub(record.start).to_string())
            .collect();
        columns.push(blocks.len().to_string());
        columns.push(format!("{},", sizes.join(",")));
        columns.push(format!("{},", starts.join(",")));
    }

    writeln!(writer, "{}", columns.join("\t"))
}

/// Write a transferred BED file, keeping header lines in place
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_bed<W: Write>(
    writer: &mut W,
    file: &AnnotationFile<BedPayload>,
    transferred: &[TransferredAnnotation<BedPayload>],
) -> std::io::Result<()> {
    write_in_order(writer, &file.lines, transferred, |w, record| {
        write_bed_record(w, record)
    })
}
