use serde::Serialize;
use std::io::Write;

use crate::core::map::{Chromosome, FragmentMap};
use crate::core::types::ChromosomeKind;

/// Per-chromosome statistics of a fragment map
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChromosomeSummary {
    pub name: String,
    #[serde(flatten)]
    pub kind: ChromosomeKind,
    pub fragments: usize,
    /// Assembled length including gaps
    pub length: u64,
    pub fragment_bases: u64,
    pub gap_bases: u64,
}

impl ChromosomeSummary {
    fn from_chromosome(chromosome: &Chromosome, gap_size: u64) -> Self {
        let fragments = chromosome.placements().len();
        let gaps = fragments.saturating_sub(1) as u64;
        Self {
            name: chromosome.name().to_string(),
            kind: chromosome.kind().clone(),
            fragments,
            length: chromosome.length(),
            fragment_bases: chromosome.fragment_bases(),
            gap_bases: gaps * gap_size,
        }
    }
}

/// Read-only statistics over a whole map
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MapSummary {
    pub gap_size: u64,
    pub chromosomes: Vec<ChromosomeSummary>,
    pub total_fragments: usize,
    /// Sum of chromosome lengths, saturating at `u64::MAX`
    pub total_length: u64,
    pub placed_fragments: usize,
    pub unlocalized_fragments: usize,
    pub unplaced_fragments: usize,
}

impl MapSummary {
    #[must_use]
    pub fn from_map(map: &FragmentMap) -> Self {
        let chromosomes: Vec<ChromosomeSummary> = map
            .chromosomes()
            .iter()
            .map(|c| ChromosomeSummary::from_chromosome(c, map.gap_size()))
            .collect();

        let count = |pick: fn(&ChromosomeKind) -> bool| -> usize {
            chromosomes
                .iter()
                .filter(|c| pick(&c.kind))
                .map(|c| c.fragments)
                .sum()
        };

        Self {
            gap_size: map.gap_size(),
            total_fragments: map.fragment_count(),
            total_length: chromosomes
                .iter()
                .fold(0u64, |total, c| total.saturating_add(c.length)),
            placed_fragments: count(ChromosomeKind::is_reference),
            unlocalized_fragments: count(|k| matches!(k, ChromosomeKind::Unlocalized { .. })),
            unplaced_fragments: count(|k| matches!(k, ChromosomeKind::Unplaced)),
            chromosomes,
        }
    }
}

/// Write one BED6 line per placement in assembled coordinates
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_bed<W: Write>(map: &FragmentMap, mut writer: W) -> std::io::Result<()> {
    for chromosome in map.chromosomes() {
        for placement in chromosome.placements() {
            writeln!(
                writer,
                "{}\t{}\t{}\t{}\t0\t{}",
                chromosome.name(),
                placement.offset,
                placement.end(),
                placement.fragment,
                placement.strand
            )?;
        }
    }
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Strand;

    fn sample_map() -> FragmentMap {
        let chr1 = Chromosome::lay_out(
            "chr1",
            ChromosomeKind::Reference,
            vec![
                ("F1".to_string(), Strand::Forward, 100),
                ("F2".to_string(), Strand::Reverse, 50),
                ("F3".to_string(), Strand::Forward, 25),
            ],
            10,
        )
        .unwrap();
        let unplaced = Chromosome::lay_out(
            "chrUn",
            ChromosomeKind::Unplaced,
            vec![("F4".to_string(), Strand::Forward, 7)],
            10,
        )
        .unwrap();
        FragmentMap::new(10, vec![chr1, unplaced]).unwrap()
    }

    #[test]
    fn test_summary_counts() {
        let summary = MapSummary::from_map(&sample_map());

        let chr1 = &summary.chromosomes[0];
        assert_eq!(chr1.fragments, 3);
        assert_eq!(chr1.fragment_bases, 175);
        assert_eq!(chr1.gap_bases, 20);
        assert_eq!(chr1.length, chr1.fragment_bases + chr1.gap_bases);

        assert_eq!(summary.total_fragments, 4);
        assert_eq!(summary.placed_fragments, 3);
        assert_eq!(summary.unplaced_fragments, 1);
        assert_eq!(summary.unlocalized_fragments, 0);
        assert_eq!(summary.total_length, 195 + 7);
    }

    #[test]
    fn test_total_length_saturates() {
        let long = |name: &str, fragment: &str| {
            Chromosome::lay_out(
                name,
                ChromosomeKind::Reference,
                vec![(fragment.to_string(), Strand::Forward, u64::MAX - 1)],
                10,
            )
            .unwrap()
        };
        let map = FragmentMap::new(10, vec![long("chr1", "F1"), long("chr2", "F2")]).unwrap();

        let summary = MapSummary::from_map(&map);
        assert_eq!(summary.chromosomes[1].length, u64::MAX - 1);
        assert_eq!(summary.total_length, u64::MAX);
    }

    #[test]
    fn test_summary_json_has_kind_tag() {
        let summary = MapSummary::from_map(&sample_map());
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["chromosomes"][1]["kind"], "unplaced");
        assert_eq!(json["chromosomes"][0]["gap_bases"], 20);
    }

    #[test]
    fn test_write_bed() {
        let mut out = Vec::new();
        write_bed(&sample_map(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "chr1\t0\t100\tF1\t0\t+");
        assert_eq!(lines[1], "chr1\t110\t160\tF2\t0\t-");
        assert_eq!(lines[3], "chrUn\t0\t7\tF4\t0\t+");
    }
}
