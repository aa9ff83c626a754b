use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;

use crate::core::placement::{Gap, MapEntry, Placement};
use crate::core::types::{ChromosomeKind, Strand};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MapError {
    #[error("Gap size must be at least 1")]
    InvalidGapSize,

    #[error("Empty chromosome name")]
    EmptyChromosomeName,

    #[error("Chromosome '{0}' appears more than once")]
    DuplicateChromosome(String),

    #[error("Chromosome '{name}' ({kind}) must come before '{previous}'")]
    MisorderedChromosome {
        name: String,
        kind: String,
        previous: String,
    },

    #[error("Chromosome '{0}' has no placements")]
    EmptyChromosome(String),

    #[error("Empty fragment name on chromosome '{0}'")]
    EmptyFragmentName(String),

    #[error("Chromosome name '{0}' starts with '#' or contains a tab or line break")]
    InvalidChromosomeName(String),

    #[error("Fragment name '{fragment}' on '{chromosome}' contains a tab or line break")]
    InvalidFragmentName { chromosome: String, fragment: String },

    #[error("Fragment '{fragment}' on '{chromosome}' has zero length")]
    ZeroLength { chromosome: String, fragment: String },

    #[error("Duplicate rank {rank} on chromosome '{chromosome}'")]
    DuplicateRank { chromosome: String, rank: usize },

    #[error("Fragment '{fragment}' on '{chromosome}' has rank {found}, expected {expected}")]
    UnexpectedRank {
        chromosome: String,
        fragment: String,
        expected: usize,
        found: usize,
    },

    #[error("Fragment '{fragment}' on '{chromosome}' has offset {found}, expected {expected}")]
    NonContiguousOffset {
        chromosome: String,
        fragment: String,
        expected: u64,
        found: u64,
    },

    #[error("Offset overflow while placing fragment '{fragment}' on '{chromosome}'")]
    OffsetOverflow { chromosome: String, fragment: String },

    #[error("Fragment '{fragment}' placed on both '{first}' and '{second}'")]
    DuplicatePlacement {
        fragment: String,
        first: String,
        second: String,
    },
}

/// True if `name` survives a round trip through the stored map table
#[must_use]
pub fn is_valid_chromosome_name(name: &str) -> bool {
    !name.starts_with('#') && is_valid_fragment_name(name)
}

/// True if `name` contains no column or line separator
#[must_use]
pub fn is_valid_fragment_name(name: &str) -> bool {
    !name.contains(['\t', '\n', '\r'])
}

/// One output chromosome: an ordered run of placements
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chromosome {
    name: String,
    kind: ChromosomeKind,
    placements: Vec<Placement>,
}

impl Chromosome {
    /// Wrap already positioned placements. Checked when the map is assembled.
    pub fn new(name: impl Into<String>, kind: ChromosomeKind, placements: Vec<Placement>) -> Self {
        Self {
            name: name.into(),
            kind,
            placements,
        }
    }

    /// Assign ranks and offsets to `(fragment, strand, length)` triples in order.
    ///
    /// The first fragment starts at offset 0 and every following one starts
    /// `gap_size` bases after the end of its predecessor.
    pub fn lay_out<I>(
        name: impl Into<String>,
        kind: ChromosomeKind,
        fragments: I,
        gap_size: u64,
    ) -> Result<Self, MapError>
    where
        I: IntoIterator<Item = (String, Strand, u64)>,
    {
        let name = name.into();
        let mut placements: Vec<Placement> = Vec::new();
        let mut previous_end: Option<u64> = None;

        for (rank, (fragment, strand, length)) in fragments.into_iter().enumerate() {
            let overflow = || MapError::OffsetOverflow {
                chromosome: name.clone(),
                fragment: fragment.clone(),
            };
            let offset = match previous_end {
                None => 0,
                Some(end) => end.checked_add(gap_size).ok_or_else(overflow)?,
            };
            previous_end = Some(offset.checked_add(length).ok_or_else(overflow)?);

            placements.push(Placement {
                fragment,
                strand,
                rank,
                offset,
                length,
            });
        }

        Ok(Self::new(name, kind, placements))
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn kind(&self) -> &ChromosomeKind {
        &self.kind
    }

    #[must_use]
    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    /// Assembled length: end of the last placement, no trailing gap
    #[must_use]
    pub fn length(&self) -> u64 {
        self.placements.last().map_or(0, Placement::end)
    }

    /// Bases contributed by fragments (excluding gaps)
    #[must_use]
    pub fn fragment_bases(&self) -> u64 {
        self.placements.iter().map(|p| p.length).sum()
    }

    /// Fragments and the gaps between them, in assembly order
    pub fn entries(&self, gap_size: u64) -> impl Iterator<Item = MapEntry<'_>> + '_ {
        let last = self.placements.len().saturating_sub(1);
        self.placements.iter().flat_map(move |placement| {
            let gap = (placement.rank < last).then(|| {
                MapEntry::Gap(Gap {
                    after_rank: placement.rank,
                    offset: placement.end(),
                    length: gap_size,
                })
            });
            std::iter::once(MapEntry::Fragment(placement)).chain(gap)
        })
    }

    fn validate(&self, gap_size: u64) -> Result<(), MapError> {
        if self.name.is_empty() {
            return Err(MapError::EmptyChromosomeName);
        }
        if !is_valid_chromosome_name(&self.name) {
            return Err(MapError::InvalidChromosomeName(self.name.clone()));
        }
        if self.placements.is_empty() {
            return Err(MapError::EmptyChromosome(self.name.clone()));
        }

        // None once the next offset would not fit in u64
        let mut expected_offset = Some(0u64);
        for (expected_rank, placement) in self.placements.iter().enumerate() {
            let overflow = || MapError::OffsetOverflow {
                chromosome: self.name.clone(),
                fragment: placement.fragment.clone(),
            };
            if placement.fragment.is_empty() {
                return Err(MapError::EmptyFragmentName(self.name.clone()));
            }
            if !is_valid_fragment_name(&placement.fragment) {
                return Err(MapError::InvalidFragmentName {
                    chromosome: self.name.clone(),
                    fragment: placement.fragment.clone(),
                });
            }
            if placement.length == 0 {
                return Err(MapError::ZeroLength {
                    chromosome: self.name.clone(),
                    fragment: placement.fragment.clone(),
                });
            }
            if placement.rank != expected_rank {
                if expected_rank > 0 && placement.rank == expected_rank - 1 {
                    return Err(MapError::DuplicateRank {
                        chromosome: self.name.clone(),
                        rank: placement.rank,
                    });
                }
                return Err(MapError::UnexpectedRank {
                    chromosome: self.name.clone(),
                    fragment: placement.fragment.clone(),
                    expected: expected_rank,
                    found: placement.rank,
                });
            }
            let expected = expected_offset.ok_or_else(overflow)?;
            if placement.offset != expected {
                return Err(MapError::NonContiguousOffset {
                    chromosome: self.name.clone(),
                    fragment: placement.fragment.clone(),
                    expected,
                    found: placement.offset,
                });
            }
            let end = placement.offset.checked_add(placement.length).ok_or_else(overflow)?;
            expected_offset = end.checked_add(gap_size);
        }

        Ok(())
    }
}

/// Where a fragment ended up in the map
#[derive(Debug, Clone, Copy)]
pub struct Located<'a> {
    pub chromosome: &'a Chromosome,
    pub placement: &'a Placement,
}

/// The fragment map: ordered output chromosomes with positioned fragments.
///
/// A map can only be obtained through [`FragmentMap::new`], which checks
/// rank order, offset contiguity and that no fragment is placed twice. There
/// is no mutable access afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct FragmentMap {
    gap_size: u64,
    chromosomes: Vec<Chromosome>,

    /// Index: chromosome name -> position in `chromosomes`
    #[serde(skip)]
    chromosome_index: HashMap<String, usize>,

    /// Index: fragment -> (chromosome position, placement position)
    #[serde(skip)]
    fragment_index: HashMap<String, (usize, usize)>,
}

impl PartialEq for FragmentMap {
    fn eq(&self, other: &Self) -> bool {
        self.gap_size == other.gap_size && self.chromosomes == other.chromosomes
    }
}

impl Eq for FragmentMap {}

impl FragmentMap {
    pub fn new(gap_size: u64, chromosomes: Vec<Chromosome>) -> Result<Self, MapError> {
        if gap_size == 0 {
            return Err(MapError::InvalidGapSize);
        }

        let mut chromosome_index = HashMap::with_capacity(chromosomes.len());
        let mut fragment_index: HashMap<String, (usize, usize)> = HashMap::new();

        for (c, chromosome) in chromosomes.iter().enumerate() {
            chromosome.validate(gap_size)?;

            if let Some(previous) = c.checked_sub(1).map(|p| &chromosomes[p]) {
                if previous.kind.layout_rank() > chromosome.kind.layout_rank() {
                    return Err(MapError::MisorderedChromosome {
                        name: chromosome.name.clone(),
                        kind: chromosome.kind.to_string(),
                        previous: previous.name.clone(),
                    });
                }
            }

            if chromosome_index.insert(chromosome.name.clone(), c).is_some() {
                return Err(MapError::DuplicateChromosome(chromosome.name.clone()));
            }

            for (p, placement) in chromosome.placements.iter().enumerate() {
                if let Some(&(first, _)) = fragment_index.get(&placement.fragment) {
                    return Err(MapError::DuplicatePlacement {
                        fragment: placement.fragment.clone(),
                        first: chromosomes[first].name.clone(),
                        second: chromosome.name.clone(),
                    });
                }
                fragment_index.insert(placement.fragment.clone(), (c, p));
            }
        }

        Ok(Self {
            gap_size,
            chromosomes,
            chromosome_index,
            fragment_index,
        })
    }

    #[must_use]
    pub fn gap_size(&self) -> u64 {
        self.gap_size
    }

    #[must_use]
    pub fn chromosomes(&self) -> &[Chromosome] {
        &self.chromosomes
    }

    #[must_use]
    pub fn chromosome(&self, name: &str) -> Option<&Chromosome> {
        self.chromosome_index
            .get(name)
            .map(|&idx| &self.chromosomes[idx])
    }

    /// Find the chromosome and placement of a fragment
    #[must_use]
    pub fn locate(&self, fragment: &str) -> Option<Located<'_>> {
        self.fragment_index.get(fragment).map(|&(c, p)| {
            let chromosome = &self.chromosomes[c];
            Located {
                chromosome,
                placement: &chromosome.placements[p],
            }
        })
    }

    /// Number of placed fragments across all chromosomes
    #[must_use]
    pub fn fragment_count(&self) -> usize {
        self.fragment_index.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chromosomes.is_empty()
    }

    /// Layout of one chromosome including derived gaps
    pub fn entries<'a>(&self, chromosome: &'a Chromosome) -> impl Iterator<Item = MapEntry<'a>> + 'a {
        chromosome.entries(self.gap_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frags(items: &[(&str, Strand, u64)]) -> Vec<(String, Strand, u64)> {
        items
            .iter()
            .map(|(name, strand, len)| ((*name).to_string(), *strand, *len))
            .collect()
    }

    #[test]
    fn test_lay_out_offsets_are_contiguous() {
        let chrom = Chromosome::lay_out(
            "chr1",
            ChromosomeKind::Reference,
            frags(&[("f1", Strand::Forward, 100), ("f2", Strand::Reverse, 50)]),
            10,
        )
        .unwrap();

        let placements = chrom.placements();
        assert_eq!(placements[0].offset, 0);
        assert_eq!(placements[1].offset, 110);
        assert_eq!(placements[1].rank, 1);
        assert_eq!(chrom.length(), 160);
        assert_eq!(chrom.fragment_bases(), 150);
    }

    #[test]
    fn test_lay_out_detects_overflow() {
        let result = Chromosome::lay_out(
            "chr1",
            ChromosomeKind::Reference,
            frags(&[("f1", Strand::Forward, u64::MAX), ("f2", Strand::Forward, 1)]),
            10,
        );
        assert!(matches!(result, Err(MapError::OffsetOverflow { .. })));
    }

    #[test]
    fn test_entries_interleave_gaps() {
        let chrom = Chromosome::lay_out(
            "chr1",
            ChromosomeKind::Reference,
            frags(&[
                ("f1", Strand::Forward, 100),
                ("f2", Strand::Reverse, 50),
                ("f3", Strand::Forward, 20),
            ]),
            10,
        )
        .unwrap();

        let entries: Vec<_> = chrom.entries(10).collect();
        assert_eq!(entries.len(), 5);
        assert!(entries[1].is_gap());
        assert_eq!(entries[1].offset(), 100);
        assert_eq!(entries[1].length(), 10);
        assert_eq!(entries[3].offset(), 160);
        assert_eq!(entries[3].rank(), 1);
        assert!(!entries[4].is_gap());
    }

    #[test]
    fn test_new_rejects_duplicate_fragment() {
        let chr1 = Chromosome::lay_out(
            "chr1",
            ChromosomeKind::Reference,
            frags(&[("f1", Strand::Forward, 100)]),
            10,
        )
        .unwrap();
        let chr2 = Chromosome::lay_out(
            "chr2",
            ChromosomeKind::Reference,
            frags(&[("f1", Strand::Forward, 100)]),
            10,
        )
        .unwrap();

        let result = FragmentMap::new(10, vec![chr1, chr2]);
        assert_eq!(
            result.unwrap_err(),
            MapError::DuplicatePlacement {
                fragment: "f1".to_string(),
                first: "chr1".to_string(),
                second: "chr2".to_string(),
            }
        );
    }

    #[test]
    fn test_new_rejects_gap_size_mismatch() {
        let chrom = Chromosome::lay_out(
            "chr1",
            ChromosomeKind::Reference,
            frags(&[("f1", Strand::Forward, 100), ("f2", Strand::Forward, 10)]),
            5,
        )
        .unwrap();

        let result = FragmentMap::new(10, vec![chrom]);
        assert!(matches!(
            result,
            Err(MapError::NonContiguousOffset {
                expected: 110,
                found: 105,
                ..
            })
        ));
    }

    #[test]
    fn test_new_rejects_duplicate_rank() {
        let placements = vec![
            Placement {
                fragment: "f1".to_string(),
                strand: Strand::Forward,
                rank: 0,
                offset: 0,
                length: 10,
            },
            Placement {
                fragment: "f2".to_string(),
                strand: Strand::Forward,
                rank: 0,
                offset: 11,
                length: 10,
            },
        ];
        let chrom = Chromosome::new("chr1", ChromosomeKind::Reference, placements);
        assert_eq!(
            FragmentMap::new(1, vec![chrom]).unwrap_err(),
            MapError::DuplicateRank {
                chromosome: "chr1".to_string(),
                rank: 0,
            }
        );
    }

    #[test]
    fn test_new_rejects_zero_gap_and_duplicate_chromosome() {
        assert_eq!(
            FragmentMap::new(0, Vec::new()).unwrap_err(),
            MapError::InvalidGapSize
        );

        let make = || {
            Chromosome::lay_out(
                "chr1",
                ChromosomeKind::Reference,
                frags(&[("f1", Strand::Forward, 10)]),
                1,
            )
            .unwrap()
        };
        let mut second = make();
        second.placements[0].fragment = "f2".to_string();
        assert_eq!(
            FragmentMap::new(1, vec![make(), second]).unwrap_err(),
            MapError::DuplicateChromosome("chr1".to_string())
        );
    }

    #[test]
    fn test_new_rejects_unplaced_before_reference() {
        let unplaced = Chromosome::lay_out(
            "chrUn",
            ChromosomeKind::Unplaced,
            frags(&[("f1", Strand::Forward, 10)]),
            1,
        )
        .unwrap();
        let chr1 = Chromosome::lay_out(
            "chr1",
            ChromosomeKind::Reference,
            frags(&[("f2", Strand::Forward, 10)]),
            1,
        )
        .unwrap();
        assert!(matches!(
            FragmentMap::new(1, vec![unplaced, chr1]),
            Err(MapError::MisorderedChromosome { .. })
        ));
    }

    #[test]
    fn test_new_rejects_names_the_table_cannot_hold() {
        let comment_like = Chromosome::lay_out(
            "#chr1",
            ChromosomeKind::Reference,
            frags(&[("f1", Strand::Forward, 10)]),
            5,
        )
        .unwrap();
        assert_eq!(
            FragmentMap::new(5, vec![comment_like]).unwrap_err(),
            MapError::InvalidChromosomeName("#chr1".to_string())
        );

        let tabbed = Chromosome::lay_out(
            "chr1",
            ChromosomeKind::Reference,
            frags(&[("f\t1", Strand::Forward, 10)]),
            5,
        )
        .unwrap();
        assert!(matches!(
            FragmentMap::new(5, vec![tabbed]),
            Err(MapError::InvalidFragmentName { .. })
        ));

        // '#' only matters at the start of a chromosome name
        let fine = Chromosome::lay_out(
            "chr#1",
            ChromosomeKind::Reference,
            frags(&[("#f1", Strand::Forward, 10)]),
            5,
        )
        .unwrap();
        assert!(FragmentMap::new(5, vec![fine]).is_ok());
    }

    #[test]
    fn test_locate_fragment() {
        let chrom = Chromosome::lay_out(
            "chr1",
            ChromosomeKind::Reference,
            frags(&[("f1", Strand::Forward, 100), ("f2", Strand::Reverse, 50)]),
            10,
        )
        .unwrap();
        let map = FragmentMap::new(10, vec![chrom]).unwrap();

        let located = map.locate("f2").unwrap();
        assert_eq!(located.chromosome.name(), "chr1");
        assert_eq!(located.placement.offset, 110);
        assert!(map.locate("f3").is_none());
        assert_eq!(map.fragment_count(), 2);
        assert!(map.chromosome("chr1").is_some());
    }
}
