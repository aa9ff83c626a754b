use serde::{Deserialize, Serialize};

use crate::core::types::Strand;

/// A fragment's resolved position within an assembled chromosome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    /// Fragment (contig/scaffold) name
    pub fragment: String,

    /// Orientation in which the fragment is emitted
    pub strand: Strand,

    /// Position in the chromosome's fragment order, starting at 0
    pub rank: usize,

    /// 0-based offset of the first fragment base in the assembled sequence
    pub offset: u64,

    /// Fragment length in bases
    pub length: u64,
}

impl Placement {
    /// End of the fragment in assembled coordinates (exclusive)
    #[must_use]
    pub fn end(&self) -> u64 {
        self.offset + self.length
    }
}

/// Filler span between two consecutive placements.
///
/// Gaps are never stored; they are derived from offsets, lengths and the map's
/// gap size whenever entries are iterated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Gap {
    /// Rank of the placement the gap follows
    pub after_rank: usize,
    pub offset: u64,
    pub length: u64,
}

/// One row of a chromosome layout: either a placed fragment or a gap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapEntry<'a> {
    Fragment(&'a Placement),
    Gap(Gap),
}

impl MapEntry<'_> {
    #[must_use]
    pub fn offset(&self) -> u64 {
        match self {
            Self::Fragment(placement) => placement.offset,
            Self::Gap(gap) => gap.offset,
        }
    }

    #[must_use]
    pub fn length(&self) -> u64 {
        match self {
            Self::Fragment(placement) => placement.length,
            Self::Gap(gap) => gap.length,
        }
    }

    /// Rank of the placement this entry is, or follows
    #[must_use]
    pub fn rank(&self) -> usize {
        match self {
            Self::Fragment(placement) => placement.rank,
            Self::Gap(gap) => gap.after_rank,
        }
    }

    #[must_use]
    pub fn is_gap(&self) -> bool {
        matches!(self, Self::Gap(_))
    }
}
