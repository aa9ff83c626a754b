use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Orientation of a fragment or feature relative to the assembled chromosome
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Strand {
    #[serde(rename = "+")]
    Forward,
    #[serde(rename = "-")]
    Reverse,
}

impl Strand {
    /// The opposite orientation
    #[must_use]
    pub fn flip(self) -> Self {
        match self {
            Self::Forward => Self::Reverse,
            Self::Reverse => Self::Forward,
        }
    }

    /// Combine a feature strand with the orientation of the fragment it sits on
    #[must_use]
    pub fn compose(self, orientation: Strand) -> Self {
        match orientation {
            Self::Forward => self,
            Self::Reverse => self.flip(),
        }
    }

    #[must_use]
    pub fn as_char(self) -> char {
        match self {
            Self::Forward => '+',
            Self::Reverse => '-',
        }
    }
}

impl std::fmt::Display for Strand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid strand '{0}': expected '+' or '-'")]
pub struct InvalidStrand(pub String);

impl FromStr for Strand {
    type Err = InvalidStrand;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "+" => Ok(Self::Forward),
            "-" => Ok(Self::Reverse),
            other => Err(InvalidStrand(other.to_string())),
        }
    }
}

/// Kind of an output chromosome in a fragment map
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChromosomeKind {
    /// Built from placements along a reference chromosome of the same name
    Reference,
    /// Fragments known to belong to `parent` whose position could not be resolved
    Unlocalized { parent: String },
    /// Fragments without a usable placement
    Unplaced,
}

impl ChromosomeKind {
    #[must_use]
    pub fn is_reference(&self) -> bool {
        matches!(self, Self::Reference)
    }

    /// Ordering bucket used when laying out chromosomes in a map
    pub(crate) fn layout_rank(&self) -> u8 {
        match self {
            Self::Reference => 0,
            Self::Unlocalized { .. } => 1,
            Self::Unplaced => 2,
        }
    }
}

impl std::fmt::Display for ChromosomeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Reference => write!(f, "reference"),
            Self::Unlocalized { parent } => write!(f, "unlocalized ({parent})"),
            Self::Unplaced => write!(f, "unplaced"),
        }
    }
}
