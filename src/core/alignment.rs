use serde::Serialize;
use std::cmp::Ordering;
use std::ops::Range;
use thiserror::Error;

use crate::core::types::Strand;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AlignmentError {
    #[error("Empty fragment id")]
    EmptyFragmentId,

    #[error("Empty reference chromosome id for fragment '{0}'")]
    EmptyReferenceId(String),

    #[error("Fragment '{0}' has zero length")]
    ZeroFragmentLength(String),

    #[error("Empty or inverted fragment interval {start}-{end} for fragment '{fragment}'")]
    EmptyFragmentInterval {
        fragment: String,
        start: u64,
        end: u64,
    },

    #[error("Fragment interval end {end} exceeds length {length} of fragment '{fragment}'")]
    FragmentIntervalOutOfBounds {
        fragment: String,
        end: u64,
        length: u64,
    },

    #[error("Empty or inverted reference interval {start}-{end} for fragment '{fragment}'")]
    EmptyReferenceInterval {
        fragment: String,
        start: u64,
        end: u64,
    },

    #[error("Non-finite score for fragment '{0}'")]
    InvalidScore(String),
}

/// One alignment of a fragment to a reference chromosome.
///
/// Both intervals are 0-based half-open. The fields are private so a record
/// can only exist after passing the checks in [`AlignmentRecord::new`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignmentRecord {
    fragment: String,
    fragment_length: u64,
    fragment_start: u64,
    fragment_end: u64,
    reference: String,
    reference_start: u64,
    reference_end: u64,
    strand: Strand,
    score: f64,
}

impl AlignmentRecord {
    pub fn new(
        fragment: impl Into<String>,
        fragment_length: u64,
        fragment_interval: Range<u64>,
        reference: impl Into<String>,
        reference_interval: Range<u64>,
        strand: Strand,
        score: f64,
    ) -> Result<Self, AlignmentError> {
        let fragment = fragment.into();
        let reference = reference.into();

        if fragment.is_empty() {
            return Err(AlignmentError::EmptyFragmentId);
        }
        if reference.is_empty() {
            return Err(AlignmentError::EmptyReferenceId(fragment));
        }
        if fragment_length == 0 {
            return Err(AlignmentError::ZeroFragmentLength(fragment));
        }
        if fragment_interval.start >= fragment_interval.end {
            return Err(AlignmentError::EmptyFragmentInterval {
                fragment,
                start: fragment_interval.start,
                end: fragment_interval.end,
            });
        }
        if fragment_interval.end > fragment_length {
            return Err(AlignmentError::FragmentIntervalOutOfBounds {
                fragment,
                end: fragment_interval.end,
                length: fragment_length,
            });
        }
        if reference_interval.start >= reference_interval.end {
            return Err(AlignmentError::EmptyReferenceInterval {
                fragment,
                start: reference_interval.start,
                end: reference_interval.end,
            });
        }
        if !score.is_finite() {
            return Err(AlignmentError::InvalidScore(fragment));
        }

        Ok(Self {
            fragment,
            fragment_length,
            fragment_start: fragment_interval.start,
            fragment_end: fragment_interval.end,
            reference,
            reference_start: reference_interval.start,
            reference_end: reference_interval.end,
            strand,
            score,
        })
    }

    #[must_use]
    pub fn fragment(&self) -> &str {
        &self.fragment
    }

    #[must_use]
    pub fn fragment_length(&self) -> u64 {
        self.fragment_length
    }

    #[must_use]
    pub fn fragment_interval(&self) -> Range<u64> {
        self.fragment_start..self.fragment_end
    }

    #[must_use]
    pub fn reference(&self) -> &str {
        &self.reference
    }

    #[must_use]
    pub fn reference_start(&self) -> u64 {
        self.reference_start
    }

    #[must_use]
    pub fn reference_end(&self) -> u64 {
        self.reference_end
    }

    #[must_use]
    pub fn reference_interval(&self) -> Range<u64> {
        self.reference_start..self.reference_end
    }

    /// Number of reference bases covered by the alignment
    #[must_use]
    pub fn reference_span(&self) -> u64 {
        self.reference_end - self.reference_start
    }

    #[must_use]
    pub fn strand(&self) -> Strand {
        self.strand
    }

    #[must_use]
    pub fn score(&self) -> f64 {
        self.score
    }

    /// Same alignment against a renamed reference chromosome
    #[must_use]
    pub(crate) fn with_reference(mut self, reference: String) -> Self {
        self.reference = reference;
        self
    }

    /// True if the two reference intervals share at least one base
    #[must_use]
    pub fn overlaps(&self, other: &AlignmentRecord) -> bool {
        self.reference == other.reference
            && self.reference_start < other.reference_end
            && other.reference_start < self.reference_end
    }

    /// Preference order between two alignments of the same fragment.
    ///
    /// `Ordering::Less` means `self` is the better candidate. Precedence:
    /// higher score, longer reference span, smaller reference id, smaller
    /// reference start, smaller reference end, smaller fragment start, and
    /// forward before reverse. The order is total, so selection never
    /// depends on input order.
    #[must_use]
    pub fn preference(&self, other: &AlignmentRecord) -> Ordering {
        other
            .score
            .total_cmp(&self.score)
            .then_with(|| other.reference_span().cmp(&self.reference_span()))
            .then_with(|| self.reference.cmp(&other.reference))
            .then_with(|| self.reference_start.cmp(&other.reference_start))
            .then_with(|| self.reference_end.cmp(&other.reference_end))
            .then_with(|| self.fragment_start.cmp(&other.fragment_start))
            .then_with(|| self.strand.cmp(&other.strand))
    }
}
