use serde::{Deserialize, Serialize};
use std::ops::Range;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::core::map::FragmentMap;
use crate::core::types::Strand;

#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TransferError {
    #[error(
        "Annotation {index}: interval {start}-{end} is invalid for fragment '{fragment}' of length {length}"
    )]
    Range {
        index: usize,
        fragment: String,
        start: u64,
        end: u64,
        length: u64,
    },
}

/// How one fragment's local coordinates map onto its assembled chromosome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Projection {
    pub offset: u64,
    pub length: u64,
    pub orientation: Strand,
}

impl Projection {
    /// Map a half-open fragment interval to assembled coordinates.
    ///
    /// Returns `None` if the interval is inverted or extends past the
    /// fragment end.
    #[must_use]
    pub fn interval(&self, start: u64, end: u64) -> Option<Range<u64>> {
        if start > end || end > self.length {
            return None;
        }
        Some(match self.orientation {
            Strand::Forward => self.offset + start..self.offset + end,
            Strand::Reverse => {
                self.offset + (self.length - end)..self.offset + (self.length - start)
            }
        })
    }

    /// Feature strand after projection
    #[must_use]
    pub fn strand(&self, strand: Strand) -> Strand {
        strand.compose(self.orientation)
    }
}

/// Extra data carried by an annotation.
///
/// Payloads holding their own fragment coordinates (BED thick start and end,
/// for instance) re-express them through `project`; plain payloads keep the
/// default no-op. An interval that does not fit the fragment is returned as
/// the error and the whole annotation fails.
pub trait Payload {
    fn project(&mut self, _projection: &Projection) -> Result<(), Range<u64>> {
        Ok(())
    }
}

impl Payload for () {}
impl Payload for String {}

/// An interval annotation in fragment coordinates (0-based half-open)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation<P> {
    pub fragment: String,
    pub start: u64,
    pub end: u64,
    pub strand: Option<Strand>,
    pub payload: P,
}

/// An annotation re-expressed in assembled chromosome coordinates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferredAnnotation<P> {
    /// Position of the annotation in the input
    pub index: usize,
    pub chromosome: String,
    pub start: u64,
    pub end: u64,
    /// Feature strand, flipped when the fragment is reversed
    pub strand: Option<Strand>,
    /// Orientation of the fragment the annotation sits on
    pub orientation: Strand,
    pub payload: P,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// Fragment does not appear in the map
    NotInMap,
    /// Fragment sits on an unplaced or unlocalized pseudo-chromosome
    PseudoChromosome { chromosome: String },
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotInMap => write!(f, "fragment not in map"),
            Self::PseudoChromosome { chromosome } => {
                write!(f, "fragment on pseudo-chromosome {chromosome}")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedAnnotation {
    pub index: usize,
    pub fragment: String,
    #[serde(flatten)]
    pub reason: SkipReason,
}

/// Result of transferring a batch of annotations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferOutcome<P> {
    pub transferred: Vec<TransferredAnnotation<P>>,
    pub skipped: Vec<SkippedAnnotation>,
    pub errors: Vec<TransferError>,
}

impl<P> Default for TransferOutcome<P> {
    fn default() -> Self {
        Self {
            transferred: Vec::new(),
            skipped: Vec::new(),
            errors: Vec::new(),
        }
    }
}

impl<P> TransferOutcome<P> {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty() && self.errors.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferOptions {
    /// Transfer annotations on unplaced and unlocalized pseudo-chromosomes
    pub include_pseudo: bool,
}

impl Default for TransferOptions {
    fn default() -> Self {
        Self {
            include_pseudo: true,
        }
    }
}

/// Outcome for a single annotation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mapped<P> {
    Transferred(TransferredAnnotation<P>),
    Skipped(SkippedAnnotation),
    Failed(TransferError),
}

/// Transfers annotations from fragment to assembled coordinates
#[derive(Debug, Clone, Copy)]
pub struct CoordinateMapper<'a> {
    map: &'a FragmentMap,
    options: TransferOptions,
}

impl<'a> CoordinateMapper<'a> {
    #[must_use]
    pub fn new(map: &'a FragmentMap) -> Self {
        Self {
            map,
            options: TransferOptions::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: TransferOptions) -> Self {
        self.options = options;
        self
    }

    /// Map one annotation; `index` identifies it in skip and error entries
    pub fn map_annotation<P: Payload>(
        &self,
        index: usize,
        annotation: Annotation<P>,
    ) -> Mapped<P> {
        let Some(located) = self.map.locate(&annotation.fragment) else {
            return Mapped::Skipped(SkippedAnnotation {
                index,
                fragment: annotation.fragment,
                reason: SkipReason::NotInMap,
            });
        };

        if !self.options.include_pseudo && !located.chromosome.kind().is_reference() {
            return Mapped::Skipped(SkippedAnnotation {
                index,
                fragment: annotation.fragment,
                reason: SkipReason::PseudoChromosome {
                    chromosome: located.chromosome.name().to_string(),
                },
            });
        }

        let projection = Projection {
            offset: located.placement.offset,
            length: located.placement.length,
            orientation: located.placement.strand,
        };

        let Some(interval) = projection.interval(annotation.start, annotation.end) else {
            return Mapped::Failed(TransferError::Range {
                index,
                fragment: annotation.fragment,
                start: annotation.start,
                end: annotation.end,
                length: projection.length,
            });
        };

        let mut payload = annotation.payload;
        if let Err(inner) = payload.project(&projection) {
            return Mapped::Failed(TransferError::Range {
                index,
                fragment: annotation.fragment,
                start: inner.start,
                end: inner.end,
                length: projection.length,
            });
        }

        Mapped::Transferred(TransferredAnnotation {
            index,
            chromosome: located.chromosome.name().to_string(),
            start: interval.start,
            end: interval.end,
            strand: annotation.strand.map(|s| projection.strand(s)),
            orientation: projection.orientation,
            payload,
        })
    }

    /// Map a batch of annotations. Failures are collected; the batch continues.
    pub fn transfer<P, I>(&self, annotations: I) -> TransferOutcome<P>
    where
        P: Payload,
        I: IntoIterator<Item = Annotation<P>>,
    {
        let mut outcome = TransferOutcome::default();

        for (index, annotation) in annotations.into_iter().enumerate() {
            match self.map_annotation(index, annotation) {
                Mapped::Transferred(mapped) => outcome.transferred.push(mapped),
                Mapped::Skipped(skipped) => {
                    debug!(
                        index,
                        fragment = %skipped.fragment,
                        reason = %skipped.reason,
                        "Skipped annotation"
                    );
                    outcome.skipped.push(skipped);
                }
                Mapped::Failed(error) => {
                    warn!("{error}");
                    outcome.errors.push(error);
                }
            }
        }

        info!(
            transferred = outcome.transferred.len(),
            skipped = outcome.skipped.len(),
            errors = outcome.errors.len(),
            "Transferred annotations"
        );
        outcome
    }
}

/// Transfer annotations with default options
pub fn transfer<P, I>(map: &FragmentMap, annotations: I) -> TransferOutcome<P>
where
    P: Payload,
    I: IntoIterator<Item = Annotation<P>>,
{
    CoordinateMapper::new(map).transfer(annotations)
}
