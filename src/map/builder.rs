//! Fragment map construction from fragment-to-reference alignments.
//!
//! The `MapBuilder` picks one representative alignment per fragment, orders
//! the survivors along each reference chromosome, resolves overlaps by keeping
//! the leftmost evidence, and lays the result out with a fixed gap between
//! consecutive fragments. Every decision that removes a fragment from a
//! reference chromosome is recorded in a [`BuildReport`].

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::core::alignment::AlignmentRecord;
use crate::core::map::{
    is_valid_chromosome_name, is_valid_fragment_name, Chromosome, FragmentMap, MapError,
};
use crate::core::types::{ChromosomeKind, Strand};

/// Default number of filler bases between consecutive fragments
pub const DEFAULT_GAP_SIZE: u64 = 100;

/// Default name of the pseudo-chromosome collecting unplaced fragments
pub const DEFAULT_UNPLACED_NAME: &str = "chrUn";

/// Default suffix of per-chromosome unlocalized pseudo-chromosomes
pub const DEFAULT_UNLOCALIZED_SUFFIX: &str = "_unlocalized";

/// Suffixes of the arms left and right of a centromere
pub const ARM_SUFFIXES: [&str; 2] = ["_1", "_2"];

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BuildError {
    #[error("Gap size must be at least 1")]
    InvalidGapSize,

    #[error("Score ratio threshold must be a positive number, got {0}")]
    InvalidRatioThreshold(f64),

    #[error("Fragment '{0}' has a non-positive length")]
    InvalidLength(String),

    #[error("Alignment record {record}: fragment '{fragment}' has no known length")]
    UnknownFragment { fragment: String, record: usize },

    #[error(
        "Alignment record {record}: fragment '{fragment}' has length {found}, expected {expected}"
    )]
    FragmentLengthMismatch {
        fragment: String,
        record: usize,
        expected: u64,
        found: u64,
    },

    #[error("Alignment record {record}: reference chromosome '{chromosome}' clashes with a pseudo-chromosome name")]
    ReservedChromosome { chromosome: String, record: usize },

    #[error("'{0}' cannot be used as a chromosome name")]
    InvalidChromosomeName(String),

    #[error("Inconsistent fragment map: {0}")]
    Consistency(#[from] MapError),
}

impl BuildError {
    /// True when the error comes from a violated map invariant rather than bad input
    #[must_use]
    pub fn is_consistency(&self) -> bool {
        matches!(self, Self::Consistency(_))
    }
}

/// Settings for building a fragment map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Filler bases inserted between consecutive fragments
    pub gap_size: u64,

    /// Name of the pseudo-chromosome for unplaced fragments
    pub unplaced_name: String,

    /// Suffix appended to a reference name for its unlocalized fragments
    pub unlocalized_suffix: String,

    /// Minimum ratio of the two best alignment scores required to place a fragment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ratio_threshold: Option<f64>,

    /// Fragments shorter than this are not placed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_fragment_length: Option<u64>,

    /// Emit the unplaced pseudo-chromosome
    pub emit_unplaced: bool,

    /// Centromere position per reference chromosome. Alignments on these
    /// chromosomes go to the `_1` arm when they start before the centromere
    /// and to the `_2` arm otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub centromeres: Option<HashMap<String, u64>>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            gap_size: DEFAULT_GAP_SIZE,
            unplaced_name: DEFAULT_UNPLACED_NAME.to_string(),
            unlocalized_suffix: DEFAULT_UNLOCALIZED_SUFFIX.to_string(),
            ratio_threshold: None,
            min_fragment_length: None,
            emit_unplaced: true,
            centromeres: None,
        }
    }
}

impl BuildConfig {
    #[must_use]
    pub fn new(gap_size: u64) -> Self {
        Self {
            gap_size,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn unplaced_name(mut self, name: impl Into<String>) -> Self {
        self.unplaced_name = name.into();
        self
    }

    #[must_use]
    pub fn unlocalized_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.unlocalized_suffix = suffix.into();
        self
    }

    #[must_use]
    pub fn ratio_threshold(mut self, threshold: f64) -> Self {
        self.ratio_threshold = Some(threshold);
        self
    }

    #[must_use]
    pub fn min_fragment_length(mut self, length: u64) -> Self {
        self.min_fragment_length = Some(length);
        self
    }

    #[must_use]
    pub fn emit_unplaced(mut self, emit: bool) -> Self {
        self.emit_unplaced = emit;
        self
    }

    #[must_use]
    pub fn centromeres(mut self, centromeres: HashMap<String, u64>) -> Self {
        self.centromeres = Some(centromeres);
        self
    }

    fn validate(&self) -> Result<(), BuildError> {
        if self.gap_size == 0 {
            return Err(BuildError::InvalidGapSize);
        }
        if !is_valid_chromosome_name(&self.unplaced_name) {
            return Err(BuildError::InvalidChromosomeName(self.unplaced_name.clone()));
        }
        if !is_valid_fragment_name(&self.unlocalized_suffix) {
            return Err(BuildError::InvalidChromosomeName(self.unlocalized_suffix.clone()));
        }
        if let Some(threshold) = self.ratio_threshold {
            if !threshold.is_finite() || threshold <= 0.0 {
                return Err(BuildError::InvalidRatioThreshold(threshold));
            }
        }
        Ok(())
    }

    /// Reference name an alignment is grouped under: the arm name when the
    /// chromosome has a centromere, the chromosome itself otherwise
    fn arm_of(&self, alignment: &AlignmentRecord) -> Option<String> {
        let centromere = *self.centromeres.as_ref()?.get(alignment.reference())?;
        let suffix = if alignment.reference_start() < centromere {
            ARM_SUFFIXES[0]
        } else {
            ARM_SUFFIXES[1]
        };
        Some(format!("{}{suffix}", alignment.reference()))
    }

    fn is_reserved(&self, chromosome: &str) -> bool {
        chromosome == self.unplaced_name
            || (!self.unlocalized_suffix.is_empty()
                && chromosome.ends_with(&self.unlocalized_suffix))
    }
}

/// Why a fragment did not get a position on a reference chromosome
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum UnplacedReason {
    /// No alignment mentions the fragment
    NoAlignment,
    /// Fragment is shorter than the configured minimum
    TooShort { length: u64, minimum: u64 },
    /// The two best alignments hit different chromosomes with similar scores
    Ambiguous { best_score: f64, second_score: f64 },
    /// The fragment's reference interval overlapped one kept earlier
    Overlap { chromosome: String, kept: String },
}

impl std::fmt::Display for UnplacedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoAlignment => write!(f, "no alignment"),
            Self::TooShort { length, minimum } => {
                write!(f, "length {length} below minimum {minimum}")
            }
            Self::Ambiguous {
                best_score,
                second_score,
            } => write!(f, "ambiguous scores {best_score} vs {second_score}"),
            Self::Overlap { chromosome, kept } => {
                write!(f, "overlaps '{kept}' on {chromosome}")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnplacedFragment {
    pub fragment: String,
    #[serde(flatten)]
    pub reason: UnplacedReason,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnlocalizedFragment {
    pub fragment: String,
    pub chromosome: String,
}

/// An overlap between two anchored fragments and how it was resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverlapConflict {
    pub chromosome: String,
    pub kept: String,
    pub kept_start: u64,
    pub kept_end: u64,
    pub dropped: String,
    pub dropped_start: u64,
    pub dropped_end: u64,
}

/// Audit trail of the decisions taken while building a map
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BuildReport {
    /// Fragments placed on reference chromosomes
    pub placed: usize,
    pub conflicts: Vec<OverlapConflict>,
    pub unlocalized: Vec<UnlocalizedFragment>,
    pub unplaced: Vec<UnplacedFragment>,
}

/// Outcome of choosing between the alignments of a single fragment
enum Selection<'a> {
    Anchor(&'a AlignmentRecord),
    Unlocalized(&'a str),
    Ambiguous { best_score: f64, second_score: f64 },
}

/// Builds [`FragmentMap`]s from alignments and fragment lengths
#[derive(Debug, Clone, Default)]
pub struct MapBuilder {
    config: BuildConfig,
}

impl MapBuilder {
    #[must_use]
    pub fn new(config: BuildConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Build a fragment map, discarding the decision report
    ///
    /// # Errors
    ///
    /// See [`MapBuilder::build_with_report`].
    pub fn build<I>(
        &self,
        alignments: I,
        fragment_lengths: &HashMap<String, u64>,
    ) -> Result<FragmentMap, BuildError>
    where
        I: IntoIterator<Item = AlignmentRecord>,
    {
        self.build_with_report(alignments, fragment_lengths)
            .map(|(map, _)| map)
    }

    /// Build a fragment map and report which fragments were dropped and why.
    ///
    /// # Errors
    ///
    /// Returns an input error if an alignment names a fragment missing from
    /// `fragment_lengths`, disagrees with its length, or targets a reserved
    /// chromosome name, or if a length is zero. Returns
    /// `BuildError::Consistency` if the laid out map violates an invariant.
    pub fn build_with_report<I>(
        &self,
        alignments: I,
        fragment_lengths: &HashMap<String, u64>,
    ) -> Result<(FragmentMap, BuildReport), BuildError>
    where
        I: IntoIterator<Item = AlignmentRecord>,
    {
        self.config.validate()?;

        let mut fragments: Vec<(&str, u64)> = fragment_lengths
            .iter()
            .map(|(name, &length)| (name.as_str(), length))
            .collect();
        fragments.sort_unstable();

        if let Some((name, _)) = fragments.iter().find(|(_, length)| *length == 0) {
            return Err(BuildError::InvalidLength((*name).to_string()));
        }

        let mut by_fragment = group_by_fragment(alignments, fragment_lengths, &self.config)?;

        let mut report = BuildReport::default();
        let mut unplaced: BTreeMap<String, UnplacedReason> = BTreeMap::new();
        let mut unlocalized: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut anchors: BTreeMap<String, Vec<AlignmentRecord>> = BTreeMap::new();

        for (fragment, length) in fragments {
            let records = by_fragment.remove(fragment).unwrap_or_default();

            if let Some(minimum) = self.config.min_fragment_length {
                if length < minimum {
                    debug!(fragment, length, minimum, "Fragment below minimum length");
                    unplaced.insert(
                        fragment.to_string(),
                        UnplacedReason::TooShort { length, minimum },
                    );
                    continue;
                }
            }

            if records.is_empty() {
                debug!(fragment, "Fragment has no alignments");
                unplaced.insert(fragment.to_string(), UnplacedReason::NoAlignment);
                continue;
            }

            let mut ranked = records;
            ranked.sort_by(AlignmentRecord::preference);

            match self.select(&ranked) {
                Selection::Anchor(best) => {
                    debug!(
                        fragment,
                        chromosome = best.reference(),
                        start = best.reference_start(),
                        strand = %best.strand(),
                        "Anchored fragment"
                    );
                    anchors
                        .entry(best.reference().to_string())
                        .or_default()
                        .push(best.clone());
                }
                Selection::Unlocalized(chromosome) => {
                    debug!(fragment, chromosome, "Fragment unlocalized");
                    unlocalized
                        .entry(chromosome.to_string())
                        .or_default()
                        .push(fragment.to_string());
                }
                Selection::Ambiguous {
                    best_score,
                    second_score,
                } => {
                    debug!(fragment, best_score, second_score, "Fragment ambiguous");
                    unplaced.insert(
                        fragment.to_string(),
                        UnplacedReason::Ambiguous {
                            best_score,
                            second_score,
                        },
                    );
                }
            }
        }

        let gap_size = self.config.gap_size;
        let mut chromosomes = Vec::new();

        for (name, candidates) in anchors {
            let kept = resolve_overlaps(&name, candidates, &mut report, &mut unplaced);
            report.placed += kept.len();

            let layout = kept.iter().map(|anchor| {
                (
                    anchor.fragment().to_string(),
                    anchor.strand(),
                    anchor.fragment_length(),
                )
            });
            chromosomes.push(Chromosome::lay_out(
                name,
                ChromosomeKind::Reference,
                layout,
                gap_size,
            )?);
        }

        for (parent, members) in unlocalized {
            let name = format!("{parent}{}", self.config.unlocalized_suffix);
            report
                .unlocalized
                .extend(members.iter().map(|fragment| UnlocalizedFragment {
                    fragment: fragment.clone(),
                    chromosome: parent.clone(),
                }));

            let layout = members.into_iter().map(|fragment| {
                let length = fragment_lengths[&fragment];
                (fragment, Strand::Forward, length)
            });
            chromosomes.push(Chromosome::lay_out(
                name,
                ChromosomeKind::Unlocalized { parent },
                layout,
                gap_size,
            )?);
        }

        report
            .unplaced
            .extend(unplaced.iter().map(|(fragment, reason)| UnplacedFragment {
                fragment: fragment.clone(),
                reason: reason.clone(),
            }));

        if self.config.emit_unplaced && !unplaced.is_empty() {
            let layout = unplaced.into_keys().map(|fragment| {
                let length = fragment_lengths[&fragment];
                (fragment, Strand::Forward, length)
            });
            chromosomes.push(Chromosome::lay_out(
                self.config.unplaced_name.clone(),
                ChromosomeKind::Unplaced,
                layout,
                gap_size,
            )?);
        }

        let map = FragmentMap::new(gap_size, chromosomes)?;

        info!(
            placed = report.placed,
            unlocalized = report.unlocalized.len(),
            unplaced = report.unplaced.len(),
            conflicts = report.conflicts.len(),
            "Built fragment map"
        );

        Ok((map, report))
    }

    fn select<'a>(&self, ranked: &'a [AlignmentRecord]) -> Selection<'a> {
        let best = &ranked[0];

        if let (Some(threshold), Some(second)) = (self.config.ratio_threshold, ranked.get(1)) {
            let decisive = second.score() <= 0.0 || best.score() / second.score() > threshold;
            if !decisive {
                if best.reference() == second.reference() {
                    return Selection::Unlocalized(best.reference());
                }
                return Selection::Ambiguous {
                    best_score: best.score(),
                    second_score: second.score(),
                };
            }
        }

        Selection::Anchor(best)
    }
}

/// Validate alignments against the known lengths and group them by fragment
fn group_by_fragment<I>(
    alignments: I,
    fragment_lengths: &HashMap<String, u64>,
    config: &BuildConfig,
) -> Result<HashMap<String, Vec<AlignmentRecord>>, BuildError>
where
    I: IntoIterator<Item = AlignmentRecord>,
{
    let mut grouped: HashMap<String, Vec<AlignmentRecord>> = HashMap::new();

    for (record, mut alignment) in alignments.into_iter().enumerate() {
        if let Some(arm) = config.arm_of(&alignment) {
            debug!(
                fragment = alignment.fragment(),
                chromosome = alignment.reference(),
                arm = %arm,
                "Assigned alignment to chromosome arm"
            );
            alignment = alignment.with_reference(arm);
        }

        let fragment = alignment.fragment();
        let expected =
            *fragment_lengths
                .get(fragment)
                .ok_or_else(|| BuildError::UnknownFragment {
                    fragment: fragment.to_string(),
                    record,
                })?;

        if alignment.fragment_length() != expected {
            return Err(BuildError::FragmentLengthMismatch {
                fragment: fragment.to_string(),
                record,
                expected,
                found: alignment.fragment_length(),
            });
        }

        if config.is_reserved(alignment.reference()) {
            return Err(BuildError::ReservedChromosome {
                chromosome: alignment.reference().to_string(),
                record,
            });
        }
        if !is_valid_chromosome_name(alignment.reference()) {
            return Err(BuildError::InvalidChromosomeName(
                alignment.reference().to_string(),
            ));
        }

        grouped
            .entry(fragment.to_string())
            .or_default()
            .push(alignment);
    }

    Ok(grouped)
}

/// Order anchors along a chromosome and drop those overlapping an earlier one.
///
/// Anchors are sorted by reference start, ties broken by alignment
/// preference. A dropped anchor is compared against nothing else; the next
/// anchor is checked against the last one kept.
fn resolve_overlaps(
    chromosome: &str,
    mut candidates: Vec<AlignmentRecord>,
    report: &mut BuildReport,
    unplaced: &mut BTreeMap<String, UnplacedReason>,
) -> Vec<AlignmentRecord> {
    candidates.sort_by(|a, b| {
        a.reference_start()
            .cmp(&b.reference_start())
            .then_with(|| a.preference(b))
            .then_with(|| a.fragment().cmp(b.fragment()))
    });

    let mut kept: Vec<AlignmentRecord> = Vec::with_capacity(candidates.len());

    for candidate in candidates {
        if let Some(last) = kept.last() {
            if candidate.overlaps(last) {
                warn!(
                    chromosome,
                    kept = last.fragment(),
                    dropped = candidate.fragment(),
                    "Overlapping placements: moving '{}' to unplaced",
                    candidate.fragment()
                );
                report.conflicts.push(OverlapConflict {
                    chromosome: chromosome.to_string(),
                    kept: last.fragment().to_string(),
                    kept_start: last.reference_start(),
                    kept_end: last.reference_end(),
                    dropped: candidate.fragment().to_string(),
                    dropped_start: candidate.reference_start(),
                    dropped_end: candidate.reference_end(),
                });
                unplaced.insert(
                    candidate.fragment().to_string(),
                    UnplacedReason::Overlap {
                        chromosome: chromosome.to_string(),
                        kept: last.fragment().to_string(),
                    },
                );
                continue;
            }
        }
        kept.push(candidate);
    }

    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aln(
        fragment: &str,
        length: u64,
        chromosome: &str,
        start: u64,
        end: u64,
        strand: Strand,
        score: f64,
    ) -> AlignmentRecord {
        let aligned = (end - start).min(length);
        AlignmentRecord::new(fragment, length, 0..aligned, chromosome, start..end, strand, score)
            .unwrap()
    }

    fn lengths(items: &[(&str, u64)]) -> HashMap<String, u64> {
        items
            .iter()
            .map(|(name, len)| ((*name).to_string(), *len))
            .collect()
    }

    #[test]
    fn test_build_example_layout() {
        let alignments = vec![
            aln("F1", 100, "chr1", 0, 100, Strand::Forward, 100.0),
            aln("F2", 50, "chr1", 150, 200, Strand::Reverse, 50.0),
        ];
        let map = MapBuilder::new(BuildConfig::new(10))
            .build(alignments, &lengths(&[("F1", 100), ("F2", 50)]))
            .unwrap();

        let chr1 = map.chromosome("chr1").unwrap();
        let placements = chr1.placements();
        assert_eq!(placements.len(), 2);
        assert_eq!(placements[0].fragment, "F1");
        assert_eq!(placements[0].offset, 0);
        assert_eq!(placements[0].strand, Strand::Forward);
        assert_eq!(placements[1].fragment, "F2");
        assert_eq!(placements[1].rank, 1);
        assert_eq!(placements[1].offset, 110);
        assert_eq!(placements[1].strand, Strand::Reverse);
        assert!(map.chromosome(DEFAULT_UNPLACED_NAME).is_none());
    }

    #[test]
    fn test_build_orders_by_reference_start() {
        let alignments = vec![
            aln("c", 10, "chr1", 500, 510, Strand::Forward, 1.0),
            aln("a", 10, "chr1", 100, 110, Strand::Forward, 1.0),
            aln("b", 10, "chr1", 300, 310, Strand::Forward, 1.0),
        ];
        let map = MapBuilder::new(BuildConfig::new(5))
            .build(alignments, &lengths(&[("a", 10), ("b", 10), ("c", 10)]))
            .unwrap();

        let order: Vec<&str> = map.chromosomes()[0]
            .placements()
            .iter()
            .map(|p| p.fragment.as_str())
            .collect();
        assert_eq!(order, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_build_is_input_order_independent() {
        let alignments = vec![
            aln("a", 40, "chr2", 100, 140, Strand::Forward, 10.0),
            aln("a", 40, "chr1", 0, 40, Strand::Forward, 10.0),
            aln("b", 30, "chr1", 20, 50, Strand::Reverse, 20.0),
            aln("c", 30, "chr1", 60, 90, Strand::Forward, 20.0),
            aln("d", 25, "chr2", 10, 35, Strand::Reverse, 5.0),
        ];
        let lens = lengths(&[("a", 40), ("b", 30), ("c", 30), ("d", 25), ("e", 5)]);
        let builder = MapBuilder::new(BuildConfig::new(10));

        let forward = builder.build(alignments.clone(), &lens).unwrap();
        let reversed = builder
            .build(alignments.into_iter().rev(), &lens)
            .unwrap();
        assert_eq!(forward, reversed);
    }

    #[test]
    fn test_build_selects_best_alignment() {
        let alignments = vec![
            aln("f", 100, "chr1", 0, 100, Strand::Forward, 10.0),
            aln("f", 100, "chr2", 50, 150, Strand::Reverse, 90.0),
        ];
        let map = MapBuilder::default()
            .build(alignments, &lengths(&[("f", 100)]))
            .unwrap();

        let located = map.locate("f").unwrap();
        assert_eq!(located.chromosome.name(), "chr2");
        assert_eq!(located.placement.strand, Strand::Reverse);
    }

    #[test]
    fn test_build_tie_break_prefers_smaller_chromosome() {
        let alignments = vec![
            aln("f", 100, "chr2", 0, 100, Strand::Forward, 50.0),
            aln("f", 100, "chr1", 900, 1000, Strand::Forward, 50.0),
        ];
        let map = MapBuilder::default()
            .build(alignments, &lengths(&[("f", 100)]))
            .unwrap();
        assert_eq!(map.locate("f").unwrap().chromosome.name(), "chr1");
    }

    #[test]
    fn test_build_moves_overlap_to_unplaced() {
        let alignments = vec![
            aln("early", 100, "chr1", 0, 100, Strand::Forward, 10.0),
            aln("late", 100, "chr1", 50, 150, Strand::Forward, 99.0),
            aln("after", 100, "chr1", 120, 220, Strand::Forward, 10.0),
        ];
        let (map, report) = MapBuilder::new(BuildConfig::new(10))
            .build_with_report(
                alignments,
                &lengths(&[("early", 100), ("late", 100), ("after", 100)]),
            )
            .unwrap();

        let chr1: Vec<&str> = map
            .chromosome("chr1")
            .unwrap()
            .placements()
            .iter()
            .map(|p| p.fragment.as_str())
            .collect();
        assert_eq!(chr1, vec!["early", "after"]);

        let unplaced = map.chromosome(DEFAULT_UNPLACED_NAME).unwrap();
        assert_eq!(unplaced.kind(), &ChromosomeKind::Unplaced);
        assert_eq!(unplaced.placements()[0].fragment, "late");

        assert_eq!(report.conflicts.len(), 1);
        assert_eq!(report.conflicts[0].kept, "early");
        assert_eq!(report.conflicts[0].dropped, "late");
        assert_eq!(
            report.unplaced[0].reason,
            UnplacedReason::Overlap {
                chromosome: "chr1".to_string(),
                kept: "early".to_string(),
            }
        );
    }

    #[test]
    fn test_build_collects_unaligned_fragments_in_id_order() {
        let alignments = vec![aln("f1", 10, "chr1", 0, 10, Strand::Forward, 1.0)];
        let map = MapBuilder::new(BuildConfig::new(3))
            .build(alignments, &lengths(&[("f1", 10), ("z", 7), ("b", 5)]))
            .unwrap();

        let unplaced = map.chromosomes().last().unwrap();
        assert_eq!(unplaced.name(), DEFAULT_UNPLACED_NAME);
        let placements = unplaced.placements();
        assert_eq!(placements[0].fragment, "b");
        assert_eq!(placements[0].strand, Strand::Forward);
        assert_eq!(placements[1].fragment, "z");
        assert_eq!(placements[1].offset, 8);
    }

    #[test]
    fn test_build_without_unplaced_output() {
        let alignments = vec![aln("f1", 10, "chr1", 0, 10, Strand::Forward, 1.0)];
        let (map, report) = MapBuilder::new(BuildConfig::new(3).emit_unplaced(false))
            .build_with_report(alignments, &lengths(&[("f1", 10), ("f2", 7)]))
            .unwrap();

        assert_eq!(map.chromosomes().len(), 1);
        assert!(map.locate("f2").is_none());
        assert_eq!(report.unplaced.len(), 1);
        assert_eq!(report.unplaced[0].reason, UnplacedReason::NoAlignment);
    }

    #[test]
    fn test_build_rejects_unknown_fragment() {
        let alignments = vec![aln("ghost", 10, "chr1", 0, 10, Strand::Forward, 1.0)];
        let err = MapBuilder::default()
            .build(alignments, &lengths(&[("f1", 10)]))
            .unwrap_err();
        assert_eq!(
            err,
            BuildError::UnknownFragment {
                fragment: "ghost".to_string(),
                record: 0,
            }
        );
        assert!(!err.is_consistency());
    }

    #[test]
    fn test_build_rejects_zero_length() {
        let err = MapBuilder::default()
            .build(Vec::new(), &lengths(&[("f1", 0)]))
            .unwrap_err();
        assert_eq!(err, BuildError::InvalidLength("f1".to_string()));
    }

    #[test]
    fn test_build_rejects_length_mismatch() {
        let alignments = vec![aln("f1", 10, "chr1", 0, 10, Strand::Forward, 1.0)];
        let err = MapBuilder::default()
            .build(alignments, &lengths(&[("f1", 12)]))
            .unwrap_err();
        assert!(matches!(
            err,
            BuildError::FragmentLengthMismatch {
                expected: 12,
                found: 10,
                ..
            }
        ));
    }

    #[test]
    fn test_build_rejects_reserved_chromosome() {
        let alignments = vec![aln("f1", 10, "chrUn", 0, 10, Strand::Forward, 1.0)];
        let err = MapBuilder::default()
            .build(alignments, &lengths(&[("f1", 10)]))
            .unwrap_err();
        assert!(matches!(err, BuildError::ReservedChromosome { .. }));
    }

    #[test]
    fn test_build_rejects_zero_gap() {
        let err = MapBuilder::new(BuildConfig::new(0))
            .build(Vec::new(), &HashMap::new())
            .unwrap_err();
        assert_eq!(err, BuildError::InvalidGapSize);
    }

    #[test]
    fn test_ratio_threshold_unlocalized_and_ambiguous() {
        let alignments = vec![
            // Same chromosome, close scores: unlocalized on chr1
            aln("same", 50, "chr1", 0, 50, Strand::Forward, 100.0),
            aln("same", 50, "chr1", 500, 550, Strand::Forward, 95.0),
            // Different chromosomes, close scores: unplaced
            aln("split", 50, "chr1", 1000, 1050, Strand::Forward, 100.0),
            aln("split", 50, "chr2", 0, 50, Strand::Forward, 99.0),
            // Clear winner
            aln("clear", 50, "chr2", 100, 150, Strand::Forward, 200.0),
            aln("clear", 50, "chr1", 2000, 2050, Strand::Forward, 10.0),
        ];
        let (map, report) = MapBuilder::new(BuildConfig::new(10).ratio_threshold(1.2))
            .build_with_report(
                alignments,
                &lengths(&[("same", 50), ("split", 50), ("clear", 50)]),
            )
            .unwrap();

        assert_eq!(map.locate("clear").unwrap().chromosome.name(), "chr2");

        let unlocalized = map.chromosome("chr1_unlocalized").unwrap();
        assert_eq!(
            unlocalized.kind(),
            &ChromosomeKind::Unlocalized {
                parent: "chr1".to_string()
            }
        );
        assert_eq!(unlocalized.placements()[0].fragment, "same");
        assert_eq!(report.unlocalized.len(), 1);

        assert_eq!(map.locate("split").unwrap().chromosome.name(), "chrUn");
        assert!(matches!(
            report.unplaced[0].reason,
            UnplacedReason::Ambiguous { .. }
        ));

        let names: Vec<&str> = map.chromosomes().iter().map(Chromosome::name).collect();
        assert_eq!(names, vec!["chr2", "chr1_unlocalized", "chrUn"]);
    }

    #[test]
    fn test_min_fragment_length() {
        let alignments = vec![
            aln("short", 5, "chr1", 0, 5, Strand::Forward, 1.0),
            aln("long", 50, "chr1", 10, 60, Strand::Forward, 1.0),
        ];
        let (map, report) = MapBuilder::new(BuildConfig::new(10).min_fragment_length(10))
            .build_with_report(alignments, &lengths(&[("short", 5), ("long", 50)]))
            .unwrap();

        assert_eq!(map.locate("long").unwrap().placement.offset, 0);
        assert_eq!(map.locate("short").unwrap().chromosome.name(), "chrUn");
        assert_eq!(
            report.unplaced[0].reason,
            UnplacedReason::TooShort {
                length: 5,
                minimum: 10
            }
        );
    }

    #[test]
    fn test_centromere_splits_chromosome_into_arms() {
        let alignments = vec![
            aln("p", 50, "chr1", 100, 150, Strand::Forward, 10.0),
            aln("q", 50, "chr1", 5000, 5050, Strand::Reverse, 10.0),
            // Starts before the centromere, so it stays on the first arm
            aln("span", 50, "chr1", 990, 1040, Strand::Forward, 10.0),
            aln("other", 50, "chr2", 7000, 7050, Strand::Forward, 10.0),
        ];
        let config = BuildConfig::new(10).centromeres(HashMap::from([("chr1".to_string(), 1000)]));
        let map = MapBuilder::new(config)
            .build(
                alignments,
                &lengths(&[("p", 50), ("q", 50), ("span", 50), ("other", 50)]),
            )
            .unwrap();

        let names: Vec<&str> = map.chromosomes().iter().map(Chromosome::name).collect();
        assert_eq!(names, vec!["chr1_1", "chr1_2", "chr2"]);

        let first: Vec<&str> = map
            .chromosome("chr1_1")
            .unwrap()
            .placements()
            .iter()
            .map(|p| p.fragment.as_str())
            .collect();
        assert_eq!(first, vec!["p", "span"]);
        assert_eq!(map.locate("q").unwrap().chromosome.name(), "chr1_2");
        assert_eq!(map.locate("q").unwrap().placement.strand, Strand::Reverse);
    }

    #[test]
    fn test_centromere_arm_must_not_clash_with_pseudo_name() {
        let alignments = vec![aln("f1", 10, "chr1", 0, 10, Strand::Forward, 1.0)];
        let config = BuildConfig::new(10)
            .unplaced_name("chr1_1")
            .centromeres(HashMap::from([("chr1".to_string(), 100)]));
        let err = MapBuilder::new(config)
            .build(alignments, &lengths(&[("f1", 10)]))
            .unwrap_err();
        assert!(matches!(err, BuildError::ReservedChromosome { chromosome, .. } if chromosome == "chr1_1"));
    }

    #[test]
    fn test_build_rejects_comment_like_reference_name() {
        let alignments = vec![aln("f1", 10, "#chr1", 0, 10, Strand::Forward, 1.0)];
        let err = MapBuilder::default()
            .build(alignments, &lengths(&[("f1", 10)]))
            .unwrap_err();
        assert_eq!(err, BuildError::InvalidChromosomeName("#chr1".to_string()));
        assert!(!err.is_consistency());

        let err = MapBuilder::new(BuildConfig::default().unplaced_name("#unplaced"))
            .build(Vec::new(), &lengths(&[("f1", 10)]))
            .unwrap_err();
        assert_eq!(err, BuildError::InvalidChromosomeName("#unplaced".to_string()));
    }

    #[test]
    fn test_no_fragment_placed_twice() {
        let alignments = vec![
            aln("a", 100, "chr1", 0, 100, Strand::Forward, 5.0),
            aln("a", 100, "chr2", 0, 100, Strand::Forward, 5.0),
            aln("b", 100, "chr1", 50, 150, Strand::Forward, 5.0),
            aln("b", 100, "chr2", 200, 300, Strand::Forward, 1.0),
        ];
        let map = MapBuilder::new(BuildConfig::new(10))
            .build(alignments, &lengths(&[("a", 100), ("b", 100)]))
            .unwrap();

        let mut seen = std::collections::HashSet::new();
        for chromosome in map.chromosomes() {
            for placement in chromosome.placements() {
                assert!(seen.insert(placement.fragment.clone()));
            }
        }
        assert_eq!(seen.len(), 2);
    }
}
