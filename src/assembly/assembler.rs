use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, info};

use crate::assembly::sequence::extend_reverse_complement;
use crate::core::map::{Chromosome, FragmentMap};
use crate::core::types::Strand;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssembleError {
    #[error("No sequence for fragment '{fragment}' placed on '{chromosome}'")]
    MissingSequence { fragment: String, chromosome: String },

    #[error("Fragment '{fragment}' has {found} bases but the map expects {expected}")]
    LengthMismatch {
        fragment: String,
        expected: u64,
        found: u64,
    },

    #[error("Assembled '{chromosome}' has {found} bases, expected {expected}")]
    AssembledLength {
        chromosome: String,
        expected: u64,
        found: u64,
    },

    #[error("Chromosome '{0}' does not fit in memory")]
    TooLarge(String),
}

/// Source of fragment sequences keyed by fragment name
pub trait FragmentSequences {
    fn sequence(&self, fragment: &str) -> Option<&[u8]>;
}

impl FragmentSequences for HashMap<String, Vec<u8>> {
    fn sequence(&self, fragment: &str) -> Option<&[u8]> {
        self.get(fragment).map(Vec::as_slice)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssemblyConfig {
    /// Symbol written into every gap position
    pub filler: u8,
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self { filler: b'N' }
    }
}

/// One assembled output sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledChromosome {
    pub name: String,
    pub sequence: Vec<u8>,
}

impl AssembledChromosome {
    #[must_use]
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }
}

/// Concatenates fragment sequences in map order
#[derive(Debug, Clone, Default)]
pub struct Assembler {
    config: AssemblyConfig,
}

impl Assembler {
    #[must_use]
    pub fn new(config: AssemblyConfig) -> Self {
        Self { config }
    }

    /// Assemble every chromosome of the map, in map order
    ///
    /// # Errors
    ///
    /// Fails on the first missing fragment sequence or length mismatch.
    pub fn assemble<S>(
        &self,
        map: &FragmentMap,
        sequences: &S,
    ) -> Result<Vec<AssembledChromosome>, AssembleError>
    where
        S: FragmentSequences + ?Sized,
    {
        let assembled = map
            .chromosomes()
            .iter()
            .map(|chromosome| self.assemble_chromosome(map, chromosome, sequences))
            .collect::<Result<Vec<_>, _>>()?;

        info!(
            chromosomes = assembled.len(),
            bases = assembled.iter().map(AssembledChromosome::len).sum::<usize>(),
            "Assembled chromosomes"
        );
        Ok(assembled)
    }

    /// Assemble a single chromosome of the map.
    ///
    /// Placements are visited by rank; reverse-strand fragments are
    /// reverse-complemented and `gap_size` filler symbols separate
    /// consecutive fragments. The result is checked against the map's
    /// chromosome length.
    ///
    /// # Errors
    ///
    /// Fails if a fragment sequence is missing or has the wrong length.
    pub fn assemble_chromosome<S>(
        &self,
        map: &FragmentMap,
        chromosome: &Chromosome,
        sequences: &S,
    ) -> Result<AssembledChromosome, AssembleError>
    where
        S: FragmentSequences + ?Sized,
    {
        let expected = chromosome.length();
        let capacity = usize::try_from(expected)
            .map_err(|_| AssembleError::TooLarge(chromosome.name().to_string()))?;
        let gap = usize::try_from(map.gap_size())
            .map_err(|_| AssembleError::TooLarge(chromosome.name().to_string()))?;

        let mut sequence = Vec::with_capacity(capacity);

        for (index, placement) in chromosome.placements().iter().enumerate() {
            let fragment = sequences.sequence(&placement.fragment).ok_or_else(|| {
                AssembleError::MissingSequence {
                    fragment: placement.fragment.clone(),
                    chromosome: chromosome.name().to_string(),
                }
            })?;

            if fragment.len() as u64 != placement.length {
                return Err(AssembleError::LengthMismatch {
                    fragment: placement.fragment.clone(),
                    expected: placement.length,
                    found: fragment.len() as u64,
                });
            }

            if index > 0 {
                sequence.resize(sequence.len() + gap, self.config.filler);
            }

            match placement.strand {
                Strand::Forward => sequence.extend_from_slice(fragment),
                Strand::Reverse => extend_reverse_complement(&mut sequence, fragment),
            }
        }

        if sequence.len() as u64 != expected {
            return Err(AssembleError::AssembledLength {
                chromosome: chromosome.name().to_string(),
                expected,
                found: sequence.len() as u64,
            });
        }

        debug!(
            chromosome = chromosome.name(),
            fragments = chromosome.placements().len(),
            length = sequence.len(),
            "Assembled chromosome"
        );

        Ok(AssembledChromosome {
            name: chromosome.name().to_string(),
            sequence,
        })
    }
}
