//! Core data types for reference-assisted chromosome assembly.
//!
//! - [`AlignmentRecord`](alignment::AlignmentRecord): a validated fragment-to-reference alignment
//! - [`Placement`](placement::Placement): a fragment's rank, orientation and offset in an
//!   assembled chromosome
//! - [`MapEntry`](placement::MapEntry): a placement or the gap that follows it
//! - [`FragmentMap`](map::FragmentMap): the immutable table of placements per output chromosome
//! - [`Strand`](types::Strand), [`ChromosomeKind`](types::ChromosomeKind): tagged variants
//!
//! ## Coordinates
//!
//! All intervals are 0-based half-open. A fragment placed at offset `o` with
//! length `l` covers `[o, o + l)` of its assembled chromosome. Consecutive
//! placements are separated by exactly one gap of the map's gap size:
//!
//! | Entry | Offset | Length |
//! |-------|--------|--------|
//! | F1 (+) | 0 | 100 |
//! | gap | 100 | 10 |
//! | F2 (-) | 110 | 50 |

pub mod alignment;
pub mod map;
pub mod placement;
pub mod types;
