//! Coordinate transfer from fragment to assembled chromosome coordinates.
//!
//! An annotation on a forward fragment is shifted by the fragment offset. On
//! a reverse fragment it is first reflected within the fragment span, so
//! `[start, end)` becomes `[len - end, len - start)`, and its strand is
//! flipped. Annotations on fragments missing from the map are reported as
//! skipped; out-of-range intervals are reported as errors without stopping
//! the batch.

pub mod mapper;
