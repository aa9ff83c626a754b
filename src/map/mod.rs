//! Building, persisting and summarizing fragment maps.
//!
//! - [`builder`]: turns alignments and fragment lengths into a [`FragmentMap`](crate::core::map::FragmentMap)
//! - [`store`]: tab-separated on-disk format with a validating loader
//! - [`summary`]: per-chromosome statistics and BED export
//!
//! ## Example
//!
//! ```rust
//! use std::collections::HashMap;
//! use chromosomer::core::alignment::AlignmentRecord;
//! use chromosomer::core::types::Strand;
//! use chromosomer::map::builder::{BuildConfig, MapBuilder};
//!
//! let alignments = vec![
//!     AlignmentRecord::new("F1", 100, 0..100, "chr1", 0..100, Strand::Forward, 100.0).unwrap(),
//!     AlignmentRecord::new("F2", 50, 0..50, "chr1", 150..200, Strand::Reverse, 50.0).unwrap(),
//! ];
//! let lengths = HashMap::from([("F1".to_string(), 100), ("F2".to_string(), 50)]);
//!
//! let map = MapBuilder::new(BuildConfig::new(10)).build(alignments, &lengths).unwrap();
//! assert_eq!(map.locate("F2").unwrap().placement.offset, 110);
//! ```

pub mod builder;
pub mod store;
pub mod summary;
