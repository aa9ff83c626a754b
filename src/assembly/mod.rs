//! Assembly of chromosome sequences from a fragment map.
//!
//! The [`Assembler`](assembler::Assembler) walks each chromosome of a map,
//! appends fragment sequences in rank order (reverse-complementing `-`
//! fragments) and fills gaps with a configurable symbol.

pub mod assembler;
pub mod sequence;
