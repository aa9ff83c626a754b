/// Complement of a nucleotide symbol.
///
/// Case is preserved. IUPAC ambiguity codes map to their complementary code
/// (`R`/`Y`, `K`/`M`, `B`/`V`, `D`/`H`; `S`, `W` and `N` are
/// self-complementary). `U` complements to `A`. Any other byte becomes `N`.
#[inline]
#[must_use]
pub fn complement(base: u8) -> u8 {
    let upper = match base.to_ascii_uppercase() {
        b'A' => b'T',
        b'C' => b'G',
        b'G' => b'C',
        b'T' | b'U' => b'A',
        b'R' => b'Y',
        b'Y' => b'R',
        b'K' => b'M',
        b'M' => b'K',
        b'S' => b'S',
        b'W' => b'W',
        b'B' => b'V',
        b'V' => b'B',
        b'D' => b'H',
        b'H' => b'D',
        b'N' => b'N',
        _ => return b'N',
    };
    if base.is_ascii_lowercase() {
        upper.to_ascii_lowercase()
    } else {
        upper
    }
}

#[must_use]
pub fn reverse_complement(seq: &[u8]) -> Vec<u8> {
    seq.iter().rev().map(|&b| complement(b)).collect()
}

/// Append `seq` to `out`, reverse-complemented
pub fn extend_reverse_complement(out: &mut Vec<u8>, seq: &[u8]) {
    out.reserve(seq.len());
    out.extend(seq.iter().rev().map(|&b| complement(b)));
}
