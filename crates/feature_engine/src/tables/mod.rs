// Copyright 2021-2024 SecureDNA Stiftung (SecureDNA Foundation) <licensing@securedna.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Static biology tables: the standard genetic code, synonymous codon
//! families, CAI reference weights and amino acid scales.
//!
//! Everything here is read-only and process-lifetime, so it is freely shared
//! between threads computing different sequences.

mod reference;
mod residues;

use std::fmt;

use once_cell::sync::Lazy;

pub use reference::{ReferenceSet, DEFAULT_RARE_CODONS, DEFAULT_REFERENCE_SET};
pub use residues::{dipeptide_instability, residue, Residue, RESIDUES};

/// The standard genetic code in TCAG order: the codon with bases `b1 b2 b3`
/// sits at `16 * i(b1) + 4 * i(b2) + i(b3)` where `i` maps T, C, A, G to 0..4.
const STANDARD_CODE: &[u8; 64] =
    b"FFLLSSSSYY**CC*WLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG";

const STOP: u8 = b'*';

fn base_index(base: u8) -> Option<usize> {
    match base {
        b'T' => Some(0),
        b'C' => Some(1),
        b'A' => Some(2),
        b'G' => Some(3),
        _ => None,
    }
}

const BASES: [u8; 4] = [b'T', b'C', b'A', b'G'];

/// An unambiguous DNA codon. Only `A`, `C`, `G` and `T` occur in a `Codon`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Codon(u8);

impl Codon {
    /// Parses a triplet, accepting either case and `U` for `T`. Anything
    /// else is not a codon.
    pub fn from_triplet(triplet: &[u8]) -> Option<Self> {
        let [a, b, c] = triplet else {
            return None;
        };
        let index = |base: &u8| match base.to_ascii_uppercase() {
            b'U' => base_index(b'T'),
            other => base_index(other),
        };
        Some(Self((16 * index(a)? + 4 * index(b)? + index(c)?) as u8))
    }

    pub fn from_index(index: usize) -> Option<Self> {
        (index < 64).then_some(Self(index as u8))
    }

    /// All 64 codons, in TCAG order.
    pub fn all() -> impl Iterator<Item = Codon> {
        (0..64u8).map(Self)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn bases(self) -> [u8; 3] {
        let i = self.0 as usize;
        [BASES[i / 16], BASES[(i / 4) % 4], BASES[i % 4]]
    }

    /// The one-letter amino acid this codon encodes, or `*` for a stop.
    pub fn amino_acid(self) -> u8 {
        STANDARD_CODE[self.index()]
    }

    pub fn is_stop(self) -> bool {
        self.amino_acid() == STOP
    }

    /// Number of codons (including this one) encoding the same amino acid.
    pub fn family_size(self) -> usize {
        synonymous_codons(self.amino_acid()).len()
    }
}

impl fmt::Display for Codon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bases = self.bases();
        // bases are always ASCII letters
        f.write_str(std::str::from_utf8(&bases).map_err(|_| fmt::Error)?)
    }
}

impl fmt::Debug for Codon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Codon({self})")
    }
}

static FAMILIES: Lazy<Vec<(u8, Vec<Codon>)>> = Lazy::new(|| {
    let mut families: Vec<(u8, Vec<Codon>)> = vec![];
    for codon in Codon::all() {
        let aa = codon.amino_acid();
        match families.iter_mut().find(|(family_aa, _)| *family_aa == aa) {
            Some((_, codons)) => codons.push(codon),
            None => families.push((aa, vec![codon])),
        }
    }
    families
});

/// Codons encoding `amino_acid` (or the stop codons, for `*`). Empty for
/// letters the standard code never produces.
pub fn synonymous_codons(amino_acid: u8) -> &'static [Codon] {
    FAMILIES
        .iter()
        .find(|(aa, _)| *aa == amino_acid)
        .map(|(_, codons)| codons.as_slice())
        .unwrap_or_default()
}

/// Every amino acid family of the standard code, stops excluded, in order of
/// first appearance in TCAG order.
pub fn amino_acid_families() -> impl Iterator<Item = (u8, &'static [Codon])> {
    FAMILIES
        .iter()
        .filter(|(aa, _)| *aa != STOP)
        .map(|(aa, codons)| (*aa, codons.as_slice()))
}

/// Splits a nucleotide sequence into non-overlapping triplets from offset 0,
/// keeping only unambiguous ones. Ambiguous triplets are dropped without
/// shifting the frame.
pub fn codons(sequence: &[u8]) -> Vec<Codon> {
    sequence
        .chunks_exact(3)
        .filter_map(Codon::from_triplet)
        .collect()
}

/// Translates frame 0 with the standard code, dropping stops and
/// untranslatable triplets.
pub fn translate(codons: &[Codon]) -> Vec<u8> {
    codons
        .iter()
        .filter(|codon| !codon.is_stop())
        .map(|codon| codon.amino_acid())
        .collect()
}
