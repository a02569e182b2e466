// Copyright 2021-2024 SecureDNA Stiftung (SecureDNA Foundation) <licensing@securedna.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! mRNA folding heuristics.
//!
//! These are NOT folding predictions. `mfe_estimate` is a linear function of
//! length and GC fraction, and `structure_entropy` is the Shannon entropy of
//! the dinucleotide distribution. Values are comparable between runs of this
//! engine, not as physical free energies.

use feature_types::FeatureMap;

use super::composition::BaseCounts;
use super::{feature_map, ratio};

const MFE_BASE_PER_NT: f64 = 0.1;
const MFE_GC_PER_NT: f64 = 0.3;

fn base_index(base: u8) -> Option<usize> {
    match base {
        b'A' => Some(0),
        b'C' => Some(1),
        b'G' => Some(2),
        b'T' => Some(3),
        _ => None,
    }
}

/// Shannon entropy, in bits, of the overlapping unambiguous dinucleotides.
fn dinucleotide_entropy(nucleotides: &[u8]) -> f64 {
    let mut counts = [0usize; 16];
    for pair in nucleotides.windows(2) {
        if let (Some(a), Some(b)) = (base_index(pair[0]), base_index(pair[1])) {
            counts[4 * a + b] += 1;
        }
    }
    let total: usize = counts.iter().sum();
    if total == 0 {
        return 0.0;
    }
    counts
        .iter()
        .filter(|count| **count > 0)
        .map(|count| {
            let p = *count as f64 / total as f64;
            -p * p.log2()
        })
        .sum()
}

pub(super) fn mrna_folding(nucleotides: &[u8]) -> FeatureMap {
    let length = nucleotides.len() as f64;
    let gc_fraction = BaseCounts::of(nucleotides).gc_fraction();
    let mfe = -(MFE_BASE_PER_NT + MFE_GC_PER_NT * gc_fraction) * length;
    feature_map([
        ("mfe_estimate", mfe.into()),
        ("mfe_per_nt", ratio(mfe, length).into()),
        ("structure_entropy", dinucleotide_entropy(nucleotides).into()),
    ])
}

#[cfg(test)]
mod test {
    use super::*;

    fn num(features: &FeatureMap, name: &str) -> f64 {
        features[name].as_f64().unwrap()
    }

    #[test]
    fn gc_rich_sequences_fold_tighter() {
        let at = mrna_folding(b"ATATATATAT");
        let gc = mrna_folding(b"GCGCGCGCGC");
        assert_eq!(num(&at, "mfe_estimate"), -1.0);
        assert_eq!(num(&gc, "mfe_estimate"), -4.0);
        assert_eq!(num(&gc, "mfe_per_nt"), -0.4);
    }

    #[test]
    fn entropy_of_dinucleotides() {
        // AT and TA alternate: two equally likely dinucleotides
        assert_eq!(num(&mrna_folding(b"ATATA"), "structure_entropy"), 1.0);
        assert_eq!(num(&mrna_folding(b"AAAA"), "structure_entropy"), 0.0);
        assert_eq!(num(&mrna_folding(b"ANA"), "structure_entropy"), 0.0);
    }

    #[test]
    fn empty_sequence() {
        let features = mrna_folding(b"");
        assert_eq!(num(&features, "mfe_estimate"), 0.0);
        assert_eq!(num(&features, "mfe_per_nt"), 0.0);
    }
}
