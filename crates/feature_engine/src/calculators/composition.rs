// Copyright 2021-2024 SecureDNA Stiftung (SecureDNA Foundation) <licensing@securedna.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

use feature_types::FeatureMap;

use super::{feature_map, ratio};

/// Counts of the unambiguous bases. Input is already uppercased with `U`
/// read as `T`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(super) struct BaseCounts {
    pub a: usize,
    pub c: usize,
    pub g: usize,
    pub t: usize,
}

impl BaseCounts {
    pub fn of(nucleotides: &[u8]) -> Self {
        nucleotides.iter().fold(Self::default(), |mut counts, base| {
            match base {
                b'A' => counts.a += 1,
                b'C' => counts.c += 1,
                b'G' => counts.g += 1,
                b'T' => counts.t += 1,
                _ => {}
            }
            counts
        })
    }

    /// The effective alphabet size: only A, C, G and T count.
    pub fn total(&self) -> usize {
        self.a + self.c + self.g + self.t
    }

    pub fn gc(&self) -> usize {
        self.g + self.c
    }

    pub fn gc_fraction(&self) -> f64 {
        ratio(self.gc() as f64, self.total() as f64)
    }
}

pub(super) fn composition(nucleotides: &[u8]) -> FeatureMap {
    let counts = BaseCounts::of(nucleotides);
    let total = counts.total() as f64;
    let (a, c, g, t) = (
        counts.a as f64,
        counts.c as f64,
        counts.g as f64,
        counts.t as f64,
    );
    feature_map([
        ("length", nucleotides.len().into()),
        ("a_count", counts.a.into()),
        ("t_count", counts.t.into()),
        ("g_count", counts.g.into()),
        ("c_count", counts.c.into()),
        ("gc_content", (100.0 * ratio(g + c, total)).into()),
        ("at_content", (100.0 * ratio(a + t, total)).into()),
        ("gc_skew", ratio(g - c, g + c).into()),
        ("at_skew", ratio(a - t, a + t).into()),
        ("at_gc_ratio", ratio(a + t, g + c).into()),
    ])
}

fn count_dinucleotide(nucleotides: &[u8], pair: &[u8; 2]) -> usize {
    nucleotides.windows(2).filter(|w| *w == pair).count()
}

pub(super) fn nucleotide_frequency(nucleotides: &[u8]) -> FeatureMap {
    let counts = BaseCounts::of(nucleotides);
    let total = counts.total() as f64;
    let n = nucleotides.len() as f64;
    let cpg = count_dinucleotide(nucleotides, b"CG") as f64;
    let expected_cpg = ratio(counts.c as f64 * counts.g as f64, n);
    feature_map([
        ("frac_a", ratio(counts.a as f64, total).into()),
        ("frac_c", ratio(counts.c as f64, total).into()),
        ("frac_g", ratio(counts.g as f64, total).into()),
        ("frac_t", ratio(counts.t as f64, total).into()),
        ("cpg_freq", ratio(cpg, (n - 1.0).max(0.0)).into()),
        ("cpg_oe_ratio", ratio(cpg, expected_cpg).into()),
    ])
}

/// GC fraction of the bases at codon position `offset` (0, 1 or 2).
fn positional_gc(nucleotides: &[u8], offset: usize) -> f64 {
    let at_position: Vec<u8> = nucleotides.iter().skip(offset).step_by(3).copied().collect();
    BaseCounts::of(&at_position).gc_fraction()
}

pub(super) fn gc_content(nucleotides: &[u8]) -> FeatureMap {
    feature_map([
        ("gc_fraction", BaseCounts::of(nucleotides).gc_fraction().into()),
        ("gc_pos1", positional_gc(nucleotides, 0).into()),
        ("gc_pos2", positional_gc(nucleotides, 1).into()),
        ("gc_pos3", positional_gc(nucleotides, 2).into()),
    ])
}

#[cfg(test)]
mod test {
    use feature_types::FeatureValue;

    use super::*;

    fn num(features: &FeatureMap, name: &str) -> f64 {
        features[name].as_f64().unwrap()
    }

    #[test]
    fn composition_counts_and_percentages() {
        let features = composition(b"GGGCATNN");
        assert_eq!(num(&features, "length"), 8.0);
        assert_eq!(num(&features, "g_count"), 3.0);
        assert_eq!(num(&features, "c_count"), 1.0);
        // N is outside the effective alphabet
        assert_eq!(num(&features, "gc_content"), 66.667);
        assert_eq!(num(&features, "at_content"), 33.333);
        assert_eq!(num(&features, "gc_skew"), 0.5);
        assert_eq!(num(&features, "at_skew"), 0.0);
        assert_eq!(num(&features, "at_gc_ratio"), 0.5);
    }

    #[test]
    fn empty_alphabet_yields_zero() {
        for features in [composition(b""), composition(b"NNNN")] {
            for (name, value) in &features {
                if name != "length" {
                    assert_eq!(value, &FeatureValue::Number(0.0), "{name}");
                }
            }
        }
    }

    #[test]
    fn cpg_statistics() {
        let features = nucleotide_frequency(b"ACGCGT");
        assert_eq!(num(&features, "cpg_freq"), 0.4);
        // observed 2, expected 2 * 2 / 6
        assert_eq!(num(&features, "cpg_oe_ratio"), 3.0);
        assert_eq!(num(&features, "frac_a"), 0.167);

        let features = nucleotide_frequency(b"A");
        assert_eq!(num(&features, "cpg_freq"), 0.0);
        assert_eq!(num(&features, "cpg_oe_ratio"), 0.0);
    }

    #[test]
    fn gc_by_codon_position() {
        let features = gc_content(b"GAAGATGCC");
        assert_eq!(num(&features, "gc_fraction"), 0.556);
        assert_eq!(num(&features, "gc_pos1"), 1.0);
        assert_eq!(num(&features, "gc_pos2"), 0.333);
        assert_eq!(num(&features, "gc_pos3"), 0.333);
    }
}
