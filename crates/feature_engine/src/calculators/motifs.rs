// Copyright 2021-2024 SecureDNA Stiftung (SecureDNA Foundation) <licensing@securedna.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

use feature_types::{FeatureMap, FeatureValue};

use super::{feature_map, ratio};

/// A named motif and the patterns that match it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Motif {
    pub name: &'static str,
    pub patterns: &'static [&'static str],
}

/// Scanned on the forward strand only. Ties for the most frequent motif go to
/// the one listed first.
pub const MOTIFS: [Motif; 6] = [
    Motif {
        name: "start_codon",
        patterns: &["ATG"],
    },
    Motif {
        name: "stop_codon",
        patterns: &["TAA", "TAG", "TGA"],
    },
    Motif {
        name: "shine_dalgarno",
        patterns: &["AGGAGG"],
    },
    Motif {
        name: "kozak",
        patterns: &["GCCACCATG"],
    },
    Motif {
        name: "tata_box",
        patterns: &["TATAAA"],
    },
    Motif {
        name: "polya_signal",
        patterns: &["AATAAA"],
    },
];

/// Occurrences of `pattern`, overlapping matches included.
fn count_overlapping(haystack: &[u8], pattern: &[u8]) -> usize {
    if pattern.is_empty() {
        return 0;
    }
    haystack.windows(pattern.len()).filter(|w| *w == pattern).count()
}

pub(super) fn motifs(nucleotides: &[u8]) -> FeatureMap {
    let counts: Vec<(&str, usize)> = MOTIFS
        .iter()
        .map(|motif| {
            let count = motif
                .patterns
                .iter()
                .map(|p| count_overlapping(nucleotides, p.as_bytes()))
                .sum();
            (motif.name, count)
        })
        .collect();

    let total: usize = counts.iter().map(|(_, count)| count).sum();
    let mut top: Option<(&str, usize)> = None;
    for &(name, count) in &counts {
        if count > 0 && top.map_or(true, |(_, best)| count > best) {
            top = Some((name, count));
        }
    }

    let density = ratio(total as f64 * 1000.0, nucleotides.len() as f64);
    let mut features = feature_map([
        ("motif_count", total.into()),
        ("motif_density", density.into()),
        ("top_motif", top.map(|(name, _)| name).into()),
    ]);
    for (name, count) in counts {
        features.insert(format!("motif_{name}"), FeatureValue::from(count));
    }
    features
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn counts_overlapping_matches() {
        assert_eq!(count_overlapping(b"ATGATG", b"ATG"), 2);
        assert_eq!(count_overlapping(b"AAAA", b"AA"), 3);
        assert_eq!(count_overlapping(b"AT", b"ATG"), 0);
    }

    #[test]
    fn motif_features() {
        // two ATG (one inside the Kozak), TGA and TAA, one Kozak, one poly-A
        let features = motifs(b"GCCACCATGAAATAAATG");
        assert_eq!(features["motif_start_codon"], FeatureValue::Number(2.0));
        assert_eq!(features["motif_kozak"], FeatureValue::Number(1.0));
        assert_eq!(features["motif_polya_signal"], FeatureValue::Number(1.0));
        assert_eq!(features["top_motif"], FeatureValue::Text("start_codon".into()));
        let total = features["motif_count"].as_f64().unwrap();
        assert_eq!(
            features["motif_density"].as_f64(),
            Some(feature_types::round3(total * 1000.0 / 18.0))
        );
    }

    #[test]
    fn no_motifs() {
        let features = motifs(b"CCCCCC");
        assert_eq!(features["top_motif"], FeatureValue::Null);
        assert_eq!(features["motif_count"], FeatureValue::Number(0.0));
        assert_eq!(features["motif_density"], FeatureValue::Number(0.0));
    }

    #[test]
    fn ties_go_to_the_first_motif() {
        // one start codon and one stop codon
        let features = motifs(b"ATGCCTAG");
        assert_eq!(features["top_motif"], FeatureValue::Text("start_codon".into()));
    }
}
