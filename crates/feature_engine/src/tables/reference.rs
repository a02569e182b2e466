// Copyright 2021-2024 SecureDNA Stiftung (SecureDNA Foundation) <licensing@securedna.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

use once_cell::sync::Lazy;

use super::Codon;

pub const DEFAULT_REFERENCE_SET: &str = "ecoli_heg";

/// Low-usage codons in *E. coli*.
pub const DEFAULT_RARE_CODONS: [&str; 8] = ["AGA", "AGG", "CGA", "CGG", "ATA", "CTA", "CCC", "GGA"];

/// Relative adaptiveness of each codon in *E. coli* highly expressed genes
/// (Sharp & Li 1987). Stop codons have no weight.
const ECOLI_HEG: [(&str, f64); 61] = [
    ("TTT", 0.296),
    ("TTC", 1.000),
    ("TTA", 0.020),
    ("TTG", 0.020),
    ("CTT", 0.042),
    ("CTC", 0.037),
    ("CTA", 0.007),
    ("CTG", 1.000),
    ("ATT", 0.185),
    ("ATC", 1.000),
    ("ATA", 0.003),
    ("ATG", 1.000),
    ("GTT", 1.000),
    ("GTC", 0.066),
    ("GTA", 0.495),
    ("GTG", 0.221),
    ("TCT", 1.000),
    ("TCC", 0.744),
    ("TCA", 0.077),
    ("TCG", 0.017),
    ("AGT", 0.085),
    ("AGC", 0.410),
    ("CCT", 0.070),
    ("CCC", 0.012),
    ("CCA", 0.135),
    ("CCG", 1.000),
    ("ACT", 0.965),
    ("ACC", 1.000),
    ("ACA", 0.076),
    ("ACG", 0.099),
    ("GCT", 1.000),
    ("GCC", 0.122),
    ("GCA", 0.586),
    ("GCG", 0.424),
    ("TAT", 0.239),
    ("TAC", 1.000),
    ("CAT", 0.291),
    ("CAC", 1.000),
    ("CAA", 0.124),
    ("CAG", 1.000),
    ("AAT", 0.051),
    ("AAC", 1.000),
    ("AAA", 1.000),
    ("AAG", 0.253),
    ("GAT", 0.434),
    ("GAC", 1.000),
    ("GAA", 1.000),
    ("GAG", 0.259),
    ("TGT", 0.500),
    ("TGC", 1.000),
    ("TGG", 1.000),
    ("CGT", 1.000),
    ("CGC", 0.356),
    ("CGA", 0.004),
    ("CGG", 0.004),
    ("AGA", 0.004),
    ("AGG", 0.002),
    ("GGT", 1.000),
    ("GGC", 0.724),
    ("GGA", 0.010),
    ("GGG", 0.019),
];

/// A codon usage weight table for CAI.
#[derive(Debug)]
pub struct ReferenceSet {
    pub id: &'static str,
    aliases: &'static [&'static str],
    weights: [Option<f64>; 64],
}

impl ReferenceSet {
    fn from_table(
        id: &'static str,
        aliases: &'static [&'static str],
        table: &[(&str, f64)],
    ) -> Self {
        let mut weights = [None; 64];
        for (triplet, weight) in table {
            if let Some(codon) = Codon::from_triplet(triplet.as_bytes()) {
                weights[codon.index()] = Some(*weight);
            }
        }
        Self {
            id,
            aliases,
            weights,
        }
    }

    pub fn weight(&self, codon: Codon) -> Option<f64> {
        self.weights[codon.index()]
    }

    /// Looks up a built-in reference set by id or alias, case-insensitively.
    pub fn find(name: &str) -> Option<&'static ReferenceSet> {
        REFERENCE_SETS.iter().find(|set| {
            set.id.eq_ignore_ascii_case(name)
                || set.aliases.iter().any(|alias| alias.eq_ignore_ascii_case(name))
        })
    }

    pub fn default_set() -> &'static ReferenceSet {
        &REFERENCE_SETS[0]
    }
}

static REFERENCE_SETS: Lazy<[ReferenceSet; 1]> =
    Lazy::new(|| [ReferenceSet::from_table(DEFAULT_REFERENCE_SET, &["ecoli"], &ECOLI_HEG)]);
