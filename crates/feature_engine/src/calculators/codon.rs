// Copyright 2021-2024 SecureDNA Stiftung (SecureDNA Foundation) <licensing@securedna.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Codon usage bias: ENC, CAI, RSCU, RCBS, DCBS, CPB, FOP and rare codon
//! frequency.

use std::collections::HashMap;

use feature_types::{FeatureMap, FeatureValue};

use super::{feature_map, ratio, PanelContext};
use crate::tables::{amino_acid_families, Codon, ReferenceSet};

pub const ENC_MIN: f64 = 20.0;
pub const ENC_MAX: f64 = 61.0;

/// Scaling from rare codon frequency to stalling propensity. A linear
/// heuristic with no biological derivation.
const STALLING_SCALE: f64 = 1.5;

fn codon_counts(codons: &[Codon]) -> [usize; 64] {
    let mut counts = [0; 64];
    for codon in codons {
        counts[codon.index()] += 1;
    }
    counts
}

/// Wright's homozygosity `F = (n·Σp² − 1) / (n − 1)` of one synonymous
/// family. `None` when the family has fewer than 2 observations or `F` is
/// not positive.
fn homozygosity(family: &[Codon], counts: &[usize; 64]) -> Option<f64> {
    let n: usize = family.iter().map(|c| counts[c.index()]).sum();
    if n < 2 {
        return None;
    }
    let n = n as f64;
    let sum_p2: f64 = family
        .iter()
        .map(|c| {
            let p = counts[c.index()] as f64 / n;
            p * p
        })
        .sum();
    let f = (n * sum_p2 - 1.0) / (n - 1.0);
    (f > 0.0).then_some(f)
}

/// Effective number of codons (Wright 1990), in `[20, 61]`.
///
/// Families are grouped by degeneracy. Each group contributes its family
/// count divided by the mean homozygosity of its qualifying families, or,
/// when none qualifies, its unbiased value (family count × degeneracy).
/// Met and Trp contribute 1 each, so no data at all yields exactly 61.
pub fn enc(codons: &[Codon]) -> f64 {
    let counts = codon_counts(codons);
    let mut degeneracies: Vec<usize> = amino_acid_families().map(|(_, c)| c.len()).collect();
    degeneracies.sort_unstable();
    degeneracies.dedup();

    let mut total = 0.0;
    for degeneracy in degeneracies {
        let families: Vec<&[Codon]> = amino_acid_families()
            .map(|(_, codons)| codons)
            .filter(|codons| codons.len() == degeneracy)
            .collect();
        let family_count = families.len() as f64;
        if degeneracy == 1 {
            total += family_count;
            continue;
        }
        let f_values: Vec<f64> = families
            .iter()
            .filter_map(|family| homozygosity(family, &counts))
            .collect();
        total += if f_values.is_empty() {
            family_count * degeneracy as f64
        } else {
            let mean_f = f_values.iter().sum::<f64>() / f_values.len() as f64;
            family_count / mean_f
        };
    }
    total.clamp(ENC_MIN, ENC_MAX)
}

/// Codon adaptation index (Sharp & Li 1987): the geometric mean weight of
/// the codons the reference set weighs above zero. 0 when none does.
pub fn cai(codons: &[Codon], reference: &ReferenceSet) -> f64 {
    let logs: Vec<f64> = codons
        .iter()
        .filter_map(|codon| reference.weight(*codon))
        .filter(|weight| *weight > 0.0)
        .map(f64::ln)
        .collect();
    if logs.is_empty() {
        return 0.0;
    }
    (logs.iter().sum::<f64>() / logs.len() as f64).exp()
}

/// Relative synonymous codon usage of each observed sense codon, in TCAG
/// order. Unobserved codons are absent rather than 0.
pub fn rscu(codons: &[Codon]) -> Vec<(Codon, f64)> {
    let counts = codon_counts(codons);
    let mut values = vec![];
    for (_, family) in amino_acid_families() {
        let family_total: usize = family.iter().map(|c| counts[c.index()]).sum();
        if family_total == 0 {
            continue;
        }
        for codon in family {
            let count = counts[codon.index()];
            if count > 0 {
                let value = count as f64 / family_total as f64 * family.len() as f64;
                values.push((*codon, value));
            }
        }
    }
    values.sort_by_key(|(codon, _)| *codon);
    values
}

/// Counts of T, C, A and G at each of the three codon positions.
fn position_counts(codons: &[Codon]) -> [[usize; 4]; 3] {
    let mut counts = [[0; 4]; 3];
    for codon in codons {
        for (position, base) in base_indices(*codon).into_iter().enumerate() {
            counts[position][base] += 1;
        }
    }
    counts
}

/// TCAG indices of a codon's bases, following its table layout.
fn base_indices(codon: Codon) -> [usize; 3] {
    let i = codon.index();
    [i / 16, (i / 4) % 4, i % 4]
}

/// Observed frequency of each codon over the frequency expected from its
/// bases' positional frequencies. `None` for codons that do not occur.
fn observed_over_expected(codons: &[Codon]) -> [Option<f64>; 64] {
    let mut ratios = [None; 64];
    if codons.is_empty() {
        return ratios;
    }
    let n = codons.len() as f64;
    let counts = codon_counts(codons);
    let positions = position_counts(codons);
    for codon in Codon::all() {
        let count = counts[codon.index()];
        if count == 0 {
            continue;
        }
        let expected: f64 = base_indices(codon)
            .into_iter()
            .zip(&positions)
            .map(|(base, at)| at[base] as f64 / n)
            .product();
        ratios[codon.index()] = Some(count as f64 / n / expected);
    }
    ratios
}

/// Relative codon bias score (Roymondal et al. 2009): the geometric mean of
/// each codon's observed over expected frequency, minus 1. 0 for no codons.
pub fn rcbs(codons: &[Codon]) -> f64 {
    if codons.is_empty() {
        return 0.0;
    }
    let ratios = observed_over_expected(codons);
    let log_sum: f64 = codons
        .iter()
        .filter_map(|codon| ratios[codon.index()])
        .map(f64::ln)
        .sum();
    (log_sum / codons.len() as f64).exp() - 1.0
}

/// Directional codon bias score (Sabi & Tuller 2014): the mean over codons of
/// `max(r, 1/r)`, `r` being the codon's observed over expected frequency.
pub fn dcbs(codons: &[Codon]) -> f64 {
    let ratios = observed_over_expected(codons);
    let total: f64 = codons
        .iter()
        .filter_map(|codon| ratios[codon.index()])
        .map(|r| r.max(1.0 / r))
        .sum();
    ratio(total, codons.len() as f64)
}

/// Codon pair bias (Coleman et al. 2008) with the sequence as its own
/// reference: the mean log ratio of each adjacent sense codon pair's count
/// to the count expected from its codons' and amino acids' counts.
/// 0 when there are no such pairs.
pub fn cpb(codons: &[Codon]) -> f64 {
    let pairs: Vec<(Codon, Codon)> = codons
        .windows(2)
        .filter_map(|pair| match pair {
            [a, b] if !a.is_stop() && !b.is_stop() => Some((*a, *b)),
            _ => None,
        })
        .collect();
    if pairs.is_empty() {
        return 0.0;
    }

    let counts = codon_counts(codons);
    let mut aa_counts: HashMap<u8, usize> = HashMap::new();
    for codon in codons.iter().filter(|codon| !codon.is_stop()) {
        *aa_counts.entry(codon.amino_acid()).or_default() += 1;
    }
    let mut pair_counts: HashMap<(Codon, Codon), usize> = HashMap::new();
    let mut aa_pair_counts: HashMap<(u8, u8), usize> = HashMap::new();
    for (a, b) in &pairs {
        *pair_counts.entry((*a, *b)).or_default() += 1;
        *aa_pair_counts
            .entry((a.amino_acid(), b.amino_acid()))
            .or_default() += 1;
    }

    // every pair's codons, amino acids and amino acid pair were counted above
    let count_of = |map: &HashMap<u8, usize>, aa: u8| map.get(&aa).copied().unwrap_or(0) as f64;
    let score = |a: Codon, b: Codon| {
        let observed = pair_counts.get(&(a, b)).copied().unwrap_or(0) as f64;
        let aa_pair = aa_pair_counts
            .get(&(a.amino_acid(), b.amino_acid()))
            .copied()
            .unwrap_or(0) as f64;
        let expected = (counts[a.index()] * counts[b.index()]) as f64
            / (count_of(&aa_counts, a.amino_acid()) * count_of(&aa_counts, b.amino_acid()))
            * aa_pair;
        (observed / expected).ln()
    };
    pairs.iter().map(|(a, b)| score(*a, *b)).sum::<f64>() / pairs.len() as f64
}

/// Frequency of optimal codons (Ikemura 1981): the share of codons from
/// multi-codon families whose reference weight is 1. 0 when none counts.
pub fn fop(codons: &[Codon], reference: &ReferenceSet) -> f64 {
    let weights: Vec<f64> = codons
        .iter()
        .filter(|codon| codon.family_size() > 1)
        .filter_map(|codon| reference.weight(*codon))
        .collect();
    let optimal = weights.iter().filter(|weight| **weight >= 1.0).count();
    ratio(optimal as f64, weights.len() as f64)
}

pub(super) fn codon_usage(codons: &[Codon], reference: &ReferenceSet) -> FeatureMap {
    let rscu_values = rscu(codons);
    let rscu_mean = (!rscu_values.is_empty())
        .then(|| rscu_values.iter().map(|(_, v)| v).sum::<f64>() / rscu_values.len() as f64);

    let mut features = feature_map([
        ("codon_count", codons.len().into()),
        ("enc", enc(codons).into()),
        ("cai", cai(codons, reference).into()),
        ("rscu_mean", rscu_mean.into()),
        ("rcbs", rcbs(codons).into()),
        ("dcbs", dcbs(codons).into()),
        ("cpb", cpb(codons).into()),
        ("fop", fop(codons, reference).into()),
    ]);
    for (codon, value) in rscu_values {
        features.insert(format!("rscu_{codon}"), FeatureValue::number(value));
    }
    features
}

pub(super) fn rare_codons(codons: &[Codon], ctx: &PanelContext) -> FeatureMap {
    let rare = codons.iter().filter(|codon| ctx.is_rare(**codon)).count();
    let frequency = ratio(rare as f64, codons.len() as f64);
    feature_map([
        ("rare_codon_count", rare.into()),
        ("rare_codon_frequency", frequency.into()),
        ("stalling_propensity", (frequency * STALLING_SCALE).into()),
    ])
}
