// Copyright 2021-2024 SecureDNA Stiftung (SecureDNA Foundation) <licensing@securedna.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Protein-level panels. Input is a non-empty run of standard one-letter
//! residues, either given directly or translated from nucleotides.

use feature_types::FeatureMap;

use super::feature_map;
use crate::tables::{dipeptide_instability, residue, Residue};

/// Subtracted once per peptide bond.
const WATER_MASS: f64 = 18.01528;

/// Residues that promote (and resist) intrinsic disorder, after Dunker et al.
const DISORDER_PROMOTING: &[u8] = b"ARGQSPEK";
const ORDER_PROMOTING: &[u8] = b"WCFIYVLN";

/// pKa values (EMBOSS).
const PK_N_TERM: f64 = 8.6;
const PK_C_TERM: f64 = 3.6;
const PK_POSITIVE: [(u8, f64); 3] = [(b'K', 10.8), (b'R', 12.5), (b'H', 6.5)];
const PK_NEGATIVE: [(u8, f64); 4] = [(b'D', 3.9), (b'E', 4.1), (b'C', 8.5), (b'Y', 10.1)];

const PH_NEUTRAL: f64 = 7.0;

/// Molar extinction at 280 nm of Trp, Tyr and a cystine (Pace et al. 1995).
const EXTINCTION_W: f64 = 5500.0;
const EXTINCTION_Y: f64 = 1490.0;
const EXTINCTION_CYSTINE: f64 = 125.0;

/// Residues counted towards the helix, turn and sheet fractions.
const HELIX_FORMING: &[u8] = b"VIYFWL";
const TURN_FORMING: &[u8] = b"NPGS";
const SHEET_FORMING: &[u8] = b"EMAL";

/// Flexibility is smoothed over 9 residues, weighting the ends least.
const FLEXIBILITY_WEIGHTS: [f64; 9] = [
    0.25, 0.4375, 0.625, 0.8125, 1.0, 0.8125, 0.625, 0.4375, 0.25,
];

fn scales(residues: &[u8]) -> impl Iterator<Item = &'static Residue> + '_ {
    residues.iter().filter_map(|b| residue(*b))
}

fn mean(residues: &[u8], scale: impl Fn(&Residue) -> f64) -> f64 {
    let values: Vec<f64> = scales(residues).map(scale).collect();
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn fraction_of(residues: &[u8], set: &[u8]) -> f64 {
    let count = residues.iter().filter(|b| set.contains(b)).count();
    count as f64 / residues.len() as f64
}

fn count(residues: &[u8], letter: u8) -> usize {
    residues.iter().filter(|b| **b == letter).count()
}

fn molecular_weight(residues: &[u8]) -> f64 {
    let total: f64 = scales(residues).map(|r| r.mass).sum();
    total - (residues.len().saturating_sub(1)) as f64 * WATER_MASS
}

fn aliphatic_index(residues: &[u8]) -> f64 {
    let n = residues.len() as f64;
    let x = |letter| count(residues, letter) as f64 / n;
    100.0 * (x(b'A') + 2.9 * x(b'V') + 3.9 * (x(b'I') + x(b'L')))
}

/// Net charge of the peptide at `ph` (Henderson-Hasselbalch).
fn net_charge(residues: &[u8], ph: f64) -> f64 {
    let positive = |pk: f64| 1.0 / (1.0 + 10f64.powf(ph - pk));
    let negative = |pk: f64| 1.0 / (1.0 + 10f64.powf(pk - ph));

    let mut charge = positive(PK_N_TERM) - negative(PK_C_TERM);
    for (letter, pk) in PK_POSITIVE {
        charge += count(residues, letter) as f64 * positive(pk);
    }
    for (letter, pk) in PK_NEGATIVE {
        charge -= count(residues, letter) as f64 * negative(pk);
    }
    charge
}

/// The pH of zero net charge, found by bisection.
fn isoelectric_point(residues: &[u8]) -> f64 {
    let (mut low, mut high) = (0.0, 14.0);
    for _ in 0..100 {
        let mid = (low + high) / 2.0;
        if net_charge(residues, mid) > 0.0 {
            low = mid;
        } else {
            high = mid;
        }
        if high - low < 1e-4 {
            break;
        }
    }
    (low + high) / 2.0
}

/// Guruprasad instability index. Proteins above 40 are predicted unstable.
fn instability_index(residues: &[u8]) -> f64 {
    let total: f64 = residues
        .windows(2)
        .filter_map(|pair| dipeptide_instability(pair[0], pair[1]))
        .sum();
    10.0 * total / residues.len() as f64
}

/// Mean of the window-smoothed flexibility profile. 0 for proteins shorter
/// than one window.
fn average_flexibility(residues: &[u8]) -> f64 {
    let weight_sum: f64 = FLEXIBILITY_WEIGHTS.iter().sum();
    let profile: Vec<f64> = residues
        .windows(FLEXIBILITY_WEIGHTS.len())
        .map(|window| {
            scales(window)
                .zip(FLEXIBILITY_WEIGHTS)
                .map(|(r, weight)| r.flexibility * weight)
                .sum::<f64>()
                / weight_sum
        })
        .collect();
    if profile.is_empty() {
        0.0
    } else {
        profile.iter().sum::<f64>() / profile.len() as f64
    }
}

/// Molar extinction coefficients at 280 nm with all cysteines reduced, and
/// with cysteines paired into cystines.
fn molar_extinction(residues: &[u8]) -> (f64, f64) {
    let reduced = count(residues, b'W') as f64 * EXTINCTION_W
        + count(residues, b'Y') as f64 * EXTINCTION_Y;
    let cystines = (count(residues, b'C') / 2) as f64;
    (reduced, reduced + cystines * EXTINCTION_CYSTINE)
}

pub(super) fn chemical(residues: &[u8]) -> FeatureMap {
    let (extinction_reduced, extinction_cystine) = molar_extinction(residues);
    let n = residues.len() as f64;
    feature_map([
        ("protein_length", residues.len().into()),
        ("molecular_weight", molecular_weight(residues).into()),
        ("gravy", mean(residues, |r| r.hydropathy).into()),
        ("aromaticity", fraction_of(residues, b"FWY").into()),
        ("aliphatic_index", aliphatic_index(residues).into()),
        ("isoelectric_point", isoelectric_point(residues).into()),
        (
            "net_charge_per_residue",
            (net_charge(residues, PH_NEUTRAL) / n).into(),
        ),
        ("instability_index", instability_index(residues).into()),
        ("average_flexibility", average_flexibility(residues).into()),
        ("helix_frac", fraction_of(residues, HELIX_FORMING).into()),
        ("turn_frac", fraction_of(residues, TURN_FORMING).into()),
        ("sheet_frac", fraction_of(residues, SHEET_FORMING).into()),
        ("molar_extinction_reduced", extinction_reduced.into()),
        ("molar_extinction_cystine", extinction_cystine.into()),
    ])
}

/// A composition heuristic, not a per-residue disorder predictor.
pub(super) fn disorder(residues: &[u8]) -> FeatureMap {
    feature_map([
        ("disorder_propensity", mean(residues, |r| r.top_idp).into()),
        (
            "disorder_promoting_fraction",
            fraction_of(residues, DISORDER_PROMOTING).into(),
        ),
        (
            "order_promoting_fraction",
            fraction_of(residues, ORDER_PROMOTING).into(),
        ),
    ])
}

/// Mean Chou-Fasman propensities; coil uses the turn parameters.
pub(super) fn structure(residues: &[u8]) -> FeatureMap {
    feature_map([
        ("helix_propensity", mean(residues, |r| r.helix).into()),
        ("sheet_propensity", mean(residues, |r| r.sheet).into()),
        ("coil_propensity", mean(residues, |r| r.turn).into()),
    ])
}
