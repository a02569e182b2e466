// Copyright 2021-2024 SecureDNA Stiftung (SecureDNA Foundation) <licensing@securedna.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

/// Per-residue scales used by the protein panels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Residue {
    pub letter: u8,
    /// Average mass of the free amino acid, in Da.
    pub mass: f64,
    /// Kyte-Doolittle hydropathy.
    pub hydropathy: f64,
    /// TOP-IDP disorder propensity (Campen et al. 2008).
    pub top_idp: f64,
    /// Chou-Fasman helix, sheet and turn propensities.
    pub helix: f64,
    pub sheet: f64,
    pub turn: f64,
    /// Normalized B-factor flexibility (Vihinen et al. 1994).
    pub flexibility: f64,
}

const fn r(
    letter: u8,
    mass: f64,
    hydropathy: f64,
    top_idp: f64,
    helix: f64,
    sheet: f64,
    turn: f64,
    flexibility: f64,
) -> Residue {
    Residue {
        letter,
        mass,
        hydropathy,
        top_idp,
        helix,
        sheet,
        turn,
        flexibility,
    }
}

pub static RESIDUES: [Residue; 20] = [
    r(b'A', 89.0935, 1.8, 0.06, 1.42, 0.83, 0.66, 0.984),
    r(b'R', 174.2017, -4.5, 0.180, 0.98, 0.93, 0.95, 1.008),
    r(b'N', 132.1184, -3.5, 0.007, 0.67, 0.89, 1.56, 1.048),
    r(b'D', 133.1032, -3.5, 0.192, 1.01, 0.54, 1.46, 1.068),
    r(b'C', 121.1590, 2.5, 0.02, 0.70, 1.19, 1.19, 0.906),
    r(b'Q', 146.1451, -3.5, 0.318, 1.11, 1.10, 0.98, 1.037),
    r(b'E', 147.1299, -3.5, 0.736, 1.51, 0.37, 0.74, 1.094),
    r(b'G', 75.0669, -0.4, 0.166, 0.57, 0.75, 1.56, 1.031),
    r(b'H', 155.1552, -3.2, 0.303, 1.00, 0.87, 0.95, 0.950),
    r(b'I', 131.1736, 4.5, -0.486, 1.08, 1.60, 0.47, 0.927),
    r(b'L', 131.1736, 3.8, -0.326, 1.21, 1.30, 0.59, 0.935),
    r(b'K', 146.1882, -3.9, 0.586, 1.14, 0.74, 1.01, 1.102),
    r(b'M', 149.2124, 1.9, -0.397, 1.45, 1.05, 0.60, 0.952),
    r(b'F', 165.1900, 2.8, -0.697, 1.13, 1.38, 0.60, 0.915),
    r(b'P', 115.1310, -1.6, 0.987, 0.57, 0.55, 1.52, 1.049),
    r(b'S', 105.0930, -0.8, 0.341, 0.77, 0.75, 1.43, 1.046),
    r(b'T', 119.1197, -0.7, 0.059, 0.83, 1.19, 0.96, 0.997),
    r(b'W', 204.2262, -0.9, -0.884, 1.08, 1.37, 0.96, 0.904),
    r(b'Y', 181.1894, -1.3, -0.510, 0.69, 1.47, 1.14, 0.929),
    r(b'V', 117.1469, 4.2, -0.121, 1.06, 1.70, 0.50, 0.931),
];

/// The scales for a one-letter amino acid code, in either case.
/// Non-standard letters (`X`, `B`, `Z`, `U`, ...) have none.
pub fn residue(letter: u8) -> Option<&'static Residue> {
    let letter = letter.to_ascii_uppercase();
    RESIDUES.iter().find(|res| res.letter == letter)
}

/// Row and column order of [`DIWV`].
const DIWV_ORDER: &[u8; 20] = b"ACDEFGHIKLMNPQRSTVWY";

/// Dipeptide instability weight values (Guruprasad et al. 1990), indexed by
/// the first then second residue of the dipeptide.
#[rustfmt::skip]
const DIWV: [[f64; 20]; 20] = [
    // A
    [1.0, 44.94, -7.49, 1.0, 1.0, 1.0, -7.49, 1.0, 1.0, 1.0, 1.0, 1.0, 20.26, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0],
    // C
    [1.0, 1.0, 20.26, 1.0, 1.0, 1.0, 33.6, 1.0, 1.0, 20.26, 33.6, 1.0, 20.26, -6.54, 1.0, 1.0, 33.6, -6.54, 24.68, 1.0],
    // D
    [1.0, 1.0, 1.0, 1.0, -6.54, 1.0, 1.0, 1.0, -7.49, 1.0, 1.0, 1.0, 1.0, 1.0, -6.54, 20.26, -14.03, 1.0, 1.0, 1.0],
    // E
    [1.0, 44.94, 20.26, 33.6, 1.0, 1.0, -6.54, 20.26, 1.0, 1.0, 1.0, 1.0, 20.26, 20.26, 1.0, 20.26, 1.0, 1.0, -14.03, 1.0],
    // F
    [1.0, 1.0, 13.34, 1.0, 1.0, 1.0, 1.0, 1.0, -14.03, 1.0, 1.0, 1.0, 20.26, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 33.601],
    // G
    [-7.49, 1.0, 1.0, -6.54, 1.0, 13.34, 1.0, -7.49, -7.49, 1.0, 1.0, -7.49, 1.0, 1.0, 1.0, 1.0, -7.49, 1.0, 13.34, -7.49],
    // H
    [1.0, 1.0, 1.0, 1.0, -9.37, -9.37, 1.0, 44.94, 24.68, 1.0, 1.0, 24.68, -1.88, 1.0, 1.0, 1.0, -6.54, 1.0, -1.88, 44.94],
    // I
    [1.0, 1.0, 1.0, 44.94, 1.0, 1.0, 13.34, 1.0, -7.49, 20.26, 1.0, 1.0, -1.88, 1.0, 1.0, 1.0, 1.0, -7.49, 1.0, 1.0],
    // K
    [1.0, 1.0, 1.0, 1.0, 1.0, -7.49, 1.0, -7.49, 1.0, -7.49, 33.6, 1.0, -6.54, 24.64, 33.6, 1.0, 1.0, -7.49, 1.0, 1.0],
    // L
    [1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, -7.49, 1.0, 1.0, 1.0, 20.26, 33.6, 20.26, 1.0, 1.0, 1.0, 24.68, 1.0],
    // M
    [13.34, 1.0, 1.0, 1.0, 1.0, 1.0, 58.28, 1.0, 1.0, 1.0, -1.88, 1.0, 44.94, -6.54, -6.54, 44.94, -1.88, 1.0, 1.0, 24.68],
    // N
    [1.0, -1.88, 1.0, 1.0, -14.03, -14.03, 1.0, 44.94, 24.68, 1.0, 1.0, 1.0, -1.88, -6.54, 1.0, 1.0, -7.49, 1.0, -9.37, 1.0],
    // P
    [20.26, -6.54, -6.54, 18.38, 20.26, 1.0, 1.0, 1.0, 1.0, 1.0, -6.54, 1.0, 20.26, 20.26, -6.54, 20.26, 1.0, 20.26, -1.88, 1.0],
    // Q
    [1.0, -6.54, 20.26, 20.26, -6.54, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 20.26, 20.26, 1.0, 44.94, 1.0, -6.54, 1.0, -6.54],
    // R
    [1.0, 1.0, 1.0, 1.0, 1.0, -7.49, 20.26, 1.0, 1.0, 1.0, 1.0, 13.34, 20.26, 20.26, 58.28, 44.94, 1.0, 1.0, 58.28, -6.54],
    // S
    [1.0, 33.6, 1.0, 20.26, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 44.94, 20.26, 20.26, 20.26, 1.0, 1.0, 1.0, 1.0],
    // T
    [1.0, 1.0, 1.0, 20.26, 13.34, -7.49, 1.0, 1.0, 1.0, 1.0, 1.0, -14.03, 1.0, -6.54, 1.0, 1.0, 1.0, 1.0, -14.03, 1.0],
    // V
    [1.0, 1.0, -14.03, 1.0, 1.0, -7.49, 1.0, 1.0, -1.88, 1.0, 1.0, 1.0, 20.26, 1.0, 1.0, 1.0, -7.49, 1.0, 1.0, -6.54],
    // W
    [-14.03, 1.0, 1.0, 1.0, 1.0, -9.37, 24.68, 1.0, 1.0, 13.34, 24.68, 13.34, 1.0, 1.0, 1.0, 1.0, -14.03, -7.49, 1.0, 1.0],
    // Y
    [24.68, 1.0, 24.68, -6.54, 1.0, -7.49, 13.34, 1.0, 1.0, 1.0, 44.94, 1.0, 13.34, 1.0, -15.91, 1.0, -7.49, 1.0, -9.37, 13.34],
];

/// Instability weight of the dipeptide `first second`, for standard
/// residues in either case.
pub fn dipeptide_instability(first: u8, second: u8) -> Option<f64> {
    let position = |letter: u8| {
        let letter = letter.to_ascii_uppercase();
        DIWV_ORDER.iter().position(|l| *l == letter)
    };
    Some(DIWV[position(first)?][position(second)?])
}
