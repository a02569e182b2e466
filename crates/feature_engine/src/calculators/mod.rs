// Copyright 2021-2024 SecureDNA Stiftung (SecureDNA Foundation) <licensing@securedna.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-panel feature calculators.
//!
//! Calculators are pure: the same bytes and context always produce the same
//! features, with no clock, randomness or I/O involved. Every numeric value
//! is rounded to 3 decimal places as it is inserted into the feature map.

mod codon;
mod composition;
mod folding;
mod motifs;
mod protein;

use once_cell::unsync::OnceCell;

use feature_types::{ConfigError, FeatureMap, FeatureValue, PanelKind, SequenceKind};

use crate::error::CalculationError;
use crate::tables::{self, residue, Codon, ReferenceSet, DEFAULT_RARE_CODONS};

pub use codon::{cai, enc, rscu};
pub use motifs::MOTIFS;

/// Request-wide settings shared by every calculator invocation.
#[derive(Debug, Clone)]
pub struct PanelContext {
    reference: &'static ReferenceSet,
    rare_codons: [bool; 64],
}

impl Default for PanelContext {
    fn default() -> Self {
        let mut rare_codons = [false; 64];
        for codon in DEFAULT_RARE_CODONS
            .iter()
            .filter_map(|triplet| Codon::from_triplet(triplet.as_bytes()))
        {
            rare_codons[codon.index()] = true;
        }
        Self {
            reference: ReferenceSet::default_set(),
            rare_codons,
        }
    }
}

impl PanelContext {
    /// Builds the context from the request's reference set and the
    /// `rare_codons` panel's `codons` parameter, if given.
    pub fn new(
        reference_set: Option<&str>,
        rare_codons: Option<&serde_json::Value>,
    ) -> Result<Self, ConfigError> {
        let mut ctx = Self::default();
        if let Some(name) = reference_set {
            ctx.reference = ReferenceSet::find(name)
                .ok_or_else(|| ConfigError::UnknownReferenceSet(name.to_owned()))?;
        }
        if let Some(value) = rare_codons {
            ctx.rare_codons = [false; 64];
            for codon in parse_codon_list(value)? {
                ctx.rare_codons[codon.index()] = true;
            }
        }
        Ok(ctx)
    }

    pub fn reference(&self) -> &'static ReferenceSet {
        self.reference
    }

    pub fn is_rare(&self, codon: Codon) -> bool {
        self.rare_codons[codon.index()]
    }
}

/// Parses a JSON array of codon strings.
pub fn parse_codon_list(value: &serde_json::Value) -> Result<Vec<Codon>, ConfigError> {
    let items = value
        .as_array()
        .ok_or_else(|| ConfigError::InvalidCodon(value.to_string()))?;
    items
        .iter()
        .map(|item| {
            item.as_str()
                .and_then(|s| Codon::from_triplet(s.as_bytes()))
                .ok_or_else(|| ConfigError::InvalidCodon(item.to_string()))
        })
        .collect()
}

/// One sequence, or one window of it, as seen by the calculators.
///
/// `kind` is decided from the whole sequence, so a window of a nucleotide
/// sequence is always nucleotide. Derived forms are computed on first use
/// and shared between the panels computed for the unit.
pub struct SequenceUnit<'a> {
    bytes: &'a [u8],
    kind: SequenceKind,
    normalized: OnceCell<Vec<u8>>,
    codons: OnceCell<Vec<Codon>>,
    residues: OnceCell<Vec<u8>>,
}

impl<'a> SequenceUnit<'a> {
    pub fn new(bytes: &'a [u8], kind: SequenceKind) -> Self {
        Self {
            bytes,
            kind,
            normalized: OnceCell::new(),
            codons: OnceCell::new(),
            residues: OnceCell::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Uppercased nucleotides with `U` read as `T`.
    fn nucleotides(&self, panel: PanelKind) -> Result<&[u8], CalculationError> {
        if self.kind != SequenceKind::Nucleotide {
            return Err(CalculationError::NotNucleotide { panel });
        }
        Ok(self.normalized.get_or_init(|| {
            self.bytes
                .iter()
                .map(|b| match b.to_ascii_uppercase() {
                    b'U' => b'T',
                    other => other,
                })
                .collect()
        }))
    }

    fn codons(&self, panel: PanelKind) -> Result<&[Codon], CalculationError> {
        let nucleotides = self.nucleotides(panel)?;
        Ok(self.codons.get_or_init(|| tables::codons(nucleotides)))
    }

    /// Standard residues of a protein, or of the frame 0 translation of a
    /// nucleotide sequence.
    fn residues(&self, panel: PanelKind) -> Result<&[u8], CalculationError> {
        let residues = match self.kind {
            SequenceKind::Protein => self.residues.get_or_init(|| {
                self.bytes
                    .iter()
                    .filter_map(|b| residue(*b).map(|res| res.letter))
                    .collect()
            }),
            SequenceKind::Nucleotide => {
                let codons = self.codons(panel)?;
                self.residues.get_or_init(|| tables::translate(codons))
            }
        };
        if residues.is_empty() {
            return Err(CalculationError::NoResidues { panel });
        }
        Ok(residues)
    }
}

/// Computes one panel's features for one unit.
pub fn compute(
    panel: PanelKind,
    unit: &SequenceUnit<'_>,
    ctx: &PanelContext,
) -> Result<FeatureMap, CalculationError> {
    let features = match panel {
        PanelKind::Sequence => composition::composition(unit.nucleotides(panel)?),
        PanelKind::NucleotideFrequency => {
            composition::nucleotide_frequency(unit.nucleotides(panel)?)
        }
        PanelKind::GcContent => composition::gc_content(unit.nucleotides(panel)?),
        PanelKind::CodonUsage => codon::codon_usage(unit.codons(panel)?, ctx.reference()),
        PanelKind::Cai => feature_map([("cai", cai(unit.codons(panel)?, ctx.reference()).into())]),
        PanelKind::RareCodons => codon::rare_codons(unit.codons(panel)?, ctx),
        PanelKind::MrnaFolding => folding::mrna_folding(unit.nucleotides(panel)?),
        PanelKind::Chemical => protein::chemical(unit.residues(panel)?),
        PanelKind::Disorder => protein::disorder(unit.residues(panel)?),
        PanelKind::Structure => protein::structure(unit.residues(panel)?),
        PanelKind::Motif => motifs::motifs(unit.nucleotides(panel)?),
    };
    Ok(features)
}

fn feature_map<const N: usize>(entries: [(&str, FeatureValue); N]) -> FeatureMap {
    entries
        .into_iter()
        .map(|(name, value)| (name.to_owned(), value))
        .collect()
}

/// `numerator / denominator`, or 0 when the denominator is 0.
fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

#[cfg(test)]
mod test {
    use feature_types::PanelRegistry;

    use super::*;

    fn compute_str(panel: PanelKind, s: &str) -> Result<FeatureMap, CalculationError> {
        let unit = SequenceUnit::new(s.as_bytes(), SequenceKind::detect(s));
        compute(panel, &unit, &PanelContext::default())
    }

    #[test]
    fn features_match_registry_descriptors() {
        let registry = PanelRegistry::builtin();
        for panel in PanelKind::ALL {
            let features = compute_str(panel, "ATGGCTAAAGGAGGTTTATAAATGCCACCATGCGTAA").unwrap();
            let declared = &registry.get(panel).unwrap().features;
            for name in features.keys() {
                let known = declared.contains(name)
                    || (name.starts_with("rscu_") && declared.iter().any(|d| d == "rscu_<CODON>"))
                    || (name.starts_with("motif_") && declared.iter().any(|d| d == "motif_<name>"));
                assert!(known, "{panel} emitted undeclared feature {name}");
            }
        }
    }

    #[test]
    fn nucleotide_panels_reject_protein() {
        assert_eq!(
            compute_str(PanelKind::Sequence, "MVLSPADKTNVKAAW"),
            Err(CalculationError::NotNucleotide {
                panel: PanelKind::Sequence
            })
        );
        assert!(compute_str(PanelKind::Chemical, "MVLSPADKTNVKAAW").is_ok());
    }

    #[test]
    fn protein_panels_need_residues() {
        assert_eq!(
            compute_str(PanelKind::Chemical, "TAATAG"),
            Err(CalculationError::NoResidues {
                panel: PanelKind::Chemical
            })
        );
        assert_eq!(
            compute_str(PanelKind::Disorder, ""),
            Err(CalculationError::NoResidues {
                panel: PanelKind::Disorder
            })
        );
    }

    #[test]
    fn context_rejects_bad_params() {
        assert!(matches!(
            PanelContext::new(Some("martian"), None),
            Err(ConfigError::UnknownReferenceSet(name)) if name == "martian"
        ));
        assert!(matches!(
            PanelContext::new(None, Some(&serde_json::json!(["AGA", "XYZ"]))),
            Err(ConfigError::InvalidCodon(_))
        ));
        assert!(matches!(
            PanelContext::new(None, Some(&serde_json::json!("AGA"))),
            Err(ConfigError::InvalidCodon(_))
        ));

        let ctx = PanelContext::new(Some("ecoli"), Some(&serde_json::json!(["gcu"]))).unwrap();
        assert!(ctx.is_rare(Codon::from_triplet(b"GCT").unwrap()));
        assert!(!ctx.is_rare(Codon::from_triplet(b"AGA").unwrap()));
    }
}
