// Copyright 2021-2024 SecureDNA Stiftung (SecureDNA Foundation) <licensing@securedna.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Feature panels: their identifiers, per-request settings, and the registry
//! describing what each panel computes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A named, independently enabled group of feature calculators.
///
/// Ids are snake_case. The camelCase ids of older clients are accepted as
/// aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PanelKind {
    #[serde(rename = "sequence", alias = "composition")]
    Sequence,
    #[serde(rename = "nucleotide_frequency", alias = "nucleotideFrequency")]
    NucleotideFrequency,
    #[serde(rename = "gc_content", alias = "gcContent")]
    GcContent,
    #[serde(rename = "codon_usage", alias = "codonUsage")]
    CodonUsage,
    #[serde(rename = "cai")]
    Cai,
    #[serde(rename = "rare_codons", alias = "rareCodons")]
    RareCodons,
    #[serde(rename = "mrna_folding", alias = "mrnaFolding", alias = "structure_rna")]
    MrnaFolding,
    #[serde(rename = "chemical")]
    Chemical,
    #[serde(rename = "disorder")]
    Disorder,
    #[serde(rename = "structure")]
    Structure,
    #[serde(rename = "motif")]
    Motif,
}

serde_plain::derive_display_from_serialize!(PanelKind);
serde_plain::derive_fromstr_from_deserialize!(PanelKind);

impl PanelKind {
    pub const ALL: [PanelKind; 11] = [
        Self::Sequence,
        Self::NucleotideFrequency,
        Self::GcContent,
        Self::CodonUsage,
        Self::Cai,
        Self::RareCodons,
        Self::MrnaFolding,
        Self::Chemical,
        Self::Disorder,
        Self::Structure,
        Self::Motif,
    ];

    /// Parses a panel id or one of its aliases. Unrecognized ids yield `None`.
    pub fn from_id(id: &str) -> Option<Self> {
        id.parse().ok()
    }

    /// Whether the panel reads amino acids (translating nucleotide input
    /// first) rather than nucleotides.
    pub fn reads_protein(&self) -> bool {
        matches!(self, Self::Chemical | Self::Disorder | Self::Structure)
    }
}

/// Per-request settings for one panel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PanelSetting {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<BTreeMap<String, serde_json::Value>>,
}

impl PanelSetting {
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            params: None,
        }
    }

    pub fn param(&self, key: &str) -> Option<&serde_json::Value> {
        self.params.as_ref()?.get(key)
    }
}

/// Panel settings keyed by panel id.
///
/// The map is open: ids that no registry knows are kept so that callers can
/// see what was requested, but they compute nothing. The older fixed-shape
/// record (`{"sequence": {...}, "codonUsage": {...}}`) is the same JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PanelConfig(pub BTreeMap<String, PanelSetting>);

impl PanelConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience constructor enabling each of `kinds` with no params.
    pub fn enabling(kinds: impl IntoIterator<Item = PanelKind>) -> Self {
        let mut config = Self::new();
        for kind in kinds {
            config.set(kind.to_string(), PanelSetting::enabled());
        }
        config
    }

    pub fn set(&mut self, id: impl Into<String>, setting: PanelSetting) -> &mut Self {
        self.0.insert(id.into(), setting);
        self
    }

    pub fn enabled_ids(&self) -> impl Iterator<Item = (&str, &PanelSetting)> {
        self.0
            .iter()
            .filter(|(_, setting)| setting.enabled)
            .map(|(id, setting)| (id.as_str(), setting))
    }

    pub fn any_enabled(&self) -> bool {
        self.enabled_ids().next().is_some()
    }
}

/// Catalog entry for one panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelDescriptor {
    pub id: PanelKind,
    pub name: String,
    pub description: String,
    pub features: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Panels that are not windowable are computed once per sequence, even
    /// in windowed mode.
    #[serde(default = "default_windowable")]
    pub windowable: bool,
}

fn default_windowable() -> bool {
    true
}

/// Enabled panels of a request, matched against a registry.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPanels<'a> {
    /// Recognized panels, in registry order.
    pub known: Vec<(&'a PanelDescriptor, &'a PanelSetting)>,
    /// Enabled ids that the registry does not know.
    pub unknown: Vec<&'a str>,
}

impl ResolvedPanels<'_> {
    pub fn kinds(&self) -> Vec<PanelKind> {
        self.known.iter().map(|(desc, _)| desc.id).collect()
    }
}

/// The single list of panels every part of the system agrees on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelRegistry {
    pub panels: Vec<PanelDescriptor>,
}

impl PanelRegistry {
    pub fn get(&self, kind: PanelKind) -> Option<&PanelDescriptor> {
        self.panels.iter().find(|p| p.id == kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PanelDescriptor> {
        self.panels.iter()
    }

    pub fn len(&self) -> usize {
        self.panels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.panels.is_empty()
    }

    /// Matches the enabled entries of `config` against this registry.
    /// An id enabled twice under different aliases is computed once.
    pub fn resolve<'a>(&'a self, config: &'a PanelConfig) -> ResolvedPanels<'a> {
        let mut enabled: BTreeMap<PanelKind, &PanelSetting> = BTreeMap::new();
        let mut unknown = vec![];
        for (id, setting) in config.enabled_ids() {
            match PanelKind::from_id(id).filter(|kind| self.get(*kind).is_some()) {
                Some(kind) => {
                    enabled.entry(kind).or_insert(setting);
                }
                None => unknown.push(id),
            }
        }

        let known = self
            .panels
            .iter()
            .filter_map(|desc| enabled.get(&desc.id).map(|setting| (desc, *setting)))
            .collect();
        ResolvedPanels { known, unknown }
    }

    /// The panels this engine ships with.
    pub fn builtin() -> Self {
        fn panel(
            id: PanelKind,
            name: &str,
            description: &str,
            features: &[&str],
            keywords: &[&str],
        ) -> PanelDescriptor {
            PanelDescriptor {
                id,
                name: name.into(),
                description: description.into(),
                features: features.iter().map(|&f| f.into()).collect(),
                keywords: keywords.iter().map(|&k| k.into()).collect(),
                windowable: id != PanelKind::Motif,
            }
        }

        Self {
            panels: vec![
                panel(
                    PanelKind::Sequence,
                    "Sequence Composition",
                    "Base counts, GC/AT content and strand skews",
                    &[
                        "length",
                        "a_count",
                        "t_count",
                        "g_count",
                        "c_count",
                        "gc_content",
                        "at_content",
                        "gc_skew",
                        "at_skew",
                        "at_gc_ratio",
                    ],
                    &["composition", "gc", "at", "skew", "base", "length"],
                ),
                panel(
                    PanelKind::NucleotideFrequency,
                    "Nucleotide Frequency",
                    "Per-base fractions and CpG dinucleotide usage",
                    &["frac_a", "frac_c", "frac_g", "frac_t", "cpg_freq", "cpg_oe_ratio"],
                    &["nucleotide", "frequency", "cpg", "methylation", "dinucleotide"],
                ),
                panel(
                    PanelKind::GcContent,
                    "GC Content",
                    "GC fraction overall and per codon position",
                    &["gc_fraction", "gc_pos1", "gc_pos2", "gc_pos3"],
                    &["gc", "gc3", "wobble", "thermostability"],
                ),
                panel(
                    PanelKind::CodonUsage,
                    "Codon Usage Bias",
                    "Effective number of codons, adaptation index and relative synonymous codon usage",
                    &[
                        "codon_count",
                        "enc",
                        "cai",
                        "rscu_mean",
                        "rscu_<CODON>",
                        "rcbs",
                        "dcbs",
                        "cpb",
                        "fop",
                    ],
                    &["codon", "bias", "usage", "synonymous", "expression", "enc", "rscu"],
                ),
                panel(
                    PanelKind::Cai,
                    "Codon Adaptation Index",
                    "Adaptation of codon usage to a highly expressed reference gene set",
                    &["cai"],
                    &["cai", "adaptation", "expression", "translation", "optimization"],
                ),
                panel(
                    PanelKind::RareCodons,
                    "Rare Codons",
                    "Frequency of low-usage codons and an approximate ribosome stalling score",
                    &["rare_codon_count", "rare_codon_frequency", "stalling_propensity"],
                    &["rare", "stalling", "ribosome", "pausing", "elongation", "translation"],
                ),
                panel(
                    PanelKind::MrnaFolding,
                    "mRNA Folding",
                    "Approximate folding energy and dinucleotide structure entropy (heuristic, not a folding model)",
                    &["mfe_estimate", "mfe_per_nt", "structure_entropy"],
                    &["mrna", "folding", "mfe", "secondary", "stability", "rna"],
                ),
                panel(
                    PanelKind::Chemical,
                    "Chemical Properties",
                    "Physicochemical properties of the encoded protein",
                    &[
                        "protein_length",
                        "molecular_weight",
                        "gravy",
                        "aromaticity",
                        "aliphatic_index",
                        "isoelectric_point",
                        "net_charge_per_residue",
                        "instability_index",
                        "average_flexibility",
                        "helix_frac",
                        "turn_frac",
                        "sheet_frac",
                        "molar_extinction_reduced",
                        "molar_extinction_cystine",
                    ],
                    &["chemical", "hydrophobicity", "charge", "solubility", "weight", "pi", "stability", "extinction"],
                ),
                panel(
                    PanelKind::Disorder,
                    "Disorder Prediction",
                    "Composition-based intrinsic disorder propensity of the encoded protein",
                    &[
                        "disorder_propensity",
                        "disorder_promoting_fraction",
                        "order_promoting_fraction",
                    ],
                    &["disorder", "unstructured", "flexible", "idp", "aggregation"],
                ),
                panel(
                    PanelKind::Structure,
                    "Structure Features",
                    "Chou-Fasman secondary structure propensities of the encoded protein",
                    &["helix_propensity", "sheet_propensity", "coil_propensity"],
                    &["structure", "helix", "sheet", "coil", "folding", "secondary"],
                ),
                panel(
                    PanelKind::Motif,
                    "Motif Analysis",
                    "Counts of regulatory and translational motifs over the whole sequence",
                    &["motif_count", "motif_density", "top_motif", "motif_<name>"],
                    &["motif", "promoter", "kozak", "shine", "dalgarno", "tata", "polyadenylation", "regulatory"],
                ),
            ],
        }
    }
}

impl Default for PanelRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn legacy_ids_are_aliases() {
        assert_eq!(PanelKind::from_id("codonUsage"), Some(PanelKind::CodonUsage));
        assert_eq!(PanelKind::from_id("codon_usage"), Some(PanelKind::CodonUsage));
        assert_eq!(PanelKind::from_id("composition"), Some(PanelKind::Sequence));
        assert_eq!(PanelKind::from_id("mrnaFolding"), Some(PanelKind::MrnaFolding));
        assert_eq!(PanelKind::from_id("astrology"), None);
        assert_eq!(PanelKind::CodonUsage.to_string(), "codon_usage");
    }

    #[test]
    fn builtin_registry_covers_every_panel_once() {
        let registry = PanelRegistry::builtin();
        assert_eq!(registry.len(), PanelKind::ALL.len());
        for kind in PanelKind::ALL {
            assert!(registry.get(kind).is_some(), "{kind} missing");
        }
        assert!(!registry.get(PanelKind::Motif).unwrap().windowable);
        assert!(registry.get(PanelKind::Sequence).unwrap().windowable);
    }

    #[test]
    fn fixed_shape_record_parses_as_map() {
        let config: PanelConfig = serde_json::from_str(
            r#"{
                "sequence": {"enabled": true},
                "chemical": {"enabled": false},
                "codonUsage": {"enabled": true, "params": {"x": 1}},
                "quantum": {"enabled": true}
            }"#,
        )
        .unwrap();
        assert!(config.any_enabled());

        let registry = PanelRegistry::builtin();
        let resolved = registry.resolve(&config);
        assert_eq!(
            resolved.kinds(),
            vec![PanelKind::Sequence, PanelKind::CodonUsage]
        );
        assert_eq!(resolved.unknown, vec!["quantum"]);
        let (_, codon_setting) = resolved.known[1];
        assert_eq!(codon_setting.param("x"), Some(&serde_json::json!(1)));
    }

    #[test]
    fn aliases_enabled_twice_resolve_once() {
        let config = {
            let mut config = PanelConfig::new();
            config.set("codonUsage", PanelSetting::enabled());
            config.set("codon_usage", PanelSetting::enabled());
            config
        };
        let registry = PanelRegistry::builtin();
        assert_eq!(registry.resolve(&config).kinds(), vec![PanelKind::CodonUsage]);
    }

    #[test]
    fn disabled_only_is_empty_selection() {
        let mut config = PanelConfig::new();
        config.set("sequence", PanelSetting::default());
        assert!(!config.any_enabled());
        assert!(!PanelConfig::new().any_enabled());
    }

    #[test]
    fn registry_round_trips_through_json() {
        let registry = PanelRegistry::builtin();
        let json = serde_json::to_string(&registry).unwrap();
        let parsed: PanelRegistry = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, registry);
    }
}
