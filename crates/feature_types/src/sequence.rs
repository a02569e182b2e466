// Copyright 2021-2024 SecureDNA Stiftung (SecureDNA Foundation) <licensing@securedna.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One uploaded sequence. Identity is `id`; the sequence is never modified
/// after parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceInput {
    pub id: String,
    pub sequence: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotations: Option<BTreeMap<String, String>>,
}

impl SequenceInput {
    pub fn new(id: impl Into<String>, sequence: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            sequence: sequence.into(),
            name: None,
            annotations: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn kind(&self) -> SequenceKind {
        SequenceKind::detect(&self.sequence)
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }
}

/// Whether a sequence is read as nucleotides or as amino acids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SequenceKind {
    #[serde(rename = "nucleotide")]
    Nucleotide,
    #[serde(rename = "protein")]
    Protein,
}

serde_plain::derive_display_from_serialize!(SequenceKind);

impl SequenceKind {
    /// A sequence is nucleotide when every character is an IUPAC nucleotide
    /// code (either case) or a gap; anything else is read as protein.
    ///
    /// Many IUPAC ambiguity codes are also amino acid letters, so a protein
    /// made up only of those letters is read as nucleotide.
    pub fn detect(sequence: &str) -> Self {
        let is_nucleotide = sequence.bytes().all(|b| {
            matches!(
                b.to_ascii_uppercase(),
                b'A' | b'C'
                    | b'G'
                    | b'T'
                    | b'U'
                    | b'N'
                    | b'R'
                    | b'Y'
                    | b'K'
                    | b'M'
                    | b'S'
                    | b'W'
                    | b'B'
                    | b'D'
                    | b'H'
                    | b'V'
                    | b'-'
                    | b'.'
            )
        });
        if is_nucleotide {
            Self::Nucleotide
        } else {
            Self::Protein
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn detects_dna_and_rna() {
        assert_eq!(SequenceKind::detect("ATGCATGC"), SequenceKind::Nucleotide);
        assert_eq!(SequenceKind::detect("augcaugc"), SequenceKind::Nucleotide);
        assert_eq!(SequenceKind::detect("ATGNNNRY-GC"), SequenceKind::Nucleotide);
        assert_eq!(SequenceKind::detect(""), SequenceKind::Nucleotide);
    }

    #[test]
    fn detects_protein() {
        assert_eq!(SequenceKind::detect("MVLTIYPDELVQIVSD"), SequenceKind::Protein);
        assert_eq!(SequenceKind::detect("MVLTIYPDELVQIVSD*"), SequenceKind::Protein);
    }

    #[test]
    fn optional_fields_are_skipped() {
        let input = SequenceInput::new("seq1", "ATG");
        let json = serde_json::to_string(&input).unwrap();
        assert_eq!(json, r#"{"id":"seq1","sequence":"ATG"}"#);

        let parsed: SequenceInput =
            serde_json::from_str(r#"{"id":"s","sequence":"AT","name":"gene","annotations":{"k":"v"}}"#)
                .unwrap();
        assert_eq!(parsed.name.as_deref(), Some("gene"));
        assert_eq!(parsed.annotations.unwrap()["k"], "v");
    }
}
