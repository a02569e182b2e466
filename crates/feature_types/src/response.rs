// Copyright 2021-2024 SecureDNA Stiftung (SecureDNA Foundation) <licensing@securedna.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Extraction results as handed to export, visualization and persistence.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::panels::PanelKind;
use crate::window::WindowType;

/// Magnitudes at or above this are emitted unrounded; scaling them by 1000
/// would leave the exactly representable integer range of an `f64`.
const ROUNDING_LIMIT: f64 = 1e12;

/// Rounds to 3 decimal places, the precision every numeric feature is emitted
/// with. Non-finite and very large values pass through unchanged.
pub fn round3(x: f64) -> f64 {
    if !x.is_finite() || x.abs() >= ROUNDING_LIMIT {
        return x;
    }
    let rounded = (x * 1000.0).round() / 1000.0;
    // Collapse -0.0 so that output never shows a signed zero.
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// A single feature value: a number, a short label, or explicitly absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Number(f64),
    Text(String),
    Null,
}

impl FeatureValue {
    /// A numeric feature, rounded for emission.
    pub fn number(x: f64) -> Self {
        Self::Number(round3(x))
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<f64> for FeatureValue {
    fn from(x: f64) -> Self {
        Self::number(x)
    }
}

impl From<usize> for FeatureValue {
    fn from(x: usize) -> Self {
        Self::number(x as f64)
    }
}

impl From<Option<f64>> for FeatureValue {
    fn from(x: Option<f64>) -> Self {
        x.map_or(Self::Null, Self::number)
    }
}

impl From<Option<&str>> for FeatureValue {
    fn from(s: Option<&str>) -> Self {
        s.map_or(Self::Null, |s| Self::Text(s.to_owned()))
    }
}

pub type FeatureMap = BTreeMap<String, FeatureValue>;

/// Where a windowed row sits in its sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WindowPosition {
    pub start: usize,
    pub end: usize,
    pub window_type: WindowType,
}

impl WindowPosition {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }
}

/// One row of output. Global rows carry no window fields; windowed rows
/// carry all three.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureResult {
    pub sequence_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_start: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_end: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_type: Option<WindowType>,
    pub features: FeatureMap,
}

impl FeatureResult {
    pub fn global(sequence_id: String, sequence_name: Option<String>, features: FeatureMap) -> Self {
        Self {
            sequence_id,
            sequence_name,
            window_start: None,
            window_end: None,
            window_type: None,
            features,
        }
    }

    pub fn windowed(
        sequence_id: String,
        sequence_name: Option<String>,
        position: WindowPosition,
        features: FeatureMap,
    ) -> Self {
        Self {
            sequence_id,
            sequence_name,
            window_start: Some(position.start),
            window_end: Some(position.end),
            window_type: Some(position.window_type),
            features,
        }
    }

    pub fn window(&self) -> Option<WindowPosition> {
        Some(WindowPosition {
            start: self.window_start?,
            end: self.window_end?,
            window_type: self.window_type?,
        })
    }

    pub fn is_windowed(&self) -> bool {
        self.window().is_some()
    }
}

/// A failure confined to one sequence and panel (and possibly one window).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitError {
    pub sequence_id: String,
    pub panel: String,
    pub error: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExtractionMode {
    #[serde(rename = "global")]
    Global,
    #[serde(rename = "windowed")]
    Windowed,
}

serde_plain::derive_display_from_serialize!(ExtractionMode);

/// The window sizes of the enabled scan directions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSizes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    pub total_sequences: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_windows: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_sizes: Option<WindowSizes>,
    pub panels_computed: Vec<PanelKind>,
    pub compute_time_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureExtractionResponse {
    pub success: bool,
    pub mode: ExtractionMode,
    pub results: Vec<FeatureResult>,
    pub metadata: ResponseMetadata,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<UnitError>,
}

impl FeatureExtractionResponse {
    /// Appends the results of a later batch of the same request.
    ///
    /// Results and errors are concatenated in order, counts and timings are
    /// summed, and computed panels are unioned in first-seen order.
    pub fn merge(&mut self, other: FeatureExtractionResponse) {
        self.success &= other.success;
        self.results.extend(other.results);
        self.errors.extend(other.errors);

        let meta = &mut self.metadata;
        let other_meta = other.metadata;
        meta.total_sequences += other_meta.total_sequences;
        meta.total_windows = match (meta.total_windows, other_meta.total_windows) {
            (None, None) => None,
            (a, b) => Some(a.unwrap_or(0) + b.unwrap_or(0)),
        };
        meta.window_sizes = meta.window_sizes.or(other_meta.window_sizes);
        meta.compute_time_ms += other_meta.compute_time_ms;
        for panel in other_meta.panels_computed {
            if !meta.panels_computed.contains(&panel) {
                meta.panels_computed.push(panel);
            }
        }
    }
}

#[cfg(test)]
mod test {
    use quickcheck::quickcheck;

    use super::*;

    quickcheck! {
        fn round3_is_idempotent(x: f64) -> bool {
            let once = round3(x);
            once.is_nan() || round3(once) == once
        }

        fn round3_moves_at_most_half_a_thousandth(x: f64) -> bool {
            !x.is_finite() || (round3(x) - x).abs() <= 0.0005 + f64::EPSILON * 1000.0 * x.abs().max(1.0)
        }
    }

    #[test]
    fn round3_examples() {
        assert_eq!(round3(1.23456), 1.235);
        assert_eq!(round3(-0.0001), 0.0);
        assert_eq!(round3(2.0 / 3.0), 0.667);
        assert!(round3(f64::NAN).is_nan());
        assert_eq!(round3(f64::INFINITY), f64::INFINITY);
    }

    #[test]
    fn feature_values_serialize_untagged() {
        let mut features = FeatureMap::new();
        features.insert("enc".into(), 46.0.into());
        features.insert("rscu_mean".into(), FeatureValue::Null);
        features.insert("top_motif".into(), Some("start_codon").into());
        assert_eq!(
            serde_json::to_value(&features).unwrap(),
            serde_json::json!({"enc": 46.0, "rscu_mean": null, "top_motif": "start_codon"})
        );
    }

    #[test]
    fn window_fields_are_omitted_for_global_rows() {
        let row = FeatureResult::global("s1".into(), None, FeatureMap::new());
        assert_eq!(
            serde_json::to_value(&row).unwrap(),
            serde_json::json!({"sequenceId": "s1", "features": {}})
        );
        assert!(!row.is_windowed());

        let row = FeatureResult::windowed(
            "s1".into(),
            Some("gene".into()),
            WindowPosition {
                start: 3,
                end: 6,
                window_type: WindowType::End,
            },
            FeatureMap::new(),
        );
        assert_eq!(
            serde_json::to_value(&row).unwrap(),
            serde_json::json!({
                "sequenceId": "s1",
                "sequenceName": "gene",
                "windowStart": 3,
                "windowEnd": 6,
                "windowType": "end",
                "features": {}
            })
        );
        assert_eq!(row.window().unwrap().len(), 3);
    }

    fn response(ids: &[&str], panels: Vec<PanelKind>, ms: u64) -> FeatureExtractionResponse {
        FeatureExtractionResponse {
            success: true,
            mode: ExtractionMode::Global,
            results: ids
                .iter()
                .map(|id| FeatureResult::global(id.to_string(), None, FeatureMap::new()))
                .collect(),
            metadata: ResponseMetadata {
                total_sequences: ids.len(),
                total_windows: None,
                window_sizes: None,
                panels_computed: panels,
                compute_time_ms: ms,
            },
            errors: vec![],
        }
    }

    #[test]
    fn merge_concatenates_and_sums() {
        let mut first = response(&["a", "b"], vec![PanelKind::Sequence], 5);
        let mut second = response(&["c"], vec![PanelKind::Cai, PanelKind::Sequence], 7);
        second.errors.push(UnitError {
            sequence_id: "c".into(),
            panel: "cai".into(),
            error: "boom".into(),
        });
        second.metadata.total_windows = Some(4);
        first.merge(second);

        let ids: Vec<_> = first.results.iter().map(|r| r.sequence_id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
        assert_eq!(first.metadata.total_sequences, 3);
        assert_eq!(first.metadata.total_windows, Some(4));
        assert_eq!(first.metadata.compute_time_ms, 12);
        assert_eq!(
            first.metadata.panels_computed,
            vec![PanelKind::Sequence, PanelKind::Cai]
        );
        assert_eq!(first.errors.len(), 1);
    }

    #[test]
    fn errors_key_is_omitted_when_empty() {
        let json = serde_json::to_value(response(&[], vec![], 0)).unwrap();
        assert!(json.get("errors").is_none());
        assert_eq!(json["mode"], "global");
        assert_eq!(json["metadata"]["computeTimeMs"], 0);
    }
}
