// Copyright 2021-2024 SecureDNA Stiftung (SecureDNA Foundation) <licensing@securedna.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::num::NonZeroUsize;
use std::time::Duration;

use assert_json_diff::assert_json_include;
use quickcheck::{quickcheck, Arbitrary, Gen};
use serde_json::json;

use feature_engine::advisor::{KeywordAdvisor, PanelAdvisor};
use feature_engine::progress::NoProgress;
use feature_engine::{
    cancellation, extract, run_batched, BatchConfig, BatchError, BatchProgress, BatchStatus,
    CancelSignal, ExtractionError, PanelCatalog, ResourceLimit,
};
use feature_types::{
    ConfigError, ExtractionMode, ExtractionRequest, FeatureResult, PanelConfig, PanelKind,
    PanelRegistry, RequestContext, SequenceInput, SingleWindowConfig, WindowConfig, WindowType,
};

fn request(panels: &[PanelKind], sequences: &[(&str, &str)]) -> ExtractionRequest {
    ExtractionRequest::new(
        sequences
            .iter()
            .map(|(id, seq)| SequenceInput::new(*id, *seq))
            .collect(),
        PanelConfig::enabling(panels.iter().copied()),
    )
}

fn windows(results: &[FeatureResult]) -> Vec<(usize, usize, WindowType)> {
    results
        .iter()
        .filter_map(FeatureResult::window)
        .map(|w| (w.start, w.end, w.window_type))
        .collect()
}

fn many_sequences(count: usize) -> ExtractionRequest {
    ExtractionRequest::new(
        (0..count)
            .map(|i| SequenceInput::new(format!("seq{i}"), "ATGGCTGCTGCTAAAGGG"))
            .collect(),
        PanelConfig::enabling([PanelKind::Sequence, PanelKind::CodonUsage]),
    )
}

fn batch_config(batch_size: usize) -> BatchConfig {
    BatchConfig {
        batch_size: NonZeroUsize::new(batch_size).unwrap(),
        ..Default::default()
    }
}

#[test]
fn codon_usage_of_alanine_biased_sequence() {
    let req = request(&[PanelKind::CodonUsage], &[("ala", "ATGGCTGCTGCT")]);
    let response = extract(&req, &PanelRegistry::builtin()).unwrap();
    let features = &response.results[0].features;

    let enc = features["enc"].as_f64().unwrap();
    assert!(enc.is_finite() && enc < 61.0 && enc >= 20.0);
    assert_eq!(features["codon_count"].as_f64(), Some(4.0));
    assert_eq!(features["rscu_GCT"].as_f64(), Some(4.0));
    assert_eq!(features["rscu_ATG"].as_f64(), Some(1.0));
    assert!(!features.contains_key("rscu_GCC"));
}

#[test]
fn non_overlapping_windows_tile_the_sequence() {
    let req = request(&[PanelKind::Sequence], &[("s", "ATGCATGCATGC")]).with_window(
        WindowConfig::from_start(SingleWindowConfig::new(3, 3).with_start_index(0)),
    );
    let response = extract(&req, &PanelRegistry::builtin()).unwrap();
    assert_eq!(response.mode, ExtractionMode::Windowed);
    assert_eq!(
        windows(&response.results),
        vec![
            (0, 3, WindowType::Start),
            (3, 6, WindowType::Start),
            (6, 9, WindowType::Start),
            (9, 12, WindowType::Start),
        ]
    );
    for row in &response.results {
        assert_eq!(row.features["length"].as_f64(), Some(3.0));
    }
}

#[test]
fn single_window_when_sequence_barely_fits() {
    let req = request(&[PanelKind::GcContent], &[("s", "ATGCAT")])
        .with_window(WindowConfig::from_start(SingleWindowConfig::new(5, 2)));
    let response = extract(&req, &PanelRegistry::builtin()).unwrap();
    assert_eq!(windows(&response.results), vec![(0, 5, WindowType::Start)]);
}

#[test]
fn short_sequences_produce_no_windows() {
    let req = request(&[PanelKind::Sequence], &[("short", "ATG"), ("long", "ATGATGATG")])
        .with_window(WindowConfig::both(
            SingleWindowConfig::new(6, 3),
            SingleWindowConfig::new(6, 3),
        ));
    let response = extract(&req, &PanelRegistry::builtin()).unwrap();
    assert!(response.results.iter().all(|r| r.sequence_id == "long"));
    assert_eq!(response.metadata.total_windows, Some(4));
}

#[test]
fn both_directions_are_tagged_and_interleaved() {
    let req = request(&[PanelKind::Sequence], &[("s", "ATGCATGCAT")]).with_window(
        WindowConfig::both(SingleWindowConfig::new(4, 3), SingleWindowConfig::new(4, 3)),
    );
    let response = extract(&req, &PanelRegistry::builtin()).unwrap();
    let found = windows(&response.results);
    assert_eq!(
        found,
        vec![
            (0, 4, WindowType::Start),
            (0, 4, WindowType::End),
            (3, 7, WindowType::Start),
            (3, 7, WindowType::End),
            (6, 10, WindowType::Start),
            (6, 10, WindowType::End),
        ]
    );
}

#[test]
fn empty_panel_selection_is_rejected() {
    let req = request(&[], &[("s", "ATG")]);
    let err = extract(&req, &PanelRegistry::builtin()).unwrap_err();
    assert!(matches!(
        err,
        ExtractionError::InvalidConfiguration(ConfigError::NoPanelsSelected)
    ));
}

#[test]
fn unknown_reference_set_is_rejected() {
    let req = request(&[PanelKind::Cai], &[("s", "ATG")]).with_reference_set("yeast_heg");
    let err = extract(&req, &PanelRegistry::builtin()).unwrap_err();
    assert!(matches!(
        err,
        ExtractionError::InvalidConfiguration(ConfigError::UnknownReferenceSet(_))
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn large_request_runs_in_two_batches() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .try_init();

    let mut stages = vec![];
    let outcome = run_batched(
        &RequestContext::new(1000),
        many_sequences(1000),
        &PanelRegistry::builtin(),
        &batch_config(500),
        &CancelSignal::never(),
        &mut |_: &RequestContext, p: &BatchProgress| stages.push(p.stage.clone()),
    )
    .await
    .unwrap();

    assert_eq!(outcome.status, BatchStatus::Completed);
    assert_eq!(outcome.total_batches, 2);
    assert_eq!(
        stages,
        [
            "Processing batch 1 of 2",
            "Processing batch 2 of 2",
            "Completed"
        ]
    );
    let response = outcome.response;
    assert_eq!(response.results.len(), 1000);
    assert_eq!(response.metadata.total_sequences, 1000);
    for (i, row) in response.results.iter().enumerate() {
        assert_eq!(row.sequence_id, format!("seq{i}"));
    }
}

#[tokio::test]
async fn batched_matches_unbatched() {
    let req = many_sequences(25);
    let unbatched = extract(&req, &PanelRegistry::builtin()).unwrap();
    let outcome = run_batched(
        &RequestContext::new(25),
        req,
        &PanelRegistry::builtin(),
        &BatchConfig {
            parallel: false,
            ..batch_config(7)
        },
        &CancelSignal::never(),
        &mut NoProgress,
    )
    .await
    .unwrap();
    assert_eq!(outcome.total_batches, 4);
    assert_eq!(outcome.response.results, unbatched.results);
    assert_eq!(outcome.response.metadata.panels_computed, unbatched.metadata.panels_computed);
}

#[tokio::test]
async fn cancelling_keeps_completed_batches() {
    let (handle, signal) = cancellation();
    let mut stages = vec![];
    let outcome = run_batched(
        &RequestContext::new(1000),
        many_sequences(1000),
        &PanelRegistry::builtin(),
        &batch_config(500),
        &signal,
        &mut |_: &RequestContext, p: &BatchProgress| {
            if p.completed_batches == 0 {
                handle.cancel();
            }
            stages.push(p.stage.clone());
        },
    )
    .await
    .unwrap();

    assert_eq!(outcome.status, BatchStatus::Stopped);
    assert_eq!(outcome.completed_batches, 1);
    assert_eq!(outcome.response.results.len(), 500);
    assert_eq!(outcome.response.results[499].sequence_id, "seq499");
    assert_eq!(stages, ["Processing batch 1 of 2", "Stopped by user"]);
}

#[tokio::test]
async fn time_limit_is_a_distinct_error() {
    let err = run_batched(
        &RequestContext::new(1000),
        many_sequences(1000),
        &PanelRegistry::builtin(),
        &BatchConfig {
            timeout: Some(Duration::ZERO),
            ..batch_config(500)
        },
        &CancelSignal::never(),
        &mut NoProgress,
    )
    .await
    .unwrap_err();
    assert!(err.is_retriable());
    assert!(matches!(
        err,
        BatchError::ResourceLimitExceeded {
            limit: ResourceLimit::Timeout { .. },
            ..
        }
    ));
    assert!(err.partial().is_some());
}

#[tokio::test]
async fn catalog_registry_drives_extraction() {
    let catalog = PanelCatalog::default();
    let registry = catalog.get().await.unwrap();
    let outcome = run_batched(
        &RequestContext::new(2),
        request(&[PanelKind::Motif], &[("a", "GCCACCATGAAATAA"), ("b", "")]),
        &registry,
        &BatchConfig::default(),
        &CancelSignal::never(),
        &mut NoProgress,
    )
    .await
    .unwrap();
    let rows = &outcome.response.results;
    // TGA and TAA outnumber the single ATG
    assert_eq!(rows[0].features["top_motif"].as_str(), Some("stop_codon"));
    assert_eq!(rows[0].features["motif_kozak"].as_f64(), Some(1.0));
    assert_eq!(rows[1].features["motif_count"].as_f64(), Some(0.0));
    assert!(rows[1].features["top_motif"].as_str().is_none());
}

#[tokio::test]
async fn advisor_recommendations_can_be_extracted() {
    let registry = PanelRegistry::builtin();
    let ranked = KeywordAdvisor::default()
        .recommend("Does GC content or codon bias predict expression?", &registry)
        .await
        .unwrap();
    let panels = PanelConfig::enabling(ranked.iter().map(|r| r.panel));
    let req = ExtractionRequest::new(vec![SequenceInput::new("s", "ATGGCTGCTGCT")], panels);
    let response = extract(&req, &registry).unwrap();
    assert!(response
        .metadata
        .panels_computed
        .contains(&PanelKind::CodonUsage));
}

#[test]
fn legacy_request_shape() {
    let req: ExtractionRequest = serde_json::from_value(json!({
        "sequences": [{"id": "s1", "sequence": "ATGGCTGCTGCT", "name": "first"}],
        "panels": {
            "composition": {"enabled": true},
            "codonUsage": {"enabled": true},
            "chemical": {"enabled": false}
        },
        "window": {"enabled": true, "windowSize": 6, "stepSize": 3}
    }))
    .unwrap();
    let response = extract(&req, &PanelRegistry::builtin()).unwrap();
    assert_eq!(
        response.metadata.panels_computed,
        vec![PanelKind::Sequence, PanelKind::CodonUsage]
    );
    assert_eq!(
        windows(&response.results),
        vec![
            (0, 6, WindowType::Start),
            (3, 9, WindowType::Start),
            (6, 12, WindowType::Start),
        ]
    );
    assert!(response
        .results
        .iter()
        .all(|r| r.sequence_name.as_deref() == Some("first")));
}

#[test]
fn response_json_shape() {
    let req = request(&[PanelKind::Sequence], &[("gc", "GGCC")]).with_window(
        WindowConfig::from_start(SingleWindowConfig::new(4, 1)),
    );
    let response = extract(&req, &PanelRegistry::builtin()).unwrap();
    let actual = serde_json::to_value(&response).unwrap();
    assert_json_include!(
        actual: actual,
        expected: json!({
            "success": true,
            "mode": "windowed",
            "results": [{
                "sequenceId": "gc",
                "windowStart": 0,
                "windowEnd": 4,
                "windowType": "start",
                "features": {
                    "length": 4.0,
                    "g_count": 2.0,
                    "c_count": 2.0,
                    "gc_content": 100.0,
                    "at_content": 0.0,
                    "gc_skew": 0.0,
                    "at_gc_ratio": 0.0
                }
            }],
            "metadata": {
                "totalSequences": 1,
                "totalWindows": 1,
                "windowSizes": {"start": 4},
                "panelsComputed": ["sequence"]
            }
        })
    );
    assert!(actual.get("errors").is_none());
    assert!(actual["results"][0].get("sequenceName").is_none());
}

#[derive(Debug, Clone)]
struct Nucleotides(String);

impl Arbitrary for Nucleotides {
    fn arbitrary(g: &mut Gen) -> Self {
        let len = usize::arbitrary(g) % 200 + 1;
        Nucleotides(
            (0..len)
                .map(|_| *g.choose(&['A', 'C', 'G', 'T']).unwrap())
                .collect(),
        )
    }
}

quickcheck! {
    fn full_span_window_matches_global(seq: Nucleotides) -> bool {
        let panels = [
            PanelKind::Sequence,
            PanelKind::NucleotideFrequency,
            PanelKind::GcContent,
            PanelKind::CodonUsage,
        ];
        let len = seq.0.len() as i64;
        let global = request(&panels, &[("s", &seq.0)]);
        let windowed = global
            .clone()
            .with_window(WindowConfig::from_start(SingleWindowConfig::new(len, 1)));

        let registry = PanelRegistry::builtin();
        let global = extract(&global, &registry).unwrap();
        let windowed = extract(&windowed, &registry).unwrap();
        windowed.results.len() == 1
            && windowed.results[0].features == global.results[0].features
    }
}
