// Copyright 2021-2024 SecureDNA Stiftung (SecureDNA Foundation) <licensing@securedna.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Drives the calculators over every sequence, either once per sequence
//! (global mode) or once per window (windowed mode).

use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, warn};

use feature_types::{
    ConfigError, ExtractionMode, ExtractionRequest, FeatureExtractionResponse, FeatureMap,
    FeatureResult, PanelKind, PanelRegistry, Region, ResponseMetadata, SequenceInput, UnitError,
    ValidatedWindow, WindowPosition, WindowSizes, WindowType,
};

use crate::calculators::{self, PanelContext, SequenceUnit};
use crate::error::{CalculationError, ExtractionError};
use crate::windows::enumerate_windows;

/// An enabled, recognized panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedPanel {
    pub kind: PanelKind,
    pub windowable: bool,
}

/// Everything about a request except its sequences, validated once.
///
/// A plan is immutable and can be run over any number of sequence batches;
/// runs share no state.
#[derive(Debug, Clone)]
pub struct ExtractionPlan {
    panels: Vec<PlannedPanel>,
    context: PanelContext,
    scans: Vec<ValidatedWindow>,
    region: Region,
    parallel: bool,
}

impl ExtractionPlan {
    /// Validates `request` against `registry`. Fails before looking at any
    /// sequence if no panel is enabled or the window or region bounds are
    /// malformed.
    pub fn new(request: &ExtractionRequest, registry: &PanelRegistry) -> Result<Self, ConfigError> {
        if !request.panels.any_enabled() {
            return Err(ConfigError::NoPanelsSelected);
        }

        let resolved = registry.resolve(&request.panels);
        for id in &resolved.unknown {
            warn!("Ignoring unknown feature panel {id:?}");
        }

        let rare_codons = resolved
            .known
            .iter()
            .find(|(desc, _)| desc.id == PanelKind::RareCodons)
            .and_then(|(_, setting)| setting.param("codons"));
        let context = PanelContext::new(request.reference_set.as_deref(), rare_codons)?;

        let scans = match &request.window {
            Some(window) => window.validated()?,
            None => vec![],
        };
        let region = request.region.unwrap_or_default();
        region.validate()?;

        let panels = resolved
            .known
            .iter()
            .map(|(desc, _)| PlannedPanel {
                kind: desc.id,
                windowable: desc.windowable,
            })
            .collect();

        Ok(Self {
            panels,
            context,
            scans,
            region,
            parallel: true,
        })
    }

    /// Whether sequences are computed in parallel within a run. Output order
    /// is the same either way.
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn mode(&self) -> ExtractionMode {
        if self.scans.is_empty() {
            ExtractionMode::Global
        } else {
            ExtractionMode::Windowed
        }
    }

    pub fn panels(&self) -> &[PlannedPanel] {
        &self.panels
    }

    /// A response with no results, carrying this plan's metadata.
    pub fn empty_response(&self) -> FeatureExtractionResponse {
        let windowed = self.mode() == ExtractionMode::Windowed;
        let window_sizes = windowed.then(|| {
            let size_of = |direction| {
                self.scans
                    .iter()
                    .find(|scan| scan.direction == direction)
                    .map(|scan| scan.window_size.get())
            };
            WindowSizes {
                start: size_of(WindowType::Start),
                end: size_of(WindowType::End),
            }
        });
        FeatureExtractionResponse {
            success: true,
            mode: self.mode(),
            results: vec![],
            metadata: ResponseMetadata {
                total_sequences: 0,
                total_windows: windowed.then_some(0),
                window_sizes,
                panels_computed: self.panels.iter().map(|p| p.kind).collect(),
                compute_time_ms: 0,
            },
            errors: vec![],
        }
    }

    /// Computes every enabled panel for `sequences`. Per-unit failures are
    /// recorded in the response's errors and never abort the run.
    pub fn run(&self, sequences: &[SequenceInput]) -> FeatureExtractionResponse {
        let now = Instant::now();

        let outcomes: Vec<SequenceOutcome> = if self.parallel {
            sequences.par_iter().map(|seq| self.run_sequence(seq)).collect()
        } else {
            sequences.iter().map(|seq| self.run_sequence(seq)).collect()
        };

        let mut response = self.empty_response();
        response.metadata.total_sequences = sequences.len();
        for outcome in outcomes {
            if let Some(total) = response.metadata.total_windows.as_mut() {
                *total += outcome.windows;
            }
            response.results.extend(outcome.results);
            response.errors.extend(outcome.errors);
        }

        let elapsed = now.elapsed();
        response.metadata.compute_time_ms = elapsed.as_millis().try_into().unwrap_or(u64::MAX);
        debug!(
            "Extracted {} sequences ({} rows, {} errors). Took: {:.2?}",
            sequences.len(),
            response.results.len(),
            response.errors.len(),
            elapsed
        );
        response
    }

    fn run_sequence(&self, seq: &SequenceInput) -> SequenceOutcome {
        let mut outcome = SequenceOutcome::new(seq);
        let kind = seq.kind();
        let bytes = seq.sequence.as_bytes();

        let region = &bytes[self.region.bounds(bytes.len())];

        if self.scans.is_empty() {
            let unit = SequenceUnit::new(region, kind);
            let features = outcome.compute(&self.context, self.panels.iter(), &unit, None);
            outcome.push_global(features);
            return outcome;
        }

        let (windowable, global_only): (Vec<&PlannedPanel>, Vec<&PlannedPanel>) =
            self.panels.iter().partition(|p| p.windowable);

        // global-only panels honour the region, as in global mode
        if !global_only.is_empty() {
            let unit = SequenceUnit::new(region, kind);
            let features = outcome.compute(&self.context, global_only.into_iter(), &unit, None);
            outcome.push_global(features);
        }

        if !windowable.is_empty() {
            for position in enumerate_windows(&self.scans, bytes.len()) {
                let unit = SequenceUnit::new(&bytes[position.start..position.end], kind);
                let features = outcome.compute(
                    &self.context,
                    windowable.iter().copied(),
                    &unit,
                    Some(position),
                );
                outcome.push_window(position, features);
            }
        }
        outcome
    }
}

/// Rows and errors produced for one sequence.
struct SequenceOutcome {
    sequence_id: String,
    sequence_name: Option<String>,
    results: Vec<FeatureResult>,
    errors: Vec<UnitError>,
    windows: usize,
}

impl SequenceOutcome {
    fn new(seq: &SequenceInput) -> Self {
        Self {
            sequence_id: seq.id.clone(),
            sequence_name: seq.name.clone(),
            results: vec![],
            errors: vec![],
            windows: 0,
        }
    }

    fn compute<'p>(
        &mut self,
        ctx: &PanelContext,
        panels: impl Iterator<Item = &'p PlannedPanel>,
        unit: &SequenceUnit<'_>,
        position: Option<WindowPosition>,
    ) -> FeatureMap {
        let mut features = FeatureMap::new();
        for panel in panels {
            match calculators::compute(panel.kind, unit, ctx) {
                Ok(computed) => features.extend(computed),
                Err(err) => self.record_error(panel.kind, err, position),
            }
        }
        features
    }

    fn record_error(
        &mut self,
        panel: PanelKind,
        err: CalculationError,
        position: Option<WindowPosition>,
    ) {
        let error = match position {
            Some(w) => format!("window {}-{} ({}): {err}", w.start, w.end, w.window_type),
            None => err.to_string(),
        };
        self.errors.push(UnitError {
            sequence_id: self.sequence_id.clone(),
            panel: panel.to_string(),
            error,
        });
    }

    fn push_global(&mut self, features: FeatureMap) {
        self.results.push(FeatureResult::global(
            self.sequence_id.clone(),
            self.sequence_name.clone(),
            features,
        ));
    }

    fn push_window(&mut self, position: WindowPosition, features: FeatureMap) {
        self.windows += 1;
        self.results.push(FeatureResult::windowed(
            self.sequence_id.clone(),
            self.sequence_name.clone(),
            position,
            features,
        ));
    }
}

/// Runs a whole request in one go, with no batching.
pub fn extract(
    request: &ExtractionRequest,
    registry: &PanelRegistry,
) -> Result<FeatureExtractionResponse, ExtractionError> {
    let plan = ExtractionPlan::new(request, registry)?;
    Ok(plan.run(&request.sequences))
}
