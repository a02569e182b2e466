// Copyright 2021-2024 SecureDNA Stiftung (SecureDNA Foundation) <licensing@securedna.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ConfigError;
use crate::panels::PanelConfig;
use crate::sequence::SequenceInput;
use crate::window::WindowConfig;

/// A unique per-request ID, attached to log lines and progress reports so a
/// long batched run can be followed through the logs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(pub String);

impl RequestId {
    pub fn new_unique() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn unknown() -> Self {
        Self("unknown".into())
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A "context" object indicating which request is being handled.
/// Used for logging and progress reports.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// The ID of the whole extraction request.
    pub id: RequestId,

    /// The total number of sequences in the request, across all batches.
    pub total_records: usize,
}

impl RequestContext {
    pub fn single(id: RequestId) -> RequestContext {
        RequestContext {
            id,
            total_records: 1,
        }
    }

    pub fn new(total_records: usize) -> RequestContext {
        RequestContext {
            id: RequestId::new_unique(),
            total_records,
        }
    }
}

impl fmt::Display for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.total_records > 1 {
            write!(f, "{} ({} records)", &self.id, self.total_records)
        } else {
            write!(f, "{}", &self.id)
        }
    }
}

/// Restricts global computations to part of each sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_index: Option<usize>,
}

impl Region {
    pub fn validate(&self) -> Result<(), ConfigError> {
        match (self.start_index, self.end_index) {
            (Some(start), Some(end)) if end < start => {
                Err(ConfigError::RegionEndBeforeStart { start, end })
            }
            _ => Ok(()),
        }
    }

    /// The byte range of a `len`-long sequence covered by this region. Bounds
    /// past the end of the sequence are clamped, so the range may be empty.
    pub fn bounds(&self, len: usize) -> Range<usize> {
        let end = self.end_index.map_or(len, |end| end.min(len));
        let start = self.start_index.unwrap_or(0).min(end);
        start..end
    }
}

/// A complete extraction call as a client submits it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionRequest {
    pub sequences: Vec<SequenceInput>,
    pub panels: PanelConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window: Option<WindowConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_set: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<Region>,
}

impl ExtractionRequest {
    pub fn new(sequences: Vec<SequenceInput>, panels: PanelConfig) -> Self {
        Self {
            sequences,
            panels,
            ..Default::default()
        }
    }

    pub fn with_window(mut self, window: WindowConfig) -> Self {
        self.window = Some(window);
        self
    }

    pub fn with_reference_set(mut self, reference_set: impl Into<String>) -> Self {
        self.reference_set = Some(reference_set.into());
        self
    }

    pub fn with_region(mut self, region: Region) -> Self {
        self.region = Some(region);
        self
    }

    /// Whether this request asks for windowed rather than global results.
    pub fn is_windowed(&self) -> bool {
        self.window.as_ref().is_some_and(WindowConfig::is_enabled)
    }
}
