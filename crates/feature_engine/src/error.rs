// Copyright 2021-2024 SecureDNA Stiftung (SecureDNA Foundation) <licensing@securedna.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::time::Duration;

use thiserror::Error;

use feature_types::{ConfigError, FeatureExtractionResponse, PanelKind};

/// A failure computing one panel for one sequence or window. These are
/// recorded in the response and never abort the call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CalculationError {
    #[error("panel {panel} needs a nucleotide sequence but was given a protein")]
    NotNucleotide { panel: PanelKind },
    #[error("panel {panel} found no translatable residues")]
    NoResidues { panel: PanelKind },
}

/// A failure of the whole extraction call.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(#[from] ConfigError),
}

/// A caller-imposed ceiling that stopped a batched run.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum ResourceLimit {
    #[error("timed out after {:.3}s", after.as_secs_f64())]
    Timeout { after: Duration },
    #[error("request needs {required} batches but at most {max} are allowed")]
    Batches { max: usize, required: usize },
}

#[derive(Debug, Error)]
pub enum BatchError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    /// `partial` holds every batch completed before the limit was hit.
    #[error("Resource limit exceeded: {limit}")]
    ResourceLimitExceeded {
        limit: ResourceLimit,
        partial: Box<FeatureExtractionResponse>,
    },
    #[error("Batch worker failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl BatchError {
    /// Whether resubmitting (typically with fewer sequences) may succeed.
    pub fn is_retriable(&self) -> bool {
        match self {
            Self::Extraction(_) => false,
            Self::ResourceLimitExceeded { .. } => true,
            Self::Join(_) => false,
        }
    }

    /// Results computed before the run failed, if any.
    pub fn partial(&self) -> Option<&FeatureExtractionResponse> {
        match self {
            Self::ResourceLimitExceeded { partial, .. } => Some(partial),
            _ => None,
        }
    }
}

impl From<ConfigError> for BatchError {
    fn from(value: ConfigError) -> Self {
        Self::Extraction(value.into())
    }
}
