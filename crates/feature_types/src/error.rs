// Copyright 2021-2024 SecureDNA Stiftung (SecureDNA Foundation) <licensing@securedna.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

use thiserror::Error;

use crate::window::WindowType;

/// A structurally invalid request. These abort the whole extraction call
/// before any sequence is touched.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("no feature panels selected")]
    NoPanelsSelected,
    #[error("{direction} window has zero window size")]
    ZeroWindowSize { direction: WindowType },
    #[error("{direction} window has zero step size")]
    ZeroStepSize { direction: WindowType },
    #[error("{direction} window has negative {field}: {value}")]
    NegativeValue {
        direction: WindowType,
        field: &'static str,
        value: i64,
    },
    #[error("{direction} window ends ({end}) before it starts ({start})")]
    EndBeforeStart {
        direction: WindowType,
        start: usize,
        end: usize,
    },
    #[error("region ends ({end}) before it starts ({start})")]
    RegionEndBeforeStart { start: usize, end: usize },
    #[error("unknown reference set: {0}")]
    UnknownReferenceSet(String),
    #[error("invalid codon in panel parameters: {0:?}")]
    InvalidCodon(String),
}
