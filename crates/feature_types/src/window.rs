// Copyright 2021-2024 SecureDNA Stiftung (SecureDNA Foundation) <licensing@securedna.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Window configuration as sent by clients, and its validated form.
//!
//! Two client shapes are accepted. The current one carries an independent
//! scan per direction (`{start, end}`); the older one is a single
//! `{enabled, windowSize, stepSize}` record, which is read as a from-start
//! scan with the from-end scan disabled.

use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_WINDOW_SIZE: i64 = 100;
pub const DEFAULT_STEP_SIZE: i64 = 10;

/// Which end of the sequence a window family is anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum WindowType {
    #[serde(rename = "start")]
    Start,
    #[serde(rename = "end")]
    End,
}

serde_plain::derive_display_from_serialize!(WindowType);
serde_plain::derive_fromstr_from_deserialize!(WindowType);

/// One directional scan. Sizes are signed on the wire so that nonsensical
/// values can be reported precisely instead of failing deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleWindowConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_window_size")]
    pub window_size: i64,
    #[serde(default = "default_step_size")]
    pub step_size: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_index: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_index: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_windows: Option<i64>,
}

fn default_window_size() -> i64 {
    DEFAULT_WINDOW_SIZE
}

fn default_step_size() -> i64 {
    DEFAULT_STEP_SIZE
}

impl Default for SingleWindowConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            window_size: DEFAULT_WINDOW_SIZE,
            step_size: DEFAULT_STEP_SIZE,
            start_index: None,
            end_index: None,
            num_windows: None,
        }
    }
}

impl SingleWindowConfig {
    /// An enabled scan with the given window and step sizes over the whole sequence.
    pub fn new(window_size: i64, step_size: i64) -> Self {
        Self {
            enabled: true,
            window_size,
            step_size,
            ..Default::default()
        }
    }

    pub fn with_start_index(mut self, start_index: i64) -> Self {
        self.start_index = Some(start_index);
        self
    }

    pub fn with_end_index(mut self, end_index: i64) -> Self {
        self.end_index = Some(end_index);
        self
    }

    pub fn with_num_windows(mut self, num_windows: i64) -> Self {
        self.num_windows = Some(num_windows);
        self
    }

    /// Checks the bounds of an enabled scan. Disabled scans are never
    /// validated and yield `Ok(None)`.
    pub fn validate(&self, direction: WindowType) -> Result<Option<ValidatedWindow>, ConfigError> {
        if !self.enabled {
            return Ok(None);
        }

        let non_negative = |field: &'static str, value: i64| -> Result<usize, ConfigError> {
            usize::try_from(value).map_err(|_| ConfigError::NegativeValue {
                direction,
                field,
                value,
            })
        };

        let window_size = non_negative("windowSize", self.window_size)?;
        let window_size =
            NonZeroUsize::new(window_size).ok_or(ConfigError::ZeroWindowSize { direction })?;
        let step = non_negative("stepSize", self.step_size)?;
        let step = NonZeroUsize::new(step).ok_or(ConfigError::ZeroStepSize { direction })?;

        let start_index = self
            .start_index
            .map(|v| non_negative("startIndex", v))
            .transpose()?
            .unwrap_or(0);
        let end_index = self
            .end_index
            .map(|v| non_negative("endIndex", v))
            .transpose()?;
        if let Some(end) = end_index {
            if end < start_index {
                return Err(ConfigError::EndBeforeStart {
                    direction,
                    start: start_index,
                    end,
                });
            }
        }
        let num_windows = self
            .num_windows
            .map(|v| non_negative("numWindows", v))
            .transpose()?;

        Ok(Some(ValidatedWindow {
            direction,
            window_size,
            step,
            start_index,
            end_index,
            num_windows,
        }))
    }
}

/// Both directional scans. Either, both, or neither may be enabled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "WireWindowConfig")]
pub struct WindowConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<SingleWindowConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<SingleWindowConfig>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireWindowConfig {
    Dual(DualWindowConfig),
    Legacy(SingleWindowConfig),
}

// Untagged enums try variants in order, so the dual shape must reject the
// legacy record's keys instead of reading it as an empty dual config.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct DualWindowConfig {
    #[serde(default)]
    start: Option<SingleWindowConfig>,
    #[serde(default)]
    end: Option<SingleWindowConfig>,
}

impl From<WireWindowConfig> for WindowConfig {
    fn from(value: WireWindowConfig) -> Self {
        match value {
            WireWindowConfig::Dual(DualWindowConfig { start, end }) => Self { start, end },
            WireWindowConfig::Legacy(single) => Self::from_start(single),
        }
    }
}

impl WindowConfig {
    pub fn from_start(start: SingleWindowConfig) -> Self {
        Self {
            start: Some(start),
            end: None,
        }
    }

    pub fn from_end(end: SingleWindowConfig) -> Self {
        Self {
            start: None,
            end: Some(end),
        }
    }

    pub fn both(start: SingleWindowConfig, end: SingleWindowConfig) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    pub fn is_enabled(&self) -> bool {
        [&self.start, &self.end]
            .into_iter()
            .flatten()
            .any(|direction| direction.enabled)
    }

    /// Validated enabled scans, from-start first.
    pub fn validated(&self) -> Result<Vec<ValidatedWindow>, ConfigError> {
        let mut scans = vec![];
        if let Some(start) = &self.start {
            scans.extend(start.validate(WindowType::Start)?);
        }
        if let Some(end) = &self.end {
            scans.extend(end.validate(WindowType::End)?);
        }
        Ok(scans)
    }
}

/// A directional scan whose bounds have been checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatedWindow {
    pub direction: WindowType,
    pub window_size: NonZeroUsize,
    pub step: NonZeroUsize,
    pub start_index: usize,
    pub end_index: Option<usize>,
    pub num_windows: Option<usize>,
}

impl ValidatedWindow {
    /// The exclusive end of the scanned region for a sequence of `len` residues.
    pub fn effective_end(&self, len: usize) -> usize {
        self.end_index.map_or(len, |end| end.min(len))
    }
}
