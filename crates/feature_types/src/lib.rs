// Copyright 2021-2024 SecureDNA Stiftung (SecureDNA Foundation) <licensing@securedna.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! This crate is used for types that are shared between the feature engine,
//! its callers, and the command-line driver.

pub mod error;
pub mod panels;
pub mod requests;
pub mod response;
pub mod sequence;
pub mod window;

pub use error::ConfigError;
pub use panels::{
    PanelConfig, PanelDescriptor, PanelKind, PanelRegistry, PanelSetting, ResolvedPanels,
};
pub use requests::{ExtractionRequest, Region, RequestContext, RequestId};
pub use response::{
    round3, ExtractionMode, FeatureExtractionResponse, FeatureMap, FeatureResult, FeatureValue,
    ResponseMetadata, UnitError, WindowPosition, WindowSizes,
};
pub use sequence::{SequenceInput, SequenceKind};
pub use window::{SingleWindowConfig, ValidatedWindow, WindowConfig, WindowType};
