// Copyright 2021-2024 SecureDNA Stiftung (SecureDNA Foundation) <licensing@securedna.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

pub mod advisor;
pub mod batch;
pub mod calculators;
pub mod catalog;
pub mod error;
pub mod extract;
pub mod progress;
pub mod tables;
pub mod windows;

pub use crate::batch::*;
pub use crate::extract::*;

pub use crate::catalog::{BuiltinCatalog, CatalogConfig, CatalogSource, PanelCatalog};
pub use crate::error::{BatchError, CalculationError, ExtractionError, ResourceLimit};
pub use crate::progress::{cancellation, BatchProgress, CancelHandle, CancelSignal, ProgressSink};
pub use feature_types;
