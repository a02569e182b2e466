// Copyright 2021-2024 SecureDNA Stiftung (SecureDNA Foundation) <licensing@securedna.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A read-through cache of the panel catalog.
//!
//! The catalog is fetched from a [`CatalogSource`] on first use and kept for
//! a fixed TTL, after which the next reader refetches it. Callers own the
//! cache and pass it (or the registry it yields) to the orchestrator; there is
//! no process-wide instance.

mod refreshable;

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, info};

use feature_types::PanelRegistry;

pub use refreshable::Refreshable;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    /// How long a fetched catalog is served before it is refetched.
    pub ttl: Duration,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(60 * 60),
        }
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Error fetching panel catalog: {0}")]
    Fetch(Box<dyn std::error::Error + Send + Sync + 'static>),
    #[error("Panel catalog is empty")]
    Empty,
}

/// Where panel catalogs come from.
#[async_trait::async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch(&self) -> Result<PanelRegistry, CatalogError>;
}

/// The panels compiled into this engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinCatalog;

#[async_trait::async_trait]
impl CatalogSource for BuiltinCatalog {
    async fn fetch(&self) -> Result<PanelRegistry, CatalogError> {
        Ok(PanelRegistry::builtin())
    }
}

#[derive(Debug, Clone)]
struct CachedCatalog {
    registry: Arc<PanelRegistry>,
    fetched_at: Instant,
}

pub struct PanelCatalog<S: CatalogSource> {
    source: S,
    config: CatalogConfig,
    cache: Refreshable<Option<CachedCatalog>>,
}

impl<S: CatalogSource> PanelCatalog<S> {
    pub fn new(source: S, config: CatalogConfig) -> Self {
        Self {
            source,
            config,
            cache: Refreshable::new(None),
        }
    }

    /// The cached catalog if it is younger than the TTL, otherwise a freshly
    /// fetched one.
    pub async fn get(&self) -> Result<Arc<PanelRegistry>, CatalogError> {
        let ttl = self.config.ttl;
        let cached = self
            .cache
            .accept_or(
                |cached| {
                    cached
                        .as_ref()
                        .is_some_and(|c| c.fetched_at.elapsed() < ttl)
                },
                || self.fetch(),
            )
            .await?;
        cached.map(|c| c.registry).ok_or(CatalogError::Empty)
    }

    /// Fetches the catalog now, regardless of the age of the cached one.
    pub async fn refresh(&self) -> Result<Arc<PanelRegistry>, CatalogError> {
        info!("Refreshing panel catalog");
        let cached = self.cache.refresh(|| self.fetch()).await?;
        cached.map(|c| c.registry).ok_or(CatalogError::Empty)
    }

    async fn fetch(&self) -> Result<Option<CachedCatalog>, CatalogError> {
        let registry = self.source.fetch().await?;
        if registry.is_empty() {
            return Err(CatalogError::Empty);
        }
        debug!("Fetched panel catalog with {} panels", registry.len());
        Ok(Some(CachedCatalog {
            registry: Arc::new(registry),
            fetched_at: Instant::now(),
        }))
    }
}

impl Default for PanelCatalog<BuiltinCatalog> {
    fn default() -> Self {
        Self::new(BuiltinCatalog, CatalogConfig::default())
    }
}
