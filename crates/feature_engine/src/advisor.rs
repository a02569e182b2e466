// Copyright 2021-2024 SecureDNA Stiftung (SecureDNA Foundation) <licensing@securedna.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Recommends panels for a free-text hypothesis.
//!
//! Natural-language scorers live outside this crate and plug in through
//! [`PanelAdvisor`]. [`KeywordAdvisor`] is a deterministic stand-in that
//! scores panels by how many of their catalog keywords the hypothesis uses.

use std::collections::BTreeSet;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use feature_types::{PanelKind, PanelRegistry};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedPanel {
    pub panel: PanelKind,
    pub score: f64,
}

#[derive(Debug, Error)]
pub enum AdvisorError {
    #[error("Hypothesis is empty")]
    EmptyHypothesis,
    #[error("Panel advisor unavailable: {0}")]
    Unavailable(String),
}

#[async_trait::async_trait]
pub trait PanelAdvisor: Send + Sync {
    /// Panels from `registry` relevant to `hypothesis`, best first.
    async fn recommend(
        &self,
        hypothesis: &str,
        registry: &PanelRegistry,
    ) -> Result<Vec<RankedPanel>, AdvisorError>;
}

#[derive(Debug, Clone)]
pub struct KeywordAdvisor {
    pub max_results: usize,
}

impl Default for KeywordAdvisor {
    fn default() -> Self {
        Self { max_results: 5 }
    }
}

fn words(text: &str) -> BTreeSet<String> {
    text.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_ascii_lowercase)
        .collect()
}

impl KeywordAdvisor {
    /// A keyword counts once if any hypothesis word is the keyword itself or
    /// a plural/derived form starting with it ("codons" matches "codon").
    /// Naming the panel id outright is worth one more point.
    fn score(words: &BTreeSet<String>, keywords: &[String], id: PanelKind) -> f64 {
        let matched = keywords
            .iter()
            .filter(|keyword| {
                let keyword = keyword.to_ascii_lowercase();
                words
                    .iter()
                    .any(|w| *w == keyword || (keyword.len() >= 4 && w.starts_with(&keyword)))
            })
            .count();
        let named = words.contains(&id.to_string());
        matched as f64 + if named { 1.0 } else { 0.0 }
    }
}

#[async_trait::async_trait]
impl PanelAdvisor for KeywordAdvisor {
    async fn recommend(
        &self,
        hypothesis: &str,
        registry: &PanelRegistry,
    ) -> Result<Vec<RankedPanel>, AdvisorError> {
        let words = words(hypothesis);
        if words.is_empty() {
            return Err(AdvisorError::EmptyHypothesis);
        }

        let mut ranked: Vec<RankedPanel> = registry
            .iter()
            .map(|desc| RankedPanel {
                panel: desc.id,
                score: Self::score(&words, &desc.keywords, desc.id),
            })
            .filter(|r| r.score > 0.0)
            .collect();
        // Stable, so ties keep registry order.
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        ranked.truncate(self.max_results);
        debug!("Recommended {} panels for hypothesis", ranked.len());
        Ok(ranked)
    }
}
