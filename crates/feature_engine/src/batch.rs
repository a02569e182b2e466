// Copyright 2021-2024 SecureDNA Stiftung (SecureDNA Foundation) <licensing@securedna.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Splits large requests into bounded batches, run strictly one after
//! another so that progress, cancellation and time limits can be applied at
//! every batch boundary.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use feature_types::{ExtractionRequest, FeatureExtractionResponse, PanelRegistry, RequestContext};

use crate::error::{BatchError, ResourceLimit};
use crate::extract::ExtractionPlan;
use crate::progress::{report_progress, BatchProgress, CancelSignal, ProgressSink};

/// What size of batches sequences are processed in.
/// Each batch is a progress and cancellation checkpoint, so smaller batches
/// respond faster, but too small and the per-batch overhead dominates.
pub const BATCH_SIZE_DEFAULT: NonZeroUsize = match NonZeroUsize::new(500) {
    Some(size) => size,
    None => unreachable!(),
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchConfig {
    pub batch_size: NonZeroUsize,
    /// Ceiling on the whole run, checked at batch boundaries.
    pub timeout: Option<Duration>,
    /// Requests needing more batches than this are refused up front.
    pub max_batches: Option<NonZeroUsize>,
    /// Compute the sequences of a batch in parallel.
    pub parallel: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: BATCH_SIZE_DEFAULT,
            timeout: None,
            max_batches: None,
            parallel: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStatus {
    Completed,
    /// Cancelled by the caller. The response holds every completed batch.
    Stopped,
}

#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub response: FeatureExtractionResponse,
    pub status: BatchStatus,
    pub completed_batches: usize,
    pub total_batches: usize,
}

impl BatchOutcome {
    pub fn is_complete(&self) -> bool {
        self.status == BatchStatus::Completed
    }
}

/// Runs `request` in batches of `config.batch_size` sequences, merging the
/// batch responses in order.
///
/// Configuration errors are reported before any batch runs. Cancellation
/// is checked before each batch; a cancelled run returns the batches
/// completed so far with [`BatchStatus::Stopped`]. Hitting `timeout` or
/// `max_batches` is an error that still carries the completed batches.
pub async fn run_batched(
    request_ctx: &RequestContext,
    request: ExtractionRequest,
    registry: &PanelRegistry,
    config: &BatchConfig,
    cancel: &CancelSignal,
    progress: &mut impl ProgressSink,
) -> Result<BatchOutcome, BatchError> {
    let started = Instant::now();
    let deadline = config.timeout.map(|timeout| started + timeout);

    let plan = Arc::new(ExtractionPlan::new(&request, registry)?.with_parallelism(config.parallel));
    let mut response = plan.empty_response();

    let ExtractionRequest { sequences, .. } = request;
    let batches: Vec<Vec<_>> = sequences
        .chunks(config.batch_size.get())
        .map(<[_]>::to_vec)
        .collect();
    let total_batches = batches.len();

    if let Some(max) = config.max_batches {
        if total_batches > max.get() {
            warn!(
                "{request_ctx}: refusing request needing {total_batches} batches (max {max})"
            );
            return Err(BatchError::ResourceLimitExceeded {
                limit: ResourceLimit::Batches {
                    max: max.get(),
                    required: total_batches,
                },
                partial: Box::new(response),
            });
        }
    }

    info!(
        "{request_ctx}: extracting {} sequences in {total_batches} batches",
        sequences.len()
    );

    for (index, batch) in batches.into_iter().enumerate() {
        if cancel.is_cancelled() {
            info!("{request_ctx}: stopped by user after {index}/{total_batches} batches");
            report_progress(progress, request_ctx, BatchProgress::stopped(index, total_batches));
            return Ok(BatchOutcome {
                response,
                status: BatchStatus::Stopped,
                completed_batches: index,
                total_batches,
            });
        }

        if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return Err(timed_out(request_ctx, started, index, total_batches, response));
        }

        report_progress(
            progress,
            request_ctx,
            BatchProgress::processing(index, total_batches),
        );

        let now = Instant::now();
        let batch_plan = Arc::clone(&plan);
        let task = tokio::task::spawn_blocking(move || batch_plan.run(&batch));
        let batch_response = match deadline {
            Some(deadline) => match tokio::time::timeout_at(deadline, task).await {
                Ok(joined) => joined?,
                Err(_) => {
                    return Err(timed_out(request_ctx, started, index, total_batches, response))
                }
            },
            None => task.await?,
        };

        response.merge(batch_response);
        debug!(
            "{request_ctx}: batch {}/{total_batches} done. Took: {:.2?}",
            index + 1,
            now.elapsed()
        );
    }

    report_progress(progress, request_ctx, BatchProgress::completed(total_batches));
    Ok(BatchOutcome {
        response,
        status: BatchStatus::Completed,
        completed_batches: total_batches,
        total_batches,
    })
}

fn timed_out(
    request_ctx: &RequestContext,
    started: Instant,
    completed_batches: usize,
    total_batches: usize,
    partial: FeatureExtractionResponse,
) -> BatchError {
    let after = started.elapsed();
    warn!("{request_ctx}: timed out after {after:.2?} with {completed_batches}/{total_batches} batches done");
    BatchError::ResourceLimitExceeded {
        limit: ResourceLimit::Timeout { after },
        partial: Box::new(partial),
    }
}
