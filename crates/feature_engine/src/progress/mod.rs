// Copyright 2021-2024 SecureDNA Stiftung (SecureDNA Foundation) <licensing@securedna.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Progress reports and cooperative cancellation for batched runs. Both are
//! only observed between batches.

use serde::Serialize;
use tokio::sync::watch;
use tracing::debug;

use feature_types::RequestContext;

pub const STAGE_COMPLETED: &str = "Completed";
pub const STAGE_STOPPED: &str = "Stopped by user";

/// A snapshot of a batched run, taken at a batch boundary.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchProgress {
    pub completed_batches: usize,
    pub total_batches: usize,
    pub percent_complete: f64,
    pub stage: String,
}

impl BatchProgress {
    pub fn new(completed_batches: usize, total_batches: usize, stage: impl Into<String>) -> Self {
        let percent_complete = if total_batches == 0 {
            100.0
        } else {
            100.0 * completed_batches as f64 / total_batches as f64
        };
        Self {
            completed_batches,
            total_batches,
            percent_complete,
            stage: stage.into(),
        }
    }

    /// Reported just before batch `index` (0-based) is dispatched.
    pub fn processing(index: usize, total_batches: usize) -> Self {
        Self::new(
            index,
            total_batches,
            format!("Processing batch {} of {}", index + 1, total_batches),
        )
    }

    pub fn completed(total_batches: usize) -> Self {
        Self::new(total_batches, total_batches, STAGE_COMPLETED)
    }

    pub fn stopped(completed_batches: usize, total_batches: usize) -> Self {
        Self::new(completed_batches, total_batches, STAGE_STOPPED)
    }
}

/// Receives progress reports. Closures taking the request context and a
/// snapshot are sinks.
pub trait ProgressSink {
    fn report(&mut self, request_ctx: &RequestContext, progress: &BatchProgress);
}

impl<F> ProgressSink for F
where
    F: FnMut(&RequestContext, &BatchProgress),
{
    fn report(&mut self, request_ctx: &RequestContext, progress: &BatchProgress) {
        self(request_ctx, progress)
    }
}

/// Discards reports.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&mut self, _request_ctx: &RequestContext, _progress: &BatchProgress) {
        // Do nothing.
    }
}

pub fn report_progress(
    sink: &mut impl ProgressSink,
    request_ctx: &RequestContext,
    progress: BatchProgress,
) {
    debug!(
        "{request_ctx}: {} ({:.0}%)",
        progress.stage, progress.percent_complete
    );
    sink.report(request_ctx, &progress);
}

/// Requests that a batched run stop before its next batch.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

/// Observed by the batch controller between batches.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

pub fn cancellation() -> (CancelHandle, CancelSignal) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelSignal { rx })
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn signal(&self) -> CancelSignal {
        CancelSignal {
            rx: self.tx.subscribe(),
        }
    }
}

impl CancelSignal {
    /// A signal that is never raised.
    pub fn never() -> Self {
        cancellation().1
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancellation has been requested. Never resolves if the
    /// handle is dropped without cancelling.
    pub async fn cancelled(&mut self) {
        if self.rx.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
