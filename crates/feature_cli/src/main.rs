// Copyright 2021-2024 SecureDNA Stiftung (SecureDNA Foundation) <licensing@securedna.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

mod input;
mod log;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{crate_version, Parser};
use serde::Serialize;
use tracing::{info, warn};

use crate::input::{read_request, RequestArgs};
use crate::log::{init_log, log_level_from_count};
use feature_engine::advisor::{KeywordAdvisor, PanelAdvisor};
use feature_engine::{
    cancellation, run_batched, BatchConfig, BatchError, BatchProgress, BatchStatus,
    PanelCatalog, BATCH_SIZE_DEFAULT,
};
use feature_types::RequestContext;

fn main() -> anyhow::Result<()> {
    let opts = Opts::parse();
    run(&opts)
}

#[derive(Debug, Parser)]
#[clap(
    name = "feature_extract",
    about = "Computes sequence feature panels for a JSON request or FASTA file",
    version = crate_version!()
)]
pub struct Opts {
    #[clap(short, global = true, action = clap::ArgAction::Count, help = "default INFO; v for DEBUG")]
    verbosity_level: u8,

    #[clap(
        required_unless_present_any = ["list_panels", "recommend"],
        help = "JSON extraction request or FASTA file"
    )]
    pub input: Option<PathBuf>,

    #[clap(short, long, help = "Write the JSON response here instead of stdout")]
    pub output: Option<PathBuf>,

    #[clap(flatten)]
    pub request: RequestArgs,

    #[clap(
        long,
        default_value_t = BATCH_SIZE_DEFAULT,
        help = "Sequences per batch",
        env = "FEATURE_BATCH_SIZE"
    )]
    pub batch_size: NonZeroUsize,

    #[clap(
        long,
        help = "Give up after this long, e.g. '90s'. Uses formatting from the `humantime` crate.",
        env = "FEATURE_TIMEOUT"
    )]
    pub timeout: Option<humantime::Duration>,

    #[clap(
        long,
        help = "Refuse requests needing more batches than this",
        env = "FEATURE_MAX_BATCHES"
    )]
    pub max_batches: Option<NonZeroUsize>,

    #[clap(long, help = "Compute the sequences of each batch one at a time")]
    pub serial: bool,

    #[clap(long, help = "Print the panel catalog and exit")]
    pub list_panels: bool,

    #[clap(long, help = "Print the panels recommended for a hypothesis and exit")]
    pub recommend: Option<String>,
}

impl Opts {
    fn batch_config(&self) -> BatchConfig {
        BatchConfig {
            batch_size: self.batch_size,
            timeout: self.timeout.map(Into::into),
            max_batches: self.max_batches,
            parallel: !self.serial,
        }
    }
}

fn write_json(output: Option<&PathBuf>, value: &impl Serialize) -> Result<()> {
    let writer: Box<dyn Write> = match output {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        ),
        None => Box::new(std::io::stdout()),
    };
    let mut writer = BufWriter::new(writer);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

fn run(opts: &Opts) -> anyhow::Result<()> {
    // time offset should be initialized asap to avoid issues with localtime_r, see docs for
    // `init_log`.
    let time_offset = time::UtcOffset::current_local_offset()?;

    let log_level = log_level_from_count(opts.verbosity_level)?;
    init_log(log_level, time_offset)?;

    let runtime = tokio::runtime::Runtime::new().context("starting tokio runtime")?;
    runtime.block_on(run_async(opts))
}

async fn run_async(opts: &Opts) -> anyhow::Result<()> {
    let catalog = PanelCatalog::default();
    let registry = catalog.get().await.context("loading panel catalog")?;

    if opts.list_panels {
        return write_json(opts.output.as_ref(), &*registry);
    }

    if let Some(hypothesis) = &opts.recommend {
        let ranked = KeywordAdvisor::default()
            .recommend(hypothesis, &registry)
            .await?;
        return write_json(opts.output.as_ref(), &ranked);
    }

    let Some(input) = &opts.input else {
        anyhow::bail!("no input file given");
    };
    let mut request = read_request(input)?;
    opts.request.apply(&mut request);

    let request_ctx = RequestContext::new(request.sequences.len());
    info!(
        "{request_ctx}: starting {} extraction of {} sequences",
        if request.is_windowed() { "windowed" } else { "global" },
        request.sequences.len()
    );

    let (cancel_handle, cancel) = cancellation();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted; stopping after the current batch");
            cancel_handle.cancel();
        }
    });

    let now = Instant::now();
    let mut progress = |ctx: &RequestContext, p: &BatchProgress| {
        info!("{ctx}: {} ({:.0}%)", p.stage, p.percent_complete);
    };
    let outcome = run_batched(
        &request_ctx,
        request,
        &registry,
        &opts.batch_config(),
        &cancel,
        &mut progress,
    )
    .await;

    match outcome {
        Ok(outcome) => {
            if outcome.status == BatchStatus::Stopped {
                warn!(
                    "{request_ctx}: writing partial results ({}/{} batches)",
                    outcome.completed_batches, outcome.total_batches
                );
            }
            if !outcome.response.errors.is_empty() {
                warn!(
                    "{request_ctx}: {} panel computations failed",
                    outcome.response.errors.len()
                );
            }
            write_json(opts.output.as_ref(), &outcome.response)?;
            info!("{request_ctx}: done. Took: {:.2?}", now.elapsed());
            Ok(())
        }
        Err(err @ BatchError::ResourceLimitExceeded { .. }) => {
            if let Some(partial) = err.partial() {
                write_json(opts.output.as_ref(), partial)?;
            }
            Err(err).context("extraction stopped early; partial results were written")
        }
        Err(err) => Err(err).context("extraction failed"),
    }
}
