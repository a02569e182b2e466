// Copyright 2021-2024 SecureDNA Stiftung (SecureDNA Foundation) <licensing@securedna.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `feature_extract` prints its JSON response on stdout, which callers pipe
//! into other tools, so every log line has to go to stderr instead.

use anyhow::{bail, Result};
use tracing::{info, Level};
use tracing_subscriber::{
    filter,
    fmt::{format::FmtSpan, time::OffsetTime, Layer},
    prelude::*,
};

pub fn log_level_from_count(verbosity_level: u8) -> Result<filter::LevelFilter> {
    Ok(match verbosity_level {
        0 => filter::LevelFilter::INFO,
        1 => filter::LevelFilter::DEBUG,
        2 => filter::LevelFilter::TRACE,
        _ => bail!("only log levels up to TRACE supported"),
    })
}

/// Our own crates log at `log_level`; dependencies only log warnings.
fn log_filter(log_level: filter::LevelFilter) -> filter::Targets {
    filter::Targets::new()
        .with_targets(vec![
            ("feature_cli", log_level),
            ("feature_extract", log_level),
            ("feature_engine", log_level),
        ])
        .with_default(Level::WARN)
}

/// Note: time offset should be initialized before any threading occurs, see
/// <https://docs.rs/tracing-subscriber/latest/tracing_subscriber/fmt/time/struct.OffsetTime.html>
pub fn init_log(log_level: filter::LevelFilter, time_offset: time::UtcOffset) -> Result<()> {
    let time_fmt = time::format_description::well_known::Iso8601::DEFAULT;
    let timer = OffsetTime::new(time_offset, time_fmt);

    let layer = Layer::new()
        .with_target(false)
        .with_timer(timer)
        .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(
            layer
                .with_writer(std::io::stderr)
                .with_filter(log_filter(log_level)),
        )
        .try_init()?;

    info!("Logging at level {}", log_level);

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn verbosity_maps_to_levels() {
        assert_eq!(log_level_from_count(0).unwrap(), filter::LevelFilter::INFO);
        assert_eq!(log_level_from_count(2).unwrap(), filter::LevelFilter::TRACE);
        assert!(log_level_from_count(3).is_err());
    }

    #[test]
    fn dependencies_stay_quiet() {
        let filter = log_filter(filter::LevelFilter::DEBUG);
        assert!(filter.would_enable("feature_engine::batch", &Level::DEBUG));
        assert!(filter.would_enable("feature_cli", &Level::INFO));
        assert!(!filter.would_enable("rayon_core", &Level::INFO));
        assert!(filter.would_enable("tokio", &Level::WARN));
    }
}
