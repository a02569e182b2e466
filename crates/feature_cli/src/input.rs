// Copyright 2021-2024 SecureDNA Stiftung (SecureDNA Foundation) <licensing@securedna.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Building an extraction request from an input file and command-line flags.

use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::{Args, ValueEnum};
use quickdna::{DnaSequence, FastaParseSettings, FastaParser, NucleotideAmbiguous};
use tracing::{info, warn};

use feature_types::{
    ExtractionRequest, PanelKind, PanelSetting, Region, SequenceInput, SingleWindowConfig,
    WindowConfig,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// A serialized `ExtractionRequest`.
    Json,
    Fasta,
}

impl InputFormat {
    pub fn detect(text: &str) -> Option<Self> {
        match text.trim_start().chars().next()? {
            '{' => Some(Self::Json),
            '>' => Some(Self::Fasta),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ScanDirection {
    Start,
    End,
    Both,
}

/// Flags that add to or override what the input file asks for.
#[derive(Debug, Clone, Args)]
pub struct RequestArgs {
    #[clap(
        long,
        action = clap::ArgAction::Set,
        value_delimiter = ',',
        help = "Panels to enable, e.g. 'sequence,codon_usage', or 'all'. Added to any panels the input file enables."
    )]
    pub panels: Vec<String>,

    #[clap(long, help = "Compute features per window of this many bases instead of per sequence")]
    pub window_size: Option<i64>,

    #[clap(long, default_value_t = 10, help = "Bases between consecutive windows")]
    pub step_size: i64,

    #[clap(long, value_enum, default_value_t = ScanDirection::Start, help = "Which end(s) of the sequence windows are anchored to")]
    pub direction: ScanDirection,

    #[clap(long, help = "Maximum windows per sequence and direction")]
    pub num_windows: Option<i64>,

    #[clap(long, help = "Codon usage reference set used for CAI")]
    pub reference_set: Option<String>,

    #[clap(long, help = "Restrict whole-sequence features to start at this index")]
    pub region_start: Option<usize>,

    #[clap(long, help = "Restrict whole-sequence features to end at this index")]
    pub region_end: Option<usize>,
}

impl RequestArgs {
    pub fn apply(&self, request: &mut ExtractionRequest) {
        for id in &self.panels {
            if id == "all" {
                for kind in PanelKind::ALL {
                    request.panels.set(kind.to_string(), PanelSetting::enabled());
                }
            } else {
                request.panels.set(id.clone(), PanelSetting::enabled());
            }
        }

        if let Some(window_size) = self.window_size {
            let mut scan = SingleWindowConfig::new(window_size, self.step_size);
            if let Some(num_windows) = self.num_windows {
                scan = scan.with_num_windows(num_windows);
            }
            request.window = Some(match self.direction {
                ScanDirection::Start => WindowConfig::from_start(scan),
                ScanDirection::End => WindowConfig::from_end(scan),
                ScanDirection::Both => WindowConfig::both(scan.clone(), scan),
            });
        }

        if let Some(reference_set) = &self.reference_set {
            request.reference_set = Some(reference_set.clone());
        }

        if self.region_start.is_some() || self.region_end.is_some() {
            request.region = Some(Region {
                start_index: self.region_start,
                end_index: self.region_end,
            });
        }
    }
}

/// Reads a JSON request or a FASTA file of nucleotide sequences. FASTA input
/// yields a request with no panels enabled.
pub fn read_request(path: &Path) -> Result<ExtractionRequest> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading input file {}", path.display()))?;
    match InputFormat::detect(&text) {
        Some(InputFormat::Json) => serde_json::from_str(&text)
            .with_context(|| format!("parsing request JSON in {}", path.display())),
        Some(InputFormat::Fasta) => {
            let sequences = parse_fasta(&text)
                .with_context(|| format!("parsing FASTA in {}", path.display()))?;
            info!("Read {} sequences from {}", sequences.len(), path.display());
            Ok(ExtractionRequest {
                sequences,
                ..Default::default()
            })
        }
        None => bail!(
            "{} is neither a JSON request nor a FASTA file",
            path.display()
        ),
    }
}

/// The first word of a FASTA header is the sequence id and the whole header
/// is its name. Records with no sequence are skipped.
pub fn parse_fasta(text: &str) -> Result<Vec<SequenceInput>> {
    let parser = FastaParser::<DnaSequence<NucleotideAmbiguous>>::new(
        FastaParseSettings::new()
            .concatenate_headers(true)
            .allow_preceding_comment(false),
    );
    let fasta = parser.parse_str(text)?;

    let mut sequences = vec![];
    for (index, record) in fasta.records.into_iter().enumerate() {
        let header = record.header.trim_start_matches('>').trim();
        let id = match header.split_whitespace().next() {
            Some(word) => word.to_owned(),
            None => format!("seq{}", index + 1),
        };
        if record.contents.is_empty() {
            warn!("Skipping FASTA record {id:?} with no sequence");
            continue;
        }
        let mut input = SequenceInput::new(id, record.contents.to_string());
        if !header.is_empty() {
            input = input.with_name(header);
        }
        sequences.push(input);
    }
    Ok(sequences)
}
