//! adc-decimator CLI arguments.
//!
//! This module contains the definition of the CLI arguments for the
//! adc-decimator application.

use clap::Parser;
use decimator_json::SampleFormat;
use std::path::PathBuf;

/// adc-decimator CLI arguments.
#[derive(Parser, Debug, Clone, Eq, PartialEq, Hash)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// Input samples file
    #[clap(long)]
    pub input: PathBuf,
    /// Output samples file
    #[clap(long)]
    pub output: Option<PathBuf>,
    /// JSON configuration file, applied through register writes
    #[clap(long)]
    pub config: Option<PathBuf>,
    /// Drive the enable pin
    #[clap(long)]
    pub enable: bool,
    /// Format of the input and output samples (raw or text)
    #[clap(long, default_value = "raw", value_parser = parse_format)]
    pub format: SampleFormat,
    /// Print a JSON summary of the run
    #[clap(long)]
    pub summary: bool,
    /// Cycles to wait for a handshake before giving up
    #[clap(long, default_value_t = 1000)]
    pub timeout: u64,
}

fn parse_format(s: &str) -> Result<SampleFormat, String> {
    s.parse()
        .map_err(|()| format!("invalid sample format {s:?} (expected raw or text)"))
}
