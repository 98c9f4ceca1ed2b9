//! adc-decimator application.
//!
//! This module contains the top-level structure [`App`], which reads an input
//! sample file, runs it through the decimator and writes the decimated
//! samples.

use crate::{args::Args, driver::Driver, pipeline::Decimator};
use anyhow::{Context, Result};
use decimator_json::{Config, SampleFormat};
use std::path::{Path, PathBuf};

/// adc-decimator application.
#[derive(Debug)]
pub struct App {
    driver: Driver,
    input: PathBuf,
    output: Option<PathBuf>,
    format: SampleFormat,
    summary: bool,
}

impl App {
    /// Creates a new application.
    ///
    /// The decimator is configured with the configuration file given in the
    /// arguments, if any.
    #[tracing::instrument(name = "App::new", level = "debug")]
    pub fn new(args: &Args) -> Result<App> {
        let mut driver = Driver::new(Decimator::new()?);
        driver.set_timeout(args.timeout);
        if let Some(path) = &args.config {
            let config = read_config(path)?;
            driver
                .apply_config(&config)
                .with_context(|| format!("failed to apply {}", path.display()))?;
        }
        driver.set_enable(args.enable);
        Ok(App {
            driver,
            input: args.input.clone(),
            output: args.output.clone(),
            format: args.format,
            summary: args.summary,
        })
    }

    /// Runs the application.
    #[tracing::instrument(name = "App::run", level = "debug", skip_all)]
    pub fn run(mut self) -> Result<()> {
        let data = std::fs::read(&self.input)
            .with_context(|| format!("failed to read {}", self.input.display()))?;
        let input = parse_samples(&data, self.format)?;
        tracing::info!("read {} input samples", input.len());
        // let the enable pin be sampled
        self.driver.tick();
        if !self.driver.decimator().is_enabled() {
            tracing::warn!("decimator is disabled; input samples will be discarded");
        }
        let output = self.driver.process(&input)?;
        tracing::info!("produced {} output samples", output.len());
        if let Some(path) = &self.output {
            std::fs::write(path, format_samples(&output, self.format))
                .with_context(|| format!("failed to write {}", path.display()))?;
        }
        let outputs = self.driver.outputs();
        if outputs.error {
            tracing::warn!("decimator reported error: {}", outputs.error_type);
        }
        if self.summary {
            println!("{}", serde_json::to_string_pretty(&self.driver.summary())?);
        }
        Ok(())
    }
}

fn read_config(path: &Path) -> Result<Config> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    serde_json::from_reader(std::io::BufReader::new(file))
        .with_context(|| format!("failed to parse {}", path.display()))
}

/// Parses samples in the given format.
pub fn parse_samples(data: &[u8], format: SampleFormat) -> Result<Vec<i16>> {
    match format {
        SampleFormat::Raw => {
            if data.len() % 2 != 0 {
                anyhow::bail!("raw sample data has an odd number of bytes ({})", data.len());
            }
            Ok(data
                .chunks_exact(2)
                .map(|b| i16::from_le_bytes([b[0], b[1]]))
                .collect())
        }
        SampleFormat::Text => std::str::from_utf8(data)
            .context("text sample data is not UTF-8")?
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(n, line)| {
                line.trim()
                    .parse::<i16>()
                    .with_context(|| format!("invalid sample on line {}: {line:?}", n + 1))
            })
            .collect(),
    }
}

/// Formats samples in the given format.
pub fn format_samples(samples: &[i16], format: SampleFormat) -> Vec<u8> {
    match format {
        SampleFormat::Raw => samples.iter().flat_map(|s| s.to_le_bytes()).collect(),
        SampleFormat::Text => samples
            .iter()
            .map(|s| format!("{s}\n"))
            .collect::<String>()
            .into_bytes(),
    }
}
