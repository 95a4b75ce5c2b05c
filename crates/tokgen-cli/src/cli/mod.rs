//! CLI for the tokgen batch token client.

mod commands;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use tokgen_core::{config, logging};

use commands::{run_config, run_fetch, run_regions};

/// Top-level CLI for tokgen.
#[derive(Debug, Parser)]
#[command(name = "tokgen")]
#[command(
    about = "tokgen: exchange account lists for tokens with paced, bounded retries",
    long_about = None
)]
pub struct Cli {
    /// Use this config file instead of ~/.config/tokgen/config.toml.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// More log detail (-v, -vv). RUST_LOG overrides.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Log to stderr instead of the state-dir log file.
    #[arg(long, global = true)]
    pub log_stderr: bool,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Generate tokens for every configured region (paced, then sequential fallback).
    Run {
        /// Concurrent requests per region (overrides config).
        #[arg(long, value_name = "N")]
        concurrency: Option<usize>,
        /// Skip the paced strategy and run regions back-to-back once.
        #[arg(long)]
        sequential: bool,
    },

    /// Generate tokens for a single account list.
    Fetch {
        /// JSON array of {"uid", "password"} objects.
        input: PathBuf,
        /// Where to write the JSON array of {"token"} objects.
        output: PathBuf,
        /// Label used in logs and the report.
        #[arg(long, default_value = "REGION")]
        region: String,
        /// Concurrent requests (overrides config).
        #[arg(long, value_name = "N")]
        concurrency: Option<usize>,
    },

    /// Show the config file location and effective settings.
    Config,
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        if cli.log_stderr {
            logging::init(&logging::LogTarget::Stderr, cli.verbose)?;
        } else {
            logging::init_default(cli.verbose);
        }

        let cfg = match &cli.config {
            Some(path) => config::load_from_path(path)?,
            None => config::load_or_init()?,
        };
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Run {
                concurrency,
                sequential,
            } => run_regions(&cfg, concurrency, sequential).await?,
            CliCommand::Fetch {
                input,
                output,
                region,
                concurrency,
            } => run_fetch(&cfg, input, output, region, concurrency).await?,
            CliCommand::Config => run_config(&cfg, cli.config.as_deref())?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
