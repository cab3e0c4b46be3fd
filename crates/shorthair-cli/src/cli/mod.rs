//! CLI for the shorthair downloader.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use shorthair_core::config;
use std::path::PathBuf;

use commands::{run_get, run_probe, GetArgs};

/// Top-level CLI for the shorthair downloader.
#[derive(Debug, Parser)]
#[command(name = "shorthair")]
#[command(about = "shorthair: multi-connection segmented downloader", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download a URL over several concurrent range connections.
    Get {
        /// Direct HTTP/HTTPS URL to download.
        url: String,

        /// Number of ranges / connections (default from config).
        #[arg(short = 'c', long, value_name = "N")]
        connections: Option<usize>,

        /// Disk writers per range (default from config).
        #[arg(short = 'w', long, value_name = "N")]
        writers: Option<usize>,

        /// Transfer buffer size in bytes (default from config).
        #[arg(short = 'b', long, value_name = "BYTES")]
        buffer_bytes: Option<usize>,

        /// Output path; derived from the URL when omitted.
        #[arg(short = 'o', long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Append `_<unix nanos>` to the output file name.
        #[arg(long)]
        timestamp: bool,

        /// Do not print progress.
        #[arg(short = 'q', long)]
        quiet: bool,
    },

    /// Check that a URL can be downloaded in ranges and print its size.
    Probe {
        /// Direct HTTP/HTTPS URL to probe.
        url: String,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Get {
                url,
                connections,
                writers,
                buffer_bytes,
                output,
                timestamp,
                quiet,
            } => {
                let args = GetArgs {
                    url,
                    connections,
                    writers,
                    buffer_bytes,
                    output,
                    timestamp,
                    quiet,
                };
                run_get(&cfg, args).await?
            }
            CliCommand::Probe { url } => run_probe(&cfg, &url).await?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
