//! `shorthair get` – download one URL.

use anyhow::{Context, Result};
use shorthair_core::config::ShorthairConfig;
use shorthair_core::{FetchOptions, Fetcher, ProgressStats};
use std::path::PathBuf;
use std::time::{Duration, Instant};

const PROGRESS_INTERVAL: Duration = Duration::from_millis(500);

/// Flags of `shorthair get`; `None` falls back to the config file.
#[derive(Debug, Clone, Default)]
pub struct GetArgs {
    pub url: String,
    pub connections: Option<usize>,
    pub writers: Option<usize>,
    pub buffer_bytes: Option<usize>,
    pub output: Option<PathBuf>,
    pub timestamp: bool,
    pub quiet: bool,
}

impl GetArgs {
    /// Config values with flags layered on top.
    pub fn options(&self, cfg: &ShorthairConfig) -> FetchOptions {
        let mut opts = FetchOptions::from_config(cfg);
        if let Some(n) = self.connections {
            opts.connections = n;
        }
        if let Some(n) = self.writers {
            opts.writers_per_range = n;
        }
        if let Some(n) = self.buffer_bytes {
            opts.buffer_bytes = n;
        }
        opts.output = self.output.clone();
        opts.timestamp_suffix |= self.timestamp;
        opts
    }
}

pub async fn run_get(cfg: &ShorthairConfig, args: GetArgs) -> Result<()> {
    let opts = args.options(cfg);
    let fetcher = Fetcher::new(args.url.as_str(), opts)
        .await
        .with_context(|| format!("cannot download {}", args.url))?;
    tracing::info!(url = %args.url, total = fetcher.total_length(), "starting download");

    let started = Instant::now();
    let download = fetcher.start();
    tokio::pin!(download);
    let mut ticker = tokio::time::interval(PROGRESS_INTERVAL);
    ticker.tick().await;

    let result = loop {
        tokio::select! {
            result = &mut download => break result,
            _ = ticker.tick() => {
                if !args.quiet {
                    print_progress(&fetcher.snapshot(started.elapsed()));
                }
            }
        }
    };
    let path = result.with_context(|| format!("download of {} failed", args.url))?;

    if !args.quiet {
        print_progress(&fetcher.snapshot(started.elapsed()));
        eprintln!();
    }
    println!("{}", path.display());
    Ok(())
}

fn print_progress(stats: &ProgressStats) {
    eprint!("\r{}", format_progress(stats));
}

pub(crate) fn format_progress(stats: &ProgressStats) -> String {
    let done_mib = stats.bytes_done as f64 / 1_048_576.0;
    let total_mib = stats.total_bytes as f64 / 1_048_576.0;
    let pct = stats.fraction() * 100.0;
    let rate_mib = stats.bytes_per_sec() / 1_048_576.0;
    let eta = stats
        .eta_secs()
        .map(|s| format!("{:.0}s", s))
        .unwrap_or_else(|| "?".to_string());
    format!(
        "  {:.1} / {:.1} MiB ({:.1}%)  {:.2} MiB/s  ETA {}  ",
        done_mib, total_mib, pct, rate_mib, eta
    )
}
