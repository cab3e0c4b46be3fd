//! `shorthair probe` – check range support and report the size.

use anyhow::{Context, Result};
use shorthair_core::config::ShorthairConfig;
use shorthair_core::{FetchOptions, HttpSource, RangeSource};

pub async fn run_probe(cfg: &ShorthairConfig, url: &str) -> Result<()> {
    let opts = FetchOptions::from_config(cfg);
    let source = HttpSource::new(opts.http);
    let total = source
        .discover(url)
        .await
        .with_context(|| format!("probe of {} failed", url))?;
    tracing::info!(url, total, "probe ok");
    println!("{}\t{} bytes\tranges: yes", url, total);
    Ok(())
}
