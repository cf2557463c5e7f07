//! Ad copy scraper binary entrypoint.
//! Usage: `ad-copy-scraper [config.toml]`

use std::path::PathBuf;

use anyhow::Context;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ad_copy_scraper::{run_from_config, Config};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; SMTP_USER / SMTP_PASS usually live there.
    let _ = dotenvy::dotenv();
    init_tracing();

    let explicit = std::env::args().nth(1).map(PathBuf::from);
    let cfg = Config::load(explicit.as_deref()).context("loading configuration")?;

    let summary = run_from_config(&cfg).await?;
    println!(
        "{} references ({} malformed, {} already stored): {} fetched, {} failed, {} persisted",
        summary.references,
        summary.malformed,
        summary.already_persisted,
        summary.fetched,
        summary.failed,
        summary.persisted,
    );
    Ok(())
}
