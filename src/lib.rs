// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod categorize;
pub mod config;
pub mod crawl;
pub mod fetch;
pub mod notify;
pub mod payload;
pub mod pipeline;
pub mod resolve;
pub mod store;

// ---- Re-exports for stable public API ----
pub use crate::categorize::{CategorizeStrategy, CategorizedText, PositionalHeuristic};
pub use crate::config::Config;
pub use crate::pipeline::{Pacing, Pipeline, RunSummary};
pub use crate::store::{AdRepository, ResultStore};

use anyhow::Result;
use tracing::info;

use crate::fetch::HttpDetailFetcher;
use crate::store::recovery::RecoveryLog;
use crate::store::sqlite::SqliteRepository;

/// Wire the production collaborators from `cfg` and run one scrape.
///
/// Example usage from a binary (after tracing init):
/// ```ignore
/// let cfg = ad_copy_scraper::Config::load(None)?;
/// let summary = ad_copy_scraper::run_from_config(&cfg).await?;
/// ```
pub async fn run_from_config(cfg: &Config) -> Result<RunSummary> {
    let repo = SqliteRepository::open(&cfg.database.path)?;
    info!(db = %cfg.database.path.display(), "store opened");

    let fetcher = HttpDetailFetcher::new(cfg.fetch.timeout())?.with_retries(cfg.fetch.max_retries);
    let notifier = notify::notifier_from_config(&cfg.alert)?;
    let strategy = PositionalHeuristic;

    let pipeline = Pipeline {
        endpoint: &cfg.fetch.endpoint,
        fetcher: &fetcher,
        notifier: notifier.as_ref(),
        strategy: &strategy,
        pacing: Pacing {
            max_delay: cfg.fetch.max_delay(),
        },
    };

    let mut store = ResultStore::new(repo).with_recovery(RecoveryLog::new(&cfg.recovery.dir));
    pipeline.run(&mut store).await
}
