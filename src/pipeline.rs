// src/pipeline.rs
//! One scrape run: resolve → crawl set → fetch → flatten → categorize →
//! accumulate → single flush. Strictly sequential.

use std::time::Duration;

use anyhow::{Context, Result};
use metrics::{counter, describe_counter, describe_histogram};
use once_cell::sync::OnceCell;
use rand::Rng;

use crate::categorize::{relevant_text, CategorizeStrategy};
use crate::crawl::{CrawlSet, CrawlTarget};
use crate::fetch::DetailFetcher;
use crate::notify::Notifier;
use crate::payload::flatten_payload;
use crate::store::{AdCopy, AdRepository, ResultStore};

/// One-time metrics registration.
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("scrape_fetch_total", "Creative detail requests issued.");
        describe_counter!(
            "scrape_fetch_errors_total",
            "Fetches that failed or answered non-200."
        );
        describe_counter!(
            "scrape_payload_errors_total",
            "Bodies that could not be decoded or flattened."
        );
        describe_counter!(
            "scrape_malformed_refs_total",
            "Stored references without AR/CR identifiers."
        );
        describe_counter!("scrape_persisted_total", "Ad copies committed to the store.");
        describe_histogram!("scrape_flatten_ms", "Payload flatten time in milliseconds.");
    });
}

/// Random pause between fetch cycles, to go easy on the upstream API.
#[derive(Debug, Clone, Copy)]
pub struct Pacing {
    pub max_delay: Duration,
}

impl Pacing {
    pub fn none() -> Self {
        Self {
            max_delay: Duration::ZERO,
        }
    }

    fn next_delay(&self) -> Duration {
        let max_ms = self.max_delay.as_millis() as u64;
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::rng().random_range(0..=max_ms))
    }

    async fn pause(&self) {
        let d = self.next_delay();
        if !d.is_zero() {
            tokio::time::sleep(d).await;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub references: usize,
    pub malformed: usize,
    pub already_persisted: usize,
    pub fetched: usize,
    pub failed: usize,
    pub persisted: usize,
}

/// Why a single creative was dropped from the run.
#[derive(Debug)]
enum Skip {
    Transport(String),
    Status(u16),
    Payload(String),
}

impl Skip {
    fn alert_text(&self, target: &CrawlTarget) -> String {
        match self {
            Skip::Transport(e) => format!("Error: {e} ({})", target.fetch_url),
            Skip::Status(code) => format!(
                "Not 200 code ({code}) on {}",
                target.reference.source_reference
            ),
            Skip::Payload(e) => format!(
                "Unparseable payload for {}: {e} ({})",
                target.creative_id(),
                target.fetch_url
            ),
        }
    }
}

pub struct Pipeline<'a> {
    pub endpoint: &'a str,
    pub fetcher: &'a dyn DetailFetcher,
    pub notifier: &'a dyn Notifier,
    pub strategy: &'a dyn CategorizeStrategy,
    pub pacing: Pacing,
}

impl<'a> Pipeline<'a> {
    /// Run once against `store`. Store failures abort the run; per-creative
    /// failures are alerted and skipped.
    pub async fn run<R: AdRepository>(&self, store: &mut ResultStore<R>) -> Result<RunSummary> {
        ensure_metrics_described();

        let references = store
            .repository()
            .source_references()
            .context("reading source references")?;
        let cached = store.preload().context("preloading persisted creative ids")?;

        let crawl = CrawlSet::build(references.iter().cloned(), self.endpoint);
        if crawl.is_empty() {
            tracing::warn!(references = references.len(), "no resolvable creative references");
        }
        let pending: Vec<CrawlTarget> = crawl.pending(store).cloned().collect();

        let mut summary = RunSummary {
            references: references.len(),
            malformed: crawl.rejected().len(),
            already_persisted: crawl.len() - pending.len(),
            ..RunSummary::default()
        };

        tracing::info!(
            references = summary.references,
            distinct = crawl.len(),
            cached,
            pending = pending.len(),
            strategy = self.strategy.version(),
            "crawl set ready"
        );

        for (i, target) in pending.iter().enumerate() {
            if i > 0 {
                self.pacing.pause().await;
            }

            store.begin(target.creative_id())?;
            match self.process(target).await {
                Ok(copy) => {
                    store.record(copy)?;
                    summary.fetched += 1;
                }
                Err(skip) => {
                    summary.failed += 1;
                    self.alert(&skip.alert_text(target)).await;
                }
            }
        }

        summary.persisted = store.flush().context("flushing ad copies")?;

        tracing::info!(
            fetched = summary.fetched,
            failed = summary.failed,
            persisted = summary.persisted,
            "run finished"
        );
        Ok(summary)
    }

    async fn process(&self, target: &CrawlTarget) -> Result<AdCopy, Skip> {
        let creative_id = target.creative_id();

        let payload = match self.fetcher.fetch(target).await {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(creative_id, error = %e, "fetch failed");
                counter!("scrape_fetch_errors_total").increment(1);
                return Err(Skip::Transport(e.to_string()));
            }
        };

        if !payload.is_ok() {
            tracing::warn!(creative_id, status = payload.status, "non-200 response");
            counter!("scrape_fetch_errors_total").increment(1);
            return Err(Skip::Status(payload.status));
        }

        let leaves = flatten_payload(&payload.body).map_err(|e| {
            tracing::warn!(creative_id, error = %e, "payload rejected");
            counter!("scrape_payload_errors_total").increment(1);
            Skip::Payload(e.to_string())
        })?;

        let text = self.strategy.categorize(&relevant_text(&leaves));
        tracing::debug!(
            creative_id,
            leaves = leaves.len(),
            links = text.all_links.len(),
            "categorized"
        );

        Ok(AdCopy {
            creative_id: creative_id.to_string(),
            advertiser_id: target.reference.advertiser_id.clone(),
            text,
        })
    }

    async fn alert(&self, message: &str) {
        if let Err(e) = self.notifier.report_failure(message).await {
            tracing::warn!(error = ?e, "alert delivery failed");
        }
    }
}
