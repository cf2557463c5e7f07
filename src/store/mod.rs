// src/store/mod.rs
pub mod memory;
pub mod recovery;
pub mod sqlite;

use std::collections::HashMap;

use metrics::counter;
use thiserror::Error;

use crate::categorize::CategorizedText;
use crate::resolve::SourceReference;
use crate::store::recovery::RecoveryLog;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("writing recovery artifact: {0}")]
    Recovery(#[from] std::io::Error),
    #[error("batch rejected: {0}")]
    Rejected(String),
    #[error("creative {0} is already persisted")]
    AlreadyPersisted(String),
}

/// Source rows in, classified ad copies out.
///
/// `persist_batch` must be all-or-nothing: link rows first, then ad-copy
/// rows, committed together.
pub trait AdRepository {
    fn source_references(&self) -> Result<Vec<SourceReference>, StoreError>;
    fn persisted_ids(&self) -> Result<Vec<String>, StoreError>;
    fn persist_batch(&self, batch: &FlushBatch) -> Result<(), StoreError>;
}

impl<T: AdRepository + ?Sized> AdRepository for &T {
    fn source_references(&self) -> Result<Vec<SourceReference>, StoreError> {
        (**self).source_references()
    }

    fn persisted_ids(&self) -> Result<Vec<String>, StoreError> {
        (**self).persisted_ids()
    }

    fn persist_batch(&self, batch: &FlushBatch) -> Result<(), StoreError> {
        (**self).persist_batch(batch)
    }
}

/// One creative's result, built once after a successful fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdCopy {
    pub creative_id: String,
    pub advertiser_id: String,
    pub text: CategorizedText,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreativeState {
    /// Registered for this run, no result yet.
    Pending,
    /// Present in the store before (or flushed during) this run.
    AlreadyPersisted,
    Fetched(AdCopy),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRecord {
    pub creative_id: String,
    pub link: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdCopyRecord {
    pub creative_id: String,
    pub advertiser_id: String,
    pub title: String,
    pub body: String,
    pub advertiser_link: String,
    pub image_url: String,
    pub video_url: String,
    pub extra_unknown_string: String,
}

impl From<&AdCopy> for AdCopyRecord {
    fn from(c: &AdCopy) -> Self {
        Self {
            creative_id: c.creative_id.clone(),
            advertiser_id: c.advertiser_id.clone(),
            title: c.text.title.clone(),
            body: c.text.body.clone(),
            advertiser_link: c.text.advertiser_link.clone(),
            image_url: c.text.image_url.clone(),
            video_url: c.text.video_url.clone(),
            extra_unknown_string: c.text.unidentified_text.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlushBatch {
    pub links: Vec<LinkRecord>,
    pub ad_copies: Vec<AdCopyRecord>,
}

impl FlushBatch {
    pub fn is_empty(&self) -> bool {
        self.ad_copies.is_empty()
    }
}

/// Dedup cache plus ordered accumulator in front of an [`AdRepository`].
pub struct ResultStore<R> {
    repo: R,
    states: HashMap<String, CreativeState>,
    order: Vec<String>,
    recovery: Option<RecoveryLog>,
}

impl<R: AdRepository> ResultStore<R> {
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            states: HashMap::new(),
            order: Vec::new(),
            recovery: None,
        }
    }

    pub fn with_recovery(mut self, log: RecoveryLog) -> Self {
        self.recovery = Some(log);
        self
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn into_repository(self) -> R {
        self.repo
    }

    /// Seed the cache with every creative id already in the store.
    pub fn preload(&mut self) -> Result<usize, StoreError> {
        let ids = self.repo.persisted_ids()?;
        let n = ids.len();
        for id in ids {
            self.states.insert(id, CreativeState::AlreadyPersisted);
        }
        tracing::debug!(cached = n, "dedup cache preloaded");
        Ok(n)
    }

    pub fn is_persisted(&self, creative_id: &str) -> bool {
        matches!(
            self.states.get(creative_id),
            Some(CreativeState::AlreadyPersisted)
        )
    }

    /// Mark a creative as in flight for this run.
    pub fn begin(&mut self, creative_id: &str) -> Result<(), StoreError> {
        match self.states.get(creative_id) {
            Some(CreativeState::AlreadyPersisted) => {
                Err(StoreError::AlreadyPersisted(creative_id.to_string()))
            }
            Some(_) => Ok(()),
            None => {
                self.states
                    .insert(creative_id.to_string(), CreativeState::Pending);
                self.order.push(creative_id.to_string());
                Ok(())
            }
        }
    }

    /// Store a finished result. Order of first registration is kept.
    pub fn record(&mut self, copy: AdCopy) -> Result<(), StoreError> {
        self.begin(&copy.creative_id)?;
        self.states
            .insert(copy.creative_id.clone(), CreativeState::Fetched(copy));
        Ok(())
    }

    fn fetched(&self) -> impl Iterator<Item = &AdCopy> {
        self.order.iter().filter_map(|id| match self.states.get(id) {
            Some(CreativeState::Fetched(copy)) => Some(copy),
            _ => None,
        })
    }

    /// Rows for every fetched creative, in accumulation order.
    pub fn batch(&self) -> FlushBatch {
        let mut batch = FlushBatch::default();
        for copy in self.fetched() {
            let mut seen: Vec<&str> = Vec::with_capacity(copy.text.all_links.len());
            for link in &copy.text.all_links {
                if seen.contains(&link.as_str()) {
                    continue;
                }
                seen.push(link);
                batch.links.push(LinkRecord {
                    creative_id: copy.creative_id.clone(),
                    link: link.clone(),
                });
            }
            batch.ad_copies.push(AdCopyRecord::from(copy));
        }
        batch
    }

    /// Persist everything fetched so far in one transaction.
    ///
    /// The recovery artifact is written before the transaction starts.
    /// Returns the number of ad copies written.
    pub fn flush(&mut self) -> Result<usize, StoreError> {
        let batch = self.batch();
        if batch.is_empty() {
            tracing::info!("nothing to flush");
            return Ok(0);
        }

        if let Some(log) = &self.recovery {
            let path = log.write(&batch)?;
            tracing::info!(path = %path.display(), "recovery artifact written");
        }

        self.repo.persist_batch(&batch)?;

        let n = batch.ad_copies.len();
        for row in &batch.ad_copies {
            self.states
                .insert(row.creative_id.clone(), CreativeState::AlreadyPersisted);
        }
        self.order
            .retain(|id| !matches!(self.states.get(id), Some(CreativeState::AlreadyPersisted)));

        counter!("scrape_persisted_total").increment(n as u64);
        tracing::info!(
            ad_copies = n,
            links = batch.links.len(),
            "flush committed"
        );
        Ok(n)
    }
}
