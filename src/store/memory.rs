use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use super::{AdCopyRecord, AdRepository, FlushBatch, LinkRecord, StoreError};
use crate::resolve::SourceReference;

/// In-memory repository for tests and dry runs.
///
/// Batches are applied to a copy and swapped in only when both record sets
/// went through, so a failed batch leaves no trace.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    sources: Vec<String>,
    ad_copies: Mutex<Vec<AdCopyRecord>>,
    links: Mutex<Vec<LinkRecord>>,
    fail_ad_copy_insert: AtomicBool,
    commits: AtomicUsize,
}

impl MemoryRepository {
    pub fn with_sources<S: AsRef<str>>(urls: &[S]) -> Self {
        Self {
            sources: urls.iter().map(|u| u.as_ref().to_string()).collect(),
            ..Self::default()
        }
    }

    /// Pretend these creatives were stored by an earlier run.
    pub fn already_persisted(self, ids: &[&str]) -> Self {
        {
            let mut rows = self.ad_copies.lock().expect("memory repository mutex poisoned");
            for id in ids {
                rows.push(AdCopyRecord {
                    creative_id: id.to_string(),
                    advertiser_id: String::new(),
                    title: String::new(),
                    body: String::new(),
                    advertiser_link: String::new(),
                    image_url: String::new(),
                    video_url: String::new(),
                    extra_unknown_string: String::new(),
                });
            }
        }
        self
    }

    /// Make the ad-copy half of the next batches fail after the links went in.
    pub fn fail_ad_copy_inserts(&self, fail: bool) {
        self.fail_ad_copy_insert.store(fail, Ordering::SeqCst);
    }

    pub fn ad_copies(&self) -> Vec<AdCopyRecord> {
        self.ad_copies.lock().expect("memory repository mutex poisoned").clone()
    }

    pub fn links(&self) -> Vec<LinkRecord> {
        self.links.lock().expect("memory repository mutex poisoned").clone()
    }

    pub fn commits(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }
}

impl AdRepository for MemoryRepository {
    fn source_references(&self) -> Result<Vec<SourceReference>, StoreError> {
        Ok(self
            .sources
            .iter()
            .map(|u| SourceReference::Row(vec![u.clone()]))
            .collect())
    }

    fn persisted_ids(&self) -> Result<Vec<String>, StoreError> {
        Ok(self
            .ad_copies
            .lock()
            .expect("memory repository mutex poisoned")
            .iter()
            .map(|r| r.creative_id.clone())
            .collect())
    }

    fn persist_batch(&self, batch: &FlushBatch) -> Result<(), StoreError> {
        let mut links = self.links.lock().expect("memory repository mutex poisoned");
        let mut copies = self.ad_copies.lock().expect("memory repository mutex poisoned");

        let mut staged_links = links.clone();
        staged_links.extend(batch.links.iter().cloned());

        if self.fail_ad_copy_insert.load(Ordering::SeqCst) {
            return Err(StoreError::Rejected("ad copy insert failed".into()));
        }

        let mut staged_copies = copies.clone();
        for row in &batch.ad_copies {
            if staged_copies.iter().any(|c| c.creative_id == row.creative_id) {
                return Err(StoreError::Rejected(format!(
                    "duplicate advertisement_id {}",
                    row.creative_id
                )));
            }
            staged_copies.push(row.clone());
        }

        *links = staged_links;
        *copies = staged_copies;
        self.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
