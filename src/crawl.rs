// src/crawl.rs
use std::collections::BTreeMap;

use metrics::counter;

use crate::resolve::{resolve, CreativeReference, ResolveError, SourceReference};
use crate::store::{AdRepository, ResultStore};

pub const DEFAULT_DETAILS_ENDPOINT: &str =
    "https://transparencyreport.google.com/transparencyreport/api/v3/politicalads/creatives/details";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTarget {
    pub fetch_url: String,
    pub reference: CreativeReference,
}

impl CrawlTarget {
    pub fn new(endpoint: &str, reference: CreativeReference) -> Self {
        let fetch_url = details_url(endpoint, &reference.advertiser_id, &reference.creative_id);
        Self {
            fetch_url,
            reference,
        }
    }

    pub fn creative_id(&self) -> &str {
        &self.reference.creative_id
    }
}

pub fn details_url(endpoint: &str, advertiser_id: &str, creative_id: &str) -> String {
    format!("{endpoint}?entity_id={advertiser_id}&creative_id={creative_id}")
}

/// Distinct creatives to crawl, keyed (and iterated) by creative id.
#[derive(Debug, Default)]
pub struct CrawlSet {
    targets: BTreeMap<String, CrawlTarget>,
    rejected: Vec<(String, ResolveError)>,
}

impl CrawlSet {
    /// Resolve every reference. A creative listed under several stat rows
    /// keeps the last one seen; unresolvable references are set aside.
    pub fn build<I>(references: I, endpoint: &str) -> Self
    where
        I: IntoIterator<Item = SourceReference>,
    {
        let mut set = CrawlSet::default();
        for source in references {
            match resolve(&source) {
                Ok(reference) => {
                    let target = CrawlTarget::new(endpoint, reference);
                    set.targets.insert(target.creative_id().to_string(), target);
                }
                Err(e) => {
                    let raw = source.as_url().unwrap_or("<row>").to_string();
                    tracing::warn!(reference = %raw, error = %e, "skipping unresolvable reference");
                    counter!("scrape_malformed_refs_total").increment(1);
                    set.rejected.push((raw, e));
                }
            }
        }
        set
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn get(&self, creative_id: &str) -> Option<&CrawlTarget> {
        self.targets.get(creative_id)
    }

    pub fn rejected(&self) -> &[(String, ResolveError)] {
        &self.rejected
    }

    pub fn iter(&self) -> impl Iterator<Item = &CrawlTarget> {
        self.targets.values()
    }

    /// Targets whose creative is not yet in the store.
    pub fn pending<'a, R: AdRepository>(
        &'a self,
        store: &'a ResultStore<R>,
    ) -> impl Iterator<Item = &'a CrawlTarget> + 'a {
        self.targets
            .values()
            .filter(move |t| !store.is_persisted(t.creative_id()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EP: &str = "https://api.example/details";

    fn url(ar: &str, cr: &str) -> SourceReference {
        SourceReference::Url(format!(
            "https://transparencyreport.google.com/political-ads/library/advertiser/{ar}/creative/{cr}"
        ))
    }

    #[test]
    fn builds_fetch_url_from_ids() {
        let set = CrawlSet::build(vec![url("AR1", "CR1")], EP);
        let t = set.get("CR1").unwrap();
        assert_eq!(t.fetch_url, "https://api.example/details?entity_id=AR1&creative_id=CR1");
        assert_eq!(t.reference.advertiser_id, "AR1");
    }

    #[test]
    fn duplicates_collapse_last_wins() {
        let set = CrawlSet::build(vec![url("AR1", "CR9"), url("AR2", "CR9")], EP);
        assert_eq!(set.len(), 1);
        assert_eq!(set.get("CR9").unwrap().reference.advertiser_id, "AR2");
    }

    #[test]
    fn malformed_references_are_rejected_not_fatal() {
        let refs = vec![
            SourceReference::Url("https://nowhere.example/nothing".into()),
            url("AR1", "CR1"),
        ];
        let set = CrawlSet::build(refs, EP);
        assert_eq!(set.len(), 1);
        assert_eq!(set.rejected().len(), 1);
        assert_eq!(set.rejected()[0].0, "https://nowhere.example/nothing");
    }

    #[test]
    fn only_malformed_input_leaves_set_empty() {
        let set = CrawlSet::build(
            vec![SourceReference::Row(vec!["a".into(), "b".into()])],
            EP,
        );
        assert!(set.is_empty());
        assert_eq!(set.rejected()[0].0, "<row>");
    }

    #[test]
    fn iteration_is_ordered_by_creative_id() {
        let set = CrawlSet::build(vec![url("AR1", "CR3"), url("AR1", "CR1"), url("AR1", "CR2")], EP);
        let ids: Vec<&str> = set.iter().map(|t| t.creative_id()).collect();
        assert_eq!(ids, vec!["CR1", "CR2", "CR3"]);
    }
}
