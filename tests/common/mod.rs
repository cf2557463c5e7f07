#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use ad_copy_scraper::crawl::CrawlTarget;
use ad_copy_scraper::fetch::{DetailFetcher, FetchError, RawPayload};
use ad_copy_scraper::notify::Notifier;
use async_trait::async_trait;

pub const ENDPOINT: &str = "https://api.example/details";

pub fn ad_url(advertiser: &str, creative: &str) -> String {
    format!(
        "https://transparencyreport.google.com/political-ads/library/advertiser/{advertiser}/creative/{creative}"
    )
}

pub fn fixture(name: &str) -> String {
    std::fs::read_to_string(format!("tests/fixtures/{name}"))
        .unwrap_or_else(|_| panic!("missing tests/fixtures/{name}"))
}

pub fn ok(body: String) -> Result<RawPayload, String> {
    Ok(RawPayload { status: 200, body })
}

/// Answers from a fixed table keyed by creative id; unknown ids get a 404.
#[derive(Default)]
pub struct ScriptedFetcher {
    responses: HashMap<String, Result<RawPayload, String>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    pub fn with(mut self, creative_id: &str, response: Result<RawPayload, String>) -> Self {
        self.responses.insert(creative_id.to_string(), response);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl DetailFetcher for ScriptedFetcher {
    async fn fetch(&self, target: &CrawlTarget) -> Result<RawPayload, FetchError> {
        self.calls
            .lock()
            .unwrap()
            .push(target.creative_id().to_string());
        match self.responses.get(target.creative_id()) {
            Some(Ok(p)) => Ok(p.clone()),
            Some(Err(message)) => Err(FetchError::Transport {
                url: target.fetch_url.clone(),
                message: message.clone(),
            }),
            None => Ok(RawPayload {
                status: 404,
                body: String::new(),
            }),
        }
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn report_failure(&self, message: &str) -> anyhow::Result<()> {
        self.messages.lock().unwrap().push(message.to_string());
        Ok(())
    }
}

/// A notifier whose channel is down.
pub struct BrokenNotifier;

#[async_trait]
impl Notifier for BrokenNotifier {
    async fn report_failure(&self, _message: &str) -> anyhow::Result<()> {
        anyhow::bail!("smtp unreachable")
    }
}
