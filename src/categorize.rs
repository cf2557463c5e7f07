//! # Text Categorizer
//! Pure logic mapping flattened payload strings → `CategorizedText`.
//! No I/O.
//!
//! The upstream response has no documented shape, so the rules live behind
//! [`CategorizeStrategy`]. A new response layout gets a new strategy with its
//! own `version()` instead of edits to the current one.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Bookkeeping marker present in every details response; never ad text.
pub const SENTINEL_MARKER: &str = "pa.cdr";

pub const LINK_PREFIX: &str = "https:/";
pub const IMAGE_SUFFIXES: [&str; 2] = ["jpg", "png"];
pub const VIDEO_SUFFIXES: [&str; 1] = ["mp4"];
pub const FIELD_SEPARATOR: &str = " | ";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorizedText {
    pub title: String,
    pub body: String,
    pub advertiser_link: String,
    pub image_url: String,
    pub video_url: String,
    pub all_links: Vec<String>,
    pub unidentified_text: String,
}

pub trait CategorizeStrategy: Send + Sync {
    /// Stable identifier of the rule set, logged with each run.
    fn version(&self) -> &'static str;
    fn categorize(&self, leaves: &[String]) -> CategorizedText;
}

/// Keeps string leaves only, minus the sentinel marker.
pub fn relevant_text(leaves: &[Value]) -> Vec<String> {
    leaves
        .iter()
        .filter_map(Value::as_str)
        .filter(|s| *s != SENTINEL_MARKER)
        .map(str::to_string)
        .collect()
}

pub fn is_link(s: &str) -> bool {
    s.starts_with(LINK_PREFIX)
}

/// Rules as observed on the text-ad details payload in October 2018.
///
/// Links are collected (with image/video detection by suffix) and other
/// strings go to `unidentified_text`. When text shows up before any link and
/// there are more than three strings, the payload is a text ad and is read
/// positionally instead: last string is the advertiser link, the one before
/// is the body, everything ahead of those is the title. The positional
/// reading replaces the generic one entirely.
#[derive(Debug, Clone, Copy, Default)]
pub struct PositionalHeuristic;

impl PositionalHeuristic {
    const MIN_POSITIONAL_LEAVES: usize = 4;

    fn positional(leaves: &[String]) -> CategorizedText {
        let (head, tail) = leaves.split_at(leaves.len() - 2);
        CategorizedText {
            title: head.join(FIELD_SEPARATOR),
            body: tail[0].clone(),
            advertiser_link: tail[1].clone(),
            ..CategorizedText::default()
        }
    }
}

impl CategorizeStrategy for PositionalHeuristic {
    fn version(&self) -> &'static str {
        "2018-10-positional"
    }

    fn categorize(&self, leaves: &[String]) -> CategorizedText {
        let mut out = CategorizedText::default();
        let mut unidentified: Vec<&str> = Vec::new();
        let mut link_seen = false;
        let mut text_only = false;

        for leaf in leaves {
            if is_link(leaf) {
                link_seen = true;
                if IMAGE_SUFFIXES.iter().any(|sfx| leaf.ends_with(sfx)) {
                    out.image_url = leaf.clone();
                }
                if VIDEO_SUFFIXES.iter().any(|sfx| leaf.ends_with(sfx)) {
                    out.video_url = leaf.clone();
                }
                out.all_links.push(leaf.clone());
            } else {
                unidentified.push(leaf);
                if !link_seen {
                    text_only = true;
                }
            }
        }

        if text_only && leaves.len() >= Self::MIN_POSITIONAL_LEAVES {
            return Self::positional(leaves);
        }

        out.unidentified_text = unidentified.join(FIELD_SEPARATOR);
        out
    }
}
