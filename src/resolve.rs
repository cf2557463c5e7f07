//! Resolves `(advertiser_id, creative_id)` pairs out of stored ad library URLs.
//!
//! Canonical shape:
//! `https://transparencyreport.google.com/political-ads/library/advertiser/AR…/creative/CR…`

use thiserror::Error;

pub const ADVERTISER_PREFIX: &str = "AR";
pub const CREATIVE_PREFIX: &str = "CR";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("malformed reference: {0}")]
    MalformedReference(String),
}

/// Where a creative reference came from: a plain URL, or a one-column row
/// (what the stats table or the API echo hands back).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceReference {
    Url(String),
    Row(Vec<String>),
}

impl SourceReference {
    /// The URL-shaped string inside the reference.
    pub fn as_url(&self) -> Result<&str, ResolveError> {
        match self {
            SourceReference::Url(u) => Ok(u.as_str()),
            SourceReference::Row(cols) => match cols.as_slice() {
                [only] => Ok(only.as_str()),
                _ => Err(ResolveError::MalformedReference(format!(
                    "expected a single column, got {}",
                    cols.len()
                ))),
            },
        }
    }
}

impl From<&str> for SourceReference {
    fn from(s: &str) -> Self {
        SourceReference::Url(s.to_string())
    }
}

impl From<String> for SourceReference {
    fn from(s: String) -> Self {
        SourceReference::Url(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreativeReference {
    pub advertiser_id: String,
    pub creative_id: String,
    pub source_reference: String,
}

pub fn resolve(reference: &SourceReference) -> Result<CreativeReference, ResolveError> {
    let url = reference.as_url()?;
    let (advertiser_id, creative_id) = extract_ids(url)?;
    Ok(CreativeReference {
        advertiser_id: advertiser_id.to_string(),
        creative_id: creative_id.to_string(),
        source_reference: url.to_string(),
    })
}

/// Returns `(advertiser_id, creative_id)` borrowed from `url`.
pub fn extract_ids(url: &str) -> Result<(&str, &str), ResolveError> {
    let segments: Vec<&str> = url.split('/').collect();

    // .../advertiser/AR.../creative/CR...
    if segments.len() >= 3 {
        let advertiser = segments[segments.len() - 3];
        let creative = segments[segments.len() - 1];
        if advertiser.starts_with(ADVERTISER_PREFIX) && creative.starts_with(CREATIVE_PREFIX) {
            return Ok((advertiser, creative));
        }
    }

    let advertiser = segments
        .iter()
        .find(|s| s.starts_with(ADVERTISER_PREFIX))
        .copied();
    let creative = segments
        .iter()
        .find(|s| s.starts_with(CREATIVE_PREFIX))
        .copied();

    match (advertiser, creative) {
        (Some(a), Some(c)) => Ok((a, c)),
        (None, _) => Err(ResolveError::MalformedReference(format!(
            "no {ADVERTISER_PREFIX} segment in {url}"
        ))),
        (_, None) => Err(ResolveError::MalformedReference(format!(
            "no {CREATIVE_PREFIX} segment in {url}"
        ))),
    }
}
