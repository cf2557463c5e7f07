//! Decoding of creative detail responses.
//!
//! The details endpoint answers with `)]}'` followed by a JSON document made of
//! nested arrays with no stable schema. Only the scalar leaves matter, in the
//! order a depth-first, left-to-right walk meets them.

use metrics::histogram;
use serde_json::Value;
use thiserror::Error;

/// Anti-JSON-hijacking marker prepended by the upstream API.
pub const XSSI_PREFIX: &str = ")]}'";

/// Deepest array nesting accepted. Kept below serde_json's own recursion
/// limit (128) so oversized input gets a dedicated error.
pub const MAX_NESTING_DEPTH: usize = 96;

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("unparseable payload: {0}")]
    Unparseable(#[from] serde_json::Error),
    #[error("payload nested deeper than {} levels", MAX_NESTING_DEPTH)]
    TooDeep,
}

/// Removes the anti-hijacking marker if the body starts with it.
pub fn strip_xssi_prefix(body: &str) -> &str {
    body.strip_prefix(XSSI_PREFIX).unwrap_or(body)
}

/// Strip, decode and flatten a raw response body.
pub fn flatten_payload(body: &str) -> Result<Vec<Value>, PayloadError> {
    let t0 = std::time::Instant::now();
    let decoded: Value = serde_json::from_str(strip_xssi_prefix(body))?;
    let leaves = flatten(decoded)?;
    histogram!("scrape_flatten_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
    Ok(leaves)
}

/// Flatten nested arrays into their non-array leaves.
///
/// Walks with an explicit stack of iterators, so depth is bounded by
/// [`MAX_NESTING_DEPTH`] rather than by the thread's stack size. Objects,
/// numbers, booleans and nulls are all leaves; only arrays are descended into.
pub fn flatten(root: Value) -> Result<Vec<Value>, PayloadError> {
    let items = match root {
        Value::Array(items) => items,
        scalar => return Ok(vec![scalar]),
    };

    let mut out = Vec::new();
    let mut stack = vec![items.into_iter()];

    while let Some(top) = stack.last_mut() {
        match top.next() {
            Some(Value::Array(inner)) => {
                if stack.len() >= MAX_NESTING_DEPTH {
                    return Err(PayloadError::TooDeep);
                }
                stack.push(inner.into_iter());
            }
            Some(leaf) => out.push(leaf),
            None => {
                stack.pop();
            }
        }
    }

    Ok(out)
}
