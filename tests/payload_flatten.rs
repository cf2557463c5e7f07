// tests/payload_flatten.rs
mod common;

use ad_copy_scraper::payload::{flatten_payload, strip_xssi_prefix, PayloadError, XSSI_PREFIX};
use serde_json::json;

#[test]
fn example_structure_flattens_depth_first() {
    let leaves = flatten_payload(r#"[["a", ["b", "c"]], "d"]"#).unwrap();
    assert_eq!(leaves, vec![json!("a"), json!("b"), json!("c"), json!("d")]);
}

#[test]
fn marker_is_removed_before_decoding() {
    let with = flatten_payload(&format!("{XSSI_PREFIX}[\"x\", [\"y\"]]")).unwrap();
    let without = flatten_payload("[\"x\", [\"y\"]]").unwrap();
    assert_eq!(with, without);
}

#[test]
fn body_without_marker_is_left_alone() {
    let body = "[1, 2]";
    assert_eq!(strip_xssi_prefix(body), body);
}

#[test]
fn reflattening_is_deterministic() {
    let body = common::fixture("text_ad.txt");
    let a = flatten_payload(&body).unwrap();
    let b = flatten_payload(&body).unwrap();
    assert_eq!(a, b);
    assert_eq!(a[0], json!("pa.cdr"));
    assert_eq!(a.last(), Some(&json!(3.5)));
}

#[test]
fn truncated_body_is_unparseable() {
    let body = common::fixture("image_ad.txt");
    let cut = &body[..body.len() / 2];
    assert!(matches!(
        flatten_payload(cut),
        Err(PayloadError::Unparseable(_))
    ));
}

#[test]
fn pathological_nesting_fails_without_overflow() {
    // serde_json refuses this before our own limit kicks in; either way it is
    // a clean error rather than a stack overflow.
    let body = format!("{}{}", "[".repeat(10_000), "]".repeat(10_000));
    assert!(flatten_payload(&body).is_err());
}
