// tests/categorize_examples.rs
mod common;

use ad_copy_scraper::categorize::relevant_text;
use ad_copy_scraper::payload::flatten_payload;
use ad_copy_scraper::{CategorizeStrategy, CategorizedText, PositionalHeuristic};

fn categorize_fixture(name: &str) -> CategorizedText {
    let leaves = flatten_payload(&common::fixture(name)).expect("fixture parses");
    PositionalHeuristic.categorize(&relevant_text(&leaves))
}

fn strings(v: &[&str]) -> Vec<String> {
    v.iter().map(|s| s.to_string()).collect()
}

#[test]
fn four_leaf_text_ad() {
    let out = PositionalHeuristic.categorize(&strings(&[
        "Part1",
        "Part2",
        "Body text",
        "https://advertiser.example/page",
    ]));
    assert_eq!(out.title, "Part1 | Part2");
    assert_eq!(out.body, "Body text");
    assert_eq!(out.advertiser_link, "https://advertiser.example/page");
    assert!(out.all_links.is_empty());
}

#[test]
fn two_link_image_ad() {
    let out = PositionalHeuristic.categorize(&strings(&[
        "https://cdn.example/img.jpg",
        "https://advertiser.example/page",
    ]));
    assert_eq!(out.image_url, "https://cdn.example/img.jpg");
    assert_eq!(
        out.all_links,
        strings(&["https://cdn.example/img.jpg", "https://advertiser.example/page"])
    );
    assert_eq!(out.title, "");
    assert_eq!(out.body, "");
    assert_eq!(out.advertiser_link, "");
}

#[test]
fn text_ad_fixture() {
    let out = categorize_fixture("text_ad.txt");
    assert_eq!(out.title, "Vote Smith for Senate | Paid for by Smith 2018");
    assert_eq!(out.body, "Lower taxes, better schools. Join us.");
    assert_eq!(out.advertiser_link, "https://www.smithforsenate.example/donate");
}

#[test]
fn image_ad_fixture() {
    let out = categorize_fixture("image_ad.txt");
    assert_eq!(
        out.image_url,
        "https://tpc.googlesyndication.example/simgad/123.png"
    );
    assert_eq!(out.all_links.len(), 2);
    assert_eq!(out.unidentified_text, "");
}

#[test]
fn video_ad_fixture() {
    let out = categorize_fixture("video_ad.txt");
    assert_eq!(out.video_url, "https://cdn.example/spot.mp4");
    assert_eq!(out.image_url, "");
    assert_eq!(out.unidentified_text, "Watch the debate recap");
    assert_eq!(out.title, "");
}

#[test]
fn strategy_reports_version() {
    assert_eq!(PositionalHeuristic.version(), "2018-10-positional");
}
