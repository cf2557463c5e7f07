//! Offline check of the categorizer against a saved details response.
//! Usage: `payload-probe <saved-body-file>`

use anyhow::{Context, Result};

use ad_copy_scraper::categorize::relevant_text;
use ad_copy_scraper::payload::flatten_payload;
use ad_copy_scraper::{CategorizeStrategy, PositionalHeuristic};

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_target(false).init();

    let path = std::env::args()
        .nth(1)
        .context("usage: payload-probe <saved-body-file>")?;
    let body = std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;

    let leaves = flatten_payload(&body)?;
    let strings = relevant_text(&leaves);
    for (i, s) in strings.iter().enumerate() {
        println!("{i:>3}  {s}");
    }

    let strategy = PositionalHeuristic;
    let text = strategy.categorize(&strings);
    println!("\n[{}]", strategy.version());
    println!("{}", serde_json::to_string_pretty(&text)?);
    Ok(())
}
