//! Plain-text dump of a flush, written before the transaction runs.
//!
//! If the flush dies halfway the file can be replayed by hand with any
//! SQL client.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;

use chrono::Utc;

use super::FlushBatch;

#[derive(Debug, Clone)]
pub struct RecoveryLog {
    dir: PathBuf,
}

impl RecoveryLog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Write `batch` to a new timestamped file and return its path.
    pub fn write(&self, batch: &FlushBatch) -> io::Result<PathBuf> {
        let stamp = Utc::now().format("%Y%m%dT%H%M%S%.3fZ").to_string();
        self.write_stamped(&stamp, batch)
    }

    /// Never overwrites: a taken name gets a `-1`, `-2`, ... suffix.
    fn write_stamped(&self, stamp: &str, batch: &FlushBatch) -> io::Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let sql = render_sql(batch);
        let mut n = 0u32;
        loop {
            let name = if n == 0 {
                format!("flush-{stamp}.sql")
            } else {
                format!("flush-{stamp}-{n}.sql")
            };
            let path = self.dir.join(name);
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    file.write_all(sql.as_bytes())?;
                    file.sync_all()?;
                    return Ok(path);
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => n += 1,
                Err(e) => return Err(e),
            }
        }
    }
}

fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// The two batch inserts, links first.
pub fn render_sql(batch: &FlushBatch) -> String {
    let mut out = String::new();

    if !batch.links.is_empty() {
        let rows: Vec<String> = batch
            .links
            .iter()
            .map(|l| format!("({}, {})", quote(&l.creative_id), quote(&l.link)))
            .collect();
        out.push_str("INSERT INTO ad_links (advertisement_id, link) VALUES\n  ");
        out.push_str(&rows.join(",\n  "));
        out.push_str(";\n\n");
    }

    if !batch.ad_copies.is_empty() {
        let rows: Vec<String> = batch
            .ad_copies
            .iter()
            .map(|r| {
                format!(
                    "({}, {}, {}, {}, {}, {}, {}, {})",
                    quote(&r.creative_id),
                    quote(&r.advertiser_id),
                    quote(&r.title),
                    quote(&r.body),
                    quote(&r.advertiser_link),
                    quote(&r.image_url),
                    quote(&r.video_url),
                    quote(&r.extra_unknown_string),
                )
            })
            .collect();
        out.push_str(
            "INSERT INTO ad_copies (advertisement_id, advertiser_id, title, body, \
             advertiser_link, image_url, video_url, extra_unknown_string) VALUES\n  ",
        );
        out.push_str(&rows.join(",\n  "));
        out.push_str(";\n");
    }

    out
}
