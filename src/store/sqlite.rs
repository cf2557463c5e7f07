use std::path::Path;

use rusqlite::Connection;

use super::{AdRepository, FlushBatch, StoreError};
use crate::resolve::SourceReference;

pub struct SqliteRepository {
    conn: Connection,
}

impl SqliteRepository {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        let repo = Self { conn };
        repo.init_schema()?;
        Ok(repo)
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn init_schema(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS creative_stats (
                id      INTEGER PRIMARY KEY,
                ad_url  TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS ad_copies (
                advertisement_id     TEXT PRIMARY KEY,
                advertiser_id        TEXT NOT NULL,
                title                TEXT NOT NULL DEFAULT '',
                body                 TEXT NOT NULL DEFAULT '',
                advertiser_link      TEXT NOT NULL DEFAULT '',
                image_url            TEXT NOT NULL DEFAULT '',
                video_url            TEXT NOT NULL DEFAULT '',
                extra_unknown_string TEXT NOT NULL DEFAULT '',
                created_at           TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE IF NOT EXISTS ad_links (
                id               INTEGER PRIMARY KEY,
                advertisement_id TEXT NOT NULL,
                link             TEXT NOT NULL,
                UNIQUE(advertisement_id, link)
            );
            CREATE INDEX IF NOT EXISTS idx_ad_links_ad ON ad_links(advertisement_id);
            ",
        )?;
        Ok(())
    }

    /// Append rows to the stats table (seeding and tests).
    pub fn insert_source_urls<S: AsRef<str>>(&self, urls: &[S]) -> Result<usize, StoreError> {
        let tx = self.conn.unchecked_transaction()?;
        let mut count = 0;
        {
            let mut stmt = tx.prepare("INSERT INTO creative_stats (ad_url) VALUES (?1)")?;
            for url in urls {
                count += stmt.execute([url.as_ref()])?;
            }
        }
        tx.commit()?;
        Ok(count)
    }

    pub fn count_ad_copies(&self) -> Result<usize, StoreError> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM ad_copies", [], |r| r.get(0))?)
    }

    pub fn count_links(&self) -> Result<usize, StoreError> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM ad_links", [], |r| r.get(0))?)
    }
}

impl AdRepository for SqliteRepository {
    fn source_references(&self) -> Result<Vec<SourceReference>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT ad_url FROM creative_stats ORDER BY id")?;
        let rows = stmt
            .query_map([], |row| Ok(SourceReference::Row(vec![row.get(0)?])))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn persisted_ids(&self) -> Result<Vec<String>, StoreError> {
        let mut stmt = self.conn.prepare("SELECT advertisement_id FROM ad_copies")?;
        let rows = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(rows)
    }

    fn persist_batch(&self, batch: &FlushBatch) -> Result<(), StoreError> {
        // Dropping `tx` on any early return rolls both inserts back.
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut l_stmt =
                tx.prepare("INSERT INTO ad_links (advertisement_id, link) VALUES (?1, ?2)")?;
            for l in &batch.links {
                l_stmt.execute(rusqlite::params![l.creative_id, l.link])?;
            }

            let mut c_stmt = tx.prepare(
                "INSERT INTO ad_copies
                 (advertisement_id, advertiser_id, title, body, advertiser_link,
                  image_url, video_url, extra_unknown_string)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;
            for c in &batch.ad_copies {
                c_stmt.execute(rusqlite::params![
                    c.creative_id,
                    c.advertiser_id,
                    c.title,
                    c.body,
                    c.advertiser_link,
                    c.image_url,
                    c.video_url,
                    c.extra_unknown_string,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }
}
