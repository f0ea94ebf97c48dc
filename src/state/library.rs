use rusqlite::{params, Connection, Result as SqlResult};
use std::path::{Path, PathBuf};

use super::history::HistoryItem;

/// The Library keeps the session history in a SQLite catalog.
/// Each history item is stored as JSON next to a few indexed columns.
pub struct Library {
    conn: Connection,
    db_path: PathBuf,
}

impl Library {
    /// Open the catalog in the user's data directory.
    ///
    /// - Linux: ~/.local/share/archviz-studio/history.db
    /// - macOS: ~/Library/Application Support/archviz-studio/history.db
    /// - Windows: %APPDATA%\archviz-studio\history.db
    pub fn new() -> crate::error::Result<Self> {
        let db_path = Self::default_db_path()?;
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(Self::open(&db_path)?)
    }

    /// Open or create a catalog at an explicit path
    pub fn open(path: &Path) -> SqlResult<Self> {
        let conn = Connection::open(path)?;
        let mut library = Library {
            conn,
            db_path: path.to_path_buf(),
        };
        library.init_schema()?;
        tracing::info!("📁 History catalog ready at {}", path.display());
        Ok(library)
    }

    fn default_db_path() -> crate::error::Result<PathBuf> {
        let mut path = dirs::data_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| {
                crate::error::StudioError::Config("could not determine user data directory".into())
            })?;
        path.push("archviz-studio");
        path.push("history.db");
        Ok(path)
    }

    fn init_schema(&mut self) -> SqlResult<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS history (
                id          TEXT PRIMARY KEY,
                created_at  INTEGER NOT NULL,
                mode        TEXT NOT NULL,
                item_json   TEXT NOT NULL
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_history_created_at
             ON history(created_at DESC)",
            [],
        )?;

        Ok(())
    }

    /// Get the path to the database file
    pub fn path(&self) -> &PathBuf {
        &self.db_path
    }

    #[cfg(test)]
    pub fn count(&self) -> SqlResult<i64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM history", [], |row| row.get(0))
    }

    /// Store a completed history item
    pub fn append(&self, item: &HistoryItem) -> SqlResult<()> {
        let json = serde_json::to_string(item)
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
        self.conn.execute(
            "INSERT OR REPLACE INTO history (id, created_at, mode, item_json)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                item.id.to_string(),
                item.created_at.timestamp_millis(),
                item.mode.key(),
                json
            ],
        )?;
        Ok(())
    }

    /// Load the most recent `limit` items, oldest first.
    /// Rows that no longer parse are skipped.
    pub fn load_recent(&self, limit: usize) -> SqlResult<Vec<HistoryItem>> {
        let mut stmt = self.conn.prepare(
            "SELECT item_json FROM history ORDER BY created_at DESC, rowid DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map([limit as i64], |row| row.get::<_, String>(0))?;

        let mut items = Vec::new();
        for json in rows {
            match serde_json::from_str::<HistoryItem>(&json?) {
                Ok(item) => items.push(item),
                Err(err) => tracing::warn!("⚠️  Skipping unreadable history row: {err}"),
            }
        }
        items.reverse();
        Ok(items)
    }

    /// Delete everything but the newest `keep` items
    pub fn prune(&self, keep: usize) -> SqlResult<usize> {
        let removed = self.conn.execute(
            "DELETE FROM history WHERE id NOT IN (
                SELECT id FROM history ORDER BY created_at DESC, rowid DESC LIMIT ?1
            )",
            [keep as i64],
        )?;
        if removed > 0 {
            tracing::debug!("pruned {removed} old history items");
        }
        Ok(removed)
    }

    pub fn clear(&self) -> SqlResult<()> {
        self.conn.execute("DELETE FROM history", [])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::data::Mode;
    use chrono::Duration;

    fn item(prompt: &str, minutes_ago: i64) -> HistoryItem {
        let mut item = HistoryItem::new(Mode::Create, prompt)
            .with_images(1, vec!["data:image/png;base64,AAAA".into()]);
        item.created_at = item.created_at - Duration::minutes(minutes_ago);
        item
    }

    #[test]
    fn test_append_and_load_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let library = Library::open(&dir.path().join("history.db")).unwrap();

        library.append(&item("old", 10)).unwrap();
        library.append(&item("mid", 5)).unwrap();
        library.append(&item("new", 0)).unwrap();

        let loaded = library.load_recent(2).unwrap();
        let prompts: Vec<_> = loaded.iter().map(|i| i.prompt.as_str()).collect();
        assert_eq!(prompts, ["mid", "new"]);
        assert_eq!(library.count().unwrap(), 3);
    }

    #[test]
    fn test_prune_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let library = Library::open(&dir.path().join("history.db")).unwrap();
        for i in 0..4 {
            library.append(&item(&format!("p{i}"), 10 - i)).unwrap();
        }

        assert_eq!(library.prune(2).unwrap(), 2);
        let loaded = library.load_recent(10).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[1].prompt, "p3");

        library.clear().unwrap();
        assert_eq!(library.count().unwrap(), 0);
    }

    #[test]
    fn test_reopen_keeps_items() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.db");
        let stored = item("persisted", 0);
        {
            let library = Library::open(&path).unwrap();
            library.append(&stored).unwrap();
        }
        let library = Library::open(&path).unwrap();
        assert_eq!(library.load_recent(5).unwrap(), vec![stored]);
        assert_eq!(library.path(), &path);
    }
}
