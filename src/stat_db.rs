use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rusqlite::Connection;

const DATA_DIR: &str = "pac_stats";
const DB_FILE: &str = "bb_stats.db";

/// Database location: `PAC_STATS_DB` wins, then the XDG data dir, then
/// `~/.local/share`.
pub fn default_db_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("PAC_STATS_DB") {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }
    if let Ok(base) = std::env::var("XDG_DATA_HOME") {
        if !base.trim().is_empty() {
            return Some(PathBuf::from(base).join(DATA_DIR).join(DB_FILE));
        }
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(
        PathBuf::from(home)
            .join(".local")
            .join("share")
            .join(DATA_DIR)
            .join(DB_FILE),
    )
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let conn =
        Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
    init_schema(&conn)?;
    Ok(conn)
}

/// Audit schema. Section tables are created lazily by the schema manager on
/// first ingest; only the run log exists up front.
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        CREATE TABLE IF NOT EXISTS ingest_runs (
            run_id INTEGER PRIMARY KEY AUTOINCREMENT,
            started_at TEXT NOT NULL,
            finished_at TEXT NOT NULL,
            section TEXT NOT NULL,
            school TEXT NOT NULL,
            year INTEGER NOT NULL,
            rows_written INTEGER NOT NULL,
            rows_replaced INTEGER NOT NULL,
            records_skipped INTEGER NOT NULL,
            errors_json TEXT NOT NULL
        );
        "#,
    )
    .context("create sqlite schema")?;
    Ok(())
}
