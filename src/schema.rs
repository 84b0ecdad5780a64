use anyhow::{Context, Result, anyhow};
use rusqlite::Connection;

use crate::section::Section;

/// Columns every section table carries; stat fields may not shadow them.
pub const RESERVED_COLUMNS: [&str; 5] = ["id", "name", "school", "year", "canonical_key"];

/// Makes sure the section's table exists and carries every observed stat
/// field, adding missing columns as TEXT. Additive only: columns are never
/// dropped or renamed, so repeat calls with the same fields are no-ops.
///
/// Returns the table's full column list after the call, so callers hold the
/// known schema as an explicit value rather than re-deriving it.
pub fn ensure_table(
    conn: &Connection,
    section: Section,
    observed_fields: &[String],
) -> Result<Vec<String>> {
    for field in observed_fields {
        validate_field(field)?;
    }

    let table = section.table_name();
    conn.execute_batch(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {table} (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            school TEXT,
            year INTEGER,
            canonical_key TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_{table}_canonical ON {table}(canonical_key);
        "#
    ))
    .with_context(|| format!("create {table}"))?;

    let mut columns = table_columns(conn, section)?;
    for field in observed_fields {
        if columns.iter().any(|c| c == field) {
            continue;
        }
        conn.execute(
            &format!(r#"ALTER TABLE {table} ADD COLUMN "{field}" TEXT"#),
            [],
        )
        .with_context(|| format!("add column {field} to {table}"))?;
        columns.push(field.clone());
    }
    Ok(columns)
}

/// Column list for the section's table, in table order. Empty when the table
/// does not exist yet.
pub fn table_columns(conn: &Connection, section: Section) -> Result<Vec<String>> {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({})", section.table_name()))
        .context("prepare table_info")?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .context("query table_info")?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("decode table_info row")?);
    }
    Ok(out)
}

fn validate_field(field: &str) -> Result<()> {
    if RESERVED_COLUMNS.contains(&field) {
        return Err(anyhow!("stat field '{field}' collides with a reserved column"));
    }
    let mut chars = field.chars();
    let head_ok = chars
        .next()
        .is_some_and(|c| c.is_ascii_lowercase() || c == '_');
    if !head_ok || !chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_') {
        return Err(anyhow!("stat field '{field}' is not a safe column identifier"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mem_conn() -> Connection {
        Connection::open_in_memory().expect("in-memory sqlite")
    }

    #[test]
    fn ensure_table_is_idempotent() {
        let conn = mem_conn();
        let fields = vec!["ba".to_string(), "ab".to_string()];
        let first = ensure_table(&conn, Section::Hitting, &fields).expect("first call");
        let second = ensure_table(&conn, Section::Hitting, &fields).expect("second call");
        assert_eq!(first, second);
        assert!(first.iter().any(|c| c == "canonical_key"));
        assert!(first.iter().any(|c| c == "ba"));
    }

    #[test]
    fn ensure_table_grows_columns_additively() {
        let conn = mem_conn();
        ensure_table(&conn, Section::Hitting, &["ba".to_string()]).expect("initial");
        let grown =
            ensure_table(&conn, Section::Hitting, &["obp".to_string()]).expect("grow");
        assert!(grown.iter().any(|c| c == "ba"));
        assert!(grown.iter().any(|c| c == "obp"));
    }

    #[test]
    fn reserved_and_unsafe_fields_are_rejected() {
        let conn = mem_conn();
        assert!(ensure_table(&conn, Section::Hitting, &["canonical_key".to_string()]).is_err());
        assert!(ensure_table(&conn, Section::Hitting, &["ba; drop".to_string()]).is_err());
        assert!(ensure_table(&conn, Section::Hitting, &["1b".to_string()]).is_err());
    }
}
