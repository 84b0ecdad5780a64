use std::collections::{BTreeMap, HashSet};

use anyhow::{Context, Result};
use rusqlite::{Connection, Row, Statement, params};

use crate::canonical::{key_from_tokens, name_tokens};
use crate::section::Section;

/// One stored row. Stat values are the raw scraped text; numeric coercion
/// happens per display via [`clean_stat`] and [`trend_series`], never in the
/// store.
#[derive(Debug, Clone)]
pub struct StatRow {
    pub id: i64,
    pub name: String,
    pub school: String,
    pub year: i32,
    pub canonical_key: String,
    pub stats: BTreeMap<String, Option<String>>,
}

/// Name-based lookup, ordered by year ascending.
///
/// Two or more cleaned tokens resolve to an exact canonical-key match; for
/// exactly two tokens the token-swapped key is also accepted, so
/// "Doe Jane" and "Jane Doe" hit the same rows. A single token falls back to
/// a substring match on the stored name, unioned with an exact key match so
/// punctuated forms ("O'Brien") and their cleaned keys ("obrien") find each
/// other. Empty input is the unknown identity and matches nothing.
pub fn search(conn: &Connection, name: &str, section: Section) -> Result<Vec<StatRow>> {
    if !table_exists(conn, section)? {
        return Ok(Vec::new());
    }

    let tokens = name_tokens(name);
    match tokens.len() {
        0 => Ok(Vec::new()),
        1 => fetch_single_token(conn, section, name, &tokens[0]),
        _ => {
            let mut keys = vec![key_from_tokens(&tokens)];
            if tokens.len() == 2 {
                let swapped = key_from_tokens(&[tokens[1].clone(), tokens[0].clone()]);
                if !keys.contains(&swapped) {
                    keys.push(swapped);
                }
            }
            fetch_by_keys(conn, section, &keys)
        }
    }
}

/// Query-time numeric coercion: thousands separators dropped, a trailing `%`
/// stripped, then a float parse. Anything else is missing, not an error.
pub fn clean_stat(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let trimmed = trimmed.strip_suffix('%').unwrap_or(trimmed).trim();
    trimmed.replace(',', "").parse::<f64>().ok()
}

/// Chart series for one stat field: (year, value) pairs in year order, rows
/// whose value fails numeric coercion excluded.
pub fn trend_series(rows: &[StatRow], stat_field: &str) -> Vec<(i32, f64)> {
    let mut out: Vec<(i32, f64)> = rows
        .iter()
        .filter_map(|row| {
            let value = row.stats.get(stat_field)?.as_deref()?;
            Some((row.year, clean_stat(value)?))
        })
        .collect();
    out.sort_by_key(|(year, _)| *year);
    out
}

fn fetch_by_keys(conn: &Connection, section: Section, keys: &[String]) -> Result<Vec<StatRow>> {
    let table = section.table_name();
    let rows = match keys {
        [single] => {
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT * FROM {table} WHERE canonical_key = ?1 ORDER BY year ASC, id ASC"
                ))
                .context("prepare key query")?;
            read_rows(&mut stmt, params![single])?
        }
        _ => {
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT * FROM {table} WHERE canonical_key IN (?1, ?2) \
                     ORDER BY year ASC, id ASC"
                ))
                .context("prepare key query")?;
            read_rows(&mut stmt, params![keys[0], keys[1]])?
        }
    };
    Ok(dedup_by_id(rows))
}

// The substring match runs against the raw lower-cased input, not the
// cleaned token: stored names keep their punctuation, so "%obrien%" would
// never hit a row named O'Brien. The cleaned token still reaches that row
// through its canonical key.
fn fetch_single_token(
    conn: &Connection,
    section: Section,
    raw: &str,
    token: &str,
) -> Result<Vec<StatRow>> {
    let mut rows = fetch_by_name_fragment(conn, section, &raw.trim().to_lowercase())?;
    rows.extend(fetch_by_keys(conn, section, &[token.to_string()])?);
    let mut rows = dedup_by_id(rows);
    rows.sort_by_key(|row| (row.year, row.id));
    Ok(rows)
}

fn fetch_by_name_fragment(
    conn: &Connection,
    section: Section,
    fragment: &str,
) -> Result<Vec<StatRow>> {
    let table = section.table_name();
    let mut stmt = conn
        .prepare(&format!(
            "SELECT * FROM {table} WHERE LOWER(name) LIKE ?1 ORDER BY year ASC, id ASC"
        ))
        .context("prepare name query")?;
    let pattern = format!("%{fragment}%");
    read_rows(&mut stmt, params![pattern])
}

fn read_rows(stmt: &mut Statement<'_>, sql_params: impl rusqlite::Params) -> Result<Vec<StatRow>> {
    let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
    let mut rows = stmt.query(sql_params).context("query stat rows")?;
    let mut out = Vec::new();
    while let Some(row) = rows.next().context("advance stat rows")? {
        out.push(decode_row(&columns, row)?);
    }
    Ok(out)
}

fn decode_row(columns: &[String], row: &Row<'_>) -> Result<StatRow> {
    let mut out = StatRow {
        id: 0,
        name: String::new(),
        school: String::new(),
        year: 0,
        canonical_key: String::new(),
        stats: BTreeMap::new(),
    };
    for (idx, column) in columns.iter().enumerate() {
        match column.as_str() {
            "id" => out.id = row.get(idx).context("decode id")?,
            "name" => out.name = row.get(idx).context("decode name")?,
            "school" => {
                out.school = row
                    .get::<_, Option<String>>(idx)
                    .context("decode school")?
                    .unwrap_or_default();
            }
            "year" => {
                out.year = row
                    .get::<_, Option<i32>>(idx)
                    .context("decode year")?
                    .unwrap_or_default();
            }
            "canonical_key" => {
                out.canonical_key = row
                    .get::<_, Option<String>>(idx)
                    .context("decode canonical_key")?
                    .unwrap_or_default();
            }
            _ => {
                let value = row
                    .get::<_, Option<String>>(idx)
                    .with_context(|| format!("decode stat {column}"))?;
                out.stats.insert(column.clone(), value);
            }
        }
    }
    Ok(out)
}

fn dedup_by_id(rows: Vec<StatRow>) -> Vec<StatRow> {
    let mut seen = HashSet::new();
    rows.into_iter()
        .filter(|row| seen.insert(row.id))
        .collect()
}

fn table_exists(conn: &Connection, section: Section) -> Result<bool> {
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            params![section.table_name()],
            |row| row.get(0),
        )
        .context("probe section table")?;
    Ok(count > 0)
}

#[cfg(test)]
mod tests {
    use super::clean_stat;

    #[test]
    fn clean_stat_strips_grouping_and_percent() {
        assert_eq!(clean_stat("1,234"), Some(1234.0));
        assert_eq!(clean_stat("98.5%"), Some(98.5));
        assert_eq!(clean_stat(" .300 "), Some(0.3));
    }

    #[test]
    fn clean_stat_yields_missing_not_errors() {
        assert_eq!(clean_stat("N/A"), None);
        assert_eq!(clean_stat("12-3"), None);
        assert_eq!(clean_stat(""), None);
    }
}
