use std::collections::BTreeSet;

use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use rusqlite::{Connection, ToSql, params};
use serde::Serialize;

use crate::canonical::canonical_key;
use crate::extract::StatRecord;
use crate::schema;
use crate::section::Section;

/// Outcome of one partition ingest. Record-level problems are aggregated
/// here, not raised per row.
#[derive(Debug, Clone, Serialize)]
pub struct IngestSummary {
    pub section: Section,
    pub school: String,
    pub year: i32,
    pub rows_written: usize,
    pub rows_replaced: usize,
    pub records_skipped: usize,
    pub errors: Vec<String>,
}

/// Writes one batch for the `(section, year, school)` partition.
///
/// Each record's year must parse as an integer and match the batch year;
/// failures are skipped and reported in the summary. The surviving records
/// replace the partition inside a single transaction: a re-scrape fully
/// replaces its (year, school) slice, never appends to it. A batch with zero
/// valid records aborts before touching the partition.
pub fn ingest(
    conn: &mut Connection,
    section: Section,
    year: i32,
    school: &str,
    records: &[StatRecord],
) -> Result<IngestSummary> {
    let started_at = Utc::now().to_rfc3339();

    let mut errors = Vec::new();
    let mut valid: Vec<(&StatRecord, String)> = Vec::new();
    for record in records {
        match record.year.trim().parse::<i32>() {
            Ok(record_year) if record_year == year => {
                valid.push((record, canonical_key(&record.display_name)));
            }
            Ok(record_year) => {
                errors.push(format!(
                    "{}: year {record_year} outside batch partition {year}",
                    record.display_name
                ));
            }
            Err(_) => {
                errors.push(format!(
                    "{}: unparseable year {:?}",
                    record.display_name, record.year
                ));
            }
        }
    }
    if valid.is_empty() {
        return Err(anyhow!(
            "no valid records for {} {school} {year} ({} rejected)",
            section.id(),
            errors.len()
        ));
    }

    let mut field_set = BTreeSet::new();
    for (record, _) in &valid {
        field_set.extend(record.stats.keys().cloned());
    }
    let fields: Vec<String> = field_set.into_iter().collect();
    let known_columns = schema::ensure_table(conn, section, &fields)
        .with_context(|| format!("ensure {} schema", section.table_name()))?;
    // Insert against the full known stat-column set; fields the batch never
    // saw simply take NULL.
    let stat_columns: Vec<String> = known_columns
        .into_iter()
        .filter(|column| !schema::RESERVED_COLUMNS.contains(&column.as_str()))
        .collect();

    let table = section.table_name();
    let tx = conn.transaction().context("begin ingest transaction")?;
    let rows_replaced = tx
        .execute(
            &format!("DELETE FROM {table} WHERE school = ?1 AND year = ?2"),
            params![school, year],
        )
        .with_context(|| format!("clear partition {school} {year}"))?;

    let mut column_sql = String::from("name, school, year, canonical_key");
    let mut placeholder_sql = String::from("?1, ?2, ?3, ?4");
    for (idx, field) in stat_columns.iter().enumerate() {
        column_sql.push_str(&format!(", \"{field}\""));
        placeholder_sql.push_str(&format!(", ?{}", idx + 5));
    }

    let mut rows_written = 0usize;
    {
        let mut stmt = tx
            .prepare(&format!(
                "INSERT INTO {table} ({column_sql}) VALUES ({placeholder_sql})"
            ))
            .context("prepare partition insert")?;
        for (record, key) in &valid {
            let stat_values: Vec<Option<&str>> = stat_columns
                .iter()
                .map(|field| record.stats.get(field).map(String::as_str))
                .collect();
            // Rows are stored under the batch partition school, so a record
            // can never escape the slice being replaced.
            let mut sql_params: Vec<&dyn ToSql> = Vec::with_capacity(4 + stat_values.len());
            sql_params.push(&record.display_name);
            sql_params.push(&school);
            sql_params.push(&year);
            sql_params.push(key);
            for value in &stat_values {
                sql_params.push(value);
            }
            stmt.execute(sql_params.as_slice())
                .with_context(|| format!("insert row for {}", record.display_name))?;
            rows_written += 1;
        }
    }
    tx.commit()
        .with_context(|| format!("commit {} {school} {year}", section.id()))?;

    let summary = IngestSummary {
        section,
        school: school.to_string(),
        year,
        rows_written,
        rows_replaced,
        records_skipped: errors.len(),
        errors,
    };
    record_run(conn, &started_at, &summary)?;
    Ok(summary)
}

fn record_run(conn: &Connection, started_at: &str, summary: &IngestSummary) -> Result<()> {
    let finished_at = Utc::now().to_rfc3339();
    let errors_json =
        serde_json::to_string(&summary.errors).unwrap_or_else(|_| "[]".to_string());
    conn.execute(
        "INSERT INTO ingest_runs (
            started_at, finished_at, section, school, year,
            rows_written, rows_replaced, records_skipped, errors_json
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            started_at,
            finished_at,
            summary.section.id(),
            summary.school,
            summary.year,
            summary.rows_written as i64,
            summary.rows_replaced as i64,
            summary.records_skipped as i64,
            errors_json,
        ],
    )
    .context("record ingest run")?;
    Ok(())
}
