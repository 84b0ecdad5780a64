use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};

use crate::section::{self, Section};

/// One player's single-season, single-section measurement, prior to storage.
/// Stat values stay raw text; the year stays raw until ingestion validates it.
#[derive(Debug, Clone)]
pub struct StatRecord {
    pub display_name: String,
    pub school: String,
    pub year: String,
    pub section: Section,
    pub stats: BTreeMap<String, String>,
}

/// A parsed snapshot file: the partition key plus its records.
#[derive(Debug, Clone)]
pub struct SnapshotBatch {
    pub section: Section,
    pub school: String,
    pub year: i32,
    pub records: Vec<StatRecord>,
}

/// Turns one scraped section table (markup already stripped, one
/// label -> text pair per cell) into records, keeping only the section's
/// important stats. Rows without a player name are dropped.
pub fn extract_records(
    section: Section,
    school: &str,
    year: i32,
    rows: &[Vec<(String, String)>],
) -> Vec<StatRecord> {
    let mut out = Vec::new();
    for cells in rows {
        let Some(name) = row_name(cells) else {
            continue;
        };
        let mut stats = BTreeMap::new();
        for (label, value) in cells {
            if is_name_label(label) {
                continue;
            }
            let Some(column) = section::stat_column(section, label) else {
                continue;
            };
            stats.insert(column, value.trim().to_string());
        }
        out.push(StatRecord {
            display_name: name,
            school: school.to_string(),
            year: year.to_string(),
            section,
            stats,
        });
    }
    out
}

/// Reads a `{year}_{school}_{section}.csv` snapshot left behind by a scrape
/// run. The filename carries the partition key; the header row carries the
/// stored column names. Unknown headers become new stat fields, so schema
/// drift between scrape runs flows through as-is.
pub fn read_snapshot(path: &Path) -> Result<SnapshotBatch> {
    let (year, school_code, section) = parse_snapshot_name(path)?;
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read snapshot {}", path.display()))?;

    let mut rows = parse_csv(&raw);
    if rows.is_empty() {
        return Err(anyhow!("snapshot {} is empty", path.display()));
    }
    let header: Vec<String> = rows
        .remove(0)
        .iter()
        .map(|cell| cell.trim().to_ascii_lowercase())
        .collect();
    if !header.iter().any(|h| h == "name") {
        return Err(anyhow!("snapshot {} has no name column", path.display()));
    }

    let mut school = String::new();
    let mut records = Vec::new();
    for cells in &rows {
        let mut display_name = String::new();
        let mut row_school = String::new();
        let mut year_text = year.to_string();
        let mut stats = BTreeMap::new();

        for (label, cell) in header.iter().zip(cells.iter()) {
            let cell = cell.trim();
            match label.as_str() {
                "name" => display_name = cell.to_string(),
                "school" => row_school = cell.to_string(),
                "year" => {
                    if !cell.is_empty() {
                        year_text = cell.to_string();
                    }
                }
                "id" | "canonical_key" => {}
                _ => {
                    let field = section::normalize_field(label);
                    if !field.is_empty() {
                        stats.insert(field, cell.to_string());
                    }
                }
            }
        }

        if display_name.is_empty() {
            continue;
        }
        if school.is_empty() && !row_school.is_empty() {
            school = row_school;
        }
        records.push(StatRecord {
            display_name,
            school: String::new(),
            year: year_text,
            section,
            stats,
        });
    }

    // One snapshot is one (section, year, school) partition; every record
    // carries the batch school.
    if school.is_empty() {
        school = section::school_name(&school_code)
            .map(str::to_string)
            .unwrap_or(school_code);
    }
    for record in &mut records {
        record.school = school.clone();
    }

    Ok(SnapshotBatch {
        section,
        school,
        year,
        records,
    })
}

fn parse_snapshot_name(path: &Path) -> Result<(i32, String, Section)> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| anyhow!("snapshot path {} has no utf-8 stem", path.display()))?;
    let parts: Vec<&str> = stem.split('_').collect();
    if parts.len() < 3 {
        return Err(anyhow!(
            "snapshot name '{stem}' is not year_school_section"
        ));
    }
    let year = parts[0]
        .parse::<i32>()
        .with_context(|| format!("snapshot name '{stem}' has no leading year"))?;
    let section = Section::parse(parts[parts.len() - 1])
        .ok_or_else(|| anyhow!("snapshot name '{stem}' has no trailing section"))?;
    let school = parts[1..parts.len() - 1].join("_");
    if school.is_empty() {
        return Err(anyhow!("snapshot name '{stem}' has no school"));
    }
    Ok((year, school, section))
}

fn row_name(cells: &[(String, String)]) -> Option<String> {
    let named = cells
        .iter()
        .find(|(label, _)| is_name_label(label))
        .or_else(|| cells.first());
    let (_, value) = named?;
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn is_name_label(label: &str) -> bool {
    let label = label.trim();
    label.eq_ignore_ascii_case("name") || label.eq_ignore_ascii_case("player")
}

/// Minimal CSV parser, quote and CRLF tolerant. Snapshot files are small and
/// machine-written, so this stays std-only.
fn parse_csv(text: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                if in_quotes {
                    if matches!(chars.peek(), Some('"')) {
                        chars.next();
                        field.push('"');
                    } else {
                        in_quotes = false;
                    }
                } else {
                    in_quotes = true;
                }
            }
            ',' if !in_quotes => row.push(std::mem::take(&mut field)),
            '\n' | '\r' if !in_quotes => {
                if ch == '\r' && matches!(chars.peek(), Some('\n')) {
                    chars.next();
                }
                row.push(std::mem::take(&mut field));
                if !(row.len() == 1 && row[0].is_empty()) {
                    rows.push(std::mem::take(&mut row));
                } else {
                    row.clear();
                }
            }
            _ => field.push(ch),
        }
    }

    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }
    rows
}
