use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use rusqlite::Connection;

use pac_stats::extract;
use pac_stats::ingest::{self, IngestSummary};
use pac_stats::stat_db;

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let args: Vec<String> = std::env::args().skip(1).collect();
    let snapshot_dir = parse_path_flag(&args, "--dir").unwrap_or_else(|| PathBuf::from("."));
    let db_path = parse_path_flag(&args, "--db")
        .or_else(stat_db::default_db_path)
        .context("unable to resolve sqlite path")?;
    let as_json = args.iter().any(|arg| arg == "--json");

    let mut paths = Vec::new();
    let entries = std::fs::read_dir(&snapshot_dir)
        .with_context(|| format!("read snapshot dir {}", snapshot_dir.display()))?;
    for entry in entries {
        let path = entry.context("read snapshot dir entry")?.path();
        if path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
        {
            paths.push(path);
        }
    }
    paths.sort();
    if paths.is_empty() {
        return Err(anyhow!(
            "no csv snapshots under {}",
            snapshot_dir.display()
        ));
    }

    let mut conn = stat_db::open_db(&db_path)?;

    let mut summaries = Vec::new();
    let mut failures = Vec::new();
    for path in &paths {
        match load_snapshot(&mut conn, path) {
            Ok(summary) => summaries.push(summary),
            Err(err) => failures.push(format!("{}: {err:#}", path.display())),
        }
    }

    if as_json {
        println!(
            "{}",
            serde_json::to_string_pretty(&summaries).context("serialize summaries")?
        );
    } else {
        println!("Snapshot ingest complete");
        println!("DB: {}", db_path.display());
        println!("Batches: {}/{}", summaries.len(), paths.len());
        let rows_total: usize = summaries.iter().map(|s| s.rows_written).sum();
        println!("Rows written: {rows_total}");
        for summary in &summaries {
            println!(
                "{} {} {}: rows={} replaced={} skipped={}",
                summary.section.id(),
                summary.school,
                summary.year,
                summary.rows_written,
                summary.rows_replaced,
                summary.records_skipped
            );
            for err in summary.errors.iter().take(4) {
                println!("   - {err}");
            }
        }
    }

    if !failures.is_empty() {
        println!("Failures: {}", failures.len());
        for failure in failures.iter().take(8) {
            println!(" - {failure}");
        }
    }

    ensure_any_succeeded(summaries.len(), failures.len())
}

fn load_snapshot(conn: &mut Connection, path: &Path) -> Result<IngestSummary> {
    let batch = extract::read_snapshot(path)?;
    ingest::ingest(conn, batch.section, batch.year, &batch.school, &batch.records)
}

// A sweep where every snapshot failed must exit non-zero, not report success.
fn ensure_any_succeeded(succeeded: usize, failed: usize) -> Result<()> {
    if succeeded == 0 && failed > 0 {
        return Err(anyhow!("all {failed} snapshots failed to ingest"));
    }
    Ok(())
}

fn parse_path_flag(args: &[String], flag: &str) -> Option<PathBuf> {
    let prefix = format!("{flag}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(path) = arg.strip_prefix(&prefix) {
            let trimmed = path.trim();
            if !trimmed.is_empty() {
                return Some(PathBuf::from(trimmed));
            }
        }
        if arg == flag {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(PathBuf::from(next));
            }
        }
    }
    None
}
