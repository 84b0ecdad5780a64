use std::path::PathBuf;

use rusqlite::Connection;

use pac_stats::extract::read_snapshot;
use pac_stats::ingest::ingest;
use pac_stats::query::{search, trend_series};
use pac_stats::section::Section;
use pac_stats::stat_db;

fn fixture_path(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    path
}

#[test]
fn snapshot_carries_partition_key_and_records() {
    let batch = read_snapshot(&fixture_path("2024_wj_hitting.csv")).expect("parse snapshot");
    assert_eq!(batch.section, Section::Hitting);
    assert_eq!(batch.year, 2024);
    assert_eq!(batch.school, "Washington & Jefferson");
    assert_eq!(batch.records.len(), 3);

    let first = &batch.records[0];
    assert_eq!(first.display_name, "J. Smith");
    assert_eq!(first.school, batch.school);
    assert_eq!(first.year, "2024");
    assert_eq!(first.stats.get("ba").map(String::as_str), Some(".300"));
    assert_eq!(first.stats.get("ab").map(String::as_str), Some("120"));
    // Quoted names with embedded commas survive the reader.
    assert_eq!(batch.records[1].display_name, "Doe, Jane");
}

#[test]
fn snapshot_pipeline_end_to_end() {
    let mut conn = Connection::open_in_memory().expect("in-memory sqlite");
    stat_db::init_schema(&conn).expect("init schema");

    for name in ["2024_wj_hitting.csv", "2025_wj_hitting.csv"] {
        let batch = read_snapshot(&fixture_path(name)).expect("parse snapshot");
        ingest(&mut conn, batch.section, batch.year, &batch.school, &batch.records)
            .expect("ingest snapshot");
    }

    let rows = search(&conn, "J Smith", Section::Hitting).expect("search");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].year, 2024);
    assert_eq!(rows[1].year, 2025);
    // 2025 introduced obp; the 2024 row shows it as missing.
    assert_eq!(rows[0].stats.get("obp"), Some(&None));

    let series = trend_series(&rows, "ba");
    assert_eq!(series.len(), 2);
    assert!((series[0].1 - 0.300).abs() < 1e-9);
    assert!((series[1].1 - 0.310).abs() < 1e-9);
}
