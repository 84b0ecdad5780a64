use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use pac_stats::canonical::canonical_key;
use pac_stats::extract::extract_records;
use pac_stats::query::clean_stat;
use pac_stats::section::Section;

fn sample_rows(count: usize) -> Vec<Vec<(String, String)>> {
    (0..count)
        .map(|idx| {
            vec![
                ("Name".to_string(), format!("Player J. Number{idx}")),
                ("AVG".to_string(), format!(".{:03}", 200 + idx % 150)),
                ("AB".to_string(), format!("{}", 80 + idx % 60)),
                ("R".to_string(), format!("{}", idx % 40)),
                ("H".to_string(), format!("{}", idx % 50)),
                ("SB".to_string(), format!("{}", idx % 10)),
            ]
        })
        .collect()
}

fn bench_canonical_key(c: &mut Criterion) {
    let names = [
        "J. Smith",
        "Jane Q. Public Doe",
        "O'Brien",
        "  de la Cruz, Miguel ",
        "",
    ];
    c.bench_function("canonical_key", |b| {
        b.iter(|| {
            for name in &names {
                black_box(canonical_key(black_box(name)));
            }
        })
    });
}

fn bench_extract_records(c: &mut Criterion) {
    let rows = sample_rows(200);
    c.bench_function("extract_records", |b| {
        b.iter(|| {
            let records = extract_records(
                black_box(Section::Hitting),
                black_box("wj"),
                black_box(2024),
                black_box(&rows),
            );
            black_box(records.len());
        })
    });
}

fn bench_clean_stat(c: &mut Criterion) {
    let values = ["1,234", "98.5%", ".300", "12-3", "N/A", "  7 "];
    c.bench_function("clean_stat", |b| {
        b.iter(|| {
            for value in &values {
                black_box(clean_stat(black_box(value)));
            }
        })
    });
}

criterion_group!(perf, bench_canonical_key, bench_extract_records, bench_clean_stat);
criterion_main!(perf);
