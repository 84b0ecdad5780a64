use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};

use pac_stats::query;
use pac_stats::section::Section;
use pac_stats::stat_db;

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (section, name) = parse_query_args(&args)
        .ok_or_else(|| anyhow!("usage: player_search [--db PATH] <hitting|pitching|fielding> <name>"))?;
    let db_path = parse_path_flag(&args, "--db")
        .or_else(stat_db::default_db_path)
        .context("unable to resolve sqlite path")?;

    let conn = stat_db::open_db(&db_path)?;
    let rows = query::search(&conn, &name, section)?;
    if rows.is_empty() {
        println!("No {} rows found for '{name}'.", section.id());
        return Ok(());
    }

    for row in &rows {
        println!("{} ({}, {})", row.name, row.school, row.year);
        for (field, value) in &row.stats {
            println!("  {field}: {}", value.as_deref().unwrap_or("-"));
        }
    }

    let lead = section.lead_stat();
    let series = query::trend_series(&rows, lead);
    if series.is_empty() {
        println!("No numeric {lead} data available to plot.");
    } else {
        println!("{lead} by year:");
        for (year, value) in series {
            println!("  {year}: {value}");
        }
    }

    Ok(())
}

fn parse_query_args(args: &[String]) -> Option<(Section, String)> {
    let mut positional = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--db" {
            iter.next();
            continue;
        }
        if arg.starts_with("--db=") {
            continue;
        }
        positional.push(arg.clone());
    }
    if positional.len() < 2 {
        return None;
    }
    let section = Section::parse(&positional[0])?;
    Some((section, positional[1..].join(" ")))
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
