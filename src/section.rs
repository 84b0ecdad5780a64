use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::Serialize;

/// One of the three box-score categories. Each section owns its own table,
/// so table identifiers never come from external input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Hitting,
    Pitching,
    Fielding,
}

impl Section {
    pub const ALL: [Section; 3] = [Section::Hitting, Section::Pitching, Section::Fielding];

    pub fn id(self) -> &'static str {
        match self {
            Section::Hitting => "hitting",
            Section::Pitching => "pitching",
            Section::Fielding => "fielding",
        }
    }

    pub fn table_name(self) -> &'static str {
        match self {
            Section::Hitting => "hitting_stats",
            Section::Pitching => "pitching_stats",
            Section::Fielding => "fielding_stats",
        }
    }

    pub fn parse(raw: &str) -> Option<Section> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "hitting" => Some(Section::Hitting),
            "pitching" => Some(Section::Pitching),
            "fielding" => Some(Section::Fielding),
            _ => None,
        }
    }

    /// Header labels kept from a scraped box-score table, as they appear on
    /// the stats page.
    pub fn important_stats(self) -> &'static [&'static str] {
        match self {
            Section::Hitting => &["AVG", "AB", "R", "H"],
            Section::Pitching => &["ERA", "W-L", "IP"],
            Section::Fielding => &["FLD%", "C", "E"],
        }
    }

    /// The headline stat for trend display.
    pub fn lead_stat(self) -> &'static str {
        match self {
            Section::Hitting => "ba",
            Section::Pitching => "era",
            Section::Fielding => "fld_pct",
        }
    }
}

/// Scraped header label -> stored column name.
static COLUMN_MAP: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("AVG", "ba"),
        ("AB", "ab"),
        ("R", "runs"),
        ("H", "hits"),
        ("ERA", "era"),
        ("W-L", "wl"),
        ("IP", "ip"),
        ("FLD%", "fld_pct"),
        ("C", "total_chances"),
        ("E", "errors"),
    ])
});

/// School code -> full name, the conference roster the scraper walks.
pub static SCHOOLS: &[(&str, &str)] = &[
    ("wj", "Washington & Jefferson"),
    ("all", "Allegheny"),
    ("gro", "Grove City"),
    ("svc", "Saint Vincent"),
    ("wes", "Westminster"),
    ("thi", "Thiel"),
    ("cha", "Chatham"),
    ("bet", "Bethany"),
    ("way", "Waynesburg"),
    ("fra", "Franciscan"),
    ("gen", "Geneva"),
];

pub fn school_name(code: &str) -> Option<&'static str> {
    let code = code.trim().to_ascii_lowercase();
    SCHOOLS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
}

/// Stored column for a scraped header label, or None when the label is not
/// one of the section's kept stats.
pub fn stat_column(section: Section, label: &str) -> Option<String> {
    let label = label.trim();
    if !section.important_stats().contains(&label) {
        return None;
    }
    match COLUMN_MAP.get(label) {
        Some(column) => Some((*column).to_string()),
        None => {
            let normalized = normalize_field(label);
            (!normalized.is_empty()).then_some(normalized)
        }
    }
}

/// Lower-cases a label and squeezes anything outside [a-z0-9] into single
/// underscores, so arbitrary snapshot headers become safe column identifiers.
pub fn normalize_field(label: &str) -> String {
    let mut out = String::new();
    for ch in label.trim().to_ascii_lowercase().chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch);
        } else if !out.is_empty() && !out.ends_with('_') {
            out.push('_');
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    if out.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        return format!("s_{out}");
    }
    out
}
