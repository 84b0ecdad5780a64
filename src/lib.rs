//! Box-score ingestion and player lookup for PAC baseball stats: snapshot
//! extraction, canonical player identity, additive schema evolution, and
//! idempotent per-partition ingestion into a local SQLite store.

pub mod canonical;
pub mod extract;
pub mod ingest;
pub mod query;
pub mod schema;
pub mod section;
pub mod stat_db;
