//! Ingestion pipeline entry points.
//!
//! - `run_ingestion`: fetch, validate and upsert every requested category

pub mod ingest;

pub use ingest::{CategoryOutcome, IngestionSummary, run_ingestion};
