//! Persistence for job postings.
//!
//! One table, `jobs`, owned exclusively by [`JobStore`]. The ingestion
//! pipeline writes through [`JobStore::upsert`]; the API reads through
//! [`JobStore::query`] and [`JobStore::get_by_id`]. Nothing else touches
//! rows.

pub mod sqlite;

use serde::Serialize;

use crate::models::{Category, JobPosting};

// Re-export for convenience
pub use sqlite::JobStore;

/// What an upsert did to the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// No row matched the natural key; a new one was inserted.
    Inserted,
    /// An existing row was refreshed in place.
    Updated,
}

/// Filter and pagination parameters for a store query.
///
/// Absent filters impose no constraint; supplied filters combine with AND.
#[derive(Debug, Clone, Default)]
pub struct JobQuery {
    pub category: Option<Category>,
    /// Case-insensitive substring matched against title, company/location
    /// and skills (OR across the three fields).
    pub search: Option<String>,
    /// Case-insensitive substring of the company/location field.
    pub location: Option<String>,
    /// 1-based page number.
    pub page: u32,
    pub page_size: u32,
}

/// One page of query results.
#[derive(Debug, Clone, Serialize)]
pub struct JobPage {
    pub items: Vec<JobPosting>,
    pub page: u32,
    pub page_size: u32,
    /// Total rows matching the filters, across all pages.
    pub total: i64,
}
