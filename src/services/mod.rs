//! Upstream listing retrieval.

pub mod listings;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Category, RawPosting};

// Re-export for convenience
pub use listings::ListingScraper;

/// Seam between the ingestion pipeline and the upstream site.
///
/// Production uses [`ListingScraper`]; tests substitute a stub.
#[async_trait]
pub trait JobFetcher: Send + Sync {
    /// Fetch and parse every listing card the category's feed currently
    /// serves. The sequence is bounded: the feed is a finite set of pages.
    async fn fetch_category(&self, category: Category) -> Result<Vec<RawPosting>>;
}
