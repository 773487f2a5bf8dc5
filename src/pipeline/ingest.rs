// src/pipeline/ingest.rs

//! Fetch → validate → upsert pipeline.

use std::collections::BTreeMap;

use futures::stream::{self, StreamExt};
use serde::Serialize;

use crate::models::{Category, PostingCandidate};
use crate::services::JobFetcher;
use crate::storage::{JobStore, UpsertOutcome};

/// Per-category result of an ingestion run.
#[derive(Debug, Default, Clone, Serialize)]
pub struct CategoryOutcome {
    /// Raw records the feed produced
    pub fetched: usize,
    /// New rows written
    pub inserted: usize,
    /// Existing rows refreshed
    pub updated: usize,
    /// Records dropped by validation
    pub skipped: usize,
    /// Set when the category's fetch failed or the store gave up mid-write
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Summary of one ingestion run across categories.
#[derive(Debug, Default, Clone, Serialize)]
pub struct IngestionSummary {
    pub categories: BTreeMap<Category, CategoryOutcome>,
}

impl IngestionSummary {
    /// True when every requested category failed. The trigger endpoint
    /// turns this into a 500; anything less stays a 200 with partial
    /// results.
    pub fn all_failed(&self) -> bool {
        !self.categories.is_empty() && self.categories.values().all(|o| o.error.is_some())
    }

    /// Total rows written (inserted or updated) across categories.
    pub fn total_written(&self) -> usize {
        self.categories
            .values()
            .map(|o| o.inserted + o.updated)
            .sum()
    }
}

/// Run ingestion for the requested categories.
///
/// Categories run concurrently; within a category, upserts are applied in
/// parse order. A failed category is recorded in the summary without
/// aborting the others.
pub async fn run_ingestion(
    fetcher: &dyn JobFetcher,
    store: &JobStore,
    categories: &[Category],
) -> IngestionSummary {
    let outcomes = stream::iter(categories.iter().copied())
        .map(|category| async move {
            let outcome = ingest_category(fetcher, store, category).await;
            (category, outcome)
        })
        .buffer_unordered(categories.len().max(1))
        .collect::<Vec<_>>()
        .await;

    let mut summary = IngestionSummary::default();
    for (category, outcome) in outcomes {
        tracing::info!(
            %category,
            fetched = outcome.fetched,
            inserted = outcome.inserted,
            updated = outcome.updated,
            skipped = outcome.skipped,
            error = outcome.error.as_deref().unwrap_or(""),
            "category ingestion finished"
        );
        summary.categories.insert(category, outcome);
    }
    summary
}

async fn ingest_category(
    fetcher: &dyn JobFetcher,
    store: &JobStore,
    category: Category,
) -> CategoryOutcome {
    let mut outcome = CategoryOutcome::default();

    let raws = match fetcher.fetch_category(category).await {
        Ok(raws) => raws,
        Err(e) => {
            outcome.error = Some(e.to_string());
            return outcome;
        }
    };

    outcome.fetched = raws.len();
    for raw in raws {
        let candidate = match PostingCandidate::from_raw(category, raw) {
            Ok(candidate) => candidate,
            Err(issue) => {
                tracing::debug!(%category, ?issue, "dropping unusable record");
                outcome.skipped += 1;
                continue;
            }
        };

        match store.upsert(&candidate).await {
            Ok(UpsertOutcome::Inserted) => outcome.inserted += 1,
            Ok(UpsertOutcome::Updated) => outcome.updated += 1,
            Err(e) => {
                // Store failures are not retried; stop this category.
                outcome.error = Some(e.to_string());
                break;
            }
        }
    }

    outcome
}
