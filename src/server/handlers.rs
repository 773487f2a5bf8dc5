//! HTTP endpoint handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::{Category, JobPosting};
use crate::pipeline;
use crate::server::AppState;
use crate::storage::{JobPage, JobQuery};

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

/// Query parameters for the listing endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub search: Option<String>,
    pub location: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

impl ListParams {
    /// Validate pagination. Out-of-range values are rejected, never
    /// clamped.
    fn pagination(&self) -> Result<(u32, u32)> {
        let page = self.page.unwrap_or(1);
        if page < 1 {
            return Err(AppError::bad_request(format!(
                "page must be >= 1, got {page}"
            )));
        }
        let page_size = self.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
        if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
            return Err(AppError::bad_request(format!(
                "page_size must be between 1 and {MAX_PAGE_SIZE}, got {page_size}"
            )));
        }
        Ok((page as u32, page_size as u32))
    }
}

#[derive(Debug, Deserialize)]
pub struct GetJobParams {
    pub job_type: Option<String>,
}

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    database: &'static str,
}

/// `GET /health` — store connectivity probe, no business data touched.
pub async fn health(State(state): State<AppState>) -> Response {
    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok",
                database: "up",
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("health check failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(HealthResponse {
                    status: "degraded",
                    database: "down",
                }),
            )
                .into_response()
        }
    }
}

/// `GET /api/regular-jobs`
pub async fn regular_jobs(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<JobPage>> {
    list_jobs(&state, Category::Regular, params).await
}

/// `GET /api/freshers-jobs`
pub async fn freshers_jobs(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<JobPage>> {
    list_jobs(&state, Category::Freshers, params).await
}

/// `GET /api/internships`
pub async fn internships(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<JobPage>> {
    list_jobs(&state, Category::Internships, params).await
}

async fn list_jobs(
    state: &AppState,
    category: Category,
    params: ListParams,
) -> Result<Json<JobPage>> {
    let (page, page_size) = params.pagination()?;
    let page = state
        .store
        .query(&JobQuery {
            category: Some(category),
            search: params.search,
            location: params.location,
            page,
            page_size,
        })
        .await?;
    Ok(Json(page))
}

/// `GET /api/jobs/{id}?job_type={category}`
pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(params): Query<GetJobParams>,
) -> Result<Json<JobPosting>> {
    let category = params
        .job_type
        .as_deref()
        .map(str::parse::<Category>)
        .transpose()?;

    state
        .store
        .get_by_id(id, category)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("job {id} not found")))
}

/// `GET /api/scrape` — run ingestion synchronously and relay the summary.
///
/// Partial failure is still a 200; only a run where every category failed
/// becomes a 500.
pub async fn trigger_scrape(State(state): State<AppState>) -> Response {
    let summary =
        pipeline::run_ingestion(state.fetcher.as_ref(), &state.store, &Category::ALL).await;

    let status = if summary.all_failed() {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::OK
    };
    (status, Json(summary)).into_response()
}
