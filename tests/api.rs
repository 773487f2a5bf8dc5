//! End-to-end tests for the HTTP surface, driving the router directly
//! over an in-memory store and a stubbed upstream.

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use hirepro::config::RateLimitConfig;
use hirepro::error::{AppError, Result};
use hirepro::models::{Category, RawPosting};
use hirepro::server::{AppState, RateLimiter, build_router};
use hirepro::services::JobFetcher;
use hirepro::storage::JobStore;

/// Canned upstream: fixed feeds per category, with selectable failures.
struct StubFetcher {
    fail: Vec<Category>,
}

fn raw(title: &str, company_location: &str, skills: &str, apply_url: &str) -> RawPosting {
    RawPosting {
        title: title.to_string(),
        company_location: company_location.to_string(),
        salary: "INR 10 LPA".to_string(),
        posted: "1 day ago".to_string(),
        skills: skills.to_string(),
        eligible_years: "2024".to_string(),
        apply_url: apply_url.to_string(),
        company_logo: String::new(),
    }
}

#[async_trait]
impl JobFetcher for StubFetcher {
    async fn fetch_category(&self, category: Category) -> Result<Vec<RawPosting>> {
        if self.fail.contains(&category) {
            return Err(AppError::fetch(category, "connection refused"));
        }
        Ok(match category {
            Category::Regular => vec![
                raw(
                    "Rust Backend Engineer",
                    "Acme Corp, Bengaluru",
                    "Rust, SQL",
                    "https://t.in/a/1",
                ),
                raw(
                    "Data Analyst",
                    "Initech, Mumbai",
                    "Python, Pandas",
                    "https://t.in/a/2",
                ),
                // No apply link: validation drops it.
                raw("Ghost Listing", "Hooli, Pune", "None", ""),
            ],
            Category::Freshers => vec![raw(
                "Graduate Trainee",
                "Umbrella, Hyderabad",
                "Java",
                "https://t.in/f/1",
            )],
            Category::Internships => vec![raw(
                "SDE Intern",
                "Pied Piper, Remote",
                "Go",
                "https://t.in/i/1",
            )],
        })
    }
}

async fn test_app(fail: Vec<Category>, max_requests: u32) -> Router {
    let store = JobStore::in_memory().await.unwrap();
    let state = AppState {
        store,
        fetcher: Arc::new(StubFetcher { fail }),
        limiter: Arc::new(RateLimiter::new(&RateLimitConfig {
            max_requests,
            window_secs: 60,
        })),
    };
    build_router(state)
}

async fn get(app: &Router, uri: &str) -> Response<Body> {
    app.clone()
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = get(app, uri).await;
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap();
    (status, value)
}

#[tokio::test]
async fn health_reports_database_up() {
    let app = test_app(vec![], 100).await;
    let (status, body) = get_json(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "up");
}

#[tokio::test]
async fn scrape_ingests_and_lists_serve_the_results() {
    let app = test_app(vec![], 100).await;

    let (status, summary) = get_json(&app, "/api/scrape").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["categories"]["regular"]["fetched"], 3);
    assert_eq!(summary["categories"]["regular"]["inserted"], 2);
    assert_eq!(summary["categories"]["regular"]["skipped"], 1);
    assert_eq!(summary["categories"]["freshers"]["inserted"], 1);
    assert_eq!(summary["categories"]["internships"]["inserted"], 1);

    let (status, body) = get_json(&app, "/api/regular-jobs").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    assert_eq!(body["page"], 1);
    assert_eq!(body["page_size"], 20);

    let item = &body["items"][0];
    for key in [
        "id",
        "job_title",
        "job_type",
        "company_location",
        "salary",
        "posted",
        "skills",
        "eligible_years",
        "apply_url",
        "company_logo",
        "created_at",
        "updated_at",
    ] {
        assert!(item.get(key).is_some(), "missing field {key}");
    }
    assert_eq!(item["job_type"], "regular");

    let (_, freshers) = get_json(&app, "/api/freshers-jobs").await;
    assert_eq!(freshers["total"], 1);
    assert_eq!(freshers["items"][0]["job_title"], "Graduate Trainee");
}

#[tokio::test]
async fn second_scrape_updates_instead_of_duplicating() {
    let app = test_app(vec![], 100).await;
    get_json(&app, "/api/scrape").await;
    let (_, second) = get_json(&app, "/api/scrape").await;

    assert_eq!(second["categories"]["regular"]["inserted"], 0);
    assert_eq!(second["categories"]["regular"]["updated"], 2);

    let (_, body) = get_json(&app, "/api/regular-jobs").await;
    assert_eq!(body["total"], 2);
}

#[tokio::test]
async fn search_and_location_filters_narrow_results() {
    let app = test_app(vec![], 100).await;
    get_json(&app, "/api/scrape").await;

    let (_, body) = get_json(&app, "/api/regular-jobs?search=rust").await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["job_title"], "Rust Backend Engineer");

    let (_, body) = get_json(&app, "/api/regular-jobs?location=mumbai").await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["company_location"], "Initech, Mumbai");

    let (_, body) = get_json(&app, "/api/regular-jobs?search=rust&location=mumbai").await;
    assert_eq!(body["total"], 0);
}

#[tokio::test]
async fn pagination_is_validated_and_disjoint() {
    let app = test_app(vec![], 100).await;
    get_json(&app, "/api/scrape").await;

    let (status, body) = get_json(&app, "/api/regular-jobs?page_size=0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");

    let (status, _) = get_json(&app, "/api/regular-jobs?page=-1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, page1) = get_json(&app, "/api/regular-jobs?page=1&page_size=1").await;
    let (_, page2) = get_json(&app, "/api/regular-jobs?page=2&page_size=1").await;
    assert_eq!(page1["total"], 2);
    assert_eq!(page2["total"], 2);
    assert_ne!(page1["items"][0]["id"], page2["items"][0]["id"]);
}

#[tokio::test]
async fn job_lookup_distinguishes_not_found_from_bad_input() {
    let app = test_app(vec![], 100).await;
    get_json(&app, "/api/scrape").await;

    let (_, listing) = get_json(&app, "/api/freshers-jobs").await;
    let id = listing["items"][0]["id"].as_i64().unwrap();

    let (status, job) = get_json(&app, &format!("/api/jobs/{id}?job_type=freshers")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(job["job_title"], "Graduate Trainee");

    // Same id under the wrong category is absent, not an error.
    let (status, body) = get_json(&app, &format!("/api/jobs/{id}?job_type=internships")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    let (status, body) = get_json(&app, "/api/jobs/999999?job_type=regular").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    let (status, body) = get_json(&app, "/api/jobs/1?job_type=banana").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
async fn partial_fetch_failure_still_returns_ok() {
    let app = test_app(vec![Category::Freshers], 100).await;

    let (status, summary) = get_json(&app, "/api/scrape").await;
    assert_eq!(status, StatusCode::OK);
    assert!(summary["categories"]["freshers"]["error"].is_string());
    assert!(summary["categories"]["regular"].get("error").is_none());
    assert_eq!(summary["categories"]["regular"]["inserted"], 2);
    assert_eq!(summary["categories"]["internships"]["inserted"], 1);
}

#[tokio::test]
async fn full_fetch_failure_is_a_server_error() {
    let app = test_app(Category::ALL.to_vec(), 100).await;
    let (status, summary) = get_json(&app, "/api/scrape").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    for category in ["regular", "freshers", "internships"] {
        assert!(summary["categories"][category]["error"].is_string());
    }
}

#[tokio::test]
async fn api_requests_past_the_quota_get_429() {
    let app = test_app(vec![], 2).await;

    for _ in 0..2 {
        let response = get(&app, "/api/regular-jobs").await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = get(&app, "/api/regular-jobs").await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let retry_after = response
        .headers()
        .get(header::RETRY_AFTER)
        .expect("Retry-After header")
        .to_str()
        .unwrap()
        .parse::<u64>()
        .unwrap();
    assert!(retry_after >= 1 && retry_after <= 60);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "rate_limited");

    // Health sits outside the rate-limited scope.
    let response = get(&app, "/health").await;
    assert_eq!(response.status(), StatusCode::OK);
}
