//! HTTP-facing boundary: router, shared state and middleware.

pub mod handlers;
pub mod rate_limit;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Router, middleware, routing::get};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::error::Result;
use crate::services::{JobFetcher, ListingScraper};
use crate::storage::JobStore;

pub use rate_limit::RateLimiter;

/// Shared application state, initialized once at startup.
#[derive(Clone)]
pub struct AppState {
    pub store: JobStore,
    pub fetcher: Arc<dyn JobFetcher>,
    pub limiter: Arc<RateLimiter>,
}

/// Build the application router.
///
/// `/health` sits outside the rate-limited `/api` scope so probes keep
/// working for a client that spent its quota.
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/regular-jobs", get(handlers::regular_jobs))
        .route("/freshers-jobs", get(handlers::freshers_jobs))
        .route("/internships", get(handlers::internships))
        .route("/jobs/{id}", get(handlers::get_job))
        .route("/scrape", get(handlers::trigger_scrape))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit::rate_limit_middleware,
        ));

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Connect the store, build the router and serve until shutdown.
pub async fn serve(config: Config) -> Result<()> {
    let store = JobStore::connect(
        &config.server.database_url,
        config.server.max_connections,
    )
    .await?;
    store.init_schema().await?;

    let scraper = ListingScraper::new(config.scraper.clone(), &config.selectors)?;
    let state = AppState {
        store,
        fetcher: Arc::new(scraper),
        limiter: Arc::new(RateLimiter::new(&config.rate_limit)),
    };

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(&config.server.listen_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
