//! BigQuery Emulator Server Library
//!
//! HTTP front end compatible with the BigQuery v2 REST API. Every API route
//! is served both at the root and under `/bigquery/v2`.

pub mod config;
pub mod error;
pub mod handlers;
pub mod state;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use config::ServerConfig;
use state::AppState;

/// Build server router with an empty warehouse
pub fn build_router() -> Router {
    router(Arc::new(AppState::new()))
}

/// Build server router over existing state
pub fn router(state: Arc<AppState>) -> Router {
    let api = api_routes();

    Router::new()
        .route(
            "/discovery/v1/apis/bigquery/v2/rest",
            get(handlers::discovery_document),
        )
        .route("/health", get(handlers::health_check))
        .merge(api.clone())
        .nest("/bigquery/v2", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/projects/{project_id}/datasets",
            get(handlers::list_datasets).post(handlers::create_dataset),
        )
        .route(
            "/projects/{project_id}/datasets/{dataset_id}",
            get(handlers::get_dataset),
        )
        .route(
            "/projects/{project_id}/datasets/{dataset_id}/tables",
            get(handlers::list_tables).post(handlers::create_table),
        )
        .route(
            "/projects/{project_id}/datasets/{dataset_id}/tables/{table_id}",
            get(handlers::get_table),
        )
        .route(
            "/projects/{project_id}/datasets/{dataset_id}/tables/{table_id}/insertAll",
            post(handlers::insert_all),
        )
        .route("/projects/{project_id}/jobs", post(handlers::create_job))
        .route(
            "/projects/{project_id}/jobs/{job_id}",
            get(handlers::get_job),
        )
        .route(
            "/projects/{project_id}/queries/{job_id}",
            get(handlers::get_query_results),
        )
}

/// Start server
pub async fn run(config: ServerConfig) -> std::io::Result<()> {
    let mut state = AppState::new();
    if let Some(document) = config.load_discovery()? {
        state = state.with_discovery(document);
    }

    let app = router(Arc::new(state));
    let addr = config.bind_address();

    tracing::info!("BigQuery Emulator listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
