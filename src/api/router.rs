//! Route table

use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::state::AppState;
use super::{health, runs, workflows};

/// Build the application router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/live", get(health::live_check))
        .route(
            "/v1/workflows",
            get(workflows::list_workflows).post(workflows::create_workflow),
        )
        .route(
            "/v1/workflows/{id}",
            get(workflows::get_workflow)
                .put(workflows::update_workflow)
                .delete(workflows::delete_workflow),
        )
        .route("/v1/runs", get(runs::list_runs).post(runs::create_run))
        .route(
            "/v1/runs/{id}",
            get(runs::get_run).delete(runs::delete_run),
        )
        .route("/v1/runs/{id}/artifacts", get(runs::list_run_artifacts))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
