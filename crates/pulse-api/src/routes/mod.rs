//! API 라우트.

pub mod health;
pub mod jobs;

use crate::auth;
use crate::state::AppState;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// 전체 라우터를 구성합니다.
pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/internal/jobs/analyze", post(jobs::trigger_analysis))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_job_token,
        ));

    Router::new()
        .route("/health", get(health::health))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
