//! 스케줄 트리거 인증 미들웨어.
//!
//! 외부 스케줄러(cron 등)가 공유 시크릿 헤더로 호출합니다.
//! 사용자 계정 체계가 없으므로 신뢰 헤더 비교가 전부입니다.

use crate::state::AppState;
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::warn;

/// 트리거 토큰 헤더 이름.
pub const JOB_TOKEN_HEADER: &str = "x-job-token";

/// `X-Job-Token` 헤더를 공유 시크릿과 비교합니다.
pub async fn require_job_token(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let provided = request
        .headers()
        .get(JOB_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok());

    match provided {
        Some(token) if token == state.job_token => next.run(request).await,
        _ => {
            warn!("잘못된 잡 토큰으로 트리거 호출 거부");
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({"error": "invalid job token"})),
            )
                .into_response()
        }
    }
}
