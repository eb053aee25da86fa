//! 스케줄 트리거 endpoint.
//!
//! 외부 스케줄러가 고정 주기로 호출합니다. 호출이 겹칠 수 있으므로
//! 상호 배제는 잠금 테이블이 담당하고, 이 핸들러는 틱을 실행하고
//! 요약만 반환합니다.
//!
//! 아이템 단위 실패가 있어도 응답은 200입니다. 실패는 요약의
//! 카운터로 보고됩니다. 500은 파이프라인 전체 실패(피드 도달 불가
//! 등)일 때만 반환됩니다.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use pulse_collector::modules::run_analysis_tick;
use serde_json::json;
use tracing::error;

use crate::state::AppState;

/// 분석 틱 트리거 핸들러.
pub async fn trigger_analysis(State(state): State<AppState>) -> impl IntoResponse {
    match run_analysis_tick(&state.pool, &state.collector_config).await {
        Ok(stats) => {
            stats.log_summary("트리거 틱");
            (StatusCode::OK, Json(serde_json::to_value(&stats).unwrap_or_default()))
        }
        Err(e) => {
            error!(error = %e, "트리거 틱 전체 실패");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": e.to_string()})),
            )
        }
    }
}
