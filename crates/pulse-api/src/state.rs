//! 모든 핸들러에서 공유되는 애플리케이션 상태.

use chrono::{DateTime, Utc};
use pulse_collector::CollectorConfig;
use sqlx::PgPool;

/// 애플리케이션 공유 상태.
///
/// Axum의 State extractor를 통해 핸들러에 주입됩니다.
#[derive(Clone)]
pub struct AppState {
    /// 데이터베이스 연결 풀
    pub pool: PgPool,
    /// 수집기 설정 (트리거 엔드포인트가 틱 실행에 사용)
    pub collector_config: CollectorConfig,
    /// 스케줄 트리거 공유 시크릿
    pub job_token: String,
    /// 서버 시작 시각
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// 새 상태를 생성합니다.
    pub fn new(pool: PgPool, collector_config: CollectorConfig, job_token: String) -> Self {
        Self {
            pool,
            collector_config,
            job_token,
            started_at: Utc::now(),
        }
    }
}
