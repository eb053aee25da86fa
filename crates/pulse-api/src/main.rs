//! PulseQuant API 서버 엔트리포인트.

use pulse_api::{router, AppState};
use pulse_collector::CollectorConfig;
use pulse_core::{init_logging, AppConfig, LogConfig};
use pulse_data::Database;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // 설정 로드 (파일 + PULSE_ 환경변수)
    let app_config = AppConfig::load("config/api.toml")?;

    // 로깅 초기화
    let log_config = LogConfig::new(&app_config.logging.level).with_format(
        app_config
            .logging
            .format
            .parse()
            .unwrap_or_default(),
    );
    init_logging(log_config)?;

    // 수집기 설정 (트리거 틱 실행용)
    let collector_config = CollectorConfig::from_env()?;

    // 트리거 공유 시크릿
    let job_token = std::env::var("JOB_TRIGGER_TOKEN")
        .map_err(|_| "JOB_TRIGGER_TOKEN 환경변수가 설정되지 않았습니다")?;

    // DB 연결 및 마이그레이션
    let pool = sqlx::PgPool::connect(&collector_config.database_url).await?;
    Database::from_pool(pool.clone()).migrate().await?;

    let state = AppState::new(pool, collector_config, job_token);
    let app = router(state);

    let addr = format!("{}:{}", app_config.server.host, app_config.server.port);
    tracing::info!(%addr, "PulseQuant API 서버 시작");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
