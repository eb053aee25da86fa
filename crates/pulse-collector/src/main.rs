//! Standalone news analysis collector CLI.

use clap::{Parser, Subcommand};
use pulse_collector::{modules, CollectorConfig};
use pulse_data::{AnalysisRepository, Database};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "pulse-collector")]
#[command(about = "PulseQuant News Analysis Collector", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// 틱 1회 실행 (수집 → 선별 → 분석 → 정리)
    RunOnce,

    /// 보존 정리만 실행
    Trim,

    /// 데몬 모드: 주기적으로 틱 실행
    Daemon,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // 로깅 초기화
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("pulse_collector={}", cli.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("PulseQuant News Collector 시작");

    // 설정 로드
    let config = CollectorConfig::from_env()?;
    tracing::debug!(batch_size = config.batch.batch_size, "설정 로드 완료");

    // DB 연결 및 마이그레이션
    let pool = sqlx::PgPool::connect(&config.database_url).await?;
    Database::from_pool(pool.clone()).migrate().await?;
    tracing::info!("데이터베이스 연결 성공");

    // 명령 실행
    match cli.command {
        Commands::RunOnce => {
            let stats = modules::run_analysis_tick(&pool, &config).await?;
            stats.log_summary("분석 틱");
        }
        Commands::Trim => {
            let repo = AnalysisRepository::new(pool.clone());
            let deleted = repo.trim_keep_latest(config.batch.retention_keep).await?;
            tracing::info!(deleted, keep = config.batch.retention_keep, "보존 정리 완료");
        }
        Commands::Daemon => {
            tracing::info!(
                "=== 데몬 모드 시작 (주기: {}분) ===",
                config.daemon.interval_minutes
            );

            let mut interval = tokio::time::interval(config.daemon.interval());
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {
                        tracing::info!("종료 신호 수신, 데몬 종료 중...");
                        break;
                    }
                    _ = interval.tick() => {
                        tracing::info!("=== 분석 틱 시작 ===");

                        // 틱 단위 실패는 다음 틱이 처음부터 재시도한다
                        match modules::run_analysis_tick(&pool, &config).await {
                            Ok(stats) => {
                                stats.log_summary("분석 틱");
                            }
                            Err(e) => {
                                tracing::error!("분석 틱 실패: {}", e);
                            }
                        }
                    }
                }
            }
        }
    }

    pool.close().await;
    tracing::info!("PulseQuant News Collector 종료");

    Ok(())
}
