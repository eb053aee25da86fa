//! 환경변수 기반 설정 모듈.

use crate::Result;
use pulse_data::FeedConfig;
use std::time::Duration;

/// Collector 전체 설정
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// 데이터베이스 URL
    pub database_url: String,
    /// 뉴스 피드 클라이언트 설정
    pub feed: FeedConfig,
    /// 수집/선별 설정
    pub ingest: IngestConfig,
    /// 배치 실행 설정
    pub batch: BatchConfig,
    /// 데몬 모드 설정
    pub daemon: DaemonConfig,
}

/// 수집/선별 설정
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// 피드 룩백 윈도우 (시간)
    pub lookback_hours: u32,
    /// 후보 최대 나이 (시간). 피드 윈도우와 독립적인 방어적 상한
    pub max_age_hours: i64,
}

/// 배치 실행 설정
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// 틱당 분석 아이템 수 상한 (외부 호출 비용과 벽시계 시간 상한)
    pub batch_size: usize,
    /// 잠금 TTL (초). 파이프라인 1회 + 여유
    pub lock_ttl_secs: i64,
    /// 보존할 최신 레코드 수
    pub retention_keep: i64,
}

/// 데몬 모드 설정
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// 워크플로우 실행 주기 (분 단위)
    pub interval_minutes: u64,
}

impl CollectorConfig {
    /// 환경변수에서 설정 로드
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = std::env::var("DATABASE_URL").map_err(|_| {
            crate::error::CollectorError::Config(
                "DATABASE_URL 환경변수가 설정되지 않았습니다".to_string(),
            )
        })?;

        let feed = FeedConfig::from_env()
            .map_err(|e| crate::error::CollectorError::Config(e.to_string()))?;

        Ok(Self {
            database_url,
            feed,
            ingest: IngestConfig {
                lookback_hours: env_var_parse("FEED_LOOKBACK_HOURS", 24),
                max_age_hours: env_var_parse("CANDIDATE_MAX_AGE_HOURS", 48),
            },
            batch: BatchConfig {
                batch_size: env_var_parse("ANALYSIS_BATCH_SIZE", 5),
                lock_ttl_secs: env_var_parse("ANALYSIS_LOCK_TTL_SECS", 600),
                retention_keep: env_var_parse("ANALYSIS_RETENTION_KEEP", 2000),
            },
            daemon: DaemonConfig {
                interval_minutes: env_var_parse("DAEMON_INTERVAL_MINUTES", 10),
            },
        })
    }
}

impl DaemonConfig {
    /// 워크플로우 실행 주기를 Duration으로 반환
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_minutes * 60)
    }
}

/// 환경변수에서 값을 파싱 (실패 시 기본값 사용)
fn env_var_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_var_parse_default() {
        assert_eq!(env_var_parse("DOES_NOT_EXIST_12345", 42u32), 42);
    }

    #[test]
    fn test_daemon_interval() {
        let daemon = DaemonConfig {
            interval_minutes: 10,
        };
        assert_eq!(daemon.interval(), Duration::from_secs(600));
    }
}
