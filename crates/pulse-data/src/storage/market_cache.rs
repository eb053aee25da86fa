//! 시장 데이터 캐시 repository.
//!
//! 심볼별 스냅샷을 마지막 기록 우선(last-writer-wins)으로 저장하는
//! 공유 테이블입니다. 모든 워커 프로세스가 같은 테이블을 읽고 쓰므로
//! 한 워커가 수집한 값이 다른 워커의 레이트 리밋 폴백에 쓰입니다.

use crate::error::Result;
use chrono::{DateTime, Duration, Utc};
use pulse_core::{DataPointKind, MarketSnapshot};
use sqlx::postgres::PgPool;
use sqlx::FromRow;
use tracing::{debug, instrument};

/// 캐시 행 레코드.
#[derive(Debug, Clone, FromRow)]
pub struct CacheRow {
    pub cache_key: String,
    pub kind: String,
    pub symbol: String,
    pub value: serde_json::Value,
    pub source: String,
    pub fetched_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl CacheRow {
    /// 스냅샷으로 변환합니다. kind 문자열이 손상된 행은 건너뜁니다.
    pub fn into_snapshot(self) -> Option<MarketSnapshot> {
        let kind: DataPointKind =
            serde_json::from_value(serde_json::Value::String(self.kind)).ok()?;
        Some(MarketSnapshot {
            key: self.cache_key,
            kind,
            symbol: self.symbol,
            value: self.value,
            source: self.source,
            fetched_at: self.fetched_at,
        })
    }

    /// TTL 기준으로 신선한지 확인합니다.
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// 시장 데이터 캐시 repository.
#[derive(Clone)]
pub struct MarketCacheRepository {
    pool: PgPool,
}

impl MarketCacheRepository {
    /// 새 repository를 생성합니다.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 스냅샷을 기회적으로 저장합니다.
    ///
    /// TTL은 데이터 종류의 고유 변동성에 맞춰 호출자가 정합니다.
    /// 빈 값은 저장하지 않습니다. 폴백 경로가 빈 데이터로
    /// 오염되어서는 안 됩니다.
    #[instrument(skip(self, snapshot), fields(key = %snapshot.key))]
    pub async fn put(&self, snapshot: &MarketSnapshot, ttl_secs: u64) -> Result<()> {
        if snapshot.value.is_null() {
            debug!(key = %snapshot.key, "빈 스냅샷은 캐시하지 않음");
            return Ok(());
        }

        let expires_at = snapshot.fetched_at + Duration::seconds(ttl_secs as i64);

        sqlx::query(
            r#"
            INSERT INTO market_data_cache
                (cache_key, kind, symbol, value, source, fetched_at, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (cache_key) DO UPDATE SET
                value = EXCLUDED.value,
                source = EXCLUDED.source,
                fetched_at = EXCLUDED.fetched_at,
                expires_at = EXCLUDED.expires_at
            "#,
        )
        .bind(&snapshot.key)
        .bind(snapshot.kind.to_string())
        .bind(&snapshot.symbol)
        .bind(&snapshot.value)
        .bind(&snapshot.source)
        .bind(snapshot.fetched_at)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// 키의 최근 스냅샷을 조회합니다.
    ///
    /// 폴백 경로에서는 만료 여부와 무관하게 마지막 값을 사용하므로
    /// `expires_at` 필터를 걸지 않습니다. 신선도 판단은 호출자가
    /// `CacheRow::is_fresh`로 합니다.
    pub async fn get_latest(&self, cache_key: &str) -> Result<Option<CacheRow>> {
        let row = sqlx::query_as::<_, CacheRow>(
            r#"
            SELECT cache_key, kind, symbol, value, source, fetched_at, expires_at
            FROM market_data_cache
            WHERE cache_key = $1
            "#,
        )
        .bind(cache_key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// 만료된 캐시 행을 정리합니다 (유지보수용).
    pub async fn purge_expired(&self, older_than: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM market_data_cache
            WHERE expires_at < $1
            "#,
        )
        .bind(older_than)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_row_into_snapshot() {
        let row = CacheRow {
            cache_key: "spot_price:BTCUSDT".into(),
            kind: "spot_price".into(),
            symbol: "BTCUSDT".into(),
            value: serde_json::json!({"price": "67000.5"}),
            source: "binance".into(),
            fetched_at: Utc::now(),
            expires_at: Utc::now(),
        };
        let snapshot = row.into_snapshot().unwrap();
        assert_eq!(snapshot.kind, DataPointKind::SpotPrice);
        assert_eq!(snapshot.symbol, "BTCUSDT");
    }

    #[test]
    fn test_corrupt_kind_is_skipped() {
        let row = CacheRow {
            cache_key: "x:Y".into(),
            kind: "not_a_kind".into(),
            symbol: "Y".into(),
            value: serde_json::json!(1),
            source: "s".into(),
            fetched_at: Utc::now(),
            expires_at: Utc::now(),
        };
        assert!(row.into_snapshot().is_none());
    }

    #[test]
    fn test_freshness() {
        let now = Utc::now();
        let row = CacheRow {
            cache_key: "k".into(),
            kind: "spot_price".into(),
            symbol: "K".into(),
            value: serde_json::json!(1),
            source: "s".into(),
            fetched_at: now - Duration::seconds(60),
            expires_at: now - Duration::seconds(30),
        };
        assert!(!row.is_fresh(now));
        assert!(row.is_fresh(now - Duration::seconds(40)));
    }
}
