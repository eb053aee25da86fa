//! 레이트 리밋 폴백이 내장된 시장 데이터 서비스.
//!
//! # 폴백 알고리즘 (요청 단위)
//!
//! 1. 라이브 호출 시도
//! 2. 성공 시: 종류별 TTL로 캐시를 기회적으로 갱신하고 값 반환
//! 3. 레이트 리밋/오류 시: 해당 키의 마지막 캐시 값을 자체 신선도와
//!    무관하게 반환 (오래된 값이 값 없음보다 낫다)
//! 4. 캐시도 비어 있으면 원래 오류 전파
//!
//! 캐시 갱신 실패는 경고만 남기고 값 반환을 막지 않습니다.
//! 빈 데이터로 캐시를 덮어쓰는 일은 없습니다. 제공자가 빈 응답을
//! 오류로 처리하고, 저장 계층도 null 값을 거부합니다.

use crate::error::{DataError, Result};
use crate::provider::LiveMarketSource;
use crate::storage::{CacheRow, MarketCacheRepository};
use async_trait::async_trait;
use chrono::Utc;
use pulse_core::{DataPointRequest, MarketSnapshot};
use std::sync::Arc;
use tracing::{debug, warn};

/// 값의 출처.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataOrigin {
    /// 라이브 호출 성공
    Live,
    /// 라이브 실패 후 캐시 폴백
    CacheFallback,
}

/// 수집된 데이터 포인트 값.
#[derive(Debug, Clone)]
pub struct DataPointValue {
    /// 원래 요청
    pub request: DataPointRequest,
    /// 스냅샷
    pub snapshot: MarketSnapshot,
    /// 출처
    pub origin: DataOrigin,
    /// 폴백 값이 자체 TTL 기준으로도 만료된 상태였는지
    pub stale: bool,
}

/// 스냅샷 저장소 추상화.
///
/// 운영 환경에서는 Postgres 캐시 테이블이고, 테스트에서는 인메모리
/// 구현을 사용합니다.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// 키의 마지막 스냅샷을 조회합니다 (만료 무관).
    async fn get_latest(&self, key: &str) -> Result<Option<CacheRow>>;
    /// 스냅샷을 TTL과 함께 저장합니다.
    async fn put(&self, snapshot: &MarketSnapshot, ttl_secs: u64) -> Result<()>;
}

#[async_trait]
impl SnapshotStore for MarketCacheRepository {
    async fn get_latest(&self, key: &str) -> Result<Option<CacheRow>> {
        MarketCacheRepository::get_latest(self, key).await
    }

    async fn put(&self, snapshot: &MarketSnapshot, ttl_secs: u64) -> Result<()> {
        MarketCacheRepository::put(self, snapshot, ttl_secs).await
    }
}

/// 캐시 폴백이 내장된 시장 데이터 서비스.
pub struct CachedMarketDataService {
    live: Arc<dyn LiveMarketSource>,
    store: Arc<dyn SnapshotStore>,
}

impl CachedMarketDataService {
    /// 새 서비스를 생성합니다.
    pub fn new(live: Arc<dyn LiveMarketSource>, store: Arc<dyn SnapshotStore>) -> Self {
        Self { live, store }
    }

    /// 데이터 포인트 하나를 가져옵니다.
    ///
    /// 라이브와 캐시가 모두 실패한 경우에만 `Err`를 반환합니다.
    pub async fn fetch(&self, request: &DataPointRequest) -> Result<DataPointValue> {
        match self.live.fetch(request).await {
            Ok(snapshot) => {
                // 기회적 캐시 갱신. 실패해도 값 반환은 계속한다.
                let ttl = request.kind.cache_ttl_secs();
                if let Err(e) = self.store.put(&snapshot, ttl).await {
                    warn!(key = %snapshot.key, error = %e, "캐시 갱신 실패");
                }

                Ok(DataPointValue {
                    request: request.clone(),
                    snapshot,
                    origin: DataOrigin::Live,
                    stale: false,
                })
            }
            Err(live_err) => {
                debug!(
                    key = %request.cache_key(),
                    error = %live_err,
                    "라이브 조회 실패, 캐시 폴백 시도"
                );

                match self.store.get_latest(&request.cache_key()).await {
                    Ok(Some(row)) => {
                        let stale = !row.is_fresh(Utc::now());
                        let Some(snapshot) = row.into_snapshot() else {
                            return Err(live_err);
                        };

                        debug!(key = %snapshot.key, stale, "캐시 폴백 값 사용");
                        Ok(DataPointValue {
                            request: request.clone(),
                            snapshot,
                            origin: DataOrigin::CacheFallback,
                            stale,
                        })
                    }
                    Ok(None) => Err(live_err),
                    Err(cache_err) => {
                        warn!(error = %cache_err, "캐시 조회 실패");
                        Err(live_err)
                    }
                }
            }
        }
    }
}
