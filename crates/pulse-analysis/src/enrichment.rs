//! Stage B: 데이터 보강 단계.
//!
//! 분류 계획의 모든 데이터 포인트를 캐시 폴백 서비스로 가져옵니다.
//! 개별 조회는 서로 독립적이며, 하나의 실패가 다른 조회를 중단시키지
//! 않습니다. 실패한 포인트는 `unavailable`로 기록될 뿐 아이템을
//! 실패시키지 않습니다.

use crate::classifier::AnalysisPlan;
use futures::future::join_all;
use pulse_core::{DataPointSummary, MarketRegime};
use pulse_data::{CachedMarketDataService, DataOrigin, DataPointValue};
use tracing::{debug, warn};

/// VIX 레벨 기준 리스크 오프/온 임계값.
const VIX_RISK_OFF: f64 = 25.0;
const VIX_RISK_ON: f64 = 15.0;

/// 보강 단계 결과.
#[derive(Debug, Default)]
pub struct EnrichedData {
    /// 확보한 데이터 포인트 값
    pub values: Vec<DataPointValue>,
    /// 실패한 포인트의 캐시 키
    pub unavailable: Vec<String>,
}

impl EnrichedData {
    /// 페이로드 저장용 요약 목록.
    pub fn summaries(&self) -> Vec<DataPointSummary> {
        let mut summaries: Vec<DataPointSummary> = self
            .values
            .iter()
            .map(|v| DataPointSummary {
                key: v.snapshot.key.clone(),
                available: true,
                source: Some(match v.origin {
                    DataOrigin::Live => v.snapshot.source.clone(),
                    DataOrigin::CacheFallback => "cache".to_string(),
                }),
                from_cache: v.origin == DataOrigin::CacheFallback,
            })
            .collect();

        summaries.extend(self.unavailable.iter().map(|key| DataPointSummary {
            key: key.clone(),
            available: false,
            source: None,
            from_cache: false,
        }));

        summaries
    }

    /// 확보한 값의 캐시 키 목록 (결정 단계 일관성 검사용).
    pub fn supplied_keys(&self) -> Vec<String> {
        self.values.iter().map(|v| v.snapshot.key.clone()).collect()
    }

    /// 결정 프롬프트에 넣을 컴팩트 JSON 렌더링.
    pub fn render_for_prompt(&self) -> String {
        let entries: Vec<serde_json::Value> = self
            .values
            .iter()
            .map(|v| {
                serde_json::json!({
                    "key": v.snapshot.key,
                    "value": v.snapshot.value,
                    "source": v.snapshot.source,
                    "from_cache": v.origin == DataOrigin::CacheFallback,
                    "fetched_at": v.snapshot.fetched_at.to_rfc3339(),
                })
            })
            .collect();

        serde_json::Value::Array(entries).to_string()
    }

    /// 보강된 VIX 레벨에서 시장 레짐을 유도합니다.
    ///
    /// VIX 매크로 지수를 가져오지 않은 경우 중립입니다.
    pub fn derive_regime(&self) -> MarketRegime {
        let vix_level = self.values.iter().find_map(|v| {
            if v.snapshot.symbol == "VIX" {
                v.snapshot.value.get("level").and_then(|l| l.as_f64())
            } else {
                None
            }
        });

        match vix_level {
            Some(level) if level >= VIX_RISK_OFF => MarketRegime::RiskOff,
            Some(level) if level <= VIX_RISK_ON => MarketRegime::RiskOn,
            Some(_) => MarketRegime::Neutral,
            None => MarketRegime::Neutral,
        }
    }
}

/// 계획의 데이터 포인트를 모두 가져옵니다.
///
/// 시장을 움직이지 않는 이벤트는 수집을 건너뜁니다 (빈 결과).
pub async fn enrich(service: &CachedMarketDataService, plan: &AnalysisPlan) -> EnrichedData {
    if !plan.market_moving || plan.data_points.is_empty() {
        return EnrichedData::default();
    }

    let fetches = plan.data_points.iter().map(|req| service.fetch(req));
    let results = join_all(fetches).await;

    let mut enriched = EnrichedData::default();
    for (req, result) in plan.data_points.iter().zip(results) {
        match result {
            Ok(value) => {
                debug!(key = %value.snapshot.key, origin = ?value.origin, "데이터 포인트 확보");
                enriched.values.push(value);
            }
            Err(e) => {
                // 조회 실패는 아이템을 중단시키지 않는다
                warn!(key = %req.cache_key(), error = %e, "데이터 포인트 확보 실패");
                enriched.unavailable.push(req.cache_key());
            }
        }
    }

    enriched
}
