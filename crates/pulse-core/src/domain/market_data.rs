//! 시장 데이터 포인트 정의.
//!
//! 분류 단계(Stage A)가 요구하는 데이터 포인트와, 수집된 스냅샷,
//! 그리고 시장 레짐 판정을 정의합니다.

use crate::types::canonical_asset_key;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 데이터 포인트 종류.
///
/// 종류마다 변동성이 다르므로 캐시 TTL도 종류별로 다릅니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataPointKind {
    /// 현물 가격
    SpotPrice,
    /// 파생 펀딩비
    FundingRate,
    /// 미결제 약정
    OpenInterest,
    /// 캔들 (최근 추이)
    Candles,
    /// 매크로 지수 레벨 (나스닥, VIX 등)
    MacroIndex,
    /// 국채 수익률 곡선
    YieldCurve,
    /// 포지셔닝 리포트 (CFTC COT)
    Positioning,
    /// 기업 펀더멘털
    Fundamentals,
}

impl DataPointKind {
    /// 데이터 고유 변동성에 맞춘 캐시 TTL (초).
    ///
    /// 티커류는 초 단위, 지수는 분 단위, 수익률은 시간 단위,
    /// 포지셔닝 리포트는 일 단위로 유지합니다.
    pub fn cache_ttl_secs(&self) -> u64 {
        match self {
            DataPointKind::SpotPrice => 30,
            DataPointKind::FundingRate => 300,
            DataPointKind::OpenInterest => 300,
            DataPointKind::Candles => 300,
            DataPointKind::MacroIndex => 900,
            DataPointKind::YieldCurve => 21_600,
            DataPointKind::Positioning => 86_400,
            DataPointKind::Fundamentals => 86_400,
        }
    }
}

impl fmt::Display for DataPointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DataPointKind::SpotPrice => "spot_price",
            DataPointKind::FundingRate => "funding_rate",
            DataPointKind::OpenInterest => "open_interest",
            DataPointKind::Candles => "candles",
            DataPointKind::MacroIndex => "macro_index",
            DataPointKind::YieldCurve => "yield_curve",
            DataPointKind::Positioning => "positioning",
            DataPointKind::Fundamentals => "fundamentals",
        };
        write!(f, "{}", s)
    }
}

/// 분류 단계가 요구한 개별 데이터 포인트.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataPointRequest {
    /// 데이터 종류
    pub kind: DataPointKind,
    /// 대상 심볼 (원시 표기 허용)
    pub symbol: String,
    /// 시간 윈도우 힌트 (예: "24h", "7d")
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub window: Option<String>,
}

impl DataPointRequest {
    /// 새 요청을 생성합니다.
    pub fn new(kind: DataPointKind, symbol: impl Into<String>) -> Self {
        Self {
            kind,
            symbol: symbol.into(),
            window: None,
        }
    }

    /// 캐시 키: `종류:정규화된심볼`.
    ///
    /// 소스마다 다른 심볼 표기가 하나의 캐시 엔트리로 수렴하도록
    /// 정규화된 심볼을 사용합니다.
    pub fn cache_key(&self) -> String {
        format!("{}:{}", self.kind, canonical_asset_key(&self.symbol))
    }
}

/// 수집된 시장 데이터 스냅샷.
///
/// 캐시 테이블에 마지막 기록 우선(last-writer-wins)으로 저장되고,
/// 레이트 리밋 폴백 시 워커 간에 공유됩니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSnapshot {
    /// 캐시 키 (kind:SYMBOL)
    pub key: String,
    /// 데이터 종류
    pub kind: DataPointKind,
    /// 정규화된 심볼
    pub symbol: String,
    /// 값 (종류별 구조의 JSON)
    pub value: serde_json::Value,
    /// 데이터 출처 (예: "binance", "yahoo")
    pub source: String,
    /// 수집 시각
    pub fetched_at: DateTime<Utc>,
}

/// 시장 레짐.
///
/// 리스크 필터가 단기 저확신 트레이드를 차단할지 판단할 때 사용합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketRegime {
    RiskOn,
    Neutral,
    RiskOff,
}

impl Default for MarketRegime {
    fn default() -> Self {
        Self::Neutral
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_canonicalizes_symbol() {
        let req = DataPointRequest::new(DataPointKind::SpotPrice, "BINANCE:BTC-USDT");
        assert_eq!(req.cache_key(), "spot_price:BTCUSDT");

        let req = DataPointRequest::new(DataPointKind::MacroIndex, "^VIX");
        assert_eq!(req.cache_key(), "macro_index:VIX");
    }

    #[test]
    fn test_ttl_ordering_by_volatility() {
        // 티커 < 지수 < 수익률 < 포지셔닝
        assert!(
            DataPointKind::SpotPrice.cache_ttl_secs() < DataPointKind::MacroIndex.cache_ttl_secs()
        );
        assert!(
            DataPointKind::MacroIndex.cache_ttl_secs() < DataPointKind::YieldCurve.cache_ttl_secs()
        );
        assert!(
            DataPointKind::YieldCurve.cache_ttl_secs() < DataPointKind::Positioning.cache_ttl_secs()
        );
    }
}
