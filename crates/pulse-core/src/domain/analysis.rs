//! 분석 레코드 및 관련 타입.
//!
//! 이 모듈은 파이프라인의 최종 산출물인 분석 레코드와
//! 그 구성 요소(감성, 호라이즌, 포지션 제안, 분석 페이로드)를 정의합니다.

use crate::domain::{CredibilityTier, Side, Suppression, TradeSignal};
use crate::types::TradingPair;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 뉴스에 대한 시장 감성.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Bullish,
    Bearish,
    Neutral,
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sentiment::Bullish => write!(f, "bullish"),
            Sentiment::Bearish => write!(f, "bearish"),
            Sentiment::Neutral => write!(f, "neutral"),
        }
    }
}

impl std::str::FromStr for Sentiment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bullish" => Ok(Self::Bullish),
            "bearish" => Ok(Self::Bearish),
            "neutral" => Ok(Self::Neutral),
            _ => Err(format!("Unknown sentiment: {}", s)),
        }
    }
}

/// 매매 호라이즌.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeHorizon {
    /// 수 시간~수 일
    Short,
    /// 수 일~수 주
    Swing,
    /// 매크로 이벤트 기반, 수 주 이상
    Macro,
}

impl fmt::Display for TradeHorizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeHorizon::Short => write!(f, "short"),
            TradeHorizon::Swing => write!(f, "swing"),
            TradeHorizon::Macro => write!(f, "macro"),
        }
    }
}

/// 모델이 제안한 개별 포지션.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionRecommendation {
    /// 거래 페어
    pub pair: TradingPair,
    /// 포지션 방향
    pub side: Side,
    /// 매매 호라이즌
    pub horizon: TradeHorizon,
    /// 제안 근거
    pub rationale: String,
}

/// 데이터 포인트 수집 결과 요약 (페이로드 저장용).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPointSummary {
    /// 캐시 키 (kind:SYMBOL)
    pub key: String,
    /// 값 확보 여부
    pub available: bool,
    /// 값의 출처 (live 소스 이름 또는 "cache")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// 캐시 폴백으로 얻은 값인지 여부
    pub from_cache: bool,
}

/// 레코드에 중첩 저장되는 분석 페이로드.
///
/// 이 페이로드가 비어 있는 레코드는 "분석 미완료"로 간주되어
/// 다음 틱에서 재분석 후보가 됩니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisPayload {
    /// 분류 단계가 판정한 이벤트 유형
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
    /// 시장을 움직일 이벤트인지 여부
    pub market_moving: bool,
    /// 확신도 (0.0 ~ 1.0)
    pub conviction: f64,
    /// 모델의 매매 여부 판단
    pub would_trade: bool,
    /// 수집된 데이터 포인트 요약
    #[serde(default)]
    pub data_points: Vec<DataPointSummary>,
    /// 포지션 제안 목록
    #[serde(default)]
    pub positions: Vec<PositionRecommendation>,
    /// 리스크 필터 기각 사유
    #[serde(default)]
    pub suppressions: Vec<Suppression>,
    /// 결정 근거 요약
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

/// 뉴스 아이템당 정확히 하나 존재하는 분석 레코드.
///
/// `news_id`(정규 ID)를 유니크 키로 하는 멱등 upsert로 저장됩니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRecord {
    /// 정규 뉴스 ID (유니크 키)
    pub news_id: i64,
    /// 업스트림 제공자의 아이템 ID
    pub external_id: String,
    /// 제목
    pub title: String,
    /// 소스 이름
    pub source: String,
    /// 원문 URL
    pub url: Option<String>,
    /// 카테고리
    pub category: Option<String>,
    /// 감성
    pub sentiment: Sentiment,
    /// 중요도 점수 (0~10)
    pub importance: u8,
    /// 최종 매매 신호 (리스크 필터 적용 후)
    pub signal: TradeSignal,
    /// 해석된 거래 페어 목록
    pub trading_pairs: Vec<String>,
    /// 중첩 분석 페이로드
    pub payload: Option<AnalysisPayload>,
    /// 속보 여부
    pub breaking: bool,
    /// 소스 신뢰도 등급
    pub credibility: CredibilityTier,
    /// 발행 시각
    pub published_at: DateTime<Utc>,
    /// 분석 완료 시각
    pub analyzed_at: DateTime<Utc>,
}

/// 속보 판정.
///
/// 분석 시점 기준 1시간 이내에 발행됐고 중요도가 8 이상이면 속보로
/// 표시합니다.
pub fn is_breaking(importance: u8, published_at: DateTime<Utc>, analyzed_at: DateTime<Utc>) -> bool {
    importance >= 8 && analyzed_at - published_at <= chrono::Duration::hours(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentiment_parse() {
        assert_eq!("Bullish".parse::<Sentiment>().unwrap(), Sentiment::Bullish);
        assert_eq!("neutral".parse::<Sentiment>().unwrap(), Sentiment::Neutral);
        assert!("positive".parse::<Sentiment>().is_err());
    }

    #[test]
    fn test_is_breaking() {
        let now = Utc::now();
        assert!(is_breaking(9, now - chrono::Duration::minutes(20), now));
        // 중요도 부족
        assert!(!is_breaking(7, now - chrono::Duration::minutes(20), now));
        // 너무 오래된 뉴스
        assert!(!is_breaking(9, now - chrono::Duration::hours(3), now));
    }

    #[test]
    fn test_payload_roundtrip() {
        let payload = AnalysisPayload {
            event_type: Some("rate_decision".to_string()),
            market_moving: true,
            conviction: 0.8,
            would_trade: true,
            data_points: vec![DataPointSummary {
                key: "spot_price:BTCUSDT".to_string(),
                available: true,
                source: Some("binance".to_string()),
                from_cache: false,
            }],
            positions: vec![],
            suppressions: vec![],
            reasoning: None,
        };

        let json = serde_json::to_string(&payload).unwrap();
        let back: AnalysisPayload = serde_json::from_str(&json).unwrap();
        assert!(back.market_moving);
        assert_eq!(back.data_points.len(), 1);
    }
}
