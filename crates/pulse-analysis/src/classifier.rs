//! Stage A: 분류 단계.
//!
//! 원시 제목+본문에서 구조화된 분석 계획을 만듭니다: 필요한 데이터
//! 포인트(심볼, 매크로 지표, 시간 윈도우, 과거 비교 대상)와 이벤트가
//! 시장을 움직일지 여부. 단일 구조화 출력 호출이며, 형식이 잘못된
//! 출력은 이 아이템만 실패시킵니다.

use crate::client::ChatClient;
use crate::error::{AnalysisError, Result};
use pulse_core::{DataPointKind, DataPointRequest, NewsItem};
use serde::Deserialize;
use tracing::{debug, warn};

/// 한 아이템당 허용하는 최대 데이터 포인트 수 (외부 호출 비용 상한).
const MAX_DATA_POINTS: usize = 8;

/// 프롬프트에 넣는 본문 최대 길이 (문자).
const MAX_BODY_CHARS: usize = 2000;

/// 분류 단계의 결과: 구조화된 분석 계획.
#[derive(Debug, Clone)]
pub struct AnalysisPlan {
    /// 이벤트가 시장을 움직일 것인가
    pub market_moving: bool,
    /// 이벤트 유형 (예: "rate_decision", "etf_flow")
    pub event_type: Option<String>,
    /// 수집할 데이터 포인트
    pub data_points: Vec<DataPointRequest>,
    /// 과거 비교 대상 이벤트
    pub comparables: Vec<String>,
}

impl AnalysisPlan {
    /// 계획에 등장하는 대상 자산 심볼 목록.
    pub fn target_symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = Vec::new();
        for dp in &self.data_points {
            if !symbols.contains(&dp.symbol) {
                symbols.push(dp.symbol.clone());
            }
        }
        symbols
    }
}

// 모델 출력 스키마. 누락 필드는 기본값으로 관대하게 받되,
// JSON 자체가 깨진 경우는 단계 실패다.
#[derive(Debug, Deserialize)]
struct PlanPayload {
    #[serde(default)]
    market_moving: bool,
    #[serde(default)]
    event_type: Option<String>,
    #[serde(default)]
    data_points: Vec<PlanDataPoint>,
    #[serde(default)]
    comparables: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct PlanDataPoint {
    kind: String,
    symbol: String,
    #[serde(default)]
    window: Option<String>,
}

const SYSTEM_PROMPT: &str = r#"You are a market-news triage analyst.
Given a news item, decide whether it should move markets and plan which
data points are needed to analyze it. Respond with a single JSON object:
{
  "market_moving": bool,
  "event_type": string,
  "data_points": [
    {"kind": "<spot_price|funding_rate|open_interest|candles|macro_index|yield_curve|positioning|fundamentals>",
     "symbol": "<ticker or index symbol>",
     "window": "<optional, e.g. 24h or 7d>"}
  ],
  "comparables": ["<similar historical events>"]
}
Use macro_index with symbols like ^IXIC or ^VIX, yield_curve for rates.
Request only data that matters for this specific event."#;

/// 분류 단계.
pub struct Classifier {
    client: ChatClient,
}

impl Classifier {
    /// 새 분류기를 생성합니다.
    pub fn new(client: ChatClient) -> Self {
        Self { client }
    }

    /// 뉴스 아이템을 분류하고 분석 계획을 만듭니다.
    pub async fn classify(&self, item: &NewsItem) -> Result<AnalysisPlan> {
        let user_prompt = build_user_prompt(item);
        let raw = self.client.complete_json(SYSTEM_PROMPT, &user_prompt).await?;
        let plan = parse_plan(&raw)?;

        debug!(
            news_id = item.canonical_id,
            market_moving = plan.market_moving,
            data_points = plan.data_points.len(),
            "분류 완료"
        );
        Ok(plan)
    }
}

/// 사용자 프롬프트를 구성합니다.
fn build_user_prompt(item: &NewsItem) -> String {
    let body: String = item.body.chars().take(MAX_BODY_CHARS).collect();
    format!(
        "Title: {}\nSource: {}\nCategory: {}\nTagged tickers: {}\nPublished: {}\n\nBody:\n{}",
        item.title,
        item.source,
        item.category.as_deref().unwrap_or("-"),
        if item.tickers.is_empty() {
            "-".to_string()
        } else {
            item.tickers.join(", ")
        },
        item.published_at.to_rfc3339(),
        body,
    )
}

/// 모델 출력을 계획으로 파싱합니다.
///
/// 알 수 없는 kind의 데이터 포인트는 경고 후 건너뜁니다. JSON 자체가
/// 깨졌으면 `StageParse`입니다.
fn parse_plan(raw: &str) -> Result<AnalysisPlan> {
    let payload: PlanPayload = serde_json::from_str(raw)
        .map_err(|e| AnalysisError::StageParse(format!("classification output: {}", e)))?;

    let mut data_points = Vec::new();
    for dp in payload.data_points.into_iter().take(MAX_DATA_POINTS) {
        let kind: DataPointKind =
            match serde_json::from_value(serde_json::Value::String(dp.kind.clone())) {
                Ok(kind) => kind,
                Err(_) => {
                    warn!(kind = %dp.kind, "알 수 없는 데이터 포인트 종류, 건너뜀");
                    continue;
                }
            };

        if dp.symbol.trim().is_empty() {
            continue;
        }

        data_points.push(DataPointRequest {
            kind,
            symbol: dp.symbol,
            window: dp.window,
        });
    }

    Ok(AnalysisPlan {
        market_moving: payload.market_moving,
        event_type: payload.event_type,
        data_points,
        comparables: payload.comparables,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plan_valid() {
        let raw = r#"{
            "market_moving": true,
            "event_type": "etf_flow",
            "data_points": [
                {"kind": "spot_price", "symbol": "BTC"},
                {"kind": "funding_rate", "symbol": "BTC"},
                {"kind": "macro_index", "symbol": "^VIX"}
            ],
            "comparables": ["2024-01 spot ETF approval"]
        }"#;

        let plan = parse_plan(raw).unwrap();
        assert!(plan.market_moving);
        assert_eq!(plan.data_points.len(), 3);
        assert_eq!(plan.data_points[0].kind, DataPointKind::SpotPrice);
        assert_eq!(plan.target_symbols(), vec!["BTC", "^VIX"]);
    }

    #[test]
    fn test_parse_plan_skips_unknown_kind() {
        let raw = r#"{
            "market_moving": true,
            "data_points": [
                {"kind": "astrology", "symbol": "BTC"},
                {"kind": "spot_price", "symbol": "BTC"},
                {"kind": "spot_price", "symbol": " "}
            ]
        }"#;

        let plan = parse_plan(raw).unwrap();
        assert_eq!(plan.data_points.len(), 1);
    }

    #[test]
    fn test_parse_plan_caps_data_points() {
        let points: Vec<String> = (0..20)
            .map(|i| format!(r#"{{"kind": "spot_price", "symbol": "SYM{}"}}"#, i))
            .collect();
        let raw = format!(
            r#"{{"market_moving": true, "data_points": [{}]}}"#,
            points.join(",")
        );

        let plan = parse_plan(&raw).unwrap();
        assert_eq!(plan.data_points.len(), 8);
    }

    #[test]
    fn test_malformed_json_is_stage_parse_error() {
        let err = parse_plan("this is not json").unwrap_err();
        assert!(matches!(err, AnalysisError::StageParse(_)));
    }
}
