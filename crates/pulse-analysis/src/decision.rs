//! Stage C: 결정 단계.
//!
//! 콘텐츠, Stage A의 계획, Stage B의 데이터를 받아 감성, 중요도
//! 점수(0~10), 매매 여부, 확신도, 0개 이상의 포지션 제안을
//! 생성합니다. 출력은 내부 일관성 검사를 거치며, Stage B가 값을
//! 공급했는데 데이터가 없다고 주장하는 것은 허용되지 않습니다.

use crate::classifier::AnalysisPlan;
use crate::client::ChatClient;
use crate::enrichment::EnrichedData;
use crate::error::{AnalysisError, Result};
use pulse_core::{
    NewsItem, PositionMemory, PositionRecommendation, Sentiment, Side, TradeHorizon, TradingPair,
};
use serde::Deserialize;
use tracing::{debug, warn};

/// 결정 단계의 최종 출력.
#[derive(Debug, Clone)]
pub struct Decision {
    /// 감성
    pub sentiment: Sentiment,
    /// 중요도 점수 (0~10)
    pub importance: u8,
    /// 매매 여부
    pub would_trade: bool,
    /// 확신도 (0.0~1.0)
    pub conviction: f64,
    /// 포지션 제안
    pub positions: Vec<PositionRecommendation>,
    /// 결정 근거
    pub reasoning: Option<String>,
}

impl Decision {
    /// 해석된 거래 페어 문자열 목록.
    pub fn resolved_pairs(&self) -> Vec<String> {
        self.positions.iter().map(|p| p.pair.to_string()).collect()
    }

    /// 가장 긴 호라이즌 (리스크 필터 입력).
    pub fn max_horizon(&self) -> TradeHorizon {
        let mut horizon = TradeHorizon::Short;
        for p in &self.positions {
            horizon = match (horizon, p.horizon) {
                (_, TradeHorizon::Macro) | (TradeHorizon::Macro, _) => TradeHorizon::Macro,
                (_, TradeHorizon::Swing) | (TradeHorizon::Swing, _) => TradeHorizon::Swing,
                _ => TradeHorizon::Short,
            };
        }
        horizon
    }
}

// 모델 출력 스키마.
#[derive(Debug, Deserialize)]
struct DecisionPayload {
    sentiment: String,
    importance: i64,
    would_trade: bool,
    #[serde(default)]
    conviction: f64,
    #[serde(default)]
    positions: Vec<RawPosition>,
    #[serde(default)]
    reasoning: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawPosition {
    pair: String,
    side: String,
    #[serde(default)]
    horizon: Option<String>,
    #[serde(default)]
    rationale: String,
}

const SYSTEM_PROMPT: &str = r#"You are a trading-desk analyst. Given a news
item, an analysis plan and the fetched market data, produce a final decision.
Respond with a single JSON object:
{
  "sentiment": "bullish" | "bearish" | "neutral",
  "importance": 0-10,
  "would_trade": bool,
  "conviction": 0.0-1.0,
  "positions": [
    {"pair": "BASE/QUOTE", "side": "buy" | "sell",
     "horizon": "short" | "swing" | "macro", "rationale": string}
  ],
  "reasoning": string
}
Ground every claim in the supplied data. If data was supplied for a key, do
not claim it is missing. The source credibility tier and position history
are context for importance and conviction."#;

/// 결정 단계.
pub struct DecisionEngine {
    client: ChatClient,
}

impl DecisionEngine {
    /// 새 결정 엔진을 생성합니다.
    pub fn new(client: ChatClient) -> Self {
        Self { client }
    }

    /// 결정을 생성합니다.
    pub async fn decide(
        &self,
        item: &NewsItem,
        plan: &AnalysisPlan,
        enriched: &EnrichedData,
        memories: &[PositionMemory],
    ) -> Result<Decision> {
        let user_prompt = build_user_prompt(item, plan, enriched, memories);
        let raw = self.client.complete_json(SYSTEM_PROMPT, &user_prompt).await?;

        let decision = parse_decision(&raw)?;
        grade_consistency(&decision, &enriched.supplied_keys())?;

        debug!(
            news_id = item.canonical_id,
            sentiment = %decision.sentiment,
            importance = decision.importance,
            would_trade = decision.would_trade,
            positions = decision.positions.len(),
            "결정 완료"
        );
        Ok(decision)
    }
}

/// 사용자 프롬프트를 구성합니다.
fn build_user_prompt(
    item: &NewsItem,
    plan: &AnalysisPlan,
    enriched: &EnrichedData,
    memories: &[PositionMemory],
) -> String {
    let memory_context = if memories.is_empty() {
        "none".to_string()
    } else {
        memories
            .iter()
            .map(|m| {
                format!(
                    "{}: last_direction={}, flip_risk={}, recent={:?}",
                    m.asset_key,
                    m.last_direction
                        .map(|d| d.to_string())
                        .unwrap_or_else(|| "-".to_string()),
                    m.flip_risk,
                    m.recent_directions
                        .iter()
                        .map(|d| d.to_string())
                        .collect::<Vec<_>>(),
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        "Title: {}\nSource: {} (credibility: {})\nEvent type: {}\n\n\
         Market data (JSON):\n{}\n\nUnavailable data points: {}\n\n\
         Recent position history:\n{}\n\nComparable events: {}",
        item.title,
        item.source,
        pulse_core::tier_for_source(&item.source),
        plan.event_type.as_deref().unwrap_or("unknown"),
        enriched.render_for_prompt(),
        if enriched.unavailable.is_empty() {
            "none".to_string()
        } else {
            enriched.unavailable.join(", ")
        },
        memory_context,
        if plan.comparables.is_empty() {
            "none".to_string()
        } else {
            plan.comparables.join("; ")
        },
    )
}

/// 모델 출력을 결정으로 파싱합니다.
fn parse_decision(raw: &str) -> Result<Decision> {
    let payload: DecisionPayload = serde_json::from_str(raw)
        .map_err(|e| AnalysisError::StageParse(format!("decision output: {}", e)))?;

    let sentiment: Sentiment = payload
        .sentiment
        .parse()
        .map_err(|e: String| AnalysisError::StageParse(e))?;

    let mut positions = Vec::new();
    for raw_pos in payload.positions {
        let Some(pair) = TradingPair::parse(&raw_pos.pair) else {
            // 페어를 해석할 수 없는 제안은 거래 불가능하므로 버린다
            warn!(pair = %raw_pos.pair, "거래 페어 해석 실패, 제안 제외");
            continue;
        };

        let side = match raw_pos.side.to_lowercase().as_str() {
            "buy" | "long" => Side::Buy,
            "sell" | "short" => Side::Sell,
            other => {
                warn!(side = %other, "알 수 없는 포지션 방향, 제안 제외");
                continue;
            }
        };

        let horizon = match raw_pos.horizon.as_deref() {
            Some("macro") => TradeHorizon::Macro,
            Some("swing") => TradeHorizon::Swing,
            _ => TradeHorizon::Short,
        };

        positions.push(PositionRecommendation {
            pair,
            side,
            horizon,
            rationale: raw_pos.rationale,
        });
    }

    if !(0..=10).contains(&payload.importance) {
        return Err(AnalysisError::Inconsistent(format!(
            "importance out of range: {}",
            payload.importance
        )));
    }

    Ok(Decision {
        sentiment,
        importance: payload.importance as u8,
        would_trade: payload.would_trade,
        conviction: payload.conviction,
        positions,
        reasoning: payload.reasoning,
    })
}

/// 결정의 내부 일관성을 검사합니다.
///
/// 위반은 이 아이템만 실패시키는 단계 오류입니다.
fn grade_consistency(decision: &Decision, supplied_keys: &[String]) -> Result<()> {
    if !(0.0..=1.0).contains(&decision.conviction) {
        return Err(AnalysisError::Inconsistent(format!(
            "conviction out of range: {}",
            decision.conviction
        )));
    }

    if decision.would_trade && decision.sentiment == Sentiment::Neutral {
        return Err(AnalysisError::Inconsistent(
            "would_trade with neutral sentiment".to_string(),
        ));
    }

    // Stage B가 값을 공급했는데 데이터가 없다고 주장하면 안 된다
    if !supplied_keys.is_empty() {
        let text = decision
            .reasoning
            .iter()
            .map(|s| s.as_str())
            .chain(decision.positions.iter().map(|p| p.rationale.as_str()))
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();

        const MISSING_CLAIMS: [&str; 4] = [
            "no market data",
            "data unavailable",
            "missing data",
            "could not retrieve",
        ];
        if MISSING_CLAIMS.iter().any(|claim| text.contains(claim)) {
            return Err(AnalysisError::Inconsistent(
                "claims missing data while values were supplied".to_string(),
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_raw() -> &'static str {
        r#"{
            "sentiment": "bullish",
            "importance": 8,
            "would_trade": true,
            "conviction": 0.75,
            "positions": [
                {"pair": "BTC/USDT", "side": "buy", "horizon": "short",
                 "rationale": "ETF inflows accelerating"},
                {"pair": "NOTAPAIR", "side": "buy", "rationale": "dropped"}
            ],
            "reasoning": "Strong inflow data with supportive funding"
        }"#
    }

    #[test]
    fn test_parse_decision_valid() {
        let decision = parse_decision(valid_raw()).unwrap();
        assert_eq!(decision.sentiment, Sentiment::Bullish);
        assert_eq!(decision.importance, 8);
        // 해석 불가능한 페어는 제외된다
        assert_eq!(decision.positions.len(), 1);
        assert_eq!(decision.resolved_pairs(), vec!["BTC/USDT"]);
        assert_eq!(decision.max_horizon(), TradeHorizon::Short);
    }

    #[test]
    fn test_parse_decision_bad_sentiment() {
        let raw = r#"{"sentiment": "hopeful", "importance": 5, "would_trade": false}"#;
        let err = parse_decision(raw).unwrap_err();
        assert!(matches!(err, AnalysisError::StageParse(_)));
    }

    #[test]
    fn test_max_horizon_prefers_macro() {
        let raw = r#"{
            "sentiment": "bearish",
            "importance": 7,
            "would_trade": true,
            "conviction": 0.6,
            "positions": [
                {"pair": "BTC/USDT", "side": "sell", "horizon": "short", "rationale": "r"},
                {"pair": "ETH/USDT", "side": "sell", "horizon": "macro", "rationale": "r"}
            ]
        }"#;
        let decision = parse_decision(raw).unwrap();
        assert_eq!(decision.max_horizon(), TradeHorizon::Macro);
    }

    #[test]
    fn test_parse_rejects_out_of_range_importance() {
        let raw = r#"{"sentiment": "bullish", "importance": 15, "would_trade": false}"#;
        let err = parse_decision(raw).unwrap_err();
        assert!(matches!(err, AnalysisError::Inconsistent(_)));
    }

    #[test]
    fn test_grade_rejects_out_of_range_conviction() {
        let raw = r#"{
            "sentiment": "bullish", "importance": 5,
            "would_trade": true, "conviction": 1.7
        }"#;
        let decision = parse_decision(raw).unwrap();
        let err = grade_consistency(&decision, &[]).unwrap_err();
        assert!(matches!(err, AnalysisError::Inconsistent(_)));
    }

    #[test]
    fn test_grade_rejects_neutral_trade() {
        let raw = r#"{
            "sentiment": "neutral", "importance": 5,
            "would_trade": true, "conviction": 0.5
        }"#;
        let decision = parse_decision(raw).unwrap();
        assert!(grade_consistency(&decision, &[]).is_err());
    }

    #[test]
    fn test_grade_rejects_missing_data_claim_when_supplied() {
        let raw = r#"{
            "sentiment": "bullish", "importance": 6,
            "would_trade": false, "conviction": 0.4,
            "reasoning": "Data unavailable for spot price, guessing."
        }"#;
        let decision = parse_decision(raw).unwrap();

        let supplied = vec!["spot_price:BTCUSDT".to_string()];
        assert!(grade_consistency(&decision, &supplied).is_err());

        // 아무 값도 공급되지 않았다면 같은 주장은 허용된다
        assert!(grade_consistency(&decision, &[]).is_ok());
    }
}
