//! 트레이딩 시그널 생성.
//!
//! 이 모듈은 분석 결과를 최종 매매 신호로 변환하는 타입을 정의합니다:
//! - `Side` - 포지션 방향
//! - `TradeSignal` - 최종 신호
//! - `generate_signal` - 감성/점수 → 신호 매핑 (순수 함수)
//! - `Suppression` - 리스크 필터가 신호를 기각한 사유

use crate::domain::Sentiment;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 포지션 방향.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// 매수 (롱)
    Buy,
    /// 매도 (숏)
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// 최종 매매 신호.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeSignal {
    StrongBuy,
    Buy,
    Sell,
    StrongSell,
    NoTrade,
}

impl TradeSignal {
    /// 실제 매매로 이어지는 신호인지 확인합니다.
    pub fn is_trade(&self) -> bool {
        !matches!(self, TradeSignal::NoTrade)
    }

    /// 신호의 포지션 방향을 반환합니다.
    pub fn side(&self) -> Option<Side> {
        match self {
            TradeSignal::StrongBuy | TradeSignal::Buy => Some(Side::Buy),
            TradeSignal::StrongSell | TradeSignal::Sell => Some(Side::Sell),
            TradeSignal::NoTrade => None,
        }
    }
}

impl fmt::Display for TradeSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeSignal::StrongBuy => write!(f, "STRONG_BUY"),
            TradeSignal::Buy => write!(f, "BUY"),
            TradeSignal::Sell => write!(f, "SELL"),
            TradeSignal::StrongSell => write!(f, "STRONG_SELL"),
            TradeSignal::NoTrade => write!(f, "NO_TRADE"),
        }
    }
}

impl std::str::FromStr for TradeSignal {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "STRONG_BUY" => Ok(Self::StrongBuy),
            "BUY" => Ok(Self::Buy),
            "SELL" => Ok(Self::Sell),
            "STRONG_SELL" => Ok(Self::StrongSell),
            "NO_TRADE" => Ok(Self::NoTrade),
            _ => Err(format!("Unknown trade signal: {}", s)),
        }
    }
}

/// 분석 결과를 매매 신호로 변환합니다.
///
/// 경계값 포함: 중요도 8 이상이면 강한 신호, 6 이상이면 일반 신호,
/// 그 외에는 `NoTrade`. 모델이 매매 불가로 판단했거나(`would_trade
/// = false`) 감성이 중립이면 점수와 무관하게 `NoTrade`입니다.
pub fn generate_signal(sentiment: Sentiment, score: u8, would_trade: bool) -> TradeSignal {
    if !would_trade {
        return TradeSignal::NoTrade;
    }

    match sentiment {
        Sentiment::Bullish if score >= 8 => TradeSignal::StrongBuy,
        Sentiment::Bullish if score >= 6 => TradeSignal::Buy,
        Sentiment::Bearish if score >= 8 => TradeSignal::StrongSell,
        Sentiment::Bearish if score >= 6 => TradeSignal::Sell,
        _ => TradeSignal::NoTrade,
    }
}

/// 리스크 필터가 신호를 기각한 사유.
///
/// 다운스트림에서 기계 판독이 가능하도록 정책 이름과 사유를 분리합니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suppression {
    /// 정책 식별자 (예: "macro_score_floor")
    pub policy: String,
    /// 사람이 읽을 수 있는 사유
    pub reason: String,
}

impl Suppression {
    /// 새 기각 사유를 생성합니다.
    pub fn new(policy: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            policy: policy.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_thresholds() {
        assert_eq!(
            generate_signal(Sentiment::Bullish, 9, true),
            TradeSignal::StrongBuy
        );
        assert_eq!(
            generate_signal(Sentiment::Bullish, 8, true),
            TradeSignal::StrongBuy
        );
        assert_eq!(generate_signal(Sentiment::Bullish, 7, true), TradeSignal::Buy);
        assert_eq!(generate_signal(Sentiment::Bullish, 6, true), TradeSignal::Buy);
        assert_eq!(
            generate_signal(Sentiment::Bullish, 5, true),
            TradeSignal::NoTrade
        );
        assert_eq!(
            generate_signal(Sentiment::Bearish, 8, true),
            TradeSignal::StrongSell
        );
        assert_eq!(generate_signal(Sentiment::Bearish, 6, true), TradeSignal::Sell);
    }

    #[test]
    fn test_would_trade_false_always_no_trade() {
        assert_eq!(
            generate_signal(Sentiment::Bullish, 10, false),
            TradeSignal::NoTrade
        );
        assert_eq!(
            generate_signal(Sentiment::Bearish, 9, false),
            TradeSignal::NoTrade
        );
    }

    #[test]
    fn test_neutral_sentiment_never_trades() {
        assert_eq!(
            generate_signal(Sentiment::Neutral, 10, true),
            TradeSignal::NoTrade
        );
    }

    #[test]
    fn test_signal_roundtrip() {
        for signal in [
            TradeSignal::StrongBuy,
            TradeSignal::Buy,
            TradeSignal::Sell,
            TradeSignal::StrongSell,
            TradeSignal::NoTrade,
        ] {
            let parsed: TradeSignal = signal.to_string().parse().unwrap();
            assert_eq!(parsed, signal);
        }
    }
}
