//! 리스크 필터 정책.
//!
//! 생성된 신호를 명명된 정책에 따라 `NO_TRADE`로 강등할 수 있는
//! 순수 함수입니다. I/O가 없고, 기각할 때마다 기계 판독 가능한
//! 사유를 기록합니다.
//!
//! 정책:
//! - `no_instrument`: 해석된 거래 페어가 없으면 점수와 무관하게 기각
//! - `risk_off_low_conviction`: 리스크 오프 레짐에서 저확신 단기
//!   트레이드 차단
//! - `macro_score_floor`: 매크로 호라이즌 트레이드는 더 높은 점수
//!   바닥을 요구

use crate::config::RiskFilterConfig;
use pulse_core::{MarketRegime, Suppression, TradeHorizon, TradeSignal};
use tracing::debug;

/// 리스크 필터 입력 컨텍스트.
#[derive(Debug, Clone)]
pub struct RiskContext {
    /// 신호 생성기가 만든 원시 신호
    pub signal: TradeSignal,
    /// 중요도 점수 (0~10)
    pub score: u8,
    /// 확신도 (0.0~1.0)
    pub conviction: f64,
    /// 매매 호라이즌
    pub horizon: TradeHorizon,
    /// 현재 시장 레짐
    pub regime: MarketRegime,
    /// 해석된 거래 페어 수
    pub resolved_pairs: usize,
}

/// 필터 적용 결과.
#[derive(Debug, Clone)]
pub struct FilterOutcome {
    /// 최종 신호
    pub signal: TradeSignal,
    /// 발동한 기각 사유 목록
    pub suppressions: Vec<Suppression>,
}

impl FilterOutcome {
    /// 기각 없이 신호를 통과시킵니다.
    fn pass(signal: TradeSignal) -> Self {
        Self {
            signal,
            suppressions: Vec::new(),
        }
    }
}

/// 리스크 필터를 적용합니다.
///
/// 하나라도 발동하면 최종 신호는 `NO_TRADE`입니다. 발동한 모든
/// 정책이 기록됩니다.
pub fn apply_risk_filters(config: &RiskFilterConfig, ctx: &RiskContext) -> FilterOutcome {
    if ctx.signal == TradeSignal::NoTrade {
        return FilterOutcome::pass(TradeSignal::NoTrade);
    }

    let mut suppressions = Vec::new();

    // 상품 없으면 트레이드 없음
    if ctx.resolved_pairs == 0 {
        suppressions.push(Suppression::new(
            "no_instrument",
            "no tradable instrument resolved",
        ));
    }

    // 리스크 오프 레짐에서는 저확신 단기 트레이드를 막는다
    if ctx.regime == MarketRegime::RiskOff
        && ctx.horizon == TradeHorizon::Short
        && ctx.conviction < config.low_conviction_threshold
    {
        suppressions.push(Suppression::new(
            "risk_off_low_conviction",
            format!(
                "risk-off regime blocks short-horizon trades with conviction {:.2} < {:.2}",
                ctx.conviction, config.low_conviction_threshold
            ),
        ));
    }

    // 매크로 호라이즌은 더 높은 점수 바닥을 요구한다
    if ctx.horizon == TradeHorizon::Macro && ctx.score < config.macro_score_floor {
        suppressions.push(Suppression::new(
            "macro_score_floor",
            format!(
                "macro-horizon trade requires score >= {}, got {}",
                config.macro_score_floor, ctx.score
            ),
        ));
    }

    if suppressions.is_empty() {
        FilterOutcome::pass(ctx.signal)
    } else {
        debug!(
            original = %ctx.signal,
            policies = suppressions.len(),
            "리스크 필터가 신호를 기각"
        );
        FilterOutcome {
            signal: TradeSignal::NoTrade,
            suppressions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_ctx() -> RiskContext {
        RiskContext {
            signal: TradeSignal::Buy,
            score: 6,
            conviction: 0.8,
            horizon: TradeHorizon::Short,
            regime: MarketRegime::Neutral,
            resolved_pairs: 1,
        }
    }

    #[test]
    fn test_pass_through() {
        let outcome = apply_risk_filters(&RiskFilterConfig::default(), &base_ctx());
        assert_eq!(outcome.signal, TradeSignal::Buy);
        assert!(outcome.suppressions.is_empty());
    }

    #[test]
    fn test_no_instrument_forces_no_trade() {
        let mut ctx = base_ctx();
        ctx.signal = TradeSignal::StrongBuy;
        ctx.score = 10;
        ctx.resolved_pairs = 0;

        let outcome = apply_risk_filters(&RiskFilterConfig::default(), &ctx);
        assert_eq!(outcome.signal, TradeSignal::NoTrade);
        assert_eq!(outcome.suppressions[0].policy, "no_instrument");
    }

    #[test]
    fn test_macro_score_floor() {
        let mut ctx = base_ctx();
        ctx.horizon = TradeHorizon::Macro;
        ctx.score = 6;

        // 바닥은 7: 점수 6은 강등
        let outcome = apply_risk_filters(&RiskFilterConfig::default(), &ctx);
        assert_eq!(outcome.signal, TradeSignal::NoTrade);
        assert_eq!(outcome.suppressions[0].policy, "macro_score_floor");

        // 점수 7은 통과
        ctx.score = 7;
        let outcome = apply_risk_filters(&RiskFilterConfig::default(), &ctx);
        assert_eq!(outcome.signal, TradeSignal::Buy);
    }

    #[test]
    fn test_risk_off_blocks_low_conviction_short() {
        let mut ctx = base_ctx();
        ctx.regime = MarketRegime::RiskOff;
        ctx.conviction = 0.3;

        let outcome = apply_risk_filters(&RiskFilterConfig::default(), &ctx);
        assert_eq!(outcome.signal, TradeSignal::NoTrade);
        assert_eq!(outcome.suppressions[0].policy, "risk_off_low_conviction");

        // 높은 확신이면 리스크 오프여도 통과
        ctx.conviction = 0.8;
        let outcome = apply_risk_filters(&RiskFilterConfig::default(), &ctx);
        assert_eq!(outcome.signal, TradeSignal::Buy);

        // 같은 저확신이라도 스윙 호라이즌은 막지 않는다
        ctx.conviction = 0.3;
        ctx.horizon = TradeHorizon::Swing;
        let outcome = apply_risk_filters(&RiskFilterConfig::default(), &ctx);
        assert_eq!(outcome.signal, TradeSignal::Buy);
    }

    #[test]
    fn test_no_trade_input_stays_no_trade() {
        let mut ctx = base_ctx();
        ctx.signal = TradeSignal::NoTrade;
        ctx.resolved_pairs = 0;

        let outcome = apply_risk_filters(&RiskFilterConfig::default(), &ctx);
        assert_eq!(outcome.signal, TradeSignal::NoTrade);
        // 이미 NO_TRADE인 신호에는 사유를 쌓지 않는다
        assert!(outcome.suppressions.is_empty());
    }

    #[test]
    fn test_multiple_policies_all_recorded() {
        let mut ctx = base_ctx();
        ctx.horizon = TradeHorizon::Macro;
        ctx.score = 5;
        ctx.resolved_pairs = 0;

        let outcome = apply_risk_filters(&RiskFilterConfig::default(), &ctx);
        assert_eq!(outcome.signal, TradeSignal::NoTrade);
        assert_eq!(outcome.suppressions.len(), 2);
    }
}
