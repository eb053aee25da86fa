//! 분석 오케스트레이터.
//!
//! 아이템당 세 단계를 순차 실행합니다: 분류(A) → 데이터 보강(B) →
//! 결정(C). 어느 단계든 실패하면 그 아이템만 중단되고, 잠금은
//! 건드리지 않아 자연 만료됩니다.

use crate::classifier::{AnalysisPlan, Classifier};
use crate::decision::{Decision, DecisionEngine};
use crate::enrichment::{enrich, EnrichedData};
use crate::error::Result;
use crate::position_memory::PositionMemoryAggregator;
use chrono::Utc;
use pulse_core::{
    generate_signal, is_breaking, tier_for_source, AnalysisPayload, AnalysisRecord,
    DataPointSummary, MarketRegime, NewsItem, Suppression, TradeSignal,
};
use pulse_data::CachedMarketDataService;
use pulse_risk::{apply_risk_filters, RiskContext, RiskFilterConfig};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// 단일 아이템의 분석 결과.
#[derive(Debug)]
pub struct ItemAnalysis {
    /// Stage A 계획
    pub plan: AnalysisPlan,
    /// Stage B 요약
    pub data_summaries: Vec<DataPointSummary>,
    /// Stage C 결정
    pub decision: Decision,
    /// 리스크 필터 적용 전 신호
    pub raw_signal: TradeSignal,
    /// 최종 신호
    pub final_signal: TradeSignal,
    /// 발동한 기각 사유
    pub suppressions: Vec<Suppression>,
    /// 해석된 거래 페어
    pub trading_pairs: Vec<String>,
    /// 유도된 시장 레짐
    pub regime: MarketRegime,
}

impl ItemAnalysis {
    /// 저장용 분석 레코드를 만듭니다.
    pub fn into_record(self, item: &NewsItem) -> AnalysisRecord {
        let analyzed_at = Utc::now();
        let payload = AnalysisPayload {
            event_type: self.plan.event_type.clone(),
            market_moving: self.plan.market_moving,
            conviction: self.decision.conviction,
            would_trade: self.decision.would_trade,
            data_points: self.data_summaries,
            positions: self.decision.positions.clone(),
            suppressions: self.suppressions,
            reasoning: self.decision.reasoning.clone(),
        };

        AnalysisRecord {
            news_id: item.canonical_id,
            external_id: item.external_id.clone(),
            title: item.title.clone(),
            source: item.source.clone(),
            url: item.url.clone(),
            category: item.category.clone(),
            sentiment: self.decision.sentiment,
            importance: self.decision.importance,
            signal: self.final_signal,
            trading_pairs: self.trading_pairs,
            payload: Some(payload),
            breaking: is_breaking(self.decision.importance, item.published_at, analyzed_at),
            credibility: tier_for_source(&item.source),
            published_at: item.published_at,
            analyzed_at,
        }
    }
}

/// 3단계 분석 오케스트레이터.
pub struct AnalysisOrchestrator {
    classifier: Classifier,
    engine: DecisionEngine,
    market: Arc<CachedMarketDataService>,
    memory: PositionMemoryAggregator,
    risk_config: RiskFilterConfig,
}

impl AnalysisOrchestrator {
    /// 새 오케스트레이터를 생성합니다.
    pub fn new(
        classifier: Classifier,
        engine: DecisionEngine,
        market: Arc<CachedMarketDataService>,
        memory: PositionMemoryAggregator,
    ) -> Self {
        Self {
            classifier,
            engine,
            market,
            memory,
            risk_config: RiskFilterConfig::default(),
        }
    }

    /// 리스크 필터 설정을 지정합니다.
    pub fn with_risk_config(mut self, config: RiskFilterConfig) -> Self {
        self.risk_config = config;
        self
    }

    /// 아이템 하나를 분석합니다.
    ///
    /// 단계는 엄격히 순차적입니다: B는 A에, C는 A와 B에 의존합니다.
    #[instrument(skip(self, item), fields(news_id = item.canonical_id))]
    pub async fn analyze(&self, item: &NewsItem) -> Result<ItemAnalysis> {
        // Stage A: 분류
        let plan = self.classifier.classify(item).await?;

        // Stage B: 데이터 보강 (개별 실패는 아이템을 중단시키지 않음)
        let enriched: EnrichedData = enrich(&self.market, &plan).await;

        // 포지션 메모리: 계획 대상 자산들의 최근 신호 이력
        let memories = match self.memory.aggregate(&plan.target_symbols()).await {
            Ok(memories) => memories,
            Err(e) => {
                // 이력은 보조 컨텍스트다. 조회 실패로 아이템을 버리지 않는다.
                warn!(error = %e, "포지션 메모리 집계 실패, 빈 컨텍스트 사용");
                Vec::new()
            }
        };

        // Stage C: 결정
        let decision = self.engine.decide(item, &plan, &enriched, &memories).await?;

        // 신호 생성 + 리스크 필터
        let raw_signal =
            generate_signal(decision.sentiment, decision.importance, decision.would_trade);
        let regime = enriched.derive_regime();
        let trading_pairs = decision.resolved_pairs();

        let outcome = apply_risk_filters(
            &self.risk_config,
            &RiskContext {
                signal: raw_signal,
                score: decision.importance,
                conviction: decision.conviction,
                horizon: decision.max_horizon(),
                regime,
                resolved_pairs: trading_pairs.len(),
            },
        );

        info!(
            news_id = item.canonical_id,
            raw_signal = %raw_signal,
            final_signal = %outcome.signal,
            suppressions = outcome.suppressions.len(),
            "아이템 분석 완료"
        );

        Ok(ItemAnalysis {
            plan,
            data_summaries: enriched.summaries(),
            decision,
            raw_signal,
            final_signal: outcome.signal,
            suppressions: outcome.suppressions,
            trading_pairs,
            regime,
        })
    }
}
