//! 분석 배치 실행 모듈 (잡 드라이버).
//!
//! 후보를 우선순위 순으로 걸으며 잠금 획득을 시도하고, 획득한
//! 아이템들의 파이프라인을 배치 크기 상한의 병렬성으로 실행합니다.
//!
//! # 잠금 규칙
//!
//! - `Locked`는 에러가 아니다: 다음 후보로 건너뛴다 (skip-ahead).
//!   병렬 워커가 앞쪽 후보들을 선점했어도 남은 아이템으로 배치를
//!   채울 수 있어, 스케줄 트리거의 수평 확장에서 처리량이 유지된다.
//! - 성공한 아이템만 잠금을 해제한다. 실패/미저장 아이템의 잠금은
//!   의도적으로 남겨 자연 만료시킨다. 영구적으로 잘못된 아이템이
//!   매 틱 분석 비용을 태우는 것을 막는 재시도 스로틀이다.

use crate::config::CollectorConfig;
use crate::error::Result;
use crate::modules::fetch::fetch_news;
use crate::modules::select::{select_candidates, Candidate};
use crate::stats::RunStats;
use futures::future::join_all;
use pulse_analysis::{
    AnalysisOrchestrator, ChatClient, ChatConfig, Classifier, DecisionEngine,
    PositionMemoryAggregator,
};
use pulse_core::{AnalysisRecord, NewsItem};
use pulse_data::{
    AnalysisRepository, CachedMarketDataService, FeedClient, LockRepository,
    MarketCacheRepository, ProviderRouter, UpsertOutcome,
};
use pulse_notification::{Dispatcher, NotificationEvent, TelegramConfig, TelegramSender};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};
use uuid::Uuid;

/// 아이템 하나의 실행 결과.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ItemOutcome {
    Inserted,
    Updated,
    Failed,
}

/// 배치 실행에 필요한 의존성 묶음.
pub struct JobContext {
    pub repo: AnalysisRepository,
    pub locks: LockRepository,
    pub orchestrator: AnalysisOrchestrator,
    pub dispatcher: Dispatcher,
    /// 이 호출(invocation)의 워커 ID
    pub worker_id: Uuid,
}

/// 저장된 레코드에서 알림 이벤트를 만듭니다.
///
/// 뉴스 알림은 항상, 신호 알림은 신호가 NO_TRADE가 아니고 거래
/// 페어가 해석된 경우에만 발행됩니다.
pub fn build_notifications(record: &AnalysisRecord) -> Vec<NotificationEvent> {
    let mut events = vec![NotificationEvent::NewsAnalyzed {
        title: record.title.clone(),
        source: record.source.clone(),
        sentiment: record.sentiment.to_string(),
        importance: record.importance,
        breaking: record.breaking,
        url: record.url.clone(),
    }];

    if record.signal.is_trade() && !record.trading_pairs.is_empty() {
        let (conviction, rationale) = record
            .payload
            .as_ref()
            .map(|p| {
                let rationale = p
                    .positions
                    .first()
                    .map(|pos| pos.rationale.clone())
                    .or_else(|| p.reasoning.clone())
                    .unwrap_or_default();
                (p.conviction, rationale)
            })
            .unwrap_or((0.0, String::new()));

        events.push(NotificationEvent::SignalAlert {
            pair: record.trading_pairs[0].clone(),
            signal: record.signal,
            importance: record.importance,
            conviction,
            rationale,
        });
    }

    events
}

/// 아이템 하나의 파이프라인을 실행합니다.
///
/// 어떤 실패든 이 아이템 안에 격리됩니다. 실패 시 잠금은 건드리지
/// 않습니다.
async fn run_item(ctx: &JobContext, item: &NewsItem) -> ItemOutcome {
    let analysis = match ctx.orchestrator.analyze(item).await {
        Ok(analysis) => analysis,
        Err(e) => {
            error!(
                news_id = item.canonical_id,
                title = %item.title,
                error = %e,
                "아이템 분석 실패, 잠금은 만료에 맡김"
            );
            return ItemOutcome::Failed;
        }
    };

    let record = analysis.into_record(item);

    let outcome = match ctx.repo.upsert(&record).await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(news_id = item.canonical_id, error = %e, "레코드 저장 실패");
            return ItemOutcome::Failed;
        }
    };

    // 성공 경로에서만 잠금 해제
    if let Err(e) = ctx.locks.release(item.canonical_id, ctx.worker_id).await {
        warn!(news_id = item.canonical_id, error = %e, "잠금 해제 실패 (만료에 맡김)");
    }

    match outcome {
        UpsertOutcome::Inserted => {
            // 새로 삽입된 레코드만 알림을 트리거한다
            for event in build_notifications(&record) {
                ctx.dispatcher.publish(event);
            }
            ItemOutcome::Inserted
        }
        UpsertOutcome::Updated => ItemOutcome::Updated,
    }
}

/// 후보 목록에 대해 배치를 실행합니다.
pub async fn run_batch(
    ctx: &JobContext,
    candidates: Vec<Candidate>,
    batch_size: usize,
    stats: &mut RunStats,
) -> Result<()> {
    // 우선순위 순으로 걸으며 잠금 획득. Locked는 skip-ahead.
    let mut acquired: Vec<NewsItem> = Vec::with_capacity(batch_size);
    for candidate in candidates {
        if acquired.len() >= batch_size {
            break;
        }

        match ctx
            .locks
            .acquire(candidate.item.canonical_id, ctx.worker_id)
            .await
        {
            Ok(outcome) if outcome.is_acquired() => acquired.push(candidate.item),
            Ok(_) => {
                // 다른 워커가 작업 중. 틱 안에서 재시도하지 않는다.
                stats.skipped += 1;
            }
            Err(e) => {
                warn!(news_id = candidate.item.canonical_id, error = %e, "잠금 획득 실패");
                stats.errors += 1;
            }
        }
    }

    if acquired.is_empty() {
        info!("실행할 아이템 없음");
        return Ok(());
    }

    info!(batch = acquired.len(), "배치 분석 시작");

    // 획득한 아이템들을 병렬 실행. 실패는 아이템별로 격리된다.
    let outcomes = join_all(acquired.iter().map(|item| run_item(ctx, item))).await;

    for outcome in outcomes {
        match outcome {
            ItemOutcome::Inserted => {
                stats.analyzed += 1;
                stats.inserted += 1;
            }
            ItemOutcome::Updated => {
                stats.analyzed += 1;
                stats.updated += 1;
            }
            ItemOutcome::Failed => stats.errors += 1,
        }
    }

    Ok(())
}

/// 전체 틱을 실행합니다: 수집 → 선별 → 배치 분석 → 보존 정리.
///
/// 아이템 단위 실패는 통계로만 남습니다. 여기서 `Err`는 전처리
/// 단계(피드 도달 불가, DB 연결)의 치명 오류뿐이며, 다음 예약
/// 호출이 처음부터 재시도합니다.
pub async fn run_analysis_tick(pool: &PgPool, config: &CollectorConfig) -> Result<RunStats> {
    let start = Instant::now();
    let mut stats = RunStats::new();

    // 1. 수집
    let feed = FeedClient::new(config.feed.clone())?;
    let items = fetch_news(&feed, config.ingest.lookback_hours).await?;
    stats.fetched = items.len();

    // 2. 선별
    let repo = AnalysisRepository::new(pool.clone());
    let (candidates, done) =
        select_candidates(&repo, items, config.ingest.max_age_hours).await?;
    stats.candidates = candidates.len();
    stats.skipped += done;

    // 3. 의존성 구성. 틱마다 새로 만든다 (프로세스 전역 상태 없음).
    let market = Arc::new(CachedMarketDataService::new(
        Arc::new(ProviderRouter::from_defaults()?),
        Arc::new(MarketCacheRepository::new(pool.clone())),
    ));

    let chat_config = ChatConfig::from_env();
    let orchestrator = AnalysisOrchestrator::new(
        Classifier::new(ChatClient::new(chat_config.clone()).map_err(boxed)?),
        DecisionEngine::new(ChatClient::new(chat_config).map_err(boxed)?),
        market,
        PositionMemoryAggregator::new(repo.clone()),
    );

    let senders: Vec<Arc<dyn pulse_notification::NotificationSender>> =
        match TelegramConfig::from_env() {
            Some(telegram) => vec![Arc::new(TelegramSender::new(telegram)) as _],
            None => {
                info!("텔레그램 미설정, 알림 비활성화");
                Vec::new()
            }
        };
    let (dispatcher, drain) = Dispatcher::spawn(senders);

    let ctx = JobContext {
        repo: repo.clone(),
        locks: LockRepository::new(pool.clone(), config.batch.lock_ttl_secs),
        orchestrator,
        dispatcher,
        worker_id: Uuid::new_v4(),
    };

    // 4. 배치 실행
    run_batch(&ctx, candidates, config.batch.batch_size, &mut stats).await?;

    // 5. 보존 정리. 실패해도 틱 자체는 성공이다.
    match repo.trim_keep_latest(config.batch.retention_keep).await {
        Ok(deleted) => stats.trimmed = deleted as usize,
        Err(e) => warn!(error = %e, "보존 정리 실패"),
    }

    // 디스패처를 닫고 남은 알림이 전송되길 기다린다
    drop(ctx);
    if let Err(e) = drain.await {
        warn!(error = %e, "알림 드레인 태스크 종료 실패");
    }

    stats.elapsed = start.elapsed();
    Ok(stats)
}

fn boxed(e: pulse_analysis::AnalysisError) -> crate::error::CollectorError {
    crate::error::CollectorError::Other(Box::new(e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pulse_core::{
        AnalysisPayload, CredibilityTier, PositionRecommendation, Sentiment, Side, TradeHorizon,
        TradeSignal, TradingPair,
    };

    fn record_with(signal: TradeSignal, pairs: Vec<String>) -> AnalysisRecord {
        let now = Utc::now();
        AnalysisRecord {
            news_id: 1,
            external_id: "e".into(),
            title: "Fed cuts rates".into(),
            source: "Reuters".into(),
            url: None,
            category: None,
            sentiment: Sentiment::Bullish,
            importance: 8,
            signal,
            trading_pairs: pairs,
            payload: Some(AnalysisPayload {
                event_type: Some("rate_decision".into()),
                market_moving: true,
                conviction: 0.8,
                would_trade: true,
                data_points: vec![],
                positions: vec![PositionRecommendation {
                    pair: TradingPair::new("BTC", "USDT"),
                    side: Side::Buy,
                    horizon: TradeHorizon::Short,
                    rationale: "liquidity tailwind".into(),
                }],
                suppressions: vec![],
                reasoning: Some("easing cycle".into()),
            }),
            breaking: true,
            credibility: CredibilityTier::Tier1,
            published_at: now,
            analyzed_at: now,
        }
    }

    #[test]
    fn test_notifications_with_trade_signal() {
        let record = record_with(TradeSignal::StrongBuy, vec!["BTC/USDT".into()]);
        let events = build_notifications(&record);
        assert_eq!(events.len(), 2);
        assert!(matches!(
            events[0],
            NotificationEvent::NewsAnalyzed { breaking: true, .. }
        ));
        match &events[1] {
            NotificationEvent::SignalAlert {
                pair,
                signal,
                conviction,
                rationale,
                ..
            } => {
                assert_eq!(pair, "BTC/USDT");
                assert_eq!(*signal, TradeSignal::StrongBuy);
                assert!((*conviction - 0.8).abs() < 1e-9);
                assert_eq!(rationale, "liquidity tailwind");
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_no_trade_emits_only_news_notification() {
        let record = record_with(TradeSignal::NoTrade, vec!["BTC/USDT".into()]);
        let events = build_notifications(&record);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_signal_without_resolved_pair_emits_only_news() {
        // "상품 없으면 트레이드 없음" 이후에도 방어적으로 한 번 더 확인
        let record = record_with(TradeSignal::Buy, vec![]);
        let events = build_notifications(&record);
        assert_eq!(events.len(), 1);
    }
}
