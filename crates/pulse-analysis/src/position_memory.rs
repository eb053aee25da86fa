//! 포지션 메모리 집계기.
//!
//! 대상 자산 집합에 대해, 이력 대상 분석 레코드(페이로드 보유)를
//! 제한된 룩백 안에서 스캔하여 자산별 최근 신호 방향, 트렌드,
//! 플립 리스크를 계산합니다. 같은 상품이 소스마다 다르게 표기되므로
//! 매칭은 원시 티커가 아닌 정규화된 자산 키로 수행합니다.
//!
//! 순수한 읽기 쪽 프로젝션입니다. 요청 시마다 재계산되고 절대
//! 저장되지 않습니다.

use chrono::{DateTime, Utc};
use pulse_core::{
    canonical_asset_key, classify_flip_risk, PositionMemory, TradeSignal, TradingPair,
    MAX_RATIONALE_SNIPPETS, MAX_TREND_DIRECTIONS,
};
use pulse_data::{AnalysisRepository, HistoryRow, Result};
use tracing::debug;

/// 기본 룩백 (일).
pub const DEFAULT_LOOKBACK_DAYS: i64 = 28;

/// 포지션 메모리 집계기.
pub struct PositionMemoryAggregator {
    repo: AnalysisRepository,
    lookback_days: i64,
}

impl PositionMemoryAggregator {
    /// 새 집계기를 생성합니다.
    pub fn new(repo: AnalysisRepository) -> Self {
        Self {
            repo,
            lookback_days: DEFAULT_LOOKBACK_DAYS,
        }
    }

    /// 룩백을 지정합니다.
    pub fn with_lookback_days(mut self, days: i64) -> Self {
        self.lookback_days = days;
        self
    }

    /// 대상 자산들의 포지션 메모리를 계산합니다.
    pub async fn aggregate(&self, target_assets: &[String]) -> Result<Vec<PositionMemory>> {
        if target_assets.is_empty() {
            return Ok(Vec::new());
        }

        let since = Utc::now() - chrono::Duration::days(self.lookback_days);
        let rows = self.repo.recent_history(since).await?;

        debug!(
            targets = target_assets.len(),
            history_rows = rows.len(),
            "포지션 메모리 집계"
        );

        let now = Utc::now();
        Ok(target_assets
            .iter()
            .map(|asset| memory_from_history(asset, &rows, now))
            .collect())
    }
}

/// 이력 행에서 페어의 정규화된 기준 자산 키들을 뽑습니다.
fn asset_keys_of(row: &HistoryRow) -> Vec<String> {
    row.trading_pairs
        .iter()
        .map(|raw| match TradingPair::parse(raw) {
            Some(pair) => pair.canonical_base(),
            None => canonical_asset_key(raw),
        })
        .collect()
}

/// 단일 자산의 포지션 메모리를 계산합니다 (순수 함수).
///
/// `rows`는 최신 순으로 정렬되어 있어야 합니다.
pub fn memory_from_history(
    target_asset: &str,
    rows: &[HistoryRow],
    now: DateTime<Utc>,
) -> PositionMemory {
    let target_key = canonical_asset_key(target_asset);
    let mut memory = PositionMemory::empty(target_key.clone());

    for row in rows {
        if !asset_keys_of(row).contains(&target_key) {
            continue;
        }

        let signal: TradeSignal = match row.signal.parse() {
            Ok(signal) => signal,
            Err(_) => continue,
        };

        // NO_TRADE는 방향이 없으므로 트렌드에 넣지 않는다
        let Some(direction) = signal.side() else {
            continue;
        };

        if memory.last_direction.is_none() {
            memory.last_direction = Some(direction);
            memory.last_signal_age_days = Some((now - row.analyzed_at).num_days());
        }

        if memory.recent_directions.len() < MAX_TREND_DIRECTIONS {
            memory.recent_directions.push(direction);
        }

        if memory.rationales.len() < MAX_RATIONALE_SNIPPETS {
            if let Some(rationale) = &row.rationale {
                if !rationale.is_empty() {
                    memory
                        .rationales
                        .push(PositionMemory::truncate_rationale(rationale));
                }
            }
        }
    }

    memory.flip_risk = classify_flip_risk(&memory.recent_directions);
    memory
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_core::{FlipRisk, Side};

    fn history_row(signal: &str, pairs: &[&str], days_ago: i64, rationale: Option<&str>) -> HistoryRow {
        HistoryRow {
            news_id: days_ago,
            signal: signal.to_string(),
            trading_pairs: pairs.iter().map(|s| s.to_string()).collect(),
            analyzed_at: Utc::now() - chrono::Duration::days(days_ago),
            rationale: rationale.map(|s| s.to_string()),
        }
    }

    #[test]
    fn test_flip_risk_high_on_disagreement() {
        // 최신 순: SELL, BUY
        let rows = vec![
            history_row("SELL", &["BTC/USDT"], 1, Some("breakdown")),
            history_row("BUY", &["BTC/USDT"], 3, Some("etf inflows")),
        ];

        let memory = memory_from_history("BTC", &rows, Utc::now());
        assert_eq!(memory.flip_risk, FlipRisk::High);
        assert_eq!(memory.last_direction, Some(Side::Sell));
        assert_eq!(memory.recent_directions, vec![Side::Sell, Side::Buy]);
        assert_eq!(memory.rationales.len(), 2);
    }

    #[test]
    fn test_flip_risk_medium_on_single_point() {
        let rows = vec![history_row("BUY", &["BTC/USDT"], 2, None)];
        let memory = memory_from_history("BTC", &rows, Utc::now());
        assert_eq!(memory.flip_risk, FlipRisk::Medium);
        assert_eq!(memory.last_signal_age_days, Some(2));
    }

    #[test]
    fn test_flip_risk_low_on_empty_history() {
        let memory = memory_from_history("BTC", &[], Utc::now());
        assert_eq!(memory.flip_risk, FlipRisk::Low);
        assert!(memory.last_direction.is_none());
    }

    #[test]
    fn test_matching_is_canonicalized() {
        // 레코드에는 "BTC/USDT"로 저장됐지만 대상은 거래소 접두사 표기
        let rows = vec![history_row("BUY", &["BTC/USDT"], 1, None)];
        let memory = memory_from_history("BINANCE:BTC", &rows, Utc::now());
        assert_eq!(memory.asset_key, "BTC");
        assert_eq!(memory.recent_directions, vec![Side::Buy]);
    }

    #[test]
    fn test_no_trade_rows_are_skipped() {
        let rows = vec![
            history_row("NO_TRADE", &["BTC/USDT"], 1, None),
            history_row("BUY", &["BTC/USDT"], 2, None),
        ];
        let memory = memory_from_history("BTC", &rows, Utc::now());
        // NO_TRADE는 방향 이력에 포함되지 않는다
        assert_eq!(memory.recent_directions, vec![Side::Buy]);
        assert_eq!(memory.flip_risk, FlipRisk::Medium);
    }

    #[test]
    fn test_trend_list_is_bounded() {
        let rows: Vec<HistoryRow> = (0..10)
            .map(|i| history_row("BUY", &["ETH/USDT"], i, None))
            .collect();
        let memory = memory_from_history("ETH", &rows, Utc::now());
        assert_eq!(memory.recent_directions.len(), MAX_TREND_DIRECTIONS);
    }

    #[test]
    fn test_other_assets_are_ignored() {
        let rows = vec![
            history_row("SELL", &["SOL/USDT"], 1, None),
            history_row("BUY", &["BTC/USDT"], 2, None),
        ];
        let memory = memory_from_history("BTC", &rows, Utc::now());
        assert_eq!(memory.recent_directions, vec![Side::Buy]);
    }
}
