//! 매크로 지수 및 국채 수익률 제공자.
//!
//! Yahoo Finance API를 통해 지수 레벨(나스닥, VIX 등)과 국채 수익률
//! 곡선을 조회합니다.
//!
//! # 수익률 심볼
//!
//! - **3개월**: "^IRX"
//! - **5년**: "^FVX"
//! - **10년**: "^TNX"
//! - **30년**: "^TYX"

use crate::error::{DataError, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;
use yahoo_finance_api as yahoo;

/// 매크로 지수 스냅샷 값.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MacroIndexInfo {
    /// 지수 심볼 (예: "^IXIC", "^VIX")
    pub symbol: String,
    /// 최근 레벨
    pub level: f64,
    /// 전일 종가
    pub prev_close: f64,
    /// 전일 대비 변동률 (%)
    pub change_pct: f64,
}

/// 수익률 곡선 스냅샷 값 (%).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YieldCurveInfo {
    pub three_month: f64,
    pub five_year: f64,
    pub ten_year: f64,
    pub thirty_year: f64,
    /// 10년-3개월 스프레드. 음수면 역전.
    pub spread_10y_3m: f64,
}

/// 변동률 계산 (%).
fn calculate_change_pct(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        return 0.0;
    }
    (current - previous) / previous * 100.0
}

/// Yahoo Finance 기반 매크로 데이터 제공자.
pub struct MacroMarketProvider {
    connector: yahoo::YahooConnector,
}

impl MacroMarketProvider {
    /// 새 제공자를 생성합니다.
    pub fn new() -> Result<Self> {
        let connector = yahoo::YahooConnector::new()
            .map_err(|e| DataError::ConfigError(format!("yahoo connector: {}", e)))?;

        Ok(Self { connector })
    }

    /// 심볼의 최근 종가 목록을 조회합니다 (주말을 고려해 5일 범위).
    async fn fetch_closes(&self, symbol: &str) -> Result<Vec<f64>> {
        let response = self
            .connector
            .get_quote_range(symbol, "1d", "5d")
            .await
            .map_err(|e| DataError::FetchError(format!("yahoo {}: {}", symbol, e)))?;

        let quotes = response
            .quotes()
            .map_err(|e| DataError::ParseError(format!("yahoo {}: {}", symbol, e)))?;

        let closes: Vec<f64> = quotes.iter().map(|q| q.close).collect();
        if closes.is_empty() {
            return Err(DataError::FetchError(format!("no quotes for {}", symbol)));
        }

        Ok(closes)
    }

    /// 지수 레벨과 전일 대비 변동률을 조회합니다.
    pub async fn index_level(&self, symbol: &str) -> Result<MacroIndexInfo> {
        let closes = self.fetch_closes(symbol).await?;

        let level = *closes.last().unwrap();
        let prev_close = if closes.len() >= 2 {
            closes[closes.len() - 2]
        } else {
            level
        };

        debug!(symbol, level, prev_close, "매크로 지수 조회");

        Ok(MacroIndexInfo {
            symbol: symbol.to_string(),
            level,
            prev_close,
            change_pct: calculate_change_pct(level, prev_close),
        })
    }

    /// 국채 수익률 곡선을 조회합니다.
    pub async fn yield_curve(&self) -> Result<YieldCurveInfo> {
        let three_month = self.latest_close("^IRX").await?;
        let five_year = self.latest_close("^FVX").await?;
        let ten_year = self.latest_close("^TNX").await?;
        let thirty_year = self.latest_close("^TYX").await?;

        Ok(YieldCurveInfo {
            three_month,
            five_year,
            ten_year,
            thirty_year,
            spread_10y_3m: ten_year - three_month,
        })
    }

    async fn latest_close(&self, symbol: &str) -> Result<f64> {
        let closes = self.fetch_closes(symbol).await?;
        Ok(*closes.last().unwrap())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_pct() {
        assert!((calculate_change_pct(102.0, 100.0) - 2.0).abs() < 1e-9);
        assert!((calculate_change_pct(95.0, 100.0) + 5.0).abs() < 1e-9);
        assert_eq!(calculate_change_pct(100.0, 0.0), 0.0);
    }
}
