//! 기업 펀더멘털 클라이언트.
//!
//! Yahoo Finance quoteSummary 엔드포인트에서 핵심 재무 지표를
//! 조회합니다. 모든 필드는 선택적입니다. 상장 폐지나 데이터 누락이
//! 흔하므로 일부 필드 부재는 오류가 아닙니다.

use crate::error::{DataError, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// 펀더멘털 클라이언트 설정.
#[derive(Debug, Clone)]
pub struct FundamentalsConfig {
    /// API 베이스 URL
    pub base_url: String,
    /// 요청 타임아웃 (초)
    pub timeout_secs: u64,
}

impl Default for FundamentalsConfig {
    fn default() -> Self {
        Self {
            base_url: "https://query1.finance.yahoo.com".to_string(),
            timeout_secs: 10,
        }
    }
}

/// 펀더멘털 스냅샷 값.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundamentalsInfo {
    pub symbol: String,
    pub market_cap: Option<f64>,
    pub forward_pe: Option<f64>,
    pub revenue_growth: Option<f64>,
    pub profit_margin: Option<f64>,
}

impl FundamentalsInfo {
    /// 의미 있는 지표가 하나라도 있는지 확인합니다.
    pub fn has_data(&self) -> bool {
        self.market_cap.is_some()
            || self.forward_pe.is_some()
            || self.revenue_growth.is_some()
            || self.profit_margin.is_some()
    }
}

// quoteSummary 응답의 래핑 구조 (필요 경로만).
#[derive(Debug, Deserialize)]
struct QuoteSummaryEnvelope {
    #[serde(rename = "quoteSummary")]
    quote_summary: QuoteSummaryBody,
}

#[derive(Debug, Deserialize)]
struct QuoteSummaryBody {
    #[serde(default)]
    result: Vec<QuoteSummaryResult>,
}

#[derive(Debug, Deserialize)]
struct QuoteSummaryResult {
    #[serde(rename = "financialData", default)]
    financial_data: Option<FinancialData>,
    #[serde(rename = "defaultKeyStatistics", default)]
    key_statistics: Option<KeyStatistics>,
}

#[derive(Debug, Deserialize)]
struct FinancialData {
    #[serde(rename = "revenueGrowth", default)]
    revenue_growth: Option<RawValue>,
    #[serde(rename = "profitMargins", default)]
    profit_margins: Option<RawValue>,
}

#[derive(Debug, Deserialize)]
struct KeyStatistics {
    #[serde(rename = "enterpriseValue", default)]
    enterprise_value: Option<RawValue>,
    #[serde(rename = "forwardPE", default)]
    forward_pe: Option<RawValue>,
}

#[derive(Debug, Deserialize)]
struct RawValue {
    #[serde(default)]
    raw: Option<f64>,
}

fn raw_of(value: &Option<RawValue>) -> Option<f64> {
    value.as_ref().and_then(|v| v.raw)
}

/// Yahoo quoteSummary 기반 펀더멘털 클라이언트.
pub struct FundamentalsClient {
    config: FundamentalsConfig,
    http: Client,
}

impl FundamentalsClient {
    /// 새 클라이언트를 생성합니다.
    pub fn new(config: FundamentalsConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DataError::ConfigError(e.to_string()))?;

        Ok(Self { config, http })
    }

    /// 기본 엔드포인트로 클라이언트를 생성합니다.
    pub fn default_client() -> Result<Self> {
        Self::new(FundamentalsConfig::default())
    }

    /// 심볼의 펀더멘털을 조회합니다.
    pub async fn fundamentals(&self, symbol: &str) -> Result<FundamentalsInfo> {
        let ticker = pulse_core::canonical_asset_key(symbol);
        let url = format!(
            "{}/v10/finance/quoteSummary/{}",
            self.config.base_url, ticker
        );

        let response = self
            .http
            .get(&url)
            .query(&[("modules", "financialData,defaultKeyStatistics")])
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(DataError::RateLimited("yahoo fundamentals".to_string()));
        }
        if !status.is_success() {
            return Err(DataError::FetchError(format!(
                "fundamentals returned {} for {}",
                status, ticker
            )));
        }

        let envelope: QuoteSummaryEnvelope = response
            .json()
            .await
            .map_err(|e| DataError::ParseError(e.to_string()))?;

        let result = envelope
            .quote_summary
            .result
            .into_iter()
            .next()
            .ok_or_else(|| DataError::FetchError(format!("no fundamentals for {}", ticker)))?;

        let financial = result.financial_data;
        let stats = result.key_statistics;

        let info = FundamentalsInfo {
            symbol: ticker,
            market_cap: stats.as_ref().and_then(|s| raw_of(&s.enterprise_value)),
            forward_pe: stats.as_ref().and_then(|s| raw_of(&s.forward_pe)),
            revenue_growth: financial.as_ref().and_then(|f| raw_of(&f.revenue_growth)),
            profit_margin: financial.as_ref().and_then(|f| raw_of(&f.profit_margins)),
        };

        if !info.has_data() {
            return Err(DataError::FetchError(format!(
                "empty fundamentals for {}",
                info.symbol
            )));
        }

        debug!(symbol = %info.symbol, "펀더멘털 조회 완료");
        Ok(info)
    }
}
