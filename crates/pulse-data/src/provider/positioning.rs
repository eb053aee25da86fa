//! CFTC 포지셔닝 리포트(COT) 클라이언트.
//!
//! 주간 Commitments of Traders 리포트에서 비상업(투기) 포지션을
//! 조회합니다. 리포트는 주 단위로만 갱신되므로 캐시 TTL이 일 단위로
//! 깁니다.

use crate::error::{DataError, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// CFTC 클라이언트 설정.
#[derive(Debug, Clone)]
pub struct CftcConfig {
    /// API 베이스 URL
    pub base_url: String,
    /// 요청 타임아웃 (초)
    pub timeout_secs: u64,
}

impl Default for CftcConfig {
    fn default() -> Self {
        Self {
            base_url: "https://publicreporting.cftc.gov".to_string(),
            timeout_secs: 15,
        }
    }
}

/// 자산 키 → CFTC 시장 이름 테이블.
const MARKET_NAMES: &[(&str, &str)] = &[
    ("BTC", "BITCOIN - CHICAGO MERCANTILE EXCHANGE"),
    ("BTCUSDT", "BITCOIN - CHICAGO MERCANTILE EXCHANGE"),
    ("ETH", "ETHER - CHICAGO MERCANTILE EXCHANGE"),
    ("ETHUSDT", "ETHER - CHICAGO MERCANTILE EXCHANGE"),
    ("GOLD", "GOLD - COMMODITY EXCHANGE INC."),
    ("XAU", "GOLD - COMMODITY EXCHANGE INC."),
    ("OIL", "CRUDE OIL, LIGHT SWEET - NEW YORK MERCANTILE EXCHANGE"),
    ("WTI", "CRUDE OIL, LIGHT SWEET - NEW YORK MERCANTILE EXCHANGE"),
];

/// 자산 키를 CFTC 시장 이름으로 변환합니다.
pub fn market_name_for(asset_key: &str) -> Option<&'static str> {
    MARKET_NAMES
        .iter()
        .find(|(key, _)| *key == asset_key)
        .map(|(_, name)| *name)
}

/// 포지셔닝 스냅샷 값.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositioningInfo {
    pub market: String,
    pub report_date: String,
    pub noncommercial_long: i64,
    pub noncommercial_short: i64,
    /// 롱 - 숏
    pub net_position: i64,
}

// CFTC 응답 행 (필요 필드만, 모든 값이 문자열로 온다).
#[derive(Debug, Deserialize)]
struct CotRow {
    market_and_exchange_names: String,
    report_date_as_yyyy_mm_dd: String,
    noncomm_positions_long_all: String,
    noncomm_positions_short_all: String,
}

/// CFTC 공개 리포트 클라이언트.
pub struct CftcClient {
    config: CftcConfig,
    http: Client,
}

impl CftcClient {
    /// 새 클라이언트를 생성합니다.
    pub fn new(config: CftcConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DataError::ConfigError(e.to_string()))?;

        Ok(Self { config, http })
    }

    /// 기본 엔드포인트로 클라이언트를 생성합니다.
    pub fn default_client() -> Result<Self> {
        Self::new(CftcConfig::default())
    }

    /// 자산의 최신 포지셔닝 리포트를 조회합니다.
    pub async fn latest_positioning(&self, asset_key: &str) -> Result<PositioningInfo> {
        let market = market_name_for(asset_key).ok_or_else(|| {
            DataError::InvalidData(format!("no COT market mapping for {}", asset_key))
        })?;

        let url = format!("{}/resource/6dca-aqww.json", self.config.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[
                ("market_and_exchange_names", market),
                ("$order", "report_date_as_yyyy_mm_dd DESC"),
                ("$limit", "1"),
            ])
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(DataError::RateLimited("cftc".to_string()));
        }
        if !status.is_success() {
            return Err(DataError::FetchError(format!("cftc returned {}", status)));
        }

        let rows: Vec<CotRow> = response
            .json()
            .await
            .map_err(|e| DataError::ParseError(e.to_string()))?;

        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DataError::FetchError(format!("no COT rows for {}", market)))?;

        let long: i64 = row
            .noncomm_positions_long_all
            .parse()
            .map_err(|_| DataError::ParseError("noncomm long".to_string()))?;
        let short: i64 = row
            .noncomm_positions_short_all
            .parse()
            .map_err(|_| DataError::ParseError("noncomm short".to_string()))?;

        debug!(market = %row.market_and_exchange_names, long, short, "COT 리포트 조회");

        Ok(PositioningInfo {
            market: row.market_and_exchange_names,
            report_date: row.report_date_as_yyyy_mm_dd,
            noncommercial_long: long,
            noncommercial_short: short,
            net_position: long - short,
        })
    }
}
