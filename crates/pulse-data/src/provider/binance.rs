//! Binance 시장 데이터 클라이언트.
//!
//! 현물 시세, 파생 펀딩비/미결제 약정, 캔들을 공개 REST API로
//! 조회합니다. 429/418 응답은 `DataError::RateLimited`로 매핑되어
//! 캐시 폴백 경로로 들어갑니다.

use crate::error::{DataError, Result};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Binance 클라이언트 설정.
#[derive(Debug, Clone)]
pub struct BinanceConfig {
    /// 현물 API 베이스 URL
    pub spot_base_url: String,
    /// 선물 API 베이스 URL
    pub futures_base_url: String,
    /// 요청 타임아웃 (초)
    pub timeout_secs: u64,
}

impl Default for BinanceConfig {
    fn default() -> Self {
        Self {
            spot_base_url: "https://api.binance.com".to_string(),
            futures_base_url: "https://fapi.binance.com".to_string(),
            timeout_secs: 10,
        }
    }
}

/// 현물 시세 스냅샷 값.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotQuote {
    pub symbol: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub change_pct_24h: Decimal,
}

/// 펀딩 정보 스냅샷 값.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundingInfo {
    pub symbol: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub funding_rate: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub mark_price: Decimal,
}

/// 미결제 약정 스냅샷 값.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenInterestInfo {
    pub symbol: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub open_interest: Decimal,
}

/// 단일 캔들.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candle {
    pub open_time_ms: i64,
    #[serde(with = "rust_decimal::serde::str")]
    pub open: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub high: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub low: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub close: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub volume: Decimal,
}

/// 캔들 묶음 스냅샷 값.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandleSeries {
    pub symbol: String,
    pub interval: String,
    pub candles: Vec<Candle>,
}

// Binance 24hr ticker 응답 (필요 필드만).
#[derive(Debug, Deserialize)]
struct TickerResponse {
    symbol: String,
    #[serde(rename = "lastPrice", with = "rust_decimal::serde::str")]
    last_price: Decimal,
    #[serde(rename = "priceChangePercent", with = "rust_decimal::serde::str")]
    price_change_percent: Decimal,
}

// premiumIndex 응답 (필요 필드만).
#[derive(Debug, Deserialize)]
struct PremiumIndexResponse {
    symbol: String,
    #[serde(rename = "lastFundingRate", with = "rust_decimal::serde::str")]
    last_funding_rate: Decimal,
    #[serde(rename = "markPrice", with = "rust_decimal::serde::str")]
    mark_price: Decimal,
}

#[derive(Debug, Deserialize)]
struct OpenInterestResponse {
    symbol: String,
    #[serde(rename = "openInterest", with = "rust_decimal::serde::str")]
    open_interest: Decimal,
}

/// 원시 티커를 Binance 심볼로 변환합니다.
///
/// 호가 자산이 없으면 USDT를 붙입니다 (예: "BTC" → "BTCUSDT").
pub fn to_binance_symbol(raw: &str) -> String {
    let key = pulse_core::canonical_asset_key(raw);
    const QUOTES: [&str; 4] = ["USDT", "USDC", "BUSD", "TUSD"];
    if QUOTES.iter().any(|q| key.ends_with(q) && key.len() > q.len()) {
        key
    } else {
        format!("{}USDT", key)
    }
}

/// Binance 공개 API 클라이언트.
pub struct BinanceClient {
    config: BinanceConfig,
    http: Client,
}

impl BinanceClient {
    /// 새 클라이언트를 생성합니다.
    pub fn new(config: BinanceConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DataError::ConfigError(e.to_string()))?;

        Ok(Self { config, http })
    }

    /// 기본 엔드포인트로 클라이언트를 생성합니다.
    pub fn default_client() -> Result<Self> {
        Self::new(BinanceConfig::default())
    }

    /// 현물 시세를 조회합니다.
    pub async fn spot_price(&self, symbol: &str) -> Result<SpotQuote> {
        let binance_symbol = to_binance_symbol(symbol);
        let url = format!("{}/api/v3/ticker/24hr", self.config.spot_base_url);

        let ticker: TickerResponse = self
            .get_json(&url, &[("symbol", binance_symbol.as_str())])
            .await?;

        debug!(symbol = %ticker.symbol, price = %ticker.last_price, "현물 시세 조회");

        Ok(SpotQuote {
            symbol: ticker.symbol,
            price: ticker.last_price,
            change_pct_24h: ticker.price_change_percent,
        })
    }

    /// 파생 펀딩비를 조회합니다.
    pub async fn funding_rate(&self, symbol: &str) -> Result<FundingInfo> {
        let binance_symbol = to_binance_symbol(symbol);
        let url = format!("{}/fapi/v1/premiumIndex", self.config.futures_base_url);

        let premium: PremiumIndexResponse = self
            .get_json(&url, &[("symbol", binance_symbol.as_str())])
            .await?;

        Ok(FundingInfo {
            symbol: premium.symbol,
            funding_rate: premium.last_funding_rate,
            mark_price: premium.mark_price,
        })
    }

    /// 미결제 약정을 조회합니다.
    pub async fn open_interest(&self, symbol: &str) -> Result<OpenInterestInfo> {
        let binance_symbol = to_binance_symbol(symbol);
        let url = format!("{}/fapi/v1/openInterest", self.config.futures_base_url);

        let oi: OpenInterestResponse = self
            .get_json(&url, &[("symbol", binance_symbol.as_str())])
            .await?;

        Ok(OpenInterestInfo {
            symbol: oi.symbol,
            open_interest: oi.open_interest,
        })
    }

    /// 캔들을 조회합니다.
    ///
    /// 윈도우 힌트가 "7d"처럼 일 단위면 일봉, 그 외에는 시간봉을
    /// 사용합니다.
    pub async fn candles(&self, symbol: &str, window: Option<&str>) -> Result<CandleSeries> {
        let binance_symbol = to_binance_symbol(symbol);
        let (interval, limit) = match window {
            Some(w) if w.ends_with('d') => {
                let days: u32 = w.trim_end_matches('d').parse().unwrap_or(7);
                ("1d", days.clamp(1, 90))
            }
            Some(w) if w.ends_with('h') => {
                let hours: u32 = w.trim_end_matches('h').parse().unwrap_or(24);
                ("1h", hours.clamp(1, 168))
            }
            _ => ("1h", 24),
        };

        let url = format!("{}/api/v3/klines", self.config.spot_base_url);
        let limit_str = limit.to_string();
        let raw: Vec<Vec<serde_json::Value>> = self
            .get_json(
                &url,
                &[
                    ("symbol", binance_symbol.as_str()),
                    ("interval", interval),
                    ("limit", limit_str.as_str()),
                ],
            )
            .await?;

        let mut candles = Vec::with_capacity(raw.len());
        for row in raw {
            candles.push(parse_kline_row(&row)?);
        }

        if candles.is_empty() {
            return Err(DataError::FetchError(format!(
                "no candles returned for {}",
                binance_symbol
            )));
        }

        Ok(CandleSeries {
            symbol: binance_symbol,
            interval: interval.to_string(),
            candles,
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let response = self.http.get(url).query(query).send().await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS
            || status.as_u16() == 418
        {
            return Err(DataError::RateLimited(format!("binance {}", url)));
        }
        if !status.is_success() {
            return Err(DataError::FetchError(format!(
                "binance returned {} for {}",
                status, url
            )));
        }

        response
            .json()
            .await
            .map_err(|e| DataError::ParseError(e.to_string()))
    }
}

/// klines 배열 행을 캔들로 변환합니다.
fn parse_kline_row(row: &[serde_json::Value]) -> Result<Candle> {
    if row.len() < 6 {
        return Err(DataError::ParseError("kline row too short".to_string()));
    }

    let open_time_ms = row[0]
        .as_i64()
        .ok_or_else(|| DataError::ParseError("kline open time".to_string()))?;

    let decimal_at = |idx: usize| -> Result<Decimal> {
        row[idx]
            .as_str()
            .ok_or_else(|| DataError::ParseError(format!("kline field {}", idx)))?
            .parse()
            .map_err(|_| DataError::ParseError(format!("kline decimal {}", idx)))
    };

    Ok(Candle {
        open_time_ms,
        open: decimal_at(1)?,
        high: decimal_at(2)?,
        low: decimal_at(3)?,
        close: decimal_at(4)?,
        volume: decimal_at(5)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn config_for(server: &mockito::ServerGuard) -> BinanceConfig {
        BinanceConfig {
            spot_base_url: server.url(),
            futures_base_url: server.url(),
            timeout_secs: 5,
        }
    }

    #[test]
    fn test_to_binance_symbol() {
        assert_eq!(to_binance_symbol("BTC"), "BTCUSDT");
        assert_eq!(to_binance_symbol("BTC/USDT"), "BTCUSDT");
        assert_eq!(to_binance_symbol("BINANCE:ETH-USDC"), "ETHUSDC");
        // 심볼 자체가 호가 통화인 경우는 그대로 페어로 만든다
        assert_eq!(to_binance_symbol("USDT"), "USDTUSDT");
    }

    #[tokio::test]
    async fn test_spot_price() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/v3/ticker/24hr")
            .match_query(mockito::Matcher::UrlEncoded("symbol".into(), "BTCUSDT".into()))
            .with_status(200)
            .with_body(r#"{"symbol":"BTCUSDT","lastPrice":"67000.50","priceChangePercent":"2.35"}"#)
            .create_async()
            .await;

        let client = BinanceClient::new(config_for(&server)).unwrap();
        let quote = client.spot_price("BTC").await.unwrap();
        assert_eq!(quote.price, dec!(67000.50));
        assert_eq!(quote.change_pct_24h, dec!(2.35));
    }

    #[tokio::test]
    async fn test_rate_limit_maps_to_rate_limited() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/v3/ticker/24hr")
            .match_query(mockito::Matcher::Any)
            .with_status(429)
            .create_async()
            .await;

        let client = BinanceClient::new(config_for(&server)).unwrap();
        let err = client.spot_price("BTC").await.unwrap_err();
        assert!(matches!(err, DataError::RateLimited(_)));
    }

    #[tokio::test]
    async fn test_candles_window_parsing() {
        let mut server = mockito::Server::new_async().await;
        let body = serde_json::json!([
            [1700000000000i64, "100.0", "110.0", "95.0", "105.0", "1234.5", 0, "0", 0, "0", "0", "0"]
        ]);
        server
            .mock("GET", "/api/v3/klines")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("interval".into(), "1d".into()),
                mockito::Matcher::UrlEncoded("limit".into(), "7".into()),
            ]))
            .with_status(200)
            .with_body(body.to_string())
            .create_async()
            .await;

        let client = BinanceClient::new(config_for(&server)).unwrap();
        let series = client.candles("ETH", Some("7d")).await.unwrap();
        assert_eq!(series.interval, "1d");
        assert_eq!(series.candles.len(), 1);
        assert_eq!(series.candles[0].close, dec!(105.0));
    }
}
