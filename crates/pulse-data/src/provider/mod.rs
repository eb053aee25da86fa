//! 외부 데이터 제공자.
//!
//! 뉴스 피드와 자산군별 시장 데이터 클라이언트, 그리고 데이터 포인트
//! 종류를 담당 제공자로 라우팅하는 `ProviderRouter`를 제공합니다.

pub mod binance;
pub mod feed;
pub mod fundamentals;
pub mod macro_market;
pub mod positioning;

pub use binance::{BinanceClient, BinanceConfig, CandleSeries, FundingInfo, OpenInterestInfo, SpotQuote};
pub use feed::{FeedClient, FeedConfig};
pub use fundamentals::{FundamentalsClient, FundamentalsConfig, FundamentalsInfo};
pub use macro_market::{MacroIndexInfo, MacroMarketProvider, YieldCurveInfo};
pub use positioning::{CftcClient, CftcConfig, PositioningInfo};

use crate::error::Result;
use async_trait::async_trait;
use chrono::Utc;
use pulse_core::{canonical_asset_key, DataPointKind, DataPointRequest, MarketSnapshot};

/// 라이브 시장 데이터 소스.
///
/// 캐시 폴백 서비스가 이 trait 뒤의 실제 제공자들을 호출합니다.
#[async_trait]
pub trait LiveMarketSource: Send + Sync {
    /// 요청된 데이터 포인트의 라이브 값을 가져옵니다.
    async fn fetch(&self, request: &DataPointRequest) -> Result<MarketSnapshot>;
}

/// 데이터 포인트 종류를 담당 제공자로 라우팅합니다.
pub struct ProviderRouter {
    binance: BinanceClient,
    macro_market: MacroMarketProvider,
    cftc: CftcClient,
    fundamentals: FundamentalsClient,
}

impl ProviderRouter {
    /// 개별 클라이언트로 라우터를 구성합니다.
    pub fn new(
        binance: BinanceClient,
        macro_market: MacroMarketProvider,
        cftc: CftcClient,
        fundamentals: FundamentalsClient,
    ) -> Self {
        Self {
            binance,
            macro_market,
            cftc,
            fundamentals,
        }
    }

    /// 기본 엔드포인트로 라우터를 구성합니다.
    pub fn from_defaults() -> Result<Self> {
        Ok(Self {
            binance: BinanceClient::default_client()?,
            macro_market: MacroMarketProvider::new()?,
            cftc: CftcClient::default_client()?,
            fundamentals: FundamentalsClient::default_client()?,
        })
    }

    fn snapshot<T: serde::Serialize>(
        request: &DataPointRequest,
        value: &T,
        source: &str,
    ) -> Result<MarketSnapshot> {
        Ok(MarketSnapshot {
            key: request.cache_key(),
            kind: request.kind,
            symbol: canonical_asset_key(&request.symbol),
            value: serde_json::to_value(value)?,
            source: source.to_string(),
            fetched_at: Utc::now(),
        })
    }
}

#[async_trait]
impl LiveMarketSource for ProviderRouter {
    async fn fetch(&self, request: &DataPointRequest) -> Result<MarketSnapshot> {
        match request.kind {
            DataPointKind::SpotPrice => {
                let quote = self.binance.spot_price(&request.symbol).await?;
                Self::snapshot(request, &quote, "binance")
            }
            DataPointKind::FundingRate => {
                let funding = self.binance.funding_rate(&request.symbol).await?;
                Self::snapshot(request, &funding, "binance")
            }
            DataPointKind::OpenInterest => {
                let oi = self.binance.open_interest(&request.symbol).await?;
                Self::snapshot(request, &oi, "binance")
            }
            DataPointKind::Candles => {
                let series = self
                    .binance
                    .candles(&request.symbol, request.window.as_deref())
                    .await?;
                Self::snapshot(request, &series, "binance")
            }
            DataPointKind::MacroIndex => {
                let index = self.macro_market.index_level(&request.symbol).await?;
                Self::snapshot(request, &index, "yahoo")
            }
            DataPointKind::YieldCurve => {
                let curve = self.macro_market.yield_curve().await?;
                Self::snapshot(request, &curve, "yahoo")
            }
            DataPointKind::Positioning => {
                let key = canonical_asset_key(&request.symbol);
                let positioning = self.cftc.latest_positioning(&key).await?;
                Self::snapshot(request, &positioning, "cftc")
            }
            DataPointKind::Fundamentals => {
                let info = self.fundamentals.fundamentals(&request.symbol).await?;
                Self::snapshot(request, &info, "yahoo")
            }
        }
    }
}
