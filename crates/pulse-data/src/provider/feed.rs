//! 업스트림 뉴스 피드 클라이언트.
//!
//! 룩백 윈도우 안의 뉴스 아이템을 JSON API에서 가져옵니다.
//! 제공자 ID 기준 중복 제거는 호출자(수집기)가 수행합니다.

use crate::error::{DataError, Result};
use chrono::{DateTime, TimeZone, Utc};
use pulse_core::NewsItem;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

/// 피드 클라이언트 설정.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// 피드 API 베이스 URL
    pub base_url: String,
    /// API 키
    pub api_key: String,
    /// 요청 타임아웃 (초)
    pub timeout_secs: u64,
}

impl FeedConfig {
    /// 환경변수에서 설정을 생성합니다.
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("NEWS_FEED_URL")
            .map_err(|_| DataError::ConfigError("NEWS_FEED_URL not set".to_string()))?;
        let api_key = std::env::var("NEWS_FEED_API_KEY").unwrap_or_default();
        let timeout_secs = std::env::var("NEWS_FEED_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(15);

        Ok(Self {
            base_url,
            api_key,
            timeout_secs,
        })
    }
}

/// 피드 응답의 개별 아이템.
#[derive(Debug, Clone, Deserialize)]
struct FeedItem {
    id: String,
    title: String,
    #[serde(default)]
    body: String,
    source: String,
    #[serde(default)]
    url: Option<String>,
    /// epoch 초
    published_at: i64,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    tickers: Vec<String>,
}

/// 피드 응답 봉투.
#[derive(Debug, Deserialize)]
struct FeedResponse {
    #[serde(default)]
    items: Vec<FeedItem>,
}

/// 뉴스 피드 클라이언트.
pub struct FeedClient {
    config: FeedConfig,
    http: Client,
}

impl FeedClient {
    /// 새 클라이언트를 생성합니다.
    pub fn new(config: FeedConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DataError::ConfigError(e.to_string()))?;

        Ok(Self { config, http })
    }

    /// 룩백 윈도우 안의 최신 아이템을 가져옵니다.
    ///
    /// 발행 시각을 파싱할 수 없는 아이템은 경고 후 건너뜁니다.
    /// 피드 전체 도달 불가는 에러로 전파됩니다 (호출 전체 중단).
    pub async fn fetch_latest(&self, lookback_hours: u32) -> Result<Vec<NewsItem>> {
        let url = format!("{}/v1/news", self.config.base_url);

        debug!(lookback_hours, "뉴스 피드 조회");

        let response = self
            .http
            .get(&url)
            .query(&[("hours", lookback_hours.to_string())])
            .header("X-Api-Key", &self.config.api_key)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(DataError::RateLimited("news feed".to_string()));
        }
        if !response.status().is_success() {
            return Err(DataError::FetchError(format!(
                "news feed returned {}",
                response.status()
            )));
        }

        let parsed: FeedResponse = response
            .json()
            .await
            .map_err(|e| DataError::ParseError(e.to_string()))?;

        let cutoff = Utc::now() - chrono::Duration::hours(lookback_hours as i64);
        let mut items = Vec::with_capacity(parsed.items.len());

        for raw in parsed.items {
            let Some(published_at) = Utc.timestamp_opt(raw.published_at, 0).single() else {
                warn!(external_id = %raw.id, ts = raw.published_at, "발행 시각 파싱 실패, 건너뜀");
                continue;
            };

            // 피드가 윈도우를 지키지 않아도 소비자 쪽에서 한 번 더 거른다
            if published_at < cutoff {
                continue;
            }

            items.push(NewsItem::new(
                raw.id,
                raw.title,
                raw.body,
                raw.source,
                raw.url,
                published_at,
                raw.category,
                raw.tickers,
            ));
        }

        info!(count = items.len(), "뉴스 피드 조회 완료");
        Ok(items)
    }
}
