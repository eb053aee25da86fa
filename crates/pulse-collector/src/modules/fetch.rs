//! 뉴스 수집 모듈.
//!
//! 피드에서 룩백 윈도우 안의 아이템을 가져와 제공자 ID 기준으로
//! 중복을 제거합니다. 피드 전체 도달 불가는 치명 오류로 전파되어
//! 호출 전체를 중단시킵니다 (다음 틱이 처음부터 재시도).

use crate::error::{CollectorError, Result};
use pulse_core::NewsItem;
use pulse_data::FeedClient;
use std::collections::HashSet;
use tracing::{debug, info};

/// 제공자 ID 기준 중복 제거 (첫 등장 우선).
pub fn dedupe_by_external_id(items: Vec<NewsItem>) -> Vec<NewsItem> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.external_id.clone()))
        .collect()
}

/// 피드에서 뉴스를 가져옵니다.
pub async fn fetch_news(feed: &FeedClient, lookback_hours: u32) -> Result<Vec<NewsItem>> {
    let raw = feed
        .fetch_latest(lookback_hours)
        .await
        .map_err(|e| CollectorError::Feed(e.to_string()))?;

    let before = raw.len();
    let items = dedupe_by_external_id(raw);

    if before != items.len() {
        debug!(duplicates = before - items.len(), "중복 아이템 제거");
    }
    info!(count = items.len(), lookback_hours, "뉴스 수집 완료");

    Ok(items)
}
