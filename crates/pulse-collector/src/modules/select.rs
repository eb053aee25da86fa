//! 후보 선별 모듈.
//!
//! 수집된 아이템을 저장된 레코드와 대조하여 신규 / 분석 필요 /
//! 완료로 분류합니다. 출력은 최신 발행 순으로 정렬되고, 피드의
//! 룩백 윈도우와 독립적인 최대 나이 상한으로 한 번 더 걸러집니다.

use crate::error::Result;
use chrono::{DateTime, Utc};
use pulse_core::NewsItem;
use pulse_data::{AnalysisRepository, RecordState};
use std::collections::HashMap;
use tracing::info;

/// 후보 분류.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateState {
    /// 저장된 레코드 없음
    New,
    /// 레코드는 있으나 분석 페이로드 없음 (재분석 대상)
    NeedsAnalysis,
}

/// 분석 후보.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub item: NewsItem,
    pub state: CandidateState,
}

/// 아이템을 저장 상태와 대조해 분류합니다 (순수 함수).
///
/// 완료된 아이템은 결과에서 제외되고 개수만 반환합니다.
pub fn classify_items(
    items: Vec<NewsItem>,
    states: &[RecordState],
    now: DateTime<Utc>,
    max_age_hours: i64,
) -> (Vec<Candidate>, usize) {
    let state_by_id: HashMap<i64, bool> = states
        .iter()
        .map(|s| (s.news_id, s.has_payload))
        .collect();

    let mut done = 0usize;
    let mut candidates: Vec<Candidate> = items
        .into_iter()
        .filter(|item| !item.is_older_than(now, max_age_hours))
        .filter_map(|item| match state_by_id.get(&item.canonical_id) {
            None => Some(Candidate {
                item,
                state: CandidateState::New,
            }),
            Some(false) => Some(Candidate {
                item,
                state: CandidateState::NeedsAnalysis,
            }),
            Some(true) => {
                done += 1;
                None
            }
        })
        .collect();

    // 최신 뉴스 우선
    candidates.sort_by(|a, b| b.item.published_at.cmp(&a.item.published_at));

    (candidates, done)
}

/// 저장소를 조회해 후보를 선별합니다.
pub async fn select_candidates(
    repo: &AnalysisRepository,
    items: Vec<NewsItem>,
    max_age_hours: i64,
) -> Result<(Vec<Candidate>, usize)> {
    let ids: Vec<i64> = items.iter().map(|i| i.canonical_id).collect();
    let states = repo.find_states(&ids).await?;

    let (candidates, done) = classify_items(items, &states, Utc::now(), max_age_hours);

    info!(
        candidates = candidates.len(),
        already_done = done,
        "후보 선별 완료"
    );
    Ok((candidates, done))
}
