//! 뉴스 아이템 및 정규 ID.
//!
//! 이 모듈은 업스트림 피드에서 가져온 뉴스 아이템과
//! 콘텐츠 기반 정규 ID(canonical id) 생성을 정의합니다.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// 외부 ID에서 정규 ID를 생성합니다.
///
/// 같은 업스트림 아이템을 반복해서 가져와도 항상 같은 ID가 나오는
/// 순수 함수입니다. SHA-256 해시의 상위 8바이트를 63비트로 잘라
/// Postgres BIGINT에 맞춥니다.
///
/// 잘린 해시이므로 ID 공간이 유한합니다. 극단적인 아이템 볼륨에서는
/// 충돌 확률이 무시할 수 없게 되지만, 이는 알려진 한계로 두고
/// 방어하지 않습니다.
///
/// # 예제
///
/// ```
/// use pulse_core::domain::canonical_id;
///
/// let a = canonical_id("feed-item-12345");
/// let b = canonical_id("feed-item-12345");
/// assert_eq!(a, b);
/// assert!(a >= 0);
/// ```
pub fn canonical_id(external_id: &str) -> i64 {
    let digest = Sha256::digest(external_id.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    (u64::from_be_bytes(bytes) & (i64::MAX as u64)) as i64
}

/// 업스트림 피드에서 가져온 뉴스 아이템.
///
/// 가져온 이후에는 불변입니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsItem {
    /// 업스트림 제공자의 아이템 ID
    pub external_id: String,
    /// 외부 ID에서 파생된 정규 ID
    pub canonical_id: i64,
    /// 제목
    pub title: String,
    /// 본문
    pub body: String,
    /// 소스 이름 (예: "Bloomberg", "CoinDesk")
    pub source: String,
    /// 원문 URL
    pub url: Option<String>,
    /// 발행 시각
    pub published_at: DateTime<Utc>,
    /// 피드가 부여한 카테고리
    pub category: Option<String>,
    /// 피드가 태깅한 티커 목록
    pub tickers: Vec<String>,
}

impl NewsItem {
    /// 피드 필드에서 뉴스 아이템을 생성합니다.
    ///
    /// 정규 ID는 외부 ID에서 파생됩니다.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        external_id: impl Into<String>,
        title: impl Into<String>,
        body: impl Into<String>,
        source: impl Into<String>,
        url: Option<String>,
        published_at: DateTime<Utc>,
        category: Option<String>,
        tickers: Vec<String>,
    ) -> Self {
        let external_id = external_id.into();
        let canonical_id = canonical_id(&external_id);

        Self {
            external_id,
            canonical_id,
            title: title.into(),
            body: body.into(),
            source: source.into(),
            url,
            published_at,
            category,
            tickers,
        }
    }

    /// 아이템이 최대 허용 나이보다 오래됐는지 확인합니다.
    pub fn is_older_than(&self, now: DateTime<Utc>, max_age_hours: i64) -> bool {
        now - self.published_at > chrono::Duration::hours(max_age_hours)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_canonical_id_is_stable() {
        assert_eq!(canonical_id("abc-123"), canonical_id("abc-123"));
        assert_ne!(canonical_id("abc-123"), canonical_id("abc-124"));
    }

    #[test]
    fn test_canonical_id_is_non_negative() {
        for id in ["", "x", "아주 긴 외부 아이디 \u{1F600}", "feed:42"] {
            assert!(canonical_id(id) >= 0);
        }
    }

    #[test]
    fn test_is_older_than() {
        let now = Utc::now();
        let item = NewsItem::new(
            "n1",
            "title",
            "body",
            "Reuters",
            None,
            now - chrono::Duration::hours(30),
            None,
            vec![],
        );
        assert!(item.is_older_than(now, 24));
        assert!(!item.is_older_than(now, 48));
    }

    proptest! {
        /// 같은 입력은 항상 같은 ID를 생성한다.
        #[test]
        fn prop_canonical_id_pure(s in ".*") {
            prop_assert_eq!(canonical_id(&s), canonical_id(&s));
            prop_assert!(canonical_id(&s) >= 0);
        }
    }
}
