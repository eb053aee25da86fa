//! 뉴스 소스 신뢰도 등급.
//!
//! 소스 정체성을 정규화한 키로 조회하는 데이터 테이블입니다.
//! 중요도 점수 산정에 편향을 주기 위해 사용됩니다.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 소스 신뢰도 등급.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredibilityTier {
    /// 주요 통신사/기관 미디어
    Tier1,
    /// 전문 매체
    Tier2,
    /// 그 외 (기본값)
    Tier3,
}

impl Default for CredibilityTier {
    fn default() -> Self {
        Self::Tier3
    }
}

impl fmt::Display for CredibilityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredibilityTier::Tier1 => write!(f, "tier1"),
            CredibilityTier::Tier2 => write!(f, "tier2"),
            CredibilityTier::Tier3 => write!(f, "tier3"),
        }
    }
}

impl std::str::FromStr for CredibilityTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tier1" => Ok(Self::Tier1),
            "tier2" => Ok(Self::Tier2),
            "tier3" => Ok(Self::Tier3),
            _ => Err(format!("Unknown credibility tier: {}", s)),
        }
    }
}

/// 소스 이름 → 등급 테이블.
///
/// 키는 `normalize_source`로 정규화된 형태입니다.
const SOURCE_TIERS: &[(&str, CredibilityTier)] = &[
    ("bloomberg", CredibilityTier::Tier1),
    ("reuters", CredibilityTier::Tier1),
    ("wallstreetjournal", CredibilityTier::Tier1),
    ("wsj", CredibilityTier::Tier1),
    ("financialtimes", CredibilityTier::Tier1),
    ("ft", CredibilityTier::Tier1),
    ("cnbc", CredibilityTier::Tier1),
    ("associatedpress", CredibilityTier::Tier1),
    ("ap", CredibilityTier::Tier1),
    ("coindesk", CredibilityTier::Tier2),
    ("cointelegraph", CredibilityTier::Tier2),
    ("theblock", CredibilityTier::Tier2),
    ("decrypt", CredibilityTier::Tier2),
    ("marketwatch", CredibilityTier::Tier2),
    ("barrons", CredibilityTier::Tier2),
    ("seekingalpha", CredibilityTier::Tier2),
];

/// 소스 이름을 조회용 키로 정규화합니다 (소문자, 영숫자만).
pub fn normalize_source(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// 소스의 신뢰도 등급을 조회합니다.
///
/// 테이블에 없는 소스는 명시적 기본값 `Tier3`입니다.
pub fn tier_for_source(raw: &str) -> CredibilityTier {
    let key = normalize_source(raw);
    SOURCE_TIERS
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, tier)| *tier)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_source() {
        assert_eq!(normalize_source("The Block"), "theblock");
        assert_eq!(normalize_source("Wall Street Journal"), "wallstreetjournal");
        assert_eq!(normalize_source("CNBC"), "cnbc");
    }

    #[test]
    fn test_tier_lookup() {
        assert_eq!(tier_for_source("Bloomberg"), CredibilityTier::Tier1);
        assert_eq!(tier_for_source("reuters"), CredibilityTier::Tier1);
        assert_eq!(tier_for_source("CoinDesk"), CredibilityTier::Tier2);
    }

    #[test]
    fn test_unknown_source_defaults_to_tier3() {
        assert_eq!(tier_for_source("Random Crypto Blog"), CredibilityTier::Tier3);
        assert_eq!(tier_for_source(""), CredibilityTier::Tier3);
    }
}
