//! 포지션 메모리 읽기 모델.
//!
//! 최근 분석 레코드에서 자산별 신호 이력을 집계한 파생 뷰입니다.
//! 저장되지 않고 요청 시마다 다시 계산됩니다.

use crate::domain::Side;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 트렌드 목록에 유지하는 최근 방향 수.
pub const MAX_TREND_DIRECTIONS: usize = 5;

/// 근거 스니펫 최대 개수.
pub const MAX_RATIONALE_SNIPPETS: usize = 3;

/// 근거 스니펫 최대 길이 (문자).
pub const MAX_RATIONALE_CHARS: usize = 160;

/// 플립 리스크 분류.
///
/// 최근 신호들이 방향에 합의하지 못할수록 높아집니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FlipRisk {
    High,
    Medium,
    Low,
}

impl fmt::Display for FlipRisk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlipRisk::High => write!(f, "HIGH"),
            FlipRisk::Medium => write!(f, "MEDIUM"),
            FlipRisk::Low => write!(f, "LOW"),
        }
    }
}

/// 최근 방향 목록(최신 순)에서 플립 리스크를 판정합니다.
///
/// - 가장 최근 두 방향이 불일치 → `High`
/// - 데이터 포인트가 하나뿐 → `Medium`
/// - 그 외 (빈 이력 포함) → `Low`
pub fn classify_flip_risk(directions: &[Side]) -> FlipRisk {
    match directions {
        [a, b, ..] if a != b => FlipRisk::High,
        [_] => FlipRisk::Medium,
        _ => FlipRisk::Low,
    }
}

/// 자산별 포지션 메모리.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionMemory {
    /// 정규화된 자산 키
    pub asset_key: String,
    /// 마지막 NO_TRADE 아닌 신호의 방향
    pub last_direction: Option<Side>,
    /// 마지막 신호 이후 경과 일수
    pub last_signal_age_days: Option<i64>,
    /// 최근 방향 목록 (최신 순, 최대 5개)
    pub recent_directions: Vec<Side>,
    /// 플립 리스크
    pub flip_risk: FlipRisk,
    /// 다운스트림 재사용을 위한 근거 스니펫 (길이 제한)
    pub rationales: Vec<String>,
}

impl PositionMemory {
    /// 이력이 전혀 없는 자산의 기본 메모리.
    pub fn empty(asset_key: impl Into<String>) -> Self {
        Self {
            asset_key: asset_key.into(),
            last_direction: None,
            last_signal_age_days: None,
            recent_directions: Vec::new(),
            flip_risk: FlipRisk::Low,
            rationales: Vec::new(),
        }
    }

    /// 근거 스니펫을 길이 제한에 맞춰 자릅니다.
    pub fn truncate_rationale(raw: &str) -> String {
        if raw.chars().count() <= MAX_RATIONALE_CHARS {
            raw.to_string()
        } else {
            let truncated: String = raw.chars().take(MAX_RATIONALE_CHARS).collect();
            format!("{}…", truncated)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flip_risk_disagreement_is_high() {
        // 최신 순: SELL 다음이 BUY → 직전 반전
        assert_eq!(
            classify_flip_risk(&[Side::Sell, Side::Buy]),
            FlipRisk::High
        );
        assert_eq!(
            classify_flip_risk(&[Side::Buy, Side::Sell, Side::Sell]),
            FlipRisk::High
        );
    }

    #[test]
    fn test_flip_risk_single_point_is_medium() {
        assert_eq!(classify_flip_risk(&[Side::Buy]), FlipRisk::Medium);
    }

    #[test]
    fn test_flip_risk_agreement_or_empty_is_low() {
        assert_eq!(classify_flip_risk(&[]), FlipRisk::Low);
        assert_eq!(
            classify_flip_risk(&[Side::Buy, Side::Buy, Side::Sell]),
            FlipRisk::Low
        );
    }

    #[test]
    fn test_truncate_rationale() {
        let short = "짧은 근거";
        assert_eq!(PositionMemory::truncate_rationale(short), short);

        let long = "a".repeat(200);
        let truncated = PositionMemory::truncate_rationale(&long);
        assert_eq!(truncated.chars().count(), MAX_RATIONALE_CHARS + 1);
        assert!(truncated.ends_with('…'));
    }
}
