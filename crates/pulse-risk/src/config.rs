//! 리스크 필터 설정.

use serde::{Deserialize, Serialize};

/// 리스크 필터 정책 설정.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskFilterConfig {
    /// 매크로 호라이즌 트레이드의 최소 중요도 점수
    pub macro_score_floor: u8,
    /// 저확신 판정 기준 (이 값 미만이면 저확신)
    pub low_conviction_threshold: f64,
}

impl Default for RiskFilterConfig {
    fn default() -> Self {
        Self {
            macro_score_floor: 7,
            low_conviction_threshold: 0.5,
        }
    }
}
