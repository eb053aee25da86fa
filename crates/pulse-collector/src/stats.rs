//! 실행 통계 구조체.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 한 번의 틱(호출) 통계.
///
/// 아이템 단위 실패는 카운터로만 남고 배치 경계를 넘어 전파되지
/// 않습니다. 스케줄 트리거 엔드포인트는 이 구조체를 그대로 JSON
/// 요약으로 반환합니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunStats {
    /// 피드에서 가져온 아이템 수 (중복 제거 후)
    pub fetched: usize,
    /// 분석 후보 수
    pub candidates: usize,
    /// 분석 완료 수
    pub analyzed: usize,
    /// 새로 삽입된 레코드 수
    pub inserted: usize,
    /// 덮어쓴 레코드 수
    pub updated: usize,
    /// 아이템 단위 실패 수
    pub errors: usize,
    /// 건너뛴 수 (잠금 경합, 이미 분석됨)
    pub skipped: usize,
    /// 보존 정리로 삭제된 행 수
    pub trimmed: usize,
    /// 소요 시간
    #[serde(skip)]
    pub elapsed: Duration,
}

impl RunStats {
    /// 새 통계 객체 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 성공률 계산 (%)
    pub fn success_rate(&self) -> f64 {
        let attempted = self.analyzed + self.errors;
        if attempted == 0 {
            0.0
        } else {
            (self.analyzed as f64 / attempted as f64) * 100.0
        }
    }

    /// 통계 요약 로그 출력
    pub fn log_summary(&self, operation: &str) {
        tracing::info!(
            operation = operation,
            fetched = self.fetched,
            candidates = self.candidates,
            analyzed = self.analyzed,
            inserted = self.inserted,
            updated = self.updated,
            errors = self.errors,
            skipped = self.skipped,
            trimmed = self.trimmed,
            success_rate = format!("{:.1}%", self.success_rate()),
            elapsed = format!("{:.1}s", self.elapsed.as_secs_f64()),
            "실행 완료"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_rate() {
        let mut stats = RunStats::new();
        assert_eq!(stats.success_rate(), 0.0);

        stats.analyzed = 3;
        stats.errors = 1;
        assert!((stats.success_rate() - 75.0).abs() < 1e-9);
    }

    #[test]
    fn test_serializes_summary_fields() {
        let stats = RunStats {
            analyzed: 2,
            inserted: 1,
            updated: 1,
            errors: 0,
            skipped: 3,
            ..Default::default()
        };
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["analyzed"], 2);
        assert_eq!(json["inserted"], 1);
        assert_eq!(json["skipped"], 3);
        // elapsed는 직렬화에서 제외
        assert!(json.get("elapsed").is_none());
    }
}
