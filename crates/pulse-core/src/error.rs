//! 뉴스 분석 파이프라인의 에러 타입.
//!
//! 이 모듈은 파이프라인 전반에서 사용되는 에러 타입을 정의합니다.

use thiserror::Error;

/// 핵심 파이프라인 에러.
#[derive(Debug, Error)]
pub enum PulseError {
    /// 설정 에러
    #[error("설정 에러: {0}")]
    Config(String),

    /// 뉴스 피드 에러
    #[error("피드 에러: {0}")]
    Feed(String),

    /// 분석 단계 에러
    #[error("분석 에러: {0}")]
    Analysis(String),

    /// 데이터 에러
    #[error("데이터 에러: {0}")]
    Data(String),

    /// 요청 한도 초과
    #[error("요청 한도 초과: {0}")]
    RateLimit(String),

    /// 네트워크 에러
    #[error("네트워크 에러: {0}")]
    Network(String),

    /// 직렬화 에러
    #[error("직렬화 에러: {0}")]
    Serialization(String),

    /// 데이터베이스 에러
    #[error("데이터베이스 에러: {0}")]
    Database(String),

    /// 알림 에러
    #[error("알림 에러: {0}")]
    Notification(String),

    /// 인증 에러
    #[error("인증 에러: {0}")]
    Auth(String),

    /// 찾을 수 없음
    #[error("찾을 수 없음: {0}")]
    NotFound(String),

    /// 내부 에러
    #[error("내부 에러: {0}")]
    Internal(String),
}

/// 파이프라인 작업을 위한 Result 타입.
pub type PulseResult<T> = Result<T, PulseError>;

impl PulseError {
    /// 재시도 가능한 에러인지 확인합니다.
    ///
    /// 일시적인 업스트림 장애는 캐시 폴백 또는 다음 틱 재시도로 처리됩니다.
    pub fn is_retryable(&self) -> bool {
        matches!(self, PulseError::Network(_) | PulseError::RateLimit(_))
    }

    /// 호출(invocation) 전체를 중단해야 하는 에러인지 확인합니다.
    ///
    /// 피드 전체 도달 불가, 인증 실패 등은 틱 단위로 재시작합니다.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            PulseError::Config(_) | PulseError::Auth(_) | PulseError::Feed(_)
        )
    }
}

impl From<serde_json::Error> for PulseError {
    fn from(err: serde_json::Error) -> Self {
        PulseError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_retryable() {
        let network_err = PulseError::Network("timeout".to_string());
        assert!(network_err.is_retryable());

        let parse_err = PulseError::Analysis("malformed output".to_string());
        assert!(!parse_err.is_retryable());
    }

    #[test]
    fn test_error_fatal() {
        let feed_err = PulseError::Feed("unreachable".to_string());
        assert!(feed_err.is_fatal());

        let rate_err = PulseError::RateLimit("binance".to_string());
        assert!(!rate_err.is_fatal());
    }
}
