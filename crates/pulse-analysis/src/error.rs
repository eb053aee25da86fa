//! 분석 단계 오류 타입.

use pulse_data::DataError;
use thiserror::Error;

/// 분석 파이프라인 오류.
///
/// 모든 변형은 해당 아이템만 중단시킵니다. 아이템의 잠금은 건드리지
/// 않고 자연 만료에 맡겨, 영구적으로 잘못된 아이템이 매 틱 분석
/// 비용을 태우지 않도록 합니다.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// 모델 API 호출 실패
    #[error("Model API error: {0}")]
    Api(String),

    /// 구조화 출력 파싱 실패
    #[error("Stage parse error: {0}")]
    StageParse(String),

    /// 결정 출력의 내부 일관성 위반
    #[error("Inconsistent decision: {0}")]
    Inconsistent(String),

    /// 데이터 계층 오류
    #[error("Data error: {0}")]
    Data(#[from] DataError),

    /// 설정 오류
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
