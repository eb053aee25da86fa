//! 알림 타입 및 trait 정의.

use async_trait::async_trait;
use pulse_core::TradeSignal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 알림 오류.
#[derive(Debug, Error)]
pub enum NotificationError {
    /// 전송 실패
    #[error("Send failed: {0}")]
    SendFailed(String),

    /// 설정 오류
    #[error("Configuration error: {0}")]
    Config(String),

    /// 직렬화 오류
    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type NotificationResult<T> = Result<T, NotificationError>;

/// 알림 우선순위 레벨.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationPriority {
    /// 낮은 우선순위 (정보성)
    Low,
    /// 일반 우선순위
    Normal,
    /// 높은 우선순위 (중요 이벤트)
    High,
}

impl Default for NotificationPriority {
    fn default() -> Self {
        Self::Normal
    }
}

/// 알림 이벤트 타입.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotificationEvent {
    /// 새 뉴스 분석 완료
    NewsAnalyzed {
        title: String,
        source: String,
        sentiment: String,
        importance: u8,
        breaking: bool,
        url: Option<String>,
    },
    /// 매매 신호 발생 (NO_TRADE 아님 + 거래 페어 해석됨)
    SignalAlert {
        pair: String,
        signal: TradeSignal,
        importance: u8,
        conviction: f64,
        rationale: String,
    },
}

impl NotificationEvent {
    /// 이벤트의 기본 우선순위.
    pub fn priority(&self) -> NotificationPriority {
        match self {
            NotificationEvent::NewsAnalyzed { breaking: true, .. } => NotificationPriority::High,
            NotificationEvent::NewsAnalyzed { .. } => NotificationPriority::Normal,
            NotificationEvent::SignalAlert { signal, .. } => match signal {
                TradeSignal::StrongBuy | TradeSignal::StrongSell => NotificationPriority::High,
                _ => NotificationPriority::Normal,
            },
        }
    }
}

/// 알림 전송기 trait.
///
/// 전송 실패는 호출자가 기록만 하고 파이프라인 성공 집계에
/// 전파하지 않습니다.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    /// 이벤트를 전송합니다.
    async fn send(&self, event: &NotificationEvent) -> NotificationResult<()>;

    /// 전송기 이름 (로깅용).
    fn name(&self) -> &str;
}
