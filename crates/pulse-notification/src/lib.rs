//! 알림 서비스.
//!
//! 분석 완료 및 매매 신호에 대한 알림 이벤트 타입, 전송기(텔레그램),
//! 그리고 파이프라인과 전송을 분리하는 디스패처 채널을 제공합니다.

pub mod dispatcher;
pub mod telegram;
pub mod types;

pub use dispatcher::Dispatcher;
pub use telegram::{TelegramConfig, TelegramSender};
pub use types::{
    NotificationError, NotificationEvent, NotificationPriority, NotificationResult,
    NotificationSender,
};
