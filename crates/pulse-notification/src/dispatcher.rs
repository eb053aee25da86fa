//! 알림 디스패처.
//!
//! 파이프라인 쓰기 경로가 발행하는 아웃바운드 이벤트 채널입니다.
//! 발행은 fire-and-forget이며, 백그라운드 드레인 태스크가 등록된
//! 전송기로 이벤트를 보냅니다. 전송 실패는 기록될 뿐 파이프라인의
//! 성공 집계에 절대 전파되지 않습니다.
//!
//! 전달 보장은 at-least-once가 아니라 best-effort입니다. 다운스트림
//! 핸들러가 멱등하므로 중복이나 유실 모두 허용됩니다.

use crate::types::{NotificationEvent, NotificationSender};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// 알림 디스패처 핸들.
#[derive(Clone)]
pub struct Dispatcher {
    tx: mpsc::UnboundedSender<NotificationEvent>,
}

impl Dispatcher {
    /// 디스패처와 드레인 태스크를 시작합니다.
    ///
    /// 반환된 `JoinHandle`은 모든 `Dispatcher` 클론이 드롭되면
    /// 종료됩니다.
    pub fn spawn(senders: Vec<Arc<dyn NotificationSender>>) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<NotificationEvent>();

        let handle = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                for sender in &senders {
                    match sender.send(&event).await {
                        Ok(()) => {
                            debug!(sender = sender.name(), "알림 전송 완료");
                        }
                        Err(e) => {
                            // fire-and-forget: 실패는 기록만 한다
                            warn!(sender = sender.name(), error = %e, "알림 전송 실패");
                        }
                    }
                }
            }
            info!("알림 디스패처 종료");
        });

        (Self { tx }, handle)
    }

    /// 전송기가 하나도 없는 디스패처 (알림 비활성화 구성).
    pub fn disabled() -> (Self, JoinHandle<()>) {
        Self::spawn(Vec::new())
    }

    /// 이벤트를 발행합니다.
    ///
    /// 드레인 태스크가 이미 종료된 경우에도 호출자는 실패하지
    /// 않습니다.
    pub fn publish(&self, event: NotificationEvent) {
        if self.tx.send(event).is_err() {
            warn!("알림 채널이 닫혀 있어 이벤트를 버림");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NotificationError, NotificationResult};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct CountingSender {
        sent: Arc<AtomicU32>,
        fail: bool,
    }

    #[async_trait]
    impl NotificationSender for CountingSender {
        async fn send(&self, _event: &NotificationEvent) -> NotificationResult<()> {
            self.sent.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(NotificationError::SendFailed("boom".into()))
            } else {
                Ok(())
            }
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    fn news_event() -> NotificationEvent {
        NotificationEvent::NewsAnalyzed {
            title: "t".into(),
            source: "s".into(),
            sentiment: "neutral".into(),
            importance: 5,
            breaking: false,
            url: None,
        }
    }

    #[tokio::test]
    async fn test_events_reach_all_senders() {
        let count_a = Arc::new(AtomicU32::new(0));
        let count_b = Arc::new(AtomicU32::new(0));
        let (dispatcher, handle) = Dispatcher::spawn(vec![
            Arc::new(CountingSender {
                sent: count_a.clone(),
                fail: false,
            }),
            Arc::new(CountingSender {
                sent: count_b.clone(),
                fail: true,
            }),
        ]);

        dispatcher.publish(news_event());
        dispatcher.publish(news_event());
        drop(dispatcher);
        handle.await.unwrap();

        assert_eq!(count_a.load(Ordering::SeqCst), 2);
        // 실패하는 전송기도 모든 이벤트를 받는다 (실패는 격리됨)
        assert_eq!(count_b.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_publish_after_drain_exit_does_not_panic() {
        let (dispatcher, handle) = Dispatcher::disabled();
        handle.abort();
        let _ = handle.await;

        // 채널이 닫혀도 publish는 조용히 버린다
        dispatcher.publish(news_event());
    }
}
