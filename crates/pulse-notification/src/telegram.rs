//! 텔레그램 알림 전송기.
//!
//! Telegram Bot API를 통해 분석 완료 및 신호 알림을 전송합니다.

use crate::types::{NotificationError, NotificationEvent, NotificationResult, NotificationSender};
use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, warn};

/// 텔레그램 전송 설정.
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    /// @BotFather에서 받은 봇 토큰
    pub bot_token: String,
    /// 메시지를 보낼 채팅 ID
    pub chat_id: String,
    /// 전송 활성화 여부
    pub enabled: bool,
    /// API 베이스 URL
    pub api_base_url: String,
}

impl TelegramConfig {
    /// 새 텔레그램 설정을 생성합니다.
    pub fn new(bot_token: String, chat_id: String) -> Self {
        Self {
            bot_token,
            chat_id,
            enabled: true,
            api_base_url: "https://api.telegram.org".to_string(),
        }
    }

    /// 환경 변수에서 설정을 생성합니다.
    pub fn from_env() -> Option<Self> {
        let bot_token = std::env::var("TELEGRAM_BOT_TOKEN").ok()?;
        let chat_id = std::env::var("TELEGRAM_CHAT_ID").ok()?;
        let enabled = std::env::var("TELEGRAM_ENABLED")
            .map(|v| v.to_lowercase() == "true")
            .unwrap_or(true);

        Some(Self {
            bot_token,
            chat_id,
            enabled,
            api_base_url: "https://api.telegram.org".to_string(),
        })
    }
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: String,
    parse_mode: &'a str,
    disable_web_page_preview: bool,
}

/// 텔레그램 알림 전송기.
pub struct TelegramSender {
    config: TelegramConfig,
    client: reqwest::Client,
}

impl TelegramSender {
    /// 새 전송기를 생성합니다.
    pub fn new(config: TelegramConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// 이벤트를 HTML 메시지로 포맷합니다.
    fn format_message(event: &NotificationEvent) -> String {
        match event {
            NotificationEvent::NewsAnalyzed {
                title,
                source,
                sentiment,
                importance,
                breaking,
                url,
            } => {
                let prefix = if *breaking { "🚨 <b>속보</b>\n" } else { "" };
                let link = url
                    .as_deref()
                    .map(|u| format!("\n<a href=\"{}\">원문</a>", u))
                    .unwrap_or_default();
                format!(
                    "{}📰 <b>{}</b>\n소스: {} | 감성: {} | 중요도: {}/10{}",
                    prefix, title, source, sentiment, importance, link
                )
            }
            NotificationEvent::SignalAlert {
                pair,
                signal,
                importance,
                conviction,
                rationale,
            } => {
                format!(
                    "📈 <b>{}</b> → {}\n중요도: {}/10 | 확신도: {:.0}%\n{}",
                    pair,
                    signal,
                    importance,
                    conviction * 100.0,
                    rationale
                )
            }
        }
    }
}

#[async_trait]
impl NotificationSender for TelegramSender {
    async fn send(&self, event: &NotificationEvent) -> NotificationResult<()> {
        if !self.config.enabled {
            debug!("텔레그램 전송 비활성화 상태, 건너뜀");
            return Ok(());
        }

        let url = format!(
            "{}/bot{}/sendMessage",
            self.config.api_base_url, self.config.bot_token
        );

        let request = SendMessageRequest {
            chat_id: &self.config.chat_id,
            text: Self::format_message(event),
            parse_mode: "HTML",
            disable_web_page_preview: true,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| NotificationError::SendFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(%status, %body, "텔레그램 전송 실패");
            return Err(NotificationError::SendFailed(format!(
                "telegram returned {}",
                status
            )));
        }

        debug!("텔레그램 알림 전송 완료");
        Ok(())
    }

    fn name(&self) -> &str {
        "telegram"
    }
}
