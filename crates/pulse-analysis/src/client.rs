//! 구조화 출력용 chat completions 클라이언트.
//!
//! OpenAI 호환 chat completions API에 JSON 모드로 요청을 보내고
//! 본문 텍스트를 돌려줍니다. 응답 파싱은 각 단계가 자체 스키마로
//! 수행합니다.

use crate::error::{AnalysisError, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Chat 클라이언트 설정.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// API 키
    pub api_key: String,
    /// API 베이스 URL
    pub base_url: String,
    /// 요청 타임아웃 (초)
    pub timeout_secs: u64,
    /// 사용할 모델
    pub model: String,
    /// 최대 출력 토큰
    pub max_tokens: u32,
    /// 샘플링 온도
    pub temperature: f32,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.openai.com/v1".to_string(),
            timeout_secs: 60,
            model: "gpt-4o-mini".to_string(),
            max_tokens: 1500,
            temperature: 0.2,
        }
    }
}

impl ChatConfig {
    /// 환경변수에서 설정을 생성합니다.
    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var("ANALYSIS_API_KEY")
                .or_else(|_| std::env::var("OPENAI_API_KEY"))
                .unwrap_or_default(),
            base_url: std::env::var("ANALYSIS_API_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            timeout_secs: 60,
            model: std::env::var("ANALYSIS_MODEL")
                .unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            max_tokens: 1500,
            temperature: 0.2,
        }
    }

    /// 키가 설정되었는지 확인합니다.
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}

/// Chat 메시지.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// Chat 요청.
#[derive(Debug, Clone, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
    response_format: ResponseFormat,
}

#[derive(Debug, Clone, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

/// Chat 응답.
#[derive(Debug, Clone, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Chat completions 클라이언트.
pub struct ChatClient {
    config: ChatConfig,
    http: Client,
}

impl ChatClient {
    /// 새 클라이언트를 생성합니다.
    pub fn new(config: ChatConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AnalysisError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, http })
    }

    /// 환경변수에서 클라이언트를 생성합니다.
    pub fn from_env() -> Result<Self> {
        Self::new(ChatConfig::from_env())
    }

    /// 키가 설정되었는지 확인합니다.
    pub fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    /// JSON 모드로 completion을 요청하고 본문 텍스트를 반환합니다.
    pub async fn complete_json(&self, system: &str, user: &str) -> Result<String> {
        if !self.is_configured() {
            return Err(AnalysisError::Config(
                "analysis API key not configured".to_string(),
            ));
        }

        debug!(model = %self.config.model, "chat completion 요청");

        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user.to_string(),
                },
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            response_format: ResponseFormat {
                format_type: "json_object".to_string(),
            },
        };

        let url = format!("{}/chat/completions", self.config.base_url);

        let response = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| AnalysisError::Api(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!("chat API error: {} - {}", status, body);
            return Err(AnalysisError::Api(format!(
                "chat API returned {}: {}",
                status, body
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| AnalysisError::Api(format!("Failed to parse chat response: {}", e)))?;

        let content = parsed
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .ok_or_else(|| AnalysisError::Api("chat response has no choices".to_string()))?;

        debug!(chars = content.len(), "chat 응답 수신");
        Ok(content)
    }
}
