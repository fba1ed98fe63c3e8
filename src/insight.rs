//! コレクション解説の生成
//!
//! `POST /api/openai` の入出力と、チャット補完 API へ投げるプロンプトの組み立て。
//! 実際の通信は [`ChatBackend`] の実装（[`crate::openai::OpenAiBackend`]）に任せる。

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo-1106";

pub const SYSTEM_PROMPT: &str =
    "You are a knowledgeable assistant about NFT collections and provide output in JSON format.";

/// プロキシへのリクエストボディ
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SummarizeRequest {
    pub token_name: String,
    pub token_description: String,
}

/// 成功時のレスポンスボディ（`data` はモデルが返した JSON テキストそのまま）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummarizeResponse {
    pub data: String,
}

/// 失敗時のレスポンスボディ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

/// バックエンドに渡す補完リクエスト（常に JSON 出力モード）
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, thiserror::Error)]
pub enum InsightError {
    /// 上流 API がエラーを返した
    #[error("upstream API error {status}: {message}")]
    Api {
        status: u16,
        message: String,
        code: Option<String>,
        kind: Option<String>,
    },

    #[error("upstream request failed: {0}")]
    Transport(String),

    #[error("upstream response contained no completion")]
    EmptyCompletion,

    #[error("API key is not configured (set {0})")]
    MissingApiKey(String),
}

/// チャット補完 API の抽象
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// 補完結果のテキストを返す
    async fn complete(&self, request: &ChatRequest) -> Result<String, InsightError>;
}

pub fn user_prompt(token_name: &str, token_description: &str) -> String {
    format!(
        "Provide a summary about the NFT collection with the token named {} which is described as {} and provide a overview of the collection",
        token_name, token_description
    )
}

pub struct InsightService {
    backend: Arc<dyn ChatBackend>,
    model: String,
}

impl InsightService {
    pub fn new(backend: Arc<dyn ChatBackend>, model: impl Into<String>) -> Self {
        Self {
            backend,
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn build_request(&self, token_name: &str, token_description: &str) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: Role::System,
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: Role::User,
                    content: user_prompt(token_name, token_description),
                },
            ],
        }
    }

    /// モデルが返した内容をそのまま返す（JSON かどうかは検証しない）
    pub async fn summarize(&self, token_name: &str, token_description: &str) -> Result<String, InsightError> {
        let request = self.build_request(token_name, token_description);
        debug!(model = %self.model, token_name, "requesting collection insight");
        let content = self.backend.complete(&request).await?;
        info!(token_name, bytes = content.len(), "collection insight generated");
        Ok(content)
    }
}
