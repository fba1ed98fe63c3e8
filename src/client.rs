//! 解説プロキシを呼ぶ側

use std::time::Duration;

use reqwest::Client;

use crate::insight::{ErrorBody, SummarizeRequest, SummarizeResponse};
use crate::orchestrator::InsightSubject;
use crate::render::InsightData;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("insight request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("insight service returned {status}: {message}")]
    Service { status: u16, message: String },

    /// 200 だが `{data}` として読めない
    #[error("insight response could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
}

pub struct InsightClient {
    http: Client,
    endpoint: String,
}

impl InsightClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn summarize(&self, subject: &InsightSubject) -> Result<InsightData, ClientError> {
        let body = SummarizeRequest {
            token_name: subject.name.clone(),
            token_description: subject.description.clone(),
        };

        let response = self.http.post(&self.endpoint).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&text)
                .map(|b| b.error)
                .unwrap_or(text);
            return Err(ClientError::Service {
                status: status.as_u16(),
                message,
            });
        }

        let bytes = response.bytes().await?;
        let decoded: SummarizeResponse = serde_json::from_slice(&bytes)?;
        Ok(InsightData::Text(decoded.data))
    }
}
