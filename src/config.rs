use serde::Deserialize;
use anyhow::Result;
use std::fs;
use std::time::Duration;

use crate::insight::DEFAULT_MODEL;
use crate::openai::OPENAI_BASE_URL;
use crate::widget::{SearchQuery, Theme, WidgetConfig};

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&text)?;
        Ok(config)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub openai: OpenAiConfig,
    pub search: SearchConfig,
    pub client: ClientConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    pub base_url: String,
    pub model: String,
    /// API キーを読む環境変数名
    pub api_key_env: String,
    pub timeout_secs: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: OPENAI_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key_env: "OPENAI_KEY".to_string(),
            timeout_secs: 60,
        }
    }
}

impl OpenAiConfig {
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env).ok()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// 接続中チェーンの略称（eth / polygon / avax / ftm）
    pub chain: Option<String>,
    pub theme: Theme,
    pub limit: u32,
    pub start: usize,
    pub select: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        let query = SearchQuery::default();
        Self {
            chain: None,
            theme: Theme::default(),
            limit: query.limit,
            start: query.start,
            select: query.select,
        }
    }
}

impl SearchConfig {
    pub fn widget(&self) -> WidgetConfig {
        let mut widget = WidgetConfig {
            active_network: None,
            theme: self.theme,
            query: SearchQuery {
                limit: self.limit,
                start: self.start,
                where_clause: Vec::new(),
                select: self.select.clone(),
            },
        };
        if let Some(chain) = &self.chain {
            widget.set_chain(chain);
        }
        widget
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub endpoint: String,
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:3000/api/openai".to_string(),
            timeout_secs: 90,
        }
    }
}
