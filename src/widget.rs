use serde::{Deserialize, Serialize};

use crate::filter::TraitSelector;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Ethereum,
    Polygon,
    Avalanche,
    Fantom,
}

impl Network {
    /// 接続中チェーンの略称から検索対象ネットワークを決める
    pub fn from_chain(chain: &str) -> Option<Self> {
        match chain.to_ascii_lowercase().as_str() {
            "eth" => Some(Network::Ethereum),
            "polygon" => Some(Network::Polygon),
            "avax" => Some(Network::Avalanche),
            "ftm" => Some(Network::Fantom),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Ethereum => "ethereum",
            Network::Polygon => "polygon",
            Network::Avalanche => "avalanche",
            Network::Fantom => "fantom",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

/// ウィジェットにそのまま渡す検索パラメータ（こちらでは解釈しない）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub limit: u32,
    pub start: usize,
    #[serde(rename = "where")]
    pub where_clause: Vec<TraitSelector>,
    pub select: String,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            limit: 100,
            start: 0,
            where_clause: Vec::new(),
            select: "*".to_string(),
        }
    }
}

/// 外部検索ウィジェットの設定
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetConfig {
    pub active_network: Option<Network>,
    pub theme: Theme,
    #[serde(flatten)]
    pub query: SearchQuery,
}

impl WidgetConfig {
    /// 知らないチェーンなら現在のネットワークを維持する
    pub fn set_chain(&mut self, chain: &str) {
        if let Some(network) = Network::from_chain(chain) {
            self.active_network = Some(network);
        }
    }

    pub fn toggle_theme(&mut self) {
        self.theme = self.theme.toggled();
    }
}
