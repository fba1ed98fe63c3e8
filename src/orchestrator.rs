//! 検索画面全体の状態
//!
//! 取得結果・絞り込み・解説の状態を 1 つの構造体で持つ。
//! 解説リクエストには単調増加のトークンを振り、最新でない応答は捨てる。

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::attributes::{extract_attributes, AttributeMap};
use crate::filter::{ResultFilter, TraitSelector};
use crate::metadata::NftRecord;
use crate::render::InsightData;
use crate::widget::WidgetConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPhase {
    /// まだ何も取得していない
    Idle,
    Loaded,
    /// 解説を受け取った
    Annotated,
}

/// 解説を頼む対象コレクション
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InsightSubject {
    pub name: String,
    pub description: String,
}

impl InsightSubject {
    pub fn from_record(record: &NftRecord) -> Self {
        Self {
            name: record.name().unwrap_or_default().to_string(),
            description: record.description().unwrap_or_default().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InsightRequest {
    pub token: u64,
    pub subject: InsightSubject,
}

#[derive(Debug)]
pub struct SearchOrchestrator {
    phase: SearchPhase,
    results: Option<ResultFilter>,
    attributes: AttributeMap,
    widget: WidgetConfig,
    insight: Option<InsightData>,
    insight_error: Option<String>,
    last_token: u64,
    pending: Option<u64>,
}

impl SearchOrchestrator {
    pub fn new(widget: WidgetConfig) -> Self {
        Self {
            phase: SearchPhase::Idle,
            results: None,
            attributes: AttributeMap::new(),
            widget,
            insight: None,
            insight_error: None,
            last_token: 0,
            pending: None,
        }
    }

    /// ウィジェットの取得完了コールバック
    ///
    /// 以前の絞り込み・解説は破棄し、新しい結果の解説を依頼する。
    /// 検索パラメータ（start / where）はウィジェット側の状態なのでそのまま残す。
    pub fn on_nfts_fetched(&mut self, records: Vec<NftRecord>) -> Option<InsightRequest> {
        self.attributes = extract_attributes(&records);
        debug!(
            records = records.len(),
            traits = self.attributes.len(),
            "results fetched"
        );
        self.results = Some(ResultFilter::new(records));
        self.insight = None;
        self.insight_error = None;
        self.phase = SearchPhase::Loaded;
        self.issue_insight_request()
    }

    /// trait/値で絞り込む。結果がまだなければ何もしない
    ///
    /// 空の selector を offset 0 で渡すと clear と同じになる。
    /// 絞り込む前の表示中集合に Flat 形式があれば where も差し替える。
    pub fn select_trait(&mut self, selector: TraitSelector, offset: usize) -> Option<InsightRequest> {
        let results = self.results.as_mut()?;
        self.widget.query.start = offset;
        let had_flat = results.visible().any(NftRecord::is_flat);
        results.apply(Some(&selector), offset);
        if had_flat {
            self.widget.query.where_clause = if selector.is_empty() {
                Vec::new()
            } else {
                vec![selector]
            };
        }
        debug!(visible = results.visible_len(), "filter applied");
        self.issue_insight_request()
    }

    pub fn clear(&mut self) -> Option<InsightRequest> {
        let results = self.results.as_mut()?;
        results.clear();
        self.widget.query.start = 0;
        self.widget.query.where_clause.clear();
        self.issue_insight_request()
    }

    /// 解説の応答。最新のトークンでなければ捨てて false を返す
    pub fn on_insight(&mut self, token: u64, data: InsightData) -> bool {
        if !self.is_current(token) {
            warn!(token, latest = self.last_token, "discarding stale insight");
            return false;
        }
        self.pending = None;
        self.insight = Some(data);
        self.insight_error = None;
        self.phase = SearchPhase::Annotated;
        true
    }

    pub fn on_insight_failed(&mut self, token: u64, message: impl Into<String>) -> bool {
        if !self.is_current(token) {
            return false;
        }
        self.pending = None;
        self.insight_error = Some(message.into());
        true
    }

    fn is_current(&self, token: u64) -> bool {
        self.pending == Some(token)
    }

    /// 表示中の集合が変わったら解説を取り直す（空なら頼まない）
    fn issue_insight_request(&mut self) -> Option<InsightRequest> {
        let subject = self
            .results
            .as_ref()
            .and_then(ResultFilter::first_visible)
            .map(InsightSubject::from_record);

        self.last_token += 1;
        match subject {
            Some(subject) => {
                self.pending = Some(self.last_token);
                Some(InsightRequest {
                    token: self.last_token,
                    subject,
                })
            }
            None => {
                // 進行中の応答はもう表示しない
                self.pending = None;
                None
            }
        }
    }

    pub fn phase(&self) -> SearchPhase {
        self.phase
    }

    /// 最新の解説リクエストが未完了の間だけ true
    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    pub fn attributes(&self) -> &AttributeMap {
        &self.attributes
    }

    pub fn all_records(&self) -> &[NftRecord] {
        self.results.as_ref().map(ResultFilter::all).unwrap_or(&[])
    }

    pub fn displayed(&self) -> Vec<&NftRecord> {
        self.results
            .as_ref()
            .map(|r| r.visible().collect())
            .unwrap_or_default()
    }

    pub fn insight(&self) -> Option<&InsightData> {
        self.insight.as_ref()
    }

    pub fn insight_error(&self) -> Option<&str> {
        self.insight_error.as_deref()
    }

    pub fn widget(&self) -> &WidgetConfig {
        &self.widget
    }

    pub fn widget_mut(&mut self) -> &mut WidgetConfig {
        &mut self.widget
    }
}
