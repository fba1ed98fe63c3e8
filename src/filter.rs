use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::metadata::NftRecord;

/// 絞り込み条件（trait 名と値の組）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraitSelector {
    pub trait_type: String,
    pub value: String,
}

impl TraitSelector {
    pub fn new(trait_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            trait_type: trait_type.into(),
            value: value.into(),
        }
    }

    /// trait 名も値も空なら「未選択」扱い
    pub fn is_empty(&self) -> bool {
        self.trait_type.is_empty() && self.value.is_empty()
    }

    pub fn matches(&self, record: &NftRecord) -> bool {
        record.has_trait(&self.trait_type, &self.value)
    }
}

/// 取得済みの全件と、そのうち表示中のもの
///
/// 表示中の集合は全件へのインデックスで持つので、常に全件の部分集合になる。
#[derive(Debug, Clone)]
pub struct ResultFilter {
    all: Arc<[NftRecord]>,
    visible: Vec<usize>,
}

impl ResultFilter {
    pub fn new(records: Vec<NftRecord>) -> Self {
        let all: Arc<[NftRecord]> = records.into();
        let visible = (0..all.len()).collect();
        Self { all, visible }
    }

    /// 表示中の集合を絞り込む
    ///
    /// `selector` が None（または空）かつ `offset` が 0 のときは clear と同じ。
    /// None で `offset` が 0 以外なら何もしない。
    pub fn apply(&mut self, selector: Option<&TraitSelector>, offset: usize) {
        let Some(selector) = selector.filter(|s| !s.is_empty()) else {
            if offset == 0 {
                self.clear();
            }
            return;
        };

        let all = &self.all;
        self.visible.retain(|&i| selector.matches(&all[i]));
    }

    pub fn clear(&mut self) {
        self.visible = (0..self.all.len()).collect();
    }

    pub fn all(&self) -> &[NftRecord] {
        &self.all
    }

    pub fn visible(&self) -> impl Iterator<Item = &NftRecord> {
        self.visible.iter().map(|&i| &self.all[i])
    }

    pub fn visible_len(&self) -> usize {
        self.visible.len()
    }

    pub fn first_visible(&self) -> Option<&NftRecord> {
        self.visible.first().map(|&i| &self.all[i])
    }

    pub fn is_filtered(&self) -> bool {
        self.visible.len() != self.all.len()
    }
}
