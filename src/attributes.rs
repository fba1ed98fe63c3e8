use indexmap::IndexMap;
use serde::Serialize;

use crate::metadata::NftRecord;

/// trait 名 → 観測された値（初出順・重複なし）
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AttributeMap {
    traits: IndexMap<String, Vec<String>>,
}

impl AttributeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// 値を追加する。既にあれば何もしない（戻り値は追加したかどうか）
    pub fn insert(&mut self, trait_type: &str, value: &str) -> bool {
        let values = self.traits.entry(trait_type.to_string()).or_default();
        if values.iter().any(|v| v == value) {
            return false;
        }
        values.push(value.to_string());
        true
    }

    pub fn values(&self, trait_type: &str) -> Option<&[String]> {
        self.traits.get(trait_type).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.traits.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.traits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.traits.is_empty()
    }
}

/// レコード群から trait 一覧を作る。形の合わないレコードは読み飛ばす
pub fn extract_attributes<'a, I>(records: I) -> AttributeMap
where
    I: IntoIterator<Item = &'a NftRecord>,
{
    let mut map = AttributeMap::new();
    for record in records {
        for attr in record.attributes() {
            map.insert(&attr.trait_type, &attr.value);
        }
    }
    map
}

/// trait ごとに、各値が何件のレコードに現れたかを数える（trait・値とも初出順）
pub fn count_traits<'a, I>(records: I) -> IndexMap<String, IndexMap<String, usize>>
where
    I: IntoIterator<Item = &'a NftRecord>,
{
    let mut counts: IndexMap<String, IndexMap<String, usize>> = IndexMap::new();
    for attr in records.into_iter().flat_map(NftRecord::attributes) {
        *counts
            .entry(attr.trait_type)
            .or_default()
            .entry(attr.value)
            .or_insert(0) += 1;
    }
    counts
}
