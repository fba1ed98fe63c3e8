use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 検索ウィジェットから渡される NFT 1件分（スキーマは強制しない）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NftRecord(pub Value);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub trait_type: String,
    pub value: String,
}

/// レコードの形
///
/// `Structured` は `metadata.attributes` に `{trait_type, value}` の配列を持つもの、
/// `Flat` はトップレベルの `attributes` に `{trait名: 値}` のマップを持つもの。
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RecordShape<'a> {
    Structured(&'a [Value]),
    Flat(&'a Map<String, Value>),
    Unknown,
}

impl NftRecord {
    pub fn shape(&self) -> RecordShape<'_> {
        if let Some(attrs) = self
            .0
            .pointer("/metadata/attributes")
            .filter(|v| !v.is_null())
        {
            return match attrs.as_array() {
                Some(list) => RecordShape::Structured(list),
                None => RecordShape::Unknown,
            };
        }
        match self.0.get("attributes").and_then(Value::as_object) {
            Some(map) => RecordShape::Flat(map),
            None => RecordShape::Unknown,
        }
    }

    pub fn is_flat(&self) -> bool {
        matches!(self.shape(), RecordShape::Flat(_))
    }

    /// 表示名（metadata 優先、なければトップレベル）
    pub fn name(&self) -> Option<&str> {
        self.text_field("name")
    }

    pub fn description(&self) -> Option<&str> {
        self.text_field("description")
    }

    fn text_field(&self, key: &str) -> Option<&str> {
        self.0
            .get("metadata")
            .and_then(|m| m.get(key))
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .or_else(|| self.0.get(key).and_then(Value::as_str))
    }

    /// trait 一覧に載せる属性
    ///
    /// Flat 形式は文字列値のみ。Structured 形式は数値・真偽値も文字列化して含める。
    /// 壊れたエントリは黙って読み飛ばす。
    pub fn attributes(&self) -> Vec<Attribute> {
        match self.shape() {
            RecordShape::Structured(list) => list.iter().filter_map(Attribute::from_entry).collect(),
            RecordShape::Flat(map) => map
                .iter()
                .filter_map(|(k, v)| {
                    v.as_str().map(|s| Attribute {
                        trait_type: k.clone(),
                        value: s.to_string(),
                    })
                })
                .collect(),
            RecordShape::Unknown => Vec::new(),
        }
    }

    /// 指定の trait/値 の組を持っているか
    pub fn has_trait(&self, trait_type: &str, value: &str) -> bool {
        match self.shape() {
            RecordShape::Structured(list) => list
                .iter()
                .filter_map(Attribute::from_entry)
                .any(|a| a.trait_type == trait_type && a.value == value),
            RecordShape::Flat(map) => map
                .iter()
                .any(|(k, v)| k == trait_type && scalar_text(v).as_deref() == Some(value)),
            RecordShape::Unknown => false,
        }
    }
}

impl Attribute {
    fn from_entry(entry: &Value) -> Option<Self> {
        let trait_type = entry.get("trait_type")?.as_str()?;
        let value = scalar_text(entry.get("value")?)?;
        Some(Attribute {
            trait_type: trait_type.to_string(),
            value,
        })
    }
}

/// スカラー値を表示用の文字列にする（null・配列・オブジェクトは None）
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_structured_shape() {
        let record = NftRecord(json!({
            "metadata": {
                "name": "Punk #1",
                "description": "a punk",
                "attributes": [
                    {"trait_type": "Background", "value": "Blue"},
                    {"trait_type": "Level", "value": 5},
                    {"value": "orphan"}
                ]
            }
        }));

        assert!(matches!(record.shape(), RecordShape::Structured(_)));
        assert_eq!(record.name(), Some("Punk #1"));
        assert_eq!(record.description(), Some("a punk"));
        let attrs = record.attributes();
        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs[1].value, "5");
        assert!(record.has_trait("Level", "5"));
        assert!(!record.has_trait("Background", "Red"));
    }

    #[test]
    fn test_flat_shape_keeps_only_strings() {
        let record = NftRecord(json!({
            "name": "Token",
            "attributes": {"Eyes": "Laser", "Rank": 3, "Tags": ["a"]}
        }));

        assert!(record.is_flat());
        assert_eq!(record.name(), Some("Token"));
        assert_eq!(
            record.attributes(),
            vec![Attribute {
                trait_type: "Eyes".into(),
                value: "Laser".into()
            }]
        );
        // 絞り込みでは数値も文字列として比較する
        assert!(record.has_trait("Rank", "3"));
    }

    #[test]
    fn test_unknown_shape() {
        let record = NftRecord(json!({"metadata": {"attributes": "nope"}, "attributes": {"A": "b"}}));
        assert_eq!(record.shape(), RecordShape::Unknown);
        assert!(record.attributes().is_empty());

        let record = NftRecord(json!(42));
        assert!(record.attributes().is_empty());
        assert_eq!(record.name(), None);
    }

    #[test]
    fn test_name_falls_back_to_top_level() {
        let record = NftRecord(json!({"metadata": {"name": ""}, "name": "Outer"}));
        assert_eq!(record.name(), Some("Outer"));
    }
}
