use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// モデルが返したコレクション解説（JSON テキストか、解析済みの値）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InsightData {
    Text(String),
    Json(Value),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DisplayTree {
    pub nodes: Vec<DisplayNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DisplayNode {
    pub label: String,
    pub content: NodeContent,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeContent {
    Scalar(String),
    Nested(Vec<DisplayNode>),
}

impl InsightData {
    /// 表示用ツリーを作る。テキストが JSON として読めなければそのままエラーを返す
    pub fn render(&self) -> serde_json::Result<DisplayTree> {
        match self {
            InsightData::Text(text) => {
                let value: Value = serde_json::from_str(text)?;
                Ok(render_value(&value))
            }
            InsightData::Json(value) => Ok(render_value(value)),
        }
    }
}

/// トップレベルのスカラーは空のツリーになる
pub fn render_value(value: &Value) -> DisplayTree {
    DisplayTree {
        nodes: children(value).unwrap_or_default(),
    }
}

fn children(value: &Value) -> Option<Vec<DisplayNode>> {
    match value {
        Value::Object(map) => Some(map.iter().map(|(k, v)| node(k, v)).collect()),
        Value::Array(items) => Some(
            items
                .iter()
                .enumerate()
                .map(|(i, v)| node(&i.to_string(), v))
                .collect(),
        ),
        _ => None,
    }
}

fn node(key: &str, value: &Value) -> DisplayNode {
    let content = match children(value) {
        Some(nested) => NodeContent::Nested(nested),
        None => NodeContent::Scalar(inline_text(value)),
    };
    DisplayNode {
        label: humanize_label(key),
        content,
    }
}

fn inline_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// `total_supply` → `Total Supply`
///
/// 単語の先頭（ASCII 英数字で、直前が英数字でない位置）だけを大文字にする。
pub fn humanize_label(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut prev_word = false;
    for c in key.chars() {
        let c = if c == '_' { ' ' } else { c };
        let is_word = c.is_ascii_alphanumeric();
        if is_word && !prev_word {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
        prev_word = is_word;
    }
    out
}

impl DisplayTree {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn write_nodes(f: &mut fmt::Formatter<'_>, nodes: &[DisplayNode], depth: usize) -> fmt::Result {
        for node in nodes {
            let indent = "  ".repeat(depth);
            match &node.content {
                NodeContent::Scalar(text) => writeln!(f, "{}{}: {}", indent, node.label, text)?,
                NodeContent::Nested(nested) => {
                    writeln!(f, "{}{}:", indent, node.label)?;
                    Self::write_nodes(f, nested, depth + 1)?;
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for DisplayTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Self::write_nodes(f, &self.nodes, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_humanize_label() {
        assert_eq!(humanize_label("total_supply"), "Total Supply");
        assert_eq!(humanize_label("collection"), "Collection");
        assert_eq!(humanize_label("floorPrice"), "FloorPrice");
        assert_eq!(humanize_label("top-traits_2"), "Top-Traits 2");
        assert_eq!(humanize_label("__x"), "  X");
    }

    #[test]
    fn test_text_and_value_render_the_same() {
        let value = json!({
            "collection_name": "CryptoPunks",
            "overview": {"total_supply": 10000, "blockchain": "Ethereum", "notable": [1, {"deep": {"deeper": null}}]},
            "verified": true
        });
        let from_text = InsightData::Text(value.to_string()).render().unwrap();
        let from_value = InsightData::Json(value).render().unwrap();
        assert_eq!(from_text, from_value);
    }

    #[test]
    fn test_nested_layout() {
        let tree = render_value(&json!({
            "collection_name": "CryptoPunks",
            "overview": {"total_supply": 10000, "is_verified": false},
            "tags": ["pixel", "og"]
        }));

        let expected = "\
Collection Name: CryptoPunks
Overview:
  Total Supply: 10000
  Is Verified: false
Tags:
  0: pixel
  1: og
";
        assert_eq!(tree.to_string(), expected);
    }

    #[test]
    fn test_deep_nesting() {
        let mut value = json!("leaf");
        for _ in 0..64 {
            value = json!({ "level": value });
        }
        let tree = render_value(&value);
        let text = tree.to_string();
        assert_eq!(text.lines().count(), 64);
        assert!(text.lines().last().unwrap().ends_with("Level: leaf"));
    }

    #[test]
    fn test_malformed_text_is_an_error() {
        assert!(InsightData::Text("{not json".into()).render().is_err());
    }

    #[test]
    fn test_top_level_scalar_is_empty() {
        assert!(InsightData::Text("42".into()).render().unwrap().is_empty());
    }
}
