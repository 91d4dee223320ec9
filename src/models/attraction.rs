//! Attraction model

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Area assigned when neither the address nor the graph names one
pub const UNKNOWN_AREA: &str = "未知区域";

/// Markers used by the record store for "no rating yet"
const UNRATED_MARKERS: [&str; 3] = ["无评分", "暂无评分", "暂无"];

/// Rating as found in the record store
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Rating {
    /// A numeric rating, not yet clamped
    Rated(f64),
    /// Missing or explicitly marked as unrated
    Unrated,
    /// Present but not a number
    Unparseable,
}

impl Rating {
    #[must_use]
    pub fn from_value(value: Option<&Value>) -> Self {
        match value {
            None | Some(Value::Null) => Rating::Unrated,
            Some(Value::Number(number)) => match number.as_f64() {
                Some(rating) if rating.is_finite() => Rating::Rated(rating),
                _ => Rating::Unparseable,
            },
            Some(Value::String(text)) => Self::from_text(text),
            Some(_) => Rating::Unparseable,
        }
    }

    #[must_use]
    pub fn from_text(text: &str) -> Self {
        let text = text.trim();
        if text.is_empty() || UNRATED_MARKERS.contains(&text) {
            return Rating::Unrated;
        }
        match text.parse::<f64>() {
            Ok(rating) if rating.is_finite() => Rating::Rated(rating),
            _ => Rating::Unparseable,
        }
    }
}

/// Comment counts arrive as numbers or as text like `"1,234条点评"`
#[must_use]
pub fn parse_comment_count(value: Option<&Value>) -> u64 {
    match value {
        Some(Value::Number(number)) => number
            .as_u64()
            .or_else(|| number.as_f64().filter(|n| *n > 0.0).map(|n| n as u64))
            .unwrap_or(0),
        Some(Value::String(text)) => {
            let digits: String = text.chars().filter(char::is_ascii_digit).collect();
            digits.parse().unwrap_or(0)
        }
        _ => 0,
    }
}

/// A label attached to an attraction with its edge weight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub label: String,
    pub weight: f64,
}

/// An attraction joined from the graph and the record store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attraction {
    pub name: String,
    pub rating: Rating,
    pub comment_count: u64,
    pub address: String,
    pub opening_hours: String,
    pub description: Option<String>,
    pub themes: Vec<Tag>,
    pub audiences: Vec<Tag>,
    /// Number of graph edges touching the attraction node
    pub degree: usize,
    pub area: String,
}

impl Attraction {
    #[must_use]
    pub fn has_theme(&self, label: &str) -> bool {
        self.themes.iter().any(|tag| tag.label == label)
    }

    #[must_use]
    pub fn has_audience(&self, label: &str) -> bool {
        self.audiences.iter().any(|tag| tag.label == label)
    }

    #[must_use]
    pub fn theme_labels(&self) -> Vec<String> {
        self.themes.iter().map(|tag| tag.label.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(json!(4.7), Rating::Rated(4.7))]
    #[case(json!("4.5"), Rating::Rated(4.5))]
    #[case(json!("无评分"), Rating::Unrated)]
    #[case(json!("暂无评分"), Rating::Unrated)]
    #[case(json!(null), Rating::Unrated)]
    #[case(json!("很好"), Rating::Unparseable)]
    #[case(json!([1, 2]), Rating::Unparseable)]
    fn test_rating_from_value(#[case] value: Value, #[case] expected: Rating) {
        assert_eq!(Rating::from_value(Some(&value)), expected);
    }

    #[test]
    fn test_missing_rating_is_unrated() {
        assert_eq!(Rating::from_value(None), Rating::Unrated);
    }

    #[rstest]
    #[case(json!("1,234条点评"), 1234)]
    #[case(json!("暂无点评"), 0)]
    #[case(json!(5678), 5678)]
    #[case(json!(12.0), 12)]
    #[case(json!(-3), 0)]
    fn test_parse_comment_count(#[case] value: Value, #[case] expected: u64) {
        assert_eq!(parse_comment_count(Some(&value)), expected);
    }
}
