//! Front-matter parsing

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use serde_yaml::Value;

/// Marker line opening and closing the YAML block
const DELIMITER: &str = "---";

/// A single front-matter value after coercion from YAML
#[derive(Debug, Clone, PartialEq)]
pub enum FrontMatterValue {
    Text(String),
    /// A string that parses as a date; `raw` keeps the author's spelling
    Date { raw: String, value: NaiveDateTime },
    List(Vec<String>),
}

impl FrontMatterValue {
    fn from_yaml(value: Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self::from_text(s)),
            Value::Number(n) => Some(Self::Text(n.to_string())),
            Value::Bool(b) => Some(Self::Text(b.to_string())),
            Value::Sequence(items) => Some(Self::List(
                items.into_iter().filter_map(scalar_to_string).collect(),
            )),
            Value::Tagged(tagged) => Self::from_yaml(tagged.value),
            Value::Null | Value::Mapping(_) => None,
        }
    }

    fn from_text(s: String) -> Self {
        match parse_date_string(&s) {
            Some(value) => Self::Date { raw: s, value },
            None => Self::Text(s),
        }
    }

    /// The value as a single string, if it is scalar
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Date { raw, .. } => Some(raw),
            Self::List(_) => None,
        }
    }

    /// The value as a list; a scalar becomes a one-element list
    pub fn to_list(&self) -> Vec<String> {
        match self {
            Self::List(items) => items.clone(),
            Self::Text(s) | Self::Date { raw: s, .. } => vec![s.clone()],
        }
    }
}

/// Front-matter data from a post
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrontMatter {
    fields: IndexMap<String, FrontMatterValue>,
}

impl FrontMatter {
    /// Split `content` into front-matter and body.
    ///
    /// Never fails: a missing block, an unterminated block, or YAML that does
    /// not parse to a mapping all produce an empty `FrontMatter`.
    pub fn parse(content: &str) -> (Self, &str) {
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);

        let Some((yaml, body)) = split_block(content) else {
            return (Self::default(), content);
        };

        if yaml.trim().is_empty() {
            return (Self::default(), body);
        }

        let mapping = match serde_yaml::from_str::<Value>(yaml) {
            Ok(Value::Mapping(mapping)) => mapping,
            Ok(other) => {
                tracing::warn!(
                    "Front-matter is not a key/value mapping (found {:?}), ignoring it",
                    other
                );
                return (Self::default(), body);
            }
            Err(e) => {
                tracing::warn!("Failed to parse YAML front-matter, using defaults: {}", e);
                return (Self::default(), body);
            }
        };

        let mut fields = IndexMap::new();
        for (key, value) in mapping {
            let Some(key) = scalar_to_string(key) else {
                continue;
            };
            match FrontMatterValue::from_yaml(value) {
                Some(value) => {
                    fields.insert(key, value);
                }
                None => tracing::debug!("Ignoring front-matter key {:?} with no usable value", key),
            }
        }

        (Self { fields }, body)
    }

    pub fn get(&self, key: &str) -> Option<&FrontMatterValue> {
        self.fields.get(key)
    }

    /// Non-empty scalar text for `key`
    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key)
            .and_then(FrontMatterValue::as_str)
            .filter(|s| !s.is_empty())
    }

    /// String list for `key`, accepting a single string as one item
    pub fn list(&self, key: &str) -> Vec<String> {
        self.get(key).map(FrontMatterValue::to_list).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }
}

/// Locate the delimited block; returns (yaml, body)
fn split_block(content: &str) -> Option<(&str, &str)> {
    let mut lines = content.split_inclusive('\n');
    let first = lines.next()?;
    if first.trim_end() != DELIMITER {
        return None;
    }

    let yaml_start = first.len();
    let mut offset = yaml_start;
    for line in lines {
        if line.trim_end() == DELIMITER {
            let yaml = &content[yaml_start..offset];
            let body = &content[offset + line.len()..];
            return Some((yaml, body));
        }
        offset += line.len();
    }

    None
}

fn scalar_to_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Tagged(tagged) => scalar_to_string(tagged.value),
        Value::Null | Value::Sequence(_) | Value::Mapping(_) => None,
    }
}

/// Parse a date string in various formats
pub fn parse_date_string(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }

    let datetime_formats = [
        "%Y-%m-%d %H:%M:%S",
        "%Y/%m/%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y/%m/%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
    ];
    for fmt in datetime_formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }

    let date_formats = ["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d", "%B %d, %Y", "%b %d, %Y"];
    for fmt in date_formats {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_yaml_frontmatter() {
        let content = r#"---
title: "Hello"
date: "2024-03-01"
category: Tech
tags: ["a", "b"]
---
# Hi
"#;

        let (fm, body) = FrontMatter::parse(content);
        assert_eq!(fm.text("title"), Some("Hello"));
        assert_eq!(fm.text("date"), Some("2024-03-01"));
        assert!(matches!(fm.get("date"), Some(FrontMatterValue::Date { .. })));
        assert_eq!(fm.text("category"), Some("Tech"));
        assert_eq!(fm.list("tags"), vec!["a", "b"]);
        assert_eq!(body, "# Hi\n");
    }

    #[test]
    fn test_block_list_and_key_order() {
        let content = "---\ntags:\n  - rust\n  - blog\ntitle: T\n---\nbody";
        let (fm, body) = FrontMatter::parse(content);
        assert_eq!(fm.list("tags"), vec!["rust", "blog"]);
        assert_eq!(fm.keys().collect::<Vec<_>>(), vec!["tags", "title"]);
        assert_eq!(body, "body");
    }

    #[test]
    fn test_single_string_tags() {
        let (fm, _) = FrontMatter::parse("---\ntags: Notes\n---\n");
        assert_eq!(fm.list("tags"), vec!["Notes"]);
    }

    #[test]
    fn test_scalars_become_text() {
        let (fm, _) = FrontMatter::parse("---\ntitle: 42\ndraft: true\n---\n");
        assert_eq!(fm.text("title"), Some("42"));
        assert_eq!(fm.get("draft"), Some(&FrontMatterValue::Text("true".to_string())));
    }

    #[test]
    fn test_empty_value_is_absent() {
        let (fm, _) = FrontMatter::parse("---\ntitle: \"\"\ndescription:\n---\n");
        assert_eq!(fm.text("title"), None);
        assert!(fm.get("description").is_none());
    }

    #[test]
    fn test_no_frontmatter() {
        let content = "# Just markdown\n\n---\n\nmore";
        let (fm, body) = FrontMatter::parse(content);
        assert!(fm.is_empty());
        assert_eq!(body, content);
    }

    #[test]
    fn test_unterminated_block_is_body() {
        let content = "---\ntitle: Oops\n\nNo closing marker.";
        let (fm, body) = FrontMatter::parse(content);
        assert!(fm.is_empty());
        assert_eq!(body, content);
    }

    #[test]
    fn test_malformed_yaml_falls_back() {
        let content = "---\ntitle: [unclosed\n---\nStill here.";
        let (fm, body) = FrontMatter::parse(content);
        assert!(fm.is_empty());
        assert_eq!(body, "Still here.");
    }

    #[test]
    fn test_non_mapping_yaml_falls_back() {
        let (fm, body) = FrontMatter::parse("---\n- just\n- a list\n---\ntext");
        assert!(fm.is_empty());
        assert_eq!(body, "text");
    }

    #[test]
    fn test_crlf_and_bom() {
        let content = "\u{feff}---\r\ntitle: Windows\r\n---\r\nBody\r\n";
        let (fm, body) = FrontMatter::parse(content);
        assert_eq!(fm.text("title"), Some("Windows"));
        assert_eq!(body, "Body\r\n");
    }

    #[test]
    fn test_parse_date_string() {
        let d = parse_date_string("2024-01-15 10:30:00").unwrap();
        assert_eq!(d.format("%Y-%m-%d %H:%M").to_string(), "2024-01-15 10:30");
        assert!(parse_date_string("2024/01/15").is_some());
        assert!(parse_date_string("2024-01-15T10:30:00+09:00").is_some());
        assert!(parse_date_string("March 1, 2024").is_some());
        assert!(parse_date_string("someday").is_none());
        assert!(parse_date_string("").is_none());
    }
}
