//! Turning downstream JSON into the sentences the model reads.

use serde_json::Value as JsonValue;
use std::collections::BTreeSet;

use crate::chatgate::tool_protocol::ToolResult;

/// One element of a collection response, as far as rendering cares.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderedItem {
    /// An object carrying a `name` field.
    Named(String),
    /// Anything else; rendered through its JSON form.
    Other(JsonValue),
}

impl RenderedItem {
    pub fn from_value(value: &JsonValue) -> Self {
        match value.get("name") {
            Some(JsonValue::String(name)) => RenderedItem::Named(name.clone()),
            Some(other) if value.is_object() => RenderedItem::Named(other.to_string()),
            _ => RenderedItem::Other(value.clone()),
        }
    }

    pub fn render(&self) -> String {
        match self {
            RenderedItem::Named(name) => name.clone(),
            RenderedItem::Other(JsonValue::String(s)) => s.clone(),
            RenderedItem::Other(other) => other.to_string(),
        }
    }
}

/// Items of a collection body. `None` when the body is empty or null,
/// which every list tool answers with its "nothing found" sentence.
///
/// A non-array body is treated as a single item.
pub fn collection_items(body: &JsonValue) -> Option<Vec<RenderedItem>> {
    match body {
        JsonValue::Null => None,
        JsonValue::Array(items) if items.is_empty() => None,
        JsonValue::Array(items) => Some(items.iter().map(RenderedItem::from_value).collect()),
        JsonValue::Object(map) if map.is_empty() => None,
        JsonValue::String(s) if s.is_empty() => None,
        other => Some(vec![RenderedItem::from_value(other)]),
    }
}

/// Render and join with `", "`.
pub fn join_names(items: &[RenderedItem]) -> String {
    items
        .iter()
        .map(RenderedItem::render)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse `"1, 2,x,3"` into `{1, 2, 3}`. Tokens that are not integers are dropped.
pub fn parse_id_set(raw: &str) -> BTreeSet<i64> {
    raw.split(',')
        .filter_map(|token| token.trim().parse::<i64>().ok())
        .collect()
}

/// Repeated `ids=` query pairs for an id set.
pub fn id_query(ids: &BTreeSet<i64>) -> Vec<(&'static str, String)> {
    ids.iter().map(|id| ("ids", id.to_string())).collect()
}

/// Field of an object as display text; `fallback` when missing or null.
pub fn field_text(value: &JsonValue, field: &str, fallback: &str) -> String {
    match value.get(field) {
        None | Some(JsonValue::Null) => fallback.to_string(),
        Some(JsonValue::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// How a tool call ended, recorded as `outcome` metadata on the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Ok,
    Empty,
    NotFound,
    Error,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Ok => "ok",
            Outcome::Empty => "empty",
            Outcome::NotFound => "not_found",
            Outcome::Error => "error",
        }
    }
}

/// Wrap a sentence as the tool's successful result.
pub fn reply(outcome: Outcome, text: String) -> ToolResult {
    if outcome == Outcome::Error {
        log::warn!("{}", text);
    }
    ToolResult::success(JsonValue::String(text))
        .with_metadata("outcome", JsonValue::String(outcome.as_str().to_string()))
}

/// Standard list rendering: `none` when empty, `"{prefix}: a, b"` otherwise.
pub fn list_reply(body: &JsonValue, prefix: &str, none: String) -> ToolResult {
    match collection_items(body) {
        None => reply(Outcome::Empty, none),
        Some(items) => reply(Outcome::Ok, format!("{}: {}", prefix, join_names(&items))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_id_set_discards_junk_and_duplicates() {
        let ids = parse_id_set("1, 2,x,3,2");
        assert_eq!(ids.into_iter().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert!(parse_id_set("").is_empty());
        assert!(parse_id_set("a,b").is_empty());
    }

    #[test]
    fn test_items_prefer_name_field() {
        let body = json!([{"id": 1, "name": "Math"}, "History", 7, {"id": 2}]);
        let items = collection_items(&body).unwrap();
        assert_eq!(items[0], RenderedItem::Named("Math".into()));
        assert_eq!(join_names(&items), "Math, History, 7, {\"id\":2}");
    }

    #[test]
    fn test_empty_bodies_render_as_nothing() {
        assert!(collection_items(&json!([])).is_none());
        assert!(collection_items(&JsonValue::Null).is_none());
        assert!(collection_items(&json!({})).is_none());
    }

    #[test]
    fn test_list_reply_sentences() {
        let result = list_reply(&json!([]), "Students", "None here.".into());
        assert_eq!(result.as_text(), "None here.");
        assert_eq!(result.metadata["outcome"], json!("empty"));

        let result = list_reply(&json!([{"name": "Ada"}, {"name": "Alan"}]), "Students", "x".into());
        assert_eq!(result.as_text(), "Students: Ada, Alan");
        assert_eq!(result.metadata["outcome"], json!("ok"));
    }

    #[test]
    fn test_id_query_repeats_key() {
        let pairs = id_query(&parse_id_set("3,1"));
        assert_eq!(pairs, vec![("ids", "1".to_string()), ("ids", "3".to_string())]);
    }
}
