//! Field projection for catalog records.
//!
//! The catalog returns wide, loosely specified JSON objects. Everything the
//! station hands to clients goes through [`normalize`] first, which keeps a
//! fixed list of fields and nothing else.

use serde_json::{Map, Value};

/// Fields kept for the song detail and artist listing views
pub const DETAIL_FIELDS: &[&str] = &[
    "id",
    "title",
    "full_title",
    "song_art_image_url",
    "release_date_for_display",
    "primary_artist",
];

/// Fields kept for search results
pub const SUMMARY_FIELDS: &[&str] = &["id", "title", "song_art_image_url", "primary_artist"];

/// A record cut down to a caller-chosen list of fields.
///
/// Every requested field has a slot, in request order. A field the source
/// did not have (or had as `null`) occupies its slot as `None`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Projection {
    fields: Vec<(String, Option<Value>)>,
}

impl Projection {
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Field names in the order they were requested
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|(field, _)| field == name)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .and_then(|(_, value)| value.as_ref())
    }

    /// Move a value out, leaving its slot empty
    pub fn take(&mut self, name: &str) -> Option<Value> {
        self.fields
            .iter_mut()
            .find(|(field, _)| field == name)
            .and_then(|(_, value)| value.take())
    }

    /// Like [`take`](Self::take), but only a JSON string counts as present
    pub fn take_string(&mut self, name: &str) -> Option<String> {
        match self.take(name)? {
            Value::String(s) => Some(s),
            other => {
                tracing::debug!("Dropping non-string value for '{}': {}", name, other);
                None
            }
        }
    }
}

/// Project `source` onto `fields`.
///
/// Pure: the source is not modified and unknown fields are ignored. Duplicate
/// names in `fields` are collapsed to their first occurrence.
pub fn normalize(fields: &[&str], source: &Map<String, Value>) -> Projection {
    let mut projected: Vec<(String, Option<Value>)> = Vec::with_capacity(fields.len());

    for &field in fields {
        if projected.iter().any(|(name, _)| name == field) {
            continue;
        }
        let value = source.get(field).filter(|v| !v.is_null()).cloned();
        projected.push((field.to_string(), value));
    }

    Projection { fields: projected }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected a JSON object"),
        }
    }

    #[test]
    fn test_keeps_exactly_the_requested_fields() {
        let source = object(json!({"id": 1, "title": "L", "extra": "x"}));
        let projection = normalize(SUMMARY_FIELDS, &source);

        let names: Vec<&str> = projection.field_names().collect();
        assert_eq!(names, SUMMARY_FIELDS);
        assert_eq!(projection.get("id"), Some(&json!(1)));
        assert_eq!(projection.get("title"), Some(&json!("L")));
        assert!(projection.contains("song_art_image_url"));
        assert_eq!(projection.get("song_art_image_url"), None);
        assert!(!projection.contains("extra"));
    }

    #[test]
    fn test_null_is_treated_as_absent() {
        let source = object(json!({"id": 7, "primary_artist": null}));
        let projection = normalize(DETAIL_FIELDS, &source);

        assert_eq!(projection.len(), DETAIL_FIELDS.len());
        assert_eq!(projection.get("primary_artist"), None);
    }

    #[test]
    fn test_source_is_left_untouched() {
        let source = object(json!({"id": 3, "title": "T", "lyrics_state": "complete"}));
        let before = source.clone();
        let _ = normalize(DETAIL_FIELDS, &source);
        assert_eq!(source, before);
    }

    #[test]
    fn test_empty_field_set() {
        let source = object(json!({"id": 3}));
        assert!(normalize(&[], &source).is_empty());
    }

    #[test]
    fn test_duplicate_fields_collapse() {
        let source = object(json!({"id": 3}));
        let projection = normalize(&["id", "id", "title"], &source);
        assert_eq!(projection.len(), 2);
    }

    #[test]
    fn test_take_empties_the_slot() {
        let source = object(json!({"title": "Song", "id": 9}));
        let mut projection = normalize(DETAIL_FIELDS, &source);

        assert_eq!(projection.take_string("title"), Some("Song".to_string()));
        assert_eq!(projection.take("title"), None);
        assert!(projection.contains("title"));
        assert_eq!(projection.take_string("id"), None);
    }

    #[test]
    fn test_take_string_ignores_non_string_values() {
        let source = object(json!({
            "title": 42,
            "song_art_image_url": {"url": "https://img/1.png"},
            "full_title": "Song by Artist"
        }));
        let mut projection = normalize(DETAIL_FIELDS, &source);

        assert_eq!(projection.take_string("title"), None);
        assert_eq!(projection.take_string("song_art_image_url"), None);
        assert_eq!(
            projection.take_string("full_title"),
            Some("Song by Artist".to_string())
        );
    }
}
