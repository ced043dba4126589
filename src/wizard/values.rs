//! Value types held by the field store.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque handle to a file chosen through a [`FilePicker`](super::FilePicker).
///
/// The wizard only ever reads the display name; content stays with whoever
/// produced the handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    pub id: Uuid,
    pub name: String,
    pub size_bytes: u64,
}

impl FileRef {
    pub fn new(name: impl Into<String>, size_bytes: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            size_bytes,
        }
    }

    pub fn display_name(&self) -> &str {
        &self.name
    }
}

/// One entry of a list-of-records field (e.g. a song being registered).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordItem {
    pub id: Uuid,
    pub fields: BTreeMap<String, String>,
    pub file: Option<FileRef>,
}

impl RecordItem {
    /// Creates an item with a fresh id and every declared sub-field empty.
    pub fn empty<'a>(sub_fields: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            id: Uuid::new_v4(),
            fields: sub_fields
                .into_iter()
                .map(|key| (key.to_string(), String::new()))
                .collect(),
            file: None,
        }
    }

    pub fn text(&self, field: &str) -> &str {
        self.fields.get(field).map(String::as_str).unwrap_or("")
    }
}

/// Value stored for a declared field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
    File(Option<FileRef>),
    Records(Vec<RecordItem>),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            FieldValue::List(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_file(&self) -> Option<&FileRef> {
        match self {
            FieldValue::File(file) => file.as_ref(),
            _ => None,
        }
    }

    pub fn as_records(&self) -> Option<&[RecordItem]> {
        match self {
            FieldValue::Records(items) => Some(items),
            _ => None,
        }
    }

    /// Human readable rendering used by summaries and the shell.
    pub fn summary(&self) -> String {
        match self {
            FieldValue::Text(value) if value.is_empty() => "[unfilled]".into(),
            FieldValue::Text(value) => value.clone(),
            FieldValue::List(values) if values.is_empty() => "[none]".into(),
            FieldValue::List(values) => values.join(", "),
            FieldValue::File(Some(file)) => file.display_name().to_string(),
            FieldValue::File(None) => "[no file]".into(),
            FieldValue::Records(items) => format!("{} item(s)", items.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_record_declares_every_sub_field() {
        let item = RecordItem::empty(["title", "genre"]);
        assert_eq!(item.fields.len(), 2);
        assert_eq!(item.text("title"), "");
        assert_eq!(item.text("missing"), "");
        assert!(item.file.is_none());
    }

    #[test]
    fn record_ids_are_unique() {
        let first = RecordItem::empty(["title"]);
        let second = RecordItem::empty(["title"]);
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn summary_marks_unfilled_values() {
        assert_eq!(FieldValue::Text(String::new()).summary(), "[unfilled]");
        assert_eq!(
            FieldValue::List(vec!["Jazz".into(), "Gospel".into()]).summary(),
            "Jazz, Gospel"
        );
        assert_eq!(
            FieldValue::File(Some(FileRef::new("passport.pdf", 10))).summary(),
            "passport.pdf"
        );
    }
}
