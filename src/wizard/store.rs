//! Single source of truth for every field value across all steps.
//!
//! All edits are plain functions over `&mut FieldStore` returning whether the
//! edit was applied. Unknown names, unknown record ids, and kind mismatches are
//! no-ops: the caller decides how loudly to report them.

use std::collections::BTreeMap;

use serde::Serialize;
use uuid::Uuid;

use super::schema::{FieldKind, WizardDescriptor};
use super::values::{FieldValue, FileRef, RecordItem};

/// Target of a file assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileSlot<'a> {
    Field(&'a str),
    Record { list: &'a str, id: Uuid },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldStore {
    values: BTreeMap<String, FieldValue>,
    #[serde(skip)]
    record_fields: BTreeMap<String, Vec<&'static str>>,
}

impl FieldStore {
    /// Creates an entry for every declared field, with empty defaults. Record
    /// lists start with one empty item.
    pub fn from_descriptor(descriptor: &WizardDescriptor) -> Self {
        let mut values = BTreeMap::new();
        let mut record_fields = BTreeMap::new();
        for field in descriptor.fields() {
            let value = match &field.kind {
                FieldKind::Text | FieldKind::Choice(_) => FieldValue::Text(String::new()),
                FieldKind::MultiSelect(_) => FieldValue::List(Vec::new()),
                FieldKind::File => FieldValue::File(None),
                FieldKind::Records(schema) => {
                    let keys: Vec<&'static str> = schema.keys().collect();
                    let first = RecordItem::empty(keys.iter().copied());
                    record_fields.insert(field.key.to_string(), keys);
                    FieldValue::Records(vec![first])
                }
            };
            values.insert(field.key.to_string(), value);
        }
        Self {
            values,
            record_fields,
        }
    }

    pub fn value(&self, key: &str) -> Option<&FieldValue> {
        self.values.get(key)
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(FieldValue::as_text)
    }

    pub fn list(&self, key: &str) -> Option<&[String]> {
        self.values.get(key).and_then(FieldValue::as_list)
    }

    pub fn records(&self, key: &str) -> Option<&[RecordItem]> {
        self.values.get(key).and_then(FieldValue::as_records)
    }

    pub fn record(&self, list: &str, id: Uuid) -> Option<&RecordItem> {
        self.records(list)?.iter().find(|item| item.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.values.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Overwrites a text field.
    pub fn set_text(&mut self, key: &str, value: &str) -> bool {
        match self.values.get_mut(key) {
            Some(FieldValue::Text(current)) => {
                current.clear();
                current.push_str(value);
                true
            }
            _ => false,
        }
    }

    /// Adds `value` when `included` and absent, removes it when not `included`.
    /// Returns whether the list changed.
    pub fn toggle(&mut self, key: &str, value: &str, included: bool) -> bool {
        let Some(FieldValue::List(values)) = self.values.get_mut(key) else {
            return false;
        };
        let present = values.iter().any(|existing| existing == value);
        match (included, present) {
            (true, false) => {
                values.push(value.to_string());
                true
            }
            (false, true) => {
                values.retain(|existing| existing != value);
                true
            }
            _ => false,
        }
    }

    /// Appends an empty record and returns its fresh id.
    pub fn add_record(&mut self, list: &str) -> Option<Uuid> {
        let keys = self.record_fields.get(list)?;
        let item = RecordItem::empty(keys.iter().copied());
        let id = item.id;
        match self.values.get_mut(list) {
            Some(FieldValue::Records(items)) => {
                items.push(item);
                Some(id)
            }
            _ => None,
        }
    }

    /// Mutates exactly one declared sub-field of the record matching `id`.
    pub fn update_record(&mut self, list: &str, id: Uuid, field: &str, value: &str) -> bool {
        let declared = self
            .record_fields
            .get(list)
            .is_some_and(|keys| keys.iter().any(|key| *key == field));
        if !declared {
            return false;
        }
        self.record_mut(list, id)
            .and_then(|item| item.fields.get_mut(field))
            .map(|current| {
                current.clear();
                current.push_str(value);
            })
            .is_some()
    }

    /// Removes the record matching `id` unless it is the last one.
    pub fn remove_record(&mut self, list: &str, id: Uuid) -> bool {
        let Some(FieldValue::Records(items)) = self.values.get_mut(list) else {
            return false;
        };
        if items.len() <= 1 {
            return false;
        }
        let before = items.len();
        items.retain(|item| item.id != id);
        items.len() != before
    }

    pub fn set_file(&mut self, slot: FileSlot<'_>, file: Option<FileRef>) -> bool {
        match slot {
            FileSlot::Field(key) => match self.values.get_mut(key) {
                Some(FieldValue::File(current)) => {
                    *current = file;
                    true
                }
                _ => false,
            },
            FileSlot::Record { list, id } => match self.record_mut(list, id) {
                Some(item) => {
                    item.file = file;
                    true
                }
                None => false,
            },
        }
    }

    fn record_mut(&mut self, list: &str, id: Uuid) -> Option<&mut RecordItem> {
        match self.values.get_mut(list) {
            Some(FieldValue::Records(items)) => items.iter_mut().find(|item| item.id == id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wizard::schema::{FieldDescriptor, RecordSchema, StepDescriptor};

    fn store() -> FieldStore {
        let descriptor = WizardDescriptor::new(
            "test",
            "Test",
            vec![StepDescriptor::new(
                "Only",
                vec![
                    FieldDescriptor::text("name", "Name"),
                    FieldDescriptor::new(
                        "genres",
                        "Genres",
                        FieldKind::MultiSelect(vec!["Jazz".into(), "Rock".into()]),
                    ),
                    FieldDescriptor::new("idDocument", "ID", FieldKind::File),
                    FieldDescriptor::new(
                        "songs",
                        "Songs",
                        FieldKind::Records(RecordSchema::new(
                            "Song",
                            vec![FieldDescriptor::text("title", "Title")],
                        )),
                    ),
                ],
            )],
        );
        FieldStore::from_descriptor(&descriptor)
    }

    #[test]
    fn every_declared_field_has_an_entry() {
        let store = store();
        assert_eq!(store.len(), 4);
        assert_eq!(store.text("name"), Some(""));
        assert_eq!(store.list("genres"), Some(&[][..]));
        assert_eq!(store.value("idDocument"), Some(&FieldValue::File(None)));
        assert_eq!(store.records("songs").map(|items| items.len()), Some(1));
    }

    #[test]
    fn set_text_is_last_write_wins() {
        let mut store = store();
        assert!(store.set_text("name", "Ada"));
        assert!(store.set_text("name", "Grace"));
        assert_eq!(store.text("name"), Some("Grace"));
        assert!(!store.set_text("genres", "Jazz"));
        assert!(!store.set_text("unknown", "x"));
    }

    #[test]
    fn toggle_never_duplicates() {
        let mut store = store();
        assert!(store.toggle("genres", "Jazz", true));
        assert!(!store.toggle("genres", "Jazz", true));
        assert_eq!(store.list("genres"), Some(&["Jazz".to_string()][..]));
        assert!(store.toggle("genres", "Jazz", false));
        assert!(!store.toggle("genres", "Jazz", false));
        assert_eq!(store.list("genres").map(|l| l.len()), Some(0));
    }

    #[test]
    fn last_record_cannot_be_removed() {
        let mut store = store();
        let only = store.records("songs").unwrap()[0].id;
        assert!(!store.remove_record("songs", only));
        assert_eq!(store.records("songs").unwrap().len(), 1);
    }

    #[test]
    fn records_are_updated_by_id() {
        let mut store = store();
        let first = store.records("songs").unwrap()[0].id;
        let second = store.add_record("songs").unwrap();
        assert!(store.update_record("songs", second, "title", "Water No Get Enemy"));
        assert!(!store.update_record("songs", second, "tempo", "fast"));
        assert!(!store.update_record("songs", Uuid::new_v4(), "title", "x"));
        assert_eq!(store.record("songs", first).unwrap().text("title"), "");
        assert_eq!(
            store.record("songs", second).unwrap().text("title"),
            "Water No Get Enemy"
        );
    }

    #[test]
    fn files_attach_to_fields_and_records() {
        let mut store = store();
        let song = store.records("songs").unwrap()[0].id;
        assert!(store.set_file(FileSlot::Field("idDocument"), Some(FileRef::new("id.pdf", 3))));
        assert!(store.set_file(
            FileSlot::Record { list: "songs", id: song },
            Some(FileRef::new("track.mp3", 9))
        ));
        assert!(!store.set_file(FileSlot::Field("name"), None));
        assert_eq!(
            store.value("idDocument").and_then(FieldValue::as_file).map(|f| f.name.as_str()),
            Some("id.pdf")
        );
        assert_eq!(
            store.record("songs", song).and_then(|item| item.file.as_ref()).map(|f| f.size_bytes),
            Some(9)
        );
    }
}
