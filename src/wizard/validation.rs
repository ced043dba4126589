//! Field and step validation.
//!
//! Validation never fails: it only produces messages. The navigator treats an
//! empty [`ValidationErrors`] for the current step as the only pass condition.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use strsim::levenshtein;
use uuid::Uuid;

use super::schema::{FieldDescriptor, FieldKind, Rule, WizardDescriptor};
use super::store::FieldStore;
use super::values::{FieldValue, RecordItem};

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\S+@\S+\.\S+$").expect("email pattern compiles"));

static PHONE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+]?[(]?[0-9]{3}[)]?[-\s.]?[0-9]{3}[-\s.]?[0-9]{4,6}$")
        .expect("phone pattern compiles")
});

/// Maximum edit distance for "did you mean" hints on choice fields.
const SUGGESTION_DISTANCE: usize = 3;

/// Error key for a sub-field of a record item.
pub fn record_key(list: &str, id: Uuid, field: &str) -> String {
    format!("{list}.{id}.{field}")
}

/// Prefix shared by every error key of one record item.
pub fn record_prefix(list: &str, id: Uuid) -> String {
    format!("{list}.{id}.")
}

/// Map of error key to message. Absence of a key means "no error".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    entries: BTreeMap<String, String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, message: impl Into<String>) {
        self.entries.insert(key.into(), message.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.remove(key)
    }

    /// Removes every key starting with `prefix`, returning how many were dropped.
    pub fn remove_prefix(&mut self, prefix: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| !key.starts_with(prefix));
        before - self.entries.len()
    }

    /// Replaces every key matching `owned` with the entries of `fresh`.
    pub fn replace_scope(&mut self, owned: impl Fn(&str) -> bool, fresh: ValidationErrors) {
        self.entries.retain(|key, _| !owned(key));
        self.entries.extend(fresh.entries);
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, message)| (key.as_str(), message.as_str()))
    }

    pub fn count_matching(&self, owned: impl Fn(&str) -> bool) -> usize {
        self.entries.keys().filter(|key| owned(key)).count()
    }
}

/// How much of a field's rule set is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMode {
    /// Advisory check while typing: empty values are never flagged.
    Realtime,
    /// Authoritative check on step transitions.
    Transition,
}

/// Evaluates descriptor rules against the store.
pub struct Validator<'a> {
    descriptor: &'a WizardDescriptor,
}

impl<'a> Validator<'a> {
    pub fn new(descriptor: &'a WizardDescriptor) -> Self {
        Self { descriptor }
    }

    /// Full rule set for every field of a 1-indexed step, record items included.
    pub fn validate_step(&self, store: &FieldStore, step: usize) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        let Some(step) = self.descriptor.step(step) else {
            return errors;
        };
        for field in &step.fields {
            match (store.value(field.key), field.record_schema()) {
                (Some(FieldValue::Records(items)), Some(schema)) => {
                    for item in items {
                        for sub in &schema.fields {
                            if let Some(message) = check_record_field(sub, item, store) {
                                errors.insert(record_key(field.key, item.id, sub.key), message);
                            }
                        }
                    }
                }
                (Some(value), _) => {
                    if let Some(message) =
                        check_value(field, value, store, ValidationMode::Transition)
                    {
                        errors.insert(field.key, message);
                    }
                }
                (None, _) => {}
            }
        }
        errors
    }

    /// Advisory check of a single scalar field.
    pub fn validate_realtime(&self, store: &FieldStore, key: &str) -> Option<String> {
        let field = self.descriptor.field(key)?;
        let value = store.value(key)?;
        check_value(field, value, store, ValidationMode::Realtime)
    }

    /// Whether an error key belongs to a field of the given step.
    pub fn step_owns_key(&self, step: usize, key: &str) -> bool {
        self.descriptor
            .step(step)
            .map(|step| {
                step.fields.iter().any(|field| {
                    key == field.key
                        || (field.record_schema().is_some()
                            && key
                                .strip_prefix(field.key)
                                .is_some_and(|rest| rest.starts_with('.')))
                })
            })
            .unwrap_or(false)
    }
}

fn check_record_field(field: &FieldDescriptor, item: &RecordItem, store: &FieldStore) -> Option<String> {
    check_text(
        field,
        item.text(field.key),
        |other| item.fields.get(other).map(String::as_str).or_else(|| store.text(other)),
        ValidationMode::Transition,
    )
}

/// Checks one stored value against its descriptor.
pub fn check_value(
    field: &FieldDescriptor,
    value: &FieldValue,
    store: &FieldStore,
    mode: ValidationMode,
) -> Option<String> {
    match value {
        FieldValue::Text(text) => check_text(field, text, |other| store.text(other), mode),
        FieldValue::List(values) => check_presence(field, !values.is_empty(), mode),
        FieldValue::File(file) => check_presence(field, file.is_some(), mode),
        // Record lists are validated per item; the list itself is never empty.
        FieldValue::Records(_) => None,
    }
}

fn check_presence(field: &FieldDescriptor, present: bool, mode: ValidationMode) -> Option<String> {
    if present || mode == ValidationMode::Realtime {
        return None;
    }
    field.rules.iter().find_map(|rule| match rule {
        Rule::Required(message) => Some(message.clone()),
        _ => None,
    })
}

/// Applies text rules in declaration order; the first failure wins.
pub fn check_text<'v>(
    field: &FieldDescriptor,
    value: &str,
    lookup: impl Fn(&str) -> Option<&'v str>,
    mode: ValidationMode,
) -> Option<String> {
    if value.trim().is_empty() {
        if mode == ValidationMode::Realtime {
            return None;
        }
        return field.rules.iter().find_map(|rule| match rule {
            Rule::Required(message) => Some(message.clone()),
            _ => None,
        });
    }

    for rule in &field.rules {
        let failure = match rule {
            Rule::Required(_) => None,
            Rule::MinLength { min, message } => {
                (value.chars().count() < *min).then(|| message.clone())
            }
            Rule::Email(message) => (!EMAIL_PATTERN.is_match(value)).then(|| message.clone()),
            Rule::Phone(message) => (!PHONE_PATTERN.is_match(value)).then(|| message.clone()),
            Rule::MatchesField { other, message } => {
                (lookup(other).unwrap_or("") != value).then(|| message.clone())
            }
            Rule::Equals { expected, message } => (value != expected).then(|| message.clone()),
            Rule::OneOf(message) => check_choice(field, value, message),
        };
        if failure.is_some() {
            return failure;
        }
    }
    None
}

fn check_choice(field: &FieldDescriptor, value: &str, message: &str) -> Option<String> {
    let options = match &field.kind {
        FieldKind::Choice(options) | FieldKind::MultiSelect(options) => options,
        _ => return None,
    };
    let normalized = value.trim().to_lowercase();
    if options
        .iter()
        .any(|candidate| candidate.to_lowercase() == normalized)
    {
        return None;
    }
    let suggestion = options
        .iter()
        .map(|candidate| (levenshtein(&candidate.to_lowercase(), &normalized), candidate))
        .min_by_key(|(distance, _)| *distance)
        .filter(|(distance, _)| *distance <= SUGGESTION_DISTANCE);
    Some(match suggestion {
        Some((_, best)) => format!("{message} (did you mean `{best}`?)"),
        None => message.to_string(),
    })
}

/// Resolves a choice input to its canonical option spelling.
pub fn canonical_choice<'o>(options: &'o [String], input: &str) -> Option<&'o str> {
    let normalized = input.trim().to_lowercase();
    options
        .iter()
        .find(|candidate| candidate.to_lowercase() == normalized)
        .map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_lookup(_: &str) -> Option<&'static str> {
        None
    }

    fn full_name() -> FieldDescriptor {
        FieldDescriptor::text("fullName", "Full name")
            .required("Full name is required")
            .min_length(3, "Name must be at least 3 characters")
    }

    #[test]
    fn required_and_min_length_never_fire_together() {
        let field = full_name();
        assert_eq!(
            check_text(&field, "", no_lookup, ValidationMode::Transition).as_deref(),
            Some("Full name is required")
        );
        assert_eq!(
            check_text(&field, "   ", no_lookup, ValidationMode::Transition).as_deref(),
            Some("Full name is required")
        );
        assert_eq!(
            check_text(&field, "Al", no_lookup, ValidationMode::Transition).as_deref(),
            Some("Name must be at least 3 characters")
        );
        assert!(check_text(&field, "Ada", no_lookup, ValidationMode::Transition).is_none());
    }

    #[test]
    fn realtime_mode_skips_empty_values() {
        let field = full_name();
        assert!(check_text(&field, "", no_lookup, ValidationMode::Realtime).is_none());
        assert!(check_text(&field, "Al", no_lookup, ValidationMode::Realtime).is_some());
    }

    #[test]
    fn email_format_only_applies_to_non_empty_values() {
        let field = FieldDescriptor::text("email", "Email").email("Please enter a valid email address");
        assert!(check_text(&field, "", no_lookup, ValidationMode::Transition).is_none());
        assert!(check_text(&field, "jane@example.com", no_lookup, ValidationMode::Transition).is_none());
        assert!(check_text(&field, "jane@example", no_lookup, ValidationMode::Transition).is_some());
        assert!(check_text(&field, "jane example.com", no_lookup, ValidationMode::Transition).is_some());
    }

    #[test]
    fn phone_pattern_accepts_common_punctuation() {
        let field = FieldDescriptor::text("phone", "Phone").phone("Please enter a valid phone number");
        for valid in ["+2348012345678", "(080) 123-4567", "080.123.45678", "0801234567"] {
            assert!(
                check_text(&field, valid, no_lookup, ValidationMode::Transition).is_none(),
                "{valid} should be accepted"
            );
        }
        for invalid in ["12345", "phone", "080-123-45"] {
            assert!(
                check_text(&field, invalid, no_lookup, ValidationMode::Transition).is_some(),
                "{invalid} should be rejected"
            );
        }
    }

    #[test]
    fn match_rule_compares_against_other_field() {
        let field = FieldDescriptor::text("confirmPassword", "Confirm")
            .matches("password", "Passwords do not match");
        let lookup = |key: &str| (key == "password").then_some("abcdefgh");
        assert!(check_text(&field, "abcdefgh", lookup, ValidationMode::Realtime).is_none());
        assert_eq!(
            check_text(&field, "abcdefgx", lookup, ValidationMode::Realtime).as_deref(),
            Some("Passwords do not match")
        );
    }

    #[test]
    fn choice_rule_suggests_closest_option() {
        let field = FieldDescriptor::new(
            "genre",
            "Genre",
            FieldKind::Choice(vec!["Jazz".into(), "Gospel".into()]),
        )
        .one_of("Select a valid genre");
        assert!(check_text(&field, "jazz", no_lookup, ValidationMode::Transition).is_none());
        let message = check_text(&field, "Jaz", no_lookup, ValidationMode::Transition).unwrap();
        assert!(message.contains("did you mean `Jazz`"), "{message}");
        let message = check_text(&field, "Heavy metal", no_lookup, ValidationMode::Transition).unwrap();
        assert_eq!(message, "Select a valid genre");
    }

    #[test]
    fn errors_map_prefix_removal() {
        let id = Uuid::new_v4();
        let other = Uuid::new_v4();
        let mut errors = ValidationErrors::new();
        errors.insert(record_key("songs", id, "title"), "Title is required");
        errors.insert(record_key("songs", id, "genre"), "Genre is required");
        errors.insert(record_key("songs", other, "title"), "Title is required");
        errors.insert("fullName", "Full name is required");

        assert_eq!(errors.remove_prefix(&record_prefix("songs", id)), 2);
        assert_eq!(errors.len(), 2);
        assert!(errors.contains(&record_key("songs", other, "title")));
    }

    #[test]
    fn canonical_choice_is_case_insensitive() {
        let options = vec!["Hip Hop".to_string(), "R&B".to_string()];
        assert_eq!(canonical_choice(&options, "hip hop"), Some("Hip Hop"));
        assert_eq!(canonical_choice(&options, "rock"), None);
    }
}
