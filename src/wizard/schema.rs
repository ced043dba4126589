//! Declarative description of a wizard: steps, fields, and their rules.
//!
//! Concrete registration flows (see [`crate::forms`]) describe themselves with
//! these types; the store, validator, and navigator are driven entirely by the
//! descriptor and never hard-code field names.

/// Supported data kinds for wizard fields.
#[derive(Debug, Clone)]
pub enum FieldKind {
    Text,
    /// Single choice among fixed options, stored as text.
    Choice(Vec<String>),
    /// Multi-select among fixed options, stored as a list.
    MultiSelect(Vec<String>),
    File,
    Records(RecordSchema),
}

/// Shape of every item in a list-of-records field.
#[derive(Debug, Clone)]
pub struct RecordSchema {
    pub item_label: &'static str,
    pub fields: Vec<FieldDescriptor>,
    pub file_label: Option<&'static str>,
}

impl RecordSchema {
    pub fn new(item_label: &'static str, fields: Vec<FieldDescriptor>) -> Self {
        Self {
            item_label,
            fields,
            file_label: None,
        }
    }

    pub fn with_file(mut self, label: &'static str) -> Self {
        self.file_label = Some(label);
        self
    }

    pub fn field(&self, key: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|field| field.key == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|field| field.key)
    }
}

/// Built-in validation rules. Each carries the message shown when it fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    Required(String),
    MinLength { min: usize, message: String },
    Email(String),
    Phone(String),
    /// Value must equal the text of another field of the same wizard.
    MatchesField { other: &'static str, message: String },
    /// Value must equal a fixed string (registration codes).
    Equals { expected: String, message: String },
    /// Value must be one of the field's choice options.
    OneOf(String),
}

/// Declarative description of a single field.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub key: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub rules: Vec<Rule>,
    pub realtime: bool,
    pub help: Option<&'static str>,
}

impl FieldDescriptor {
    pub fn new(key: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self {
            key,
            label,
            kind,
            rules: Vec::new(),
            realtime: false,
            help: None,
        }
    }

    pub fn text(key: &'static str, label: &'static str) -> Self {
        Self::new(key, label, FieldKind::Text)
    }

    pub fn required(mut self, message: impl Into<String>) -> Self {
        self.rules.push(Rule::Required(message.into()));
        self
    }

    pub fn min_length(mut self, min: usize, message: impl Into<String>) -> Self {
        self.rules.push(Rule::MinLength {
            min,
            message: message.into(),
        });
        self
    }

    pub fn email(mut self, message: impl Into<String>) -> Self {
        self.rules.push(Rule::Email(message.into()));
        self
    }

    pub fn phone(mut self, message: impl Into<String>) -> Self {
        self.rules.push(Rule::Phone(message.into()));
        self
    }

    pub fn matches(mut self, other: &'static str, message: impl Into<String>) -> Self {
        self.rules.push(Rule::MatchesField {
            other,
            message: message.into(),
        });
        self
    }

    pub fn equals(mut self, expected: impl Into<String>, message: impl Into<String>) -> Self {
        self.rules.push(Rule::Equals {
            expected: expected.into(),
            message: message.into(),
        });
        self
    }

    pub fn one_of(mut self, message: impl Into<String>) -> Self {
        self.rules.push(Rule::OneOf(message.into()));
        self
    }

    /// Re-validate this field on every edit instead of only on step transitions.
    pub fn with_realtime(mut self) -> Self {
        self.realtime = true;
        self
    }

    pub fn with_help(mut self, help: &'static str) -> Self {
        self.help = Some(help);
        self
    }

    pub fn is_required(&self) -> bool {
        self.rules
            .iter()
            .any(|rule| matches!(rule, Rule::Required(_)))
    }

    /// Field this one is compared against, if any.
    pub fn matched_field(&self) -> Option<&'static str> {
        self.rules.iter().find_map(|rule| match rule {
            Rule::MatchesField { other, .. } => Some(*other),
            _ => None,
        })
    }

    pub fn options(&self) -> &[String] {
        match &self.kind {
            FieldKind::Choice(options) | FieldKind::MultiSelect(options) => options,
            _ => &[],
        }
    }

    pub fn record_schema(&self) -> Option<&RecordSchema> {
        match &self.kind {
            FieldKind::Records(schema) => Some(schema),
            _ => None,
        }
    }
}

/// One page of the wizard.
#[derive(Debug, Clone)]
pub struct StepDescriptor {
    pub title: &'static str,
    pub fields: Vec<FieldDescriptor>,
}

impl StepDescriptor {
    pub fn new(title: &'static str, fields: Vec<FieldDescriptor>) -> Self {
        Self { title, fields }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.iter().any(|field| field.key == key)
    }
}

/// Metadata describing a full wizard, including step order.
#[derive(Debug, Clone)]
pub struct WizardDescriptor {
    pub name: &'static str,
    pub title: &'static str,
    pub steps: Vec<StepDescriptor>,
    pub redirect_path: &'static str,
}

impl WizardDescriptor {
    pub fn new(name: &'static str, title: &'static str, steps: Vec<StepDescriptor>) -> Self {
        Self {
            name,
            title,
            steps,
            redirect_path: "/dashboard",
        }
    }

    pub fn with_redirect(mut self, path: &'static str) -> Self {
        self.redirect_path = path;
        self
    }

    pub fn total_steps(&self) -> usize {
        self.steps.len().max(1)
    }

    /// Step descriptor for a 1-indexed step number.
    pub fn step(&self, number: usize) -> Option<&StepDescriptor> {
        number
            .checked_sub(1)
            .and_then(|index| self.steps.get(index))
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldDescriptor> + '_ {
        self.steps.iter().flat_map(|step| step.fields.iter())
    }

    pub fn field(&self, key: &str) -> Option<&FieldDescriptor> {
        self.fields().find(|field| field.key == key)
    }

    /// Fields whose value is compared against `key`.
    pub fn dependents_of<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a FieldDescriptor> {
        self.fields()
            .filter(move |field| field.matched_field() == Some(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor() -> WizardDescriptor {
        WizardDescriptor::new(
            "test",
            "Test",
            vec![
                StepDescriptor::new(
                    "Account",
                    vec![
                        FieldDescriptor::text("password", "Password")
                            .required("Password is required")
                            .min_length(8, "Too short"),
                        FieldDescriptor::text("confirm", "Confirm")
                            .matches("password", "Mismatch"),
                    ],
                ),
                StepDescriptor::new("Profile", vec![FieldDescriptor::text("bio", "Bio")]),
            ],
        )
    }

    #[test]
    fn steps_are_one_indexed() {
        let descriptor = descriptor();
        assert_eq!(descriptor.total_steps(), 2);
        assert!(descriptor.step(0).is_none());
        assert_eq!(descriptor.step(1).map(|s| s.title), Some("Account"));
        assert_eq!(descriptor.step(2).map(|s| s.title), Some("Profile"));
        assert!(descriptor.step(3).is_none());
    }

    #[test]
    fn dependents_are_found_through_match_rules() {
        let descriptor = descriptor();
        let keys: Vec<_> = descriptor.dependents_of("password").map(|f| f.key).collect();
        assert_eq!(keys, vec!["confirm"]);
        assert!(descriptor.field("password").unwrap().is_required());
        assert!(!descriptor.field("bio").unwrap().is_required());
    }
}
