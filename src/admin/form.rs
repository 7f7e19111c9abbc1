use std::collections::BTreeMap;

use serde::Serialize;

/// Validation messages keyed by form field
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormErrors(BTreeMap<String, Vec<String>>);

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(|v| v.as_slice())
    }

    /// Ok if no errors were recorded
    pub fn into_result(self) -> Result<(), FormErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

/// A submitted form for a model, validated before anything is saved.
pub trait ModelForm: Send + Sized {
    type Model;
    /// The validated form data
    type Cleaned: Send + Sync;

    /// Validate the submission. `instance` is the existing object when editing.
    fn clean(self, instance: Option<&Self::Model>) -> Result<Self::Cleaned, FormErrors>;

    /// Names of the fields whose submitted values differ from the existing object.
    fn changed_data(cleaned: &Self::Cleaned, instance: &Self::Model) -> Vec<&'static str>;
}

/// Describe the changed fields, as recorded in the admin history.
pub fn construct_change_message(changed: &[&str]) -> String {
    match changed {
        [] => "No fields changed.".to_string(),
        [only] => format!("Changed {only}."),
        [rest @ .., last] => format!("Changed {} and {last}.", rest.join(", ")),
    }
}
