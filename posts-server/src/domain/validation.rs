use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const MAX_STRING_LENGTH: usize = 255;

/// Field name → list of human readable failures, serialized as a plain JSON
/// object so it can be returned as the envelope message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
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

    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    #[cfg(test)]
    pub fn messages(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    /// Returns the trimmed value when present and non-blank, otherwise records
    /// a `required` failure.
    pub fn require<'v>(&mut self, field: &str, value: Option<&'v str>) -> Option<&'v str> {
        match value.map(str::trim) {
            Some(v) if !v.is_empty() => Some(v),
            _ => {
                self.add(field, format!("The {} field is required.", field));
                None
            }
        }
    }

    pub fn max_chars(&mut self, field: &str, value: &str, max: usize) {
        if value.chars().count() > max {
            self.add(
                field,
                format!(
                    "The {} field must not be greater than {} characters.",
                    field, max
                ),
            );
        }
    }

    pub fn min_chars(&mut self, field: &str, value: &str, min: usize) {
        if value.chars().count() < min {
            self.add(
                field,
                format!("The {} field must be at least {} characters.", field, min),
            );
        }
    }

    pub fn email(&mut self, field: &str, value: &str) {
        if !looks_like_email(value) {
            self.add(
                field,
                format!("The {} field must be a valid email address.", field),
            );
        }
    }

    pub fn taken(&mut self, field: &str) {
        self.add(field, format!("The {} has already been taken.", field));
    }
}

fn looks_like_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}
