//! Error types for the `article_guard` crate.
//!
//! Rejections are data, not faults: each failed check yields a [`Violation`],
//! and a rejected submission carries all of them in a [`ValidationFailure`].
//! [`GuardError`] is reserved for misconfiguration found at startup.

use std::collections::BTreeMap;

use crate::submission::Field;

/// Classification of a single failed check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize),
    serde(rename_all = "snake_case")
)]
pub enum ViolationKind {
    /// The field is not the expected primitive (only reachable at the JSON boundary).
    TypeError,
    /// A known-dangerous substring or structure was detected.
    PatternViolation,
    /// A closed-set field holds a value outside the permitted set.
    VocabularyViolation,
    /// A path-like field breaks traversal, prefix, extension or URL rules.
    StructuralViolation,
    /// The field is outside its permitted size bounds.
    LengthViolation,
}

/// One failed check, with a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct Violation {
    pub kind: ViolationKind,
    pub message: String,
}

impl Violation {
    pub fn new(kind: ViolationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub(crate) fn type_error(field: Field) -> Self {
        Self::new(
            ViolationKind::TypeError,
            format!("The {} must be a string.", field.label()),
        )
    }

    pub(crate) fn required(field: Field) -> Self {
        Self::new(
            ViolationKind::LengthViolation,
            format!("The {} field is required.", field.label()),
        )
    }
}

/// Every violation found in a rejected submission, grouped by field.
///
/// A field appears at most once; its violations keep the order in which the
/// checks ran. Fields iterate in declaration order of [`Field`].
#[derive(Debug, Clone, Default, PartialEq, Eq, thiserror::Error)]
#[error("{}", summarize(.errors))]
pub struct ValidationFailure {
    errors: BTreeMap<Field, Vec<Violation>>,
}

impl ValidationFailure {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a violation against `field`.
    pub fn push(&mut self, field: Field, violation: Violation) {
        self.errors.entry(field).or_default().push(violation);
    }

    /// Number of invalid fields (not the number of messages).
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn contains(&self, field: Field) -> bool {
        self.errors.contains_key(&field)
    }

    /// Violations recorded for `field`, in check order.
    pub fn get(&self, field: Field) -> Option<&[Violation]> {
        self.errors.get(&field).map(Vec::as_slice)
    }

    /// Messages recorded for `field`, in check order.
    pub fn messages(&self, field: Field) -> Vec<&str> {
        self.get(field)
            .map(|v| v.iter().map(|v| v.message.as_str()).collect())
            .unwrap_or_default()
    }

    /// Iterate `(field, violations)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (Field, &[Violation])> {
        self.errors.iter().map(|(f, v)| (*f, v.as_slice()))
    }

    /// Fold the violations of `other` into `self`.
    pub fn merge(&mut self, other: ValidationFailure) {
        for (field, violations) in other.errors {
            self.errors.entry(field).or_default().extend(violations);
        }
    }

    /// Short description: the first message, plus a count of the rest.
    pub fn summary(&self) -> String {
        summarize(&self.errors)
    }
}

fn summarize(errors: &BTreeMap<Field, Vec<Violation>>) -> String {
    let mut all = errors.values().flatten();
    let Some(first) = all.next() else {
        return "The given data was valid.".to_string();
    };
    match all.count() {
        0 => first.message.clone(),
        1 => format!("{} (and 1 more error)", first.message),
        n => format!("{} (and {n} more errors)", first.message),
    }
}

/// Serializes to the conventional unprocessable-entity body:
/// `{"message": "...", "errors": {"title": ["..."]}}`.
#[cfg(feature = "serde")]
impl serde::Serialize for ValidationFailure {
    fn serialize<S: serde::Serializer>(
        &self,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        struct Messages<'a>(&'a BTreeMap<Field, Vec<Violation>>);

        impl serde::Serialize for Messages<'_> {
            fn serialize<S: serde::Serializer>(
                &self,
                serializer: S,
            ) -> std::result::Result<S::Ok, S::Error> {
                let mut map = serializer.serialize_map(Some(self.0.len()))?;
                for (field, violations) in self.0 {
                    let messages: Vec<&str> =
                        violations.iter().map(|v| v.message.as_str()).collect();
                    map.serialize_entry(field.as_str(), &messages)?;
                }
                map.end()
            }
        }

        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("message", &self.summary())?;
        map.serialize_entry("errors", &Messages(&self.errors))?;
        map.end()
    }
}

/// Errors raised while building a pipeline. Rejections of user input are
/// reported as [`ValidationFailure`] instead.
#[derive(Debug, thiserror::Error)]
pub enum GuardError {
    /// The compiled-in whitelist tables contradict each other.
    #[error("Policy error: {0}")]
    Policy(String),

    /// The builder configuration is invalid.
    #[error("Config error: {0}")]
    Config(String),
}

/// A type alias for `Result<T, GuardError>`.
pub type Result<T> = std::result::Result<T, GuardError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn length(msg: &str) -> Violation {
        Violation::new(ViolationKind::LengthViolation, msg)
    }

    #[test]
    fn empty_failure_has_no_fields() {
        let failure = ValidationFailure::new();
        assert!(failure.is_empty());
        assert_eq!(failure.len(), 0);
        assert!(failure.get(Field::Title).is_none());
    }

    #[test]
    fn len_counts_fields_not_messages() {
        let mut failure = ValidationFailure::new();
        failure.push(Field::Title, length("too short"));
        failure.push(
            Field::Title,
            Violation::new(ViolationKind::PatternViolation, "script"),
        );
        failure.push(Field::Category, length("too long"));
        assert_eq!(failure.len(), 2);
        assert_eq!(failure.messages(Field::Title), vec!["too short", "script"]);
    }

    #[test]
    fn iteration_follows_field_order() {
        let mut failure = ValidationFailure::new();
        failure.push(Field::ImagePath, length("c"));
        failure.push(Field::Title, length("a"));
        failure.push(Field::Content, length("b"));
        let fields: Vec<Field> = failure.iter().map(|(f, _)| f).collect();
        assert_eq!(fields, vec![Field::Title, Field::Content, Field::ImagePath]);
    }

    #[test]
    fn merge_appends_per_field() {
        let mut a = ValidationFailure::new();
        a.push(Field::Title, length("first"));
        let mut b = ValidationFailure::new();
        b.push(Field::Title, length("second"));
        b.push(Field::Excerpt, length("third"));
        a.merge(b);
        assert_eq!(a.len(), 2);
        assert_eq!(a.messages(Field::Title), vec!["first", "second"]);
    }

    #[test]
    fn summary_counts_remaining_messages() {
        let mut failure = ValidationFailure::new();
        failure.push(Field::Title, length("The title field is required."));
        assert_eq!(failure.to_string(), "The title field is required.");
        failure.push(Field::Category, length("x"));
        failure.push(Field::Category, length("y"));
        assert_eq!(
            failure.to_string(),
            "The title field is required. (and 2 more errors)"
        );
    }

    #[test]
    fn guard_error_messages_name_their_source() {
        let err = GuardError::Config("title length bounds 10..=5 are empty".to_string());
        assert_eq!(err.to_string(), "Config error: title length bounds 10..=5 are empty");
        assert_eq!(GuardError::Policy("x".to_string()).to_string(), "Policy error: x");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serializes_as_unprocessable_entity_body() {
        let mut failure = ValidationFailure::new();
        failure.push(Field::ImagePath, length("too long"));
        failure.push(Field::Title, length("too short"));
        let json = serde_json::to_value(&failure).unwrap();
        assert_eq!(json["message"], "too short (and 1 more error)");
        assert_eq!(json["errors"]["title"][0], "too short");
        assert_eq!(json["errors"]["image_path"][0], "too long");
    }
}
