//! The all-or-nothing article gate.

use crate::config::{ContentPipelineBuilder, Limits};
use crate::error::{ValidationFailure, Violation, ViolationKind};
use crate::guard;
use crate::sanitizer::{HtmlSanitizer, Sanitizer, SanitizerPipeline, TagStripper, preview};
use crate::submission::{Field, RawSubmission, SanitizedArticle};
use crate::validate::{check_length, validate_category, validate_image_path};

/// Validates and sanitizes article submissions.
///
/// Every field is checked on every call, and a submission is either accepted
/// as a whole ([`SanitizedArticle`]) or rejected with every failing field
/// listed ([`ValidationFailure`]). The pipeline holds no mutable state and
/// can be shared across threads.
///
/// Per field:
///
/// | Field | Checks |
/// |-------|--------|
/// | `title` | required, length, pattern guard |
/// | `excerpt` | optional, pattern guard, tags stripped, length; derived from content when blank |
/// | `content` | required, length, pattern guard, then pre-filters and the whitelist sanitizer |
/// | `category` | closed vocabulary (a blank label is not a member) |
/// | `image_path` | optional, length, path rules |
pub struct ContentPipeline {
    limits: Limits,
    prefilters: SanitizerPipeline,
    sanitizer: HtmlSanitizer,
}

impl ContentPipeline {
    pub(crate) fn new(limits: Limits, prefilters: SanitizerPipeline) -> Self {
        Self {
            limits,
            prefilters,
            sanitizer: HtmlSanitizer::new(),
        }
    }

    /// Start configuring a pipeline.
    pub fn builder() -> ContentPipelineBuilder {
        ContentPipelineBuilder::new()
    }

    /// Validate `raw` and return the sanitized article, or every violation.
    pub fn process(&self, raw: &RawSubmission) -> Result<SanitizedArticle, ValidationFailure> {
        self.run(raw, &[], ValidationFailure::new())
    }

    /// Like [`process`](Self::process), for a decoded JSON request body.
    ///
    /// Fields holding a non-string value are reported as
    /// [`TypeError`](ViolationKind::TypeError) and skip their remaining
    /// checks; all other fields are still validated.
    #[cfg(feature = "serde")]
    pub fn process_json(
        &self,
        body: &serde_json::Value,
    ) -> Result<SanitizedArticle, ValidationFailure> {
        let extracted = RawSubmission::extract(body);
        let mut failure = ValidationFailure::new();
        for field in &extracted.mistyped {
            tracing::debug!("Rejected {field}: not a string");
            failure.push(*field, Violation::type_error(*field));
        }
        self.run(&extracted.submission, &extracted.mistyped, failure)
    }

    /// Sanitize content on its own: pre-filters, then the whitelist sanitizer.
    pub fn sanitize_content(&self, html: &str) -> String {
        let filtered = self.prefilters.sanitize(html);
        self.sanitizer.sanitize(&filtered)
    }

    fn run(
        &self,
        raw: &RawSubmission,
        skip: &[Field],
        mut failure: ValidationFailure,
    ) -> Result<SanitizedArticle, ValidationFailure> {
        let mut gate = Gate {
            failure: &mut failure,
            skip,
        };

        let title = gate.check(Field::Title, || self.title(&raw.title));
        let content = gate.check(Field::Content, || self.content(&raw.content));
        let excerpt = gate.check(Field::Excerpt, || {
            self.excerpt(raw.excerpt.as_deref(), content.as_deref())
        });
        let category = gate.check(Field::Category, || {
            validate_category(&raw.category).map_err(|v| vec![v])
        });
        let image_path = gate.check(Field::ImagePath, || {
            self.image_path(raw.image_path.as_deref())
        });

        match (title, excerpt, content, category, image_path) {
            (Some(title), Some(excerpt), Some(content), Some(category), Some(image_path))
                if failure.is_empty() =>
            {
                Ok(SanitizedArticle {
                    title,
                    content,
                    excerpt,
                    category,
                    image_path,
                })
            }
            _ => {
                tracing::warn!(
                    "Rejected submission with {} invalid field(s): {}",
                    failure.len(),
                    failure.summary()
                );
                Err(failure)
            }
        }
    }

    fn title(&self, raw: &str) -> Result<String, Vec<Violation>> {
        let value = raw.trim();
        if value.is_empty() {
            return Err(vec![Violation::required(Field::Title)]);
        }

        let mut violations = Vec::new();
        if let Err(v) = check_length(Field::Title, value, self.limits.title.clone()) {
            violations.push(v);
        }
        if let Err(p) = guard::check(value) {
            violations.push(p.for_field(Field::Title));
        }
        if violations.is_empty() {
            Ok(value.to_string())
        } else {
            Err(violations)
        }
    }

    /// A supplied excerpt is guarded, then stripped of tags and measured.
    /// One with no text left is replaced by a preview of the sanitized
    /// content, which must pass the same guard and length check.
    fn excerpt(
        &self,
        raw: Option<&str>,
        content: Option<&str>,
    ) -> Result<Option<String>, Vec<Violation>> {
        let supplied = raw.map(str::trim).unwrap_or_default();
        if !supplied.is_empty() {
            let stripped = TagStripper::new().sanitize(supplied);
            let mut violations = Vec::new();
            if let Err(v) = check_length(Field::Excerpt, &stripped, 0..=self.limits.excerpt_max) {
                violations.push(v);
            }
            if let Err(p) = guard::check(supplied) {
                violations.push(p.for_field(Field::Excerpt));
            }
            if !violations.is_empty() {
                return Err(violations);
            }
            if !stripped.is_empty() {
                return Ok(Some(stripped));
            }
        }

        match content.filter(|_| self.limits.derive_excerpt) {
            Some(content) => self.derived_excerpt(content),
            None => Ok(None),
        }
    }

    fn derived_excerpt(&self, content: &str) -> Result<Option<String>, Vec<Violation>> {
        let text = TagStripper::new().sanitize(content);
        if text.is_empty() {
            return Ok(None);
        }
        let text = preview(&text, self.limits.preview_chars);
        if let Err(p) = guard::check(&text) {
            tracing::debug!("Derived excerpt {text:?} failed the pattern guard");
            return Err(vec![Violation::new(
                ViolationKind::PatternViolation,
                format!("The excerpt derived from the content {p}"),
            )]);
        }
        check_length(Field::Excerpt, &text, 0..=self.limits.excerpt_max).map_err(|v| vec![v])?;
        Ok(Some(text))
    }

    fn content(&self, raw: &str) -> Result<String, Vec<Violation>> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(vec![Violation::required(Field::Content)]);
        }

        let mut violations = Vec::new();
        if let Err(v) = check_length(Field::Content, trimmed, self.limits.content.clone()) {
            violations.push(v);
        }
        if let Err(p) = guard::check(raw) {
            violations.push(p.for_field(Field::Content));
        }
        if !violations.is_empty() {
            return Err(violations);
        }

        let sanitized = self.sanitize_content(raw);
        if sanitized.is_empty() {
            return Err(vec![Violation::new(
                ViolationKind::LengthViolation,
                "The content must contain text after removing disallowed markup.",
            )]);
        }
        Ok(sanitized)
    }

    fn image_path(&self, value: Option<&str>) -> Result<Option<String>, Vec<Violation>> {
        let value = value.map(str::trim).unwrap_or_default();
        if value.is_empty() {
            return Ok(None);
        }

        let mut violations = Vec::new();
        if let Err(v) = check_length(Field::ImagePath, value, 0..=self.limits.image_path_max) {
            violations.push(v);
        }
        if let Err(v) = validate_image_path(value) {
            violations.push(v);
        }
        if violations.is_empty() {
            Ok(Some(value.to_string()))
        } else {
            Err(violations)
        }
    }
}

impl Default for ContentPipeline {
    fn default() -> Self {
        ContentPipelineBuilder::new().build()
    }
}

/// Collects field results into one failure, skipping fields that already
/// failed their type check.
struct Gate<'a> {
    failure: &'a mut ValidationFailure,
    skip: &'a [Field],
}

impl Gate<'_> {
    fn check<T>(
        &mut self,
        field: Field,
        check: impl FnOnce() -> Result<T, Vec<Violation>>,
    ) -> Option<T> {
        if self.skip.contains(&field) {
            return None;
        }
        match check() {
            Ok(value) => Some(value),
            Err(violations) => {
                for violation in violations {
                    tracing::debug!("Rejected {field}: {violation}");
                    self.failure.push(field, violation);
                }
                None
            }
        }
    }
}
