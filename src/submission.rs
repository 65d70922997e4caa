//! Article submission records: the untrusted [`RawSubmission`] entering the
//! pipeline and the [`SanitizedArticle`] leaving it.

use std::fmt;

/// The article fields the pipeline validates.
///
/// Ordering follows declaration order and drives the iteration order of
/// [`ValidationFailure`](crate::ValidationFailure).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize),
    serde(rename_all = "snake_case")
)]
pub enum Field {
    Title,
    Excerpt,
    Content,
    Category,
    ImagePath,
}

impl Field {
    pub const ALL: [Field; 5] = [
        Field::Title,
        Field::Excerpt,
        Field::Content,
        Field::Category,
        Field::ImagePath,
    ];

    /// Wire name of the field, as used in request and error bodies.
    pub fn as_str(self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Excerpt => "excerpt",
            Field::Content => "content",
            Field::Category => "category",
            Field::ImagePath => "image_path",
        }
    }

    /// Name used inside human-readable messages.
    pub(crate) fn label(self) -> &'static str {
        match self {
            Field::ImagePath => "image path",
            other => other.as_str(),
        }
    }

    fn required(self) -> bool {
        matches!(self, Field::Title | Field::Content | Field::Category)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An article as submitted by a client. Nothing about it is trusted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
pub struct RawSubmission {
    #[cfg_attr(feature = "serde", serde(default))]
    pub title: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub content: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub excerpt: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub category: String,
    #[cfg_attr(feature = "serde", serde(default, alias = "featured_image"))]
    pub image_path: Option<String>,
}

impl RawSubmission {
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            category: category.into(),
            ..Self::default()
        }
    }

    pub fn with_excerpt(mut self, excerpt: impl Into<String>) -> Self {
        self.excerpt = Some(excerpt.into());
        self
    }

    pub fn with_image_path(mut self, path: impl Into<String>) -> Self {
        self.image_path = Some(path.into());
        self
    }
}

/// Result of pulling a [`RawSubmission`] out of an arbitrary JSON body.
///
/// `mistyped` lists fields whose value was present but not a string; those
/// fields are left empty in `submission` and must not be validated further.
#[cfg(feature = "serde")]
#[derive(Debug, Clone, Default)]
pub(crate) struct Extracted {
    pub submission: RawSubmission,
    pub mistyped: Vec<Field>,
}

#[cfg(feature = "serde")]
impl RawSubmission {
    /// Build a submission from a decoded JSON request body, recording a
    /// [`TypeError`](crate::ViolationKind::TypeError) for every field whose
    /// value is not a string.
    ///
    /// Missing or `null` fields are treated as absent. The key
    /// `featured_image` is accepted in place of `image_path`.
    pub fn from_json(
        value: &serde_json::Value,
    ) -> std::result::Result<Self, crate::ValidationFailure> {
        let extracted = Self::extract(value);
        if extracted.mistyped.is_empty() {
            return Ok(extracted.submission);
        }
        let mut failure = crate::ValidationFailure::new();
        for field in extracted.mistyped {
            failure.push(field, crate::Violation::type_error(field));
        }
        Err(failure)
    }

    pub(crate) fn extract(value: &serde_json::Value) -> Extracted {
        use serde_json::Value;

        let mut out = Extracted::default();
        let Some(object) = value.as_object() else {
            out.mistyped = Field::ALL.into_iter().filter(|f| f.required()).collect();
            return out;
        };

        for field in Field::ALL {
            let raw = match field {
                Field::ImagePath => object
                    .get(field.as_str())
                    .or_else(|| object.get("featured_image")),
                _ => object.get(field.as_str()),
            };
            let text = match raw {
                None | Some(Value::Null) => None,
                Some(Value::String(s)) => Some(s.clone()),
                Some(_) => {
                    out.mistyped.push(field);
                    continue;
                }
            };
            let s = &mut out.submission;
            match field {
                Field::Title => s.title = text.unwrap_or_default(),
                Field::Content => s.content = text.unwrap_or_default(),
                Field::Category => s.category = text.unwrap_or_default(),
                Field::Excerpt => s.excerpt = text,
                Field::ImagePath => s.image_path = text,
            }
        }
        out
    }
}

/// An article whose every field has passed its gate.
///
/// `content` is the whitelist-sanitized HTML; the other fields are trimmed.
/// Produced only by [`ContentPipeline`](crate::ContentPipeline).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SanitizedArticle {
    pub title: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub category: &'static str,
    pub image_path: Option<String>,
}

impl SanitizedArticle {
    /// URL key of the article's category, see [`category_key`](crate::category_key).
    pub fn category_key(&self) -> &'static str {
        crate::policy::category_key(self.category).unwrap_or("all")
    }
}
