//! Compiled-in whitelist tables.
//!
//! These are the only configuration the sanitizer and validators consult.
//! Changing them is a deployment, not a runtime operation.

use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use crate::error::{GuardError, Result};

/// Tags permitted in sanitized article content.
pub const ALLOWED_TAGS: &[&str] = &[
    "p",
    "br",
    "strong",
    "em",
    "u",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "ul",
    "ol",
    "li",
    "blockquote",
    "a",
    "img",
];

/// Attributes permitted per tag. Allowed tags missing here keep no attributes.
pub const ATTRIBUTE_WHITELIST: &[(&str, &[&str])] = &[
    ("a", &["href", "title", "target", "rel"]),
    ("img", &["src", "alt", "title", "width", "height"]),
];

/// Attributes whose value is a URL and is subject to the scheme check.
pub const URL_ATTRIBUTES: &[&str] = &["href", "src"];

/// URL schemes allowed in [`URL_ATTRIBUTES`]. Relative references are always allowed.
pub const URL_SCHEMES: &[&str] = &["http", "https", "mailto", "tel"];

/// Allowed tags that never take a closing tag.
pub const VOID_TAGS: &[&str] = &["br", "img"];

/// Tags removed together with everything up to their closing tag.
pub const CONTENT_DROPPED_TAGS: &[&str] = &[
    "script", "style", "iframe", "object", "noscript", "template", "textarea", "title", "xmp",
    "noembed", "noframes",
];

/// Permitted category labels, in display order.
pub const CATEGORY_VOCABULARY: &[&str] = &[
    "店頭販促",
    "デザイン",
    "キャンペーン",
    "イベント",
    "デジタルプロモーション",
    "営業ツール",
    "ノベルティ",
    "すべて",
    "all",
];

/// URL keys for the category labels. Both "all" sentinels share one key.
pub const CATEGORY_KEYS: &[(&str, &str)] = &[
    ("店頭販促", "store"),
    ("デザイン", "design"),
    ("キャンペーン", "campaign"),
    ("イベント", "event"),
    ("デジタルプロモーション", "digital"),
    ("営業ツール", "sales"),
    ("ノベルティ", "novelty"),
    ("すべて", "all"),
    ("all", "all"),
];

/// Image file extensions accepted for `image_path` (compared lowercase).
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "svg"];

/// Prefixes an `image_path` must start with.
pub const IMAGE_PATH_PREFIXES: &[&str] = &[
    "/image/",
    "image/",
    "/uploads/",
    "uploads/",
    "http://",
    "https://",
];

/// Absolute internal upload directories. These are the only values allowed to
/// start with `/`.
pub const ABSOLUTE_UPLOAD_PREFIXES: &[&str] = &["/image/", "/uploads/"];

/// Lookup structures built from the constant tables.
#[derive(Debug)]
pub struct ContentPolicy {
    tags: HashSet<&'static str>,
    attributes: HashMap<&'static str, HashSet<&'static str>>,
}

impl ContentPolicy {
    fn from_tables() -> Self {
        Self {
            tags: ALLOWED_TAGS.iter().copied().collect(),
            attributes: ATTRIBUTE_WHITELIST
                .iter()
                .map(|(tag, attrs)| (*tag, attrs.iter().copied().collect()))
                .collect(),
        }
    }

    /// The process-wide policy.
    pub fn global() -> &'static ContentPolicy {
        static POLICY: OnceLock<ContentPolicy> = OnceLock::new();
        POLICY.get_or_init(Self::from_tables)
    }

    pub fn is_allowed_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Whether `attr` may appear on `tag`. Tags with no whitelist entry allow none.
    pub fn is_allowed_attribute(&self, tag: &str, attr: &str) -> bool {
        self.attributes
            .get(tag)
            .is_some_and(|allowed| allowed.contains(attr))
    }

    /// Check the tables against each other.
    ///
    /// Every whitelisted attribute must belong to an allowed tag, every void
    /// tag must be allowed, no allowed tag may also be content-dropped, and
    /// the category key table must cover exactly the vocabulary.
    pub fn verify(&self) -> Result<()> {
        for (tag, attrs) in ATTRIBUTE_WHITELIST {
            if !self.is_allowed_tag(tag) {
                return Err(policy_error(format!(
                    "attribute whitelist references tag `{tag}` outside the allowed tag set"
                )));
            }
            if let Some(attr) = attrs.iter().find(|a| a.starts_with("on")) {
                return Err(policy_error(format!(
                    "attribute `{attr}` on `{tag}` looks like an event handler"
                )));
            }
        }
        if let Some(tag) = VOID_TAGS.iter().find(|t| !self.is_allowed_tag(t)) {
            return Err(policy_error(format!(
                "void tag `{tag}` is not in the allowed tag set"
            )));
        }
        if let Some(tag) = CONTENT_DROPPED_TAGS.iter().find(|t| self.is_allowed_tag(t)) {
            return Err(policy_error(format!(
                "tag `{tag}` is both allowed and content-dropped"
            )));
        }
        if CATEGORY_KEYS.len() != CATEGORY_VOCABULARY.len()
            || CATEGORY_KEYS
                .iter()
                .zip(CATEGORY_VOCABULARY)
                .any(|((label, _), entry)| label != entry)
        {
            return Err(policy_error(
                "category key table does not match the category vocabulary".to_string(),
            ));
        }
        Ok(())
    }
}

fn policy_error(message: String) -> GuardError {
    tracing::error!("Inconsistent content policy: {message}");
    GuardError::Policy(message)
}

/// URL key for a category label, e.g. `"イベント"` -> `"event"`.
///
/// Returns `None` for labels outside the vocabulary. The label must already be
/// trimmed.
pub fn category_key(label: &str) -> Option<&'static str> {
    CATEGORY_KEYS
        .iter()
        .find(|(l, _)| *l == label)
        .map(|(_, key)| *key)
}
