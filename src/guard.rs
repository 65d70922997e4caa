//! Detectors for known injection payloads in free-text fields.
//!
//! [`check`] does no parsing. It scans for a fixed set of dangerous
//! substrings and structures and reports the first check that matches. It is
//! applied to fields that must not contain markup at all (title, excerpt) and
//! as an early reject on article content before the whitelist sanitizer runs.
//!
//! The event-handler check is a plain case-insensitive substring scan, so a
//! title mentioning "onload" in ordinary prose is rejected too. That
//! over-breadth is accepted: narrowing it would let attribute-shaped payloads
//! through in fields that are later rendered unescaped.

use std::fmt;
use std::sync::OnceLock;

use aho_corasick::{AhoCorasick, MatchKind};
use regex::Regex;

use crate::error::{Violation, ViolationKind};
use crate::submission::Field;

/// Tokens rejected anywhere in a guarded field, in reporting priority order.
pub const EVENT_HANDLER_TOKENS: &[&str] = &[
    "onload",
    "onerror",
    "onclick",
    "onmouseover",
    "onmouseout",
    "onfocus",
    "onblur",
    "onchange",
    "onsubmit",
    "onkeydown",
    "onkeyup",
    "onkeypress",
    "javascript:",
];

/// Which check rejected the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatternViolation {
    /// A complete `<script>...</script>` element.
    ScriptTag,
    /// One of [`EVENT_HANDLER_TOKENS`], carried here.
    EventHandler(&'static str),
    /// A base64 `data:` URI.
    DataUri,
    /// An `<iframe>` opening tag.
    Iframe,
    /// An `<object>` or `<embed>` opening tag.
    ObjectEmbed,
    /// A `<link>` tag referencing `javascript:`.
    JavascriptLink,
    /// A `<meta http-equiv="refresh">` tag.
    MetaRefresh,
}

impl PatternViolation {
    /// Stable machine-readable reason code.
    pub fn code(self) -> &'static str {
        match self {
            PatternViolation::ScriptTag => "script_tag",
            PatternViolation::EventHandler(_) => "event_handler",
            PatternViolation::DataUri => "data_uri",
            PatternViolation::Iframe => "iframe",
            PatternViolation::ObjectEmbed => "object_embed",
            PatternViolation::JavascriptLink => "javascript_link",
            PatternViolation::MetaRefresh => "meta_refresh",
        }
    }

    /// Attach the violation to a field, producing a reportable [`Violation`].
    pub fn for_field(self, field: Field) -> Violation {
        Violation::new(
            ViolationKind::PatternViolation,
            format!("The {} {self}", field.label()),
        )
    }
}

impl fmt::Display for PatternViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternViolation::ScriptTag => f.write_str("contains prohibited script tags."),
            PatternViolation::EventHandler(token) => {
                write!(f, "contains prohibited event handler: {token}")
            }
            PatternViolation::DataUri => f.write_str("contains prohibited data URIs."),
            PatternViolation::Iframe => f.write_str("contains prohibited iframe tags."),
            PatternViolation::ObjectEmbed => f.write_str("contains prohibited object/embed tags."),
            PatternViolation::JavascriptLink => {
                f.write_str("contains prohibited javascript links.")
            }
            PatternViolation::MetaRefresh => f.write_str("contains prohibited meta refresh tags."),
        }
    }
}

impl std::error::Error for PatternViolation {}

fn script_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<script\b[^>]*>.*?</script>").expect("valid regex"))
}

fn data_uri_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)data:\s*[^;,]+;base64,").expect("valid regex"))
}

fn iframe_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)<iframe\b[^>]*>").expect("valid regex"))
}

fn object_embed_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)<(?:object|embed)\b[^>]*>").expect("valid regex"))
}

fn javascript_link_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)<link\b[^>]*javascript:").expect("valid regex"))
}

fn meta_refresh_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)<meta\b[^>]*http-equiv=["']refresh["'][^>]*>"#).expect("valid regex")
    })
}

fn event_matcher() -> &'static AhoCorasick {
    static AC: OnceLock<AhoCorasick> = OnceLock::new();
    AC.get_or_init(|| {
        AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .match_kind(MatchKind::Standard)
            .build(EVENT_HANDLER_TOKENS)
            .expect("aho-corasick patterns must compile")
    })
}

/// The event-handler token with the highest priority present in `input`.
fn find_event_token(input: &str) -> Option<&'static str> {
    event_matcher()
        .find_overlapping_iter(input)
        .map(|m| m.pattern().as_usize())
        .min()
        .map(|idx| EVENT_HANDLER_TOKENS[idx])
}

/// Scan `input` for known injection payloads.
///
/// Checks run in a fixed order and the first match is returned: script
/// element, event-handler token, base64 data URI, iframe, object/embed,
/// javascript link, meta refresh.
pub fn check(input: &str) -> Result<(), PatternViolation> {
    if script_regex().is_match(input) {
        return Err(PatternViolation::ScriptTag);
    }
    if let Some(token) = find_event_token(input) {
        return Err(PatternViolation::EventHandler(token));
    }
    if data_uri_regex().is_match(input) {
        return Err(PatternViolation::DataUri);
    }
    if iframe_regex().is_match(input) {
        return Err(PatternViolation::Iframe);
    }
    if object_embed_regex().is_match(input) {
        return Err(PatternViolation::ObjectEmbed);
    }
    // Unreachable while "javascript:" is an event token; kept so the check
    // survives changes to that list.
    if javascript_link_regex().is_match(input) {
        return Err(PatternViolation::JavascriptLink);
    }
    if meta_refresh_regex().is_match(input) {
        return Err(PatternViolation::MetaRefresh);
    }
    Ok(())
}
