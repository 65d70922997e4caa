//! Whitelist sanitizer for rich article content.

use std::sync::OnceLock;

use regex::Regex;

use super::Sanitizer;
use super::token::{Attr, Tag, Token, Tokenizer};
use crate::policy::{CONTENT_DROPPED_TAGS, ContentPolicy, URL_ATTRIBUTES, URL_SCHEMES, VOID_TAGS};

/// Sanitizer that keeps only whitelisted tags and attributes.
///
/// Input is tokenized and re-serialized:
///
/// - tags outside the allowed set are removed and their text kept, except for
///   script-like containers whose content is removed too;
/// - surviving start tags keep only the attributes whitelisted for that tag;
/// - attributes named like event handlers (`on[a-z]+` anywhere in the name)
///   are removed on every tag;
/// - `href`/`src` values with a scheme other than http, https, mailto or tel
///   are removed;
/// - comments, declarations and tags cut off by the end of input are removed.
///
/// Output is canonical (lowercase names, double-quoted escaped values, stray
/// `<` escaped as `&lt;`) and trimmed, so sanitizing twice gives the same
/// result as sanitizing once.
///
/// # Example
///
/// ```
/// use article_guard::{HtmlSanitizer, Sanitizer};
///
/// let sanitizer = HtmlSanitizer::new();
/// let html = r#"<p onclick="alert(1)">hi</p><script>evil()</script>"#;
/// assert_eq!(sanitizer.sanitize(html), "<p>hi</p>");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct HtmlSanitizer {
    policy: &'static ContentPolicy,
}

impl HtmlSanitizer {
    pub fn new() -> Self {
        Self {
            policy: ContentPolicy::global(),
        }
    }

    /// `value` is the attribute value as it will be written, NULs removed, so
    /// the URL check sees the same character references a browser decodes.
    fn keeps_attribute(&self, tag: &str, name: &str, value: Option<&str>) -> bool {
        if is_event_attribute(name) {
            tracing::debug!("Dropping event handler attribute `{name}` on <{tag}>");
            return false;
        }
        if !self.policy.is_allowed_attribute(tag, name) {
            return false;
        }
        if URL_ATTRIBUTES.iter().any(|a| *a == name) {
            return value.is_none_or(is_safe_url);
        }
        true
    }

    fn write_start_tag(&self, tag: &Tag<'_>, out: &mut String) {
        out.push('<');
        out.push_str(&tag.name);

        // first occurrence of a name wins, as in browsers
        let mut seen: Vec<&str> = Vec::with_capacity(tag.attrs.len());
        for attr in &tag.attrs {
            if seen.contains(&attr.name.as_str()) {
                continue;
            }
            seen.push(&attr.name);
            let value = attr.value.map(|v| v.replace('\0', ""));
            if !self.keeps_attribute(&tag.name, &attr.name, value.as_deref()) {
                continue;
            }
            out.push(' ');
            out.push_str(&attr.name);
            if let Some(value) = value {
                out.push_str("=\"");
                push_attribute_value(out, &value);
                out.push('"');
            }
        }
        out.push('>');
    }
}

impl Default for HtmlSanitizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Sanitizer for HtmlSanitizer {
    fn sanitize(&self, html: &str) -> String {
        let mut out = String::with_capacity(html.len());
        let mut tokens = Tokenizer::new(html);

        while let Some(token) = tokens.next() {
            match token {
                Token::Text(text) => push_text(&mut out, text),
                Token::Lt => out.push_str("&lt;"),
                Token::Discarded => {}
                Token::StartTag(tag) => {
                    if self.policy.is_allowed_tag(&tag.name) {
                        self.write_start_tag(&tag, &mut out);
                    } else if tag.name == "plaintext" {
                        tokens.skip_to_end();
                    } else if CONTENT_DROPPED_TAGS.iter().any(|t| *t == tag.name) {
                        tokens.skip_raw_text(&tag.name);
                    }
                }
                Token::EndTag(name) => {
                    if self.policy.is_allowed_tag(&name) && !VOID_TAGS.iter().any(|t| *t == name) {
                        out.push_str("</");
                        out.push_str(&name);
                        out.push('>');
                    }
                }
            }
        }

        out.trim().to_string()
    }
}

fn event_attribute_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)on[a-z]+").expect("valid regex"))
}

/// Whether an attribute name looks like an event handler anywhere in it, so
/// crafted names such as `hrefonclick` are caught as well.
fn is_event_attribute(name: &str) -> bool {
    event_attribute_regex().is_match(name)
}

fn push_text(out: &mut String, text: &str) {
    out.extend(text.chars().filter(|c| *c != '\0'));
}

fn push_attribute_value(out: &mut String, value: &str) {
    for c in value.chars() {
        match c {
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}

/// Whether a URL attribute value is relative or uses an allowed scheme.
///
/// Character references are decoded and whitespace and control characters
/// removed first, the way a browser reads the value, so `jav&#x09;ascript:`
/// and `javascript&colon;` are recognised.
fn is_safe_url(value: &str) -> bool {
    let decoded = decode_for_scheme(value);
    let Some(end) = decoded.find([':', '/', '?', '#']) else {
        return true;
    };
    if !decoded[end..].starts_with(':') {
        return true;
    }
    let scheme = decoded[..end].to_ascii_lowercase();
    URL_SCHEMES.iter().any(|s| *s == scheme)
}

fn decode_for_scheme(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        match decode_char_ref(rest) {
            Some((c, used)) => {
                out.push(c);
                rest = &rest[used..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out.retain(|c| !c.is_whitespace() && !c.is_control());
    out
}

/// Decode the character reference at the start of `s` (which begins with
/// `&`). Returns the character and the number of bytes consumed.
fn decode_char_ref(s: &str) -> Option<(char, usize)> {
    for (name, c) in [("&colon;", ':'), ("&Tab;", '\t'), ("&NewLine;", '\n')] {
        if s.starts_with(name) {
            return Some((c, name.len()));
        }
    }

    let body = s.strip_prefix("&#")?;
    let (digits, radix, prefix_len) = match body.strip_prefix(['x', 'X']) {
        Some(hex) => (hex, 16, 3),
        None => (body, 10, 2),
    };
    let len = digits
        .chars()
        .take_while(|c| c.is_digit(radix))
        .count();
    if len == 0 {
        return None;
    }
    let code = digits[..len]
        .chars()
        .filter_map(|c| c.to_digit(radix))
        .fold(0u32, |acc, d| acc.saturating_mul(radix).saturating_add(d));
    let c = char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER);
    let terminator = usize::from(digits[len..].starts_with(';'));
    Some((c, prefix_len + len + terminator))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clean(html: &str) -> String {
        HtmlSanitizer::new().sanitize(html)
    }

    #[test]
    fn strips_event_handler_and_script() {
        assert_eq!(
            clean(r#"<p onclick="alert(1)">hi</p><script>evil()</script>"#),
            "<p>hi</p>"
        );
    }

    #[test]
    fn filters_attributes_per_tag() {
        assert_eq!(
            clean(r#"<a href="ok.html" onmouseover="x()" style="color:red">link</a>"#),
            r#"<a href="ok.html">link</a>"#
        );
    }

    #[test]
    fn allowed_tags_survive() {
        let html = "<h2>Title</h2><p><strong>b</strong> <em>i</em> <u>u</u><br></p>\
                    <ul><li>one</li></ul><ol><li>two</li></ol><blockquote>q</blockquote>";
        assert_eq!(clean(html), html);
    }

    #[test]
    fn unknown_tags_keep_their_text() {
        assert_eq!(
            clean("<div><span>Hello</span> <b>world</b></div>"),
            "Hello world"
        );
    }

    #[test]
    fn tags_without_whitelist_entry_lose_all_attributes() {
        assert_eq!(
            clean(r#"<p class="lead" id="x" style="color:red">t</p>"#),
            "<p>t</p>"
        );
        assert_eq!(clean(r#"<h1 title="t">T</h1>"#), "<h1>T</h1>");
    }

    #[test]
    fn img_keeps_whitelisted_attributes() {
        assert_eq!(
            clean(r#"<img src="/uploads/a.png" alt="A" width="10" height=20 class="x" onerror="y">"#),
            r#"<img src="/uploads/a.png" alt="A" width="10" height="20">"#
        );
    }

    #[test]
    fn void_tags_are_not_closed() {
        assert_eq!(clean("a<br/>b<BR>c</br>"), "a<br>b<br>c");
        assert_eq!(clean(r#"<img src="a.png"/></img>"#), r#"<img src="a.png">"#);
    }

    #[test]
    fn crafted_attribute_names_are_dropped() {
        assert_eq!(
            clean(r#"<a hrefonclick="alert(1)" href="x.html">x</a>"#),
            r#"<a href="x.html">x</a>"#
        );
        assert_eq!(
            clean(r#"<a href="x.html"onclick="alert(1)">x</a>"#),
            r#"<a href="x.html">x</a>"#
        );
    }

    #[test]
    fn gt_inside_quoted_value_does_not_end_the_tag() {
        assert_eq!(
            clean(r#"<a title="a>b" onclick="x()">t</a>"#),
            r#"<a title="a&gt;b">t</a>"#
        );
    }

    #[test]
    fn script_like_containers_lose_their_content() {
        assert_eq!(clean("<style>p{color:red}</style><p>x</p>"), "<p>x</p>");
        assert_eq!(clean("<textarea><p>t</p></textarea>y"), "y");
        assert_eq!(clean("<SCRIPT>a</script >b"), "b");
        assert_eq!(clean("<p>x</p><script>never closed"), "<p>x</p>");
        assert_eq!(clean("<p>x</p><plaintext><p>y</p>"), "<p>x</p>");
    }

    #[test]
    fn dangerous_schemes_are_removed() {
        for href in [
            "javascript:alert(1)",
            " JavaScript:alert(1)",
            "java\tscript:alert(1)",
            "jav&#x09;ascript:alert(1)",
            "&#106;avascript:alert(1)",
            "&#0000106avascript:alert(1)",
            "javascript&colon;alert(1)",
            "vbscript:msgbox(1)",
            "data:text/html,<script>",
        ] {
            let html = format!(r#"<a href="{href}">x</a>"#);
            assert_eq!(clean(&html), "<a>x</a>", "{href}");
        }
    }

    #[test]
    fn safe_urls_are_kept() {
        for href in [
            "https://example.com/a?b=c#d",
            "http://example.com",
            "mailto:info@example.com",
            "tel:0312345678",
            "/knowledge/article-1",
            "article.html",
            "#section",
            "?page=2",
            "path/with:colon",
        ] {
            let html = format!(r#"<a href="{href}">x</a>"#);
            assert_eq!(clean(&html), format!(r#"<a href="{href}">x</a>"#), "{href}");
        }
    }

    #[test]
    fn nul_cannot_rebuild_a_character_reference() {
        for href in [
            "javascript&#5\u{0}8;alert(1)",
            "javascript&\u{0}#58;alert(1)",
            "javascript&co\u{0}lon;alert(1)",
            "jav\u{0}ascript:alert(1)",
            "&#10\u{0}6;avascript:alert(1)",
        ] {
            let html = format!(r#"<a href="{href}" title="t">x</a>"#);
            let once = clean(&html);
            assert_eq!(once, r#"<a title="t">x</a>"#, "{href:?}");
            assert_eq!(clean(&once), once);
        }
    }

    #[test]
    fn nul_is_removed_from_kept_values() {
        assert_eq!(
            clean("<a href=\"ok\u{0}.html\" title=\"a\u{0}b\">x</a>"),
            r#"<a href="ok.html" title="ab">x</a>"#
        );
    }

    #[test]
    fn duplicate_attributes_keep_the_first() {
        assert_eq!(
            clean(r#"<a href="javascript:x" href="ok.html">x</a>"#),
            "<a>x</a>"
        );
        assert_eq!(
            clean(r#"<a title="one" TITLE="two">x</a>"#),
            r#"<a title="one">x</a>"#
        );
    }

    #[test]
    fn stray_lt_is_escaped() {
        assert_eq!(clean("1 < 2"), "1 &lt; 2");
        assert_eq!(
            clean("<<script>alert(1)<</script>"),
            "&lt;"
        );
    }

    #[test]
    fn comments_are_removed() {
        assert_eq!(clean("<p>a<!-- <script>x</script> -->b</p>"), "<p>ab</p>");
        assert_eq!(clean("<!--[if IE]><p>x</p><![endif]-->y"), "y");
    }

    #[test]
    fn unterminated_tags_are_removed() {
        assert_eq!(clean(r#"<p>kept</p><a href="x"#), "<p>kept</p>");
        assert_eq!(clean("<p>kept</p><img src=x onerror=alert(1)"), "<p>kept</p>");
    }

    #[test]
    fn unmatched_tags_keep_following_text() {
        assert_eq!(clean("<p>open paragraph"), "<p>open paragraph");
        assert_eq!(clean("text</strong> more"), "text</strong> more");
    }

    #[test]
    fn entities_and_nul_in_text() {
        assert_eq!(clean("a &amp; b &lt;i&gt;"), "a &amp; b &lt;i&gt;");
        assert_eq!(clean("a\0b"), "ab");
    }

    #[test]
    fn attribute_values_are_escaped() {
        assert_eq!(
            clean(r#"<a title='say "hi" <3'>x</a>"#),
            r#"<a title="say &quot;hi&quot; &lt;3">x</a>"#
        );
    }

    #[test]
    fn output_is_trimmed() {
        assert_eq!(clean("  \n<p>x</p>\n  "), "<p>x</p>");
        assert_eq!(clean("<div>   </div>"), "");
    }

    #[test]
    fn sanitizing_twice_changes_nothing() {
        for html in [
            r#"<p onclick="alert(1)">hi</p><script>evil()</script>"#,
            r#"<a title='say "hi" <3' href=x.html>x</a>"#,
            "<<b>script>alert(1)<</b>/script>",
            "<p>open <em>unclosed",
            r#"<img src=a.png alt>"#,
            "1 < 2 && 3 > 2",
        ] {
            let once = clean(html);
            assert_eq!(clean(&once), once, "{html}");
        }
    }

    #[test]
    fn event_attribute_pattern() {
        assert!(is_event_attribute("onclick"));
        assert!(is_event_attribute("ONLOAD"));
        assert!(is_event_attribute("hrefonclick"));
        assert!(!is_event_attribute("href"));
        assert!(!is_event_attribute("on"));
    }

    #[test]
    fn char_ref_decoding() {
        assert_eq!(decode_char_ref("&#106;x"), Some(('j', 6)));
        assert_eq!(decode_char_ref("&#x6A"), Some(('j', 5)));
        assert_eq!(decode_char_ref("&colon;"), Some((':', 7)));
        assert_eq!(decode_char_ref("&#;"), None);
        assert_eq!(decode_char_ref("&amp;"), None);
        assert_eq!(
            decode_char_ref("&#99999999999;"),
            Some((char::REPLACEMENT_CHARACTER, 14))
        );
    }
}
