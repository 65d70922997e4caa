use super::Sanitizer;
use super::token::{Token, Tokenizer};
use crate::policy::CONTENT_DROPPED_TAGS;

/// Tags that separate words when rendered, so removing them leaves a space.
const BLOCK_TAGS: &[&str] = &[
    "p", "br", "div", "h1", "h2", "h3", "h4", "h5", "h6", "li", "ul", "ol", "blockquote",
];

/// Sanitizer that removes every tag and keeps the text.
///
/// Content of script-like containers is removed with the tag. Block-level
/// boundaries become a single space and runs of whitespace are collapsed, so
/// `<p>one</p><p>two</p>` becomes `one two`. A stray `<` is written as `&lt;`
/// so the result can be fed back into HTML unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct TagStripper;

impl TagStripper {
    pub fn new() -> Self {
        Self
    }
}

impl Sanitizer for TagStripper {
    fn sanitize(&self, html: &str) -> String {
        let mut text = String::with_capacity(html.len());
        let mut tokens = Tokenizer::new(html);

        while let Some(token) = tokens.next() {
            match token {
                Token::Text(t) => text.extend(t.chars().filter(|c| *c != '\0')),
                Token::Lt => text.push_str("&lt;"),
                Token::Discarded => {}
                Token::StartTag(tag) => {
                    if tag.name == "plaintext" {
                        tokens.skip_to_end();
                    } else if CONTENT_DROPPED_TAGS.iter().any(|t| *t == tag.name) {
                        tokens.skip_raw_text(&tag.name);
                    } else if BLOCK_TAGS.iter().any(|t| *t == tag.name) {
                        text.push(' ');
                    }
                }
                Token::EndTag(name) => {
                    if BLOCK_TAGS.iter().any(|t| *t == name) {
                        text.push(' ');
                    }
                }
            }
        }

        collapse_whitespace(&text)
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Cut `text` to at most `limit` characters, appending `...` when anything
/// was removed.
///
/// # Example
///
/// ```
/// use article_guard::preview;
///
/// assert_eq!(preview("short", 10), "short");
/// assert_eq!(preview("a longer sentence", 8), "a longer...");
/// ```
pub fn preview(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        None => text.to_string(),
        Some((cut, _)) => format!("{}...", text[..cut].trim_end()),
    }
}
