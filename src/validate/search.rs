//! Search keyword check for article listings.

use crate::error::{Violation, ViolationKind};

const MAX_QUERY_CHARS: usize = 100;

fn is_query_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || c.is_whitespace()
        || matches!(c,
            '\u{3040}'..='\u{309F}'   // hiragana
            | '\u{30A0}'..='\u{30FF}' // katakana
            | '\u{3400}'..='\u{4DBF}' // CJK extension A
            | '\u{4E00}'..='\u{9FAF}' // CJK unified ideographs
        )
}

/// Accept a listing search keyword.
///
/// An empty query passes. Otherwise it must be at most 100 characters and
/// consist only of ASCII letters and digits, whitespace, kana and CJK
/// ideographs. Quotes, angle brackets, semicolons and backslashes are
/// therefore always rejected.
pub fn validate_search_query(query: &str) -> Result<(), Violation> {
    if query.is_empty() {
        return Ok(());
    }
    if query.chars().count() > MAX_QUERY_CHARS {
        return Err(Violation::new(
            ViolationKind::LengthViolation,
            format!("The search query must not be greater than {MAX_QUERY_CHARS} characters."),
        ));
    }
    if !query.chars().all(is_query_char) {
        return Err(Violation::new(
            ViolationKind::PatternViolation,
            "The search query contains invalid characters.",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_mixed_scripts() {
        assert!(validate_search_query("").is_ok());
        assert!(validate_search_query("店頭 POP 2024").is_ok());
        assert!(validate_search_query("ノベルティ グッズ").is_ok());
        assert!(validate_search_query("きゃんぺーん").is_ok());
    }

    #[test]
    fn rejects_injection_characters() {
        for q in ["' OR 1=1 --", "<script>", "a;b", "a\\b", "\"quoted\"", "50%"] {
            let err = validate_search_query(q).unwrap_err();
            assert_eq!(err.kind, ViolationKind::PatternViolation, "{q}");
        }
    }

    #[test]
    fn rejects_long_queries() {
        assert!(validate_search_query(&"あ".repeat(100)).is_ok());
        let err = validate_search_query(&"あ".repeat(101)).unwrap_err();
        assert_eq!(err.kind, ViolationKind::LengthViolation);
    }
}
