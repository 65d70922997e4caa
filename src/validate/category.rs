//! Closed-vocabulary category check.

use crate::error::{Violation, ViolationKind};
use crate::policy::CATEGORY_VOCABULARY;

const MAX_CATEGORY_CHARS: usize = 50;

/// Accept only labels from [`CATEGORY_VOCABULARY`].
///
/// The value is trimmed, then checked in a fixed order: membership (exact,
/// case-sensitive), length, character set. The first failure is reported, so
/// a long non-member gets the membership message rather than the length one.
/// On success the canonical vocabulary entry is returned.
pub fn validate_category(value: &str) -> Result<&'static str, Violation> {
    let normalized = value.trim();

    let Some(entry) = CATEGORY_VOCABULARY
        .iter()
        .copied()
        .find(|c| *c == normalized) else {
        return Err(Violation::new(
            ViolationKind::VocabularyViolation,
            format!(
                "The category must be one of the following: {}",
                CATEGORY_VOCABULARY.join(", ")
            ),
        ));
    };

    if normalized.chars().count() > MAX_CATEGORY_CHARS {
        return Err(Violation::new(
            ViolationKind::LengthViolation,
            format!("The category must not exceed {MAX_CATEGORY_CHARS} characters."),
        ));
    }

    if normalized.contains(['<', '>', '"', '\'']) {
        return Err(Violation::new(
            ViolationKind::PatternViolation,
            "The category contains invalid characters.",
        ));
    }

    Ok(entry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_vocabulary_entry_passes() {
        for label in CATEGORY_VOCABULARY {
            assert_eq!(validate_category(label), Ok(*label));
        }
    }

    #[test]
    fn sentinel_values_pass() {
        assert_eq!(validate_category("すべて"), Ok("すべて"));
        assert_eq!(validate_category("all"), Ok("all"));
    }

    #[test]
    fn surrounding_whitespace_is_trimmed() {
        assert_eq!(validate_category("  デザイン\n"), Ok("デザイン"));
    }

    #[test]
    fn membership_is_case_sensitive() {
        let err = validate_category("ALL").unwrap_err();
        assert_eq!(err.kind, ViolationKind::VocabularyViolation);
    }

    #[test]
    fn markup_in_category_is_a_vocabulary_violation() {
        let err = validate_category("店頭<script>").unwrap_err();
        assert_eq!(err.kind, ViolationKind::VocabularyViolation);
        assert!(err.message.starts_with("The category must be one of the following: 店頭販促, "));
    }

    #[test]
    fn long_non_member_reports_membership_first() {
        let err = validate_category(&"a".repeat(10_000)).unwrap_err();
        assert_eq!(err.kind, ViolationKind::VocabularyViolation);
    }

    #[test]
    fn empty_category_is_rejected() {
        assert!(validate_category("").is_err());
        assert!(validate_category("   ").is_err());
    }

    #[test]
    fn near_misses_are_rejected() {
        for candidate in ["デザイン ", "デザ イン", "design", "すべて\u{200b}"] {
            // trailing ASCII space is trimmed; the others are not members
            let trimmed_member = candidate.trim() == "デザイン";
            assert_eq!(validate_category(candidate).is_ok(), trimmed_member, "{candidate:?}");
        }
    }
}
