//! Stateless field validators.
//!
//! Each validator checks one semantic field against a closed vocabulary or a
//! structural rule set and reports the first failing rule.
//!
//! - [`validate_category`] -- closed category vocabulary.
//! - [`validate_image_path`] -- image references that stay inside the upload roots.
//! - [`validate_search_query`] -- listing search keywords.
//! - [`check_length`] -- shared character-count bounds.

mod category;
mod path;
mod search;

use std::ops::RangeInclusive;

pub use category::validate_category;
pub use path::validate_image_path;
pub use search::validate_search_query;

use crate::error::{Violation, ViolationKind};
use crate::submission::Field;

/// Check that `value` has a character count inside `bounds`.
///
/// Counts Unicode scalar values, not bytes, so a Japanese title is measured
/// the way a user reads it.
pub fn check_length(field: Field, value: &str, bounds: RangeInclusive<usize>) -> Result<(), Violation> {
    let len = value.chars().count();
    if len < *bounds.start() {
        return Err(Violation::new(
            ViolationKind::LengthViolation,
            format!(
                "The {} must be at least {} characters.",
                field.label(),
                bounds.start()
            ),
        ));
    }
    if len > *bounds.end() {
        return Err(Violation::new(
            ViolationKind::LengthViolation,
            format!(
                "The {} must not be greater than {} characters.",
                field.label(),
                bounds.end()
            ),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_within_bounds() {
        assert!(check_length(Field::Title, "abc", 3..=255).is_ok());
        assert!(check_length(Field::Title, &"x".repeat(255), 3..=255).is_ok());
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        // 3 characters, 9 bytes
        assert!(check_length(Field::Title, "新商品", 3..=3).is_ok());
    }

    #[test]
    fn too_short_and_too_long() {
        let short = check_length(Field::Title, "ab", 3..=255).unwrap_err();
        assert_eq!(short.kind, ViolationKind::LengthViolation);
        assert_eq!(short.message, "The title must be at least 3 characters.");

        let long = check_length(Field::ImagePath, &"a".repeat(256), 0..=255).unwrap_err();
        assert_eq!(
            long.message,
            "The image path must not be greater than 255 characters."
        );
    }
}
