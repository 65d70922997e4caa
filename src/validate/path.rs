//! Image reference check: the value must stay under the upload roots or be an
//! absolute http(s) URL, and must name an image file.

use url::Url;

use crate::error::{Violation, ViolationKind};
use crate::policy::{ABSOLUTE_UPLOAD_PREFIXES, IMAGE_EXTENSIONS, IMAGE_PATH_PREFIXES};

const FORBIDDEN_CHARS: [char; 6] = ['<', '>', '"', '|', '*', '?'];

fn structural(message: &str) -> Violation {
    Violation::new(ViolationKind::StructuralViolation, message)
}

/// Accept only image references that cannot escape the storage root.
///
/// Rules run in order and the first failure is reported:
///
/// 1. an empty value means "no image" and passes,
/// 2. no `..` anywhere,
/// 3. no absolute root (`/`, `\`, drive letter) other than the internal
///    upload directories `/image/` and `/uploads/`,
/// 4. an extension, if present, must be an image extension,
/// 5. none of `< > " | * ?`,
/// 6. one of the allowed prefixes,
/// 7. `http://`/`https://` values must parse as a URL with a host.
pub fn validate_image_path(value: &str) -> Result<(), Violation> {
    if value.is_empty() {
        return Ok(());
    }

    if value.contains("..") {
        return Err(structural(
            "The image path contains prohibited path traversal sequences.",
        ));
    }

    if is_absolute(value) {
        return Err(structural("The image path must be a relative path."));
    }

    if let Some(ext) = extension(value) {
        if !IMAGE_EXTENSIONS.iter().any(|e| *e == ext) {
            return Err(structural(
                "The image path must be a valid image file (jpg, jpeg, png, gif, webp, svg).",
            ));
        }
    }

    if value.contains(FORBIDDEN_CHARS) {
        return Err(structural("The image path contains invalid characters."));
    }

    if !IMAGE_PATH_PREFIXES.iter().any(|p| value.starts_with(p)) {
        return Err(structural(
            "The image path must start with a valid path prefix (/image/, /uploads/, or a valid URL).",
        ));
    }

    if is_http(value) && !is_valid_url(value) {
        return Err(structural("The image path must be a valid URL."));
    }

    Ok(())
}

fn is_http(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

fn is_absolute(value: &str) -> bool {
    if value.starts_with('/') {
        return !ABSOLUTE_UPLOAD_PREFIXES.iter().any(|p| value.starts_with(p));
    }
    if value.starts_with('\\') {
        return true;
    }
    // drive letter: `C:\`, `C:/` and drive-relative `C:foo`
    let mut chars = value.chars();
    matches!(
        (chars.next(), chars.next()),
        (Some(drive), Some(':')) if drive.is_ascii_alphabetic()
    )
}

/// Lowercased extension of the last path segment, ignoring a URL's host,
/// query and fragment. `None` when the segment has no extension.
fn extension(value: &str) -> Option<String> {
    let path = match value.split_once("://") {
        Some((_, rest)) if is_http(value) => rest.find('/').map_or("", |i| &rest[i..]),
        _ => value,
    };
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let name = path.rsplit(['/', '\\']).next().unwrap_or_default();
    match name.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => Some(ext.to_ascii_lowercase()),
        _ => None,
    }
}

fn is_valid_url(value: &str) -> bool {
    match Url::parse(value) {
        Ok(url) => url.host_str().is_some_and(|h| !h.is_empty()),
        Err(e) => {
            tracing::debug!("Rejected image URL {value:?}: {e}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(value: &str) -> String {
        validate_image_path(value).unwrap_err().message
    }

    #[test]
    fn empty_means_no_image() {
        assert!(validate_image_path("").is_ok());
    }

    #[test]
    fn accepted_paths() {
        for path in [
            "/uploads/banner.png",
            "uploads/2024/05/banner.JPG",
            "/image/hero.webp",
            "image/logo.svg",
            "https://cdn.example.com/img/photo.jpeg",
            "http://example.com/a.gif",
            "https://example.com/images/no-extension",
            "https://example.com",
        ] {
            assert!(validate_image_path(path).is_ok(), "{path} should pass");
        }
    }

    #[test]
    fn traversal_is_structural() {
        let err = validate_image_path("../../etc/passwd.png").unwrap_err();
        assert_eq!(err.kind, ViolationKind::StructuralViolation);
        assert_eq!(
            err.message,
            "The image path contains prohibited path traversal sequences."
        );
        assert!(validate_image_path("uploads/..png").is_err());
        assert!(validate_image_path("https://example.com/../a.png").is_err());
    }

    #[test]
    fn absolute_roots_outside_upload_dirs() {
        assert_eq!(message("/etc/shadow.png"), "The image path must be a relative path.");
        assert_eq!(message("//evil.example/a.png"), "The image path must be a relative path.");
        assert_eq!(message("\\\\server\\share\\a.png"), "The image path must be a relative path.");
        assert_eq!(message("C:\\images\\a.png"), "The image path must be a relative path.");
        assert_eq!(message("c:/images/a.png"), "The image path must be a relative path.");
    }

    #[test]
    fn extension_must_be_an_image() {
        let expected = "The image path must be a valid image file (jpg, jpeg, png, gif, webp, svg).";
        assert_eq!(message("uploads/shell.php"), expected);
        assert_eq!(message("uploads/page.html"), expected);
        assert_eq!(message("https://example.com/x.exe"), expected);
        assert_eq!(message("uploads/.htaccess"), expected);
    }

    #[test]
    fn url_host_is_not_an_extension() {
        assert_eq!(extension("https://example.com"), None);
        assert_eq!(extension("https://example.com/a/b.PNG#top"), Some("png".into()));
        assert_eq!(extension("uploads/a.tar.gz"), Some("gz".into()));
        assert_eq!(extension("uploads/file."), None);
    }

    #[test]
    fn forbidden_characters() {
        assert_eq!(message("uploads/a<b.png"), "The image path contains invalid characters.");
        assert_eq!(message("uploads/a|b.png"), "The image path contains invalid characters.");
        assert_eq!(message("uploads/*.png"), "The image path contains invalid characters.");
        // the query is not part of the extension, so the `?` rule reports it
        assert_eq!(
            message("https://example.com/a.png?x=1"),
            "The image path contains invalid characters."
        );
    }

    #[test]
    fn prefix_required() {
        let expected =
            "The image path must start with a valid path prefix (/image/, /uploads/, or a valid URL).";
        assert_eq!(message("static/a.png"), expected);
        assert_eq!(message("a.png"), expected);
        assert_eq!(message("ftp://example.com/a.png"), expected);
        assert_eq!(message("HTTPS://example.com/a.png"), expected);
    }

    #[test]
    fn url_must_have_a_host() {
        assert_eq!(message("http://"), "The image path must be a valid URL.");
        assert_eq!(message("https:// /a.png"), "The image path must be a valid URL.");
    }
}
