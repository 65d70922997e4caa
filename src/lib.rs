//! # article_guard
//!
//! A security gate for user-submitted articles whose HTML body is later
//! rendered unescaped.
//!
//! ## Overview
//!
//! `article_guard` takes an untrusted [`RawSubmission`] (title, excerpt, HTML
//! content, category label, image path) and either returns a
//! [`SanitizedArticle`] that is safe to persist and render, or a
//! [`ValidationFailure`] listing every field that failed and why.
//!
//! The pieces can also be used on their own:
//!
//! - [`guard::check`] rejects known injection payloads in free text.
//! - [`HtmlSanitizer`] keeps only whitelisted tags and attributes.
//! - [`validate_category`], [`validate_image_path`] and
//!   [`validate_search_query`] check single fields.
//!
//! ## Quick start
//!
//! ```rust
//! use article_guard::{ContentPipeline, Field, RawSubmission};
//!
//! let pipeline = ContentPipeline::builder().build();
//!
//! let raw = RawSubmission::new(
//!     "新商品のご案内",
//!     r#"<div class="promo"><p>Spring <b>posters</b> for <a href="/stores" style="color:red">every store</a></p></div>"#,
//!     "すべて",
//! )
//! .with_image_path("/uploads/banner.png");
//!
//! let article = pipeline.process(&raw).unwrap();
//! assert_eq!(
//!     article.content,
//!     r#"<p>Spring posters for <a href="/stores">every store</a></p>"#
//! );
//!
//! let bad = RawSubmission::new("<img src=x onerror=alert(1)>", "<p>body text</p>", "店頭<script>");
//! let failure = pipeline.process(&bad).unwrap_err();
//! assert!(failure.contains(Field::Title));
//! assert!(failure.contains(Field::Category));
//! ```
//!
//! ## Feature flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `serde` | **yes** | `Deserialize` for [`RawSubmission`], `Serialize` for results and failures, and [`ContentPipeline::process_json`]. |

pub mod config;
pub mod error;
pub mod guard;
pub mod pipeline;
pub mod policy;
pub mod sanitizer;
pub mod submission;
pub mod validate;

pub use config::ContentPipelineBuilder;
pub use error::{GuardError, Result, ValidationFailure, Violation, ViolationKind};
pub use guard::PatternViolation;
pub use pipeline::ContentPipeline;
pub use policy::{ContentPolicy, category_key};
pub use sanitizer::{HtmlSanitizer, Sanitizer, SanitizerPipeline, TagStripper, preview};
pub use submission::{Field, RawSubmission, SanitizedArticle};
pub use validate::{validate_category, validate_image_path, validate_search_query};

use std::sync::OnceLock;

// Global state for the optional singleton pattern
static GLOBAL: OnceLock<ContentPipeline> = OnceLock::new();

/// Initialize the global [`ContentPipeline`] singleton.
///
/// Call once at application startup. Afterwards any part of the application
/// can obtain the pipeline via [`global()`].
///
/// # Panics
///
/// Panics if called more than once, or if the builder configuration is
/// invalid (see [`ContentPipelineBuilder::try_build`]).
pub fn init(builder: ContentPipelineBuilder) -> &'static ContentPipeline {
    let pipeline = builder.build();

    if GLOBAL.set(pipeline).is_err() {
        panic!("Global ContentPipeline already initialized");
    }
    tracing::info!("Installed global content pipeline");

    global().unwrap_or_else(|| unreachable!("global pipeline was just set"))
}

/// Retrieve the global [`ContentPipeline`] previously registered with [`init()`].
///
/// Returns `None` if [`init()`] has not been called.
pub fn global() -> Option<&'static ContentPipeline> {
    GLOBAL.get()
}
