//! Builder for configuring a [`ContentPipeline`].

use std::ops::RangeInclusive;

use crate::error::{GuardError, Result};
use crate::pipeline::ContentPipeline;
use crate::policy::ContentPolicy;
use crate::sanitizer::{Sanitizer, SanitizerPipeline};

/// Field bounds and excerpt settings a built pipeline runs with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Limits {
    pub title: RangeInclusive<usize>,
    pub excerpt_max: usize,
    pub content: RangeInclusive<usize>,
    pub image_path_max: usize,
    pub derive_excerpt: bool,
    pub preview_chars: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            title: 3..=255,
            excerpt_max: 1000,
            content: 10..=100_000,
            image_path_max: 255,
            derive_excerpt: true,
            preview_chars: 197,
        }
    }
}

/// Builder for a [`ContentPipeline`].
///
/// Provides a fluent API for the field length bounds, excerpt derivation, and
/// content pre-filters that run before the whitelist sanitizer. The tag and
/// attribute whitelists themselves are compiled in and not configurable.
///
/// # Example
///
/// ```
/// use article_guard::{ContentPipelineBuilder, RawSubmission};
///
/// let pipeline = ContentPipelineBuilder::new()
///     .title_length(5..=120)
///     .excerpt_max(300)
///     .derive_excerpt(false)
///     .build();
///
/// let raw = RawSubmission::new("Spring campaign", "<p>Posters for every store.</p>", "キャンペーン");
/// let article = pipeline.process(&raw).unwrap();
/// assert_eq!(article.excerpt, None);
/// ```
pub struct ContentPipelineBuilder {
    limits: Limits,
    prefilters: SanitizerPipeline,
}

impl ContentPipelineBuilder {
    /// Create a builder with the default bounds.
    ///
    /// Defaults: title 3-255 characters, excerpt up to 1000, content
    /// 10-100,000, image path up to 255, excerpt derived from content when
    /// missing (197 characters plus `...`), no pre-filters.
    pub fn new() -> Self {
        Self {
            limits: Limits::default(),
            prefilters: SanitizerPipeline::new(),
        }
    }

    /// Permitted title length in characters, after trimming.
    pub fn title_length(mut self, bounds: RangeInclusive<usize>) -> Self {
        self.limits.title = bounds;
        self
    }

    /// Maximum excerpt length in characters.
    pub fn excerpt_max(mut self, max: usize) -> Self {
        self.limits.excerpt_max = max;
        self
    }

    /// Permitted content length in characters, measured before sanitizing.
    pub fn content_length(mut self, bounds: RangeInclusive<usize>) -> Self {
        self.limits.content = bounds;
        self
    }

    pub fn image_path_max(mut self, max: usize) -> Self {
        self.limits.image_path_max = max;
        self
    }

    /// Whether a missing or blank excerpt is filled from the sanitized content.
    pub fn derive_excerpt(mut self, enabled: bool) -> Self {
        self.limits.derive_excerpt = enabled;
        self
    }

    /// Characters kept in a derived excerpt before `...` is appended.
    ///
    /// The result must fit [`excerpt_max`](Self::excerpt_max).
    pub fn preview_chars(mut self, chars: usize) -> Self {
        self.limits.preview_chars = chars;
        self
    }

    /// Append a [`Sanitizer`] run on content before the whitelist sanitizer.
    ///
    /// Pre-filters run in the order they are added, each receiving the output
    /// of the previous one. The whitelist sanitizer always runs last, so a
    /// pre-filter cannot reintroduce disallowed markup.
    pub fn add_prefilter(mut self, sanitizer: impl Sanitizer + 'static) -> Self {
        self.prefilters.add(sanitizer);
        self
    }

    /// Consume the builder and return the pipeline.
    ///
    /// Fails if the compiled-in policy tables are inconsistent or the
    /// configured bounds are empty.
    pub fn try_build(self) -> Result<ContentPipeline> {
        ContentPolicy::global().verify()?;

        let limits = &self.limits;
        if limits.title.is_empty() {
            return Err(config_error(format!(
                "title length bounds {:?} are empty",
                limits.title
            )));
        }
        if limits.content.is_empty() {
            return Err(config_error(format!(
                "content length bounds {:?} are empty",
                limits.content
            )));
        }
        if *limits.content.start() == 0 {
            return Err(config_error(
                "content minimum length must be at least 1".to_string(),
            ));
        }
        if limits.derive_excerpt && limits.preview_chars.saturating_add(3) > limits.excerpt_max {
            return Err(config_error(format!(
                "preview of {} characters plus \"...\" exceeds the excerpt maximum of {}",
                limits.preview_chars, limits.excerpt_max
            )));
        }

        tracing::debug!(
            "Built content pipeline with {} pre-filter(s), limits {:?}",
            self.prefilters.len(),
            self.limits
        );
        Ok(ContentPipeline::new(self.limits, self.prefilters))
    }

    /// Consume the builder and return the pipeline.
    ///
    /// # Panics
    ///
    /// Panics where [`try_build`](Self::try_build) would return an error.
    pub fn build(self) -> ContentPipeline {
        self.try_build()
            .unwrap_or_else(|e| panic!("Invalid content pipeline configuration: {e}"))
    }
}

impl Default for ContentPipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn config_error(message: String) -> GuardError {
    tracing::error!("Invalid content pipeline configuration: {message}");
    GuardError::Config(message)
}
