//! The `markdown` template filter.

use std::sync::Arc;

use crate::service::{RenderError, RenderService};

/// Template filter rendering markdown with the shared [`RenderService`].
#[derive(Clone)]
pub struct MarkdownFilter {
    service: Arc<RenderService>,
}

impl MarkdownFilter {
    /// Name the filter is registered under.
    pub const NAME: &'static str = "markdown";

    pub fn new(service: Arc<RenderService>) -> Self {
        Self { service }
    }

    pub fn name(&self) -> &'static str {
        Self::NAME
    }

    /// Render `text` with `parser`, or the default parser, under the configured theme.
    ///
    /// # Errors
    ///
    /// Returns an error if the parser is unknown or conversion fails under
    /// the error failure policy.
    pub fn apply(&self, text: &str, parser: Option<&str>) -> Result<String, RenderError> {
        self.service
            .render_document(text, parser, None)
            .map(|document| document.html)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdf_config::Config;
    use pretty_assertions::assert_eq;

    fn filter() -> MarkdownFilter {
        let config = Config {
            default_parser: Some("pulldown-cmark".to_owned()),
            ..Config::default()
        };
        MarkdownFilter::new(Arc::new(RenderService::from_config(&config).unwrap()))
    }

    #[test]
    fn test_name() {
        assert_eq!(filter().name(), "markdown");
    }

    #[test]
    fn test_apply_default_parser() {
        assert_eq!(
            filter().apply("*hi* <b onclick=\"x()\">there</b>", None).unwrap(),
            "<p><em>hi</em> there</p>"
        );
    }

    #[test]
    fn test_apply_named_parser() {
        assert_eq!(
            filter().apply("**bold**", Some("comrak")).unwrap(),
            "<p><strong>bold</strong></p>\n"
        );
    }

    #[test]
    fn test_apply_unknown_parser() {
        assert!(filter().apply("x", Some("markdown-it")).is_err());
    }
}
