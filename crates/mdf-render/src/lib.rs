//! Markdown rendering with allow-listed HTML output.
//!
//! [`RenderService`] ties the pieces together: it resolves a parser from the
//! [`ParserRegistry`](mdf_parser::ParserRegistry), converts markdown to HTML,
//! merges the allowed HTML for that parser and theme through the
//! [`AllowedHtmlPolicy`], and sanitizes the output.
//!
//! ```
//! use mdf_config::Config;
//! use mdf_render::RenderService;
//!
//! let service = RenderService::from_config(&Config::default()).unwrap();
//! let html = service.render("**bold**<script>x()</script>", "pulldown-cmark", None).unwrap();
//! assert_eq!(html, "<p><strong>bold</strong></p>");
//! ```
//!
//! Host integrations build on the service: [`PluginConverter`] resolves
//! string ids to plugins and [`MarkdownFilter`] is the `markdown` template
//! filter.

mod converter;
mod filter;
mod policy;
mod service;

pub use converter::{
    Converted, PluginConverter, ResolvedPlugin, TYPE_ALLOWED_HTML, TYPE_EXTENSION, TYPE_PARSER,
};
pub use filter::MarkdownFilter;
pub use policy::AllowedHtmlPolicy;
pub use service::{ConvertedDocument, FailurePolicy, RenderError, RenderOptions, RenderService};
