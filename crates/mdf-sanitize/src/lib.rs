//! Allow-listed HTML sanitization for rendered markdown.
//!
//! This crate provides the [`AllowedHtml`] allow-list model and a
//! [`sanitize`] function that strips everything the allow-list does not
//! permit.
//!
//! Allow-lists from several sources are combined with [`AllowedHtml::merge`]
//! using a most-permissive union, so a tag or attribute allowed by any
//! source is allowed in the result.
//!
//! # Example
//!
//! ```
//! use mdf_sanitize::{AllowedHtml, sanitize};
//!
//! let allowed: AllowedHtml = "<p> <a href>".parse().unwrap();
//! let html = sanitize(r#"<p onclick="x()"><a href="/docs" target="_blank">Docs</a></p>"#, &allowed);
//! assert_eq!(html, r#"<p><a href="/docs">Docs</a></p>"#);
//! ```

mod clean;
mod defaults;
mod spec;
mod syntax;

pub use clean::sanitize;
pub use defaults::{DROP_ENTIRELY, URL_SCHEMES, global_default};
pub use spec::{AllowedHtml, AttributeRule, WILDCARD};
pub use syntax::AllowedHtmlParseError;
