//! Markdown parser registry with pluggable backends.
//!
//! Every backend implements [`MarkdownParser`] and is registered in a
//! [`ParserRegistry`] under its descriptor id. Two backends ship with the
//! crate:
//!
//! - [`PulldownParser`] (`pulldown-cmark`): pull parser with an in-process HTML writer
//! - [`ComrakParser`] (`comrak`): CommonMark and GFM reference port
//!
//! Parsers expose their extensions through [`MarkdownParser::extensions`] and,
//! when they know which HTML they emit, an [`AllowedHtmlSource`] capability
//! used to build the sanitization allow-list.
//!
//! # Example
//!
//! ```
//! use mdf_parser::{ParserRegistry, ParserSettings};
//!
//! let registry = ParserRegistry::with_builtin_parsers(&ParserSettings::default()).unwrap();
//! let parser = registry.resolve("pulldown-cmark").unwrap();
//! assert_eq!(parser.convert("**bold**"), "<p><strong>bold</strong></p>");
//! ```

mod descriptor;
mod gfm;
mod parser;
mod pulldown;
mod registry;
mod util;

pub use descriptor::{Capabilities, Extension, ExtensionDescriptor, ParserDescriptor};
pub use gfm::{COMRAK_ID, ComrakParser};
pub use parser::{AllowedHtmlSource, ConversionError, MarkdownParser};
pub use pulldown::{PULLDOWN_ID, PulldownParser};
pub use registry::{BUILTIN_PARSERS, ParserRegistry, ParserSettings, RegistryError, builtin_parser};
