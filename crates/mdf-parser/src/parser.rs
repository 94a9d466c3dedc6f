//! The markdown parser capability.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use mdf_sanitize::AllowedHtml;

use crate::descriptor::{Extension, ParserDescriptor};

/// Error raised by a backend during conversion.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConversionError {
    /// Input exceeds the configured size limit.
    #[error("input of {size} bytes exceeds the {limit} byte limit")]
    InputTooLarge {
        /// Input size in bytes.
        size: usize,
        /// Configured limit in bytes.
        limit: usize,
    },
    /// The backend failed internally.
    #[error("backend failure: {0}")]
    Backend(String),
}

/// Optional capability: a parser that knows which HTML it emits.
pub trait AllowedHtmlSource {
    /// HTML the parser emits beyond the global default, including enabled extensions.
    fn allowed_html(&self) -> AllowedHtml;
}

/// A markdown-to-HTML backend.
///
/// Implementations are immutable once constructed and hold no state between
/// calls: the same input always produces the same output.
pub trait MarkdownParser: Send + Sync {
    /// Parser identity and metadata.
    fn descriptor(&self) -> &ParserDescriptor;

    /// Extensions of this parser, ordered by weight then id.
    fn extensions(&self) -> &[Extension] {
        &[]
    }

    /// Look up an extension by id.
    fn extension(&self, id: &str) -> Option<&Extension> {
        self.extensions().iter().find(|ext| ext.descriptor.id == id)
    }

    /// Convert markdown to HTML, reporting backend failures.
    ///
    /// Markdown has no syntax errors; failures come from the backend itself
    /// or from configured input limits.
    fn try_convert(&self, markdown: &str) -> Result<String, ConversionError>;

    /// Convert markdown to HTML, degrading any failure to an empty string.
    fn convert(&self, markdown: &str) -> String {
        self.try_convert(markdown).unwrap_or_else(|e| {
            tracing::warn!(parser = %self.descriptor().id, error = %e, "Markdown conversion failed");
            String::new()
        })
    }

    /// The allowed-HTML capability, if this parser has it.
    fn allowed_html(&self) -> Option<&dyn AllowedHtmlSource> {
        None
    }
}

/// Run a backend conversion with the input limit and panic isolation applied.
pub(crate) fn guarded_convert<F>(
    markdown: &str,
    limit: Option<usize>,
    convert: F,
) -> Result<String, ConversionError>
where
    F: FnOnce() -> String,
{
    if let Some(limit) = limit
        && markdown.len() > limit
    {
        return Err(ConversionError::InputTooLarge {
            size: markdown.len(),
            limit,
        });
    }

    panic::catch_unwind(AssertUnwindSafe(convert))
        .map_err(|payload| ConversionError::Backend(panic_message(payload.as_ref())))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "backend panicked".to_owned()
    }
}

/// Union of the HTML emitted by the enabled extensions.
pub(crate) fn enabled_extensions_html(extensions: &[Extension]) -> AllowedHtml {
    AllowedHtml::union(
        extensions
            .iter()
            .filter(|ext| ext.enabled)
            .map(|ext| &ext.allowed_html),
    )
}
