//! Registry of markdown parser backends.

use std::collections::HashMap;
use std::sync::Arc;

use crate::descriptor::ParserDescriptor;
use crate::gfm::{COMRAK_ID, ComrakParser};
use crate::parser::MarkdownParser;
use crate::pulldown::{PULLDOWN_ID, PulldownParser};

/// Ids of the parsers shipped with this crate.
pub const BUILTIN_PARSERS: &[&str] = &[PULLDOWN_ID, COMRAK_ID];

/// Construction settings for a built-in parser.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParserSettings {
    /// Explicit extension selection. `None` keeps each extension's default.
    pub extensions: Option<Vec<String>>,
    /// Weight override for the descriptor.
    pub weight: Option<i32>,
    /// Maximum accepted input size in bytes.
    pub max_input_bytes: Option<usize>,
}

/// Registry error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// A parser with this id is already registered.
    #[error("parser already registered: {0}")]
    DuplicateId(String),
    /// No parser with this id is registered.
    #[error("unknown parser: {0}")]
    UnknownParser(String),
    /// A parser was configured with an extension it does not have.
    #[error("parser {parser} has no extension named {extension}")]
    UnknownExtension {
        /// Parser id.
        parser: String,
        /// Requested extension id.
        extension: String,
    },
}

/// Construct a built-in parser by id.
///
/// # Errors
///
/// Returns `RegistryError::UnknownParser` if `id` is not built in, or
/// `RegistryError::UnknownExtension` if the settings select an unknown extension.
pub fn builtin_parser(
    id: &str,
    settings: &ParserSettings,
) -> Result<Arc<dyn MarkdownParser>, RegistryError> {
    match id {
        PULLDOWN_ID => Ok(Arc::new(PulldownParser::new(settings)?)),
        COMRAK_ID => Ok(Arc::new(ComrakParser::new(settings)?)),
        _ => Err(RegistryError::UnknownParser(id.to_owned())),
    }
}

/// Parsers keyed by id.
///
/// Populated once at startup and read-only afterwards; parsers are shared
/// through `Arc` so lookups can hand them out across threads.
#[derive(Default)]
pub struct ParserRegistry {
    parsers: HashMap<String, Arc<dyn MarkdownParser>>,
}

impl ParserRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding every built-in parser with the same settings.
    ///
    /// # Errors
    ///
    /// Returns an error if a built-in parser rejects the settings.
    pub fn with_builtin_parsers(settings: &ParserSettings) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for id in BUILTIN_PARSERS {
            registry.register(builtin_parser(id, settings)?)?;
        }
        Ok(registry)
    }

    /// Register a parser under its descriptor id.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::DuplicateId` if the id is taken.
    pub fn register(&mut self, parser: Arc<dyn MarkdownParser>) -> Result<(), RegistryError> {
        let id = parser.descriptor().id.clone();
        if self.parsers.contains_key(&id) {
            return Err(RegistryError::DuplicateId(id));
        }
        tracing::debug!(parser = %id, weight = parser.descriptor().weight, "Registered parser");
        self.parsers.insert(id, parser);
        Ok(())
    }

    /// Look up a parser by id.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::UnknownParser` if no parser has this id.
    pub fn resolve(&self, id: &str) -> Result<Arc<dyn MarkdownParser>, RegistryError> {
        self.parsers
            .get(id)
            .cloned()
            .ok_or_else(|| RegistryError::UnknownParser(id.to_owned()))
    }

    /// Parsers ordered by weight, then id.
    pub fn parsers(&self) -> Vec<&dyn MarkdownParser> {
        let mut parsers: Vec<&dyn MarkdownParser> =
            self.parsers.values().map(|p| p.as_ref()).collect();
        parsers.sort_by(|a, b| {
            let (a, b) = (a.descriptor(), b.descriptor());
            a.weight.cmp(&b.weight).then_with(|| a.id.cmp(&b.id))
        });
        parsers
    }

    /// Descriptors ordered by weight, then id.
    pub fn list(&self) -> Vec<&ParserDescriptor> {
        self.parsers().into_iter().map(|p| p.descriptor()).collect()
    }

    /// The first parser in list order.
    pub fn default_parser(&self) -> Option<Arc<dyn MarkdownParser>> {
        let id = self.list().first().map(|d| d.id.clone())?;
        self.parsers.get(&id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.parsers.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.parsers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parsers.is_empty()
    }
}
