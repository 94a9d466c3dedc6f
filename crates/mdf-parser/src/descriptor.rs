//! Parser and extension descriptors.

use std::fmt;
use std::ops::BitOr;

use mdf_sanitize::AllowedHtml;

/// Capability flags advertised by a parser.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Capabilities(u8);

impl Capabilities {
    /// No optional capabilities.
    pub const NONE: Self = Self(0);
    /// Parser contributes its own allowed-HTML spec.
    pub const ALLOWED_HTML: Self = Self(1);
    /// Parser has configurable extensions.
    pub const EXTENSIONS: Self = Self(1 << 1);

    /// Check whether all flags in `other` are set.
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Names of the set flags.
    pub fn names(self) -> Vec<&'static str> {
        [(Self::ALLOWED_HTML, "allowed_html"), (Self::EXTENSIONS, "extensions")]
            .into_iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| name)
            .collect()
    }
}

impl BitOr for Capabilities {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Capabilities {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.names())
    }
}

impl fmt::Display for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.names().join(", "))
    }
}

/// Identity and metadata of a registered parser.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ParserDescriptor {
    /// Unique parser id used for lookup.
    pub id: String,
    /// Human-readable name.
    pub label: String,
    /// Short description.
    pub description: String,
    /// Ordering priority; lower weights sort first.
    pub weight: i32,
    /// Optional capabilities.
    pub capabilities: Capabilities,
    /// Backend library name.
    pub library: String,
    /// Backend library version, used for version constraint checks.
    pub library_version: String,
}

impl ParserDescriptor {
    /// Create a descriptor with no capabilities and no backend library.
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            description: String::new(),
            weight: 0,
            capabilities: Capabilities::NONE,
            library: String::new(),
            library_version: String::new(),
        }
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the weight.
    #[must_use]
    pub fn with_weight(mut self, weight: i32) -> Self {
        self.weight = weight;
        self
    }

    /// Set the capability flags.
    #[must_use]
    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Set the backend library name and version.
    #[must_use]
    pub fn with_library(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.library = name.into();
        self.library_version = version.into();
        self
    }
}

/// Identity and metadata of a parser extension.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ExtensionDescriptor {
    /// Extension id, unique within its parser.
    pub id: &'static str,
    /// Human-readable name.
    pub label: &'static str,
    /// Short description.
    pub description: &'static str,
    /// Ordering priority; lower weights sort first.
    pub weight: i32,
    /// Whether the extension is on when no explicit selection is configured.
    pub enabled_by_default: bool,
}

/// An extension of a constructed parser, with its resolved state.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Extension {
    /// Extension metadata.
    pub descriptor: ExtensionDescriptor,
    /// Whether the extension is active for this parser.
    pub enabled: bool,
    /// HTML the extension emits when enabled.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub allowed_html: AllowedHtml,
}

/// Static definition used by backends to build their extension list.
pub(crate) struct ExtensionDef {
    pub(crate) descriptor: ExtensionDescriptor,
    pub(crate) allowed_html: fn() -> AllowedHtml,
}

/// Resolve extension definitions against an optional explicit selection.
///
/// With `selection == None` each extension keeps its default; otherwise
/// exactly the listed extensions are enabled. The result is ordered by weight,
/// then id. Returns the first unknown id on failure.
pub(crate) fn resolve_extensions(
    defs: &[ExtensionDef],
    selection: Option<&[String]>,
) -> Result<Vec<Extension>, String> {
    if let Some(selected) = selection
        && let Some(unknown) = selected
            .iter()
            .find(|id| !defs.iter().any(|def| def.descriptor.id == id.as_str()))
    {
        return Err(unknown.clone());
    }

    let mut extensions: Vec<Extension> = defs
        .iter()
        .map(|def| Extension {
            descriptor: def.descriptor.clone(),
            enabled: selection.map_or(def.descriptor.enabled_by_default, |selected| {
                selected.iter().any(|id| id == def.descriptor.id)
            }),
            allowed_html: (def.allowed_html)(),
        })
        .collect();
    extensions.sort_by(|a, b| {
        a.descriptor
            .weight
            .cmp(&b.descriptor.weight)
            .then_with(|| a.descriptor.id.cmp(b.descriptor.id))
    });
    Ok(extensions)
}
