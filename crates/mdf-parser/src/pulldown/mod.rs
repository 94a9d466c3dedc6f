//! In-process parser backed by `pulldown-cmark`.

mod state;
mod writer;

use mdf_sanitize::AllowedHtml;
use pulldown_cmark::{Options, Parser};

use crate::descriptor::{
    Capabilities, Extension, ExtensionDef, ExtensionDescriptor, ParserDescriptor,
    resolve_extensions,
};
use crate::parser::{
    AllowedHtmlSource, ConversionError, MarkdownParser, enabled_extensions_html, guarded_convert,
};
use crate::registry::{ParserSettings, RegistryError};
use writer::HtmlWriter;

/// Parser id of the pulldown-cmark backend.
pub const PULLDOWN_ID: &str = "pulldown-cmark";

/// Version of the linked pulldown-cmark crate. Kept in step with the pinned
/// workspace dependency.
const LIBRARY_VERSION: &str = "0.13.4";

const EXTENSIONS: &[ExtensionDef] = &[
    ExtensionDef {
        descriptor: ExtensionDescriptor {
            id: "table",
            label: "Tables",
            description: "GitHub-style pipe tables.",
            weight: 0,
            enabled_by_default: true,
        },
        allowed_html: table_html,
    },
    ExtensionDef {
        descriptor: ExtensionDescriptor {
            id: "strikethrough",
            label: "Strikethrough",
            description: "~~Deleted~~ text.",
            weight: 10,
            enabled_by_default: true,
        },
        allowed_html: strikethrough_html,
    },
    ExtensionDef {
        descriptor: ExtensionDescriptor {
            id: "tasklist",
            label: "Task lists",
            description: "- [x] checkbox list items.",
            weight: 20,
            enabled_by_default: true,
        },
        allowed_html: tasklist_html,
    },
    ExtensionDef {
        descriptor: ExtensionDescriptor {
            id: "footnotes",
            label: "Footnotes",
            description: "[^label] references and definitions.",
            weight: 30,
            enabled_by_default: true,
        },
        allowed_html: footnotes_html,
    },
    ExtensionDef {
        descriptor: ExtensionDescriptor {
            id: "smart_punctuation",
            label: "Smart punctuation",
            description: "Curly quotes, dashes and ellipses.",
            weight: 40,
            enabled_by_default: false,
        },
        allowed_html: AllowedHtml::new,
    },
    ExtensionDef {
        descriptor: ExtensionDescriptor {
            id: "heading_attributes",
            label: "Heading attributes",
            description: "{#id .class} suffixes on headings.",
            weight: 50,
            enabled_by_default: false,
        },
        allowed_html: AllowedHtml::new,
    },
    ExtensionDef {
        descriptor: ExtensionDescriptor {
            id: "definition_list",
            label: "Definition lists",
            description: "Term / definition lists.",
            weight: 60,
            enabled_by_default: false,
        },
        allowed_html: definition_list_html,
    },
];

pub(crate) fn table_html() -> AllowedHtml {
    AllowedHtml::new()
        .with_tag("table", &[])
        .with_tag("thead", &[])
        .with_tag("tbody", &[])
        .with_tag("tr", &[])
        .with_values("th", "align", &["left", "center", "right"])
        .with_values("td", "align", &["left", "center", "right"])
}

pub(crate) fn strikethrough_html() -> AllowedHtml {
    AllowedHtml::new().with_tag("del", &[])
}

pub(crate) fn tasklist_html() -> AllowedHtml {
    AllowedHtml::new()
        .with_tag("input", &["checked", "disabled"])
        .with_values("input", "type", &["checkbox"])
}

fn footnotes_html() -> AllowedHtml {
    AllowedHtml::new().with_tag("sup", &[]).with_tag("div", &[])
}

pub(crate) fn definition_list_html() -> AllowedHtml {
    AllowedHtml::new()
        .with_tag("dl", &[])
        .with_tag("dt", &[])
        .with_tag("dd", &[])
}

/// Markdown parser using pulldown-cmark with the workspace HTML writer.
pub struct PulldownParser {
    descriptor: ParserDescriptor,
    extensions: Vec<Extension>,
    options: Options,
    max_input_bytes: Option<usize>,
}

impl PulldownParser {
    /// Create the parser with the given settings.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::UnknownExtension` if the settings select an
    /// extension this parser does not have.
    pub fn new(settings: &ParserSettings) -> Result<Self, RegistryError> {
        let extensions = resolve_extensions(EXTENSIONS, settings.extensions.as_deref())
            .map_err(|extension| RegistryError::UnknownExtension {
                parser: PULLDOWN_ID.to_owned(),
                extension,
            })?;

        let options = extensions
            .iter()
            .filter(|ext| ext.enabled)
            .fold(Options::empty(), |options, ext| {
                options | extension_option(ext.descriptor.id)
            });

        let descriptor = ParserDescriptor::new(PULLDOWN_ID, "pulldown-cmark")
            .with_description("Fast pull parser for CommonMark, rendered in-process.")
            .with_weight(settings.weight.unwrap_or(0))
            .with_capabilities(Capabilities::ALLOWED_HTML | Capabilities::EXTENSIONS)
            .with_library("pulldown-cmark", LIBRARY_VERSION);

        Ok(Self {
            descriptor,
            extensions,
            options,
            max_input_bytes: settings.max_input_bytes,
        })
    }

    /// The pulldown-cmark options derived from enabled extensions.
    pub fn options(&self) -> Options {
        self.options
    }
}

fn extension_option(id: &str) -> Options {
    match id {
        "table" => Options::ENABLE_TABLES,
        "strikethrough" => Options::ENABLE_STRIKETHROUGH,
        "tasklist" => Options::ENABLE_TASKLISTS,
        "footnotes" => Options::ENABLE_FOOTNOTES,
        "smart_punctuation" => Options::ENABLE_SMART_PUNCTUATION,
        "heading_attributes" => Options::ENABLE_HEADING_ATTRIBUTES,
        "definition_list" => Options::ENABLE_DEFINITION_LIST,
        _ => Options::empty(),
    }
}

impl MarkdownParser for PulldownParser {
    fn descriptor(&self) -> &ParserDescriptor {
        &self.descriptor
    }

    fn extensions(&self) -> &[Extension] {
        &self.extensions
    }

    fn try_convert(&self, markdown: &str) -> Result<String, ConversionError> {
        guarded_convert(markdown, self.max_input_bytes, || {
            HtmlWriter::new().render(Parser::new_ext(markdown, self.options))
        })
    }

    fn allowed_html(&self) -> Option<&dyn AllowedHtmlSource> {
        Some(self)
    }
}

impl AllowedHtmlSource for PulldownParser {
    fn allowed_html(&self) -> AllowedHtml {
        enabled_extensions_html(&self.extensions)
    }
}
