//! CommonMark/GFM reference parser backed by `comrak`.

use mdf_sanitize::AllowedHtml;

use crate::descriptor::{
    Capabilities, Extension, ExtensionDef, ExtensionDescriptor, ParserDescriptor,
    resolve_extensions,
};
use crate::parser::{
    AllowedHtmlSource, ConversionError, MarkdownParser, enabled_extensions_html, guarded_convert,
};
use crate::pulldown::{definition_list_html, strikethrough_html, table_html, tasklist_html};
use crate::registry::{ParserSettings, RegistryError};

/// Parser id of the comrak backend.
pub const COMRAK_ID: &str = "comrak";

/// Version of the linked comrak crate. Kept in step with the pinned workspace
/// dependency.
const LIBRARY_VERSION: &str = "0.29.0";

/// Prefix for generated heading anchors.
const HEADER_ID_PREFIX: &str = "";

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
            id: "autolink",
            label: "Autolinks",
            description: "Bare URLs and emails become links.",
            weight: 30,
            enabled_by_default: true,
        },
        allowed_html: AllowedHtml::new,
    },
    ExtensionDef {
        descriptor: ExtensionDescriptor {
            id: "footnotes",
            label: "Footnotes",
            description: "[^label] references and a footnote section.",
            weight: 40,
            enabled_by_default: false,
        },
        allowed_html: footnotes_html,
    },
    ExtensionDef {
        descriptor: ExtensionDescriptor {
            id: "superscript",
            label: "Superscript",
            description: "^superscript^ text.",
            weight: 50,
            enabled_by_default: false,
        },
        allowed_html: superscript_html,
    },
    ExtensionDef {
        descriptor: ExtensionDescriptor {
            id: "description_lists",
            label: "Description lists",
            description: "Term / definition lists.",
            weight: 60,
            enabled_by_default: false,
        },
        allowed_html: definition_list_html,
    },
    ExtensionDef {
        descriptor: ExtensionDescriptor {
            id: "tagfilter",
            label: "Tag filter",
            description: "Escapes GFM-disallowed raw HTML tags such as <script>.",
            weight: 70,
            enabled_by_default: true,
        },
        allowed_html: AllowedHtml::new,
    },
    ExtensionDef {
        descriptor: ExtensionDescriptor {
            id: "header_ids",
            label: "Heading anchors",
            description: "Anchor links with generated ids inside headings.",
            weight: 80,
            enabled_by_default: false,
        },
        allowed_html: AllowedHtml::new,
    },
];

fn footnotes_html() -> AllowedHtml {
    AllowedHtml::new()
        .with_tag("sup", &[])
        .with_tag("section", &["data-footnotes"])
        .with_tag("a", &["data-footnote*"])
}

fn superscript_html() -> AllowedHtml {
    AllowedHtml::new().with_tag("sup", &[])
}

/// Markdown parser using comrak, a port of the GFM reference implementation.
pub struct ComrakParser {
    descriptor: ParserDescriptor,
    extensions: Vec<Extension>,
    max_input_bytes: Option<usize>,
}

impl ComrakParser {
    /// Create the parser with the given settings.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::UnknownExtension` if the settings select an
    /// extension this parser does not have.
    pub fn new(settings: &ParserSettings) -> Result<Self, RegistryError> {
        let extensions = resolve_extensions(EXTENSIONS, settings.extensions.as_deref())
            .map_err(|extension| RegistryError::UnknownExtension {
                parser: COMRAK_ID.to_owned(),
                extension,
            })?;

        let descriptor = ParserDescriptor::new(COMRAK_ID, "comrak")
            .with_description("CommonMark and GitHub Flavored Markdown reference parser.")
            .with_weight(settings.weight.unwrap_or(10))
            .with_capabilities(Capabilities::ALLOWED_HTML | Capabilities::EXTENSIONS)
            .with_library("comrak", LIBRARY_VERSION);

        Ok(Self {
            descriptor,
            extensions,
            max_input_bytes: settings.max_input_bytes,
        })
    }

    fn enabled(&self, id: &str) -> bool {
        self.extension(id).is_some_and(|ext| ext.enabled)
    }

    /// Comrak options for the enabled extensions, built per call.
    fn options(&self) -> comrak::Options {
        let mut options = comrak::Options::default();
        options.extension.table = self.enabled("table");
        options.extension.strikethrough = self.enabled("strikethrough");
        options.extension.tasklist = self.enabled("tasklist");
        options.extension.autolink = self.enabled("autolink");
        options.extension.footnotes = self.enabled("footnotes");
        options.extension.superscript = self.enabled("superscript");
        options.extension.description_lists = self.enabled("description_lists");
        options.extension.tagfilter = self.enabled("tagfilter");
        if self.enabled("header_ids") {
            options.extension.header_ids = Some(HEADER_ID_PREFIX.to_owned());
        }
        // Raw HTML is passed through; output is sanitized downstream.
        options.render.unsafe_ = true;
        options
    }
}

impl MarkdownParser for ComrakParser {
    fn descriptor(&self) -> &ParserDescriptor {
        &self.descriptor
    }

    fn extensions(&self) -> &[Extension] {
        &self.extensions
    }

    fn try_convert(&self, markdown: &str) -> Result<String, ConversionError> {
        let options = self.options();
        guarded_convert(markdown, self.max_input_bytes, || {
            comrak::markdown_to_html(markdown, &options)
        })
    }

    fn allowed_html(&self) -> Option<&dyn AllowedHtmlSource> {
        Some(self)
    }
}

impl AllowedHtmlSource for ComrakParser {
    fn allowed_html(&self) -> AllowedHtml {
        enabled_extensions_html(&self.extensions)
    }
}
