//! Resolution of plugin identifiers passed as strings, such as route
//! parameters or template arguments.

use std::fmt;
use std::sync::Arc;

use mdf_parser::{Extension, MarkdownParser};
use mdf_sanitize::AllowedHtml;

use crate::service::RenderService;

/// Type token for parser ids.
pub const TYPE_PARSER: &str = "parser";
/// Type token for `<parser>.<extension>` ids.
pub const TYPE_EXTENSION: &str = "extension";
/// Type token for `global`, `parser.<id>` and `theme.<name>` ids.
pub const TYPE_ALLOWED_HTML: &str = "allowed_html";

/// A resolved plugin.
pub enum ResolvedPlugin {
    Parser(Arc<dyn MarkdownParser>),
    Extension {
        parser: Arc<dyn MarkdownParser>,
        extension: Extension,
    },
    AllowedHtml(AllowedHtml),
}

impl fmt::Debug for ResolvedPlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parser(parser) => f.debug_tuple("Parser").field(&parser.descriptor().id).finish(),
            Self::Extension { parser, extension } => f
                .debug_struct("Extension")
                .field("parser", &parser.descriptor().id)
                .field("extension", &extension.descriptor.id)
                .finish(),
            Self::AllowedHtml(spec) => f.debug_tuple("AllowedHtml").field(spec).finish(),
        }
    }
}

/// Outcome of a conversion.
///
/// Unknown type tokens and unknown ids are not errors: the caller gets the
/// original value back and decides what to do with it.
#[derive(Debug)]
pub enum Converted {
    Resolved(ResolvedPlugin),
    Unresolved(String),
}

impl Converted {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }
}

/// Converts `(value, type)` pairs into plugin instances.
pub struct PluginConverter<'a> {
    service: &'a RenderService,
}

impl<'a> PluginConverter<'a> {
    pub fn new(service: &'a RenderService) -> Self {
        Self { service }
    }

    /// Whether `type_token` is one this converter handles.
    pub fn applies(type_token: &str) -> bool {
        matches!(type_token, TYPE_PARSER | TYPE_EXTENSION | TYPE_ALLOWED_HTML)
    }

    /// Resolve `value` as a plugin of kind `type_token`.
    pub fn convert(&self, value: &str, type_token: &str) -> Converted {
        let resolved = match type_token {
            TYPE_PARSER => self.parser(value).map(ResolvedPlugin::Parser),
            TYPE_EXTENSION => self.extension(value),
            TYPE_ALLOWED_HTML => self.allowed_html(value).map(ResolvedPlugin::AllowedHtml),
            _ => {
                tracing::debug!(type_token = %type_token, value = %value, "Unsupported plugin type");
                None
            }
        };

        match resolved {
            Some(plugin) => Converted::Resolved(plugin),
            None => Converted::Unresolved(value.to_owned()),
        }
    }

    fn parser(&self, id: &str) -> Option<Arc<dyn MarkdownParser>> {
        self.service.registry().resolve(id).ok()
    }

    fn extension(&self, value: &str) -> Option<ResolvedPlugin> {
        let (parser_id, extension_id) = value.split_once('.')?;
        let parser = self.parser(parser_id)?;
        let extension = parser.extension(extension_id)?.clone();
        Some(ResolvedPlugin::Extension { parser, extension })
    }

    fn allowed_html(&self, value: &str) -> Option<AllowedHtml> {
        let policy = self.service.policy();
        if value == "global" {
            return Some(policy.global().clone());
        }
        match value.split_once('.')? {
            ("parser", id) => {
                self.parser(id)?;
                Some(policy.tags_for(id, None))
            }
            ("theme", name) => policy.theme_layer(name).cloned(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdf_config::Config;
    use mdf_parser::{COMRAK_ID, PULLDOWN_ID};

    fn service() -> RenderService {
        let mut config = Config::default();
        config
            .allowed_html
            .themes
            .insert("olivero".to_owned(), "<span class>".to_owned());
        RenderService::from_config(&config).unwrap()
    }

    #[test]
    fn test_convert_parser() {
        let service = service();
        let converter = PluginConverter::new(&service);
        match converter.convert(COMRAK_ID, TYPE_PARSER) {
            Converted::Resolved(ResolvedPlugin::Parser(parser)) => {
                assert_eq!(parser.descriptor().id, COMRAK_ID);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_convert_extension() {
        let service = service();
        let converter = PluginConverter::new(&service);
        match converter.convert("pulldown-cmark.footnotes", TYPE_EXTENSION) {
            Converted::Resolved(ResolvedPlugin::Extension { parser, extension }) => {
                assert_eq!(parser.descriptor().id, PULLDOWN_ID);
                assert_eq!(extension.descriptor.id, "footnotes");
                assert!(extension.enabled);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_convert_allowed_html() {
        let service = service();
        let converter = PluginConverter::new(&service);

        let global = converter.convert("global", TYPE_ALLOWED_HTML);
        assert!(matches!(
            global,
            Converted::Resolved(ResolvedPlugin::AllowedHtml(ref spec)) if spec.allows_tag("p")
        ));

        let theme = converter.convert("theme.olivero", TYPE_ALLOWED_HTML);
        assert!(matches!(
            theme,
            Converted::Resolved(ResolvedPlugin::AllowedHtml(ref spec)) if spec.allows_tag("span") && !spec.allows_tag("p")
        ));

        let parser = converter.convert("parser.comrak", TYPE_ALLOWED_HTML);
        assert!(matches!(
            parser,
            Converted::Resolved(ResolvedPlugin::AllowedHtml(ref spec)) if spec.allows_tag("table")
        ));
    }

    #[test]
    fn test_unknown_type_is_unresolved() {
        let service = service();
        let converter = PluginConverter::new(&service);
        assert!(!PluginConverter::applies("node"));
        assert!(matches!(
            converter.convert(COMRAK_ID, "node"),
            Converted::Unresolved(ref value) if value == COMRAK_ID
        ));
    }

    #[test]
    fn test_unknown_ids_are_unresolved() {
        let service = service();
        let converter = PluginConverter::new(&service);
        assert!(!converter.convert("markdown-it", TYPE_PARSER).is_resolved());
        assert!(!converter.convert("comrak.mermaid", TYPE_EXTENSION).is_resolved());
        assert!(!converter.convert("comrak", TYPE_EXTENSION).is_resolved());
        assert!(!converter.convert("theme.claro", TYPE_ALLOWED_HTML).is_resolved());
        assert!(!converter.convert("parser.markdown-it", TYPE_ALLOWED_HTML).is_resolved());
        assert!(!converter.convert("other.thing", TYPE_ALLOWED_HTML).is_resolved());
    }
}
