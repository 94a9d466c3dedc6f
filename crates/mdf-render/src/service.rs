//! Render service: resolve parser, convert, sanitize.

use std::sync::Arc;

use mdf_config::{Config, OnFailure};
use mdf_parser::{
    BUILTIN_PARSERS, ConversionError, MarkdownParser, ParserRegistry, ParserSettings,
    RegistryError, builtin_parser,
};
use mdf_sanitize::{AllowedHtml, AllowedHtmlParseError, global_default};
use mdf_version::VersionConstraintValidator;

use crate::policy::AllowedHtmlPolicy;

/// Render error.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// Parser lookup or registration failed.
    #[error(transparent)]
    Registry(#[from] RegistryError),
    /// No parser was requested and none is registered.
    #[error("no markdown parser is registered")]
    NoParser,
    /// The backend failed and the failure policy is [`FailurePolicy::Error`].
    #[error("parser {parser} failed to convert markdown: {source}")]
    Conversion {
        /// Parser id.
        parser: String,
        /// Backend error.
        #[source]
        source: ConversionError,
    },
    /// A configured allow-list could not be parsed.
    #[error("invalid allowed HTML for {layer}: {source}")]
    AllowedHtml {
        /// Config field holding the allow-list.
        layer: String,
        /// Parse error.
        #[source]
        source: AllowedHtmlParseError,
    },
}

/// What to do when a backend fails to convert.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Degrade to empty HTML and log a warning.
    #[default]
    Empty,
    /// Return [`RenderError::Conversion`].
    Error,
}

impl From<OnFailure> for FailurePolicy {
    fn from(value: OnFailure) -> Self {
        match value {
            OnFailure::Empty => Self::Empty,
            OnFailure::Error => Self::Error,
        }
    }
}

/// Service-wide render options.
#[derive(Clone, Debug)]
pub struct RenderOptions {
    /// Parser used when none is requested.
    pub default_parser: Option<String>,
    /// Theme used when none is requested.
    pub theme: Option<String>,
    /// Whether output is sanitized.
    pub sanitize: bool,
    /// Conversion failure policy.
    pub on_failure: FailurePolicy,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            default_parser: None,
            theme: None,
            sanitize: true,
            on_failure: FailurePolicy::Empty,
        }
    }
}

/// Result of converting one markdown document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConvertedDocument {
    /// Source markdown.
    pub markdown: String,
    /// Id of the parser that converted it.
    pub parser_id: String,
    /// Rendered HTML.
    pub html: String,
    /// Whether `html` was sanitized.
    pub sanitized: bool,
}

/// Renders markdown to allow-listed HTML.
///
/// Immutable after construction; share it behind `Arc` across threads.
pub struct RenderService {
    registry: ParserRegistry,
    policy: AllowedHtmlPolicy,
    options: RenderOptions,
}

impl RenderService {
    pub fn new(registry: ParserRegistry, policy: AllowedHtmlPolicy, options: RenderOptions) -> Self {
        Self {
            registry,
            policy,
            options,
        }
    }

    /// Build the service from configuration.
    ///
    /// Registers every enabled built-in parser whose library version satisfies
    /// its configured constraint. Disabled parsers and parsers failing their
    /// constraint are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns an error if a parser rejects its settings, a configured
    /// allow-list does not parse, or the configured default parser is not
    /// registered.
    pub fn from_config(config: &Config) -> Result<Self, RenderError> {
        let global = match &config.allowed_html.global {
            Some(global) => parse_layer(global, "allowed_html.global")?,
            None => global_default(),
        };
        let mut policy = AllowedHtmlPolicy::new(global);
        let mut registry = ParserRegistry::new();
        let validator = VersionConstraintValidator;

        for id in config.parsers.keys() {
            if !BUILTIN_PARSERS.contains(&id.as_str()) {
                tracing::warn!(parser = %id, "Ignoring configuration for unknown parser");
            }
        }

        for id in BUILTIN_PARSERS {
            let parser_config = config.parser(id);
            if !parser_config.enabled {
                tracing::warn!(parser = %id, "Parser disabled in configuration, skipping");
                continue;
            }

            let settings = ParserSettings {
                extensions: parser_config.extensions,
                weight: parser_config.weight,
                max_input_bytes: Some(config.conversion.max_input_bytes),
            };
            let parser = builtin_parser(id, &settings)?;

            if let Some(constraint) = &parser_config.version_constraint {
                let version = &parser.descriptor().library_version;
                if let Err(e) = validator.validate(version, constraint) {
                    tracing::warn!(
                        parser = %id,
                        version = %version,
                        constraint = %constraint,
                        error = %e,
                        "Parser library version rejected, skipping"
                    );
                    continue;
                }
            }

            let additions = parser_config
                .allowed_html
                .as_deref()
                .map(|value| parse_layer(value, &format!("parsers.{id}.allowed_html")))
                .transpose()?;
            policy.register_parser(parser.as_ref(), additions.as_ref());
            registry.register(parser)?;
        }

        for (name, value) in &config.allowed_html.themes {
            let layer = parse_layer(value, &format!("allowed_html.themes.{name}"))?;
            policy.register_theme(name, &layer);
        }

        if let Some(default_parser) = &config.default_parser
            && !registry.contains(default_parser)
        {
            return Err(RegistryError::UnknownParser(default_parser.clone()).into());
        }

        tracing::info!(parsers = registry.len(), "Render service ready");

        Ok(Self::new(
            registry,
            policy,
            RenderOptions {
                default_parser: config.default_parser.clone(),
                theme: config.theme.clone(),
                sanitize: config.sanitize,
                on_failure: config.conversion.on_failure.into(),
            },
        ))
    }

    pub fn registry(&self) -> &ParserRegistry {
        &self.registry
    }

    pub fn policy(&self) -> &AllowedHtmlPolicy {
        &self.policy
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Resolve a parser id, falling back to the configured default parser and
    /// then to the first registered parser.
    ///
    /// # Errors
    ///
    /// Returns an error if the parser is unknown or no parser is registered.
    pub fn parser(&self, parser_id: Option<&str>) -> Result<Arc<dyn MarkdownParser>, RenderError> {
        match parser_id.or(self.options.default_parser.as_deref()) {
            Some(id) => Ok(self.registry.resolve(id)?),
            None => self.registry.default_parser().ok_or(RenderError::NoParser),
        }
    }

    /// Allowed HTML for a parser and theme, falling back to the configured theme.
    pub fn allowed_html(&self, parser_id: &str, theme: Option<&str>) -> AllowedHtml {
        self.policy
            .tags_for(parser_id, theme.or(self.options.theme.as_deref()))
    }

    /// Render markdown with the given parser.
    ///
    /// # Errors
    ///
    /// Returns an error if the parser is unknown, or if conversion fails and
    /// the failure policy is [`FailurePolicy::Error`].
    pub fn render(
        &self,
        markdown: &str,
        parser_id: &str,
        theme: Option<&str>,
    ) -> Result<String, RenderError> {
        self.render_document(markdown, Some(parser_id), theme)
            .map(|document| document.html)
    }

    /// Render markdown and return the full conversion record.
    ///
    /// # Errors
    ///
    /// See [`render`](Self::render).
    pub fn render_document(
        &self,
        markdown: &str,
        parser_id: Option<&str>,
        theme: Option<&str>,
    ) -> Result<ConvertedDocument, RenderError> {
        let parser = self.parser(parser_id)?;
        let id = parser.descriptor().id.clone();

        let html = match parser.try_convert(markdown) {
            Ok(html) => html,
            Err(e) => match self.options.on_failure {
                FailurePolicy::Empty => {
                    tracing::warn!(parser = %id, error = %e, "Markdown conversion failed");
                    String::new()
                }
                FailurePolicy::Error => {
                    return Err(RenderError::Conversion {
                        parser: id,
                        source: e,
                    });
                }
            },
        };

        let html = if self.options.sanitize {
            let spec = self.allowed_html(&id, theme);
            self.policy.sanitize(&html, &spec)
        } else {
            html
        };

        tracing::debug!(parser = %id, bytes = markdown.len(), "Rendered markdown");

        Ok(ConvertedDocument {
            markdown: markdown.to_owned(),
            parser_id: id,
            html,
            sanitized: self.options.sanitize,
        })
    }
}

fn parse_layer(value: &str, layer: &str) -> Result<AllowedHtml, RenderError> {
    value.parse().map_err(|source| RenderError::AllowedHtml {
        layer: layer.to_owned(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdf_config::ParserConfig;
    use mdf_parser::{COMRAK_ID, ParserDescriptor, PULLDOWN_ID};
    use pretty_assertions::assert_eq;

    struct Bold {
        descriptor: ParserDescriptor,
    }

    impl MarkdownParser for Bold {
        fn descriptor(&self) -> &ParserDescriptor {
            &self.descriptor
        }

        fn try_convert(&self, markdown: &str) -> Result<String, ConversionError> {
            match markdown {
                "**bold**" => Ok("<p><strong>bold</strong></p>".to_owned()),
                _ => Err(ConversionError::Backend("unsupported".to_owned())),
            }
        }
    }

    fn service(global: &str, options: RenderOptions) -> RenderService {
        let mut registry = ParserRegistry::new();
        registry
            .register(Arc::new(Bold {
                descriptor: ParserDescriptor::new("default", "Default"),
            }))
            .unwrap();
        let policy = AllowedHtmlPolicy::new(global.parse().unwrap());
        RenderService::new(registry, policy, options)
    }

    #[test]
    fn test_render_keeps_allowed_tags() {
        let service = service("<p> <strong>", RenderOptions::default());
        assert_eq!(
            service.render("**bold**", "default", None).unwrap(),
            "<p><strong>bold</strong></p>"
        );
    }

    #[test]
    fn test_render_strips_disallowed_tags() {
        let service = service("<p>", RenderOptions::default());
        assert_eq!(
            service.render("**bold**", "default", None).unwrap(),
            "<p>bold</p>"
        );
    }

    #[test]
    fn test_render_unknown_parser() {
        let service = service("<p>", RenderOptions::default());
        assert!(matches!(
            service.render("**bold**", "missing", None),
            Err(RenderError::Registry(RegistryError::UnknownParser(ref id))) if id == "missing"
        ));
    }

    #[test]
    fn test_conversion_failure_degrades_to_empty() {
        let service = service("<p>", RenderOptions::default());
        assert_eq!(service.render("# nope", "default", None).unwrap(), "");
    }

    #[test]
    fn test_conversion_failure_policy_error() {
        let options = RenderOptions {
            on_failure: FailurePolicy::Error,
            ..RenderOptions::default()
        };
        let service = service("<p>", options);
        assert!(matches!(
            service.render("# nope", "default", None),
            Err(RenderError::Conversion { ref parser, .. }) if parser == "default"
        ));
    }

    #[test]
    fn test_render_document_without_sanitize() {
        let options = RenderOptions {
            sanitize: false,
            ..RenderOptions::default()
        };
        let service = service("<p>", options);
        let document = service.render_document("**bold**", None, None).unwrap();
        assert_eq!(
            document,
            ConvertedDocument {
                markdown: "**bold**".to_owned(),
                parser_id: "default".to_owned(),
                html: "<p><strong>bold</strong></p>".to_owned(),
                sanitized: false,
            }
        );
    }

    #[test]
    fn test_no_parser_registered() {
        let service = RenderService::new(
            ParserRegistry::new(),
            AllowedHtmlPolicy::default(),
            RenderOptions::default(),
        );
        assert!(matches!(
            service.render_document("x", None, None),
            Err(RenderError::NoParser)
        ));
    }

    #[test]
    fn test_from_default_config() {
        let service = RenderService::from_config(&Config::default()).unwrap();
        let ids: Vec<&str> = service
            .registry()
            .list()
            .iter()
            .map(|d| d.id.as_str())
            .collect();
        assert_eq!(ids, vec![PULLDOWN_ID, COMRAK_ID]);

        let html = service
            .render("<script>alert(1)</script>\n\n**bold**", PULLDOWN_ID, None)
            .unwrap();
        assert_eq!(html, "<p><strong>bold</strong></p>");
    }

    #[test]
    fn test_from_config_skips_disabled_and_unsatisfied() {
        let mut config = Config::default();
        config.parsers.insert(
            PULLDOWN_ID.to_owned(),
            ParserConfig {
                enabled: false,
                ..ParserConfig::default()
            },
        );
        config.parsers.insert(
            COMRAK_ID.to_owned(),
            ParserConfig {
                version_constraint: Some("^1.0".to_owned()),
                ..ParserConfig::default()
            },
        );

        let service = RenderService::from_config(&config).unwrap();
        assert!(service.registry().is_empty());
    }

    #[test]
    fn test_from_config_satisfied_constraint() {
        let mut config = Config::default();
        config.parsers.insert(
            COMRAK_ID.to_owned(),
            ParserConfig {
                version_constraint: Some("^0.29".to_owned()),
                allowed_html: Some("<mark>".to_owned()),
                ..ParserConfig::default()
            },
        );

        let service = RenderService::from_config(&config).unwrap();
        assert!(service.registry().contains(COMRAK_ID));
        assert!(service.allowed_html(COMRAK_ID, None).allows_tag("mark"));
        assert!(!service.allowed_html(PULLDOWN_ID, None).allows_tag("mark"));
    }

    #[test]
    fn test_from_config_patch_level_constraint() {
        let mut config = Config::default();
        config.parsers.insert(
            PULLDOWN_ID.to_owned(),
            ParserConfig {
                version_constraint: Some(">=0.13.2".to_owned()),
                ..ParserConfig::default()
            },
        );

        let service = RenderService::from_config(&config).unwrap();
        assert!(service.registry().contains(PULLDOWN_ID));
    }

    #[test]
    fn test_from_config_theme_and_default_parser() {
        let mut config = Config {
            default_parser: Some(COMRAK_ID.to_owned()),
            theme: Some("olivero".to_owned()),
            ..Config::default()
        };
        config
            .allowed_html
            .themes
            .insert("olivero".to_owned(), "<span class>".to_owned());

        let service = RenderService::from_config(&config).unwrap();
        assert_eq!(service.parser(None).unwrap().descriptor().id, COMRAK_ID);
        assert!(service.allowed_html(PULLDOWN_ID, None).allows_tag("span"));
        assert!(!service.allowed_html(PULLDOWN_ID, Some("claro")).allows_tag("span"));
    }

    #[test]
    fn test_from_config_unknown_default_parser() {
        let config = Config {
            default_parser: Some("markdown-it".to_owned()),
            ..Config::default()
        };
        assert!(matches!(
            RenderService::from_config(&config),
            Err(RenderError::Registry(RegistryError::UnknownParser(_)))
        ));
    }

    #[test]
    fn test_from_config_invalid_global() {
        let mut config = Config::default();
        config.allowed_html.global = Some("<p".to_owned());
        assert!(matches!(
            RenderService::from_config(&config),
            Err(RenderError::AllowedHtml { ref layer, .. }) if layer == "allowed_html.global"
        ));
    }

    #[test]
    fn test_service_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RenderService>();
    }
}
