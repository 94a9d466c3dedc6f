//! Allowed-HTML policy: layered allow-lists merged per render.

use std::collections::HashMap;

use mdf_parser::MarkdownParser;
use mdf_sanitize::{AllowedHtml, global_default};

/// Layers of allowed HTML: global, per parser and per theme.
///
/// [`tags_for`](Self::tags_for) unions the layers in the order global, parser,
/// theme. Union is most-permissive, so the result does not depend on the
/// order in which layers are merged.
#[derive(Clone, Debug)]
pub struct AllowedHtmlPolicy {
    global: AllowedHtml,
    parsers: HashMap<String, AllowedHtml>,
    themes: HashMap<String, AllowedHtml>,
}

impl Default for AllowedHtmlPolicy {
    fn default() -> Self {
        Self::new(global_default())
    }
}

impl AllowedHtmlPolicy {
    /// Create a policy with the given global layer and no parser or theme layers.
    pub fn new(global: AllowedHtml) -> Self {
        Self {
            global,
            parsers: HashMap::new(),
            themes: HashMap::new(),
        }
    }

    /// Add the parser layer for a parser.
    ///
    /// The layer is the parser's own allow-list (when it has the capability,
    /// including enabled extensions) plus any configured additions. Calling
    /// this twice for the same parser merges the layers.
    pub fn register_parser(&mut self, parser: &dyn MarkdownParser, additions: Option<&AllowedHtml>) {
        let mut layer = parser
            .allowed_html()
            .map(|source| source.allowed_html())
            .unwrap_or_default();
        if let Some(additions) = additions {
            layer.merge(additions);
        }
        self.parsers
            .entry(parser.descriptor().id.clone())
            .or_default()
            .merge(&layer);
    }

    /// Add or extend a theme layer.
    pub fn register_theme(&mut self, name: &str, spec: &AllowedHtml) {
        self.themes.entry(name.to_owned()).or_default().merge(spec);
    }

    /// The global layer.
    pub fn global(&self) -> &AllowedHtml {
        &self.global
    }

    /// The parser layer, if one was registered.
    pub fn parser_layer(&self, parser_id: &str) -> Option<&AllowedHtml> {
        self.parsers.get(parser_id)
    }

    /// The theme layer, if one was registered.
    pub fn theme_layer(&self, theme: &str) -> Option<&AllowedHtml> {
        self.themes.get(theme)
    }

    /// Names of the registered themes, sorted.
    pub fn themes(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.themes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Merged allow-list for rendering with `parser_id` under `theme`.
    ///
    /// Missing parser or theme layers contribute nothing.
    pub fn tags_for(&self, parser_id: &str, theme: Option<&str>) -> AllowedHtml {
        let theme_layer = theme.and_then(|name| {
            let layer = self.themes.get(name);
            if layer.is_none() {
                tracing::debug!(theme = %name, "No allowed HTML registered for theme");
            }
            layer
        });

        AllowedHtml::union(
            std::iter::once(&self.global)
                .chain(self.parsers.get(parser_id))
                .chain(theme_layer),
        )
    }

    /// Sanitize `html` against `spec`.
    pub fn sanitize(&self, html: &str, spec: &AllowedHtml) -> String {
        mdf_sanitize::sanitize(html, spec)
    }
}
