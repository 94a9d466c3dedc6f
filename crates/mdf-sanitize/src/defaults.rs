//! Reference allow-lists.

use crate::spec::AllowedHtml;

/// Elements removed together with their content when not allowed.
pub const DROP_ENTIRELY: &[&str] = &[
    "script", "style", "template", "iframe", "object", "embed", "noscript",
];

/// URL schemes kept in `href`/`src` attributes. Relative URLs always pass.
pub const URL_SCHEMES: &[&str] = &["http", "https", "mailto", "tel", "ftp"];

/// Global default allow-list.
///
/// A safe subset of structural and inline HTML5. Nothing scripting- or
/// style-capable: no `<script>`, `<style>`, `on*` handlers or `style`
/// attribute.
#[must_use]
pub fn global_default() -> AllowedHtml {
    AllowedHtml::new()
        .with_tag("h2", &[])
        .with_tag("h3", &[])
        .with_tag("h4", &[])
        .with_tag("h5", &[])
        .with_tag("h6", &[])
        .with_tag("p", &[])
        .with_tag("br", &[])
        .with_tag("hr", &[])
        .with_tag("ul", &[])
        .with_tag("ol", &["start", "type"])
        .with_tag("li", &[])
        .with_tag("blockquote", &["cite"])
        .with_tag("em", &[])
        .with_tag("strong", &[])
        .with_tag("cite", &[])
        .with_tag("code", &[])
        .with_tag("pre", &[])
        .with_tag("a", &["href", "hreflang"])
        .with_tag("img", &["alt", "height", "src", "width"])
        .with_tag("*", &["aria*", "class", "id", "lang", "name", "tabindex", "title"])
}
