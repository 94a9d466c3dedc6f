//! HTML sanitization against an [`AllowedHtml`] spec.
//!
//! Parsing and serialization are delegated to `ammonia`. The allow-list is
//! projected onto ammonia's tag/attribute allow-lists, and an attribute
//! filter enforces the parts ammonia cannot express (per-tag patterns,
//! value lists and explicit denials).

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};

use ammonia::Builder;

use crate::defaults::{DROP_ENTIRELY, URL_SCHEMES};
use crate::spec::{AllowedHtml, WILDCARD, pattern_prefix};

/// Sanitize `html` so that only tags and attributes permitted by `spec` remain.
///
/// Disallowed tags are unwrapped and their text kept, except for
/// [`DROP_ENTIRELY`] elements whose content is removed too. Disallowed
/// attributes are stripped, and URL attributes with schemes outside
/// [`URL_SCHEMES`] are removed. Comments are stripped.
///
/// Sanitization is idempotent.
#[must_use]
pub fn sanitize(html: &str, spec: &AllowedHtml) -> String {
    let tags: HashSet<&str> = spec.tags().collect();
    let drop: HashSet<&str> = DROP_ENTIRELY
        .iter()
        .copied()
        .filter(|tag| !tags.contains(tag))
        .collect();

    let mut tag_attributes: HashMap<&str, HashSet<&str>> = HashMap::new();
    let mut generic_attributes = HashSet::new();
    let mut prefixes = HashSet::new();

    for (tag, attributes) in spec.entries() {
        for (name, rule) in attributes {
            if !rule.is_permissive() {
                continue;
            }
            if let Some(prefix) = pattern_prefix(name) {
                prefixes.insert(prefix);
            } else if tag == WILDCARD {
                generic_attributes.insert(name.as_str());
            } else {
                tag_attributes.entry(tag).or_default().insert(name.as_str());
            }
        }
    }

    // Final per-attribute check against the full lookup rules.
    let filter_spec = spec.clone();
    let mut builder = Builder::empty();
    builder
        .tags(tags)
        .clean_content_tags(drop)
        .tag_attributes(tag_attributes)
        .generic_attributes(generic_attributes)
        .url_schemes(URL_SCHEMES.iter().copied().collect())
        .link_rel(None)
        .strip_comments(true)
        .attribute_filter(move |element, attribute, value| {
            filter_spec
                .permits(element, attribute, value)
                .then_some(Cow::Borrowed(value))
        });
    if !prefixes.is_empty() {
        builder.generic_attribute_prefixes(prefixes);
    }

    builder.clean(html).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::global_default;
    use crate::spec::AttributeRule;
    use pretty_assertions::assert_eq;

    fn spec(source: &str) -> AllowedHtml {
        source.parse().unwrap()
    }

    #[test]
    fn test_allowed_markup_unchanged() {
        let html = "<p><strong>bold</strong></p>";
        assert_eq!(sanitize(html, &spec("<p> <strong>")), html);
    }

    #[test]
    fn test_disallowed_tag_unwrapped() {
        assert_eq!(
            sanitize("<p><strong>bold</strong></p>", &spec("<p>")),
            "<p>bold</p>"
        );
    }

    #[test]
    fn test_script_and_handlers_removed() {
        let html = r#"<script>alert(1)</script><p onclick="x()">hi</p>"#;
        assert_eq!(sanitize(html, &global_default()), "<p>hi</p>");
    }

    #[test]
    fn test_style_element_and_attribute_removed() {
        let html = r#"<style>p{color:red}</style><p style="color:red">x</p>"#;
        assert_eq!(sanitize(html, &global_default()), "<p>x</p>");
    }

    #[test]
    fn test_attributes_filtered_per_tag() {
        let html = r#"<a href="https://example.com" hreflang="en" target="_blank">x</a>"#;
        assert_eq!(
            sanitize(html, &global_default()),
            r#"<a href="https://example.com" hreflang="en">x</a>"#
        );
    }

    #[test]
    fn test_javascript_url_removed() {
        let html = r#"<a href="javascript:alert(1)">x</a>"#;
        assert_eq!(sanitize(html, &global_default()), "<a>x</a>");
    }

    #[test]
    fn test_relative_url_kept() {
        let html = r#"<a href="../guide">x</a>"#;
        assert_eq!(sanitize(html, &global_default()), html);
    }

    #[test]
    fn test_global_attributes() {
        let html = r#"<h2 id="intro" class="lead" aria-level="2">Intro</h2>"#;
        assert_eq!(sanitize(html, &global_default()), html);
    }

    #[test]
    fn test_value_list_enforced() {
        let allowed = spec(r#"<ol type="1 A"> <li>"#);
        assert_eq!(
            sanitize(r#"<ol type="A"><li>x</li></ol>"#, &allowed),
            r#"<ol type="A"><li>x</li></ol>"#
        );
        assert_eq!(
            sanitize(r#"<ol type="i"><li>x</li></ol>"#, &allowed),
            "<ol><li>x</li></ol>"
        );
    }

    #[test]
    fn test_tag_pattern_only_on_its_tag() {
        let allowed = spec("<div data-*> <span>");
        assert_eq!(
            sanitize(r#"<div data-id="1"><span data-id="2">x</span></div>"#, &allowed),
            r#"<div data-id="1"><span>x</span></div>"#
        );
    }

    #[test]
    fn test_explicit_denial_overrides_global() {
        let mut allowed = spec("<p> <img src> <* class>");
        allowed.set_attribute("img", "class", AttributeRule::Allowed(false));
        assert_eq!(
            sanitize(r#"<p class="a"><img src="x.png" class="b"></p>"#, &allowed),
            r#"<p class="a"><img src="x.png"></p>"#
        );
    }

    #[test]
    fn test_comments_stripped() {
        assert_eq!(sanitize("<p>a<!-- hidden -->b</p>", &spec("<p>")), "<p>ab</p>");
    }

    #[test]
    fn test_empty_spec_keeps_text_only() {
        assert_eq!(
            sanitize("<h1>Title</h1><p>body</p>", &AllowedHtml::new()),
            "Titlebody"
        );
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let inputs = [
            r#"<script>alert(1)</script><p onclick="x()">hi</p>"#,
            r#"<div><p class="x" style="y">a &amp; b</p><iframe src="e"></iframe></div>"#,
            r#"<ul><li><a href="javascript:x">l</a></li></ul><img src="a.png" alt="a">"#,
        ];
        let allowed = global_default();
        for html in inputs {
            let once = sanitize(html, &allowed);
            assert_eq!(sanitize(&once, &allowed), once);
        }
    }
}
