//! Text syntax for allow-lists.
//!
//! The format lists one element per tag, with allowed attributes inside:
//!
//! ```text
//! <a href hreflang> <ol start type="1 A I"> <* class aria*>
//! ```
//!
//! A bare attribute is allowed with any value; a quoted value list restricts
//! it to those values. Explicit denials have no text form and are omitted
//! when formatting.

use std::fmt;
use std::str::FromStr;

use crate::spec::{AllowedHtml, AttributeRule, WILDCARD};

/// Error while parsing an allow-list string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AllowedHtmlParseError {
    /// Text outside of a `<...>` element.
    #[error("expected '<' at offset {offset}, found {found:?}")]
    Unexpected {
        /// Byte offset into the input.
        offset: usize,
        /// Offending character.
        found: char,
    },
    /// Element was never closed with `>`.
    #[error("unclosed element starting at offset {offset}")]
    Unclosed {
        /// Byte offset of the opening `<`.
        offset: usize,
    },
    /// Element with no tag name.
    #[error("empty element at offset {offset}")]
    EmptyTag {
        /// Byte offset of the opening `<`.
        offset: usize,
    },
    /// Tag or attribute name with characters outside `[A-Za-z0-9_:-]` (plus
    /// a trailing `*` for attribute patterns).
    #[error("invalid name {name:?}")]
    InvalidName {
        /// Offending name.
        name: String,
    },
    /// Attribute value containing a quote character.
    #[error("value {value:?} for attribute {attribute:?} contains a quote")]
    QuotedValue {
        /// Attribute name.
        attribute: String,
        /// Offending value.
        value: String,
    },
    /// Attribute value list is not quoted.
    #[error("value list for attribute {attribute:?} must be quoted")]
    UnquotedValue {
        /// Attribute name.
        attribute: String,
    },
}

impl FromStr for AllowedHtml {
    type Err = AllowedHtmlParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let mut spec = AllowedHtml::new();
        let mut offset = 0;

        while let Some(found) = input[offset..].chars().next() {
            if found.is_whitespace() {
                offset += found.len_utf8();
                continue;
            }
            if found != '<' {
                return Err(AllowedHtmlParseError::Unexpected { offset, found });
            }
            let end = find_element_end(&input[offset..])
                .ok_or(AllowedHtmlParseError::Unclosed { offset })?;
            parse_element(&input[offset + 1..offset + end], offset, &mut spec)?;
            offset += end + 1;
        }

        Ok(spec)
    }
}

/// Find the `>` closing the element at the start of `input`, skipping quoted values.
fn find_element_end(input: &str) -> Option<usize> {
    let mut quote = None;
    for (index, c) in input.char_indices() {
        match (quote, c) {
            (None, '"' | '\'') => quote = Some(c),
            (Some(q), c) if q == c => quote = None,
            (None, '>') => return Some(index),
            _ => {}
        }
    }
    None
}

fn parse_element(
    body: &str,
    offset: usize,
    spec: &mut AllowedHtml,
) -> Result<(), AllowedHtmlParseError> {
    let body = body.trim().trim_end_matches('/').trim_end();
    let (tag, mut rest) = body
        .split_once(char::is_whitespace)
        .unwrap_or((body, ""));

    if tag.is_empty() {
        return Err(AllowedHtmlParseError::EmptyTag { offset });
    }
    if tag != WILDCARD && !is_valid_name(tag) {
        return Err(AllowedHtmlParseError::InvalidName {
            name: tag.to_owned(),
        });
    }
    spec.allow_tag(tag);

    loop {
        rest = rest.trim_start();
        if rest.is_empty() {
            return Ok(());
        }

        let name_end = rest
            .find(|c: char| c.is_whitespace() || c == '=')
            .unwrap_or(rest.len());
        let name = &rest[..name_end];
        let pattern_base = name.strip_suffix('*').unwrap_or(name);
        if !is_valid_name(pattern_base) {
            return Err(AllowedHtmlParseError::InvalidName {
                name: name.to_owned(),
            });
        }
        rest = &rest[name_end..];

        let Some(after_eq) = rest.strip_prefix('=') else {
            spec.allow_attribute(tag, name, AttributeRule::Allowed(true));
            continue;
        };

        let mut chars = after_eq.chars();
        let quote = match chars.next() {
            Some(q @ ('"' | '\'')) => q,
            _ => {
                return Err(AllowedHtmlParseError::UnquotedValue {
                    attribute: name.to_owned(),
                });
            }
        };
        let inner = &after_eq[1..];
        let close = inner
            .find(quote)
            .ok_or(AllowedHtmlParseError::Unclosed { offset })?;
        let values: Vec<&str> = inner[..close].split_whitespace().collect();
        if let Some(value) = values.iter().find(|value| value.contains(['"', '\''])) {
            return Err(AllowedHtmlParseError::QuotedValue {
                attribute: name.to_owned(),
                value: (*value).to_owned(),
            });
        }
        spec.allow_attribute(tag, name, AttributeRule::values(values));
        rest = &inner[close + 1..];
    }
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':'))
}

impl fmt::Display for AllowedHtml {
    /// Format as the allow-list text syntax, with the wildcard entry last.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ordered = self
            .entries()
            .filter(|(tag, _)| *tag != WILDCARD)
            .chain(self.entries().filter(|(tag, _)| *tag == WILDCARD));

        let mut first = true;
        for (tag, attributes) in ordered {
            if !first {
                f.write_str(" ")?;
            }
            first = false;
            write!(f, "<{tag}")?;
            for (name, rule) in attributes {
                match rule {
                    AttributeRule::Allowed(true) => write!(f, " {name}")?,
                    AttributeRule::Allowed(false) => {}
                    AttributeRule::Values(values) => {
                        let joined: Vec<&str> = values.iter().map(String::as_str).collect();
                        write!(f, r#" {name}="{}""#, joined.join(" "))?;
                    }
                }
            }
            f.write_str(">")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_simple_elements() {
        let spec: AllowedHtml = "<p> <a href hreflang>".parse().unwrap();
        assert!(spec.allows_tag("p"));
        assert!(spec.permits("a", "href", "/"));
        assert!(spec.permits("a", "hreflang", "en"));
        assert!(!spec.permits("a", "target", "_blank"));
    }

    #[test]
    fn test_parse_value_list() {
        let spec: AllowedHtml = r#"<ol start type="1 A I">"#.parse().unwrap();
        assert!(spec.permits("ol", "start", "3"));
        assert!(spec.permits("ol", "type", "I"));
        assert!(!spec.permits("ol", "type", "a"));
    }

    #[test]
    fn test_parse_single_quoted_values() {
        let spec: AllowedHtml = "<a target='_blank'>".parse().unwrap();
        assert!(spec.permits("a", "target", "_blank"));
        assert!(!spec.permits("a", "target", "_self"));
    }

    #[test]
    fn test_parse_wildcards() {
        let spec: AllowedHtml = "<p> <* class aria*> <div data-*>".parse().unwrap();
        assert!(spec.permits("p", "class", "x"));
        assert!(spec.permits("p", "aria-hidden", "true"));
        assert!(spec.permits("div", "data-id", "1"));
        assert!(!spec.allows_tag("*"));
    }

    #[test]
    fn test_parse_self_closing_and_newlines() {
        let spec: AllowedHtml = "<br/>\n<img src alt />\n".parse().unwrap();
        assert!(spec.allows_tag("br"));
        assert!(spec.permits("img", "alt", "x"));
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        let spec: AllowedHtml = "<A HREF>".parse().unwrap();
        assert!(spec.permits("a", "href", "/"));
    }

    #[test]
    fn test_parse_empty_input() {
        let spec: AllowedHtml = "   ".parse().unwrap();
        assert!(spec.is_empty());
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            "p".parse::<AllowedHtml>().unwrap_err(),
            AllowedHtmlParseError::Unexpected {
                offset: 0,
                found: 'p'
            }
        );
        assert_eq!(
            "<p> <a href".parse::<AllowedHtml>().unwrap_err(),
            AllowedHtmlParseError::Unclosed { offset: 4 }
        );
        assert_eq!(
            "<>".parse::<AllowedHtml>().unwrap_err(),
            AllowedHtmlParseError::EmptyTag { offset: 0 }
        );
        assert!(matches!(
            "<a on(click)>".parse::<AllowedHtml>().unwrap_err(),
            AllowedHtmlParseError::InvalidName { .. }
        ));
        assert!(matches!(
            "<a target=_blank>".parse::<AllowedHtml>().unwrap_err(),
            AllowedHtmlParseError::UnquotedValue { .. }
        ));
    }

    #[test]
    fn test_parse_rejects_bare_wildcard_attribute() {
        for source in ["<p *>", "<* *>"] {
            assert_eq!(
                source.parse::<AllowedHtml>().unwrap_err(),
                AllowedHtmlParseError::InvalidName {
                    name: "*".to_owned()
                }
            );
        }
    }

    #[test]
    fn test_parse_rejects_quote_in_value() {
        assert_eq!(
            r#"<a x='a"b'>"#.parse::<AllowedHtml>().unwrap_err(),
            AllowedHtmlParseError::QuotedValue {
                attribute: "x".to_owned(),
                value: r#"a"b"#.to_owned(),
            }
        );
        assert!(matches!(
            r#"<a x="it's">"#.parse::<AllowedHtml>().unwrap_err(),
            AllowedHtmlParseError::QuotedValue { .. }
        ));
    }

    #[test]
    fn test_display_orders_wildcard_last() {
        let spec: AllowedHtml = r#"<* class> <ol type="A 1"> <a href>"#.parse().unwrap();
        assert_eq!(spec.to_string(), r#"<a href> <ol type="1 A"> <* class>"#);
    }

    #[test]
    fn test_display_parses_back() {
        let source = r#"<a href hreflang> <img alt src> <ol start type="1 A"> <* aria* class>"#;
        let spec: AllowedHtml = source.parse().unwrap();
        let reparsed: AllowedHtml = spec.to_string().parse().unwrap();
        assert_eq!(spec, reparsed);
    }
}
