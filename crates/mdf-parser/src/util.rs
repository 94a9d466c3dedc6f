//! Text helpers for the HTML writer.

/// Slug for a heading anchor: lowercase ASCII words joined by `-`.
///
/// Whitespace, `-` and `_` separate words; other punctuation is dropped.
pub(crate) fn slugify(text: &str) -> String {
    text.split(|c: char| c.is_whitespace() || c == '-' || c == '_')
        .map(|word| {
            word.chars()
                .filter(char::is_ascii_alphanumeric)
                .map(|c| c.to_ascii_lowercase())
                .collect::<String>()
        })
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

fn entity(c: char) -> Option<&'static str> {
    match c {
        '&' => Some("&amp;"),
        '<' => Some("&lt;"),
        '>' => Some("&gt;"),
        '"' => Some("&quot;"),
        '\'' => Some("&#x27;"),
        _ => None,
    }
}

/// Escape text for use in element content and quoted attribute values.
pub(crate) fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match entity(c) {
            Some(entity) => escaped.push_str(entity),
            None => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_slugify_words() {
        assert_eq!(slugify("Getting Started"), "getting-started");
        assert_eq!(slugify("  Trimmed  "), "trimmed");
        assert_eq!(slugify("kebab-and_snake  case"), "kebab-and-snake-case");
    }

    #[test]
    fn test_slugify_drops_punctuation() {
        assert_eq!(slugify("Don't panic!"), "dont-panic");
        assert_eq!(slugify("a - ?? - b"), "a-b");
        assert_eq!(slugify("???"), "");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#x27;Jerry&#x27;&lt;/a&gt;"
        );
        assert_eq!(escape_html("plain"), "plain");
    }
}
