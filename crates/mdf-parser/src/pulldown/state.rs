//! State structs tracking context during event processing.

use std::collections::HashMap;

use pulldown_cmark::Alignment;

use crate::util::slugify;

/// State for tracking code block rendering.
#[derive(Default)]
pub(crate) struct CodeBlockState {
    active: bool,
    language: Option<String>,
    buffer: String,
}

impl CodeBlockState {
    /// Start a new code block with optional language.
    pub(crate) fn start(&mut self, language: Option<String>) {
        self.active = true;
        self.language = language;
        self.buffer.clear();
    }

    /// End the current code block and return (language, content).
    pub(crate) fn end(&mut self) -> (Option<String>, String) {
        self.active = false;
        (self.language.take(), std::mem::take(&mut self.buffer))
    }

    pub(crate) fn is_active(&self) -> bool {
        self.active
    }

    pub(crate) fn push_str(&mut self, text: &str) {
        self.buffer.push_str(text);
    }
}

/// State for tracking table rendering.
#[derive(Default)]
pub(crate) struct TableState {
    in_head: bool,
    alignments: Vec<Alignment>,
    cell_index: usize,
}

impl TableState {
    /// Start a new table with column alignments.
    pub(crate) fn start(&mut self, alignments: Vec<Alignment>) {
        self.alignments = alignments;
        self.in_head = false;
        self.cell_index = 0;
    }

    pub(crate) fn start_head(&mut self) {
        self.in_head = true;
        self.cell_index = 0;
    }

    pub(crate) fn end_head(&mut self) {
        self.in_head = false;
    }

    pub(crate) fn start_row(&mut self) {
        self.cell_index = 0;
    }

    pub(crate) fn next_cell(&mut self) {
        self.cell_index += 1;
    }

    pub(crate) fn is_in_head(&self) -> bool {
        self.in_head
    }

    /// Get the `align` attribute for the current cell.
    pub(crate) fn current_alignment_attr(&self) -> &'static str {
        match self.alignments.get(self.cell_index) {
            Some(Alignment::Left) => r#" align="left""#,
            Some(Alignment::Center) => r#" align="center""#,
            Some(Alignment::Right) => r#" align="right""#,
            Some(Alignment::None) | None => "",
        }
    }
}

/// State for tracking image alt text capture.
#[derive(Default)]
pub(crate) struct ImageState {
    active: bool,
    alt_text: String,
}

impl ImageState {
    pub(crate) fn start(&mut self) {
        self.active = true;
        self.alt_text.clear();
    }

    /// End image capture and return the alt text.
    pub(crate) fn end(&mut self) -> String {
        self.active = false;
        std::mem::take(&mut self.alt_text)
    }

    pub(crate) fn is_active(&self) -> bool {
        self.active
    }

    pub(crate) fn push_str(&mut self, text: &str) {
        self.alt_text.push_str(text);
    }
}

/// A heading whose content has been fully collected.
pub(crate) struct CompletedHeading {
    pub(crate) level: u8,
    pub(crate) id: Option<String>,
    pub(crate) classes: Vec<String>,
    pub(crate) html: String,
}

/// State for tracking headings and generating unique ids.
#[derive(Default)]
pub(crate) struct HeadingState {
    current_level: Option<u8>,
    explicit_id: Option<String>,
    classes: Vec<String>,
    /// Plain text, for slug generation.
    text: String,
    /// HTML with inline formatting.
    html: String,
    id_counts: HashMap<String, usize>,
}

impl HeadingState {
    /// Check if we're currently inside a heading.
    pub(crate) fn is_active(&self) -> bool {
        self.current_level.is_some()
    }

    /// Start tracking a heading. `id` and `classes` come from heading attributes.
    pub(crate) fn start(&mut self, level: u8, id: Option<String>, classes: Vec<String>) {
        self.current_level = Some(level);
        self.explicit_id = id;
        self.classes = classes;
        self.text.clear();
        self.html.clear();
    }

    /// Complete the heading, resolving its id.
    pub(crate) fn complete(&mut self) -> Option<CompletedHeading> {
        let level = self.current_level.take()?;
        let text = std::mem::take(&mut self.text);
        let id = match self.explicit_id.take() {
            Some(id) => Some(id),
            None => self.generate_id(&text),
        };
        Some(CompletedHeading {
            level,
            id,
            classes: std::mem::take(&mut self.classes),
            html: std::mem::take(&mut self.html),
        })
    }

    /// Generate a unique id for a heading, or `None` if the text has no slug.
    fn generate_id(&mut self, text: &str) -> Option<String> {
        let base_id = slugify(text);
        if base_id.is_empty() {
            return None;
        }
        let count = self.id_counts.entry(base_id.clone()).or_default();
        let id = match *count {
            0 => base_id,
            n => format!("{base_id}-{n}"),
        };
        *count += 1;
        Some(id)
    }

    pub(crate) fn push_text(&mut self, text: &str) {
        self.text.push_str(text);
    }

    pub(crate) fn push_html(&mut self, html: &str) {
        self.html.push_str(html);
    }
}

/// Footnote numbering in order of first appearance.
#[derive(Default)]
pub(crate) struct FootnoteState {
    numbers: HashMap<String, usize>,
}

impl FootnoteState {
    /// Number for a footnote label, assigned on first use.
    pub(crate) fn number(&mut self, label: &str) -> usize {
        let next = self.numbers.len() + 1;
        *self.numbers.entry(label.to_owned()).or_insert(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_block_state() {
        let mut state = CodeBlockState::default();
        assert!(!state.is_active());

        state.start(Some("rust".to_owned()));
        assert!(state.is_active());

        state.push_str("fn main() {}");
        let (lang, content) = state.end();
        assert_eq!(lang, Some("rust".to_owned()));
        assert_eq!(content, "fn main() {}");
        assert!(!state.is_active());
    }

    #[test]
    fn test_table_state() {
        let mut state = TableState::default();
        state.start(vec![Alignment::Left, Alignment::None, Alignment::Right]);

        state.start_head();
        assert!(state.is_in_head());
        assert_eq!(state.current_alignment_attr(), r#" align="left""#);

        state.next_cell();
        assert_eq!(state.current_alignment_attr(), "");

        state.next_cell();
        assert_eq!(state.current_alignment_attr(), r#" align="right""#);

        state.end_head();
        state.start_row();
        assert!(!state.is_in_head());
        assert_eq!(state.current_alignment_attr(), r#" align="left""#);
    }

    #[test]
    fn test_heading_ids_are_unique() {
        let mut state = HeadingState::default();
        let mut ids = Vec::new();
        for _ in 0..3 {
            state.start(2, None, Vec::new());
            state.push_text("Usage");
            ids.push(state.complete().unwrap().id);
        }
        assert_eq!(
            ids,
            vec![
                Some("usage".to_owned()),
                Some("usage-1".to_owned()),
                Some("usage-2".to_owned())
            ]
        );
    }

    #[test]
    fn test_heading_explicit_id() {
        let mut state = HeadingState::default();
        state.start(3, Some("custom".to_owned()), vec!["note".to_owned()]);
        state.push_text("Title");
        let heading = state.complete().unwrap();
        assert_eq!(heading.id.as_deref(), Some("custom"));
        assert_eq!(heading.classes, vec!["note".to_owned()]);
        assert_eq!(heading.level, 3);
    }

    #[test]
    fn test_heading_without_slug() {
        let mut state = HeadingState::default();
        state.start(2, None, Vec::new());
        state.push_text("???");
        assert_eq!(state.complete().unwrap().id, None);
        assert!(state.complete().is_none());
    }

    #[test]
    fn test_footnote_numbering() {
        let mut state = FootnoteState::default();
        assert_eq!(state.number("b"), 1);
        assert_eq!(state.number("a"), 2);
        assert_eq!(state.number("b"), 1);
    }
}
