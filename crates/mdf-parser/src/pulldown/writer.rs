//! Event-driven HTML writer for pulldown-cmark.

use std::fmt::Write;

use pulldown_cmark::{CodeBlockKind, Event, Tag, TagEnd};

use super::state::{CodeBlockState, FootnoteState, HeadingState, ImageState, TableState};
use crate::util::escape_html;

/// Renders a pulldown-cmark event stream to HTML5.
///
/// Produces:
/// - `<hN id="...">` headings with unique slug ids
/// - `<pre><code class="language-...">` for fenced code
/// - `align` attributes on table cells
/// - Disabled checkboxes for task list items
#[derive(Default)]
pub(crate) struct HtmlWriter {
    output: String,
    code: CodeBlockState,
    table: TableState,
    image: ImageState,
    heading: HeadingState,
    footnotes: FootnoteState,
    pending_image: Option<(String, String)>,
}

impl HtmlWriter {
    pub(crate) fn new() -> Self {
        Self {
            output: String::with_capacity(4096),
            ..Self::default()
        }
    }

    /// Render all events and return the HTML.
    pub(crate) fn render<'a, I>(mut self, events: I) -> String
    where
        I: Iterator<Item = Event<'a>>,
    {
        for event in events {
            self.process_event(event);
        }
        self.output
    }

    /// Push inline markup to the output or the heading buffer.
    fn push_inline(&mut self, content: &str) {
        if self.image.is_active() {
            return;
        }
        if self.heading.is_active() {
            self.heading.push_html(content);
        } else {
            self.output.push_str(content);
        }
    }

    fn process_event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start_tag(tag),
            Event::End(tag) => self.end_tag(tag),
            Event::Text(text) => self.text(&text),
            Event::Code(code) => self.inline_code(&code),
            Event::Html(html) | Event::InlineHtml(html) => self.push_inline(&html),
            Event::SoftBreak => self.soft_break(),
            Event::HardBreak => self.push_inline("<br>"),
            Event::Rule => self.output.push_str("<hr>"),
            Event::TaskListMarker(checked) => self.task_list_marker(checked),
            Event::FootnoteReference(label) => self.footnote_reference(&label),
            Event::InlineMath(_) | Event::DisplayMath(_) => {
                // Not supported
            }
        }
    }

    fn start_tag(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => self.output.push_str("<p>"),
            Tag::Heading {
                level, id, classes, ..
            } => {
                // Opening tag is written in end_tag once the id is known.
                self.heading.start(
                    level as u8,
                    id.map(|id| id.to_string()),
                    classes.iter().map(ToString::to_string).collect(),
                );
            }
            Tag::BlockQuote(_) => self.output.push_str("<blockquote>"),
            Tag::CodeBlock(kind) => {
                let lang = match kind {
                    CodeBlockKind::Fenced(ref info) => info
                        .split_whitespace()
                        .next()
                        .map(ToOwned::to_owned),
                    CodeBlockKind::Indented => None,
                };
                self.code.start(lang);
            }
            Tag::List(start) => match start {
                Some(1) => self.output.push_str("<ol>"),
                Some(n) => {
                    let _ = write!(self.output, r#"<ol start="{n}">"#);
                }
                None => self.output.push_str("<ul>"),
            },
            Tag::Item => self.output.push_str("<li>"),
            Tag::FootnoteDefinition(label) => self.footnote_definition_start(&label),
            Tag::HtmlBlock | Tag::MetadataBlock(_) => {}
            Tag::DefinitionList => self.output.push_str("<dl>"),
            Tag::DefinitionListTitle => self.output.push_str("<dt>"),
            Tag::DefinitionListDefinition => self.output.push_str("<dd>"),
            Tag::Table(alignments) => {
                self.table.start(alignments);
                self.output.push_str("<table>");
            }
            Tag::TableHead => {
                self.table.start_head();
                self.output.push_str("<thead><tr>");
            }
            Tag::TableRow => {
                self.table.start_row();
                self.output.push_str("<tr>");
            }
            Tag::TableCell => {
                let align = self.table.current_alignment_attr();
                let tag = if self.table.is_in_head() { "th" } else { "td" };
                let _ = write!(self.output, "<{tag}{align}>");
            }
            Tag::Emphasis => self.push_inline("<em>"),
            Tag::Strong => self.push_inline("<strong>"),
            Tag::Strikethrough => self.push_inline("<del>"),
            Tag::Superscript => self.push_inline("<sup>"),
            Tag::Subscript => self.push_inline("<sub>"),
            Tag::Link {
                dest_url, title, ..
            } => {
                let link_tag = format!(
                    r#"<a href="{}"{}>"#,
                    escape_html(&dest_url),
                    title_attr(&title)
                );
                self.push_inline(&link_tag);
            }
            Tag::Image {
                dest_url, title, ..
            } => {
                // Alt text is collected until the end tag.
                self.image.start();
                self.pending_image = Some((dest_url.to_string(), title.to_string()));
            }
        }
    }

    fn end_tag(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => self.output.push_str("</p>"),
            TagEnd::Heading(_) => {
                if let Some(heading) = self.heading.complete() {
                    let level = heading.level;
                    let id_attr = heading
                        .id
                        .map(|id| format!(r#" id="{}""#, escape_html(&id)))
                        .unwrap_or_default();
                    let class_attr = if heading.classes.is_empty() {
                        String::new()
                    } else {
                        format!(r#" class="{}""#, escape_html(&heading.classes.join(" ")))
                    };
                    let _ = write!(
                        self.output,
                        "<h{level}{id_attr}{class_attr}>{}</h{level}>",
                        heading.html.trim()
                    );
                }
            }
            TagEnd::BlockQuote(_) => self.output.push_str("</blockquote>"),
            TagEnd::CodeBlock => {
                let (lang, content) = self.code.end();
                match lang {
                    Some(lang) => {
                        let _ = write!(
                            self.output,
                            r#"<pre><code class="language-{}">{}</code></pre>"#,
                            escape_html(&lang),
                            escape_html(&content)
                        );
                    }
                    None => {
                        let _ = write!(
                            self.output,
                            "<pre><code>{}</code></pre>",
                            escape_html(&content)
                        );
                    }
                }
            }
            TagEnd::List(ordered) => {
                self.output.push_str(if ordered { "</ol>" } else { "</ul>" });
            }
            TagEnd::Item => self.output.push_str("</li>"),
            TagEnd::FootnoteDefinition => self.output.push_str("</div>"),
            TagEnd::HtmlBlock => {
                // Block HTML lines keep their newline; drop the last one.
                let len = self.output.trim_end_matches('\n').len();
                self.output.truncate(len);
            }
            TagEnd::MetadataBlock(_) => {}
            TagEnd::DefinitionList => self.output.push_str("</dl>"),
            TagEnd::DefinitionListTitle => self.output.push_str("</dt>"),
            TagEnd::DefinitionListDefinition => self.output.push_str("</dd>"),
            TagEnd::Table => self.output.push_str("</tbody></table>"),
            TagEnd::TableHead => {
                self.output.push_str("</tr></thead><tbody>");
                self.table.end_head();
            }
            TagEnd::TableRow => self.output.push_str("</tr>"),
            TagEnd::TableCell => {
                self.output.push_str(if self.table.is_in_head() {
                    "</th>"
                } else {
                    "</td>"
                });
                self.table.next_cell();
            }
            TagEnd::Emphasis => self.push_inline("</em>"),
            TagEnd::Strong => self.push_inline("</strong>"),
            TagEnd::Strikethrough => self.push_inline("</del>"),
            TagEnd::Superscript => self.push_inline("</sup>"),
            TagEnd::Subscript => self.push_inline("</sub>"),
            TagEnd::Link => self.push_inline("</a>"),
            TagEnd::Image => {
                let alt = self.image.end();
                if let Some((src, title)) = self.pending_image.take() {
                    let img = format!(
                        r#"<img src="{}" alt="{}"{}>"#,
                        escape_html(&src),
                        escape_html(&alt),
                        title_attr(&title)
                    );
                    self.push_inline(&img);
                }
            }
        }
    }

    fn text(&mut self, text: &str) {
        if self.code.is_active() {
            self.code.push_str(text);
        } else if self.image.is_active() {
            self.image.push_str(text);
        } else if self.heading.is_active() {
            self.heading.push_text(text);
            self.heading.push_html(&escape_html(text));
        } else {
            self.output.push_str(&escape_html(text));
        }
    }

    fn inline_code(&mut self, code: &str) {
        if self.image.is_active() {
            self.image.push_str(code);
            return;
        }
        if self.heading.is_active() {
            self.heading.push_text(code);
        }
        let html = format!("<code>{}</code>", escape_html(code));
        self.push_inline(&html);
    }

    fn soft_break(&mut self) {
        if self.image.is_active() {
            self.image.push_str(" ");
        } else {
            self.push_inline("\n");
        }
    }

    fn task_list_marker(&mut self, checked: bool) {
        self.output.push_str(if checked {
            r#"<input type="checkbox" checked disabled> "#
        } else {
            r#"<input type="checkbox" disabled> "#
        });
    }

    fn footnote_reference(&mut self, label: &str) {
        let number = self.footnotes.number(label);
        let html = format!(
            r##"<sup class="footnote-reference"><a href="#fn-{}">{number}</a></sup>"##,
            escape_html(label)
        );
        self.push_inline(&html);
    }

    fn footnote_definition_start(&mut self, label: &str) {
        let number = self.footnotes.number(label);
        let _ = write!(
            self.output,
            r#"<div class="footnote-definition" id="fn-{}"><sup class="footnote-definition-label">{number}</sup>"#,
            escape_html(label)
        );
    }
}

fn title_attr(title: &str) -> String {
    if title.is_empty() {
        String::new()
    } else {
        format!(r#" title="{}""#, escape_html(title))
    }
}
