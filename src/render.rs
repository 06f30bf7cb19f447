//! Assistant response normalization and terminal markdown rendering.
//!
//! Backend replies sometimes arrive double-encoded: a JSON object with a
//! `response` key, with literal `\n` escape sequences inside. The
//! normalizer unwraps that before the text reaches the markdown walker,
//! which turns pulldown-cmark events into ANSI-styled terminal output.

use colored::Colorize;
use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};
use regex::Regex;

use crate::chat::ChatError;

/// Normalizes raw backend replies and renders them for the terminal.
pub struct ResponseRenderer {
    /// Matches a reply that is exactly a `{"response": "..."}` wrapper.
    wrapper: Regex,
    /// Matches runs of three or more newlines.
    blank_lines: Regex,
}

impl ResponseRenderer {
    /// Compile the normalization patterns.
    ///
    /// # Errors
    /// Returns an error if a pattern fails to compile.
    pub fn new() -> Result<Self, ChatError> {
        Ok(Self {
            wrapper: Regex::new(r#"^\s*\{\s*"response"\s*:\s*"([^"]+)"\s*\}\s*$"#)?,
            blank_lines: Regex::new(r"\n{3,}")?,
        })
    }

    /// Unwrap a possibly JSON-wrapped backend reply. Non-JSON text passes
    /// through unchanged.
    #[must_use]
    pub fn extract_message_content(&self, raw: &str) -> String {
        if let Some(caps) = self.wrapper.captures(raw) {
            if let Some(inner) = caps.get(1) {
                return inner.as_str().to_string();
            }
        }

        // More flexible: accept any JSON object with a string `response`.
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(raw) {
            if let Some(response) = value.get("response").and_then(serde_json::Value::as_str) {
                return response.to_string();
            }
        }

        raw.to_string()
    }

    /// Turn literal `\n`, `\t` and `\r` sequences into real control
    /// characters, collapse three or more newlines down to exactly two,
    /// and trim surrounding whitespace.
    #[must_use]
    pub fn normalize_whitespace(&self, text: &str) -> String {
        let unescaped = text
            .replace("\\n", "\n")
            .replace("\\t", "\t")
            .replace("\\r", "\r");
        self.blank_lines
            .replace_all(&unescaped, "\n\n")
            .trim()
            .to_string()
    }

    /// Full pipeline: unwrap, unescape, tidy blank lines.
    #[must_use]
    pub fn normalize(&self, raw: &str) -> String {
        self.normalize_whitespace(&self.extract_message_content(raw))
    }

    /// Normalize a raw reply and render it as styled terminal text.
    #[must_use]
    pub fn render(&self, raw: &str) -> String {
        render_markdown(&self.normalize(raw))
    }
}

/// Walk markdown events and emit ANSI-styled terminal text: bold for
/// strong text and headings, italics for emphasis, cyan for code,
/// `-`-prefixed list items.
#[must_use]
pub fn render_markdown(text: &str) -> String {
    let mut out = String::new();

    // Styling state while walking events.
    let mut strong: u32 = 0;
    let mut emphasis: u32 = 0;
    let mut heading = false;
    let mut in_code_block = false;

    let parser = Parser::new_ext(text, Options::empty());
    for event in parser {
        match event {
            Event::Start(tag) => match tag {
                Tag::Strong => strong += 1,
                Tag::Emphasis => emphasis += 1,
                Tag::Heading { .. } => {
                    ensure_blank_line(&mut out);
                    heading = true;
                }
                Tag::CodeBlock(_) => {
                    ensure_blank_line(&mut out);
                    in_code_block = true;
                }
                Tag::Paragraph => ensure_blank_line(&mut out),
                Tag::Item => {
                    ensure_newline(&mut out);
                    out.push_str("  - ");
                }
                _ => {}
            },
            Event::End(tag_end) => match tag_end {
                TagEnd::Strong => strong = strong.saturating_sub(1),
                TagEnd::Emphasis => emphasis = emphasis.saturating_sub(1),
                TagEnd::Heading(_) => {
                    heading = false;
                    ensure_newline(&mut out);
                }
                TagEnd::CodeBlock => {
                    in_code_block = false;
                    ensure_newline(&mut out);
                }
                TagEnd::Paragraph | TagEnd::Item => ensure_newline(&mut out),
                _ => {}
            },
            Event::Text(chunk) => {
                out.push_str(&style_chunk(
                    &chunk,
                    strong > 0 || heading,
                    emphasis > 0,
                    in_code_block,
                ));
            }
            Event::Code(code) => {
                let inline = format!("`{code}`");
                out.push_str(&inline.cyan().to_string());
            }
            Event::SoftBreak | Event::HardBreak => out.push('\n'),
            _ => {}
        }
    }

    out.trim_end().to_string()
}

fn style_chunk(text: &str, bold: bool, italic: bool, code: bool) -> String {
    if code {
        return text.cyan().to_string();
    }
    let mut styled = text.normal();
    if bold {
        styled = styled.bold();
    }
    if italic {
        styled = styled.italic();
    }
    styled.to_string()
}

fn ensure_newline(out: &mut String) {
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
}

fn ensure_blank_line(out: &mut String) {
    ensure_newline(out);
    if !out.is_empty() && !out.ends_with("\n\n") {
        out.push('\n');
    }
}
