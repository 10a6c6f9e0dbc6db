#[cfg(test)]
#[path = "markdown_test.rs"]
mod tests;

use once_cell::sync::Lazy;
use ratatui::{
    style::{Color, Modifier, Style},
    text::Span,
};
use regex::Regex;

static INLINE_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`([^`]+)`").unwrap());
static BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*([^*]+)\*\*").unwrap());
static ITALIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*([^*]+)\*").unwrap());

fn code_style() -> Style {
    Style::default()
        .fg(Color::Rgb(255, 202, 158))
        .bg(Color::Rgb(40, 44, 52))
}

/// Renders the inline markdown subset the analyst actually emits. Inline
/// code is carved out first so asterisks inside backticks are left alone,
/// then bold, then italic; fenced code blocks never reach this function,
/// they are highlighted per line upstream.
pub fn format_line(line: &str) -> Vec<Span<'static>> {
    let mut spans = vec![];
    let mut last = 0;
    for caps in INLINE_CODE.captures_iter(line) {
        let m = caps.get(0).unwrap();
        if m.start() > last {
            spans.extend(format_emphasis(&line[last..m.start()]));
        }
        spans.push(Span::styled(
            caps.get(1).unwrap().as_str().to_string(),
            code_style(),
        ));
        last = m.end();
    }
    if last < line.len() {
        spans.extend(format_emphasis(&line[last..]));
    }
    spans
}

fn format_emphasis(text: &str) -> Vec<Span<'static>> {
    let mut spans = vec![];
    let mut last = 0;
    for caps in BOLD.captures_iter(text) {
        let m = caps.get(0).unwrap();
        if m.start() > last {
            spans.extend(format_italic(&text[last..m.start()]));
        }
        spans.push(Span::styled(
            caps.get(1).unwrap().as_str().to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        ));
        last = m.end();
    }
    if last < text.len() {
        spans.extend(format_italic(&text[last..]));
    }
    spans
}

fn format_italic(text: &str) -> Vec<Span<'static>> {
    let mut spans = vec![];
    let mut last = 0;
    for caps in ITALIC.captures_iter(text) {
        let m = caps.get(0).unwrap();
        if m.start() > last {
            spans.push(Span::from(text[last..m.start()].to_string()));
        }
        spans.push(Span::styled(
            caps.get(1).unwrap().as_str().to_string(),
            Style::default().add_modifier(Modifier::ITALIC),
        ));
        last = m.end();
    }
    if last < text.len() {
        spans.push(Span::from(text[last..].to_string()));
    }
    spans
}
