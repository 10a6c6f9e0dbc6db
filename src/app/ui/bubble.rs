use crate::config::constants::BUBBLE_WIDTH_PERCENT;
use crate::models::{ContentBlock, Role, SqlTable, Turn};
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};
use syntect::{easy::HighlightLines, highlighting::Theme};
use unicode_width::UnicodeWidthStr;

use super::{markdown, syntaxes, utils};

pub const DEFAULT_PADDING: usize = 8;
pub const DEFAULT_BORDER_ELEMENTS_LEN: usize = 5;

/// Rows shown per result table before the remainder is elided.
pub const MAX_TABLE_ROWS: usize = 10;

pub struct Bubble<'a> {
    turn: &'a Turn,
    max_width: usize,
    padding: usize,
}

impl<'a> Bubble<'_> {
    pub fn new(turn: &'a Turn, max_width: usize) -> Bubble<'a> {
        Bubble {
            turn,
            max_width,
            // Unicode character border + padding
            padding: DEFAULT_PADDING,
        }
    }

    pub fn as_lines(&self, theme: &'a Theme) -> Vec<Line<'a>> {
        let cap = self.content_width_cap();
        let body = self.build_body(cap, theme);

        let mut max_line_len = body
            .iter()
            .map(|line| line.spans.iter().map(|s| s.content.width()).sum())
            .max()
            .unwrap_or_default();

        // The bars still need room for the issuer and the timestamp
        let issuer = self.issuer();
        if issuer.width() + 2 > max_line_len {
            max_line_len = issuer.width() + 2;
        }
        let time = self.timestamp();
        if time.width() + 2 > max_line_len {
            max_line_len = time.width() + 2;
        }

        let lines = body
            .into_iter()
            .map(|line| self.format_spans(line.spans, max_line_len))
            .collect();

        self.wrap_lines_in_bubble(lines, max_line_len)
    }

    fn build_body(&self, max_width: usize, theme: &'a Theme) -> Vec<Line<'a>> {
        let mut lines: Vec<Line> = vec![];
        let mut sql_index = 0;

        for block in self.turn.content() {
            match block {
                ContentBlock::Text { text } => {
                    lines.extend(text_lines(text, max_width, theme));
                }
                ContentBlock::Suggestions { suggestions } => {
                    for suggestion in suggestions {
                        let mut spans = vec![Span::styled(
                            "• ",
                            Style::default().add_modifier(Modifier::BOLD),
                        )];
                        spans.extend(markdown::format_line(suggestion));
                        lines.extend(utils::split_to_lines(spans, max_width));
                    }
                }
                ContentBlock::Sql { statement } => {
                    lines.extend(sql_lines(statement, max_width, theme));
                    if let Some(table) = self.turn.tables().get(sql_index) {
                        lines.push(Line::default());
                        lines.extend(table_lines(table, max_width));
                    }
                    sql_index += 1;
                }
            }
        }
        lines
    }

    fn content_width_cap(&self) -> usize {
        let border = DEFAULT_BORDER_ELEMENTS_LEN;
        let cap = (self.max_width as f32 * BUBBLE_WIDTH_PERCENT as f32 / 100.0).ceil() as usize;
        // The viewport can be degenerate before the first real layout pass
        cap.min(self.max_width.saturating_sub(border)).max(1)
    }

    fn issuer(&self) -> &'static str {
        match self.turn.role() {
            Role::User => "You",
            Role::Analyst => "Analyst",
            Role::System => "System",
        }
    }

    fn timestamp(&self) -> String {
        self.turn
            .created_at()
            .with_timezone(&chrono::Local)
            .format("%H:%M %m/%d")
            .to_string()
    }

    fn wrap_lines_in_bubble(&self, lines: Vec<Line<'a>>, max_line_len: usize) -> Vec<Line<'a>> {
        // Replace top bar ─ with the issuer string
        let issuer = self.issuer();
        let top_bar = format!(
            "╭─ {} {}╮",
            issuer,
            ["─"].repeat(max_line_len - issuer.width() - 1).join("")
        );

        // Replace bottom bar ─ with the date
        let time = self.timestamp();
        let bottom_bar = format!(
            "╰─ {} {}╯",
            time,
            ["─"].repeat(max_line_len - time.width() - 1).join("")
        );
        let bar_padding = utils::repeat_from_subtractions(
            " ",
            vec![self.max_width, max_line_len, self.padding],
        );

        if !self.turn.is_user() {
            let mut res = vec![self.highlighted_line(format!("{top_bar}{bar_padding}"))];
            res.extend(lines);
            res.push(self.highlighted_line(format!("{bottom_bar}{bar_padding}")));
            return res;
        }

        let mut res = vec![self.highlighted_line(format!("{bar_padding}{top_bar}"))];
        res.extend(lines);
        res.push(self.highlighted_line(format!("{bar_padding}{bottom_bar}")));
        res
    }

    fn format_spans(&self, mut spans: Vec<Span<'a>>, max_line_len: usize) -> Line<'a> {
        let line_str_len: usize = spans.iter().map(|e| e.content.width()).sum();
        let fill = utils::repeat_from_subtractions(" ", vec![max_line_len, line_str_len]);
        let formatted_line_len = line_str_len + fill.len() + self.padding;

        let mut wrapped_spans = vec![self.highlighted_span("│ ".to_string())];
        wrapped_spans.append(&mut spans);
        wrapped_spans.push(self.highlighted_span(format!("{fill} │")));

        let outer_padding =
            utils::repeat_from_subtractions(" ", vec![self.max_width, formatted_line_len]);

        if !self.turn.is_user() {
            // Left alignment
            wrapped_spans.push(Span::from(outer_padding));
            return Line::from(wrapped_spans);
        }

        let mut line_spans = vec![Span::from(outer_padding)];
        line_spans.extend(wrapped_spans);

        Line::from(line_spans)
    }

    fn highlighted_span(&self, text: String) -> Span<'a> {
        let color = if self.turn.is_error() {
            Color::Rgb(255, 99, 71)
        } else if self.turn.is_user() {
            Color::Rgb(64, 224, 208)
        } else if self.turn.is_analyst() {
            Color::Rgb(137, 180, 250)
        } else {
            Color::Rgb(255, 140, 105)
        };
        Span::styled(
            text,
            Style {
                fg: Some(color),
                ..Style::default()
            },
        )
    }

    fn highlighted_line(&self, text: String) -> Line<'a> {
        Line::from(self.highlighted_span(text))
    }
}

/// Fenced code blocks get syntect; everything else goes through the inline
/// markdown formatter.
fn text_lines<'a>(text: &str, max_width: usize, theme: &'a Theme) -> Vec<Line<'a>> {
    let mut highlight = HighlightLines::new(syntaxes::find_syntax("text"), theme);
    let mut in_codeblock = false;
    let mut lines: Vec<Line> = vec![];

    for line in text.lines() {
        let mut spans = vec![];
        if line.trim().starts_with("```") {
            let lang = line.trim().replace("```", "");
            if !in_codeblock {
                highlight = HighlightLines::new(syntaxes::find_syntax(&lang), theme);
                in_codeblock = true;
                spans = vec![Span::from(line.to_owned())];
            } else {
                in_codeblock = false
            }
        } else if in_codeblock {
            spans = highlight_code_line(&mut highlight, line);
        } else {
            spans = markdown::format_line(line);
        }

        if spans.is_empty() {
            spans = vec![Span::styled(line.to_owned(), Style::default())];
        }

        lines.extend(utils::split_to_lines(spans, max_width));
    }
    lines
}

fn sql_lines<'a>(statement: &str, max_width: usize, theme: &'a Theme) -> Vec<Line<'a>> {
    let mut highlight = HighlightLines::new(syntaxes::find_syntax("sql"), theme);
    let mut lines = vec![];
    for line in statement.lines() {
        let spans = highlight_code_line(&mut highlight, line);
        lines.extend(utils::split_to_lines(spans, max_width));
    }
    lines
}

fn highlight_code_line<'a>(
    highlight: &mut HighlightLines,
    line: &str,
) -> Vec<Span<'a>> {
    let line_nl = format!("{}\n", line);
    let highlighted = match highlight.highlight_line(&line_nl, &syntaxes::SYNTAX_SET) {
        Ok(segments) => segments,
        Err(_) => return vec![Span::from(line.to_owned())],
    };
    highlighted
        .iter()
        .enumerate()
        .map(|(i, segment)| {
            let (style, content) = segment;
            let mut text = content.to_string();
            if i == highlighted.len() - 1 {
                text = text.trim_end().to_string();
            }

            Span::styled(
                text,
                Style {
                    fg: syntaxes::to_rgb(style.foreground),
                    ..Style::default()
                },
            )
        })
        .collect()
}

fn table_lines<'a>(table: &SqlTable, max_width: usize) -> Vec<Line<'a>> {
    let widths = column_widths(table, max_width);
    let header = table
        .columns
        .iter()
        .zip(&widths)
        .map(|(name, width)| format!("{:<width$}", clip(name, *width)))
        .collect::<Vec<_>>()
        .join("  ");
    let separator = widths
        .iter()
        .map(|width| ["─"].repeat(*width).join(""))
        .collect::<Vec<_>>()
        .join("  ");

    let mut lines = vec![
        Line::from(Span::styled(
            header,
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(separator),
    ];

    for row in table.rows.iter().take(MAX_TABLE_ROWS) {
        let rendered = table
            .columns
            .iter()
            .zip(&widths)
            .map(|(name, width)| {
                let cell = row.get(name).map(cell_text).unwrap_or_default();
                format!("{:<width$}", clip(&cell, *width))
            })
            .collect::<Vec<_>>()
            .join("  ");
        lines.push(Line::from(rendered));
    }

    if table.rows.len() > MAX_TABLE_ROWS {
        lines.push(Line::from(Span::styled(
            format!("… ({} more rows)", table.rows.len() - MAX_TABLE_ROWS),
            Style::default().add_modifier(Modifier::ITALIC),
        )));
    }
    lines
}

fn column_widths(table: &SqlTable, max_width: usize) -> Vec<usize> {
    // Leave room for the two-space gaps between columns
    let gaps = table.columns.len().saturating_sub(1) * 2;
    let budget = max_width.saturating_sub(gaps).max(1);
    let cap = (budget / table.columns.len().max(1)).max(4);

    table
        .columns
        .iter()
        .map(|name| {
            let cells = table
                .rows
                .iter()
                .take(MAX_TABLE_ROWS)
                .map(|row| row.get(name).map(cell_text).unwrap_or_default().width())
                .max()
                .unwrap_or_default();
            name.width().max(cells).min(cap)
        })
        .collect()
}

fn cell_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn clip(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    let mut out = String::new();
    for c in text.chars() {
        if out.width() + 1 >= width {
            break;
        }
        out.push(c);
    }
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    fn has_modifier(line: &Line, modifier: Modifier) -> bool {
        line.spans
            .iter()
            .any(|s| s.style.add_modifier.contains(modifier))
    }

    #[test]
    fn test_fenced_code_skips_inline_markdown() {
        let theme = Theme::default();
        let text = "intro **loud**\n```\nlet y = 2 * *x*;\n```\nafter *quiet*";
        let lines = text_lines(text, 80, &theme);

        let intro = lines
            .iter()
            .find(|l| line_text(l).contains("loud"))
            .expect("missing intro line");
        assert!(has_modifier(intro, Modifier::BOLD));

        let fenced = lines
            .iter()
            .find(|l| line_text(l).contains("2 * *x*;"))
            .expect("fenced line must keep its asterisks");
        assert!(!has_modifier(fenced, Modifier::ITALIC));
        assert!(!has_modifier(fenced, Modifier::BOLD));

        let after = lines
            .iter()
            .find(|l| line_text(l).contains("quiet"))
            .expect("missing trailing line");
        assert!(has_modifier(after, Modifier::ITALIC));
    }
}
