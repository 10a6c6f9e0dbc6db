use ratatui::{
    Frame,
    layout::{Alignment, Rect},
    style::{Style, Stylize},
    text::{Line, Text},
    widgets::{Block, BorderType, Borders, Clear, Padding},
};
use ratatui_macros::span;

use super::utils;

/// Modal yes/no prompt layered over the screen that opened it. The opener
/// owns the outcome; this widget only tracks visibility and renders the
/// question text.
pub struct Confirm<'a> {
    title: Line<'a>,
    prompt: Line<'a>,
    showing: bool,
}

impl<'a> Confirm<'a> {
    pub fn new(title: impl Into<Line<'a>>) -> Confirm<'a> {
        Confirm {
            title: title.into(),
            prompt: Line::default(),
            showing: false,
        }
    }

    pub fn showing(&self) -> bool {
        self.showing
    }

    pub fn open(&mut self, prompt: impl Into<Line<'a>>) {
        self.prompt = prompt.into();
        self.showing = true;
    }

    pub fn close(&mut self) {
        self.showing = false;
    }

    pub fn render(&mut self, f: &mut Frame, area: Rect) {
        if !self.showing {
            return;
        }

        let max_width = (area.width as f32 * 0.8).ceil() as u16;
        let lines = utils::split_to_lines(self.prompt.spans.clone(), (max_width - 2) as usize);
        let popup = centered_rect(area, max_width, lines.len() as u16 + 2);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().light_blue())
            .padding(Padding::symmetric(1, 0))
            .title(self.title.clone())
            .title_bottom(Line::from(vec![
                span!(" "),
                span!("y").green().bold(),
                span!(" to confirm, ").white(),
                span!("n").green().bold(),
                span!(" to cancel ").white(),
            ]))
            .title_alignment(Alignment::Center);

        f.render_widget(Clear, popup);
        let inner = block.inner(popup);
        f.render_widget(block, popup);
        f.render_widget(Text::from(lines), inner);
    }
}

fn centered_rect(area: Rect, w: u16, h: u16) -> Rect {
    let x = area.x + area.width.saturating_sub(w) / 2;
    let y = area.y + area.height.saturating_sub(1) / 3;
    Rect::new(x, y, w, h)
}
