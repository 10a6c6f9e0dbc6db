use ratatui::{
    Frame,
    layout::Rect,
    style::Stylize,
    text::Line,
    widgets::{Block, BorderType, Borders, Padding, Paragraph},
};

/// Replaces the input box while a request is in flight.
#[derive(Default)]
pub struct Loading<'a> {
    message: Line<'a>,
}

impl<'a> Loading<'a> {
    pub fn new(message: impl Into<Line<'a>>) -> Loading<'a> {
        Loading {
            message: message.into(),
        }
    }

    pub fn render(&self, frame: &mut Frame, rect: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .padding(Padding::new(1, 1, 0, 0));
        frame.render_widget(
            Paragraph::new(self.message.clone()).italic().block(block),
            rect,
        );
    }
}
