use ratatui::{
    layout::Alignment,
    widgets::{Block, BorderType, Borders, Padding},
};

/// Builds the main prompt editor with its default frame and placeholder.
pub fn build_textarea<'a>() -> tui_textarea::TextArea<'a> {
    let mut textarea = tui_textarea::TextArea::default();
    textarea.set_block(
        Block::default()
            .title(" Input ")
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .title_alignment(Alignment::Left)
            .padding(Padding::new(1, 1, 0, 0)),
    );
    textarea.set_placeholder_text("Ask a question about your data...");
    textarea
}
