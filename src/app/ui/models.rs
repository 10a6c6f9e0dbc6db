use std::cmp::{max, min};

use crate::models::{Event, SemanticModel};
use eyre::Result;
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, BorderType, Borders, Cell, Clear, Padding, Row, Table, TableState},
};
use ratatui_macros::span;
use tokio::sync::mpsc;
use tui_textarea::Key;

use super::input_box::{self, InputBox};

/// Popup for picking the semantic model. Selection is a client-side switch;
/// the app discards the running conversation when the choice changes.
pub struct ModelsScreen<'a> {
    event_tx: mpsc::UnboundedSender<Event>,
    showing: bool,
    models: Vec<SemanticModel>,
    current: Option<usize>,
    state: TableState,

    search: InputBox<'a>,
    current_search: String,
}

impl<'a> ModelsScreen<'a> {
    pub fn new(
        models: Vec<SemanticModel>,
        current: Option<usize>,
        event_tx: mpsc::UnboundedSender<Event>,
    ) -> ModelsScreen<'a> {
        ModelsScreen {
            showing: false,
            state: TableState::default().with_selected(0),
            models,
            current,
            event_tx,
            search: InputBox::default().with_title(" Search "),
            current_search: String::new(),
        }
    }

    pub fn set_current(&mut self, index: usize) {
        if index < self.models.len() {
            self.current = Some(index);
        }
    }

    pub fn showing(&self) -> bool {
        self.showing
    }

    pub fn toggle_showing(&mut self) {
        self.showing = !self.showing;
    }

    fn filtered(&self) -> Vec<(usize, &SemanticModel)> {
        self.models
            .iter()
            .enumerate()
            .filter(|(_, model)| {
                if self.current_search.is_empty() {
                    return true;
                }
                model
                    .name
                    .to_lowercase()
                    .contains(&self.current_search.to_lowercase())
            })
            .collect()
    }

    fn next_row(&mut self) {
        let len = self.filtered().len();
        let i = match self.state.selected() {
            Some(i) => max(min(len as i32 - 1, i as i32 + 1), 0),
            None => 0,
        } as usize;

        self.state.select(Some(i));
    }

    fn prev_row(&mut self) {
        let i = match self.state.selected() {
            Some(i) => max(0, (i as i32) - 1),
            None => 0,
        } as usize;

        self.state.select(Some(i));
    }

    fn request_select_model(&mut self) -> Result<()> {
        let row = self.state.selected().unwrap_or(0);
        let filtered = self.filtered();
        if row >= filtered.len() {
            return Ok(());
        }

        let (index, _) = filtered[row];
        if self.current == Some(index) {
            return Ok(());
        }

        self.event_tx.send(Event::ModelSelected(index))?;
        Ok(())
    }

    pub fn render(&mut self, f: &mut Frame, area: Rect) {
        if !self.showing {
            return;
        }

        let instructions = vec![
            " ".into(),
            span!("q").green().bold(),
            span!(" to close, ").white(),
            span!("Enter").green().bold(),
            span!(" to select, ").white(),
            span!("/").green().bold(),
            span!(" to search ").white(),
        ];

        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::LightBlue))
            .padding(Padding::symmetric(1, 0))
            .title(Line::from(" Semantic Models ").bold())
            .title_alignment(Alignment::Center)
            .title_bottom(Line::from(instructions))
            .style(Style::default());
        f.render_widget(Clear, area);

        let inner = block.inner(area);

        let selected_row_style = Style::default()
            .add_modifier(Modifier::REVERSED)
            .add_modifier(Modifier::BOLD);
        let rows = build_rows(&self.filtered(), self.current);
        let table = Table::new(rows, [Constraint::Fill(1)])
            .block(block)
            .row_highlight_style(selected_row_style);
        f.render_stateful_widget(table, area, &mut self.state);
        let search_area = input_box::build_area(inner, ((inner.width as f32 * 0.9).ceil()) as u16);
        self.search.render(f, search_area);
    }

    pub fn handle_key_event(&mut self, event: &Event) -> Result<bool> {
        if self.search.showing() {
            match event {
                Event::KeyboardEsc | Event::KeyboardCtrlC => {
                    self.search.close();
                }
                Event::KeyboardEnter => {
                    self.current_search = self.search.close().unwrap_or_default();
                    self.state.select(Some(0));
                }
                _ => self.search.handle_key_event(event),
            }

            return Ok(false);
        }

        match event {
            Event::KeyboardCtrlL => {
                self.showing = !self.showing;
                return Ok(false);
            }

            Event::Quit => {
                self.showing = false;
                return Ok(true);
            }

            Event::KeyboardEsc => {
                self.showing = false;
                return Ok(false);
            }

            Event::KeyboardEnter => {
                self.request_select_model()?;
                self.showing = false;
                return Ok(false);
            }

            Event::KeyboardCharInput(input) => match input.key {
                Key::Char('j') => self.next_row(),
                Key::Char('k') => self.prev_row(),
                Key::Char(' ') => self.request_select_model()?,
                Key::Char('/') => {
                    self.search.open(&self.current_search);
                    return Ok(false);
                }
                Key::Char('q') => {
                    self.showing = false;
                    return Ok(false);
                }
                _ => {}
            },

            Event::UiScrollDown => self.next_row(),
            Event::UiScrollUp => self.prev_row(),
            _ => {}
        }

        Ok(false)
    }
}

// Rows own their cells so rendering can take `state` mutably afterwards.
fn build_rows(models: &[(usize, &SemanticModel)], current: Option<usize>) -> Vec<Row<'static>> {
    models
        .iter()
        .map(|(index, model)| {
            let mut style = Style::default();
            let mut marker = "[ ]";
            if current == Some(*index) {
                style = style.add_modifier(Modifier::BOLD).red();
                marker = "[*]";
            }

            let spans = vec![
                Span::styled(marker, style),
                Span::styled(" ", Style::default()),
                Span::styled(model.name.clone(), Style::default()),
                Span::styled(
                    format!("  ({})", model.path),
                    Style::default().add_modifier(Modifier::DIM),
                ),
            ];
            Row::new(vec![Cell::from(Text::from(Line::from(spans)))]).height(1)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(name: &str) -> SemanticModel {
        SemanticModel {
            name: name.to_string(),
            path: format!("models/{name}.yaml"),
        }
    }

    #[test]
    fn test_rows_own_their_cells() {
        let rows;
        {
            let models = vec![model("revenue"), model("churn")];
            let filtered: Vec<(usize, &SemanticModel)> = models.iter().enumerate().collect();
            rows = build_rows(&filtered, Some(1));
        }
        // The rows must stay usable after the models are gone
        assert_eq!(rows.len(), 2);
    }
}
