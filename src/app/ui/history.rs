use crate::models::{Action, ConversationSummary, Event};
use eyre::Result;
use ratatui::{
    Frame,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, BorderType, Borders, Clear, List, ListItem, ListState, Padding},
};
use ratatui_macros::span;
use tokio::sync::mpsc;
use tui_textarea::Key;

use super::{confirm::Confirm, utils};

const NO_CONVERSATIONS: &str = "No conversations found";

/// Popup listing the server-stored conversations. Enter loads one into the
/// session, `d` deletes after confirmation.
pub struct HistoryScreen<'a> {
    showing: bool,

    action_tx: mpsc::UnboundedSender<Action>,

    conversations: Vec<ConversationSummary>,
    confirm_delete: Confirm<'a>,

    current_conversation: Option<String>,
    list_state: ListState,
}

impl<'a> HistoryScreen<'a> {
    pub fn new(action_tx: mpsc::UnboundedSender<Action>) -> HistoryScreen<'a> {
        HistoryScreen {
            action_tx,
            showing: false,
            conversations: vec![],
            current_conversation: None,
            list_state: ListState::default(),
            confirm_delete: Confirm::new(" Delete Conversation "),
        }
    }

    pub fn with_conversations(
        mut self,
        conversations: Vec<ConversationSummary>,
    ) -> HistoryScreen<'a> {
        self.set_conversations(conversations);
        self
    }

    pub fn set_conversations(&mut self, conversations: Vec<ConversationSummary>) {
        self.conversations = conversations;
        self.conversations.dedup_by(|a, b| a.id == b.id);
    }

    pub fn showing(&self) -> bool {
        self.showing
    }

    pub fn toggle_showing(&mut self) {
        self.showing = !self.showing;
        if self.showing {
            self.move_cursor_to_current();
        }
    }

    pub fn remove_conversation(&mut self, conversation: &str) {
        if let Some(pos) = self
            .conversations
            .iter()
            .position(|c| c.id == conversation)
        {
            if self.current_conversation.as_deref() == Some(conversation) {
                self.current_conversation = None;
            }
            self.conversations.remove(pos);
        }
    }

    pub fn set_current_conversation(&mut self, conversation: impl Into<String>) {
        self.current_conversation = Some(conversation.into());
        self.move_cursor_to_current();
    }

    pub fn clear_current_conversation(&mut self) {
        self.current_conversation = None;
    }

    fn move_cursor_to_current(&mut self) {
        if let Some(current) = self.current_conversation.as_ref() {
            let pos = self.conversations.iter().position(|c| c.id == *current);
            self.list_state.select(pos);
        }
    }

    fn next_row(&mut self) {
        if self.conversations.is_empty() {
            self.list_state.select(None);
            return;
        }

        let i = match self.list_state.selected() {
            Some(i) => (i + 1).min(self.conversations.len() - 1),
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    fn prev_row(&mut self) {
        if self.conversations.is_empty() {
            self.list_state.select(None);
            return;
        }

        let i = match self.list_state.selected() {
            Some(i) => i.saturating_sub(1),
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    fn pageup(&mut self) {
        for _ in 0..10 {
            self.prev_row();
        }
    }

    fn pagedown(&mut self) {
        for _ in 0..10 {
            self.next_row();
        }
    }

    fn selected_conversation(&self) -> Option<&ConversationSummary> {
        self.list_state
            .selected()
            .and_then(|i| self.conversations.get(i))
    }

    pub fn handle_key_event(&mut self, event: &Event) -> Result<bool> {
        if self.confirm_delete.showing() {
            if let Event::KeyboardCharInput(input) = event {
                match input.key {
                    Key::Char('y') => {
                        self.on_delete()?;
                        self.confirm_delete.close();
                    }
                    Key::Char('n') | Key::Char('q') => {
                        self.confirm_delete.close();
                    }
                    _ => {}
                }
            }
            return Ok(false);
        }

        match event {
            Event::KeyboardCtrlH => {
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
                let id = match self.selected_conversation() {
                    Some(c) => c.id.clone(),
                    None => return Ok(false),
                };

                self.showing = false;
                self.action_tx.send(Action::LoadConversation(id))?;
                return Ok(false);
            }

            Event::KeyboardCharInput(input) => match input.key {
                Key::Char('j') => self.next_row(),
                Key::Char('k') => self.prev_row(),
                Key::Char('q') => {
                    self.showing = false;
                    return Ok(false);
                }
                Key::Char('d') => {
                    let conversation = match self.selected_conversation() {
                        Some(c) => c,
                        None => return Ok(false),
                    };

                    let quest = vec![
                        span!("Do you want to delete "),
                        span!(format!("\"{}\"", conversation.title))
                            .add_modifier(Modifier::BOLD | Modifier::ITALIC)
                            .yellow(),
                        span!("?"),
                    ];
                    self.confirm_delete.open(quest);
                }
                _ => {}
            },

            Event::UiScrollUp => self.prev_row(),
            Event::UiScrollDown => self.next_row(),
            Event::UiScrollPageUp => self.pageup(),
            Event::UiScrollPageDown => self.pagedown(),

            _ => {}
        }
        Ok(false)
    }

    fn on_delete(&mut self) -> Result<()> {
        let id = match self.selected_conversation() {
            Some(c) => c.id.clone(),
            None => return Ok(()),
        };

        self.action_tx.send(Action::DeleteConversation {
            id,
            quiet: false,
        })?;
        Ok(())
    }

    pub fn render(&mut self, f: &mut Frame, area: Rect) {
        if !self.showing {
            return;
        }

        let instructions: Vec<Span> = vec![
            " ".into(),
            span!("q").green().bold(),
            span!(" to close, ").white(),
            span!("Enter").green().bold(),
            span!(" to select, ").white(),
            span!("d").green().bold(),
            span!(" to delete ").white(),
        ];

        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::LightBlue))
            .padding(Padding::new(1, 1, 0, 0))
            .title(Line::from(" Conversations ").bold())
            .title_alignment(Alignment::Center)
            .title_bottom(Line::from(instructions))
            .style(Style::default());

        f.render_widget(Clear, area);
        let inner = block.inner(area);
        let items = self.build_list_items((inner.width.max(3) - 2) as usize);

        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
        f.render_stateful_widget(list, inner, &mut self.list_state);

        self.confirm_delete.render(f, inner);
    }

    fn build_list_items(&mut self, max_width: usize) -> Vec<ListItem<'static>> {
        if self.conversations.is_empty() {
            self.list_state.select(None);
            return vec![ListItem::new(
                Text::from(NO_CONVERSATIONS).alignment(Alignment::Center),
            )];
        }

        self.conversations
            .iter()
            .map(|c| {
                let mut spans = vec![span!(c.title.clone())];
                if self.current_conversation.as_deref() == Some(&c.id) {
                    spans.push(Span::styled(" ", Style::default()));
                    spans.push(Span::styled("[*]", Style::default().fg(Color::LightRed)));
                }

                let lines = utils::split_to_lines(spans, max_width.max(3) - 2);
                ListItem::new(Text::from(lines))
            })
            .collect()
    }
}
