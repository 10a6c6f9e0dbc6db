use std::{io, time};

use crate::models::{Action, ConversationSummary, Event};
use crate::session::ChatSession;
use crossterm::{
    event::{DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen},
};
use eyre::Result;
use ratatui::crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    layout::{Alignment, Constraint, Direction, Layout, Margin},
    prelude::{Backend, CrosstermBackend},
    style::Stylize,
    text::Line,
    widgets::{Paragraph, Scrollbar, ScrollbarOrientation},
};
use ratatui_macros::span;
use syntect::highlighting::Theme;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::{
    app::app_state::AppState,
    app::ui::{
        HelpScreen, HistoryScreen, Loading, ModelsScreen, Notice, build_textarea, input_box,
        input_box::InputBox, utils,
    },
};

use super::services::EventService;

const MIN_WIDTH: u16 = 80;

pub struct InitProps {
    pub session: ChatSession,
    pub conversations: Vec<ConversationSummary>,
    pub connected: bool,
}

struct FeedbackDraft {
    request_id: String,
    positive: bool,
}

pub struct App<'a> {
    action_tx: mpsc::UnboundedSender<Action>,
    event_tx: mpsc::UnboundedSender<Event>,

    events: &'a mut EventService,

    app_state: AppState<'a>,
    models_screen: ModelsScreen<'a>,
    help_screen: HelpScreen<'a>,
    history_screen: HistoryScreen<'a>,
    input: tui_textarea::TextArea<'a>,

    feedback_input: InputBox<'a>,
    feedback_draft: Option<FeedbackDraft>,

    notice: Notice,
    loading: Loading<'a>,
    connected: bool,

    cancel_token: CancellationToken,
}

impl<'a> App<'a> {
    pub fn new(
        theme: Theme,
        action_tx: mpsc::UnboundedSender<Action>,
        events: &'a mut EventService,
        cancel_token: CancellationToken,

        init_props: InitProps,
    ) -> App<'a> {
        let theme = Box::leak(Box::new(theme));
        let event_tx = events.event_tx();
        let models_screen = ModelsScreen::new(
            init_props.session.semantic_models().to_vec(),
            init_props.session.selected_model_index(),
            event_tx.clone(),
        );
        App {
            action_tx: action_tx.clone(),
            event_tx,
            events,
            app_state: AppState::new(theme, init_props.session),
            input: build_textarea(),
            loading: Loading::new(vec![
                span!("Analyzing your question, please wait...").gray(),
            ]),
            help_screen: HelpScreen::new(),
            history_screen: HistoryScreen::new(action_tx)
                .with_conversations(init_props.conversations),
            models_screen,
            feedback_input: InputBox::default()
                .with_placeholder("Optional comment, Enter to submit..."),
            feedback_draft: None,
            notice: Notice::default(),
            connected: init_props.connected,
            cancel_token,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        let stdout = io::stdout();
        let mut stdout = stdout.lock();

        enable_raw_mode()?;
        execute!(
            stdout,
            EnterAlternateScreen,
            EnableMouseCapture,
            EnableBracketedPaste
        )?;

        let term_backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(term_backend)?;
        let result = self.start_loop(&mut terminal).await;

        self.cancel_token.cancel();

        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture,
            DisableBracketedPaste
        )?;

        terminal.show_cursor()?;
        result
    }

    async fn handle_key_event(&mut self) -> bool {
        let event = self.events.next().await;

        // Handle critical events first
        if let Some(stop) = self.handle_global_event(&event).await {
            return stop;
        }

        // Handle screen events
        if self.help_screen.showing() {
            if self.help_screen.handle_key_event(&event) {
                self.event_tx.send(Event::Quit).ok();
            }
            return false;
        }

        if self.models_screen.showing() {
            match self.models_screen.handle_key_event(&event) {
                Ok(true) => {
                    self.event_tx.send(Event::Quit).ok();
                }
                Ok(false) => {}
                Err(err) => self.notice.error(err.to_string()),
            }
            return false;
        }

        if self.history_screen.showing() {
            match self.history_screen.handle_key_event(&event) {
                Ok(true) => {
                    self.event_tx.send(Event::Quit).ok();
                }
                Ok(false) => {}
                Err(err) => self.notice.error(err.to_string()),
            }
            return false;
        }

        if self.feedback_input.showing() {
            self.handle_feedback_event(&event);
            return false;
        }

        self.handle_input_event(event);
        false
    }

    async fn handle_global_event(&mut self, event: &Event) -> Option<bool> {
        match &event {
            Event::Quit => {
                sleep(time::Duration::from_millis(100)).await;
                return Some(true);
            }

            Event::AnalystReply(reply) => {
                self.connected = true;
                self.app_state.session.apply_reply(reply.clone());
                if let Some(id) = self.app_state.session.conversation_id() {
                    self.history_screen.set_current_conversation(id);
                }
                self.app_state.sync_state();
                self.app_state.scroll.last();
                Some(false)
            }

            Event::SendFailed(err) => {
                self.app_state.session.fail_send(err);
                self.app_state.sync_state();
                self.app_state.scroll.last();
                Some(false)
            }

            Event::ConversationLoaded(convo) => {
                self.history_screen.set_current_conversation(convo.id());
                let title = convo.title().to_string();
                self.app_state.session.adopt(convo.clone());
                self.app_state.rebuild();
                self.input = build_textarea();
                self.notice.info(format!("Switched to \"{}\"", title));
                Some(false)
            }

            Event::ConversationDeleted(id) => {
                self.history_screen.remove_conversation(id);
                if self.app_state.session.conversation_id() == Some(id.as_str()) {
                    let _ = self.app_state.session.clear();
                    self.history_screen.clear_current_conversation();
                    self.app_state.rebuild();
                }
                Some(false)
            }

            Event::ModelSelected(index) => {
                self.app_state.session.select_model(*index);
                self.models_screen.set_current(*index);
                self.history_screen.clear_current_conversation();
                self.app_state.rebuild();
                if let Some(model) = self.app_state.session.selected_model() {
                    self.notice
                        .info(format!("Semantic model: \"{}\"", model.name));
                }
                Some(false)
            }

            Event::Notice(msg) => {
                self.notice.add_message(msg.clone());
                Some(false)
            }

            // Fallthrough to the next event handler
            _ => None,
        }
    }

    fn handle_input_event(&mut self, event: Event) {
        match event {
            Event::KeyboardCharInput(c) => {
                if !self.app_state.waiting_for_backend() {
                    self.input.input(c);
                }
            }

            Event::KeyboardCtrlC => {
                if self.on_waiting_backend(true) {
                    return;
                }

                if !self.input.lines().is_empty() {
                    self.input = build_textarea();
                }
            }

            Event::KeyboardF1 => self.help_screen.toggle_showing(),

            Event::KeyboardCtrlN => self.handle_new_conversation(),

            Event::KeyboardCtrlH => {
                if !self.on_waiting_backend(true) {
                    self.history_screen.toggle_showing();
                }
            }

            Event::KeyboardCtrlL => self.models_screen.toggle_showing(),

            Event::KeyboardCtrlY => self.handle_copy_last_answer(),

            Event::KeyboardF2 => self.handle_feedback(true),
            Event::KeyboardF3 => self.handle_feedback(false),

            Event::KeyboardPaste(text) => {
                self.input.set_yank_text(text.replace('\r', "\n"));
                self.input.paste();
            }

            Event::KeyboardAltEnter => {
                if !self.on_waiting_backend(false) {
                    self.input.insert_newline();
                }
            }

            Event::KeyboardEnter => self.handle_send_prompt(),

            Event::UiScrollDown => self.app_state.scroll.down(),
            Event::UiScrollUp => self.app_state.scroll.up(),
            Event::UiScrollPageDown => self.app_state.scroll.page_down(),
            Event::UiScrollPageUp => self.app_state.scroll.page_up(),
            _ => {}
        }
    }

    fn handle_feedback_event(&mut self, event: &Event) {
        match event {
            Event::KeyboardEsc | Event::KeyboardCtrlC => {
                self.feedback_input.close();
                self.feedback_draft = None;
            }

            Event::KeyboardEnter => {
                let text = self.feedback_input.close().unwrap_or_default();
                if let Some(draft) = self.feedback_draft.take() {
                    let message = match text.trim() {
                        "" => None,
                        comment => Some(comment.to_string()),
                    };
                    let _ = self.action_tx.send(Action::SubmitFeedback {
                        request_id: draft.request_id,
                        positive: draft.positive,
                        message,
                    });
                }
            }

            _ => self.feedback_input.handle_key_event(event),
        }
    }

    fn render<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        terminal.draw(|f| {
            let current_width = f.area().width;
            if !is_line_width_sufficient(current_width) {
                f.render_widget(
                    Paragraph::new(utils::split_to_lines(
                        format!(
                            "I'm too small, make me bigger! I need at least {} cells (current: {})",
                            MIN_WIDTH, current_width
                        ),
                        (current_width - 2) as usize,
                    ))
                    .alignment(Alignment::Left),
                    f.area(),
                );
                return;
            }

            let textarea_len = (self.input.lines().len() + 2).try_into().unwrap();
            let layout = Layout::default()
                .direction(Direction::Vertical)
                .constraints(vec![
                    Constraint::Min(1),
                    Constraint::Max(textarea_len),
                    Constraint::Length(1),
                ])
                .split(f.area());

            if layout[0].width as usize != self.app_state.last_known_width
                || layout[0].height as usize != self.app_state.last_known_height
            {
                self.app_state.set_rect(layout[0]);
            }

            self.app_state.bubble_list.render(
                layout[0],
                f.buffer_mut(),
                self.app_state.scroll.position,
            );

            f.render_stateful_widget(
                Scrollbar::new(ScrollbarOrientation::VerticalRight)
                    .end_symbol(None)
                    .begin_symbol(None),
                layout[0].inner(Margin {
                    vertical: 1,
                    horizontal: 1,
                }),
                &mut self.app_state.scroll.scrollbar_state,
            );

            self.help_screen.render_help_line(f, layout[2]);
            let status = if self.connected {
                span!("● online").light_green()
            } else {
                span!("● offline").light_red()
            };
            f.render_widget(Line::from(status).right_aligned(), layout[2]);
            if self.app_state.waiting_for_backend() {
                self.loading.render(f, layout[1]);
            } else {
                f.render_widget(&self.input, layout[1]);
            }

            self.help_screen
                .render(f, utils::popup_area(f.area(), 40, 30));

            self.models_screen
                .render(f, utils::popup_area(f.area(), 40, 60));

            self.history_screen
                .render(f, utils::popup_area(f.area(), 70, 90));

            self.feedback_input
                .render(f, input_box::build_area(f.area(), 60));

            self.notice.render(f, utils::notice_area(f.area(), 30));
        })?;
        Ok(())
    }

    async fn start_loop<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        loop {
            self.render(terminal)?;
            if self.handle_key_event().await {
                return Ok(());
            }
        }
    }

    fn handle_send_prompt(&mut self) {
        if self.on_waiting_backend(false) {
            return;
        }

        let input_str = self.input.lines().join("\n");
        if input_str.trim().is_empty() {
            return;
        }

        let outbound = match self.app_state.session.begin_send(&input_str) {
            Some(outbound) => outbound,
            // Only reachable in analyst mode when no semantic model is
            // available
            None => {
                self.notice
                    .warning("Select a semantic model first (Ctrl+l)");
                return;
            }
        };

        self.input = build_textarea();
        self.app_state.sync_state();
        self.app_state.scroll.last();

        let _ = self.action_tx.send(Action::SendPrompt(outbound));
    }

    fn handle_new_conversation(&mut self) {
        if self.on_waiting_backend(true) {
            return;
        }

        if self.app_state.session.len() < 2 {
            return;
        }

        if let Some(id) = self.app_state.session.clear() {
            let _ = self
                .action_tx
                .send(Action::DeleteConversation { id, quiet: true });
        }
        self.history_screen.clear_current_conversation();
        self.app_state.rebuild();
        self.input = build_textarea();
    }

    fn handle_copy_last_answer(&mut self) {
        let content = self
            .app_state
            .session
            .turns()
            .iter()
            .rev()
            .find(|turn| turn.is_analyst())
            .map(|turn| turn.text());

        match content {
            Some(content) if !content.is_empty() => {
                let _ = self.action_tx.send(Action::CopyText {
                    content,
                    notice: true,
                });
            }
            _ => self.notice.warning("No answer to copy yet"),
        }
    }

    fn handle_feedback(&mut self, positive: bool) {
        if self.on_waiting_backend(true) {
            return;
        }

        let request_id = match self.app_state.session.last_request_id() {
            Some(id) => id.to_string(),
            None => {
                self.notice.warning("No answer to rate yet");
                return;
            }
        };

        let title = if positive {
            " Mark Answer Helpful "
        } else {
            " Mark Answer Wrong "
        };
        self.feedback_input.set_title(title);
        self.feedback_draft = Some(FeedbackDraft {
            request_id,
            positive,
        });
        self.feedback_input.open("");
    }

    fn on_waiting_backend(&mut self, notice: bool) -> bool {
        if self.app_state.waiting_for_backend() && notice {
            self.notice
                .warning("Waiting for the analyst to respond, please wait...");
        }
        self.app_state.waiting_for_backend()
    }
}

fn is_line_width_sufficient(line_width: u16) -> bool {
    line_width >= MIN_WIDTH
}
