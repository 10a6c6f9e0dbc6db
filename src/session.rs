#[cfg(test)]
#[path = "session_test.rs"]
mod tests;

use crate::config::{Configuration, ServerMode, constants::HELLO_MESSAGE};
use crate::models::{AnalystReply, Conversation, Outbound, SemanticModel, Turn};

/// In-memory conversation state for one client instance: the ordered turn
/// list, the selected semantic model, the server-tracked conversation id
/// and the single-flight guard. Constructed once at startup and torn down
/// with the app; there is no process-wide state.
///
/// The guard is a plain flag, not a queue: while a request is outstanding
/// any further send is dropped, never buffered or cancelled.
pub struct ChatSession {
    mode: ServerMode,
    turns: Vec<Turn>,
    semantic_models: Vec<SemanticModel>,
    selected_model: Option<usize>,
    conversation_id: Option<String>,
    last_request_id: Option<String>,
    in_flight: bool,
}

impl ChatSession {
    pub fn new(mode: ServerMode, semantic_models: Vec<SemanticModel>) -> Self {
        let selected_model = if semantic_models.is_empty() {
            None
        } else {
            Some(0)
        };
        Self {
            mode,
            turns: vec![hello_turn()],
            semantic_models,
            selected_model,
            conversation_id: None,
            last_request_id: None,
            in_flight: false,
        }
    }

    /// Start a send. Returns the outbound prompt, or `None` when the text
    /// is blank or a request is already in flight; in the `None` case no
    /// turn is appended and nothing must be sent.
    pub fn begin_send(&mut self, text: &str) -> Option<Outbound> {
        let text = text.trim();
        if text.is_empty() || self.in_flight {
            return None;
        }

        let turn = Turn::user(text);
        let outbound = match self.mode {
            ServerMode::Analyst => Outbound::Analyst {
                // The analyst endpoint wants the whole history; system
                // turns (hello, warnings, errors) are local only
                turns: self
                    .turns
                    .iter()
                    .filter(|t| t.is_user() || t.is_analyst())
                    .cloned()
                    .chain(std::iter::once(turn.clone()))
                    .collect(),
                semantic_model: self.selected_model()?.path.clone(),
            },
            ServerMode::Chat => Outbound::Chat {
                message: text.to_string(),
                conversation_id: self.conversation_id.clone(),
            },
        };

        self.turns.push(turn);
        self.in_flight = true;
        Some(outbound)
    }

    /// A reply arrived: append the analyst turn (plus one system turn per
    /// warning), remember ids, release the guard.
    pub fn apply_reply(&mut self, reply: AnalystReply) {
        let mut turn = Turn::analyst(reply.content).with_tables(reply.tables);
        if let Some(request_id) = &reply.request_id {
            turn = turn.with_request_id(request_id);
        }
        self.turns.push(turn);

        for warning in reply.warnings {
            self.turns.push(Turn::system(format!("Warning: {warning}")));
        }

        if reply.conversation_id.is_some() {
            self.conversation_id = reply.conversation_id;
        }
        self.last_request_id = reply.request_id;
        self.in_flight = false;
    }

    /// The send failed: one synthetic system-error turn carrying the error
    /// text, guard released. Same shape for network errors and non-2xx.
    pub fn fail_send(&mut self, error: &str) {
        self.turns.push(Turn::error(error));
        self.in_flight = false;
    }

    /// Reset the turn list. Returns the conversation id that was active so
    /// the caller can issue a best-effort background delete; the id is
    /// nulled either way.
    pub fn clear(&mut self) -> Option<String> {
        self.turns = vec![hello_turn()];
        self.last_request_id = None;
        self.conversation_id.take()
    }

    /// Switching semantic model always discards the current conversation
    /// client-side; no confirmation, no merge. Selecting the already-active
    /// model is a no-op.
    pub fn select_model(&mut self, index: usize) {
        if index >= self.semantic_models.len() || self.selected_model == Some(index) {
            return;
        }
        self.selected_model = Some(index);
        self.turns = vec![hello_turn()];
        self.last_request_id = None;
        self.conversation_id = None;
    }

    /// Replace local state with a conversation loaded from the server.
    pub fn adopt(&mut self, conversation: Conversation) {
        self.conversation_id = Some(conversation.id().to_string());
        self.turns = conversation.into_turns();
        self.last_request_id = None;
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn mode(&self) -> ServerMode {
        self.mode
    }

    pub fn conversation_id(&self) -> Option<&str> {
        self.conversation_id.as_deref()
    }

    pub fn last_request_id(&self) -> Option<&str> {
        self.last_request_id.as_deref()
    }

    pub fn semantic_models(&self) -> &[SemanticModel] {
        &self.semantic_models
    }

    pub fn selected_model(&self) -> Option<&SemanticModel> {
        self.selected_model.and_then(|i| self.semantic_models.get(i))
    }

    pub fn selected_model_index(&self) -> Option<usize> {
        self.selected_model
    }

    pub fn last_turn(&self) -> Option<&Turn> {
        self.turns.last()
    }
}

fn hello_turn() -> Turn {
    Turn::system(
        Configuration::instance()
            .general
            .hello_message
            .as_deref()
            .unwrap_or(HELLO_MESSAGE),
    )
}
