use std::sync::Arc;

use tokio::sync::mpsc;
use tui_textarea::Input;

use super::{AnalystReply, Conversation};

#[derive(Debug)]
pub enum Event {
    Notice(crate::models::NoticeMessage),

    AnalystReply(AnalystReply),
    SendFailed(String),

    ConversationLoaded(Conversation),
    ConversationDeleted(String),

    // Index into the session's semantic model list
    ModelSelected(usize),

    KeyboardCharInput(Input),
    KeyboardEsc,
    KeyboardEnter,
    KeyboardAltEnter,
    KeyboardCtrlC,
    KeyboardCtrlN,
    KeyboardCtrlH,
    KeyboardCtrlL,
    KeyboardCtrlY,
    KeyboardF1,
    KeyboardF2,
    KeyboardF3,
    KeyboardPaste(String),

    Quit,

    UiTick,
    UiScrollUp,
    UiScrollDown,
    UiScrollPageUp,
    UiScrollPageDown,
}

#[async_trait::async_trait]
pub trait EventTx {
    async fn send(&self, event: Event) -> Result<(), mpsc::error::SendError<Event>>;
}

#[async_trait::async_trait]
impl EventTx for mpsc::Sender<Event> {
    async fn send(&self, event: Event) -> Result<(), mpsc::error::SendError<Event>> {
        self.send(event).await
    }
}

#[async_trait::async_trait]
impl EventTx for mpsc::UnboundedSender<Event> {
    async fn send(&self, event: Event) -> Result<(), mpsc::error::SendError<Event>> {
        self.send(event)
    }
}

pub type ArcEventTx = Arc<dyn EventTx + Send + Sync>;
