pub mod action;
pub mod analyst;
pub mod conversation;
pub mod event;
pub mod message;
pub mod notice;

pub use action::*;
pub use analyst::*;
pub use conversation::{Conversation, ConversationSummary};
pub use event::{ArcEventTx, Event, EventTx};
pub use message::{ContentBlock, Role, Turn};
pub use notice::*;
