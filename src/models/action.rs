use super::Outbound;

pub enum Action {
    SendPrompt(Outbound),

    SubmitFeedback {
        request_id: String,
        positive: bool,
        message: Option<String>,
    },

    LoadConversation(String), // Conversation ID
    DeleteConversation {
        id: String,
        // Best-effort background deletes (clear-on-new-chat) log failures
        // instead of surfacing them
        quiet: bool,
    },

    CopyText {
        content: String,
        notice: bool,
    },
}
