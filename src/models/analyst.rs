use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::message::{ContentBlock, Turn};

/// A named semantic model file the analyst can reason over. Fetched once at
/// startup and immutable for the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SemanticModel {
    pub name: String,
    pub path: String,
}

/// Result of one executed SQL statement. `rows` keeps the column order of
/// `columns`; values stay as raw JSON since the warehouse types are opaque
/// to the client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SqlTable {
    pub columns: Vec<String>,
    pub rows: Vec<serde_json::Map<String, Value>>,
}

/// A structured reply from the backend, already normalized across the two
/// server modes. `tables` holds the results of the sql blocks in `content`,
/// in order, filled in by the action service before the reply reaches the
/// session.
#[derive(Debug, Clone, Default)]
pub struct AnalystReply {
    pub request_id: Option<String>,
    pub content: Vec<ContentBlock>,
    pub warnings: Vec<String>,
    pub conversation_id: Option<String>,
    pub tables: Vec<SqlTable>,
}

/// What the session hands to the transport when a send begins. The analyst
/// endpoint wants the whole turn history plus the semantic model file; the
/// chat endpoint wants a single message plus the server-tracked
/// conversation id.
#[derive(Debug, Clone)]
pub enum Outbound {
    Analyst {
        turns: Vec<Turn>,
        semantic_model: String,
    },
    Chat {
        message: String,
        conversation_id: Option<String>,
    },
}
