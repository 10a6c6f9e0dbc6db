#[cfg(test)]
#[path = "message_test.rs"]
mod tests;

use serde::{Deserialize, Serialize};

use super::analyst::SqlTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Analyst,
    System,
}

/// One typed fragment of a turn's payload, exactly as the service sends it.
/// The tag is closed on purpose: a block type this client does not know how
/// to render is a deserialization error, not a silently dropped fragment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentBlock {
    Text { text: String },
    Suggestions { suggestions: Vec<String> },
    Sql { statement: String },
}

/// One message in the conversation. Turns are append-only and never mutated
/// after creation; clearing the chat or switching the semantic model drops
/// the whole list.
#[derive(Debug, Clone)]
pub struct Turn {
    id: String,
    role: Role,
    content: Vec<ContentBlock>,
    request_id: Option<String>,
    // Result tables, aligned with the sql blocks in `content` in order
    tables: Vec<SqlTable>,
    error: bool,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl Turn {
    pub fn new(role: Role, content: Vec<ContentBlock>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role,
            content,
            request_id: None,
            tables: vec![],
            error: false,
            created_at: chrono::Utc::now(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, vec![ContentBlock::Text { text: text.into() }])
    }

    pub fn analyst(content: Vec<ContentBlock>) -> Self {
        Self::new(Role::Analyst, content)
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new(Role::System, vec![ContentBlock::Text { text: text.into() }])
    }

    pub fn error(text: impl Into<String>) -> Self {
        let mut turn = Self::system(text);
        turn.error = true;
        turn
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn with_tables(mut self, tables: Vec<SqlTable>) -> Self {
        self.tables = tables;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &[ContentBlock] {
        &self.content
    }

    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    pub fn tables(&self) -> &[SqlTable] {
        &self.tables
    }

    pub fn is_error(&self) -> bool {
        self.error
    }

    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }

    pub fn is_analyst(&self) -> bool {
        self.role == Role::Analyst
    }

    pub fn created_at(&self) -> chrono::DateTime<chrono::Utc> {
        self.created_at
    }

    /// Concatenation of the text blocks, used for clipboard copy
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn sql_statements(&self) -> Vec<&str> {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Sql { statement } => Some(statement.as_str()),
                _ => None,
            })
            .collect()
    }
}
