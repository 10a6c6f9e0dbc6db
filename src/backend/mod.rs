pub mod proxy;

pub use proxy::CortexProxy;

#[cfg(test)]
use mockall::automock;

use crate::config::ServerConfig;
use crate::models::{AnalystReply, Conversation, ConversationSummary, SemanticModel, SqlTable, Turn};
use async_trait::async_trait;
use eyre::Result;
use std::sync::Arc;
use thiserror::Error;

/// Uniform failure for any non-2xx response. The client does not consume a
/// machine-readable error taxonomy beyond the optional `detail` string in
/// the body; when that is absent the HTTP status text is used.
#[derive(Debug, Error)]
#[error("analyst API error ({status}): {detail}")]
pub struct ApiError {
    pub status: u16,
    pub detail: String,
}

/// Stateless request/response wrappers around the backend proxy endpoints.
/// Each call issues exactly one HTTP request and parses JSON only on
/// success.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait AnalystBackend {
    async fn list_semantic_models(&self) -> Result<Vec<SemanticModel>>;
    async fn send_message(&self, turns: &[Turn], semantic_model: &str) -> Result<AnalystReply>;
    async fn execute_sql(&self, query: &str) -> Result<SqlTable>;
    async fn submit_feedback<'a>(
        &self,
        request_id: &str,
        positive: bool,
        message: Option<&'a str>,
    ) -> Result<()>;
    async fn list_conversations(&self) -> Result<Vec<ConversationSummary>>;
    async fn get_conversation(&self, id: &str) -> Result<Conversation>;
    async fn delete_conversation(&self, id: &str) -> Result<()>;
    async fn send_chat<'a>(
        &self,
        message: &str,
        conversation_id: Option<&'a str>,
    ) -> Result<AnalystReply>;
}

pub type ArcBackend = Arc<dyn AnalystBackend + Send + Sync>;

pub fn new_backend(config: &ServerConfig) -> ArcBackend {
    Arc::new(CortexProxy::from(config))
}
