#[cfg(test)]
#[path = "proxy_test.rs"]
mod tests;

use crate::backend::{AnalystBackend, ApiError};
use crate::config::{ServerConfig, constants::DEFAULT_ENDPOINT, user_agent};
use crate::models::{
    AnalystReply, ContentBlock, Conversation, ConversationSummary, Role, SemanticModel, SqlTable,
    Turn,
};
use async_trait::async_trait;
use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time;

pub struct CortexProxy {
    endpoint: String,
    timeout: Option<time::Duration>,
}

#[async_trait]
impl AnalystBackend for CortexProxy {
    async fn list_semantic_models(&self) -> Result<Vec<SemanticModel>> {
        let res = self
            .get(&format!("{}/semantic-models", self.endpoint))
            .send()
            .await
            .wrap_err("listing semantic models")?;
        let res = check_status(res).await?;
        let res = res
            .json::<ModelListResponse>()
            .await
            .wrap_err("parsing semantic model list")?;
        Ok(res.models)
    }

    async fn send_message(&self, turns: &[Turn], semantic_model: &str) -> Result<AnalystReply> {
        let body = MessageRequest {
            messages: turns.iter().map(WireMessage::from).collect(),
            // The service expects a stage reference, hence the @ prefix
            semantic_model_file: format!("@{}", semantic_model),
        };

        let res = self
            .post(&format!("{}/analyst/message", self.endpoint))
            .json(&body)
            .send()
            .await
            .wrap_err("sending analyst message")?;
        let res = check_status(res).await?;
        let res = res
            .json::<MessageResponse>()
            .await
            .wrap_err("parsing analyst reply")?;

        Ok(AnalystReply {
            request_id: res.request_id,
            content: res.message.content,
            warnings: res.warnings.into_iter().map(|w| w.message).collect(),
            conversation_id: None,
            tables: vec![],
        })
    }

    async fn execute_sql(&self, query: &str) -> Result<SqlTable> {
        let res = self
            .post(&format!("{}/execute-sql", self.endpoint))
            .json(&SqlRequest {
                query: query.to_string(),
            })
            .send()
            .await
            .wrap_err("executing SQL")?;
        let res = check_status(res).await?;
        let res = res
            .json::<SqlResponse>()
            .await
            .wrap_err("parsing SQL result")?;

        // The proxy reports warehouse-side failures as success=false with
        // a 200 status
        if !res.success {
            return Err(ApiError {
                status: 200,
                detail: res
                    .error
                    .unwrap_or_else(|| "SQL execution failed".to_string()),
            }
            .into());
        }

        Ok(SqlTable {
            columns: res.columns,
            rows: res.data,
        })
    }

    async fn submit_feedback<'a>(
        &self,
        request_id: &str,
        positive: bool,
        message: Option<&'a str>,
    ) -> Result<()> {
        let res = self
            .post(&format!("{}/analyst/feedback", self.endpoint))
            .json(&FeedbackRequest {
                request_id: request_id.to_string(),
                positive,
                feedback_message: message.map(str::to_string),
            })
            .send()
            .await
            .wrap_err("submitting feedback")?;
        check_status(res).await?;
        Ok(())
    }

    async fn list_conversations(&self) -> Result<Vec<ConversationSummary>> {
        let res = self
            .get(&format!("{}/conversations", self.endpoint))
            .send()
            .await
            .wrap_err("listing conversations")?;
        let res = check_status(res).await?;
        let res = res
            .json::<Vec<ConversationSummary>>()
            .await
            .wrap_err("parsing conversation list")?;
        Ok(res)
    }

    async fn get_conversation(&self, id: &str) -> Result<Conversation> {
        let res = self
            .get(&format!("{}/conversations/{}", self.endpoint, id))
            .send()
            .await
            .wrap_err("loading conversation")?;
        let res = check_status(res).await?;
        let res = res
            .json::<ConversationResponse>()
            .await
            .wrap_err("parsing conversation")?;

        let turns = res
            .messages
            .into_iter()
            .map(|msg| Turn::new(msg.role, msg.content))
            .collect();
        Ok(Conversation::new(res.id).with_turns(turns))
    }

    async fn delete_conversation(&self, id: &str) -> Result<()> {
        let res = self
            .request(
                reqwest::Method::DELETE,
                &format!("{}/conversations/{}", self.endpoint, id),
            )
            .send()
            .await
            .wrap_err("deleting conversation")?;
        check_status(res).await?;
        Ok(())
    }

    async fn send_chat<'a>(
        &self,
        message: &str,
        conversation_id: Option<&'a str>,
    ) -> Result<AnalystReply> {
        let res = self
            .post(&format!("{}/messages", self.endpoint))
            .json(&ChatRequest {
                message: message.to_string(),
                conversation_id: conversation_id.map(str::to_string),
            })
            .send()
            .await
            .wrap_err("sending chat message")?;
        let res = check_status(res).await?;
        let res = res
            .json::<ChatResponse>()
            .await
            .wrap_err("parsing chat reply")?;

        Ok(AnalystReply {
            request_id: None,
            content: vec![ContentBlock::Text { text: res.content }],
            warnings: vec![],
            conversation_id: res.conversation_id,
            tables: vec![],
        })
    }
}

impl CortexProxy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: time::Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn timeout(&self) -> Option<time::Duration> {
        self.timeout
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        self.request(reqwest::Method::GET, url)
    }

    fn post(&self, url: &str) -> reqwest::RequestBuilder {
        self.request(reqwest::Method::POST, url)
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        let mut req = reqwest::Client::new()
            .request(method, url)
            .header("User-Agent", user_agent());
        if let Some(timeout) = self.timeout {
            req = req.timeout(timeout);
        }
        req
    }
}

impl Default for CortexProxy {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: None,
        }
    }
}

impl From<&ServerConfig> for CortexProxy {
    fn from(config: &ServerConfig) -> Self {
        let mut proxy = CortexProxy::default().with_endpoint(&config.endpoint);
        if let Some(timeout) = config.timeout() {
            proxy = proxy.with_timeout(timeout);
        }
        proxy
    }
}

/// Map any non-2xx status to the flat [`ApiError`], pulling the optional
/// `detail` string out of the body when one is present.
async fn check_status(res: reqwest::Response) -> Result<reqwest::Response> {
    if res.status().is_success() {
        return Ok(res);
    }

    let status = res.status();
    let body = res.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .map(|e| e.detail)
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });

    Err(ApiError {
        status: status.as_u16(),
        detail,
    }
    .into())
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: String,
}

#[derive(Debug, Deserialize)]
struct ModelListResponse {
    models: Vec<SemanticModel>,
}

#[derive(Debug, Serialize)]
struct MessageRequest {
    messages: Vec<WireMessage>,
    semantic_model_file: String,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: Role,
    content: Vec<ContentBlock>,
}

impl From<&Turn> for WireMessage {
    fn from(turn: &Turn) -> Self {
        Self {
            role: turn.role(),
            content: turn.content().to_vec(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    request_id: Option<String>,
    message: MessageBody,
    #[serde(default)]
    warnings: Vec<Warning>,
}

#[derive(Debug, Deserialize)]
struct MessageBody {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct Warning {
    message: String,
}

#[derive(Debug, Serialize)]
struct SqlRequest {
    query: String,
}

#[derive(Debug, Deserialize)]
struct SqlResponse {
    success: bool,
    #[serde(default)]
    columns: Vec<String>,
    #[serde(default)]
    data: Vec<serde_json::Map<String, serde_json::Value>>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct FeedbackRequest {
    request_id: String,
    positive: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    feedback_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ConversationResponse {
    // Some proxy builds send conversation_id instead of id
    #[serde(alias = "conversation_id")]
    id: String,
    #[serde(default)]
    messages: Vec<StoredMessage>,
}

#[derive(Debug, Deserialize)]
struct StoredMessage {
    role: Role,
    content: Vec<ContentBlock>,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    conversation_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    content: String,
    #[serde(default)]
    conversation_id: Option<String>,
}
