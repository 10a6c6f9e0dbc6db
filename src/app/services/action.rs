#[cfg(test)]
#[path = "action_test.rs"]
mod tests;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::backend::ArcBackend;
use crate::models::{
    Action, AnalystReply, ArcEventTx, ContentBlock, Event, NoticeKind, NoticeMessage, Outbound,
};
use eyre::Result;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::ClipboardService;

/// Owns the backend handle and runs every network call off the render loop.
/// Prompt sends run on a spawned worker so the action channel stays
/// responsive; conversation deletes also run detached and are counted in
/// `pending_tasks` so shutdown can wait for them.
pub struct ActionService {
    event_tx: ArcEventTx,
    action_rx: mpsc::UnboundedReceiver<Action>,
    backend: ArcBackend,
    cancel_token: CancellationToken,
    pending_tasks: Arc<AtomicUsize>,
}

impl ActionService {
    pub fn new(
        event_tx: ArcEventTx,
        action_rx: mpsc::UnboundedReceiver<Action>,
        backend: ArcBackend,
        cancel_token: CancellationToken,
        pending_tasks: Arc<AtomicUsize>,
    ) -> ActionService {
        ActionService {
            event_tx,
            action_rx,
            backend,
            cancel_token,
            pending_tasks,
        }
    }

    pub async fn start(&mut self) -> Result<()> {
        loop {
            tokio::select! {
                _ = self.cancel_token.cancelled() => {
                    log::debug!("Action service cancelled");
                    return Ok(());
                }

                event = self.action_rx.recv() => {
                    let action = match event {
                        Some(action) => action,
                        None => continue,
                    };
                    let worker_tx = Arc::clone(&self.event_tx);
                    let backend = Arc::clone(&self.backend);
                    match action {
                        Action::SendPrompt(outbound) => {
                            tokio::spawn(async move {
                                match send_prompt(&backend, outbound).await {
                                    Ok(reply) => worker_tx.send(Event::AnalystReply(reply)).await?,
                                    Err(err) => {
                                        log::error!("Send failed: {}", err);
                                        worker_tx.send(Event::SendFailed(format!("{err}"))).await?;
                                    }
                                }
                                Ok::<(), eyre::Report>(())
                            });
                        }

                        Action::SubmitFeedback { request_id, positive, message } => {
                            match backend
                                .submit_feedback(&request_id, positive, message.as_deref())
                                .await
                            {
                                Ok(_) => {
                                    self.send_notice(NoticeKind::Info, "Feedback submitted!").await;
                                }
                                Err(err) => {
                                    log::error!("Failed to submit feedback: {}", err);
                                    self.send_notice(
                                        NoticeKind::Error,
                                        format!("Failed to submit feedback: {}", err),
                                    ).await;
                                }
                            }
                        }

                        Action::LoadConversation(id) => {
                            match backend.get_conversation(&id).await {
                                Ok(conversation) => {
                                    worker_tx.send(Event::ConversationLoaded(conversation)).await?;
                                }
                                Err(err) => {
                                    log::error!("Failed to load conversation: {}", err);
                                    self.send_notice(
                                        NoticeKind::Error,
                                        format!("Failed to load conversation: {}", err),
                                    ).await;
                                }
                            }
                        }

                        Action::DeleteConversation { id, quiet } => {
                            self.pending_tasks.fetch_add(1, Ordering::SeqCst);
                            let pending_tasks = Arc::clone(&self.pending_tasks);
                            tokio::spawn(async move {
                                match backend.delete_conversation(&id).await {
                                    Ok(_) if quiet => {}
                                    Ok(_) => {
                                        let _ = worker_tx
                                            .send(Event::ConversationDeleted(id))
                                            .await;
                                    }
                                    Err(err) if quiet => {
                                        log::error!("Failed to delete conversation {}: {}", id, err);
                                    }
                                    Err(err) => {
                                        log::error!("Failed to delete conversation {}: {}", id, err);
                                        let _ = worker_tx
                                            .send(Event::Notice(NoticeMessage::error(format!(
                                                "Failed to delete conversation: {}",
                                                err
                                            ))))
                                            .await;
                                    }
                                }
                                pending_tasks.fetch_sub(1, Ordering::SeqCst);
                            });
                        }

                        Action::CopyText { content, notice } => {
                            if let Err(err) = ClipboardService::set(content) {
                                log::error!("Failed to copy text: {}", err);
                                self.send_notice(
                                    NoticeKind::Error,
                                    format!("Failed to copy text: {}", err),
                                ).await;
                                continue;
                            }
                            if notice {
                                self.send_notice(NoticeKind::Info, "Copied to clipboard!").await;
                            }
                        }
                    }
                }
            }
        }
    }

    async fn send_notice(&self, kind: NoticeKind, message: impl Into<String>) {
        self.event_tx
            .send(Event::Notice(NoticeMessage::new(message).with_kind(kind)))
            .await
            .unwrap_or_else(|err| {
                log::error!("Failed to send notice: {}", err);
            });
    }
}

/// One round trip to the analyst plus the follow-up query executions. Every
/// sql block in the reply is run immediately and its result table attached
/// to the reply; a query failure is demoted to a warning so the textual
/// answer still renders.
async fn send_prompt(backend: &ArcBackend, outbound: Outbound) -> Result<AnalystReply> {
    let mut reply = match outbound {
        Outbound::Analyst {
            turns,
            semantic_model,
        } => backend.send_message(&turns, &semantic_model).await?,
        Outbound::Chat {
            message,
            conversation_id,
        } => {
            backend
                .send_chat(&message, conversation_id.as_deref())
                .await?
        }
    };

    let statements: Vec<String> = reply
        .content
        .iter()
        .filter_map(|block| match block {
            ContentBlock::Sql { statement } => Some(statement.clone()),
            _ => None,
        })
        .collect();

    for statement in statements {
        match backend.execute_sql(&statement).await {
            Ok(table) => reply.tables.push(table),
            Err(err) => {
                log::error!("Query execution failed: {}", err);
                reply
                    .warnings
                    .push(format!("Query execution failed: {}", err));
            }
        }
    }

    Ok(reply)
}
