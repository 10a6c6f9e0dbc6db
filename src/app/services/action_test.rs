use std::sync::atomic::Ordering;
use std::time::Duration;

use eyre::eyre;
use tokio::sync::mpsc;

use super::*;
use crate::backend::MockAnalystBackend;
use crate::models::{Conversation, NoticeKind, SqlTable, Turn};

fn spawn_service(
    backend: MockAnalystBackend,
) -> (
    mpsc::UnboundedSender<Action>,
    mpsc::UnboundedReceiver<Event>,
    Arc<AtomicUsize>,
    CancellationToken,
) {
    let (action_tx, action_rx) = mpsc::unbounded_channel::<Action>();
    let (event_tx, event_rx) = mpsc::unbounded_channel::<Event>();
    let pending_tasks = Arc::new(AtomicUsize::new(0));
    let token = CancellationToken::new();

    let mut service = ActionService::new(
        Arc::new(event_tx),
        action_rx,
        Arc::new(backend),
        token.clone(),
        Arc::clone(&pending_tasks),
    );
    tokio::spawn(async move { service.start().await });

    (action_tx, event_rx, pending_tasks, token)
}

async fn next_event(event_rx: &mut mpsc::UnboundedReceiver<Event>) -> Event {
    tokio::time::timeout(Duration::from_secs(1), event_rx.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event channel closed")
}

fn reply_with_sql() -> AnalystReply {
    AnalystReply {
        request_id: Some("req-1".to_string()),
        content: vec![
            ContentBlock::Text {
                text: "Here is the revenue".to_string(),
            },
            ContentBlock::Sql {
                statement: "SELECT 1".to_string(),
            },
        ],
        ..Default::default()
    }
}

#[tokio::test]
async fn test_send_prompt_executes_sql_and_attaches_table() {
    let mut backend = MockAnalystBackend::new();
    backend
        .expect_send_message()
        .withf(|turns, model| turns.len() == 1 && model == "stage/revenue.yaml")
        .times(1)
        .returning(|_, _| Ok(reply_with_sql()));
    backend
        .expect_execute_sql()
        .withf(|query| query == "SELECT 1")
        .times(1)
        .returning(|_| {
            Ok(SqlTable {
                columns: vec!["n".to_string()],
                rows: vec![],
            })
        });

    let (action_tx, mut event_rx, _, token) = spawn_service(backend);
    action_tx
        .send(Action::SendPrompt(Outbound::Analyst {
            turns: vec![Turn::user("what is the revenue?")],
            semantic_model: "stage/revenue.yaml".to_string(),
        }))
        .unwrap();

    match next_event(&mut event_rx).await {
        Event::AnalystReply(reply) => {
            assert_eq!(reply.request_id.as_deref(), Some("req-1"));
            assert_eq!(reply.tables.len(), 1);
            assert!(reply.warnings.is_empty());
        }
        other => panic!("unexpected event: {:?}", other),
    }
    token.cancel();
}

#[tokio::test]
async fn test_failed_query_becomes_warning() {
    let mut backend = MockAnalystBackend::new();
    backend
        .expect_send_message()
        .times(1)
        .returning(|_, _| Ok(reply_with_sql()));
    backend
        .expect_execute_sql()
        .times(1)
        .returning(|_| Err(eyre!("warehouse suspended")));

    let (action_tx, mut event_rx, _, token) = spawn_service(backend);
    action_tx
        .send(Action::SendPrompt(Outbound::Analyst {
            turns: vec![Turn::user("hi")],
            semantic_model: "m.yaml".to_string(),
        }))
        .unwrap();

    match next_event(&mut event_rx).await {
        Event::AnalystReply(reply) => {
            assert!(reply.tables.is_empty());
            assert_eq!(reply.warnings.len(), 1);
            assert!(reply.warnings[0].contains("warehouse suspended"));
        }
        other => panic!("unexpected event: {:?}", other),
    }
    token.cancel();
}

#[tokio::test]
async fn test_send_failure_emits_send_failed() {
    let mut backend = MockAnalystBackend::new();
    backend
        .expect_send_message()
        .times(1)
        .returning(|_, _| Err(eyre!("analyst API error (500): boom")));
    backend.expect_execute_sql().times(0);

    let (action_tx, mut event_rx, _, token) = spawn_service(backend);
    action_tx
        .send(Action::SendPrompt(Outbound::Analyst {
            turns: vec![Turn::user("hi")],
            semantic_model: "m.yaml".to_string(),
        }))
        .unwrap();

    match next_event(&mut event_rx).await {
        Event::SendFailed(message) => assert!(message.contains("boom")),
        other => panic!("unexpected event: {:?}", other),
    }
    token.cancel();
}

#[tokio::test]
async fn test_chat_prompt_uses_chat_endpoint() {
    let mut backend = MockAnalystBackend::new();
    backend
        .expect_send_chat()
        .withf(|message, conversation_id| message == "hello" && *conversation_id == Some("c1"))
        .times(1)
        .returning(|_, _| {
            Ok(AnalystReply {
                content: vec![ContentBlock::Text {
                    text: "hi".to_string(),
                }],
                conversation_id: Some("c1".to_string()),
                ..Default::default()
            })
        });

    let (action_tx, mut event_rx, _, token) = spawn_service(backend);
    action_tx
        .send(Action::SendPrompt(Outbound::Chat {
            message: "hello".to_string(),
            conversation_id: Some("c1".to_string()),
        }))
        .unwrap();

    match next_event(&mut event_rx).await {
        Event::AnalystReply(reply) => {
            assert_eq!(reply.conversation_id.as_deref(), Some("c1"))
        }
        other => panic!("unexpected event: {:?}", other),
    }
    token.cancel();
}

#[tokio::test]
async fn test_submit_feedback_notifies() {
    let mut backend = MockAnalystBackend::new();
    backend
        .expect_submit_feedback()
        .withf(|request_id, positive, message| {
            request_id == "req-9" && !positive && *message == Some("wrong join")
        })
        .times(1)
        .returning(|_, _, _| Ok(()));

    let (action_tx, mut event_rx, _, token) = spawn_service(backend);
    action_tx
        .send(Action::SubmitFeedback {
            request_id: "req-9".to_string(),
            positive: false,
            message: Some("wrong join".to_string()),
        })
        .unwrap();

    match next_event(&mut event_rx).await {
        Event::Notice(notice) => {
            assert!(matches!(notice.kind(), NoticeKind::Info));
            assert!(notice.message().contains("Feedback submitted"));
        }
        other => panic!("unexpected event: {:?}", other),
    }
    token.cancel();
}

#[tokio::test]
async fn test_load_conversation() {
    let mut backend = MockAnalystBackend::new();
    backend
        .expect_get_conversation()
        .withf(|id| id == "c7")
        .times(1)
        .returning(|_| Ok(Conversation::new("c7").with_turns(vec![Turn::user("old")])));

    let (action_tx, mut event_rx, _, token) = spawn_service(backend);
    action_tx
        .send(Action::LoadConversation("c7".to_string()))
        .unwrap();

    match next_event(&mut event_rx).await {
        Event::ConversationLoaded(conversation) => {
            assert_eq!(conversation.id(), "c7");
            assert_eq!(conversation.turns().len(), 1);
        }
        other => panic!("unexpected event: {:?}", other),
    }
    token.cancel();
}

#[tokio::test]
async fn test_delete_conversation_notifies() {
    let mut backend = MockAnalystBackend::new();
    backend
        .expect_delete_conversation()
        .withf(|id| id == "c3")
        .times(1)
        .returning(|_| Ok(()));

    let (action_tx, mut event_rx, pending_tasks, token) = spawn_service(backend);
    action_tx
        .send(Action::DeleteConversation {
            id: "c3".to_string(),
            quiet: false,
        })
        .unwrap();

    match next_event(&mut event_rx).await {
        Event::ConversationDeleted(id) => assert_eq!(id, "c3"),
        other => panic!("unexpected event: {:?}", other),
    }
    assert_eq!(pending_tasks.load(Ordering::SeqCst), 0);
    token.cancel();
}

#[tokio::test]
async fn test_quiet_delete_failure_is_silent() {
    let mut backend = MockAnalystBackend::new();
    backend
        .expect_delete_conversation()
        .times(1)
        .returning(|_| Err(eyre!("404 not found")));

    let (action_tx, mut event_rx, pending_tasks, token) = spawn_service(backend);
    action_tx
        .send(Action::DeleteConversation {
            id: "gone".to_string(),
            quiet: true,
        })
        .unwrap();

    let result = tokio::time::timeout(Duration::from_millis(300), event_rx.recv()).await;
    assert!(result.is_err(), "quiet deletes must not emit events");
    assert_eq!(pending_tasks.load(Ordering::SeqCst), 0);
    token.cancel();
}
