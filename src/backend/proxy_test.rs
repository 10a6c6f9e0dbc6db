use serde_json::json;

use super::*;

fn proxy(url: &str) -> CortexProxy {
    CortexProxy::default()
        .with_endpoint(url)
        .with_timeout(time::Duration::from_secs(5))
}

#[tokio::test]
async fn test_list_semantic_models() {
    let mut server = mockito::Server::new_async().await;
    let handler = server
        .mock("GET", "/semantic-models")
        .with_status(200)
        .with_body(
            json!({
                "models": [
                    {"name": "PIANO_B2C.yaml", "path": "DB.SCHEMA.STAGE/PIANO_B2C.yaml"},
                    {"name": "SALES.yaml", "path": "DB.SCHEMA.STAGE/SALES.yaml"}
                ]
            })
            .to_string(),
        )
        .expect(1)
        .create();

    let models = proxy(&server.url())
        .list_semantic_models()
        .await
        .expect("failed to list models");

    assert_eq!(models.len(), 2);
    assert_eq!(models[0].name, "PIANO_B2C.yaml");
    assert_eq!(models[1].path, "DB.SCHEMA.STAGE/SALES.yaml");
    handler.assert();
}

#[tokio::test]
async fn test_send_message() {
    let mut server = mockito::Server::new_async().await;
    let handler = server
        .mock("POST", "/analyst/message")
        .with_status(200)
        .match_body(mockito::Matcher::PartialJson(json!({
            "semantic_model_file": "@DB.SCHEMA.STAGE/PIANO_B2C.yaml",
            "messages": [
                {
                    "role": "user",
                    "content": [{"type": "text", "text": "How many customers?"}]
                }
            ]
        })))
        .with_body(
            json!({
                "request_id": "req-123",
                "message": {
                    "role": "analyst",
                    "content": [
                        {"type": "text", "text": "Hi"},
                        {"type": "sql", "statement": "SELECT 1"}
                    ]
                },
                "warnings": [{"message": "model file is stale"}]
            })
            .to_string(),
        )
        .expect(1)
        .create();

    let turns = vec![Turn::user("How many customers?")];
    let reply = proxy(&server.url())
        .send_message(&turns, "DB.SCHEMA.STAGE/PIANO_B2C.yaml")
        .await
        .expect("failed to send message");

    assert_eq!(reply.request_id.as_deref(), Some("req-123"));
    assert_eq!(reply.content.len(), 2);
    assert_eq!(
        reply.content[0],
        ContentBlock::Text {
            text: "Hi".to_string()
        }
    );
    assert_eq!(
        reply.content[1],
        ContentBlock::Sql {
            statement: "SELECT 1".to_string()
        }
    );
    assert_eq!(reply.warnings, vec!["model file is stale".to_string()]);
    handler.assert();
}

#[tokio::test]
async fn test_send_message_error_with_detail() {
    let mut server = mockito::Server::new_async().await;
    let handler = server
        .mock("POST", "/analyst/message")
        .with_status(500)
        .with_body(json!({"detail": "Failed to connect to Snowflake"}).to_string())
        .expect(1)
        .create();

    let turns = vec![Turn::user("hello")];
    let err = proxy(&server.url())
        .send_message(&turns, "DB.SCHEMA.STAGE/PIANO_B2C.yaml")
        .await
        .expect_err("expected an error");

    let api_err = err.downcast_ref::<ApiError>().expect("not an ApiError");
    assert_eq!(api_err.status, 500);
    assert_eq!(api_err.detail, "Failed to connect to Snowflake");
    handler.assert();
}

#[tokio::test]
async fn test_send_message_error_without_detail() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/analyst/message")
        .with_status(503)
        .with_body("upstream gone")
        .create();

    let turns = vec![Turn::user("hello")];
    let err = proxy(&server.url())
        .send_message(&turns, "model")
        .await
        .expect_err("expected an error");

    let api_err = err.downcast_ref::<ApiError>().expect("not an ApiError");
    assert_eq!(api_err.status, 503);
    assert_eq!(api_err.detail, "Service Unavailable");
}

#[tokio::test]
async fn test_execute_sql() {
    let mut server = mockito::Server::new_async().await;
    let handler = server
        .mock("POST", "/execute-sql")
        .with_status(200)
        .match_body(mockito::Matcher::Json(json!({"query": "SELECT 1"})))
        .with_body(
            json!({
                "success": true,
                "columns": ["id", "name"],
                "data": [
                    {"id": 1, "name": "Customer 1"},
                    {"id": 2, "name": "Customer 2"}
                ]
            })
            .to_string(),
        )
        .expect(1)
        .create();

    let table = proxy(&server.url())
        .execute_sql("SELECT 1")
        .await
        .expect("failed to execute sql");

    assert_eq!(table.columns, vec!["id", "name"]);
    assert_eq!(table.rows.len(), 2);
    assert_eq!(table.rows[1]["name"], "Customer 2");
    handler.assert();
}

#[tokio::test]
async fn test_execute_sql_warehouse_failure() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/execute-sql")
        .with_status(200)
        .with_body(json!({"success": false, "error": "invalid identifier FOO"}).to_string())
        .create();

    let err = proxy(&server.url())
        .execute_sql("SELECT foo")
        .await
        .expect_err("expected an error");

    let api_err = err.downcast_ref::<ApiError>().expect("not an ApiError");
    assert_eq!(api_err.detail, "invalid identifier FOO");
}

#[tokio::test]
async fn test_submit_feedback() {
    let mut server = mockito::Server::new_async().await;
    let handler = server
        .mock("POST", "/analyst/feedback")
        .with_status(200)
        .match_body(mockito::Matcher::Json(json!({
            "request_id": "req-123",
            "positive": true,
            "feedback_message": "great answer"
        })))
        .expect(1)
        .create();

    proxy(&server.url())
        .submit_feedback("req-123", true, Some("great answer"))
        .await
        .expect("failed to submit feedback");
    handler.assert();
}

#[tokio::test]
async fn test_list_conversations() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/conversations")
        .with_status(200)
        .with_body(
            json!([
                {"id": "c1", "title": "Revenue questions"},
                {"id": "c2", "title": "Churn analysis"}
            ])
            .to_string(),
        )
        .create();

    let convos = proxy(&server.url())
        .list_conversations()
        .await
        .expect("failed to list conversations");

    assert_eq!(convos.len(), 2);
    assert_eq!(convos[0].id, "c1");
    assert_eq!(convos[1].title, "Churn analysis");
}

#[tokio::test]
async fn test_get_conversation() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/conversations/c1")
        .with_status(200)
        .with_body(
            json!({
                "id": "c1",
                "messages": [
                    {"role": "user", "content": [{"type": "text", "text": "hi"}]},
                    {"role": "analyst", "content": [{"type": "text", "text": "hello"}]}
                ]
            })
            .to_string(),
        )
        .create();

    let convo = proxy(&server.url())
        .get_conversation("c1")
        .await
        .expect("failed to load conversation");

    assert_eq!(convo.id(), "c1");
    assert_eq!(convo.turns().len(), 2);
    assert_eq!(convo.turns()[0].role(), Role::User);
    assert_eq!(convo.turns()[1].text(), "hello");
}

#[tokio::test]
async fn test_delete_conversation() {
    let mut server = mockito::Server::new_async().await;
    let handler = server
        .mock("DELETE", "/conversations/c1")
        .with_status(200)
        .expect(1)
        .create();

    proxy(&server.url())
        .delete_conversation("c1")
        .await
        .expect("failed to delete conversation");
    handler.assert();
}

#[tokio::test]
async fn test_delete_conversation_not_found() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("DELETE", "/conversations/missing")
        .with_status(404)
        .with_body(json!({"detail": "Conversation not found"}).to_string())
        .create();

    let err = proxy(&server.url())
        .delete_conversation("missing")
        .await
        .expect_err("expected an error");
    let api_err = err.downcast_ref::<ApiError>().expect("not an ApiError");
    assert_eq!(api_err.status, 404);
}

#[tokio::test]
async fn test_send_chat() {
    let mut server = mockito::Server::new_async().await;
    let handler = server
        .mock("POST", "/messages")
        .with_status(200)
        .match_body(mockito::Matcher::Json(json!({"message": "hello"})))
        .with_body(
            json!({
                "role": "assistant",
                "content": "Hi! What would you like to know?",
                "conversation_id": "c9"
            })
            .to_string(),
        )
        .expect(1)
        .create();

    let reply = proxy(&server.url())
        .send_chat("hello", None)
        .await
        .expect("failed to send chat message");

    assert_eq!(reply.conversation_id.as_deref(), Some("c9"));
    assert_eq!(
        reply.content,
        vec![ContentBlock::Text {
            text: "Hi! What would you like to know?".to_string()
        }]
    );
    handler.assert();
}
