use super::*;
use crate::models::{ContentBlock, Role, SqlTable};

fn models() -> Vec<SemanticModel> {
    vec![
        SemanticModel {
            name: "PIANO_B2C.yaml".to_string(),
            path: "DB.SCHEMA.STAGE/PIANO_B2C.yaml".to_string(),
        },
        SemanticModel {
            name: "SALES.yaml".to_string(),
            path: "DB.SCHEMA.STAGE/SALES.yaml".to_string(),
        },
    ]
}

fn reply(text: &str) -> AnalystReply {
    AnalystReply {
        request_id: Some("req-1".to_string()),
        content: vec![ContentBlock::Text {
            text: text.to_string(),
        }],
        ..Default::default()
    }
}

#[test]
fn test_blank_send_is_noop() {
    let mut session = ChatSession::new(ServerMode::Analyst, models());
    let before = session.len();

    assert!(session.begin_send("").is_none());
    assert!(session.begin_send("   \n\t ").is_none());
    assert_eq!(session.len(), before);
    assert!(!session.in_flight());
}

#[test]
fn test_second_send_is_dropped_while_in_flight() {
    let mut session = ChatSession::new(ServerMode::Analyst, models());

    assert!(session.begin_send("first question").is_some());
    assert!(session.in_flight());

    let before = session.len();
    assert!(session.begin_send("second question").is_none());
    assert_eq!(session.len(), before, "dropped sends must not append turns");
}

#[test]
fn test_reply_appends_exactly_one_analyst_turn() {
    let mut session = ChatSession::new(ServerMode::Analyst, models());
    session.begin_send("hello").expect("send should start");

    session.apply_reply(reply("Hi"));

    let analyst_turns: Vec<_> = session.turns().iter().filter(|t| t.is_analyst()).collect();
    assert_eq!(analyst_turns.len(), 1);
    assert_eq!(analyst_turns[0].text(), "Hi");
    assert_eq!(analyst_turns[0].request_id(), Some("req-1"));
    assert!(!session.in_flight());
    assert_eq!(session.last_request_id(), Some("req-1"));
}

#[test]
fn test_warnings_become_system_turns() {
    let mut session = ChatSession::new(ServerMode::Analyst, models());
    session.begin_send("hello").expect("send should start");

    let mut r = reply("Hi");
    r.warnings = vec!["stale model".to_string()];
    session.apply_reply(r);

    let last = session.last_turn().expect("no turns");
    assert_eq!(last.role(), Role::System);
    assert!(last.text().contains("stale model"));
}

#[test]
fn test_failed_send_appends_error_turn_and_releases_guard() {
    let mut session = ChatSession::new(ServerMode::Analyst, models());
    session.begin_send("hello").expect("send should start");

    session.fail_send("analyst API error (500): boom");

    let last = session.last_turn().expect("no turns");
    assert!(last.is_error());
    assert!(last.text().contains("boom"));
    assert!(!session.in_flight());

    // A later send must go through again
    assert!(session.begin_send("retry").is_some());
}

#[test]
fn test_outbound_carries_history_and_model_path() {
    let mut session = ChatSession::new(ServerMode::Analyst, models());
    session.begin_send("first").expect("send should start");
    session.apply_reply(reply("answer"));

    let outbound = session.begin_send("second").expect("send should start");
    match outbound {
        Outbound::Analyst {
            turns,
            semantic_model,
        } => {
            assert_eq!(semantic_model, "DB.SCHEMA.STAGE/PIANO_B2C.yaml");
            // hello turn is local only; history is user, analyst, user
            assert_eq!(turns.len(), 3);
            assert_eq!(turns[0].role(), Role::User);
            assert_eq!(turns[1].role(), Role::Analyst);
            assert_eq!(turns[2].text(), "second");
        }
        Outbound::Chat { .. } => panic!("expected an analyst prompt"),
    }
}

#[test]
fn test_chat_mode_tracks_conversation_id() {
    let mut session = ChatSession::new(ServerMode::Chat, vec![]);

    let outbound = session.begin_send("hello").expect("send should start");
    match outbound {
        Outbound::Chat {
            conversation_id, ..
        } => assert!(conversation_id.is_none()),
        Outbound::Analyst { .. } => panic!("expected a chat prompt"),
    }

    let mut r = reply("hi");
    r.conversation_id = Some("c42".to_string());
    session.apply_reply(r);
    assert_eq!(session.conversation_id(), Some("c42"));

    let outbound = session.begin_send("next").expect("send should start");
    match outbound {
        Outbound::Chat {
            message,
            conversation_id,
        } => {
            assert_eq!(message, "next");
            assert_eq!(conversation_id.as_deref(), Some("c42"));
        }
        Outbound::Analyst { .. } => panic!("expected a chat prompt"),
    }
}

#[test]
fn test_clear_resets_turns_and_yields_conversation_id_once() {
    let mut session = ChatSession::new(ServerMode::Chat, vec![]);
    session.begin_send("hello").expect("send should start");
    let mut r = reply("hi");
    r.conversation_id = Some("c42".to_string());
    session.apply_reply(r);

    let id = session.clear();
    assert_eq!(id.as_deref(), Some("c42"));
    assert_eq!(session.conversation_id(), None);
    // Only the hello turn remains
    assert_eq!(session.len(), 1);
    assert_eq!(session.turns()[0].role(), Role::System);

    // Clearing again must not yield the id a second time
    assert!(session.clear().is_none());
}

#[test]
fn test_select_model_discards_conversation() {
    let mut session = ChatSession::new(ServerMode::Analyst, models());
    session.begin_send("hello").expect("send should start");
    session.apply_reply(reply("hi"));

    session.select_model(1);
    assert_eq!(session.len(), 1);
    assert_eq!(session.selected_model().map(|m| m.name.as_str()), Some("SALES.yaml"));
    assert_eq!(session.last_request_id(), None);
}

#[test]
fn test_select_same_model_keeps_conversation() {
    let mut session = ChatSession::new(ServerMode::Analyst, models());
    session.begin_send("hello").expect("send should start");
    session.apply_reply(reply("hi"));
    let len = session.len();

    session.select_model(0);
    assert_eq!(session.len(), len);
}

#[test]
fn test_adopt_loaded_conversation() {
    let mut session = ChatSession::new(ServerMode::Chat, vec![]);
    let convo = Conversation::new("c7").with_turns(vec![
        Turn::user("old question"),
        Turn::analyst(vec![ContentBlock::Text {
            text: "old answer".to_string(),
        }]),
    ]);

    session.adopt(convo);
    assert_eq!(session.conversation_id(), Some("c7"));
    assert_eq!(session.len(), 2);
}

#[test]
fn test_reply_keeps_sql_tables_aligned() {
    let mut session = ChatSession::new(ServerMode::Analyst, models());
    session.begin_send("show data").expect("send should start");

    let table = SqlTable {
        columns: vec!["id".to_string()],
        rows: vec![],
    };
    let r = AnalystReply {
        request_id: Some("req-2".to_string()),
        content: vec![
            ContentBlock::Text {
                text: "Here you go".to_string(),
            },
            ContentBlock::Sql {
                statement: "SELECT 1".to_string(),
            },
        ],
        tables: vec![table.clone()],
        ..Default::default()
    };
    session.apply_reply(r);

    let turn = session.last_turn().expect("no turns");
    assert_eq!(turn.tables(), &[table]);
}
