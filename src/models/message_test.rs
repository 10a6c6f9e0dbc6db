use super::*;

#[test]
fn test_parse_content_blocks() {
    let raw = r#"[
        {"type": "text", "text": "Here is your answer"},
        {"type": "suggestions", "suggestions": ["Show me top customers", "Analyze revenue trends"]},
        {"type": "sql", "statement": "SELECT 1"}
    ]"#;

    let blocks: Vec<ContentBlock> = serde_json::from_str(raw).expect("failed to parse blocks");
    assert_eq!(blocks.len(), 3);
    assert_eq!(
        blocks[0],
        ContentBlock::Text {
            text: "Here is your answer".to_string()
        }
    );
    assert_eq!(
        blocks[1],
        ContentBlock::Suggestions {
            suggestions: vec![
                "Show me top customers".to_string(),
                "Analyze revenue trends".to_string()
            ]
        }
    );
    assert_eq!(
        blocks[2],
        ContentBlock::Sql {
            statement: "SELECT 1".to_string()
        }
    );
}

#[test]
fn test_parse_content_block_ignores_extra_fields() {
    // The service attaches a confidence object to sql blocks sometimes
    let raw = r#"{"type": "sql", "statement": "SELECT 1", "confidence": {"score": 0.9}}"#;
    let block: ContentBlock = serde_json::from_str(raw).expect("failed to parse block");
    assert_eq!(
        block,
        ContentBlock::Sql {
            statement: "SELECT 1".to_string()
        }
    );
}

#[test]
fn test_parse_unknown_block_type_fails() {
    let raw = r#"{"type": "chart", "spec": {}}"#;
    let res: Result<ContentBlock, _> = serde_json::from_str(raw);
    assert!(res.is_err(), "unknown block types must fail loudly");
}

#[test]
fn test_turn_text_and_sql_statements() {
    let turn = Turn::analyst(vec![
        ContentBlock::Text {
            text: "First".to_string(),
        },
        ContentBlock::Sql {
            statement: "SELECT * FROM customers".to_string(),
        },
        ContentBlock::Text {
            text: "Second".to_string(),
        },
    ]);

    assert_eq!(turn.text(), "First\nSecond");
    assert_eq!(turn.sql_statements(), vec!["SELECT * FROM customers"]);
    assert!(turn.is_analyst());
    assert!(!turn.is_error());
}

#[test]
fn test_error_turn() {
    let turn = Turn::error("Could not reach the analyst: 503 Service Unavailable");
    assert_eq!(turn.role(), Role::System);
    assert!(turn.is_error());
    assert!(turn.text().contains("503"));
}
