//! Tests for Claude event type parsing.

use claude_query::cli::{ClaudeEvent, ContentBlock, ResultEvent, SystemInit};

#[test]
fn parse_system_init_event() {
    let json = r#"{"type":"system","subtype":"init","session_id":"abc123","cwd":"/home/user/project","tools":["Read","Write","Bash"],"model":"claude-sonnet-4-20250514","mcp_servers":[]}"#;
    let event: ClaudeEvent = serde_json::from_str(json).unwrap();

    match event {
        ClaudeEvent::System(init) => {
            assert_eq!(init.subtype, Some("init".to_string()));
            assert_eq!(init.session_id, "abc123");
            assert_eq!(init.cwd.as_deref(), Some("/home/user/project"));
            assert_eq!(init.tools, vec!["Read", "Write", "Bash"]);
            assert_eq!(init.model.as_deref(), Some("claude-sonnet-4-20250514"));
            assert!(init.mcp_servers.is_empty());
        }
        _ => panic!("Expected System event, got {event:?}"),
    }
}

#[test]
fn parse_system_event_with_only_session_id() {
    let json = r#"{"type":"system","session_id":"abc"}"#;
    let event: ClaudeEvent = serde_json::from_str(json).unwrap();

    let ClaudeEvent::System(SystemInit {
        session_id, tools, ..
    }) = event
    else {
        panic!("Expected System event, got {event:?}");
    };
    assert_eq!(session_id, "abc");
    assert!(tools.is_empty());
}

#[test]
fn parse_assistant_event_with_blocks() {
    let json = r#"{"type":"assistant","message":{"id":"msg_1","model":"sonnet","content":[{"type":"thinking","thinking":"hmm"},{"type":"text","text":"Reading it."},{"type":"tool_use","id":"tool_123","name":"Read","input":{"file_path":"/tmp/test.txt"}}]}}"#;
    let event: ClaudeEvent = serde_json::from_str(json).unwrap();

    let ClaudeEvent::Assistant {
        message,
        parent_tool_use_id,
    } = event
    else {
        panic!("Expected Assistant event, got {event:?}");
    };
    assert!(parent_tool_use_id.is_none());
    assert_eq!(message.id.as_deref(), Some("msg_1"));
    assert_eq!(message.content.len(), 3);
    assert!(matches!(message.content[0], ContentBlock::Thinking { .. }));
    assert_eq!(message.text(), "Reading it.");

    let tools: Vec<_> = message.tool_uses().collect();
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0].id, "tool_123");
    assert_eq!(tools[0].name, "Read");
    assert_eq!(tools[0].input["file_path"], "/tmp/test.txt");
}

#[test]
fn parse_subagent_assistant_event() {
    let json = r#"{"type":"assistant","parent_tool_use_id":"tool_9","message":{"content":[{"type":"text","text":"done"}]}}"#;
    let event: ClaudeEvent = serde_json::from_str(json).unwrap();

    match event {
        ClaudeEvent::Assistant {
            parent_tool_use_id, ..
        } => assert_eq!(parent_tool_use_id.as_deref(), Some("tool_9")),
        _ => panic!("Expected Assistant event, got {event:?}"),
    }
}

#[test]
fn parse_user_event_with_tool_result() {
    let json = r#"{"type":"user","message":{"role":"user","content":[{"type":"tool_result","tool_use_id":"tool_123","content":"file contents here"}]}}"#;
    let event: ClaudeEvent = serde_json::from_str(json).unwrap();

    match event {
        ClaudeEvent::User { message } => {
            assert_eq!(message["content"][0]["tool_use_id"], "tool_123");
        }
        _ => panic!("Expected User event, got {event:?}"),
    }
}

#[test]
fn parse_tool_result_block() {
    let json = r#"{"type":"tool_result","tool_use_id":"tool_123","content":"oops","is_error":true}"#;
    let block: ContentBlock = serde_json::from_str(json).unwrap();

    match block {
        ContentBlock::ToolResult(result) => {
            assert_eq!(result.tool_use_id, "tool_123");
            assert_eq!(result.content, "oops");
            assert!(result.is_error);
        }
        _ => panic!("Expected ToolResult block, got {block:?}"),
    }
}

#[test]
fn parse_stream_event_passthrough() {
    let json = r#"{"type":"stream_event","event":{"type":"content_block_delta","index":0}}"#;
    let event: ClaudeEvent = serde_json::from_str(json).unwrap();

    match event {
        ClaudeEvent::StreamEvent { event } => assert_eq!(event["index"], 0),
        _ => panic!("Expected StreamEvent, got {event:?}"),
    }
}

#[test]
fn parse_result_event() {
    let json = r#"{"type":"result","subtype":"success","session_id":"abc123","is_error":false,"result":"All done","total_cost_usd":0.05,"duration_ms":1234,"duration_api_ms":1000,"num_turns":3,"usage":{"input_tokens":10}}"#;
    let event: ClaudeEvent = serde_json::from_str(json).unwrap();

    assert!(event.is_terminal());
    assert_eq!(event.session_id(), Some("abc123"));
    match event {
        ClaudeEvent::Result(result) => {
            assert_eq!(result.subtype, "success");
            assert!(!result.is_error);
            assert_eq!(result.result.as_deref(), Some("All done"));
            assert_eq!(result.total_cost_usd, Some(0.05));
            assert_eq!(result.duration_ms, Some(1234));
            assert_eq!(result.num_turns, Some(3));
            assert_eq!(result.usage.unwrap()["input_tokens"], 10);
        }
        _ => panic!("Expected Result event, got {event:?}"),
    }
}

#[test]
fn parse_error_result_without_text() {
    let json = r#"{"type":"result","subtype":"error_max_turns","session_id":"abc","is_error":true}"#;
    let result: ResultEvent = match serde_json::from_str(json).unwrap() {
        ClaudeEvent::Result(result) => result,
        other => panic!("Expected Result event, got {other:?}"),
    };

    assert!(result.is_error);
    assert!(result.result.is_none());
    assert!(result.total_cost_usd.is_none());
}

#[test]
fn parse_unknown_event_type() {
    let json = r#"{"type":"future_event_type","data":"something"}"#;
    let event: ClaudeEvent = serde_json::from_str(json).unwrap();

    assert!(matches!(event, ClaudeEvent::Unknown));
    assert!(!event.is_terminal());
    assert!(event.session_id().is_none());
}

#[test]
fn assistant_text_helper() {
    let json = r#"{"type":"assistant","message":{"content":[{"type":"text","text":"a"},{"type":"text","text":"b"}]}}"#;
    let event: ClaudeEvent = serde_json::from_str(json).unwrap();
    assert_eq!(event.assistant_text().as_deref(), Some("ab"));

    let json = r#"{"type":"system","session_id":"s"}"#;
    let event: ClaudeEvent = serde_json::from_str(json).unwrap();
    assert!(event.assistant_text().is_none());
}

#[test]
fn events_serialize_with_type_tag() {
    let json = r#"{"type":"result","subtype":"success","session_id":"abc","is_error":false}"#;
    let event: ClaudeEvent = serde_json::from_str(json).unwrap();

    let value = serde_json::to_value(&event).unwrap();
    assert_eq!(value["type"], "result");
    assert_eq!(value["session_id"], "abc");
}
