//! Colored terminal rendering for query output.

use std::io::{self, Write};

use owo_colors::OwoColorize;

use crate::cli::{ClaudeEvent, ContentBlock, DecodeError, ResultEvent};
use crate::query::QueryError;

/// Maximum length for truncated display strings.
const DEFAULT_MAX_LEN: usize = 80;

/// Truncate a string to a maximum length, adding ellipsis if truncated.
#[must_use]
pub fn truncate(s: &str, max_len: usize, raw_mode: bool) -> String {
    if raw_mode || s.chars().count() <= max_len {
        return s.to_string();
    }
    if max_len <= 3 {
        return "...".to_string();
    }
    let kept: String = s.chars().take(max_len - 3).collect();
    format!("{kept}...")
}

/// Format tool input for display, truncating long values.
#[must_use]
pub fn format_tool_input(input: &serde_json::Value, raw_mode: bool) -> String {
    match input {
        serde_json::Value::Object(map) => {
            let pairs: Vec<String> = map
                .iter()
                .map(|(k, v)| {
                    let value_str = match v {
                        serde_json::Value::String(s) => truncate(s, 50, raw_mode),
                        other => truncate(&other.to_string(), 50, raw_mode),
                    };
                    format!("{k}={value_str}")
                })
                .collect();
            pairs.join(", ")
        }
        other => truncate(&other.to_string(), DEFAULT_MAX_LEN, raw_mode),
    }
}

/// Render one streamed event.
pub fn print_event(event: &ClaudeEvent, raw_mode: bool) {
    match event {
        ClaudeEvent::System(init) => print_session_start(
            init.model.as_deref().unwrap_or("default"),
            &init.session_id,
            raw_mode,
        ),
        ClaudeEvent::Assistant { message, .. } => {
            for block in &message.content {
                match block {
                    ContentBlock::Text { text } => print_text(text),
                    ContentBlock::Thinking { thinking } => print_thinking(thinking),
                    ContentBlock::ToolUse(tool_use) => {
                        print_tool_request(&tool_use.name, &tool_use.input, raw_mode);
                    }
                    ContentBlock::ToolResult(_) | ContentBlock::Unknown => {}
                }
            }
        }
        ClaudeEvent::Result(result) => print_session_end(result, raw_mode),
        ClaudeEvent::User { .. } | ClaudeEvent::StreamEvent { .. } | ClaudeEvent::Unknown => {
            if raw_mode {
                if let Ok(json) = serde_json::to_string(event) {
                    print_raw_event(&json);
                }
            }
        }
    }
}

/// Print session start information.
pub fn print_session_start(model: &str, session_id: &str, raw_mode: bool) {
    eprintln!(
        "{} model={}, session={}",
        "[SESSION]".blue().bold(),
        model.cyan(),
        truncate(session_id, 20, raw_mode).dimmed()
    );
}

/// Print session end information.
pub fn print_session_end(result: &ResultEvent, raw_mode: bool) {
    println!();
    let session = truncate(&result.session_id, 20, raw_mode);
    if result.is_error {
        eprintln!(
            "{} {} ended with error {}",
            "[SESSION]".red().bold(),
            result.subtype,
            session.dimmed()
        );
    } else if let Some(cost) = result.total_cost_usd {
        eprintln!(
            "{} Session completed (cost: ${:.4}) {}",
            "[SESSION]".blue().bold(),
            cost,
            session.dimmed()
        );
    } else {
        eprintln!(
            "{} Session completed {}",
            "[SESSION]".blue().bold(),
            session.dimmed()
        );
    }
}

/// Print a tool request.
pub fn print_tool_request(name: &str, input: &serde_json::Value, raw_mode: bool) {
    eprintln!(
        "{} {} ({})",
        "[TOOL]".cyan().bold(),
        name.bold(),
        format_tool_input(input, raw_mode).dimmed()
    );
}

/// Print thinking content (dimmed).
pub fn print_thinking(text: &str) {
    eprint!("{}", text.dimmed());
}

/// Print text content.
pub fn print_text(text: &str) {
    print!("{text}");
    let _ = io::stdout().flush();
}

/// Print a record that could not be decoded.
pub fn print_decode_error(error: &DecodeError, raw_mode: bool) {
    eprintln!(
        "{} {} {}",
        "[DECODE]".yellow().bold(),
        error.reason,
        truncate(&error.input, DEFAULT_MAX_LEN, raw_mode).dimmed()
    );
}

/// Print an error message.
pub fn print_error(message: &str) {
    eprintln!("{} {}", "[ERROR]".red().bold(), message);
}

/// Print a terminal query error with its captured stderr.
pub fn print_query_error(error: &QueryError) {
    print_error(&error.to_string());
    if error.is_cancelled() {
        if let Some(stderr) = error.stderr().filter(|s| !s.is_empty()) {
            eprintln!("{} {}", "[STDERR]".red(), stderr);
        }
    }
}

/// Print raw event output.
pub fn print_raw_event(event_json: &str) {
    eprintln!("{} {}", "[RAW]".yellow().bold(), event_json);
}
