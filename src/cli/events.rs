//! Event types from Claude Code stream-json output.
//!
//! Claude Code emits one JSON object per line when run with
//! `--print --output-format stream-json --verbose`. Each line decodes into
//! a [`ClaudeEvent`].

use serde::{Deserialize, Serialize};

/// System initialization event data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemInit {
    /// Event subtype (e.g., "init").
    #[serde(default)]
    pub subtype: Option<String>,
    /// Session identifier.
    pub session_id: String,
    /// Current working directory.
    #[serde(default)]
    pub cwd: Option<String>,
    /// Available tools for this session.
    #[serde(default)]
    pub tools: Vec<String>,
    /// Model serving the session.
    #[serde(default)]
    pub model: Option<String>,
    /// MCP server status entries.
    #[serde(default)]
    pub mcp_servers: Vec<serde_json::Value>,
}

/// Tool use request data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolUse {
    /// Unique identifier for this tool use.
    pub id: String,
    /// Name of the tool being invoked.
    pub name: String,
    /// Tool input parameters.
    #[serde(default)]
    pub input: serde_json::Value,
}

/// Tool execution result data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Identifier matching the original tool use.
    pub tool_use_id: String,
    /// Result content, either a string or a list of blocks.
    #[serde(default)]
    pub content: serde_json::Value,
    /// Whether the tool reported an error.
    #[serde(default)]
    pub is_error: bool,
}

/// A content block inside an assistant or user message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Plain text.
    Text {
        /// The text.
        text: String,
    },
    /// Extended thinking output.
    Thinking {
        /// The thinking text.
        thinking: String,
    },
    /// Tool invocation.
    ToolUse(ToolUse),
    /// Tool output fed back to the model.
    ToolResult(ToolResult),
    /// Catch-all for unknown block types.
    #[serde(other)]
    Unknown,
}

/// Assistant message payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistantMessage {
    /// Message identifier.
    #[serde(default)]
    pub id: Option<String>,
    /// Model that produced the message.
    #[serde(default)]
    pub model: Option<String>,
    /// Content blocks in order.
    #[serde(default)]
    pub content: Vec<ContentBlock>,
}

impl AssistantMessage {
    /// Concatenate all text blocks.
    #[must_use]
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Iterate over the tool uses in this message.
    pub fn tool_uses(&self) -> impl Iterator<Item = &ToolUse> {
        self.content.iter().filter_map(|block| match block {
            ContentBlock::ToolUse(tool_use) => Some(tool_use),
            _ => None,
        })
    }
}

/// Final result event data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultEvent {
    /// Result subtype (e.g., "success", "`error_max_turns`").
    pub subtype: String,
    /// Session identifier.
    pub session_id: String,
    /// Whether an error occurred.
    #[serde(default)]
    pub is_error: bool,
    /// Final answer text, absent on some error subtypes.
    #[serde(default)]
    pub result: Option<String>,
    /// Total cost in USD.
    #[serde(default)]
    pub total_cost_usd: Option<f64>,
    /// Total duration in milliseconds.
    #[serde(default)]
    pub duration_ms: Option<u64>,
    /// API call duration in milliseconds.
    #[serde(default)]
    pub duration_api_ms: Option<u64>,
    /// Number of conversation turns.
    #[serde(default)]
    pub num_turns: Option<u32>,
    /// Token usage, passed through as-is.
    #[serde(default)]
    pub usage: Option<serde_json::Value>,
}

/// Events emitted by Claude Code in stream-json format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClaudeEvent {
    /// System initialization event.
    System(SystemInit),
    /// Assistant message event.
    Assistant {
        /// Message content.
        message: AssistantMessage,
        /// Parent tool use when emitted by a subagent.
        #[serde(default)]
        parent_tool_use_id: Option<String>,
    },
    /// User message event (usually tool results).
    User {
        /// Message content (flexible structure).
        message: serde_json::Value,
    },
    /// Partial streaming event, only with `--include-partial-messages`.
    StreamEvent {
        /// Raw API stream event.
        event: serde_json::Value,
    },
    /// Final result event.
    Result(ResultEvent),
    /// Catch-all for unknown event types.
    #[serde(other)]
    Unknown,
}

impl ClaudeEvent {
    /// Returns true if this is a terminal event (Result).
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Result(_))
    }

    /// Returns the session ID if available.
    #[must_use]
    pub fn session_id(&self) -> Option<&str> {
        match self {
            Self::System(init) => Some(&init.session_id),
            Self::Result(result) => Some(&result.session_id),
            _ => None,
        }
    }

    /// Returns the assistant text carried by this event, if any.
    #[must_use]
    pub fn assistant_text(&self) -> Option<String> {
        match self {
            Self::Assistant { message, .. } => Some(message.text()),
            _ => None,
        }
    }
}
