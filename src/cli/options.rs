//! Query options and Claude Code argument construction.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cli::{DEFAULT_CHANNEL_BUFFER, DEFAULT_MAX_RECORD_BYTES};

/// Default cap on captured stderr (1 MiB).
pub const DEFAULT_MAX_STDERR_BYTES: usize = 1024 * 1024;

/// Default time between SIGTERM and SIGKILL on cancellation.
pub const DEFAULT_TERMINATE_TIMEOUT: Duration = Duration::from_secs(2);

/// Default time to wait for stderr to reach end-of-stream after a kill.
pub const DEFAULT_STDERR_GRACE: Duration = Duration::from_secs(1);

/// Permission mode passed via `--permission-mode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PermissionMode {
    Default,
    AcceptEdits,
    BypassPermissions,
    Plan,
}

impl PermissionMode {
    /// Flag value understood by the CLI.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::AcceptEdits => "acceptEdits",
            Self::BypassPermissions => "bypassPermissions",
            Self::Plan => "plan",
        }
    }
}

/// Options for a single query.
///
/// Built with chained setters:
///
/// ```
/// use claude_query::cli::Options;
///
/// let options = Options::new()
///     .model("sonnet")
///     .max_turns(3)
///     .allowed_tools(&["Read", "Grep"]);
/// assert!(options.build_args("hi").contains(&"--max-turns".to_string()));
/// ```
#[derive(Debug, Clone)]
pub struct Options {
    pub cli_path: Option<PathBuf>,
    pub model: Option<String>,
    pub mcp_config: Option<PathBuf>,
    pub system_prompt: Option<String>,
    pub append_system_prompt: Option<String>,
    pub allowed_tools: Option<Vec<String>>,
    pub disallowed_tools: Option<Vec<String>>,
    pub max_turns: Option<u32>,
    pub permission_mode: Option<PermissionMode>,
    pub resume: Option<String>,
    pub continue_conversation: bool,
    pub working_dir: Option<PathBuf>,
    /// Extra environment variables for the child.
    pub env: HashMap<String, String>,
    /// Payload written to the child's stdin, which is then closed.
    pub input: Option<String>,
    /// Capacity of the streaming message channel.
    pub channel_buffer: usize,
    pub max_stderr_bytes: usize,
    /// Longest stdout record decoded; longer ones become decode errors.
    pub max_record_bytes: usize,
    pub terminate_timeout: Duration,
    pub stderr_grace: Duration,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            cli_path: None,
            model: None,
            mcp_config: None,
            system_prompt: None,
            append_system_prompt: None,
            allowed_tools: None,
            disallowed_tools: None,
            max_turns: None,
            permission_mode: None,
            resume: None,
            continue_conversation: false,
            working_dir: None,
            env: HashMap::new(),
            input: None,
            channel_buffer: DEFAULT_CHANNEL_BUFFER,
            max_stderr_bytes: DEFAULT_MAX_STDERR_BYTES,
            max_record_bytes: DEFAULT_MAX_RECORD_BYTES,
            terminate_timeout: DEFAULT_TERMINATE_TIMEOUT,
            stderr_grace: DEFAULT_STDERR_GRACE,
        }
    }
}

impl Options {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific Claude Code binary instead of searching `PATH`.
    #[must_use]
    pub fn cli_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cli_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Path to an MCP server configuration file.
    #[must_use]
    pub fn mcp_config(mut self, path: impl Into<PathBuf>) -> Self {
        self.mcp_config = Some(path.into());
        self
    }

    #[must_use]
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    #[must_use]
    pub fn append_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.append_system_prompt = Some(prompt.into());
        self
    }

    #[must_use]
    pub fn allowed_tools(mut self, tools: &[&str]) -> Self {
        self.allowed_tools = Some(tools.iter().map(|s| (*s).to_string()).collect());
        self
    }

    #[must_use]
    pub fn disallowed_tools(mut self, tools: &[&str]) -> Self {
        self.disallowed_tools = Some(tools.iter().map(|s| (*s).to_string()).collect());
        self
    }

    #[must_use]
    pub fn max_turns(mut self, turns: u32) -> Self {
        self.max_turns = Some(turns);
        self
    }

    #[must_use]
    pub fn permission_mode(mut self, mode: PermissionMode) -> Self {
        self.permission_mode = Some(mode);
        self
    }

    /// Resume an existing session.
    #[must_use]
    pub fn resume(mut self, session_id: impl Into<String>) -> Self {
        self.resume = Some(session_id.into());
        self
    }

    /// Continue the most recent conversation.
    #[must_use]
    pub fn continue_conversation(mut self) -> Self {
        self.continue_conversation = true;
        self
    }

    #[must_use]
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Write `input` to the child's stdin.
    #[must_use]
    pub fn input(mut self, input: impl Into<String>) -> Self {
        self.input = Some(input.into());
        self
    }

    #[must_use]
    pub fn channel_buffer(mut self, capacity: usize) -> Self {
        self.channel_buffer = capacity.max(1);
        self
    }

    #[must_use]
    pub fn max_stderr_bytes(mut self, limit: usize) -> Self {
        self.max_stderr_bytes = limit;
        self
    }

    #[must_use]
    pub fn max_record_bytes(mut self, limit: usize) -> Self {
        self.max_record_bytes = limit;
        self
    }

    #[must_use]
    pub fn terminate_timeout(mut self, timeout: Duration) -> Self {
        self.terminate_timeout = timeout;
        self
    }

    #[must_use]
    pub fn stderr_grace(mut self, grace: Duration) -> Self {
        self.stderr_grace = grace;
        self
    }

    /// Build the command-line arguments for `prompt`.
    #[must_use]
    pub fn build_args(&self, prompt: &str) -> Vec<String> {
        let mut args = vec![
            "--print".to_string(),
            "--output-format".to_string(),
            "stream-json".to_string(),
            // stream-json requires --verbose in print mode
            "--verbose".to_string(),
        ];

        if let Some(prompt) = &self.system_prompt {
            args.push("--system-prompt".to_string());
            args.push(prompt.clone());
        }

        if let Some(prompt) = &self.append_system_prompt {
            args.push("--append-system-prompt".to_string());
            args.push(prompt.clone());
        }

        if let Some(tools) = &self.allowed_tools {
            args.push("--allowedTools".to_string());
            args.push(tools.join(","));
        }

        if let Some(tools) = &self.disallowed_tools {
            args.push("--disallowedTools".to_string());
            args.push(tools.join(","));
        }

        if let Some(turns) = self.max_turns {
            args.push("--max-turns".to_string());
            args.push(turns.to_string());
        }

        if let Some(model) = &self.model {
            args.push("--model".to_string());
            args.push(model.clone());
        }

        if let Some(mode) = self.permission_mode {
            args.push("--permission-mode".to_string());
            args.push(mode.as_str().to_string());
        }

        if let Some(path) = &self.mcp_config {
            args.push("--mcp-config".to_string());
            args.push(path.display().to_string());
        }

        if let Some(session_id) = &self.resume {
            args.push("--resume".to_string());
            args.push(session_id.clone());
        } else if self.continue_conversation {
            args.push("--continue".to_string());
        }

        args.push(prompt.to_string());
        args
    }
}

/// A prompt paired with its options, as accepted by the streaming call.
#[derive(Debug, Clone, Default)]
pub struct QueryRequest {
    pub prompt: String,
    pub options: Options,
}

impl QueryRequest {
    #[must_use]
    pub fn new(prompt: impl Into<String>, options: Options) -> Self {
        Self {
            prompt: prompt.into(),
            options,
        }
    }
}
