//! Configuration types.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cli::{
    Options, PermissionMode, DEFAULT_CHANNEL_BUFFER, DEFAULT_MAX_RECORD_BYTES,
    DEFAULT_MAX_STDERR_BYTES, DEFAULT_STDERR_GRACE, DEFAULT_TERMINATE_TIMEOUT,
};

/// Client configuration loaded from TOML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Path to the Claude Code binary. Searched on `PATH` when unset.
    pub cli_path: Option<PathBuf>,
    pub model: Option<String>,
    pub mcp_config: Option<PathBuf>,
    pub permission_mode: Option<PermissionMode>,
    pub allowed_tools: Option<Vec<String>>,
    pub max_turns: Option<u32>,
    /// Extra environment variables for the child.
    pub env: HashMap<String, String>,
    pub limits: LimitsConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            cli_path: None,
            model: None,
            mcp_config: None,
            permission_mode: None,
            allowed_tools: None,
            max_turns: None,
            env: HashMap::new(),
            limits: LimitsConfig::default(),
        }
    }
}

/// Process and buffering limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub channel_buffer: usize,
    pub max_stderr_bytes: usize,
    pub max_record_bytes: usize,
    /// Milliseconds between SIGTERM and SIGKILL on cancellation.
    pub terminate_timeout_ms: u64,
    /// Milliseconds to wait for stderr after a kill.
    pub stderr_grace_ms: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            channel_buffer: DEFAULT_CHANNEL_BUFFER,
            max_stderr_bytes: DEFAULT_MAX_STDERR_BYTES,
            max_record_bytes: DEFAULT_MAX_RECORD_BYTES,
            terminate_timeout_ms: duration_ms(DEFAULT_TERMINATE_TIMEOUT),
            stderr_grace_ms: duration_ms(DEFAULT_STDERR_GRACE),
        }
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl ClientConfig {
    /// Build query options from this configuration.
    #[must_use]
    pub fn to_options(&self) -> Options {
        let mut options = Options::new()
            .channel_buffer(self.limits.channel_buffer)
            .max_stderr_bytes(self.limits.max_stderr_bytes)
            .max_record_bytes(self.limits.max_record_bytes)
            .terminate_timeout(Duration::from_millis(self.limits.terminate_timeout_ms))
            .stderr_grace(Duration::from_millis(self.limits.stderr_grace_ms));

        options.cli_path.clone_from(&self.cli_path);
        options.model.clone_from(&self.model);
        options.mcp_config.clone_from(&self.mcp_config);
        options.permission_mode = self.permission_mode;
        options.allowed_tools.clone_from(&self.allowed_tools);
        options.max_turns = self.max_turns;
        options.env.clone_from(&self.env);
        options
    }
}
