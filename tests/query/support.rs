//! Fake Claude CLI scripts for driving real subprocesses.

use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use std::time::Duration;

use claude_query::Options;
use tempfile::TempDir;

/// Upper bound for any single query in these tests.
pub const QUERY_DEADLINE: Duration = Duration::from_secs(10);

pub const INIT_LINE: &str =
    r#"{"type":"system","subtype":"init","session_id":"sess-1","cwd":"/tmp","tools":["Read"],"model":"sonnet","mcp_servers":[]}"#;
pub const ASSISTANT_LINE: &str =
    r#"{"type":"assistant","message":{"id":"m1","content":[{"type":"text","text":"Hello there"}]}}"#;
pub const RESULT_LINE: &str =
    r#"{"type":"result","subtype":"success","session_id":"sess-1","is_error":false,"result":"Hello there","total_cost_usd":0.002,"num_turns":1}"#;

/// A shell script standing in for the `claude` binary.
pub struct FakeCli {
    _dir: TempDir,
    pub path: PathBuf,
}

impl FakeCli {
    pub fn new(body: &str) -> Self {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("claude");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        Self { _dir: dir, path }
    }

    /// Emits a full successful session.
    pub fn successful() -> Self {
        Self::new(&format!(
            "echo '{INIT_LINE}'\necho '{ASSISTANT_LINE}'\necho '{RESULT_LINE}'"
        ))
    }

    /// Behaves like the real CLI when `--mcp-config` points at a missing file.
    pub fn checks_mcp_config() -> Self {
        Self::new(&format!(
            r#"while [ $# -gt 0 ]; do
  if [ "$1" = "--mcp-config" ] && [ ! -f "$2" ]; then
    echo "Error: Invalid MCP configuration: MCP config file not found: $2" >&2
    exit 1
  fi
  shift
done
echo '{RESULT_LINE}'"#
        ))
    }

    pub fn options(&self) -> Options {
        Options::new().cli_path(&self.path)
    }
}

/// Poll until `pid` is gone or only a zombie awaiting its reaper.
#[cfg(target_os = "linux")]
pub async fn wait_for_exit(pid: u32, within: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + within;
    while is_running(pid) {
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    true
}

#[cfg(target_os = "linux")]
fn is_running(pid: u32) -> bool {
    std::fs::read_to_string(format!("/proc/{pid}/stat")).is_ok_and(|stat| {
        stat.rsplit_once(')')
            .is_some_and(|(_, rest)| !rest.trim_start().starts_with('Z'))
    })
}

/// Read the pid a fake CLI wrote next to its script.
#[cfg(target_os = "linux")]
pub fn read_pid_file(cli: &FakeCli) -> u32 {
    let raw = std::fs::read_to_string(cli.path.with_extension("pid")).unwrap();
    raw.trim().parse().unwrap()
}
