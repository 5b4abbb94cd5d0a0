//! Claude Code process launching and control.
//!
//! [`LaunchSpec`] describes a fully resolved command line. [`ClaudeProcess::spawn`]
//! starts it with stdout and stderr piped so that readers can be attached
//! before the child has any chance to exit.

use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};

use crate::cli::Options;

/// Binary searched on `PATH` when no explicit path is configured.
pub const DEFAULT_BINARY: &str = "claude";

/// Environment variable that overrides the binary location.
pub const BINARY_ENV_OVERRIDE: &str = "CLAUDE_CODE_BINARY";

/// Error type for process spawning operations.
#[derive(thiserror::Error, Debug)]
pub enum SpawnError {
    /// The binary could not be located on `PATH`.
    #[error("`{name}` not found on PATH: {reason}")]
    Unresolved { name: String, reason: String },
    /// The binary was not found.
    #[error("Claude binary not found")]
    NotFound,
    /// Permission denied when spawning.
    #[error("Permission denied")]
    PermissionDenied,
    /// Other I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SpawnError {
    /// Create a `SpawnError` from an I/O error, classifying common cases.
    fn from_io(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound,
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied,
            _ => Self::Io(err),
        }
    }
}

/// The executable could not be located or started. No process ran.
#[derive(thiserror::Error, Debug)]
#[error("Claude CLI not found at {path}: {source}")]
pub struct CliNotFoundError {
    /// Path (or bare name) that was attempted.
    pub path: PathBuf,
    /// Why the launch failed.
    #[source]
    pub source: SpawnError,
}

/// A resolved command line ready to be launched.
#[derive(Debug, Clone, Default)]
pub struct LaunchSpec {
    /// Explicit binary path; `None` resolves via env override or `PATH`.
    pub binary: Option<PathBuf>,
    pub args: Vec<String>,
    pub env: HashMap<String, String>,
    pub working_dir: Option<PathBuf>,
    /// Payload for stdin. When `None`, stdin is connected to `/dev/null`.
    pub stdin: Option<Vec<u8>>,
}

impl LaunchSpec {
    /// Build the launch spec for `prompt` under `options`.
    #[must_use]
    pub fn from_options(prompt: &str, options: &Options) -> Self {
        Self {
            binary: options.cli_path.clone(),
            args: options.build_args(prompt),
            env: options.env.clone(),
            working_dir: options.working_dir.clone(),
            stdin: options.input.as_ref().map(|s| s.clone().into_bytes()),
        }
    }
}

/// Resolve the binary to launch.
///
/// Resolution order: explicit path, then [`BINARY_ENV_OVERRIDE`], then a
/// `PATH` search for [`DEFAULT_BINARY`].
///
/// # Errors
///
/// Returns `CliNotFoundError` if no candidate can be found.
pub fn resolve_binary(explicit: Option<&Path>) -> Result<PathBuf, CliNotFoundError> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }

    if let Some(path) = env::var_os(BINARY_ENV_OVERRIDE).filter(|v| !v.is_empty()) {
        tracing::debug!(path = ?path, "Resolved Claude binary via env override");
        return Ok(PathBuf::from(path));
    }

    which::which(DEFAULT_BINARY).map_err(|e| CliNotFoundError {
        path: PathBuf::from(DEFAULT_BINARY),
        source: SpawnError::Unresolved {
            name: DEFAULT_BINARY.to_string(),
            reason: e.to_string(),
        },
    })
}

/// A running Claude Code process.
///
/// On Unix the child leads its own process group. Termination signals the
/// whole group, so helpers it spawned do not outlive it, and dropping the
/// handle kills whatever is left of the group.
#[derive(Debug)]
pub struct ClaudeProcess {
    child: Child,
    path: PathBuf,
    stdin_payload: Option<Vec<u8>>,
    #[cfg(unix)]
    group: Option<nix::unistd::Pid>,
}

/// Process group id for a child spawned with `process_group(0)`.
///
/// `None` when `pid` does not name a valid group leader. A zero or negative
/// id would address the caller's own group or every process.
#[cfg(unix)]
#[must_use]
pub fn group_id(pid: u32) -> Option<nix::unistd::Pid> {
    i32::try_from(pid)
        .ok()
        .filter(|&pid| pid > 0)
        .map(nix::unistd::Pid::from_raw)
}

impl ClaudeProcess {
    /// Spawn a process for `spec`.
    ///
    /// stdout and stderr are piped before the child starts, so the pipes are
    /// readable as soon as this returns.
    ///
    /// # Errors
    ///
    /// Returns `CliNotFoundError` if the binary cannot be resolved or spawned.
    pub fn spawn(spec: &LaunchSpec) -> Result<Self, CliNotFoundError> {
        let path = resolve_binary(spec.binary.as_deref())?;

        let mut cmd = Command::new(&path);
        cmd.args(&spec.args)
            .envs(&spec.env)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(if spec.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .kill_on_drop(true);

        #[cfg(unix)]
        cmd.process_group(0);

        if let Some(ref dir) = spec.working_dir {
            cmd.current_dir(dir);
        }

        let child = cmd.spawn().map_err(|e| CliNotFoundError {
            path: path.clone(),
            source: SpawnError::from_io(e),
        })?;

        tracing::debug!(path = %path.display(), pid = ?child.id(), "Spawned Claude process");

        Ok(Self {
            #[cfg(unix)]
            group: child.id().and_then(group_id),
            child,
            path,
            stdin_payload: spec.stdin.clone(),
        })
    }

    /// The binary that was launched.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Take ownership of the stdout handle.
    ///
    /// This can only be called once; subsequent calls return `None`.
    pub fn take_stdout(&mut self) -> Option<ChildStdout> {
        self.child.stdout.take()
    }

    /// Take ownership of the stderr handle.
    ///
    /// This can only be called once; subsequent calls return `None`.
    pub fn take_stderr(&mut self) -> Option<ChildStderr> {
        self.child.stderr.take()
    }

    /// Take ownership of the stdin handle together with its payload.
    ///
    /// Returns `None` when no payload was configured.
    pub fn take_stdin(&mut self) -> Option<(ChildStdin, Vec<u8>)> {
        let payload = self.stdin_payload.take()?;
        self.child.stdin.take().map(|stdin| (stdin, payload))
    }

    /// Get the process ID, if still running.
    #[must_use]
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Check if the process has exited without blocking.
    ///
    /// # Errors
    ///
    /// Returns an error if the process state cannot be queried.
    pub fn try_wait(&mut self) -> std::io::Result<Option<ExitStatus>> {
        self.child.try_wait()
    }

    /// Wait for the process to exit.
    ///
    /// # Errors
    ///
    /// Returns an error if waiting fails.
    pub async fn wait(&mut self) -> std::io::Result<ExitStatus> {
        self.child.wait().await
    }

    /// Forcefully kill the process and its process group.
    ///
    /// # Errors
    ///
    /// Returns an error if the kill signal cannot be sent.
    pub async fn kill(&mut self) -> std::io::Result<()> {
        #[cfg(unix)]
        self.kill_group();
        self.child.kill().await
    }

    /// Attempt graceful termination with a timeout.
    ///
    /// On Unix, sends SIGTERM to the process group first, then SIGKILL to
    /// whatever remains of the group once the child exits or the timeout
    /// passes. On other platforms, falls back to immediate kill.
    ///
    /// # Errors
    ///
    /// Returns an error if termination fails.
    pub async fn graceful_terminate(&mut self, timeout: Duration) -> std::io::Result<()> {
        #[cfg(unix)]
        {
            self.graceful_terminate_unix(timeout).await
        }

        #[cfg(not(unix))]
        {
            let _ = timeout;
            self.kill().await
        }
    }

    #[cfg(unix)]
    async fn graceful_terminate_unix(&mut self, timeout: Duration) -> std::io::Result<()> {
        use nix::sys::signal::{killpg, Signal};

        let Some(group) = self.group else {
            tracing::debug!("No process group recorded, killing child only");
            return self.child.kill().await;
        };

        if self.child.id().is_none() {
            // Child already reaped; only stragglers in its group remain.
            self.kill_group();
            return Ok(());
        }

        if let Err(errno) = killpg(group, Signal::SIGTERM) {
            tracing::debug!(pgid = %group, %errno, "SIGTERM failed, falling back to SIGKILL");
            self.kill_group();
            return self.child.kill().await;
        }

        let exited = tokio::time::timeout(timeout, self.child.wait()).await;
        self.kill_group();
        match exited {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(e),
            Err(_) => {
                tracing::debug!(pgid = %group, ?timeout, "Process ignored SIGTERM, killing");
                self.child.kill().await
            }
        }
    }

    /// SIGKILL every process left in the child's group.
    #[cfg(unix)]
    fn kill_group(&self) {
        use nix::errno::Errno;
        use nix::sys::signal::{killpg, Signal};

        let Some(group) = self.group else {
            return;
        };
        match killpg(group, Signal::SIGKILL) {
            Ok(()) | Err(Errno::ESRCH) => {}
            Err(errno) => tracing::warn!(pgid = %group, %errno, "Failed to kill process group"),
        }
    }
}

impl Drop for ClaudeProcess {
    fn drop(&mut self) {
        #[cfg(unix)]
        self.kill_group();
    }
}
