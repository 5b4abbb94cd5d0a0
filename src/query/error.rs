//! Query error taxonomy and exit classification.

use std::fmt;
use std::process::ExitStatus;

use crate::cli::{CapturedStderr, CliNotFoundError};

/// How a process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// Exited with a status code.
    Code(i32),
    /// Terminated by a signal.
    Signal(i32),
    /// Neither a code nor a signal was reported.
    Unknown,
}

impl From<ExitStatus> for ExitReason {
    fn from(status: ExitStatus) -> Self {
        if let Some(code) = status.code() {
            return Self::Code(code);
        }

        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signal) = status.signal() {
                return Self::Signal(signal);
            }
        }

        Self::Unknown
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Code(code) => write!(f, "exit code {code}"),
            Self::Signal(signal) => write!(f, "killed by signal {signal}"),
            Self::Unknown => f.write_str("unknown exit status"),
        }
    }
}

/// The process started and exited unsuccessfully.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("Claude process failed with {status}: {stderr}")]
pub struct ProcessError {
    pub status: ExitReason,
    /// Fully drained stderr.
    pub stderr: CapturedStderr,
}

/// The caller cancelled before the process finished.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("Query cancelled")]
pub struct CancellationError {
    /// Whatever stderr was captured before the kill.
    pub stderr: Option<CapturedStderr>,
}

/// Terminal failure of a query.
#[derive(thiserror::Error, Debug)]
pub enum QueryError {
    /// The executable could not be located or started.
    #[error(transparent)]
    CliNotFound(#[from] CliNotFoundError),
    /// The process exited with a failure status.
    #[error(transparent)]
    Process(#[from] ProcessError),
    /// Cancelled by the caller.
    #[error(transparent)]
    Cancelled(#[from] CancellationError),
    /// Reading stdout failed before end-of-stream.
    #[error("Failed to read Claude stdout: {source}")]
    StdoutRead {
        source: std::io::Error,
        stderr: CapturedStderr,
    },
    /// Collecting the exit status failed.
    #[error("Failed to wait for Claude process: {0}")]
    Wait(#[source] std::io::Error),
    /// A pipe that should have been attached at spawn was missing.
    #[error("Process {0} not available")]
    MissingPipe(&'static str),
}

impl QueryError {
    /// Captured stderr, for the variants that carry it.
    #[must_use]
    pub fn stderr(&self) -> Option<&CapturedStderr> {
        match self {
            Self::Process(e) => Some(&e.stderr),
            Self::Cancelled(e) => e.stderr.as_ref(),
            Self::StdoutRead { stderr, .. } => Some(stderr),
            Self::CliNotFound(_) | Self::Wait(_) | Self::MissingPipe(_) => None,
        }
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }
}

/// Turn an exit status and its finalized stderr into a verdict.
///
/// # Errors
///
/// Returns `QueryError::Process` when `status` is not a success.
pub fn classify_exit(status: ExitStatus, stderr: CapturedStderr) -> Result<(), QueryError> {
    if status.success() {
        if !stderr.is_empty() {
            tracing::debug!(stderr = %stderr, "Claude exited cleanly with stderr output");
        }
        return Ok(());
    }

    let status = ExitReason::from(status);
    tracing::warn!(%status, bytes = stderr.text().len(), "Claude process failed");
    Err(ProcessError { status, stderr }.into())
}
