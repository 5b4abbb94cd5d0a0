//! Background stderr capture for Claude Code processes.
//!
//! The collector starts draining as soon as the process is spawned and runs
//! on its own task until end-of-stream, independent of how fast stdout is
//! consumed. The buffer is owned by that task and handed back through its
//! `JoinHandle`, so it is never read while still being appended to.

use std::borrow::Cow;
use std::fmt;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Size of each read from the pipe.
const READ_CHUNK: usize = 8192;

/// Stderr as observed once the collector has finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapturedStderr {
    /// The pipe was drained. `output` may be empty if the process wrote nothing.
    Drained {
        output: Vec<u8>,
        /// Bytes read past the capture limit and discarded.
        dropped_bytes: usize,
    },
    /// Capture never happened, e.g. the pipe could not be attached.
    Unavailable { reason: String },
}

impl CapturedStderr {
    /// Captured output decoded lossily. Empty for `Unavailable`.
    #[must_use]
    pub fn text(&self) -> Cow<'_, str> {
        match self {
            Self::Drained { output, .. } => String::from_utf8_lossy(output),
            Self::Unavailable { .. } => Cow::Borrowed(""),
        }
    }

    /// True when the pipe was drained and nothing was written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Drained { output, .. } if output.is_empty())
    }

    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}

impl fmt::Display for CapturedStderr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable { reason } => write!(f, "<stderr unavailable: {reason}>"),
            Self::Drained { output, .. } if output.is_empty() => f.write_str("<no stderr output>"),
            Self::Drained {
                output,
                dropped_bytes,
            } => {
                f.write_str(String::from_utf8_lossy(output).trim_end())?;
                if *dropped_bytes > 0 {
                    write!(f, " [{dropped_bytes} more bytes truncated]")?;
                }
                Ok(())
            }
        }
    }
}

/// Read `reader` to end-of-stream, keeping at most `limit` bytes.
///
/// Bytes beyond `limit` are still read so the writer never blocks on a full
/// pipe. A read error ends the drain and is recorded in the output. If
/// `abandon` fires first, whatever was read so far is returned.
pub async fn drain_stderr<R>(mut reader: R, limit: usize, abandon: CancellationToken) -> CapturedStderr
where
    R: AsyncRead + Unpin,
{
    let mut output = Vec::new();
    let mut dropped_bytes = 0usize;
    let mut chunk = [0u8; READ_CHUNK];

    loop {
        let read = tokio::select! {
            biased;
            () = abandon.cancelled() => {
                tracing::debug!(bytes = output.len(), "Stderr drain abandoned");
                append_note(&mut output, "[stderr drain abandoned]");
                break;
            }
            read = reader.read(&mut chunk) => read,
        };

        match read {
            Ok(0) => break,
            Ok(n) => {
                let keep = n.min(limit.saturating_sub(output.len()));
                output.extend_from_slice(&chunk[..keep]);
                dropped_bytes += n - keep;
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => {
                tracing::warn!(error = %e, "Error reading stderr");
                append_note(&mut output, &format!("[stderr read error: {e}]"));
                break;
            }
        }
    }

    CapturedStderr::Drained {
        output,
        dropped_bytes,
    }
}

fn append_note(output: &mut Vec<u8>, note: &str) {
    if !output.is_empty() && !output.ends_with(b"\n") {
        output.push(b'\n');
    }
    output.extend_from_slice(note.as_bytes());
}

/// Handle to a running stderr drain.
#[derive(Debug)]
pub struct StderrCollector {
    task: Option<JoinHandle<CapturedStderr>>,
    setup_failure: Option<String>,
    abandon: CancellationToken,
}

impl StderrCollector {
    /// Start draining `pipe` on a dedicated task.
    ///
    /// A missing pipe is remembered as a setup failure and reported as
    /// [`CapturedStderr::Unavailable`].
    pub fn spawn<R>(pipe: Option<R>, limit: usize) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let abandon = CancellationToken::new();
        match pipe {
            Some(reader) => Self {
                task: Some(tokio::spawn(drain_stderr(reader, limit, abandon.clone()))),
                setup_failure: None,
                abandon,
            },
            None => Self {
                task: None,
                setup_failure: Some("stderr pipe was not available".to_string()),
                abandon,
            },
        }
    }

    /// Wait for the drain to reach end-of-stream.
    ///
    /// Cancel-safe: dropping the future leaves the drain running.
    pub async fn finish(&mut self) -> CapturedStderr {
        self.join().await
    }

    /// Wait up to `grace` for end-of-stream, then abandon the drain.
    ///
    /// Used after a kill, when a surviving grandchild may still hold the pipe
    /// open. The partial buffer is still returned.
    pub async fn finish_within(&mut self, grace: Duration) -> CapturedStderr {
        if let Some(task) = self.task.as_mut() {
            if let Ok(joined) = tokio::time::timeout(grace, task).await {
                self.task = None;
                return Self::unwrap_join(joined);
            }
            self.abandon.cancel();
        }
        self.join().await
    }

    async fn join(&mut self) -> CapturedStderr {
        let Some(task) = self.task.as_mut() else {
            return CapturedStderr::Unavailable {
                reason: self
                    .setup_failure
                    .clone()
                    .unwrap_or_else(|| "stderr already collected".to_string()),
            };
        };
        let joined = task.await;
        self.task = None;
        Self::unwrap_join(joined)
    }

    fn unwrap_join(joined: Result<CapturedStderr, tokio::task::JoinError>) -> CapturedStderr {
        joined.unwrap_or_else(|e| CapturedStderr::Unavailable {
            reason: format!("stderr collector failed: {e}"),
        })
    }
}

impl Drop for StderrCollector {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
