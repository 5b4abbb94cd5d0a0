//! Process driver shared by the blocking and streaming calls.
//!
//! Each query owns one process. stderr drains on its own task from the moment
//! of spawn; stdout is decoded here and forwarded record by record. Once
//! stdout ends, the exit status is awaited, then the stderr drain, and only
//! then is the verdict built.

use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc::{self, Sender};
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::cli::{
    CapturedStderr, ClaudeProcess, LaunchSpec, MessageResult, Options, QueryRequest,
    RecordReader, StderrCollector,
};

use super::{classify_exit, CancellationError, ExitReason, QueryError, QueryResult};

/// Receiving end of the message conduit.
pub type MessageReceiver = mpsc::Receiver<MessageResult>;

/// Receiving end of the error conduit. `None` means success.
pub type ErrorReceiver = oneshot::Receiver<Option<QueryError>>;

#[derive(Debug, Clone, Copy)]
struct Limits {
    max_stderr_bytes: usize,
    max_record_bytes: usize,
    terminate_timeout: Duration,
    stderr_grace: Duration,
}

impl From<&Options> for Limits {
    fn from(options: &Options) -> Self {
        Self {
            max_stderr_bytes: options.max_stderr_bytes,
            max_record_bytes: options.max_record_bytes,
            terminate_timeout: options.terminate_timeout,
            stderr_grace: options.stderr_grace,
        }
    }
}

/// A launched process with its stderr collector attached.
struct Run {
    process: ClaudeProcess,
    stderr: StderrCollector,
    limits: Limits,
}

impl Run {
    fn start(spec: &LaunchSpec, limits: Limits) -> Result<Self, QueryError> {
        let mut process = ClaudeProcess::spawn(spec)?;
        let stderr = StderrCollector::spawn(process.take_stderr(), limits.max_stderr_bytes);

        if let Some((mut stdin, payload)) = process.take_stdin() {
            tokio::spawn(async move {
                // A child that exits without reading stdin surfaces through its
                // exit status, not through this write.
                if let Err(e) = stdin.write_all(&payload).await {
                    tracing::debug!(error = %e, "Failed to write Claude stdin");
                }
            });
        }

        tracing::info!(
            pid = ?process.id(),
            path = %process.path().display(),
            "Claude process started"
        );

        Ok(Self {
            process,
            stderr,
            limits,
        })
    }

    /// Stop the process and collect what stderr is available.
    async fn terminate(&mut self) -> CapturedStderr {
        if let Err(e) = self
            .process
            .graceful_terminate(self.limits.terminate_timeout)
            .await
        {
            tracing::warn!(error = %e, "Failed to terminate Claude process");
        }
        self.stderr.finish_within(self.limits.stderr_grace).await
    }

    async fn cancel(mut self) -> QueryError {
        tracing::info!(pid = ?self.process.id(), "Cancelling Claude query");
        let stderr = self.terminate().await;
        CancellationError {
            stderr: Some(stderr),
        }
        .into()
    }

    /// Wait for exit, then for stderr to reach end-of-stream.
    ///
    /// A helper that inherited stderr can hold the pipe open after the child
    /// exits, so the drain gets `stderr_grace` before it is abandoned.
    async fn finish(&mut self) -> Result<ExitReason, QueryError> {
        let status = self.process.wait().await.map_err(QueryError::Wait)?;
        tracing::debug!(exit = %ExitReason::from(status), "Claude process exited");
        let stderr = self.stderr.finish_within(self.limits.stderr_grace).await;
        classify_exit(status, stderr)?;
        Ok(status.into())
    }
}

/// Drive one process to completion, forwarding every decoded record to `tx`.
async fn drive(
    spec: &LaunchSpec,
    limits: Limits,
    cancel: &CancellationToken,
    tx: &Sender<MessageResult>,
) -> Result<ExitReason, QueryError> {
    if cancel.is_cancelled() {
        return Err(CancellationError { stderr: None }.into());
    }

    let mut run = Run::start(spec, limits)?;

    let Some(stdout) = run.process.take_stdout() else {
        run.terminate().await;
        return Err(QueryError::MissingPipe("stdout"));
    };
    let mut records = RecordReader::with_limit(stdout, run.limits.max_record_bytes);

    loop {
        let next = tokio::select! {
            biased;
            () = cancel.cancelled() => None,
            next = records.next_record() => Some(next),
        };
        let Some(next) = next else {
            return Err(run.cancel().await);
        };

        let slot = match next {
            Ok(Some(slot)) => slot,
            Ok(None) => break,
            Err(source) => {
                tracing::warn!(error = %source, "Error reading Claude stdout");
                let stderr = run.terminate().await;
                return Err(QueryError::StdoutRead { source, stderr });
            }
        };

        if let Err(ref e) = slot {
            tracing::warn!(error = %e.reason, "Undecodable stdout record");
        }

        let sent = tokio::select! {
            biased;
            () = cancel.cancelled() => false,
            sent = tx.send(slot) => sent.is_ok(),
        };
        if !sent {
            if !cancel.is_cancelled() {
                tracing::debug!("Message receiver dropped, stopping query");
            }
            return Err(run.cancel().await);
        }
    }

    let finished = tokio::select! {
        biased;
        () = cancel.cancelled() => None,
        finished = run.finish() => Some(finished),
    };
    match finished {
        Some(verdict) => verdict,
        None => Err(run.cancel().await),
    }
}

/// Run a query and collect its full output.
///
/// Returns once stdout has ended, the process has exited and stderr has been
/// drained. Cancelling `cancel` kills the process and returns
/// [`QueryError::Cancelled`].
///
/// # Errors
///
/// Returns `QueryError::CliNotFound` if the CLI cannot be started,
/// `QueryError::Process` if it exits unsuccessfully, and
/// `QueryError::Cancelled` on cancellation.
pub async fn query(
    cancel: &CancellationToken,
    prompt: &str,
    options: &Options,
) -> Result<QueryResult, QueryError> {
    let spec = LaunchSpec::from_options(prompt, options);
    let (tx, mut rx) = mpsc::channel(options.channel_buffer.max(1));

    let driver = async move {
        let verdict = drive(&spec, Limits::from(options), cancel, &tx).await;
        drop(tx);
        verdict
    };
    let collector = async {
        let mut result = QueryResult::default();
        while let Some(slot) = rx.recv().await {
            result.push(slot);
        }
        result
    };

    let (verdict, mut result) = tokio::join!(driver, collector);
    result.exit = Some(verdict?);
    Ok(result)
}

/// Run a query, delivering messages as they are decoded.
///
/// The message receiver closes first. The error receiver then yields the
/// terminal verdict: `None` on success, or the error. Dropping the message
/// receiver early kills the process.
///
/// # Panics
///
/// Panics if called outside a Tokio runtime.
#[must_use]
pub fn query_stream(
    cancel: CancellationToken,
    request: QueryRequest,
) -> (MessageReceiver, ErrorReceiver) {
    let (tx, rx) = mpsc::channel(request.options.channel_buffer.max(1));
    let (err_tx, err_rx) = oneshot::channel();

    tokio::spawn(async move {
        let spec = LaunchSpec::from_options(&request.prompt, &request.options);
        let verdict = drive(&spec, Limits::from(&request.options), &cancel, &tx).await;
        drop(tx);
        if err_tx.send(verdict.err()).is_err() {
            tracing::debug!("Error receiver dropped before verdict");
        }
    });

    (rx, err_rx)
}
