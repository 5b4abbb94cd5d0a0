//! Stream decoder for Claude Code stdout.
//!
//! stdout is newline-delimited JSON. A malformed record produces a
//! [`DecodeError`] in its slot and decoding carries on with the next line.

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc::{self, Receiver, Sender};

use crate::cli::ClaudeEvent;

/// Default capacity for message channels.
pub const DEFAULT_CHANNEL_BUFFER: usize = 64;

/// Default cap on a single stdout record (32 MiB).
pub const DEFAULT_MAX_RECORD_BYTES: usize = 32 * 1024 * 1024;

/// Longest slice of a bad record kept in a [`DecodeError`].
const MAX_ERROR_INPUT: usize = 512;

/// A stdout record that could not be decoded.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("Failed to decode record: {reason}")]
pub struct DecodeError {
    /// The offending record, truncated for very long lines.
    pub input: String,
    pub reason: String,
}

impl DecodeError {
    fn new(input: &str, reason: impl Into<String>) -> Self {
        let input = match input.char_indices().nth(MAX_ERROR_INPUT) {
            Some((cut, _)) => format!("{}...", &input[..cut]),
            None => input.to_string(),
        };
        Self {
            input,
            reason: reason.into(),
        }
    }
}

/// One slot of decoded output.
pub type MessageResult = Result<ClaudeEvent, DecodeError>;

/// Reads records from an async byte stream.
#[derive(Debug)]
pub struct RecordReader<R> {
    reader: BufReader<R>,
    buf: Vec<u8>,
    max_record_bytes: usize,
}

impl<R: AsyncRead + Unpin> RecordReader<R> {
    pub fn new(reader: R) -> Self {
        Self::with_limit(reader, DEFAULT_MAX_RECORD_BYTES)
    }

    /// Reader that keeps at most `max_record_bytes` of any one record.
    pub fn with_limit(reader: R, max_record_bytes: usize) -> Self {
        Self {
            reader: BufReader::new(reader),
            buf: Vec::new(),
            max_record_bytes: max_record_bytes.max(1),
        }
    }

    /// Read the next non-blank record.
    ///
    /// Returns `Ok(None)` at end-of-stream. A final line without a trailing
    /// newline is still decoded. A record longer than the limit is read to its
    /// newline and discarded, and its slot holds a [`DecodeError`].
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if the read itself fails.
    pub async fn next_record(&mut self) -> std::io::Result<Option<MessageResult>> {
        loop {
            self.buf.clear();
            let mut read_any = false;
            let mut dropped = 0usize;

            loop {
                let available = self.reader.fill_buf().await?;
                if available.is_empty() {
                    break;
                }
                read_any = true;

                let (used, done) = match available.iter().position(|&b| b == b'\n') {
                    Some(i) => (i + 1, true),
                    None => (available.len(), false),
                };
                let keep = used.min(self.max_record_bytes.saturating_sub(self.buf.len()));
                self.buf.extend_from_slice(&available[..keep]);
                dropped += used - keep;
                self.reader.consume(used);

                if done {
                    break;
                }
            }

            if !read_any {
                return Ok(None);
            }
            if dropped > 0 {
                tracing::warn!(
                    limit = self.max_record_bytes,
                    dropped,
                    "Oversized stdout record discarded"
                );
                let head = String::from_utf8_lossy(&self.buf);
                return Ok(Some(Err(DecodeError::new(
                    head.trim_end(),
                    format!(
                        "record exceeds {} bytes ({dropped} bytes discarded)",
                        self.max_record_bytes
                    ),
                ))));
            }
            if let Some(decoded) = StreamParser::decode_record(&self.buf) {
                return Ok(Some(decoded));
            }
        }
    }
}

/// Parser for Claude Code stream-json output.
pub struct StreamParser;

impl StreamParser {
    /// Parse a single line of stream-json output.
    ///
    /// # Errors
    ///
    /// Returns `DecodeError` if the line is not a valid event.
    pub fn parse_line(line: &str) -> Result<ClaudeEvent, DecodeError> {
        serde_json::from_str(line).map_err(|e| DecodeError::new(line, e.to_string()))
    }

    /// Decode one raw record. Blank records yield `None`.
    #[must_use]
    pub fn decode_record(raw: &[u8]) -> Option<MessageResult> {
        let line = match std::str::from_utf8(raw) {
            Ok(line) => line,
            Err(e) => {
                let lossy = String::from_utf8_lossy(raw);
                return Some(Err(DecodeError::new(
                    lossy.trim_end(),
                    format!("invalid UTF-8: {e}"),
                )));
            }
        };

        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        Some(Self::parse_line(line))
    }

    /// Forward every record from `reader` into `tx` until end-of-stream.
    ///
    /// Stops early without error if the receiver is dropped.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if reading fails.
    pub async fn parse_stdout<R>(reader: R, tx: Sender<MessageResult>) -> std::io::Result<()>
    where
        R: AsyncRead + Unpin,
    {
        let mut records = RecordReader::new(reader);
        while let Some(decoded) = records.next_record().await? {
            if let Err(ref e) = decoded {
                tracing::warn!(error = %e.reason, "Undecodable stdout record");
            }
            if tx.send(decoded).await.is_err() {
                tracing::debug!("Message receiver dropped, stopping decoder");
                break;
            }
        }
        Ok(())
    }

    /// Decode `reader` on a background task, returning the receiving end.
    ///
    /// The channel closes at end-of-stream or on a read error.
    pub fn into_channel<R>(reader: R, buffer: usize) -> Receiver<MessageResult>
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(buffer);
        tokio::spawn(async move {
            if let Err(e) = Self::parse_stdout(reader, tx).await {
                tracing::warn!(error = %e, "Error reading stdout stream");
            }
        });
        rx
    }
}
