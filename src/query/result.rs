//! Aggregation of a finished query.

use crate::cli::{ClaudeEvent, DecodeError, MessageResult, ResultEvent};

use super::ExitReason;

/// Everything a successful query produced.
#[derive(Debug, Clone, Default)]
pub struct QueryResult {
    /// Decoded messages in arrival order.
    pub messages: Vec<ClaudeEvent>,
    /// Records that failed to decode. Not fatal.
    pub decode_errors: Vec<DecodeError>,
    /// Assistant text across all turns.
    pub text: String,
    pub session_id: Option<String>,
    /// The terminal `result` event, if the CLI emitted one.
    pub result: Option<ResultEvent>,
    pub exit: Option<ExitReason>,
}

impl QueryResult {
    /// Fold one message slot into the result.
    pub fn push(&mut self, slot: MessageResult) {
        let event = match slot {
            Ok(event) => event,
            Err(e) => {
                self.decode_errors.push(e);
                return;
            }
        };

        if self.session_id.is_none() {
            self.session_id = event.session_id().map(ToString::to_string);
        }

        match &event {
            ClaudeEvent::Assistant { message, .. } => self.text.push_str(&message.text()),
            ClaudeEvent::Result(result) => self.result = Some(result.clone()),
            _ => {}
        }

        self.messages.push(event);
    }

    /// The final answer: the `result` event's text, else the assistant text.
    #[must_use]
    pub fn answer(&self) -> &str {
        self.result
            .as_ref()
            .and_then(|r| r.result.as_deref())
            .unwrap_or(&self.text)
    }

    /// Whether the CLI itself flagged the run as an error.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.result.as_ref().is_some_and(|r| r.is_error)
    }

    #[must_use]
    pub fn cost_usd(&self) -> Option<f64> {
        self.result.as_ref().and_then(|r| r.total_cost_usd)
    }
}
