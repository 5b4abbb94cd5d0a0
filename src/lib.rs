//! Claude Query - run the Claude Code CLI as a subprocess and stream its output.
//!
//! Two entry points share one process driver:
//!
//! - [`query::query`] collects every message and returns a [`query::QueryResult`].
//! - [`query::query_stream`] hands back a message receiver and an error
//!   receiver. The message receiver closes before the verdict is sent.
//!
//! Failures are typed: [`cli::CliNotFoundError`] when no process could be
//! started, [`query::ProcessError`] with the drained stderr when the process
//! exits unsuccessfully, and [`query::CancellationError`] on cancellation.

pub mod cli;
pub mod config;
pub mod display;
pub mod query;

pub use cli::{ClaudeEvent, Options, QueryRequest};
pub use query::{query, query_stream, QueryError, QueryResult};
