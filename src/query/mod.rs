//! Blocking and streaming queries against the Claude Code CLI.

mod error;
mod result;
mod run;

pub use error::*;
pub use result::*;
pub use run::*;
