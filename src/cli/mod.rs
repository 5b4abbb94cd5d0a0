//! CLI module for Claude Code process spawning and stream parsing.

mod events;
mod options;
mod process;
mod stderr;
mod stream;

pub use events::*;
pub use options::*;
pub use process::*;
pub use stderr::*;
pub use stream::*;
