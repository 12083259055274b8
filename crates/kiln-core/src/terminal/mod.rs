//! Terminal engine module.
//!
//! A line-oriented pseudo-shell: typed input is parsed into a command
//! plus arguments and dispatched to a fixed table of built-ins or to
//! the remote execution collaborator. The engine maintains an
//! append-only timestamped output log and a navigable command history;
//! it renders state, it does not draw it.

mod builtin;
mod engine;
mod history;
mod output;

pub use builtin::{BuiltinCommand, builtin_commands, find_builtin};
pub use engine::{RunTarget, TerminalEngine};
pub use history::CommandHistory;
pub use output::{EntryKind, OutputEntry, format_size};
