//! Kiln core: the session/state engine of an interactive editing
//! workspace.
//!
//! Keeps the open-document set, the active-document pointer,
//! per-document dirty/language state, and the terminal's
//! command/output/history model consistent under asynchronous events.
//! Remote concerns (file I/O, inference, execution) are reached only
//! through the collaborator traits in [`remote`].

pub mod assist;
pub mod autosave;
pub mod chat;
pub mod config;
pub mod document;
pub mod error;
pub mod language;
pub mod remote;
pub mod session;
pub mod terminal;

// Re-export common error type
pub use error::{KilnError, Result};
