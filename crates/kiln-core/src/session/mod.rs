//! Editor session domain module.
//!
//! The session owns the ordered set of open documents and the active
//! pointer. All mutation goes through [`EditorSession`] methods so the
//! invariants (unique ids, valid active pointer, close reassignment)
//! are updated atomically.

mod event;
mod manager;

pub use event::SessionEvent;
pub use manager::{CloseConfirmation, EditorSession};
