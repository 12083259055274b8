use serde::{Deserialize, Serialize};

use crate::document::DocumentId;
use crate::language::Language;

/// Change notifications published by the session.
///
/// Whatever layer needs to react (a renderer, a status bar, the
/// autosave scheduler's owner) subscribes explicitly; the session never
/// calls back into rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// A document joined the open set.
    Opened { id: DocumentId },
    /// A document left the open set.
    Closed { id: DocumentId },
    /// The active pointer moved (`None` when the set emptied).
    Activated { id: Option<DocumentId> },
    /// A document's buffer changed.
    ContentChanged { id: DocumentId, dirty: bool },
    /// A document's buffer was persisted.
    Saved { id: DocumentId },
    /// An untitled document was renamed.
    Renamed { id: DocumentId, name: String },
    /// A document's language tag was overridden.
    LanguageChanged { id: DocumentId, language: Language },
}
