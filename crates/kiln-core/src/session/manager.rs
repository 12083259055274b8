use super::event::SessionEvent;
use crate::document::{Document, DocumentId};
use crate::language::Language;
use tokio::sync::broadcast;

/// Caller-supplied answer to the "discard unsaved changes?" gate.
///
/// The engine never decides this itself: closing a dirty document
/// without [`CloseConfirmation::Confirmed`] is refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseConfirmation {
    Confirmed,
    Unconfirmed,
}

/// The ordered set of open documents plus the active pointer.
///
/// Invariants:
/// - exactly one document per distinct id; ids never change;
/// - `active_id`, when set, references a member of the open set;
/// - closing the active document reassigns the pointer to the most
///   recently inserted remaining document, or clears it.
///
/// Operating on an unknown id is a no-op/`false` result, never a panic.
/// If the host environment is multi-threaded, callers must serialize
/// access (the workspace layer holds the session behind an `RwLock`)
/// because the invariants span multiple fields.
pub struct EditorSession {
    /// Insertion order doubles as tab order.
    documents: Vec<Document>,
    active_id: Option<DocumentId>,
    events: broadcast::Sender<SessionEvent>,
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new()
    }
}

impl EditorSession {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            documents: Vec::new(),
            active_id: None,
            events,
        }
    }

    /// Subscribes to change notifications.
    ///
    /// Receivers that lag or drop never block mutation.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: SessionEvent) {
        // Send fails only when no receiver is subscribed.
        let _ = self.events.send(event);
    }

    fn index_of(&self, id: &DocumentId) -> Option<usize> {
        self.documents.iter().position(|d| &d.id == id)
    }

    /// Opens a document backed by `path` with freshly read content.
    ///
    /// Idempotent: if a document with that path is already open, its
    /// existing id is returned and it becomes active; no duplicate is
    /// created and the supplied content is discarded.
    pub fn open_path(&mut self, path: &str, content: impl Into<String>) -> DocumentId {
        if let Some(doc) = self.documents.iter().find(|d| d.path.as_deref() == Some(path)) {
            let id = doc.id.clone();
            tracing::debug!(path, "document already open, focusing");
            self.set_active(&id);
            return id;
        }

        let doc = Document::from_path(path, content);
        let id = doc.id.clone();
        self.documents.push(doc);
        self.emit(SessionEvent::Opened { id: id.clone() });
        self.activate(Some(id.clone()));
        id
    }

    /// Creates a fresh untitled document populated with the language template.
    pub fn open_untitled(&mut self, language: Language) -> DocumentId {
        let doc = Document::untitled(language);
        let id = doc.id.clone();
        self.documents.push(doc);
        self.emit(SessionEvent::Opened { id: id.clone() });
        self.activate(Some(id.clone()));
        id
    }

    /// Closes a document.
    ///
    /// A dirty document closes only when the caller confirms; the
    /// engine never silently discards unsaved edits. Returns whether
    /// the close proceeded.
    pub fn close(&mut self, id: &DocumentId, confirm: CloseConfirmation) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };

        if self.documents[index].dirty && confirm == CloseConfirmation::Unconfirmed {
            tracing::debug!(id = %id, "close refused: unsaved changes without confirmation");
            return false;
        }

        self.documents.remove(index);
        self.emit(SessionEvent::Closed { id: id.clone() });

        if self.active_id.as_ref() == Some(id) {
            let next = self.documents.last().map(|d| d.id.clone());
            self.activate(next);
        }
        true
    }

    /// Switches focus. No-op when the id is not open.
    pub fn set_active(&mut self, id: &DocumentId) {
        if self.index_of(id).is_some() && self.active_id.as_ref() != Some(id) {
            self.activate(Some(id.clone()));
        }
    }

    fn activate(&mut self, id: Option<DocumentId>) {
        self.active_id = id.clone();
        self.emit(SessionEvent::Activated { id });
    }

    /// Replaces a document's buffer; last writer wins.
    pub fn update_content(&mut self, id: &DocumentId, content: impl Into<String>) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        let doc = &mut self.documents[index];
        doc.set_content(content);
        let dirty = doc.dirty;
        self.emit(SessionEvent::ContentChanged {
            id: id.clone(),
            dirty,
        });
        true
    }

    /// Records that a document's buffer was persisted.
    pub fn mark_saved(&mut self, id: &DocumentId) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        self.documents[index].mark_saved();
        self.emit(SessionEvent::Saved { id: id.clone() });
        true
    }

    /// Renames a never-saved document.
    ///
    /// Only valid while the name still carries the untitled prefix.
    /// The language is re-derived from the new name; the buffer is
    /// swapped to the new language's template only when it is still
    /// exactly the old language's template, so user-authored content is
    /// never overwritten.
    pub fn rename_untitled(&mut self, id: &DocumentId, new_name: &str) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        if !self.documents[index].is_untitled() || new_name.trim().is_empty() {
            return false;
        }

        let doc = &mut self.documents[index];
        let old_language = doc.language;
        let new_language = Language::classify(new_name);
        let swap_template = doc.is_pristine_template(old_language);

        doc.name = new_name.to_string();
        doc.language = new_language;
        if swap_template && new_language != old_language {
            doc.set_content(new_language.template());
        }

        self.emit(SessionEvent::Renamed {
            id: id.clone(),
            name: new_name.to_string(),
        });
        if new_language != old_language {
            self.emit(SessionEvent::LanguageChanged {
                id: id.clone(),
                language: new_language,
            });
        }
        true
    }

    /// Explicit user language override.
    ///
    /// For an untitled document this also rewrites the name's extension
    /// and swaps the starter template under the same only-if-pristine
    /// guard as [`EditorSession::rename_untitled`].
    pub fn set_language(&mut self, id: &DocumentId, language: Language) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        let doc = &mut self.documents[index];
        if doc.language == language {
            return true;
        }

        let old_language = doc.language;
        doc.language = language;

        if doc.is_untitled() {
            let stem = doc
                .name
                .rsplit_once('.')
                .map_or(doc.name.as_str(), |(s, _)| s)
                .to_string();
            doc.name = format!("{}.{}", stem, language.preferred_extension());
            if doc.is_pristine_template(old_language) {
                doc.set_content(language.template());
            }
        }

        self.emit(SessionEvent::LanguageChanged {
            id: id.clone(),
            language,
        });
        true
    }

    // ============================================================================
    // Accessors
    // ============================================================================

    pub fn active_id(&self) -> Option<&DocumentId> {
        self.active_id.as_ref()
    }

    pub fn active_document(&self) -> Option<&Document> {
        let id = self.active_id.as_ref()?;
        self.documents.iter().find(|d| &d.id == id)
    }

    pub fn document(&self, id: &DocumentId) -> Option<&Document> {
        self.documents.iter().find(|d| &d.id == id)
    }

    /// Documents in tab order.
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn contains_path(&self, path: &str) -> bool {
        self.documents.iter().any(|d| d.path.as_deref() == Some(path))
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_path_is_idempotent() {
        let mut session = EditorSession::new();
        let first = session.open_path("/proj/main.py", "print(1)");
        let second = session.open_path("/proj/main.py", "different");
        assert_eq!(first, second);
        assert_eq!(session.len(), 1);
        assert_eq!(
            session.document(&first).unwrap().content,
            "print(1)",
            "re-open must not clobber the live buffer"
        );
    }

    #[test]
    fn test_open_scenario_language_and_dirty() {
        let mut session = EditorSession::new();
        let id = session.open_path("main.py", "print(1)");
        let doc = session.document(&id).unwrap();
        assert_eq!(doc.language, Language::Python);
        assert!(!doc.dirty);

        session.update_content(&id, "print(2)");
        assert!(session.document(&id).unwrap().dirty);

        session.mark_saved(&id);
        assert!(!session.document(&id).unwrap().dirty);
    }

    #[test]
    fn test_update_with_saved_value_stays_clean() {
        let mut session = EditorSession::new();
        let id = session.open_path("a.txt", "same");
        session.update_content(&id, "same");
        assert!(!session.document(&id).unwrap().dirty);
    }

    #[test]
    fn test_close_active_reassigns_to_most_recent() {
        let mut session = EditorSession::new();
        let a = session.open_path("a.py", "");
        let b = session.open_path("b.py", "");
        let c = session.open_path("c.py", "");

        session.set_active(&b);
        assert!(session.close(&b, CloseConfirmation::Unconfirmed));
        // c was inserted after a, so it takes the pointer.
        assert_eq!(session.active_id(), Some(&c));

        assert!(session.close(&c, CloseConfirmation::Unconfirmed));
        assert_eq!(session.active_id(), Some(&a));

        assert!(session.close(&a, CloseConfirmation::Unconfirmed));
        assert_eq!(session.active_id(), None);
        assert!(session.is_empty());
    }

    #[test]
    fn test_dirty_close_requires_confirmation() {
        let mut session = EditorSession::new();
        let id = session.open_path("a.py", "saved text");
        session.update_content(&id, "edited");

        assert!(!session.close(&id, CloseConfirmation::Unconfirmed));
        assert_eq!(session.len(), 1, "unconfirmed close leaves the document open");

        assert!(session.close(&id, CloseConfirmation::Confirmed));
        assert!(session.is_empty());
    }

    #[test]
    fn test_unknown_id_operations_are_noops() {
        let mut session = EditorSession::new();
        let ghost = DocumentId::ephemeral();
        assert!(!session.close(&ghost, CloseConfirmation::Confirmed));
        assert!(!session.update_content(&ghost, "text"));
        assert!(!session.mark_saved(&ghost));
        assert!(!session.rename_untitled(&ghost, "x.py"));
        session.set_active(&ghost);
        assert_eq!(session.active_id(), None);
    }

    #[test]
    fn test_rename_untitled_swaps_pristine_template() {
        let mut session = EditorSession::new();
        let id = session.open_untitled(Language::JavaScript);

        assert!(session.rename_untitled(&id, "script.py"));
        let doc = session.document(&id).unwrap();
        assert_eq!(doc.name, "script.py");
        assert_eq!(doc.language, Language::Python);
        assert_eq!(doc.content, Language::Python.template());
    }

    #[test]
    fn test_rename_untitled_keeps_user_content() {
        let mut session = EditorSession::new();
        let id = session.open_untitled(Language::JavaScript);
        session.update_content(&id, "let answer = 42;");

        assert!(session.rename_untitled(&id, "answer.py"));
        let doc = session.document(&id).unwrap();
        assert_eq!(doc.language, Language::Python);
        assert_eq!(doc.content, "let answer = 42;");
    }

    #[test]
    fn test_rename_rejected_for_saved_documents() {
        let mut session = EditorSession::new();
        let id = session.open_path("/proj/lib.rs", "fn lib() {}");
        assert!(!session.rename_untitled(&id, "other.rs"));
        assert_eq!(session.document(&id).unwrap().name, "lib.rs");
    }

    #[test]
    fn test_set_language_rewrites_untitled_extension() {
        let mut session = EditorSession::new();
        let id = session.open_untitled(Language::JavaScript);

        assert!(session.set_language(&id, Language::Python));
        let doc = session.document(&id).unwrap();
        assert_eq!(doc.name, "untitled.py");
        assert_eq!(doc.content, Language::Python.template());

        // The id is stable across renames and overrides.
        assert_eq!(&doc.id, &id);
    }

    #[test]
    fn test_set_language_on_saved_document_keeps_name() {
        let mut session = EditorSession::new();
        let id = session.open_path("notes.txt", "hello");
        assert!(session.set_language(&id, Language::Markdown));
        let doc = session.document(&id).unwrap();
        assert_eq!(doc.name, "notes.txt");
        assert_eq!(doc.language, Language::Markdown);
        assert_eq!(doc.content, "hello");
    }

    #[test]
    fn test_events_are_published() {
        let mut session = EditorSession::new();
        let mut events = session.subscribe();

        let id = session.open_path("a.py", "");
        session.update_content(&id, "x = 1");

        assert!(matches!(
            events.try_recv().unwrap(),
            SessionEvent::Opened { .. }
        ));
        assert!(matches!(
            events.try_recv().unwrap(),
            SessionEvent::Activated { id: Some(_) }
        ));
        assert!(matches!(
            events.try_recv().unwrap(),
            SessionEvent::ContentChanged { dirty: true, .. }
        ));
    }
}
