//! Document domain model.
//!
//! A document is one open, editable unit of text: identity, optional
//! backing path, current content, and dirty state relative to the last
//! persisted snapshot.

use crate::language::Language;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Prefix carried by never-saved documents until they are renamed.
pub const UNTITLED_PREFIX: &str = "untitled";

/// Stable identity of an open document.
///
/// The filesystem path for saved files, a generated ephemeral token
/// for unsaved ones. The id never changes after creation, even when an
/// untitled document is renamed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(String);

impl DocumentId {
    /// Identity for a document backed by a filesystem path.
    pub fn from_path(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// Fresh identity for a never-saved document.
    pub fn ephemeral() -> Self {
        Self(format!("{}-{}", UNTITLED_PREFIX, Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// An open, editable unit of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Stable identity within the open set.
    pub id: DocumentId,
    /// Backing path; `None` for never-saved documents.
    pub path: Option<String>,
    /// Display name, derived from the path or defaulted.
    pub name: String,
    /// Full current text buffer.
    pub content: String,
    /// Last persisted value, used to compute `dirty`.
    saved_content: String,
    /// Semantic language tag.
    pub language: Language,
    /// True iff `content` differs from the last persisted value.
    pub dirty: bool,
}

impl Document {
    /// Opens a document backed by a filesystem path with freshly read content.
    pub fn from_path(path: impl Into<String>, content: impl Into<String>) -> Self {
        let path = path.into();
        let content = content.into();
        let name = path
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(path.as_str())
            .to_string();
        let language = Language::classify(&name);
        Self {
            id: DocumentId::from_path(&path),
            path: Some(path),
            name,
            saved_content: content.clone(),
            content,
            language,
            dirty: false,
        }
    }

    /// Creates a never-saved document populated with the language template.
    pub fn untitled(language: Language) -> Self {
        let content = language.template();
        Self {
            id: DocumentId::ephemeral(),
            path: None,
            name: format!("{}.{}", UNTITLED_PREFIX, language.preferred_extension()),
            saved_content: content.clone(),
            content,
            language,
            dirty: false,
        }
    }

    /// Replaces the buffer and recomputes the dirty flag.
    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
        self.dirty = self.content != self.saved_content;
    }

    /// Snapshots the buffer as the persisted value and clears dirty.
    pub fn mark_saved(&mut self) {
        self.saved_content = self.content.clone();
        self.dirty = false;
    }

    /// Whether this document still carries the default untitled name
    /// and has never been saved.
    pub fn is_untitled(&self) -> bool {
        self.path.is_none() && self.name.starts_with(UNTITLED_PREFIX)
    }

    /// Whether the buffer is still exactly the given language's template.
    ///
    /// Used by rename/override to decide if content may be swapped for a
    /// new template without overwriting user-authored text.
    pub fn is_pristine_template(&self, language: Language) -> bool {
        self.content == language.template()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_path_derives_name_and_language() {
        let doc = Document::from_path("/proj/src/main.py", "print(1)");
        assert_eq!(doc.id.as_str(), "/proj/src/main.py");
        assert_eq!(doc.name, "main.py");
        assert_eq!(doc.language, Language::Python);
        assert!(!doc.dirty);
    }

    #[test]
    fn test_untitled_starts_clean_with_template() {
        let doc = Document::untitled(Language::JavaScript);
        assert!(doc.is_untitled());
        assert_eq!(doc.name, "untitled.js");
        assert!(doc.is_pristine_template(Language::JavaScript));
        assert!(!doc.dirty);
        assert!(doc.id.as_str().starts_with(UNTITLED_PREFIX));
    }

    #[test]
    fn test_dirty_tracks_saved_snapshot() {
        let mut doc = Document::from_path("a.txt", "one");
        doc.set_content("two");
        assert!(doc.dirty);
        doc.set_content("one");
        assert!(!doc.dirty, "content equal to last saved value is clean");
        doc.set_content("three");
        doc.mark_saved();
        assert!(!doc.dirty);
        doc.set_content("one");
        assert!(doc.dirty, "dirty compares against the new snapshot");
    }

    #[test]
    fn test_ephemeral_ids_are_unique() {
        assert_ne!(DocumentId::ephemeral(), DocumentId::ephemeral());
    }
}
