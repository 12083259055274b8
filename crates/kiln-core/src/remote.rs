//! Collaborator interfaces consumed by the engine.
//!
//! The engine never talks to a filesystem, inference service, or
//! execution sandbox directly: it goes through these transport-agnostic
//! traits. `kiln-remote` provides HTTP implementations; tests provide
//! in-memory mocks.

use crate::error::Result;
use crate::language::Language;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirEntry {
    pub name: String,
    pub path: String,
    pub is_directory: bool,
    /// Whether the backend considers the file editable text.
    #[serde(default)]
    pub is_text_file: bool,
    /// Lowercased extension including the dot, when present.
    #[serde(default)]
    pub extension: Option<String>,
    /// Size in bytes; zero for directories.
    #[serde(default)]
    pub size: u64,
    /// Modification time as a unix timestamp, when known.
    #[serde(default)]
    pub modified: Option<f64>,
}

/// File read/write/listing collaborator.
///
/// No retry policy is built in: a failed write must surface to the
/// caller (and must not clear a document's dirty flag).
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Reads a file as UTF-8 text.
    ///
    /// # Errors
    ///
    /// `NotFound`, `PermissionDenied`, or `Io`.
    async fn read_file(&self, path: &str) -> Result<String>;

    /// Writes the full content of a file.
    ///
    /// # Errors
    ///
    /// `NotFound`, `PermissionDenied`, or `Io`.
    async fn write_file(&self, path: &str, content: &str) -> Result<()>;

    /// Lists the entries of a directory.
    async fn list_directory(&self, path: &str) -> Result<Vec<DirEntry>>;

    /// Creates a directory (and missing parents).
    async fn create_directory(&self, path: &str) -> Result<()>;

    /// Deletes a single file.
    async fn delete_file(&self, path: &str) -> Result<()>;
}

/// The kind of analysis report to request for a document.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AnalysisKind {
    Explain,
    Debug,
    Optimize,
    Review,
}

/// Payload of a chat request to the inference collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The user's message text.
    pub message: String,
    /// Model identifier the backend should answer with.
    pub model: String,
    /// Answer language (natural language, not a code tag).
    pub language: String,
    /// System prompt context prepended by the backend.
    pub context: String,
    /// Opaque conversation identity, stable per chat thread.
    pub session_id: String,
}

/// Remote inference collaborator: chat, completion, and analysis.
#[async_trait]
pub trait InferenceService: Send + Sync {
    /// Sends one chat message and returns the assistant's reply text.
    ///
    /// # Errors
    ///
    /// `Timeout`, `ServiceUnavailable`, or `Io`.
    async fn chat(&self, request: &ChatRequest) -> Result<String>;

    /// Requests an insertion suggestion for the text up to the cursor.
    async fn complete(&self, code: &str, cursor_offset: usize, language: Language)
    -> Result<String>;

    /// Requests a free-form analysis report for a whole document.
    async fn analyze(&self, code: &str, language: Language, kind: AnalysisKind) -> Result<String>;
}

/// Result of running a file through the remote execution sandbox.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    pub success: bool,
    #[serde(default)]
    pub stdout: String,
    #[serde(default)]
    pub stderr: String,
    #[serde(default)]
    pub exit_code: Option<i32>,
    /// Wall-clock seconds the sandbox reports for the run.
    #[serde(default)]
    pub elapsed_seconds: Option<f64>,
    /// Sandbox-reported failure message when `success` is false.
    #[serde(default)]
    pub error: Option<String>,
}

/// Remote execution collaborator.
#[async_trait]
pub trait ExecutionService: Send + Sync {
    /// Runs `filename` with the named executor inside `working_dir`.
    ///
    /// A reported non-zero exit is a successful call with
    /// `success: false`; an `Err` means the call itself could not
    /// complete.
    async fn execute(
        &self,
        executor: &str,
        filename: &str,
        working_dir: &str,
    ) -> Result<ExecutionOutcome>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analysis_kind_wire_names() {
        assert_eq!(AnalysisKind::Explain.to_string(), "explain");
        assert_eq!(AnalysisKind::Debug.to_string(), "debug");
        assert_eq!(
            serde_json::to_string(&AnalysisKind::Optimize).unwrap(),
            "\"optimize\""
        );
        assert_eq!(
            serde_json::from_str::<AnalysisKind>("\"review\"").unwrap(),
            AnalysisKind::Review
        );
    }

    #[test]
    fn test_dir_entry_tolerates_missing_optional_fields() {
        let entry: DirEntry = serde_json::from_str(
            r#"{"name": "src", "path": "/proj/src", "is_directory": true}"#,
        )
        .unwrap();
        assert!(entry.is_directory);
        assert_eq!(entry.size, 0);
        assert!(entry.extension.is_none());
    }
}
