//! The Kiln workspace context.
//!
//! One explicitly constructed object owns every engine and collaborator
//! handle; there are no ambient globals. Outer layers (CLI, menu,
//! shell) call into the entry points here and subscribe to session
//! events for whatever they need to redraw.

use kiln_core::assist::AssistOrchestrator;
use kiln_core::autosave::AutosaveScheduler;
use kiln_core::chat::{ChatMessage, ChatThread};
use kiln_core::config::WorkspaceConfig;
use kiln_core::document::DocumentId;
use kiln_core::error::{KilnError, Result};
use kiln_core::language::Language;
use kiln_core::remote::{AnalysisKind, ExecutionService, FileStore, InferenceService};
use kiln_core::session::{CloseConfirmation, EditorSession, SessionEvent};
use kiln_core::terminal::{OutputEntry, RunTarget, TerminalEngine};
use kiln_remote::{HttpExecutionService, HttpFileStore, HttpInferenceService};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock, broadcast};

/// The workspace context: session, terminal, chat, autosave, assist,
/// and the collaborator handles, behind one owner.
///
/// Session invariants span multiple fields, so the session is mutated
/// only while holding its write lock; all entry points here take care
/// of that serialization.
pub struct Workspace {
    session: RwLock<EditorSession>,
    terminal: Mutex<TerminalEngine>,
    chat: Mutex<ChatThread>,
    assist: AssistOrchestrator,
    autosave: Mutex<AutosaveScheduler>,
    files: Arc<dyn FileStore>,
    config: WorkspaceConfig,
}

impl Workspace {
    /// Builds a workspace over explicit collaborator handles.
    ///
    /// Must be called within a tokio runtime: the autosave drain task
    /// is spawned here. The task holds only a weak handle, so dropping
    /// the returned `Arc` shuts it down.
    pub fn new(
        files: Arc<dyn FileStore>,
        inference: Arc<dyn InferenceService>,
        executor: Arc<dyn ExecutionService>,
        config: WorkspaceConfig,
    ) -> Arc<Self> {
        let (autosave, mut fires) =
            AutosaveScheduler::new(config.quiet_period(), config.autosave.enabled);

        let mut chat = ChatThread::new(Arc::clone(&inference))
            .with_timeout(config.chat_timeout())
            .with_answer_language(config.chat.answer_language.clone());
        chat.set_model(&config.chat.model);

        let assist = AssistOrchestrator::with_timeouts(
            inference,
            config.completion_timeout(),
            config.analysis_timeout(),
        );
        let terminal = TerminalEngine::new(Arc::clone(&files), executor, ".");

        let workspace = Arc::new(Self {
            session: RwLock::new(EditorSession::new()),
            terminal: Mutex::new(terminal),
            chat: Mutex::new(chat),
            assist,
            autosave: Mutex::new(autosave),
            files,
            config,
        });

        let weak = Arc::downgrade(&workspace);
        tokio::spawn(async move {
            while let Some(id) = fires.recv().await {
                let Some(workspace) = weak.upgrade() else {
                    break;
                };
                if let Err(err) = workspace.save_document(&id).await {
                    tracing::warn!(id = %id, error = %err, "autosave failed");
                }
            }
        });

        workspace
    }

    /// Builds a workspace against the configured HTTP backend.
    pub fn bootstrap() -> anyhow::Result<Arc<Self>> {
        let config = WorkspaceConfig::load()?;
        let files = Arc::new(HttpFileStore::from_config(&config));
        let inference = Arc::new(HttpInferenceService::from_config(&config));
        let executor = Arc::new(HttpExecutionService::from_config(&config));
        Ok(Self::new(files, inference, executor, config))
    }

    // ============================================================================
    // Documents
    // ============================================================================

    /// Opens a file from the backend, focusing the existing tab when
    /// the path is already open.
    pub async fn open_file(&self, path: &str) -> Result<DocumentId> {
        let content = self.files.read_file(path).await?;
        let mut session = self.session.write().await;
        Ok(session.open_path(path, content))
    }

    /// Creates a fresh untitled document.
    pub async fn new_file(&self, language: Language) -> DocumentId {
        self.session.write().await.open_untitled(language)
    }

    /// Applies an edit to the active document and arms autosave.
    pub async fn edit_active(&self, content: &str) -> Result<()> {
        let mut session = self.session.write().await;
        let id = session
            .active_id()
            .cloned()
            .ok_or_else(|| KilnError::invalid_argument("no document is open"))?;
        session.update_content(&id, content);
        let dirty = session.document(&id).map(|d| d.dirty).unwrap_or(false);
        drop(session);

        let mut autosave = self.autosave.lock().await;
        if dirty {
            autosave.note_edit(&id);
        } else {
            autosave.cancel(&id);
        }
        Ok(())
    }

    /// Saves the active document through the file collaborator.
    pub async fn save_active(&self) -> Result<()> {
        let id = {
            let session = self.session.read().await;
            session
                .active_id()
                .cloned()
                .ok_or_else(|| KilnError::invalid_argument("no document is open"))?
        };
        self.save_document(&id).await
    }

    /// Saves one document through the file collaborator.
    ///
    /// The session write lock is held across the write so a racing
    /// edit cannot be marked saved by mistake. A failed write leaves
    /// the dirty flag set.
    pub async fn save_document(&self, id: &DocumentId) -> Result<()> {
        let mut session = self.session.write().await;
        let doc = session
            .document(id)
            .ok_or_else(|| KilnError::not_found("document", id.as_str()))?;
        let path = doc
            .path
            .clone()
            .ok_or_else(|| KilnError::invalid_argument("document has never been saved"))?;
        let content = doc.content.clone();

        self.files.write_file(&path, &content).await?;
        session.mark_saved(id);
        drop(session);

        self.autosave.lock().await.cancel(id);
        Ok(())
    }

    /// Closes a document, cancelling its pending autosave and any
    /// in-flight completion. Returns whether the close proceeded.
    pub async fn close_document(&self, id: &DocumentId, confirm: CloseConfirmation) -> bool {
        let closed = self.session.write().await.close(id, confirm);
        if closed {
            self.autosave.lock().await.cancel(id);
            self.assist.cancel_completion(id);
        }
        closed
    }

    /// Enables or disables autosave at runtime.
    pub async fn set_autosave_enabled(&self, enabled: bool) {
        self.autosave.lock().await.set_enabled(enabled);
    }

    /// Deletes a file through the collaborator.
    ///
    /// An open document backed by that path stays open (and dirty
    /// state untouched); re-saving it recreates the file.
    pub async fn delete_file(&self, path: &str) -> Result<()> {
        self.files.delete_file(path).await
    }

    /// Creates a directory through the collaborator.
    pub async fn create_directory(&self, path: &str) -> Result<()> {
        self.files.create_directory(path).await
    }

    // ============================================================================
    // Assist
    // ============================================================================

    /// Requests a completion for the active document at a cursor offset.
    ///
    /// Returns `Ok(None)` when a newer request superseded this one.
    pub async fn request_completion(&self, cursor_offset: usize) -> Result<Option<String>> {
        let (id, text_to_cursor, language) = {
            let session = self.session.read().await;
            let doc = session
                .active_document()
                .ok_or_else(|| KilnError::invalid_argument("no document is open"))?;
            let upto = doc
                .content
                .get(..cursor_offset)
                .unwrap_or(doc.content.as_str());
            (doc.id.clone(), upto.to_string(), doc.language)
        };
        self.assist
            .complete(&id, text_to_cursor, cursor_offset, language)
            .await
    }

    /// Requests an analysis report for the active document.
    pub async fn request_analysis(&self, kind: AnalysisKind) -> Result<String> {
        let (id, code, language) = {
            let session = self.session.read().await;
            let doc = session
                .active_document()
                .ok_or_else(|| KilnError::invalid_argument("no document is open"))?;
            (doc.id.clone(), doc.content.clone(), doc.language)
        };
        self.assist.analyze(&id, code, language, kind).await
    }

    // ============================================================================
    // Terminal
    // ============================================================================

    /// Submits one line to the terminal engine; `run` resolves against
    /// the session's active document.
    pub async fn run_terminal_command(&self, line: &str) -> Result<()> {
        let target = {
            let session = self.session.read().await;
            session.active_document().map(|doc| RunTarget {
                name: doc.name.clone(),
                path: doc.path.clone(),
            })
        };
        let mut terminal = self.terminal.lock().await;
        terminal.execute(line, target.as_ref()).await
    }

    /// Snapshot of the terminal output log.
    pub async fn terminal_output(&self) -> Vec<OutputEntry> {
        self.terminal.lock().await.output().to_vec()
    }

    /// Recalls the previous command for the input line (arrow-up).
    pub async fn terminal_recall_previous(&self) -> Option<String> {
        self.terminal
            .lock()
            .await
            .recall_previous()
            .map(str::to_string)
    }

    /// Recalls the next command (arrow-down); `None` clears the input.
    pub async fn terminal_recall_next(&self) -> Option<String> {
        self.terminal.lock().await.recall_next().map(str::to_string)
    }

    /// Resets the terminal log to a single prompt line.
    pub async fn clear_terminal(&self) {
        self.terminal.lock().await.clear();
    }

    /// Points the terminal at a different working directory.
    ///
    /// The directory is owned by the workspace; the terminal's `cd`
    /// only prints guidance.
    pub async fn set_working_directory(&self, path: &str) {
        self.terminal.lock().await.set_working_dir(path);
    }

    pub async fn working_directory(&self) -> String {
        self.terminal.lock().await.working_dir().to_string()
    }

    // ============================================================================
    // Chat
    // ============================================================================

    /// Sends one chat message; failures land in the log as error-role
    /// messages.
    pub async fn send_chat(&self, text: &str) -> Result<()> {
        self.chat.lock().await.send(text).await
    }

    /// Snapshot of the chat log.
    pub async fn chat_messages(&self) -> Vec<ChatMessage> {
        self.chat.lock().await.messages().to_vec()
    }

    /// Empties the chat log; the session id survives.
    pub async fn clear_chat(&self) {
        self.chat.lock().await.clear();
    }

    /// Selects the chat model; `false` for names the backend does not
    /// serve.
    pub async fn set_chat_model(&self, model: &str) -> bool {
        self.chat.lock().await.set_model(model)
    }

    // ============================================================================
    // Introspection
    // ============================================================================

    /// Subscribes to session change notifications.
    pub async fn subscribe_session(&self) -> broadcast::Receiver<SessionEvent> {
        self.session.read().await.subscribe()
    }

    /// Shared read access to the session for inspection.
    pub fn session(&self) -> &RwLock<EditorSession> {
        &self.session
    }

    pub fn config(&self) -> &WorkspaceConfig {
        &self.config
    }
}
