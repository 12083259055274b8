//! Chat session state.
//!
//! An append-only message log keyed by role, plus an opaque session
//! identifier that is generated once and stays stable for the
//! interface's lifetime. Exactly one request may be outstanding;
//! failures become typed error messages in the log, never raw
//! transport errors.

use crate::error::{KilnError, Result};
use crate::remote::{ChatRequest, InferenceService};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Default deadline for one chat round trip.
pub const DEFAULT_CHAT_TIMEOUT: Duration = Duration::from_secs(120);

/// Model preselected for new chat threads.
pub const DEFAULT_MODEL: &str = "phi3.5:3.8b";

/// Models the backend is known to serve.
pub const AVAILABLE_MODELS: &[&str] = &[
    "phi3.5:3.8b",
    "deepseek-coder:6.7b",
    "qwen2.5-coder:7b",
    "qwen2.5-coder:1.5b",
    "llama3:latest",
    "mistral:latest",
];

/// System prompt context sent alongside every chat request.
pub const DEFAULT_SYSTEM_CONTEXT: &str =
    "You are helping with coding tasks. Be helpful and provide code examples when appropriate.";

/// Role of a chat log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
    Error,
}

/// One entry of the chat log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    fn new(role: ChatRole, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

/// A chat conversation with the remote inference collaborator.
pub struct ChatThread {
    session_id: String,
    messages: Vec<ChatMessage>,
    model: String,
    answer_language: String,
    system_context: String,
    timeout: Duration,
    busy: bool,
    inference: Arc<dyn InferenceService>,
}

impl ChatThread {
    pub fn new(inference: Arc<dyn InferenceService>) -> Self {
        Self {
            session_id: format!("chat-{}", Uuid::new_v4()),
            messages: Vec::new(),
            model: DEFAULT_MODEL.to_string(),
            answer_language: "english".to_string(),
            system_context: DEFAULT_SYSTEM_CONTEXT.to_string(),
            timeout: DEFAULT_CHAT_TIMEOUT,
            busy: false,
            inference,
        }
    }

    /// Overrides the chat deadline after construction.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Overrides the answer language after construction.
    pub fn with_answer_language(mut self, language: impl Into<String>) -> Self {
        self.answer_language = language.into();
        self
    }

    /// Sends one user message and waits for the assistant's reply.
    ///
    /// Appends the user message, issues exactly one collaborator call
    /// bounded by the configured deadline, then appends either the
    /// assistant's reply or a single error-role message whose text
    /// distinguishes timeout from service-down from generic failure.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for blank input and `Busy` while a prior
    /// request is outstanding; both leave the log untouched.
    /// Collaborator failures are absorbed into the log, not returned.
    pub async fn send(&mut self, text: &str) -> Result<()> {
        let text = text.trim();
        if text.is_empty() {
            return Err(KilnError::invalid_argument("empty chat message"));
        }
        if self.busy {
            return Err(KilnError::busy("a chat request is already outstanding"));
        }

        self.messages.push(ChatMessage::new(ChatRole::User, text));
        self.busy = true;

        let request = ChatRequest {
            message: text.to_string(),
            model: self.model.clone(),
            language: self.answer_language.clone(),
            context: self.system_context.clone(),
            session_id: self.session_id.clone(),
        };

        let reply = match tokio::time::timeout(self.timeout, self.inference.chat(&request)).await {
            Err(_) => Err(KilnError::timeout(self.timeout.as_secs())),
            Ok(result) => result,
        };
        self.busy = false;

        match reply {
            Ok(text) => self.messages.push(ChatMessage::new(ChatRole::Assistant, text)),
            Err(err) => {
                tracing::warn!(session_id = %self.session_id, error = %err, "chat request failed");
                self.messages
                    .push(ChatMessage::new(ChatRole::Error, Self::describe_failure(&err)));
            }
        }
        Ok(())
    }

    /// Human-readable text for a failed chat round trip.
    fn describe_failure(err: &KilnError) -> String {
        let mut text = String::from("Sorry, I encountered an error. ");
        match err {
            KilnError::Timeout { .. } => {
                text.push_str("The request timed out. The AI model might be busy or not responding.");
            }
            KilnError::ServiceUnavailable(_) => {
                text.push_str(
                    "The AI service is temporarily unavailable. Please check that the model backend is running.",
                );
            }
            other => {
                text.push_str(&format!("Error: {other}"));
            }
        }
        text
    }

    /// Empties the log; the session id survives.
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Selects the model used for subsequent requests.
    ///
    /// Returns `false` (and keeps the current model) for names the
    /// backend does not serve.
    pub fn set_model(&mut self, model: &str) -> bool {
        if AVAILABLE_MODELS.contains(&model) {
            self.model = model.to_string();
            true
        } else {
            false
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }
}
