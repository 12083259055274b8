//! Completion and analysis orchestration.
//!
//! Both request kinds are cancellable and bounded by a deadline, and
//! both are tracked per document so results can never be applied out of
//! order:
//!
//! - a new completion request for a document supersedes the prior
//!   unfinished one: the superseded transport task is aborted locally
//!   (the collaborator is not asked to stop work) and its result is
//!   discarded even if it slips past the abort;
//! - at most one analysis is in flight per document; a second request
//!   is rejected with `Busy` rather than queued.

use crate::document::DocumentId;
use crate::error::{KilnError, Result};
use crate::language::Language;
use crate::remote::{AnalysisKind, InferenceService};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::AbortHandle;

/// Default deadline for one completion request.
pub const DEFAULT_COMPLETION_TIMEOUT: Duration = Duration::from_secs(45);
/// Default deadline for one analysis request.
pub const DEFAULT_ANALYSIS_TIMEOUT: Duration = Duration::from_secs(90);

#[derive(Default)]
struct CompletionSlot {
    /// Monotonic request counter; only the newest generation may
    /// surface its result.
    generation: u64,
    in_flight: Option<AbortHandle>,
}

/// Issues bounded, cancellable requests to the inference collaborator.
pub struct AssistOrchestrator {
    inference: Arc<dyn InferenceService>,
    completion_timeout: Duration,
    analysis_timeout: Duration,
    completions: Mutex<HashMap<DocumentId, CompletionSlot>>,
    analyses: Mutex<HashSet<DocumentId>>,
}

impl AssistOrchestrator {
    pub fn new(inference: Arc<dyn InferenceService>) -> Self {
        Self::with_timeouts(
            inference,
            DEFAULT_COMPLETION_TIMEOUT,
            DEFAULT_ANALYSIS_TIMEOUT,
        )
    }

    pub fn with_timeouts(
        inference: Arc<dyn InferenceService>,
        completion_timeout: Duration,
        analysis_timeout: Duration,
    ) -> Self {
        Self {
            inference,
            completion_timeout,
            analysis_timeout,
            completions: Mutex::new(HashMap::new()),
            analyses: Mutex::new(HashSet::new()),
        }
    }

    /// Requests an insertion suggestion for the text up to the cursor.
    ///
    /// Returns `Ok(None)` when the request was superseded by a newer
    /// one for the same document; the stale result is never surfaced.
    pub async fn complete(
        &self,
        id: &DocumentId,
        text_to_cursor: String,
        cursor_offset: usize,
        language: Language,
    ) -> Result<Option<String>> {
        let (generation, task) = {
            let mut slots = self.completions.lock().expect("completion slots poisoned");
            let slot = slots.entry(id.clone()).or_default();
            if let Some(prev) = slot.in_flight.take() {
                tracing::debug!(id = %id, "superseding in-flight completion");
                prev.abort();
            }
            slot.generation += 1;

            let inference = Arc::clone(&self.inference);
            let task = tokio::spawn(async move {
                inference
                    .complete(&text_to_cursor, cursor_offset, language)
                    .await
            });
            slot.in_flight = Some(task.abort_handle());
            (slot.generation, task)
        };

        let outcome = match tokio::time::timeout(self.completion_timeout, task).await {
            Err(_) => {
                self.abandon_completion(id, generation);
                return Err(KilnError::timeout(self.completion_timeout.as_secs()));
            }
            Ok(Err(join_err)) if join_err.is_cancelled() => return Ok(None),
            Ok(Err(join_err)) => Err(KilnError::internal(format!(
                "completion task failed: {join_err}"
            ))),
            Ok(Ok(result)) => result.map(Some),
        };

        // Stale-result suppression: a newer request may have been
        // issued while we awaited; only the current generation hands
        // its result back.
        let mut slots = self.completions.lock().expect("completion slots poisoned");
        match slots.get_mut(id) {
            Some(slot) if slot.generation == generation => {
                slot.in_flight = None;
                outcome
            }
            _ => Ok(None),
        }
    }

    /// Requests an analysis report for a whole document.
    ///
    /// # Errors
    ///
    /// `Busy` when an analysis for this document is already in flight;
    /// `Timeout` when the collaborator misses the deadline.
    pub async fn analyze(
        &self,
        id: &DocumentId,
        code: String,
        language: Language,
        kind: AnalysisKind,
    ) -> Result<String> {
        {
            let mut in_flight = self.analyses.lock().expect("analysis set poisoned");
            if !in_flight.insert(id.clone()) {
                return Err(KilnError::busy(format!(
                    "analysis already in flight for {id}"
                )));
            }
        }

        let result = match tokio::time::timeout(
            self.analysis_timeout,
            self.inference.analyze(&code, language, kind),
        )
        .await
        {
            Err(_) => Err(KilnError::timeout(self.analysis_timeout.as_secs())),
            Ok(result) => result,
        };

        self.analyses
            .lock()
            .expect("analysis set poisoned")
            .remove(id);
        if let Err(err) = &result {
            tracing::warn!(id = %id, kind = %kind, error = %err, "analysis request failed");
        }
        result
    }

    /// Aborts any in-flight completion for a document.
    ///
    /// Called when the document closes; the pending caller observes a
    /// discarded (`Ok(None)`) outcome.
    pub fn cancel_completion(&self, id: &DocumentId) {
        let mut slots = self.completions.lock().expect("completion slots poisoned");
        if let Some(slot) = slots.get_mut(id) {
            if let Some(handle) = slot.in_flight.take() {
                handle.abort();
            }
            slot.generation += 1;
        }
    }

    /// Whether an analysis for the document is currently in flight.
    pub fn analysis_in_flight(&self, id: &DocumentId) -> bool {
        self.analyses
            .lock()
            .expect("analysis set poisoned")
            .contains(id)
    }

    fn abandon_completion(&self, id: &DocumentId, generation: u64) {
        let mut slots = self.completions.lock().expect("completion slots poisoned");
        if let Some(slot) = slots.get_mut(id) {
            if slot.generation == generation {
                if let Some(handle) = slot.in_flight.take() {
                    handle.abort();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::ChatRequest;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Inference mock whose first completion call stalls and whose
    /// later calls answer immediately.
    struct StaggeredInference {
        calls: AtomicUsize,
        first_delay: Duration,
    }

    impl StaggeredInference {
        fn new(first_delay: Duration) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                first_delay,
            }
        }
    }

    #[async_trait]
    impl InferenceService for StaggeredInference {
        async fn chat(&self, _request: &ChatRequest) -> Result<String> {
            Ok("reply".to_string())
        }

        async fn complete(
            &self,
            _code: &str,
            _cursor_offset: usize,
            _language: Language,
        ) -> Result<String> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call == 0 {
                tokio::time::sleep(self.first_delay).await;
                Ok("first".to_string())
            } else {
                Ok("second".to_string())
            }
        }

        async fn analyze(
            &self,
            _code: &str,
            _language: Language,
            _kind: AnalysisKind,
        ) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.first_delay).await;
            Ok("report".to_string())
        }
    }

    fn orchestrator(first_delay: Duration) -> Arc<AssistOrchestrator> {
        Arc::new(AssistOrchestrator::with_timeouts(
            Arc::new(StaggeredInference::new(first_delay)),
            Duration::from_millis(500),
            Duration::from_millis(500),
        ))
    }

    #[tokio::test]
    async fn test_newer_completion_supersedes_older() {
        let orch = orchestrator(Duration::from_millis(200));
        let id = DocumentId::from_path("a.py");

        let first = {
            let orch = Arc::clone(&orch);
            let id = id.clone();
            tokio::spawn(async move {
                orch.complete(&id, "def ".into(), 4, Language::Python).await
            })
        };
        // Let the first request get in flight before superseding it.
        tokio::time::sleep(Duration::from_millis(20)).await;

        let second = orch
            .complete(&id, "def main".into(), 8, Language::Python)
            .await
            .unwrap();
        assert_eq!(second.as_deref(), Some("second"));

        let first = first.await.unwrap().unwrap();
        assert_eq!(first, None, "superseded request must never surface a result");
    }

    #[tokio::test]
    async fn test_completion_timeout_surfaces_typed_error() {
        let orch = Arc::new(AssistOrchestrator::with_timeouts(
            Arc::new(StaggeredInference::new(Duration::from_millis(300))),
            Duration::from_millis(30),
            Duration::from_millis(30),
        ));
        let id = DocumentId::from_path("a.py");

        let err = orch
            .complete(&id, "x".into(), 1, Language::Python)
            .await
            .unwrap_err();
        assert!(err.is_timeout());
    }

    #[tokio::test]
    async fn test_completions_for_different_documents_are_independent() {
        let orch = orchestrator(Duration::from_millis(100));
        let a = DocumentId::from_path("a.py");
        let b = DocumentId::from_path("b.py");

        let slow = {
            let orch = Arc::clone(&orch);
            let a = a.clone();
            tokio::spawn(
                async move { orch.complete(&a, "x".into(), 1, Language::Python).await },
            )
        };
        tokio::time::sleep(Duration::from_millis(10)).await;

        let fast = orch
            .complete(&b, "y".into(), 1, Language::Python)
            .await
            .unwrap();
        assert_eq!(fast.as_deref(), Some("second"));

        let slow = slow.await.unwrap().unwrap();
        assert_eq!(slow.as_deref(), Some("first"), "no cross-document cancellation");
    }

    #[tokio::test]
    async fn test_second_analysis_rejected_while_busy() {
        let orch = orchestrator(Duration::from_millis(100));
        let id = DocumentId::from_path("a.py");

        let first = {
            let orch = Arc::clone(&orch);
            let id = id.clone();
            tokio::spawn(async move {
                orch.analyze(&id, "code".into(), Language::Python, AnalysisKind::Explain)
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(orch.analysis_in_flight(&id));

        let second = orch
            .analyze(&id, "code".into(), Language::Python, AnalysisKind::Debug)
            .await;
        assert!(second.unwrap_err().is_busy());

        assert_eq!(first.await.unwrap().unwrap(), "report");
        assert!(!orch.analysis_in_flight(&id), "slot frees after completion");
    }

    #[tokio::test]
    async fn test_analysis_timeout_frees_the_slot() {
        let orch = Arc::new(AssistOrchestrator::with_timeouts(
            Arc::new(StaggeredInference::new(Duration::from_millis(300))),
            Duration::from_millis(30),
            Duration::from_millis(30),
        ));
        let id = DocumentId::from_path("a.py");

        let err = orch
            .analyze(&id, "code".into(), Language::Python, AnalysisKind::Review)
            .await
            .unwrap_err();
        assert!(err.is_timeout());
        assert!(!orch.analysis_in_flight(&id));
    }
}
