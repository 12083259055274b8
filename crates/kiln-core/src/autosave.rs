//! Debounced autosave scheduling.
//!
//! One single-shot timer per document, re-armed on every qualifying
//! edit. This is not a polling loop: each arm spawns a task that sleeps
//! for the quiet period and then reports the document id on the fire
//! channel; any further edit aborts and replaces the task.

use crate::document::DocumentId;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Default quiet period after the last edit before a save fires.
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_secs(2);

/// Per-document debounce timers for autosave.
///
/// State machine per document: `Idle -> PendingSave` on an edit while
/// enabled, back to `Idle` when the timer fires, the document is saved
/// or closed, or autosave is disabled. At most one pending timer per
/// document exists at a time.
///
/// The scheduler only decides *when* to save; the owner drains the
/// receiver returned by [`AutosaveScheduler::new`] and performs the
/// actual write, so a debounced save goes through the same path as a
/// manual one.
pub struct AutosaveScheduler {
    enabled: bool,
    quiet_period: Duration,
    pending: HashMap<DocumentId, JoinHandle<()>>,
    fire_tx: mpsc::UnboundedSender<DocumentId>,
}

impl AutosaveScheduler {
    /// Creates a scheduler and the channel on which due saves fire.
    pub fn new(
        quiet_period: Duration,
        enabled: bool,
    ) -> (Self, mpsc::UnboundedReceiver<DocumentId>) {
        let (fire_tx, fire_rx) = mpsc::unbounded_channel();
        (
            Self {
                enabled,
                quiet_period,
                pending: HashMap::new(),
                fire_tx,
            },
            fire_rx,
        )
    }

    /// Registers an edit, restarting the document's quiet-period timer.
    ///
    /// Ignored while autosave is disabled.
    pub fn note_edit(&mut self, id: &DocumentId) {
        if !self.enabled {
            return;
        }

        if let Some(handle) = self.pending.remove(id) {
            handle.abort();
        }

        let tx = self.fire_tx.clone();
        let fire_id = id.clone();
        let quiet_period = self.quiet_period;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(quiet_period).await;
            tracing::debug!(id = %fire_id, "autosave quiet period elapsed");
            // Receiver gone means the workspace is shutting down.
            let _ = tx.send(fire_id);
        });
        self.pending.insert(id.clone(), handle);
    }

    /// Cancels the pending timer for a document, if any.
    ///
    /// Called on manual save and on close.
    pub fn cancel(&mut self, id: &DocumentId) {
        if let Some(handle) = self.pending.remove(id) {
            handle.abort();
        }
    }

    /// Cancels every pending timer.
    pub fn cancel_all(&mut self) {
        for (_, handle) in self.pending.drain() {
            handle.abort();
        }
    }

    /// Enables or disables autosave. Disabling cancels all pending timers.
    pub fn set_enabled(&mut self, enabled: bool) {
        if !enabled {
            self.cancel_all();
        }
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Whether a timer is currently armed for the document.
    pub fn is_pending(&self, id: &DocumentId) -> bool {
        self.pending.get(id).is_some_and(|h| !h.is_finished())
    }
}

impl Drop for AutosaveScheduler {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::timeout;

    const QUIET: Duration = Duration::from_millis(20);
    const WAIT: Duration = Duration::from_millis(200);

    #[tokio::test]
    async fn test_fires_once_after_quiet_period() {
        let (mut scheduler, mut fired) = AutosaveScheduler::new(QUIET, true);
        let id = DocumentId::from_path("a.py");

        scheduler.note_edit(&id);
        assert!(scheduler.is_pending(&id));

        let fired_id = timeout(WAIT, fired.recv()).await.unwrap().unwrap();
        assert_eq!(fired_id, id);
        assert!(
            timeout(QUIET * 3, fired.recv()).await.is_err(),
            "a single edit fires exactly once"
        );
    }

    #[tokio::test]
    async fn test_edits_restart_the_timer() {
        let (mut scheduler, mut fired) = AutosaveScheduler::new(QUIET, true);
        let id = DocumentId::from_path("a.py");

        for _ in 0..3 {
            scheduler.note_edit(&id);
            tokio::time::sleep(QUIET / 2).await;
        }

        let fired_id = timeout(WAIT, fired.recv()).await.unwrap().unwrap();
        assert_eq!(fired_id, id);
        assert!(
            timeout(QUIET * 3, fired.recv()).await.is_err(),
            "re-armed edits coalesce into one fire"
        );
    }

    #[tokio::test]
    async fn test_cancel_prevents_fire() {
        let (mut scheduler, mut fired) = AutosaveScheduler::new(QUIET, true);
        let id = DocumentId::from_path("a.py");

        scheduler.note_edit(&id);
        scheduler.cancel(&id);
        assert!(!scheduler.is_pending(&id));
        assert!(timeout(WAIT, fired.recv()).await.is_err());
    }

    #[tokio::test]
    async fn test_disabled_scheduler_ignores_edits() {
        let (mut scheduler, mut fired) = AutosaveScheduler::new(QUIET, false);
        let id = DocumentId::from_path("a.py");

        scheduler.note_edit(&id);
        assert!(!scheduler.is_pending(&id));
        assert!(timeout(WAIT, fired.recv()).await.is_err());
    }

    #[tokio::test]
    async fn test_disabling_cancels_pending_timers() {
        let (mut scheduler, mut fired) = AutosaveScheduler::new(QUIET, true);
        let a = DocumentId::from_path("a.py");
        let b = DocumentId::from_path("b.py");

        scheduler.note_edit(&a);
        scheduler.note_edit(&b);
        scheduler.set_enabled(false);

        assert!(timeout(WAIT, fired.recv()).await.is_err());
    }

    #[tokio::test]
    async fn test_documents_debounce_independently() {
        let (mut scheduler, mut fired) = AutosaveScheduler::new(QUIET, true);
        let a = DocumentId::from_path("a.py");
        let b = DocumentId::from_path("b.py");

        scheduler.note_edit(&a);
        scheduler.note_edit(&b);

        let first = timeout(WAIT, fired.recv()).await.unwrap().unwrap();
        let second = timeout(WAIT, fired.recv()).await.unwrap().unwrap();
        let mut got = [first, second];
        got.sort_by(|x, y| x.as_str().cmp(y.as_str()));
        assert_eq!(got, [a, b]);
    }
}
