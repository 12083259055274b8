/// Navigable command history with the classic shell recall contract.
///
/// Recall steps backward from the most recent submission toward the
/// oldest, never wrapping; stepping forward past the newest clears the
/// input line. Submitting a command appends it and resets the cursor.
#[derive(Debug, Default)]
pub struct CommandHistory {
    entries: Vec<String>,
    /// Recall offset from the most recent entry; `None` when not
    /// navigating.
    cursor: Option<usize>,
}

impl CommandHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a submitted command and resets recall navigation.
    pub fn push(&mut self, command: impl Into<String>) {
        self.entries.push(command.into());
        self.cursor = None;
    }

    /// Steps backward through history toward the oldest command.
    ///
    /// Returns the recalled command, or `None` on empty history. At the
    /// oldest reachable entry further steps keep yielding that entry.
    pub fn recall_previous(&mut self) -> Option<&str> {
        if self.entries.is_empty() {
            return None;
        }
        let offset = match self.cursor {
            None => 0,
            Some(current) if current + 1 < self.entries.len() => current + 1,
            Some(current) => current,
        };
        self.cursor = Some(offset);
        Some(&self.entries[self.entries.len() - 1 - offset])
    }

    /// Steps forward toward the most recent command.
    ///
    /// Returns `None` when stepping past the newest entry (the caller
    /// clears the input line) or when not navigating at all.
    pub fn recall_next(&mut self) -> Option<&str> {
        match self.cursor {
            None => None,
            Some(0) => {
                self.cursor = None;
                None
            }
            Some(current) => {
                let offset = current - 1;
                self.cursor = Some(offset);
                Some(&self.entries[self.entries.len() - 1 - offset])
            }
        }
    }

    /// Submitted commands, oldest first.
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_history_recall_is_noop() {
        let mut history = CommandHistory::new();
        assert_eq!(history.recall_previous(), None);
        assert_eq!(history.recall_next(), None);
    }

    #[test]
    fn test_recall_walks_backward_without_wraparound() {
        let mut history = CommandHistory::new();
        history.push("first");
        history.push("second");
        history.push("third");

        assert_eq!(history.recall_previous(), Some("third"));
        assert_eq!(history.recall_previous(), Some("second"));
        assert_eq!(history.recall_previous(), Some("first"));
        // The oldest entry is a floor, not a wrap point.
        assert_eq!(history.recall_previous(), Some("first"));
    }

    #[test]
    fn test_recall_next_steps_forward_and_clears() {
        let mut history = CommandHistory::new();
        history.push("first");
        history.push("second");

        assert_eq!(history.recall_previous(), Some("second"));
        assert_eq!(history.recall_previous(), Some("first"));
        assert_eq!(history.recall_next(), Some("second"));
        assert_eq!(history.recall_next(), None, "past the newest clears the input");
        assert_eq!(history.recall_next(), None);
    }

    #[test]
    fn test_push_resets_navigation() {
        let mut history = CommandHistory::new();
        history.push("first");
        assert_eq!(history.recall_previous(), Some("first"));

        history.push("second");
        assert_eq!(history.recall_previous(), Some("second"));
    }
}
