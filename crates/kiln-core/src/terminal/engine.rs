use super::builtin::builtin_commands;
use super::history::CommandHistory;
use super::output::{EntryKind, OutputEntry, format_size};
use crate::error::{KilnError, Result};
use crate::language::{RUNNABLE_EXTENSIONS, executor_for};
use crate::remote::{ExecutionService, FileStore};
use std::sync::Arc;

/// The document the `run` command targets, resolved by the caller from
/// the session's active document.
#[derive(Debug, Clone)]
pub struct RunTarget {
    /// Display name, used as the filename handed to the executor.
    pub name: String,
    /// Backing path; `run` refuses targets that were never saved.
    pub path: Option<String>,
}

/// Line-oriented pseudo-shell over the file and execution collaborators.
///
/// State machine: `AwaitingInput -> Executing -> AwaitingInput`. The
/// command slot is non-reentrant: input submitted while a command is
/// executing is rejected with `Busy`, never queued (mirroring a
/// disabled input affordance).
///
/// The working directory is supplied by the workspace; the terminal
/// itself never changes it.
pub struct TerminalEngine {
    output: Vec<OutputEntry>,
    history: CommandHistory,
    working_dir: String,
    executing: bool,
    files: Arc<dyn FileStore>,
    executor: Arc<dyn ExecutionService>,
}

impl TerminalEngine {
    pub fn new(
        files: Arc<dyn FileStore>,
        executor: Arc<dyn ExecutionService>,
        working_dir: impl Into<String>,
    ) -> Self {
        let mut engine = Self {
            output: Vec::new(),
            history: CommandHistory::new(),
            working_dir: working_dir.into(),
            executing: false,
            files,
            executor,
        };
        engine.push_banner();
        engine
    }

    fn push_banner(&mut self) {
        self.push(EntryKind::System, "Kiln Terminal v0.1");
        let wd = format!("Working directory: {}", self.working_dir);
        self.push(EntryKind::System, wd);
        self.push(EntryKind::System, "Type \"help\" for available commands");
        self.push(EntryKind::Prompt, "$");
    }

    fn push(&mut self, kind: EntryKind, text: impl Into<String>) {
        self.output.push(OutputEntry::new(kind, text));
    }

    /// Parses and dispatches one submitted line.
    ///
    /// Blank input is ignored. Everything else is recorded in history
    /// (builtins included), echoed as a `Command` entry, dispatched,
    /// and closed with a fresh `Prompt` entry.
    ///
    /// # Errors
    ///
    /// `Busy` when a command is already executing. Dispatch failures
    /// themselves are rendered into the log, not returned.
    pub async fn execute(&mut self, line: &str, active: Option<&RunTarget>) -> Result<()> {
        if self.executing {
            return Err(KilnError::busy("a command is already executing"));
        }
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(());
        }

        self.history.push(trimmed);
        self.push(EntryKind::Command, format!("$ {trimmed}"));
        self.executing = true;

        let mut tokens = trimmed.split_whitespace();
        let command = tokens.next().unwrap_or_default().to_lowercase();
        let args: Vec<&str> = tokens.collect();

        tracing::debug!(command = %command, "terminal dispatch");
        match command.as_str() {
            "help" => self.show_help(),
            "clear" | "cls" => {
                self.output.clear();
                self.push(EntryKind::Prompt, "$");
                self.executing = false;
                return Ok(());
            }
            "ls" | "dir" => self.list_files().await,
            "cd" => self.push(
                EntryKind::Info,
                "To change the workspace directory, use the folder picker in the Explorer panel",
            ),
            "cat" | "type" => self.show_file(args.first().copied(), &command).await,
            "run" => self.run_active(active).await,
            "python" | "node" | "java" | "g++" | "gcc" => {
                self.run_named(&command, args.first().copied(), active).await
            }
            _ => {
                self.push(EntryKind::Error, format!("Command not found: {command}"));
                self.push(EntryKind::Info, "Type \"help\" to see available commands");
            }
        }

        self.executing = false;
        self.push(EntryKind::Prompt, "$");
        Ok(())
    }

    fn show_help(&mut self) {
        self.push(EntryKind::Info, "Available Commands:");
        for cmd in builtin_commands() {
            self.push(
                EntryKind::Info,
                format!("  {:<13} - {}", cmd.usage, cmd.description),
            );
        }
        self.push(EntryKind::Info, "");
        self.push(EntryKind::Info, "Examples:");
        self.push(EntryKind::Info, "  run");
        self.push(EntryKind::Info, "  python hello.py");
        self.push(EntryKind::Info, "  node app.js");
        self.push(EntryKind::Info, "  java HelloWorld.java");
    }

    async fn list_files(&mut self) {
        match self.files.list_directory(&self.working_dir.clone()).await {
            Ok(entries) => {
                if entries.is_empty() {
                    self.push(EntryKind::Info, "No files found");
                    return;
                }
                for entry in entries {
                    let line = if entry.is_directory {
                        format!("<dir>  {}", entry.name)
                    } else {
                        format!("<file> {} ({})", entry.name, format_size(entry.size))
                    };
                    self.push(EntryKind::Info, line);
                }
            }
            Err(err) => self.push(EntryKind::Error, format!("Failed to list files: {err}")),
        }
    }

    async fn show_file(&mut self, filename: Option<&str>, spelling: &str) {
        let Some(filename) = filename else {
            self.push(EntryKind::Error, format!("Usage: {spelling} <filename>"));
            return;
        };
        let path = if self.working_dir == "." {
            filename.to_string()
        } else {
            format!("{}/{}", self.working_dir, filename)
        };
        match self.files.read_file(&path).await {
            Ok(content) => {
                self.push(EntryKind::Info, format!("{filename}:"));
                for (index, line) in content.lines().enumerate() {
                    self.push(EntryKind::Code, format!("{:>3}: {}", index + 1, line));
                }
            }
            Err(err) => self.push(EntryKind::Error, format!("Failed to read file: {err}")),
        }
    }

    /// `run`: resolve the editor's active document and execute it.
    async fn run_active(&mut self, active: Option<&RunTarget>) {
        let Some(target) = active.filter(|t| t.path.is_some()) else {
            self.push(
                EntryKind::Error,
                "No file is currently open in the editor",
            );
            self.push(
                EntryKind::Info,
                "Open a file in the editor first, then use the \"run\" command",
            );
            return;
        };

        let name = target.name.clone();
        match executor_for(&name) {
            Some(executor) => self.run_with_executor(executor, &name).await,
            None => {
                let extension = name.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("");
                self.push(
                    EntryKind::Error,
                    format!("Don't know how to run .{extension} files"),
                );
                self.push(
                    EntryKind::Info,
                    format!("Supported: {RUNNABLE_EXTENSIONS}"),
                );
            }
        }
    }

    /// Explicit executor commands; the filename falls back to the
    /// active document's name.
    async fn run_named(
        &mut self,
        executor: &str,
        filename: Option<&str>,
        active: Option<&RunTarget>,
    ) {
        let filename = filename
            .map(str::to_string)
            .or_else(|| active.map(|t| t.name.clone()));
        let Some(filename) = filename else {
            self.push(EntryKind::Error, format!("Usage: {executor} <filename>"));
            return;
        };
        let executor = executor.to_string();
        self.run_with_executor(&executor, &filename).await;
    }

    /// The shared execution path for `run` and the executor commands.
    async fn run_with_executor(&mut self, executor: &str, filename: &str) {
        self.push(
            EntryKind::Info,
            format!("Executing {filename} with {executor}..."),
        );

        let working_dir = self.working_dir.clone();
        match self.executor.execute(executor, filename, &working_dir).await {
            Ok(outcome) if outcome.success => {
                for line in outcome.stdout.lines().filter(|l| !l.trim().is_empty()) {
                    self.push(EntryKind::Output, line.to_string());
                }
                for line in outcome.stderr.lines().filter(|l| !l.trim().is_empty()) {
                    self.push(EntryKind::Error, line.to_string());
                }
                let elapsed = outcome
                    .elapsed_seconds
                    .map(|s| format!("{s:.2}"))
                    .unwrap_or_else(|| "unknown".to_string());
                self.push(
                    EntryKind::Success,
                    format!(
                        "Execution completed in {elapsed}s (exit code {})",
                        outcome.exit_code.unwrap_or(0)
                    ),
                );
            }
            Ok(outcome) => {
                let reason = outcome
                    .error
                    .unwrap_or_else(|| "Unknown error".to_string());
                self.push(EntryKind::Error, format!("Execution failed: {reason}"));
                for line in outcome.stderr.lines().filter(|l| !l.trim().is_empty()) {
                    self.push(EntryKind::Error, line.to_string());
                }
            }
            Err(err) => {
                tracing::warn!(executor, filename, error = %err, "execution call failed");
                self.push(EntryKind::Error, format!("Execution failed: {err}"));
                self.push(
                    EntryKind::Info,
                    "Make sure the required runtime is installed on the execution host",
                );
            }
        }
    }

    // ============================================================================
    // History navigation and accessors
    // ============================================================================

    /// Recalls the previous command (arrow-up).
    pub fn recall_previous(&mut self) -> Option<&str> {
        self.history.recall_previous()
    }

    /// Recalls the next command (arrow-down); `None` clears the input.
    pub fn recall_next(&mut self) -> Option<&str> {
        self.history.recall_next()
    }

    /// Resets the log to a single prompt line (the clear-button path).
    pub fn clear(&mut self) {
        self.output.clear();
        self.push(EntryKind::Prompt, "$");
    }

    pub fn output(&self) -> &[OutputEntry] {
        &self.output
    }

    pub fn history(&self) -> &[String] {
        self.history.entries()
    }

    pub fn working_dir(&self) -> &str {
        &self.working_dir
    }

    /// Updates the working directory (owned by the workspace).
    pub fn set_working_dir(&mut self, working_dir: impl Into<String>) {
        self.working_dir = working_dir.into();
    }

    pub fn is_executing(&self) -> bool {
        self.executing
    }
}
