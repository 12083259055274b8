//! Builtin terminal commands.
//!
//! These are handled entirely locally, without a remote execution
//! call. The table is loaded once and cached for the lifetime of the
//! process; dispatch never depends on its iteration order.

use std::sync::OnceLock;

/// A builtin command handled by the terminal engine itself.
#[derive(Debug, Clone)]
pub struct BuiltinCommand {
    /// Primary command name.
    pub name: &'static str,
    /// Accepted alternative spellings.
    pub aliases: &'static [&'static str],
    /// Usage format shown by `help`.
    pub usage: &'static str,
    /// Human-readable description.
    pub description: &'static str,
}

impl BuiltinCommand {
    const fn new(
        name: &'static str,
        aliases: &'static [&'static str],
        usage: &'static str,
        description: &'static str,
    ) -> Self {
        Self {
            name,
            aliases,
            usage,
            description,
        }
    }

    /// Whether `candidate` (already lowercased) names this builtin.
    pub fn matches(&self, candidate: &str) -> bool {
        self.name == candidate || self.aliases.contains(&candidate)
    }
}

/// Static storage for the builtin table (initialized once).
static BUILTIN_COMMANDS: OnceLock<Vec<BuiltinCommand>> = OnceLock::new();

/// Returns the fixed builtin command table.
pub fn builtin_commands() -> &'static [BuiltinCommand] {
    BUILTIN_COMMANDS.get_or_init(|| {
        vec![
            BuiltinCommand::new("help", &[], "help", "Show this help message"),
            BuiltinCommand::new("clear", &["cls"], "clear/cls", "Clear terminal"),
            BuiltinCommand::new("ls", &["dir"], "ls/dir", "List files in current directory"),
            BuiltinCommand::new("cd", &[], "cd <path>", "Change directory"),
            BuiltinCommand::new("cat", &["type"], "cat <file>", "Show file content"),
            BuiltinCommand::new("run", &[], "run", "Run current file in editor"),
            BuiltinCommand::new("python", &[], "python <file>", "Run Python file"),
            BuiltinCommand::new("node", &[], "node <file>", "Run JavaScript file"),
            BuiltinCommand::new("java", &[], "java <file>", "Compile and run Java file"),
            BuiltinCommand::new("g++", &[], "g++ <file>", "Compile and run C++ file"),
            BuiltinCommand::new("gcc", &[], "gcc <file>", "Compile and run C file"),
        ]
    })
}

/// Finds a builtin by name or alias (expects a lowercased candidate).
pub fn find_builtin(name: &str) -> Option<&'static BuiltinCommand> {
    builtin_commands().iter().find(|cmd| cmd.matches(name))
}
