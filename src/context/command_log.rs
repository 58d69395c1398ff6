//! Commands run while servicing the current user request.
//!
//! The log grows without bound inside a turn. The caller clears it when a new
//! turn starts; the session only ever appends.

use serde::{Deserialize, Serialize};

/// A single command execution record with its output.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandRecord {
    #[serde(rename = "command")]
    pub command_line: String,
    pub output: String,
}

impl CommandRecord {
    /// Create a new command record.
    pub fn new(command_line: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            command_line: command_line.into(),
            output: output.into(),
        }
    }
}

/// Ordered, turn-scoped log of command executions.
#[derive(Debug, Default)]
pub struct CommandLog {
    entries: Vec<CommandRecord>,
}

impl CommandLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a command record to the end of the log.
    pub fn push(&mut self, record: CommandRecord) {
        self.entries.push(record);
    }

    pub fn append(&mut self, command_line: impl Into<String>, output: impl Into<String>) {
        self.push(CommandRecord::new(command_line, output));
    }

    /// Get all command records.
    pub fn entries(&self) -> &[CommandRecord] {
        &self.entries
    }

    /// Copy of the whole log for display.
    pub fn snapshot(&self) -> Vec<CommandRecord> {
        self.entries.clone()
    }

    /// Get the most recent n command records.
    pub fn recent(&self, n: usize) -> &[CommandRecord] {
        let len = self.entries.len();
        let start = len.saturating_sub(n);
        &self.entries[start..]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Clear all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Render the log the way it is shown by the "last commands" view.
    pub fn format_for_display(&self) -> String {
        let mut out = String::new();
        for record in &self.entries {
            out.push_str("$ ");
            out.push_str(&record.command_line);
            out.push('\n');
            if !record.output.is_empty() {
                out.push_str(&record.output);
                out.push('\n');
            }
        }
        out
    }
}
