//! Input history for the interactive prompt.
//!
//! Entries are kept in memory and, when a backing file is set, appended to it
//! one per line so they survive restarts.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context as _;

/// Maximum number of entries to keep in memory.
const MAX_HISTORY_SIZE: usize = 1000;

#[derive(Clone, Debug, Default)]
pub struct History {
    commands: Vec<String>,
    path: Option<PathBuf>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load history from `path`, creating nothing until the first push.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut history = Self {
            commands: Vec::new(),
            path: Some(path.to_path_buf()),
        };
        if path.exists() {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("Failed to read history {}", path.display()))?;
            for line in raw.lines() {
                history.remember(line);
            }
        }
        Ok(history)
    }

    /// Add an entry to history.
    /// Skips empty entries and duplicates of the last entry.
    pub fn push(&mut self, entry: &str) -> anyhow::Result<()> {
        if !self.remember(entry) {
            return Ok(());
        }
        if let Some(path) = &self.path {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create history directory: {}", parent.display())
                })?;
            }
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open history {}", path.display()))?;
            writeln!(file, "{}", entry.trim())
                .with_context(|| format!("Failed to append to history {}", path.display()))?;
        }
        Ok(())
    }

    fn remember(&mut self, entry: &str) -> bool {
        let trimmed = entry.trim();
        if trimmed.is_empty() || trimmed.contains('\n') {
            return false;
        }

        // Skip if it's a duplicate of the last entry
        if self.commands.last().map(|s| s.as_str()) == Some(trimmed) {
            return false;
        }

        self.commands.push(trimmed.to_string());

        if self.commands.len() > MAX_HISTORY_SIZE {
            self.commands.remove(0);
        }
        true
    }

    /// Get the most recent n entries.
    pub fn recent(&self, n: usize) -> Vec<String> {
        let len = self.commands.len();
        let start = len.saturating_sub(n);
        self.commands[start..].to_vec()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
