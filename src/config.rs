//! Configuration loading.
//!
//! Settings live in `~/.agent-shell/config.toml`. Every section and field is
//! optional; a missing file yields the defaults.
//!
//! ```toml
//! log_level = "info"
//!
//! [shell]
//! program = "/bin/bash"
//! release_timeout_ms = 200
//! command_timeout_secs = 120
//!
//! [ui]
//! show_output = false
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default tracing filter when `RUST_LOG` is unset.
    pub log_level: Option<String>,
    pub shell: ShellConfig,
    pub ui: UiConfig,
}

/// Settings for the persistent interpreter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Interpreter executable.
    pub program: String,
    pub args: Vec<String>,
    /// Working directory for the interpreter; inherits ours when unset.
    pub cwd: Option<PathBuf>,
    /// How long `release` waits for the interpreter to exit.
    pub release_timeout_ms: u64,
    /// Upper bound on a single command. Unset means wait forever.
    pub command_timeout_secs: Option<u64>,
    /// Emit a blank `echo` before the end-of-output frame so output that lacks
    /// a trailing newline cannot swallow the frame line.
    pub flush_echo: bool,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            program: "/bin/bash".to_string(),
            args: Vec::new(),
            cwd: None,
            release_timeout_ms: 200,
            command_timeout_secs: None,
            flush_echo: true,
        }
    }
}

impl ShellConfig {
    pub fn release_timeout(&self) -> Duration {
        Duration::from_millis(self.release_timeout_ms)
    }

    pub fn command_timeout(&self) -> Option<Duration> {
        self.command_timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Echo command output live while it runs.
    pub show_output: bool,
    pub prompt: String,
    /// Input history file; defaults to `~/.agent-shell/history`.
    pub history_file: Option<PathBuf>,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            show_output: false,
            prompt: "> ".to_string(),
            history_file: None,
        }
    }
}

impl UiConfig {
    pub fn history_path(&self) -> PathBuf {
        self.history_file
            .clone()
            .unwrap_or_else(|| app_dir().join("history"))
    }
}

/// `~/.agent-shell`, or `./.agent-shell` when `HOME` is unset.
pub fn app_dir() -> PathBuf {
    let home = std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    home.join(".agent-shell")
}

pub fn default_config_path() -> PathBuf {
    app_dir().join("config.toml")
}

impl Config {
    /// Load from `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("Invalid config at {}", path.display()))
    }

    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.shell.program, "/bin/bash");
        assert_eq!(config.shell.release_timeout(), Duration::from_millis(200));
        assert_eq!(config.shell.command_timeout(), None);
        assert!(config.shell.flush_echo);
        assert!(!config.ui.show_output);
        assert_eq!(config.ui.prompt, "> ");
    }

    #[test]
    fn test_partial_override() -> anyhow::Result<()> {
        let config = Config::parse(
            r#"
            log_level = "debug"

            [shell]
            program = "/bin/sh"
            command_timeout_secs = 30

            [ui]
            show_output = true
            "#,
        )?;
        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert_eq!(config.shell.program, "/bin/sh");
        assert_eq!(config.shell.command_timeout(), Some(Duration::from_secs(30)));
        // untouched fields keep their defaults
        assert_eq!(config.shell.release_timeout_ms, 200);
        assert!(config.ui.show_output);
        assert_eq!(config.ui.prompt, "> ");
        Ok(())
    }

    #[test]
    fn test_missing_file_gives_defaults() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let config = Config::load(&dir.path().join("absent.toml"))?;
        assert_eq!(config.shell.program, "/bin/bash");
        Ok(())
    }

    #[test]
    fn test_invalid_file_is_reported() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("config.toml");
        fs::write(&path, "[shell]\nrelease_timeout_ms = \"soon\"\n")?;
        let err = Config::load(&path).err().map(|e| format!("{e:#}"));
        assert!(err.is_some_and(|msg| msg.contains("Invalid config")));
        Ok(())
    }

    #[test]
    fn test_history_path_override() {
        let ui = UiConfig {
            history_file: Some(PathBuf::from("/tmp/h")),
            ..UiConfig::default()
        };
        assert_eq!(ui.history_path(), PathBuf::from("/tmp/h"));
    }
}
