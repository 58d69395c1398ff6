//! Error types for the shell session wrapper.
//!
//! Library code returns [`ShellError`]; the interactive front end wraps these
//! in `anyhow` with extra context.

use std::time::Duration;

use thiserror::Error;

/// Result alias used by the session and tool layers.
pub type Result<T> = std::result::Result<T, ShellError>;

#[derive(Debug, Error)]
pub enum ShellError {
    /// The interpreter executable is missing or could not be started.
    #[error("failed to spawn interpreter `{program}`: {source}")]
    ProcessSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// `acquire` was called while an interpreter is already running.
    #[error("interpreter session already acquired")]
    AlreadyAcquired,

    #[error("no interpreter session acquired")]
    NotAcquired,

    /// An I/O fault on the interpreter pipes, or the interpreter went away
    /// before the end-of-output frame was seen.
    #[error("shell execution failed for `{command}`: {source}")]
    Execution {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// A previous call did not finish cleanly, so the output stream can no
    /// longer be trusted to line up with commands.
    #[error("interpreter output is out of sync after a failed command; restart the session")]
    Desynced,

    #[error("command `{command}` was cancelled")]
    Cancelled { command: String },

    #[error("command `{command}` timed out after {}s", .timeout.as_secs())]
    Timeout { command: String, timeout: Duration },

    #[error("invalid tool arguments: {0}")]
    InvalidArguments(#[from] serde_json::Error),
}

impl ShellError {
    pub(crate) fn execution(command: &str, source: std::io::Error) -> Self {
        Self::Execution {
            command: command.to_string(),
            source,
        }
    }

    /// Whether the session must be restarted before it can run commands again.
    pub fn needs_restart(&self) -> bool {
        matches!(
            self,
            Self::Execution { .. } | Self::Desynced | Self::Cancelled { .. } | Self::Timeout { .. }
        )
    }
}
