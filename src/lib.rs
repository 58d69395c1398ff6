//! agent-shell - a persistent shell session for language-model agents
//!
//! This library provides:
//! - A shell session that keeps one interpreter alive across commands and
//!   frames each command's output with a sentinel line
//! - A turn-scoped log of the commands run and their output
//! - A toggle for echoing command output live to the console
//! - The `sh` tool definition and tool-call handling for function-calling agents
//! - An interactive prompt loop that drives an [`ai::Agent`]
//!
//! # Example
//!
//! ```no_run
//! use agent_shell::config::ShellConfig;
//! use agent_shell::shell::ShellSession;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), agent_shell::ShellError> {
//!     let mut session = ShellSession::new(ShellConfig::default());
//!     session.acquire().await?;
//!
//!     session.execute("cd /tmp").await?;
//!     assert_eq!(session.execute("pwd").await?, "/tmp");
//!
//!     let run = session.run("false").await?;
//!     assert_eq!(run.exit_status, Some(1));
//!
//!     session.release().await;
//!     Ok(())
//! }
//! ```

pub mod ai;
pub mod app;
pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod shell;
pub mod utils;

// Re-export commonly used types
pub use ai::{Agent, PassthroughAgent, ShellTool};
pub use app::App;
pub use config::Config;
pub use context::{CommandLog, CommandRecord, OutputVisibility};
pub use error::{Result, ShellError};
pub use shell::{CommandOutput, ShellSession};
