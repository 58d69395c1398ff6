//! Persistent shell session and the framed command protocol.
//!
//! A [`ShellSession`] holds at most one [`Interpreter`]. Commands run in that
//! interpreter one after another, so working directory, environment and shell
//! variables carry over between calls until the session is released.
//!
//! # Protocol
//!
//! For each command the session writes the command and a blank line, a
//! statement saving `$?`, an optional blank `echo`, an `echo` of the call's
//! frame token with the saved status, and an `unset` of the status variable. It then reads merged output line by line until the frame line
//! appears. Everything before it, trimmed, is the command's output.
//!
//! # Hazards
//!
//! A command that never lets the frame through, such as a program reading
//! stdin or an unterminated quote, blocks [`ShellSession::run`] until the
//! configured command timeout, or forever when none is set. Use
//! [`ShellSession::run_with_cancel`] to abort from outside. After a call that
//! did not finish cleanly the session refuses further commands until
//! [`ShellSession::restart`].

use std::io;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::interpreter::Interpreter;
use super::sentinel::Frame;
use crate::config::ShellConfig;
use crate::context::{Console, OutputVisibility, SharedCommandLog, shared_command_log};
use crate::error::{Result, ShellError};

/// Captured result of one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Merged stdout/stderr, trimmed.
    pub output: String,
    /// Exit status of the command, when the frame carried a readable one.
    pub exit_status: Option<i32>,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_status == Some(0)
    }
}

pub struct ShellSession {
    config: ShellConfig,
    interpreter: Option<Interpreter>,
    desynced: bool,
    command_log: SharedCommandLog,
    visibility: OutputVisibility,
    console: Console,
}

impl ShellSession {
    /// Create a session without starting the interpreter.
    pub fn new(config: ShellConfig) -> Self {
        Self {
            config,
            interpreter: None,
            desynced: false,
            command_log: shared_command_log(),
            visibility: OutputVisibility::default(),
            console: Console::stdout(),
        }
    }

    /// Record executions into a log owned by the caller.
    pub fn with_command_log(mut self, command_log: SharedCommandLog) -> Self {
        self.command_log = command_log;
        self
    }

    pub fn with_visibility(mut self, visibility: OutputVisibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn with_console(mut self, console: Console) -> Self {
        self.console = console;
        self
    }

    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    pub fn command_log(&self) -> SharedCommandLog {
        self.command_log.clone()
    }

    pub fn visibility(&self) -> OutputVisibility {
        self.visibility.clone()
    }

    pub fn is_acquired(&self) -> bool {
        self.interpreter.is_some()
    }

    /// Whether a failed call left the output stream unusable.
    pub fn is_desynced(&self) -> bool {
        self.desynced
    }

    pub fn pid(&self) -> Option<u32> {
        self.interpreter.as_ref().and_then(Interpreter::pid)
    }

    #[cfg(test)]
    pub(crate) fn marker(&self) -> Option<&super::sentinel::SentinelMarker> {
        self.interpreter.as_ref().map(Interpreter::marker)
    }

    /// Start the interpreter.
    ///
    /// Fails with [`ShellError::AlreadyAcquired`] without spawning anything if
    /// one is already running.
    pub async fn acquire(&mut self) -> Result<()> {
        if self.interpreter.is_some() {
            return Err(ShellError::AlreadyAcquired);
        }
        self.interpreter = Some(Interpreter::spawn(&self.config).await?);
        self.desynced = false;
        Ok(())
    }

    /// Stop the interpreter. Best-effort and infallible; a no-op when nothing
    /// is running.
    pub async fn release(&mut self) {
        self.desynced = false;
        let Some(interpreter) = self.interpreter.take() else {
            return;
        };
        interpreter.shutdown(self.config.release_timeout()).await;
        info!("Interpreter session released");
    }

    /// Release and acquire again. Interpreter state does not survive.
    pub async fn restart(&mut self) -> Result<()> {
        self.release().await;
        self.acquire().await
    }

    /// Run `command` and return its trimmed output.
    pub async fn execute(&mut self, command: &str) -> Result<String> {
        Ok(self.run(command).await?.output)
    }

    /// Run `command`, bounded only by the configured command timeout.
    pub async fn run(&mut self, command: &str) -> Result<CommandOutput> {
        self.run_with_cancel(command, &CancellationToken::new()).await
    }

    /// Run `command`, giving up when `cancel` fires or the configured command
    /// timeout elapses.
    pub async fn run_with_cancel(
        &mut self,
        command: &str,
        cancel: &CancellationToken,
    ) -> Result<CommandOutput> {
        self.console.command(command);

        if self.desynced {
            return Err(ShellError::Desynced);
        }
        let interpreter = self.interpreter.as_mut().ok_or(ShellError::NotAcquired)?;
        let frame = interpreter.next_frame();
        let timeout = self.config.command_timeout();
        debug!("Running command: {}", command);

        let outcome = tokio::select! {
            res = exchange(
                interpreter,
                &frame,
                command,
                self.config.flush_echo,
                &self.visibility,
                &self.console,
            ) => res,
            () = cancel.cancelled() => Err(ShellError::Cancelled {
                command: command.to_string(),
            }),
            () = deadline(timeout) => Err(ShellError::Timeout {
                command: command.to_string(),
                timeout: timeout.unwrap_or_default(),
            }),
        };

        match outcome {
            Ok(output) => {
                debug!(
                    "Command finished with status {:?}, {} bytes of output",
                    output.exit_status,
                    output.output.len()
                );
                self.record(command, &output.output);
                Ok(output)
            }
            Err(e) => {
                warn!("Command failed: {}", e);
                self.desynced = true;
                Err(e)
            }
        }
    }

    fn record(&self, command: &str, output: &str) {
        match self.command_log.lock() {
            Ok(mut log) => log.append(command, output),
            Err(poisoned) => poisoned.into_inner().append(command, output),
        }
    }
}

// The child itself is killed by `kill_on_drop` when the interpreter drops.
impl Drop for ShellSession {
    fn drop(&mut self) {
        if self.interpreter.is_some() {
            debug!("Session dropped without release, killing interpreter");
        }
    }
}

/// Write the framed command and collect output until the frame line.
async fn exchange(
    interpreter: &mut Interpreter,
    frame: &Frame,
    command: &str,
    flush_echo: bool,
    visibility: &OutputVisibility,
    console: &Console,
) -> Result<CommandOutput> {
    let script = frame.script(command, flush_echo);
    interpreter
        .send(&script)
        .await
        .map_err(|e| ShellError::execution(command, e))?;

    let mut output = String::new();
    loop {
        let line = interpreter
            .read_line()
            .await
            .map_err(|e| ShellError::execution(command, e))?;
        let Some(line) = line else {
            return Err(ShellError::execution(
                command,
                io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "interpreter closed its output before the command finished",
                ),
            ));
        };
        if let Some(exit_status) = frame.match_line(&line) {
            return Ok(CommandOutput {
                output: output.trim().to_string(),
                exit_status,
            });
        }
        if visibility.is_enabled() {
            console.output_line(&line);
        }
        output.push_str(&line);
    }
}

async fn deadline(timeout: Option<Duration>) {
    match timeout {
        Some(timeout) => tokio::time::sleep(timeout).await,
        None => std::future::pending().await,
    }
}
