//! The live interpreter process.
//!
//! One child with piped stdin and stdout. Stderr is folded into stdout by the
//! first statement we send, so a single line reader sees both streams in the
//! order the interpreter wrote them.

use std::io;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::{debug, info, warn};

use super::sentinel::{Frame, SentinelMarker};
use crate::config::ShellConfig;
use crate::error::{Result, ShellError};

const MERGE_STDERR: &str = "exec 2>&1\n";

pub struct Interpreter {
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: BufReader<ChildStdout>,
    marker: SentinelMarker,
    seq: u64,
}

impl Interpreter {
    /// Spawns the configured interpreter and merges its stderr into stdout.
    pub async fn spawn(config: &ShellConfig) -> Result<Self> {
        let spawn_error = |source: io::Error| ShellError::ProcessSpawn {
            program: config.program.clone(),
            source,
        };

        let mut cmd = Command::new(&config.program);
        cmd.args(&config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        if let Some(cwd) = &config.cwd {
            cmd.current_dir(cwd);
        }

        let mut child = cmd.spawn().map_err(spawn_error)?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| spawn_error(io::Error::other("interpreter stdin was not piped")))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| spawn_error(io::Error::other("interpreter stdout was not piped")))?;

        let mut interpreter = Self {
            child,
            stdin: Some(stdin),
            stdout: BufReader::new(stdout),
            marker: SentinelMarker::mint(),
            seq: 0,
        };
        interpreter.send(MERGE_STDERR).await.map_err(spawn_error)?;

        info!(
            "Spawned interpreter {} (pid {:?})",
            config.program,
            interpreter.pid()
        );
        Ok(interpreter)
    }

    pub fn pid(&self) -> Option<u32> {
        self.child.id()
    }

    #[cfg(test)]
    pub fn marker(&self) -> &SentinelMarker {
        &self.marker
    }

    /// Frame for the next command.
    pub fn next_frame(&mut self) -> Frame {
        self.seq += 1;
        self.marker.frame(self.seq)
    }

    /// Write `script` to the interpreter and flush it.
    pub async fn send(&mut self, script: &str) -> io::Result<()> {
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "interpreter stdin closed"))?;
        stdin.write_all(script.as_bytes()).await?;
        stdin.flush().await
    }

    /// Next line of merged output, newline included. `None` at end of stream.
    ///
    /// Bytes that are not valid UTF-8 are replaced rather than rejected.
    pub async fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut buf = Vec::new();
        let n = self.stdout.read_until(b'\n', &mut buf).await?;
        if n == 0 {
            return Ok(None);
        }
        Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
    }

    /// Close stdin, kill the interpreter and wait up to `grace` for it to exit.
    ///
    /// Never fails. A child that outlives the wait is left for the runtime to
    /// reap.
    pub async fn shutdown(mut self, grace: Duration) {
        let pid = self.pid();
        drop(self.stdin.take());

        // fails harmlessly when the interpreter already exited on its own
        if let Err(e) = self.child.start_kill() {
            debug!("Kill request for interpreter (pid {:?}) failed: {}", pid, e);
        }
        match tokio::time::timeout(grace, self.child.wait()).await {
            Ok(Ok(status)) => debug!("Interpreter (pid {:?}) exited with {}", pid, status),
            Ok(Err(e)) => warn!("Failed to wait for interpreter (pid {:?}): {}", pid, e),
            Err(_) => warn!(
                "Interpreter (pid {:?}) did not exit within {:?}",
                pid, grace
            ),
        }
    }
}
