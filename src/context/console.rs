//! Console side channel for command echo and live output.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use tracing::warn;

/// Cloneable line sink, stdout by default.
///
/// Writes are best-effort: a broken console must never fail a command.
#[derive(Clone)]
pub struct Console {
    out: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl std::fmt::Debug for Console {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Console").finish_non_exhaustive()
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::stdout()
    }
}

impl Console {
    pub fn stdout() -> Self {
        Self::from_writer(io::stdout())
    }

    pub fn from_writer(writer: impl Write + Send + 'static) -> Self {
        Self {
            out: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    /// A console that records everything written to it.
    pub fn capture() -> (Self, CapturedOutput) {
        let captured = CapturedOutput::default();
        (Self::from_writer(captured.clone()), captured)
    }

    /// Echo the command about to run.
    pub fn command(&self, command: &str) {
        self.write_line(&format!("$ {command}"));
    }

    /// Echo one output line. `line` may or may not carry its newline.
    pub fn output_line(&self, line: &str) {
        self.write_line(line.trim_end_matches(['\n', '\r']));
    }

    pub fn write_line(&self, text: &str) {
        let Ok(mut out) = self.out.lock() else {
            warn!("Console writer lock poisoned, dropping line");
            return;
        };
        if let Err(e) = writeln!(out, "{text}").and_then(|()| out.flush()) {
            warn!("Failed to write to console: {}", e);
        }
    }
}

/// In-memory console contents.
#[derive(Debug, Clone, Default)]
pub struct CapturedOutput {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl CapturedOutput {
    pub fn contents(&self) -> String {
        self.buf
            .lock()
            .map(|buf| String::from_utf8_lossy(&buf).into_owned())
            .unwrap_or_default()
    }
}

impl Write for CapturedOutput {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        let mut buf = self
            .buf
            .lock()
            .map_err(|_| io::Error::other("captured output lock poisoned"))?;
        buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
