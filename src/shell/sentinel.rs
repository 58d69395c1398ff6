//! End-of-output framing.
//!
//! Every command is followed by a statement that prints a frame line of the
//! form `<marker>:<seq>:<status>`. The marker is minted once per interpreter
//! and the sequence number changes per call, so a frame left over from an
//! earlier, abandoned call never terminates a later one.
//!
//! A blank line follows the command so a trailing `\` continuation cannot pull
//! the status statement into it. The status variable is unset once the frame
//! is printed, leaving nothing behind in the user's shell.

use uuid::Uuid;

/// Shell variable that holds the command's exit status until the frame is printed.
const STATUS_VAR: &str = "__agent_shell_status";

/// Delimiter fixed for the lifetime of one interpreter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentinelMarker(String);

impl SentinelMarker {
    pub fn mint() -> Self {
        Self(format!("__AGENT_SHELL_EOF_{}__", Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Frame for the `seq`-th command on this interpreter.
    pub fn frame(&self, seq: u64) -> Frame {
        Frame {
            token: format!("{}:{}", self.0, seq),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    token: String,
}

impl Frame {
    /// Script written to the interpreter's stdin for `command`.
    pub fn script(&self, command: &str, flush_echo: bool) -> String {
        let mut script = String::with_capacity(command.len() + self.token.len() + 64);
        script.push_str(command);
        script.push_str("\n\n");
        script.push_str(STATUS_VAR);
        script.push_str("=$?\n");
        if flush_echo {
            script.push_str("echo\n");
        }
        script.push_str(&format!("echo \"{}:${}\"\n", self.token, STATUS_VAR));
        script.push_str(&format!("unset {}\n", STATUS_VAR));
        script
    }

    /// Returns `Some(status)` when `line` is this frame's terminator.
    ///
    /// The inner option is `None` if the status field could not be parsed.
    pub fn match_line(&self, line: &str) -> Option<Option<i32>> {
        let rest = line.trim().strip_prefix(self.token.as_str())?;
        let status = rest.strip_prefix(':')?;
        Some(status.parse().ok())
    }
}
