//! State the caller owns around a shell session.
//!
//! The command log and the visibility flag are shared with the session through
//! cloned handles; the console is where echoed commands and live output go;
//! the input history backs the interactive prompt.

mod command_log;
mod console;
mod history;
mod visibility;


use std::sync::{Arc, Mutex};

pub use command_log::{CommandLog, CommandRecord};
pub use console::{CapturedOutput, Console};
pub use history::History;
pub use visibility::OutputVisibility;

/// Command log handle shared between the caller and the session.
pub type SharedCommandLog = Arc<Mutex<CommandLog>>;

pub fn shared_command_log() -> SharedCommandLog {
    Arc::new(Mutex::new(CommandLog::new()))
}

/// Snapshot of a shared log. A poisoned lock yields whatever was recorded.
pub fn snapshot(log: &SharedCommandLog) -> Vec<CommandRecord> {
    match log.lock() {
        Ok(log) => log.snapshot(),
        Err(poisoned) => poisoned.into_inner().snapshot(),
    }
}

/// Start a new turn: forget the commands of the previous one.
pub fn clear(log: &SharedCommandLog) {
    match log.lock() {
        Ok(mut log) => log.clear(),
        Err(poisoned) => poisoned.into_inner().clear(),
    }
}
