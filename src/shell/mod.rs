//! Persistent shell session.
//!
//! This module keeps one interpreter process alive across many commands,
//! frames each command's output with a sentinel line, and records what ran.

mod interpreter;
mod sentinel;
mod session;

#[cfg(test)]
mod tests;

pub use sentinel::{Frame, SentinelMarker};
pub use session::{CommandOutput, ShellSession};
