//! Agent-facing surface of the shell session.
//!
//! This module describes the `sh` tool to a function-calling agent, turns its
//! tool calls into observations, and defines the seam the interactive loop
//! uses to hand user requests to an agent.

pub mod agent;
pub mod tool;

pub use agent::{Agent, PassthroughAgent};
pub use tool::{ShellTool, ShellToolArgs, TOOL_SH};
