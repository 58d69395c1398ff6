//! Seam between the interactive loop and whatever drives the tool.
//!
//! A language-model agent implements [`Agent`] outside this crate and calls
//! [`ShellTool::observe`] for each tool call it receives. [`PassthroughAgent`]
//! is the built-in driver: it runs each request as a command.

use std::future::Future;

use super::tool::ShellTool;

pub trait Agent {
    /// Service one user request, running commands through `tool` as needed,
    /// and return the reply shown to the user.
    fn respond(
        &mut self,
        input: &str,
        tool: &ShellTool,
    ) -> impl Future<Output = anyhow::Result<String>> + Send;
}

/// Runs the user's input verbatim in the shell and replies with its output.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughAgent;

impl Agent for PassthroughAgent {
    async fn respond(&mut self, input: &str, tool: &ShellTool) -> anyhow::Result<String> {
        Ok(tool.execute(input).await?)
    }
}
