//! The `sh` tool exposed to a function-calling agent.
//!
//! The agent sees one capability: run a shell command, get back combined
//! standard output and error text. Failures reach the agent as observations
//! instead of aborting its loop.

use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionTool, ChatCompletionToolType, FunctionObject,
};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::context::{self, CommandRecord, OutputVisibility, SharedCommandLog};
use crate::error::{Result, ShellError};
use crate::shell::{CommandOutput, ShellSession};

/// Name of the shell tool
pub const TOOL_SH: &str = "sh";

const TOOL_DESCRIPTION: &str =
    "Useful when you need to run a shell command and get standard output and errors.";

/// Arguments for the sh tool (parsed from the agent's JSON)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShellToolArgs {
    /// Command line run by bash in the persistent session
    pub command: String,
}

/// Shell session shared by every tool call.
///
/// Calls are serialised: the session lock is held for the whole command, so
/// two concurrent calls never interleave their framing.
pub struct ShellTool {
    session: Mutex<ShellSession>,
    command_log: SharedCommandLog,
    visibility: OutputVisibility,
}

impl ShellTool {
    pub fn new(session: ShellSession) -> Self {
        Self {
            command_log: session.command_log(),
            visibility: session.visibility(),
            session: Mutex::new(session),
        }
    }

    /// Tool definition advertised to the model.
    pub fn definition() -> ChatCompletionTool {
        ChatCompletionTool {
            r#type: ChatCompletionToolType::Function,
            function: FunctionObject {
                name: TOOL_SH.to_string(),
                description: Some(TOOL_DESCRIPTION.to_string()),
                parameters: Some(serde_json::json!({
                    "type": "object",
                    "properties": {
                        "command": {
                            "type": "string",
                            "description": "should be a command to run with bash"
                        }
                    },
                    "required": ["command"],
                    "additionalProperties": false
                })),
                strict: Some(true),
            },
        }
    }

    pub async fn acquire(&self) -> Result<()> {
        self.session.lock().await.acquire().await
    }

    pub async fn release(&self) {
        self.session.lock().await.release().await;
    }

    pub async fn restart(&self) -> Result<()> {
        info!("Restarting shell session");
        self.session.lock().await.restart().await
    }

    pub async fn needs_restart(&self) -> bool {
        self.session.lock().await.is_desynced()
    }

    pub async fn execute(&self, command: &str) -> Result<String> {
        self.session.lock().await.execute(command).await
    }

    pub async fn execute_with_cancel(
        &self,
        command: &str,
        cancel: &CancellationToken,
    ) -> Result<CommandOutput> {
        self.session
            .lock()
            .await
            .run_with_cancel(command, cancel)
            .await
    }

    /// Run a call from its raw JSON arguments.
    pub async fn call(&self, arguments: &str) -> Result<String> {
        let args: ShellToolArgs = serde_json::from_str(arguments)?;
        self.execute(&args.command).await
    }

    /// Answer a tool call from the model. Errors become the observation text.
    pub async fn observe(&self, tool_call: &ChatCompletionMessageToolCall) -> String {
        if tool_call.function.name != TOOL_SH {
            return format!("Tool error: unknown tool `{}`", tool_call.function.name);
        }
        match self.call(&tool_call.function.arguments).await {
            Ok(output) => output,
            Err(e) => {
                error!("Tool call {} failed: {}", tool_call.id, e);
                tool_error_observation(&e)
            }
        }
    }

    pub fn command_log(&self) -> SharedCommandLog {
        self.command_log.clone()
    }

    pub fn visibility(&self) -> &OutputVisibility {
        &self.visibility
    }

    /// Commands run since the current turn started.
    pub fn last_commands(&self) -> Vec<CommandRecord> {
        context::snapshot(&self.command_log)
    }

    /// Forget the previous turn's commands.
    pub fn start_turn(&self) {
        context::clear(&self.command_log);
    }
}

fn tool_error_observation(err: &ShellError) -> String {
    let mut text = format!("Tool error: {err}");
    if err.needs_restart() {
        text.push_str(" (the shell session must be restarted before running more commands)");
    }
    text
}
