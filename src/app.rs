//! Interactive front end.
//!
//! Reads requests at a prompt, starts a new turn for each one, hands it to the
//! agent, and prints the reply. Lines starting with `:` control the shell
//! session itself.

use anyhow::{Context as _, Result};
use crossterm::style::Stylize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};

use crate::ai::{Agent, ShellTool};
use crate::config::Config;
use crate::context::{CommandLog, Console, History, OutputVisibility};
use crate::shell::ShellSession;

const HELP: &str = "\
:output   toggle live command output
:last     show the commands run for the last request
:restart  restart the shell session
:help     show this help
:quit     exit";

/// A line typed at the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Empty,
    ToggleOutput,
    LastCommands,
    Restart,
    Help,
    Quit,
    Unknown(String),
    Request(String),
}

impl Input {
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Self::Empty;
        }
        let Some(meta) = trimmed.strip_prefix(':') else {
            return Self::Request(trimmed.to_string());
        };
        match meta.trim() {
            "output" | "o" => Self::ToggleOutput,
            "last" | "l" => Self::LastCommands,
            "restart" => Self::Restart,
            "help" | "h" | "?" => Self::Help,
            "quit" | "q" | "exit" => Self::Quit,
            other => Self::Unknown(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

pub struct App<A: Agent> {
    agent: A,
    tool: ShellTool,
    history: History,
    console: Console,
    prompt: String,
}

impl<A: Agent> App<A> {
    pub fn new(config: &Config, agent: A) -> Result<Self> {
        let console = Console::stdout();
        let history = History::load(&config.ui.history_path())
            .context("Unable to load input history")?;
        Ok(Self::with_parts(config, agent, console, history))
    }

    /// Build an app writing to `console` with an explicit input history.
    pub fn with_parts(config: &Config, agent: A, console: Console, history: History) -> Self {
        let session = ShellSession::new(config.shell.clone())
            .with_visibility(OutputVisibility::new(config.ui.show_output))
            .with_console(console.clone());
        Self {
            agent,
            tool: ShellTool::new(session),
            history,
            console,
            prompt: config.ui.prompt.clone(),
        }
    }

    pub fn tool(&self) -> &ShellTool {
        &self.tool
    }

    /// Start the shell, serve the prompt until EOF or `:quit`, then release the
    /// shell on every exit path.
    pub async fn run(&mut self) -> Result<()> {
        self.tool
            .acquire()
            .await
            .context("Unable to start the shell session")?;
        info!("Interactive loop started");

        let result = self.read_loop().await;
        self.tool.release().await;
        info!("Interactive loop finished");
        result
    }

    async fn read_loop(&mut self) -> Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            self.show_prompt();
            let Some(line) = lines.next_line().await.context("Failed to read input")? else {
                break;
            };
            if let Err(e) = self.history.push(&line) {
                warn!("Failed to record input history: {:#}", e);
            }
            if self.handle_line(&line).await == Flow::Exit {
                break;
            }
        }
        Ok(())
    }

    fn show_prompt(&self) {
        use std::io::Write as _;
        let mut stdout = std::io::stdout();
        if let Err(e) = write!(stdout, "{}", self.prompt.as_str().bold()).and_then(|()| stdout.flush())
        {
            warn!("Failed to write prompt: {}", e);
        }
    }

    /// Handle one line typed at the prompt.
    pub async fn handle_line(&mut self, line: &str) -> Flow {
        match Input::parse(line) {
            Input::Empty => {}
            Input::Quit => return Flow::Exit,
            Input::Help => self.console.write_line(HELP),
            Input::ToggleOutput => {
                let visibility = self.tool.visibility();
                visibility.toggle();
                self.console.write_line(visibility.describe());
            }
            Input::LastCommands => self.show_last_commands(),
            Input::Restart => match self.tool.restart().await {
                Ok(()) => self.notice("Shell session restarted."),
                Err(e) => self.report_error(&anyhow::Error::from(e)),
            },
            Input::Unknown(cmd) => {
                self.notice(&format!("Unknown command `:{cmd}`, try :help"));
            }
            Input::Request(request) => self.serve(&request).await,
        }
        Flow::Continue
    }

    async fn serve(&mut self, request: &str) {
        self.tool.start_turn();
        match self.agent.respond(request, &self.tool).await {
            Ok(reply) => {
                if !reply.is_empty() {
                    self.console.write_line(&reply);
                }
            }
            Err(e) => self.report_error(&e),
        }
        if self.tool.needs_restart().await {
            self.notice("The shell session is out of sync; use :restart.");
        }
    }

    fn show_last_commands(&self) {
        let mut log = CommandLog::new();
        for record in self.tool.last_commands() {
            log.push(record);
        }
        if log.is_empty() {
            self.notice("No commands were run for the last request.");
        } else {
            self.console
                .write_line(log.format_for_display().trim_end_matches('\n'));
        }
    }

    fn notice(&self, text: &str) {
        self.console.write_line(&text.dark_grey().to_string());
    }

    fn report_error(&self, e: &anyhow::Error) {
        error!("Request failed: {:#}", e);
        self.console
            .write_line(&format!("error: {e:#}").red().to_string());
    }
}
