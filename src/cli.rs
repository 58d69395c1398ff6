//! Command-line interface using clap's derive API.

use std::path::PathBuf;

use clap::Parser;

use crate::config::Config;

/// Interactive agent shell
///
/// Serves requests at a prompt and runs the commands they need in one
/// persistent shell session.
#[derive(Parser, Debug)]
#[command(name = "agent-shell")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase output verbosity (debug-level logging)
    #[arg(short, long)]
    pub verbose: bool,

    /// Specify alternate configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Interpreter to run commands in
    #[arg(long, value_name = "PROGRAM")]
    pub shell: Option<String>,

    /// Echo command output live from the start
    #[arg(long)]
    pub show_output: bool,
}

impl Cli {
    /// Fold command-line overrides into the loaded configuration.
    pub fn apply(&self, config: &mut Config) {
        if let Some(shell) = &self.shell {
            config.shell.program = shell.clone();
        }
        if self.show_output {
            config.ui.show_output = true;
        }
        if self.verbose {
            config.log_level = Some("debug".to_string());
        }
    }
}
