//! Main entry point for agent-shell.
//!
//! Parses the command line, loads configuration, initializes logging and runs
//! the interactive loop with the built-in agent.

use agent_shell::cli::Cli;
use agent_shell::config::{Config, default_config_path};
use agent_shell::utils;
use agent_shell::{App, PassthroughAgent};

use anyhow::Result;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let mut config = Config::load(&config_path)?;
    cli.apply(&mut config);

    // Initialize logging before anything else touches the shell
    utils::logger::init_logging(config.log_level.as_deref());
    tracing::debug!("Loaded configuration from {}", config_path.display());

    let mut app = App::new(&config, PassthroughAgent)?;
    app.run().await
}
