//! Command executor for dispatching CLI commands
//!
//! This module provides the main entry point for executing CLI commands
//! after parsing and configuration loading.

use super::handlers::{CheckConfigCommandHandler, ServeCommandHandler};
use super::parser::{Cli, Commands};
use crate::config::settings::Settings;
use crate::error::{AppError, AppResult};

/// What the binary should do once the command has run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Start the HTTP server with the merged settings
    StartServer,
    /// The command finished on its own
    Exit,
}

/// Execute a CLI command with the given settings
///
/// Serving is left to the caller; every other command runs to completion here.
///
/// # Errors
/// Returns errors from command handlers or validation failures
pub async fn execute_command(cli: &Cli, settings: Settings) -> AppResult<CommandOutcome> {
    validate_command_args(cli)?;

    match &cli.command {
        Some(Commands::Serve { dry_run: true, .. }) => {
            ServeCommandHandler::new(settings).execute(true).await?;
            Ok(CommandOutcome::Exit)
        }
        Some(Commands::Serve { .. }) | None => Ok(CommandOutcome::StartServer),
        Some(Commands::CheckConfig) => {
            CheckConfigCommandHandler::new(settings).execute()?;
            Ok(CommandOutcome::Exit)
        }
    }
}

fn validate_command_args(cli: &Cli) -> AppResult<()> {
    cli.validate().map_err(|reason| AppError::Validation {
        field: "cli_arguments".to_string(),
        reason,
    })
}
