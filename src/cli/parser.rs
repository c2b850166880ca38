//! CLI argument parsing with clap
//!
//! This module defines the command-line interface structure using clap,
//! including all commands, arguments, and their documentation.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::build;

/// HTTP front door for attachments and email delivery
#[derive(Parser, Debug)]
#[command(name = "notification-hub")]
#[command(about = "HTTP front door for attachments and email delivery")]
#[command(long_about = "
notification-hub accepts attachment uploads and email requests over HTTP.
Emails are either sent immediately through a configured provider or
published as events to the message bus for asynchronous delivery.

EXAMPLES:
    # Start the server with default configuration
    notification-hub serve

    # Start server on custom host and port
    notification-hub serve --host 0.0.0.0 --port 8080

    # Use custom configuration file
    notification-hub --config /path/to/config.toml serve

    # Run with the staging overlay and verbose logging
    notification-hub --env staging --verbose serve

    # Check configuration without starting server
    notification-hub serve --dry-run

    # Print the resolved configuration summary
    notification-hub check-config

For more information about configuration options, see config/default.toml.
")]
#[command(version = build::CLAP_LONG_VERSION)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Configuration file path
    ///
    /// Load this single TOML file instead of the layered `config/` directory.
    /// `HUB_*` environment variables still override its values.
    /// The file must exist and be readable.
    ///
    /// Example: --config /etc/notification-hub/production.toml
    #[arg(short, long, value_name = "FILE", value_parser = super::validation::validate_config_file_path)]
    pub config: Option<PathBuf>,

    /// Override environment detection
    ///
    /// Selects the `config/{environment}.toml` overlay instead of `HUB_APP_ENV`.
    ///
    /// Available values: development (dev), test, staging (stage), production (prod)
    #[arg(short, long, value_enum)]
    pub env: Option<Environment>,

    /// Enable verbose logging
    ///
    /// Increases log output to debug level.
    /// Cannot be used with --quiet.
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress non-error output
    ///
    /// Reduces log output to error level only.
    /// Cannot be used with --verbose.
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the web server (default)
    ///
    /// Builds storage, bus and provider adapters from the configuration and
    /// begins accepting requests.
    ///
    /// Examples:
    ///   notification-hub serve                           # Start with defaults
    ///   notification-hub serve --host 0.0.0.0 --port 80 # Bind to all interfaces on port 80
    ///   notification-hub serve --dry-run                 # Validate config without starting
    Serve {
        /// Host address to bind to
        ///
        /// Use 127.0.0.1 for localhost only, or 0.0.0.0 to accept connections from any interface.
        ///
        /// Default: 127.0.0.1
        #[arg(long, value_name = "ADDRESS", value_parser = super::validation::validate_host_address)]
        host: Option<String>,

        /// Port number to listen on
        ///
        /// Must be between 1 and 65535.
        ///
        /// Default: 3000
        #[arg(short, long, value_name = "PORT", value_parser = super::validation::validate_port)]
        port: Option<u16>,

        /// Log level override
        ///
        /// Overrides both the configuration file and the global --verbose/--quiet flags.
        ///
        /// Available levels: error, warn, info, debug, trace
        #[arg(long, value_enum)]
        log_level: Option<LogLevel>,

        /// Validate configuration and exit
        ///
        /// Returns exit code 0 if valid, non-zero if invalid.
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate the configuration and print a summary
    ///
    /// Loads every configuration layer, validates it and lists the storage,
    /// bus and provider settings the server would start with. Secrets are
    /// never printed.
    CheckConfig,
}

/// Environment options
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum Environment {
    #[value(name = "development", alias = "dev")]
    Development,
    #[value(name = "test")]
    Test,
    #[value(name = "staging", alias = "stage")]
    Staging,
    #[value(name = "production", alias = "prod")]
    Production,
}

/// Log level options
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum LogLevel {
    #[value(name = "error")]
    Error,
    #[value(name = "warn", alias = "warning")]
    Warn,
    #[value(name = "info")]
    Info,
    #[value(name = "debug")]
    Debug,
    #[value(name = "trace")]
    Trace,
}

impl Cli {
    /// Validate CLI arguments and provide detailed error messages
    ///
    /// Checks argument combinations clap cannot express on its own.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(Commands::Serve {
            host: Some(host),
            port: Some(port),
            ..
        }) = &self.command
            && host == "0.0.0.0"
            && *port < 1024
        {
            return Err("Binding to 0.0.0.0 on a privileged port (< 1024) typically requires root privileges".to_string());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use --verbose and --quiet together".to_string());
        }

        Ok(())
    }

    /// Get detailed help for validation errors
    pub fn get_validation_help() -> &'static str {
        r#"
Common validation errors and solutions:

Port validation:
  - Port must be between 1 and 65535
  - Ports below 1024 require root privileges on most systems
  - Example: --port 8080

Host validation:
  - Use 'localhost' or '127.0.0.1' for local access only
  - Use '0.0.0.0' to accept connections from any interface
  - IPv4 addresses must be in valid format (e.g., 192.168.1.100)
  - Example: --host 0.0.0.0

Configuration file validation:
  - File must exist and be readable
  - File must be in TOML format
  - Example: --config /path/to/config.toml

For more help, use: notification-hub help <subcommand>
"#
    }
}

impl From<LogLevel> for String {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => "error".to_string(),
            LogLevel::Warn => "warn".to_string(),
            LogLevel::Info => "info".to_string(),
            LogLevel::Debug => "debug".to_string(),
            LogLevel::Trace => "trace".to_string(),
        }
    }
}

impl From<Environment> for crate::config::Environment {
    fn from(env: Environment) -> Self {
        match env {
            Environment::Development => crate::config::Environment::Development,
            Environment::Test => crate::config::Environment::Test,
            Environment::Staging => crate::config::Environment::Staging,
            Environment::Production => crate::config::Environment::Production,
        }
    }
}
