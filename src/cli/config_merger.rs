//! Configuration merger for CLI arguments and config files
//!
//! This module handles merging CLI argument overrides with file-based configuration,
//! implementing the configuration precedence logic.

use std::path::Path;

use super::parser::{Cli, Commands};
use crate::config::error::ConfigError;
use crate::config::{ConfigLoader, Environment, settings::Settings};

/// Configuration merger that handles CLI argument integration with file-based configuration
///
/// CLI arguments override configuration file and environment values.
#[derive(Debug)]
pub struct ConfigurationMerger {
    base_config: Settings,
}

impl ConfigurationMerger {
    /// Create a new configuration merger with base configuration
    pub fn new(base_config: Settings) -> Self {
        Self { base_config }
    }

    /// Load the base configuration the way the CLI asks for it.
    ///
    /// `config_path` replaces the layered directory with a single file and
    /// `environment` replaces `HUB_APP_ENV` when choosing the overlay.
    ///
    /// # Errors
    /// Returns ConfigError if configuration loading or validation fails
    pub fn from_sources(
        config_path: Option<&Path>,
        environment: Option<Environment>,
    ) -> Result<Self, ConfigError> {
        let mut loader = ConfigLoader::new()?;
        if let Some(path) = config_path {
            loader = loader.with_config_file(path);
        }
        if let Some(environment) = environment {
            loader = loader.with_environment(environment);
        }

        Ok(Self::new(loader.load()?))
    }

    /// Merge CLI arguments with the base configuration
    ///
    /// Precedence, highest first: command flags, global flags, configuration.
    /// The merged result is validated again.
    pub fn merge_cli_args(&self, cli: &Cli) -> Result<Settings, ConfigError> {
        let mut config = self.base_config.clone();

        Self::apply_global_overrides(&mut config, cli);
        if let Some(ref command) = cli.command {
            Self::apply_command_overrides(&mut config, command);
        }

        config.validate()?;
        Ok(config)
    }

    fn apply_global_overrides(config: &mut Settings, cli: &Cli) {
        if cli.verbose {
            config.logger.level = "debug".to_string();
        } else if cli.quiet {
            config.logger.level = "error".to_string();
        }
    }

    fn apply_command_overrides(config: &mut Settings, command: &Commands) {
        match command {
            Commands::Serve {
                host,
                port,
                log_level,
                dry_run: _,
            } => {
                if let Some(host_addr) = host {
                    config.server.host = host_addr.clone();
                }
                if let Some(port_num) = port {
                    config.server.port = *port_num;
                }
                // Command-specific level wins over --verbose/--quiet.
                if let Some(level) = log_level {
                    config.logger.level = (*level).into();
                }
            }
            Commands::CheckConfig => {}
        }
    }

    /// Get the current configuration (useful for inspection)
    pub fn config(&self) -> &Settings {
        &self.base_config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::loader::tests::{EnvGuard, TEST_MUTEX};
    use clap::Parser;

    fn merge(args: &[&str]) -> Settings {
        let cli = Cli::try_parse_from(args).unwrap();
        ConfigurationMerger::new(Settings::default())
            .merge_cli_args(&cli)
            .unwrap()
    }

    #[test]
    fn test_configuration_merger_new() {
        let base_config = Settings::default();
        let merger = ConfigurationMerger::new(base_config.clone());
        assert_eq!(merger.config(), &base_config);
    }

    #[test]
    fn test_global_log_flags() {
        assert_eq!(merge(&["notification-hub", "--verbose"]).logger.level, "debug");
        assert_eq!(merge(&["notification-hub", "--quiet"]).logger.level, "error");
    }

    #[test]
    fn test_serve_host_and_port_override() {
        let merged = merge(&["notification-hub", "serve", "--host", "0.0.0.0", "--port", "8080"]);
        assert_eq!(merged.server.host, "0.0.0.0");
        assert_eq!(merged.server.port, 8080);
    }

    #[test]
    fn test_command_log_level_overrides_global() {
        let merged = merge(&["notification-hub", "--verbose", "serve", "--log-level", "warn"]);
        assert_eq!(merged.logger.level, "warn");
    }

    #[test]
    fn test_merge_revalidates() {
        let mut base = Settings::default();
        base.notification.default_email_provider = "missing".to_string();
        let cli = Cli::try_parse_from(["notification-hub"]).unwrap();

        let err = ConfigurationMerger::new(base).merge_cli_args(&cli).unwrap_err();
        assert_eq!(err.field(), Some("notification.default_email_provider"));
    }

    #[test]
    fn test_from_sources_reads_single_file() {
        let _lock = TEST_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        let mut guard = EnvGuard::new();
        guard.clear_hub_vars();

        let file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        std::fs::write(
            file.path(),
            "[server]\nport = 9090\n\n[notification]\ndefault_email_provider = \"log\"\n",
        )
        .unwrap();

        let merger =
            ConfigurationMerger::from_sources(Some(file.path()), Some(Environment::Staging))
                .unwrap();
        assert_eq!(merger.config().server.port, 9090);
    }
}
