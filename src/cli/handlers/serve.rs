//! Serve command handler
//!
//! Handles the serve command including dry-run validation.

use crate::config::settings::Settings;
use crate::error::AppResult;
use crate::services::ProviderRegistry;
use crate::services::storage;

/// Handler for the serve command
pub struct ServeCommandHandler {
    config: Settings,
}

impl ServeCommandHandler {
    /// Create a new serve command handler
    pub fn new(config: Settings) -> Self {
        Self { config }
    }

    /// Execute the serve command with optional dry-run support
    ///
    /// Without `dry_run` this returns immediately and the caller starts the
    /// server.
    ///
    /// # Errors
    /// - Configuration validation errors
    /// - Storage or provider construction errors (dry-run only)
    pub async fn execute(&self, dry_run: bool) -> AppResult<()> {
        if dry_run {
            self.validate_only().await
        } else {
            Ok(())
        }
    }

    /// Validate configuration and build the adapters without binding a socket
    ///
    /// The bus is not contacted so a dry run works without Redis.
    pub async fn validate_only(&self) -> AppResult<()> {
        self.config.validate()?;
        println!("✓ Configuration is valid");
        println!("✓ Server would bind to: {}", self.config.server.address());

        let storage = storage::from_config(&self.config.storage);
        println!("✓ Blob storage backend: {}", storage.name());

        let registry = ProviderRegistry::from_config(&self.config.providers)?;
        println!("✓ Providers registered: {}", registry.names().join(", "));

        println!("✓ Bus backend: {:?}", self.config.bus.backend);
        println!("Dry run completed successfully - configuration is ready for deployment");
        Ok(())
    }

    /// Get the configuration
    pub fn config(&self) -> &Settings {
        &self.config
    }
}
