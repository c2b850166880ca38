//! Configuration validation logic
//!
//! Each settings section validates itself; [`Settings::validate`] runs them
//! all and then checks the rules that span sections.

use std::collections::HashSet;

use crate::config::error::ConfigError;
use crate::config::settings::{
    BusBackend, BusConfig, FileSettings, LoggerSettings, NotificationSettings, ProviderConfig,
    ProviderKind, ServerConfig, Settings, StorageBackend, StorageConfig,
};

/// Valid log levels
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Valid log formats
const VALID_LOG_FORMATS: &[&str] = &["full", "compact", "json"];

/// Valid webhook methods
const VALID_WEBHOOK_METHODS: &[&str] = &["POST", "PUT", "PATCH"];

impl ServerConfig {
    /// Validate server configuration
    ///
    /// # Validation Rules
    /// - Port must be between 1 and 65535
    /// - Request timeout must be greater than 0
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::validation(
                "server.port",
                "Port must be between 1 and 65535. Please specify a valid port number.",
            ));
        }

        if self.request_timeout == 0 {
            return Err(ConfigError::validation(
                "server.request_timeout",
                "Request timeout must be greater than 0 seconds.",
            ));
        }

        Ok(())
    }
}

impl FileSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.enabled && self.path.trim().is_empty() {
            return Err(ConfigError::validation(
                "logger.file.path",
                "File path is required when file logging is enabled.",
            ));
        }

        if !VALID_LOG_FORMATS.contains(&self.format.to_lowercase().as_str()) {
            return Err(ConfigError::validation(
                "logger.file.format",
                format!(
                    "Invalid log format '{}'. Valid formats are: {}",
                    self.format,
                    VALID_LOG_FORMATS.join(", ")
                ),
            ));
        }

        Ok(())
    }
}

impl LoggerSettings {
    /// Validate logger configuration
    ///
    /// A bare level must be one of the known levels. Filter directives such
    /// as `notification_hub=debug,tower_http=info` are passed through to the
    /// subscriber untouched.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let level = self.level.trim();
        let is_directive = level.contains('=') || level.contains(',');
        if !is_directive && !VALID_LOG_LEVELS.contains(&level.to_lowercase().as_str()) {
            return Err(ConfigError::validation(
                "logger.level",
                format!(
                    "Invalid log level '{}'. Valid levels are: {}",
                    self.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            ));
        }

        self.file.validate()
    }
}

impl NotificationSettings {
    /// Validate notification dispatch rules
    ///
    /// # Validation Rules
    /// - Container names must not be empty
    /// - Size limits must be greater than 0 and the per-file limit must fit
    ///   inside the request limit
    /// - Placeholder delimiters must not be empty
    /// - Template cache needs a positive size and TTL when enabled
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.attachment_container_name.trim().is_empty() {
            return Err(ConfigError::validation(
                "notification.attachment_container_name",
                "Attachment container name must not be empty.",
            ));
        }

        if self.template_container_name.trim().is_empty() {
            return Err(ConfigError::validation(
                "notification.template_container_name",
                "Template container name must not be empty.",
            ));
        }

        if self
            .allowed_attachment_types
            .iter()
            .any(|ext| ext.trim_start_matches('.').trim().is_empty())
        {
            return Err(ConfigError::validation(
                "notification.allowed_attachment_types",
                "Allowed attachment types must not contain empty extensions.",
            ));
        }

        if self.individual_file_size_bytes_limit == 0 {
            return Err(ConfigError::validation(
                "notification.individual_file_size_bytes_limit",
                "Individual file size limit must be greater than 0 bytes.",
            ));
        }

        if self.request_size_bytes_limit < self.individual_file_size_bytes_limit {
            return Err(ConfigError::validation(
                "notification.request_size_bytes_limit",
                format!(
                    "Request size limit ({}) cannot be smaller than the individual file size limit ({}).",
                    self.request_size_bytes_limit, self.individual_file_size_bytes_limit
                ),
            ));
        }

        if self.default_email_provider.trim().is_empty() {
            return Err(ConfigError::validation(
                "notification.default_email_provider",
                "Default email provider must not be empty.",
            ));
        }

        if self.placeholder_open.is_empty() || self.placeholder_close.is_empty() {
            return Err(ConfigError::validation(
                "notification.placeholder_open",
                "Placeholder delimiters must not be empty.",
            ));
        }

        if self.template_cache.enabled
            && (self.template_cache.max_size == 0 || self.template_cache.ttl_seconds == 0)
        {
            return Err(ConfigError::validation(
                "notification.template_cache",
                "Template cache requires max_size and ttl_seconds greater than 0 when enabled.",
            ));
        }

        Ok(())
    }
}

impl StorageConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backend == StorageBackend::Filesystem && self.root.trim().is_empty() {
            return Err(ConfigError::validation(
                "storage.root",
                "Storage root is required for the filesystem backend.",
            ));
        }
        Ok(())
    }
}

impl BusConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backend != BusBackend::Redis {
            return Ok(());
        }

        let redis = &self.redis;
        if !(redis.url.starts_with("redis://") || redis.url.starts_with("rediss://")) {
            return Err(ConfigError::validation(
                "bus.redis.url",
                "Invalid Redis URL format. Expected format: redis://[user:password@]host[:port][/db]",
            ));
        }

        if redis.stream.trim().is_empty() {
            return Err(ConfigError::validation(
                "bus.redis.stream",
                "Redis stream key must not be empty.",
            ));
        }

        if redis.pool_size == 0 {
            return Err(ConfigError::validation(
                "bus.redis.pool_size",
                "Pool size must be greater than 0.",
            ));
        }

        if redis.connection_timeout == 0 {
            return Err(ConfigError::validation(
                "bus.redis.connection_timeout",
                "Connection timeout must be greater than 0 seconds.",
            ));
        }

        Ok(())
    }
}

impl ProviderConfig {
    /// Validate a single provider entry.
    ///
    /// `index` is the entry's position in the `providers` array and is used
    /// to build the reported field path.
    pub fn validate(&self, index: usize) -> Result<(), ConfigError> {
        let field = |name: &str| format!("providers[{}].{}", index, name);

        if self.name.trim().is_empty() {
            return Err(ConfigError::validation(
                field("name"),
                "Provider name must not be empty.",
            ));
        }

        match self.kind {
            ProviderKind::Log => {}
            ProviderKind::Sendgrid => {
                let Some(sendgrid) = &self.sendgrid else {
                    return Err(ConfigError::validation(
                        field("sendgrid"),
                        format!(
                            "Provider '{}' of kind sendgrid requires a [sendgrid] table.",
                            self.name
                        ),
                    ));
                };
                if sendgrid.api_key.trim().is_empty() {
                    return Err(ConfigError::validation(
                        field("sendgrid.api_key"),
                        "SendGrid API key must not be empty.",
                    ));
                }
                if !sendgrid.from_email.contains('@') {
                    return Err(ConfigError::validation(
                        field("sendgrid.from_email"),
                        format!("Invalid sender address '{}'.", sendgrid.from_email),
                    ));
                }
            }
            ProviderKind::Webhook => {
                let Some(webhook) = &self.webhook else {
                    return Err(ConfigError::validation(
                        field("webhook"),
                        format!(
                            "Provider '{}' of kind webhook requires a [webhook] table.",
                            self.name
                        ),
                    ));
                };
                if !(webhook.url.starts_with("http://") || webhook.url.starts_with("https://")) {
                    return Err(ConfigError::validation(
                        field("webhook.url"),
                        "Webhook URL must start with http:// or https://.",
                    ));
                }
                if !VALID_WEBHOOK_METHODS.contains(&webhook.method.to_uppercase().as_str()) {
                    return Err(ConfigError::validation(
                        field("webhook.method"),
                        format!(
                            "Invalid webhook method '{}'. Valid methods are: {}",
                            webhook.method,
                            VALID_WEBHOOK_METHODS.join(", ")
                        ),
                    ));
                }
                if webhook.timeout_seconds == 0 {
                    return Err(ConfigError::validation(
                        field("webhook.timeout_seconds"),
                        "Webhook timeout must be greater than 0 seconds.",
                    ));
                }
            }
        }

        Ok(())
    }
}

impl Settings {
    /// Validate all configuration sections
    ///
    /// Runs the per-section checks, then makes sure provider names are unique
    /// and that the default provider is one of them.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.logger.validate()?;
        self.notification.validate()?;
        self.storage.validate()?;
        self.bus.validate()?;

        let mut seen = HashSet::new();
        for (index, provider) in self.providers.iter().enumerate() {
            provider.validate(index)?;
            if !seen.insert(provider.name.as_str()) {
                return Err(ConfigError::validation(
                    format!("providers[{}].name", index),
                    format!("Duplicate provider name '{}'.", provider.name),
                ));
            }
        }

        if !seen.contains(self.notification.default_email_provider.as_str()) {
            return Err(ConfigError::validation(
                "notification.default_email_provider",
                format!(
                    "Default email provider '{}' is not configured. Configured providers: {}",
                    self.notification.default_email_provider,
                    self.provider_names().join(", ")
                ),
            ));
        }

        Ok(())
    }

    fn provider_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.providers.iter().map(|p| p.name.as_str()).collect();
        names.sort_unstable();
        names
    }
}
