//! Configuration settings structures for the notification hub
//!
//! This module defines all configuration structures that can be loaded from
//! TOML files and environment variables.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::error::ConfigError;
use crate::logger::{ConsoleConfig, FileConfig, LogFormat, LoggerConfig};

// ============================================================================
// Default value functions
// ============================================================================

fn default_app_name() -> String {
    "notification-hub".to_string()
}

fn default_app_version() -> String {
    crate::pkg_version().to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_request_timeout() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_log_path() -> String {
    "logs/notification-hub.log".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_attachment_container() -> String {
    "attachments".to_string()
}

fn default_template_container() -> String {
    "templates".to_string()
}

fn default_allowed_attachment_types() -> Vec<String> {
    ["pdf", "txt", "csv", "png", "jpg", "jpeg", "gif", "docx", "xlsx"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_individual_file_size_limit() -> u64 {
    1024 * 1024 // 1MB
}

fn default_request_size_limit() -> u64 {
    5 * 1024 * 1024 // 5MB
}

fn default_email_provider() -> String {
    "log".to_string()
}

fn default_placeholder_open() -> String {
    "{{".to_string()
}

fn default_placeholder_close() -> String {
    "}}".to_string()
}

fn default_template_cache_ttl() -> u64 {
    300
}

fn default_template_cache_size() -> usize {
    256
}

fn default_storage_root() -> String {
    "data/blobs".to_string()
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

fn default_redis_stream() -> String {
    "notification:events".to_string()
}

fn default_redis_pool_size() -> u32 {
    4
}

fn default_redis_connection_timeout() -> u64 {
    5
}

fn default_redis_max_len() -> u64 {
    100_000
}

fn default_sendgrid_api_url() -> String {
    "https://api.sendgrid.com/v3".to_string()
}

fn default_webhook_method() -> String {
    "POST".to_string()
}

fn default_webhook_timeout() -> u64 {
    30
}

// ============================================================================
// Application Configuration
// ============================================================================

/// Application basic information configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationConfig {
    #[serde(default = "default_app_name")]
    pub name: String,

    #[serde(default = "default_app_version")]
    pub version: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            version: default_app_version(),
        }
    }
}

// ============================================================================
// Server Configuration
// ============================================================================

/// Axum HTTP server configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Seconds a request may take before it is answered with 408
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
}

impl ServerConfig {
    /// Get the full server address as "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout: default_request_timeout(),
        }
    }
}

// ============================================================================
// Logger Settings
// ============================================================================

/// Console output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Whether to use colored output (only honoured on a TTY)
    #[serde(default = "default_true")]
    pub colored: bool,
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            colored: true,
        }
    }
}

/// File output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSettings {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_log_path")]
    pub path: String,

    /// Whether to append to an existing file
    #[serde(default = "default_true")]
    pub append: bool,

    /// Log format: "full", "compact", or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for FileSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            path: default_log_path(),
            append: true,
            format: default_log_format(),
        }
    }
}

/// Logger configuration settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggerSettings {
    /// Log level or filter directive, e.g. "info" or "notification_hub=debug"
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub console: ConsoleSettings,

    #[serde(default)]
    pub file: FileSettings,
}

impl Default for LoggerSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            console: ConsoleSettings::default(),
            file: FileSettings::default(),
        }
    }
}

impl LoggerSettings {
    /// Convert the file representation into the runtime [`LoggerConfig`].
    pub fn into_logger_config(self) -> Result<LoggerConfig, ConfigError> {
        let format: LogFormat = self.file.format.parse().map_err(|_| {
            ConfigError::validation(
                "logger.file.format",
                format!(
                    "Invalid log format '{}'. Valid formats are: full, compact, json",
                    self.file.format
                ),
            )
        })?;

        Ok(LoggerConfig {
            level: self.level,
            console: ConsoleConfig {
                enabled: self.console.enabled,
                colored: self.console.colored,
            },
            file: FileConfig {
                enabled: self.file.enabled,
                path: PathBuf::from(self.file.path),
                append: self.file.append,
                format,
            },
        })
    }
}

// ============================================================================
// Notification Settings
// ============================================================================

/// In-memory cache in front of the template store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateCacheSettings {
    #[serde(default)]
    pub enabled: bool,

    /// Time-to-live of a cached template in seconds
    #[serde(default = "default_template_cache_ttl")]
    pub ttl_seconds: u64,

    /// Maximum number of cached templates
    #[serde(default = "default_template_cache_size")]
    pub max_size: usize,
}

impl Default for TemplateCacheSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            ttl_seconds: default_template_cache_ttl(),
            max_size: default_template_cache_size(),
        }
    }
}

/// Dispatch rules shared by every notification request.
///
/// Injected into the pipeline at construction and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationSettings {
    /// Blob container holding uploaded attachments
    #[serde(default = "default_attachment_container")]
    pub attachment_container_name: String,

    /// Blob container holding email templates
    #[serde(default = "default_template_container")]
    pub template_container_name: String,

    /// File extensions (without the dot) accepted for attachments
    #[serde(default = "default_allowed_attachment_types")]
    pub allowed_attachment_types: Vec<String>,

    /// Maximum size of a single attachment in bytes
    #[serde(default = "default_individual_file_size_limit")]
    pub individual_file_size_bytes_limit: u64,

    /// Maximum size of a whole send request in bytes
    #[serde(default = "default_request_size_limit")]
    pub request_size_bytes_limit: u64,

    /// Provider used when a request names none (both sync and queued paths)
    #[serde(default = "default_email_provider")]
    pub default_email_provider: String,

    /// Hand templates to providers that render them natively
    #[serde(default)]
    pub prefer_native_templating: bool,

    #[serde(default = "default_placeholder_open")]
    pub placeholder_open: String,

    #[serde(default = "default_placeholder_close")]
    pub placeholder_close: String,

    #[serde(default)]
    pub template_cache: TemplateCacheSettings,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            attachment_container_name: default_attachment_container(),
            template_container_name: default_template_container(),
            allowed_attachment_types: default_allowed_attachment_types(),
            individual_file_size_bytes_limit: default_individual_file_size_limit(),
            request_size_bytes_limit: default_request_size_limit(),
            default_email_provider: default_email_provider(),
            prefer_native_templating: false,
            placeholder_open: default_placeholder_open(),
            placeholder_close: default_placeholder_close(),
            template_cache: TemplateCacheSettings::default(),
        }
    }
}

impl NotificationSettings {
    /// Whether `extension` is on the allow-list (case-insensitive).
    pub fn is_allowed_extension(&self, extension: &str) -> bool {
        self.allowed_attachment_types
            .iter()
            .any(|allowed| allowed.trim_start_matches('.').eq_ignore_ascii_case(extension))
    }
}

// ============================================================================
// Storage Configuration
// ============================================================================

/// Blob storage backend type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process-local map, contents are lost on restart
    #[default]
    Memory,
    /// Local directory tree rooted at `storage.root`
    Filesystem,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Root directory for the filesystem backend
    #[serde(default = "default_storage_root")]
    pub root: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            root: default_storage_root(),
        }
    }
}

// ============================================================================
// Bus Configuration
// ============================================================================

/// Message bus backend type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BusBackend {
    /// Events are recorded in-process and logged
    #[default]
    Memory,
    /// Events are appended to a Redis stream
    Redis,
}

/// Redis stream publisher configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedisBusConfig {
    #[serde(default = "default_redis_url")]
    pub url: String,

    /// Stream key events are appended to
    #[serde(default = "default_redis_stream")]
    pub stream: String,

    #[serde(default = "default_redis_pool_size")]
    pub pool_size: u32,

    /// Connection timeout in seconds
    #[serde(default = "default_redis_connection_timeout")]
    pub connection_timeout: u64,

    /// Approximate maximum stream length kept by `XADD MAXLEN ~`
    #[serde(default = "default_redis_max_len")]
    pub max_len: u64,
}

impl Default for RedisBusConfig {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
            stream: default_redis_stream(),
            pool_size: default_redis_pool_size(),
            connection_timeout: default_redis_connection_timeout(),
            max_len: default_redis_max_len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BusConfig {
    #[serde(default)]
    pub backend: BusBackend,

    #[serde(default)]
    pub redis: RedisBusConfig,
}

// ============================================================================
// Provider Configuration
// ============================================================================

/// Provider implementations compiled into the hub
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Log,
    Sendgrid,
    Webhook,
}

impl ProviderKind {
    /// Whether the provider renders templates itself unless told otherwise.
    pub fn native_templating_by_default(&self) -> bool {
        matches!(self, ProviderKind::Sendgrid)
    }
}

/// SendGrid v3 API settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendGridSettings {
    pub api_key: String,

    pub from_email: String,

    #[serde(default)]
    pub from_name: Option<String>,

    #[serde(default = "default_sendgrid_api_url")]
    pub api_url: String,
}

/// Webhook delivery settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookSettings {
    pub url: String,

    #[serde(default = "default_webhook_method")]
    pub method: String,

    #[serde(default)]
    pub headers: std::collections::BTreeMap<String, String>,

    #[serde(default = "default_webhook_timeout")]
    pub timeout_seconds: u64,
}

/// One named provider instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Registry key, matched exactly against the request's provider name
    pub name: String,

    pub kind: ProviderKind,

    /// Overrides the kind's native templating default
    #[serde(default)]
    pub native_templating: Option<bool>,

    #[serde(default)]
    pub sendgrid: Option<SendGridSettings>,

    #[serde(default)]
    pub webhook: Option<WebhookSettings>,
}

impl ProviderConfig {
    /// A `log` provider with the given name.
    pub fn log(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ProviderKind::Log,
            native_templating: None,
            sendgrid: None,
            webhook: None,
        }
    }

    pub fn supports_native_templating(&self) -> bool {
        self.native_templating
            .unwrap_or_else(|| self.kind.native_templating_by_default())
    }
}

fn default_providers() -> Vec<ProviderConfig> {
    vec![ProviderConfig::log(default_email_provider())]
}

// ============================================================================
// Main Settings Structure
// ============================================================================

/// Complete application settings
///
/// This structure represents the entire configuration that can be loaded
/// from TOML files and environment variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub application: ApplicationConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub logger: LoggerSettings,

    #[serde(default)]
    pub notification: NotificationSettings,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub bus: BusConfig,

    #[serde(default = "default_providers")]
    pub providers: Vec<ProviderConfig>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            application: ApplicationConfig::default(),
            server: ServerConfig::default(),
            logger: LoggerSettings::default(),
            notification: NotificationSettings::default(),
            storage: StorageConfig::default(),
            bus: BusConfig::default(),
            providers: default_providers(),
        }
    }
}
