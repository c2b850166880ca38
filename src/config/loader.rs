//! Configuration loader for the notification hub
//!
//! This module provides the `ConfigLoader` struct that handles loading
//! configuration from multiple sources with proper precedence.

use std::path::{Path, PathBuf};

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};

use crate::config::environment::Environment as AppEnvironment;
use crate::config::error::ConfigError;
use crate::config::settings::Settings;

/// Environment variable for configuration directory
const CONFIG_DIR_ENV: &str = "HUB_CONFIG_DIR";

/// Environment variable for specific configuration file
const CONFIG_FILE_ENV: &str = "HUB_CONFIG_FILE";

/// Default configuration directory
const DEFAULT_CONFIG_DIR: &str = "config";

/// Environment variable prefix for configuration overrides
const ENV_PREFIX: &str = "HUB";

/// Separator for nested configuration keys in environment variables
const ENV_SEPARATOR: &str = "__";

/// Configuration loader that handles layered configuration loading
///
/// The loader supports the following configuration sources (in order of priority):
/// 1. `default.toml` - Base default configuration (required)
/// 2. `{environment}.toml` - Environment-specific configuration (optional)
/// 3. `local.toml` - Local development overrides (optional)
/// 4. `HUB_*` environment variables (highest priority)
#[derive(Debug)]
pub struct ConfigLoader {
    config_dir: PathBuf,
    /// Specific configuration file path (if set, skips layered loading)
    config_file: Option<PathBuf>,
    environment: AppEnvironment,
}

impl ConfigLoader {
    /// Create a new configuration loader
    ///
    /// This reads environment variables to determine:
    /// - Configuration directory (`HUB_CONFIG_DIR`)
    /// - Specific configuration file (`HUB_CONFIG_FILE`)
    /// - Application environment (`HUB_APP_ENV`)
    ///
    /// # Errors
    ///
    /// Returns an error if both `HUB_CONFIG_DIR` and `HUB_CONFIG_FILE` are set,
    /// as they are mutually exclusive.
    pub fn new() -> Result<Self, ConfigError> {
        let config_dir = std::env::var(CONFIG_DIR_ENV).ok().map(PathBuf::from);
        let config_file = std::env::var(CONFIG_FILE_ENV).ok().map(PathBuf::from);

        if config_file.is_some() && config_dir.is_some() {
            return Err(ConfigError::mutual_exclusivity(
                "HUB_CONFIG_DIR and HUB_CONFIG_FILE cannot both be set. \
                 Use HUB_CONFIG_DIR for layered configuration or \
                 HUB_CONFIG_FILE for a single configuration file.",
            ));
        }

        Ok(Self {
            config_dir: config_dir.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_DIR)),
            config_file,
            environment: AppEnvironment::from_env(),
        })
    }

    /// Load a single file instead of the layered directory.
    pub fn with_config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    /// Override the environment read from `HUB_APP_ENV`.
    pub fn with_environment(mut self, environment: AppEnvironment) -> Self {
        self.environment = environment;
        self
    }

    pub fn environment(&self) -> AppEnvironment {
        self.environment
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Load configuration from all sources
    ///
    /// If a configuration file is set, loads only that file.
    /// Otherwise, performs layered loading from the configuration directory.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `default.toml` is not found (when using layered loading)
    /// - Configuration parsing fails
    /// - Configuration validation fails
    pub fn load(&self) -> Result<Settings, ConfigError> {
        let config = self.build_config()?;
        let settings: Settings = config.try_deserialize().map_err(|e| {
            ConfigError::ParseError(format!("Failed to deserialize configuration: {}", e))
        })?;

        settings.validate()?;

        Ok(settings)
    }

    fn build_config(&self) -> Result<Config, ConfigError> {
        let builder = Config::builder();

        let builder = if let Some(ref config_file) = self.config_file {
            Self::add_file_source(builder, config_file, true)?
        } else {
            self.build_layered_config(builder)?
        };

        // HUB_SERVER__PORT -> server.port
        let builder = Self::add_env_source(builder);

        builder.build().map_err(ConfigError::from)
    }

    fn build_layered_config(
        &self,
        builder: ConfigBuilder<DefaultState>,
    ) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        let default_path = self.config_dir.join("default.toml");
        let builder = Self::add_file_source(builder, &default_path, true)?;

        let env_path = self.config_dir.join(self.environment.overlay_file_name());
        let builder = Self::add_file_source(builder, &env_path, false)?;

        let local_path = self.config_dir.join("local.toml");
        Self::add_file_source(builder, &local_path, false)
    }

    fn add_file_source(
        builder: ConfigBuilder<DefaultState>,
        path: &Path,
        required: bool,
    ) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        if required && !path.exists() {
            return Err(ConfigError::file_not_found(format!(
                "Required configuration file not found: {}",
                path.display()
            )));
        }

        let Some(path) = path.to_str() else {
            return Err(ConfigError::ParseError(format!(
                "Configuration path is not valid UTF-8: {}",
                path.display()
            )));
        };

        Ok(builder.add_source(File::new(path, FileFormat::Toml).required(required)))
    }

    /// Environment variables with prefix `HUB_` are mapped to configuration keys.
    /// Double underscores (`__`) separate nested keys:
    /// - `HUB_SERVER__PORT` -> `server.port`
    /// - `HUB_NOTIFICATION__DEFAULT_EMAIL_PROVIDER` -> `notification.default_email_provider`
    fn add_env_source(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
        builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator(ENV_SEPARATOR)
                .ignore_empty(true)
                .try_parsing(true),
        )
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new().unwrap_or_else(|_| Self {
            config_dir: PathBuf::from(DEFAULT_CONFIG_DIR),
            config_file: None,
            environment: AppEnvironment::default(),
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Serialises tests that touch process environment variables.
    pub(crate) static TEST_MUTEX: Mutex<()> = Mutex::new(());

    fn setup_config_dir(files: &[(&str, &str)]) -> TempDir {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        for (name, content) in files {
            fs::write(temp_dir.path().join(name), content).expect("Failed to write config file");
        }
        temp_dir
    }

    /// Restores every touched environment variable on drop.
    pub(crate) struct EnvGuard {
        vars_to_restore: Vec<(String, Option<String>)>,
    }

    impl EnvGuard {
        pub(crate) fn new() -> Self {
            Self {
                vars_to_restore: Vec::new(),
            }
        }

        pub(crate) fn set(&mut self, key: &str, value: &str) {
            self.vars_to_restore
                .push((key.to_string(), std::env::var(key).ok()));
            unsafe {
                std::env::set_var(key, value);
            }
        }

        pub(crate) fn remove(&mut self, key: &str) {
            self.vars_to_restore
                .push((key.to_string(), std::env::var(key).ok()));
            unsafe {
                std::env::remove_var(key);
            }
        }

        pub(crate) fn clear_hub_vars(&mut self) {
            let keys: Vec<String> = std::env::vars()
                .map(|(key, _)| key)
                .filter(|key| key.starts_with("HUB_"))
                .collect();
            for key in keys {
                self.remove(&key);
            }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for (key, original_value) in self.vars_to_restore.iter().rev() {
                unsafe {
                    match original_value {
                        Some(value) => std::env::set_var(key, value),
                        None => std::env::remove_var(key),
                    }
                }
            }
        }
    }

    const DEFAULT_CONFIG: &str = r#"
[application]
name = "test-hub"
version = "1.0.0"

[server]
host = "127.0.0.1"
port = 3000

[logger]
level = "info"

[notification]
allowed_attachment_types = ["pdf", "txt"]
default_email_provider = "log"

[[providers]]
name = "log"
kind = "log"
"#;

    #[test]
    fn test_config_loader_new_default() {
        let _guard = TEST_MUTEX.lock().unwrap();
        let mut env = EnvGuard::new();
        env.clear_hub_vars();

        let loader = ConfigLoader::new().expect("Should create loader");
        assert_eq!(loader.config_dir(), Path::new("config"));
        assert!(loader.config_file.is_none());
        assert_eq!(loader.environment(), AppEnvironment::Development);
    }

    #[test]
    fn test_config_loader_mutual_exclusivity_error() {
        let _guard = TEST_MUTEX.lock().unwrap();
        let mut env = EnvGuard::new();
        env.set("HUB_CONFIG_DIR", "/custom/config");
        env.set("HUB_CONFIG_FILE", "/path/to/config.toml");

        match ConfigLoader::new() {
            Err(ConfigError::MutualExclusivityError(msg)) => {
                assert!(msg.contains("HUB_CONFIG_DIR"));
                assert!(msg.contains("HUB_CONFIG_FILE"));
            }
            other => panic!("Expected MutualExclusivityError, got {:?}", other),
        }
    }

    #[test]
    fn test_config_loader_environment_from_env() {
        let _guard = TEST_MUTEX.lock().unwrap();
        let mut env = EnvGuard::new();
        env.clear_hub_vars();
        env.set("HUB_APP_ENV", "production");

        let loader = ConfigLoader::new().expect("Should create loader");
        assert_eq!(loader.environment(), AppEnvironment::Production);

        let loader = loader.with_environment(AppEnvironment::Test);
        assert_eq!(loader.environment(), AppEnvironment::Test);
    }

    #[test]
    fn test_load_missing_default_toml() {
        let _guard = TEST_MUTEX.lock().unwrap();
        let mut env = EnvGuard::new();
        env.clear_hub_vars();
        let temp_dir = setup_config_dir(&[]);
        env.set("HUB_CONFIG_DIR", temp_dir.path().to_str().unwrap());

        let result = ConfigLoader::new().unwrap().load();
        match result {
            Err(ConfigError::FileNotFound(msg)) => assert!(msg.contains("default.toml")),
            other => panic!("Expected FileNotFound error, got {:?}", other),
        }
    }

    #[test]
    fn test_load_full_precedence_chain() {
        let _guard = TEST_MUTEX.lock().unwrap();
        let mut env = EnvGuard::new();
        env.clear_hub_vars();

        let development_config = r#"
[application]
name = "dev-hub"

[server]
port = 3001

[notification]
individual_file_size_bytes_limit = 2048
"#;

        let local_config = r#"
[server]
port = 3002

[notification]
individual_file_size_bytes_limit = 4096
"#;

        let temp_dir = setup_config_dir(&[
            ("default.toml", DEFAULT_CONFIG),
            ("development.toml", development_config),
            ("local.toml", local_config),
        ]);
        env.set("HUB_CONFIG_DIR", temp_dir.path().to_str().unwrap());
        env.set("HUB_SERVER__PORT", "3003");

        let settings = ConfigLoader::new().unwrap().load().expect("Should load settings");

        assert_eq!(settings.server.port, 3003);
        assert_eq!(settings.notification.individual_file_size_bytes_limit, 4096);
        assert_eq!(settings.application.name, "dev-hub");
        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.notification.allowed_attachment_types, vec!["pdf", "txt"]);
    }

    #[test]
    fn test_env_var_overrides_nested_notification_key() {
        let _guard = TEST_MUTEX.lock().unwrap();
        let mut env = EnvGuard::new();
        env.clear_hub_vars();

        let temp_dir = setup_config_dir(&[("default.toml", DEFAULT_CONFIG)]);
        env.set("HUB_CONFIG_DIR", temp_dir.path().to_str().unwrap());
        env.set("HUB_NOTIFICATION__PREFER_NATIVE_TEMPLATING", "true");
        env.set("HUB_NOTIFICATION__PLACEHOLDER_OPEN", "[[");

        let settings = ConfigLoader::new().unwrap().load().expect("Should load settings");
        assert!(settings.notification.prefer_native_templating);
        assert_eq!(settings.notification.placeholder_open, "[[");
        assert_eq!(settings.notification.placeholder_close, "}}");
    }

    #[test]
    fn test_load_single_file_mode() {
        let _guard = TEST_MUTEX.lock().unwrap();
        let mut env = EnvGuard::new();
        env.clear_hub_vars();

        let single_config = r#"
[server]
port = 5000

[notification]
default_email_provider = "hook"

[[providers]]
name = "hook"
kind = "webhook"

[providers.webhook]
url = "https://hooks.example.com/mail"
"#;
        let temp_dir = setup_config_dir(&[("single.toml", single_config)]);

        let settings = ConfigLoader::new()
            .unwrap()
            .with_config_file(temp_dir.path().join("single.toml"))
            .load()
            .expect("Should load settings");

        assert_eq!(settings.server.port, 5000);
        assert_eq!(settings.providers.len(), 1);
        assert_eq!(settings.providers[0].name, "hook");
        let webhook = settings.providers[0].webhook.as_ref().unwrap();
        assert_eq!(webhook.method, "POST");
    }

    #[test]
    fn test_load_rejects_invalid_settings() {
        let _guard = TEST_MUTEX.lock().unwrap();
        let mut env = EnvGuard::new();
        env.clear_hub_vars();

        let temp_dir = setup_config_dir(&[("default.toml", DEFAULT_CONFIG)]);
        env.set("HUB_CONFIG_DIR", temp_dir.path().to_str().unwrap());
        env.set("HUB_NOTIFICATION__DEFAULT_EMAIL_PROVIDER", "Sendgrid");

        let err = ConfigLoader::new().unwrap().load().unwrap_err();
        assert_eq!(err.field(), Some("notification.default_email_provider"));
    }

    #[test]
    fn test_optional_files_not_required() {
        let _guard = TEST_MUTEX.lock().unwrap();
        let mut env = EnvGuard::new();
        env.clear_hub_vars();

        let temp_dir = setup_config_dir(&[("default.toml", DEFAULT_CONFIG)]);
        env.set("HUB_CONFIG_DIR", temp_dir.path().to_str().unwrap());
        env.set("HUB_APP_ENV", "staging");

        let settings = ConfigLoader::new().unwrap().load().expect("Should load settings");
        assert_eq!(settings.application.name, "test-hub");
    }
}
