//! Check-config command handler
//!
//! Prints the resolved configuration without starting anything.

use crate::config::settings::Settings;
use crate::error::AppResult;

/// Handler for the check-config command
pub struct CheckConfigCommandHandler {
    config: Settings,
}

impl CheckConfigCommandHandler {
    pub fn new(config: Settings) -> Self {
        Self { config }
    }

    /// Validate the configuration and print its summary to stdout.
    pub fn execute(&self) -> AppResult<()> {
        self.config.validate()?;
        for line in self.summary() {
            println!("{}", line);
        }
        Ok(())
    }

    /// One line per setting group. Provider credentials are left out.
    pub fn summary(&self) -> Vec<String> {
        let config = &self.config;
        let notification = &config.notification;

        let mut lines = vec![
            format!(
                "application: {} {}",
                config.application.name, config.application.version
            ),
            format!("server: {}", config.server.address()),
            format!("logger: level={}", config.logger.level),
            format!(
                "attachments: container={} types=[{}] file_limit={}B request_limit={}B",
                notification.attachment_container_name,
                notification.allowed_attachment_types.join(", "),
                notification.individual_file_size_bytes_limit,
                notification.request_size_bytes_limit,
            ),
            format!(
                "templates: container={} placeholders={}..{} native={} cache={}",
                notification.template_container_name,
                notification.placeholder_open,
                notification.placeholder_close,
                notification.prefer_native_templating,
                notification.template_cache.enabled,
            ),
            format!("storage: {:?} root={}", config.storage.backend, config.storage.root),
            format!("bus: {:?}", config.bus.backend),
        ];

        lines.extend(config.providers.iter().map(|provider| {
            let marker = if provider.name == notification.default_email_provider {
                " (default)"
            } else {
                ""
            };
            format!(
                "provider: {} kind={:?} native_templating={}{}",
                provider.name,
                provider.kind,
                provider.supports_native_templating(),
                marker
            )
        }));

        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ProviderConfig, ProviderKind, SendGridSettings};

    #[test]
    fn test_summary_marks_default_provider() {
        let handler = CheckConfigCommandHandler::new(Settings::default());
        let summary = handler.summary();

        assert!(summary.iter().any(|l| l == "server: 127.0.0.1:3000"));
        assert!(
            summary
                .iter()
                .any(|l| l == "provider: log kind=Log native_templating=false (default)")
        );
    }

    #[test]
    fn test_summary_never_prints_secrets() {
        let mut settings = Settings::default();
        settings.providers.push(ProviderConfig {
            sendgrid: Some(SendGridSettings {
                api_key: "SG.secret-key".to_string(),
                from_email: "hub@example.com".to_string(),
                from_name: None,
                api_url: "https://api.sendgrid.com/v3".to_string(),
            }),
            kind: ProviderKind::Sendgrid,
            ..ProviderConfig::log("Sendgrid")
        });

        let summary = CheckConfigCommandHandler::new(settings).summary().join("\n");
        assert!(summary.contains("provider: Sendgrid kind=Sendgrid native_templating=true"));
        assert!(!summary.contains("SG.secret-key"));
    }

    #[test]
    fn test_execute_rejects_invalid_config() {
        let mut settings = Settings::default();
        settings.notification.individual_file_size_bytes_limit = 0;
        assert!(CheckConfigCommandHandler::new(settings).execute().is_err());
    }
}
