//! Name-keyed provider lookup.

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::{ProviderConfig, ProviderKind};
use crate::error::{AppError, AppResult};

use super::{EmailProvider, LogProvider, SendGridProvider, WebhookProvider};

/// Immutable map from provider name to implementation.
///
/// Built once at startup; cloning shares the same map.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: Arc<HashMap<String, Arc<dyn EmailProvider>>>,
}

impl ProviderRegistry {
    /// Registers the given providers, rejecting duplicate names.
    pub fn new(providers: Vec<Arc<dyn EmailProvider>>) -> AppResult<Self> {
        let mut map: HashMap<String, Arc<dyn EmailProvider>> =
            HashMap::with_capacity(providers.len());
        for provider in providers {
            let name = provider.name().to_string();
            if map.contains_key(&name) {
                return Err(AppError::Configuration {
                    key: "providers".to_string(),
                    source: anyhow::anyhow!("Duplicate provider name '{}'", name),
                });
            }
            map.insert(name, provider);
        }
        Ok(Self {
            providers: Arc::new(map),
        })
    }

    /// Builds every configured provider.
    pub fn from_config(configs: &[ProviderConfig]) -> AppResult<Self> {
        let providers = configs
            .iter()
            .map(build_provider)
            .collect::<AppResult<Vec<_>>>()?;
        Self::new(providers)
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn EmailProvider>> {
        self.providers.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.providers.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.providers.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

fn build_provider(config: &ProviderConfig) -> AppResult<Arc<dyn EmailProvider>> {
    let native = config.supports_native_templating();
    let missing = |table: &str| AppError::Configuration {
        key: format!("providers.{}", table),
        source: anyhow::anyhow!(
            "Provider '{}' of kind {} requires a [{}] table",
            config.name,
            table,
            table
        ),
    };

    let provider: Arc<dyn EmailProvider> = match config.kind {
        ProviderKind::Log => Arc::new(LogProvider::new(&config.name, native)),
        ProviderKind::Sendgrid => {
            let settings = config.sendgrid.clone().ok_or_else(|| missing("sendgrid"))?;
            Arc::new(SendGridProvider::new(&config.name, settings, native))
        }
        ProviderKind::Webhook => {
            let settings = config.webhook.clone().ok_or_else(|| missing("webhook"))?;
            Arc::new(WebhookProvider::new(&config.name, settings, native))
        }
    };

    tracing::debug!(
        provider = %config.name,
        kind = ?config.kind,
        native_templating = native,
        "Provider registered"
    );
    Ok(provider)
}
