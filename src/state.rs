//! Application state for Axum web framework.
//!
//! Contains shared services and resources that are accessible
//! across all request handlers.

use std::sync::Arc;

use crate::config::Settings;
use crate::error::AppResult;
use crate::services::Services;

/// Application state containing all shared services and resources.
///
/// This struct is designed to be used with Axum's State extractor.
/// Cloning is cheap since services and settings are shared behind `Arc`s.
#[derive(Clone)]
pub struct AppState {
    /// All business logic services
    pub services: Services,
    /// Effective configuration the server was started with
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(services: Services, settings: Settings) -> Self {
        Self {
            services,
            settings: Arc::new(settings),
        }
    }

    /// Builds every adapter named in `settings` and wraps them in state.
    ///
    /// # Example
    /// ```ignore
    /// let state = AppState::from_settings(settings).await?;
    /// let router = create_router(state);
    /// ```
    pub async fn from_settings(settings: Settings) -> AppResult<Self> {
        let services = Services::from_settings(&settings).await?;
        Ok(Self::new(services, settings))
    }
}
