use std::sync::LazyLock;
use std::time::Duration;

/// User-Agent sent with every outbound provider request
pub const USER_AGENT: &str = concat!("notification-hub/", env!("CARGO_PKG_VERSION"));

/// Global HTTP client shared by every HTTP-backed email provider.
///
/// Initialized lazily on first access so connection pools are reused across
/// providers. Individual requests may override the 30s default timeout.
pub static HTTP_CLIENT: LazyLock<reqwest::Client> = LazyLock::new(|| {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .pool_max_idle_per_host(10)
        .pool_idle_timeout(Duration::from_secs(90))
        .http2_adaptive_window(true)
        .gzip(true)
        .deflate(true)
        .brotli(true)
        .zstd(true)
        .user_agent(USER_AGENT)
        .build()
        .unwrap_or_else(|error| {
            tracing::warn!(error = %error, "Falling back to default HTTP client configuration");
            reqwest::Client::new()
        })
});
