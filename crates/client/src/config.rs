//! Client configuration.

use std::time::Duration;

/// Session token lifecycle tuning.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Assumed token lifetime when the server does not report one.
    pub token_lifetime: Duration,
    /// Refresh proactively once the token is this close to expiry.
    pub refresh_margin: Duration,
    /// How often the background refresh task re-checks expiry.
    pub refresh_check_interval: Duration,
    /// Keychain service name under which credentials are stored.
    pub keychain_service: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_lifetime: Duration::from_secs(60 * 60),
            refresh_margin: Duration::from_secs(10 * 60),
            refresh_check_interval: Duration::from_secs(60),
            keychain_service: "Mariner.credentials".to_string(),
        }
    }
}

impl AuthConfig {
    /// Age at which a token counts as near expiry.
    #[must_use]
    pub fn near_expiry_age(&self) -> Duration {
        self.token_lifetime.saturating_sub(self.refresh_margin)
    }
}

/// HTTP transport tuning.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub user_agent: String,
    pub pool_max_idle_per_host: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            user_agent: format!("Mariner/{}", env!("CARGO_PKG_VERSION")),
            pool_max_idle_per_host: 4,
        }
    }
}
