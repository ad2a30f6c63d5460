//! HTTP transport configuration

use std::time::Duration;

/// Configuration validation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigValidationError {
    /// A required configuration field is missing.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// A timeout value is out of acceptable range.
    #[error("invalid timeout: {0:?}")]
    InvalidTimeout(Duration),
}

/// Configuration for the HTTP client pool.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Idle connection timeout
    pub pool_idle_timeout: Duration,

    /// Maximum idle connections per host
    pub pool_max_idle_per_host: usize,

    /// Request timeout
    pub request_timeout: Duration,

    /// Connection timeout
    pub connect_timeout: Duration,

    /// TCP keepalive interval
    pub tcp_keepalive: Option<Duration>,

    /// User agent string
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            pool_idle_timeout: Duration::from_secs(90),
            pool_max_idle_per_host: 32,
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            tcp_keepalive: Some(Duration::from_secs(60)),
            user_agent: format!("range-harvest/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpConfig {
    /// Create config with custom request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Create config with custom connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Create config with custom pool size.
    ///
    /// Match it to the worker count so every worker keeps a warm connection.
    pub fn with_pool_max_idle(mut self, max_idle: usize) -> Self {
        self.pool_max_idle_per_host = max_idle;
        self
    }

    /// Validate timeouts (1s to 1h for requests, 1s to 5m for connects).
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.request_timeout < Duration::from_secs(1)
            || self.request_timeout > Duration::from_secs(3600)
        {
            return Err(ConfigValidationError::InvalidTimeout(self.request_timeout));
        }
        if self.connect_timeout < Duration::from_secs(1)
            || self.connect_timeout > Duration::from_secs(300)
        {
            return Err(ConfigValidationError::InvalidTimeout(self.connect_timeout));
        }
        if self.user_agent.is_empty() {
            return Err(ConfigValidationError::MissingField("user_agent"));
        }
        Ok(())
    }
}
