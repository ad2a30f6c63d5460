//! Shared HTTP client with connection pooling

use reqwest::Client;

use crate::config::HttpConfig;

/// Shared HTTP client with connection pooling.
///
/// Every worker queries the same host, so idle connections are reused
/// across range queries.
#[derive(Debug, Clone)]
pub struct HttpClientPool {
    /// The underlying reqwest client
    client: Client,

    /// Configuration used to create this pool
    config: HttpConfig,
}

impl HttpClientPool {
    /// Create a new HTTP client pool with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &HttpConfig) -> Result<Self, reqwest::Error> {
        let mut builder = Client::builder()
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent);

        if let Some(keepalive) = config.tcp_keepalive {
            builder = builder.tcp_keepalive(keepalive);
        }

        let client = builder.build()?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    /// Get a reference to the underlying HTTP client.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Get the configuration for this pool.
    pub fn config(&self) -> &HttpConfig {
        &self.config
    }
}
