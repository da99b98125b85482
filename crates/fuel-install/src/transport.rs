//! HTTP transport shared by the service client and file downloads
//!
//! One pooled [`reqwest::Client`] is built per configuration and cloned
//! cheaply into every worker.

use crate::config::HttpConfig;
use crate::error::InstallResult;
use reqwest::{Client, ClientBuilder};
use std::sync::Arc;

/// HTTP client with pooled connections
#[derive(Clone, Debug)]
pub struct HttpClient {
    client: Arc<Client>,
}

impl HttpClient {
    /// Create a client with default settings
    pub fn new() -> InstallResult<Self> {
        Self::with_config(&HttpConfig::default())
    }

    /// Create a client with custom settings
    pub fn with_config(config: &HttpConfig) -> InstallResult<Self> {
        let client = ClientBuilder::new()
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .connect_timeout(config.connect_timeout)
            .read_timeout(config.read_timeout)
            .tcp_nodelay(config.tcp_nodelay)
            .tcp_keepalive(config.tcp_keepalive)
            .use_rustls_tls()
            .redirect(reqwest::redirect::Policy::limited(5))
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self {
            client: Arc::new(client),
        })
    }

    /// Get the underlying reqwest client
    pub fn inner(&self) -> &Client {
        &self.client
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_pool() {
        let client = HttpClient::new().unwrap();
        let clone = client.clone();
        assert!(Arc::ptr_eq(&client.client, &clone.client));
    }
}
