//! Configuration structures for install operations
//!
//! Configuration is passed to constructors explicitly. Durations serialize
//! the way serde renders [`Duration`] (`{secs, nanos}`).

use crate::retry::RetryPolicy;
use fuel_formats::fuel_patch::DEFAULT_BLOCK_SIZE;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default distribution service endpoint
pub const DEFAULT_SDS_URL: &str = "https://sds.amazon.com";

/// User agent the distribution service expects from launcher clients
pub const DEFAULT_USER_AGENT: &str = "com.amazon.agslauncher.win/2.1.6485.3";

/// Key id sent with manifest requests
pub const DEFAULT_KEY_ID: &str = "d5dc8b8b-86c8-4fc4-ae93-18c0def5314d";

/// Download pass configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallConfig {
    /// Maximum number of files processed concurrently
    pub workers: usize,

    /// Block size used by the delta patch engine
    pub patch_block_size: usize,

    /// Interval between progress log lines
    pub progress_interval: Duration,

    /// Cap on delta body downloads per file; `None` retries until the body
    /// hashes correctly or the pass is cancelled
    pub max_patch_attempts: Option<u32>,

    /// Whole-file retries after a checksum mismatch
    pub checksum_retries: u32,

    /// Retries of a body download after a transient HTTP failure
    pub retry: RetryPolicy,

    /// HTTP transport settings
    pub http: HttpConfig,
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            workers: num_cpus::get().max(1),
            patch_block_size: DEFAULT_BLOCK_SIZE,
            progress_interval: Duration::from_secs(1),
            max_patch_attempts: None,
            checksum_retries: 1,
            retry: RetryPolicy::default(),
            http: HttpConfig::default(),
        }
    }
}

impl InstallConfig {
    /// Same configuration with a different worker count (at least one)
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }
}

/// Distribution service client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SdsConfig {
    /// Service base URL; requests go to `{sds_url}/amazon/`
    pub sds_url: String,

    /// User agent sent with every service request
    pub user_agent: String,

    /// Key id sent with manifest requests
    pub key_id: String,

    /// Retries of a service call after a transient failure
    pub retry: RetryPolicy,

    /// HTTP transport settings
    pub http: HttpConfig,
}

impl Default for SdsConfig {
    fn default() -> Self {
        Self {
            sds_url: DEFAULT_SDS_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            key_id: DEFAULT_KEY_ID.to_string(),
            retry: RetryPolicy::default(),
            http: HttpConfig::default(),
        }
    }
}

impl SdsConfig {
    /// Configuration pointing at another service endpoint
    pub fn with_url<S: Into<String>>(url: S) -> Self {
        Self {
            sds_url: url.into(),
            ..Self::default()
        }
    }
}

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Connection pool idle timeout
    pub pool_idle_timeout: Duration,

    /// Maximum idle connections per host
    pub pool_max_idle_per_host: usize,

    /// Connection timeout
    pub connect_timeout: Duration,

    /// Maximum time between two reads of a response body
    pub read_timeout: Duration,

    /// Enable `TCP_NODELAY`
    pub tcp_nodelay: bool,

    /// TCP keep-alive duration
    pub tcp_keepalive: Option<Duration>,

    /// User agent for file storage requests
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            pool_idle_timeout: Duration::from_secs(30),
            pool_max_idle_per_host: 16,
            connect_timeout: Duration::from_secs(10),
            // Bodies can be gigabytes, so only stalls are bounded
            read_timeout: Duration::from_secs(60),
            tcp_nodelay: true,
            tcp_keepalive: Some(Duration::from_secs(60)),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}
