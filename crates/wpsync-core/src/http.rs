//! Shared HTTP client construction.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{SyncError, SyncResult};
use crate::retry::RetryConfig;

/// HTTP settings shared by both transports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Connect timeout in seconds
    pub connect_timeout: u64,
    /// Request timeout in seconds
    pub request_timeout: u64,
    /// Whether to verify TLS certificates
    pub verify_tls: bool,
    /// User-Agent override
    pub user_agent: Option<String>,
    pub retry: RetryConfig,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: 10,
            request_timeout: 60,
            verify_tls: true,
            user_agent: None,
            retry: RetryConfig::default(),
        }
    }
}

/// The standard wpsync User-Agent string
pub fn user_agent() -> String {
    format!("wpsync/{}", crate::VERSION)
}

/// Build a client from the given settings
pub fn build_client(config: &HttpConfig) -> SyncResult<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json, text/xml"));

    Client::builder()
        .user_agent(config.user_agent.clone().unwrap_or_else(user_agent))
        .default_headers(headers)
        .connect_timeout(Duration::from_secs(config.connect_timeout))
        .timeout(Duration::from_secs(config.request_timeout))
        .danger_accept_invalid_certs(!config.verify_tls)
        .build()
        .map_err(|e| SyncError::config(format!("Failed to build HTTP client: {}", e)))
}
