//! Client builder
//!
//! Fluent configuration for the SDK client with validation up front, so a
//! bad configuration fails at build time instead of on the first request.
//!
//! # Example
//!
//! ```
//! use alpaca_sdk::builder::AlpacaClientBuilder;
//! use alpaca_types::{Credentials, Feed};
//!
//! let client = AlpacaClientBuilder::new()
//!     .with_credentials(Credentials::new("AK...", "secret").unwrap())
//!     .with_feed(Feed::Iex)
//!     .build()
//!     .unwrap();
//! ```

use crate::client::AlpacaClient;
use alpaca_rest::{ClientConfig, RestClient};
use alpaca_types::{AlpacaError, Credentials, Feed};
use alpaca_ws::ReconnectConfig;
use std::time::Duration;

/// Configuration validation error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// No credentials provided and none found in the environment
    #[error("credentials are required: pass them explicitly or set APCA_API_KEY_ID / APCA_API_SECRET_KEY")]
    MissingCredentials,

    /// Credential values rejected
    #[error("invalid credentials: {0}")]
    InvalidCredentials(#[from] AlpacaError),

    /// Timeout too short
    #[error("connection timeout must be at least 1 second")]
    TimeoutTooShort,
}

/// Builder for configuring an [`AlpacaClient`]
#[derive(Debug, Clone, Default)]
pub struct AlpacaClientBuilder {
    /// API credentials; falls back to the environment when unset
    credentials: Option<Credentials>,
    /// Default equities feed for streams created by the client
    feed: Feed,
    /// Reconnection policy for streams created by the client
    reconnect: ReconnectConfig,
    /// Transport dial timeout
    connect_timeout: Option<Duration>,
    /// REST base URL override, e.g. the sandbox
    data_url: Option<String>,
}

impl AlpacaClientBuilder {
    /// Create a builder with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set explicit credentials
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Set the default equities feed
    pub fn with_feed(mut self, feed: Feed) -> Self {
        self.feed = feed;
        self
    }

    /// Set the reconnection policy
    pub fn with_reconnect(mut self, config: ReconnectConfig) -> Self {
        self.reconnect = config;
        self
    }

    /// Disable automatic reconnection
    pub fn without_reconnect(mut self) -> Self {
        self.reconnect = ReconnectConfig::disabled();
        self
    }

    /// Set the transport dial timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Point REST requests at a different base URL
    pub fn with_data_url(mut self, url: impl Into<String>) -> Self {
        self.data_url = Some(url.into());
        self
    }

    /// Validate the configuration and build the client
    ///
    /// No network activity happens here; streams connect when run and the
    /// REST client connects per request.
    pub fn build(self) -> Result<AlpacaClient, ConfigError> {
        if let Some(timeout) = self.connect_timeout {
            if timeout < Duration::from_secs(1) {
                return Err(ConfigError::TimeoutTooShort);
            }
        }

        let credentials = match self.credentials {
            Some(credentials) => credentials,
            None => Credentials::from_env().map_err(|_| ConfigError::MissingCredentials)?,
        };

        let mut rest_config = ClientConfig::new(credentials.clone());
        if let Some(url) = self.data_url {
            rest_config = rest_config.with_data_url(url);
        }

        Ok(AlpacaClient::from_parts(
            credentials,
            RestClient::with_config(rest_config),
            self.feed,
            self.reconnect,
            self.connect_timeout.unwrap_or(Duration::from_secs(10)),
        ))
    }
}
