//! HTTP client for the market data API

use crate::error::{RestError, RestResult};
use alpaca_types::Credentials;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

/// Default request timeout
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Production market data base URL
pub const DATA_URL: &str = "https://data.alpaca.markets";

/// Sandbox market data base URL
pub const SANDBOX_DATA_URL: &str = "https://data.sandbox.alpaca.markets";

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API credentials
    pub credentials: Credentials,
    /// Base URL for market data requests
    pub data_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// User agent header
    pub user_agent: Option<String>,
}

impl ClientConfig {
    /// Create a config against the production data API
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            data_url: DATA_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: None,
        }
    }

    /// Point at a different base URL, e.g. the sandbox
    pub fn with_data_url(mut self, url: impl Into<String>) -> Self {
        self.data_url = url.into();
        self
    }

    /// Set the request timeout
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// Market data REST client
///
/// # Example
///
/// ```no_run
/// use alpaca_rest::RestClient;
/// use alpaca_types::Credentials;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = RestClient::new(Credentials::from_env()?);
///     let snapshots = client.stock_snapshots(&["AAPL".to_string()]).await?;
///     println!("{:?}", snapshots.get("AAPL"));
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct RestClient {
    http_client: Client,
    credentials: Credentials,
    data_url: String,
}

impl RestClient {
    /// Create a client against the production data API
    pub fn new(credentials: Credentials) -> Self {
        Self::with_config(ClientConfig::new(credentials))
    }

    /// Create a client with custom configuration
    pub fn with_config(config: ClientConfig) -> Self {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.as_deref().unwrap_or("alpaca-rest/0.1.0"))
            .build()
            .expect("Failed to create HTTP client");

        info!("Created market data REST client for {}", config.data_url);

        Self {
            http_client,
            credentials: config.credentials,
            data_url: config.data_url,
        }
    }

    /// The configured base URL
    pub fn data_url(&self) -> &str {
        &self.data_url
    }

    /// GET a path under the data base URL and parse the JSON body
    ///
    /// Non-2xx responses become [`RestError::Status`] carrying the API's
    /// `message` field when the body has one.
    pub(crate) async fn get_json(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> RestResult<Value> {
        let url = format!("{}{}", self.data_url, path);
        debug!("GET {} ({} query params)", url, query.len());

        let mut request = self.http_client.get(&url).query(query);
        for (name, value) in self.credentials.rest_headers() {
            request = request.header(name, value);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| v.get("message").and_then(Value::as_str).map(String::from))
                .unwrap_or(body);
            return Err(RestError::Status {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }
}
