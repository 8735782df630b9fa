//! High-level client

use crate::builder::AlpacaClientBuilder;
use alpaca_rest::RestClient;
use alpaca_types::{Credentials, Feed, OptionsFeed};
use alpaca_ws::{
    AccountStream, ConnectionConfig, CryptoStream, Endpoint, NewsStream, OptionsStream,
    ReconnectConfig, StocksStream,
};
use std::time::Duration;
use tracing::info;

/// High-level client combining REST access and stream construction
///
/// Holds one set of credentials and hands out configured REST and stream
/// handles. Streams are independent connections; creating one does not
/// dial anything until `connect_and_run` is awaited.
///
/// # Example
///
/// ```no_run
/// use alpaca_sdk::AlpacaClient;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = AlpacaClient::builder().build()?;
///
///     let stocks = client.stocks_stream();
///     stocks.subscribe_trades(vec!["AAPL".to_string()])?;
///
///     let mut events = stocks.take_event_receiver().unwrap();
///     tokio::spawn(async move { stocks.connect_and_run().await });
///
///     while let Some(event) = events.recv().await {
///         println!("{:?}", event);
///     }
///
///     Ok(())
/// }
/// ```
pub struct AlpacaClient {
    credentials: Credentials,
    rest: RestClient,
    feed: Feed,
    reconnect: ReconnectConfig,
    connect_timeout: Duration,
}

impl AlpacaClient {
    /// Create a new client builder
    pub fn builder() -> AlpacaClientBuilder {
        AlpacaClientBuilder::new()
    }

    pub(crate) fn from_parts(
        credentials: Credentials,
        rest: RestClient,
        feed: Feed,
        reconnect: ReconnectConfig,
        connect_timeout: Duration,
    ) -> Self {
        info!("Created client (default feed: {})", feed);
        Self {
            credentials,
            rest,
            feed,
            reconnect,
            connect_timeout,
        }
    }

    /// The configured default equities feed
    pub fn feed(&self) -> Feed {
        self.feed
    }

    /// REST client for historical data, news and snapshots
    pub fn rest(&self) -> &RestClient {
        &self.rest
    }

    /// Equities stream on the client's default feed
    pub fn stocks_stream(&self) -> StocksStream {
        StocksStream::with_config(self.stream_config(Endpoint::Stocks(self.feed)))
    }

    /// Crypto stream (US feed)
    pub fn crypto_stream(&self) -> CryptoStream {
        CryptoStream::with_config(self.stream_config(Endpoint::Crypto))
    }

    /// News stream
    pub fn news_stream(&self) -> NewsStream {
        NewsStream::with_config(self.stream_config(Endpoint::News))
    }

    /// Options stream on the given feed
    pub fn options_stream(&self, feed: OptionsFeed) -> OptionsStream {
        OptionsStream::with_config(self.stream_config(Endpoint::Options(feed)))
    }

    /// Account event stream against paper trading
    pub fn account_stream_paper(&self) -> AccountStream {
        AccountStream::paper(self.credentials.clone())
    }

    /// Account event stream against live trading
    pub fn account_stream_live(&self) -> AccountStream {
        AccountStream::live(self.credentials.clone())
    }

    fn stream_config(&self, endpoint: Endpoint) -> ConnectionConfig {
        ConnectionConfig::new(endpoint, self.credentials.clone())
            .with_reconnect(self.reconnect.clone())
            .with_connect_timeout(self.connect_timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alpaca_types::ChannelKind;
    use alpaca_ws::ConnState;

    fn client() -> AlpacaClient {
        AlpacaClient::builder()
            .with_credentials(Credentials::new("AK", "secret").unwrap())
            .with_feed(Feed::Sip)
            .build()
            .unwrap()
    }

    #[test]
    fn test_streams_inherit_client_config() {
        let client = client();
        let stocks = client.stocks_stream();
        assert_eq!(
            stocks.stream().endpoint().url(),
            "wss://stream.data.alpaca.markets/v2/sip"
        );
        assert_eq!(stocks.state(), ConnState::WaitingToConnect);
    }

    #[test]
    fn test_streams_are_independent() {
        let client = client();
        let stocks = client.stocks_stream();
        let crypto = client.crypto_stream();

        stocks.subscribe_trades(vec!["AAPL".to_string()]).unwrap();
        assert!(crypto.subscriptions().is_empty());
        assert_eq!(
            stocks.subscriptions()[&ChannelKind::Trades],
            vec!["AAPL".to_string()]
        );
    }
}
