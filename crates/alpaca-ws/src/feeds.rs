//! Typed facades over [`DataStream`], one per market data endpoint
//!
//! Each facade wraps a connection and exposes only the channel kinds its
//! endpoint actually serves, so subscribing to an unavailable kind is a
//! compile-time non-option instead of a runtime error. The generic
//! [`DataStream::subscribe`] remains reachable through [`stream()`] for
//! anything unusual.
//!
//! [`stream()`]: StocksStream::stream

use crate::connection::{ConnState, ConnectionConfig, DataStream};
use crate::endpoint::Endpoint;
use crate::events::Event;
use crate::reconnect::ReconnectConfig;

use alpaca_types::{ChannelKind, Credentials, Feed, OptionsFeed, StreamResult};
use std::collections::BTreeMap;
use tokio::sync::mpsc;

macro_rules! delegate_common {
    () => {
        /// Connect and run until disconnect; reconnects per policy
        pub async fn connect_and_run(&self) -> StreamResult<()> {
            self.stream.connect_and_run().await
        }

        /// Request disconnect and suppress any pending reconnect
        pub fn disconnect(&self) {
            self.stream.disconnect()
        }

        /// Current connection state
        pub fn state(&self) -> ConnState {
            self.stream.state()
        }

        /// Take the event receiver (can only be called once)
        pub fn take_event_receiver(&self) -> Option<mpsc::UnboundedReceiver<Event>> {
            self.stream.take_event_receiver()
        }

        /// Snapshot of tracked subscriptions
        pub fn subscriptions(&self) -> BTreeMap<ChannelKind, Vec<String>> {
            self.stream.subscriptions()
        }

        /// The underlying connection, for generic operations
        pub fn stream(&self) -> &DataStream {
            &self.stream
        }
    };
}

/// Equities market data stream
pub struct StocksStream {
    stream: DataStream,
}

impl StocksStream {
    /// Create a stream for the given feed with default settings
    pub fn new(feed: Feed, credentials: Credentials) -> Self {
        Self::with_config(ConnectionConfig::new(Endpoint::Stocks(feed), credentials))
    }

    /// Create a stream against the sandbox environment
    pub fn sandbox(feed: Feed, credentials: Credentials) -> Self {
        Self::with_config(ConnectionConfig::new(
            Endpoint::StocksSandbox(feed),
            credentials,
        ))
    }

    /// Create a stream with full configuration control
    pub fn with_config(config: ConnectionConfig) -> Self {
        Self {
            stream: DataStream::new(config),
        }
    }

    /// Create a stream with a custom reconnect policy
    pub fn with_reconnect(feed: Feed, credentials: Credentials, reconnect: ReconnectConfig) -> Self {
        Self::with_config(
            ConnectionConfig::new(Endpoint::Stocks(feed), credentials).with_reconnect(reconnect),
        )
    }

    delegate_common!();

    /// Subscribe to trades for the given symbols
    pub fn subscribe_trades(&self, symbols: Vec<String>) -> StreamResult<()> {
        self.stream.subscribe(ChannelKind::Trades, symbols)
    }

    /// Subscribe to NBBO quotes for the given symbols
    pub fn subscribe_quotes(&self, symbols: Vec<String>) -> StreamResult<()> {
        self.stream.subscribe(ChannelKind::Quotes, symbols)
    }

    /// Subscribe to minute bars for the given symbols
    pub fn subscribe_bars(&self, symbols: Vec<String>) -> StreamResult<()> {
        self.stream.subscribe(ChannelKind::Bars, symbols)
    }

    /// Subscribe to corrections of previously emitted bars
    pub fn subscribe_updated_bars(&self, symbols: Vec<String>) -> StreamResult<()> {
        self.stream.subscribe(ChannelKind::UpdatedBars, symbols)
    }

    /// Subscribe to daily bars for the given symbols
    pub fn subscribe_daily_bars(&self, symbols: Vec<String>) -> StreamResult<()> {
        self.stream.subscribe(ChannelKind::DailyBars, symbols)
    }

    /// Subscribe to trading status changes
    pub fn subscribe_statuses(&self, symbols: Vec<String>) -> StreamResult<()> {
        self.stream.subscribe(ChannelKind::Statuses, symbols)
    }

    /// Subscribe to limit-up / limit-down bands
    pub fn subscribe_lulds(&self, symbols: Vec<String>) -> StreamResult<()> {
        self.stream.subscribe(ChannelKind::Lulds, symbols)
    }

    /// Subscribe to trade cancel errors
    pub fn subscribe_cancel_errors(&self, symbols: Vec<String>) -> StreamResult<()> {
        self.stream.subscribe(ChannelKind::CancelErrors, symbols)
    }

    /// Subscribe to trade corrections
    pub fn subscribe_corrections(&self, symbols: Vec<String>) -> StreamResult<()> {
        self.stream.subscribe(ChannelKind::Corrections, symbols)
    }

    /// Unsubscribe from trades
    pub fn unsubscribe_trades(&self, symbols: Vec<String>) -> StreamResult<()> {
        self.stream.unsubscribe(ChannelKind::Trades, symbols)
    }

    /// Unsubscribe from quotes
    pub fn unsubscribe_quotes(&self, symbols: Vec<String>) -> StreamResult<()> {
        self.stream.unsubscribe(ChannelKind::Quotes, symbols)
    }

    /// Unsubscribe from minute bars
    pub fn unsubscribe_bars(&self, symbols: Vec<String>) -> StreamResult<()> {
        self.stream.unsubscribe(ChannelKind::Bars, symbols)
    }

    /// Unsubscribe from updated bars
    pub fn unsubscribe_updated_bars(&self, symbols: Vec<String>) -> StreamResult<()> {
        self.stream.unsubscribe(ChannelKind::UpdatedBars, symbols)
    }

    /// Unsubscribe from daily bars
    pub fn unsubscribe_daily_bars(&self, symbols: Vec<String>) -> StreamResult<()> {
        self.stream.unsubscribe(ChannelKind::DailyBars, symbols)
    }

    /// Unsubscribe from trading statuses
    pub fn unsubscribe_statuses(&self, symbols: Vec<String>) -> StreamResult<()> {
        self.stream.unsubscribe(ChannelKind::Statuses, symbols)
    }

    /// Unsubscribe from LULD bands
    pub fn unsubscribe_lulds(&self, symbols: Vec<String>) -> StreamResult<()> {
        self.stream.unsubscribe(ChannelKind::Lulds, symbols)
    }

    /// Unsubscribe from cancel errors
    pub fn unsubscribe_cancel_errors(&self, symbols: Vec<String>) -> StreamResult<()> {
        self.stream.unsubscribe(ChannelKind::CancelErrors, symbols)
    }

    /// Unsubscribe from corrections
    pub fn unsubscribe_corrections(&self, symbols: Vec<String>) -> StreamResult<()> {
        self.stream.unsubscribe(ChannelKind::Corrections, symbols)
    }
}

/// Crypto market data stream (US feed)
pub struct CryptoStream {
    stream: DataStream,
}

impl CryptoStream {
    /// Create a crypto stream with default settings
    pub fn new(credentials: Credentials) -> Self {
        Self::with_config(ConnectionConfig::new(Endpoint::Crypto, credentials))
    }

    /// Create a stream with full configuration control
    pub fn with_config(config: ConnectionConfig) -> Self {
        Self {
            stream: DataStream::new(config),
        }
    }

    delegate_common!();

    /// Subscribe to trades for the given pairs (e.g. "BTC/USD")
    pub fn subscribe_trades(&self, symbols: Vec<String>) -> StreamResult<()> {
        self.stream.subscribe(ChannelKind::Trades, symbols)
    }

    /// Subscribe to quotes for the given pairs
    pub fn subscribe_quotes(&self, symbols: Vec<String>) -> StreamResult<()> {
        self.stream.subscribe(ChannelKind::Quotes, symbols)
    }

    /// Subscribe to minute bars for the given pairs
    pub fn subscribe_bars(&self, symbols: Vec<String>) -> StreamResult<()> {
        self.stream.subscribe(ChannelKind::Bars, symbols)
    }

    /// Subscribe to corrections of previously emitted bars
    pub fn subscribe_updated_bars(&self, symbols: Vec<String>) -> StreamResult<()> {
        self.stream.subscribe(ChannelKind::UpdatedBars, symbols)
    }

    /// Subscribe to daily bars for the given pairs
    pub fn subscribe_daily_bars(&self, symbols: Vec<String>) -> StreamResult<()> {
        self.stream.subscribe(ChannelKind::DailyBars, symbols)
    }

    /// Subscribe to orderbook snapshots and deltas
    pub fn subscribe_orderbooks(&self, symbols: Vec<String>) -> StreamResult<()> {
        self.stream.subscribe(ChannelKind::Orderbooks, symbols)
    }

    /// Unsubscribe from trades
    pub fn unsubscribe_trades(&self, symbols: Vec<String>) -> StreamResult<()> {
        self.stream.unsubscribe(ChannelKind::Trades, symbols)
    }

    /// Unsubscribe from quotes
    pub fn unsubscribe_quotes(&self, symbols: Vec<String>) -> StreamResult<()> {
        self.stream.unsubscribe(ChannelKind::Quotes, symbols)
    }

    /// Unsubscribe from minute bars
    pub fn unsubscribe_bars(&self, symbols: Vec<String>) -> StreamResult<()> {
        self.stream.unsubscribe(ChannelKind::Bars, symbols)
    }

    /// Unsubscribe from updated bars
    pub fn unsubscribe_updated_bars(&self, symbols: Vec<String>) -> StreamResult<()> {
        self.stream.unsubscribe(ChannelKind::UpdatedBars, symbols)
    }

    /// Unsubscribe from daily bars
    pub fn unsubscribe_daily_bars(&self, symbols: Vec<String>) -> StreamResult<()> {
        self.stream.unsubscribe(ChannelKind::DailyBars, symbols)
    }

    /// Unsubscribe from orderbooks
    pub fn unsubscribe_orderbooks(&self, symbols: Vec<String>) -> StreamResult<()> {
        self.stream.unsubscribe(ChannelKind::Orderbooks, symbols)
    }
}

/// News stream
pub struct NewsStream {
    stream: DataStream,
}

impl NewsStream {
    /// Create a news stream with default settings
    pub fn new(credentials: Credentials) -> Self {
        Self::with_config(ConnectionConfig::new(Endpoint::News, credentials))
    }

    /// Create a stream with full configuration control
    pub fn with_config(config: ConnectionConfig) -> Self {
        Self {
            stream: DataStream::new(config),
        }
    }

    delegate_common!();

    /// Subscribe to news for the given symbols; `"*"` subscribes to all
    pub fn subscribe_news(&self, symbols: Vec<String>) -> StreamResult<()> {
        self.stream.subscribe(ChannelKind::News, symbols)
    }

    /// Unsubscribe from news
    pub fn unsubscribe_news(&self, symbols: Vec<String>) -> StreamResult<()> {
        self.stream.unsubscribe(ChannelKind::News, symbols)
    }
}

/// Options market data stream
pub struct OptionsStream {
    stream: DataStream,
}

impl OptionsStream {
    /// Create an options stream for the given feed with default settings
    pub fn new(feed: OptionsFeed, credentials: Credentials) -> Self {
        Self::with_config(ConnectionConfig::new(Endpoint::Options(feed), credentials))
    }

    /// Create a stream with full configuration control
    pub fn with_config(config: ConnectionConfig) -> Self {
        Self {
            stream: DataStream::new(config),
        }
    }

    delegate_common!();

    /// Subscribe to trades for the given contract symbols
    pub fn subscribe_trades(&self, symbols: Vec<String>) -> StreamResult<()> {
        self.stream.subscribe(ChannelKind::Trades, symbols)
    }

    /// Subscribe to quotes for the given contract symbols
    pub fn subscribe_quotes(&self, symbols: Vec<String>) -> StreamResult<()> {
        self.stream.subscribe(ChannelKind::Quotes, symbols)
    }

    /// Unsubscribe from trades
    pub fn unsubscribe_trades(&self, symbols: Vec<String>) -> StreamResult<()> {
        self.stream.unsubscribe(ChannelKind::Trades, symbols)
    }

    /// Unsubscribe from quotes
    pub fn unsubscribe_quotes(&self, symbols: Vec<String>) -> StreamResult<()> {
        self.stream.unsubscribe(ChannelKind::Quotes, symbols)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alpaca_types::AlpacaError;

    fn credentials() -> Credentials {
        Credentials::new("AK", "secret").unwrap()
    }

    #[test]
    fn test_stocks_facade_tracks_state() {
        let stream = StocksStream::new(Feed::Iex, credentials());
        stream.subscribe_trades(vec!["AAPL".to_string()]).unwrap();
        stream.subscribe_lulds(vec!["AAPL".to_string()]).unwrap();

        let subs = stream.subscriptions();
        assert_eq!(subs.len(), 2);
        assert_eq!(subs[&ChannelKind::Trades], vec!["AAPL".to_string()]);
    }

    #[test]
    fn test_crypto_facade_allows_orderbooks() {
        let stream = CryptoStream::new(credentials());
        stream
            .subscribe_orderbooks(vec!["BTC/USD".to_string()])
            .unwrap();
        assert_eq!(
            stream.subscriptions()[&ChannelKind::Orderbooks],
            vec!["BTC/USD".to_string()]
        );
    }

    #[test]
    fn test_generic_subscribe_still_validates() {
        let stream = NewsStream::new(credentials());
        let err = stream
            .stream()
            .subscribe(ChannelKind::Trades, vec!["AAPL".to_string()])
            .unwrap_err();
        assert!(matches!(err, AlpacaError::UnsupportedChannel { .. }));
    }

    #[test]
    fn test_news_wildcard() {
        let stream = NewsStream::new(credentials());
        stream.subscribe_news(vec!["*".to_string()]).unwrap();
        assert_eq!(
            stream.subscriptions()[&ChannelKind::News],
            vec!["*".to_string()]
        );
    }
}
