//! Stream endpoint definitions

use alpaca_types::{ChannelKind, Feed, OptionsFeed};
use std::fmt;

const STOCKS_CHANNELS: &[ChannelKind] = &[
    ChannelKind::Trades,
    ChannelKind::Quotes,
    ChannelKind::Bars,
    ChannelKind::UpdatedBars,
    ChannelKind::DailyBars,
    ChannelKind::Statuses,
    ChannelKind::Lulds,
    ChannelKind::CancelErrors,
    ChannelKind::Corrections,
];

const CRYPTO_CHANNELS: &[ChannelKind] = &[
    ChannelKind::Trades,
    ChannelKind::Quotes,
    ChannelKind::Bars,
    ChannelKind::UpdatedBars,
    ChannelKind::DailyBars,
    ChannelKind::Orderbooks,
];

const NEWS_CHANNELS: &[ChannelKind] = &[ChannelKind::News];

const OPTIONS_CHANNELS: &[ChannelKind] = &[ChannelKind::Trades, ChannelKind::Quotes];

/// Market data stream endpoints
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// Equities feed (iex, sip or delayed_sip)
    Stocks(Feed),
    /// Equities sandbox feed
    StocksSandbox(Feed),
    /// US crypto feed
    Crypto,
    /// News feed
    News,
    /// Options feed (indicative or opra)
    Options(OptionsFeed),
    /// Explicit URL, e.g. a local mock server; channel validation follows
    /// the stocks feed
    Custom(String),
}

impl Endpoint {
    /// Get the WebSocket URL for this endpoint
    pub fn url(&self) -> String {
        match self {
            Self::Stocks(feed) => {
                format!("wss://stream.data.alpaca.markets/v2/{feed}")
            }
            Self::StocksSandbox(feed) => {
                format!("wss://stream.data.sandbox.alpaca.markets/v2/{feed}")
            }
            Self::Crypto => "wss://stream.data.alpaca.markets/v1beta3/crypto/us".to_string(),
            Self::News => "wss://stream.data.alpaca.markets/v1beta1/news".to_string(),
            Self::Options(feed) => {
                format!("wss://stream.data.alpaca.markets/v1beta1/{feed}")
            }
            Self::Custom(url) => url.clone(),
        }
    }

    /// Channel kinds the server accepts on this endpoint
    pub fn supported_channels(&self) -> &'static [ChannelKind] {
        match self {
            Self::Stocks(_) | Self::StocksSandbox(_) | Self::Custom(_) => STOCKS_CHANNELS,
            Self::Crypto => CRYPTO_CHANNELS,
            Self::News => NEWS_CHANNELS,
            Self::Options(_) => OPTIONS_CHANNELS,
        }
    }

    /// True if the kind can be subscribed on this endpoint
    pub fn supports(&self, kind: ChannelKind) -> bool {
        self.supported_channels().contains(&kind)
    }

    /// Short name for error messages
    pub fn name(&self) -> &'static str {
        match self {
            Self::Stocks(_) | Self::StocksSandbox(_) => "stocks",
            Self::Crypto => "crypto",
            Self::News => "news",
            Self::Options(_) => "options",
            Self::Custom(_) => "custom",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url())
    }
}
