//! Channel kind and feed enums

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stream channel kinds
///
/// Not every kind is valid on every feed; the stream endpoints validate
/// kind support before sending a subscribe request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChannelKind {
    /// Executed trades
    Trades,
    /// NBBO quotes
    Quotes,
    /// Minute bars
    Bars,
    /// Corrections to previously emitted minute bars
    UpdatedBars,
    /// Daily bars
    DailyBars,
    /// Trading status changes (halts, resumptions)
    Statuses,
    /// Limit-up / limit-down bands
    Lulds,
    /// Trade cancel errors
    CancelErrors,
    /// Trade corrections
    Corrections,
    /// Orderbook snapshots and deltas (crypto only)
    Orderbooks,
    /// News articles
    News,
}

impl ChannelKind {
    /// Every channel kind, in wire order
    pub const ALL: [ChannelKind; 11] = [
        Self::Trades,
        Self::Quotes,
        Self::Bars,
        Self::UpdatedBars,
        Self::DailyBars,
        Self::Statuses,
        Self::Lulds,
        Self::CancelErrors,
        Self::Corrections,
        Self::Orderbooks,
        Self::News,
    ];

    /// Returns the channel name as used in subscribe messages
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trades => "trades",
            Self::Quotes => "quotes",
            Self::Bars => "bars",
            Self::UpdatedBars => "updatedBars",
            Self::DailyBars => "dailyBars",
            Self::Statuses => "statuses",
            Self::Lulds => "lulds",
            Self::CancelErrors => "cancelErrors",
            Self::Corrections => "corrections",
            Self::Orderbooks => "orderbooks",
            Self::News => "news",
        }
    }

    /// Parse a channel name from a subscription-ack key
    pub fn from_wire_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.as_str() == name)
    }

    /// Map a one-letter frame discriminator (the `T` field) to a kind
    pub fn from_discriminator(t: &str) -> Option<Self> {
        match t {
            "t" => Some(Self::Trades),
            "q" => Some(Self::Quotes),
            "b" => Some(Self::Bars),
            "u" => Some(Self::UpdatedBars),
            "d" => Some(Self::DailyBars),
            "s" => Some(Self::Statuses),
            "l" => Some(Self::Lulds),
            "x" => Some(Self::CancelErrors),
            "c" => Some(Self::Corrections),
            "o" => Some(Self::Orderbooks),
            "n" => Some(Self::News),
            _ => None,
        }
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stock market data feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Feed {
    /// Investors Exchange, free tier (default)
    #[default]
    Iex,
    /// Consolidated SIP feed (paid subscription)
    Sip,
    /// 15-minute delayed SIP
    #[serde(rename = "delayed_sip")]
    DelayedSip,
}

impl Feed {
    /// Returns the feed path segment used in stream and REST URLs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Iex => "iex",
            Self::Sip => "sip",
            Self::DelayedSip => "delayed_sip",
        }
    }
}

impl fmt::Display for Feed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options market data feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OptionsFeed {
    /// Indicative prices, free tier (default)
    #[default]
    Indicative,
    /// Full OPRA feed (paid subscription)
    Opra,
}

impl OptionsFeed {
    /// Returns the feed path segment
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Indicative => "indicative",
            Self::Opra => "opra",
        }
    }
}

impl fmt::Display for OptionsFeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names_round_trip() {
        for kind in ChannelKind::ALL {
            assert_eq!(ChannelKind::from_wire_name(kind.as_str()), Some(kind));
        }
        assert_eq!(ChannelKind::from_wire_name("candles"), None);
    }

    #[test]
    fn test_discriminator_mapping() {
        assert_eq!(ChannelKind::from_discriminator("t"), Some(ChannelKind::Trades));
        assert_eq!(ChannelKind::from_discriminator("q"), Some(ChannelKind::Quotes));
        assert_eq!(ChannelKind::from_discriminator("u"), Some(ChannelKind::UpdatedBars));
        assert_eq!(ChannelKind::from_discriminator("x"), Some(ChannelKind::CancelErrors));
        assert_eq!(ChannelKind::from_discriminator("zz"), None);
    }

    #[test]
    fn test_serde_names_match_wire_names() {
        for kind in ChannelKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }
}
