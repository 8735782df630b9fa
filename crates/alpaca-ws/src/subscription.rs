//! Subscription state
//!
//! Tracks the desired per-kind symbol sets for one connection session. Local
//! mutation is optimistic: `add`/`remove` update the map before the server
//! acknowledges anything, and the server's subscription-ack frame later
//! overwrites the whole map via [`SubscriptionMap::replace_all`].

use alpaca_types::{ChannelKind, SubscribeRequest, SubscriptionAck};
use std::collections::{BTreeMap, BTreeSet};

/// Per-kind symbol sets for one connection session
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SubscriptionMap {
    channels: BTreeMap<ChannelKind, BTreeSet<String>>,
}

impl SubscriptionMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Add symbols for a kind; duplicates are not meaningful
    pub fn add(&mut self, kind: ChannelKind, symbols: impl IntoIterator<Item = String>) {
        self.channels.entry(kind).or_default().extend(symbols);
    }

    /// Remove symbols for a kind; a kind with no symbols left disappears
    pub fn remove<'a>(&mut self, kind: ChannelKind, symbols: impl IntoIterator<Item = &'a str>) {
        if let Some(set) = self.channels.get_mut(&kind) {
            for symbol in symbols {
                set.remove(symbol);
            }
            if set.is_empty() {
                self.channels.remove(&kind);
            }
        }
    }

    /// Overwrite the whole map with the server's authoritative echo
    ///
    /// Partial acceptance or rejection by the server is handled here
    /// transparently: whatever the ack says is the new truth.
    pub fn replace_all(&mut self, ack: &SubscriptionAck) {
        self.channels.clear();
        for (kind, symbols) in &ack.channels {
            if !symbols.is_empty() {
                self.channels
                    .insert(*kind, symbols.iter().cloned().collect());
            }
        }
    }

    /// Symbols currently tracked for a kind
    pub fn symbols(&self, kind: ChannelKind) -> Vec<String> {
        self.channels
            .get(&kind)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Full per-kind snapshot
    pub fn snapshot(&self) -> BTreeMap<ChannelKind, Vec<String>> {
        self.channels
            .iter()
            .map(|(kind, set)| (*kind, set.iter().cloned().collect()))
            .collect()
    }

    /// True if nothing is subscribed
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// One subscribe message carrying the whole desired state, for replay
    /// after a reconnect; `None` when there is nothing to replay
    pub fn replay_request(&self) -> Option<SubscribeRequest> {
        if self.is_empty() {
            return None;
        }
        Some(SubscribeRequest::subscribe(self.snapshot()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symbols(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_optimistic_add_is_immediately_visible() {
        let mut subs = SubscriptionMap::new();
        subs.add(ChannelKind::Trades, symbols(&["AAPL", "MSFT"]));
        assert_eq!(subs.symbols(ChannelKind::Trades), symbols(&["AAPL", "MSFT"]));
    }

    #[test]
    fn test_duplicates_are_not_meaningful() {
        let mut subs = SubscriptionMap::new();
        subs.add(ChannelKind::Quotes, symbols(&["AAPL", "AAPL"]));
        subs.add(ChannelKind::Quotes, symbols(&["AAPL"]));
        assert_eq!(subs.symbols(ChannelKind::Quotes), symbols(&["AAPL"]));
    }

    #[test]
    fn test_subscribe_then_unsubscribe_leaves_empty_state() {
        let mut subs = SubscriptionMap::new();
        subs.add(ChannelKind::Trades, symbols(&["AAPL"]));
        subs.remove(ChannelKind::Trades, ["AAPL"]);
        assert!(subs.symbols(ChannelKind::Trades).is_empty());
        assert!(subs.is_empty());
    }

    #[test]
    fn test_replace_all_is_authoritative() {
        let mut subs = SubscriptionMap::new();
        subs.add(ChannelKind::Trades, symbols(&["AAPL", "MSFT"]));
        subs.add(ChannelKind::Bars, symbols(&["SPY"]));

        // server accepted only part of the request
        let mut ack = SubscriptionAck::default();
        ack.channels.insert(ChannelKind::Trades, symbols(&["AAPL"]));
        ack.channels.insert(ChannelKind::Bars, vec![]);
        subs.replace_all(&ack);

        assert_eq!(subs.symbols(ChannelKind::Trades), symbols(&["AAPL"]));
        assert!(subs.symbols(ChannelKind::Bars).is_empty());
        assert_eq!(subs.snapshot().len(), 1);
    }

    #[test]
    fn test_replay_request_carries_full_state() {
        let mut subs = SubscriptionMap::new();
        assert!(subs.replay_request().is_none());

        subs.add(ChannelKind::Trades, symbols(&["AAPL"]));
        subs.add(ChannelKind::Quotes, symbols(&["MSFT"]));

        let request = subs.replay_request().unwrap();
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["action"], "subscribe");
        assert_eq!(json["trades"][0], "AAPL");
        assert_eq!(json["quotes"][0], "MSFT");
    }
}
