/// Fan-out hub
///
/// Subscription and broadcast substrate between the sync engines / ingester
/// and connected WebSocket clients. Topics are typed; subscriber state is a
/// mutable set per connection, held under a mutex only for lookup and
/// mutation, never across I/O.
///
/// Delivery is at-most-once per subscriber: each subscriber owns a bounded
/// queue and `publish` uses `try_send`, so a slow consumer drops its own
/// messages without stalling the broadcast to others. Per-topic FIFO order
/// per subscriber is preserved by the queue; nothing is ordered across
/// topics.
pub mod messages;

pub use messages::{ClientMessage, DashboardPrice, ServerMessage};

use crate::logger::{self, LogTag};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Per-subscriber queue depth; overflow drops that subscriber's messages
pub const SUBSCRIBER_QUEUE_CAPACITY: usize = 512;

// =============================================================================
// TOPICS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Topic {
    /// Price updates for one token
    Token(String),
    /// Launchpad lifecycle events
    Pulse,
    /// Periodic dashboard price snapshot
    Dashboard,
    /// Live candle updates for a pair at one timeframe
    Ohlcv {
        base: String,
        quote: String,
        tf: String,
    },
    /// Individual trades for a pair
    Trades { base: String, quote: String },
}

impl Topic {
    pub fn name(&self) -> String {
        match self {
            Topic::Token(address) => format!("token:{}", address),
            Topic::Pulse => "pulse".to_string(),
            Topic::Dashboard => "dashboard".to_string(),
            Topic::Ohlcv { base, quote, tf } => format!("ohlcv:{}:{}:{}", base, quote, tf),
            Topic::Trades { base, quote } => format!("trades:{}:{}", base, quote),
        }
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

// =============================================================================
// HUB
// =============================================================================

pub type SubscriberId = Uuid;

struct Subscriber {
    tx: mpsc::Sender<ServerMessage>,
    topics: HashSet<Topic>,
}

pub struct Hub {
    subscribers: Mutex<HashMap<SubscriberId, Subscriber>>,
    topic_index: Mutex<HashMap<Topic, HashSet<SubscriberId>>>,
    accepting: AtomicBool,
    dropped_messages: AtomicU64,
}

impl Hub {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            subscribers: Mutex::new(HashMap::new()),
            topic_index: Mutex::new(HashMap::new()),
            accepting: AtomicBool::new(true),
            dropped_messages: AtomicU64::new(0),
        })
    }

    /// Register a new subscriber; returns its id and message queue
    ///
    /// Returns `None` once the hub has stopped accepting (shutdown).
    pub fn register(&self) -> Option<(SubscriberId, mpsc::Receiver<ServerMessage>)> {
        if !self.accepting.load(Ordering::SeqCst) {
            return None;
        }

        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::channel(SUBSCRIBER_QUEUE_CAPACITY);
        self.subscribers.lock().insert(
            id,
            Subscriber {
                tx,
                topics: HashSet::new(),
            },
        );

        logger::debug(LogTag::Hub, &format!("Subscriber {} registered", id));
        Some((id, rx))
    }

    /// Drop a subscriber and release its topic memberships
    pub fn unregister(&self, id: SubscriberId) {
        let removed = self.subscribers.lock().remove(&id);

        if let Some(subscriber) = removed {
            let mut index = self.topic_index.lock();
            for topic in subscriber.topics {
                if let Some(members) = index.get_mut(&topic) {
                    members.remove(&id);
                    if members.is_empty() {
                        index.remove(&topic);
                    }
                }
            }
            logger::debug(LogTag::Hub, &format!("Subscriber {} unregistered", id));
        }
    }

    pub fn subscribe(&self, id: SubscriberId, topic: Topic) {
        let mut subscribers = self.subscribers.lock();
        let Some(subscriber) = subscribers.get_mut(&id) else {
            return;
        };
        if subscriber.topics.insert(topic.clone()) {
            self.topic_index
                .lock()
                .entry(topic)
                .or_default()
                .insert(id);
        }
    }

    pub fn unsubscribe(&self, id: SubscriberId, topic: &Topic) {
        let mut subscribers = self.subscribers.lock();
        let Some(subscriber) = subscribers.get_mut(&id) else {
            return;
        };
        if subscriber.topics.remove(topic) {
            let mut index = self.topic_index.lock();
            if let Some(members) = index.get_mut(topic) {
                members.remove(&id);
                if members.is_empty() {
                    index.remove(topic);
                }
            }
        }
    }

    /// Apply one protocol message to a subscriber's subscription set
    pub fn apply_client_message(&self, id: SubscriberId, message: ClientMessage) {
        match message {
            ClientMessage::SubscribeToken { address } => self.subscribe(id, Topic::Token(address)),
            ClientMessage::UnsubscribeToken { address } => {
                self.unsubscribe(id, &Topic::Token(address))
            }
            ClientMessage::SubscribePulse => self.subscribe(id, Topic::Pulse),
            ClientMessage::UnsubscribePulse => self.unsubscribe(id, &Topic::Pulse),
            ClientMessage::SubscribeDashboard => self.subscribe(id, Topic::Dashboard),
            ClientMessage::UnsubscribeDashboard => self.unsubscribe(id, &Topic::Dashboard),
            ClientMessage::SubscribeOhlcv { base, quote, tf } => {
                self.subscribe(id, Topic::Ohlcv { base, quote, tf })
            }
            ClientMessage::UnsubscribeOhlcv { base, quote, tf } => {
                self.unsubscribe(id, &Topic::Ohlcv { base, quote, tf })
            }
            ClientMessage::SubscribeTrades { base, quote } => {
                self.subscribe(id, Topic::Trades { base, quote })
            }
            ClientMessage::UnsubscribeTrades { base, quote } => {
                self.unsubscribe(id, &Topic::Trades { base, quote })
            }
        }
    }

    /// Broadcast a message to every subscriber of a topic
    ///
    /// Never blocks: full queues drop the message for that subscriber only.
    pub fn publish(&self, topic: &Topic, message: ServerMessage) {
        // Two short lock scopes, never nested: subscribe/unsubscribe take the
        // same locks in subscriber-then-index order
        let member_ids: Vec<SubscriberId> = {
            let index = self.topic_index.lock();
            match index.get(topic) {
                Some(members) => members.iter().copied().collect(),
                None => return,
            }
        };

        let senders: Vec<mpsc::Sender<ServerMessage>> = {
            let subscribers = self.subscribers.lock();
            member_ids
                .iter()
                .filter_map(|id| subscribers.get(id).map(|s| s.tx.clone()))
                .collect()
        };

        for tx in senders {
            if tx.try_send(message.clone()).is_err() {
                self.dropped_messages.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub fn subscriber_count(&self, topic: &Topic) -> usize {
        self.topic_index
            .lock()
            .get(topic)
            .map(|m| m.len())
            .unwrap_or(0)
    }

    pub fn total_subscribers(&self) -> usize {
        self.subscribers.lock().len()
    }

    pub fn dropped_message_count(&self) -> u64 {
        self.dropped_messages.load(Ordering::Relaxed)
    }

    /// Stop accepting new subscribers (shutdown path); existing queues drain
    pub fn stop_accepting(&self) {
        self.accepting.store(false, Ordering::SeqCst);
        logger::info(LogTag::Hub, "Hub stopped accepting subscribers");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn price_update(address: &str) -> ServerMessage {
        ServerMessage::PriceUpdate {
            address: address.to_string(),
            price: 1.0,
            price_change_24h: 0.0,
            market_cap: 0.0,
            volume_24h: 0.0,
            liquidity: 0.0,
            timestamp: 0,
        }
    }

    #[tokio::test]
    async fn routes_by_topic() {
        let hub = Hub::new();
        let (a, mut rx_a) = hub.register().unwrap();
        let (b, mut rx_b) = hub.register().unwrap();

        hub.subscribe(a, Topic::Token("X".to_string()));
        hub.subscribe(b, Topic::Pulse);

        hub.publish(&Topic::Token("X".to_string()), price_update("X"));

        assert!(matches!(
            rx_a.try_recv(),
            Ok(ServerMessage::PriceUpdate { .. })
        ));
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn slow_subscriber_drops_without_stalling_others() {
        let hub = Hub::new();
        let (slow, _rx_slow) = hub.register().unwrap(); // never drained
        let (fast, mut rx_fast) = hub.register().unwrap();

        let topic = Topic::Pulse;
        hub.subscribe(slow, topic.clone());
        hub.subscribe(fast, topic.clone());

        for i in 0..(SUBSCRIBER_QUEUE_CAPACITY + 50) {
            hub.publish(&topic, price_update(&format!("t{}", i)));
            // Fast subscriber keeps draining
            while rx_fast.try_recv().is_ok() {}
        }

        assert!(hub.dropped_message_count() >= 50);
    }

    #[tokio::test]
    async fn unregister_releases_memberships() {
        let hub = Hub::new();
        let (id, _rx) = hub.register().unwrap();
        hub.subscribe(id, Topic::Dashboard);
        assert_eq!(hub.subscriber_count(&Topic::Dashboard), 1);

        hub.unregister(id);
        assert_eq!(hub.subscriber_count(&Topic::Dashboard), 0);
        assert_eq!(hub.total_subscribers(), 0);
    }

    #[tokio::test]
    async fn per_topic_fifo_per_subscriber() {
        let hub = Hub::new();
        let (id, mut rx) = hub.register().unwrap();
        hub.subscribe(id, Topic::Pulse);

        for i in 0..10 {
            hub.publish(
                &Topic::Pulse,
                ServerMessage::PulseTokenUpdate {
                    address: format!("{}", i),
                    logo_uri: None,
                },
            );
        }

        for i in 0..10 {
            match rx.try_recv().unwrap() {
                ServerMessage::PulseTokenUpdate { address, .. } => {
                    assert_eq!(address, format!("{}", i));
                }
                other => panic!("unexpected {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn shutdown_rejects_new_subscribers() {
        let hub = Hub::new();
        hub.stop_accepting();
        assert!(hub.register().is_none());
    }
}
