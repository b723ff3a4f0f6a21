use tokio::sync::broadcast;

/// The three logical channels a node publishes to and subscribes from.
/// Stands in for the PubNub bus the original node used: best-effort,
/// unordered, at-least-once. Duplicate delivery is harmless because
/// `replace_chain` is a no-op once the chain has stopped strictly growing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Test,
    Block,
    Transaction,
}

/// Publishes JSON-encoded payloads to a logical channel and hands out
/// subscriptions to it. Any at-least-once bus satisfies this trait — the
/// in-process `tokio::sync::broadcast` implementation below is the
/// simplest thing that does.
pub trait Broadcaster: Send + Sync {
    fn publish(&self, channel: Channel, payload: Vec<u8>);
    fn subscribe(&self, channel: Channel) -> broadcast::Receiver<Vec<u8>>;
}

/// An in-process broadcast bus. Good enough for a single node talking to
/// itself, or for wiring multiple node processes together over whatever
/// transport sits in front of an actual `Broadcaster` implementation.
pub struct InProcessBroadcaster {
    test: broadcast::Sender<Vec<u8>>,
    block: broadcast::Sender<Vec<u8>>,
    transaction: broadcast::Sender<Vec<u8>>,
}

impl InProcessBroadcaster {
    #[must_use]
    pub fn new() -> Self {
        let (test, _) = broadcast::channel(32);
        let (block, _) = broadcast::channel(32);
        let (transaction, _) = broadcast::channel(32);
        Self {
            test,
            block,
            transaction,
        }
    }

    fn sender(&self, channel: Channel) -> &broadcast::Sender<Vec<u8>> {
        match channel {
            Channel::Test => &self.test,
            Channel::Block => &self.block,
            Channel::Transaction => &self.transaction,
        }
    }
}

impl Default for InProcessBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl Broadcaster for InProcessBroadcaster {
    fn publish(&self, channel: Channel, payload: Vec<u8>) {
        // No subscribers is not an error — a node running standalone has
        // nowhere to broadcast to yet.
        let _ = self.sender(channel).send(payload);
    }

    fn subscribe(&self, channel: Channel) -> broadcast::Receiver<Vec<u8>> {
        self.sender(channel).subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn published_block_reaches_a_subscriber() {
        let bus = InProcessBroadcaster::new();
        let mut rx = bus.subscribe(Channel::Block);

        bus.publish(Channel::Block, b"hello".to_vec());

        assert_eq!(rx.recv().await.unwrap(), b"hello".to_vec());
    }

    #[tokio::test]
    async fn channels_are_independent() {
        let bus = InProcessBroadcaster::new();
        let mut block_rx = bus.subscribe(Channel::Block);
        let mut tx_rx = bus.subscribe(Channel::Transaction);

        bus.publish(Channel::Block, b"block-payload".to_vec());

        assert_eq!(block_rx.recv().await.unwrap(), b"block-payload".to_vec());
        assert!(tx_rx.try_recv().is_err());
    }
}
