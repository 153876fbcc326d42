//! Session lifecycle events.
//!
//! Events fan out over a broadcast channel: each subscriber owns a
//! receiver handle and detaches by dropping it.  A slow or failed
//! subscriber only loses its own backlog; the connection never notices.

use etp_proto::MessageHeader;
use tokio::sync::broadcast;

const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// The client started connecting.
    Start,
    /// The client stopped; no further events follow.
    Stop,
    /// The WebSocket is open.
    Open,
    /// The peer or transport closed the connection.
    Close { code: Option<u16>, reason: String },
    /// A transport or protocol fault.
    Error { message: String },
    /// A complete logical message was received.
    Message { header: MessageHeader },
}

#[derive(Debug, Clone)]
pub(crate) struct EventBus {
    tx: broadcast::Sender<SessionEvent>,
}

impl EventBus {
    pub(crate) fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { tx }
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    /// Publish to whoever is listening; no subscribers is not an error.
    pub(crate) fn publish(&self, event: SessionEvent) {
        let _ = self.tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_published_events() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        bus.publish(SessionEvent::Start);
        bus.publish(SessionEvent::Open);
        assert!(matches!(rx.recv().await.unwrap(), SessionEvent::Start));
        assert!(matches!(rx.recv().await.unwrap(), SessionEvent::Open));
    }

    #[tokio::test]
    async fn dropped_subscriber_does_not_affect_others() {
        let bus = EventBus::new();
        let rx_dropped = bus.subscribe();
        let mut rx = bus.subscribe();
        drop(rx_dropped);
        bus.publish(SessionEvent::Stop);
        assert!(matches!(rx.recv().await.unwrap(), SessionEvent::Stop));
    }

    #[test]
    fn publishing_without_subscribers_is_fine() {
        EventBus::new().publish(SessionEvent::Error { message: "x".to_owned() });
    }
}
