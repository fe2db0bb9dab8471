//! Broadcast channel fanning shared-state updates out to live viewers.
//!
//! The channel is an explicit registry of actor recipients rather than an
//! implicit event bus: every WebSocket connection registers a
//! `Recipient<StatePush>` on start and unregisters on stop. Publishing is
//! fire-and-forget (`do_send`), so a slow or unresponsive viewer can never
//! stall the pipeline request that triggered the publish. Recipients whose
//! peer has gone away are pruned on the next publish.
//!
//! Subscribing does NOT push the current state; a newly joined viewer asks
//! for a snapshot explicitly over its own connection.

use crate::shared_state::SharedState;
use actix::prelude::*;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::debug;
use uuid::Uuid;

/// Full shared state pushed to one subscriber.
#[derive(Message, Debug, Clone)]
#[rtype(result = "()")]
pub struct StatePush(pub SharedState);

/// Registry of live subscriber connections.
///
/// Cheap to clone; all clones share the same registry.
#[derive(Clone, Default)]
pub struct Broadcaster {
    subscribers: Arc<Mutex<HashMap<Uuid, Recipient<StatePush>>>>,
}

impl Broadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber and return its handle.
    pub fn subscribe(&self, recipient: Recipient<StatePush>) -> Uuid {
        let id = Uuid::new_v4();
        self.subscribers.lock().unwrap().insert(id, recipient);
        debug!(subscriber = %id, "Viewer subscribed");
        id
    }

    /// Remove a subscriber. Idempotent: unknown handles are ignored.
    pub fn unsubscribe(&self, id: Uuid) {
        if self.subscribers.lock().unwrap().remove(&id).is_some() {
            debug!(subscriber = %id, "Viewer unsubscribed");
        }
    }

    /// Number of currently registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().unwrap().len()
    }

    /// Push the given state to every live subscriber, best-effort.
    ///
    /// Disconnected recipients are dropped from the registry here instead of
    /// at disconnect time, so a connection that died without unsubscribing
    /// cannot accumulate.
    pub fn publish(&self, state: &SharedState) {
        let mut subscribers = self.subscribers.lock().unwrap();
        subscribers.retain(|_, recipient| recipient.connected());
        for recipient in subscribers.values() {
            recipient.do_send(StatePush(state.clone()));
        }
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;

    /// Test actor that records every state it receives.
    pub struct Collector {
        pub received: Arc<Mutex<Vec<SharedState>>>,
    }

    impl Actor for Collector {
        type Context = Context<Self>;
    }

    impl Handler<StatePush> for Collector {
        type Result = ();

        fn handle(&mut self, msg: StatePush, _ctx: &mut Self::Context) {
            self.received.lock().unwrap().push(msg.0);
        }
    }

    /// Mailbox flush probe: once this resolves, every earlier StatePush has
    /// been handled (actor mailboxes are FIFO).
    #[derive(Message)]
    #[rtype(result = "usize")]
    pub struct Drained;

    impl Handler<Drained> for Collector {
        type Result = usize;

        fn handle(&mut self, _msg: Drained, _ctx: &mut Self::Context) -> usize {
            self.received.lock().unwrap().len()
        }
    }

    pub fn spawn_collector() -> (Addr<Collector>, Arc<Mutex<Vec<SharedState>>>) {
        let received = Arc::new(Mutex::new(Vec::new()));
        let addr = Collector {
            received: received.clone(),
        }
        .start();
        (addr, received)
    }

    #[actix_web::test]
    async fn publish_reaches_every_subscriber() {
        let broadcaster = Broadcaster::new();
        let (first, first_received) = spawn_collector();
        let (second, second_received) = spawn_collector();
        broadcaster.subscribe(first.clone().recipient());
        broadcaster.subscribe(second.clone().recipient());

        let state = SharedState {
            response_text: "hello".to_string(),
            is_loading: true,
            auto_analyze: false,
        };
        broadcaster.publish(&state);

        assert_eq!(first.send(Drained).await.unwrap(), 1);
        assert_eq!(second.send(Drained).await.unwrap(), 1);
        assert_eq!(first_received.lock().unwrap()[0], state);
        assert_eq!(second_received.lock().unwrap()[0], state);
    }

    #[actix_web::test]
    async fn subscribe_does_not_push_current_state() {
        let broadcaster = Broadcaster::new();
        let (addr, received) = spawn_collector();
        broadcaster.subscribe(addr.clone().recipient());

        assert_eq!(addr.send(Drained).await.unwrap(), 0);
        assert!(received.lock().unwrap().is_empty());
    }

    #[actix_web::test]
    async fn unsubscribe_is_idempotent() {
        let broadcaster = Broadcaster::new();
        let (addr, received) = spawn_collector();
        let id = broadcaster.subscribe(addr.clone().recipient());
        assert_eq!(broadcaster.subscriber_count(), 1);

        broadcaster.unsubscribe(id);
        broadcaster.unsubscribe(id);
        assert_eq!(broadcaster.subscriber_count(), 0);

        broadcaster.publish(&SharedState::default());
        assert_eq!(addr.send(Drained).await.unwrap(), 0);
        assert!(received.lock().unwrap().is_empty());
    }
}
