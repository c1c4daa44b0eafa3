//! Event fan-out.
//!
//! Three scopes:
//!
//! | method | reaches |
//! |---|---|
//! | [`to_everyone`](Broadcaster::to_everyone) | every registered connection |
//! | [`to_roster`](Broadcaster::to_roster) | connections whose name is in a roster |
//! | [`to_connection`](Broadcaster::to_connection) | one connection |
//!
//! Every attempt is independent. A recipient whose outbox is closed is
//! counted in [`Delivery::dropped`] and logged at `debug`; the rest still
//! get the event.

use quizforge_protocol::ServerEvent;
use quizforge_transport::ConnectionId;

use crate::{Outbox, SharedRegistry};

/// How a fan-out went.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    /// Recipients whose outbox accepted the event.
    pub delivered: usize,
    /// Recipients that were gone (closed outbox or no longer registered).
    pub dropped: usize,
}

impl Delivery {
    fn record(&mut self, ok: bool) {
        if ok {
            self.delivered += 1;
        } else {
            self.dropped += 1;
        }
    }
}

/// Pushes [`ServerEvent`]s into connection outboxes.
///
/// Cheap to clone; every room actor carries one.
#[derive(Debug, Clone)]
pub struct Broadcaster {
    registry: SharedRegistry,
}

impl Broadcaster {
    /// Creates a broadcaster over `registry`.
    pub fn new(registry: SharedRegistry) -> Self {
        Self { registry }
    }

    /// The registry this broadcaster delivers through.
    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    /// Sends `event` to every connected player.
    pub async fn to_everyone(&self, event: &ServerEvent) -> Delivery {
        let registry = self.registry.lock().await;
        let mut delivery = Delivery::default();
        for (conn, outbox) in registry.outboxes() {
            delivery.record(push(outbox, event, conn));
        }
        delivery
    }

    /// Sends `event` to each name in `roster` that is still connected.
    pub async fn to_roster(&self, roster: &[String], event: &ServerEvent) -> Delivery {
        let registry = self.registry.lock().await;
        let mut delivery = Delivery::default();
        for name in roster {
            match registry
                .connection_of(name)
                .and_then(|conn| registry.outbox(conn).map(|o| (conn, o)))
            {
                Some((conn, outbox)) => delivery.record(push(outbox, event, conn)),
                None => {
                    tracing::debug!(player = %name, kind = event.kind(), "recipient not connected");
                    delivery.record(false);
                }
            }
        }
        delivery
    }

    /// Sends `event` to a single connection.
    pub async fn to_connection(&self, conn: ConnectionId, event: &ServerEvent) -> Delivery {
        let registry = self.registry.lock().await;
        let mut delivery = Delivery::default();
        match registry.outbox(conn) {
            Some(outbox) => delivery.record(push(outbox, event, conn)),
            None => {
                tracing::debug!(conn_id = %conn, kind = event.kind(), "recipient not registered");
                delivery.record(false);
            }
        }
        delivery
    }
}

/// One delivery attempt. Returns `false` if the outbox is closed.
fn push(outbox: &Outbox, event: &ServerEvent, conn: ConnectionId) -> bool {
    match outbox.send(event.clone()) {
        Ok(()) => true,
        Err(_) => {
            tracing::debug!(conn_id = %conn, kind = event.kind(), "outbox closed, event dropped");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;

    use super::*;
    use crate::ConnectionRegistry;

    fn conn(id: u64) -> ConnectionId {
        ConnectionId::new(id)
    }

    /// A broadcaster with `names` registered on connections 1..=n,
    /// plus the receiving end of each outbox.
    async fn setup(
        names: &[&str],
    ) -> (Broadcaster, Vec<mpsc::UnboundedReceiver<ServerEvent>>) {
        let registry = ConnectionRegistry::shared();
        let mut receivers = Vec::new();
        {
            let mut reg = registry.lock().await;
            for (i, name) in names.iter().enumerate() {
                let (tx, rx) = mpsc::unbounded_channel();
                reg.claim(conn(i as u64 + 1), name, tx).unwrap();
                receivers.push(rx);
            }
        }
        (Broadcaster::new(registry), receivers)
    }

    fn event() -> ServerEvent {
        ServerEvent::error("ping")
    }

    #[tokio::test]
    async fn test_to_everyone_reaches_all_connections() {
        let (b, mut rxs) = setup(&["ann", "bob", "cid"]).await;

        let delivery = b.to_everyone(&event()).await;

        assert_eq!(delivery, Delivery { delivered: 3, dropped: 0 });
        for rx in &mut rxs {
            assert_eq!(rx.try_recv().unwrap(), event());
        }
    }

    #[tokio::test]
    async fn test_to_roster_reaches_only_roster_members() {
        let (b, mut rxs) = setup(&["ann", "bob", "cid"]).await;

        let roster = vec!["ann".to_string(), "cid".to_string()];
        let delivery = b.to_roster(&roster, &event()).await;

        assert_eq!(delivery.delivered, 2);
        assert!(rxs[0].try_recv().is_ok());
        assert!(rxs[1].try_recv().is_err(), "bob is not in the roster");
        assert!(rxs[2].try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_to_roster_counts_disconnected_names_as_dropped() {
        let (b, _rxs) = setup(&["ann"]).await;

        let roster = vec!["ann".to_string(), "ghost".to_string()];
        let delivery = b.to_roster(&roster, &event()).await;

        assert_eq!(delivery, Delivery { delivered: 1, dropped: 1 });
    }

    #[tokio::test]
    async fn test_closed_outbox_does_not_stop_other_deliveries() {
        let (b, mut rxs) = setup(&["ann", "bob"]).await;
        // Ann's handler went away without releasing her name yet.
        let ann = rxs.remove(0);
        drop(ann);

        let delivery = b.to_everyone(&event()).await;

        assert_eq!(delivery, Delivery { delivered: 1, dropped: 1 });
        assert_eq!(rxs[0].try_recv().unwrap(), event());
    }

    #[tokio::test]
    async fn test_to_connection_reaches_only_that_connection() {
        let (b, mut rxs) = setup(&["ann", "bob"]).await;

        let delivery = b.to_connection(conn(2), &event()).await;

        assert_eq!(delivery.delivered, 1);
        assert!(rxs[0].try_recv().is_err());
        assert!(rxs[1].try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_to_connection_unknown_is_dropped() {
        let (b, _rxs) = setup(&[]).await;
        let delivery = b.to_connection(conn(7), &event()).await;
        assert_eq!(delivery, Delivery { delivered: 0, dropped: 1 });
    }
}
