use axum::extract::ws::Utf8Bytes;
use entity::roles::RoleName;
use entity::Id;
use log::*;
use std::collections::HashMap;
use tokio::sync::mpsc::{error::TrySendError, Sender};

/// Unique identifier for a connection (server-generated)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(uuid::Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who is behind a connection, as shown in the online users panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Presence {
    pub user_id: Id,
    pub full_name: String,
    pub username: String,
    pub role: String,
    pub department: String,
}

impl Presence {
    /// Admins and leaders are the only ones shown who else is online.
    pub fn sees_presence(&self) -> bool {
        RoleName::is_privileged(&self.role)
    }
}

/// A registered connection: identity plus the bounded queue its writer drains.
#[derive(Debug)]
pub struct Subscriber {
    pub presence: Presence,
    pub outbound: Sender<Utf8Bytes>,
}

/// Live subscribers. Owned by the hub loop, so it needs no locking of its own.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: HashMap<ConnectionId, Subscriber>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: HashMap::new(),
        }
    }

    pub fn register(&mut self, connection_id: ConnectionId, subscriber: Subscriber) {
        debug!(
            "Registering connection {connection_id} for {}",
            subscriber.presence.username
        );
        self.connections.insert(connection_id, subscriber);
    }

    /// Removes a connection. Dropping the returned subscriber closes its outbound queue.
    pub fn unregister(&mut self, connection_id: &ConnectionId) -> Option<Subscriber> {
        self.connections.remove(connection_id)
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Drops every subscriber, closing all outbound queues.
    pub fn clear(&mut self) {
        self.connections.clear();
    }

    pub fn presence_list(&self) -> Vec<&Presence> {
        self.connections.values().map(|s| &s.presence).collect()
    }

    /// Enqueues `payload` for one connection. Returns whether it was accepted.
    pub fn send_to(&self, connection_id: &ConnectionId, payload: Utf8Bytes) -> bool {
        match self.connections.get(connection_id) {
            Some(subscriber) => deliver(connection_id, subscriber, payload),
            None => false,
        }
    }

    /// Enqueues the same payload for every connection. Returns how many accepted it.
    pub fn broadcast(&self, payload: &Utf8Bytes) -> usize {
        self.broadcast_where(payload, |_| true)
    }

    /// Enqueues the same payload for every connection whose presence matches `filter`.
    pub fn broadcast_where<F>(&self, payload: &Utf8Bytes, filter: F) -> usize
    where
        F: Fn(&Presence) -> bool,
    {
        let mut delivered = 0;
        for (connection_id, subscriber) in &self.connections {
            if filter(&subscriber.presence) && deliver(connection_id, subscriber, payload.clone()) {
                delivered += 1;
            }
        }
        delivered
    }
}

/// A full or closed queue is logged and skipped. The subscriber stays registered; its own
/// lifecycle is responsible for unregistering it.
fn deliver(connection_id: &ConnectionId, subscriber: &Subscriber, payload: Utf8Bytes) -> bool {
    match subscriber.outbound.try_send(payload) {
        Ok(()) => true,
        Err(TrySendError::Full(_)) => {
            warn!(
                "Outbound queue full for connection {connection_id} ({}), dropping message",
                subscriber.presence.username
            );
            false
        }
        Err(TrySendError::Closed(_)) => {
            warn!(
                "Outbound queue closed for connection {connection_id} ({}), dropping message",
                subscriber.presence.username
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::{self, Receiver};

    fn presence(role: &str) -> Presence {
        Presence {
            user_id: Id::new_v4(),
            full_name: format!("{role} user"),
            username: role.to_owned(),
            role: role.to_owned(),
            department: "Inbound".to_owned(),
        }
    }

    fn subscribe(
        registry: &mut ConnectionRegistry,
        role: &str,
        capacity: usize,
    ) -> (ConnectionId, Receiver<Utf8Bytes>) {
        let (tx, rx) = mpsc::channel(capacity);
        let id = ConnectionId::new();
        registry.register(
            id,
            Subscriber {
                presence: presence(role),
                outbound: tx,
            },
        );
        (id, rx)
    }

    #[test]
    fn broadcast_reaches_every_connection() {
        let mut registry = ConnectionRegistry::new();
        let (_, mut first) = subscribe(&mut registry, "fifo", 4);
        let (_, mut second) = subscribe(&mut registry, "admin", 4);

        let delivered = registry.broadcast(&Utf8Bytes::from("hello"));

        assert_eq!(delivered, 2);
        assert_eq!(first.try_recv().unwrap().as_str(), "hello");
        assert_eq!(second.try_recv().unwrap().as_str(), "hello");
    }

    #[test]
    fn broadcast_where_only_reaches_matching_presences() {
        let mut registry = ConnectionRegistry::new();
        let (_, mut admin) = subscribe(&mut registry, "admin", 4);
        let (_, mut leader) = subscribe(&mut registry, "leader", 4);
        let (_, mut operator) = subscribe(&mut registry, "fifo", 4);

        let delivered =
            registry.broadcast_where(&Utf8Bytes::from("who"), Presence::sees_presence);

        assert_eq!(delivered, 2);
        assert!(admin.try_recv().is_ok());
        assert!(leader.try_recv().is_ok());
        assert!(operator.try_recv().is_err());
    }

    #[test]
    fn a_full_queue_does_not_block_or_evict() {
        let mut registry = ConnectionRegistry::new();
        let (slow_id, _slow) = subscribe(&mut registry, "fifo", 1);
        let (_, mut fast) = subscribe(&mut registry, "fifo", 4);

        registry.broadcast(&Utf8Bytes::from("one"));
        let delivered = registry.broadcast(&Utf8Bytes::from("two"));

        assert_eq!(delivered, 1);
        assert_eq!(registry.len(), 2);
        assert!(!registry.send_to(&slow_id, Utf8Bytes::from("three")));
        assert_eq!(fast.try_recv().unwrap().as_str(), "one");
        assert_eq!(fast.try_recv().unwrap().as_str(), "two");
    }

    #[test]
    fn unregister_is_idempotent_and_closes_the_queue() {
        let mut registry = ConnectionRegistry::new();
        let (id, mut rx) = subscribe(&mut registry, "fifo", 4);

        assert!(registry.unregister(&id).is_some());
        assert!(registry.unregister(&id).is_none());
        assert!(registry.is_empty());
        assert!(rx.try_recv().is_err());
        assert!(rx.is_closed());
    }
}
