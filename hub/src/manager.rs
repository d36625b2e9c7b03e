use crate::connection::{ConnectionId, ConnectionRegistry, Presence, Subscriber};
use crate::message::{OnlineUser, OutboundMessage};
use crate::queue_state::{self, QueueStateSource};
use axum::extract::ws::Utf8Bytes;
use log::*;
use std::fmt;
use tokio::sync::{
    mpsc::{self, error::TrySendError},
    oneshot,
};
use tokio::task::JoinHandle;

/// Capacity of the command queue when none is configured.
pub const DEFAULT_COMMAND_CAPACITY: usize = 64;

enum Command {
    Register {
        presence: Presence,
        outbound: mpsc::Sender<Utf8Bytes>,
        reply: oneshot::Sender<ConnectionId>,
    },
    Unregister {
        connection_id: ConnectionId,
        reply: oneshot::Sender<bool>,
    },
    Shutdown,
}

/// The hub loop is no longer running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HubClosed;

impl fmt::Display for HubClosed {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "queue hub is not running")
    }
}

impl std::error::Error for HubClosed {}

/// Owns the connection registry and serializes every mutation and fan-out through a single
/// loop. Handlers talk to it through a [`HubHandle`].
pub struct Hub<S> {
    source: S,
    registry: ConnectionRegistry,
    commands: mpsc::Receiver<Command>,
    refresh: mpsc::Receiver<()>,
}

/// Cheap, cloneable entry point to a running [`Hub`].
#[derive(Clone)]
pub struct HubHandle {
    commands: mpsc::Sender<Command>,
    // Capacity one: a pending trigger already covers any state committed before it runs.
    refresh: mpsc::Sender<()>,
}

impl<S: QueueStateSource + 'static> Hub<S> {
    pub fn new(source: S, command_capacity: usize) -> (Self, HubHandle) {
        let (command_tx, command_rx) = mpsc::channel(command_capacity.max(1));
        let (refresh_tx, refresh_rx) = mpsc::channel(1);

        let hub = Self {
            source,
            registry: ConnectionRegistry::new(),
            commands: command_rx,
            refresh: refresh_rx,
        };
        let handle = HubHandle {
            commands: command_tx,
            refresh: refresh_tx,
        };
        (hub, handle)
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Processes commands and refresh triggers until shut down or until every handle is
    /// dropped. The registry is cleared on the way out, closing every subscriber queue.
    pub async fn run(mut self) {
        info!("Queue hub started");

        loop {
            tokio::select! {
                biased;

                command = self.commands.recv() => match command {
                    Some(Command::Register { presence, outbound, reply }) => {
                        let connection_id = self.register(presence, outbound).await;
                        let _ = reply.send(connection_id);
                    }
                    Some(Command::Unregister { connection_id, reply }) => {
                        let removed = self.unregister(&connection_id);
                        let _ = reply.send(removed);
                    }
                    Some(Command::Shutdown) | None => break,
                },
                Some(()) = self.refresh.recv() => self.broadcast_queue_update().await,
            }
        }

        info!(
            "Queue hub stopping, closing {} connection(s)",
            self.registry.len()
        );
        self.registry.clear();
    }

    async fn register(
        &mut self,
        presence: Presence,
        outbound: mpsc::Sender<Utf8Bytes>,
    ) -> ConnectionId {
        let connection_id = ConnectionId::new();
        info!(
            "Subscriber connected: {} ({}) as {connection_id}",
            presence.username, presence.role
        );
        self.registry.register(connection_id, Subscriber { presence, outbound });

        let state = queue_state::snapshot(&self.source).await;
        if let Some(payload) = encode(&OutboundMessage::QueueUpdate(state)) {
            self.registry.send_to(&connection_id, payload);
        }
        self.broadcast_presence();

        connection_id
    }

    fn unregister(&mut self, connection_id: &ConnectionId) -> bool {
        match self.registry.unregister(connection_id) {
            Some(subscriber) => {
                info!(
                    "Subscriber disconnected: {} ({connection_id})",
                    subscriber.presence.username
                );
                // Dropping the subscriber closes its outbound queue.
                drop(subscriber);
                self.broadcast_presence();
                true
            }
            None => {
                debug!("Connection {connection_id} already unregistered");
                false
            }
        }
    }

    async fn broadcast_queue_update(&mut self) {
        if self.registry.is_empty() {
            trace!("No subscribers, skipping queue update");
            return;
        }

        let state = queue_state::snapshot(&self.source).await;
        if let Some(payload) = encode(&OutboundMessage::QueueUpdate(state)) {
            let delivered = self.registry.broadcast(&payload);
            debug!(
                "Queue update delivered to {delivered} of {} subscriber(s)",
                self.registry.len()
            );
        }
    }

    fn broadcast_presence(&self) {
        let data: Vec<OnlineUser> = self
            .registry
            .presence_list()
            .into_iter()
            .map(OnlineUser::from)
            .collect();

        if let Some(payload) = encode(&OutboundMessage::OnlineUsers { data }) {
            self.registry
                .broadcast_where(&payload, Presence::sees_presence);
        }
    }
}

fn encode(message: &OutboundMessage) -> Option<Utf8Bytes> {
    match message.encode() {
        Ok(payload) => Some(payload),
        Err(e) => {
            error!("Failed to serialize hub message: {e}");
            None
        }
    }
}

impl HubHandle {
    /// Adds a subscriber. The hub immediately queues a full snapshot for it and refreshes
    /// the online users panel.
    pub async fn register(
        &self,
        presence: Presence,
        outbound: mpsc::Sender<Utf8Bytes>,
    ) -> Result<ConnectionId, HubClosed> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Command::Register {
                presence,
                outbound,
                reply,
            })
            .await
            .map_err(|_| HubClosed)?;
        response.await.map_err(|_| HubClosed)
    }

    /// Removes a subscriber. Returns `false` when it was already gone (or the hub stopped),
    /// which makes concurrent teardown paths safe to call twice.
    pub async fn unregister(&self, connection_id: ConnectionId) -> bool {
        let (reply, response) = oneshot::channel();
        if self
            .commands
            .send(Command::Unregister {
                connection_id,
                reply,
            })
            .await
            .is_err()
        {
            return false;
        }
        response.await.unwrap_or(false)
    }

    /// Asks the hub to recompute and push the queue state. Never waits: if a refresh is
    /// already pending this one is folded into it.
    pub fn broadcast_queue_update(&self) {
        match self.refresh.try_send(()) {
            Ok(()) => trace!("Queue refresh requested"),
            Err(TrySendError::Full(())) => trace!("Queue refresh already pending"),
            Err(TrySendError::Closed(())) => warn!("Queue refresh requested after hub shutdown"),
        }
    }

    /// Stops the hub loop, closing every subscriber.
    pub async fn shutdown(&self) {
        if self.commands.send(Command::Shutdown).await.is_err() {
            debug!("Queue hub already stopped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use entity::buffer::Buffer;
    use entity::packages;
    use entity::profile::Profile;
    use entity::Id;
    use entity_api::error::Error;
    use serde_json::Value;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::mpsc::Receiver;
    use tokio::time::timeout;

    #[derive(Clone, Default)]
    struct FakeSource {
        packages: Vec<packages::Model>,
        reads: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl QueueStateSource for FakeSource {
        async fn active_packages(&self) -> Result<Vec<packages::Model>, Error> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            Ok(self.packages.clone())
        }
    }

    fn package(profile: Profile) -> packages::Model {
        let now = Utc::now();
        packages::Model {
            id: Id::new_v4(),
            tracking_id: "CG000001".to_owned(),
            buffer: Buffer::Rts,
            location: "R-01".to_owned(),
            entry_timestamp: Some(now.into()),
            profile,
            profile_value: profile.value(),
            active: true,
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    fn presence(role: &str) -> Presence {
        Presence {
            user_id: Id::new_v4(),
            full_name: format!("{role} user"),
            username: role.to_owned(),
            role: role.to_owned(),
            department: "Inbound".to_owned(),
        }
    }

    async fn connect(hub: &HubHandle, role: &str) -> (ConnectionId, Receiver<Utf8Bytes>) {
        let (tx, rx) = mpsc::channel(16);
        let id = hub.register(presence(role), tx).await.unwrap();
        (id, rx)
    }

    async fn next_json(rx: &mut Receiver<Utf8Bytes>) -> Value {
        let payload = timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("timed out waiting for a hub message")
            .expect("outbound queue closed");
        serde_json::from_str(payload.as_str()).unwrap()
    }

    fn drain_types(rx: &mut Receiver<Utf8Bytes>) -> Vec<String> {
        let mut types = Vec::new();
        while let Ok(payload) = rx.try_recv() {
            let value: Value = serde_json::from_str(payload.as_str()).unwrap();
            types.push(value["type"].as_str().unwrap_or_default().to_owned());
        }
        types
    }

    #[tokio::test]
    async fn register_sends_a_snapshot_to_the_new_subscriber() {
        let source = FakeSource {
            packages: vec![
                package(Profile::Small),
                package(Profile::Medium),
                package(Profile::Large),
            ],
            ..Default::default()
        };
        let (hub, handle) = Hub::new(source, DEFAULT_COMMAND_CAPACITY);
        hub.spawn();

        let (_, mut rx) = connect(&handle, "fifo").await;
        let update = next_json(&mut rx).await;

        assert_eq!(update["type"], "queue_update");
        assert_eq!(update["bufferCounts"]["RTS"], 3);
        assert_eq!(update["bufferValues"]["RTS"], 340);
        assert_eq!(update["queue"].as_array().map(Vec::len), Some(3));
    }

    #[tokio::test]
    async fn presence_goes_to_admins_and_leaders_only() {
        let (hub, handle) = Hub::new(FakeSource::default(), DEFAULT_COMMAND_CAPACITY);
        hub.spawn();

        let (_, mut admin) = connect(&handle, "admin").await;
        let (_, mut leader) = connect(&handle, "leader").await;
        let (_, mut operator) = connect(&handle, "fifo").await;

        let admin_types = drain_types(&mut admin);
        let leader_types = drain_types(&mut leader);
        let operator_types = drain_types(&mut operator);

        assert!(admin_types.contains(&"online_users".to_owned()));
        assert!(leader_types.contains(&"online_users".to_owned()));
        assert_eq!(operator_types, vec!["queue_update"]);
    }

    #[tokio::test]
    async fn unregister_is_idempotent_and_refreshes_presence() {
        let (hub, handle) = Hub::new(FakeSource::default(), DEFAULT_COMMAND_CAPACITY);
        hub.spawn();

        let (_, mut admin) = connect(&handle, "admin").await;
        let (operator_id, mut operator) = connect(&handle, "fifo").await;
        drain_types(&mut admin);

        let (first, second) = tokio::join!(
            handle.unregister(operator_id),
            handle.unregister(operator_id)
        );

        assert!(first ^ second, "exactly one unregister should remove");
        let presence = next_json(&mut admin).await;
        assert_eq!(presence["type"], "online_users");
        assert_eq!(presence["data"].as_array().map(Vec::len), Some(1));
        // Only one presence refresh for the single removal.
        assert!(admin.try_recv().is_err());
        // The removed subscriber's queue is closed once drained.
        drain_types(&mut operator);
        assert!(operator.recv().await.is_none());
    }

    #[tokio::test]
    async fn broadcast_reaches_every_subscriber_with_the_same_payload() {
        let (hub, handle) = Hub::new(FakeSource::default(), DEFAULT_COMMAND_CAPACITY);
        hub.spawn();

        let (_, mut first) = connect(&handle, "fifo").await;
        let (_, mut second) = connect(&handle, "fifo").await;
        drain_types(&mut first);
        drain_types(&mut second);

        handle.broadcast_queue_update();

        let from_first = timeout(Duration::from_secs(1), first.recv()).await.unwrap();
        let from_second = timeout(Duration::from_secs(1), second.recv()).await.unwrap();
        assert_eq!(from_first, from_second);
    }

    #[tokio::test]
    async fn a_dead_subscriber_does_not_block_the_others() {
        let (hub, handle) = Hub::new(FakeSource::default(), DEFAULT_COMMAND_CAPACITY);
        hub.spawn();

        let (_, dead) = connect(&handle, "fifo").await;
        drop(dead);
        let (_, mut alive) = connect(&handle, "fifo").await;
        drain_types(&mut alive);

        handle.broadcast_queue_update();

        let update = next_json(&mut alive).await;
        assert_eq!(update["type"], "queue_update");
    }

    #[tokio::test]
    async fn refresh_triggers_coalesce_while_one_is_pending() {
        let source = FakeSource::default();
        let reads = Arc::clone(&source.reads);
        // Not spawned yet, so triggers pile up against the capacity-one channel.
        let (hub, handle) = Hub::new(source, DEFAULT_COMMAND_CAPACITY);
        let (tx, mut rx) = mpsc::channel(16);

        for _ in 0..10 {
            handle.broadcast_queue_update();
        }
        let registration = {
            let handle = handle.clone();
            tokio::spawn(async move { handle.register(presence("fifo"), tx).await })
        };
        hub.spawn();
        registration.await.unwrap().unwrap();

        // Drain whatever arrived: one snapshot for the registration, at most one refresh.
        tokio::time::sleep(Duration::from_millis(50)).await;
        let updates = drain_types(&mut rx)
            .into_iter()
            .filter(|t| t == "queue_update")
            .count();
        assert!(updates <= 2);
        assert!(reads.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn shutdown_closes_every_subscriber() {
        let (hub, handle) = Hub::new(FakeSource::default(), DEFAULT_COMMAND_CAPACITY);
        let task = hub.spawn();

        let (_, mut rx) = connect(&handle, "leader").await;
        drain_types(&mut rx);
        handle.shutdown().await;
        task.await.unwrap();

        assert!(rx.recv().await.is_none());
        assert_eq!(
            handle.register(presence("fifo"), mpsc::channel(1).0).await,
            Err(HubClosed)
        );
        assert!(!handle.unregister(ConnectionId::new()).await);
    }

    #[tokio::test]
    async fn dropping_every_handle_stops_the_hub() {
        let (hub, handle) = Hub::new(FakeSource::default(), DEFAULT_COMMAND_CAPACITY);
        let task = hub.spawn();

        drop(handle);

        timeout(Duration::from_secs(1), task)
            .await
            .expect("hub should stop")
            .unwrap();
    }
}
