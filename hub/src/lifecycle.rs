//! Per-connection liveness and teardown.
//!
//! Every subscriber runs two activities side by side: a reader that only watches for
//! frames (anything the client sends is discarded) and a writer that drains the hub's
//! outbound queue and sends a ping every `ping_period`. Whichever finishes first ends the
//! connection, the other is cancelled, and the subscriber is unregistered once.

use crate::connection::Presence;
use crate::manager::HubHandle;
use axum::body::Bytes;
use axum::extract::ws::{Message, Utf8Bytes, WebSocket};
use futures::{Sink, SinkExt, Stream, StreamExt};
use log::*;
use std::fmt::Display;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval_at, timeout, Instant, MissedTickBehavior};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecycleSettings {
    /// How long the reader waits for any frame (including pongs) before giving up.
    pub pong_wait: Duration,
    pub ping_period: Duration,
    pub write_wait: Duration,
    pub max_message_size: usize,
    pub outbound_capacity: usize,
}

impl LifecycleSettings {
    /// Pings go out at 90% of the pong window so a healthy client always answers in time.
    pub fn new(
        pong_wait: Duration,
        write_wait: Duration,
        max_message_size: usize,
        outbound_capacity: usize,
    ) -> Self {
        Self {
            pong_wait,
            ping_period: pong_wait * 9 / 10,
            write_wait,
            max_message_size,
            outbound_capacity: outbound_capacity.max(1),
        }
    }
}

impl Default for LifecycleSettings {
    fn default() -> Self {
        Self::new(Duration::from_secs(60), Duration::from_secs(10), 512, 32)
    }
}

/// Why a connection ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disconnect {
    ClientClosed,
    ReadError,
    ReadTimeout,
    WriteError,
    WriteTimeout,
    HubClosed,
}

/// Drives an upgraded WebSocket until it disconnects.
pub async fn serve(
    socket: WebSocket,
    presence: Presence,
    hub: HubHandle,
    settings: LifecycleSettings,
) -> Disconnect {
    let (sink, stream) = socket.split();
    run_connection(sink, stream, presence, hub, settings).await
}

/// Registers the subscriber, runs its reader and writer until one of them ends, then
/// unregisters it.
pub async fn run_connection<W, R, E>(
    mut sink: W,
    mut stream: R,
    presence: Presence,
    hub: HubHandle,
    settings: LifecycleSettings,
) -> Disconnect
where
    W: Sink<Message> + Unpin,
    W::Error: Display,
    R: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    let username = presence.username.clone();
    let (outbound_tx, mut outbound_rx) = mpsc::channel(settings.outbound_capacity);

    let connection_id = match hub.register(presence, outbound_tx).await {
        Ok(id) => id,
        Err(e) => {
            warn!("Rejecting subscriber {username}: {e}");
            let _ = timeout(settings.write_wait, sink.send(Message::Close(None))).await;
            return Disconnect::HubClosed;
        }
    };

    let disconnect = tokio::select! {
        reason = read_loop(&mut stream, settings.pong_wait) => reason,
        reason = write_loop(&mut sink, &mut outbound_rx, &settings) => reason,
    };

    info!("Connection {connection_id} ({username}) ended: {disconnect:?}");
    hub.unregister(connection_id).await;
    let _ = timeout(settings.write_wait, sink.close()).await;

    disconnect
}

async fn read_loop<R, E>(stream: &mut R, pong_wait: Duration) -> Disconnect
where
    R: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    loop {
        match timeout(pong_wait, stream.next()).await {
            Err(_) => return Disconnect::ReadTimeout,
            Ok(None) | Ok(Some(Ok(Message::Close(_)))) => return Disconnect::ClientClosed,
            Ok(Some(Ok(_))) => continue,
            Ok(Some(Err(e))) => {
                debug!("Read failed: {e}");
                return Disconnect::ReadError;
            }
        }
    }
}

async fn write_loop<W>(
    sink: &mut W,
    outbound: &mut mpsc::Receiver<Utf8Bytes>,
    settings: &LifecycleSettings,
) -> Disconnect
where
    W: Sink<Message> + Unpin,
    W::Error: Display,
{
    let mut ping = interval_at(Instant::now() + settings.ping_period, settings.ping_period);
    ping.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        let result = tokio::select! {
            payload = outbound.recv() => match payload {
                Some(payload) => write(sink, Message::Text(payload), settings.write_wait).await,
                None => {
                    let _ = write(sink, Message::Close(None), settings.write_wait).await;
                    return Disconnect::HubClosed;
                }
            },
            _ = ping.tick() => write(sink, Message::Ping(Bytes::new()), settings.write_wait).await,
        };

        if let Err(reason) = result {
            return reason;
        }
    }
}

async fn write<W>(sink: &mut W, message: Message, write_wait: Duration) -> Result<(), Disconnect>
where
    W: Sink<Message> + Unpin,
    W::Error: Display,
{
    match timeout(write_wait, sink.send(message)).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => {
            debug!("Write failed: {e}");
            Err(Disconnect::WriteError)
        }
        Err(_) => Err(Disconnect::WriteTimeout),
    }
}
