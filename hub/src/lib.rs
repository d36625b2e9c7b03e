//! Live queue-state broadcast hub.
//!
//! Dashboards subscribe over a WebSocket and receive a full queue snapshot on connect and
//! after every committed entry, exit or move. Admins and leaders additionally receive the
//! list of users currently connected.
//!
//! # Architecture
//!
//! - **Single owner**: the [`Hub`] loop owns the [`connection::ConnectionRegistry`]. All
//!   registrations, removals and fan-outs go through it one at a time, so no subscriber
//!   ever observes an interleaved registry state.
//! - **Handle**: request handlers hold a cloneable [`HubHandle`]. Register and unregister
//!   are request/reply commands over a bounded channel; queue refreshes are
//!   fire-and-forget and coalesce while one is pending.
//! - **Recompute, don't patch**: each refresh re-reads the active packages inside a
//!   read-only transaction and derives the aggregates from scratch
//!   ([`queue_state::compute`]).
//! - **Bounded outbound queues**: every subscriber gets its own queue, drained by its
//!   lifecycle task. A full or closed queue is skipped, never awaited.
//!
//! # Modules
//!
//! - `connection`: connection ids, presence metadata and the registry
//! - `domain_event_handler`: bridges post-commit domain events into refresh triggers
//! - `lifecycle`: per-connection reader/writer, heartbeats and teardown
//! - `manager`: the hub loop and its handle
//! - `message`: wire messages pushed to subscribers
//! - `queue_state`: the queue state computer and its store-backed source

pub mod connection;
pub mod domain_event_handler;
pub mod lifecycle;
pub mod manager;
pub mod message;
pub mod queue_state;

pub use manager::{Hub, HubClosed, HubHandle};
