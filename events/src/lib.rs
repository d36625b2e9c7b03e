//! Post-commit notifications for the FIFO platform.
//!
//! Domain operations publish a [`DomainEvent`] once their transaction has committed.
//! Infrastructure (the live queue hub, for instance) subscribes by registering an
//! [`EventHandler`] with the [`EventPublisher`] held in application state.
//!
//! This crate has no dependencies on internal crates (entity, domain, etc.),
//! avoiding circular dependencies. Entity data is carried as serialized JSON values.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

/// A type alias that represents any Entity's internal id field data type.
/// This matches the definition in the entity crate to maintain compatibility.
pub type Id = Uuid;

/// Business-level changes to the FIFO queue.
#[derive(Debug, Clone)]
pub enum DomainEvent {
    /// A package entered a buffer, either for the first time or after a previous exit.
    PackageEntered {
        package_id: Id,
        tracking_id: String,
        /// The package as persisted after the entry.
        package: Value,
        actor_id: Id,
    },
    /// A package left the queue and was marked inactive.
    PackageExited {
        package_id: Id,
        tracking_id: String,
        actor_id: Id,
    },
    /// A package changed location inside its buffer.
    PackageMoved {
        package_id: Id,
        tracking_id: String,
        from_location: String,
        package: Value,
        actor_id: Id,
    },
}

impl DomainEvent {
    pub fn tracking_id(&self) -> &str {
        match self {
            DomainEvent::PackageEntered { tracking_id, .. }
            | DomainEvent::PackageExited { tracking_id, .. }
            | DomainEvent::PackageMoved { tracking_id, .. } => tracking_id,
        }
    }
}

/// Trait for handling domain events.
/// Implementations can perform side effects like sending notifications,
/// updating caches, logging, etc.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: &DomainEvent);
}

/// Publishes domain events to registered handlers.
/// Handlers are called sequentially in registration order.
#[derive(Clone)]
pub struct EventPublisher {
    handlers: Arc<Vec<Arc<dyn EventHandler>>>,
}

impl EventPublisher {
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(Vec::new()),
        }
    }

    /// Register a new event handler.
    /// Note: This creates a new publisher instance with the additional handler.
    /// Store the returned publisher in your application state.
    pub fn with_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        let mut handlers = (*self.handlers).clone();
        handlers.push(handler);
        self.handlers = Arc::new(handlers);
        self
    }

    /// Publish an event to all registered handlers, in registration order.
    pub async fn publish(&self, event: DomainEvent) {
        for handler in self.handlers.iter() {
            handler.handle(&event).await;
        }
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new()
    }
}
