use crate::manager::HubHandle;
use async_trait::async_trait;
use events::{DomainEvent, EventHandler};
use log::*;

/// Turns committed queue changes into hub refresh triggers.
///
/// Every package event affects the aggregate view, so the handler does not inspect the
/// payload beyond logging. Triggers coalesce inside the hub, which keeps a burst of
/// entries down to a single recompute.
pub struct HubDomainEventHandler {
    hub: HubHandle,
}

impl HubDomainEventHandler {
    pub fn new(hub: HubHandle) -> Self {
        Self { hub }
    }
}

#[async_trait]
impl EventHandler for HubDomainEventHandler {
    async fn handle(&self, event: &DomainEvent) {
        match event {
            DomainEvent::PackageEntered { tracking_id, .. } => {
                debug!("Handling PackageEntered event for {tracking_id}");
            }
            DomainEvent::PackageExited { tracking_id, .. } => {
                debug!("Handling PackageExited event for {tracking_id}");
            }
            DomainEvent::PackageMoved {
                tracking_id,
                from_location,
                ..
            } => {
                debug!("Handling PackageMoved event for {tracking_id} (from {from_location})");
            }
        }

        self.hub.broadcast_queue_update();
    }
}
