//! Engine event pipeline.
//!
//! Cross-entity side effects run here rather than inline in the CRUD
//! operation that triggered them: a service finishes its gateway round-trip,
//! publishes an event, and the processor applies the dependent rules. This
//! keeps the low-stock rule testable independent of the inventory mutation
//! that fires it.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::errors::ServiceError;
use crate::gateway::RemoteGateway;
use crate::models::{EmailMessage, InventoryItem, NotificationKind};
use crate::services::NotificationService;
use crate::state::StateStore;

/// Events published by the engine's services.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// An inventory item finished a gateway update. `previous` is the item
    /// as local state knew it before the call, `current` the authoritative
    /// post-update state returned by the backend.
    InventoryUpdated {
        previous: InventoryItem,
        current: InventoryItem,
    },
}

/// Cloneable sending half of the event channel.
#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    pub async fn send(&self, event: Event) -> Result<(), ServiceError> {
        self.sender
            .send(event)
            .await
            .map_err(|e| ServiceError::EventError(e.to_string()))
    }
}

/// Whether an update took the item from above its threshold to at or below
/// it. Edge-triggered: an item that was already low does not re-fire on the
/// next edit.
pub fn is_low_stock_crossing(previous: &InventoryItem, current: &InventoryItem) -> bool {
    previous.quantity > previous.threshold && current.quantity <= current.threshold
}

/// Consumes engine events and applies their side effects.
#[derive(Clone)]
pub struct EventProcessor {
    store: StateStore,
    gateway: Arc<dyn RemoteGateway>,
    notifications: NotificationService,
}

impl EventProcessor {
    pub fn new(
        store: StateStore,
        gateway: Arc<dyn RemoteGateway>,
        notifications: NotificationService,
    ) -> Self {
        Self {
            store,
            gateway,
            notifications,
        }
    }

    /// Spawns the processing loop on the current runtime.
    pub fn spawn(self, receiver: mpsc::Receiver<Event>) -> JoinHandle<()> {
        tokio::spawn(self.run(receiver))
    }

    async fn run(self, mut receiver: mpsc::Receiver<Event>) {
        info!("event processor started");
        while let Some(event) = receiver.recv().await {
            match event {
                Event::InventoryUpdated { previous, current } => {
                    self.handle_inventory_updated(previous, current).await;
                }
            }
        }
        info!("event processor stopped");
    }

    async fn handle_inventory_updated(&self, previous: InventoryItem, current: InventoryItem) {
        if !is_low_stock_crossing(&previous, &current) {
            return;
        }

        info!(
            sku = %current.sku,
            quantity = current.quantity,
            threshold = current.threshold,
            "low-stock crossing detected"
        );

        self.notifications
            .push(
                NotificationKind::Warning,
                format!(
                    "Low stock: {} ({}) is down to {} (threshold {})",
                    current.name, current.sku, current.quantity, current.threshold
                ),
            )
            .await;

        let recipients = self.store.read(|state| state.manager_emails()).await;
        if recipients.is_empty() {
            warn!(sku = %current.sku, "no manager recipients for low-stock alert");
            return;
        }

        let email = EmailMessage {
            recipient: recipients.join(","),
            subject: format!("Low stock alert: {}", current.name),
            body: format!(
                "{} (SKU {}) has dropped to {} units, at or below its threshold of {}. \
                 Please restock.",
                current.name, current.sku, current.quantity, current.threshold
            ),
            attachment: None,
        };

        if let Err(e) = self.gateway.send_email(email).await {
            warn!(error = %e, sku = %current.sku, "failed to send low-stock alert email");
            self.notifications
                .push(
                    NotificationKind::Error,
                    "Failed to send the low-stock alert email",
                )
                .await;
        }
    }
}
