//! Inventory CRUD and the update watcher.
//!
//! Every mutation round-trips through the gateway before local state moves.
//! Updates additionally publish an [`Event::InventoryUpdated`] carrying the
//! pre/post pair so the low-stock rule runs in the event processor, not
//! inline here.

use std::sync::Arc;

use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::gateway::RemoteGateway;
use crate::models::{InventoryItem, NewInventoryItem, UserRole};
use crate::state::{EntityKind, StateStore};

#[derive(Clone)]
pub struct InventoryService {
    store: StateStore,
    gateway: Arc<dyn RemoteGateway>,
    event_sender: Option<Arc<EventSender>>,
}

impl InventoryService {
    pub fn new(
        store: StateStore,
        gateway: Arc<dyn RemoteGateway>,
        event_sender: Option<Arc<EventSender>>,
    ) -> Self {
        Self {
            store,
            gateway,
            event_sender,
        }
    }

    /// Replaces the local inventory with the backend's authoritative copy.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<Vec<InventoryItem>, ServiceError> {
        let ticket = self.store.ticket(EntityKind::Inventory);
        let inventory = self.gateway.fetch_inventory().await?;
        self.store
            .apply(ticket, |state| state.inventory = inventory.clone())
            .await;
        Ok(inventory)
    }

    #[instrument(skip(self, item), fields(sku = %item.sku))]
    pub async fn create_item(&self, item: NewInventoryItem) -> Result<InventoryItem, ServiceError> {
        let ticket = self.store.ticket(EntityKind::Inventory);
        let created = self.gateway.create_inventory_item(item).await?;
        info!(item_id = %created.id, sku = %created.sku, "inventory item created");

        self.store
            .apply(ticket, |state| state.inventory.push(created.clone()))
            .await;
        Ok(created)
    }

    /// Updates an item and watches the result for a low-stock crossing.
    ///
    /// The pre-update state is the item as local state last knew it; the
    /// post-update state is whatever the backend returns, which wins.
    #[instrument(skip(self, item), fields(item_id = %item.id))]
    pub async fn update_item(&self, item: InventoryItem) -> Result<InventoryItem, ServiceError> {
        let previous = self
            .store
            .read(|state| {
                state
                    .inventory
                    .iter()
                    .find(|i| i.id == item.id)
                    .cloned()
            })
            .await
            .ok_or_else(|| ServiceError::NotFound(format!("inventory item {}", item.id)))?;

        let ticket = self.store.ticket(EntityKind::Inventory);
        let current = self.gateway.update_inventory_item(item).await?;

        let applied = self
            .store
            .apply(ticket, |state| {
                if let Some(existing) =
                    state.inventory.iter_mut().find(|i| i.id == current.id)
                {
                    *existing = current.clone();
                }
            })
            .await;

        // A stale or post-logout response carries no side effects.
        if applied.is_some() {
            if let Some(sender) = &self.event_sender {
                let event = Event::InventoryUpdated {
                    previous,
                    current: current.clone(),
                };
                if let Err(e) = sender.send(event).await {
                    warn!(error = %e, item_id = %current.id, "failed to publish inventory update event");
                }
            }
        }

        Ok(current)
    }

    /// Deletes an item. Gated to admins.
    #[instrument(skip(self))]
    pub async fn delete_item(&self, id: Uuid) -> Result<(), ServiceError> {
        let role = self
            .store
            .read(|state| state.current_user.as_ref().map(|u| u.role))
            .await;
        match role {
            Some(UserRole::Admin) => {}
            Some(_) => {
                return Err(ServiceError::Forbidden(
                    "only admins may delete inventory items".to_string(),
                ))
            }
            None => {
                return Err(ServiceError::AuthError(
                    "no authenticated user".to_string(),
                ))
            }
        }

        let ticket = self.store.ticket(EntityKind::Inventory);
        self.gateway.delete_inventory_item(id).await?;
        info!(item_id = %id, "inventory item deleted");

        self.store
            .apply(ticket, |state| state.inventory.retain(|i| i.id != id))
            .await;
        Ok(())
    }
}
