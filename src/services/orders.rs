//! Order administration.
//!
//! Orders are created only by checkout; staff mutate nothing but the status,
//! and only along the allowed transitions. An invalid transition is rejected
//! before any network call.

use std::sync::Arc;

use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::gateway::RemoteGateway;
use crate::models::{NotificationKind, Order, OrderStatus};
use crate::services::NotificationService;
use crate::state::{EntityKind, StateStore};

#[derive(Clone)]
pub struct OrderService {
    store: StateStore,
    gateway: Arc<dyn RemoteGateway>,
    notifications: NotificationService,
}

impl OrderService {
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

    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn update_order_status(
        &self,
        id: Uuid,
        new_status: OrderStatus,
    ) -> Result<Order, ServiceError> {
        let current_status = self
            .store
            .read(|state| {
                state
                    .orders
                    .iter()
                    .find(|order| order.id == id)
                    .map(|order| order.status)
            })
            .await
            .ok_or_else(|| ServiceError::NotFound(format!("order {id}")))?;

        if !current_status.can_transition_to(new_status) {
            return Err(ServiceError::InvalidStatus(format!(
                "cannot move an order from {current_status} to {new_status}"
            )));
        }

        let ticket = self.store.ticket(EntityKind::Orders);
        let updated = self.gateway.update_order_status(id, new_status).await?;
        info!(order_number = %updated.order_number, status = %updated.status, "order status updated");

        self.store
            .apply(ticket, |state| {
                if let Some(order) = state.orders.iter_mut().find(|o| o.id == id) {
                    *order = updated.clone();
                }
            })
            .await;

        self.notifications
            .push(
                NotificationKind::Info,
                format!("Order {} is now {}", updated.order_number, updated.status),
            )
            .await;
        Ok(updated)
    }
}
