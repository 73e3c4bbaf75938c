//! Checkout orchestrator.
//!
//! Composes the discount selector, the cart and the gateway into one
//! user-facing action. The backend is the sole point of truth for the stock
//! decrement and the final total; this side only proposes a discount
//! percentage and reconciles afterwards. A failed checkout leaves the cart
//! and every other piece of local state untouched, so the user can retry
//! immediately.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::errors::ServiceError;
use crate::gateway::{CreateOrderRequest, RemoteGateway};
use crate::models::{
    CustomerDetails, EmailMessage, NotificationKind, Order, OrderLine,
};
use crate::services::discounts;
use crate::services::{InventoryService, NotificationService};
use crate::state::{EntityKind, StateStore};

const OUT_OF_STOCK_FALLBACK: &str =
    "Checkout failed: the requested quantities are no longer in stock";

#[derive(Clone)]
pub struct CheckoutService {
    store: StateStore,
    gateway: Arc<dyn RemoteGateway>,
    inventory: InventoryService,
    notifications: NotificationService,
}

impl CheckoutService {
    pub fn new(
        store: StateStore,
        gateway: Arc<dyn RemoteGateway>,
        inventory: InventoryService,
        notifications: NotificationService,
    ) -> Self {
        Self {
            store,
            gateway,
            inventory,
            notifications,
        }
    }

    /// Runs the full checkout pipeline against the current cart.
    ///
    /// On success the returned order is appended to local state, inventory
    /// is re-fetched for the authoritative post-sale quantities, the cart is
    /// cleared and a receipt email goes out to the customer. On failure no
    /// local state moves at all.
    #[instrument(skip(self, customer), fields(customer_email = %customer.email))]
    pub async fn checkout(&self, customer: CustomerDetails) -> Result<Order, ServiceError> {
        customer.validate()?;

        let (cart, discounts, creator) = self
            .store
            .read(|state| {
                (
                    state.cart.clone(),
                    state.discounts.clone(),
                    state.current_user.as_ref().map(|u| u.id),
                )
            })
            .await;

        let creator = creator
            .ok_or_else(|| ServiceError::AuthError("no authenticated user".to_string()))?;
        if cart.is_empty() {
            return Err(ServiceError::InvalidOperation(
                "cannot check out an empty cart".to_string(),
            ));
        }

        let subtotal: Decimal = cart.iter().map(|line| line.line_total()).sum();
        let total_items: u32 = cart.iter().map(|line| line.quantity).sum();

        let selected = discounts::best_applicable(&discounts, subtotal, total_items);
        let discount_percent =
            selected.map(|discount| discounts::effective_percent(discount, subtotal));
        let selected_id = selected.map(|discount| discount.id);

        let request = CreateOrderRequest {
            customer: customer.clone(),
            items: cart
                .iter()
                .map(|line| OrderLine {
                    item_id: line.item.id,
                    sku: line.item.sku.clone(),
                    name: line.item.name.clone(),
                    quantity: line.quantity,
                    unit_price: line.item.price,
                })
                .collect(),
            discount_percent,
            created_by: creator,
        };

        let ticket = self.store.ticket(EntityKind::Orders);
        let order = match self.gateway.create_order(request).await {
            Ok(order) => order,
            Err(e) => {
                warn!(error = %e, "order creation failed");
                let message = e
                    .server_message()
                    .map(str::to_string)
                    .unwrap_or_else(|| OUT_OF_STOCK_FALLBACK.to_string());
                self.notifications
                    .push(NotificationKind::Error, message)
                    .await;
                return Err(e.into());
            }
        };

        info!(order_id = %order.id, order_number = %order.order_number, "order placed");

        let applied = self
            .store
            .apply(ticket, |state| {
                state.orders.push(order.clone());
                state.cart.clear();
                if let Some(id) = selected_id {
                    if let Some(discount) =
                        state.discounts.iter_mut().find(|d| d.id == id)
                    {
                        discount.usage_count += 1;
                    }
                }
            })
            .await;

        // Session cleared while the request was in flight; the order exists
        // server-side but nothing local may change.
        if applied.is_none() {
            return Ok(order);
        }

        if let Err(e) = self.inventory.refresh().await {
            warn!(error = %e, "post-checkout inventory refresh failed");
            self.notifications
                .push(
                    NotificationKind::Warning,
                    "Order placed, but refreshing inventory failed; quantities may be stale",
                )
                .await;
        }

        self.notifications
            .push(
                NotificationKind::Success,
                format!("Order {} placed", order.order_number),
            )
            .await;

        let receipt = EmailMessage {
            recipient: customer.email.clone(),
            subject: format!("Your order {}", order.order_number),
            body: format!(
                "Thank you for your order, {}. Order {} for {} item(s) totalling {} is being processed.",
                customer.name, order.order_number, total_items, order.total
            ),
            attachment: None,
        };
        if let Err(e) = self.gateway.send_email(receipt).await {
            warn!(error = %e, order_id = %order.id, "failed to send receipt email");
            self.notifications
                .push(NotificationKind::Error, "Failed to send the receipt email")
                .await;
        }

        Ok(order)
    }
}
