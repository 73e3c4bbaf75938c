//! Engine services.
//!
//! One service per concern, each a cheap-to-clone handle over the shared
//! [`StateStore`](crate::state::StateStore) and the gateway. Local state
//! changes only after the corresponding gateway call resolves; sequenced
//! writes go through store tickets so a stale response never clobbers a
//! newer one.

pub mod backup;
pub mod cart;
pub mod checkout;
pub mod discounts;
pub mod inquiries;
pub mod inventory;
pub mod notifications;
pub mod orders;
pub mod session;

pub use backup::BackupService;
pub use cart::CartService;
pub use checkout::CheckoutService;
pub use discounts::DiscountService;
pub use inquiries::InquiryService;
pub use inventory::InventoryService;
pub use notifications::NotificationService;
pub use orders::OrderService;
pub use session::SessionService;

use std::sync::Arc;

use tracing::instrument;

use crate::errors::ServiceError;
use crate::gateway::RemoteGateway;
use crate::state::{EntityKind, StateStore};

/// Re-fetches every collection from the backend and replaces the local
/// copies. Used on login and after a successful restore.
#[instrument(skip(store, gateway))]
pub(crate) async fn sync_collections(
    store: &StateStore,
    gateway: &Arc<dyn RemoteGateway>,
) -> Result<(), ServiceError> {
    let inventory_ticket = store.ticket(EntityKind::Inventory);
    let inventory = gateway.fetch_inventory().await?;
    store
        .apply(inventory_ticket, |state| state.inventory = inventory)
        .await;

    let discounts_ticket = store.ticket(EntityKind::Discounts);
    let discounts = gateway.fetch_discounts().await?;
    store
        .apply(discounts_ticket, |state| state.discounts = discounts)
        .await;

    let orders_ticket = store.ticket(EntityKind::Orders);
    let orders = gateway.fetch_orders().await?;
    store
        .apply(orders_ticket, |state| state.orders = orders)
        .await;

    let users_ticket = store.ticket(EntityKind::Users);
    let users = gateway.fetch_users().await?;
    store.apply(users_ticket, |state| state.users = users).await;

    let inquiries_ticket = store.ticket(EntityKind::Inquiries);
    let inquiries = gateway.fetch_inquiries().await?;
    store
        .apply(inquiries_ticket, |state| state.inquiries = inquiries)
        .await;

    Ok(())
}
