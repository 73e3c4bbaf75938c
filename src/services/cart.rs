//! Cart manager: the session-owned line-item collection.
//!
//! The cart never talks to the network. Its one invariant is that no line
//! exceeds the stock known at the time of the last successful mutation;
//! staleness against other sessions' checkouts is resolved only when this
//! session checks out.

use tracing::debug;
use uuid::Uuid;

use crate::models::{CartLine, InventoryItem};
use crate::state::StateStore;

#[derive(Clone)]
pub struct CartService {
    store: StateStore,
}

impl CartService {
    pub fn new(store: StateStore) -> Self {
        Self { store }
    }

    /// Adds `quantity` of `item`, merging into an existing line when one
    /// exists. Returns `false` without mutating when the merged quantity
    /// would exceed the item's stock.
    pub async fn add_to_cart(&self, item: InventoryItem, quantity: u32) -> bool {
        if quantity == 0 {
            return false;
        }
        self.store
            .write(|state| {
                let stock = state
                    .inventory
                    .iter()
                    .find(|i| i.id == item.id)
                    .map(|i| i.quantity)
                    .unwrap_or(item.quantity);
                let existing = state
                    .cart
                    .iter()
                    .find(|line| line.item.id == item.id)
                    .map(|line| line.quantity)
                    .unwrap_or(0);

                if existing + quantity > stock {
                    debug!(item_id = %item.id, existing, quantity, stock, "add to cart refused");
                    return false;
                }

                match state.cart.iter_mut().find(|line| line.item.id == item.id) {
                    Some(line) => line.quantity += quantity,
                    None => state.cart.push(CartLine { item, quantity }),
                }
                true
            })
            .await
    }

    /// Sets a line's quantity. Zero removes the line; a quantity above the
    /// current stock is refused silently (`false`, no mutation).
    pub async fn update_quantity(&self, item_id: Uuid, new_quantity: u32) -> bool {
        self.store
            .write(|state| {
                if new_quantity == 0 {
                    state.cart.retain(|line| line.item.id != item_id);
                    return true;
                }

                let Some(line) = state.cart.iter_mut().find(|line| line.item.id == item_id)
                else {
                    return false;
                };
                let stock = state
                    .inventory
                    .iter()
                    .find(|i| i.id == item_id)
                    .map(|i| i.quantity)
                    .unwrap_or(line.item.quantity);

                if new_quantity > stock {
                    debug!(%item_id, new_quantity, stock, "quantity update refused");
                    return false;
                }
                line.quantity = new_quantity;
                true
            })
            .await
    }

    /// Removes the line unconditionally.
    pub async fn remove(&self, item_id: Uuid) {
        self.store
            .write(|state| state.cart.retain(|line| line.item.id != item_id))
            .await;
    }

    /// Empties the cart.
    pub async fn clear(&self) {
        self.store.write(|state| state.cart.clear()).await;
    }

    pub async fn lines(&self) -> Vec<CartLine> {
        self.store.read(|state| state.cart.clone()).await
    }
}
