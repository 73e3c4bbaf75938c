use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A stock item as known to the backend.
///
/// `quantity` is the authoritative stock level; the engine never decrements
/// it locally. `threshold` is the low-stock trigger compared against
/// `quantity` on every update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: Uuid,
    /// Unique business key.
    pub sku: String,
    pub name: String,
    pub quantity: u32,
    pub threshold: u32,
    pub price: Decimal,
    pub category: String,
    pub image_url: Option<String>,
}

impl InventoryItem {
    /// Whether the item currently sits at or below its low-stock threshold.
    pub fn is_low_stock(&self) -> bool {
        self.quantity <= self.threshold
    }
}

/// Payload for creating a new stock item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewInventoryItem {
    pub sku: String,
    pub name: String,
    pub quantity: u32,
    pub threshold: u32,
    pub price: Decimal,
    pub category: String,
    pub image_url: Option<String>,
}

/// One line of the session cart: a snapshot of the item at the time it was
/// added, plus the quantity the user wants.
///
/// A line with quantity 0 never exists; it is removed instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub item: InventoryItem,
    pub quantity: u32,
}

impl CartLine {
    pub fn line_total(&self) -> Decimal {
        self.item.price * Decimal::from(self.quantity)
    }
}
