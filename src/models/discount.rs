use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How a discount's `value` is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountKind {
    Percentage,
    FixedAmount,
}

/// A discount code managed by staff.
///
/// `code` is unique uppercase alphanumeric. `min_spend` and `min_items` are
/// optional applicability conditions; both must hold when present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discount {
    pub id: Uuid,
    pub code: String,
    pub kind: DiscountKind,
    pub value: Decimal,
    pub min_spend: Option<Decimal>,
    pub min_items: Option<u32>,
    pub is_active: bool,
    pub usage_count: u32,
}

impl Discount {
    /// Whether this discount applies to the given subtotal and item count.
    pub fn applies_to(&self, subtotal: Decimal, item_count: u32) -> bool {
        if !self.is_active {
            return false;
        }
        if let Some(min_spend) = self.min_spend {
            if subtotal < min_spend {
                return false;
            }
        }
        if let Some(min_items) = self.min_items {
            if item_count < min_items {
                return false;
            }
        }
        true
    }
}

/// Payload for creating a new discount.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDiscount {
    pub code: String,
    pub kind: DiscountKind,
    pub value: Decimal,
    pub min_spend: Option<Decimal>,
    pub min_items: Option<u32>,
    pub is_active: bool,
}
