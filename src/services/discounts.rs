//! Discount selection and administration.
//!
//! Selection is a pure function over the active discount set; the service
//! part is the staff-facing CRUD that keeps the local set in sync with the
//! backend.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::gateway::RemoteGateway;
use crate::models::{Discount, DiscountKind, NewDiscount};
use crate::state::{EntityKind, StateStore};

/// Picks the single best-applicable discount: among active discounts whose
/// `min_spend` and `min_items` conditions hold, the one with the strictly
/// greatest raw `value`. Ties keep the first in iteration order.
///
/// Percentage and fixed-amount values are compared directly as raw numbers.
/// A 10% code and a $10 code are not really comparable that way, but the
/// order-creation backend expects exactly this selection, so it is kept
/// as-is rather than normalized to currency.
pub fn best_applicable(
    discounts: &[Discount],
    subtotal: Decimal,
    item_count: u32,
) -> Option<&Discount> {
    let mut best: Option<&Discount> = None;
    for discount in discounts {
        if !discount.applies_to(subtotal, item_count) {
            continue;
        }
        match best {
            Some(current) if discount.value <= current.value => {}
            _ => best = Some(discount),
        }
    }
    best
}

/// Converts a discount to the percentage the order endpoint understands.
///
/// Fixed amounts become `value / subtotal * 100`; a zero subtotal converts
/// to 0 rather than dividing by zero.
pub fn effective_percent(discount: &Discount, subtotal: Decimal) -> Decimal {
    match discount.kind {
        DiscountKind::Percentage => discount.value,
        DiscountKind::FixedAmount => {
            if subtotal > Decimal::ZERO {
                discount.value / subtotal * Decimal::ONE_HUNDRED
            } else {
                Decimal::ZERO
            }
        }
    }
}

/// Money taken off a subtotal by a percentage, for display.
pub fn discount_amount(subtotal: Decimal, percent: Decimal) -> Decimal {
    subtotal * percent / Decimal::ONE_HUNDRED
}

/// Staff administration of discount codes.
#[derive(Clone)]
pub struct DiscountService {
    store: StateStore,
    gateway: Arc<dyn RemoteGateway>,
}

impl DiscountService {
    pub fn new(store: StateStore, gateway: Arc<dyn RemoteGateway>) -> Self {
        Self { store, gateway }
    }

    #[instrument(skip(self, discount), fields(code = %discount.code))]
    pub async fn create_discount(&self, discount: NewDiscount) -> Result<Discount, ServiceError> {
        validate_code(&discount.code)?;

        let ticket = self.store.ticket(EntityKind::Discounts);
        let created = self.gateway.create_discount(discount).await?;
        info!(discount_id = %created.id, code = %created.code, "discount created");

        self.store
            .apply(ticket, |state| state.discounts.push(created.clone()))
            .await;
        Ok(created)
    }

    #[instrument(skip(self, discount), fields(discount_id = %discount.id))]
    pub async fn update_discount(&self, discount: Discount) -> Result<Discount, ServiceError> {
        validate_code(&discount.code)?;

        let ticket = self.store.ticket(EntityKind::Discounts);
        let updated = self.gateway.update_discount(discount).await?;

        self.store
            .apply(ticket, |state| {
                if let Some(existing) = state
                    .discounts
                    .iter_mut()
                    .find(|d| d.id == updated.id)
                {
                    *existing = updated.clone();
                }
            })
            .await;
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete_discount(&self, id: Uuid) -> Result<(), ServiceError> {
        let ticket = self.store.ticket(EntityKind::Discounts);
        self.gateway.delete_discount(id).await?;
        info!(discount_id = %id, "discount deleted");

        self.store
            .apply(ticket, |state| state.discounts.retain(|d| d.id != id))
            .await;
        Ok(())
    }
}

fn validate_code(code: &str) -> Result<(), ServiceError> {
    if code.is_empty()
        || !code
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
    {
        return Err(ServiceError::ValidationError(format!(
            "discount code must be uppercase alphanumeric, got {code:?}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn discount(
        code: &str,
        kind: DiscountKind,
        value: Decimal,
        min_spend: Option<Decimal>,
        min_items: Option<u32>,
        is_active: bool,
    ) -> Discount {
        Discount {
            id: Uuid::new_v4(),
            code: code.to_string(),
            kind,
            value,
            min_spend,
            min_items,
            is_active,
            usage_count: 0,
        }
    }

    #[test]
    fn greater_value_wins_across_condition_kinds() {
        let discounts = vec![
            discount(
                "SPEND50",
                DiscountKind::Percentage,
                dec!(10),
                Some(dec!(50)),
                None,
                true,
            ),
            discount(
                "BULK2",
                DiscountKind::Percentage,
                dec!(15),
                None,
                Some(2),
                true,
            ),
        ];

        let best = best_applicable(&discounts, dec!(100), 3).unwrap();
        assert_eq!(best.code, "BULK2");
        assert_eq!(discount_amount(dec!(100), best.value), dec!(15));
    }

    #[test]
    fn tie_keeps_first_in_iteration_order() {
        let discounts = vec![
            discount("FIRST", DiscountKind::Percentage, dec!(10), None, None, true),
            discount("SECOND", DiscountKind::Percentage, dec!(10), None, None, true),
        ];
        assert_eq!(
            best_applicable(&discounts, dec!(100), 1).unwrap().code,
            "FIRST"
        );
    }

    #[rstest]
    #[case::inactive(discount("X", DiscountKind::Percentage, dec!(50), None, None, false))]
    #[case::min_spend_unmet(discount(
        "X",
        DiscountKind::Percentage,
        dec!(50),
        Some(dec!(200)),
        None,
        true
    ))]
    #[case::min_items_unmet(discount(
        "X",
        DiscountKind::Percentage,
        dec!(50),
        None,
        Some(5),
        true
    ))]
    fn non_applicable_discounts_are_skipped(#[case] candidate: Discount) {
        assert!(best_applicable(&[candidate], dec!(100), 3).is_none());
    }

    #[test]
    fn fixed_amount_converts_to_percent_of_subtotal() {
        let fixed = discount("FLAT20", DiscountKind::FixedAmount, dec!(20), None, None, true);
        assert_eq!(effective_percent(&fixed, dec!(80)), dec!(25));
    }

    #[test]
    fn fixed_amount_on_zero_subtotal_converts_to_zero() {
        let fixed = discount("FLAT20", DiscountKind::FixedAmount, dec!(20), None, None, true);
        assert_eq!(effective_percent(&fixed, Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn percentage_passes_through_unchanged() {
        let pct = discount("TEN", DiscountKind::Percentage, dec!(10), None, None, true);
        assert_eq!(effective_percent(&pct, dec!(123)), dec!(10));
    }

    proptest! {
        /// The selector returns a discount iff at least one candidate
        /// applies, and whatever it returns applies itself.
        #[test]
        fn selection_implies_applicability(
            values in proptest::collection::vec(0u32..1000, 0..8),
            subtotal in 0u32..500,
            item_count in 0u32..10,
        ) {
            let subtotal = Decimal::from(subtotal);
            let discounts: Vec<Discount> = values
                .iter()
                .enumerate()
                .map(|(i, v)| discount(
                    &format!("C{i}"),
                    DiscountKind::Percentage,
                    Decimal::from(*v),
                    (v % 3 == 0).then(|| Decimal::from(v / 2)),
                    (v % 4 == 0).then(|| v % 7),
                    v % 5 != 0,
                ))
                .collect();

            let any_applies = discounts
                .iter()
                .any(|d| d.applies_to(subtotal, item_count));
            let best = best_applicable(&discounts, subtotal, item_count);

            prop_assert_eq!(best.is_some(), any_applies);
            if let Some(best) = best {
                prop_assert!(best.applies_to(subtotal, item_count));
            }
        }
    }
}
