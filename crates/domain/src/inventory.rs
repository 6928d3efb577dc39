//! Inventory ledger operations on top of the store's atomic stock counters.

use common::VariantId;
use store::InventoryLedger;

use crate::error::{DomainError, Result};

/// One line to reserve, with a label used in stock errors.
#[derive(Debug, Clone)]
pub struct ReservationItem {
    pub variant_id: VariantId,
    pub item: String,
    pub quantity: u32,
}

/// Reservations taken by a single request, in the order they were made.
#[derive(Debug, Clone, Default)]
pub struct Reservation {
    lines: Vec<(VariantId, u32)>,
}

#[derive(Clone)]
pub struct InventoryService<S> {
    store: S,
}

impl<S: InventoryLedger> InventoryService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Atomically checks and decrements stock. Returns the remaining stock.
    #[tracing::instrument(skip(self))]
    pub async fn check_and_reserve(&self, variant_id: VariantId, quantity: u32) -> Result<u32> {
        if quantity == 0 {
            return Err(DomainError::InvalidQuantity { quantity: 0 });
        }
        let remaining = self.store.reserve(variant_id, quantity).await?;
        metrics::counter!("inventory_reservations_total").increment(1);
        Ok(remaining)
    }

    /// Returns previously reserved stock to the ledger.
    #[tracing::instrument(skip(self))]
    pub async fn release(&self, variant_id: VariantId, quantity: u32) -> Result<u32> {
        let stock = self.store.release(variant_id, quantity).await?;
        metrics::counter!("inventory_releases_total").increment(1);
        Ok(stock)
    }

    /// Reserves every item or none.
    ///
    /// On the first failure the items already reserved are released in
    /// reverse order and the failure is returned, naming the failing item.
    #[tracing::instrument(skip(self, items), fields(lines = items.len()))]
    pub async fn reserve_all(&self, items: &[ReservationItem]) -> Result<Reservation> {
        let mut reservation = Reservation::default();

        for item in items {
            match self.check_and_reserve(item.variant_id, item.quantity).await {
                Ok(_) => reservation.lines.push((item.variant_id, item.quantity)),
                Err(err) => {
                    tracing::warn!(
                        variant_id = %item.variant_id,
                        reserved = reservation.lines.len(),
                        error = %err,
                        "reservation failed, releasing earlier lines"
                    );
                    self.release_all(&reservation).await;
                    return Err(match err {
                        DomainError::InsufficientStock {
                            variant_id,
                            requested,
                            available,
                            ..
                        } => DomainError::InsufficientStock {
                            variant_id,
                            item: item.item.clone(),
                            requested,
                            available,
                        },
                        other => other,
                    });
                }
            }
        }

        Ok(reservation)
    }

    /// Compensates a reservation, newest line first.
    ///
    /// Release failures are logged and skipped so the remaining lines are
    /// still returned.
    pub async fn release_all(&self, reservation: &Reservation) {
        for &(variant_id, quantity) in reservation.lines.iter().rev() {
            if let Err(err) = self.release(variant_id, quantity).await {
                tracing::error!(%variant_id, quantity, error = %err, "failed to release reservation");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Money;
    use store::{CatalogStore, InMemoryStore, Variant};

    async fn setup(stock: u32) -> (InventoryService<InMemoryStore>, InMemoryStore, Variant) {
        let store = InMemoryStore::new();
        let variant = Variant::new("Oud Royal", "100ml", Money::new(100_000), stock);
        store.upsert_variant(variant.clone()).await.unwrap();
        (InventoryService::new(store.clone()), store, variant)
    }

    #[tokio::test]
    async fn test_reserve_and_release() {
        let (service, _, variant) = setup(3).await;

        assert_eq!(service.check_and_reserve(variant.id, 2).await.unwrap(), 1);
        assert_eq!(service.release(variant.id, 2).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_zero_quantity_is_rejected() {
        let (service, _, variant) = setup(3).await;

        let err = service.check_and_reserve(variant.id, 0).await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidQuantity { quantity: 0 }));
    }

    #[tokio::test]
    async fn test_reserve_all_compensates_on_failure() {
        let (service, store, first) = setup(5).await;
        let second = Variant::new("Oud Royal", "30ml", Money::new(50_000), 1);
        store.upsert_variant(second.clone()).await.unwrap();

        let items = vec![
            ReservationItem {
                variant_id: first.id,
                item: "Oud Royal 100ml".to_string(),
                quantity: 2,
            },
            ReservationItem {
                variant_id: second.id,
                item: "Oud Royal 30ml".to_string(),
                quantity: 2,
            },
        ];

        let err = service.reserve_all(&items).await.unwrap_err();
        match err {
            DomainError::InsufficientStock {
                variant_id, item, ..
            } => {
                assert_eq!(variant_id, second.id);
                assert_eq!(item, "Oud Royal 30ml");
            }
            other => panic!("unexpected error: {other}"),
        }

        let stock = store.get_variant(first.id).await.unwrap().unwrap().stock;
        assert_eq!(stock, 5);
    }
}
