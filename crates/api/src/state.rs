use domain::{CartService, LoyaltyConfig, LoyaltyService, OrderService, PromotionValidator};
use store::Store;

/// Shared application state accessible from all handlers.
pub struct AppState<S> {
    pub carts: CartService<S>,
    pub orders: OrderService<S>,
    pub loyalty: LoyaltyService<S>,
    pub promotions: PromotionValidator<S>,
    /// Name of the storage backend, reported by `/health`.
    pub backend: &'static str,
}

impl<S: Store + Clone + 'static> AppState<S> {
    pub fn new(store: S, loyalty: LoyaltyConfig, backend: &'static str) -> Self {
        let orders = OrderService::new(store.clone(), loyalty);
        Self {
            carts: CartService::new(store.clone()),
            loyalty: orders.loyalty().clone(),
            orders,
            promotions: PromotionValidator::new(store),
            backend,
        }
    }
}
