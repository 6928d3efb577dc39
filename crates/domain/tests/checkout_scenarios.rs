//! End-to-end scenarios for the storefront core on the in-memory store.
//!
//! These tests cover the cart, checkout and loyalty flows together,
//! including concurrent reservations against a single variant.

use common::{DiscountType, Money, OrderId, UserId};
use domain::{
    AccrualMode, Actor, CartService, CreateOrder, DomainError, InventoryService, LoyaltyConfig,
    LoyaltyService, OrderService,
};
use store::{
    CatalogStore, InMemoryStore, LoyaltyStore, Promotion, PromotionStore, Store, Variant,
};

struct Storefront {
    store: InMemoryStore,
    carts: CartService<InMemoryStore>,
    orders: OrderService<InMemoryStore>,
    loyalty: LoyaltyService<InMemoryStore>,
}

fn storefront() -> Storefront {
    storefront_with(LoyaltyConfig::default())
}

fn storefront_with(config: LoyaltyConfig) -> Storefront {
    let store = InMemoryStore::new();
    Storefront {
        carts: CartService::new(store.clone()),
        orders: OrderService::new(store.clone(), config),
        loyalty: LoyaltyService::new(store.clone(), config),
        store,
    }
}

async fn seed_variant<S: Store>(store: &S, price: i64, stock: u32) -> Variant {
    let variant = Variant::new("Ambre Nomade", "100ml", Money::new(price), stock);
    store.upsert_variant(variant.clone()).await.unwrap();
    variant
}

async fn stock_of<S: Store>(store: &S, variant: &Variant) -> u32 {
    store.get_variant(variant.id).await.unwrap().unwrap().stock
}

fn checkout_request() -> CreateOrder {
    CreateOrder::new("3 Avenue Montaigne, Paris", "+33 6 12 34 56 78")
}

mod inventory {
    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_reservations_never_exceed_stock() {
        let store = InMemoryStore::new();
        let variant = seed_variant(&store, 100_000, 7).await;
        let inventory = InventoryService::new(store.clone());

        let attempts = (0..25).map(|i| {
            let inventory = inventory.clone();
            let quantity = (i % 3) + 1;
            tokio::spawn(async move {
                inventory
                    .check_and_reserve(variant.id, quantity)
                    .await
                    .map(|_| quantity)
            })
        });
        let results = futures_util::future::join_all(attempts).await;

        let reserved: u32 = results
            .into_iter()
            .filter_map(|r| r.unwrap().ok())
            .sum();
        let remaining = stock_of(&store, &variant).await;

        assert!(reserved <= 7);
        assert_eq!(reserved + remaining, 7);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_checkouts_on_last_unit_place_one_order() {
        let shop = storefront();
        let variant = seed_variant(&shop.store, 100_000, 1).await;

        let buyers: Vec<UserId> = (0..5).map(|_| UserId::new()).collect();
        for buyer in &buyers {
            shop.carts.add_item(*buyer, variant.id, 1).await.unwrap();
        }

        let attempts = buyers.iter().map(|buyer| {
            let orders = shop.orders.clone();
            let buyer = *buyer;
            tokio::spawn(async move { orders.create_order(buyer, checkout_request()).await })
        });
        let results = futures_util::future::join_all(attempts).await;

        let placed = results.iter().filter(|r| matches!(r, Ok(Ok(_)))).count();
        assert_eq!(placed, 1);
        assert_eq!(stock_of(&shop.store, &variant).await, 0);
        assert_eq!(shop.store.order_count().await, 1);
    }
}

mod cart {
    use super::*;

    #[tokio::test]
    async fn adding_same_variant_twice_merges_lines() {
        let shop = storefront();
        let variant = seed_variant(&shop.store, 100_000, 10).await;
        let user = UserId::new();

        shop.carts.add_item(user, variant.id, 1).await.unwrap();
        let cart = shop.carts.add_item(user, variant.id, 2).await.unwrap();

        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].quantity, 3);
    }

    #[tokio::test]
    async fn setting_quantity_on_another_users_line_is_not_found() {
        let shop = storefront();
        let variant = seed_variant(&shop.store, 100_000, 10).await;
        let alice = UserId::new();
        let bob = UserId::new();

        let alice_cart = shop.carts.add_item(alice, variant.id, 1).await.unwrap();
        let bob_cart = shop.carts.add_item(bob, variant.id, 2).await.unwrap();
        let alice_line = alice_cart.items[0].line_id;

        let err = shop
            .carts
            .set_item_quantity(bob, alice_line, 9)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));

        assert_eq!(shop.carts.get_cart(alice).await.unwrap(), alice_cart);
        assert_eq!(shop.carts.get_cart(bob).await.unwrap(), bob_cart);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_first_access_creates_one_cart() {
        let shop = storefront();
        let user = UserId::new();

        let attempts = (0..10).map(|_| {
            let carts = shop.carts.clone();
            tokio::spawn(async move { carts.get_or_create_cart(user).await.unwrap().id })
        });
        let ids: Vec<_> = futures_util::future::join_all(attempts)
            .await
            .into_iter()
            .map(Result::unwrap)
            .collect();

        assert!(ids.windows(2).all(|w| w[0] == w[1]));
    }
}

mod checkout {
    use super::*;

    #[tokio::test]
    async fn insufficient_stock_leaves_cart_and_stock_unchanged() {
        let shop = storefront();
        let variant = seed_variant(&shop.store, 100_000, 1).await;
        let user = UserId::new();
        shop.carts.add_item(user, variant.id, 2).await.unwrap();

        let err = shop.orders.create_order(user, checkout_request()).await.unwrap_err();

        match err {
            DomainError::InsufficientStock {
                variant_id,
                item,
                requested,
                available,
            } => {
                assert_eq!(variant_id, variant.id);
                assert_eq!(item, "Ambre Nomade 100ml");
                assert_eq!(requested, 2);
                assert_eq!(available, 1);
            }
            other => panic!("unexpected error: {other}"),
        }

        let cart = shop.carts.get_cart(user).await.unwrap();
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].quantity, 2);
        assert_eq!(stock_of(&shop.store, &variant).await, 1);
        assert_eq!(shop.store.order_count().await, 0);
    }

    #[tokio::test]
    async fn failing_second_line_releases_the_first() {
        let shop = storefront();
        let plenty = seed_variant(&shop.store, 50_000, 10).await;
        let scarce = seed_variant(&shop.store, 80_000, 0).await;
        let user = UserId::new();
        shop.carts.add_item(user, plenty.id, 3).await.unwrap();
        shop.carts.add_item(user, scarce.id, 1).await.unwrap();

        let err = shop.orders.create_order(user, checkout_request()).await.unwrap_err();

        assert!(matches!(err, DomainError::InsufficientStock { variant_id, .. } if variant_id == scarce.id));
        assert_eq!(stock_of(&shop.store, &plenty).await, 10);
        assert_eq!(shop.carts.get_cart(user).await.unwrap().items.len(), 2);
    }

    #[tokio::test]
    async fn percentage_promotion_is_applied() {
        let shop = storefront();
        let variant = seed_variant(&shop.store, 240_000, 5).await;
        let user = UserId::new();
        shop.carts.add_item(user, variant.id, 1).await.unwrap();
        shop.store
            .upsert_promotion(Promotion::new("SAVE25", DiscountType::Percentage, 25))
            .await
            .unwrap();

        let order = shop
            .orders
            .create_order(user, checkout_request().with_promotion("SAVE25"))
            .await
            .unwrap();

        assert_eq!(order.total_amount, Money::new(240_000));
        assert_eq!(order.discount_amount, Money::new(60_000));
        assert_eq!(order.final_amount, Money::new(180_000));
        assert_eq!(stock_of(&shop.store, &variant).await, 4);
        assert!(shop.carts.get_cart(user).await.unwrap().items.is_empty());

        let promotion = shop.store.find_promotion("SAVE25").await.unwrap().unwrap();
        assert_eq!(promotion.usage_count, 1);
    }

    #[tokio::test]
    async fn promotion_cap_is_enforced_across_orders() {
        let shop = storefront();
        let variant = seed_variant(&shop.store, 100_000, 5).await;
        let mut promotion = Promotion::new("FIRST", DiscountType::FixedAmount, 10_000);
        promotion.usage_limit = Some(1);
        shop.store.upsert_promotion(promotion).await.unwrap();

        let first = UserId::new();
        let second = UserId::new();
        shop.carts.add_item(first, variant.id, 1).await.unwrap();
        shop.carts.add_item(second, variant.id, 1).await.unwrap();

        shop.orders
            .create_order(first, checkout_request().with_promotion("FIRST"))
            .await
            .unwrap();
        let err = shop
            .orders
            .create_order(second, checkout_request().with_promotion("FIRST"))
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::PromotionExhausted { ref code } if code == "FIRST"));
        assert_eq!(stock_of(&shop.store, &variant).await, 4);
    }

    #[tokio::test]
    async fn checked_out_cart_cannot_be_ordered_again() {
        let shop = storefront();
        let variant = seed_variant(&shop.store, 100_000, 5).await;
        let user = UserId::new();
        shop.carts.add_item(user, variant.id, 1).await.unwrap();

        shop.orders.create_order(user, checkout_request()).await.unwrap();
        let err = shop.orders.create_order(user, checkout_request()).await.unwrap_err();

        assert!(matches!(err, DomainError::EmptyCart));
        assert_eq!(shop.orders.list_my_orders(user).await.unwrap().len(), 1);
    }
}

mod loyalty {
    use super::*;

    #[tokio::test]
    async fn redeeming_points_returns_discount() {
        let shop = storefront();
        let user = UserId::new();
        shop.loyalty
            .earn_points(user, Money::new(1_500_000), OrderId::new())
            .await
            .unwrap();

        let redemption = shop.loyalty.redeem_points(user, 100).await.unwrap();

        assert_eq!(redemption.discount_amount, Money::new(50_000));
        let status = shop.loyalty.get_status(user).await.unwrap();
        assert_eq!(status.balance, 50);
        assert_eq!(status.transactions[0].delta, -100);
    }

    #[tokio::test]
    async fn over_redemption_fails_and_keeps_balance() {
        let shop = storefront();
        let user = UserId::new();
        shop.loyalty
            .earn_points(user, Money::new(400_000), OrderId::new())
            .await
            .unwrap();

        let err = shop.loyalty.redeem_points(user, 41).await.unwrap_err();

        assert!(matches!(
            err,
            DomainError::InsufficientPoints {
                requested: 41,
                available: 40
            }
        ));
        assert_eq!(shop.loyalty.get_status(user).await.unwrap().balance, 40);
    }

    #[tokio::test]
    async fn earning_twice_for_one_order_credits_once() {
        let shop = storefront();
        let user = UserId::new();
        let order_id = OrderId::new();

        let first = shop
            .loyalty
            .earn_points(user, Money::new(240_000), order_id)
            .await
            .unwrap();
        let second = shop
            .loyalty
            .earn_points(user, Money::new(240_000), order_id)
            .await
            .unwrap();

        assert!(first.is_some());
        assert!(second.is_none());
        assert_eq!(shop.loyalty.get_status(user).await.unwrap().balance, 24);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn balance_matches_ledger_under_concurrent_earn_and_redeem() {
        let shop = storefront();
        let user = UserId::new();
        shop.loyalty
            .earn_points(user, Money::new(500_000), OrderId::new())
            .await
            .unwrap();

        let earns = (0..10).map(|_| {
            let loyalty = shop.loyalty.clone();
            tokio::spawn(async move {
                loyalty
                    .earn_points(user, Money::new(100_000), OrderId::new())
                    .await
                    .map(|_| ())
            })
        });
        let redeems = (0..10).map(|_| {
            let loyalty = shop.loyalty.clone();
            tokio::spawn(async move { loyalty.redeem_points(user, 15).await.map(|_| ()) })
        });
        let handles: Vec<_> = earns.chain(redeems).collect();
        futures_util::future::join_all(handles).await;

        let balance = shop.store.get_account(user).await.unwrap().balance;
        let ledger = shop.store.ledger_total(user).await.unwrap();
        assert_eq!(balance, ledger);
        assert!(balance >= 0);
    }

    #[tokio::test]
    async fn order_below_earn_rate_earns_nothing() {
        let shop = storefront();
        let variant = seed_variant(&shop.store, 5_000, 5).await;
        let user = UserId::new();
        shop.carts.add_item(user, variant.id, 1).await.unwrap();

        let order = shop.orders.create_order(user, checkout_request()).await.unwrap();

        assert_eq!(shop.loyalty.get_status(user).await.unwrap().balance, 0);
        let admin = Actor::admin(UserId::new());
        assert_eq!(shop.orders.get_order(&admin, order.id).await.unwrap(), order);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn background_accrual_eventually_credits() {
        let shop = storefront_with(LoyaltyConfig::default().with_accrual(AccrualMode::Background));
        let variant = seed_variant(&shop.store, 240_000, 5).await;
        let user = UserId::new();
        shop.carts.add_item(user, variant.id, 1).await.unwrap();

        shop.orders.create_order(user, checkout_request()).await.unwrap();

        let mut balance = 0;
        for _ in 0..50 {
            balance = shop.loyalty.get_status(user).await.unwrap().balance;
            if balance > 0 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert_eq!(balance, 24);
    }
}
