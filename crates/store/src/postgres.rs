use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{
    CartId, CartLineId, LoyaltyReason, LoyaltyTransactionId, Money, OrderId, OrderLineId,
    PromotionId, UserId, VariantId,
};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    Cart, CartLine, LoyaltyAccount, LoyaltyTransaction, Order, OrderLine, OrderState, Page, Paged,
    Promotion, Result, ShippingInfo, StoreError, Variant,
    store::{CartStore, CatalogStore, InventoryLedger, LoyaltyStore, OrderStore, PromotionStore},
};

const ORDER_COLUMNS: &str = "id, user_id, shipping_address, phone, total_amount, discount_amount, \
     final_amount, promotion_id, status, payment_status, created_at, updated_at";

const TRANSACTION_COLUMNS: &str = "id, user_id, delta, reason, order_id, created_at";

const PROMOTION_COLUMNS: &str = "id, code, discount_type, discount_value, starts_at, ends_at, \
     usage_limit, usage_count, active";

/// PostgreSQL-backed store implementation.
///
/// Contended counters (stock, point balance, promotion usage) are only ever
/// changed through guarded `UPDATE … WHERE <counter> >= $n` statements whose
/// affected-row count decides the outcome.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    async fn load_cart_lines(&self, cart_id: CartId) -> Result<Vec<CartLine>> {
        let rows = sqlx::query(
            "SELECT id, cart_id, variant_id, quantity FROM cart_lines WHERE cart_id = $1 ORDER BY id",
        )
        .bind(cart_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_cart_line).collect()
    }

    /// Loads the lines of several orders in one round trip.
    async fn load_order_lines(
        &self,
        order_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<OrderLine>>> {
        let rows = sqlx::query(
            r#"
            SELECT id, order_id, variant_id, product_name, variant_name, unit_price, quantity
            FROM order_lines
            WHERE order_id = ANY($1)
            ORDER BY order_id, position ASC
            "#,
        )
        .bind(order_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut lines: HashMap<Uuid, Vec<OrderLine>> = HashMap::new();
        for row in rows {
            let order_id: Uuid = row.try_get("order_id")?;
            lines.entry(order_id).or_default().push(row_to_order_line(row)?);
        }
        Ok(lines)
    }

    async fn attach_lines(&self, rows: Vec<PgRow>) -> Result<Vec<Order>> {
        let ids = rows
            .iter()
            .map(|row| row.try_get::<Uuid, _>("id"))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let mut lines = self.load_order_lines(&ids).await?;

        rows.into_iter()
            .map(|row| {
                let id: Uuid = row.try_get("id")?;
                row_to_order(row, lines.remove(&id).unwrap_or_default())
            })
            .collect()
    }
}

fn to_u32(value: i64, column: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| StoreError::Decode(format!("{column} out of range: {value}")))
}

fn row_to_variant(row: PgRow) -> Result<Variant> {
    Ok(Variant {
        id: VariantId::from_uuid(row.try_get("id")?),
        product_name: row.try_get("product_name")?,
        name: row.try_get("name")?,
        price: Money::new(row.try_get("price")?),
        stock: to_u32(row.try_get("stock")?, "stock")?,
    })
}

fn row_to_cart_line(row: PgRow) -> Result<CartLine> {
    Ok(CartLine {
        id: CartLineId::from_uuid(row.try_get("id")?),
        cart_id: CartId::from_uuid(row.try_get("cart_id")?),
        variant_id: VariantId::from_uuid(row.try_get("variant_id")?),
        quantity: to_u32(row.try_get("quantity")?, "quantity")?,
    })
}

fn row_to_order_line(row: PgRow) -> Result<OrderLine> {
    Ok(OrderLine {
        id: OrderLineId::from_uuid(row.try_get("id")?),
        variant_id: VariantId::from_uuid(row.try_get("variant_id")?),
        product_name: row.try_get("product_name")?,
        variant_name: row.try_get("variant_name")?,
        unit_price: Money::new(row.try_get("unit_price")?),
        quantity: to_u32(row.try_get("quantity")?, "quantity")?,
    })
}

fn row_to_order(row: PgRow, lines: Vec<OrderLine>) -> Result<Order> {
    Ok(Order {
        id: OrderId::from_uuid(row.try_get("id")?),
        user_id: UserId::from_uuid(row.try_get("user_id")?),
        shipping: ShippingInfo {
            address: row.try_get("shipping_address")?,
            phone: row.try_get("phone")?,
        },
        lines,
        total_amount: Money::new(row.try_get("total_amount")?),
        discount_amount: Money::new(row.try_get("discount_amount")?),
        final_amount: Money::new(row.try_get("final_amount")?),
        promotion_id: row
            .try_get::<Option<Uuid>, _>("promotion_id")?
            .map(PromotionId::from_uuid),
        status: row.try_get::<String, _>("status")?.parse()?,
        payment_status: row.try_get::<String, _>("payment_status")?.parse()?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn row_to_transaction(row: PgRow) -> Result<LoyaltyTransaction> {
    Ok(LoyaltyTransaction {
        id: LoyaltyTransactionId::from_uuid(row.try_get("id")?),
        user_id: UserId::from_uuid(row.try_get("user_id")?),
        delta: row.try_get("delta")?,
        reason: row.try_get::<String, _>("reason")?.parse()?,
        order_id: row
            .try_get::<Option<Uuid>, _>("order_id")?
            .map(OrderId::from_uuid),
        created_at: row.try_get("created_at")?,
    })
}

fn row_to_promotion(row: PgRow) -> Result<Promotion> {
    Ok(Promotion {
        id: PromotionId::from_uuid(row.try_get("id")?),
        code: row.try_get("code")?,
        discount_type: row.try_get::<String, _>("discount_type")?.parse()?,
        discount_value: row.try_get("discount_value")?,
        starts_at: row.try_get::<Option<DateTime<Utc>>, _>("starts_at")?,
        ends_at: row.try_get::<Option<DateTime<Utc>>, _>("ends_at")?,
        usage_limit: row
            .try_get::<Option<i64>, _>("usage_limit")?
            .map(|limit| to_u32(limit, "usage_limit"))
            .transpose()?,
        usage_count: to_u32(row.try_get("usage_count")?, "usage_count")?,
        active: row.try_get("active")?,
    })
}

#[async_trait]
impl CatalogStore for PostgresStore {
    async fn upsert_variant(&self, variant: Variant) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO variants (id, product_name, name, price, stock)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE SET
                product_name = EXCLUDED.product_name,
                name = EXCLUDED.name,
                price = EXCLUDED.price,
                stock = EXCLUDED.stock
            "#,
        )
        .bind(variant.id.as_uuid())
        .bind(&variant.product_name)
        .bind(&variant.name)
        .bind(variant.price.amount())
        .bind(i64::from(variant.stock))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_variant(&self, id: VariantId) -> Result<Option<Variant>> {
        let row = sqlx::query("SELECT id, product_name, name, price, stock FROM variants WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(row_to_variant).transpose()
    }

    async fn get_variants(&self, ids: &[VariantId]) -> Result<Vec<Variant>> {
        let ids: Vec<Uuid> = ids.iter().map(VariantId::as_uuid).collect();
        let rows = sqlx::query(
            "SELECT id, product_name, name, price, stock FROM variants WHERE id = ANY($1)",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_variant).collect()
    }
}

#[async_trait]
impl InventoryLedger for PostgresStore {
    async fn reserve(&self, variant_id: VariantId, quantity: u32) -> Result<u32> {
        let remaining: Option<i64> = sqlx::query_scalar(
            "UPDATE variants SET stock = stock - $2 WHERE id = $1 AND stock >= $2 RETURNING stock",
        )
        .bind(variant_id.as_uuid())
        .bind(i64::from(quantity))
        .fetch_optional(&self.pool)
        .await?;

        if let Some(stock) = remaining {
            return to_u32(stock, "stock");
        }

        // Guard did not match: report what was available
        let available: Option<i64> = sqlx::query_scalar("SELECT stock FROM variants WHERE id = $1")
            .bind(variant_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        match available {
            Some(available) => Err(StoreError::InsufficientStock {
                variant_id,
                requested: quantity,
                available: to_u32(available, "stock")?,
            }),
            None => Err(StoreError::not_found("variant", variant_id)),
        }
    }

    async fn release(&self, variant_id: VariantId, quantity: u32) -> Result<u32> {
        let stock: Option<i64> =
            sqlx::query_scalar("UPDATE variants SET stock = stock + $2 WHERE id = $1 RETURNING stock")
                .bind(variant_id.as_uuid())
                .bind(i64::from(quantity))
                .fetch_optional(&self.pool)
                .await?;

        match stock {
            Some(stock) => to_u32(stock, "stock"),
            None => Err(StoreError::not_found("variant", variant_id)),
        }
    }
}

#[async_trait]
impl CartStore for PostgresStore {
    async fn get_or_create_cart(&self, user_id: UserId) -> Result<Cart> {
        // Losing a first-access race is harmless: the unique user_id
        // constraint turns the second insert into a no-op.
        sqlx::query(
            "INSERT INTO carts (id, user_id, created_at) VALUES ($1, $2, NOW()) ON CONFLICT (user_id) DO NOTHING",
        )
        .bind(Uuid::new_v4())
        .bind(user_id.as_uuid())
        .execute(&self.pool)
        .await?;

        let row = sqlx::query("SELECT id, created_at FROM carts WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .fetch_one(&self.pool)
            .await?;

        let cart_id = CartId::from_uuid(row.try_get("id")?);
        Ok(Cart {
            id: cart_id,
            user_id,
            created_at: row.try_get("created_at")?,
            lines: self.load_cart_lines(cart_id).await?,
        })
    }

    async fn add_line(&self, cart_id: CartId, variant_id: VariantId, quantity: u32) -> Result<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO cart_lines (id, cart_id, variant_id, quantity)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (cart_id, variant_id) DO UPDATE SET
                quantity = cart_lines.quantity + EXCLUDED.quantity
            WHERE cart_lines.quantity + EXCLUDED.quantity <= $5
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(cart_id.as_uuid())
        .bind(variant_id.as_uuid())
        .bind(i64::from(quantity))
        .bind(i64::from(u32::MAX))
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_foreign_key_violation()
            {
                return match db_err.constraint() {
                    Some("cart_lines_cart_id_fkey") => StoreError::not_found("cart", cart_id),
                    _ => StoreError::not_found("variant", variant_id),
                };
            }
            StoreError::Database(e)
        })?;

        if result.rows_affected() == 0 {
            let existing: i64 = sqlx::query_scalar(
                "SELECT quantity FROM cart_lines WHERE cart_id = $1 AND variant_id = $2",
            )
            .bind(cart_id.as_uuid())
            .bind(variant_id.as_uuid())
            .fetch_one(&self.pool)
            .await?;
            return Err(StoreError::QuantityLimit {
                variant_id,
                quantity: existing + i64::from(quantity),
            });
        }

        Ok(())
    }

    async fn set_line_quantity(
        &self,
        cart_id: CartId,
        line_id: CartLineId,
        quantity: u32,
    ) -> Result<bool> {
        let result = sqlx::query("UPDATE cart_lines SET quantity = $3 WHERE id = $2 AND cart_id = $1")
            .bind(cart_id.as_uuid())
            .bind(line_id.as_uuid())
            .bind(i64::from(quantity))
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn remove_line(&self, cart_id: CartId, line_id: CartLineId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM cart_lines WHERE id = $2 AND cart_id = $1")
            .bind(cart_id.as_uuid())
            .bind(line_id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl OrderStore for PostgresStore {
    async fn commit_order(&self, order: &Order, consumed: &[CartLine]) -> Result<()> {
        // Dropping the transaction without commit rolls everything back
        let mut tx = self.pool.begin().await?;

        for line in consumed {
            let deleted = sqlx::query(
                "DELETE FROM cart_lines WHERE id = $1 AND cart_id = $2 AND quantity = $3",
            )
            .bind(line.id.as_uuid())
            .bind(line.cart_id.as_uuid())
            .bind(i64::from(line.quantity))
            .execute(&mut *tx)
            .await?
            .rows_affected();

            if deleted == 0 {
                return Err(StoreError::CartChanged {
                    cart_id: line.cart_id,
                });
            }
        }

        if let Some(promotion_id) = order.promotion_id {
            let updated = sqlx::query(
                r#"
                UPDATE promotions SET usage_count = usage_count + 1
                WHERE id = $1 AND (usage_limit IS NULL OR usage_count < usage_limit)
                "#,
            )
            .bind(promotion_id.as_uuid())
            .execute(&mut *tx)
            .await?
            .rows_affected();

            if updated == 0 {
                let exists: Option<i32> =
                    sqlx::query_scalar("SELECT 1 FROM promotions WHERE id = $1")
                        .bind(promotion_id.as_uuid())
                        .fetch_optional(&mut *tx)
                        .await?;
                return Err(match exists {
                    Some(_) => StoreError::PromotionExhausted { promotion_id },
                    None => StoreError::not_found("promotion", promotion_id),
                });
            }
        }

        sqlx::query(
            r#"
            INSERT INTO orders (id, user_id, shipping_address, phone, total_amount, discount_amount,
                                final_amount, promotion_id, status, payment_status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.user_id.as_uuid())
        .bind(&order.shipping.address)
        .bind(&order.shipping.phone)
        .bind(order.total_amount.amount())
        .bind(order.discount_amount.amount())
        .bind(order.final_amount.amount())
        .bind(order.promotion_id.map(|id| id.as_uuid()))
        .bind(order.status.as_str())
        .bind(order.payment_status.as_str())
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await?;

        for (position, line) in order.lines.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO order_lines (id, order_id, position, variant_id, product_name,
                                         variant_name, unit_price, quantity)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(line.id.as_uuid())
            .bind(order.id.as_uuid())
            .bind(position as i32)
            .bind(line.variant_id.as_uuid())
            .bind(&line.product_name)
            .bind(&line.variant_name)
            .bind(line.unit_price.amount())
            .bind(i64::from(line.quantity))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        tracing::debug!(order_id = %order.id, lines = order.lines.len(), "order committed");
        Ok(())
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(self.attach_lines(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn list_orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>> {
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY seq DESC"
        ))
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        self.attach_lines(rows).await
    }

    async fn list_orders(&self, page: Page) -> Result<Paged<Order>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(&self.pool)
            .await?;

        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY seq DESC LIMIT $1 OFFSET $2"
        ))
        .bind(page.take as i64)
        .bind(page.skip as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(Paged {
            items: self.attach_lines(rows).await?,
            total: total as usize,
        })
    }

    async fn transition_order(
        &self,
        id: OrderId,
        from: OrderState,
        to: OrderState,
        restock: bool,
    ) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE orders SET status = $4, payment_status = $5, updated_at = NOW()
            WHERE id = $1 AND status = $2 AND payment_status = $3
            "#,
        )
        .bind(id.as_uuid())
        .bind(from.status.as_str())
        .bind(from.payment_status.as_str())
        .bind(to.status.as_str())
        .bind(to.payment_status.as_str())
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if updated == 0 {
            let exists: Option<i32> = sqlx::query_scalar("SELECT 1 FROM orders WHERE id = $1")
                .bind(id.as_uuid())
                .fetch_optional(&mut *tx)
                .await?;
            return match exists {
                Some(_) => Ok(false),
                None => Err(StoreError::not_found("order", id)),
            };
        }

        if restock {
            sqlx::query(
                r#"
                UPDATE variants v SET stock = v.stock + ol.quantity
                FROM order_lines ol
                WHERE ol.order_id = $1 AND v.id = ol.variant_id
                "#,
            )
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(true)
    }
}

#[async_trait]
impl LoyaltyStore for PostgresStore {
    async fn earn(
        &self,
        user_id: UserId,
        points: i64,
        order_id: OrderId,
    ) -> Result<Option<LoyaltyTransaction>> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO loyalty_transactions (id, user_id, delta, reason, order_id, created_at)
            VALUES ($1, $2, $3, $4, $5, NOW())
            ON CONFLICT (order_id, reason) DO NOTHING
            RETURNING {TRANSACTION_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(user_id.as_uuid())
        .bind(points)
        .bind(LoyaltyReason::OrderEarn.as_str())
        .bind(order_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        sqlx::query(
            r#"
            INSERT INTO loyalty_accounts (user_id, balance) VALUES ($1, $2)
            ON CONFLICT (user_id) DO UPDATE SET balance = loyalty_accounts.balance + EXCLUDED.balance
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(points)
        .execute(&mut *tx)
        .await?;

        let transaction = row_to_transaction(row)?;
        tx.commit().await?;
        Ok(Some(transaction))
    }

    async fn redeem(&self, user_id: UserId, points: i64) -> Result<LoyaltyTransaction> {
        let mut tx = self.pool.begin().await?;

        let remaining: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE loyalty_accounts SET balance = balance - $2
            WHERE user_id = $1 AND balance >= $2
            RETURNING balance
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(points)
        .fetch_optional(&mut *tx)
        .await?;

        if remaining.is_none() {
            let available: Option<i64> =
                sqlx::query_scalar("SELECT balance FROM loyalty_accounts WHERE user_id = $1")
                    .bind(user_id.as_uuid())
                    .fetch_optional(&mut *tx)
                    .await?;
            return Err(StoreError::InsufficientBalance {
                requested: points,
                available: available.unwrap_or(0),
            });
        }

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO loyalty_transactions (id, user_id, delta, reason, order_id, created_at)
            VALUES ($1, $2, $3, $4, NULL, NOW())
            RETURNING {TRANSACTION_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(user_id.as_uuid())
        .bind(-points)
        .bind(LoyaltyReason::Redemption.as_str())
        .fetch_one(&mut *tx)
        .await?;

        let transaction = row_to_transaction(row)?;
        tx.commit().await?;
        Ok(transaction)
    }

    async fn get_account(&self, user_id: UserId) -> Result<LoyaltyAccount> {
        let balance: Option<i64> =
            sqlx::query_scalar("SELECT balance FROM loyalty_accounts WHERE user_id = $1")
                .bind(user_id.as_uuid())
                .fetch_optional(&self.pool)
                .await?;

        Ok(LoyaltyAccount {
            user_id,
            balance: balance.unwrap_or(0),
        })
    }

    async fn recent_transactions(
        &self,
        user_id: UserId,
        limit: usize,
    ) -> Result<Vec<LoyaltyTransaction>> {
        let rows = sqlx::query(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM loyalty_transactions WHERE user_id = $1 ORDER BY seq DESC LIMIT $2"
        ))
        .bind(user_id.as_uuid())
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_transaction).collect()
    }

    async fn ledger_total(&self, user_id: UserId) -> Result<i64> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(delta), 0)::BIGINT FROM loyalty_transactions WHERE user_id = $1",
        )
        .bind(user_id.as_uuid())
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }
}

#[async_trait]
impl PromotionStore for PostgresStore {
    async fn upsert_promotion(&self, promotion: Promotion) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO promotions (id, code, discount_type, discount_value, starts_at, ends_at,
                                    usage_limit, usage_count, active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (id) DO UPDATE SET
                code = EXCLUDED.code,
                discount_type = EXCLUDED.discount_type,
                discount_value = EXCLUDED.discount_value,
                starts_at = EXCLUDED.starts_at,
                ends_at = EXCLUDED.ends_at,
                usage_limit = EXCLUDED.usage_limit,
                usage_count = EXCLUDED.usage_count,
                active = EXCLUDED.active
            "#,
        )
        .bind(promotion.id.as_uuid())
        .bind(&promotion.code)
        .bind(promotion.discount_type.as_str())
        .bind(promotion.discount_value)
        .bind(promotion.starts_at)
        .bind(promotion.ends_at)
        .bind(promotion.usage_limit.map(i64::from))
        .bind(i64::from(promotion.usage_count))
        .bind(promotion.active)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
                && db_err.constraint() == Some("unique_promotion_code")
            {
                return StoreError::DuplicatePromotionCode {
                    code: promotion.code.clone(),
                };
            }
            StoreError::Database(e)
        })?;

        Ok(())
    }

    async fn find_promotion(&self, code: &str) -> Result<Option<Promotion>> {
        let row = sqlx::query(&format!(
            "SELECT {PROMOTION_COLUMNS} FROM promotions WHERE code = $1"
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        row.map(row_to_promotion).transpose()
    }
}
