use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{OrderId, UserId};
use domain::{Money, Order, OrderItem, OrderStatus};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::{OrderRepository, Result, SequenceGenerator, StoreError};

/// Runs the database migrations shared by every PostgreSQL-backed component.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("../../migrations").run(pool).await?;
    Ok(())
}

/// PostgreSQL-backed order repository.
///
/// Items are stored as a JSONB array so their order survives the round trip.
#[derive(Clone)]
pub struct PostgresOrderRepository {
    pool: PgPool,
}

impl PostgresOrderRepository {
    /// Creates a new PostgreSQL order repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn row_to_order(row: PgRow) -> Result<Order> {
        let status: String = row.try_get("status")?;
        let status = status
            .parse::<OrderStatus>()
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;
        let Json(items): Json<Vec<OrderItem>> = row.try_get("items")?;
        let total_amount: Decimal = row.try_get("total_amount")?;
        let created_at: DateTime<Utc> = row.try_get("created_at")?;
        let updated_at: DateTime<Utc> = row.try_get("updated_at")?;

        Ok(Order::restore(
            OrderId::new(row.try_get("id")?),
            UserId::new(row.try_get("user_id")?),
            items,
            Money::new(total_amount),
            status,
            row.try_get("shipping_address")?,
            created_at,
            updated_at,
        ))
    }
}

#[async_trait]
impl OrderRepository for PostgresOrderRepository {
    #[tracing::instrument(skip(self, order), fields(order_id = %order.id()))]
    async fn save(&self, order: &Order) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO orders (id, user_id, items, total_amount, status, shipping_address, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (id) DO UPDATE
            SET status = EXCLUDED.status,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(order.id().value())
        .bind(order.user_id().value())
        .bind(Json(order.items()))
        .bind(order.total_amount().amount())
        .bind(order.status().as_str())
        .bind(order.shipping_address())
        .bind(order.created_at())
        .bind(order.updated_at())
        .execute(&self.pool)
        .await?;

        metrics::counter!("order_writes_total").increment(1);
        Ok(())
    }

    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, items, total_amount, status, shipping_address, created_at, updated_at
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(id.value())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_order).transpose()
    }

    async fn find_by_user(&self, user_id: UserId) -> Result<Vec<Order>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, items, total_amount, status, shipping_address, created_at, updated_at
            FROM orders
            WHERE user_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(user_id.value())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_order).collect()
    }

    async fn find_all(&self) -> Result<Vec<Order>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, items, total_amount, status, shipping_address, created_at, updated_at
            FROM orders
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_order).collect()
    }
}

/// PostgreSQL-backed sequence generator.
///
/// Allocation is a single upsert-and-return statement, so the increment and
/// the read happen atomically inside the database.
#[derive(Clone)]
pub struct PostgresSequenceGenerator {
    pool: PgPool,
}

impl PostgresSequenceGenerator {
    /// Creates a new PostgreSQL sequence generator.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SequenceGenerator for PostgresSequenceGenerator {
    async fn next_value(&self, name: &str) -> Result<i64> {
        let value: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO sequences (name, value)
            VALUES ($1, 1)
            ON CONFLICT (name) DO UPDATE SET value = sequences.value + 1
            RETURNING value
            "#,
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?;

        Ok(value)
    }
}
