use async_trait::async_trait;
use common::{ProductId, StockId};
use sqlx::{PgPool, Row, postgres::PgRow};
use store::{PostgresSequenceGenerator, STOCK_SEQUENCE, SequenceGenerator, StoreError};

use crate::{LedgerError, NewStock, Result, StockLedger, StockRecord, StockUpdate};

const UNIQUE_PRODUCT_CONSTRAINT: &str = "unique_stock_product";

/// PostgreSQL-backed stock ledger.
///
/// Reservations and releases are single conditional `UPDATE` statements.
/// When the condition filters the row out, the record is re-read to tell a
/// missing record apart from an insufficient quantity.
#[derive(Clone)]
pub struct PostgresStockLedger {
    pool: PgPool,
    sequences: PostgresSequenceGenerator,
}

impl PostgresStockLedger {
    /// Creates a new PostgreSQL stock ledger.
    pub fn new(pool: PgPool) -> Self {
        let sequences = PostgresSequenceGenerator::new(pool.clone());
        Self { pool, sequences }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn row_to_record(row: PgRow) -> Result<StockRecord> {
        Ok(StockRecord {
            id: StockId::new(row.try_get("id")?),
            product_id: ProductId::new(row.try_get::<String, _>("product_id")?),
            quantity: to_u32(row.try_get("quantity")?)?,
            reserved_quantity: to_u32(row.try_get("reserved_quantity")?)?,
            location: row.try_get("location")?,
        })
    }

    async fn fetch(&self, id: StockId) -> Result<Option<StockRecord>> {
        let row = sqlx::query(
            "SELECT id, product_id, quantity, reserved_quantity, location FROM stocks WHERE id = $1",
        )
        .bind(id.value())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_record).transpose()
    }
}

fn to_u32(value: i64) -> Result<u32> {
    u32::try_from(value)
        .map_err(|_| LedgerError::Store(StoreError::Corrupt(format!("quantity out of range: {value}"))))
}

fn is_duplicate_product(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Database(db) => {
            db.is_unique_violation() && db.constraint() == Some(UNIQUE_PRODUCT_CONSTRAINT)
        }
        _ => false,
    }
}

#[async_trait]
impl StockLedger for PostgresStockLedger {
    async fn create(&self, stock: NewStock) -> Result<StockRecord> {
        stock.validate()?;

        let id = StockId::new(self.sequences.next_value(STOCK_SEQUENCE).await?);
        let record = stock.into_record(id);

        let inserted = sqlx::query(
            r#"
            INSERT INTO stocks (id, product_id, quantity, reserved_quantity, location)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(id.value())
        .bind(record.product_id.as_str())
        .bind(i64::from(record.quantity))
        .bind(i64::from(record.reserved_quantity))
        .bind(record.location.as_deref())
        .execute(&self.pool)
        .await;

        match inserted {
            Ok(_) => {
                tracing::info!(stock_id = %id, product_id = %record.product_id, "Stock record created");
                Ok(record)
            }
            Err(e) if is_duplicate_product(&e) => Err(LedgerError::DuplicateStock(record.product_id)),
            Err(e) => Err(e.into()),
        }
    }

    async fn get(&self, id: StockId) -> Result<StockRecord> {
        self.fetch(id).await?.ok_or(LedgerError::StockNotFound(id))
    }

    async fn get_by_product(&self, product_id: &ProductId) -> Result<StockRecord> {
        let row = sqlx::query(
            "SELECT id, product_id, quantity, reserved_quantity, location FROM stocks WHERE product_id = $1",
        )
        .bind(product_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_record)
            .transpose()?
            .ok_or_else(|| LedgerError::ProductNotFound(product_id.clone()))
    }

    async fn list(&self) -> Result<Vec<StockRecord>> {
        let rows = sqlx::query(
            "SELECT id, product_id, quantity, reserved_quantity, location FROM stocks ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_record).collect()
    }

    async fn update(&self, id: StockId, update: StockUpdate) -> Result<StockRecord> {
        update.validate()?;

        let row = sqlx::query(
            r#"
            UPDATE stocks
            SET quantity = $2, reserved_quantity = $3, location = $4
            WHERE id = $1
            RETURNING id, product_id, quantity, reserved_quantity, location
            "#,
        )
        .bind(id.value())
        .bind(i64::from(update.quantity))
        .bind(i64::from(update.reserved_quantity))
        .bind(update.location.as_deref())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_record)
            .transpose()?
            .ok_or(LedgerError::StockNotFound(id))
    }

    async fn delete(&self, id: StockId) -> Result<()> {
        let result = sqlx::query("DELETE FROM stocks WHERE id = $1")
            .bind(id.value())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(LedgerError::StockNotFound(id));
        }
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn reserve(&self, id: StockId, quantity: u32) -> Result<StockRecord> {
        // zero-quantity and shortfall checks share the in-memory rules
        let row = sqlx::query(
            r#"
            UPDATE stocks
            SET reserved_quantity = reserved_quantity + $2
            WHERE id = $1 AND $2 > 0 AND quantity - reserved_quantity >= $2
            RETURNING id, product_id, quantity, reserved_quantity, location
            "#,
        )
        .bind(id.value())
        .bind(i64::from(quantity))
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = row {
            metrics::counter!("stock_reservations_total").increment(1);
            return Self::row_to_record(row);
        }

        metrics::counter!("stock_reservation_rejections_total").increment(1);
        let mut current = self.get(id).await?;
        let err = current
            .reserve(quantity)
            .err()
            .unwrap_or_else(|| LedgerError::InsufficientStock {
                stock_id: id,
                available: current.available_quantity(),
                requested: quantity,
            });
        tracing::warn!(error = %err, "Reservation rejected");
        Err(err)
    }

    #[tracing::instrument(skip(self))]
    async fn release(&self, id: StockId, quantity: u32) -> Result<StockRecord> {
        let row = sqlx::query(
            r#"
            UPDATE stocks
            SET reserved_quantity = reserved_quantity - $2
            WHERE id = $1 AND $2 > 0 AND reserved_quantity >= $2
            RETURNING id, product_id, quantity, reserved_quantity, location
            "#,
        )
        .bind(id.value())
        .bind(i64::from(quantity))
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = row {
            metrics::counter!("stock_releases_total").increment(1);
            return Self::row_to_record(row);
        }

        let mut current = self.get(id).await?;
        Err(current
            .release(quantity)
            .err()
            .unwrap_or_else(|| LedgerError::InsufficientReleaseAmount {
                stock_id: id,
                reserved: current.reserved_quantity,
                requested: quantity,
            }))
    }
}
