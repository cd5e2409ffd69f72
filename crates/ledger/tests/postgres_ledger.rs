//! PostgreSQL ledger tests
//!
//! These tests start a PostgreSQL container and are ignored by default.
//! Run with:
//!
//! ```bash
//! cargo test -p ledger --test postgres_ledger -- --ignored --test-threads=1
//! ```

use std::sync::Arc;

use common::ProductId;
use ledger::{LedgerError, NewStock, PostgresStockLedger, StockLedger, StockUpdate};
use serial_test::serial;
use sqlx::PgPool;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();
            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();
            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let temp_pool = PgPool::connect(&connection_string).await.unwrap();
            store::run_migrations(&temp_pool).await.unwrap();
            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

async fn get_test_ledger() -> PostgresStockLedger {
    let info = get_container_info().await;
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(20)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE stocks, sequences")
        .execute(&pool)
        .await
        .unwrap();

    PostgresStockLedger::new(pool)
}

#[tokio::test]
#[serial]
#[ignore = "requires Docker"]
async fn test_create_and_lookup_by_product() {
    let ledger = get_test_ledger().await;
    let created = ledger
        .create(NewStock::new("SKU-001", 10).at("Aisle 1"))
        .await
        .unwrap();
    assert_eq!(created.id.value(), 1);

    let found = ledger
        .get_by_product(&ProductId::new("SKU-001"))
        .await
        .unwrap();
    assert_eq!(found, created);

    let duplicate = ledger.create(NewStock::new("SKU-001", 3)).await;
    assert!(matches!(duplicate, Err(LedgerError::DuplicateStock(_))));
}

#[tokio::test]
#[serial]
#[ignore = "requires Docker"]
async fn test_reserve_rejects_shortfall_without_writing() {
    let ledger = get_test_ledger().await;
    let id = ledger.create(NewStock::new("SKU-001", 10)).await.unwrap().id;

    ledger.reserve(id, 10).await.unwrap();
    let err = ledger.reserve(id, 1).await.unwrap_err();
    assert!(matches!(
        err,
        LedgerError::InsufficientStock {
            available: 0,
            requested: 1,
            ..
        }
    ));

    let err = ledger.release(id, 11).await.unwrap_err();
    assert!(matches!(err, LedgerError::InsufficientReleaseAmount { .. }));
    assert_eq!(ledger.get(id).await.unwrap().reserved_quantity, 10);
}

#[tokio::test]
#[serial]
#[ignore = "requires Docker"]
async fn test_missing_record_reports_not_found() {
    let ledger = get_test_ledger().await;
    let id = common::StockId::new(404);
    assert!(matches!(ledger.reserve(id, 1).await, Err(LedgerError::StockNotFound(_))));
    assert!(matches!(ledger.delete(id).await, Err(LedgerError::StockNotFound(_))));
    let update = StockUpdate {
        quantity: 1,
        reserved_quantity: 0,
        location: None,
    };
    assert!(matches!(
        ledger.update(id, update).await,
        Err(LedgerError::StockNotFound(_))
    ));
}

#[tokio::test]
#[serial]
#[ignore = "requires Docker"]
async fn test_concurrent_reservations_never_oversell() {
    let ledger = get_test_ledger().await;
    let id = ledger.create(NewStock::new("SKU-HOT", 10)).await.unwrap().id;

    let attempts = (0..40).map(|_| {
        let ledger = ledger.clone();
        async move { ledger.reserve(id, 1).await.is_ok() }
    });
    let results = futures_util::future::join_all(attempts).await;

    assert_eq!(results.iter().filter(|ok| **ok).count(), 10);
    assert_eq!(ledger.get(id).await.unwrap().reserved_quantity, 10);
}
