//! HTTP API for the order workflow.
//!
//! Wires the order workflow, the stock ledger, the event bus and the
//! payment mock into an Axum router, with structured logging (tracing)
//! and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

pub use config::{Config, LogFormat};
pub use error::ApiError;
pub use state::AppState;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use domain::Money;
use ledger::{InMemoryStockLedger, LedgerError, NewStock, PostgresStockLedger, StockLedger};
use messaging::{EventBus, EventConsumer, OrderEventLogger};
use metrics_exporter_prometheus::PrometheusHandle;
use rust_decimal::Decimal;
use saga::{
    AutoPaymentHandler, InMemoryProductCatalog, InMemoryUserDirectory, LedgerStockService,
    OrderWorkflow, PaymentCompletedHandler, PaymentProcessor, Product, User,
};
use sqlx::PgPool;
use store::{
    InMemoryOrderRepository, InMemorySequenceGenerator, OrderRepository, PostgresOrderRepository,
    PostgresSequenceGenerator, SequenceGenerator, StoreError, run_migrations,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route(
            "/orders",
            post(routes::orders::create).get(routes::orders::list),
        )
        .route(
            "/orders/{id}",
            get(routes::orders::get).delete(routes::orders::cancel),
        )
        .route("/orders/{id}/status", put(routes::orders::update_status))
        .route("/orders/user/{user_id}", get(routes::orders::list_by_user))
        .route(
            "/stocks",
            post(routes::stocks::create).get(routes::stocks::list),
        )
        .route(
            "/stocks/{id}",
            get(routes::stocks::get)
                .put(routes::stocks::update)
                .delete(routes::stocks::delete),
        )
        .route(
            "/stocks/product/{product_id}",
            get(routes::stocks::get_by_product),
        )
        .route("/stocks/{id}/reserve", post(routes::stocks::reserve))
        .route("/stocks/{id}/release", post(routes::stocks::release))
        .route("/payments/process", post(routes::payments::process))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Durable state behind the workflow and the ledger.
#[derive(Clone)]
pub struct Storage {
    pub orders: Arc<dyn OrderRepository>,
    pub sequences: Arc<dyn SequenceGenerator>,
    pub ledger: Arc<dyn StockLedger>,
}

impl Storage {
    /// Process-local storage; everything is lost on restart.
    pub fn in_memory() -> Self {
        let sequences = Arc::new(InMemorySequenceGenerator::new());
        Self {
            orders: Arc::new(InMemoryOrderRepository::new()),
            ledger: Arc::new(InMemoryStockLedger::with_sequences(sequences.clone())),
            sequences,
        }
    }

    /// Connects to PostgreSQL and applies pending migrations.
    pub async fn postgres(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPool::connect(database_url).await?;
        run_migrations(&pool).await?;
        Ok(Self::from_pool(pool))
    }

    /// Builds PostgreSQL storage over an already migrated pool.
    pub fn from_pool(pool: PgPool) -> Self {
        Self {
            orders: Arc::new(PostgresOrderRepository::new(pool.clone())),
            sequences: Arc::new(PostgresSequenceGenerator::new(pool.clone())),
            ledger: Arc::new(PostgresStockLedger::new(pool)),
        }
    }
}

/// Everything the server needs, wired together.
///
/// Users and products are served from in-memory directories; the handles
/// are exposed so callers can populate them.
pub struct Application {
    pub state: Arc<AppState>,
    pub bus: EventBus,
    pub users: InMemoryUserDirectory,
    pub products: InMemoryProductCatalog,
    auto_payment: bool,
}

impl Application {
    pub fn new(config: &Config, storage: Storage) -> Self {
        let bus = EventBus::new(config.event_bus_capacity);
        let users = InMemoryUserDirectory::new();
        let products = InMemoryProductCatalog::new();

        let workflow = OrderWorkflow::new(
            storage.orders,
            storage.sequences,
            Arc::new(users.clone()),
            Arc::new(products.clone()),
            Arc::new(LedgerStockService::new(storage.ledger.clone())),
            Arc::new(bus.clone()),
        )
        .with_config(config.workflow());
        let payments = PaymentProcessor::new(Arc::new(bus.clone()));

        let state = Arc::new(AppState {
            workflow,
            ledger: storage.ledger,
            payments,
            events: bus.clone(),
        });

        Self {
            state,
            bus,
            users,
            products,
            auto_payment: config.auto_payment,
        }
    }

    /// Builds the consumer that reacts to published events.
    ///
    /// Subscribe it to [`Application::bus`] before the first request is served.
    pub fn consumer(&self) -> EventConsumer {
        let mut consumer = EventConsumer::new()
            .with_handler(Arc::new(OrderEventLogger))
            .with_handler(Arc::new(PaymentCompletedHandler::new(
                self.state.workflow.clone(),
            )));
        if self.auto_payment {
            consumer = consumer.with_handler(Arc::new(AutoPaymentHandler::new(
                self.state.payments.clone(),
            )));
        }
        consumer
    }

    /// Loads a small set of users, products and stock records.
    ///
    /// Products that already have a stock record keep it.
    pub async fn seed_demo_data(&self) -> Result<(), LedgerError> {
        let users = [
            (1, "Ada Lovelace", "ada@example.com"),
            (2, "Alan Turing", "alan@example.com"),
            (3, "Grace Hopper", "grace@example.com"),
        ];
        for (id, name, email) in users {
            self.users
                .insert(User::new(common::UserId::new(id), name, email))
                .await;
        }

        let products = [
            ("SKU-001", "Mechanical Keyboard", Decimal::new(8999, 2), 50),
            ("SKU-002", "USB-C Cable", Decimal::new(1299, 2), 200),
            ("SKU-003", "Limited Edition Mouse", Decimal::new(14950, 2), 5),
        ];
        for (sku, name, price, quantity) in products {
            self.products
                .insert(Product::new(sku, name, Money::new(price)))
                .await;
            match self.state.ledger.create(NewStock::new(sku, quantity)).await {
                Ok(_) | Err(LedgerError::DuplicateStock(_)) => {}
                Err(e) => return Err(e),
            }
        }

        tracing::info!(
            users = users.len(),
            products = products.len(),
            "Demo data loaded"
        );
        Ok(())
    }
}
