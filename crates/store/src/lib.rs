//! Durable storage for orders and sequence counters.
//!
//! - [`OrderRepository`] persists the order document
//! - [`SequenceGenerator`] hands out gap-free identifiers per named counter
//!
//! Both come in an in-memory flavour for tests and local runs, and a
//! PostgreSQL flavour for deployments.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod repository;
pub mod sequence;

pub use error::{Result, StoreError};
pub use memory::{InMemoryOrderRepository, InMemorySequenceGenerator};
pub use postgres::{PostgresOrderRepository, PostgresSequenceGenerator, run_migrations};
pub use repository::OrderRepository;
pub use sequence::{ORDER_SEQUENCE, STOCK_SEQUENCE, SequenceGenerator};
