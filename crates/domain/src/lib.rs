//! Domain layer for the order workflow.
//!
//! This crate provides the core domain types:
//! - [`Order`] and [`OrderItem`], the persisted order document
//! - [`OrderStatus`], a tagged state machine with a single transition table
//! - [`OrderRequest`], the validated input to order creation
//! - [`Money`], a decimal amount

pub mod order;

pub use order::{
    Money, Order, OrderError, OrderItem, OrderLine, OrderRequest, OrderStatus, TransitionPolicy,
};
