//! Product service proxy.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use common::ProductId;
use domain::Money;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use super::Lookup;

/// Catalog entry: the name and current unit price of a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Money,
}

impl Product {
    pub fn new(id: impl Into<ProductId>, name: impl Into<String>, price: Money) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
        }
    }
}

/// Read access to the product catalog.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    async fn get_product(&self, id: &ProductId) -> Lookup<Product>;
}

/// In-memory product catalog for tests and local runs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProductCatalog {
    products: Arc<RwLock<HashMap<ProductId, Product>>>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryProductCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a product, replacing any existing entry with the same ID.
    pub async fn insert(&self, product: Product) {
        self.products.write().await.insert(product.id.clone(), product);
    }

    /// Simulates the Product service being unreachable.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }
}

#[async_trait]
impl ProductCatalog for InMemoryProductCatalog {
    async fn get_product(&self, id: &ProductId) -> Lookup<Product> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Lookup::Unavailable("product service unreachable".to_string());
        }
        self.products.read().await.get(id).cloned().into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_price_change_replaces_entry() {
        let catalog = InMemoryProductCatalog::new();
        let id = ProductId::new("SKU-1");
        catalog
            .insert(Product::new("SKU-1", "Widget", Money::new(dec!(10))))
            .await;
        catalog
            .insert(Product::new("SKU-1", "Widget", Money::new(dec!(12))))
            .await;

        let product = catalog.get_product(&id).await.found().unwrap();
        assert_eq!(product.price, Money::new(dec!(12)));

        catalog.set_unavailable(true);
        assert!(matches!(catalog.get_product(&id).await, Lookup::Unavailable(_)));
    }
}
