//! Typed proxies for the User, Product and Stock collaborators.
//!
//! Every lookup returns a [`Lookup`] so the workflow can tell "the record
//! does not exist" apart from "the service could not be reached".

pub mod product;
pub mod stock;
pub mod user;

pub use product::{InMemoryProductCatalog, Product, ProductCatalog};
pub use stock::{LedgerStockService, StockCallError, StockService};
pub use user::{InMemoryUserDirectory, User, UserDirectory};

/// Outcome of a remote lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    Found(T),
    NotFound,
    /// The collaborator could not answer; carries the transport reason.
    Unavailable(String),
}

impl<T> Lookup<T> {
    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }

    /// Converts into an `Option`, discarding why nothing was found.
    pub fn found(self) -> Option<T> {
        match self {
            Lookup::Found(value) => Some(value),
            Lookup::NotFound | Lookup::Unavailable(_) => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Lookup<U> {
        match self {
            Lookup::Found(value) => Lookup::Found(f(value)),
            Lookup::NotFound => Lookup::NotFound,
            Lookup::Unavailable(reason) => Lookup::Unavailable(reason),
        }
    }
}

impl<T> From<Option<T>> for Lookup<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Lookup::NotFound, Lookup::Found)
    }
}
