use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use stockledger_catalog::Product;
use stockledger_core::Sku;

use crate::error::StoreError;

/// Keyed storage of product records.
pub trait ProductStore: Send + Sync {
    fn get(&self, sku: Sku) -> Result<Option<Product>, StoreError>;

    /// Insert a new record. Returns `false` (and stores nothing) if the SKU is taken.
    fn insert(&self, product: Product) -> Result<bool, StoreError>;

    /// Replace an existing record.
    fn put(&self, product: Product) -> Result<(), StoreError>;

    fn remove(&self, sku: Sku) -> Result<Option<Product>, StoreError>;

    /// All stored SKUs, ascending.
    fn skus(&self) -> Result<Vec<Sku>, StoreError>;
}

impl<S> ProductStore for Arc<S>
where
    S: ProductStore + ?Sized,
{
    fn get(&self, sku: Sku) -> Result<Option<Product>, StoreError> {
        (**self).get(sku)
    }

    fn insert(&self, product: Product) -> Result<bool, StoreError> {
        (**self).insert(product)
    }

    fn put(&self, product: Product) -> Result<(), StoreError> {
        (**self).put(product)
    }

    fn remove(&self, sku: Sku) -> Result<Option<Product>, StoreError> {
        (**self).remove(sku)
    }

    fn skus(&self) -> Result<Vec<Sku>, StoreError> {
        (**self).skus()
    }
}

/// In-memory product table for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryProductStore {
    rows: RwLock<BTreeMap<Sku, Product>>,
}

impl InMemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProductStore for InMemoryProductStore {
    fn get(&self, sku: Sku) -> Result<Option<Product>, StoreError> {
        let rows = self
            .rows
            .read()
            .map_err(|_| StoreError::LockPoisoned("products"))?;
        Ok(rows.get(&sku).cloned())
    }

    fn insert(&self, product: Product) -> Result<bool, StoreError> {
        let mut rows = self
            .rows
            .write()
            .map_err(|_| StoreError::LockPoisoned("products"))?;
        if rows.contains_key(&product.sku()) {
            return Ok(false);
        }
        rows.insert(product.sku(), product);
        Ok(true)
    }

    fn put(&self, product: Product) -> Result<(), StoreError> {
        let mut rows = self
            .rows
            .write()
            .map_err(|_| StoreError::LockPoisoned("products"))?;
        match rows.get_mut(&product.sku()) {
            Some(row) => {
                *row = product;
                Ok(())
            }
            None => Err(StoreError::MissingRecord(format!("product {}", product.sku()))),
        }
    }

    fn remove(&self, sku: Sku) -> Result<Option<Product>, StoreError> {
        let mut rows = self
            .rows
            .write()
            .map_err(|_| StoreError::LockPoisoned("products"))?;
        Ok(rows.remove(&sku))
    }

    fn skus(&self) -> Result<Vec<Sku>, StoreError> {
        let rows = self
            .rows
            .read()
            .map_err(|_| StoreError::LockPoisoned("products"))?;
        Ok(rows.keys().copied().collect())
    }
}
