//! Composition root.
//!
//! Builds the warehouse directory, catalog, stock engine, ledger and query
//! facade once, wired to the same stores and lock set, and hands out shared
//! references. Construct one `Inventory` at process start and pass it (or the
//! component `Arc`s) to whatever layer needs them.

use std::sync::Arc;

use tracing::info;

use stockledger_core::{Clock, Sku, SystemClock};

use crate::catalog::Catalog;
use crate::config::{DeletePolicy, InventoryConfig};
use crate::engine::{RetiredProduct, StockEngine};
use crate::error::InventoryResult;
use crate::ledger::Ledger;
use crate::locks::SkuLocks;
use crate::query::QueryFacade;
use crate::store::{InMemoryProductStore, InMemoryTransactionStore, ProductStore, TransactionStore};
use crate::warehouses::WarehouseDirectory;

#[derive(Debug)]
pub struct Inventory<P = InMemoryProductStore, T = InMemoryTransactionStore> {
    config: InventoryConfig,
    warehouses: Arc<WarehouseDirectory>,
    catalog: Arc<Catalog<P, T>>,
    engine: Arc<StockEngine<P, T>>,
    ledger: Arc<Ledger<P, T>>,
    queries: Arc<QueryFacade<P, T>>,
}

impl Inventory {
    /// In-memory stores and the wall clock.
    pub fn in_memory(config: InventoryConfig) -> Self {
        Self::new(
            config,
            InMemoryProductStore::new(),
            InMemoryTransactionStore::new(),
            Arc::new(SystemClock),
        )
    }
}

impl<P, T> Inventory<P, T>
where
    P: ProductStore,
    T: TransactionStore,
{
    pub fn new(config: InventoryConfig, products: P, transactions: T, clock: Arc<dyn Clock>) -> Self {
        let transactions = Arc::new(transactions);
        let warehouses = Arc::new(WarehouseDirectory::new());
        let catalog = Arc::new(Catalog::new(
            products,
            transactions.clone(),
            warehouses.clone(),
            Arc::new(SkuLocks::new()),
            config.first_sku(),
        ));
        let engine = Arc::new(StockEngine::new(catalog.clone(), transactions.clone()));
        let ledger = Arc::new(Ledger::new(
            catalog.clone(),
            transactions.clone(),
            engine.clone(),
            clock.clone(),
        ));
        let queries = Arc::new(QueryFacade::new(
            catalog.clone(),
            transactions,
            warehouses.clone(),
            clock,
        ));

        info!(
            first_sku = config.first_sku,
            delete_policy = ?config.delete_policy,
            "inventory initialized"
        );

        Self {
            config,
            warehouses,
            catalog,
            engine,
            ledger,
            queries,
        }
    }

    pub fn config(&self) -> &InventoryConfig {
        &self.config
    }

    pub fn warehouses(&self) -> &Arc<WarehouseDirectory> {
        &self.warehouses
    }

    pub fn catalog(&self) -> &Arc<Catalog<P, T>> {
        &self.catalog
    }

    pub fn engine(&self) -> &Arc<StockEngine<P, T>> {
        &self.engine
    }

    pub fn ledger(&self) -> &Arc<Ledger<P, T>> {
        &self.ledger
    }

    pub fn queries(&self) -> &Arc<QueryFacade<P, T>> {
        &self.queries
    }

    /// Delete a product under the configured [`DeletePolicy`].
    pub fn delete_product(&self, sku: Sku) -> InventoryResult<RetiredProduct> {
        match self.config.delete_policy {
            DeletePolicy::Deny => {
                let product = self.catalog.delete_product(sku)?;
                Ok(RetiredProduct {
                    product,
                    voided: Vec::new(),
                })
            }
            DeletePolicy::CascadeVoid => self.engine.retire_product(sku),
        }
    }
}
