//! Infrastructure layer: stores, per-SKU locking, and the inventory components
//! (catalog, ledger, stock engine, query facade) wired over them.

pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod inventory;
pub mod ledger;
pub mod locks;
pub mod query;
pub mod store;
pub mod warehouses;


pub use catalog::{Catalog, ProductIter, ProductListing};
pub use config::{ConfigError, DeletePolicy, InventoryConfig};
pub use engine::{RetiredProduct, StockEngine};
pub use error::{InventoryError, InventoryResult, StoreError};
pub use inventory::Inventory;
pub use ledger::Ledger;
pub use locks::{SkuGuard, SkuLocks};
pub use query::{InventoryStats, LowStockThreshold, QueryFacade};
pub use store::{InMemoryProductStore, InMemoryTransactionStore, ProductStore, TransactionStore};
pub use warehouses::WarehouseDirectory;
