//! Catalog domain module.
//!
//! Product master data (dry-good and fresh variants) and warehouse records,
//! implemented purely as deterministic domain logic (no IO, no storage).

pub mod product;
pub mod warehouse;

pub use product::{
    DryGood, Fresh, NewProduct, Product, ProductFilter, ProductKind, ProductKindTag, ProductUpdate,
};
pub use warehouse::{NewWarehouse, Warehouse};
