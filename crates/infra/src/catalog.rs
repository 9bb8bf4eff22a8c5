//! Product catalog: single source of truth for product identity and
//! quantity-on-hand.
//!
//! Descriptive fields are edited here. Quantity only moves through
//! [`Catalog::adjust_quantity`], which is crate-private and demands a
//! [`SkuGuard`], so the stock engine is the only caller able to reach it.

use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use stockledger_catalog::{NewProduct, Product, ProductFilter, ProductUpdate};
use stockledger_core::{DomainError, EntityKind, Sku, WarehouseId};

use crate::error::{InventoryResult, StoreError};
use crate::locks::{SkuGuard, SkuLocks};
use crate::store::{ProductStore, TransactionStore};
use crate::warehouses::WarehouseDirectory;

#[derive(Debug)]
pub struct Catalog<P, T> {
    products: P,
    transactions: Arc<T>,
    warehouses: Arc<WarehouseDirectory>,
    locks: Arc<SkuLocks>,
    /// Next SKU to try when assigning; `None` once the SKU space is used up.
    next_sku: Mutex<Option<Sku>>,
}

impl<P, T> Catalog<P, T>
where
    P: ProductStore,
    T: TransactionStore,
{
    pub fn new(
        products: P,
        transactions: Arc<T>,
        warehouses: Arc<WarehouseDirectory>,
        locks: Arc<SkuLocks>,
        first_sku: Sku,
    ) -> Self {
        Self {
            products,
            transactions,
            warehouses,
            locks,
            next_sku: Mutex::new(Some(first_sku)),
        }
    }

    /// Create a product and return its SKU.
    ///
    /// A caller-supplied SKU must be free (`DuplicateSku` otherwise). A SKU the
    /// ledger still references, such as one retired under the cascade-void
    /// policy, is never free. Without a SKU, the next free one in sequence is
    /// assigned.
    pub fn create_product(&self, input: NewProduct) -> InventoryResult<Sku> {
        self.ensure_warehouse(input.warehouse_id)?;

        if let Some(sku) = input.sku {
            let product = Product::new(sku, input)?;
            if !self.claim(product)? {
                warn!(sku = %sku, "rejected duplicate sku");
                return Err(DomainError::DuplicateSku(sku).into());
            }
            info!(sku = %sku, "product created");
            return Ok(sku);
        }

        let mut next = self
            .next_sku
            .lock()
            .map_err(|_| StoreError::LockPoisoned("sku sequence"))?;
        let mut candidate = (*next).ok_or_else(sku_sequence_exhausted)?;
        loop {
            let product = Product::new(candidate, input.clone())?;
            let following = candidate.next();
            if self.claim(product)? {
                *next = following;
                info!(sku = %candidate, "product created with assigned sku");
                return Ok(candidate);
            }
            debug!(sku = %candidate, "assigned sku taken, trying the next one");
            match following {
                Some(sku) => candidate = sku,
                None => {
                    *next = None;
                    return Err(sku_sequence_exhausted().into());
                }
            }
        }
    }

    pub fn get_product(&self, sku: Sku) -> InventoryResult<Product> {
        self.products
            .get(sku)?
            .ok_or_else(|| DomainError::not_found(EntityKind::Product, sku).into())
    }

    pub fn contains(&self, sku: Sku) -> InventoryResult<bool> {
        Ok(self.products.get(sku)?.is_some())
    }

    /// Update descriptive/pricing fields. Never touches quantity-on-hand.
    pub fn update_product_fields(&self, sku: Sku, update: ProductUpdate) -> InventoryResult<Product> {
        if let Some(warehouse_id) = update.warehouse_id {
            self.ensure_warehouse(warehouse_id)?;
        }

        let _guard = self.locks.lock(sku);
        let mut product = self.get_product(sku)?;
        product.apply_update(update)?;
        self.products.put(product.clone())?;
        info!(sku = %sku, "product fields updated");
        Ok(product)
    }

    /// Apply `delta` to the guarded SKU's quantity, returning the new quantity.
    ///
    /// Fails with `InsufficientStock` (store untouched) if stock would go
    /// negative.
    pub(crate) fn adjust_quantity(&self, guard: &SkuGuard<'_>, delta: i64) -> InventoryResult<u64> {
        let sku = self.guarded_sku(guard)?;
        let mut product = self.get_product(sku)?;
        let before = product.quantity_on_hand();
        let after = product.apply_quantity_delta(delta)?;
        self.products.put(product)?;
        debug!(sku = %sku, delta, before, after, "quantity adjusted");
        Ok(after)
    }

    /// Delete a product that no ledger entry references.
    pub fn delete_product(&self, sku: Sku) -> InventoryResult<Product> {
        let guard = self.locks.lock(sku);
        let references = self.transactions.by_sku(sku)?.len();
        if references > 0 {
            warn!(sku = %sku, references, "delete blocked by ledger references");
            return Err(DomainError::ReferentialIntegrity { sku, references }.into());
        }
        self.remove_locked(&guard)
    }

    /// Remove the guarded SKU's record without a reference check.
    pub(crate) fn remove_locked(&self, guard: &SkuGuard<'_>) -> InventoryResult<Product> {
        let sku = self.guarded_sku(guard)?;
        let product = self
            .products
            .remove(sku)?
            .ok_or_else(|| DomainError::not_found(EntityKind::Product, sku))?;
        info!(sku = %sku, "product deleted");
        Ok(product)
    }

    /// Lazy, restartable listing of the products matching `filter`, by SKU.
    pub fn list_products(&self, filter: ProductFilter) -> ProductListing<'_, P, T> {
        ProductListing {
            catalog: self,
            filter,
        }
    }

    pub(crate) fn locks(&self) -> &SkuLocks {
        &self.locks
    }

    // Insert under the SKU lock unless the SKU is in the store or in the
    // ledger's history.
    fn claim(&self, product: Product) -> InventoryResult<bool> {
        let sku = product.sku();
        let _guard = self.locks.lock(sku);
        if !self.transactions.by_sku(sku)?.is_empty() {
            debug!(sku = %sku, "sku has ledger history");
            return Ok(false);
        }
        Ok(self.products.insert(product)?)
    }

    fn guarded_sku(&self, guard: &SkuGuard<'_>) -> InventoryResult<Sku> {
        if !guard.issued_by(&self.locks) {
            return Err(StoreError::ForeignGuard(guard.sku()).into());
        }
        Ok(guard.sku())
    }

    fn ensure_warehouse(&self, warehouse_id: WarehouseId) -> InventoryResult<()> {
        if !self.warehouses.contains(warehouse_id)? {
            return Err(DomainError::validation(
                "warehouse_id",
                format!("warehouse {warehouse_id} is not registered"),
            )
            .into());
        }
        Ok(())
    }
}

fn sku_sequence_exhausted() -> DomainError {
    DomainError::conflict("sku sequence exhausted")
}

/// A filtered view of the catalog. Each call to [`ProductListing::iter`]
/// starts a fresh pass.
#[derive(Debug)]
pub struct ProductListing<'a, P, T> {
    catalog: &'a Catalog<P, T>,
    filter: ProductFilter,
}

impl<'a, P, T> ProductListing<'a, P, T>
where
    P: ProductStore,
    T: TransactionStore,
{
    /// Start a pass. SKUs are snapshotted now; records are fetched as the
    /// iterator advances, so products deleted mid-pass are skipped.
    pub fn iter(&self) -> InventoryResult<ProductIter<'a, P, T>> {
        Ok(ProductIter {
            catalog: self.catalog,
            filter: self.filter,
            skus: self.catalog.products.skus()?.into_iter(),
        })
    }

    pub fn to_vec(&self) -> InventoryResult<Vec<Product>> {
        self.iter()?.collect()
    }
}

#[derive(Debug)]
pub struct ProductIter<'a, P, T> {
    catalog: &'a Catalog<P, T>,
    filter: ProductFilter,
    skus: std::vec::IntoIter<Sku>,
}

impl<P, T> Iterator for ProductIter<'_, P, T>
where
    P: ProductStore,
    T: TransactionStore,
{
    type Item = InventoryResult<Product>;

    fn next(&mut self) -> Option<Self::Item> {
        for sku in self.skus.by_ref() {
            match self.catalog.products.get(sku) {
                Ok(Some(product)) if self.filter.matches(&product) => return Some(Ok(product)),
                Ok(_) => continue,
                Err(e) => return Some(Err(e.into())),
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use stockledger_catalog::{DryGood, Fresh, NewWarehouse, ProductKind, ProductKindTag};

    use chrono::Utc;
    use stockledger_core::StaffId;
    use stockledger_ledger::{RecordInbound, ShippingType, Transaction};

    use crate::error::InventoryError;
    use crate::store::{InMemoryProductStore, InMemoryTransactionStore};

    type TestCatalog = Catalog<InMemoryProductStore, InMemoryTransactionStore>;

    fn catalog() -> TestCatalog {
        catalog_starting_at(Sku::new(1))
    }

    fn catalog_starting_at(first_sku: Sku) -> TestCatalog {
        let warehouses = Arc::new(WarehouseDirectory::new());
        for id in [1, 2] {
            warehouses
                .register(NewWarehouse {
                    id: Some(WarehouseId::new(id)),
                    name: format!("W{id}"),
                    location: String::new(),
                })
                .unwrap();
        }
        Catalog::new(
            InMemoryProductStore::new(),
            Arc::new(InMemoryTransactionStore::new()),
            warehouses,
            Arc::new(SkuLocks::new()),
            first_sku,
        )
    }

    fn input(sku: Option<u64>, warehouse: u64, quantity: u64) -> NewProduct {
        NewProduct {
            sku: sku.map(Sku::new),
            warehouse_id: WarehouseId::new(warehouse),
            name: "Flour".to_string(),
            brand: "Mill".to_string(),
            description: String::new(),
            purchase_price: dec!(2.25),
            weight_per_unit_kg: 1.0,
            volume_per_unit_m3: 0.002,
            initial_quantity: quantity,
            kind: ProductKind::DryGood(DryGood {
                reorder_point: 10,
                reorder_quantity: 50,
                units_per_case: 12,
            }),
        }
    }

    #[test]
    fn duplicate_sku_is_rejected() {
        let c = catalog();
        assert_eq!(c.create_product(input(Some(100), 1, 5)).unwrap(), Sku::new(100));
        let err = c.create_product(input(Some(100), 1, 5)).unwrap_err();
        assert_eq!(err, InventoryError::Domain(DomainError::DuplicateSku(Sku::new(100))));
    }

    #[test]
    fn assigned_skus_skip_taken_ones() {
        let c = catalog();
        c.create_product(input(Some(2), 1, 0)).unwrap();
        assert_eq!(c.create_product(input(None, 1, 0)).unwrap(), Sku::new(1));
        assert_eq!(c.create_product(input(None, 1, 0)).unwrap(), Sku::new(3));
    }

    #[test]
    fn skus_with_ledger_history_are_never_reissued() {
        let c = catalog();
        let id = c.transactions.next_id().unwrap();
        let history = Transaction::inbound(
            id,
            RecordInbound {
                staff_id: StaffId::new(),
                sku: Sku::new(1),
                quantity: 40,
                date: None,
                shipping_type: ShippingType::StandardGround,
            },
            Utc::now(),
        )
        .unwrap();
        c.transactions.insert(history).unwrap();

        let err = c.create_product(input(Some(1), 1, 0)).unwrap_err();
        assert_eq!(err, InventoryError::Domain(DomainError::DuplicateSku(Sku::new(1))));
        assert_eq!(c.create_product(input(None, 1, 0)).unwrap(), Sku::new(2));
        assert!(!c.contains(Sku::new(1)).unwrap());
    }

    #[test]
    fn exhausted_sku_sequence_is_a_conflict() {
        let c = catalog_starting_at(Sku::new(u64::MAX));
        assert_eq!(c.create_product(input(None, 1, 0)).unwrap(), Sku::new(u64::MAX));

        for _ in 0..2 {
            let err = c.create_product(input(None, 1, 0)).unwrap_err();
            assert!(matches!(err, InventoryError::Domain(DomainError::Conflict(_))));
        }
        assert_eq!(c.list_products(ProductFilter::all()).to_vec().unwrap().len(), 1);
        // Caller-chosen SKUs still work.
        assert_eq!(c.create_product(input(Some(5), 1, 0)).unwrap(), Sku::new(5));
    }

    #[test]
    fn unknown_warehouse_fails_validation() {
        let c = catalog();
        let err = c.create_product(input(Some(1), 9, 0)).unwrap_err();
        assert!(matches!(
            err,
            InventoryError::Domain(DomainError::Validation { field: "warehouse_id", .. })
        ));
    }

    #[test]
    fn update_leaves_quantity_alone() {
        let c = catalog();
        let sku = c.create_product(input(Some(1), 1, 40)).unwrap();
        let updated = c
            .update_product_fields(
                sku,
                ProductUpdate {
                    description: Some("Type 00".to_string()),
                    warehouse_id: Some(WarehouseId::new(2)),
                    ..ProductUpdate::default()
                },
            )
            .unwrap();
        assert_eq!(updated.description(), "Type 00");
        assert_eq!(updated.warehouse_id(), WarehouseId::new(2));
        assert_eq!(c.get_product(sku).unwrap().quantity_on_hand(), 40);
    }

    #[test]
    fn update_of_missing_product_is_not_found() {
        let c = catalog();
        let err = c
            .update_product_fields(Sku::new(77), ProductUpdate::default())
            .unwrap_err();
        assert_eq!(
            err.domain(),
            Some(&DomainError::not_found(EntityKind::Product, Sku::new(77)))
        );
    }

    #[test]
    fn adjust_quantity_rejects_overdraw() {
        let c = catalog();
        let sku = c.create_product(input(Some(1), 1, 10)).unwrap();
        let guard = c.locks().lock(sku);
        assert_eq!(c.adjust_quantity(&guard, -4).unwrap(), 6);
        let err = c.adjust_quantity(&guard, -7).unwrap_err();
        assert!(matches!(
            err,
            InventoryError::Domain(DomainError::InsufficientStock { on_hand: 6, requested: 7, .. })
        ));
        drop(guard);
        assert_eq!(c.get_product(sku).unwrap().quantity_on_hand(), 6);
    }

    #[test]
    fn guard_from_another_lock_set_is_refused() {
        let c = catalog();
        let sku = c.create_product(input(Some(1), 1, 10)).unwrap();
        let foreign = SkuLocks::new();
        let guard = foreign.lock(sku);

        let err = c.adjust_quantity(&guard, 5).unwrap_err();
        assert_eq!(err, InventoryError::Store(StoreError::ForeignGuard(sku)));
        assert!(c.remove_locked(&guard).is_err());
        assert_eq!(c.get_product(sku).unwrap().quantity_on_hand(), 10);
    }

    #[test]
    fn unreferenced_product_can_be_deleted() {
        let c = catalog();
        let sku = c.create_product(input(Some(1), 1, 0)).unwrap();
        c.delete_product(sku).unwrap();
        assert!(!c.contains(sku).unwrap());
        assert!(c.delete_product(sku).is_err());
    }

    #[test]
    fn listing_filters_and_restarts() {
        let c = catalog();
        c.create_product(input(Some(3), 1, 0)).unwrap();
        c.create_product(input(Some(1), 2, 0)).unwrap();
        let mut fresh = input(Some(2), 1, 0);
        fresh.kind = ProductKind::Fresh(Fresh::default());
        c.create_product(fresh).unwrap();

        let all = c.list_products(ProductFilter::all());
        let skus: Vec<Sku> = all.iter().unwrap().map(|p| p.unwrap().sku()).collect();
        assert_eq!(skus, vec![Sku::new(1), Sku::new(2), Sku::new(3)]);
        assert_eq!(all.to_vec().unwrap().len(), 3, "second pass sees the same rows");

        let dry_in_one = c.list_products(
            ProductFilter::in_warehouse(WarehouseId::new(1)).with_kind(ProductKindTag::DryGood),
        );
        let skus: Vec<Sku> = dry_in_one.to_vec().unwrap().iter().map(|p| p.sku()).collect();
        assert_eq!(skus, vec![Sku::new(3)]);
    }

    #[test]
    fn listing_is_lazy() {
        let c = catalog();
        c.create_product(input(Some(1), 1, 0)).unwrap();
        c.create_product(input(Some(2), 1, 0)).unwrap();

        let listing = c.list_products(ProductFilter::all());
        let mut iter = listing.iter().unwrap();
        assert_eq!(iter.next().unwrap().unwrap().sku(), Sku::new(1));
        c.delete_product(Sku::new(2)).unwrap();
        assert!(iter.next().is_none());
    }
}
