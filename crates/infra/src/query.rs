//! Read-only statistics over the catalog and the ledger.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;

use stockledger_catalog::{ProductFilter, ProductKindTag};
use stockledger_core::{Clock, DomainError, EntityKind, StaffId, WarehouseId};
use stockledger_ledger::{Direction, TransactionStatus};

use crate::catalog::Catalog;
use crate::error::InventoryResult;
use crate::store::{ProductStore, TransactionStore};
use crate::warehouses::WarehouseDirectory;

/// Where the low-stock threshold of a dry good comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LowStockThreshold {
    /// Each product's own reorder point.
    #[default]
    ReorderPoint,
    /// One threshold for every product.
    Fixed(u64),
}

impl LowStockThreshold {
    fn as_override(self) -> Option<u64> {
        match self {
            LowStockThreshold::ReorderPoint => None,
            LowStockThreshold::Fixed(n) => Some(n),
        }
    }
}

/// Dashboard figures for one warehouse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventoryStats {
    pub warehouse_id: WarehouseId,
    pub product_count: usize,
    pub low_stock: usize,
    pub inbound_today: usize,
    pub outbound_today: usize,
    pub stock_value: Decimal,
}

pub struct QueryFacade<P, T> {
    catalog: Arc<Catalog<P, T>>,
    transactions: Arc<T>,
    warehouses: Arc<WarehouseDirectory>,
    clock: Arc<dyn Clock>,
}

impl<P, T> core::fmt::Debug for QueryFacade<P, T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("QueryFacade").finish_non_exhaustive()
    }
}

impl<P, T> QueryFacade<P, T>
where
    P: ProductStore,
    T: TransactionStore,
{
    pub fn new(
        catalog: Arc<Catalog<P, T>>,
        transactions: Arc<T>,
        warehouses: Arc<WarehouseDirectory>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            catalog,
            transactions,
            warehouses,
            clock,
        }
    }

    /// Non-voided transactions in `direction` dated on the current UTC day.
    pub fn count_transactions_today(&self, direction: Direction) -> InventoryResult<usize> {
        let today = self.clock.today();
        Ok(self
            .transactions
            .all()?
            .iter()
            .filter(|t| {
                t.direction() == direction
                    && t.status() != TransactionStatus::Voided
                    && t.date().date_naive() == today
            })
            .count())
    }

    /// Dry goods in `warehouse_id` whose quantity is at or below the threshold.
    pub fn count_low_stock(
        &self,
        warehouse_id: WarehouseId,
        threshold: LowStockThreshold,
    ) -> InventoryResult<usize> {
        self.ensure_warehouse(warehouse_id)?;
        let listing = self.catalog.list_products(
            ProductFilter::in_warehouse(warehouse_id).with_kind(ProductKindTag::DryGood),
        );
        let mut count = 0;
        for product in listing.iter()? {
            if product?.is_low_stock(threshold.as_override()) {
                count += 1;
            }
        }
        Ok(count)
    }

    pub fn count_pending(&self, staff_id: StaffId) -> InventoryResult<usize> {
        self.count_with_status(staff_id, TransactionStatus::Pending)
    }

    pub fn count_committed(&self, staff_id: StaffId) -> InventoryResult<usize> {
        self.count_with_status(staff_id, TransactionStatus::Committed)
    }

    /// Σ purchase price × quantity-on-hand over the warehouse's products.
    pub fn stock_valuation(&self, warehouse_id: WarehouseId) -> InventoryResult<Decimal> {
        self.ensure_warehouse(warehouse_id)?;
        let mut total = Decimal::ZERO;
        for product in self
            .catalog
            .list_products(ProductFilter::in_warehouse(warehouse_id))
            .iter()?
        {
            total = total
                .checked_add(product?.stock_value()?)
                .ok_or_else(|| {
                    DomainError::validation(
                        "stock_value",
                        format!("stock value of warehouse {warehouse_id} is out of range"),
                    )
                })?;
        }
        Ok(total)
    }

    pub fn snapshot(
        &self,
        warehouse_id: WarehouseId,
        threshold: LowStockThreshold,
    ) -> InventoryResult<InventoryStats> {
        let product_count = self
            .catalog
            .list_products(ProductFilter::in_warehouse(warehouse_id))
            .iter()?
            .count();
        Ok(InventoryStats {
            warehouse_id,
            product_count,
            low_stock: self.count_low_stock(warehouse_id, threshold)?,
            inbound_today: self.count_transactions_today(Direction::Inbound)?,
            outbound_today: self.count_transactions_today(Direction::Outbound)?,
            stock_value: self.stock_valuation(warehouse_id)?,
        })
    }

    fn count_with_status(&self, staff_id: StaffId, status: TransactionStatus) -> InventoryResult<usize> {
        Ok(self
            .transactions
            .by_staff(staff_id)?
            .iter()
            .filter(|t| t.status() == status)
            .count())
    }

    fn ensure_warehouse(&self, warehouse_id: WarehouseId) -> InventoryResult<()> {
        if !self.warehouses.contains(warehouse_id)? {
            return Err(DomainError::not_found(EntityKind::Warehouse, warehouse_id).into());
        }
        Ok(())
    }
}
