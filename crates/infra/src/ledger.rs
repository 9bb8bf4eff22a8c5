//! Transaction ledger: append-only record of movement requests and their status.

use std::sync::Arc;

use tracing::{info, warn};

use stockledger_core::{Clock, DomainError, EntityKind, Sku, StaffId, TransactionId};
use stockledger_ledger::{RecordInbound, RecordOutbound, Transaction, TransactionStatus};

use crate::catalog::Catalog;
use crate::engine::StockEngine;
use crate::error::InventoryResult;
use crate::store::{ProductStore, TransactionStore};

pub struct Ledger<P, T> {
    catalog: Arc<Catalog<P, T>>,
    transactions: Arc<T>,
    engine: Arc<StockEngine<P, T>>,
    clock: Arc<dyn Clock>,
}

impl<P, T> core::fmt::Debug for Ledger<P, T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Ledger").finish_non_exhaustive()
    }
}

impl<P, T> Ledger<P, T>
where
    P: ProductStore,
    T: TransactionStore,
{
    pub fn new(
        catalog: Arc<Catalog<P, T>>,
        transactions: Arc<T>,
        engine: Arc<StockEngine<P, T>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            catalog,
            transactions,
            engine,
            clock,
        }
    }

    /// Record a PENDING inbound movement against an existing SKU.
    pub fn record_inbound(&self, cmd: RecordInbound) -> InventoryResult<Transaction> {
        cmd.validate()?;
        let sku = cmd.sku;
        self.append(sku, |id, now| Transaction::inbound(id, cmd, now))
    }

    /// Record a PENDING outbound movement against an existing SKU.
    pub fn record_outbound(&self, cmd: RecordOutbound) -> InventoryResult<Transaction> {
        cmd.validate()?;
        let sku = cmd.sku;
        self.append(sku, |id, now| Transaction::outbound(id, cmd, now))
    }

    pub fn get_transaction(&self, id: TransactionId) -> InventoryResult<Transaction> {
        self.transactions
            .get(id)?
            .ok_or_else(|| DomainError::not_found(EntityKind::Transaction, id).into())
    }

    /// A staff member's transactions, newest first.
    pub fn list_transactions_by_staff(&self, staff_id: StaffId) -> InventoryResult<Vec<Transaction>> {
        let mut txs = self.transactions.by_staff(staff_id)?;
        newest_first(&mut txs);
        Ok(txs)
    }

    /// A SKU's transactions, newest first.
    pub fn list_transactions_by_sku(&self, sku: Sku) -> InventoryResult<Vec<Transaction>> {
        let mut txs = self.transactions.by_sku(sku)?;
        newest_first(&mut txs);
        Ok(txs)
    }

    /// Request a status change. Enforcement and stock effects belong to the
    /// stock engine; the new status is stored only once it approves.
    pub fn set_status(&self, id: TransactionId, status: TransactionStatus) -> InventoryResult<Transaction> {
        self.engine.set_status(id, status)
    }

    // Runs inside the SKU's exclusive section so the product cannot be deleted
    // between the existence check and the append. Commands are validated
    // before this point, so an id is only reserved for an entry that lands.
    fn append(
        &self,
        sku: Sku,
        build: impl FnOnce(TransactionId, chrono::DateTime<chrono::Utc>) -> Result<Transaction, DomainError>,
    ) -> InventoryResult<Transaction> {
        let _guard = self.catalog.locks().lock(sku);
        if !self.catalog.contains(sku)? {
            warn!(sku = %sku, "movement recorded against unknown sku");
            return Err(DomainError::validation("sku", format!("unknown sku {sku}")).into());
        }

        let id = self.transactions.next_id()?;
        let tx = build(id, self.clock.now())?;
        self.transactions.insert(tx.clone())?;
        info!(
            transaction_id = %id,
            sku = %sku,
            direction = ?tx.direction(),
            quantity = tx.quantity(),
            "transaction recorded"
        );
        Ok(tx)
    }
}

fn newest_first(txs: &mut [Transaction]) {
    txs.sort_by(|a, b| {
        b.date()
            .cmp(&a.date())
            .then_with(|| b.id_typed().cmp(&a.id_typed()))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal_macros::dec;
    use stockledger_catalog::{DryGood, NewProduct, NewWarehouse, ProductKind};
    use stockledger_core::{FixedClock, WarehouseId};
    use stockledger_ledger::{Direction, ShippingType};

    use crate::error::InventoryError;
    use crate::locks::SkuLocks;
    use crate::store::{InMemoryProductStore, InMemoryTransactionStore};
    use crate::warehouses::WarehouseDirectory;

    type TestLedger = Ledger<InMemoryProductStore, InMemoryTransactionStore>;

    fn now() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 3, 12, 0, 0).unwrap()
    }

    fn ledger() -> TestLedger {
        let warehouses = Arc::new(WarehouseDirectory::new());
        warehouses
            .register(NewWarehouse {
                id: Some(WarehouseId::new(1)),
                name: "Main".to_string(),
                location: String::new(),
            })
            .unwrap();
        let transactions = Arc::new(InMemoryTransactionStore::new());
        let catalog = Arc::new(Catalog::new(
            InMemoryProductStore::new(),
            transactions.clone(),
            warehouses,
            Arc::new(SkuLocks::new()),
            Sku::new(1),
        ));
        catalog
            .create_product(NewProduct {
                sku: Some(Sku::new(100)),
                warehouse_id: WarehouseId::new(1),
                name: "Salt".to_string(),
                brand: String::new(),
                description: String::new(),
                purchase_price: dec!(0.80),
                weight_per_unit_kg: 1.0,
                volume_per_unit_m3: 0.001,
                initial_quantity: 50,
                kind: ProductKind::DryGood(DryGood::default()),
            })
            .unwrap();
        let engine = Arc::new(StockEngine::new(catalog.clone(), transactions.clone()));
        Ledger::new(catalog, transactions, engine, Arc::new(FixedClock(now())))
    }

    fn inbound(staff_id: StaffId, sku: u64, quantity: u64, date: Option<chrono::DateTime<Utc>>) -> RecordInbound {
        RecordInbound {
            staff_id,
            sku: Sku::new(sku),
            quantity,
            date,
            shipping_type: ShippingType::StandardGround,
        }
    }

    #[test]
    fn recorded_inbound_is_pending_and_dated_now() {
        let ledger = ledger();
        let tx = ledger.record_inbound(inbound(StaffId::new(), 100, 20, None)).unwrap();
        assert_eq!(tx.status(), TransactionStatus::Pending);
        assert_eq!(tx.date(), now());
        assert_eq!(ledger.get_transaction(tx.id_typed()).unwrap(), tx);
    }

    #[test]
    fn unknown_sku_fails_validation() {
        let ledger = ledger();
        let err = ledger.record_inbound(inbound(StaffId::new(), 404, 1, None)).unwrap_err();
        assert!(matches!(
            err,
            InventoryError::Domain(DomainError::Validation { field: "sku", .. })
        ));
    }

    #[test]
    fn zero_quantity_fails_validation() {
        let ledger = ledger();
        let err = ledger.record_inbound(inbound(StaffId::new(), 100, 0, None)).unwrap_err();
        assert!(matches!(
            err,
            InventoryError::Domain(DomainError::Validation { field: "quantity", .. })
        ));
    }

    #[test]
    fn outbound_requires_address() {
        let ledger = ledger();
        let err = ledger
            .record_outbound(RecordOutbound {
                staff_id: StaffId::new(),
                sku: Sku::new(100),
                quantity: 3,
                date: None,
                shipping_type: ShippingType::SeaFreight,
                destination_address: String::new(),
            })
            .unwrap_err();
        assert!(matches!(
            err,
            InventoryError::Domain(DomainError::Validation {
                field: "destination_address",
                ..
            })
        ));
    }

    #[test]
    fn rejected_recordings_do_not_consume_ids() {
        let ledger = ledger();
        let staff = StaffId::new();
        let first = ledger.record_inbound(inbound(staff, 100, 1, None)).unwrap();
        assert!(ledger.record_inbound(inbound(staff, 100, 0, None)).is_err());
        assert!(ledger.record_inbound(inbound(staff, 404, 1, None)).is_err());
        let second = ledger.record_inbound(inbound(staff, 100, 1, None)).unwrap();
        assert_eq!(first.id_typed().next(), Some(second.id_typed()));
    }

    #[test]
    fn staff_listing_is_newest_first() {
        let ledger = ledger();
        let staff = StaffId::new();
        let other = StaffId::new();
        let old = ledger
            .record_inbound(inbound(staff, 100, 1, Some(now() - Duration::days(2))))
            .unwrap();
        let newest = ledger.record_inbound(inbound(staff, 100, 1, None)).unwrap();
        let middle = ledger
            .record_inbound(inbound(staff, 100, 1, Some(now() - Duration::days(1))))
            .unwrap();
        ledger.record_inbound(inbound(other, 100, 1, None)).unwrap();

        let ids: Vec<_> = ledger
            .list_transactions_by_staff(staff)
            .unwrap()
            .iter()
            .map(|t| t.id_typed())
            .collect();
        assert_eq!(ids, vec![newest.id_typed(), middle.id_typed(), old.id_typed()]);
    }

    #[test]
    fn same_date_ties_break_by_id() {
        let ledger = ledger();
        let staff = StaffId::new();
        let a = ledger.record_inbound(inbound(staff, 100, 1, None)).unwrap();
        let b = ledger.record_inbound(inbound(staff, 100, 1, None)).unwrap();
        let listed = ledger.list_transactions_by_sku(Sku::new(100)).unwrap();
        assert_eq!(listed[0].id_typed(), b.id_typed());
        assert_eq!(listed[1].id_typed(), a.id_typed());
    }

    #[test]
    fn set_status_goes_through_the_engine() {
        let ledger = ledger();
        let tx = ledger.record_inbound(inbound(StaffId::new(), 100, 20, None)).unwrap();
        let committed = ledger
            .set_status(tx.id_typed(), TransactionStatus::Committed)
            .unwrap();
        assert_eq!(committed.status(), TransactionStatus::Committed);
        assert_eq!(committed.direction(), Direction::Inbound);
        assert_eq!(
            ledger.catalog.get_product(Sku::new(100)).unwrap().quantity_on_hand(),
            70
        );
    }
}
