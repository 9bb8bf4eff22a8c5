use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use stockledger_core::{Sku, StaffId, TransactionId};
use stockledger_ledger::{Transaction, TransactionStatus};

use crate::error::StoreError;

/// Append-only storage of ledger entries.
///
/// Entries are never removed; the only mutation is the conditional status
/// write performed by the stock engine.
pub trait TransactionStore: Send + Sync {
    /// Reserve the next transaction id (sequence semantics: ids of failed
    /// recordings are not reused).
    fn next_id(&self) -> Result<TransactionId, StoreError>;

    fn insert(&self, transaction: Transaction) -> Result<(), StoreError>;

    fn get(&self, id: TransactionId) -> Result<Option<Transaction>, StoreError>;

    /// Compare-and-set the status: fails with `StaleRecord` unless the stored
    /// status is still `from`.
    fn update_status(
        &self,
        id: TransactionId,
        from: TransactionStatus,
        to: TransactionStatus,
    ) -> Result<(), StoreError>;

    fn by_staff(&self, staff_id: StaffId) -> Result<Vec<Transaction>, StoreError>;

    fn by_sku(&self, sku: Sku) -> Result<Vec<Transaction>, StoreError>;

    /// Every entry, ascending by id.
    fn all(&self) -> Result<Vec<Transaction>, StoreError>;
}

impl<S> TransactionStore for Arc<S>
where
    S: TransactionStore + ?Sized,
{
    fn next_id(&self) -> Result<TransactionId, StoreError> {
        (**self).next_id()
    }

    fn insert(&self, transaction: Transaction) -> Result<(), StoreError> {
        (**self).insert(transaction)
    }

    fn get(&self, id: TransactionId) -> Result<Option<Transaction>, StoreError> {
        (**self).get(id)
    }

    fn update_status(
        &self,
        id: TransactionId,
        from: TransactionStatus,
        to: TransactionStatus,
    ) -> Result<(), StoreError> {
        (**self).update_status(id, from, to)
    }

    fn by_staff(&self, staff_id: StaffId) -> Result<Vec<Transaction>, StoreError> {
        (**self).by_staff(staff_id)
    }

    fn by_sku(&self, sku: Sku) -> Result<Vec<Transaction>, StoreError> {
        (**self).by_sku(sku)
    }

    fn all(&self) -> Result<Vec<Transaction>, StoreError> {
        (**self).all()
    }
}

#[derive(Debug, Default)]
struct Rows {
    last_id: u64,
    entries: BTreeMap<TransactionId, Transaction>,
}

/// In-memory append-only ledger table.
///
/// Intended for tests/dev. Not optimized for performance.
#[derive(Debug, Default)]
pub struct InMemoryTransactionStore {
    rows: RwLock<Rows>,
}

impl InMemoryTransactionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn filtered(&self, keep: impl Fn(&Transaction) -> bool) -> Result<Vec<Transaction>, StoreError> {
        let rows = self
            .rows
            .read()
            .map_err(|_| StoreError::LockPoisoned("transactions"))?;
        Ok(rows.entries.values().filter(|t| keep(t)).cloned().collect())
    }
}

impl TransactionStore for InMemoryTransactionStore {
    fn next_id(&self) -> Result<TransactionId, StoreError> {
        let mut rows = self
            .rows
            .write()
            .map_err(|_| StoreError::LockPoisoned("transactions"))?;
        rows.last_id = rows
            .last_id
            .checked_add(1)
            .ok_or(StoreError::SequenceExhausted("transaction ids"))?;
        Ok(TransactionId::new(rows.last_id))
    }

    fn insert(&self, transaction: Transaction) -> Result<(), StoreError> {
        let mut rows = self
            .rows
            .write()
            .map_err(|_| StoreError::LockPoisoned("transactions"))?;
        let id = transaction.id_typed();
        if rows.entries.contains_key(&id) {
            return Err(StoreError::StaleRecord(format!(
                "transaction {id} already recorded"
            )));
        }
        rows.last_id = rows.last_id.max(id.get());
        rows.entries.insert(id, transaction);
        Ok(())
    }

    fn get(&self, id: TransactionId) -> Result<Option<Transaction>, StoreError> {
        let rows = self
            .rows
            .read()
            .map_err(|_| StoreError::LockPoisoned("transactions"))?;
        Ok(rows.entries.get(&id).cloned())
    }

    fn update_status(
        &self,
        id: TransactionId,
        from: TransactionStatus,
        to: TransactionStatus,
    ) -> Result<(), StoreError> {
        let mut rows = self
            .rows
            .write()
            .map_err(|_| StoreError::LockPoisoned("transactions"))?;
        let entry = rows
            .entries
            .get_mut(&id)
            .ok_or_else(|| StoreError::MissingRecord(format!("transaction {id}")))?;

        if entry.status() != from {
            return Err(StoreError::StaleRecord(format!(
                "transaction {id} is {}, expected {from}",
                entry.status()
            )));
        }
        entry
            .transition_to(to)
            .map_err(|e| StoreError::StaleRecord(e.to_string()))
    }

    fn by_staff(&self, staff_id: StaffId) -> Result<Vec<Transaction>, StoreError> {
        self.filtered(|t| t.staff_id() == staff_id)
    }

    fn by_sku(&self, sku: Sku) -> Result<Vec<Transaction>, StoreError> {
        self.filtered(|t| t.sku() == sku)
    }

    fn all(&self) -> Result<Vec<Transaction>, StoreError> {
        self.filtered(|_| true)
    }
}
