//! Stock accounting engine: the transaction status state machine and its
//! effect on quantity-on-hand.
//!
//! ## Commit sequence
//!
//! ```text
//! lock(sku)
//!   ↓
//! 1. Re-read the transaction (status may have moved while we waited)
//!   ↓
//! 2. Plan the transition (InvalidTransition from a terminal state)
//!   ↓
//! 3. Adjust quantity (InsufficientStock → nothing written)
//!   ↓
//! 4. Conditional status write (failure → quantity adjustment reversed)
//! unlock(sku)
//! ```
//!
//! Quantity-on-hand therefore always equals the initial quantity plus the net
//! of COMMITTED transactions, and two commits against one SKU can never both
//! observe the same stale quantity.

use std::sync::Arc;

use tracing::{error, info, instrument, warn};

use stockledger_catalog::Product;
use stockledger_core::{DomainError, EntityKind, Sku, TransactionId};
use stockledger_ledger::{Transaction, TransactionStatus};

use crate::catalog::Catalog;
use crate::error::InventoryResult;
use crate::locks::SkuGuard;
use crate::store::{ProductStore, TransactionStore};

/// Outcome of retiring a product under the cascade-void policy.
#[derive(Debug, Clone, PartialEq)]
pub struct RetiredProduct {
    pub product: Product,
    /// PENDING transactions voided on the way out.
    pub voided: Vec<TransactionId>,
}

#[derive(Debug)]
pub struct StockEngine<P, T> {
    catalog: Arc<Catalog<P, T>>,
    transactions: Arc<T>,
}

impl<P, T> StockEngine<P, T>
where
    P: ProductStore,
    T: TransactionStore,
{
    pub fn new(catalog: Arc<Catalog<P, T>>, transactions: Arc<T>) -> Self {
        Self {
            catalog,
            transactions,
        }
    }

    /// Move transaction `id` to `to`, applying its stock effect atomically.
    ///
    /// On any error the transaction keeps its previous status and the SKU's
    /// quantity is unchanged.
    #[instrument(skip_all, fields(transaction_id = %id, to = %to), err)]
    pub fn set_status(&self, id: TransactionId, to: TransactionStatus) -> InventoryResult<Transaction> {
        let sku = self.load(id)?.sku();
        let guard = self.catalog.locks().lock(sku);
        self.transition_locked(&guard, id, to)
    }

    pub fn commit(&self, id: TransactionId) -> InventoryResult<Transaction> {
        self.set_status(id, TransactionStatus::Committed)
    }

    pub fn void(&self, id: TransactionId) -> InventoryResult<Transaction> {
        self.set_status(id, TransactionStatus::Voided)
    }

    /// Void every PENDING transaction against `sku`, then delete the product.
    ///
    /// Committed and voided history keeps referencing the removed SKU.
    #[instrument(skip_all, fields(sku = %sku), err)]
    pub(crate) fn retire_product(&self, sku: Sku) -> InventoryResult<RetiredProduct> {
        let guard = self.catalog.locks().lock(sku);
        if !self.catalog.contains(sku)? {
            return Err(DomainError::not_found(EntityKind::Product, sku).into());
        }

        let mut voided = Vec::new();
        for tx in self.transactions.by_sku(sku)? {
            if tx.status() == TransactionStatus::Pending {
                self.transition_locked(&guard, tx.id_typed(), TransactionStatus::Voided)?;
                voided.push(tx.id_typed());
            }
        }

        let product = self.catalog.remove_locked(&guard)?;
        info!(sku = %sku, voided = voided.len(), "product retired");
        Ok(RetiredProduct { product, voided })
    }

    fn transition_locked(
        &self,
        guard: &SkuGuard<'_>,
        id: TransactionId,
        to: TransactionStatus,
    ) -> InventoryResult<Transaction> {
        let mut tx = self.load(id)?;
        debug_assert_eq!(tx.sku(), guard.sku());

        let from = tx.status();
        let delta = match tx.plan_transition(to) {
            Ok(delta) => delta,
            Err(e) => {
                warn!(transaction_id = %id, from = %from, to = %to, "invalid status transition");
                return Err(e.into());
            }
        };

        if delta != 0 {
            if let Err(e) = self.catalog.adjust_quantity(guard, delta) {
                warn!(transaction_id = %id, sku = %tx.sku(), delta, error = %e, "commit rejected");
                return Err(e);
            }
        }

        if let Err(e) = self.transactions.update_status(id, from, to) {
            if delta != 0 {
                match self.catalog.adjust_quantity(guard, -delta) {
                    Ok(_) => warn!(transaction_id = %id, error = %e, "status write failed, quantity restored"),
                    Err(rollback) => error!(
                        transaction_id = %id,
                        sku = %tx.sku(),
                        delta,
                        error = %e,
                        rollback_error = %rollback,
                        "status write failed and quantity rollback failed"
                    ),
                }
            }
            return Err(e.into());
        }

        tx.transition_to(to)?;
        info!(transaction_id = %id, sku = %tx.sku(), from = %from, to = %to, delta, "transaction status changed");
        Ok(tx)
    }

    fn load(&self, id: TransactionId) -> InventoryResult<Transaction> {
        self.transactions
            .get(id)?
            .ok_or_else(|| DomainError::not_found(EntityKind::Transaction, id).into())
    }
}
