//! Warehouse directory: the sites products may be placed in.

use std::collections::BTreeMap;
use std::sync::RwLock;

use tracing::info;

use stockledger_catalog::{NewWarehouse, Warehouse};
use stockledger_core::{DomainError, EntityKind, WarehouseId};

use crate::error::{InventoryResult, StoreError};

#[derive(Debug, Default)]
struct Sites {
    last_id: u64,
    by_id: BTreeMap<WarehouseId, Warehouse>,
}

/// Registry of warehouses. Products hold weak references into it.
#[derive(Debug, Default)]
pub struct WarehouseDirectory {
    sites: RwLock<Sites>,
}

impl WarehouseDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a warehouse under a caller-supplied or sequential id.
    pub fn register(&self, input: NewWarehouse) -> InventoryResult<WarehouseId> {
        let mut sites = self
            .sites
            .write()
            .map_err(|_| StoreError::LockPoisoned("warehouses"))?;

        let id = match input.id {
            Some(id) if sites.by_id.contains_key(&id) => {
                return Err(DomainError::conflict(format!("warehouse {id} already exists")).into());
            }
            Some(id) => id,
            None => {
                let exhausted = || DomainError::conflict("warehouse id sequence exhausted");
                let mut candidate = WarehouseId::new(sites.last_id).next().ok_or_else(exhausted)?;
                while sites.by_id.contains_key(&candidate) {
                    candidate = candidate.next().ok_or_else(exhausted)?;
                }
                candidate
            }
        };

        let warehouse = Warehouse::new(id, input)?;
        info!(warehouse_id = %id, name = warehouse.name(), "warehouse registered");
        sites.last_id = sites.last_id.max(id.get());
        sites.by_id.insert(id, warehouse);
        Ok(id)
    }

    pub fn get(&self, id: WarehouseId) -> InventoryResult<Warehouse> {
        let sites = self
            .sites
            .read()
            .map_err(|_| StoreError::LockPoisoned("warehouses"))?;
        sites
            .by_id
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::not_found(EntityKind::Warehouse, id).into())
    }

    pub fn contains(&self, id: WarehouseId) -> InventoryResult<bool> {
        let sites = self
            .sites
            .read()
            .map_err(|_| StoreError::LockPoisoned("warehouses"))?;
        Ok(sites.by_id.contains_key(&id))
    }

    /// All warehouses ordered by id.
    pub fn list(&self) -> InventoryResult<Vec<Warehouse>> {
        let sites = self
            .sites
            .read()
            .map_err(|_| StoreError::LockPoisoned("warehouses"))?;
        Ok(sites.by_id.values().cloned().collect())
    }
}
