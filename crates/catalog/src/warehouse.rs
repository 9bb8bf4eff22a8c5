use serde::{Deserialize, Serialize};

use stockledger_core::{DomainError, DomainResult, Entity, WarehouseId};

/// Input for registering a warehouse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewWarehouse {
    /// Caller-chosen id; `None` lets the directory assign the next one.
    pub id: Option<WarehouseId>,
    pub name: String,
    pub location: String,
}

/// A storage site products are placed in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warehouse {
    id: WarehouseId,
    name: String,
    location: String,
}

impl Warehouse {
    pub fn new(id: WarehouseId, input: NewWarehouse) -> DomainResult<Self> {
        if input.name.trim().is_empty() {
            return Err(DomainError::validation("name", "warehouse name cannot be empty"));
        }
        Ok(Self {
            id,
            name: input.name.trim().to_string(),
            location: input.location.trim().to_string(),
        })
    }

    pub fn id_typed(&self) -> WarehouseId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn location(&self) -> &str {
        &self.location
    }
}

impl Entity for Warehouse {
    type Id = WarehouseId;

    fn id(&self) -> WarehouseId {
        self.id
    }
}
