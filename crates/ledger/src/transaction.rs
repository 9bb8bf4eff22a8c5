use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockledger_core::{DomainError, DomainResult, Entity, Sku, StaffId, TransactionId};

use crate::status::TransactionStatus;

/// Carrier class of a movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShippingType {
    StandardGround,
    SeaFreight,
    ExpressAir,
}

/// Movement direction: inbound adds stock on commit, outbound removes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Inbound,
    Outbound,
}

/// Direction-specific payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "direction", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Movement {
    Inbound,
    Outbound { destination_address: String },
}

impl Movement {
    pub fn direction(&self) -> Direction {
        match self {
            Movement::Inbound => Direction::Inbound,
            Movement::Outbound { .. } => Direction::Outbound,
        }
    }
}

/// Command: record a pending inbound movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordInbound {
    pub staff_id: StaffId,
    pub sku: Sku,
    pub quantity: u64,
    /// Business date; defaults to the recording time.
    pub date: Option<DateTime<Utc>>,
    pub shipping_type: ShippingType,
}

/// Command: record a pending outbound movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordOutbound {
    pub staff_id: StaffId,
    pub sku: Sku,
    pub quantity: u64,
    pub date: Option<DateTime<Utc>>,
    pub shipping_type: ShippingType,
    pub destination_address: String,
}

impl RecordInbound {
    /// Check the command without building an entry.
    pub fn validate(&self) -> DomainResult<()> {
        validate_quantity(self.quantity)
    }
}

impl RecordOutbound {
    /// Check the command without building an entry.
    pub fn validate(&self) -> DomainResult<()> {
        validate_quantity(self.quantity)?;
        if self.destination_address.trim().is_empty() {
            return Err(DomainError::validation(
                "destination_address",
                "destination address cannot be empty",
            ));
        }
        Ok(())
    }
}

/// Ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    id: TransactionId,
    sku: Sku,
    staff_id: StaffId,
    quantity: u64,
    date: DateTime<Utc>,
    shipping_type: ShippingType,
    status: TransactionStatus,
    movement: Movement,
}

impl Transaction {
    /// Build a PENDING inbound entry. `now` fills in a missing date.
    pub fn inbound(id: TransactionId, cmd: RecordInbound, now: DateTime<Utc>) -> DomainResult<Self> {
        cmd.validate()?;
        Ok(Self {
            id,
            sku: cmd.sku,
            staff_id: cmd.staff_id,
            quantity: cmd.quantity,
            date: cmd.date.unwrap_or(now),
            shipping_type: cmd.shipping_type,
            status: TransactionStatus::Pending,
            movement: Movement::Inbound,
        })
    }

    /// Build a PENDING outbound entry. `now` fills in a missing date.
    pub fn outbound(
        id: TransactionId,
        cmd: RecordOutbound,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        cmd.validate()?;
        let destination_address = cmd.destination_address.trim().to_string();
        Ok(Self {
            id,
            sku: cmd.sku,
            staff_id: cmd.staff_id,
            quantity: cmd.quantity,
            date: cmd.date.unwrap_or(now),
            shipping_type: cmd.shipping_type,
            status: TransactionStatus::Pending,
            movement: Movement::Outbound {
                destination_address,
            },
        })
    }

    pub fn id_typed(&self) -> TransactionId {
        self.id
    }

    pub fn sku(&self) -> Sku {
        self.sku
    }

    pub fn staff_id(&self) -> StaffId {
        self.staff_id
    }

    pub fn quantity(&self) -> u64 {
        self.quantity
    }

    pub fn date(&self) -> DateTime<Utc> {
        self.date
    }

    pub fn shipping_type(&self) -> ShippingType {
        self.shipping_type
    }

    pub fn status(&self) -> TransactionStatus {
        self.status
    }

    pub fn movement(&self) -> &Movement {
        &self.movement
    }

    pub fn direction(&self) -> Direction {
        self.movement.direction()
    }

    pub fn destination_address(&self) -> Option<&str> {
        match &self.movement {
            Movement::Outbound {
                destination_address,
            } => Some(destination_address),
            Movement::Inbound => None,
        }
    }

    /// Signed effect on quantity-on-hand once committed.
    pub fn stock_delta(&self) -> i64 {
        // `validate_quantity` keeps quantity within i64 range.
        let q = self.quantity as i64;
        match self.direction() {
            Direction::Inbound => q,
            Direction::Outbound => -q,
        }
    }

    /// Decide the stock effect of moving to `to`, without changing anything.
    ///
    /// Committing yields the movement's delta, voiding yields zero.
    pub fn plan_transition(&self, to: TransactionStatus) -> DomainResult<i64> {
        self.status.ensure_transition(self.id, to)?;
        Ok(match to {
            TransactionStatus::Committed => self.stock_delta(),
            _ => 0,
        })
    }

    /// Move to `to` if the life cycle allows it.
    pub fn transition_to(&mut self, to: TransactionStatus) -> DomainResult<()> {
        self.status.ensure_transition(self.id, to)?;
        self.status = to;
        Ok(())
    }
}

impl Entity for Transaction {
    type Id = TransactionId;

    fn id(&self) -> TransactionId {
        self.id
    }
}

fn validate_quantity(quantity: u64) -> DomainResult<()> {
    if quantity == 0 {
        return Err(DomainError::validation(
            "quantity",
            "quantity must be greater than zero",
        ));
    }
    if quantity > i64::MAX as u64 {
        return Err(DomainError::validation("quantity", "quantity is too large"));
    }
    Ok(())
}
