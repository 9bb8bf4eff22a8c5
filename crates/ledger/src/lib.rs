//! Ledger domain module.
//!
//! Inbound/outbound stock movements and their status life cycle, implemented
//! purely as deterministic domain logic (no IO, no storage). Applying a
//! committed movement to product stock is the infra crate's job.

pub mod status;
pub mod transaction;

pub use status::TransactionStatus;
pub use transaction::{
    Direction, Movement, RecordInbound, RecordOutbound, ShippingType, Transaction,
};
