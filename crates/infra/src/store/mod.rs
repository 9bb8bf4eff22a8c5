//! Persistence seams for products and transactions.
//!
//! Components only need unique-key lookup and single-record writes; the
//! cross-record atomicity of a commit is provided by the stock engine holding
//! the SKU's exclusive section. A relational backend implements the same
//! traits over a product table and a transaction table.

pub mod product_store;
pub mod transaction_store;

pub use product_store::{InMemoryProductStore, ProductStore};
pub use transaction_store::{InMemoryTransactionStore, TransactionStore};
