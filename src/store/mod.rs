//! Transaction persistence.
//!
//! The lifecycle engine only sees [`TransactionStore`]. Two backends:
//! [`MemoryStore`] for tests and ephemeral runs, [`FileStore`] which
//! rewrites a JSON snapshot on every mutation so records survive restarts.

pub mod file;
pub mod memory;

use thiserror::Error;
use uuid::Uuid;

use crate::escrow::types::Transaction;

pub use file::FileStore;
pub use memory::MemoryStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Transaction {0} already exists")]
    Duplicate(Uuid),

    #[error("Transaction {0} not found")]
    NotFound(Uuid),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Keyed storage for transaction records.
///
/// All operations are atomic per record. `list_all` is a snapshot; records
/// created or deleted concurrently may or may not appear in it.
pub trait TransactionStore: Send + Sync {
    /// Insert a new record. Fails if the id is taken.
    fn create(&self, tx: Transaction) -> StoreResult<()>;

    fn get(&self, id: Uuid) -> StoreResult<Option<Transaction>>;

    fn list_all(&self) -> StoreResult<Vec<Transaction>>;

    /// Replace an existing record.
    fn update(&self, tx: &Transaction) -> StoreResult<()>;

    /// Remove a record. Returns whether it existed.
    fn delete(&self, id: Uuid) -> StoreResult<bool>;
}
