//! In-process store.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use uuid::Uuid;

use crate::escrow::types::Transaction;
use crate::store::{StoreError, StoreResult, TransactionStore};

/// Records live only as long as the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<DashMap<Uuid, Transaction>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl TransactionStore for MemoryStore {
    fn create(&self, tx: Transaction) -> StoreResult<()> {
        match self.inner.entry(tx.id) {
            Entry::Occupied(_) => Err(StoreError::Duplicate(tx.id)),
            Entry::Vacant(slot) => {
                slot.insert(tx);
                Ok(())
            }
        }
    }

    fn get(&self, id: Uuid) -> StoreResult<Option<Transaction>> {
        Ok(self.inner.get(&id).map(|r| r.value().clone()))
    }

    fn list_all(&self) -> StoreResult<Vec<Transaction>> {
        Ok(self.inner.iter().map(|r| r.value().clone()).collect())
    }

    fn update(&self, tx: &Transaction) -> StoreResult<()> {
        match self.inner.get_mut(&tx.id) {
            Some(mut existing) => {
                *existing = tx.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(tx.id)),
        }
    }

    fn delete(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.inner.remove(&id).is_some())
    }
}
