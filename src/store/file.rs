//! JSON file store.
//!
//! The whole table is rewritten on every mutation: serialized to a sibling
//! temp file, then renamed over the target, so a crash mid-write leaves the
//! previous snapshot intact.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use uuid::Uuid;

use crate::escrow::types::Transaction;
use crate::store::{StoreError, StoreResult, TransactionStore};

pub struct FileStore {
    path: PathBuf,
    inner: DashMap<Uuid, Transaction>,
    // Serializes mutate-then-flush so snapshots land in order.
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Open the store at `path`, loading any existing snapshot.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let inner = DashMap::new();
        if path.exists() {
            let reader = BufReader::new(File::open(&path)?);
            let records: Vec<Transaction> = serde_json::from_reader(reader)?;
            for tx in records {
                inner.insert(tx.id, tx);
            }
            tracing::info!(path = %path.display(), count = inner.len(), "Loaded transaction store");
        }

        Ok(Self {
            path,
            inner,
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn flush(&self) -> StoreResult<()> {
        let mut records: Vec<Transaction> = self.inner.iter().map(|r| r.value().clone()).collect();
        records.sort_by_key(|tx| (tx.received_at, tx.id));

        let tmp = self.path.with_extension("json.tmp");
        {
            let mut writer = BufWriter::new(File::create(&tmp)?);
            serde_json::to_writer_pretty(&mut writer, &records)?;
            writer.flush()?;
            writer.get_ref().sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl std::fmt::Debug for FileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileStore")
            .field("path", &self.path)
            .field("records", &self.inner.len())
            .finish()
    }
}

impl TransactionStore for FileStore {
    fn create(&self, tx: Transaction) -> StoreResult<()> {
        let _guard = self.lock();
        let id = tx.id;
        match self.inner.entry(id) {
            Entry::Occupied(_) => return Err(StoreError::Duplicate(id)),
            Entry::Vacant(slot) => {
                slot.insert(tx);
            }
        }
        if let Err(e) = self.flush() {
            self.inner.remove(&id);
            return Err(e);
        }
        Ok(())
    }

    fn get(&self, id: Uuid) -> StoreResult<Option<Transaction>> {
        Ok(self.inner.get(&id).map(|r| r.value().clone()))
    }

    fn list_all(&self) -> StoreResult<Vec<Transaction>> {
        Ok(self.inner.iter().map(|r| r.value().clone()).collect())
    }

    fn update(&self, tx: &Transaction) -> StoreResult<()> {
        let _guard = self.lock();
        let previous = match self.inner.get_mut(&tx.id) {
            Some(mut existing) => std::mem::replace(&mut *existing, tx.clone()),
            None => return Err(StoreError::NotFound(tx.id)),
        };
        if let Err(e) = self.flush() {
            self.inner.insert(tx.id, previous);
            return Err(e);
        }
        Ok(())
    }

    fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let _guard = self.lock();
        let Some((_, removed)) = self.inner.remove(&id) else {
            return Ok(false);
        };
        if let Err(e) = self.flush() {
            self.inner.insert(id, removed);
            return Err(e);
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::escrow::amount::Amount;
    use crate::escrow::types::{NewTransaction, TransactionStatus};
    use alloy::primitives::TxHash;
    use chrono::Utc;
    use tempfile::TempDir;

    fn record(byte: u8) -> Transaction {
        Transaction::new_pending(
            NewTransaction {
                sender_address: "0xA".to_string(),
                destination_address: "0xB".to_string(),
                amount: Amount::parse_ether("1.5").unwrap(),
                escrow_tx_hash: TxHash::repeat_byte(byte),
                escrow_wallet: Some("0xE".to_string()),
                chain_id: Some(11_155_111),
            },
            Utc::now(),
        )
    }

    #[test]
    fn test_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/transactions.json");

        let mut tx = record(1);
        let other = record(2);
        {
            let store = FileStore::open(&path).unwrap();
            store.create(tx.clone()).unwrap();
            store.create(other.clone()).unwrap();
            tx.mark_verified(5, Utc::now()).unwrap();
            store.update(&tx).unwrap();
            assert!(store.delete(other.id).unwrap());
        }

        let reopened = FileStore::open(&path).unwrap();
        let loaded = reopened.get(tx.id).unwrap().unwrap();
        assert_eq!(loaded, tx);
        assert_eq!(loaded.status, TransactionStatus::Verified);
        assert!(reopened.get(other.id).unwrap().is_none());
        assert_eq!(reopened.list_all().unwrap().len(), 1);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_duplicate_and_missing() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path().join("tx.json")).unwrap();
        let tx = record(3);

        store.create(tx.clone()).unwrap();
        assert!(matches!(store.create(tx.clone()), Err(StoreError::Duplicate(_))));
        assert!(matches!(store.update(&record(4)), Err(StoreError::NotFound(_))));
        assert!(!store.delete(Uuid::new_v4()).unwrap());
    }

    #[test]
    fn test_corrupt_snapshot_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tx.json");
        fs::write(&path, "not json").unwrap();
        assert!(matches!(FileStore::open(&path), Err(StoreError::Serialization(_))));
    }
}
