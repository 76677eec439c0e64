//! Database handle and transactions.
//!
//! Committed state is an immutable [`Snapshot`] behind an `Arc`. Readers clone
//! the `Arc` and never block. A single [`WriteTransaction`] at a time buffers
//! its writes in an overlay over the snapshot it started from; `commit()`
//! publishes a new snapshot with the overlay applied, and dropping or aborting
//! the transaction discards the overlay.

use std::{
    collections::BTreeMap,
    ops::Bound,
    sync::Arc,
};

use parking_lot::{Mutex, MutexGuard, RwLock};

use crate::error::{Error, Result};

/// Monotonic identifier of a committed snapshot. The empty database is snapshot 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct SnapshotId(u64);

impl SnapshotId {
    /// Returns the raw value.
    pub const fn value(self) -> u64 {
        self.0
    }

    const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// Database configuration options.
#[derive(Debug, Clone, bon::Builder)]
pub struct DatabaseConfig {
    /// Maximum key size in bytes (default 1024).
    #[builder(default = 1024)]
    pub max_key_size: usize,
    /// Maximum value size in bytes (default 4 MiB).
    #[builder(default = 4 * 1024 * 1024)]
    pub max_value_size: usize,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { max_key_size: 1024, max_value_size: 4 * 1024 * 1024 }
    }
}

/// Database statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatabaseStats {
    /// Latest committed snapshot.
    pub snapshot_id: SnapshotId,
    /// Number of keys in the latest snapshot.
    pub key_count: usize,
}

/// Entries yielded by a prefix scan, in ascending key order.
pub type Entries<'a> = Box<dyn DoubleEndedIterator<Item = (Vec<u8>, Vec<u8>)> + 'a>;

/// Read access shared by read and write transactions.
pub trait KvRead {
    /// Returns the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying lookup fails.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Returns true if `key` is present.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying lookup fails.
    fn contains(&self, key: &[u8]) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Iterates every entry whose key starts with `prefix`, in key order.
    /// The iterator is double-ended for reverse scans.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying scan fails.
    fn iter_prefix(&self, prefix: &[u8]) -> Result<Entries<'_>>;
}

/// Committed, immutable state.
#[derive(Debug, Default)]
struct Snapshot {
    id: SnapshotId,
    data: BTreeMap<Vec<u8>, Vec<u8>>,
}

/// Smallest key greater than every key starting with `prefix`, or `None` if
/// no such key exists (the prefix is empty or all `0xFF`).
fn prefix_end(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut end = prefix.to_vec();
    while let Some(last) = end.pop() {
        if last < u8::MAX {
            end.push(last + 1);
            return Some(end);
        }
    }
    None
}

fn prefix_bounds(prefix: &[u8]) -> (Bound<Vec<u8>>, Bound<Vec<u8>>) {
    let end = match prefix_end(prefix) {
        Some(end) => Bound::Excluded(end),
        None => Bound::Unbounded,
    };
    (Bound::Included(prefix.to_vec()), end)
}

/// The main database handle.
///
/// Thread-safe with interior mutability. Supports concurrent reads and
/// exclusive writes (single-writer model).
pub struct Database {
    config: DatabaseConfig,
    committed: RwLock<Arc<Snapshot>>,
    write_lock: Mutex<()>,
}

impl Database {
    /// Creates an empty in-memory database with default limits.
    pub fn open_in_memory() -> Self {
        Self::open_in_memory_with_config(DatabaseConfig::default())
    }

    /// Creates an empty in-memory database.
    pub fn open_in_memory_with_config(config: DatabaseConfig) -> Self {
        Self {
            config,
            committed: RwLock::new(Arc::new(Snapshot::default())),
            write_lock: Mutex::new(()),
        }
    }

    /// Begin a read-only transaction over the latest committed snapshot.
    ///
    /// Never blocks on a writer; later commits are not visible to it.
    pub fn read(&self) -> ReadTransaction {
        let snapshot = Arc::clone(&self.committed.read());
        ReadTransaction { snapshot }
    }

    /// Begin a write transaction.
    ///
    /// Only one write transaction can be active at a time; read transactions
    /// can run concurrently.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WriteTransactionInProgress`] if another write
    /// transaction is open.
    pub fn write(&self) -> Result<WriteTransaction<'_>> {
        let guard = self.write_lock.try_lock().ok_or(Error::WriteTransactionInProgress)?;
        let base = Arc::clone(&self.committed.read());
        Ok(WriteTransaction {
            db: self,
            base,
            pending: BTreeMap::new(),
            _write_guard: guard,
        })
    }

    /// Returns database statistics.
    pub fn stats(&self) -> DatabaseStats {
        let snapshot = self.committed.read();
        DatabaseStats { snapshot_id: snapshot.id, key_count: snapshot.data.len() }
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").field("stats", &self.stats()).finish_non_exhaustive()
    }
}

/// A read-only transaction over one committed snapshot.
pub struct ReadTransaction {
    snapshot: Arc<Snapshot>,
}

impl ReadTransaction {
    /// Snapshot this transaction reads.
    pub fn snapshot_id(&self) -> SnapshotId {
        self.snapshot.id
    }
}

impl KvRead for ReadTransaction {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.snapshot.data.get(key).cloned())
    }

    fn iter_prefix(&self, prefix: &[u8]) -> Result<Entries<'_>> {
        let iter = self
            .snapshot
            .data
            .range(prefix_bounds(prefix))
            .map(|(key, value)| (key.clone(), value.clone()));
        Ok(Box::new(iter))
    }
}

/// A write transaction.
///
/// Reads see the transaction's own pending writes. Nothing is visible to
/// other transactions until [`WriteTransaction::commit`].
///
/// **Drop behavior:** dropping without `commit()` discards every pending write.
pub struct WriteTransaction<'db> {
    db: &'db Database,
    base: Arc<Snapshot>,
    /// `None` marks a pending delete.
    pending: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
    _write_guard: MutexGuard<'db, ()>,
}

impl WriteTransaction<'_> {
    /// Inserts or updates a key-value pair.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyKey`], [`Error::KeyTooLarge`] or
    /// [`Error::ValueTooLarge`] if the entry violates the configured limits.
    pub fn insert(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        self.check_key(key)?;
        if value.len() > self.db.config.max_value_size {
            return Err(Error::ValueTooLarge {
                size: value.len(),
                max: self.db.config.max_value_size,
            });
        }
        self.pending.insert(key.to_vec(), Some(value.to_vec()));
        Ok(())
    }

    /// Deletes a key. Returns whether the key was present.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyKey`] or [`Error::KeyTooLarge`] for an invalid key.
    pub fn delete(&mut self, key: &[u8]) -> Result<bool> {
        self.check_key(key)?;
        let existed = self.get(key)?.is_some();
        if existed {
            self.pending.insert(key.to_vec(), None);
        }
        Ok(existed)
    }

    /// Number of pending inserts and deletes.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Publishes every pending write as a new snapshot.
    ///
    /// # Errors
    ///
    /// Infallible for the in-memory engine; the `Result` keeps the commit
    /// signature uniform with fallible engines.
    pub fn commit(mut self) -> Result<SnapshotId> {
        let mut data = self.base.data.clone();
        for (key, value) in std::mem::take(&mut self.pending) {
            match value {
                Some(value) => {
                    data.insert(key, value);
                },
                None => {
                    data.remove(&key);
                },
            }
        }
        let id = self.base.id.next();
        *self.db.committed.write() = Arc::new(Snapshot { id, data });
        Ok(id)
    }

    /// Aborts the transaction, discarding all pending writes.
    pub fn abort(self) {}

    fn check_key(&self, key: &[u8]) -> Result<()> {
        if key.is_empty() {
            return Err(Error::EmptyKey);
        }
        if key.len() > self.db.config.max_key_size {
            return Err(Error::KeyTooLarge { size: key.len(), max: self.db.config.max_key_size });
        }
        Ok(())
    }
}

impl KvRead for WriteTransaction<'_> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        match self.pending.get(key) {
            Some(pending) => Ok(pending.clone()),
            None => Ok(self.base.data.get(key).cloned()),
        }
    }

    fn iter_prefix(&self, prefix: &[u8]) -> Result<Entries<'_>> {
        let mut merged: BTreeMap<Vec<u8>, Vec<u8>> = self
            .base
            .data
            .range(prefix_bounds(prefix))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        for (key, value) in self.pending.range(prefix_bounds(prefix)) {
            match value {
                Some(value) => {
                    merged.insert(key.clone(), value.clone());
                },
                None => {
                    merged.remove(key);
                },
            }
        }
        Ok(Box::new(merged.into_iter()))
    }
}
