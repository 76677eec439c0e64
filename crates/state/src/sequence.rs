//! Per-kind ID sequence counters.
//!
//! A counter holds the next ID to hand out for its entity kind, stored as
//! 8 big-endian bytes under `{Kind}-count-`. An absent counter reads as 0, so
//! the first entity of every kind gets ID 0.
//!
//! The allocator never rolls back: callers write the entity and then persist
//! `count + 1` within the same write transaction, and the transaction's
//! all-or-nothing commit keeps the two in step.

use gitledger_store::{KvRead, WriteTransaction};
use gitledger_types::{EntityKind, error::Result};

use crate::{
    error::{StorageResultExt, corrupt_record},
    keys::{LedgerKeys, decode_id, encode_id},
};

/// Sequence counter operations.
pub struct SequenceAllocator;

impl SequenceAllocator {
    /// Returns the ID the next entity of `kind` will receive.
    ///
    /// This is the persisted count (0 if absent). It does not advance the
    /// counter; see [`SequenceAllocator::set_count`].
    ///
    /// # Errors
    ///
    /// Returns `Internal` if the counter cannot be read or is not 8 bytes.
    pub fn next(txn: &impl KvRead, kind: EntityKind) -> Result<u64> {
        match txn.get(&LedgerKeys::count_key(kind)).or_internal()? {
            Some(bytes) => decode_id(&bytes).ok_or_else(|| {
                corrupt_record(format!("{kind} counter"), format!("{} bytes", bytes.len()))
            }),
            None => Ok(0),
        }
    }

    /// Overwrites the counter for `kind`.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if the write fails.
    pub fn set_count(txn: &mut WriteTransaction<'_>, kind: EntityKind, count: u64) -> Result<()> {
        txn.insert(&LedgerKeys::count_key(kind), &encode_id(count)).or_internal()
    }
}
