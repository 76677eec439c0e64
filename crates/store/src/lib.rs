//! gitledger-store: the ordered key-value engine underneath the ledger state.
//!
//! - **Ordered keys**: byte-wise key order, so fixed-width big-endian IDs
//!   iterate in numeric order
//! - **Snapshot reads**: readers see one committed state and never block
//! - **Single writer**: one write transaction at a time, atomic on `commit()`,
//!   discarded on drop
//!
//! ## Quick Start
//!
//! ```no_run
//! use gitledger_store::{Database, KvRead};
//!
//! let db = Database::open_in_memory();
//!
//! // Write transaction
//! let mut txn = db.write()?;
//! txn.insert(b"key", b"value")?;
//! txn.commit()?;
//!
//! // Read transaction
//! let txn = db.read();
//! let value = txn.get(b"key")?;
//! # Ok::<(), gitledger_store::Error>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod db;
pub mod error;

pub use db::{
    Database, DatabaseConfig, DatabaseStats, Entries, KvRead, ReadTransaction, SnapshotId,
    WriteTransaction,
};
pub use error::{Error, Result};
