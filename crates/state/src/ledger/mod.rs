//! The mutation surface.
//!
//! Each handler runs inside one write transaction. Every check that can fail
//! runs before the first write where the handler can arrange it, and a
//! handler that returns an error drops its transaction, so no partial write is
//! ever committed.

mod comment;
mod organization;
mod pull_request;
mod repository;
mod reward;
mod user;

use std::sync::Arc;

use gitledger_store::{Database, ReadTransaction, WriteTransaction};
use gitledger_types::{LedgerConfig, error::Result};
use tracing::debug;

use crate::{
    clock::{Clock, SystemClock},
    error::StorageResultExt,
};

/// Entity store handle exposing the mutation and query surfaces.
pub struct Ledger {
    db: Arc<Database>,
    config: LedgerConfig,
    clock: Arc<dyn Clock>,
}

#[bon::bon]
impl Ledger {
    /// Creates a ledger over `db`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` if `config` fails validation.
    #[builder]
    pub fn new(
        db: Arc<Database>,
        #[builder(default)] config: LedgerConfig,
        #[builder(default = Arc::new(SystemClock) as Arc<dyn Clock>)] clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self { db, config, clock })
    }
}

impl Ledger {
    /// Creates a ledger over a fresh in-memory database with default settings.
    pub fn in_memory() -> Self {
        Self {
            db: Arc::new(Database::open_in_memory()),
            config: LedgerConfig::default(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Returns the underlying database.
    pub fn database(&self) -> &Arc<Database> {
        &self.db
    }

    pub(crate) fn read(&self) -> ReadTransaction {
        self.db.read()
    }

    /// Runs `op` in a write transaction and commits only if it succeeds.
    ///
    /// `op` receives the transaction and the current timestamp.
    pub(crate) fn mutate<T>(
        &self,
        operation: &'static str,
        op: impl FnOnce(&mut WriteTransaction<'_>, i64) -> Result<T>,
    ) -> Result<T> {
        let mut txn = self.db.write().or_internal()?;
        let value = op(&mut txn, self.clock.now()).inspect_err(|err| {
            debug!(operation, error = %err, "mutation rejected");
        })?;
        txn.commit().or_internal()?;
        Ok(value)
    }
}

impl std::fmt::Debug for Ledger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ledger").field("db", &self.db).field("config", &self.config).finish()
    }
}
