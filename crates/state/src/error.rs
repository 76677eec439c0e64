//! Conversions from lower-layer failures into [`LedgerError`].
//!
//! Storage failures and undecodable records surface as `Internal`: they mean
//! the store is unusable or corrupt, never that the request was wrong.

use gitledger_types::{
    LedgerError,
    error::{InternalSnafu, Result},
};

/// Maps a storage-engine result into the ledger taxonomy.
pub(crate) trait StorageResultExt<T> {
    /// Converts a store error into `LedgerError::Internal`.
    fn or_internal(self) -> Result<T>;
}

impl<T> StorageResultExt<T> for std::result::Result<T, gitledger_store::Error> {
    #[track_caller]
    fn or_internal(self) -> Result<T> {
        self.map_err(|source| InternalSnafu { message: format!("storage failure: {source}") }.build())
    }
}

/// Builds the `Internal` error for a record that exists but cannot be decoded.
#[track_caller]
pub(crate) fn corrupt_record(what: impl std::fmt::Display, source: impl std::fmt::Display) -> LedgerError {
    InternalSnafu { message: format!("unable to decode {what}: {source}") }.build()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use gitledger_types::ErrorCode;

    use super::*;

    #[test]
    fn test_storage_error_becomes_internal() {
        let result: std::result::Result<(), _> =
            Err(gitledger_store::Error::WriteTransactionInProgress);
        let err = result.or_internal().unwrap_err();
        assert_eq!(err.code(), ErrorCode::Internal);
        assert!(err.message().contains("Write transaction already in progress"));
    }
}
