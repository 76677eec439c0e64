//! Centralized serialization and deserialization functions.
//!
//! Entity records, counters and index values are stored as postcard bytes.
//! Callers treat the encoding as opaque.

use serde::{Serialize, de::DeserializeOwned};
use snafu::Snafu;

/// Error type for codec operations.
#[derive(Debug, Snafu)]
pub enum CodecError {
    /// Encoding failed.
    #[snafu(display("Encoding failed: {source}"))]
    Encode {
        /// The underlying postcard error.
        source: postcard::Error,
    },

    /// Decoding failed.
    #[snafu(display("Decoding failed: {source}"))]
    Decode {
        /// The underlying postcard error.
        source: postcard::Error,
    },
}

/// Encodes a value to bytes using postcard serialization.
///
/// # Errors
///
/// Returns `CodecError::Encode` if serialization fails.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, CodecError> {
    postcard::to_allocvec(value).map_err(|source| CodecError::Encode { source })
}

/// Decodes bytes to a value using postcard deserialization.
///
/// # Errors
///
/// Returns `CodecError::Decode` if deserialization fails.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    postcard::from_bytes(bytes).map_err(|source| CodecError::Decode { source })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::{
        entities::Repository,
        types::{Address, CollaboratorRole, OrganizationId, OwnerRef, RepositoryId},
    };

    #[test]
    fn test_repository_record_survives_codec() {
        let mut repository = Repository {
            id: RepositoryId::new(3),
            creator: Address::new("gitopia1alice"),
            name: "alpha".to_string(),
            owner: OwnerRef::Organization(OrganizationId::new(9)),
            default_branch: "main".to_string(),
            branches: BTreeMap::from([("main".to_string(), "abc123".to_string())]),
            forks: vec![RepositoryId::new(4), RepositoryId::new(5)],
            parent: Some(RepositoryId::new(1)),
            fork: true,
            ..Repository::default()
        };
        repository.collaborators.insert(Address::new("gitopia1bob"), CollaboratorRole::Admin);

        let bytes = encode(&repository).expect("encode repository");
        let decoded: Repository = decode(&bytes).expect("decode repository");
        assert_eq!(decoded, repository);
    }

    #[test]
    fn test_decode_empty_bytes_fails() {
        let result: Result<Repository, _> = decode(&[]);
        assert!(matches!(result, Err(CodecError::Decode { .. })));
    }

    #[test]
    fn test_decode_truncated_bytes_fails() {
        let repository = Repository { name: "alpha".to_string(), ..Repository::default() };
        let bytes = encode(&repository).expect("encode repository");
        let result: Result<Repository, _> = decode(&bytes[..bytes.len() / 2]);
        assert!(result.is_err());
    }

    #[test]
    fn test_error_display() {
        let err = decode::<u64>(&[]).unwrap_err();
        assert!(err.to_string().starts_with("Decoding failed"));
    }
}
