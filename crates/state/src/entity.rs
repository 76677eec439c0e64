//! Keyed entity storage.
//!
//! Generic get/has/set/delete/list over the `{Kind}-value-{id:8BE}` key space.
//! A missing key never reaches the decoder: [`EntityStore::get`] checks
//! presence and reports `NotFound`, while a present but undecodable record
//! is `Internal`.

use gitledger_store::{KvRead, WriteTransaction};
use gitledger_types::{
    Comment, CommentId, EntityKind, Organization, OrganizationId, PullRequest, PullRequestId,
    Repository, RepositoryId, Reward, RewardId, User, UserId, decode, encode,
    error::{NotFoundSnafu, Result},
};
use serde::{Serialize, de::DeserializeOwned};

use crate::{
    error::{StorageResultExt, corrupt_record},
    keys::LedgerKeys,
    sequence::SequenceAllocator,
};

/// A record persisted in the keyed entity store.
pub trait StoredEntity: Serialize + DeserializeOwned {
    /// Identifier newtype of this kind.
    type Id: Copy + From<u64> + Into<u64> + std::fmt::Display;

    /// Kind whose namespace and sequence the record uses.
    const KIND: EntityKind;

    /// Returns the record's ID.
    fn id(&self) -> Self::Id;

    /// Assigns the record's ID. Called once, on creation.
    fn set_id(&mut self, id: Self::Id);
}

macro_rules! stored_entity {
    ($record:ty, $id:ty, $kind:expr) => {
        impl StoredEntity for $record {
            type Id = $id;
            const KIND: EntityKind = $kind;

            fn id(&self) -> Self::Id {
                self.id
            }

            fn set_id(&mut self, id: Self::Id) {
                self.id = id;
            }
        }
    };
}

stored_entity!(Repository, RepositoryId, EntityKind::Repository);
stored_entity!(Organization, OrganizationId, EntityKind::Organization);
stored_entity!(User, UserId, EntityKind::User);
stored_entity!(Comment, CommentId, EntityKind::Comment);
stored_entity!(PullRequest, PullRequestId, EntityKind::PullRequest);
stored_entity!(Reward, RewardId, EntityKind::Reward);

/// Entity storage operations.
pub struct EntityStore;

impl EntityStore {
    fn key<E: StoredEntity>(id: E::Id) -> Vec<u8> {
        LedgerKeys::entity_key(E::KIND, id.into())
    }

    fn decode_record<E: StoredEntity>(id: impl std::fmt::Display, bytes: &[u8]) -> Result<E> {
        decode(bytes).map_err(|source| corrupt_record(format!("{} {id}", E::KIND), source))
    }

    /// Returns the record with `id`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if absent, `Internal` if the stored bytes do not decode.
    pub fn get<E: StoredEntity>(txn: &impl KvRead, id: E::Id) -> Result<E> {
        match Self::find(txn, id)? {
            Some(entity) => Ok(entity),
            None => NotFoundSnafu {
                message: format!("{} {} doesn't exist", E::KIND, Into::<u64>::into(id)),
            }
            .fail(),
        }
    }

    /// Returns the record with `id`, or `None` if absent.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if the stored bytes do not decode.
    pub fn find<E: StoredEntity>(txn: &impl KvRead, id: E::Id) -> Result<Option<E>> {
        match txn.get(&Self::key::<E>(id)).or_internal()? {
            Some(bytes) => Self::decode_record(id, &bytes).map(Some),
            None => Ok(None),
        }
    }

    /// Returns true if a record with `id` exists.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if the lookup fails.
    pub fn has<E: StoredEntity>(txn: &impl KvRead, id: E::Id) -> Result<bool> {
        txn.contains(&Self::key::<E>(id)).or_internal()
    }

    /// Writes `entity` under its own ID, replacing any previous record.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if encoding or the write fails.
    pub fn set<E: StoredEntity>(txn: &mut WriteTransaction<'_>, entity: &E) -> Result<()> {
        let bytes = encode(entity)?;
        txn.insert(&Self::key::<E>(entity.id()), &bytes).or_internal()
    }

    /// Deletes the record with `id`. Returns whether it existed.
    ///
    /// Indexes that reference the record are not touched.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if the delete fails.
    pub fn delete<E: StoredEntity>(txn: &mut WriteTransaction<'_>, id: E::Id) -> Result<bool> {
        txn.delete(&Self::key::<E>(id)).or_internal()
    }

    /// Returns every record of the kind in ascending ID order.
    ///
    /// Unbounded; paginated queries go through [`crate::pagination`].
    ///
    /// # Errors
    ///
    /// Returns `Internal` if the scan fails or a record does not decode.
    pub fn list_all<E: StoredEntity>(txn: &impl KvRead) -> Result<Vec<E>> {
        let prefix = LedgerKeys::entity_prefix(E::KIND);
        txn.iter_prefix(&prefix)
            .or_internal()?
            .map(|(key, value)| {
                let id = LedgerKeys::parse_entity_key(E::KIND, &key).unwrap_or_default();
                Self::decode_record(id, &value)
            })
            .collect()
    }

    /// Stores a new record under the next ID of its kind and advances the
    /// counter. Returns the assigned ID.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if the counter is exhausted or a write fails.
    pub fn append<E: StoredEntity>(txn: &mut WriteTransaction<'_>, mut entity: E) -> Result<E::Id> {
        let next = SequenceAllocator::next(&*txn, E::KIND)?;
        let following = next.checked_add(1).ok_or_else(|| {
            corrupt_record(format!("{} counter", E::KIND), "sequence exhausted")
        })?;
        let id = E::Id::from(next);
        entity.set_id(id);
        Self::set(txn, &entity)?;
        SequenceAllocator::set_count(txn, E::KIND, following)?;
        Ok(id)
    }
}
