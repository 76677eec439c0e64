//! Name indexes.
//!
//! Two flavors:
//! - [`NameIndex`]: per-owner repository names, stored as a map field on the
//!   owning user or organization record
//! - [`WhoisIndex`], [`AddressIndex`]: global store-backed lookups resolved in
//!   two steps (name → ID → record), each step failing with its own `NotFound`
//!
//! Renames check the new name before releasing the old one, so a rejected
//! rename leaves the index untouched.

use std::collections::BTreeMap;

use gitledger_store::{KvRead, WriteTransaction};
use gitledger_types::{
    Address, Organization, OrganizationId, RepositoryId, Reward, RewardId, User, UserId, decode,
    encode,
    error::{AlreadyExistsSnafu, NotFoundSnafu, Result},
};

use crate::{
    entity::EntityStore,
    error::{StorageResultExt, corrupt_record},
    keys::{LedgerKeys, decode_id, encode_id},
};

// ============================================================================
// Per-owner repository names
// ============================================================================

/// Uniqueness-enforced repository names within one owner's namespace.
pub struct NameIndex;

impl NameIndex {
    /// Fails with `AlreadyExists` if `name` is taken.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyExists` naming the owner if the name is present.
    pub fn ensure_available(
        names: &BTreeMap<String, RepositoryId>,
        name: &str,
        owner: &str,
    ) -> Result<()> {
        if names.contains_key(name) {
            return AlreadyExistsSnafu {
                message: format!("repository {name} already exists for {owner}"),
            }
            .fail();
        }
        Ok(())
    }

    /// Maps `name` to `id`.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyExists` if the name is taken; the map is unchanged.
    pub fn reserve(
        names: &mut BTreeMap<String, RepositoryId>,
        name: &str,
        id: RepositoryId,
        owner: &str,
    ) -> Result<()> {
        Self::ensure_available(names, name, owner)?;
        names.insert(name.to_string(), id);
        Ok(())
    }

    /// Removes `name`, returning the ID it mapped to.
    pub fn release(names: &mut BTreeMap<String, RepositoryId>, name: &str) -> Option<RepositoryId> {
        names.remove(name)
    }

    /// Moves `id` from `old` to `new`.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyExists` if `new` is taken; the map is unchanged.
    pub fn rename(
        names: &mut BTreeMap<String, RepositoryId>,
        old: &str,
        new: &str,
        id: RepositoryId,
        owner: &str,
    ) -> Result<()> {
        Self::ensure_available(names, new, owner)?;
        Self::release(names, old);
        names.insert(new.to_string(), id);
        Ok(())
    }
}

// ============================================================================
// Whois: organization name → textual organization ID
// ============================================================================

/// Global organization-name index.
pub struct WhoisIndex;

impl WhoisIndex {
    /// Returns the textual organization ID registered for `name`.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if the entry cannot be read or decoded.
    pub fn get(txn: &impl KvRead, name: &str) -> Result<Option<String>> {
        match txn.get(&LedgerKeys::whois_key(name)).or_internal()? {
            Some(bytes) => decode(&bytes)
                .map(Some)
                .map_err(|source| corrupt_record(format!("whois entry {name}"), source)),
            None => Ok(None),
        }
    }

    /// Returns true if `name` is registered.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if the lookup fails.
    pub fn has(txn: &impl KvRead, name: &str) -> Result<bool> {
        txn.contains(&LedgerKeys::whois_key(name)).or_internal()
    }

    /// Registers `name` for `id`, overwriting any previous entry.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if the write fails.
    pub fn set(txn: &mut WriteTransaction<'_>, name: &str, id: OrganizationId) -> Result<()> {
        let bytes = encode(&id.value().to_string())?;
        txn.insert(&LedgerKeys::whois_key(name), &bytes).or_internal()
    }

    /// Removes the entry for `name`.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if the delete fails.
    pub fn remove(txn: &mut WriteTransaction<'_>, name: &str) -> Result<bool> {
        txn.delete(&LedgerKeys::whois_key(name)).or_internal()
    }

    /// Resolves `name` to its organization record.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the name is unregistered, and a distinct
    /// `NotFound` if the name points at a missing organization. Returns
    /// `Internal` if the stored ID is not numeric.
    pub fn resolve(txn: &impl KvRead, name: &str) -> Result<Organization> {
        let Some(text) = Self::get(txn, name)? else {
            return NotFoundSnafu { message: format!("organization name {name} doesn't exist") }
                .fail();
        };
        let id = text
            .parse::<u64>()
            .map(OrganizationId::new)
            .map_err(|source| corrupt_record(format!("whois entry {name}"), source))?;
        match EntityStore::find::<Organization>(txn, id)? {
            Some(organization) => Ok(organization),
            None => NotFoundSnafu {
                message: format!("organization {} for name {name} doesn't exist", id.value()),
            }
            .fail(),
        }
    }
}

// ============================================================================
// Address-keyed indexes
// ============================================================================

/// A global index from an address to the numeric ID of one record.
pub struct AddressIndex;

impl AddressIndex {
    /// Returns the ID stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if the entry cannot be read or is not 8 bytes.
    pub fn get(txn: &impl KvRead, key: &[u8]) -> Result<Option<u64>> {
        match txn.get(key).or_internal()? {
            Some(bytes) => decode_id(&bytes).map(Some).ok_or_else(|| {
                corrupt_record(
                    format!("index entry {}", String::from_utf8_lossy(key)),
                    format!("{} bytes", bytes.len()),
                )
            }),
            None => Ok(None),
        }
    }

    /// Stores `id` under `key`.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if the write fails.
    pub fn set(txn: &mut WriteTransaction<'_>, key: &[u8], id: u64) -> Result<()> {
        txn.insert(key, &encode_id(id)).or_internal()
    }

    /// Removes the entry under `key`.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if the delete fails.
    pub fn remove(txn: &mut WriteTransaction<'_>, key: &[u8]) -> Result<bool> {
        txn.delete(key).or_internal()
    }

    /// Returns the ID of the user registered for `address`.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if the entry is malformed.
    pub fn user_id(txn: &impl KvRead, address: &Address) -> Result<Option<UserId>> {
        Ok(Self::get(txn, &LedgerKeys::user_address_key(address))?.map(UserId::new))
    }

    /// Resolves `address` to its user record.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no user is registered for the address, and a
    /// distinct `NotFound` if the index points at a missing user.
    pub fn resolve_user(txn: &impl KvRead, address: &Address) -> Result<User> {
        let Some(id) = Self::user_id(txn, address)? else {
            return NotFoundSnafu { message: format!("user {address} doesn't exist") }.fail();
        };
        match EntityStore::find::<User>(txn, id)? {
            Some(user) => Ok(user),
            None => NotFoundSnafu {
                message: format!("user record {} for {address} doesn't exist", id.value()),
            }
            .fail(),
        }
    }

    /// Returns the ID of the reward granted to `recipient`.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if the entry is malformed.
    pub fn reward_id(txn: &impl KvRead, recipient: &Address) -> Result<Option<RewardId>> {
        Ok(Self::get(txn, &LedgerKeys::reward_recipient_key(recipient))?.map(RewardId::new))
    }

    /// Resolves `recipient` to its reward.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the recipient has no reward, and a distinct
    /// `NotFound` if the index points at a missing reward.
    pub fn resolve_reward(txn: &impl KvRead, recipient: &Address) -> Result<Reward> {
        let Some(id) = Self::reward_id(txn, recipient)? else {
            return NotFoundSnafu { message: format!("reward for {recipient} doesn't exist") }
                .fail();
        };
        match EntityStore::find::<Reward>(txn, id)? {
            Some(reward) => Ok(reward),
            None => NotFoundSnafu {
                message: format!("reward {} for {recipient} doesn't exist", id.value()),
            }
            .fail(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use gitledger_store::Database;
    use gitledger_types::ErrorCode;

    use super::*;

    #[test]
    fn test_reserve_rejects_duplicates() {
        let mut names = BTreeMap::new();
        NameIndex::reserve(&mut names, "alpha", RepositoryId::new(0), "u1").expect("reserve");
        let err = NameIndex::reserve(&mut names, "alpha", RepositoryId::new(1), "u1").unwrap_err();
        assert_eq!(err.code(), ErrorCode::AlreadyExists);
        assert_eq!(names.get("alpha"), Some(&RepositoryId::new(0)));
    }

    #[test]
    fn test_rename_checks_before_release() {
        let mut names = BTreeMap::new();
        NameIndex::reserve(&mut names, "alpha", RepositoryId::new(0), "u1").unwrap();
        NameIndex::reserve(&mut names, "beta", RepositoryId::new(1), "u1").unwrap();

        let err = NameIndex::rename(&mut names, "alpha", "beta", RepositoryId::new(0), "u1")
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::AlreadyExists);
        assert_eq!(names.len(), 2);
        assert_eq!(names.get("alpha"), Some(&RepositoryId::new(0)));

        NameIndex::rename(&mut names, "alpha", "gamma", RepositoryId::new(0), "u1").unwrap();
        assert!(!names.contains_key("alpha"));
        assert_eq!(names.get("gamma"), Some(&RepositoryId::new(0)));
    }

    #[test]
    fn test_whois_two_step_resolution() {
        let db = Database::open_in_memory();
        {
            let mut txn = db.write().expect("begin write");
            WhoisIndex::set(&mut txn, "ghost", OrganizationId::new(9)).expect("set whois");
            let org = Organization { name: "acme".to_string(), ..Organization::default() };
            let id = EntityStore::append(&mut txn, org).expect("append org");
            WhoisIndex::set(&mut txn, "acme", id).expect("set whois");
            txn.commit().expect("commit");
        }
        let read = db.read();

        let org = WhoisIndex::resolve(&read, "acme").expect("resolve");
        assert_eq!(org.name, "acme");
        assert_eq!(WhoisIndex::get(&read, "acme").unwrap(), Some("0".to_string()));

        let missing_name = WhoisIndex::resolve(&read, "nobody").unwrap_err();
        assert_eq!(missing_name.code(), ErrorCode::NotFound);
        assert!(missing_name.message().contains("organization name nobody"));

        let stale = WhoisIndex::resolve(&read, "ghost").unwrap_err();
        assert_eq!(stale.code(), ErrorCode::NotFound);
        assert!(stale.message().contains("organization 9"));
    }

    #[test]
    fn test_user_address_resolution() {
        let db = Database::open_in_memory();
        let address = Address::new("gitopia1alice");
        {
            let mut txn = db.write().expect("begin write");
            let user = User { address: address.clone(), ..User::default() };
            let id = EntityStore::append(&mut txn, user).expect("append user");
            AddressIndex::set(&mut txn, &LedgerKeys::user_address_key(&address), id.value())
                .expect("index");
            txn.commit().expect("commit");
        }
        let user = AddressIndex::resolve_user(&db.read(), &address).expect("resolve");
        assert_eq!(user.address, address);

        let err = AddressIndex::resolve_user(&db.read(), &Address::new("nobody")).unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);
    }
}
