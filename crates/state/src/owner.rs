//! Repository ownership.
//!
//! A repository is held by a user or an organization. Both keep the same pair
//! of back-references: an ordered `repositories` list and a
//! `repository_names` map. [`OwnerRecord`] wraps either record so callers can
//! authorize, attach, detach and persist without branching on the owner kind.

use std::collections::BTreeMap;

use gitledger_store::{KvRead, WriteTransaction};
use gitledger_types::{
    Address, MemberRole, Organization, OwnerRef, Repository, RepositoryId, User,
    error::{InvalidRequestSnafu, Result, UnauthorizedSnafu},
};
use tracing::debug;

use crate::{
    collections::{append_unique, remove_by_value},
    entity::EntityStore,
    names::{AddressIndex, NameIndex},
};

/// The resolved record of a repository owner.
#[derive(Debug, Clone, PartialEq)]
pub enum OwnerRecord {
    /// A user, referenced by address.
    User(User),
    /// An organization, referenced by ID.
    Organization(Organization),
}

impl OwnerRecord {
    /// Loads the record `owner` points at.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the user or organization does not exist.
    pub fn resolve(txn: &impl KvRead, owner: &OwnerRef) -> Result<Self> {
        match owner {
            OwnerRef::User(address) => AddressIndex::resolve_user(txn, address).map(Self::User),
            OwnerRef::Organization(id) => EntityStore::get(txn, *id).map(Self::Organization),
        }
    }

    /// Returns the reference a repository stores for this owner.
    pub fn owner_ref(&self) -> OwnerRef {
        match self {
            Self::User(user) => OwnerRef::User(user.address.clone()),
            Self::Organization(org) => OwnerRef::Organization(org.id),
        }
    }

    /// Repository names held by this owner.
    pub fn repository_names(&self) -> &BTreeMap<String, RepositoryId> {
        match self {
            Self::User(user) => &user.repository_names,
            Self::Organization(org) => &org.repository_names,
        }
    }

    /// Repository IDs held by this owner, in append order.
    pub fn repositories(&self) -> &[RepositoryId] {
        match self {
            Self::User(user) => &user.repositories,
            Self::Organization(org) => &org.repositories,
        }
    }

    fn indexes_mut(&mut self) -> (&mut BTreeMap<String, RepositoryId>, &mut Vec<RepositoryId>) {
        match self {
            Self::User(user) => (&mut user.repository_names, &mut user.repositories),
            Self::Organization(org) => (&mut org.repository_names, &mut org.repositories),
        }
    }

    fn label(&self) -> String {
        self.owner_ref().to_string()
    }

    /// Returns true if `requester` may act for this owner without a
    /// repository-level grant.
    pub fn is_principal(&self, requester: &Address) -> bool {
        match self {
            Self::User(user) => &user.address == requester,
            Self::Organization(org) => org.members.get(requester) == Some(&MemberRole::Owner),
        }
    }

    /// Authorizes a mutation of `repository`.
    ///
    /// User owners admit the user themself, organization owners admit members
    /// with the `Owner` role. Either kind also admits an `Admin` collaborator
    /// of the repository.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` otherwise.
    pub fn authorize(&self, requester: &Address, repository: &Repository) -> Result<()> {
        if self.is_principal(requester) || repository.is_admin_collaborator(requester) {
            return Ok(());
        }
        debug!(%requester, repository = %repository.id, owner = %self.label(), "authorization denied");
        UnauthorizedSnafu {
            message: format!(
                "{requester} doesn't have permission to modify repository {}",
                repository.id.value()
            ),
        }
        .fail()
    }

    /// Authorizes placing a new repository under this owner.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` unless `requester` is the principal.
    pub fn authorize_create(&self, requester: &Address) -> Result<()> {
        if self.is_principal(requester) {
            return Ok(());
        }
        UnauthorizedSnafu {
            message: format!("{requester} can't create repositories for {}", self.label()),
        }
        .fail()
    }

    /// Fails with `AlreadyExists` if this owner holds a repository named `name`.
    ///
    /// # Errors
    ///
    /// See above.
    pub fn ensure_name_available(&self, name: &str) -> Result<()> {
        NameIndex::ensure_available(self.repository_names(), name, &self.label())
    }

    /// Records `id` under `name` in both back-references.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyExists` if the name or the ID is already held. Nothing
    /// is changed in that case.
    pub fn attach(&mut self, name: &str, id: RepositoryId) -> Result<()> {
        self.ensure_name_available(name)?;
        let (names, ids) = self.indexes_mut();
        append_unique(ids, id, "repository")?;
        names.insert(name.to_string(), id);
        Ok(())
    }

    /// Drops `id` and `name` from both back-references.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` if `id` is not in the list. Nothing is changed
    /// in that case.
    pub fn detach(&mut self, name: &str, id: RepositoryId) -> Result<()> {
        let (names, ids) = self.indexes_mut();
        remove_by_value(ids, &id, "repository")?;
        NameIndex::release(names, name);
        Ok(())
    }

    /// Moves `id` from `old` to `new` in the name map.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyExists` if `new` is taken.
    pub fn rename_repository(&mut self, old: &str, new: &str, id: RepositoryId) -> Result<()> {
        let label = self.label();
        let (names, _) = self.indexes_mut();
        NameIndex::rename(names, old, new, id, &label)
    }

    /// Stamps `updated_at` and writes the record back.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if the write fails.
    pub fn persist(&mut self, txn: &mut WriteTransaction<'_>, now: i64) -> Result<()> {
        match self {
            Self::User(user) => {
                user.updated_at = now;
                EntityStore::set(txn, user)
            },
            Self::Organization(org) => {
                org.updated_at = now;
                EntityStore::set(txn, org)
            },
        }
    }
}

/// Returns the owner reference stored on repository `id`.
///
/// # Errors
///
/// Returns `NotFound` if the repository does not exist.
pub fn resolve_owner(txn: &impl KvRead, id: RepositoryId) -> Result<OwnerRef> {
    EntityStore::get::<Repository>(txn, id).map(|repository| repository.owner)
}

/// Loads repository `id` together with its owner and authorizes `requester`.
///
/// # Errors
///
/// Returns `NotFound` if the repository or its owner is missing, and
/// `Unauthorized` if the requester may not modify it.
pub fn authorized_repository(
    txn: &impl KvRead,
    requester: &Address,
    id: RepositoryId,
) -> Result<(Repository, OwnerRecord)> {
    let repository: Repository = EntityStore::get(txn, id)?;
    let owner = OwnerRecord::resolve(txn, &repository.owner)?;
    owner.authorize(requester, &repository)?;
    Ok((repository, owner))
}

/// Moves repository `id` to `new_owner`.
///
/// Every check runs before the first write: the repository and both owners
/// must exist, the requester must be authorized against the current owner,
/// the repository must be in the current owner's list, and the new owner
/// must not already hold the name. Then the current owner, the new owner
/// and the repository are written.
///
/// # Errors
///
/// Returns `NotFound`, `Unauthorized`, `InvalidRequest` (same owner, or the
/// repository missing from the current owner's list) or `AlreadyExists`.
pub fn change_owner(
    txn: &mut WriteTransaction<'_>,
    requester: &Address,
    id: RepositoryId,
    new_owner: &OwnerRef,
    now: i64,
) -> Result<Repository> {
    let (mut repository, mut current) = authorized_repository(&*txn, requester, id)?;
    if &repository.owner == new_owner {
        return InvalidRequestSnafu {
            message: format!("repository {} is already owned by {new_owner}", id.value()),
        }
        .fail();
    }
    let mut next = OwnerRecord::resolve(&*txn, new_owner)?;

    current.detach(&repository.name, id)?;
    next.attach(&repository.name, id)?;
    repository.owner = next.owner_ref();
    repository.updated_at = now;

    current.persist(txn, now)?;
    next.persist(txn, now)?;
    EntityStore::set(txn, &repository)?;
    Ok(repository)
}
