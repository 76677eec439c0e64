//! Ledger fixtures for integration tests.
//!
//! [`TestLedger`] wraps a [`Ledger`] over an in-memory database with a
//! [`ManualClock`] and [`test_ledger_config`], plus shorthand for the setup
//! steps most scenarios share.

// Test utilities are expected to panic on failure.
#![allow(clippy::expect_used)]

use std::{ops::Deref, sync::Arc};

use gitledger_state::{Ledger, ManualClock};
use gitledger_store::Database;
use gitledger_types::{
    Address, CollaboratorRole, LedgerConfig, OrganizationId, OwnerRef, PullRequestId,
    RepositoryId,
    messages::{
        CreateBranch, CreateOrganization, CreatePullRequest, CreateRepository, CreateUser,
        UpdateRepositoryCollaborator,
    },
};

use crate::config::test_ledger_config;

/// Timestamp the fixture clock starts at.
pub const START_TIME: i64 = 1_700_000_000;

/// A ledger with a controllable clock.
///
/// Dereferences to [`Ledger`], so every mutation and query is available
/// directly. The helper methods panic on failure.
pub struct TestLedger {
    ledger: Ledger,
    clock: Arc<ManualClock>,
}

impl TestLedger {
    /// Creates a fixture with [`test_ledger_config`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(test_ledger_config())
    }

    /// Creates a fixture with `config`.
    ///
    /// # Panics
    ///
    /// Panics if `config` is invalid.
    #[must_use]
    pub fn with_config(config: LedgerConfig) -> Self {
        let clock = Arc::new(ManualClock::new(START_TIME));
        let ledger = Ledger::builder()
            .db(Arc::new(Database::open_in_memory()))
            .config(config)
            .clock(clock.clone())
            .build()
            .expect("valid test config");
        Self { ledger, clock }
    }

    /// Returns the fixture clock.
    #[must_use]
    pub fn clock(&self) -> &ManualClock {
        &self.clock
    }

    /// Registers a user at `address`, using the address as username.
    pub fn user(&self, address: &str) -> Address {
        self.ledger
            .create_user(CreateUser::builder().creator(address).username(address).build())
            .expect("create user");
        Address::new(address)
    }

    /// Creates organization `name` with `creator` as its sole owner.
    pub fn organization(&self, creator: &Address, name: &str) -> OrganizationId {
        self.ledger
            .create_organization(
                CreateOrganization::builder().creator(creator.clone()).name(name).build(),
            )
            .expect("create organization")
    }

    /// Creates repository `name` owned by `owner`.
    pub fn repository(&self, creator: &Address, owner: OwnerRef, name: &str) -> RepositoryId {
        self.ledger
            .create_repository(
                CreateRepository::builder().creator(creator.clone()).name(name).owner(owner).build(),
            )
            .expect("create repository")
    }

    /// Creates repository `name` owned by the user `creator`.
    pub fn user_repository(&self, creator: &Address, name: &str) -> RepositoryId {
        self.repository(creator, OwnerRef::User(creator.clone()), name)
    }

    /// Adds branch `name` to repository `id`.
    pub fn branch(&self, creator: &Address, id: RepositoryId, name: &str) {
        self.ledger
            .create_branch(
                CreateBranch::builder()
                    .creator(creator.clone())
                    .id(id)
                    .name(name)
                    .commit_sha("0a1b2c3d")
                    .build(),
            )
            .expect("create branch");
    }

    /// Grants `user` the `role` collaborator role on repository `id`.
    pub fn collaborator(
        &self,
        creator: &Address,
        id: RepositoryId,
        user: &Address,
        role: CollaboratorRole,
    ) {
        self.ledger
            .update_repository_collaborator(
                UpdateRepositoryCollaborator::builder()
                    .creator(creator.clone())
                    .id(id)
                    .user(user.clone())
                    .role(role)
                    .build(),
            )
            .expect("update collaborator");
    }

    /// Opens a pull request from `head_branch` to `base_branch` within `repository`.
    pub fn pull_request(
        &self,
        creator: &Address,
        repository: RepositoryId,
        head_branch: &str,
        base_branch: &str,
    ) -> PullRequestId {
        self.ledger
            .create_pull_request(
                CreatePullRequest::builder()
                    .creator(creator.clone())
                    .title(format!("Merge {head_branch}"))
                    .head_repository_id(repository)
                    .head_branch(head_branch)
                    .base_repository_id(repository)
                    .base_branch(base_branch)
                    .build(),
            )
            .expect("create pull request")
            .id
    }
}

impl Default for TestLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for TestLedger {
    type Target = Ledger;

    fn deref(&self) -> &Ledger {
        &self.ledger
    }
}
