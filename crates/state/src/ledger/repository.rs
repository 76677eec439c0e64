use gitledger_types::{
    DEFAULT_BRANCH, Repository, RepositoryId,
    error::{InvalidRequestSnafu, NotFoundSnafu, Result},
    messages::{
        ChangeOwner, CreateBranch, CreateRepository, DeleteBranch, DeleteRepository,
        ForkRepository, RemoveRepositoryCollaborator, RenameRepository, SetDefaultBranch,
        UpdateRepository, UpdateRepositoryCollaborator,
    },
};
use tracing::{info, instrument};

use super::Ledger;
use crate::{
    collections::append_unique,
    entity::EntityStore,
    names::AddressIndex,
    owner::{self, OwnerRecord, authorized_repository},
};

impl Ledger {
    /// Creates a repository under the requested owner.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` for invalid fields, `NotFound` if the owner is
    /// missing, `Unauthorized` unless the creator is the owning user or an
    /// `Owner` of the owning organization, and `AlreadyExists` if the owner
    /// already holds the name.
    #[instrument(skip(self, msg), fields(creator = %msg.creator, owner = %msg.owner, name = %msg.name))]
    pub fn create_repository(&self, msg: CreateRepository) -> Result<RepositoryId> {
        msg.validate(&self.config.validation)?;
        let id = self.mutate("create_repository", |txn, now| {
            let mut owner = OwnerRecord::resolve(&*txn, &msg.owner)?;
            owner.authorize_create(&msg.creator)?;
            owner.ensure_name_available(&msg.name)?;

            let repository = Repository {
                creator: msg.creator.clone(),
                name: msg.name.clone(),
                owner: owner.owner_ref(),
                description: msg.description,
                default_branch: DEFAULT_BRANCH.to_string(),
                created_at: now,
                updated_at: now,
                ..Repository::default()
            };
            let id = EntityStore::append(txn, repository)?;
            owner.attach(&msg.name, id)?;
            owner.persist(txn, now)?;
            Ok(id)
        })?;
        info!(repository_id = id.value(), "repository created");
        Ok(id)
    }

    /// Replaces a repository's description, license and labels.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` for invalid fields, `NotFound`, or
    /// `Unauthorized`.
    #[instrument(skip(self, msg), fields(creator = %msg.creator, repository_id = msg.id.value()))]
    pub fn update_repository(&self, msg: UpdateRepository) -> Result<()> {
        msg.validate(&self.config.validation)?;
        self.mutate("update_repository", |txn, now| {
            let (mut repository, _) = authorized_repository(&*txn, &msg.creator, msg.id)?;
            repository.description = msg.description;
            repository.license = msg.license;
            repository.labels = msg.labels;
            repository.updated_at = now;
            EntityStore::set(txn, &repository)
        })?;
        info!("repository updated");
        Ok(())
    }

    /// Renames a repository within its owner's namespace.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` for an invalid name, `NotFound`,
    /// `Unauthorized`, or `AlreadyExists` if the owner holds the new name.
    #[instrument(
        skip(self, msg),
        fields(creator = %msg.creator, repository_id = msg.id.value(), name = %msg.name)
    )]
    pub fn rename_repository(&self, msg: RenameRepository) -> Result<()> {
        msg.validate(&self.config.validation)?;
        self.mutate("rename_repository", |txn, now| {
            let (mut repository, mut owner) = authorized_repository(&*txn, &msg.creator, msg.id)?;
            owner.rename_repository(&repository.name, &msg.name, repository.id)?;
            repository.name = msg.name.clone();
            repository.updated_at = now;
            owner.persist(txn, now)?;
            EntityStore::set(txn, &repository)
        })?;
        info!("repository renamed");
        Ok(())
    }

    /// Transfers a repository to another user or organization.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `Unauthorized`, `InvalidRequest` or
    /// `AlreadyExists`; see [`owner::change_owner`].
    #[instrument(
        skip(self, msg),
        fields(creator = %msg.creator, repository_id = msg.repository_id.value(), owner = %msg.owner)
    )]
    pub fn change_owner(&self, msg: ChangeOwner) -> Result<()> {
        self.mutate("change_owner", |txn, now| {
            owner::change_owner(txn, &msg.creator, msg.repository_id, &msg.owner, now)
        })?;
        info!("repository owner changed");
        Ok(())
    }

    /// Forks a repository under the requested owner.
    ///
    /// The fork takes the source's name and a copy of its branches, default
    /// branch, license, commits and description.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the source or owner is missing, `Unauthorized` on
    /// the same terms as creation, and `AlreadyExists` if the owner already
    /// holds the name.
    #[instrument(
        skip(self, msg),
        fields(creator = %msg.creator, repository_id = msg.repository_id.value(), owner = %msg.owner)
    )]
    pub fn fork_repository(&self, msg: ForkRepository) -> Result<RepositoryId> {
        let id = self.mutate("fork_repository", |txn, now| {
            let mut source: Repository = EntityStore::get(&*txn, msg.repository_id)?;
            let mut owner = OwnerRecord::resolve(&*txn, &msg.owner)?;
            owner.authorize_create(&msg.creator)?;
            owner.ensure_name_available(&source.name)?;

            let fork = Repository {
                creator: msg.creator.clone(),
                name: source.name.clone(),
                owner: owner.owner_ref(),
                description: source.description.clone(),
                license: source.license.clone(),
                branches: source.branches.clone(),
                default_branch: source.default_branch.clone(),
                commits: source.commits.clone(),
                parent: Some(source.id),
                fork: true,
                created_at: now,
                updated_at: now,
                ..Repository::default()
            };
            let id = EntityStore::append(txn, fork)?;
            owner.attach(&source.name, id)?;
            owner.persist(txn, now)?;
            append_unique(&mut source.forks, id, "fork")?;
            EntityStore::set(txn, &source)?;
            Ok(id)
        })?;
        info!(fork_id = id.value(), "repository forked");
        Ok(id)
    }

    /// Deletes a repository and drops it from its owner's back-references.
    ///
    /// References held elsewhere (a parent's fork list, pull requests that
    /// target it) are left as they are.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `Unauthorized`, or `InvalidRequest` if the owner's
    /// list doesn't contain the repository.
    #[instrument(skip(self, msg), fields(creator = %msg.creator, repository_id = msg.id.value()))]
    pub fn delete_repository(&self, msg: DeleteRepository) -> Result<()> {
        self.mutate("delete_repository", |txn, now| {
            let (repository, mut owner) = authorized_repository(&*txn, &msg.creator, msg.id)?;
            owner.detach(&repository.name, repository.id)?;
            owner.persist(txn, now)?;
            EntityStore::delete::<Repository>(txn, repository.id)?;
            Ok(())
        })?;
        info!("repository deleted");
        Ok(())
    }

    /// Creates or moves a branch.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` for an invalid name or sha, `NotFound`, or
    /// `Unauthorized`.
    #[instrument(
        skip(self, msg),
        fields(creator = %msg.creator, repository_id = msg.id.value(), branch = %msg.name)
    )]
    pub fn create_branch(&self, msg: CreateBranch) -> Result<()> {
        msg.validate(&self.config.validation)?;
        self.mutate("create_branch", |txn, now| {
            let (mut repository, _) = authorized_repository(&*txn, &msg.creator, msg.id)?;
            repository.branches.insert(msg.name.clone(), msg.commit_sha.clone());
            repository.updated_at = now;
            EntityStore::set(txn, &repository)
        })?;
        info!("branch created");
        Ok(())
    }

    /// Points the default branch at an existing branch.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `Unauthorized`, or `InvalidRequest` if the branch
    /// doesn't exist.
    #[instrument(
        skip(self, msg),
        fields(creator = %msg.creator, repository_id = msg.id.value(), branch = %msg.name)
    )]
    pub fn set_default_branch(&self, msg: SetDefaultBranch) -> Result<()> {
        self.mutate("set_default_branch", |txn, now| {
            let (mut repository, _) = authorized_repository(&*txn, &msg.creator, msg.id)?;
            if !repository.branches.contains_key(&msg.name) {
                return InvalidRequestSnafu {
                    message: format!(
                        "branch {} doesn't exist in repository {}",
                        msg.name,
                        msg.id.value()
                    ),
                }
                .fail();
            }
            repository.default_branch = msg.name.clone();
            repository.updated_at = now;
            EntityStore::set(txn, &repository)
        })?;
        info!("default branch set");
        Ok(())
    }

    /// Deletes a branch other than the default.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `Unauthorized`, or `InvalidRequest` if the branch
    /// doesn't exist or is the default.
    #[instrument(
        skip(self, msg),
        fields(creator = %msg.creator, repository_id = msg.id.value(), branch = %msg.name)
    )]
    pub fn delete_branch(&self, msg: DeleteBranch) -> Result<()> {
        self.mutate("delete_branch", |txn, now| {
            let (mut repository, _) = authorized_repository(&*txn, &msg.creator, msg.id)?;
            if repository.default_branch == msg.name {
                return InvalidRequestSnafu {
                    message: format!("branch {} is the default branch", msg.name),
                }
                .fail();
            }
            if repository.branches.remove(&msg.name).is_none() {
                return InvalidRequestSnafu {
                    message: format!(
                        "branch {} doesn't exist in repository {}",
                        msg.name,
                        msg.id.value()
                    ),
                }
                .fail();
            }
            repository.updated_at = now;
            EntityStore::set(txn, &repository)
        })?;
        info!("branch deleted");
        Ok(())
    }

    /// Grants a registered user a collaborator role.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the repository or user is missing, or
    /// `Unauthorized`.
    #[instrument(
        skip(self, msg),
        fields(creator = %msg.creator, repository_id = msg.id.value(), user = %msg.user)
    )]
    pub fn update_repository_collaborator(&self, msg: UpdateRepositoryCollaborator) -> Result<()> {
        self.mutate("update_repository_collaborator", |txn, now| {
            let (mut repository, _) = authorized_repository(&*txn, &msg.creator, msg.id)?;
            AddressIndex::resolve_user(&*txn, &msg.user)?;
            repository.collaborators.insert(msg.user.clone(), msg.role);
            repository.updated_at = now;
            EntityStore::set(txn, &repository)
        })?;
        info!(role = ?msg.role, "collaborator updated");
        Ok(())
    }

    /// Revokes a collaborator.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the repository is missing or the user isn't a
    /// collaborator, or `Unauthorized`.
    #[instrument(
        skip(self, msg),
        fields(creator = %msg.creator, repository_id = msg.id.value(), user = %msg.user)
    )]
    pub fn remove_repository_collaborator(&self, msg: RemoveRepositoryCollaborator) -> Result<()> {
        self.mutate("remove_repository_collaborator", |txn, now| {
            let (mut repository, _) = authorized_repository(&*txn, &msg.creator, msg.id)?;
            if repository.collaborators.remove(&msg.user).is_none() {
                return NotFoundSnafu {
                    message: format!(
                        "{} is not a collaborator of repository {}",
                        msg.user,
                        msg.id.value()
                    ),
                }
                .fail();
            }
            repository.updated_at = now;
            EntityStore::set(txn, &repository)
        })?;
        info!("collaborator removed");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use gitledger_types::{Address, CollaboratorRole, ErrorCode, OwnerRef, messages::CreateOrganization};

    use super::*;
    use crate::ledger::tests::{ledger, register};

    fn create(ledger: &Ledger, creator: &Address, name: &str) -> Result<RepositoryId> {
        ledger.create_repository(
            CreateRepository::builder()
                .creator(creator.clone())
                .name(name)
                .owner(OwnerRef::User(creator.clone()))
                .build(),
        )
    }

    fn branch(ledger: &Ledger, creator: &Address, id: RepositoryId, name: &str) {
        ledger
            .create_branch(
                CreateBranch::builder()
                    .creator(creator.clone())
                    .id(id)
                    .name(name)
                    .commit_sha("a1b2c3")
                    .build(),
            )
            .expect("create branch");
    }

    #[test]
    fn test_create_initializes_repository() {
        let ledger = ledger();
        let alice = register(&ledger, "gitopia1alice");
        let id = create(&ledger, &alice, "alpha").unwrap();
        assert_eq!(id.value(), 0);

        let repository = ledger.get_repository(id).unwrap();
        assert_eq!(repository.default_branch, "master");
        assert!(repository.branches.is_empty());
        assert!(!repository.fork);
        assert_eq!(repository.owner, OwnerRef::User(alice.clone()));

        let user = ledger.user_by_address(&alice).unwrap();
        assert_eq!(user.repositories, vec![id]);
        assert_eq!(user.repository_names.get("alpha"), Some(&id));
    }

    #[test]
    fn test_create_for_someone_else_is_unauthorized() {
        let ledger = ledger();
        let alice = register(&ledger, "gitopia1alice");
        register(&ledger, "gitopia1bob");
        let err = ledger
            .create_repository(
                CreateRepository::builder()
                    .creator(alice)
                    .name("alpha")
                    .owner(OwnerRef::User(Address::new("gitopia1bob")))
                    .build(),
            )
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::Unauthorized);
    }

    #[test]
    fn test_rename_collision_leaves_names_intact() {
        let ledger = ledger();
        let alice = register(&ledger, "gitopia1alice");
        let alpha = create(&ledger, &alice, "alpha").unwrap();
        let beta = create(&ledger, &alice, "beta").unwrap();

        let err = ledger
            .rename_repository(
                RenameRepository::builder().creator(alice.clone()).id(alpha).name("beta").build(),
            )
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::AlreadyExists);

        let user = ledger.user_by_address(&alice).unwrap();
        assert_eq!(user.repository_names.get("alpha"), Some(&alpha));
        assert_eq!(user.repository_names.get("beta"), Some(&beta));
        assert_eq!(ledger.get_repository(alpha).unwrap().name, "alpha");
    }

    #[test]
    fn test_fork_copies_source_and_links_parent() {
        let ledger = ledger();
        let alice = register(&ledger, "gitopia1alice");
        let bob = register(&ledger, "gitopia1bob");
        let source = create(&ledger, &alice, "alpha").unwrap();
        branch(&ledger, &alice, source, "master");

        let fork = ledger
            .fork_repository(
                ForkRepository::builder()
                    .creator(bob.clone())
                    .repository_id(source)
                    .owner(OwnerRef::User(bob.clone()))
                    .build(),
            )
            .unwrap();

        let forked = ledger.get_repository(fork).unwrap();
        assert!(forked.fork);
        assert_eq!(forked.parent, Some(source));
        assert_eq!(forked.name, "alpha");
        assert_eq!(forked.branches.get("master").map(String::as_str), Some("a1b2c3"));
        assert_eq!(ledger.get_repository(source).unwrap().forks, vec![fork]);

        // Branch changes on the source don't reach the fork.
        branch(&ledger, &alice, source, "dev");
        assert!(!ledger.get_repository(fork).unwrap().branches.contains_key("dev"));

        // A second fork into the same namespace collides on the name.
        let err = ledger
            .fork_repository(
                ForkRepository::builder()
                    .creator(bob.clone())
                    .repository_id(source)
                    .owner(OwnerRef::User(bob))
                    .build(),
            )
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::AlreadyExists);
    }

    #[test]
    fn test_delete_keeps_stale_fork_reference() {
        let ledger = ledger();
        let alice = register(&ledger, "gitopia1alice");
        let bob = register(&ledger, "gitopia1bob");
        let source = create(&ledger, &alice, "alpha").unwrap();
        let fork = ledger
            .fork_repository(
                ForkRepository::builder()
                    .creator(bob.clone())
                    .repository_id(source)
                    .owner(OwnerRef::User(bob.clone()))
                    .build(),
            )
            .unwrap();

        ledger.delete_repository(DeleteRepository::builder().creator(bob.clone()).id(fork).build()).unwrap();
        assert_eq!(ledger.get_repository(fork).unwrap_err().code(), ErrorCode::NotFound);
        assert_eq!(ledger.get_repository(source).unwrap().forks, vec![fork]);

        let user = ledger.user_by_address(&bob).unwrap();
        assert!(user.repositories.is_empty());
        assert!(user.repository_names.is_empty());
    }

    #[test]
    fn test_branch_rules() {
        let ledger = ledger();
        let alice = register(&ledger, "gitopia1alice");
        let id = create(&ledger, &alice, "alpha").unwrap();
        branch(&ledger, &alice, id, "master");
        branch(&ledger, &alice, id, "dev");

        let err = ledger
            .set_default_branch(
                SetDefaultBranch::builder().creator(alice.clone()).id(id).name("missing").build(),
            )
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidRequest);

        let err = ledger
            .delete_branch(DeleteBranch::builder().creator(alice.clone()).id(id).name("master").build())
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidRequest);

        ledger
            .set_default_branch(SetDefaultBranch::builder().creator(alice.clone()).id(id).name("dev").build())
            .unwrap();
        ledger
            .delete_branch(DeleteBranch::builder().creator(alice.clone()).id(id).name("master").build())
            .unwrap();

        let repository = ledger.get_repository(id).unwrap();
        assert_eq!(repository.default_branch, "dev");
        assert_eq!(repository.branches.keys().collect::<Vec<_>>(), vec!["dev"]);
    }

    #[test]
    fn test_admin_collaborator_may_mutate() {
        let ledger = ledger();
        let alice = register(&ledger, "gitopia1alice");
        let bob = register(&ledger, "gitopia1bob");
        let id = create(&ledger, &alice, "alpha").unwrap();

        let bob_branch = CreateBranch::builder()
            .creator(bob.clone())
            .id(id)
            .name("feature")
            .commit_sha("ff00")
            .build();
        assert_eq!(
            ledger.create_branch(bob_branch.clone()).unwrap_err().code(),
            ErrorCode::Unauthorized
        );

        ledger
            .update_repository_collaborator(
                UpdateRepositoryCollaborator::builder()
                    .creator(alice.clone())
                    .id(id)
                    .user(bob.clone())
                    .role(CollaboratorRole::Admin)
                    .build(),
            )
            .unwrap();
        ledger.create_branch(bob_branch).unwrap();

        let remove = RemoveRepositoryCollaborator::builder().creator(alice).id(id).user(bob).build();
        ledger.remove_repository_collaborator(remove.clone()).unwrap();
        assert_eq!(
            ledger.remove_repository_collaborator(remove).unwrap_err().code(),
            ErrorCode::NotFound
        );
    }

    #[test]
    fn test_organization_owned_repository() {
        let ledger = ledger();
        let alice = register(&ledger, "gitopia1alice");
        let org = ledger
            .create_organization(CreateOrganization::builder().creator(alice.clone()).name("acme").build())
            .unwrap();
        let id = ledger
            .create_repository(
                CreateRepository::builder()
                    .creator(alice.clone())
                    .name("tools")
                    .owner(OwnerRef::Organization(org))
                    .build(),
            )
            .unwrap();

        let found = ledger.organization_repository("acme", "tools").unwrap();
        assert_eq!(found.id, id);
        ledger
            .update_repository(
                UpdateRepository::builder()
                    .creator(alice)
                    .id(id)
                    .description("shared tools")
                    .license("MIT")
                    .build(),
            )
            .unwrap();
        assert_eq!(ledger.get_repository(id).unwrap().license, "MIT");
    }
}
