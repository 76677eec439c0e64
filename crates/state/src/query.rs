//! The query surface.
//!
//! Queries read one committed snapshot and never write. Store-backed listings
//! page over a kind's key prefix; owner and parent listings page over the ID
//! list embedded in the parent record.

use gitledger_store::KvRead;
use gitledger_types::{
    Address, Comment, CommentId, Organization, OrganizationId, OwnerRef, PullRequest,
    PullRequestId, Repository, RepositoryId, Reward, RewardId, User, UserId, decode,
    error::{NotFoundSnafu, Result},
};

use crate::{
    entity::{EntityStore, StoredEntity},
    error::corrupt_record,
    keys::LedgerKeys,
    ledger::Ledger,
    names::{AddressIndex, WhoisIndex},
    owner,
    pagination::{Page, PageRequest, paginate_collection, paginate_store},
};

fn repository_by_name(
    txn: &impl KvRead,
    names: &std::collections::BTreeMap<String, RepositoryId>,
    name: &str,
    owner: &str,
) -> Result<Repository> {
    match names.get(name) {
        Some(id) => EntityStore::get(txn, *id),
        None => NotFoundSnafu { message: format!("repository {name} doesn't exist for {owner}") }
            .fail(),
    }
}

impl Ledger {
    fn list<E: StoredEntity>(&self, request: &PageRequest) -> Result<Page<E>> {
        let txn = self.read();
        paginate_store(
            &txn,
            &LedgerKeys::entity_prefix(E::KIND),
            request,
            &self.config().pagination,
            |key, value| {
                decode(value).map_err(|source| {
                    corrupt_record(format!("{} at {}", E::KIND, String::from_utf8_lossy(key)), source)
                })
            },
        )
    }

    fn get<E: StoredEntity>(&self, id: E::Id) -> Result<E> {
        EntityStore::get(&self.read(), id)
    }

    fn resolve_ids<I, E>(&self, txn: &impl KvRead, ids: &[I], request: &PageRequest) -> Result<Page<E>>
    where
        I: Clone,
        E: StoredEntity<Id = I>,
    {
        paginate_collection(ids, request, &self.config().pagination)?
            .try_map(|id| EntityStore::get(txn, id))
    }

    // ========================================================================
    // Store-backed listings
    // ========================================================================

    /// Lists users in ID order.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` for conflicting page parameters, `Internal` on
    /// a corrupt record.
    pub fn user_all(&self, request: &PageRequest) -> Result<Page<User>> {
        self.list(request)
    }

    /// Lists organizations in ID order.
    ///
    /// # Errors
    ///
    /// See [`Ledger::user_all`].
    pub fn organization_all(&self, request: &PageRequest) -> Result<Page<Organization>> {
        self.list(request)
    }

    /// Lists repositories in ID order.
    ///
    /// # Errors
    ///
    /// See [`Ledger::user_all`].
    pub fn repository_all(&self, request: &PageRequest) -> Result<Page<Repository>> {
        self.list(request)
    }

    /// Lists pull requests in ID order.
    ///
    /// # Errors
    ///
    /// See [`Ledger::user_all`].
    pub fn pull_request_all(&self, request: &PageRequest) -> Result<Page<PullRequest>> {
        self.list(request)
    }

    /// Lists comments in ID order.
    ///
    /// # Errors
    ///
    /// See [`Ledger::user_all`].
    pub fn comment_all(&self, request: &PageRequest) -> Result<Page<Comment>> {
        self.list(request)
    }

    /// Lists rewards in ID order.
    ///
    /// # Errors
    ///
    /// See [`Ledger::user_all`].
    pub fn reward_all(&self, request: &PageRequest) -> Result<Page<Reward>> {
        self.list(request)
    }

    // ========================================================================
    // Lookups by ID
    // ========================================================================

    /// Returns user `id`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if absent.
    pub fn get_user(&self, id: UserId) -> Result<User> {
        self.get(id)
    }

    /// Returns organization `id`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if absent.
    pub fn get_organization(&self, id: OrganizationId) -> Result<Organization> {
        self.get(id)
    }

    /// Returns repository `id`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if absent.
    pub fn get_repository(&self, id: RepositoryId) -> Result<Repository> {
        self.get(id)
    }

    /// Returns pull request `id`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if absent.
    pub fn get_pull_request(&self, id: PullRequestId) -> Result<PullRequest> {
        self.get(id)
    }

    /// Returns comment `id`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if absent.
    pub fn get_comment(&self, id: CommentId) -> Result<Comment> {
        self.get(id)
    }

    /// Returns reward `id`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if absent.
    pub fn get_reward(&self, id: RewardId) -> Result<Reward> {
        self.get(id)
    }

    /// Returns the owner of repository `id`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the repository is absent.
    pub fn repository_owner(&self, id: RepositoryId) -> Result<OwnerRef> {
        owner::resolve_owner(&self.read(), id)
    }

    // ========================================================================
    // Lookups by name or address
    // ========================================================================

    /// Returns the user registered for `address`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the address has no user.
    pub fn user_by_address(&self, address: &Address) -> Result<User> {
        AddressIndex::resolve_user(&self.read(), address)
    }

    /// Returns the organization named `name`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the name is unregistered or points at a missing
    /// organization.
    pub fn organization_by_name(&self, name: &str) -> Result<Organization> {
        WhoisIndex::resolve(&self.read(), name)
    }

    /// Returns the textual organization ID registered for `name`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the name is unregistered.
    pub fn whois(&self, name: &str) -> Result<String> {
        match WhoisIndex::get(&self.read(), name)? {
            Some(id) => Ok(id),
            None => NotFoundSnafu { message: format!("organization name {name} doesn't exist") }
                .fail(),
        }
    }

    /// Returns the reward granted to `recipient`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the recipient has no reward.
    pub fn reward_by_recipient(&self, recipient: &Address) -> Result<Reward> {
        AddressIndex::resolve_reward(&self.read(), recipient)
    }

    /// Returns the repository `repository_name` held by organization `name`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if either name is unknown.
    pub fn organization_repository(&self, name: &str, repository_name: &str) -> Result<Repository> {
        let txn = self.read();
        let organization = WhoisIndex::resolve(&txn, name)?;
        repository_by_name(&txn, &organization.repository_names, repository_name, name)
    }

    /// Returns the repository `repository_name` held by the user at `address`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the user or the name is unknown.
    pub fn user_repository(&self, address: &Address, repository_name: &str) -> Result<Repository> {
        let txn = self.read();
        let user = AddressIndex::resolve_user(&txn, address)?;
        repository_by_name(&txn, &user.repository_names, repository_name, address.as_str())
    }

    // ========================================================================
    // Derived collections
    // ========================================================================

    /// Pages through the repositories of organization `name`, in the order
    /// they were acquired.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the organization is unknown, `InvalidRequest`
    /// for bad page parameters.
    pub fn organization_repositories(
        &self,
        name: &str,
        request: &PageRequest,
    ) -> Result<Page<Repository>> {
        let txn = self.read();
        let organization = WhoisIndex::resolve(&txn, name)?;
        self.resolve_ids(&txn, &organization.repositories, request)
    }

    /// Pages through the repositories of the user at `address`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the user is unknown, `InvalidRequest` for bad
    /// page parameters.
    pub fn user_repositories(
        &self,
        address: &Address,
        request: &PageRequest,
    ) -> Result<Page<Repository>> {
        let txn = self.read();
        let user = AddressIndex::resolve_user(&txn, address)?;
        self.resolve_ids(&txn, &user.repositories, request)
    }

    /// Pages through the forks of repository `id`.
    ///
    /// Forks deleted since they were recorded stay in the parent's list; they
    /// are skipped here, so a page may hold fewer items than the limit.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the repository is absent, `InvalidRequest` for
    /// bad page parameters.
    pub fn repository_forks(
        &self,
        id: RepositoryId,
        request: &PageRequest,
    ) -> Result<Page<Repository>> {
        let txn = self.read();
        let repository: Repository = EntityStore::get(&txn, id)?;
        let page = paginate_collection(&repository.forks, request, &self.config().pagination)?;
        let mut forks = Vec::with_capacity(page.items.len());
        for fork in &page.items {
            if let Some(found) = EntityStore::find::<Repository>(&txn, *fork)? {
                forks.push(found);
            }
        }
        Ok(Page { items: forks, next_key: page.next_key, total: page.total })
    }

    /// Pages through the pull requests targeting repository `id`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the repository is absent, `InvalidRequest` for
    /// bad page parameters.
    pub fn repository_pull_requests(
        &self,
        id: RepositoryId,
        request: &PageRequest,
    ) -> Result<Page<PullRequest>> {
        let txn = self.read();
        let repository: Repository = EntityStore::get(&txn, id)?;
        self.resolve_ids(&txn, &repository.pull_requests, request)
    }

    /// Pages through the comments on pull request `id`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the pull request is absent, `InvalidRequest` for
    /// bad page parameters.
    pub fn pull_request_comments(
        &self,
        id: PullRequestId,
        request: &PageRequest,
    ) -> Result<Page<Comment>> {
        let txn = self.read();
        let pull_request: PullRequest = EntityStore::get(&txn, id)?;
        self.resolve_ids(&txn, &pull_request.comments, request)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use gitledger_types::{
        ErrorCode,
        messages::{CreateRepository, DeleteRepository, ForkRepository},
    };

    use super::*;
    use crate::ledger::tests::{ledger, register};

    fn create(ledger: &Ledger, owner: &Address, name: &str) -> RepositoryId {
        ledger
            .create_repository(
                CreateRepository::builder()
                    .creator(owner.clone())
                    .name(name)
                    .owner(OwnerRef::User(owner.clone()))
                    .build(),
            )
            .unwrap()
    }

    #[test]
    fn test_store_listing_pages_in_id_order() {
        let ledger = ledger();
        let alice = register(&ledger, "gitopia1alice");
        for name in ["a", "b", "c"] {
            create(&ledger, &alice, name);
        }
        let page = ledger.repository_all(&PageRequest::builder().limit(2).build()).unwrap();
        let names: Vec<_> = page.items.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert!(page.total.is_none());

        let next = PageRequest::after(page.next_key.unwrap(), 2);
        let page = ledger.repository_all(&next).unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].name, "c");
        assert!(page.next_key.is_none());
    }

    #[test]
    fn test_user_repositories_follow_append_order() {
        let ledger = ledger();
        let alice = register(&ledger, "gitopia1alice");
        let ids: Vec<_> = ["zeta", "alpha", "mid"].iter().map(|n| create(&ledger, &alice, n)).collect();

        let page = ledger.user_repositories(&alice, &PageRequest::default()).unwrap();
        assert_eq!(page.items.iter().map(|r| r.id).collect::<Vec<_>>(), ids);
        assert_eq!(page.total, Some(3));

        let repository = ledger.user_repository(&alice, "mid").unwrap();
        assert_eq!(repository.id, ids[2]);
        assert_eq!(ledger.user_repository(&alice, "nope").unwrap_err().code(), ErrorCode::NotFound);
    }

    #[test]
    fn test_forks_skip_deleted_entries() {
        let ledger = ledger();
        let alice = register(&ledger, "gitopia1alice");
        let bob = register(&ledger, "gitopia1bob");
        let carol = register(&ledger, "gitopia1carol");
        let source = create(&ledger, &alice, "alpha");
        let fork = |who: &Address| {
            ledger
                .fork_repository(
                    ForkRepository::builder()
                        .creator(who.clone())
                        .repository_id(source)
                        .owner(OwnerRef::User(who.clone()))
                        .build(),
                )
                .unwrap()
        };
        let bob_fork = fork(&bob);
        let carol_fork = fork(&carol);
        ledger.delete_repository(DeleteRepository::builder().creator(bob).id(bob_fork).build()).unwrap();

        let page = ledger.repository_forks(source, &PageRequest::default()).unwrap();
        assert_eq!(page.items.iter().map(|r| r.id).collect::<Vec<_>>(), vec![carol_fork]);
        assert_eq!(page.total, Some(2));
    }

    #[test]
    fn test_conflicting_page_parameters() {
        let ledger = ledger();
        let alice = register(&ledger, "gitopia1alice");
        let request = PageRequest::builder().offset(1).key(vec![0; 8]).build();
        assert_eq!(
            ledger.user_repositories(&alice, &request).unwrap_err().code(),
            ErrorCode::InvalidRequest
        );
        assert_eq!(ledger.user_all(&request).unwrap_err().code(), ErrorCode::InvalidRequest);
    }

    #[test]
    fn test_repository_owner() {
        let ledger = ledger();
        let alice = register(&ledger, "gitopia1alice");
        let id = create(&ledger, &alice, "alpha");
        assert_eq!(ledger.repository_owner(id).unwrap(), OwnerRef::User(alice));
        assert_eq!(
            ledger.repository_owner(RepositoryId::new(9)).unwrap_err().code(),
            ErrorCode::NotFound
        );
    }
}
