use gitledger_store::KvRead;
use gitledger_types::{
    Address, Comment, PullRequest, PullRequestId, PullRequestRef, PullRequestState, Repository,
    error::{InvalidRequestSnafu, NotFoundSnafu, Result, UnauthorizedSnafu},
    messages::{
        CreatePullRequest, DeletePullRequest, PullRequestAddresses, PullRequestCreated,
        PullRequestLabels, SetPullRequestState, UpdatePullRequestDescription,
        UpdatePullRequestTitle,
    },
    validation::{validate_commit_sha, validate_description, validate_title},
};
use tracing::{info, instrument};

use super::Ledger;
use crate::{
    collections::{append_unique, ensure_absent, ensure_present, remove_by_value},
    entity::EntityStore,
    names::AddressIndex,
    owner::OwnerRecord,
};

/// Which address list of a pull request a batch applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AddressList {
    Reviewers,
    Assignees,
}

impl AddressList {
    const fn field(self) -> &'static str {
        match self {
            Self::Reviewers => "reviewers",
            Self::Assignees => "assignees",
        }
    }

    fn of(self, pull_request: &mut PullRequest) -> &mut Vec<Address> {
        match self {
            Self::Reviewers => &mut pull_request.reviewers,
            Self::Assignees => &mut pull_request.assignees,
        }
    }
}

fn ensure_branch(repository: &Repository, branch: &str) -> Result<()> {
    if repository.branches.contains_key(branch) {
        return Ok(());
    }
    NotFoundSnafu {
        message: format!("branch {branch} doesn't exist in repository {}", repository.id.value()),
    }
    .fail()
}

/// Loads pull request `id` and checks that `requester` may change it: its
/// author, or anyone authorized on the base repository.
fn authorized_pull_request(
    txn: &impl KvRead,
    requester: &Address,
    id: PullRequestId,
) -> Result<PullRequest> {
    let pull_request: PullRequest = EntityStore::get(txn, id)?;
    if &pull_request.creator == requester {
        return Ok(pull_request);
    }
    let base: Repository = EntityStore::get(txn, pull_request.base.repository_id)?;
    OwnerRecord::resolve(txn, &base.owner)?.authorize(requester, &base)?;
    Ok(pull_request)
}

/// Loads pull request `id` and checks that `requester` wrote it.
fn authored_pull_request(
    txn: &impl KvRead,
    requester: &Address,
    id: PullRequestId,
) -> Result<PullRequest> {
    let pull_request: PullRequest = EntityStore::get(txn, id)?;
    if &pull_request.creator != requester {
        return UnauthorizedSnafu {
            message: format!("{requester} is not the author of pull request {}", id.value()),
        }
        .fail();
    }
    Ok(pull_request)
}

impl Ledger {
    /// Opens a pull request from a head branch onto a base branch.
    ///
    /// The pull request's `iid` is its number within the base repository.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` for invalid fields, and `NotFound` if the
    /// creator has no user or a repository or branch is missing.
    #[instrument(
        skip(self, msg),
        fields(creator = %msg.creator, base_repository_id = msg.base_repository_id.value())
    )]
    pub fn create_pull_request(&self, msg: CreatePullRequest) -> Result<PullRequestCreated> {
        msg.validate(&self.config.validation)?;
        let created = self.mutate("create_pull_request", |txn, now| {
            AddressIndex::resolve_user(&*txn, &msg.creator)?;
            let head: Repository = EntityStore::get(&*txn, msg.head_repository_id)?;
            ensure_branch(&head, &msg.head_branch)?;
            let mut base: Repository = EntityStore::get(&*txn, msg.base_repository_id)?;
            ensure_branch(&base, &msg.base_branch)?;

            let iid = base.pulls_count + 1;
            let pull_request = PullRequest {
                iid,
                creator: msg.creator.clone(),
                title: msg.title,
                description: msg.description,
                state: PullRequestState::Open,
                head: PullRequestRef { repository_id: head.id, branch: msg.head_branch },
                base: PullRequestRef { repository_id: base.id, branch: msg.base_branch },
                reviewers: msg.reviewers,
                assignees: msg.assignees,
                labels: msg.labels,
                created_at: now,
                updated_at: now,
                ..PullRequest::default()
            };
            let id = EntityStore::append(txn, pull_request)?;
            append_unique(&mut base.pull_requests, id, "pull request")?;
            base.pulls_count = iid;
            base.updated_at = now;
            EntityStore::set(txn, &base)?;
            Ok(PullRequestCreated { id, iid })
        })?;
        info!(pull_request_id = created.id.value(), iid = created.iid, "pull request created");
        Ok(created)
    }

    /// Replaces a pull request's title. Author only.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` for an invalid title, `NotFound`, or
    /// `Unauthorized`.
    #[instrument(skip(self, msg), fields(creator = %msg.creator, pull_request_id = msg.id.value()))]
    pub fn update_pull_request_title(&self, msg: UpdatePullRequestTitle) -> Result<()> {
        validate_title(&msg.title, &self.config.validation)?;
        self.mutate("update_pull_request_title", |txn, now| {
            let mut pull_request = authored_pull_request(&*txn, &msg.creator, msg.id)?;
            pull_request.title = msg.title;
            pull_request.updated_at = now;
            EntityStore::set(txn, &pull_request)
        })?;
        info!("pull request title updated");
        Ok(())
    }

    /// Replaces a pull request's description. Author only.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` for an oversized description, `NotFound`, or
    /// `Unauthorized`.
    #[instrument(skip(self, msg), fields(creator = %msg.creator, pull_request_id = msg.id.value()))]
    pub fn update_pull_request_description(&self, msg: UpdatePullRequestDescription) -> Result<()> {
        validate_description(&msg.description, &self.config.validation)?;
        self.mutate("update_pull_request_description", |txn, now| {
            let mut pull_request = authored_pull_request(&*txn, &msg.creator, msg.id)?;
            pull_request.description = msg.description;
            pull_request.updated_at = now;
            EntityStore::set(txn, &pull_request)
        })?;
        info!("pull request description updated");
        Ok(())
    }

    /// Closes, reopens or merges a pull request.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `Unauthorized`, or `InvalidRequest` for a
    /// disallowed transition or a merge without a valid merge commit.
    #[instrument(
        skip(self, msg),
        fields(creator = %msg.creator, pull_request_id = msg.id.value(), state = ?msg.state)
    )]
    pub fn set_pull_request_state(&self, msg: SetPullRequestState) -> Result<()> {
        self.mutate("set_pull_request_state", |txn, now| {
            let mut pull_request = authorized_pull_request(&*txn, &msg.creator, msg.id)?;
            let current = pull_request.state;
            if !current.can_transition_to(msg.state) {
                return InvalidRequestSnafu {
                    message: format!(
                        "pull request {} can't move from {current:?} to {:?}",
                        msg.id.value(),
                        msg.state
                    ),
                }
                .fail();
            }
            match msg.state {
                PullRequestState::Merged => {
                    let Some(sha) = msg.merge_commit_sha.clone() else {
                        return InvalidRequestSnafu { message: "merge requires a merge commit sha" }
                            .fail();
                    };
                    validate_commit_sha(&sha)?;
                    pull_request.merge_commit_sha = Some(sha);
                    pull_request.merged_at = Some(now);
                    pull_request.closed_at = Some(now);
                },
                PullRequestState::Closed => pull_request.closed_at = Some(now),
                PullRequestState::Open => pull_request.closed_at = None,
            }
            pull_request.state = msg.state;
            pull_request.updated_at = now;
            EntityStore::set(txn, &pull_request)
        })?;
        info!("pull request state changed");
        Ok(())
    }

    /// Adds reviewers.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` for an invalid batch, `NotFound`,
    /// `Unauthorized`, or `AlreadyExists` if an address is already a reviewer.
    pub fn add_pull_request_reviewers(&self, msg: PullRequestAddresses) -> Result<()> {
        self.add_addresses(AddressList::Reviewers, msg)
    }

    /// Removes reviewers.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` for an invalid batch or an address that isn't
    /// a reviewer, `NotFound`, or `Unauthorized`.
    pub fn remove_pull_request_reviewers(&self, msg: PullRequestAddresses) -> Result<()> {
        self.remove_addresses(AddressList::Reviewers, msg)
    }

    /// Adds assignees.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` for an invalid batch, `NotFound`,
    /// `Unauthorized`, or `AlreadyExists` if an address is already assigned.
    pub fn add_pull_request_assignees(&self, msg: PullRequestAddresses) -> Result<()> {
        self.add_addresses(AddressList::Assignees, msg)
    }

    /// Removes assignees.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` for an invalid batch or an address that isn't
    /// assigned, `NotFound`, or `Unauthorized`.
    pub fn remove_pull_request_assignees(&self, msg: PullRequestAddresses) -> Result<()> {
        self.remove_addresses(AddressList::Assignees, msg)
    }

    #[instrument(
        skip(self, msg),
        fields(creator = %msg.creator, pull_request_id = msg.id.value(), list = list.field())
    )]
    fn add_addresses(&self, list: AddressList, msg: PullRequestAddresses) -> Result<()> {
        msg.validate(list.field(), &self.config.validation)?;
        self.mutate("add_pull_request_addresses", |txn, now| {
            let mut pull_request = authorized_pull_request(&*txn, &msg.creator, msg.id)?;
            let target = list.of(&mut pull_request);
            ensure_absent(target, &msg.addresses, list.field())?;
            target.extend(msg.addresses.iter().cloned());
            pull_request.updated_at = now;
            EntityStore::set(txn, &pull_request)
        })?;
        info!(count = msg.addresses.len(), "pull request addresses added");
        Ok(())
    }

    #[instrument(
        skip(self, msg),
        fields(creator = %msg.creator, pull_request_id = msg.id.value(), list = list.field())
    )]
    fn remove_addresses(&self, list: AddressList, msg: PullRequestAddresses) -> Result<()> {
        msg.validate(list.field(), &self.config.validation)?;
        self.mutate("remove_pull_request_addresses", |txn, now| {
            let mut pull_request = authorized_pull_request(&*txn, &msg.creator, msg.id)?;
            let target = list.of(&mut pull_request);
            ensure_present(target, &msg.addresses, list.field())?;
            for address in &msg.addresses {
                remove_by_value(target, address, list.field())?;
            }
            pull_request.updated_at = now;
            EntityStore::set(txn, &pull_request)
        })?;
        info!(count = msg.addresses.len(), "pull request addresses removed");
        Ok(())
    }

    /// Adds labels.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` for an invalid batch, `NotFound`,
    /// `Unauthorized`, or `AlreadyExists` if a label is already applied.
    #[instrument(skip(self, msg), fields(creator = %msg.creator, pull_request_id = msg.id.value()))]
    pub fn add_pull_request_labels(&self, msg: PullRequestLabels) -> Result<()> {
        msg.validate(false, &self.config.validation)?;
        self.mutate("add_pull_request_labels", |txn, now| {
            let mut pull_request = authorized_pull_request(&*txn, &msg.creator, msg.id)?;
            ensure_absent(&pull_request.labels, &msg.labels, "label")?;
            pull_request.labels.extend_from_slice(&msg.labels);
            pull_request.updated_at = now;
            EntityStore::set(txn, &pull_request)
        })?;
        info!(count = msg.labels.len(), "pull request labels added");
        Ok(())
    }

    /// Removes labels.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` for an invalid batch or a label that isn't
    /// applied, `NotFound`, or `Unauthorized`.
    #[instrument(skip(self, msg), fields(creator = %msg.creator, pull_request_id = msg.id.value()))]
    pub fn remove_pull_request_labels(&self, msg: PullRequestLabels) -> Result<()> {
        msg.validate(true, &self.config.validation)?;
        self.mutate("remove_pull_request_labels", |txn, now| {
            let mut pull_request = authorized_pull_request(&*txn, &msg.creator, msg.id)?;
            ensure_present(&pull_request.labels, &msg.labels, "label")?;
            for label in &msg.labels {
                remove_by_value(&mut pull_request.labels, label, "label")?;
            }
            pull_request.updated_at = now;
            EntityStore::set(txn, &pull_request)
        })?;
        info!(count = msg.labels.len(), "pull request labels removed");
        Ok(())
    }

    /// Deletes a pull request and its comments.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `Unauthorized`, or `InvalidRequest` if the base
    /// repository's list doesn't contain the pull request.
    #[instrument(skip(self, msg), fields(creator = %msg.creator, pull_request_id = msg.id.value()))]
    pub fn delete_pull_request(&self, msg: DeletePullRequest) -> Result<()> {
        self.mutate("delete_pull_request", |txn, now| {
            let pull_request = authorized_pull_request(&*txn, &msg.creator, msg.id)?;
            if let Some(mut base) =
                EntityStore::find::<Repository>(&*txn, pull_request.base.repository_id)?
            {
                remove_by_value(&mut base.pull_requests, &pull_request.id, "pull request")?;
                base.updated_at = now;
                EntityStore::set(txn, &base)?;
            }
            for comment in &pull_request.comments {
                EntityStore::delete::<Comment>(txn, *comment)?;
            }
            EntityStore::delete::<PullRequest>(txn, pull_request.id)?;
            Ok(())
        })?;
        info!("pull request deleted");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use gitledger_types::{
        ErrorCode, OwnerRef, RepositoryId,
        messages::{CreateBranch, CreateComment, CreateRepository},
    };

    use super::*;
    use crate::ledger::tests::{ledger, register};

    struct Fixture {
        ledger: Ledger,
        alice: Address,
        bob: Address,
        repo: RepositoryId,
    }

    fn fixture() -> Fixture {
        let ledger = ledger();
        let alice = register(&ledger, "gitopia1alice");
        let bob = register(&ledger, "gitopia1bob");
        let repo = ledger
            .create_repository(
                CreateRepository::builder()
                    .creator(alice.clone())
                    .name("alpha")
                    .owner(OwnerRef::User(alice.clone()))
                    .build(),
            )
            .unwrap();
        for name in ["master", "feature"] {
            ledger
                .create_branch(
                    CreateBranch::builder()
                        .creator(alice.clone())
                        .id(repo)
                        .name(name)
                        .commit_sha("abc123")
                        .build(),
                )
                .unwrap();
        }
        Fixture { ledger, alice, bob, repo }
    }

    fn open(fixture: &Fixture, creator: &Address) -> PullRequestCreated {
        fixture
            .ledger
            .create_pull_request(
                CreatePullRequest::builder()
                    .creator(creator.clone())
                    .title("Add feature")
                    .head_repository_id(fixture.repo)
                    .head_branch("feature")
                    .base_repository_id(fixture.repo)
                    .base_branch("master")
                    .build(),
            )
            .expect("create pull request")
    }

    #[test]
    fn test_create_numbers_within_base() {
        let fixture = fixture();
        let first = open(&fixture, &fixture.bob);
        let second = open(&fixture, &fixture.alice);
        assert_eq!((first.iid, second.iid), (1, 2));

        let repository = fixture.ledger.get_repository(fixture.repo).unwrap();
        assert_eq!(repository.pull_requests, vec![first.id, second.id]);
        assert_eq!(repository.pulls_count, 2);
    }

    #[test]
    fn test_create_requires_branches() {
        let fixture = fixture();
        let err = fixture
            .ledger
            .create_pull_request(
                CreatePullRequest::builder()
                    .creator(fixture.bob.clone())
                    .title("Add feature")
                    .head_repository_id(fixture.repo)
                    .head_branch("missing")
                    .base_repository_id(fixture.repo)
                    .base_branch("master")
                    .build(),
            )
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[test]
    fn test_title_is_author_only() {
        let fixture = fixture();
        let created = open(&fixture, &fixture.bob);
        let update = |creator: &Address| {
            fixture.ledger.update_pull_request_title(
                UpdatePullRequestTitle::builder()
                    .creator(creator.clone())
                    .id(created.id)
                    .title("Renamed")
                    .build(),
            )
        };
        assert_eq!(update(&fixture.alice).unwrap_err().code(), ErrorCode::Unauthorized);
        update(&fixture.bob).unwrap();
        assert_eq!(fixture.ledger.get_pull_request(created.id).unwrap().title, "Renamed");
    }

    #[test]
    fn test_state_transitions() {
        let fixture = fixture();
        let created = open(&fixture, &fixture.bob);
        let set = |state, sha: Option<&str>| {
            fixture.ledger.set_pull_request_state(SetPullRequestState {
                creator: fixture.alice.clone(),
                id: created.id,
                state,
                merge_commit_sha: sha.map(str::to_string),
            })
        };

        set(PullRequestState::Closed, None).unwrap();
        assert!(fixture.ledger.get_pull_request(created.id).unwrap().closed_at.is_some());
        assert_eq!(
            set(PullRequestState::Merged, Some("abc")).unwrap_err().code(),
            ErrorCode::InvalidRequest
        );
        set(PullRequestState::Open, None).unwrap();
        assert_eq!(set(PullRequestState::Merged, None).unwrap_err().code(), ErrorCode::InvalidRequest);
        set(PullRequestState::Merged, Some("deadbeef")).unwrap();

        let merged = fixture.ledger.get_pull_request(created.id).unwrap();
        assert_eq!(merged.state, PullRequestState::Merged);
        assert_eq!(merged.merge_commit_sha.as_deref(), Some("deadbeef"));
        assert_eq!(set(PullRequestState::Open, None).unwrap_err().code(), ErrorCode::InvalidRequest);
    }

    #[test]
    fn test_reviewer_set_semantics() {
        let fixture = fixture();
        let created = open(&fixture, &fixture.bob);
        let batch = |addresses: &[&str]| PullRequestAddresses {
            creator: fixture.bob.clone(),
            id: created.id,
            addresses: addresses.iter().map(|a| Address::new(*a)).collect(),
        };

        fixture.ledger.add_pull_request_reviewers(batch(&["r1", "r2"])).unwrap();
        assert_eq!(
            fixture.ledger.add_pull_request_reviewers(batch(&["r3", "r2"])).unwrap_err().code(),
            ErrorCode::AlreadyExists
        );
        assert_eq!(
            fixture.ledger.add_pull_request_reviewers(batch(&["r3", "r3"])).unwrap_err().code(),
            ErrorCode::InvalidRequest
        );
        assert_eq!(
            fixture.ledger.remove_pull_request_reviewers(batch(&["r9"])).unwrap_err().code(),
            ErrorCode::InvalidRequest
        );
        fixture.ledger.remove_pull_request_reviewers(batch(&["r1"])).unwrap();
        fixture.ledger.add_pull_request_assignees(batch(&["r1"])).unwrap();

        let pull_request = fixture.ledger.get_pull_request(created.id).unwrap();
        assert_eq!(pull_request.reviewers, vec![Address::new("r2")]);
        assert_eq!(pull_request.assignees, vec![Address::new("r1")]);
    }

    #[test]
    fn test_label_limits() {
        let fixture = fixture();
        let created = open(&fixture, &fixture.bob);
        let labels = |labels: Vec<u64>| PullRequestLabels {
            creator: fixture.bob.clone(),
            id: created.id,
            labels,
        };

        assert_eq!(
            fixture.ledger.add_pull_request_labels(labels((0..11).collect())).unwrap_err().code(),
            ErrorCode::InvalidRequest
        );
        fixture.ledger.add_pull_request_labels(labels(vec![1, 2, 3])).unwrap();
        fixture.ledger.remove_pull_request_labels(labels(vec![2])).unwrap();
        assert_eq!(fixture.ledger.get_pull_request(created.id).unwrap().labels, vec![1, 3]);
    }

    #[test]
    fn test_delete_removes_comments_and_back_reference() {
        let fixture = fixture();
        let created = open(&fixture, &fixture.bob);
        let comment = fixture
            .ledger
            .create_comment(
                CreateComment::builder()
                    .creator(fixture.alice.clone())
                    .parent_id(created.id)
                    .body("looks good")
                    .build(),
            )
            .unwrap();

        let outsider = register(&fixture.ledger, "gitopia1carol");
        assert_eq!(
            fixture
                .ledger
                .delete_pull_request(DeletePullRequest { creator: outsider, id: created.id })
                .unwrap_err()
                .code(),
            ErrorCode::Unauthorized
        );

        fixture
            .ledger
            .delete_pull_request(DeletePullRequest { creator: fixture.bob.clone(), id: created.id })
            .unwrap();
        assert_eq!(fixture.ledger.get_comment(comment).unwrap_err().code(), ErrorCode::NotFound);
        assert!(fixture.ledger.get_repository(fixture.repo).unwrap().pull_requests.is_empty());
    }
}
