//! End-to-end ledger scenarios.
//!
//! Drives the public mutation and query surface through multi-step flows
//! that touch several entity kinds at once.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use gitledger_state::PageRequest;
use gitledger_test_utils::{
    TEST_EVALUATOR, TestDir, TestLedger, init_test_tracing, test_ledger_config,
};
use gitledger_types::{
    Address, CollaboratorRole, ErrorCode, LedgerConfig, MemberRole, OwnerRef, PullRequestState,
    RepositoryId,
    messages::{
        ChangeOwner, CreateComment, CreateRepository, CreateReward, DeleteBranch,
        DeleteOrganization, DeletePullRequest, DeleteRepository, DeleteUser, ForkRepository,
        RenameRepository, SetDefaultBranch, SetPullRequestState, UpdateOrganizationMember,
    },
};

fn setup() -> TestLedger {
    init_test_tracing();
    TestLedger::new()
}

/// Create, rename, then hand a repository to an organization its creator
/// doesn't own.
#[test]
fn test_rename_then_transfer_to_organization() {
    let ledger = setup();
    let u1 = ledger.user("gitopia1alice");
    let u2 = ledger.user("gitopia1bob");
    let org = ledger.organization(&u2, "acme");

    let repo = ledger.user_repository(&u1, "alpha");
    assert_eq!(repo, RepositoryId::new(0), "first repository should take ID 0");

    ledger
        .rename_repository(
            RenameRepository::builder().creator(u1.clone()).id(repo).name("beta").build(),
        )
        .unwrap();
    let user = ledger.user_by_address(&u1).unwrap();
    assert_eq!(user.repository_names.get("beta"), Some(&repo));
    assert!(!user.repository_names.contains_key("alpha"));

    ledger.collaborator(&u1, repo, &u1, CollaboratorRole::Admin);
    let organization = ledger.get_organization(org).unwrap();
    assert_ne!(organization.members.get(&u1), Some(&MemberRole::Owner));

    ledger
        .change_owner(
            ChangeOwner::builder()
                .creator(u1.clone())
                .repository_id(repo)
                .owner(OwnerRef::Organization(org))
                .build(),
        )
        .unwrap();

    assert_eq!(ledger.repository_owner(repo).unwrap(), OwnerRef::Organization(org));
    let organization = ledger.get_organization(org).unwrap();
    assert_eq!(organization.repositories, vec![repo]);
    assert_eq!(organization.repository_names.get("beta"), Some(&repo));

    let user = ledger.user_by_address(&u1).unwrap();
    assert!(user.repositories.is_empty());
    assert!(user.repository_names.is_empty());

    // Still reachable through the Admin grant, now under the organization.
    ledger
        .rename_repository(
            RenameRepository::builder().creator(u1.clone()).id(repo).name("gamma").build(),
        )
        .unwrap();
    assert_eq!(ledger.organization_repository("acme", "gamma").unwrap().id, repo);
}

#[test]
fn test_duplicate_name_under_same_owner() {
    let ledger = setup();
    let u1 = ledger.user("gitopia1alice");
    ledger.user_repository(&u1, "alpha");

    let err = ledger
        .create_repository(
            CreateRepository::builder()
                .creator(u1.clone())
                .name("alpha")
                .owner(OwnerRef::User(u1.clone()))
                .build(),
        )
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::AlreadyExists);

    // The rejected create must not have consumed an ID.
    let next = ledger.user_repository(&u1, "beta");
    assert_eq!(next, RepositoryId::new(1));
}

#[test]
fn test_default_branch_guards() {
    let ledger = setup();
    let u1 = ledger.user("gitopia1alice");
    let repo = ledger.user_repository(&u1, "alpha");
    ledger.branch(&u1, repo, "master");
    let default = ledger.get_repository(repo).unwrap().default_branch;

    let err = ledger
        .delete_branch(DeleteBranch::builder().creator(u1.clone()).id(repo).name(default).build())
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidRequest);

    let err = ledger
        .set_default_branch(
            SetDefaultBranch::builder().creator(u1.clone()).id(repo).name("nope").build(),
        )
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
}

#[test]
fn test_pull_request_lifecycle_with_comments() {
    let ledger = setup();
    let alice = ledger.user("gitopia1alice");
    let bob = ledger.user("gitopia1bob");
    let repo = ledger.user_repository(&alice, "alpha");
    ledger.branch(&alice, repo, "master");
    ledger.branch(&alice, repo, "feature");

    let pr = ledger.pull_request(&bob, repo, "feature", "master");
    for body in ["first", "second"] {
        ledger
            .create_comment(
                CreateComment::builder().creator(bob.clone()).parent_id(pr).body(body).build(),
            )
            .unwrap();
    }
    let comments = ledger.pull_request_comments(pr, &PageRequest::default()).unwrap();
    assert_eq!(comments.items.len(), 2);
    assert_eq!(comments.items[1].comment_iid, 2);

    ledger
        .set_pull_request_state(
            SetPullRequestState::builder()
                .creator(alice.clone())
                .id(pr)
                .state(PullRequestState::Merged)
                .merge_commit_sha("deadbeef")
                .build(),
        )
        .unwrap();
    let merged = ledger.get_pull_request(pr).unwrap();
    assert_eq!(merged.state, PullRequestState::Merged);
    assert!(merged.merged_at.is_some());

    ledger.delete_pull_request(DeletePullRequest::builder().creator(bob).id(pr).build()).unwrap();
    assert!(ledger.get_repository(repo).unwrap().pull_requests.is_empty());
    assert_eq!(ledger.comment_all(&PageRequest::default()).unwrap().items.len(), 0);
}

#[test]
fn test_fork_listing_skips_deleted_forks() {
    let ledger = setup();
    let alice = ledger.user("gitopia1alice");
    let bob = ledger.user("gitopia1bob");
    let carol = ledger.user("gitopia1carol");
    let repo = ledger.user_repository(&alice, "alpha");

    let mut forks = Vec::new();
    for who in [&bob, &carol] {
        forks.push(
            ledger
                .fork_repository(
                    ForkRepository::builder()
                        .creator(who.clone())
                        .repository_id(repo)
                        .owner(OwnerRef::User(who.clone()))
                        .build(),
                )
                .unwrap(),
        );
    }
    ledger
        .delete_repository(DeleteRepository::builder().creator(bob.clone()).id(forks[0]).build())
        .unwrap();

    let page = ledger.repository_forks(repo, &PageRequest::default()).unwrap();
    let ids: Vec<_> = page.items.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![forks[1]]);
    assert_eq!(ledger.get_repository(repo).unwrap().forks, forks);
}

#[test]
fn test_organization_teardown() {
    let ledger = setup();
    let alice = ledger.user("gitopia1alice");
    let bob = ledger.user("gitopia1bob");
    let org = ledger.organization(&alice, "acme");
    ledger
        .update_organization_member(
            UpdateOrganizationMember::builder()
                .creator(alice.clone())
                .id(org)
                .member(bob.clone())
                .role(MemberRole::Member)
                .build(),
        )
        .unwrap();
    let repo = ledger.repository(&alice, OwnerRef::Organization(org), "tools");

    let delete = DeleteOrganization::builder().creator(alice.clone()).id(org).build();
    assert_eq!(
        ledger.delete_organization(delete.clone()).unwrap_err().code(),
        ErrorCode::InvalidRequest
    );

    ledger
        .delete_repository(DeleteRepository::builder().creator(alice.clone()).id(repo).build())
        .unwrap();
    ledger.delete_organization(delete).unwrap();

    assert_eq!(ledger.whois("acme").unwrap_err().code(), ErrorCode::NotFound);
    assert!(ledger.user_by_address(&bob).unwrap().organizations.is_empty());
    ledger.delete_user(DeleteUser::builder().creator(bob.clone()).build()).unwrap();
    assert_eq!(ledger.user_by_address(&bob).unwrap_err().code(), ErrorCode::NotFound);
}

#[test]
fn test_rewards_by_recipient() {
    let ledger = setup();
    let id = ledger
        .create_reward(
            CreateReward::builder()
                .creator(TEST_EVALUATOR)
                .recipient("gitopia1bob")
                .amount(25)
                .build(),
        )
        .unwrap();
    let reward = ledger.reward_by_recipient(&Address::new("gitopia1bob")).unwrap();
    assert_eq!(reward.id, id);
    assert_eq!(ledger.reward_all(&PageRequest::default()).unwrap().items, vec![reward]);
}

#[test]
fn test_loaded_config_drives_defaults() {
    let dir = TestDir::new();
    let path = dir.write("ledger.toml", "[pagination]\ndefault_limit = 2\nmax_limit = 4\n");
    let config = LedgerConfig::load(&path).unwrap();
    let ledger = TestLedger::with_config(config);
    let alice = ledger.user("gitopia1alice");
    for name in ["a", "b", "c"] {
        ledger.user_repository(&alice, name);
    }

    let page = ledger.repository_all(&PageRequest::default()).unwrap();
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.total, Some(3), "defaulted limit reports the total");
    assert!(page.next_key.is_some());

    let clamped = ledger.user_repositories(&alice, &PageRequest::builder().limit(10).build());
    assert_eq!(clamped.unwrap().items.len(), 3);
}

#[test]
fn test_invalid_config_file_is_rejected() {
    let dir = TestDir::new();
    let path = dir.write("ledger.toml", "[pagination]\ndefault_limit = 0\n");
    assert!(LedgerConfig::load(path).is_err());
    assert!(LedgerConfig::load(dir.join("missing.toml")).is_err());
    assert!(test_ledger_config().validate().is_ok());
}
