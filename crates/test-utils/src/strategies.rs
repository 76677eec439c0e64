//! Proptest strategies for gitledger domain values.
//!
//! Reusable generators for property-based testing across crates. Strategies
//! produce values that pass request validation, so properties exercise the
//! ledger rules rather than the input checks.
//!
//! # Usage
//!
//! ```no_run
//! use gitledger_test_utils::strategies;
//! use proptest::prelude::*;
//!
//! proptest! {
//!     #[test]
//!     fn my_property(names in strategies::arb_repository_names(8)) {
//!         // create a repository per name and check an invariant
//!     }
//! }
//! ```

use gitledger_types::{Address, CollaboratorRole, MemberRole, PullRequestState};
use proptest::prelude::*;

/// Generates a user address of the form `gitopia1[a-z0-9]{8,16}`.
pub fn arb_address() -> impl Strategy<Value = Address> {
    "gitopia1[a-z0-9]{8,16}".prop_map(Address::new)
}

/// Generates 1 to `max` distinct addresses.
pub fn arb_addresses(max: usize) -> impl Strategy<Value = Vec<Address>> {
    proptest::collection::btree_set(arb_address(), 1..=max)
        .prop_map(|set| set.into_iter().collect())
}

/// Generates a repository or organization name matching `[a-z][a-z0-9_-]{0,15}`.
pub fn arb_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_-]{0,15}"
}

/// Generates 1 to `max` distinct names in random order.
pub fn arb_repository_names(max: usize) -> impl Strategy<Value = Vec<String>> {
    proptest::collection::btree_set(arb_name(), 1..=max)
        .prop_map(|set| set.into_iter().collect::<Vec<_>>())
        .prop_shuffle()
}

/// Generates a branch name such as `feature/x1` or `main`.
pub fn arb_branch() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("main".to_string()),
        "[a-z]{1,8}/[a-z0-9]{1,8}",
        "[a-z][a-z0-9.-]{0,15}",
    ]
}

/// Generates a 40-character lowercase hex commit sha.
pub fn arb_commit_sha() -> impl Strategy<Value = String> {
    "[0-9a-f]{40}"
}

/// Generates a collaborator role.
pub fn arb_collaborator_role() -> impl Strategy<Value = CollaboratorRole> {
    prop::sample::select(vec![
        CollaboratorRole::Read,
        CollaboratorRole::Triage,
        CollaboratorRole::Write,
        CollaboratorRole::Maintain,
        CollaboratorRole::Admin,
    ])
}

/// Generates an organization member role.
pub fn arb_member_role() -> impl Strategy<Value = MemberRole> {
    prop::sample::select(vec![MemberRole::Member, MemberRole::Owner])
}

/// Generates a pull request state.
pub fn arb_pull_request_state() -> impl Strategy<Value = PullRequestState> {
    prop::sample::select(vec![
        PullRequestState::Open,
        PullRequestState::Closed,
        PullRequestState::Merged,
    ])
}

/// Generates a page size between 1 and `max`.
pub fn arb_limit(max: u64) -> impl Strategy<Value = u64> {
    1..=max
}
