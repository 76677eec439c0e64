//! Persisted entity records.
//!
//! Every record carries its own immutable `id`, assigned once from the
//! per-kind sequence when the record is created. Maps are `BTreeMap` so the
//! encoded bytes are deterministic.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{
    Address, CollaboratorRole, CommentId, LabelId, MemberRole, OrganizationId, OwnerRef,
    PullRequestId, PullRequestState, RepositoryId, RewardId, UserId,
};

/// Branch a repository starts with.
pub const DEFAULT_BRANCH: &str = "master";

// ============================================================================
// Owners
// ============================================================================

/// A registered user.
///
/// `repositories` and `repository_names` are the user's side of repository
/// ownership and always agree with each other.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Numeric identity.
    pub id: UserId,
    /// Account address; unique across users.
    pub address: Address,
    /// Display name.
    pub username: String,
    /// Free-form biography.
    pub bio: String,
    /// Avatar location.
    pub avatar_url: String,
    /// Owned repositories, in append order.
    pub repositories: Vec<RepositoryId>,
    /// Owned repository names.
    pub repository_names: BTreeMap<String, RepositoryId>,
    /// Organizations the user belongs to, in join order.
    pub organizations: Vec<OrganizationId>,
    /// Creation time, Unix seconds.
    pub created_at: i64,
    /// Last update time, Unix seconds.
    pub updated_at: i64,
}

/// An organization that can own repositories.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    /// Numeric identity.
    pub id: OrganizationId,
    /// Address that created the organization.
    pub creator: Address,
    /// Globally unique name, resolvable through Whois.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Avatar location.
    pub avatar_url: String,
    /// Location text.
    pub location: String,
    /// Website URL.
    pub website: String,
    /// Member roles by address.
    pub members: BTreeMap<Address, MemberRole>,
    /// Owned repositories, in append order.
    pub repositories: Vec<RepositoryId>,
    /// Owned repository names.
    pub repository_names: BTreeMap<String, RepositoryId>,
    /// Creation time, Unix seconds.
    pub created_at: i64,
    /// Last update time, Unix seconds.
    pub updated_at: i64,
}

impl Organization {
    /// Returns true if `address` holds the `Owner` role.
    pub fn is_owner(&self, address: &Address) -> bool {
        self.members.get(address) == Some(&MemberRole::Owner)
    }

    /// Number of members holding the `Owner` role.
    pub fn owner_count(&self) -> usize {
        self.members.values().filter(|role| **role == MemberRole::Owner).count()
    }
}

// ============================================================================
// Repositories
// ============================================================================

/// A code repository.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    /// Numeric identity. Survives rename and ownership transfer.
    pub id: RepositoryId,
    /// Address that created the repository.
    pub creator: Address,
    /// Name, unique within the owner's namespace.
    pub name: String,
    /// Current holder.
    pub owner: OwnerRef,
    /// Free-form description.
    pub description: String,
    /// License identifier.
    pub license: String,
    /// Repository labels.
    pub labels: Vec<String>,
    /// Branch name to commit sha.
    pub branches: BTreeMap<String, String>,
    /// Branch checked out by default; protected from deletion.
    pub default_branch: String,
    /// Commit references copied into forks.
    pub commits: Vec<String>,
    /// Child forks, append-only.
    pub forks: Vec<RepositoryId>,
    /// Source repository when `fork` is true.
    pub parent: Option<RepositoryId>,
    /// Whether this repository was created by forking.
    pub fork: bool,
    /// Collaborator roles by address.
    pub collaborators: BTreeMap<Address, CollaboratorRole>,
    /// Pull requests targeting this repository, in creation order.
    pub pull_requests: Vec<PullRequestId>,
    /// Issues opened so far.
    pub issues_count: u64,
    /// Pull requests opened so far; source of pull request `iid`s.
    pub pulls_count: u64,
    /// Creation time, Unix seconds.
    pub created_at: i64,
    /// Last update time, Unix seconds.
    pub updated_at: i64,
}

impl Repository {
    /// Returns true if `address` holds `Admin` in the collaborator map.
    pub fn is_admin_collaborator(&self, address: &Address) -> bool {
        self.collaborators.get(address) == Some(&CollaboratorRole::Admin)
    }
}

// ============================================================================
// Pull Requests and Comments
// ============================================================================

/// One side of a pull request: a branch within a repository.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestRef {
    /// Repository holding the branch.
    pub repository_id: RepositoryId,
    /// Branch name.
    pub branch: String,
}

/// A pull request from a head branch into a base branch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    /// Numeric identity.
    pub id: PullRequestId,
    /// Number of this pull request within its base repository, starting at 1.
    pub iid: u64,
    /// Address that opened the pull request.
    pub creator: Address,
    /// Title.
    pub title: String,
    /// Description.
    pub description: String,
    /// Lifecycle state.
    pub state: PullRequestState,
    /// Source branch.
    pub head: PullRequestRef,
    /// Target branch.
    pub base: PullRequestRef,
    /// Requested reviewers, unique.
    pub reviewers: Vec<Address>,
    /// Assignees, unique.
    pub assignees: Vec<Address>,
    /// Labels, unique.
    pub labels: Vec<LabelId>,
    /// Comments, in creation order.
    pub comments: Vec<CommentId>,
    /// Comments ever created on this pull request; never decremented.
    pub comments_count: u64,
    /// Merge commit, set when merged.
    pub merge_commit_sha: Option<String>,
    /// Creation time, Unix seconds.
    pub created_at: i64,
    /// Last update time, Unix seconds.
    pub updated_at: i64,
    /// Time of the last close, Unix seconds.
    pub closed_at: Option<i64>,
    /// Time of merge, Unix seconds.
    pub merged_at: Option<i64>,
}

/// A comment on a pull request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Numeric identity.
    pub id: CommentId,
    /// Author address.
    pub creator: Address,
    /// Pull request the comment belongs to.
    pub parent_id: PullRequestId,
    /// Number of this comment within its pull request, starting at 1.
    pub comment_iid: u64,
    /// Body text.
    pub body: String,
    /// Attachment references.
    pub attachments: Vec<String>,
    /// Diff hunk for review comments.
    pub diff_hunk: String,
    /// File path for review comments.
    pub path: String,
    /// Generated by the ledger rather than a user.
    pub system: bool,
    /// Creation time, Unix seconds.
    pub created_at: i64,
    /// Last update time, Unix seconds.
    pub updated_at: i64,
}

// ============================================================================
// Rewards
// ============================================================================

/// A reward granted to a contributor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reward {
    /// Numeric identity.
    pub id: RewardId,
    /// Evaluator that granted the reward.
    pub creator: Address,
    /// Receiving address; at most one reward per recipient.
    pub recipient: Address,
    /// Amount granted.
    pub amount: u64,
}
