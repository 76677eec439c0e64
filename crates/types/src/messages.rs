//! Mutation requests.
//!
//! Every request names its `creator`: the already-verified address of the
//! signer submitting it. Field validation that needs no store access lives in
//! `validate` methods here; handlers call them before touching state.

use serde::{Deserialize, Serialize};

use crate::{
    config::ValidationConfig,
    types::{
        Address, CollaboratorRole, CommentId, LabelId, MemberRole, OrganizationId, OwnerRef,
        PullRequestId, PullRequestState, RepositoryId,
    },
    validation::{
        ValidationError, validate_batch, validate_branch_name, validate_comment_body,
        validate_description, validate_name, validate_optional_batch, validate_title,
    },
};

// ============================================================================
// Users
// ============================================================================

/// Registers a user for the creator's address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bon::Builder)]
pub struct CreateUser {
    /// Address being registered.
    #[builder(into)]
    pub creator: Address,
    /// Display name.
    #[builder(into)]
    pub username: String,
    /// Biography.
    #[builder(into, default)]
    pub bio: String,
    /// Avatar location.
    #[builder(into, default)]
    pub avatar_url: String,
}

impl CreateUser {
    /// Checks field limits.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if the username or bio is out of bounds.
    pub fn validate(&self, config: &ValidationConfig) -> Result<(), ValidationError> {
        validate_name("username", &self.username, config)?;
        validate_description(&self.bio, config)
    }
}

/// Replaces a user's profile fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bon::Builder)]
pub struct UpdateUser {
    /// The user updating their own profile.
    #[builder(into)]
    pub creator: Address,
    /// Display name.
    #[builder(into)]
    pub username: String,
    /// Biography.
    #[builder(into, default)]
    pub bio: String,
    /// Avatar location.
    #[builder(into, default)]
    pub avatar_url: String,
}

impl UpdateUser {
    /// Checks field limits.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if the username or bio is out of bounds.
    pub fn validate(&self, config: &ValidationConfig) -> Result<(), ValidationError> {
        validate_name("username", &self.username, config)?;
        validate_description(&self.bio, config)
    }
}

/// Deletes the creator's own user record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bon::Builder)]
pub struct DeleteUser {
    /// The user deleting their record.
    #[builder(into)]
    pub creator: Address,
}

// ============================================================================
// Organizations
// ============================================================================

/// Creates an organization owned by the creator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bon::Builder)]
pub struct CreateOrganization {
    /// Registered user creating the organization.
    #[builder(into)]
    pub creator: Address,
    /// Globally unique name.
    #[builder(into)]
    pub name: String,
    /// Description.
    #[builder(into, default)]
    pub description: String,
}

impl CreateOrganization {
    /// Checks field limits.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if the name or description is out of bounds.
    pub fn validate(&self, config: &ValidationConfig) -> Result<(), ValidationError> {
        validate_name("name", &self.name, config)?;
        validate_description(&self.description, config)
    }
}

/// Replaces an organization's profile fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bon::Builder)]
pub struct UpdateOrganization {
    /// An organization owner.
    #[builder(into)]
    pub creator: Address,
    /// Organization to update.
    #[builder(into)]
    pub id: OrganizationId,
    /// Description.
    #[builder(into, default)]
    pub description: String,
    /// Avatar location.
    #[builder(into, default)]
    pub avatar_url: String,
    /// Location text.
    #[builder(into, default)]
    pub location: String,
    /// Website URL.
    #[builder(into, default)]
    pub website: String,
}

/// Adds a member or changes a member's role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bon::Builder)]
pub struct UpdateOrganizationMember {
    /// An organization owner.
    #[builder(into)]
    pub creator: Address,
    /// Organization to change.
    #[builder(into)]
    pub id: OrganizationId,
    /// Registered user gaining or changing membership.
    #[builder(into)]
    pub member: Address,
    /// New role.
    pub role: MemberRole,
}

/// Removes a member from an organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bon::Builder)]
pub struct RemoveOrganizationMember {
    /// An organization owner.
    #[builder(into)]
    pub creator: Address,
    /// Organization to change.
    #[builder(into)]
    pub id: OrganizationId,
    /// Member to remove.
    #[builder(into)]
    pub member: Address,
}

/// Deletes an organization that no longer owns repositories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bon::Builder)]
pub struct DeleteOrganization {
    /// An organization owner.
    #[builder(into)]
    pub creator: Address,
    /// Organization to delete.
    #[builder(into)]
    pub id: OrganizationId,
}

// ============================================================================
// Repositories
// ============================================================================

/// Creates a repository under a user or organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bon::Builder)]
pub struct CreateRepository {
    /// The owning user, or an owner of the owning organization.
    #[builder(into)]
    pub creator: Address,
    /// Name, unique within the owner's namespace.
    #[builder(into)]
    pub name: String,
    /// Initial holder.
    pub owner: OwnerRef,
    /// Description.
    #[builder(into, default)]
    pub description: String,
}

impl CreateRepository {
    /// Checks field limits.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if the name or description is out of bounds.
    pub fn validate(&self, config: &ValidationConfig) -> Result<(), ValidationError> {
        validate_name("name", &self.name, config)?;
        validate_description(&self.description, config)
    }
}

/// Replaces a repository's descriptive fields. The name is changed only
/// through [`RenameRepository`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bon::Builder)]
pub struct UpdateRepository {
    /// Requester, authorized by the owner rule.
    #[builder(into)]
    pub creator: Address,
    /// Repository to update.
    #[builder(into)]
    pub id: RepositoryId,
    /// Description.
    #[builder(into, default)]
    pub description: String,
    /// License identifier.
    #[builder(into, default)]
    pub license: String,
    /// Labels.
    #[builder(default)]
    pub labels: Vec<String>,
}

impl UpdateRepository {
    /// Checks field limits.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if the description is too long or labels repeat.
    pub fn validate(&self, config: &ValidationConfig) -> Result<(), ValidationError> {
        validate_description(&self.description, config)?;
        validate_optional_batch("labels", &self.labels, config.max_batch_size)
    }
}

/// Transfers a repository to another user or organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bon::Builder)]
pub struct ChangeOwner {
    /// Requester, authorized against the current owner.
    #[builder(into)]
    pub creator: Address,
    /// Repository to transfer.
    #[builder(into)]
    pub repository_id: RepositoryId,
    /// New holder.
    pub owner: OwnerRef,
}

/// Forks a repository under a user or organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bon::Builder)]
pub struct ForkRepository {
    /// The fork's owning user, or an owner of the owning organization.
    #[builder(into)]
    pub creator: Address,
    /// Source repository.
    #[builder(into)]
    pub repository_id: RepositoryId,
    /// Holder of the new fork.
    pub owner: OwnerRef,
}

/// Renames a repository within its owner's namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bon::Builder)]
pub struct RenameRepository {
    /// Requester, authorized by the owner rule.
    #[builder(into)]
    pub creator: Address,
    /// Repository to rename.
    #[builder(into)]
    pub id: RepositoryId,
    /// New name.
    #[builder(into)]
    pub name: String,
}

impl RenameRepository {
    /// Checks field limits.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if the new name is invalid.
    pub fn validate(&self, config: &ValidationConfig) -> Result<(), ValidationError> {
        validate_name("name", &self.name, config)
    }
}

/// Deletes a repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bon::Builder)]
pub struct DeleteRepository {
    /// Requester, authorized by the owner rule.
    #[builder(into)]
    pub creator: Address,
    /// Repository to delete.
    #[builder(into)]
    pub id: RepositoryId,
}

/// Creates a branch or moves it to a new commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bon::Builder)]
pub struct CreateBranch {
    /// Requester, authorized by the owner rule.
    #[builder(into)]
    pub creator: Address,
    /// Repository holding the branch.
    #[builder(into)]
    pub id: RepositoryId,
    /// Branch name.
    #[builder(into)]
    pub name: String,
    /// Commit the branch points at.
    #[builder(into)]
    pub commit_sha: String,
}

impl CreateBranch {
    /// Checks field limits.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if the branch name is invalid or the sha is empty.
    pub fn validate(&self, config: &ValidationConfig) -> Result<(), ValidationError> {
        validate_branch_name("name", &self.name, config)?;
        crate::validation::validate_commit_sha(&self.commit_sha)
    }
}

/// Selects an existing branch as the default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bon::Builder)]
pub struct SetDefaultBranch {
    /// Requester, authorized by the owner rule.
    #[builder(into)]
    pub creator: Address,
    /// Repository holding the branch.
    #[builder(into)]
    pub id: RepositoryId,
    /// Branch name.
    #[builder(into)]
    pub name: String,
}

/// Deletes a branch other than the default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bon::Builder)]
pub struct DeleteBranch {
    /// Requester, authorized by the owner rule.
    #[builder(into)]
    pub creator: Address,
    /// Repository holding the branch.
    #[builder(into)]
    pub id: RepositoryId,
    /// Branch name.
    #[builder(into)]
    pub name: String,
}

/// Adds a collaborator or changes a collaborator's role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bon::Builder)]
pub struct UpdateRepositoryCollaborator {
    /// Requester, authorized by the owner rule.
    #[builder(into)]
    pub creator: Address,
    /// Repository to change.
    #[builder(into)]
    pub id: RepositoryId,
    /// Registered user gaining or changing access.
    #[builder(into)]
    pub user: Address,
    /// New role.
    pub role: CollaboratorRole,
}

/// Removes a collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bon::Builder)]
pub struct RemoveRepositoryCollaborator {
    /// Requester, authorized by the owner rule.
    #[builder(into)]
    pub creator: Address,
    /// Repository to change.
    #[builder(into)]
    pub id: RepositoryId,
    /// Collaborator to remove.
    #[builder(into)]
    pub user: Address,
}

// ============================================================================
// Pull Requests
// ============================================================================

/// Opens a pull request from a head branch into a base branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bon::Builder)]
pub struct CreatePullRequest {
    /// Author.
    #[builder(into)]
    pub creator: Address,
    /// Title.
    #[builder(into)]
    pub title: String,
    /// Description.
    #[builder(into, default)]
    pub description: String,
    /// Repository holding the head branch.
    #[builder(into)]
    pub head_repository_id: RepositoryId,
    /// Head branch.
    #[builder(into)]
    pub head_branch: String,
    /// Repository holding the base branch.
    #[builder(into)]
    pub base_repository_id: RepositoryId,
    /// Base branch.
    #[builder(into)]
    pub base_branch: String,
    /// Initial reviewers.
    #[builder(default)]
    pub reviewers: Vec<Address>,
    /// Initial assignees.
    #[builder(default)]
    pub assignees: Vec<Address>,
    /// Initial labels.
    #[builder(default)]
    pub labels: Vec<LabelId>,
}

impl CreatePullRequest {
    /// Checks field limits.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] for an out-of-bounds title, description or
    /// branch name, or an oversized or duplicated reviewer, assignee or label list.
    pub fn validate(&self, config: &ValidationConfig) -> Result<(), ValidationError> {
        validate_title(&self.title, config)?;
        validate_description(&self.description, config)?;
        validate_branch_name("head_branch", &self.head_branch, config)?;
        validate_branch_name("base_branch", &self.base_branch, config)?;
        validate_optional_batch("reviewers", &self.reviewers, config.max_batch_size)?;
        validate_optional_batch("assignees", &self.assignees, config.max_batch_size)?;
        validate_optional_batch("labels", &self.labels, config.max_batch_size)
    }
}

/// Result of opening a pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestCreated {
    /// Global identity.
    pub id: PullRequestId,
    /// Number within the base repository.
    pub iid: u64,
}

/// Replaces a pull request's title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bon::Builder)]
pub struct UpdatePullRequestTitle {
    /// The pull request author.
    #[builder(into)]
    pub creator: Address,
    /// Pull request to update.
    #[builder(into)]
    pub id: PullRequestId,
    /// New title.
    #[builder(into)]
    pub title: String,
}

/// Replaces a pull request's description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bon::Builder)]
pub struct UpdatePullRequestDescription {
    /// The pull request author.
    #[builder(into)]
    pub creator: Address,
    /// Pull request to update.
    #[builder(into)]
    pub id: PullRequestId,
    /// New description.
    #[builder(into)]
    pub description: String,
}

/// Moves a pull request to a new state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bon::Builder)]
pub struct SetPullRequestState {
    /// The author or a requester authorized on the base repository.
    #[builder(into)]
    pub creator: Address,
    /// Pull request to change.
    #[builder(into)]
    pub id: PullRequestId,
    /// Target state.
    pub state: PullRequestState,
    /// Required when merging.
    #[builder(into)]
    pub merge_commit_sha: Option<String>,
}

/// Adds or removes addresses in a pull request's reviewers or assignees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bon::Builder)]
pub struct PullRequestAddresses {
    /// The author or a requester authorized on the base repository.
    #[builder(into)]
    pub creator: Address,
    /// Pull request to change.
    #[builder(into)]
    pub id: PullRequestId,
    /// Batch of addresses.
    pub addresses: Vec<Address>,
}

impl PullRequestAddresses {
    /// Checks the batch: non-empty, within the limit, no duplicates.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] naming `field` if the batch is invalid.
    pub fn validate(&self, field: &str, config: &ValidationConfig) -> Result<(), ValidationError> {
        validate_batch(field, &self.addresses, config.max_batch_size)
    }
}

/// Adds or removes labels on a pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bon::Builder)]
pub struct PullRequestLabels {
    /// The author or a requester authorized on the base repository.
    #[builder(into)]
    pub creator: Address,
    /// Pull request to change.
    #[builder(into)]
    pub id: PullRequestId,
    /// Batch of labels.
    pub labels: Vec<LabelId>,
}

impl PullRequestLabels {
    /// Checks the batch; removals allow a larger batch than additions.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if the batch is invalid.
    pub fn validate(&self, removing: bool, config: &ValidationConfig) -> Result<(), ValidationError> {
        let max = if removing { config.max_label_removal_batch_size } else { config.max_batch_size };
        validate_batch("labels", &self.labels, max)
    }
}

/// Deletes a pull request and its comments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bon::Builder)]
pub struct DeletePullRequest {
    /// The author or a requester authorized on the base repository.
    #[builder(into)]
    pub creator: Address,
    /// Pull request to delete.
    #[builder(into)]
    pub id: PullRequestId,
}

// ============================================================================
// Comments
// ============================================================================

/// Comments on a pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bon::Builder)]
pub struct CreateComment {
    /// Author.
    #[builder(into)]
    pub creator: Address,
    /// Pull request being commented on.
    #[builder(into)]
    pub parent_id: PullRequestId,
    /// Body text.
    #[builder(into)]
    pub body: String,
    /// Attachment references.
    #[builder(default)]
    pub attachments: Vec<String>,
    /// Diff hunk for review comments.
    #[builder(into, default)]
    pub diff_hunk: String,
    /// File path for review comments.
    #[builder(into, default)]
    pub path: String,
    /// Generated by the ledger.
    #[builder(default)]
    pub system: bool,
}

impl CreateComment {
    /// Checks field limits.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if the body is empty or too long.
    pub fn validate(&self, config: &ValidationConfig) -> Result<(), ValidationError> {
        validate_comment_body(&self.body, config)
    }
}

/// Replaces a comment's body and attachments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bon::Builder)]
pub struct UpdateComment {
    /// The comment author.
    #[builder(into)]
    pub creator: Address,
    /// Comment to update.
    #[builder(into)]
    pub id: CommentId,
    /// New body.
    #[builder(into)]
    pub body: String,
    /// New attachments.
    #[builder(default)]
    pub attachments: Vec<String>,
}

impl UpdateComment {
    /// Checks field limits.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if the body is empty or too long.
    pub fn validate(&self, config: &ValidationConfig) -> Result<(), ValidationError> {
        validate_comment_body(&self.body, config)
    }
}

/// Deletes a comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bon::Builder)]
pub struct DeleteComment {
    /// The comment author.
    #[builder(into)]
    pub creator: Address,
    /// Comment to delete.
    #[builder(into)]
    pub id: CommentId,
}

// ============================================================================
// Rewards
// ============================================================================

/// Grants a reward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bon::Builder)]
pub struct CreateReward {
    /// The configured evaluator.
    #[builder(into)]
    pub creator: Address,
    /// Receiving address.
    #[builder(into)]
    pub recipient: Address,
    /// Amount granted.
    pub amount: u64,
}
