//! Core type definitions for gitledger.
//!
//! - Identifier newtypes for every entity kind (one ID sequence per kind)
//! - Account addresses
//! - The polymorphic repository owner reference
//! - Role and state enums shared by the entity records

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use snafu::{ResultExt, Snafu};

// ============================================================================
// Identifier Types
// ============================================================================

/// Generates a newtype wrapper around `u64` for type-safe entity identifiers.
///
/// Each generated type provides:
/// - Standard derives: Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord
/// - Serde with `#[serde(transparent)]`
/// - `From<u64>` and `Into<u64>` conversions
/// - `Display` with a semantic prefix (e.g., `repo:12`)
/// - `new()` constructor and `value()` accessor
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident, $prefix:expr
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default,
            Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Creates a new identifier from a raw value.
            #[inline]
            pub const fn new(value: u64) -> Self {
                Self(value)
            }

            /// Returns the raw numeric value.
            #[inline]
            pub const fn value(self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            #[inline]
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for u64 {
            #[inline]
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}:{}", $prefix, self.0)
            }
        }

        impl FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                s.parse::<u64>().map(Self)
            }
        }
    };
}

define_id!(
    /// Identifier of a repository. Never changes across rename or ownership transfer.
    RepositoryId, "repo"
);

define_id!(
    /// Identifier of an organization.
    ///
    /// The Whois index stores its decimal text form (`value().to_string()`).
    OrganizationId, "org"
);

define_id!(
    /// Identifier of a user record. Users are also reachable by [`Address`].
    UserId, "user"
);

define_id!(
    /// Identifier of a pull request.
    PullRequestId, "pr"
);

define_id!(
    /// Identifier of a comment.
    CommentId, "comment"
);

define_id!(
    /// Identifier of a reward.
    RewardId, "reward"
);

/// Label identifier attached to pull requests.
pub type LabelId = u64;

// ============================================================================
// Entity Kinds
// ============================================================================

/// The kinds of entity persisted by the ledger.
///
/// Each kind owns its own ID sequence and key namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    /// Code repositories.
    Repository,
    /// Organizations owning repositories.
    Organization,
    /// Registered users.
    User,
    /// Pull request comments.
    Comment,
    /// Pull requests.
    PullRequest,
    /// Contributor rewards.
    Reward,
}

impl EntityKind {
    /// All entity kinds, in namespace order.
    pub const ALL: [EntityKind; 6] = [
        Self::Repository,
        Self::Organization,
        Self::User,
        Self::Comment,
        Self::PullRequest,
        Self::Reward,
    ];

    /// Returns the canonical name used in key prefixes and messages.
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Repository => "Repository",
            Self::Organization => "Organization",
            Self::User => "User",
            Self::Comment => "Comment",
            Self::PullRequest => "PullRequest",
            Self::Reward => "Reward",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Addresses
// ============================================================================

/// An account address that has already been validated by the signer layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    /// Wraps an address string.
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    /// Returns the address as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true when the address is the empty string.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Address {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Address {
    fn from(value: String) -> Self {
        Self(value)
    }
}

// ============================================================================
// Repository Owner
// ============================================================================

/// Error parsing the textual `{"Type": ..., "ID": ...}` owner form.
#[derive(Debug, Snafu)]
pub enum OwnerParseError {
    /// The input is not a JSON object with `Type` and `ID` fields.
    #[snafu(display("unable to parse owner: {source}"))]
    Json {
        /// The underlying JSON error.
        source: serde_json::Error,
    },

    /// `Type` is neither `User` nor `Organization`.
    #[snafu(display("unknown owner type {kind:?}"))]
    UnknownType {
        /// The unrecognized type tag.
        kind: String,
    },

    /// An organization owner whose `ID` is not a decimal integer.
    #[snafu(display("invalid organization id {id:?}"))]
    InvalidOrganizationId {
        /// The unparsable identifier.
        id: String,
    },
}

/// Reference to the current holder of a repository.
///
/// Users are referenced by address, organizations by numeric ID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OwnerRef {
    /// A user account.
    User(Address),
    /// An organization.
    Organization(OrganizationId),
}

/// Textual wire form of [`OwnerRef`].
#[derive(Serialize, Deserialize)]
struct OwnerJson {
    #[serde(rename = "Type")]
    kind: String,
    #[serde(rename = "ID")]
    id: String,
}

impl OwnerRef {
    /// Returns the type tag: `"User"` or `"Organization"`.
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::User(_) => "User",
            Self::Organization(_) => "Organization",
        }
    }

    /// Returns the textual ID: the address for users, the decimal ID for organizations.
    pub fn id_string(&self) -> String {
        match self {
            Self::User(address) => address.to_string(),
            Self::Organization(id) => id.value().to_string(),
        }
    }

    /// Parses the `{"Type":"User","ID":"..."}` form.
    ///
    /// # Errors
    ///
    /// Returns [`OwnerParseError`] on malformed JSON, an unknown `Type` tag,
    /// or a non-numeric organization `ID`.
    pub fn from_json(input: &str) -> Result<Self, OwnerParseError> {
        let raw: OwnerJson = serde_json::from_str(input).context(JsonSnafu)?;
        match raw.kind.as_str() {
            "User" => Ok(Self::User(Address::new(raw.id))),
            "Organization" => raw
                .id
                .parse::<u64>()
                .map(|id| Self::Organization(OrganizationId::new(id)))
                .map_err(|_| OwnerParseError::InvalidOrganizationId { id: raw.id }),
            _ => Err(OwnerParseError::UnknownType { kind: raw.kind }),
        }
    }

    /// Renders the `{"Type":...,"ID":...}` form.
    pub fn to_json(&self) -> String {
        let raw = OwnerJson { kind: self.type_name().to_string(), id: self.id_string() };
        // Two string fields always serialize.
        serde_json::to_string(&raw).unwrap_or_default()
    }
}

impl Default for OwnerRef {
    fn default() -> Self {
        Self::User(Address::default())
    }
}

impl fmt::Display for OwnerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.type_name(), self.id_string())
    }
}

// ============================================================================
// Roles and States
// ============================================================================

/// Permission level of a repository collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CollaboratorRole {
    /// Read-only access.
    Read,
    /// Can manage issues and pull requests.
    Triage,
    /// Can push.
    Write,
    /// Can manage the repository without destructive rights.
    Maintain,
    /// Full control, equivalent to the owner for repository mutations.
    Admin,
}

/// Role of an organization member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MemberRole {
    /// Regular member.
    Member,
    /// Organization owner; may administer every repository the organization holds.
    Owner,
}

/// Lifecycle state of a pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PullRequestState {
    /// Open for review.
    #[default]
    Open,
    /// Closed without merging.
    Closed,
    /// Merged into the base branch. Terminal.
    Merged,
}

impl PullRequestState {
    /// Returns true if a pull request may move from `self` to `next`.
    pub const fn can_transition_to(self, next: PullRequestState) -> bool {
        matches!(
            (self, next),
            (Self::Open, Self::Closed) | (Self::Closed, Self::Open) | (Self::Open, Self::Merged)
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_id_display_and_parse() {
        let id = RepositoryId::new(12);
        assert_eq!(id.to_string(), "repo:12");
        assert_eq!("12".parse::<RepositoryId>().unwrap(), id);
        assert_eq!(u64::from(OrganizationId::new(7)), 7);
    }

    #[test]
    fn test_owner_json_user() {
        let owner = OwnerRef::from_json(r#"{"Type":"User","ID":"gitopia1abc"}"#).unwrap();
        assert_eq!(owner, OwnerRef::User(Address::new("gitopia1abc")));
        assert_eq!(owner.to_json(), r#"{"Type":"User","ID":"gitopia1abc"}"#);
    }

    #[test]
    fn test_owner_json_organization() {
        let owner = OwnerRef::from_json(r#"{"Type":"Organization","ID":"42"}"#).unwrap();
        assert_eq!(owner, OwnerRef::Organization(OrganizationId::new(42)));
        assert_eq!(owner.id_string(), "42");
    }

    #[test]
    fn test_owner_json_rejects_bad_input() {
        assert!(matches!(OwnerRef::from_json("not json"), Err(OwnerParseError::Json { .. })));
        assert!(matches!(
            OwnerRef::from_json(r#"{"Type":"Team","ID":"1"}"#),
            Err(OwnerParseError::UnknownType { .. })
        ));
        assert!(matches!(
            OwnerRef::from_json(r#"{"Type":"Organization","ID":"abc"}"#),
            Err(OwnerParseError::InvalidOrganizationId { .. })
        ));
    }

    #[test]
    fn test_pull_request_transitions() {
        use PullRequestState::*;
        assert!(Open.can_transition_to(Closed));
        assert!(Closed.can_transition_to(Open));
        assert!(Open.can_transition_to(Merged));
        assert!(!Closed.can_transition_to(Merged));
        assert!(!Merged.can_transition_to(Open));
        assert!(!Open.can_transition_to(Open));
    }

    #[test]
    fn test_entity_kind_names() {
        let names: Vec<&str> = EntityKind::ALL.iter().map(|k| k.as_str()).collect();
        assert_eq!(
            names,
            ["Repository", "Organization", "User", "Comment", "PullRequest", "Reward"]
        );
    }
}
