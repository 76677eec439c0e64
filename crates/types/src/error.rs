//! Error types for gitledger using snafu.
//!
//! [`LedgerError`] is the taxonomy every mutation and query reports:
//! - `NotFound`: entity or name absent
//! - `AlreadyExists`: name collision or duplicate append
//! - `Unauthorized`: requester lacks the required role
//! - `InvalidRequest`: malformed input, conflicting pagination parameters,
//!   or a structural inconsistency in a back-reference list
//! - `Internal`: decode failure of a record known to exist, or a storage failure
//!
//! Each variant maps to an [`ErrorCode`] with a stable numeric identifier and a
//! suggested recovery action.

use core::fmt;

use snafu::{Location, Snafu};

use crate::{codec::CodecError, config::ConfigError, validation::ValidationError};

/// Unified result type for ledger operations.
pub type Result<T, E = LedgerError> = std::result::Result<T, E>;

/// Machine-readable error codes for programmatic error handling.
///
/// | Range       | Domain      | Examples                                   |
/// |-------------|-------------|--------------------------------------------|
/// | 3100–3199   | Lookup      | Missing entity, name collision             |
/// | 3200–3299   | Request     | Authorization, malformed input, internal   |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ErrorCode {
    /// Entity, name mapping, or index entry not found.
    NotFound = 3100,
    /// Name already taken or entry already present.
    AlreadyExists = 3101,
    /// Requester is not allowed to perform the operation.
    Unauthorized = 3200,
    /// Request is malformed or the store is structurally inconsistent.
    InvalidRequest = 3201,
    /// Unrecoverable internal failure (corrupt record, storage failure).
    Internal = 3202,
}

impl ErrorCode {
    /// Every defined code.
    pub const ALL: [ErrorCode; 5] = [
        Self::NotFound,
        Self::AlreadyExists,
        Self::Unauthorized,
        Self::InvalidRequest,
        Self::Internal,
    ];

    /// Returns the numeric code value.
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Converts a numeric code to an `ErrorCode`, returning `None` for unknown values.
    #[must_use]
    pub fn from_u16(code: u16) -> Option<Self> {
        match code {
            3100 => Some(Self::NotFound),
            3101 => Some(Self::AlreadyExists),
            3200 => Some(Self::Unauthorized),
            3201 => Some(Self::InvalidRequest),
            3202 => Some(Self::Internal),
            _ => None,
        }
    }

    /// Suggested recovery action for this error code.
    #[must_use]
    pub const fn suggested_action(self) -> &'static str {
        match self {
            Self::NotFound => "Verify the identifier or name; the entity may have been deleted.",
            Self::AlreadyExists => "Choose a different name or skip the entry that is already present.",
            Self::Unauthorized => {
                "Submit the request as the owner, an organization owner, or an admin collaborator."
            },
            Self::InvalidRequest => "Fix the request parameters and resubmit.",
            Self::Internal => {
                "A stored record could not be read. Collect context and report as an issue."
            },
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u16())
    }
}

/// Top-level error type for ledger operations.
///
/// Every handler validates before it writes, so any error returned from a
/// mutation means nothing was committed.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum LedgerError {
    /// Entity or name mapping absent.
    #[snafu(display("not found: {message}"))]
    NotFound {
        /// Error description.
        message: String,
        /// Source location.
        #[snafu(implicit)]
        location: Location,
    },

    /// Name collision or duplicate entry.
    #[snafu(display("already exists: {message}"))]
    AlreadyExists {
        /// Error description.
        message: String,
        /// Source location.
        #[snafu(implicit)]
        location: Location,
    },

    /// Requester lacks the required role.
    #[snafu(display("unauthorized: {message}"))]
    Unauthorized {
        /// Error description.
        message: String,
        /// Source location.
        #[snafu(implicit)]
        location: Location,
    },

    /// Malformed input or structural inconsistency.
    #[snafu(display("invalid request: {message}"))]
    InvalidRequest {
        /// Error description.
        message: String,
        /// Source location.
        #[snafu(implicit)]
        location: Location,
    },

    /// Unrecoverable failure.
    #[snafu(display("internal error at {location}: {message}"))]
    Internal {
        /// Error description.
        message: String,
        /// Source location.
        #[snafu(implicit)]
        location: Location,
    },
}

impl LedgerError {
    /// Returns the machine-readable code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound { .. } => ErrorCode::NotFound,
            Self::AlreadyExists { .. } => ErrorCode::AlreadyExists,
            Self::Unauthorized { .. } => ErrorCode::Unauthorized,
            Self::InvalidRequest { .. } => ErrorCode::InvalidRequest,
            Self::Internal { .. } => ErrorCode::Internal,
        }
    }

    /// Returns the human-readable description without the variant prefix.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::NotFound { message, .. }
            | Self::AlreadyExists { message, .. }
            | Self::Unauthorized { message, .. }
            | Self::InvalidRequest { message, .. }
            | Self::Internal { message, .. } => message,
        }
    }

    /// Suggested recovery action, delegated to [`ErrorCode::suggested_action`].
    #[must_use]
    pub const fn suggested_action(&self) -> &'static str {
        self.code().suggested_action()
    }
}

impl From<ValidationError> for LedgerError {
    #[track_caller]
    fn from(err: ValidationError) -> Self {
        InvalidRequestSnafu { message: err.to_string() }.build()
    }
}

impl From<CodecError> for LedgerError {
    #[track_caller]
    fn from(err: CodecError) -> Self {
        InternalSnafu { message: err.to_string() }.build()
    }
}

impl From<ConfigError> for LedgerError {
    #[track_caller]
    fn from(err: ConfigError) -> Self {
        InvalidRequestSnafu { message: err.to_string() }.build()
    }
}

impl From<crate::types::OwnerParseError> for LedgerError {
    #[track_caller]
    fn from(err: crate::types::OwnerParseError) -> Self {
        InvalidRequestSnafu { message: err.to_string() }.build()
    }
}
