//! Core types, records and errors for gitledger.
//!
//! This crate provides the foundational types used throughout the ledger:
//! - Identifier newtypes for every entity kind
//! - The polymorphic repository owner reference
//! - Persisted entity records and mutation requests
//! - Configuration, validation and the postcard codec
//! - Error types using snafu

pub mod codec;
pub mod config;
pub mod entities;
pub mod error;
pub mod messages;
pub mod types;
pub mod validation;

// Re-export commonly used types at crate root
pub use codec::{CodecError, decode, encode};
pub use config::{ConfigError, LedgerConfig, PaginationConfig, RewardsConfig, ValidationConfig};
pub use entities::{
    Comment, DEFAULT_BRANCH, Organization, PullRequest, PullRequestRef, Repository, Reward, User,
};
pub use error::{ErrorCode, LedgerError, Result};
pub use types::*;
pub use validation::ValidationError;
