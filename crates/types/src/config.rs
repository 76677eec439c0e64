//! Configuration types for gitledger.
//!
//! Configuration is loaded from TOML. All config structs validate their values
//! at construction time via fallible builders; post-deserialization validation
//! is available via `validate()` on each struct.

// The schemars `JsonSchema` derive expands to code using `.unwrap()`.
#![allow(clippy::disallowed_methods)]

use std::path::Path;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use snafu::{ResultExt, Snafu};

use crate::types::Address;

/// Configuration error.
#[derive(Debug, Snafu)]
pub enum ConfigError {
    /// A configuration value is invalid.
    #[snafu(display("invalid config: {message}"))]
    Validation {
        /// Description of the validation failure.
        message: String,
    },

    /// The configuration file could not be read.
    #[snafu(display("unable to read config {path}: {source}"))]
    Read {
        /// Path of the configuration file.
        path: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The configuration text is not valid TOML for [`LedgerConfig`].
    #[snafu(display("unable to parse config: {source}"))]
    Parse {
        /// The underlying TOML error.
        source: toml::de::Error,
    },
}

// ============================================================================
// Pagination
// ============================================================================

const fn default_page_limit() -> u64 {
    100
}

const fn default_max_page_limit() -> u64 {
    1000
}

/// Page-size limits for every paginated query.
///
/// # Example
///
/// ```no_run
/// # use gitledger_types::config::PaginationConfig;
/// let config = PaginationConfig::builder()
///     .default_limit(50)
///     .build()
///     .expect("valid pagination config");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PaginationConfig {
    /// Page size used when a request leaves `limit` at zero.
    ///
    /// Must be >= 1 and <= `max_limit`. Default: 100.
    #[serde(default = "default_page_limit")]
    pub default_limit: u64,
    /// Largest page size a request may ask for; larger limits are clamped.
    ///
    /// Must be >= 1. Default: 1000.
    #[serde(default = "default_max_page_limit")]
    pub max_limit: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self { default_limit: default_page_limit(), max_limit: default_max_page_limit() }
    }
}

#[bon::bon]
impl PaginationConfig {
    /// Creates a new pagination configuration with validation.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] if a limit is zero or the default
    /// exceeds the maximum.
    #[builder]
    pub fn new(
        #[builder(default = default_page_limit())] default_limit: u64,
        #[builder(default = default_max_page_limit())] max_limit: u64,
    ) -> Result<Self, ConfigError> {
        let config = Self { default_limit, max_limit };
        config.validate()?;
        Ok(config)
    }
}

impl PaginationConfig {
    /// Validates the configuration values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] if a limit is zero or the default
    /// exceeds the maximum.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_limit == 0 {
            return Err(ConfigError::Validation {
                message: "default_limit must be >= 1".to_string(),
            });
        }
        if self.max_limit == 0 {
            return Err(ConfigError::Validation { message: "max_limit must be >= 1".to_string() });
        }
        if self.default_limit > self.max_limit {
            return Err(ConfigError::Validation {
                message: format!(
                    "default_limit ({}) must not exceed max_limit ({})",
                    self.default_limit, self.max_limit
                ),
            });
        }
        Ok(())
    }

    /// Resolves a requested limit: zero means the default, anything above
    /// `max_limit` is clamped. The flag reports whether the default was used.
    pub fn effective_limit(&self, requested: u64) -> (u64, bool) {
        if requested == 0 {
            (self.default_limit, true)
        } else {
            (requested.min(self.max_limit), false)
        }
    }
}

// ============================================================================
// Validation
// ============================================================================

const fn default_max_name_bytes() -> usize {
    100
}

const fn default_max_branch_name_bytes() -> usize {
    63
}

const fn default_max_title_bytes() -> usize {
    255
}

const fn default_max_description_bytes() -> usize {
    20_000
}

const fn default_max_batch_size() -> usize {
    10
}

const fn default_max_label_removal_batch_size() -> usize {
    50
}

const fn default_max_comment_body_bytes() -> usize {
    20_000
}

/// Request-field limits enforced before any handler touches the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ValidationConfig {
    /// Maximum repository, organization or user name length in bytes. Default: 100.
    #[serde(default = "default_max_name_bytes")]
    pub max_name_bytes: usize,
    /// Maximum branch name length in bytes. Default: 63.
    #[serde(default = "default_max_branch_name_bytes")]
    pub max_branch_name_bytes: usize,
    /// Maximum pull request title length in bytes. Titles must be non-empty. Default: 255.
    #[serde(default = "default_max_title_bytes")]
    pub max_title_bytes: usize,
    /// Maximum description length in bytes. Default: 20000.
    #[serde(default = "default_max_description_bytes")]
    pub max_description_bytes: usize,
    /// Maximum reviewers, assignees or labels in one request. Default: 10.
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,
    /// Maximum labels removed in one request. Default: 50.
    #[serde(default = "default_max_label_removal_batch_size")]
    pub max_label_removal_batch_size: usize,
    /// Maximum comment body length in bytes. Default: 20000.
    #[serde(default = "default_max_comment_body_bytes")]
    pub max_comment_body_bytes: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_name_bytes: default_max_name_bytes(),
            max_branch_name_bytes: default_max_branch_name_bytes(),
            max_title_bytes: default_max_title_bytes(),
            max_description_bytes: default_max_description_bytes(),
            max_batch_size: default_max_batch_size(),
            max_label_removal_batch_size: default_max_label_removal_batch_size(),
            max_comment_body_bytes: default_max_comment_body_bytes(),
        }
    }
}

#[bon::bon]
impl ValidationConfig {
    /// Creates a new validation configuration with validation.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] if any limit is zero.
    #[builder]
    pub fn new(
        #[builder(default = default_max_name_bytes())] max_name_bytes: usize,
        #[builder(default = default_max_branch_name_bytes())] max_branch_name_bytes: usize,
        #[builder(default = default_max_title_bytes())] max_title_bytes: usize,
        #[builder(default = default_max_description_bytes())] max_description_bytes: usize,
        #[builder(default = default_max_batch_size())] max_batch_size: usize,
        #[builder(default = default_max_label_removal_batch_size())]
        max_label_removal_batch_size: usize,
        #[builder(default = default_max_comment_body_bytes())] max_comment_body_bytes: usize,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            max_name_bytes,
            max_branch_name_bytes,
            max_title_bytes,
            max_description_bytes,
            max_batch_size,
            max_label_removal_batch_size,
            max_comment_body_bytes,
        };
        config.validate()?;
        Ok(config)
    }
}

impl ValidationConfig {
    /// Validates the configuration values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] if any limit is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let limits = [
            ("max_name_bytes", self.max_name_bytes),
            ("max_branch_name_bytes", self.max_branch_name_bytes),
            ("max_title_bytes", self.max_title_bytes),
            ("max_description_bytes", self.max_description_bytes),
            ("max_batch_size", self.max_batch_size),
            ("max_label_removal_batch_size", self.max_label_removal_batch_size),
            ("max_comment_body_bytes", self.max_comment_body_bytes),
        ];
        for (name, value) in limits {
            if value == 0 {
                return Err(ConfigError::Validation { message: format!("{name} must be >= 1") });
            }
        }
        Ok(())
    }
}

// ============================================================================
// Rewards
// ============================================================================

/// Reward issuance settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema, bon::Builder)]
pub struct RewardsConfig {
    /// The only address allowed to create rewards. Without one, reward
    /// creation is always rejected.
    #[serde(default)]
    #[schemars(with = "Option<String>")]
    pub evaluator: Option<Address>,
}

impl RewardsConfig {
    /// Validates the configuration values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] if the evaluator address is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.evaluator.as_ref().is_some_and(Address::is_empty) {
            return Err(ConfigError::Validation {
                message: "rewards.evaluator must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

// ============================================================================
// Ledger
// ============================================================================

/// Top-level ledger configuration.
///
/// ```toml
/// [pagination]
/// default_limit = 100
///
/// [validation]
/// max_batch_size = 10
///
/// [rewards]
/// evaluator = "gitopia1evaluator"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema, bon::Builder)]
pub struct LedgerConfig {
    /// Page-size limits.
    #[serde(default)]
    #[builder(default)]
    pub pagination: PaginationConfig,
    /// Request-field limits.
    #[serde(default)]
    #[builder(default)]
    pub validation: ValidationConfig,
    /// Reward issuance.
    #[serde(default)]
    #[builder(default)]
    pub rewards: RewardsConfig,
}

impl LedgerConfig {
    /// Validates every section.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError::Validation`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.pagination.validate()?;
        self.validation.validate()?;
        self.rewards.validate()
    }

    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML and
    /// [`ConfigError::Validation`] for out-of-range values.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(input).context(ParseSnafu)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] if the file cannot be read, otherwise as
    /// [`LedgerConfig::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .context(ReadSnafu { path: path.display().to_string() })?;
        Self::from_toml_str(&contents)
    }
}
