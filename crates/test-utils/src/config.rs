//! Test configuration helpers.

use gitledger_types::{Address, LedgerConfig, PaginationConfig, RewardsConfig};

/// Address configured as the reward evaluator by [`test_ledger_config`].
pub const TEST_EVALUATOR: &str = "gitopia1evaluator";

/// Returns a ledger configuration suitable for tests.
///
/// - `pagination.default_limit`: 5 (so defaulted pages split small fixtures)
/// - `pagination.max_limit`: 50
/// - `rewards.evaluator`: [`TEST_EVALUATOR`]
#[must_use]
pub fn test_ledger_config() -> LedgerConfig {
    LedgerConfig {
        pagination: PaginationConfig { default_limit: 5, max_limit: 50 },
        rewards: RewardsConfig { evaluator: Some(Address::new(TEST_EVALUATOR)) },
        ..LedgerConfig::default()
    }
}
