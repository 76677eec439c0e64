//! Shared test utilities for gitledger crates.
//!
//! This crate provides common test helpers to reduce boilerplate across test modules:
//!
//! - [`TestDir`] - Managed temporary directory with path helpers
//! - [`TestLedger`] - In-memory ledger with a manual clock and setup shorthands
//! - [`test_ledger_config`] - Default ledger configuration for tests
//! - [`init_test_tracing`] - Route `tracing` output through the test harness
//! - [`strategies`] - Proptest generators for domain values

#![deny(unsafe_code)]

mod test_dir;
pub use test_dir::TestDir;

mod config;
pub use config::{TEST_EVALUATOR, test_ledger_config};

mod fixtures;
pub use fixtures::{START_TIME, TestLedger};

mod logging;
pub use logging::init_test_tracing;

pub mod strategies;
