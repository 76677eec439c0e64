//! Error types for the gitledger store.

use snafu::Snafu;

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during store operations.
#[derive(Debug, Snafu)]
pub enum Error {
    /// Write transaction already in progress.
    #[snafu(display("Write transaction already in progress"))]
    WriteTransactionInProgress,

    /// Keys must be non-empty.
    #[snafu(display("Empty key"))]
    EmptyKey,

    /// Key exceeds the configured maximum.
    #[snafu(display("Key too large: {size} bytes (max {max})"))]
    KeyTooLarge {
        /// Actual size of the key in bytes.
        size: usize,
        /// Maximum allowed size in bytes.
        max: usize,
    },

    /// Value exceeds the configured maximum.
    #[snafu(display("Value too large: {size} bytes (max {max})"))]
    ValueTooLarge {
        /// Actual size of the value in bytes.
        size: usize,
        /// Maximum allowed size in bytes.
        max: usize,
    },
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(Error::WriteTransactionInProgress.to_string(), "Write transaction already in progress");
        assert_eq!(
            Error::KeyTooLarge { size: 10, max: 4 }.to_string(),
            "Key too large: 10 bytes (max 4)"
        );
    }
}
