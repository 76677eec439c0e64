//! Input validation for mutation request fields.
//!
//! All checks run before a handler reads the store, so a rejected request
//! never reaches the write path.
//!
//! ## Character Whitelists
//!
//! - Repository, organization and user names: `[a-zA-Z0-9._-]`, not `.` or `..`.
//! - Branch names: any non-whitespace characters.

use std::{collections::BTreeSet, fmt};

use crate::config::ValidationConfig;

/// Validation error with structured context.
///
/// Contains the specific constraint that was violated and the field name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// The field that failed validation.
    pub field: String,
    /// Description of the violated constraint.
    pub constraint: String,
}

impl ValidationError {
    fn new(field: &str, constraint: impl Into<String>) -> Self {
        Self { field: field.to_string(), constraint: constraint.into() }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.constraint)
    }
}

impl std::error::Error for ValidationError {}

fn check_length(
    field: &str,
    value: &str,
    min: usize,
    max: usize,
) -> Result<(), ValidationError> {
    if value.len() < min {
        return Err(if min == 1 {
            ValidationError::new(field, "must not be empty")
        } else {
            ValidationError::new(field, format!("length {} bytes is below minimum {min}", value.len()))
        });
    }
    if value.len() > max {
        return Err(ValidationError::new(
            field,
            format!("length {} bytes exceeds maximum {max} bytes", value.len()),
        ));
    }
    Ok(())
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')
}

/// Validates a repository, organization or user name.
///
/// Names must:
/// - Be non-empty
/// - Not exceed `config.max_name_bytes`
/// - Contain only `[a-zA-Z0-9._-]`
/// - Not be `.` or `..`
///
/// # Errors
///
/// Returns [`ValidationError`] naming `field` if any rule is violated.
pub fn validate_name(
    field: &str,
    name: &str,
    config: &ValidationConfig,
) -> Result<(), ValidationError> {
    check_length(field, name, 1, config.max_name_bytes)?;
    if name == "." || name == ".." {
        return Err(ValidationError::new(field, format!("{name:?} is reserved")));
    }
    if let Some(pos) = name.find(|c: char| !is_name_char(c)) {
        return Err(ValidationError::new(
            field,
            format!(
                "contains invalid character {:?} at byte offset {}; allowed: [a-zA-Z0-9._-]",
                name[pos..].chars().next().unwrap_or('\0'),
                pos
            ),
        ));
    }
    Ok(())
}

/// Validates a branch name: 1 to `config.max_branch_name_bytes` bytes, no whitespace.
///
/// # Errors
///
/// Returns [`ValidationError`] naming `field` if any rule is violated.
pub fn validate_branch_name(
    field: &str,
    branch: &str,
    config: &ValidationConfig,
) -> Result<(), ValidationError> {
    check_length(field, branch, 1, config.max_branch_name_bytes)?;
    if branch.chars().any(char::is_whitespace) {
        return Err(ValidationError::new(field, "must not contain whitespace"));
    }
    Ok(())
}

/// Validates a pull request title: 1 to `config.max_title_bytes` bytes.
///
/// # Errors
///
/// Returns [`ValidationError`] if the title is empty or too long.
pub fn validate_title(title: &str, config: &ValidationConfig) -> Result<(), ValidationError> {
    check_length("title", title, 1, config.max_title_bytes)
}

/// Validates a free-form description (may be empty).
///
/// # Errors
///
/// Returns [`ValidationError`] if the description exceeds `config.max_description_bytes`.
pub fn validate_description(
    description: &str,
    config: &ValidationConfig,
) -> Result<(), ValidationError> {
    check_length("description", description, 0, config.max_description_bytes)
}

/// Validates a comment body: 1 to `config.max_comment_body_bytes` bytes.
///
/// # Errors
///
/// Returns [`ValidationError`] if the body is empty or too long.
pub fn validate_comment_body(body: &str, config: &ValidationConfig) -> Result<(), ValidationError> {
    check_length("body", body, 1, config.max_comment_body_bytes)
}

/// Validates a merge commit sha: non-empty hexadecimal.
///
/// # Errors
///
/// Returns [`ValidationError`] if the sha is empty or not hex.
pub fn validate_commit_sha(sha: &str) -> Result<(), ValidationError> {
    if sha.is_empty() {
        return Err(ValidationError::new("merge_commit_sha", "must not be empty"));
    }
    if !sha.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ValidationError::new("merge_commit_sha", "must be hexadecimal"));
    }
    Ok(())
}

/// Validates one batch of collection entries (reviewers, assignees, labels).
///
/// A batch must be non-empty, hold at most `max` entries, and contain no
/// duplicates.
///
/// # Errors
///
/// Returns [`ValidationError`] naming `field` if any rule is violated.
pub fn validate_batch<T: Ord + fmt::Debug>(
    field: &str,
    items: &[T],
    max: usize,
) -> Result<(), ValidationError> {
    if items.is_empty() {
        return Err(ValidationError::new(field, "must not be empty"));
    }
    if items.len() > max {
        return Err(ValidationError::new(
            field,
            format!("{} entries exceeds maximum {max}", items.len()),
        ));
    }
    let mut seen = BTreeSet::new();
    for item in items {
        if !seen.insert(item) {
            return Err(ValidationError::new(field, format!("duplicate entry {item:?}")));
        }
    }
    Ok(())
}

/// Like [`validate_batch`], but an empty batch is allowed.
///
/// Used for the optional initial reviewers, assignees and labels of a new
/// pull request.
///
/// # Errors
///
/// Returns [`ValidationError`] naming `field` if the batch is too large or
/// contains duplicates.
pub fn validate_optional_batch<T: Ord + fmt::Debug>(
    field: &str,
    items: &[T],
    max: usize,
) -> Result<(), ValidationError> {
    if items.is_empty() {
        return Ok(());
    }
    validate_batch(field, items, max)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn config() -> ValidationConfig {
        ValidationConfig::default()
    }

    #[test]
    fn test_validate_name_accepts_typical_names() {
        for name in ["alpha", "my-repo", "repo_2", "v1.0", "A"] {
            validate_name("name", name, &config()).expect(name);
        }
    }

    #[test]
    fn test_validate_name_rejects() {
        let err = validate_name("name", "", &config()).unwrap_err();
        assert_eq!(err.constraint, "must not be empty");

        let err = validate_name("name", "has space", &config()).unwrap_err();
        assert!(err.constraint.contains("invalid character ' '"));

        assert!(validate_name("name", "..", &config()).is_err());
        assert!(validate_name("name", &"a".repeat(101), &config()).is_err());
        assert!(validate_name("name", &"a".repeat(100), &config()).is_ok());
    }

    #[test]
    fn test_validate_branch_name_bounds() {
        assert!(validate_branch_name("branch", "main", &config()).is_ok());
        assert!(validate_branch_name("branch", "feature/x", &config()).is_ok());
        assert!(validate_branch_name("branch", "", &config()).is_err());
        assert!(validate_branch_name("branch", "a b", &config()).is_err());
        assert!(validate_branch_name("branch", &"b".repeat(63), &config()).is_ok());
        assert!(validate_branch_name("branch", &"b".repeat(64), &config()).is_err());
    }

    #[test]
    fn test_validate_title_and_description() {
        assert!(validate_title("", &config()).is_err());
        assert!(validate_title(&"t".repeat(255), &config()).is_ok());
        assert!(validate_title(&"t".repeat(256), &config()).is_err());
        assert!(validate_description("", &config()).is_ok());
        assert!(validate_description(&"d".repeat(20_001), &config()).is_err());
    }

    #[test]
    fn test_validate_commit_sha() {
        assert!(validate_commit_sha("a1b2c3").is_ok());
        assert!(validate_commit_sha("").is_err());
        assert!(validate_commit_sha("xyz").is_err());
    }

    #[test]
    fn test_validate_batch() {
        assert!(validate_batch::<u64>("labels", &[], 10).is_err());
        assert!(validate_batch("labels", &[1u64, 2, 3], 10).is_ok());
        let err = validate_batch("labels", &[1u64, 2, 1], 10).unwrap_err();
        assert!(err.constraint.contains("duplicate"));
        let many: Vec<u64> = (0..11).collect();
        assert!(validate_batch("labels", &many, 10).is_err());
        assert!(validate_optional_batch::<u64>("labels", &[], 10).is_ok());
    }

    proptest! {
        #[test]
        fn prop_distinct_batches_within_limit_pass(items in prop::collection::btree_set(any::<u64>(), 1..=10)) {
            let items: Vec<u64> = items.into_iter().collect();
            prop_assert!(validate_batch("reviewers", &items, 10).is_ok());
        }

        #[test]
        fn prop_names_over_limit_fail(len in 101usize..300) {
            prop_assert!(validate_name("name", &"x".repeat(len), &ValidationConfig::default()).is_err());
        }
    }
}
