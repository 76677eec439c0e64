//! Ordered ID-list mutators.
//!
//! Lists embedded in parent records (an owner's repositories, a repository's
//! forks, a pull request's reviewers) keep append order. Removal splices out
//! the first match and leaves the rest in place.

use std::fmt::Display;

use gitledger_types::error::{AlreadyExistsSnafu, InvalidRequestSnafu, Result};
use tracing::warn;

/// Appends `value` unless it is already present.
///
/// # Errors
///
/// Returns `AlreadyExists` if `value` is in `list`; the list is unchanged.
pub fn append_unique<T: PartialEq + Display>(list: &mut Vec<T>, value: T, what: &str) -> Result<()> {
    if list.contains(&value) {
        return AlreadyExistsSnafu { message: format!("{what} {value} is already present") }
            .fail();
    }
    list.push(value);
    Ok(())
}

/// Removes the first occurrence of `value`.
///
/// A missing value means the list disagrees with the records that point at
/// it. That is reported, not repaired.
///
/// # Errors
///
/// Returns `InvalidRequest` if `value` is not in `list`.
pub fn remove_by_value<T: PartialEq + Display>(list: &mut Vec<T>, value: &T, what: &str) -> Result<()> {
    match list.iter().position(|item| item == value) {
        Some(index) => {
            list.remove(index);
            Ok(())
        },
        None => {
            warn!(what, %value, "value missing from list it should belong to");
            InvalidRequestSnafu { message: format!("{what} {value} is not present") }.fail()
        },
    }
}

/// Checks that none of `values` is already in `list`.
///
/// # Errors
///
/// Returns `AlreadyExists` naming the first value found.
pub fn ensure_absent<T: PartialEq + Display>(list: &[T], values: &[T], what: &str) -> Result<()> {
    match values.iter().find(|value| list.contains(value)) {
        Some(value) => {
            AlreadyExistsSnafu { message: format!("{what} {value} is already present") }.fail()
        },
        None => Ok(()),
    }
}

/// Checks that every one of `values` is in `list`.
///
/// # Errors
///
/// Returns `InvalidRequest` naming the first value missing.
pub fn ensure_present<T: PartialEq + Display>(list: &[T], values: &[T], what: &str) -> Result<()> {
    match values.iter().find(|value| !list.contains(value)) {
        Some(value) => {
            InvalidRequestSnafu { message: format!("{what} {value} is not present") }.fail()
        },
        None => Ok(()),
    }
}
