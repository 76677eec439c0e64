//! Paginated reads.
//!
//! Two sources are paginated:
//! - store-backed scans walk a key prefix; the continuation key is the
//!   prefix-relative key of the first entry not returned
//! - derived collections walk an ID list embedded in a parent record; the
//!   continuation key is the 8-byte big-endian index of the first item not
//!   returned
//!
//! A request selects either an `offset` or a `key`, never both. A zero
//! `limit` selects the configured default and implies a total count.

use gitledger_store::KvRead;
use gitledger_types::{
    PaginationConfig,
    error::{InvalidRequestSnafu, Result},
};

use crate::{
    error::StorageResultExt,
    keys::{decode_id, encode_id},
};

/// Page selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, bon::Builder)]
pub struct PageRequest {
    /// Continuation key from a previous page. Empty starts from the beginning.
    #[builder(default)]
    pub key: Vec<u8>,
    /// Number of items to skip. Only valid without `key`.
    #[builder(default)]
    pub offset: u64,
    /// Page size. Zero selects the configured default.
    #[builder(default)]
    pub limit: u64,
    /// Whether to report the total item count.
    #[builder(default)]
    pub count_total: bool,
    /// Walk in descending key order. Applies to store-backed scans.
    #[builder(default)]
    pub reverse: bool,
}

impl PageRequest {
    /// Continues from `key` with page size `limit`.
    pub fn after(key: Vec<u8>, limit: u64) -> Self {
        Self { key, limit, ..Self::default() }
    }

    fn check(&self) -> Result<()> {
        if self.offset > 0 && !self.key.is_empty() {
            return InvalidRequestSnafu {
                message: "only one of offset or key may be set in a page request",
            }
            .fail();
        }
        Ok(())
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// Items on this page, in iteration order.
    pub items: Vec<T>,
    /// Key to request the next page with; `None` on the last page.
    pub next_key: Option<Vec<u8>>,
    /// Total item count, when requested or when the limit was defaulted.
    pub total: Option<u64>,
}

impl<T> Page<T> {
    fn empty(total: Option<u64>) -> Self {
        Self { items: Vec::new(), next_key: None, total }
    }

    /// Maps every item, keeping the continuation state.
    ///
    /// # Errors
    ///
    /// Returns the first error `f` produces.
    pub fn try_map<U>(self, f: impl FnMut(T) -> Result<U>) -> Result<Page<U>> {
        Ok(Page {
            items: self.items.into_iter().map(f).collect::<Result<_>>()?,
            next_key: self.next_key,
            total: self.total,
        })
    }
}

/// Pages through every entry under `prefix`, decoding each with `decode`.
///
/// `decode` receives the full key and the value.
///
/// # Errors
///
/// Returns `InvalidRequest` for conflicting parameters, `Internal` if the scan
/// fails, or the first error `decode` produces.
pub fn paginate_store<T>(
    txn: &impl KvRead,
    prefix: &[u8],
    request: &PageRequest,
    config: &PaginationConfig,
    mut decode: impl FnMut(&[u8], &[u8]) -> Result<T>,
) -> Result<Page<T>> {
    request.check()?;
    let (limit, defaulted) = config.effective_limit(request.limit);
    let count_total = request.count_total || defaulted;

    let total = if count_total {
        Some(txn.iter_prefix(prefix).or_internal()?.count() as u64)
    } else {
        None
    };

    let entries = txn.iter_prefix(prefix).or_internal()?;
    let entries: Box<dyn Iterator<Item = (Vec<u8>, Vec<u8>)> + '_> =
        if request.reverse { Box::new(entries.rev()) } else { Box::new(entries) };

    let start = request.key.as_slice();
    let reverse = request.reverse;
    let mut remaining = entries
        .skip_while(|(key, _)| {
            let relative = &key[prefix.len()..];
            !start.is_empty() && if reverse { relative > start } else { relative < start }
        })
        .skip(usize::try_from(request.offset).unwrap_or(usize::MAX));

    let mut items = Vec::new();
    for (key, value) in remaining.by_ref() {
        items.push(decode(&key, &value)?);
        if items.len() as u64 >= limit {
            break;
        }
    }
    let next_key = remaining.next().map(|(key, _)| key[prefix.len()..].to_vec());

    Ok(Page { items, next_key, total })
}

/// Pages through an in-memory collection in its stored order.
///
/// # Errors
///
/// Returns `InvalidRequest` for conflicting parameters or a malformed key.
pub fn paginate_collection<T: Clone>(
    items: &[T],
    request: &PageRequest,
    config: &PaginationConfig,
) -> Result<Page<T>> {
    request.check()?;
    let (limit, defaulted) = config.effective_limit(request.limit);
    let total = (request.count_total || defaulted).then_some(items.len() as u64);

    let start = if request.key.is_empty() {
        request.offset
    } else {
        match decode_id(&request.key) {
            Some(index) => index,
            None => {
                return InvalidRequestSnafu {
                    message: format!("invalid pagination key of {} bytes", request.key.len()),
                }
                .fail();
            },
        }
    };

    let len = items.len() as u64;
    if start >= len {
        return Ok(Page::empty(total));
    }
    let end = start.saturating_add(limit).min(len);
    let next_key = (end < len).then(|| encode_id(end).to_vec());

    // start < end <= len, so both fit in usize.
    let window = &items[start as usize..end as usize];
    Ok(Page { items: window.to_vec(), next_key, total })
}
