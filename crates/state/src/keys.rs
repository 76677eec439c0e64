//! Key encoding for the storage layer.
//!
//! Every entity kind owns two namespaces in the ordered key space:
//! - `{Kind}-value-{id:8BE}` holds the encoded record
//! - `{Kind}-count-` holds the kind's sequence counter
//!
//! IDs are fixed-width big-endian so prefix scans visit records in ascending
//! numeric ID order. Secondary indexes live under `_idx:` and `Whois-value-`.

use gitledger_types::{Address, EntityKind};

/// Width of an encoded ID and of a pagination cursor.
pub const ID_WIDTH: usize = 8;

/// Encodes an ID as 8 big-endian bytes.
pub fn encode_id(id: u64) -> [u8; ID_WIDTH] {
    id.to_be_bytes()
}

/// Decodes an 8-byte big-endian ID.
///
/// Returns `None` unless `bytes` is exactly 8 bytes long.
pub fn decode_id(bytes: &[u8]) -> Option<u64> {
    let bytes: [u8; ID_WIDTH] = bytes.try_into().ok()?;
    Some(u64::from_be_bytes(bytes))
}

/// Key pattern generators for ledger records and indexes.
pub struct LedgerKeys;

impl LedgerKeys {
    // ========================================================================
    // Entity Keys
    // ========================================================================

    /// Prefix of every record of `kind`.
    ///
    /// Pattern: `{Kind}-value-`
    ///
    /// # Example
    /// ```
    /// use gitledger_state::keys::LedgerKeys;
    /// use gitledger_types::EntityKind;
    /// assert_eq!(LedgerKeys::entity_prefix(EntityKind::Repository), b"Repository-value-");
    /// ```
    pub fn entity_prefix(kind: EntityKind) -> Vec<u8> {
        format!("{}-value-", kind.as_str()).into_bytes()
    }

    /// Primary key of one record.
    ///
    /// Pattern: `{Kind}-value-{id:8BE}`
    pub fn entity_key(kind: EntityKind, id: u64) -> Vec<u8> {
        let mut key = Self::entity_prefix(kind);
        key.extend_from_slice(&encode_id(id));
        key
    }

    /// Parses the ID from a primary key of `kind`.
    pub fn parse_entity_key(kind: EntityKind, key: &[u8]) -> Option<u64> {
        key.strip_prefix(Self::entity_prefix(kind).as_slice()).and_then(decode_id)
    }

    /// Sequence counter key.
    ///
    /// Pattern: `{Kind}-count-`
    pub fn count_key(kind: EntityKind) -> Vec<u8> {
        format!("{}-count-", kind.as_str()).into_bytes()
    }

    // ========================================================================
    // Index Keys
    // ========================================================================

    /// Prefix of the global organization-name index.
    pub const WHOIS_PREFIX: &'static [u8] = b"Whois-value-";

    /// Whois entry for an organization name.
    ///
    /// Pattern: `Whois-value-{name}` → textual organization ID
    pub fn whois_key(name: &str) -> Vec<u8> {
        let mut key = Self::WHOIS_PREFIX.to_vec();
        key.extend_from_slice(name.as_bytes());
        key
    }

    /// Index key for user lookup by address.
    ///
    /// Pattern: `_idx:user:address:{address}` → user ID
    pub fn user_address_key(address: &Address) -> Vec<u8> {
        format!("_idx:user:address:{address}").into_bytes()
    }

    /// Index key for reward lookup by recipient.
    ///
    /// Pattern: `_idx:reward:recipient:{address}` → reward ID
    pub fn reward_recipient_key(recipient: &Address) -> Vec<u8> {
        format!("_idx:reward:recipient:{recipient}").into_bytes()
    }
}
