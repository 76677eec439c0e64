//! Entity store and relationship consistency for gitledger.
//!
//! This crate sits on the ordered key-value store (`gitledger-store`) and
//! provides:
//!
//! - Per-kind sequence counters minting dense numeric IDs
//! - Keyed entity storage over big-endian ID keys
//! - Per-owner repository name indexes and global name/address lookups
//! - Polymorphic repository ownership with transfer
//! - Pagination over key prefixes and embedded ID lists
//! - The [`Ledger`] mutation and query surfaces
//!
//! # Quick Start
//!
//! ```
//! use gitledger_state::{Ledger, PageRequest};
//! use gitledger_types::{OwnerRef, messages::{CreateRepository, CreateUser}};
//!
//! let ledger = Ledger::in_memory();
//! ledger.create_user(CreateUser::builder().creator("gitopia1alice").username("alice").build())?;
//! let id = ledger.create_repository(
//!     CreateRepository::builder()
//!         .creator("gitopia1alice")
//!         .name("alpha")
//!         .owner(OwnerRef::User("gitopia1alice".into()))
//!         .build(),
//! )?;
//! let page = ledger.user_repositories(&"gitopia1alice".into(), &PageRequest::default())?;
//! assert_eq!(page.items[0].id, id);
//! # Ok::<(), gitledger_types::LedgerError>(())
//! ```

#![deny(unsafe_code)]

pub mod clock;
pub mod collections;
pub mod entity;
mod error;
pub mod keys;
mod ledger;
pub mod names;
pub mod owner;
pub mod pagination;
mod query;
pub mod sequence;

pub use clock::{Clock, ManualClock, SystemClock};
pub use entity::{EntityStore, StoredEntity};
pub use ledger::Ledger;
pub use names::{AddressIndex, NameIndex, WhoisIndex};
pub use owner::OwnerRecord;
pub use pagination::{Page, PageRequest};
pub use sequence::SequenceAllocator;
