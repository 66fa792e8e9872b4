//! # SoupSync Store
//!
//! Local soup store trait and implementations for SoupSync.
//!
//! A *soup* is a named collection of JSON records kept on the device. This
//! crate provides the narrow store surface the sync engine needs:
//! counting and paging over a projected query, plus the upsert/delete
//! calls used when applying a sync.
//!
//! ## Design Principles
//!
//! - Query results are ordered by soup entry id, so paging is stable
//! - The store never talks to the network
//! - Stores must be `Send + Sync` and use interior mutability
//!
//! ## Available Stores
//!
//! - [`InMemoryStore`] - For tests, tooling and ephemeral caches
//!
//! ## Example
//!
//! ```rust
//! use soupsync_store::{InMemoryStore, LocalStore, SmartQuery};
//! use serde_json::json;
//!
//! let store = InMemoryStore::new();
//! store.register_soup("accounts");
//! store.upsert("accounts", "Id", &[json!({"Id": "001A", "Name": "Acme"})]).unwrap();
//!
//! let query = SmartQuery::select("accounts", ["Id"], 10);
//! assert_eq!(store.count_query(&query).unwrap(), 1);
//! assert_eq!(store.query(&query, 0).unwrap(), vec![vec![json!("001A")]]);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod memory;
mod query;
mod store;

pub use error::{StoreError, StoreResult};
pub use memory::InMemoryStore;
pub use query::{extract_path, SmartQuery};
pub use store::LocalStore;
