//! # SoupSync Engine
//!
//! Sync-down targets and reconciliation for SoupSync.
//!
//! This crate provides:
//! - The refresh target: re-fetch the records already held in a soup, one
//!   id batch per remote query, resumable page by page
//! - A query target fetching records modified after a timestamp
//! - Remote-existence reconciliation, reporting failed batches
//! - A driver that writes fetched pages into the store and removes ghosts
//! - HTTP transport abstraction and an in-memory remote
//!
//! ## Architecture
//!
//! A target is immutable configuration (`RefreshTargetConfig`) plus run
//! state (`PaginationState`). Each call receives a [`SyncContext`] holding
//! the local store and the transport; the target performs no I/O of its
//! own outside those calls.
//!
//! ## Key Invariants
//!
//! - A remote query never references more ids than the batch size
//! - Run state changes only after a page was fetched successfully
//! - `continue_fetch` on a run that is not in progress does no I/O
//! - Ids from failed reconciliation batches are never treated as deleted
//!
//! ## Example
//!
//! ```rust
//! use soupsync_engine::{MemoryRemote, RefreshTarget, RefreshTargetConfig, SyncContext, SyncDriver};
//! use soupsync_store::{InMemoryStore, LocalStore};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let store = Arc::new(InMemoryStore::new());
//! store.register_soup("accounts");
//! store.upsert("accounts", "Id", &[json!({"Id": "001A"})]).unwrap();
//!
//! let remote = Arc::new(
//!     MemoryRemote::new().with_records("Account", vec![json!({"Id": "001A", "Name": "Acme"})]),
//! );
//! let driver = SyncDriver::new(SyncContext::new(store.clone(), remote));
//!
//! let mut target = RefreshTarget::new(RefreshTargetConfig::new(["Id", "Name"], "Account", "accounts")).unwrap();
//! let stats = driver.sync_down(&mut target, "accounts", 0).unwrap();
//! assert_eq!(stats.records, 1);
//! assert_eq!(store.records("accounts").unwrap()[0]["Name"], "Acme");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod context;
mod driver;
mod enumerate;
mod error;
mod fetch;
mod http;
mod reconcile;
mod refresh;
mod soql;
mod state;
mod target;
mod transport;

pub use config::{
    QueryType, RefreshTargetConfig, SoqlTargetConfig, TargetSpec, DEFAULT_BATCH_SIZE,
    DEFAULT_ID_FIELD, DEFAULT_MODIFICATION_DATE_FIELD,
};
pub use context::SyncContext;
pub use driver::{GhostReport, SyncDriver, SyncStats};
pub use enumerate::{all_local_ids, enumerate_ids, IdPage};
pub use error::{SyncError, SyncResult};
pub use fetch::{fetch_query, fetch_records};
pub use http::{HttpClient, HttpTransport};
pub use reconcile::{list_remote_ids, BatchFailure, RemoteIdQuery, RemoteIdsReport};
pub use refresh::RefreshTarget;
pub use soql::SoqlTarget;
pub use state::{PaginationState, RunStatus};
pub use target::{AnyTarget, FetchCheckpoint, SyncDownTarget};
pub use transport::{MemoryRemote, SyncTransport};
