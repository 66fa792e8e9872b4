//! # SoupSync Testkit
//!
//! Test utilities for SoupSync.
//!
//! This crate provides:
//! - Fixtures building seeded stores and remotes
//! - A store wrapper that fails on demand
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust
//! use soupsync_testkit::prelude::*;
//!
//! let fx = SyncFixture::accounts(&account_ids(3), &account_ids(2));
//! assert_eq!(fx.store.soup_len(ACCOUNTS_SOUP), Some(3));
//! assert_eq!(fx.remote.records(ACCOUNT).len(), 2);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod flaky;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::flaky::*;
    pub use crate::generators::*;
}

pub use fixtures::*;
pub use flaky::*;
pub use generators::*;
