//! Test fixtures and store/remote helpers.
//!
//! Provides convenience functions for setting up seeded stores and remotes
//! for common sync scenarios.

use serde_json::{json, Value};
use soupsync_engine::{
    MemoryRemote, RefreshTarget, RefreshTargetConfig, SyncContext, SyncDriver,
};
use soupsync_store::{InMemoryStore, LocalStore};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

/// Soup used by the account fixtures.
pub const ACCOUNTS_SOUP: &str = "accounts";

/// Remote object type used by the account fixtures.
pub const ACCOUNT: &str = "Account";

/// Modification date carried by every remote fixture record.
pub const FIXTURE_MODIFIED: &str = "2016-05-10T18:45:12.000+0000";

/// Returns the `i`-th account id, 18 characters like a remote id.
pub fn account_id(i: usize) -> String {
    format!("001{i:015}")
}

/// Returns the first `n` account ids, in order.
pub fn account_ids(n: usize) -> Vec<String> {
    (0..n).map(account_id).collect()
}

/// Returns a local account record holding only its id and a stale name.
pub fn local_account(id: &str) -> Value {
    json!({"Id": id, "Name": "stale"})
}

/// Returns a remote account record.
pub fn remote_account(id: &str) -> Value {
    json!({
        "Id": id,
        "Name": format!("Account {id}"),
        "Industry": "Energy",
        "LastModifiedDate": FIXTURE_MODIFIED,
    })
}

/// Creates a store with soup `soup` holding `records`.
pub fn seeded_store(soup: &str, id_field: &str, records: &[Value]) -> Arc<InMemoryStore> {
    let store = Arc::new(InMemoryStore::new());
    store.register_soup(soup);
    store
        .upsert(soup, id_field, records)
        .expect("Failed to seed store");
    store
}

/// Creates a remote serving `records` as `object_type`.
pub fn seeded_remote(object_type: &str, records: Vec<Value>) -> Arc<MemoryRemote> {
    Arc::new(MemoryRemote::new().with_records(object_type, records))
}

/// Returns the refresh target configuration used with the account
/// fixtures.
pub fn accounts_config(batch_size: usize) -> RefreshTargetConfig {
    RefreshTargetConfig::new(["Id", "Name", "Industry", "LastModifiedDate"], ACCOUNT, ACCOUNTS_SOUP)
        .with_batch_size(batch_size)
}

/// Returns a refresh target over the account fixtures.
pub fn accounts_target(batch_size: usize) -> RefreshTarget {
    RefreshTarget::new(accounts_config(batch_size)).expect("Invalid fixture config")
}

/// A seeded store and remote sharing one context.
pub struct SyncFixture {
    /// The local store.
    pub store: Arc<InMemoryStore>,
    /// The remote.
    pub remote: Arc<MemoryRemote>,
    /// Context over `store` and `remote`.
    pub ctx: SyncContext,
}

impl SyncFixture {
    /// Seeds `local_ids` into the accounts soup and `remote_ids` into the
    /// remote account object.
    pub fn accounts(local_ids: &[String], remote_ids: &[String]) -> Self {
        let local: Vec<Value> = local_ids.iter().map(|id| local_account(id)).collect();
        let remote = remote_ids.iter().map(|id| remote_account(id)).collect();
        Self::new(
            seeded_store(ACCOUNTS_SOUP, "Id", &local),
            seeded_remote(ACCOUNT, remote),
        )
    }

    /// Wraps an existing store and remote.
    pub fn new(store: Arc<InMemoryStore>, remote: Arc<MemoryRemote>) -> Self {
        let ctx = SyncContext::new(store.clone(), remote.clone());
        Self { store, remote, ctx }
    }

    /// Returns a driver over the fixture context.
    pub fn driver(&self) -> SyncDriver {
        SyncDriver::new(self.ctx.clone())
    }

    /// Returns the ids held in the accounts soup, in store order.
    pub fn local_ids(&self) -> Vec<String> {
        self.store
            .records(ACCOUNTS_SOUP)
            .expect("Accounts soup missing")
            .iter()
            .filter_map(|record| record.get("Id").and_then(Value::as_str))
            .map(str::to_string)
            .collect()
    }
}

/// A store snapshot file in a temporary directory.
pub struct TempStoreFile {
    /// Path of the snapshot.
    pub path: PathBuf,
    /// The temporary directory (kept alive to prevent cleanup).
    _temp_dir: TempDir,
}

impl TempStoreFile {
    /// Saves `store` to a fresh temporary file.
    pub fn save(store: &InMemoryStore) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("store.json");
        store.save_json(&path).expect("Failed to save store");
        Self {
            path,
            _temp_dir: temp_dir,
        }
    }

    /// Loads the snapshot back.
    pub fn load(&self) -> InMemoryStore {
        InMemoryStore::load_json(&self.path).expect("Failed to load store")
    }
}
