//! CLI command implementations.

pub mod ghosts;
pub mod inspect_target;
pub mod refresh;

use soupsync_engine::{MemoryRemote, SyncContext, TargetSpec};
use soupsync_store::InMemoryStore;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Reads and validates a persisted target.
pub fn load_target(path: &Path) -> Result<TargetSpec, Box<dyn std::error::Error>> {
    let json = fs::read_to_string(path)
        .map_err(|e| format!("Cannot read target {}: {e}", path.display()))?;
    Ok(TargetSpec::from_json(&json)?)
}

/// Opens the store snapshot and remote dataset as a sync context.
pub fn open_context(
    store_path: &Path,
    remote_path: &Path,
) -> Result<(Arc<InMemoryStore>, SyncContext), Box<dyn std::error::Error>> {
    let store = Arc::new(InMemoryStore::load_json(store_path)?);
    let remote_json = fs::read_to_string(remote_path)
        .map_err(|e| format!("Cannot read remote dataset {}: {e}", remote_path.display()))?;
    let remote = Arc::new(MemoryRemote::from_json(&remote_json)?);
    let ctx = SyncContext::new(store.clone(), remote);
    Ok((store, ctx))
}

#[cfg(test)]
pub(crate) mod test_support {
    use serde_json::json;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    /// Target, store and remote files for one account scenario.
    pub struct Files {
        /// Target JSON.
        pub target: PathBuf,
        /// Store snapshot.
        pub store: PathBuf,
        /// Remote dataset.
        pub remote: PathBuf,
        _dir: TempDir,
    }

    /// Writes a refresh target over `local` ids, with `remote` ids served
    /// remotely.
    pub fn accounts(local: &[&str], remote: &[&str]) -> Files {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("target.json");
        let store = dir.path().join("store.json");
        let remote_path = dir.path().join("remote.json");

        fs::write(
            &target,
            json!({
                "queryType": "refresh",
                "fieldlist": ["Id", "Name"],
                "sobjectType": "Account",
                "soupName": "accounts",
                "countIdsPerSoql": 2,
            })
            .to_string(),
        )
        .unwrap();
        let rows: Vec<_> = local.iter().map(|id| json!({"Id": id, "Name": "stale"})).collect();
        fs::write(&store, json!({"soups": {"accounts": rows}}).to_string()).unwrap();
        let records: Vec<_> = remote.iter().map(|id| json!({"Id": id, "Name": "fresh"})).collect();
        fs::write(&remote_path, json!({"Account": records}).to_string()).unwrap();

        Files {
            target,
            store,
            remote: remote_path,
            _dir: dir,
        }
    }
}
