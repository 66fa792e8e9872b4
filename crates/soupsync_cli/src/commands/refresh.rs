//! Refresh command implementation.

use super::{load_target, open_context};
use soupsync_engine::{RefreshTarget, SyncDriver, SyncStats, TargetSpec};
use std::path::Path;
use tracing::info;

/// Runs a refresh target to completion and rewrites the store.
pub fn execute(
    target_path: &Path,
    store_path: &Path,
    remote_path: &Path,
    batch_size: Option<usize>,
) -> Result<SyncStats, Box<dyn std::error::Error>> {
    let TargetSpec::Refresh(mut config) = load_target(target_path)? else {
        return Err("The refresh command needs a refresh target".into());
    };
    if let Some(batch_size) = batch_size {
        config = config.with_batch_size(batch_size);
    }
    let soup = config.soup_name().to_string();
    let mut target = RefreshTarget::new(config)?;

    let (store, ctx) = open_context(store_path, remote_path)?;
    let stats = SyncDriver::new(ctx).sync_down(&mut target, &soup, 0)?;

    store.save_json(store_path)?;
    info!(path = %store_path.display(), "store saved");
    Ok(stats)
}

/// Runs the refresh command.
pub fn run(
    target_path: &Path,
    store_path: &Path,
    remote_path: &Path,
    batch_size: Option<usize>,
) -> Result<(), Box<dyn std::error::Error>> {
    let stats = execute(target_path, store_path, remote_path, batch_size)?;

    println!("Refresh complete");
    println!("  Pages:    {}", stats.pages);
    println!("  Records:  {}", stats.records);
    println!("  Duration: {:.1?}", stats.duration);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support;
    use soupsync_store::InMemoryStore;

    #[test]
    fn refreshes_and_saves_store() {
        let files = test_support::accounts(&["a", "b", "c"], &["a", "b", "c"]);

        let stats = execute(&files.target, &files.store, &files.remote, None).unwrap();
        assert_eq!(stats.pages, 2);
        assert_eq!(stats.records, 3);

        let saved = InMemoryStore::load_json(&files.store).unwrap();
        let records = saved.records("accounts").unwrap();
        assert!(records.iter().all(|r| r["Name"] == "fresh"));
    }

    #[test]
    fn batch_size_override() {
        let files = test_support::accounts(&["a", "b", "c"], &["a", "b", "c"]);
        let stats = execute(&files.target, &files.store, &files.remote, Some(1)).unwrap();
        assert_eq!(stats.pages, 3);
    }

    #[test]
    fn rejects_query_target() {
        let files = test_support::accounts(&["a"], &["a"]);
        std::fs::write(
            &files.target,
            r#"{"queryType":"soql","fieldlist":["Id"],"sobjectType":"Account"}"#,
        )
        .unwrap();
        assert!(execute(&files.target, &files.store, &files.remote, None).is_err());
    }

    #[test]
    fn store_untouched_on_failure() {
        let files = test_support::accounts(&["a"], &["a"]);
        let before = std::fs::read_to_string(&files.store).unwrap();
        assert!(execute(&files.target, &files.store, &files.remote, Some(0)).is_err());
        assert_eq!(std::fs::read_to_string(&files.store).unwrap(), before);
    }
}
