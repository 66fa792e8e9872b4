//! Ghosts command implementation.

use super::{load_target, open_context};
use soupsync_engine::{AnyTarget, GhostReport, SyncDriver, TargetSpec};
use std::path::Path;

/// Cleans ghosts from the target's soup and rewrites the store unless
/// `dry_run`.
pub fn execute(
    target_path: &Path,
    store_path: &Path,
    remote_path: &Path,
    soup: Option<&str>,
    dry_run: bool,
) -> Result<GhostReport, Box<dyn std::error::Error>> {
    let spec = load_target(target_path)?;
    let soup = match (soup, &spec) {
        (Some(soup), _) => soup.to_string(),
        (None, TargetSpec::Refresh(config)) => config.soup_name().to_string(),
        (None, TargetSpec::Soql(_)) => return Err("Query targets need --soup".into()),
    };
    let target = AnyTarget::from_spec(spec)?;

    let (store, ctx) = open_context(store_path, remote_path)?;
    let report = SyncDriver::new(ctx).clean_ghosts(&target, &soup, dry_run)?;

    if !dry_run {
        store.save_json(store_path)?;
    }
    Ok(report)
}

/// Runs the ghosts command.
pub fn run(
    target_path: &Path,
    store_path: &Path,
    remote_path: &Path,
    soup: Option<&str>,
    dry_run: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if dry_run {
        println!("(dry run - no changes will be made)");
    }
    let report = execute(target_path, store_path, remote_path, soup, dry_run)?;

    println!("Ghost cleanup");
    println!("  Local records: {}", report.local_count);
    println!("  Ghosts:        {}", report.ghosts.len());
    println!("  Unverified:    {} (kept)", report.unverified.len());
    println!("  Deleted:       {}", report.deleted);
    for id in &report.ghosts {
        println!("    - {id}");
    }
    Ok(())
}
