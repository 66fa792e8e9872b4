//! Running targets against a store.

use crate::config::DEFAULT_BATCH_SIZE;
use crate::context::SyncContext;
use crate::enumerate::all_local_ids;
use crate::error::{SyncError, SyncResult};
use crate::target::SyncDownTarget;
use serde_json::Value;
use soupsync_protocol::max_timestamp;
use std::collections::HashSet;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Statistics of a completed sync down.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// Pages fetched, including empty ones.
    pub pages: usize,
    /// Records written to the soup.
    pub records: usize,
    /// Latest modification timestamp seen, in milliseconds.
    pub max_timestamp: Option<i64>,
    /// Wall time of the run.
    pub duration: Duration,
}

/// Outcome of a ghost cleanup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GhostReport {
    /// Number of local records examined.
    pub local_count: usize,
    /// Local ids confirmed absent remotely, in store order.
    pub ghosts: Vec<String>,
    /// Local ids whose existence could not be checked. Never deleted.
    pub unverified: Vec<String>,
    /// Records actually deleted.
    pub deleted: usize,
}

/// Drives sync-down targets to completion.
#[derive(Debug, Clone)]
pub struct SyncDriver {
    ctx: SyncContext,
}

impl SyncDriver {
    /// Creates a driver over `ctx`.
    pub fn new(ctx: SyncContext) -> Self {
        Self { ctx }
    }

    /// Returns the context targets run in.
    pub fn context(&self) -> &SyncContext {
        &self.ctx
    }

    /// Fetches every page of `target` and upserts it into `soup`.
    ///
    /// A failing page aborts the run and pages already written stay
    /// written. The target is left positioned before the failed page:
    /// [`SyncDownTarget::continue_fetch`] later fetches it again, whether
    /// the fetch or the store write failed. A failed write of the first
    /// page resets the target.
    pub fn sync_down(
        &self,
        target: &mut dyn SyncDownTarget,
        soup: &str,
        max_timestamp: i64,
    ) -> SyncResult<SyncStats> {
        let started = Instant::now();
        let mut stats = SyncStats::default();

        let first = target.start_fetch(&self.ctx, max_timestamp)?;
        if let Err(err) = self.write_page(target, soup, &first, &mut stats) {
            warn!(soup, error = %err, "first page not stored, run abandoned");
            target.reset();
            return Err(err);
        }
        loop {
            let checkpoint = target.checkpoint();
            let Some(page) = target.continue_fetch(&self.ctx)? else {
                break;
            };
            if let Err(err) = self.write_page(target, soup, &page, &mut stats) {
                warn!(soup, page = stats.pages - 1, error = %err, "page not stored, target rewound");
                target.rewind(checkpoint);
                return Err(err);
            }
        }

        stats.duration = started.elapsed();
        info!(
            soup,
            query_type = %target.query_type(),
            pages = stats.pages,
            records = stats.records,
            elapsed_ms = stats.duration.as_millis() as u64,
            "sync down complete"
        );
        Ok(stats)
    }

    fn write_page(
        &self,
        target: &dyn SyncDownTarget,
        soup: &str,
        records: &[Value],
        stats: &mut SyncStats,
    ) -> SyncResult<()> {
        stats.pages += 1;
        if records.is_empty() {
            return Ok(());
        }
        stats.records += self
            .ctx
            .store()
            .upsert(soup, target.id_field_name(), records)?;
        if let Some(latest) = max_timestamp(records, target.modification_date_field_name()) {
            stats.max_timestamp = Some(stats.max_timestamp.map_or(latest, |m| m.max(latest)));
        }
        debug!(soup, page = stats.pages - 1, records = records.len(), "page written");
        Ok(())
    }

    /// Deletes the records of `soup` that no longer exist remotely.
    ///
    /// Ids in batches whose check failed are reported as unverified and
    /// kept. With `dry_run`, nothing is deleted.
    pub fn clean_ghosts(
        &self,
        target: &dyn SyncDownTarget,
        soup: &str,
        dry_run: bool,
    ) -> SyncResult<GhostReport> {
        let store = self.ctx.store();
        let id_field = target.id_field_name();
        let local = all_local_ids(store, soup, id_field, DEFAULT_BATCH_SIZE)?;
        let local_set: HashSet<String> = local.iter().cloned().collect();

        let remote = target
            .list_remote_ids(&self.ctx, Some(&local_set))
            .ok_or_else(|| SyncError::Response("reconciliation returned no result".into()))?;
        let unverified = remote.unverified_ids();
        if !remote.is_complete() {
            warn!(
                soup,
                failed_batches = remote.failed_batches.len(),
                unverified = unverified.len(),
                "some ids could not be checked and are kept"
            );
        }

        let mut report = GhostReport {
            local_count: local.len(),
            ..GhostReport::default()
        };
        for id in local {
            if unverified.contains(&id) {
                report.unverified.push(id);
            } else if !remote.remote_ids.contains(&id) {
                report.ghosts.push(id);
            }
        }

        if !dry_run && !report.ghosts.is_empty() {
            report.deleted = store.delete_by_ids(soup, id_field, &report.ghosts)?;
        }
        info!(
            soup,
            local = report.local_count,
            ghosts = report.ghosts.len(),
            unverified = report.unverified.len(),
            deleted = report.deleted,
            dry_run,
            "ghost cleanup complete"
        );
        Ok(report)
    }
}
