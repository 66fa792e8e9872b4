//! Refresh target: re-fetch the records already held in a soup.
//!
//! A refresh target is for soups populated directly from the server by the
//! application. Records may have been saved at different times, so there is
//! no meaningful modification watermark; instead every local id is sent
//! back to the server, one batch per call.
//!
//! Progress is measured against the local record count taken when the run
//! starts. The remote may return fewer records than ids (records deleted
//! on the server) without disturbing the page arithmetic.

use crate::config::{QueryType, RefreshTargetConfig, TargetSpec};
use crate::context::SyncContext;
use crate::enumerate::enumerate_ids;
use crate::error::SyncResult;
use crate::fetch::fetch_records;
use crate::reconcile::{self, RemoteIdQuery, RemoteIdsReport};
use crate::state::{PaginationState, RunStatus};
use crate::target::{FetchCheckpoint, SyncDownTarget};
use serde_json::Value;
use soupsync_protocol::IdQuery;
use std::collections::HashSet;
use tracing::{debug, info};

/// A sync-down target re-fetching the records of a soup by id.
#[derive(Debug, Clone)]
pub struct RefreshTarget {
    config: RefreshTargetConfig,
    state: PaginationState,
}

impl RefreshTarget {
    /// Creates a target from a validated configuration.
    pub fn new(config: RefreshTargetConfig) -> SyncResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            state: PaginationState::new(),
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &RefreshTargetConfig {
        &self.config
    }

    /// Returns the run state.
    pub fn state(&self) -> &PaginationState {
        &self.state
    }

    /// Abandons any run in progress.
    pub fn reset(&mut self) {
        self.state.reset();
    }

    /// Fetches page 0, starting a new run.
    ///
    /// `max_timestamp` is ignored: refresh targets have no timestamp
    /// semantics.
    pub fn start_fetch(&mut self, ctx: &SyncContext, _max_timestamp: i64) -> SyncResult<Vec<Value>> {
        self.fetch_page(ctx, 0)
    }

    /// Fetches the next page if the run is in progress.
    ///
    /// Returns `Ok(None)` without any I/O otherwise.
    pub fn continue_fetch(&mut self, ctx: &SyncContext) -> SyncResult<Option<Vec<Value>>> {
        let status = self.state.status();
        if !status.is_in_progress() {
            return Ok(None);
        }
        self.fetch_page(ctx, status.page_index()).map(Some)
    }

    /// Determines which of `local_ids` still exist remotely.
    pub fn list_remote_ids(
        &self,
        ctx: &SyncContext,
        local_ids: Option<&HashSet<String>>,
    ) -> Option<RemoteIdsReport> {
        reconcile::list_remote_ids(ctx, self.remote_id_query(), local_ids)
    }

    fn remote_id_query(&self) -> RemoteIdQuery<'_> {
        RemoteIdQuery {
            object_type: self.config.object_type(),
            id_field: self.config.id_field_name(),
            batch_size: self.config.batch_size(),
        }
    }

    /// Fetches page `page` and commits the new state once it succeeded.
    fn fetch_page(&mut self, ctx: &SyncContext, page: usize) -> SyncResult<Vec<Value>> {
        let config = &self.config;
        let id_page = enumerate_ids(
            ctx.store(),
            config.soup_name(),
            config.id_field_name(),
            page,
            config.batch_size(),
        )?;
        let total_count = id_page.total_count.unwrap_or(self.state.total_count());
        let asked = id_page.ids.len();

        let records = if id_page.ids.is_empty() {
            Vec::new()
        } else {
            let query = IdQuery::new(
                config.field_list(),
                config.object_type(),
                config.id_field_name(),
                id_page.ids,
            )?;
            fetch_records(ctx, &query.to_soql())?
        };

        self.state
            .advance(page, total_count, config.batch_size(), records.len());

        debug!(
            soup = config.soup_name(),
            page,
            asked,
            fetched = records.len(),
            total = total_count,
            "refresh page fetched"
        );
        if self.state.status() == RunStatus::Complete {
            info!(
                soup = config.soup_name(),
                pages = page + 1,
                total = total_count,
                "refresh run complete"
            );
        }
        Ok(records)
    }
}

impl SyncDownTarget for RefreshTarget {
    fn query_type(&self) -> QueryType {
        QueryType::Refresh
    }

    fn id_field_name(&self) -> &str {
        self.config.id_field_name()
    }

    fn modification_date_field_name(&self) -> &str {
        self.config.modification_date_field_name()
    }

    fn total_size(&self) -> usize {
        self.state.total_count()
    }

    fn start_fetch(&mut self, ctx: &SyncContext, max_timestamp: i64) -> SyncResult<Vec<Value>> {
        RefreshTarget::start_fetch(self, ctx, max_timestamp)
    }

    fn continue_fetch(&mut self, ctx: &SyncContext) -> SyncResult<Option<Vec<Value>>> {
        RefreshTarget::continue_fetch(self, ctx)
    }

    fn checkpoint(&self) -> FetchCheckpoint {
        FetchCheckpoint::Pagination(self.state.clone())
    }

    fn rewind(&mut self, checkpoint: FetchCheckpoint) {
        if let FetchCheckpoint::Pagination(state) = checkpoint {
            self.state = state;
        }
    }

    fn reset(&mut self) {
        RefreshTarget::reset(self);
    }

    fn list_remote_ids(
        &self,
        ctx: &SyncContext,
        local_ids: Option<&HashSet<String>>,
    ) -> Option<RemoteIdsReport> {
        RefreshTarget::list_remote_ids(self, ctx, local_ids)
    }

    fn to_spec(&self) -> TargetSpec {
        TargetSpec::Refresh(self.config.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SyncError;
    use crate::transport::MemoryRemote;
    use serde_json::json;
    use soupsync_protocol::RestResponse;
    use soupsync_store::{InMemoryStore, LocalStore};
    use std::sync::Arc;

    struct Fixture {
        store: Arc<InMemoryStore>,
        remote: Arc<MemoryRemote>,
        ctx: SyncContext,
    }

    fn fixture(local: usize, batch_size: usize) -> (Fixture, RefreshTarget) {
        let ids: Vec<String> = (0..local).map(|i| format!("001{i:05}")).collect();

        let store = Arc::new(InMemoryStore::new());
        store.register_soup("accounts");
        let local_records: Vec<Value> = ids.iter().map(|id| json!({"Id": id})).collect();
        store.upsert("accounts", "Id", &local_records).unwrap();

        let remote_records = ids
            .iter()
            .map(|id| json!({"Id": id, "Name": format!("name {id}")}))
            .collect();
        let remote = Arc::new(MemoryRemote::new().with_records("Account", remote_records));

        let ctx = SyncContext::new(store.clone(), remote.clone());
        let target = RefreshTarget::new(
            RefreshTargetConfig::new(["Id", "Name"], "Account", "accounts")
                .with_batch_size(batch_size),
        )
        .unwrap();
        (Fixture { store, remote, ctx }, target)
    }

    fn ids_of(records: &[Value]) -> Vec<String> {
        soupsync_protocol::record_ids(records, "Id")
    }

    #[test]
    fn twelve_hundred_ids_in_three_pages() {
        let (fx, mut target) = fixture(1200, 500);

        let page0 = target.start_fetch(&fx.ctx, 0).unwrap();
        assert_eq!(page0.len(), 500);
        assert_eq!(ids_of(&page0)[0], "00100000");
        assert_eq!(target.state().status(), RunStatus::InProgress { page: 1 });
        assert_eq!(target.state().total_count(), 1200);

        let page1 = target.continue_fetch(&fx.ctx).unwrap().unwrap();
        assert_eq!(page1.len(), 500);
        assert_eq!(ids_of(&page1)[0], "00100500");
        assert_eq!(target.state().status(), RunStatus::InProgress { page: 2 });

        let page2 = target.continue_fetch(&fx.ctx).unwrap().unwrap();
        assert_eq!(page2.len(), 200);
        assert_eq!(ids_of(&page2)[199], "00101199");
        assert_eq!(target.state().status(), RunStatus::Complete);

        assert!(target.continue_fetch(&fx.ctx).unwrap().is_none());
        assert_eq!(fx.remote.request_count(), 3);
    }

    #[test]
    fn continue_before_start_is_a_noop() {
        let (fx, mut target) = fixture(10, 5);
        assert!(target.continue_fetch(&fx.ctx).unwrap().is_none());
        assert_eq!(target.state(), &PaginationState::new());
        assert_eq!(fx.remote.request_count(), 0);
    }

    #[test]
    fn empty_soup_completes_without_remote_call() {
        let (fx, mut target) = fixture(0, 5);
        let records = target.start_fetch(&fx.ctx, 0).unwrap();
        assert!(records.is_empty());
        assert_eq!(target.state().status(), RunStatus::Complete);
        assert_eq!(fx.remote.request_count(), 0);
    }

    #[test]
    fn fetches_full_field_list() {
        let (fx, mut target) = fixture(1, 5);
        let records = target.start_fetch(&fx.ctx, 0).unwrap();
        assert_eq!(records, vec![json!({"Id": "00100000", "Name": "name 00100000"})]);
    }

    #[test]
    fn total_count_is_frozen_during_run() {
        let (fx, mut target) = fixture(4, 2);
        target.start_fetch(&fx.ctx, 0).unwrap();

        fx.store
            .upsert("accounts", "Id", &[json!({"Id": "00199999"})])
            .unwrap();

        target.continue_fetch(&fx.ctx).unwrap().unwrap();
        assert_eq!(target.state().total_count(), 4);
        assert_eq!(target.state().status(), RunStatus::Complete);
    }

    #[test]
    fn remote_deletions_do_not_stall_the_run() {
        let (fx, mut target) = fixture(4, 2);
        fx.remote.delete("Account", "Id", &["00100003"]);

        target.start_fetch(&fx.ctx, 0).unwrap();
        let page1 = target.continue_fetch(&fx.ctx).unwrap().unwrap();
        assert_eq!(page1.len(), 1);
        // 2 * 1 + 1 < 4, so one more (empty) page closes the run.
        assert_eq!(target.state().status(), RunStatus::InProgress { page: 2 });

        let page2 = target.continue_fetch(&fx.ctx).unwrap().unwrap();
        assert!(page2.is_empty());
        assert_eq!(target.state().status(), RunStatus::Complete);
        assert_eq!(fx.remote.request_count(), 2);
    }

    #[test]
    fn failed_page_leaves_state_unchanged() {
        let (fx, mut target) = fixture(10, 4);
        target.start_fetch(&fx.ctx, 0).unwrap();
        let before = target.state().clone();

        fx.remote.fail_call(1);
        let err = target.continue_fetch(&fx.ctx).unwrap_err();
        assert!(matches!(err, SyncError::Transport { .. }));
        assert_eq!(target.state(), &before);
        assert_eq!(target.state().status(), RunStatus::InProgress { page: 1 });

        let retried = target.continue_fetch(&fx.ctx).unwrap().unwrap();
        assert_eq!(ids_of(&retried)[0], "00100004");
    }

    #[test]
    fn malformed_response_is_surfaced() {
        let (fx, mut target) = fixture(3, 5);
        fx.remote
            .push_response(RestResponse::new(200, br#"{"done": true}"#.to_vec()));
        let err = target.start_fetch(&fx.ctx, 0).unwrap_err();
        assert!(matches!(err, SyncError::Response(_)));
        assert_eq!(target.state().status(), RunStatus::NotStarted);
    }

    #[test]
    fn invalid_local_id_is_invalid_input() {
        let (fx, mut target) = fixture(0, 5);
        fx.store
            .upsert("accounts", "Id", &[json!({"Id": "bad'id"})])
            .unwrap();
        let err = target.start_fetch(&fx.ctx, 0).unwrap_err();
        assert!(matches!(err, SyncError::InvalidInput(_)));
        assert_eq!(fx.remote.request_count(), 0);
    }

    #[test]
    fn start_fetch_restarts_a_run() {
        let (fx, mut target) = fixture(6, 2);
        target.start_fetch(&fx.ctx, 0).unwrap();
        target.continue_fetch(&fx.ctx).unwrap();
        assert_eq!(target.state().status(), RunStatus::InProgress { page: 2 });

        let again = target.start_fetch(&fx.ctx, 123).unwrap();
        assert_eq!(ids_of(&again), vec!["00100000", "00100001"]);
        assert_eq!(target.state().status(), RunStatus::InProgress { page: 1 });
    }

    #[test]
    fn rewind_refetches_the_same_page() {
        let (fx, mut target) = fixture(6, 2);
        target.start_fetch(&fx.ctx, 0).unwrap();
        let checkpoint = target.checkpoint();

        let page1 = target.continue_fetch(&fx.ctx).unwrap().unwrap();
        assert_eq!(target.state().status(), RunStatus::InProgress { page: 2 });

        target.rewind(checkpoint);
        assert_eq!(target.state().status(), RunStatus::InProgress { page: 1 });
        assert_eq!(target.continue_fetch(&fx.ctx).unwrap().unwrap(), page1);

        target.rewind(FetchCheckpoint::Cursor {
            next_records_url: None,
            total_size: 0,
        });
        assert_eq!(target.state().status(), RunStatus::InProgress { page: 2 });
    }

    #[test]
    fn oversized_batch_fails_before_any_request() {
        let ids: Vec<String> = (0..1000).map(|i| format!("001{i:015}")).collect();
        let store = Arc::new(InMemoryStore::new());
        store.register_soup("accounts");
        let records: Vec<Value> = ids.iter().map(|id| json!({"Id": id})).collect();
        store.upsert("accounts", "Id", &records).unwrap();
        let remote = Arc::new(MemoryRemote::new().with_records("Account", Vec::new()));
        let ctx = SyncContext::new(store, remote.clone());

        let mut target = RefreshTarget::new(
            RefreshTargetConfig::new(["Id", "Name"], "Account", "accounts").with_batch_size(1000),
        )
        .unwrap();
        let err = target.start_fetch(&ctx, 0).unwrap_err();
        assert!(matches!(err, SyncError::InvalidInput(_)));
        assert_eq!(target.state().status(), RunStatus::NotStarted);
        assert_eq!(remote.request_count(), 0);

        let mut target = RefreshTarget::new(
            RefreshTargetConfig::new(["Id", "Name"], "Account", "accounts").with_batch_size(500),
        )
        .unwrap();
        assert!(target.start_fetch(&ctx, 0).is_ok());
    }

    #[test]
    fn list_remote_ids_uses_id_field_only() {
        let (fx, target) = fixture(3, 2);
        fx.remote.delete("Account", "Id", &["00100001"]);
        let local: HashSet<String> = fx
            .store
            .records("accounts")
            .unwrap()
            .iter()
            .filter_map(|r| r["Id"].as_str().map(str::to_string))
            .collect();

        let report = target.list_remote_ids(&fx.ctx, Some(&local)).unwrap();
        assert_eq!(report.remote_ids.len(), 2);
        assert!(!report.remote_ids.contains("00100001"));

        let soql = fx.remote.requests()[0].soql().unwrap().to_string();
        assert!(soql.starts_with("SELECT Id FROM Account WHERE Id IN ("));
        assert!(target.list_remote_ids(&fx.ctx, None).is_none());
    }

    #[test]
    fn missing_soup_is_store_error() {
        let (fx, _) = fixture(1, 5);
        let mut target =
            RefreshTarget::new(RefreshTargetConfig::new(["Id"], "Account", "missing")).unwrap();
        let err = target.start_fetch(&fx.ctx, 0).unwrap_err();
        assert!(matches!(err, SyncError::Store(_)));
        assert_eq!(fx.remote.request_count(), 0);
    }

    #[test]
    fn field_list_without_id_field_is_rejected() {
        let result = RefreshTarget::new(RefreshTargetConfig::new(["Name"], "Account", "accounts"));
        assert!(matches!(result, Err(SyncError::InvalidInput(_))));
    }
}
