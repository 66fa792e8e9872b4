//! Query target: fetch the records matching a query, newest changes last.
//!
//! The query selects the configured fields, optionally filtered by a
//! caller-supplied `WHERE` clause, and is restricted to records modified
//! after the latest timestamp already synced. Large result sets are read
//! by following the `nextRecordsUrl` of each response.

use crate::config::{QueryType, SoqlTargetConfig, TargetSpec, DEFAULT_BATCH_SIZE};
use crate::context::SyncContext;
use crate::error::SyncResult;
use crate::fetch::fetch_query;
use crate::reconcile::{self, RemoteIdQuery, RemoteIdsReport};
use crate::target::{FetchCheckpoint, SyncDownTarget};
use serde_json::Value;
use soupsync_protocol::{
    format_soql_datetime, validate_identifier, QueryResponse, RestRequest, SoqlBuilder,
};
use std::collections::HashSet;
use tracing::{debug, info};

/// A sync-down target running a query.
#[derive(Debug, Clone)]
pub struct SoqlTarget {
    config: SoqlTargetConfig,
    next_records_url: Option<String>,
    total_size: usize,
}

impl SoqlTarget {
    /// Creates a target from a validated configuration.
    pub fn new(config: SoqlTargetConfig) -> SyncResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            next_records_url: None,
            total_size: 0,
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &SoqlTargetConfig {
        &self.config
    }

    /// Returns the locator of the next batch, if the run has more.
    pub fn next_records_url(&self) -> Option<&str> {
        self.next_records_url.as_deref()
    }

    /// Abandons any run in progress.
    pub fn reset(&mut self) {
        self.next_records_url = None;
        self.total_size = 0;
    }

    /// Renders the query for a run starting after `max_timestamp`.
    ///
    /// The timestamp predicate is added only when `max_timestamp` is
    /// positive.
    pub fn build_query(&self, max_timestamp: i64) -> SyncResult<String> {
        let config = &self.config;
        let modified = config.modification_date_field_name();
        validate_identifier("modification date field", modified)?;

        let since = if max_timestamp > 0 {
            Some(format!(
                "{modified} > {}",
                format_soql_datetime(max_timestamp)?
            ))
        } else {
            None
        };
        let predicate = match (config.where_clause(), since) {
            (Some(clause), Some(since)) => Some(format!("({clause}) AND {since}")),
            (Some(clause), None) => Some(clause.to_string()),
            (None, since) => since,
        };

        let mut builder = SoqlBuilder::with_fields(config.field_list().iter().cloned())
            .from(config.object_type())
            .order_by(modified);
        if let Some(predicate) = predicate {
            builder = builder.where_clause(predicate);
        }
        Ok(builder.build()?)
    }

    /// Runs the query and returns its first batch.
    ///
    /// The previous run's locator is dropped first, so a failed start
    /// leaves nothing to continue.
    pub fn start_fetch(&mut self, ctx: &SyncContext, max_timestamp: i64) -> SyncResult<Vec<Value>> {
        self.reset();
        let soql = self.build_query(max_timestamp)?;
        let request = RestRequest::query(ctx.api_version(), soql);
        let response = fetch_query(ctx, &request)?;
        Ok(self.accept(response))
    }

    /// Fetches the next batch of the query, if any.
    ///
    /// Returns `Ok(None)` without any I/O once the remote reported the
    /// result set done.
    pub fn continue_fetch(&mut self, ctx: &SyncContext) -> SyncResult<Option<Vec<Value>>> {
        let Some(url) = self.next_records_url.as_deref() else {
            return Ok(None);
        };
        let response = fetch_query(ctx, &RestRequest::next_records(url))?;
        Ok(Some(self.accept(response)))
    }

    /// Determines which of `local_ids` still exist remotely.
    pub fn list_remote_ids(
        &self,
        ctx: &SyncContext,
        local_ids: Option<&HashSet<String>>,
    ) -> Option<RemoteIdsReport> {
        let query = RemoteIdQuery {
            object_type: self.config.object_type(),
            id_field: self.config.id_field_name(),
            batch_size: DEFAULT_BATCH_SIZE,
        };
        reconcile::list_remote_ids(ctx, query, local_ids)
    }

    fn accept(&mut self, response: QueryResponse) -> Vec<Value> {
        self.total_size = response.total_size;
        self.next_records_url = if response.done {
            None
        } else {
            response.next_records_url
        };

        debug!(
            object_type = self.config.object_type(),
            fetched = response.records.len(),
            total = self.total_size,
            more = self.next_records_url.is_some(),
            "query batch fetched"
        );
        if self.next_records_url.is_none() {
            info!(
                object_type = self.config.object_type(),
                total = self.total_size,
                "query run complete"
            );
        }
        response.records
    }
}

impl SyncDownTarget for SoqlTarget {
    fn query_type(&self) -> QueryType {
        QueryType::Soql
    }

    fn id_field_name(&self) -> &str {
        self.config.id_field_name()
    }

    fn modification_date_field_name(&self) -> &str {
        self.config.modification_date_field_name()
    }

    fn total_size(&self) -> usize {
        self.total_size
    }

    fn start_fetch(&mut self, ctx: &SyncContext, max_timestamp: i64) -> SyncResult<Vec<Value>> {
        SoqlTarget::start_fetch(self, ctx, max_timestamp)
    }

    fn continue_fetch(&mut self, ctx: &SyncContext) -> SyncResult<Option<Vec<Value>>> {
        SoqlTarget::continue_fetch(self, ctx)
    }

    fn checkpoint(&self) -> FetchCheckpoint {
        FetchCheckpoint::Cursor {
            next_records_url: self.next_records_url.clone(),
            total_size: self.total_size,
        }
    }

    fn rewind(&mut self, checkpoint: FetchCheckpoint) {
        if let FetchCheckpoint::Cursor {
            next_records_url,
            total_size,
        } = checkpoint
        {
            self.next_records_url = next_records_url;
            self.total_size = total_size;
        }
    }

    fn reset(&mut self) {
        SoqlTarget::reset(self);
    }

    fn list_remote_ids(
        &self,
        ctx: &SyncContext,
        local_ids: Option<&HashSet<String>>,
    ) -> Option<RemoteIdsReport> {
        SoqlTarget::list_remote_ids(self, ctx, local_ids)
    }

    fn to_spec(&self) -> TargetSpec {
        TargetSpec::Soql(self.config.clone())
    }
}
