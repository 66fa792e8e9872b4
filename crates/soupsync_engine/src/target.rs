//! The sync-down target capability.

use crate::config::{QueryType, TargetSpec};
use crate::context::SyncContext;
use crate::error::SyncResult;
use crate::reconcile::RemoteIdsReport;
use crate::refresh::RefreshTarget;
use crate::soql::SoqlTarget;
use crate::state::PaginationState;
use serde_json::Value;
use std::collections::HashSet;

/// Snapshot of a target's run position, taken before a fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchCheckpoint {
    /// Position of a refresh run.
    Pagination(PaginationState),
    /// Position of a query run.
    Cursor {
        /// Locator of the next batch.
        next_records_url: Option<String>,
        /// Result size last reported by the remote.
        total_size: usize,
    },
}

/// A source of records for a sync down.
///
/// The sync driver calls `start_fetch` once, then `continue_fetch` until
/// it returns `None`. Calls on one target must not overlap; `&mut self`
/// enforces this for the fetch methods.
pub trait SyncDownTarget {
    /// Returns the target kind.
    fn query_type(&self) -> QueryType;

    /// Returns the id field name.
    fn id_field_name(&self) -> &str;

    /// Returns the modification date field name.
    fn modification_date_field_name(&self) -> &str;

    /// Number of records the current run expects, as last reported.
    fn total_size(&self) -> usize;

    /// Fetches the first batch of a run.
    ///
    /// `max_timestamp` is the latest modification time already synced, in
    /// milliseconds; targets without timestamp semantics ignore it.
    fn start_fetch(&mut self, ctx: &SyncContext, max_timestamp: i64) -> SyncResult<Vec<Value>>;

    /// Fetches the next batch, or returns `None` when the run is over.
    fn continue_fetch(&mut self, ctx: &SyncContext) -> SyncResult<Option<Vec<Value>>>;

    /// Captures the run position.
    fn checkpoint(&self) -> FetchCheckpoint;

    /// Returns to a position captured by [`SyncDownTarget::checkpoint`],
    /// so the next `continue_fetch` reads the same batch again.
    ///
    /// A checkpoint taken from another kind of target is ignored.
    fn rewind(&mut self, checkpoint: FetchCheckpoint);

    /// Abandons any run in progress.
    fn reset(&mut self);

    /// Determines which of `local_ids` still exist remotely.
    fn list_remote_ids(
        &self,
        ctx: &SyncContext,
        local_ids: Option<&HashSet<String>>,
    ) -> Option<RemoteIdsReport>;

    /// Returns the persisted form of the target.
    fn to_spec(&self) -> TargetSpec;
}

/// A target built from a [`TargetSpec`].
#[derive(Debug, Clone)]
pub enum AnyTarget {
    /// Refresh target.
    Refresh(RefreshTarget),
    /// Query target.
    Soql(SoqlTarget),
}

impl AnyTarget {
    /// Builds the target described by `spec`.
    pub fn from_spec(spec: TargetSpec) -> SyncResult<Self> {
        match spec {
            TargetSpec::Refresh(config) => Ok(AnyTarget::Refresh(RefreshTarget::new(config)?)),
            TargetSpec::Soql(config) => Ok(AnyTarget::Soql(SoqlTarget::new(config)?)),
        }
    }

    /// Parses a persisted target.
    pub fn from_json(json: &str) -> SyncResult<Self> {
        Self::from_spec(TargetSpec::from_json(json)?)
    }

    fn inner(&self) -> &dyn SyncDownTarget {
        match self {
            AnyTarget::Refresh(target) => target,
            AnyTarget::Soql(target) => target,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn SyncDownTarget {
        match self {
            AnyTarget::Refresh(target) => target,
            AnyTarget::Soql(target) => target,
        }
    }
}

impl SyncDownTarget for AnyTarget {
    fn query_type(&self) -> QueryType {
        self.inner().query_type()
    }

    fn id_field_name(&self) -> &str {
        self.inner().id_field_name()
    }

    fn modification_date_field_name(&self) -> &str {
        self.inner().modification_date_field_name()
    }

    fn total_size(&self) -> usize {
        self.inner().total_size()
    }

    fn start_fetch(&mut self, ctx: &SyncContext, max_timestamp: i64) -> SyncResult<Vec<Value>> {
        self.inner_mut().start_fetch(ctx, max_timestamp)
    }

    fn continue_fetch(&mut self, ctx: &SyncContext) -> SyncResult<Option<Vec<Value>>> {
        self.inner_mut().continue_fetch(ctx)
    }

    fn checkpoint(&self) -> FetchCheckpoint {
        self.inner().checkpoint()
    }

    fn rewind(&mut self, checkpoint: FetchCheckpoint) {
        self.inner_mut().rewind(checkpoint);
    }

    fn reset(&mut self) {
        self.inner_mut().reset();
    }

    fn list_remote_ids(
        &self,
        ctx: &SyncContext,
        local_ids: Option<&HashSet<String>>,
    ) -> Option<RemoteIdsReport> {
        self.inner().list_remote_ids(ctx, local_ids)
    }

    fn to_spec(&self) -> TargetSpec {
        self.inner().to_spec()
    }
}
