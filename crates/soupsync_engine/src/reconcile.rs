//! Remote-existence reconciliation.
//!
//! Given a set of local ids, find out which still exist remotely. Used to
//! detect records deleted on the server since they were cached.
//!
//! The ids are queried in batches. A failed batch does not abort the
//! reconciliation: it is logged and reported in
//! [`RemoteIdsReport::failed_batches`], and its ids are simply absent from
//! [`RemoteIdsReport::remote_ids`]. Callers deciding to delete local
//! records must treat the ids of failed batches as unverified.

use crate::context::SyncContext;
use crate::error::SyncResult;
use crate::fetch::fetch_records;
use soupsync_protocol::{record_ids, IdQuery};
use std::collections::HashSet;
use std::ops::Range;
use tracing::{debug, warn};

/// A batch whose existence check failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchFailure {
    /// Position of the batch in the materialized id list.
    pub range: Range<usize>,
    /// Ids of the batch.
    pub ids: Vec<String>,
    /// Why the batch failed.
    pub error: String,
}

/// Outcome of a reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteIdsReport {
    /// Local ids confirmed to exist remotely.
    pub remote_ids: HashSet<String>,
    /// Batches that could not be checked.
    pub failed_batches: Vec<BatchFailure>,
    /// Number of batches attempted.
    pub batch_count: usize,
}

impl RemoteIdsReport {
    /// Returns true if every batch was checked.
    pub fn is_complete(&self) -> bool {
        self.failed_batches.is_empty()
    }

    /// Returns the ids whose existence is unknown.
    pub fn unverified_ids(&self) -> HashSet<String> {
        self.failed_batches
            .iter()
            .flat_map(|failure| failure.ids.iter().cloned())
            .collect()
    }
}

/// Which object and id field a reconciliation queries.
#[derive(Debug, Clone, Copy)]
pub struct RemoteIdQuery<'a> {
    /// Remote object type.
    pub object_type: &'a str,
    /// Id field name.
    pub id_field: &'a str,
    /// Maximum ids per remote query.
    pub batch_size: usize,
}

/// Determines which of `local_ids` still exist remotely.
///
/// Returns `None` when `local_ids` is `None`. The partition order follows
/// the set's iteration order and is not stable across calls.
pub fn list_remote_ids(
    ctx: &SyncContext,
    target: RemoteIdQuery<'_>,
    local_ids: Option<&HashSet<String>>,
) -> Option<RemoteIdsReport> {
    let local_ids = local_ids?;
    let ids: Vec<&String> = local_ids.iter().collect();
    let batch_size = target.batch_size.max(1);
    let fields = [target.id_field.to_string()];

    let mut report = RemoteIdsReport::default();
    for (index, chunk) in ids.chunks(batch_size).enumerate() {
        let start = index * batch_size;
        let range = start..start + chunk.len();
        report.batch_count += 1;

        match check_batch(ctx, &target, &fields, chunk) {
            Ok(found) => {
                debug!(
                    object_type = target.object_type,
                    batch = index,
                    asked = chunk.len(),
                    found = found.len(),
                    "reconciled batch"
                );
                report
                    .remote_ids
                    .extend(found.into_iter().filter(|id| local_ids.contains(id)));
            }
            Err(err) => {
                warn!(
                    object_type = target.object_type,
                    batch = index,
                    ids = chunk.len(),
                    error = %err,
                    "failed to fetch remote ids, skipping batch"
                );
                report.failed_batches.push(BatchFailure {
                    range,
                    ids: chunk.iter().map(|id| id.to_string()).collect(),
                    error: err.to_string(),
                });
            }
        }
    }
    Some(report)
}

fn check_batch(
    ctx: &SyncContext,
    target: &RemoteIdQuery<'_>,
    fields: &[String],
    chunk: &[&String],
) -> SyncResult<Vec<String>> {
    let query = IdQuery::new(
        fields,
        target.object_type,
        target.id_field,
        chunk.iter().map(|id| id.as_str()),
    )?;
    let records = fetch_records(ctx, &query.to_soql())?;
    Ok(record_ids(&records, target.id_field))
}
