//! Local store trait definition.

use crate::error::StoreResult;
use crate::query::SmartQuery;
use serde_json::Value;

/// The local record store a sync target reads from and writes to.
///
/// # Invariants
///
/// - `query` returns at most `query.page_size()` rows
/// - Re-running `query` with the same page index returns the same rows
///   while the soup is unchanged
/// - `count_query` counts all rows the query would return across pages
/// - Stores must be `Send + Sync`
///
/// # Implementors
///
/// - [`super::InMemoryStore`]
pub trait LocalStore: Send + Sync {
    /// Counts the rows matched by `query`, ignoring paging.
    ///
    /// # Errors
    ///
    /// Returns an error if the soup does not exist or the store cannot be
    /// read.
    fn count_query(&self, query: &SmartQuery) -> StoreResult<usize>;

    /// Returns page `page_index` of `query`.
    ///
    /// Each row holds one value per selected path, in selection order.
    /// Pages past the end are empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the soup does not exist or the store cannot be
    /// read.
    fn query(&self, query: &SmartQuery, page_index: usize) -> StoreResult<Vec<Vec<Value>>>;

    /// Inserts or replaces records keyed by `id_field`.
    ///
    /// A record whose id already exists keeps its entry position.
    /// Returns the number of records written.
    ///
    /// # Errors
    ///
    /// Returns an error if the soup does not exist or a record has no
    /// string id.
    fn upsert(&self, soup_name: &str, id_field: &str, records: &[Value]) -> StoreResult<usize>;

    /// Deletes the records whose `id_field` is in `ids`.
    ///
    /// Returns the number of records removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the soup does not exist.
    fn delete_by_ids(&self, soup_name: &str, id_field: &str, ids: &[String])
        -> StoreResult<usize>;
}
