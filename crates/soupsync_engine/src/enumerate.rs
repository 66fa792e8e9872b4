//! Paging through the ids held in a soup.

use crate::error::SyncResult;
use serde_json::Value;
use soupsync_store::{LocalStore, SmartQuery};
use tracing::warn;

/// One page of local ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdPage {
    /// Ids on this page, in store order. Never more than the batch size.
    pub ids: Vec<String>,
    /// Number of records in the soup, reported for page 0 only.
    pub total_count: Option<usize>,
}

/// Reads page `page_index` of the ids in `soup_name`.
///
/// The store orders rows by entry, so the same page index yields the same
/// ids while the soup is unchanged. Rows without a string id are skipped.
///
/// # Errors
///
/// Returns [`SyncError::Store`](crate::SyncError::Store) if the store
/// cannot be read.
pub fn enumerate_ids(
    store: &dyn LocalStore,
    soup_name: &str,
    id_field: &str,
    page_index: usize,
    batch_size: usize,
) -> SyncResult<IdPage> {
    let query = SmartQuery::select(soup_name, [id_field], batch_size);

    let total_count = if page_index == 0 {
        Some(store.count_query(&query)?)
    } else {
        None
    };

    let rows = store.query(&query, page_index)?;
    let mut ids = Vec::with_capacity(rows.len().min(batch_size));
    for row in rows.into_iter().take(batch_size) {
        match row.into_iter().next() {
            Some(Value::String(id)) => ids.push(id),
            other => warn!(soup = soup_name, value = ?other, "skipping row without string id"),
        }
    }

    Ok(IdPage { ids, total_count })
}

/// Reads every id in `soup_name`, page by page.
pub fn all_local_ids(
    store: &dyn LocalStore,
    soup_name: &str,
    id_field: &str,
    batch_size: usize,
) -> SyncResult<Vec<String>> {
    let first = enumerate_ids(store, soup_name, id_field, 0, batch_size)?;
    let total = first.total_count.unwrap_or(0);
    let mut ids = first.ids;

    let mut page_index = 1;
    while batch_size.saturating_mul(page_index) < total {
        let page = enumerate_ids(store, soup_name, id_field, page_index, batch_size)?;
        if page.ids.is_empty() {
            break;
        }
        ids.extend(page.ids);
        page_index += 1;
    }
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SyncError;
    use serde_json::json;
    use soupsync_store::InMemoryStore;

    fn store(count: usize) -> InMemoryStore {
        let store = InMemoryStore::new();
        store.register_soup("accounts");
        let records: Vec<Value> = (0..count).map(|i| json!({"Id": format!("id{i}")})).collect();
        store.upsert("accounts", "Id", &records).unwrap();
        store
    }

    #[test]
    fn total_count_only_on_first_page() {
        let store = store(5);
        let first = enumerate_ids(&store, "accounts", "Id", 0, 2).unwrap();
        assert_eq!(first.ids, vec!["id0", "id1"]);
        assert_eq!(first.total_count, Some(5));

        let second = enumerate_ids(&store, "accounts", "Id", 1, 2).unwrap();
        assert_eq!(second.ids, vec!["id2", "id3"]);
        assert_eq!(second.total_count, None);
    }

    #[test]
    fn same_page_is_stable() {
        let store = store(7);
        let a = enumerate_ids(&store, "accounts", "Id", 2, 3).unwrap();
        let b = enumerate_ids(&store, "accounts", "Id", 2, 3).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.ids, vec!["id6"]);
    }

    #[test]
    fn skips_rows_without_id() {
        let store = store(1);
        store
            .upsert("accounts", "Name", &[json!({"Name": "local only"})])
            .unwrap();
        let page = enumerate_ids(&store, "accounts", "Id", 0, 10).unwrap();
        assert_eq!(page.ids, vec!["id0"]);
        assert_eq!(page.total_count, Some(2));
    }

    #[test]
    fn missing_soup_is_store_error() {
        let store = InMemoryStore::new();
        let result = enumerate_ids(&store, "accounts", "Id", 0, 10);
        assert!(matches!(result, Err(SyncError::Store(_))));
    }

    #[test]
    fn all_ids_across_pages() {
        let store = store(11);
        let ids = all_local_ids(&store, "accounts", "Id", 4).unwrap();
        assert_eq!(ids.len(), 11);
        assert_eq!(ids.first().map(String::as_str), Some("id0"));
        assert_eq!(ids.last().map(String::as_str), Some("id10"));
    }
}
