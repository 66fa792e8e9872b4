//! A store that fails on demand.

use serde_json::Value;
use soupsync_store::{LocalStore, SmartQuery, StoreError, StoreResult};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

const UNSET: usize = usize::MAX;

/// Wraps a [`LocalStore`] and fails selected calls with
/// [`StoreError::Unavailable`].
///
/// Reads and writes can be switched off independently; a single query
/// page or a single write can be made to fail to exercise mid-run store
/// errors.
pub struct FlakyStore<S: LocalStore> {
    inner: S,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    fail_page: AtomicUsize,
    fail_write: AtomicUsize,
    writes: AtomicUsize,
    calls: AtomicUsize,
}

impl<S: LocalStore> FlakyStore<S> {
    /// Wraps `inner`; no call fails until configured.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
            fail_page: AtomicUsize::new(UNSET),
            fail_write: AtomicUsize::new(UNSET),
            writes: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        }
    }

    /// Returns the wrapped store.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Makes `count_query` and `query` fail.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Makes `upsert` and `delete_by_ids` fail.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Makes `query` fail for page `page` only.
    pub fn fail_page(&self, page: Option<usize>) {
        self.fail_page.store(page.unwrap_or(UNSET), Ordering::SeqCst);
    }

    /// Makes the `n`-th write from now fail, counting from 0. Writes are
    /// `upsert` and `delete_by_ids` calls.
    pub fn fail_nth_write(&self, n: Option<usize>) {
        self.writes.store(0, Ordering::SeqCst);
        self.fail_write.store(n.unwrap_or(UNSET), Ordering::SeqCst);
    }

    /// Returns the number of calls received, failed ones included.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn check(&self, flag: &AtomicBool, op: &str) -> StoreResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if flag.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(format!("injected {op} failure")));
        }
        Ok(())
    }

    fn check_write(&self, op: &str) -> StoreResult<()> {
        self.check(&self.fail_writes, op)?;
        let write = self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_write.load(Ordering::SeqCst) == write {
            return Err(StoreError::Unavailable(format!(
                "injected failure on write {write}"
            )));
        }
        Ok(())
    }
}

impl<S: LocalStore> LocalStore for FlakyStore<S> {
    fn count_query(&self, query: &SmartQuery) -> StoreResult<usize> {
        self.check(&self.fail_reads, "count")?;
        self.inner.count_query(query)
    }

    fn query(&self, query: &SmartQuery, page_index: usize) -> StoreResult<Vec<Vec<Value>>> {
        self.check(&self.fail_reads, "query")?;
        if self.fail_page.load(Ordering::SeqCst) == page_index {
            return Err(StoreError::Unavailable(format!(
                "injected failure on page {page_index}"
            )));
        }
        self.inner.query(query, page_index)
    }

    fn upsert(&self, soup_name: &str, id_field: &str, records: &[Value]) -> StoreResult<usize> {
        self.check_write("upsert")?;
        self.inner.upsert(soup_name, id_field, records)
    }

    fn delete_by_ids(&self, soup_name: &str, id_field: &str, ids: &[String]) -> StoreResult<usize> {
        self.check_write("delete")?;
        self.inner.delete_by_ids(soup_name, id_field, ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use soupsync_store::InMemoryStore;

    fn store() -> FlakyStore<InMemoryStore> {
        let inner = InMemoryStore::new();
        inner.register_soup("s");
        inner.upsert("s", "Id", &[json!({"Id": "a"}), json!({"Id": "b"})]).unwrap();
        FlakyStore::new(inner)
    }

    #[test]
    fn passes_through_by_default() {
        let store = store();
        let query = SmartQuery::select("s", ["Id"], 1);
        assert_eq!(store.count_query(&query).unwrap(), 2);
        assert_eq!(store.query(&query, 1).unwrap(), vec![vec![json!("b")]]);
        assert_eq!(store.call_count(), 2);
    }

    #[test]
    fn fails_selected_page() {
        let store = store();
        let query = SmartQuery::select("s", ["Id"], 1);
        store.fail_page(Some(1));
        assert!(store.query(&query, 0).is_ok());
        assert!(matches!(store.query(&query, 1), Err(StoreError::Unavailable(_))));
        store.fail_page(None);
        assert!(store.query(&query, 1).is_ok());
    }

    #[test]
    fn fails_writes_only() {
        let store = store();
        store.set_fail_writes(true);
        assert!(store.upsert("s", "Id", &[json!({"Id": "c"})]).is_err());
        assert!(store.delete_by_ids("s", "Id", &["a".to_string()]).is_err());
        assert_eq!(store.inner().soup_len("s"), Some(2));
        assert!(store.count_query(&SmartQuery::select("s", ["Id"], 1)).is_ok());
    }

    #[test]
    fn fails_selected_write() {
        let store = store();
        store.fail_nth_write(Some(1));
        assert!(store.upsert("s", "Id", &[json!({"Id": "c"})]).is_ok());
        assert!(matches!(
            store.delete_by_ids("s", "Id", &["a".to_string()]),
            Err(StoreError::Unavailable(_))
        ));
        assert!(store.upsert("s", "Id", &[json!({"Id": "d"})]).is_ok());
        assert_eq!(store.inner().soup_len("s"), Some(4));

        store.fail_nth_write(Some(0));
        store.fail_nth_write(None);
        assert!(store.delete_by_ids("s", "Id", &["a".to_string()]).is_ok());
    }
}
