//! In-memory soup store.

use crate::error::{StoreError, StoreResult};
use crate::query::{extract_path, SmartQuery};
use crate::store::LocalStore;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::Path;

#[derive(Debug, Default)]
struct Soup {
    entries: BTreeMap<u64, Value>,
    next_entry_id: u64,
}

impl Soup {
    fn push(&mut self, record: Value) {
        self.entries.insert(self.next_entry_id, record);
        self.next_entry_id += 1;
    }
}

/// On-disk shape of an [`InMemoryStore`].
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreSnapshot {
    soups: BTreeMap<String, Vec<Value>>,
}

/// An in-memory soup store.
///
/// Records are kept per soup in entry order. Suitable for:
/// - Unit and integration tests
/// - Command-line tooling that loads a store from a JSON file
///
/// # Thread Safety
///
/// This store is thread-safe and can be shared across threads.
///
/// # Example
///
/// ```rust
/// use soupsync_store::{InMemoryStore, LocalStore};
/// use serde_json::json;
///
/// let store = InMemoryStore::new();
/// store.register_soup("contacts");
/// store.upsert("contacts", "Id", &[json!({"Id": "003A"})]).unwrap();
/// assert_eq!(store.soup_len("contacts"), Some(1));
/// ```
#[derive(Debug, Default)]
pub struct InMemoryStore {
    soups: RwLock<BTreeMap<String, Soup>>,
}

impl InMemoryStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a soup. Registering an existing soup is a no-op.
    pub fn register_soup(&self, soup_name: &str) {
        self.soups.write().entry(soup_name.to_string()).or_default();
    }

    /// Returns true if the soup exists.
    pub fn has_soup(&self, soup_name: &str) -> bool {
        self.soups.read().contains_key(soup_name)
    }

    /// Returns the number of records in a soup, if it exists.
    pub fn soup_len(&self, soup_name: &str) -> Option<usize> {
        self.soups.read().get(soup_name).map(|soup| soup.entries.len())
    }

    /// Returns a copy of all records of a soup in entry order.
    pub fn records(&self, soup_name: &str) -> StoreResult<Vec<Value>> {
        let soups = self.soups.read();
        let soup = soups
            .get(soup_name)
            .ok_or_else(|| StoreError::SoupNotFound(soup_name.to_string()))?;
        Ok(soup.entries.values().cloned().collect())
    }

    /// Loads a store from a JSON document of the form
    /// `{"soups": {"name": [records...]}}`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_json(path: &Path) -> StoreResult<Self> {
        let data = fs::read_to_string(path)?;
        let snapshot: StoreSnapshot = serde_json::from_str(&data)?;

        let store = Self::new();
        {
            let mut soups = store.soups.write();
            for (name, records) in snapshot.soups {
                let soup = soups.entry(name).or_default();
                for record in records {
                    soup.push(record);
                }
            }
        }
        Ok(store)
    }

    /// Writes the whole store to `path` as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save_json(&self, path: &Path) -> StoreResult<()> {
        let snapshot = StoreSnapshot {
            soups: self
                .soups
                .read()
                .iter()
                .map(|(name, soup)| (name.clone(), soup.entries.values().cloned().collect()))
                .collect(),
        };
        fs::write(path, serde_json::to_string_pretty(&snapshot)?)?;
        Ok(())
    }
}

fn record_id(record: &Value, id_field: &str) -> Option<String> {
    match extract_path(record, id_field) {
        Value::String(id) => Some(id),
        _ => None,
    }
}

impl LocalStore for InMemoryStore {
    fn count_query(&self, query: &SmartQuery) -> StoreResult<usize> {
        let soups = self.soups.read();
        let soup = soups
            .get(query.soup_name())
            .ok_or_else(|| StoreError::SoupNotFound(query.soup_name().to_string()))?;
        Ok(soup.entries.len())
    }

    fn query(&self, query: &SmartQuery, page_index: usize) -> StoreResult<Vec<Vec<Value>>> {
        if query.page_size() == 0 {
            return Err(StoreError::InvalidQuery("page size must be positive".into()));
        }

        let soups = self.soups.read();
        let soup = soups
            .get(query.soup_name())
            .ok_or_else(|| StoreError::SoupNotFound(query.soup_name().to_string()))?;

        let (start, _) = query.page_bounds(page_index);
        Ok(soup
            .entries
            .values()
            .skip(start)
            .take(query.page_size())
            .map(|record| {
                query
                    .select_paths()
                    .iter()
                    .map(|path| extract_path(record, path))
                    .collect()
            })
            .collect())
    }

    fn upsert(&self, soup_name: &str, id_field: &str, records: &[Value]) -> StoreResult<usize> {
        let mut soups = self.soups.write();
        let soup = soups
            .get_mut(soup_name)
            .ok_or_else(|| StoreError::SoupNotFound(soup_name.to_string()))?;

        let mut by_id: HashMap<String, u64> = soup
            .entries
            .iter()
            .filter_map(|(entry_id, record)| record_id(record, id_field).map(|id| (id, *entry_id)))
            .collect();

        for record in records {
            let id = record_id(record, id_field).ok_or_else(|| {
                StoreError::InvalidRecord(format!("record has no string field {id_field}"))
            })?;
            match by_id.get(&id) {
                Some(entry_id) => {
                    soup.entries.insert(*entry_id, record.clone());
                }
                None => {
                    by_id.insert(id, soup.next_entry_id);
                    soup.push(record.clone());
                }
            }
        }
        Ok(records.len())
    }

    fn delete_by_ids(
        &self,
        soup_name: &str,
        id_field: &str,
        ids: &[String],
    ) -> StoreResult<usize> {
        let mut soups = self.soups.write();
        let soup = soups
            .get_mut(soup_name)
            .ok_or_else(|| StoreError::SoupNotFound(soup_name.to_string()))?;

        let doomed: HashSet<&str> = ids.iter().map(String::as_str).collect();
        let before = soup.entries.len();
        soup.entries.retain(|_, record| {
            record_id(record, id_field).map_or(true, |id| !doomed.contains(id.as_str()))
        });
        Ok(before - soup.entries.len())
    }
}
