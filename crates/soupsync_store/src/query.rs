//! Projection queries over a single soup.

use serde_json::Value;
use std::fmt;

/// A paged projection query over one soup.
///
/// Rows come back in soup entry order (the order records were first
/// inserted), which is stable across calls as long as the soup is not
/// modified. Each row holds one value per selected path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmartQuery {
    soup_name: String,
    select_paths: Vec<String>,
    page_size: usize,
}

impl SmartQuery {
    /// Creates a query selecting `paths` from `soup_name`, `page_size` rows
    /// per page.
    pub fn select<I, S>(soup_name: impl Into<String>, paths: I, page_size: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            soup_name: soup_name.into(),
            select_paths: paths.into_iter().map(Into::into).collect(),
            page_size,
        }
    }

    /// Returns the soup this query reads.
    pub fn soup_name(&self) -> &str {
        &self.soup_name
    }

    /// Returns the projected paths.
    pub fn select_paths(&self) -> &[String] {
        &self.select_paths
    }

    /// Returns the number of rows per page.
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Returns the `[start, end)` row range for `page_index`, unclamped.
    pub fn page_bounds(&self, page_index: usize) -> (usize, usize) {
        let start = self.page_size.saturating_mul(page_index);
        (start, start.saturating_add(self.page_size))
    }
}

impl fmt::Display for SmartQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let columns: Vec<String> = self
            .select_paths
            .iter()
            .map(|path| format!("{{{}:{}}}", self.soup_name, path))
            .collect();
        write!(f, "SELECT {} FROM {{{}}}", columns.join(", "), self.soup_name)
    }
}

/// Extracts a dotted path (`Owner.Name`) from a JSON record.
///
/// Returns `Value::Null` when any segment is missing.
pub fn extract_path(record: &Value, path: &str) -> Value {
    let mut current = record;
    for segment in path.split('.') {
        match current.get(segment) {
            Some(next) => current = next,
            None => return Value::Null,
        }
    }
    current.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn renders_smart_sql() {
        let query = SmartQuery::select("accounts", ["Id", "Name"], 500);
        assert_eq!(
            query.to_string(),
            "SELECT {accounts:Id}, {accounts:Name} FROM {accounts}"
        );
    }

    #[test]
    fn page_bounds() {
        let query = SmartQuery::select("accounts", ["Id"], 500);
        assert_eq!(query.page_bounds(0), (0, 500));
        assert_eq!(query.page_bounds(2), (1000, 1500));
    }

    #[test]
    fn extract_nested_path() {
        let record = json!({"Id": "1", "Owner": {"Name": "Ada"}});
        assert_eq!(extract_path(&record, "Id"), json!("1"));
        assert_eq!(extract_path(&record, "Owner.Name"), json!("Ada"));
        assert_eq!(extract_path(&record, "Owner.Email"), Value::Null);
    }
}
