//! The query response envelope.

use crate::error::{ProtocolError, ProtocolResult};
use crate::request::RestResponse;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Name of the field holding the records array.
pub const RECORDS: &str = "records";

/// Body of a successful query response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    /// Total number of records matched by the query.
    #[serde(default)]
    pub total_size: usize,
    /// False when more records are available at `next_records_url`.
    #[serde(default = "default_done")]
    pub done: bool,
    /// Locator for the next batch of records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_records_url: Option<String>,
    /// The records in this batch.
    pub records: Vec<Value>,
}

fn default_done() -> bool {
    true
}

impl QueryResponse {
    /// Creates a complete response holding `records`.
    pub fn complete(records: Vec<Value>) -> Self {
        Self {
            total_size: records.len(),
            done: true,
            next_records_url: None,
            records,
        }
    }

    /// Decodes the envelope from a REST response body.
    ///
    /// # Errors
    ///
    /// Fails with [`ProtocolError::MalformedResponse`] if the body is not a
    /// JSON object with a `records` array.
    pub fn from_response(response: &RestResponse) -> ProtocolResult<Self> {
        let body: Value = response.json()?;
        match body.get(RECORDS) {
            Some(Value::Array(_)) => {}
            Some(_) => return Err(ProtocolError::malformed("records is not an array")),
            None => return Err(ProtocolError::malformed("missing records field")),
        }
        serde_json::from_value(body).map_err(|e| ProtocolError::malformed(e.to_string()))
    }
}

/// Collects the string values of `id_field` from `records`.
///
/// Records without a string id are skipped.
pub fn record_ids(records: &[Value], id_field: &str) -> Vec<String> {
    records
        .iter()
        .filter_map(|record| record.get(id_field).and_then(Value::as_str))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(body: Value) -> RestResponse {
        RestResponse::new(200, body.to_string().into_bytes())
    }

    #[test]
    fn decodes_envelope() {
        let parsed = QueryResponse::from_response(&response(json!({
            "totalSize": 2,
            "done": false,
            "nextRecordsUrl": "/services/data/v39.0/query/01g-2000",
            "records": [{"Id": "a"}, {"Id": "b"}]
        })))
        .unwrap();

        assert_eq!(parsed.total_size, 2);
        assert!(!parsed.done);
        assert_eq!(
            parsed.next_records_url.as_deref(),
            Some("/services/data/v39.0/query/01g-2000")
        );
        assert_eq!(record_ids(&parsed.records, "Id"), vec!["a", "b"]);
    }

    #[test]
    fn missing_records_is_malformed() {
        let result = QueryResponse::from_response(&response(json!({"totalSize": 0})));
        assert!(matches!(result, Err(ProtocolError::MalformedResponse(m)) if m.contains("records")));
    }

    #[test]
    fn non_array_records_is_malformed() {
        let result = QueryResponse::from_response(&response(json!({"records": {}})));
        assert!(matches!(result, Err(ProtocolError::MalformedResponse(_))));
    }

    #[test]
    fn envelope_defaults() {
        let parsed = QueryResponse::from_response(&response(json!({"records": []}))).unwrap();
        assert!(parsed.done);
        assert_eq!(parsed.total_size, 0);
    }

    #[test]
    fn record_ids_skip_missing() {
        let records = vec![json!({"Id": "a"}), json!({"Name": "x"}), json!({"Id": 7})];
        assert_eq!(record_ids(&records, "Id"), vec!["a"]);
    }
}
