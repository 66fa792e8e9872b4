//! Transport layer abstraction for sync operations.

use crate::error::{SyncError, SyncResult};
use parking_lot::{Mutex, RwLock};
use serde_json::{Map, Value};
use soupsync_protocol::{IdQuery, QueryResponse, RestRequest, RestResponse};
use std::collections::{HashMap, HashSet, VecDeque};

/// A sync transport sends requests to the remote REST API.
///
/// This trait abstracts the network layer and authentication, allowing
/// for different implementations (HTTP, in-memory for testing, etc.).
/// Implementations own timeouts and retry policy; the engine calls
/// `send` once per query and never retries.
pub trait SyncTransport: Send + Sync {
    /// Sends a request and returns the raw response.
    ///
    /// Non-2xx responses are returned as `Ok`; only failures to obtain a
    /// response are errors.
    fn send(&self, request: &RestRequest) -> SyncResult<RestResponse>;
}

/// An in-memory remote for tests and offline tooling.
///
/// Serves id queries (the form built by [`IdQuery`]) from a per-object
/// record list. Scripted responses, when queued, are returned first and in
/// order. Failures can be injected by call index or by referenced id.
#[derive(Debug, Default)]
pub struct MemoryRemote {
    objects: RwLock<HashMap<String, Vec<Value>>>,
    scripted: Mutex<VecDeque<RestResponse>>,
    requests: Mutex<Vec<RestRequest>>,
    failing_calls: Mutex<HashSet<usize>>,
    failing_ids: Mutex<HashSet<String>>,
}

impl MemoryRemote {
    /// Creates an empty remote.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds records of `object_type`, builder style.
    pub fn with_records(self, object_type: &str, records: Vec<Value>) -> Self {
        self.insert(object_type, records);
        self
    }

    /// Parses a remote from a JSON object mapping object types to record
    /// arrays.
    pub fn from_json(json: &str) -> SyncResult<Self> {
        let objects: HashMap<String, Vec<Value>> = serde_json::from_str(json)
            .map_err(|e| SyncError::InvalidInput(format!("invalid remote dataset: {e}")))?;
        Ok(Self {
            objects: RwLock::new(objects),
            ..Self::default()
        })
    }

    /// Appends records of `object_type`.
    pub fn insert(&self, object_type: &str, records: Vec<Value>) {
        self.objects
            .write()
            .entry(object_type.to_string())
            .or_default()
            .extend(records);
    }

    /// Deletes records of `object_type` by id.
    pub fn delete(&self, object_type: &str, id_field: &str, ids: &[&str]) {
        if let Some(records) = self.objects.write().get_mut(object_type) {
            records.retain(|record| {
                record
                    .get(id_field)
                    .and_then(Value::as_str)
                    .map_or(true, |id| !ids.contains(&id))
            });
        }
    }

    /// Returns the records of `object_type`.
    pub fn records(&self, object_type: &str) -> Vec<Value> {
        self.objects
            .read()
            .get(object_type)
            .cloned()
            .unwrap_or_default()
    }

    /// Queues a response returned by the next call that is not failed.
    pub fn push_response(&self, response: RestResponse) {
        self.scripted.lock().push_back(response);
    }

    /// Makes the call with 0-based index `call` fail with a transport error.
    pub fn fail_call(&self, call: usize) {
        self.failing_calls.lock().insert(call);
    }

    /// Makes every id query referencing `id` fail with a transport error.
    pub fn fail_queries_with_id(&self, id: &str) {
        self.failing_ids.lock().insert(id.to_string());
    }

    /// Clears all injected failures.
    pub fn clear_failures(&self) {
        self.failing_calls.lock().clear();
        self.failing_ids.lock().clear();
    }

    /// Returns the number of requests received.
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Returns all requests received, in order.
    pub fn requests(&self) -> Vec<RestRequest> {
        self.requests.lock().clone()
    }

    /// Returns the ids referenced by each id query received, in order.
    pub fn queried_ids(&self) -> Vec<Vec<String>> {
        self.requests
            .lock()
            .iter()
            .filter_map(|request| request.soql())
            .filter_map(|soql| IdQuery::parse(soql).ok())
            .map(|query| query.ids().to_vec())
            .collect()
    }

    fn answer(&self, request: &RestRequest) -> SyncResult<RestResponse> {
        let Some(soql) = request.soql() else {
            return Ok(RestResponse::error(404, "NOT_FOUND", "unknown resource"));
        };
        let query = match IdQuery::parse(soql) {
            Ok(query) => query,
            Err(e) => return Ok(RestResponse::error(400, "MALFORMED_QUERY", &e.to_string())),
        };

        {
            let failing = self.failing_ids.lock();
            if let Some(id) = query.ids().iter().find(|id| failing.contains(*id)) {
                return Err(SyncError::transport_retryable(format!(
                    "injected failure for id {id}"
                )));
            }
        }

        let objects = self.objects.read();
        let Some(records) = objects.get(query.object_type()) else {
            return Ok(RestResponse::error(
                400,
                "INVALID_TYPE",
                &format!("sObject type '{}' is not supported", query.object_type()),
            ));
        };

        let wanted: HashSet<&str> = query.ids().iter().map(String::as_str).collect();
        let matched: Vec<Value> = records
            .iter()
            .filter(|record| {
                record
                    .get(query.id_field())
                    .and_then(Value::as_str)
                    .is_some_and(|id| wanted.contains(id))
            })
            .map(|record| project(record, query.fields()))
            .collect();

        Ok(RestResponse::ok_json(&QueryResponse::complete(matched))?)
    }
}

/// Keeps the top-level members of `record` named by `fields`.
fn project(record: &Value, fields: &[String]) -> Value {
    let mut projected = Map::new();
    for field in fields {
        let root = field.split('.').next().unwrap_or(field);
        if let Some(value) = record.get(root) {
            projected.insert(root.to_string(), value.clone());
        }
    }
    Value::Object(projected)
}

impl SyncTransport for MemoryRemote {
    fn send(&self, request: &RestRequest) -> SyncResult<RestResponse> {
        let call = {
            let mut requests = self.requests.lock();
            requests.push(request.clone());
            requests.len() - 1
        };

        if self.failing_calls.lock().contains(&call) {
            return Err(SyncError::transport_retryable(format!(
                "injected failure on call {call}"
            )));
        }

        if let Some(response) = self.scripted.lock().pop_front() {
            return Ok(response);
        }

        self.answer(request)
    }
}
