//! Executing queries against the remote.

use crate::context::SyncContext;
use crate::error::{SyncError, SyncResult};
use serde_json::Value;
use soupsync_protocol::{QueryResponse, RestRequest};

/// Sends `request` and decodes the query envelope.
///
/// # Errors
///
/// - [`SyncError::Transport`] if no response was obtained
/// - [`SyncError::Response`] for a non-2xx status or a body without a
///   `records` array
pub fn fetch_query(ctx: &SyncContext, request: &RestRequest) -> SyncResult<QueryResponse> {
    let response = ctx.transport().send(request)?;
    if !response.is_success() {
        return Err(SyncError::Response(format!(
            "remote returned status {}: {}",
            response.status,
            response.body_text()
        )));
    }
    Ok(QueryResponse::from_response(&response)?)
}

/// Runs `soql` and returns the records array.
pub fn fetch_records(ctx: &SyncContext, soql: &str) -> SyncResult<Vec<Value>> {
    let request = RestRequest::query(ctx.api_version(), soql);
    Ok(fetch_query(ctx, &request)?.records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MemoryRemote;
    use serde_json::json;
    use soupsync_protocol::RestResponse;
    use soupsync_store::InMemoryStore;
    use std::sync::Arc;

    fn ctx(remote: Arc<MemoryRemote>) -> SyncContext {
        SyncContext::new(Arc::new(InMemoryStore::new()), remote).with_api_version("v40.0")
    }

    #[test]
    fn returns_records() {
        let remote = Arc::new(
            MemoryRemote::new().with_records("Account", vec![json!({"Id": "a", "Name": "x"})]),
        );
        let records = fetch_records(
            &ctx(Arc::clone(&remote)),
            "SELECT Id FROM Account WHERE Id IN ('a')",
        )
        .unwrap();

        assert_eq!(records, vec![json!({"Id": "a"})]);
        assert_eq!(remote.requests()[0].path, "/services/data/v40.0/query");
    }

    #[test]
    fn error_status_is_response_error() {
        let remote = Arc::new(MemoryRemote::new());
        remote.push_response(RestResponse::error(401, "INVALID_SESSION_ID", "expired"));
        let result = fetch_records(&ctx(remote), "SELECT Id FROM Account WHERE Id IN ('a')");
        assert!(matches!(result, Err(SyncError::Response(m)) if m.contains("401")));
    }

    #[test]
    fn missing_records_is_response_error() {
        let remote = Arc::new(MemoryRemote::new());
        remote.push_response(RestResponse::new(200, br#"{"totalSize": 1}"#.to_vec()));
        let result = fetch_records(&ctx(remote), "SELECT Id FROM Account WHERE Id IN ('a')");
        assert!(matches!(result, Err(SyncError::Response(_))));
    }

    #[test]
    fn transport_failure_is_surfaced() {
        let remote = Arc::new(MemoryRemote::new());
        remote.fail_call(0);
        let result = fetch_records(&ctx(remote), "SELECT Id FROM Account WHERE Id IN ('a')");
        assert!(matches!(result, Err(SyncError::Transport { .. })));
    }
}
