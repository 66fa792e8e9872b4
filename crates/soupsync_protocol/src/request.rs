//! REST request and response types.

use crate::error::{ProtocolError, ProtocolResult};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// API version used when none is configured.
pub const DEFAULT_API_VERSION: &str = "v39.0";

/// Name of the query-string parameter carrying a SOQL query.
pub const QUERY_PARAM: &str = "q";

/// A request to the remote REST API.
///
/// Requests are relative to the remote instance; the transport decides
/// the host and authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestRequest {
    /// Path relative to the instance, starting with `/`.
    pub path: String,
    /// Query-string parameters, unencoded.
    pub params: Vec<(String, String)>,
}

impl RestRequest {
    /// Creates a query request for `soql`.
    pub fn query(api_version: &str, soql: impl Into<String>) -> Self {
        Self {
            path: format!("/services/data/{api_version}/query"),
            params: vec![(QUERY_PARAM.to_string(), soql.into())],
        }
    }

    /// Creates a request for the `nextRecordsUrl` of a previous query.
    pub fn next_records(next_records_url: impl Into<String>) -> Self {
        Self {
            path: next_records_url.into(),
            params: Vec::new(),
        }
    }

    /// Returns the SOQL carried by a query request.
    pub fn soql(&self) -> Option<&str> {
        self.params
            .iter()
            .find(|(name, _)| name == QUERY_PARAM)
            .map(|(_, value)| value.as_str())
    }
}

/// A response from the remote REST API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body.
    pub body: Vec<u8>,
}

impl RestResponse {
    /// Creates a response from a status code and body.
    pub fn new(status: u16, body: Vec<u8>) -> Self {
        Self { status, body }
    }

    /// Creates a 200 response with a JSON body.
    ///
    /// # Errors
    ///
    /// Fails if `value` cannot be serialized.
    pub fn ok_json<T: Serialize>(value: &T) -> ProtocolResult<Self> {
        let body = serde_json::to_vec(value)
            .map_err(|e| ProtocolError::malformed(format!("failed to encode body: {e}")))?;
        Ok(Self::new(200, body))
    }

    /// Creates an error response in the remote's error-list format.
    pub fn error(status: u16, error_code: &str, message: &str) -> Self {
        let body = serde_json::json!([{ "errorCode": error_code, "message": message }]);
        Self::new(status, body.to_string().into_bytes())
    }

    /// Returns true for 2xx status codes.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Returns the body as text, replacing invalid UTF-8.
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decodes the body as JSON.
    ///
    /// # Errors
    ///
    /// Fails with [`ProtocolError::MalformedResponse`] if the body is not
    /// valid JSON of the expected shape.
    pub fn json<T: DeserializeOwned>(&self) -> ProtocolResult<T> {
        serde_json::from_slice(&self.body).map_err(|e| ProtocolError::malformed(e.to_string()))
    }
}
