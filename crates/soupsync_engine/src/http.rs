//! HTTP transport implementation.
//!
//! The actual HTTP client is abstracted via a trait so that any library
//! (reqwest, ureq, hyper) can carry the requests. Authentication headers
//! are the client's concern.

use crate::error::{SyncError, SyncResult};
use crate::transport::SyncTransport;
use parking_lot::RwLock;
use soupsync_protocol::{RestRequest, RestResponse};
use url::Url;

/// HTTP client abstraction.
pub trait HttpClient: Send + Sync {
    /// Sends a GET request and returns the status code and body.
    ///
    /// Errors are failures to obtain any response.
    fn get(&self, url: &Url) -> Result<(u16, Vec<u8>), String>;
}

/// HTTP-based sync transport against a REST instance.
pub struct HttpTransport<C: HttpClient> {
    /// Instance root, e.g. `https://na1.example.com`.
    instance_url: Url,
    /// HTTP client implementation.
    client: C,
    /// Last error message.
    last_error: RwLock<Option<String>>,
}

impl<C: HttpClient> HttpTransport<C> {
    /// Creates a transport for the instance at `instance_url`.
    ///
    /// # Errors
    ///
    /// Fails with [`SyncError::InvalidInput`] if the URL does not parse or
    /// cannot be a base.
    pub fn new(instance_url: &str, client: C) -> SyncResult<Self> {
        let instance_url = Url::parse(instance_url)
            .map_err(|e| SyncError::InvalidInput(format!("invalid instance url: {e}")))?;
        if instance_url.cannot_be_a_base() {
            return Err(SyncError::InvalidInput(format!(
                "instance url {instance_url} cannot be a base"
            )));
        }
        Ok(Self {
            instance_url,
            client,
            last_error: RwLock::new(None),
        })
    }

    /// Returns the instance URL.
    pub fn instance_url(&self) -> &Url {
        &self.instance_url
    }

    /// Returns the last error message.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.read().clone()
    }

    /// Resolves `request` against the instance URL.
    ///
    /// Request paths are absolute (`/services/...`); a `nextRecordsUrl`
    /// given as a full URL is used as is. Parameters are percent-encoded.
    pub fn request_url(&self, request: &RestRequest) -> SyncResult<Url> {
        let mut url = self
            .instance_url
            .join(&request.path)
            .map_err(|e| SyncError::InvalidInput(format!("invalid request path {}: {e}", request.path)))?;
        if !request.params.is_empty() {
            url.query_pairs_mut().extend_pairs(
                request
                    .params
                    .iter()
                    .map(|(name, value)| (name.as_str(), value.as_str())),
            );
        }
        Ok(url)
    }
}

impl<C: HttpClient> SyncTransport for HttpTransport<C> {
    fn send(&self, request: &RestRequest) -> SyncResult<RestResponse> {
        let url = self.request_url(request)?;
        match self.client.get(&url) {
            Ok((status, body)) => {
                *self.last_error.write() = None;
                Ok(RestResponse::new(status, body))
            }
            Err(e) => {
                *self.last_error.write() = Some(e.clone());
                Err(SyncError::transport_retryable(e))
            }
        }
    }
}
