//! Collaborators shared by sync targets.

use crate::transport::SyncTransport;
use soupsync_protocol::DEFAULT_API_VERSION;
use soupsync_store::LocalStore;
use std::fmt;
use std::sync::Arc;

/// The local store, remote transport and API version a target syncs with.
///
/// Cheap to clone; targets receive it by reference on every call.
#[derive(Clone)]
pub struct SyncContext {
    store: Arc<dyn LocalStore>,
    transport: Arc<dyn SyncTransport>,
    api_version: String,
}

impl SyncContext {
    /// Creates a context using [`DEFAULT_API_VERSION`].
    pub fn new(store: Arc<dyn LocalStore>, transport: Arc<dyn SyncTransport>) -> Self {
        Self {
            store,
            transport,
            api_version: DEFAULT_API_VERSION.to_string(),
        }
    }

    /// Sets the API version used in request paths.
    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    /// Returns the local store.
    pub fn store(&self) -> &dyn LocalStore {
        self.store.as_ref()
    }

    /// Returns the remote transport.
    pub fn transport(&self) -> &dyn SyncTransport {
        self.transport.as_ref()
    }

    /// Returns the API version.
    pub fn api_version(&self) -> &str {
        &self.api_version
    }
}

impl fmt::Debug for SyncContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncContext")
            .field("api_version", &self.api_version)
            .finish_non_exhaustive()
    }
}
