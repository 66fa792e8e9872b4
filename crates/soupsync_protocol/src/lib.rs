//! # SoupSync Protocol
//!
//! Query building and REST envelope types for SoupSync.
//!
//! This crate provides:
//! - `SoqlBuilder` and `IdQuery` for bounded remote queries
//! - `RestRequest` / `RestResponse` as seen by a transport
//! - `QueryResponse`, the `records` envelope returned by the remote
//! - Timestamp helpers for modification-date filtering
//!
//! This is a pure protocol crate with no I/O operations.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod request;
mod response;
mod soql;
mod time;

pub use error::{ProtocolError, ProtocolResult};
pub use request::{RestRequest, RestResponse, DEFAULT_API_VERSION, QUERY_PARAM};
pub use response::{record_ids, QueryResponse, RECORDS};
pub use soql::{
    validate_id_literal, validate_identifier, IdQuery, SoqlBuilder, MAX_QUERY_LENGTH,
};
pub use time::{format_soql_datetime, max_timestamp, parse_remote_datetime};
