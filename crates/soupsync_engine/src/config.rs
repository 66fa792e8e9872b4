//! Configuration for sync-down targets.
//!
//! Targets persist as JSON objects tagged by `queryType`:
//!
//! ```json
//! {"queryType": "refresh", "fieldlist": ["Id", "Name"],
//!  "sobjectType": "Account", "soupName": "accounts"}
//! ```

use crate::error::{SyncError, SyncResult};
use serde::{Deserialize, Serialize};
use soupsync_protocol::validate_identifier;
use std::fmt;

/// Default number of ids packed into one remote query.
///
/// 500 ids of 18 characters render to a query of about 11,000 characters,
/// well within [`soupsync_protocol::MAX_QUERY_LENGTH`].
pub const DEFAULT_BATCH_SIZE: usize = 500;

/// Default name of the record id field.
pub const DEFAULT_ID_FIELD: &str = "Id";

/// Default name of the modification timestamp field.
pub const DEFAULT_MODIFICATION_DATE_FIELD: &str = "LastModifiedDate";

fn default_id_field() -> String {
    DEFAULT_ID_FIELD.to_string()
}

fn default_modification_date_field() -> String {
    DEFAULT_MODIFICATION_DATE_FIELD.to_string()
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

/// The kind of a sync-down target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QueryType {
    /// Re-fetches the records already in a soup.
    Refresh,
    /// Runs a query, optionally filtered by modification time.
    Soql,
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryType::Refresh => f.write_str("refresh"),
            QueryType::Soql => f.write_str("soql"),
        }
    }
}

/// Configuration of a refresh target.
///
/// Immutable once built; run state lives in
/// [`PaginationState`](crate::PaginationState).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTargetConfig {
    #[serde(default = "default_id_field")]
    id_field_name: String,
    #[serde(default = "default_modification_date_field")]
    modification_date_field_name: String,
    #[serde(rename = "fieldlist")]
    field_list: Vec<String>,
    #[serde(rename = "sobjectType")]
    object_type: String,
    soup_name: String,
    #[serde(rename = "countIdsPerSoql", default = "default_batch_size")]
    batch_size: usize,
}

impl RefreshTargetConfig {
    /// Creates a configuration re-fetching `field_list` of `object_type` for
    /// the records of `soup_name`.
    pub fn new<I, S>(field_list: I, object_type: impl Into<String>, soup_name: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id_field_name: default_id_field(),
            modification_date_field_name: default_modification_date_field(),
            field_list: field_list.into_iter().map(Into::into).collect(),
            object_type: object_type.into(),
            soup_name: soup_name.into(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Sets the number of ids per remote query.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Sets the id field name.
    pub fn with_id_field_name(mut self, name: impl Into<String>) -> Self {
        self.id_field_name = name.into();
        self
    }

    /// Sets the modification date field name.
    pub fn with_modification_date_field_name(mut self, name: impl Into<String>) -> Self {
        self.modification_date_field_name = name.into();
        self
    }

    /// Returns the id field name.
    pub fn id_field_name(&self) -> &str {
        &self.id_field_name
    }

    /// Returns the modification date field name.
    pub fn modification_date_field_name(&self) -> &str {
        &self.modification_date_field_name
    }

    /// Returns the fields fetched per record.
    pub fn field_list(&self) -> &[String] {
        &self.field_list
    }

    /// Returns the remote object type.
    pub fn object_type(&self) -> &str {
        &self.object_type
    }

    /// Returns the local soup name.
    pub fn soup_name(&self) -> &str {
        &self.soup_name
    }

    /// Returns the number of ids per remote query.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Checks that the configuration can drive a sync.
    pub fn validate(&self) -> SyncResult<()> {
        validate_fields(&self.field_list, &self.id_field_name)?;
        validate_identifier("object type", &self.object_type)?;
        validate_identifier("modification date field", &self.modification_date_field_name)?;
        if self.soup_name.trim().is_empty() {
            return Err(SyncError::InvalidInput("soup name is empty".into()));
        }
        if self.batch_size == 0 {
            return Err(SyncError::InvalidInput("batch size must be at least 1".into()));
        }
        Ok(())
    }
}

/// Configuration of a query target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoqlTargetConfig {
    #[serde(default = "default_id_field")]
    id_field_name: String,
    #[serde(default = "default_modification_date_field")]
    modification_date_field_name: String,
    #[serde(rename = "fieldlist")]
    field_list: Vec<String>,
    #[serde(rename = "sobjectType")]
    object_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    where_clause: Option<String>,
}

impl SoqlTargetConfig {
    /// Creates a configuration fetching `field_list` of `object_type`.
    pub fn new<I, S>(field_list: I, object_type: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id_field_name: default_id_field(),
            modification_date_field_name: default_modification_date_field(),
            field_list: field_list.into_iter().map(Into::into).collect(),
            object_type: object_type.into(),
            where_clause: None,
        }
    }

    /// Restricts the query with a verbatim `WHERE` clause.
    pub fn with_where_clause(mut self, clause: impl Into<String>) -> Self {
        self.where_clause = Some(clause.into());
        self
    }

    /// Sets the id field name.
    pub fn with_id_field_name(mut self, name: impl Into<String>) -> Self {
        self.id_field_name = name.into();
        self
    }

    /// Sets the modification date field name.
    pub fn with_modification_date_field_name(mut self, name: impl Into<String>) -> Self {
        self.modification_date_field_name = name.into();
        self
    }

    /// Returns the id field name.
    pub fn id_field_name(&self) -> &str {
        &self.id_field_name
    }

    /// Returns the modification date field name.
    pub fn modification_date_field_name(&self) -> &str {
        &self.modification_date_field_name
    }

    /// Returns the fields fetched per record.
    pub fn field_list(&self) -> &[String] {
        &self.field_list
    }

    /// Returns the remote object type.
    pub fn object_type(&self) -> &str {
        &self.object_type
    }

    /// Returns the extra `WHERE` clause, if any.
    pub fn where_clause(&self) -> Option<&str> {
        self.where_clause.as_deref()
    }

    /// Checks that the configuration can drive a sync.
    pub fn validate(&self) -> SyncResult<()> {
        validate_fields(&self.field_list, &self.id_field_name)?;
        validate_identifier("object type", &self.object_type)?;
        validate_identifier("modification date field", &self.modification_date_field_name)?;
        if matches!(&self.where_clause, Some(clause) if clause.trim().is_empty()) {
            return Err(SyncError::InvalidInput("where clause is empty".into()));
        }
        Ok(())
    }
}

/// Fetched records are stored keyed by the id field, so it must be
/// selected.
fn validate_fields(fields: &[String], id_field: &str) -> SyncResult<()> {
    if fields.is_empty() {
        return Err(SyncError::InvalidInput("field list is empty".into()));
    }
    for field in fields {
        validate_identifier("field", field)?;
    }
    validate_identifier("id field", id_field)?;
    if !fields.iter().any(|field| field == id_field) {
        return Err(SyncError::InvalidInput(format!(
            "field list must include the id field {id_field}"
        )));
    }
    Ok(())
}

/// A persisted target, tagged by `queryType`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "queryType", rename_all = "camelCase")]
pub enum TargetSpec {
    /// A refresh target.
    Refresh(RefreshTargetConfig),
    /// A query target.
    Soql(SoqlTargetConfig),
}

impl TargetSpec {
    /// Parses and validates a persisted target.
    pub fn from_json(json: &str) -> SyncResult<Self> {
        let spec: TargetSpec = serde_json::from_str(json)
            .map_err(|e| SyncError::InvalidInput(format!("invalid target: {e}")))?;
        spec.validate()?;
        Ok(spec)
    }

    /// Serializes the target.
    pub fn to_json(&self) -> SyncResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| SyncError::InvalidInput(format!("cannot serialize target: {e}")))
    }

    /// Returns the target kind.
    pub fn query_type(&self) -> QueryType {
        match self {
            TargetSpec::Refresh(_) => QueryType::Refresh,
            TargetSpec::Soql(_) => QueryType::Soql,
        }
    }

    /// Validates the wrapped configuration.
    pub fn validate(&self) -> SyncResult<()> {
        match self {
            TargetSpec::Refresh(config) => config.validate(),
            TargetSpec::Soql(config) => config.validate(),
        }
    }
}
