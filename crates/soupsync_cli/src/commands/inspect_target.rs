//! Inspect-target command implementation.

use super::load_target;
use serde::Serialize;
use soupsync_engine::{SoqlTarget, TargetSpec};
use std::path::Path;

/// Human-oriented view of a target.
#[derive(Debug, Serialize)]
pub struct TargetSummary {
    /// Target kind.
    pub query_type: String,
    /// Remote object type.
    pub object_type: String,
    /// Fields fetched.
    pub fields: Vec<String>,
    /// Id field name.
    pub id_field: String,
    /// Modification date field name.
    pub modification_date_field: String,
    /// Soup refreshed (refresh targets).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub soup: Option<String>,
    /// Ids per remote query (refresh targets).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<usize>,
    /// Query of a full run (query targets).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

/// Summarizes a validated target.
pub fn summarize(spec: &TargetSpec) -> Result<TargetSummary, Box<dyn std::error::Error>> {
    let summary = match spec {
        TargetSpec::Refresh(config) => TargetSummary {
            query_type: spec.query_type().to_string(),
            object_type: config.object_type().to_string(),
            fields: config.field_list().to_vec(),
            id_field: config.id_field_name().to_string(),
            modification_date_field: config.modification_date_field_name().to_string(),
            soup: Some(config.soup_name().to_string()),
            batch_size: Some(config.batch_size()),
            query: None,
        },
        TargetSpec::Soql(config) => TargetSummary {
            query_type: spec.query_type().to_string(),
            object_type: config.object_type().to_string(),
            fields: config.field_list().to_vec(),
            id_field: config.id_field_name().to_string(),
            modification_date_field: config.modification_date_field_name().to_string(),
            soup: None,
            batch_size: None,
            query: Some(SoqlTarget::new(config.clone())?.build_query(0)?),
        },
    };
    Ok(summary)
}

/// Runs the inspect-target command.
pub fn run(path: &Path, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let spec = load_target(path)?;
    let summary = summarize(&spec)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        "text" => print_text(path, &summary),
        other => return Err(format!("Unknown format: {other} (expected text or json)").into()),
    }
    Ok(())
}

fn print_text(path: &Path, summary: &TargetSummary) {
    println!("SoupSync Target");
    println!("===============");
    println!();
    println!("File:        {}", path.display());
    println!("Type:        {}", summary.query_type);
    println!("Object:      {}", summary.object_type);
    println!("Fields:      {}", summary.fields.join(", "));
    println!("Id field:    {}", summary.id_field);
    println!("Modified:    {}", summary.modification_date_field);
    if let Some(soup) = &summary.soup {
        println!("Soup:        {soup}");
    }
    if let Some(batch_size) = summary.batch_size {
        println!("Batch size:  {batch_size} ids per query");
    }
    if let Some(query) = &summary.query {
        println!("Query:       {query}");
    }
}
