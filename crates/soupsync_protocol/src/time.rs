//! Modification timestamps.
//!
//! Timestamps are milliseconds since the Unix epoch. The remote renders
//! them as `2016-05-10T18:45:12.000+0000`; queries take the UTC form
//! `2016-05-10T18:45:12.000Z`.

use crate::error::{ProtocolError, ProtocolResult};
use chrono::{DateTime, Utc};
use serde_json::Value;

/// Formats `millis` as a SOQL datetime literal.
///
/// # Errors
///
/// Fails if `millis` is outside the representable range.
pub fn format_soql_datetime(millis: i64) -> ProtocolResult<String> {
    let datetime: DateTime<Utc> = DateTime::from_timestamp_millis(millis).ok_or_else(|| {
        ProtocolError::invalid_input(format!("timestamp {millis} is out of range"))
    })?;
    Ok(datetime.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string())
}

/// Parses a remote datetime into milliseconds since the epoch.
pub fn parse_remote_datetime(text: &str) -> Option<i64> {
    DateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f%z")
        .or_else(|_| DateTime::parse_from_rfc3339(text))
        .ok()
        .map(|datetime| datetime.timestamp_millis())
}

/// Returns the latest `field` timestamp among `records`.
pub fn max_timestamp(records: &[Value], field: &str) -> Option<i64> {
    records
        .iter()
        .filter_map(|record| record.get(field).and_then(Value::as_str))
        .filter_map(parse_remote_datetime)
        .max()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const MAY_10_2016: i64 = 1_462_905_912_000;

    #[test]
    fn formats_utc_literal() {
        assert_eq!(
            format_soql_datetime(MAY_10_2016).unwrap(),
            "2016-05-10T18:45:12.000Z"
        );
    }

    #[test]
    fn parses_remote_forms() {
        assert_eq!(
            parse_remote_datetime("2016-05-10T18:45:12.000+0000"),
            Some(MAY_10_2016)
        );
        assert_eq!(
            parse_remote_datetime("2016-05-10T18:45:12.000Z"),
            Some(MAY_10_2016)
        );
        assert_eq!(parse_remote_datetime("yesterday"), None);
    }

    #[test]
    fn max_timestamp_ignores_unparseable() {
        let records = vec![
            json!({"LastModifiedDate": "2016-05-10T18:45:12.000+0000"}),
            json!({"LastModifiedDate": "2016-05-10T18:45:13.000+0000"}),
            json!({"LastModifiedDate": "garbage"}),
            json!({}),
        ];
        assert_eq!(
            max_timestamp(&records, "LastModifiedDate"),
            Some(MAY_10_2016 + 1000)
        );
        assert_eq!(max_timestamp(&[], "LastModifiedDate"), None);
    }
}
