//! SOQL query building.

use crate::error::{ProtocolError, ProtocolResult};

/// Ceiling on the length of a rendered query.
///
/// An id query over the default batch of 500 record ids of 18 characters
/// renders to about 11,000 characters; twice that batch does not fit.
pub const MAX_QUERY_LENGTH: usize = 20_000;

fn check_length(soql: &str) -> ProtocolResult<()> {
    if soql.len() > MAX_QUERY_LENGTH {
        return Err(ProtocolError::invalid_input(format!(
            "query of {} characters exceeds {MAX_QUERY_LENGTH}",
            soql.len()
        )));
    }
    Ok(())
}

/// Checks that `name` is a plain (optionally dotted) identifier such as
/// `Name`, `Custom__c` or `Owner.Name`.
///
/// `kind` names the thing being checked in the error message.
pub fn validate_identifier(kind: &str, name: &str) -> ProtocolResult<()> {
    let valid = !name.is_empty()
        && name.split('.').all(|segment| {
            let mut chars = segment.chars();
            matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        });

    if valid {
        Ok(())
    } else {
        Err(ProtocolError::invalid_input(format!(
            "{kind} {name:?} is not a valid identifier"
        )))
    }
}

/// Checks that a record id can be embedded in a quoted literal.
///
/// Ids are never escaped: an id containing a quote, a backslash or a
/// control character is rejected.
pub fn validate_id_literal(id: &str) -> ProtocolResult<()> {
    if id.is_empty() {
        return Err(ProtocolError::invalid_input("record id is empty"));
    }
    if let Some(bad) = id
        .chars()
        .find(|c| *c == '\'' || *c == '\\' || c.is_control())
    {
        return Err(ProtocolError::invalid_input(format!(
            "record id {id:?} contains forbidden character {bad:?}"
        )));
    }
    Ok(())
}

/// Builder for `SELECT ... FROM ...` queries.
#[derive(Debug, Clone, Default)]
pub struct SoqlBuilder {
    fields: Vec<String>,
    from: Option<String>,
    where_clause: Option<String>,
    order_by: Option<String>,
    limit: Option<usize>,
}

impl SoqlBuilder {
    /// Creates a builder selecting `fields`.
    pub fn with_fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Sets the object type to query.
    pub fn from(mut self, object_type: impl Into<String>) -> Self {
        self.from = Some(object_type.into());
        self
    }

    /// Sets the `WHERE` clause. The clause is used verbatim.
    pub fn where_clause(mut self, clause: impl Into<String>) -> Self {
        self.where_clause = Some(clause.into());
        self
    }

    /// Sets the `ORDER BY` field.
    pub fn order_by(mut self, field: impl Into<String>) -> Self {
        self.order_by = Some(field.into());
        self
    }

    /// Sets the `LIMIT`.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Renders the query.
    ///
    /// # Errors
    ///
    /// Fails if no field or object type was given, if a field, object
    /// type or order-by field is not a valid identifier, or if the query
    /// is longer than [`MAX_QUERY_LENGTH`].
    pub fn build(&self) -> ProtocolResult<String> {
        if self.fields.is_empty() {
            return Err(ProtocolError::invalid_input("field list is empty"));
        }
        for field in &self.fields {
            validate_identifier("field", field)?;
        }
        let from = self
            .from
            .as_deref()
            .ok_or_else(|| ProtocolError::invalid_input("object type is missing"))?;
        validate_identifier("object type", from)?;

        let mut soql = format!("SELECT {} FROM {}", self.fields.join(", "), from);
        if let Some(clause) = &self.where_clause {
            soql.push_str(" WHERE ");
            soql.push_str(clause);
        }
        if let Some(order_by) = &self.order_by {
            validate_identifier("order by field", order_by)?;
            soql.push_str(" ORDER BY ");
            soql.push_str(order_by);
        }
        if let Some(limit) = self.limit {
            soql.push_str(&format!(" LIMIT {limit}"));
        }
        check_length(&soql)?;
        Ok(soql)
    }
}

/// A query selecting records of one object type by id.
///
/// Renders as `SELECT f1, f2 FROM Type WHERE IdField IN ('a', 'b')`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdQuery {
    fields: Vec<String>,
    object_type: String,
    id_field: String,
    ids: Vec<String>,
}

impl IdQuery {
    /// Creates an id query.
    ///
    /// # Errors
    ///
    /// Fails with [`ProtocolError::InvalidInput`] if `ids` or `fields` is
    /// empty, a name is not a valid identifier, an id cannot be quoted, or
    /// the rendered query is longer than [`MAX_QUERY_LENGTH`].
    pub fn new<I, S>(
        fields: &[String],
        object_type: &str,
        id_field: &str,
        ids: I,
    ) -> ProtocolResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ids: Vec<String> = ids.into_iter().map(Into::into).collect();
        if ids.is_empty() {
            return Err(ProtocolError::invalid_input("id list is empty"));
        }
        if fields.is_empty() {
            return Err(ProtocolError::invalid_input("field list is empty"));
        }
        for field in fields {
            validate_identifier("field", field)?;
        }
        validate_identifier("object type", object_type)?;
        validate_identifier("id field", id_field)?;
        for id in &ids {
            validate_id_literal(id)?;
        }

        let query = Self {
            fields: fields.to_vec(),
            object_type: object_type.to_string(),
            id_field: id_field.to_string(),
            ids,
        };
        check_length(&query.to_soql())?;
        Ok(query)
    }

    /// Returns the selected fields.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Returns the queried object type.
    pub fn object_type(&self) -> &str {
        &self.object_type
    }

    /// Returns the id field name.
    pub fn id_field(&self) -> &str {
        &self.id_field
    }

    /// Returns the ids referenced by the query.
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// Renders the query.
    pub fn to_soql(&self) -> String {
        let quoted: Vec<String> = self.ids.iter().map(|id| format!("'{id}'")).collect();
        format!(
            "SELECT {} FROM {} WHERE {} IN ({})",
            self.fields.join(", "),
            self.object_type,
            self.id_field,
            quoted.join(", ")
        )
    }

    /// Parses a query in the form produced by [`IdQuery::to_soql`].
    ///
    /// # Errors
    ///
    /// Fails with [`ProtocolError::InvalidInput`] for any other shape.
    pub fn parse(soql: &str) -> ProtocolResult<Self> {
        let unsupported = || ProtocolError::invalid_input(format!("unsupported query: {soql}"));

        let rest = soql.strip_prefix("SELECT ").ok_or_else(unsupported)?;
        let (fields, rest) = rest.split_once(" FROM ").ok_or_else(unsupported)?;
        let (object_type, rest) = rest.split_once(" WHERE ").ok_or_else(unsupported)?;
        let (id_field, rest) = rest.split_once(" IN (").ok_or_else(unsupported)?;
        let literals = rest.strip_suffix(')').ok_or_else(unsupported)?;

        let fields: Vec<String> = fields.split(',').map(|f| f.trim().to_string()).collect();
        let ids = parse_literals(literals).ok_or_else(unsupported)?;

        Self::new(&fields, object_type.trim(), id_field.trim(), ids)
    }
}

/// Splits `'a', 'b'` into its literals.
fn parse_literals(list: &str) -> Option<Vec<String>> {
    let mut ids = Vec::new();
    let mut rest = list.trim();
    while !rest.is_empty() {
        let body = rest.strip_prefix('\'')?;
        let end = body.find('\'')?;
        ids.push(body[..end].to_string());
        rest = body[end + 1..].trim_start();
        if let Some(next) = rest.strip_prefix(',') {
            rest = next.trim_start();
            if rest.is_empty() {
                return None;
            }
        } else if !rest.is_empty() {
            return None;
        }
    }
    Some(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn fields(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn builds_id_query() {
        let query = IdQuery::new(&fields(&["Id", "Name"]), "Account", "Id", ["001A", "001B"])
            .unwrap();
        assert_eq!(
            query.to_soql(),
            "SELECT Id, Name FROM Account WHERE Id IN ('001A', '001B')"
        );
    }

    #[test]
    fn rejects_empty_ids() {
        let result = IdQuery::new(&fields(&["Id"]), "Account", "Id", Vec::<String>::new());
        assert!(matches!(result, Err(ProtocolError::InvalidInput(_))));
    }

    #[test]
    fn rejects_empty_fields() {
        let result = IdQuery::new(&[], "Account", "Id", ["001A"]);
        assert!(matches!(result, Err(ProtocolError::InvalidInput(_))));
    }

    #[test]
    fn rejects_quote_in_id() {
        let result = IdQuery::new(&fields(&["Id"]), "Account", "Id", ["001A') OR ('1'='1"]);
        assert!(matches!(result, Err(ProtocolError::InvalidInput(msg)) if msg.contains("'\\''")));

        assert!(validate_id_literal("a\\b").is_err());
        assert!(validate_id_literal("a\nb").is_err());
        assert!(validate_id_literal("").is_err());
        assert!(validate_id_literal("001,A").is_ok());
    }

    #[test]
    fn rejects_bad_identifiers() {
        assert!(validate_identifier("field", "Owner.Name").is_ok());
        assert!(validate_identifier("field", "Custom_Field__c").is_ok());
        assert!(validate_identifier("field", "Name; DELETE").is_err());
        assert!(validate_identifier("field", "1Name").is_err());
        assert!(validate_identifier("field", "Owner.").is_err());
        assert!(IdQuery::new(&fields(&["Id"]), "Acc ount", "Id", ["1"]).is_err());
    }

    #[test]
    fn builder_renders_clauses() {
        let soql = SoqlBuilder::with_fields(["Id", "LastModifiedDate"])
            .from("Contact")
            .where_clause("LastModifiedDate > 2016-05-10T18:45:12.000Z")
            .order_by("LastModifiedDate")
            .limit(10)
            .build()
            .unwrap();
        assert_eq!(
            soql,
            "SELECT Id, LastModifiedDate FROM Contact \
             WHERE LastModifiedDate > 2016-05-10T18:45:12.000Z \
             ORDER BY LastModifiedDate LIMIT 10"
        );
    }

    #[test]
    fn builder_requires_from() {
        let result = SoqlBuilder::with_fields(["Id"]).build();
        assert!(matches!(result, Err(ProtocolError::InvalidInput(_))));
    }

    #[test]
    fn parse_rejects_other_shapes() {
        assert!(IdQuery::parse("SELECT Id FROM Account").is_err());
        assert!(IdQuery::parse("SELECT Id FROM Account WHERE Id IN ('a',)").is_err());
        assert!(IdQuery::parse("SELECT Id FROM Account WHERE Id IN ('a' 'b')").is_err());
    }

    #[test]
    fn parse_keeps_commas_inside_ids() {
        let query = IdQuery::parse("SELECT Id FROM Account WHERE Id IN ('a,b', 'c')").unwrap();
        assert_eq!(query.ids(), &["a,b".to_string(), "c".to_string()]);
    }

    #[test]
    fn five_hundred_ids_fit_the_limit() {
        let ids: Vec<String> = (0..500).map(|i| format!("001{i:015}")).collect();
        let query = IdQuery::new(&fields(&["Id"]), "Account", "Id", ids).unwrap();
        assert!(query.to_soql().len() <= MAX_QUERY_LENGTH);
    }

    #[test]
    fn rejects_query_over_the_limit() {
        let ids: Vec<String> = (0..1000).map(|i| format!("001{i:015}")).collect();
        let result = IdQuery::new(&fields(&["Id", "Name"]), "Account", "Id", ids);
        assert!(matches!(result, Err(ProtocolError::InvalidInput(msg)) if msg.contains("exceeds")));

        let result = SoqlBuilder::with_fields(["Id"])
            .from("Account")
            .where_clause("Name = '".to_string() + &"x".repeat(MAX_QUERY_LENGTH) + "'")
            .build();
        assert!(matches!(result, Err(ProtocolError::InvalidInput(_))));
    }

    proptest! {
        #[test]
        fn parse_inverts_rendering(ids in prop::collection::vec("[A-Za-z0-9, ]{1,12}", 1..20)) {
            let query = IdQuery::new(&fields(&["Id", "Name"]), "Account", "Id", ids.clone()).unwrap();
            let parsed = IdQuery::parse(&query.to_soql()).unwrap();
            prop_assert_eq!(parsed.ids(), ids.as_slice());
        }
    }
}
