//! Database module
//!
//! Storage access behind the [`Store`] trait:
//! - Table-addressed queries with AND-combined filter predicates
//! - Rows exchanged as JSON objects and decoded into domain models
//! - PostgreSQL (sqlx), hosted PostgREST (reqwest) and in-memory backends
//! - Repository functions per table on top of the trait

pub mod memory;
pub mod pool;
pub mod postgres;
pub mod postgrest;
pub mod repository;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

pub use memory::MemoryStore;
pub use pool::{create_pool, run_migrations};
pub use postgres::PgStore;
pub use postgrest::PostgrestStore;

/// A single row as returned by the store
pub type Row = Map<String, Value>;

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by a store backend
#[derive(Debug, Error)]
pub enum StoreError {
    /// A required column was missing or null (SQLSTATE 23502)
    #[error("null value violates not-null constraint: {0}")]
    NotNull(String),

    /// A uniqueness constraint was violated (SQLSTATE 23505)
    #[error("duplicate key value violates unique constraint: {0}")]
    Unique(String),

    /// Any other refusal by the store
    #[error("store rejected the request: {0}")]
    Rejected(String),

    /// The store could not be reached or the call failed in transit
    #[error("store request failed: {0}")]
    Request(String),

    /// The store answered with something that is not the expected shape
    #[error("malformed store response: {0}")]
    Malformed(String),

    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),
}

impl StoreError {
    /// Map a SQLSTATE code to the matching variant
    pub fn from_sqlstate(code: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        match code {
            "23502" => StoreError::NotNull(message),
            "23505" => StoreError::Unique(message),
            _ => StoreError::Rejected(message),
        }
    }
}

/// Filter predicate applied to a single column
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Exact equality. A `Null` operand means `IS NULL` on every backend;
    /// the repositories never build one, backends handle it so the trait
    /// has no unsupported inputs.
    Eq(String, Value),
    /// Case-insensitive substring match
    ILike(String, String),
    /// Set membership; an empty set matches nothing
    In(String, Vec<Value>),
}

impl Filter {
    pub fn column(&self) -> &str {
        match self {
            Filter::Eq(column, _) | Filter::ILike(column, _) | Filter::In(column, _) => column,
        }
    }
}

/// Table-addressed query with filters combined by logical AND
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub table: String,
    pub filters: Vec<Filter>,
}

impl Query {
    pub fn table(name: impl Into<String>) -> Self {
        Self {
            table: name.into(),
            filters: Vec::new(),
        }
    }

    pub fn eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Eq(column.into(), value.into()));
        self
    }

    pub fn ilike(mut self, column: impl Into<String>, needle: impl Into<String>) -> Self {
        self.filters.push(Filter::ILike(column.into(), needle.into()));
        self
    }

    pub fn in_<V: Into<Value>>(
        mut self,
        column: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        let values = values.into_iter().map(Into::into).collect();
        self.filters.push(Filter::In(column.into(), values));
        self
    }
}

/// Storage backend used by the services
///
/// Every call is a single round trip; nothing here is atomic across calls.
#[async_trait]
pub trait Store: Send + Sync {
    /// Short name of the backend (for health output)
    fn backend(&self) -> &'static str;

    /// Fetch all rows matching the query
    async fn select(&self, query: &Query) -> StoreResult<Vec<Row>>;

    /// Insert a row and return it as stored (including generated columns)
    async fn insert(&self, table: &str, row: Row) -> StoreResult<Row>;

    /// Apply `changes` to every matching row, returning how many were touched
    async fn update(&self, query: &Query, changes: Row) -> StoreResult<u64>;

    /// Delete every matching row, returning how many were removed
    async fn delete(&self, query: &Query) -> StoreResult<u64>;

    /// Cheap connectivity probe
    async fn health_check(&self) -> bool;
}

/// Decode store rows into typed models
pub fn decode_rows<T: DeserializeOwned>(rows: Vec<Row>) -> StoreResult<Vec<T>> {
    rows.into_iter().map(decode_row).collect()
}

pub fn decode_row<T: DeserializeOwned>(row: Row) -> StoreResult<T> {
    serde_json::from_value(Value::Object(row)).map_err(|e| StoreError::Malformed(e.to_string()))
}

/// Encode a model into a row, dropping unset (`null`) fields
pub fn encode_row<T: Serialize>(value: &T) -> StoreResult<Row> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Ok(map.into_iter().filter(|(_, v)| !v.is_null()).collect()),
        Ok(other) => Err(StoreError::Malformed(format!(
            "expected an object, got {}",
            other
        ))),
        Err(e) => Err(StoreError::Malformed(e.to_string())),
    }
}

/// Table and column names are interpolated into SQL and URLs, so only
/// lowercase ASCII letters, digits and underscores are allowed.
pub fn validate_identifier(name: &str) -> StoreResult<&str> {
    let valid = !name.is_empty()
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');

    if valid {
        Ok(name)
    } else {
        Err(StoreError::InvalidIdentifier(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Sample {
        id: i64,
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    }

    #[test]
    fn test_query_builder_chains_filters() {
        let query = Query::table("songs")
            .ilike("artist_name", "queen")
            .eq("year", 1975)
            .in_("id", [1, 2]);

        assert_eq!(query.table, "songs");
        assert_eq!(
            query.filters,
            vec![
                Filter::ILike("artist_name".into(), "queen".into()),
                Filter::Eq("year".into(), json!(1975)),
                Filter::In("id".into(), vec![json!(1), json!(2)]),
            ]
        );
        assert_eq!(query.filters[1].column(), "year");
    }

    #[test]
    fn test_decode_row_rejects_wrong_shape() {
        let row = json!({ "id": "not-a-number" });
        let row = row.as_object().cloned().unwrap();
        let err = decode_row::<Sample>(row).unwrap_err();
        assert!(matches!(err, StoreError::Malformed(_)));
    }

    #[test]
    fn test_encode_row_drops_nulls() {
        let row = encode_row(&json!({ "id": 3, "name": null })).unwrap();
        assert_eq!(row.len(), 1);
        assert_eq!(row.get("id"), Some(&json!(3)));

        assert!(matches!(encode_row(&json!([1, 2])), Err(StoreError::Malformed(_))));
    }

    #[test]
    fn test_validate_identifier() {
        assert!(validate_identifier("favorites").is_ok());
        assert!(validate_identifier("track_id").is_ok());
        assert!(validate_identifier("").is_err());
        assert!(validate_identifier("1songs").is_err());
        assert!(validate_identifier("songs; drop table users").is_err());
        assert!(validate_identifier("Songs").is_err());
    }

    #[test]
    fn test_sqlstate_mapping() {
        assert!(matches!(StoreError::from_sqlstate("23502", "x"), StoreError::NotNull(_)));
        assert!(matches!(StoreError::from_sqlstate("23505", "x"), StoreError::Unique(_)));
        assert!(matches!(StoreError::from_sqlstate("42P01", "x"), StoreError::Rejected(_)));
    }
}
