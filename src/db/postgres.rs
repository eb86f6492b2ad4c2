//! PostgreSQL store backed by a sqlx connection pool
//!
//! Rows come back as `to_jsonb(t)` so every table shares one decoding path.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::{pool, validate_identifier, Filter, Query, Row, Store, StoreError, StoreResult};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn select(&self, query: &Query) -> StoreResult<Vec<Row>> {
        let mut builder = build_select(query)?;
        let values: Vec<Value> = builder
            .build_query_scalar()
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        values.into_iter().map(into_row).collect()
    }

    async fn insert(&self, table: &str, row: Row) -> StoreResult<Row> {
        let mut builder = build_insert(table, &row)?;
        let value: Value = builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        into_row(value)
    }

    async fn update(&self, query: &Query, changes: Row) -> StoreResult<u64> {
        let mut builder = build_update(query, &changes)?;
        let result = builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }

    async fn delete(&self, query: &Query) -> StoreResult<u64> {
        let mut builder = build_delete(query)?;
        let result = builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }

    async fn health_check(&self) -> bool {
        pool::health_check(&self.pool).await
    }
}

fn build_select(query: &Query) -> StoreResult<QueryBuilder<'static, Postgres>> {
    let table = validate_identifier(&query.table)?;
    let mut builder = QueryBuilder::new(format!("SELECT to_jsonb(t) FROM {} AS t", table));
    push_where(&mut builder, &query.filters)?;
    Ok(builder)
}

fn build_insert(table: &str, row: &Row) -> StoreResult<QueryBuilder<'static, Postgres>> {
    let table = validate_identifier(table)?;
    let mut builder = QueryBuilder::new(format!("INSERT INTO {} AS t ", table));

    if row.is_empty() {
        builder.push("DEFAULT VALUES");
    } else {
        builder.push("(");
        for (i, column) in row.keys().enumerate() {
            if i > 0 {
                builder.push(", ");
            }
            builder.push(validate_identifier(column)?);
        }
        builder.push(") VALUES (");
        for (i, value) in row.values().enumerate() {
            if i > 0 {
                builder.push(", ");
            }
            push_value(&mut builder, value);
        }
        builder.push(")");
    }

    builder.push(" RETURNING to_jsonb(t)");
    Ok(builder)
}

fn build_update(query: &Query, changes: &Row) -> StoreResult<QueryBuilder<'static, Postgres>> {
    if changes.is_empty() {
        return Err(StoreError::Rejected("no columns to update".to_string()));
    }

    let table = validate_identifier(&query.table)?;
    let mut builder = QueryBuilder::new(format!("UPDATE {} SET ", table));

    for (i, (column, value)) in changes.iter().enumerate() {
        if i > 0 {
            builder.push(", ");
        }
        builder.push(validate_identifier(column)?);
        builder.push(" = ");
        push_value(&mut builder, value);
    }

    push_where(&mut builder, &query.filters)?;
    Ok(builder)
}

fn build_delete(query: &Query) -> StoreResult<QueryBuilder<'static, Postgres>> {
    let table = validate_identifier(&query.table)?;
    let mut builder = QueryBuilder::new(format!("DELETE FROM {}", table));
    push_where(&mut builder, &query.filters)?;
    Ok(builder)
}

fn push_where(builder: &mut QueryBuilder<'static, Postgres>, filters: &[Filter]) -> StoreResult<()> {
    for (i, filter) in filters.iter().enumerate() {
        builder.push(if i == 0 { " WHERE " } else { " AND " });
        let column = validate_identifier(filter.column())?;

        match filter {
            Filter::Eq(_, Value::Null) => {
                builder.push(format!("{} IS NULL", column));
            }
            Filter::Eq(_, value) => {
                builder.push(format!("{} = ", column));
                push_value(builder, value);
            }
            Filter::ILike(_, needle) => {
                builder.push(format!("{} ILIKE ", column));
                builder.push_bind(format!("%{}%", escape_like(needle)));
            }
            Filter::In(_, values) if values.is_empty() => {
                builder.push("FALSE");
            }
            Filter::In(_, values) => {
                builder.push(format!("{} IN (", column));
                for (j, value) in values.iter().enumerate() {
                    if j > 0 {
                        builder.push(", ");
                    }
                    push_value(builder, value);
                }
                builder.push(")");
            }
        }
    }

    Ok(())
}

fn push_value(builder: &mut QueryBuilder<'static, Postgres>, value: &Value) {
    match value {
        Value::Null => {
            builder.push("NULL");
        }
        Value::Bool(b) => {
            builder.push_bind(*b);
        }
        Value::Number(n) => match n.as_i64() {
            Some(i) => {
                builder.push_bind(i);
            }
            None => {
                builder.push_bind(n.as_f64().unwrap_or_default());
            }
        },
        Value::String(s) => {
            builder.push_bind(s.clone());
        }
        other => {
            builder.push_bind(Json(other.clone()));
        }
    }
}

/// Escape LIKE metacharacters so the needle matches literally
fn escape_like(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len());
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn into_row(value: Value) -> StoreResult<Row> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::Malformed(format!("expected a row object, got {}", other))),
    }
}

fn map_sqlx_error(e: sqlx::Error) -> StoreError {
    match &e {
        sqlx::Error::Database(db) => match db.code() {
            Some(code) => StoreError::from_sqlstate(&code, db.message()),
            None => StoreError::Rejected(db.message().to_string()),
        },
        sqlx::Error::RowNotFound => StoreError::Malformed("no row returned".to_string()),
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
            StoreError::Malformed(e.to_string())
        }
        _ => StoreError::Request(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_select_sql() {
        let query = Query::table("songs")
            .ilike("artist_name", "queen")
            .eq("year", 1975)
            .eq("genre", "Rock");
        let builder = build_select(&query).unwrap();
        assert_eq!(
            builder.sql(),
            "SELECT to_jsonb(t) FROM songs AS t WHERE artist_name ILIKE $1 AND year = $2 AND genre = $3"
        );
    }

    #[test]
    fn test_select_without_filters() {
        let builder = build_select(&Query::table("users")).unwrap();
        assert_eq!(builder.sql(), "SELECT to_jsonb(t) FROM users AS t");
    }

    #[test]
    fn test_null_equality_sql() {
        let builder = build_select(&Query::table("songs").eq("genre", Value::Null)).unwrap();
        assert_eq!(builder.sql(), "SELECT to_jsonb(t) FROM songs AS t WHERE genre IS NULL");
    }

    #[test]
    fn test_in_filter_sql() {
        let builder = build_select(&Query::table("songs").in_("id", [4, 8, 15])).unwrap();
        assert_eq!(
            builder.sql(),
            "SELECT to_jsonb(t) FROM songs AS t WHERE id IN ($1, $2, $3)"
        );

        let empty: Vec<i64> = Vec::new();
        let builder = build_select(&Query::table("songs").in_("id", empty)).unwrap();
        assert_eq!(builder.sql(), "SELECT to_jsonb(t) FROM songs AS t WHERE FALSE");
    }

    #[test]
    fn test_insert_sql() {
        let builder = build_insert("favorites", &row(json!({ "song_id": 5, "user_id": 1 }))).unwrap();
        assert_eq!(
            builder.sql(),
            "INSERT INTO favorites AS t (song_id, user_id) VALUES ($1, $2) RETURNING to_jsonb(t)"
        );
    }

    #[test]
    fn test_update_sql() {
        let query = Query::table("songs").eq("id", 7);
        let builder = build_update(&query, &row(json!({ "genre": "Jazz", "year": 1959 }))).unwrap();
        assert_eq!(builder.sql(), "UPDATE songs SET genre = $1, year = $2 WHERE id = $3");

        assert!(matches!(build_update(&query, &Row::new()), Err(StoreError::Rejected(_))));
    }

    #[test]
    fn test_delete_sql() {
        let query = Query::table("favorites").eq("user_id", 1).eq("song_id", 2);
        let builder = build_delete(&query).unwrap();
        assert_eq!(builder.sql(), "DELETE FROM favorites WHERE user_id = $1 AND song_id = $2");
    }

    #[test]
    fn test_rejects_unsafe_identifiers() {
        let query = Query::table("songs").eq("year; DROP TABLE songs", 1);
        assert!(matches!(build_select(&query), Err(StoreError::InvalidIdentifier(_))));
        assert!(matches!(build_delete(&Query::table("Songs")), Err(StoreError::InvalidIdentifier(_))));
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("AC/DC"), "AC/DC");
        assert_eq!(escape_like("100%_pure\\"), "100\\%\\_pure\\\\");
    }
}
