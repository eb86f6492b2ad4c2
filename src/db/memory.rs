//! In-process store used for local development and tests
//!
//! Mirrors the constraints of the SQL migration: generated ids, NOT NULL
//! columns and UNIQUE column sets. Foreign keys are not enforced.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use super::{Filter, Query, Row, Store, StoreError, StoreResult};

struct TableSchema {
    name: &'static str,
    required: &'static [&'static str],
    unique: &'static [&'static [&'static str]],
}

const CATALOG: &[TableSchema] = &[
    TableSchema {
        name: "songs",
        required: &["artist_name", "track_name", "track_id", "year", "genre"],
        unique: &[],
    },
    TableSchema {
        name: "users",
        required: &["username", "password"],
        unique: &[&["username"]],
    },
    TableSchema {
        name: "favorites",
        required: &["user_id", "song_id"],
        unique: &[&["user_id", "song_id"]],
    },
];

struct Table {
    schema: &'static TableSchema,
    next_id: i64,
    rows: Vec<Row>,
}

impl Table {
    fn new(schema: &'static TableSchema) -> Self {
        Self {
            schema,
            next_id: 1,
            rows: Vec::new(),
        }
    }

    fn check_required(&self, row: &Row) -> StoreResult<()> {
        for column in self.schema.required {
            if row.get(*column).map_or(true, Value::is_null) {
                return Err(StoreError::NotNull(format!(
                    "null value in column \"{}\" of relation \"{}\"",
                    column, self.schema.name
                )));
            }
        }
        Ok(())
    }

    /// `skip` excludes the row being replaced during an update
    fn check_unique(&self, row: &Row, skip: Option<usize>) -> StoreResult<()> {
        for columns in self.schema.unique {
            let clash = self.rows.iter().enumerate().any(|(i, existing)| {
                Some(i) != skip
                    && columns
                        .iter()
                        .all(|c| existing.get(*c) == row.get(*c) && row.get(*c).is_some())
            });

            if clash {
                return Err(StoreError::Unique(format!(
                    "Key ({}) already exists in \"{}\"",
                    columns.join(", "),
                    self.schema.name
                )));
            }
        }
        Ok(())
    }
}

pub struct MemoryStore {
    tables: Mutex<HashMap<&'static str, Table>>,
}

impl MemoryStore {
    /// Empty store with the songs, users and favorites tables
    pub fn new() -> Self {
        let tables = CATALOG
            .iter()
            .map(|schema| (schema.name, Table::new(schema)))
            .collect();

        Self {
            tables: Mutex::new(tables),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn unknown_table(name: &str) -> StoreError {
    StoreError::Rejected(format!("relation \"{}\" does not exist", name))
}

#[async_trait]
impl Store for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn select(&self, query: &Query) -> StoreResult<Vec<Row>> {
        let tables = self.tables.lock().await;
        let table = tables
            .get(query.table.as_str())
            .ok_or_else(|| unknown_table(&query.table))?;

        Ok(table
            .rows
            .iter()
            .filter(|row| matches(row, &query.filters))
            .cloned()
            .collect())
    }

    async fn insert(&self, table: &str, mut row: Row) -> StoreResult<Row> {
        let mut tables = self.tables.lock().await;
        let table = tables.get_mut(table).ok_or_else(|| unknown_table(table))?;

        table.check_required(&row)?;
        table.check_unique(&row, None)?;

        row.insert("id".to_string(), Value::from(table.next_id));
        table.next_id += 1;
        table.rows.push(row.clone());

        Ok(row)
    }

    async fn update(&self, query: &Query, changes: Row) -> StoreResult<u64> {
        if changes.is_empty() {
            return Err(StoreError::Rejected("no columns to update".to_string()));
        }

        let mut tables = self.tables.lock().await;
        let table = tables
            .get_mut(query.table.as_str())
            .ok_or_else(|| unknown_table(&query.table))?;

        // Validate every replacement before touching anything
        let mut replacements = Vec::new();
        for (i, row) in table.rows.iter().enumerate() {
            if !matches(row, &query.filters) {
                continue;
            }
            let mut updated = row.clone();
            for (column, value) in &changes {
                updated.insert(column.clone(), value.clone());
            }
            table.check_required(&updated)?;
            table.check_unique(&updated, Some(i))?;
            replacements.push((i, updated));
        }

        let count = replacements.len() as u64;
        for (i, updated) in replacements {
            table.rows[i] = updated;
        }

        Ok(count)
    }

    async fn delete(&self, query: &Query) -> StoreResult<u64> {
        let mut tables = self.tables.lock().await;
        let table = tables
            .get_mut(query.table.as_str())
            .ok_or_else(|| unknown_table(&query.table))?;

        let before = table.rows.len();
        table.rows.retain(|row| !matches(row, &query.filters));

        Ok((before - table.rows.len()) as u64)
    }

    async fn health_check(&self) -> bool {
        true
    }
}

fn matches(row: &Row, filters: &[Filter]) -> bool {
    filters.iter().all(|filter| match filter {
        Filter::Eq(column, Value::Null) => row.get(column).map_or(true, Value::is_null),
        Filter::Eq(column, value) => row.get(column).is_some_and(|v| values_equal(v, value)),
        Filter::ILike(column, needle) => row
            .get(column)
            .and_then(Value::as_str)
            .is_some_and(|s| s.to_lowercase().contains(&needle.to_lowercase())),
        Filter::In(column, values) => row
            .get(column)
            .is_some_and(|v| values.iter().any(|candidate| values_equal(v, candidate))),
    })
}

/// Numbers compare by value so `2020` and `2020.0` are equal
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}
