//! Business logic on top of the store
//!
//! Every operation is a sequence of independent store calls. Existence and
//! uniqueness pre-checks are not atomic with the write that follows them;
//! store-level unique constraints are the backstop under concurrent clients.

pub mod admin;
pub mod user;

pub use admin::AdminService;
pub use user::UserService;

#[cfg(test)]
pub(crate) mod testing {
    use async_trait::async_trait;

    use crate::db::{Query, Row, Store, StoreError, StoreResult};

    /// Store double that fails every call with the same error
    pub struct FailingStore {
        make: fn() -> StoreError,
    }

    impl FailingStore {
        pub fn unreachable() -> Self {
            Self {
                make: || StoreError::Request("connection refused".to_string()),
            }
        }

        pub fn malformed() -> Self {
            Self {
                make: || StoreError::Malformed("expected a row array, got {}".to_string()),
            }
        }

        pub fn not_null() -> Self {
            Self {
                make: || StoreError::NotNull("null value in column \"genre\"".to_string()),
            }
        }
    }

    #[async_trait]
    impl Store for FailingStore {
        fn backend(&self) -> &'static str {
            "failing"
        }

        async fn select(&self, _query: &Query) -> StoreResult<Vec<Row>> {
            Err((self.make)())
        }

        async fn insert(&self, _table: &str, _row: Row) -> StoreResult<Row> {
            Err((self.make)())
        }

        async fn update(&self, _query: &Query, _changes: Row) -> StoreResult<u64> {
            Err((self.make)())
        }

        async fn delete(&self, _query: &Query) -> StoreResult<u64> {
            Err((self.make)())
        }

        async fn health_check(&self) -> bool {
            false
        }
    }

    /// Store double for a lost check-then-insert race: the duplicate is not
    /// visible to the lookup, but the insert violates a unique constraint.
    pub struct RacingStore;

    #[async_trait]
    impl Store for RacingStore {
        fn backend(&self) -> &'static str {
            "racing"
        }

        async fn select(&self, query: &Query) -> StoreResult<Vec<Row>> {
            // Songs and users must exist for add_favorite to reach its insert
            match query.table.as_str() {
                "songs" => Ok(vec![row(serde_json::json!({
                    "id": 5,
                    "artist_name": "A",
                    "track_name": "B",
                    "track_id": "T1",
                    "year": 2020,
                    "genre": "Pop"
                }))]),
                "users" if query.filters.iter().any(|f| f.column() == "id") => {
                    Ok(vec![row(serde_json::json!({
                        "id": 1,
                        "username": "alice",
                        "password": "x"
                    }))])
                }
                _ => Ok(Vec::new()),
            }
        }

        async fn insert(&self, table: &str, _row: Row) -> StoreResult<Row> {
            Err(StoreError::Unique(format!("duplicate key in \"{}\"", table)))
        }

        async fn update(&self, _query: &Query, _changes: Row) -> StoreResult<u64> {
            Ok(0)
        }

        async fn delete(&self, _query: &Query) -> StoreResult<u64> {
            Ok(0)
        }

        async fn health_check(&self) -> bool {
            true
        }
    }

    fn row(value: serde_json::Value) -> Row {
        match value {
            serde_json::Value::Object(map) => map,
            _ => Row::new(),
        }
    }
}
