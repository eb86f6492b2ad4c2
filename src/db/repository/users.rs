//! User repository

use crate::db::{decode_row, decode_rows, encode_row, Query, Store, StoreResult};
use crate::models::{UserCreate, UserRecord};

pub const TABLE: &str = "users";

/// List every user row
pub async fn list_all(store: &dyn Store) -> StoreResult<Vec<UserRecord>> {
    let rows = store.select(&Query::table(TABLE)).await?;
    decode_rows(rows)
}

/// Find a user by id
pub async fn find_by_id(store: &dyn Store, id: i64) -> StoreResult<Option<UserRecord>> {
    let rows = store.select(&Query::table(TABLE).eq("id", id)).await?;
    rows.into_iter().next().map(decode_row).transpose()
}

/// Find a user by exact username
pub async fn find_by_username(store: &dyn Store, username: &str) -> StoreResult<Option<UserRecord>> {
    let rows = store
        .select(&Query::table(TABLE).eq("username", username))
        .await?;
    rows.into_iter().next().map(decode_row).transpose()
}

/// Insert a user and return the stored row
pub async fn insert(store: &dyn Store, user: &UserCreate) -> StoreResult<UserRecord> {
    let row = store.insert(TABLE, encode_row(user)?).await?;
    decode_row(row)
}

/// Delete a user row (favorites are not touched)
pub async fn delete(store: &dyn Store, id: i64) -> StoreResult<u64> {
    store.delete(&Query::table(TABLE).eq("id", id)).await
}
