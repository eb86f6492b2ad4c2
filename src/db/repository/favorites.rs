//! Favorites repository

use crate::db::{decode_row, decode_rows, encode_row, Query, Store, StoreResult};
use crate::models::{Favorite, NewFavorite};

pub const TABLE: &str = "favorites";

fn pair_query(user_id: i64, song_id: i64) -> Query {
    Query::table(TABLE)
        .eq("user_id", user_id)
        .eq("song_id", song_id)
}

/// All favorites of a user
pub async fn list_by_user(store: &dyn Store, user_id: i64) -> StoreResult<Vec<Favorite>> {
    let rows = store
        .select(&Query::table(TABLE).eq("user_id", user_id))
        .await?;
    decode_rows(rows)
}

/// Find a single (user, song) favorite
pub async fn find(store: &dyn Store, user_id: i64, song_id: i64) -> StoreResult<Option<Favorite>> {
    let rows = store.select(&pair_query(user_id, song_id)).await?;
    rows.into_iter().next().map(decode_row).transpose()
}

/// Insert a favorite and return the stored row
pub async fn insert(store: &dyn Store, favorite: &NewFavorite) -> StoreResult<Favorite> {
    let row = store.insert(TABLE, encode_row(favorite)?).await?;
    decode_row(row)
}

/// Delete a single (user, song) favorite
pub async fn delete(store: &dyn Store, user_id: i64, song_id: i64) -> StoreResult<u64> {
    store.delete(&pair_query(user_id, song_id)).await
}

/// Delete every favorite of a user
pub async fn delete_by_user(store: &dyn Store, user_id: i64) -> StoreResult<u64> {
    store
        .delete(&Query::table(TABLE).eq("user_id", user_id))
        .await
}
