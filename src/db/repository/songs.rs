//! Song repository

use crate::db::{decode_row, decode_rows, encode_row, Query, Store, StoreResult};
use crate::models::{NewSong, Song, SongFilter, SongUpdate};

pub const TABLE: &str = "songs";

/// Build the search query; absent, empty and zero filters are skipped
pub fn search_query(filter: &SongFilter) -> Query {
    let mut query = Query::table(TABLE);

    if let Some(artist_name) = non_empty(&filter.artist_name) {
        query = query.ilike("artist_name", artist_name);
    }
    if let Some(track_name) = non_empty(&filter.track_name) {
        query = query.ilike("track_name", track_name);
    }
    if let Some(year) = filter.year.filter(|y| *y != 0) {
        query = query.eq("year", year);
    }
    if let Some(genre) = non_empty(&filter.genre) {
        query = query.eq("genre", genre);
    }

    query
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Search songs
pub async fn search(store: &dyn Store, filter: &SongFilter) -> StoreResult<Vec<Song>> {
    let rows = store.select(&search_query(filter)).await?;
    decode_rows(rows)
}

/// Find a song by id
pub async fn find_by_id(store: &dyn Store, id: i64) -> StoreResult<Option<Song>> {
    let rows = store.select(&Query::table(TABLE).eq("id", id)).await?;
    rows.into_iter().next().map(decode_row).transpose()
}

/// Fetch every song whose id is in `ids`
pub async fn find_by_ids(store: &dyn Store, ids: &[i64]) -> StoreResult<Vec<Song>> {
    let rows = store
        .select(&Query::table(TABLE).in_("id", ids.iter().copied()))
        .await?;
    decode_rows(rows)
}

/// Insert a song and return the stored row
pub async fn insert(store: &dyn Store, song: &NewSong) -> StoreResult<Song> {
    let row = store.insert(TABLE, encode_row(song)?).await?;
    decode_row(row)
}

/// Apply a partial update
pub async fn update(store: &dyn Store, id: i64, changes: &SongUpdate) -> StoreResult<u64> {
    store
        .update(&Query::table(TABLE).eq("id", id), encode_row(changes)?)
        .await
}

/// Delete a song
pub async fn delete(store: &dyn Store, id: i64) -> StoreResult<u64> {
    store.delete(&Query::table(TABLE).eq("id", id)).await
}
