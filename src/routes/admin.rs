//! Admin endpoints: song management and user administration

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, put},
    Json, Router,
};
use std::sync::Arc;

use crate::error::AppError;
use crate::models::{SongCreate, SongFilter, SongUpdate};
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/admin/songs/", get(search_songs).post(create_song))
        .route("/admin/songs/:song_id", put(update_song).delete(delete_song))
        .route("/admin/users/", get(list_users))
        .route("/admin/users/:user_id", delete(delete_user))
}

/// GET /admin/songs/ - Search songs by artist, track, year and genre
pub async fn search_songs(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<SongFilter>,
) -> Result<impl IntoResponse, AppError> {
    let songs = state.admin.search_songs(&filter).await?;
    Ok(Json(songs))
}

/// POST /admin/songs/ - Create a song
pub async fn create_song(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SongCreate>,
) -> Result<impl IntoResponse, AppError> {
    let song = state.admin.create_song(payload).await?;
    Ok((StatusCode::CREATED, Json(song)))
}

/// PUT /admin/songs/:song_id - Partially update a song
pub async fn update_song(
    State(state): State<Arc<AppState>>,
    Path(song_id): Path<i64>,
    Json(changes): Json<SongUpdate>,
) -> Result<impl IntoResponse, AppError> {
    let message = state.admin.update_song(song_id, changes).await?;
    Ok(Json(message))
}

/// DELETE /admin/songs/:song_id - Delete a song
pub async fn delete_song(
    State(state): State<Arc<AppState>>,
    Path(song_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let message = state.admin.delete_song(song_id).await?;
    Ok(Json(message))
}

/// GET /admin/users/ - List all users
pub async fn list_users(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
    let users = state.admin.list_users().await?;
    Ok(Json(users))
}

/// DELETE /admin/users/:user_id - Delete a user and their favorites
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let message = state.admin.delete_user(user_id).await?;
    Ok(Json(message))
}
